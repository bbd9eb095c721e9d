// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// AGENDADOR DE SEÇÕES
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//
// Roda as seções no pool limitado (poucos workers por causa de rate
// limits). Cada seção passa pelo envelope; quando o prazo do pipeline
// chega, as pendentes são resolvidas na hora pelo fallback.
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

use std::collections::BTreeMap;

use tokio::time::Instant;

use super::{GenerationTask, SafeEnvelope, SectionInput};
use crate::analysis::SeedAnalysis;
use crate::config::{PromptBudget, SectionConfig};
use crate::progress::{emit, AnalysisProgress, ProgressCallback};
use crate::research::render_context;
use crate::types::{AnalysisRequest, ResearchContext, SectionOutcome};
use crate::utils::{duration_ms, run_bounded, truncate_chars, PhaseTimer, PoolLimits, SlotOutcome};

/// Agendador das seções do relatório
pub struct ComponentScheduler {
    envelope: SafeEnvelope,
    config: SectionConfig,
    budget: PromptBudget,
    progress_callback: Option<ProgressCallback>,
}

impl ComponentScheduler {
    pub fn new(envelope: SafeEnvelope, config: SectionConfig, budget: PromptBudget) -> Self {
        Self {
            envelope,
            config,
            budget,
            progress_callback: None,
        }
    }

    pub fn with_progress_callback(mut self, callback: Option<ProgressCallback>) -> Self {
        self.progress_callback = callback;
        self
    }

    /// Resolve todas as seções até `deadline`
    ///
    /// Sempre retorna uma entrada por seção do catálogo.
    pub async fn schedule(
        &self,
        tasks: &[GenerationTask],
        context: &ResearchContext,
        request: &AnalysisRequest,
        seed: Option<&SeedAnalysis>,
        deadline: Instant,
    ) -> BTreeMap<String, SectionOutcome> {
        let timer = PhaseTimer::start("sections");

        let rendered = render_context(context, &self.budget);
        let research = truncate_chars(&rendered, self.config.context_chars);
        let seed_text = seed.map(|s| s.render(self.config.seed_chars));
        let input = SectionInput {
            request,
            research,
            seed: seed_text.as_deref(),
            stats: context.stats(),
        };

        log::info!(
            "🎯 Seções: {} tarefas, {} workers, semente {}",
            tasks.len(),
            self.config.workers,
            if seed.is_some() { "disponível" } else { "indisponível" }
        );

        let futures: Vec<_> = tasks
            .iter()
            .map(|task| {
                let input = &input;
                async move { self.envelope.run(task, input).await }
            })
            .collect();

        // O envelope já aplica o prazo por seção; o pool só aplica o do pipeline
        let run = run_bounded(
            futures,
            PoolLimits {
                workers: self.config.workers,
                per_task: None,
                deadline,
            },
        )
        .await;

        let elapsed = timer.elapsed_ms();
        let mut sections = BTreeMap::new();

        for (task, slot) in tasks.iter().zip(run.slots) {
            let result = match slot {
                SlotOutcome::Completed(result) => result,
                SlotOutcome::TimedOut(after) => {
                    SafeEnvelope::abandon(task, &input, "prazo da seção atingido", duration_ms(after))
                }
                SlotOutcome::Abandoned => SafeEnvelope::abandon(task, &input, "prazo do pipeline atingido", elapsed),
            };

            emit(
                &self.progress_callback,
                AnalysisProgress::Section {
                    name: task.name.to_string(),
                    status: result.status,
                    fallback: result.fallback,
                },
            );

            sections.insert(
                task.name.to_string(),
                SectionOutcome {
                    kind: task.kind,
                    result,
                },
            );
        }

        let degraded = sections.values().filter(|s| s.result.fallback).count();
        log::info!("✅ Seções: {} reais, {} via fallback", sections.len() - degraded, degraded);
        timer.stop_and_log();

        sections
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    use crate::llm::{GenerationClient, MockGenerationClient};
    use crate::sections::default_catalog;
    use crate::types::TaskStatus;

    fn scheduler(client: Arc<dyn GenerationClient>, section_timeout_ms: u64) -> ComponentScheduler {
        let envelope = SafeEnvelope::new(client, Duration::from_millis(section_timeout_ms));
        ComponentScheduler::new(envelope, SectionConfig::default(), PromptBudget::default())
    }

    fn deadline(ms: u64) -> Instant {
        Instant::now() + Duration::from_millis(ms)
    }

    #[tokio::test]
    async fn test_all_sections_real_with_working_backend() {
        let sections = scheduler(Arc::new(MockGenerationClient::new()), 500)
            .schedule(
                &default_catalog(),
                &ResearchContext::empty(vec![]),
                &AnalysisRequest::new("fitness coaching"),
                None,
                deadline(2_000),
            )
            .await;

        assert_eq!(sections.len(), 10);
        assert!(sections.values().all(|s| s.result.is_real()));
    }

    #[tokio::test]
    async fn test_failing_backend_degrades_every_section() {
        let sections = scheduler(Arc::new(MockGenerationClient::failing()), 500)
            .schedule(
                &default_catalog(),
                &ResearchContext::empty(vec![]),
                &AnalysisRequest::new("fitness coaching"),
                None,
                deadline(2_000),
            )
            .await;

        assert_eq!(sections.len(), 10);
        assert!(sections.values().all(|s| s.result.fallback));
    }

    #[tokio::test]
    async fn test_pipeline_deadline_resolves_pending_via_fallback() {
        let started = std::time::Instant::now();
        let sections = scheduler(Arc::new(MockGenerationClient::hanging()), 60_000)
            .schedule(
                &default_catalog(),
                &ResearchContext::empty(vec![]),
                &AnalysisRequest::new("fitness coaching"),
                None,
                deadline(200),
            )
            .await;

        assert!(started.elapsed() < Duration::from_millis(1_000));
        assert_eq!(sections.len(), 10);
        assert!(sections
            .values()
            .all(|s| s.result.fallback && s.result.status == TaskStatus::TimedOut));
    }

    #[tokio::test]
    async fn test_seed_reaches_prompts() {
        let client = Arc::new(MockGenerationClient::new());
        let seed = SeedAnalysis {
            fields: serde_json::json!({"marcador_semente": 1}).as_object().cloned().unwrap(),
            contributors: vec!["primary".into()],
        };

        scheduler(client.clone(), 500)
            .schedule(
                &default_catalog()[..2],
                &ResearchContext::empty(vec![]),
                &AnalysisRequest::new("fitness coaching"),
                Some(&seed),
                deadline(2_000),
            )
            .await;

        assert_eq!(client.prompts().len(), 2);
        assert!(client.prompts().iter().all(|p| p.contains("marcador_semente")));
    }
}
