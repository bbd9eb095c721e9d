// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// ORQUESTRADOR DA ANÁLISE
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//
// Planejamento → pesquisa → análise semente → seções → consolidação → score.
//
// Cada fase termina numa fração fixa do orçamento total. Só a validação
// da requisição (e o modo estrito, quando pedido) retorna erro.
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::time::Instant;

use crate::analysis::AnalysisFanout;
use crate::config::{AnalysisConfig, PhaseBudget, StrictnessMode};
use crate::consolidator::Consolidator;
use crate::error::AnalysisError;
use crate::llm::{with_unique_names, GenerationChain, NamedBackend};
use crate::planning::QueryPlanner;
use crate::progress::{emit, AnalysisProgress, ProgressCallback};
use crate::research::{Ranker, ResearchEngine};
use crate::scoring::QualityScorer;
use crate::search::{DocumentFetcher, SearchClient};
use crate::sections::{default_catalog, ComponentScheduler, GenerationTask, SafeEnvelope};
use crate::types::{AnalysisRequest, AnalysisResult};
use crate::utils::{format_elapsed, PhaseTimer};

/// Motor de análise com dependências injetadas
///
/// # Exemplo
///
/// ```rust,ignore
/// let orchestrator = AnalysisOrchestrator::new(search, fetcher, backends, AnalysisConfig::default());
/// let result = orchestrator
///     .run_analysis(AnalysisRequest::new("fitness coaching"), Duration::from_secs(600))
///     .await?;
/// println!("score: {:.1}", result.quality_score);
/// ```
pub struct AnalysisOrchestrator {
    search: Arc<dyn SearchClient>,
    fetcher: Arc<dyn DocumentFetcher>,
    backends: Vec<NamedBackend>,
    config: AnalysisConfig,
    catalog: Vec<GenerationTask>,
    progress_callback: Option<ProgressCallback>,
}

impl AnalysisOrchestrator {
    /// Cria o orquestrador com o catálogo padrão de seções
    ///
    /// `backends` é usado duas vezes: todos em paralelo na análise semente
    /// e como cadeia de fallback (na ordem dada) para as seções. Nomes
    /// repetidos recebem sufixo.
    pub fn new(
        search: Arc<dyn SearchClient>,
        fetcher: Arc<dyn DocumentFetcher>,
        backends: Vec<NamedBackend>,
        config: AnalysisConfig,
    ) -> Self {
        Self {
            search,
            fetcher,
            backends: with_unique_names(backends),
            config,
            catalog: default_catalog(),
            progress_callback: None,
        }
    }

    pub fn with_progress_callback(mut self, callback: ProgressCallback) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    /// Substitui o catálogo de seções
    pub fn with_catalog(mut self, catalog: Vec<GenerationTask>) -> Self {
        self.catalog = catalog;
        self
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Valida o segmento (única faceta obrigatória)
    pub fn validate(&self, request: &AnalysisRequest) -> Result<(), AnalysisError> {
        let len = request.segment().chars().count();
        if len == 0 || len < self.config.min_segment_len {
            return Err(AnalysisError::Validation(format!(
                "segmento deve ter ao menos {} caracteres (recebido: {:?})",
                self.config.min_segment_len.max(1),
                request.segment()
            )));
        }
        Ok(())
    }

    /// Executa a análise completa dentro de `deadline_budget`
    ///
    /// Retorna sempre um resultado completo para requisições válidas:
    /// seções que falharam vêm via fallback e marcadas nos metadados.
    pub async fn run_analysis(
        &self,
        request: AnalysisRequest,
        deadline_budget: Duration,
    ) -> Result<AnalysisResult, AnalysisError> {
        self.validate(&request)?;

        let timer = PhaseTimer::start("run_analysis");
        let started_at = Utc::now();
        let start = Instant::now();
        let phases = &self.config.phases;
        let deadline_budget = PhaseBudget::clamp_budget(deadline_budget);
        let research_deadline = start + PhaseBudget::portion(deadline_budget, phases.research_end);
        let analysis_deadline = start + PhaseBudget::portion(deadline_budget, phases.analysis_end);
        let pipeline_deadline = start + deadline_budget;

        log::info!(
            "🚀 Análise {} iniciada: segmento {:?}, orçamento {}, modo {}",
            request.correlation_id,
            request.segment(),
            format_elapsed(deadline_budget),
            self.config.strictness
        );

        // ━━━ 1. Planejamento ━━━
        self.phase(1, "planning", "Planejando queries de pesquisa");
        let queries = QueryPlanner::new(self.config.research.max_queries).plan(&request);

        // ━━━ 2. Pesquisa ━━━
        self.phase(2, "research", &format!("Pesquisando {} queries", queries.len()));
        let engine = ResearchEngine::new(
            self.search.clone(),
            self.fetcher.clone(),
            self.config.research.clone(),
            Ranker::new(self.config.relevance.clone()),
        )
        .with_progress_callback(self.progress_callback.clone());
        let context = engine.research(&queries, &request, research_deadline).await;

        // ━━━ 3. Análise semente ━━━
        self.phase(3, "analysis", &format!("Consultando {} backends", self.backends.len()));
        let fanout = AnalysisFanout::new(self.config.prompt.clone())
            .with_progress_callback(self.progress_callback.clone())
            .analyze(&context, &request, &self.backends, analysis_deadline)
            .await;
        if fanout.all_failed() {
            log::warn!("⚠️ Nenhuma análise semente; seções usarão apenas o contexto de pesquisa");
        }

        // ━━━ 4. Seções ━━━
        self.phase(4, "sections", &format!("Gerando {} seções", self.catalog.len()));
        let chain = Arc::new(GenerationChain::new(self.backends.clone()));
        let envelope = SafeEnvelope::new(chain, self.config.sections.section_timeout);
        let sections = ComponentScheduler::new(envelope, self.config.sections.clone(), self.config.prompt.clone())
            .with_progress_callback(self.progress_callback.clone())
            .schedule(&self.catalog, &context, &request, fanout.seed.as_ref(), pipeline_deadline)
            .await;

        // ━━━ 5. Consolidação e score ━━━
        self.phase(5, "consolidation", "Consolidando resultado");
        let consolidator = Consolidator::new(&self.config.scoring, self.config.strictness);
        let mut result = consolidator.consolidate(&request, &context, fanout, sections, started_at);
        result.quality_score = QualityScorer::new(self.config.scoring.clone()).score(&result);

        let elapsed_ms = timer.stop_and_log();
        emit(
            &self.progress_callback,
            AnalysisProgress::Completed {
                quality_score: result.quality_score,
                elapsed_ms,
                degraded_sections: result.metadata.degraded_sections,
            },
        );
        log::info!(
            "✅ Análise {} concluída: score {:.1}, {} seções degradadas",
            request.correlation_id,
            result.quality_score,
            result.metadata.degraded_sections
        );

        if let StrictnessMode::Strict { threshold } = self.config.strictness {
            if result.quality_score < threshold {
                log::error!(
                    "❌ Score {:.1} abaixo do limiar {:.1} (modo estrito)",
                    result.quality_score,
                    threshold
                );
                return Err(AnalysisError::QualityBelowThreshold {
                    score: result.quality_score,
                    threshold,
                });
            }
        }

        Ok(result)
    }

    fn phase(&self, step: u8, phase: &str, message: &str) {
        log::info!("📍 [{}/5] {}", step, message);
        emit(
            &self.progress_callback,
            AnalysisProgress::Phase {
                step,
                phase: phase.to_string(),
                message: message.to_string(),
            },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use crate::llm::MockGenerationClient;
    use crate::search::{MockDocumentFetcher, MockSearchClient};

    fn orchestrator(search: MockSearchClient, backends: Vec<NamedBackend>) -> AnalysisOrchestrator {
        AnalysisOrchestrator::new(
            Arc::new(search),
            Arc::new(MockDocumentFetcher::with_default_body("mercado fitness coaching ".repeat(40))),
            backends,
            AnalysisConfig::default(),
        )
    }

    #[tokio::test]
    async fn test_short_segment_is_rejected() {
        let orchestrator = orchestrator(MockSearchClient::new(), vec![]);
        let err = orchestrator
            .run_analysis(AnalysisRequest::new("  ab "), Duration::from_secs(5))
            .await
            .unwrap_err();
        assert!(matches!(err, AnalysisError::Validation(_)));
    }

    #[tokio::test]
    async fn test_no_backends_still_returns_every_section() {
        let orchestrator = orchestrator(MockSearchClient::new(), vec![]);
        let result = orchestrator
            .run_analysis(AnalysisRequest::new("fitness coaching"), Duration::from_secs(5))
            .await
            .unwrap();

        assert_eq!(result.sections.len(), 10);
        assert!(result.is_fully_degraded());
        assert_eq!(result.metadata.degraded_sections, 10);
        assert!(result.seed_analysis.is_none());
    }

    #[tokio::test]
    async fn test_phase_events_in_order() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let orchestrator = orchestrator(
            MockSearchClient::new(),
            vec![NamedBackend::new("primary", Arc::new(MockGenerationClient::new()))],
        )
        .with_progress_callback(Arc::new(move |event| {
            if let AnalysisProgress::Phase { step, .. } = event {
                sink.lock().unwrap().push(step);
            }
        }));

        orchestrator
            .run_analysis(AnalysisRequest::new("fitness coaching"), Duration::from_secs(5))
            .await
            .unwrap();

        assert_eq!(*seen.lock().unwrap(), vec![1, 2, 3, 4, 5]);
    }

    #[tokio::test]
    async fn test_huge_budget_saturates_instead_of_overflowing() {
        let orchestrator = orchestrator(
            MockSearchClient::new(),
            vec![NamedBackend::new("primary", Arc::new(MockGenerationClient::new()))],
        );

        for budget in [Duration::MAX, Duration::from_secs(u64::MAX)] {
            let result = orchestrator
                .run_analysis(AnalysisRequest::new("fitness coaching"), budget)
                .await
                .unwrap();
            assert_eq!(result.sections.len(), 10);
            assert!(!result.research.stats.deadline_reached);
        }
    }

    #[tokio::test]
    async fn test_strict_mode_rejects_low_score() {
        let orchestrator = AnalysisOrchestrator::new(
            Arc::new(MockSearchClient::failing()),
            Arc::new(MockDocumentFetcher::with_default_body("x")),
            vec![],
            AnalysisConfig::default().strict(95.0),
        );

        let err = orchestrator
            .run_analysis(AnalysisRequest::new("fitness coaching"), Duration::from_secs(5))
            .await
            .unwrap_err();
        assert!(matches!(err, AnalysisError::QualityBelowThreshold { .. }));
    }
}
