// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// FAN-OUT DE ANÁLISE MULTI-BACKEND
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//
// O mesmo prompt vai para todos os backends em paralelo. Cada backend
// tem seu próprio prazo; falha ou estouro afeta apenas o próprio backend.
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

use std::collections::BTreeMap;
use std::time::Instant as StdInstant;

use serde_json::Value;
use tokio::time::Instant;

use super::{build_seed_prompt, extract_json_object, merge_outputs, SeedAnalysis};
use crate::config::PromptBudget;
use crate::error::AnalysisError;
use crate::llm::{unique_names, NamedBackend};
use crate::progress::{emit, AnalysisProgress, ProgressCallback};
use crate::research::render_context;
use crate::types::{AnalysisRequest, ResearchContext, TaskResult, TaskStatus};
use crate::utils::{catch_panic, duration_ms, run_bounded, PhaseTimer, PoolLimits, SlotOutcome};

/// Resultado do fan-out: status por backend + semente consolidada
#[derive(Debug, Clone, Default)]
pub struct FanoutReport {
    /// Resultado por backend (nome -> TaskResult)
    pub backends: BTreeMap<String, TaskResult>,
    /// Semente consolidada, se ao menos um backend respondeu
    pub seed: Option<SeedAnalysis>,
}

impl FanoutReport {
    /// Todos os backends falharam (ou não havia backends)
    pub fn all_failed(&self) -> bool {
        self.seed.is_none()
    }

    /// Número de backends que não responderam com sucesso
    pub fn failures(&self) -> usize {
        self.backends
            .values()
            .filter(|r| r.status != TaskStatus::Success)
            .count()
    }

    /// Extrai a semente ou reporta falha total
    pub fn into_seed(self) -> Result<SeedAnalysis, AnalysisError> {
        let total = self.backends.len();
        self.seed.ok_or(AnalysisError::AllBackendsFailed(total))
    }
}

/// Fan-out do prompt de análise para N backends
pub struct AnalysisFanout {
    budget: PromptBudget,
    progress_callback: Option<ProgressCallback>,
}

impl AnalysisFanout {
    pub fn new(budget: PromptBudget) -> Self {
        Self {
            budget,
            progress_callback: None,
        }
    }

    pub fn with_progress_callback(mut self, callback: Option<ProgressCallback>) -> Self {
        self.progress_callback = callback;
        self
    }

    /// Executa todos os backends concorrentemente até `deadline`
    ///
    /// Nomes repetidos recebem sufixo (`#2`, `#3`...) no relatório; a
    /// consolidação segue a ordem de `backends`.
    pub async fn analyze(
        &self,
        context: &ResearchContext,
        request: &AnalysisRequest,
        backends: &[NamedBackend],
        deadline: Instant,
    ) -> FanoutReport {
        let timer = PhaseTimer::start("analysis");
        let prompt = build_seed_prompt(request, &render_context(context, &self.budget));
        let max_tokens = self.budget.seed_max_tokens;

        log::info!(
            "🧠 Análise: {} backends, prompt com {} caracteres",
            backends.len(),
            prompt.chars().count()
        );

        let tasks: Vec<_> = backends
            .iter()
            .map(|backend| {
                let prompt = &prompt;
                async move {
                    let started = StdInstant::now();
                    let outcome = catch_panic(backend.client.generate(prompt, max_tokens)).await;
                    (outcome, duration_ms(started.elapsed()))
                }
            })
            .collect();

        let run = run_bounded(
            tasks,
            PoolLimits {
                workers: backends.len().max(1),
                per_task: Some(self.budget.backend_timeout),
                deadline,
            },
        )
        .await;

        let mut report = FanoutReport::default();
        let mut parsed = Vec::new();

        let names = unique_names(backends.iter().map(|b| b.name.as_str()));
        for (name, slot) in names.into_iter().zip(run.slots) {
            let result = match slot {
                SlotOutcome::Completed((Ok(Ok(text)), ms)) => match extract_json_object(&text) {
                    Ok(fields) => {
                        log::info!("✅ Backend {}: {} caracteres gerados", name, text.chars().count());
                        parsed.push((name.clone(), fields.clone()));
                        TaskResult::success(name.as_str(), Value::Object(fields), ms)
                    }
                    Err(e) => {
                        log::error!("❌ Backend {} retornou JSON inválido: {}", name, e);
                        TaskResult::failed(name.as_str(), e.to_string(), ms)
                    }
                },
                SlotOutcome::Completed((Ok(Err(e)), ms)) => {
                    log::error!("❌ Backend {} falhou: {}", name, e);
                    TaskResult::failed(name.as_str(), e.to_string(), ms)
                }
                SlotOutcome::Completed((Err(panic), ms)) => {
                    log::error!("❌ Backend {} entrou em pânico: {}", name, panic);
                    TaskResult::failed(name.as_str(), format!("panic: {}", panic), ms)
                }
                SlotOutcome::TimedOut(after) => {
                    log::warn!("⏰ Backend {} excedeu {:?}", name, after);
                    let err = AnalysisError::Timeout {
                        task: name.clone(),
                        after,
                    };
                    TaskResult::timed_out(name.as_str(), err.to_string(), duration_ms(after))
                }
                SlotOutcome::Abandoned => {
                    log::warn!("⏰ Backend {} abandonado pelo prazo da fase", name);
                    TaskResult::timed_out(name.as_str(), "prazo da fase de análise atingido", timer.elapsed_ms())
                }
            };

            emit(
                &self.progress_callback,
                AnalysisProgress::Backend {
                    name: name.clone(),
                    status: result.status,
                },
            );
            report.backends.insert(name, result);
        }

        if parsed.is_empty() {
            log::warn!("⚠️ Todos os {} backends falharam; seções usarão apenas o contexto", backends.len());
        } else {
            report.seed = Some(merge_outputs(parsed));
        }

        timer.stop_and_log();
        report
    }
}
