// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// ENVELOPE DE EXECUÇÃO SEGURA
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//
// Envolve a geração de uma seção. Erro de provedor, JSON inválido,
// objeto vazio, estouro de prazo ou panic viram fallback. O envelope
// nunca retorna erro: sempre há um TaskResult.
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde_json::Value;

use super::{GenerationTask, SectionInput};
use crate::analysis::extract_json_object;
use crate::error::AnalysisError;
use crate::llm::GenerationClient;
use crate::types::{JsonMap, TaskResult};
use crate::utils::{catch_panic, duration_ms};

/// Envelope que garante um resultado (real ou fallback) por seção
#[derive(Clone)]
pub struct SafeEnvelope {
    client: Arc<dyn GenerationClient>,
    timeout: Duration,
}

impl SafeEnvelope {
    pub fn new(client: Arc<dyn GenerationClient>, timeout: Duration) -> Self {
        Self { client, timeout }
    }

    /// Executa a seção; nunca falha
    pub async fn run(&self, task: &GenerationTask, input: &SectionInput<'_>) -> TaskResult {
        let started = Instant::now();

        let attempt = tokio::time::timeout(self.timeout, catch_panic(self.attempt(task, input))).await;
        let ms = duration_ms(started.elapsed());

        match attempt {
            Ok(Ok(Ok(fields))) => {
                log::info!("✅ Seção {} gerada ({} campos)", task.name, fields.len());
                TaskResult::success(task.name, Value::Object(fields), ms)
            }
            Ok(Ok(Err(e))) => {
                log::warn!("🛟 Seção {} falhou ({}), usando fallback", task.name, e);
                Self::degrade(TaskResult::failed(task.name, e.to_string(), ms), task, input)
            }
            Ok(Err(panic)) => {
                log::error!("❌ Seção {} entrou em pânico ({}), usando fallback", task.name, panic);
                Self::degrade(TaskResult::failed(task.name, format!("panic: {}", panic), ms), task, input)
            }
            Err(_) => {
                let err = AnalysisError::Timeout {
                    task: task.name.to_string(),
                    after: self.timeout,
                };
                log::warn!("⏰ {}, usando fallback", err);
                Self::degrade(TaskResult::timed_out(task.name, err.to_string(), ms), task, input)
            }
        }
    }

    /// Resolve a seção direto pelo fallback (prazo do pipeline atingido)
    pub fn abandon(task: &GenerationTask, input: &SectionInput<'_>, reason: &str, elapsed_ms: u64) -> TaskResult {
        log::warn!("⏰ Seção {} não concluída ({}), usando fallback", task.name, reason);
        Self::degrade(TaskResult::timed_out(task.name, reason, elapsed_ms), task, input)
    }

    async fn attempt(&self, task: &GenerationTask, input: &SectionInput<'_>) -> Result<JsonMap, AnalysisError> {
        let prompt = task.build_prompt(input);
        let text = self.client.generate(&prompt, task.token_budget).await?;
        extract_json_object(&text)
    }

    fn degrade(result: TaskResult, task: &GenerationTask, input: &SectionInput<'_>) -> TaskResult {
        result.with_fallback(task.build_fallback(input.request, input.stats))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::MockGenerationClient;
    use crate::sections::{default_catalog, is_degraded_payload};
    use crate::types::{AnalysisRequest, ResearchStats, TaskStatus};

    async fn run_with(client: MockGenerationClient, timeout_ms: u64) -> TaskResult {
        let request = AnalysisRequest::new("fitness coaching");
        let stats = ResearchStats::default();
        let input = SectionInput {
            request: &request,
            research: "",
            seed: None,
            stats: &stats,
        };
        let envelope = SafeEnvelope::new(Arc::new(client), Duration::from_millis(timeout_ms));
        envelope.run(&default_catalog()[0], &input).await
    }

    #[tokio::test]
    async fn test_success_is_real() {
        let result = run_with(MockGenerationClient::responding(r#"{"perfil": "Ana"}"#), 500).await;
        assert!(result.is_real());
        assert_eq!(result.payload["perfil"], "Ana");
    }

    #[tokio::test]
    async fn test_provider_failure_falls_back() {
        let result = run_with(MockGenerationClient::failing(), 500).await;
        assert_eq!(result.status, TaskStatus::Failed);
        assert!(result.fallback);
        assert!(is_degraded_payload(&result.payload));
        assert!(result.error.is_some());
    }

    #[tokio::test]
    async fn test_malformed_and_empty_fall_back() {
        let malformed = run_with(MockGenerationClient::malformed(), 500).await;
        assert!(malformed.fallback);
        assert!(malformed.error.unwrap().contains("Parse"));

        let empty = run_with(MockGenerationClient::responding("{}"), 500).await;
        assert!(empty.fallback);
    }

    #[tokio::test]
    async fn test_timeout_falls_back() {
        let started = Instant::now();
        let result = run_with(MockGenerationClient::hanging(), 100).await;
        assert!(started.elapsed() < Duration::from_millis(1_000));
        assert_eq!(result.status, TaskStatus::TimedOut);
        assert!(result.fallback);
    }

    #[tokio::test]
    async fn test_panic_falls_back() {
        let result = run_with(MockGenerationClient::panicking(), 500).await;
        assert_eq!(result.status, TaskStatus::Failed);
        assert!(result.fallback);
        assert!(result.error.unwrap().starts_with("panic"));
    }
}
