// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// TAXONOMIA DE ERROS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//
// Erros de provedores, de leitura de documentos e do orquestrador.
// Apenas `AnalysisError::Validation` chega ao chamador como falha dura
// (e `QualityBelowThreshold`, quando o modo estrito é pedido explicitamente).
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

use std::time::Duration;

/// Falha de um provedor externo (busca ou geração)
#[derive(Debug, Clone, thiserror::Error)]
pub enum ProviderError {
    #[error("Provider API error: {0}")]
    Api(String),

    #[error("Rate limit exceeded")]
    RateLimited,

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid provider response: {0}")]
    InvalidResponse(String),

    /// Toda a cadeia de fallback do provedor falhou
    #[error("All providers exhausted: {0}")]
    Exhausted(String),
}

/// Falha ao ler/extrair um documento
#[derive(Debug, Clone, thiserror::Error)]
pub enum FetchError {
    #[error("Fetch timed out after {0:?}")]
    Timeout(Duration),

    #[error("HTTP status {status} for {url}")]
    HttpStatus { status: u16, url: String },

    #[error("Non-text content ({content_type}) at {url}")]
    NonTextContent { content_type: String, url: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Extracted text too short: {chars} chars")]
    TooShort { chars: usize },
}

/// Erros do motor de análise
#[derive(Debug, Clone, thiserror::Error)]
pub enum AnalysisError {
    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// Saída estruturada malformada de uma geração
    #[error("Parse error: {0}")]
    Parse(String),

    #[error("{task} exceeded its deadline of {after:?}")]
    Timeout { task: String, after: Duration },

    /// Requisição inválida (segmento ausente ou curto demais)
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("All {0} analysis backends failed")]
    AllBackendsFailed(usize),

    /// Só acontece em `StrictnessMode::Strict`
    #[error("Quality score {score:.1} below threshold {threshold:.1}")]
    QualityBelowThreshold { score: f64, threshold: f64 },
}

impl AnalysisError {
    /// Indica se o erro representa estouro de prazo
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. } | Self::Fetch(FetchError::Timeout(_)))
    }
}
