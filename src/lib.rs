//! # Deep Analysis - Motor de análise de mercado
//!
//! Este crate implementa um motor de orquestração em várias fases que
//! combina pesquisa web com chamadas a modelos de linguagem para gerar
//! relatórios longos de mercado e de persona.
//!
//! ## Fluxo
//!
//! 1. **Planejamento** (`planning`): facetas da requisição → queries
//! 2. **Pesquisa** (`research`): busca + leitura concorrentes, deduplicação
//!    e ranking dos documentos
//! 3. **Análise semente** (`analysis`): o mesmo prompt para N backends em
//!    paralelo, saídas consolidadas
//! 4. **Seções** (`sections`): 10 seções independentes, cada uma dentro de
//!    um envelope que garante resultado real ou fallback
//! 5. **Consolidação e score** (`consolidator`, `scoring`)
//!
//! ## Garantias
//!
//! - Nenhuma chamada travada segura o pipeline além do prazo total
//! - Falha parcial nunca vira falha total: seções degradadas são marcadas
//!   nos metadados, nunca omitidas
//! - Apenas a validação da requisição (e o modo estrito) retorna erro
//!
//! ## Exemplo de Uso
//!
//! ```rust,ignore
//! use deep_analysis::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), AnalysisError> {
//!     let orchestrator = AnalysisOrchestrator::new(search, fetcher, backends, AnalysisConfig::default());
//!     let request = AnalysisRequest::new("fitness coaching").with_product("app");
//!     let result = orchestrator.run_analysis(request, Duration::from_secs(600)).await?;
//!     println!("{}", serde_json::to_string_pretty(&result.to_json()).unwrap_or_default());
//!     Ok(())
//! }
//! ```

#![warn(rust_2018_idioms)]

/// Tipos fundamentais compartilhados por todo o motor.
///
/// - [`AnalysisRequest`]: facetas imutáveis da requisição
/// - [`RankedDocument`] / [`ResearchContext`]: documentos ranqueados e congelados
/// - [`TaskResult`]: resultado de backend ou seção (real ou fallback)
/// - [`AnalysisResult`]: resultado final com score e metadados
pub mod types;

/// Taxonomia de erros (provedor, leitura, parse, prazo, validação).
pub mod error;

/// Configuração do motor e do runtime Tokio.
///
/// **Motor (`ANALYSIS_*`):**
/// - `ANALYSIS_MAX_QUERIES`, `ANALYSIS_RESEARCH_WORKERS`, `ANALYSIS_FETCH_TOP_K`...
/// - `ANALYSIS_STRICT_THRESHOLD`: ativa o modo estrito
///
/// **Runtime Tokio:**
/// - `TOKIO_THREADS`, `TOKIO_MAX_THREADS`
///
/// Também inclui o panic hook e o construtor do runtime.
pub mod config;

/// Clientes de busca e leitura de documentos.
///
/// Define as traits `SearchClient` e `DocumentFetcher` e implementações para:
/// - Jina AI (busca)
/// - HTTP + Readability (leitura)
/// - Mocks para testes
pub mod search;

/// Clientes de geração (LLMs) e cadeia de fallback entre backends.
pub mod llm;

/// Planejamento de queries a partir das facetas da requisição.
pub mod planning;

/// Fan-out de pesquisa, deduplicação e ranking.
pub mod research;

/// Fan-out de análise multi-backend e consolidação da semente.
pub mod analysis;

/// Catálogo de seções, fallbacks, envelope e agendador.
pub mod sections;

/// Score de qualidade por rubrica aditiva.
pub mod scoring;

/// Montagem do resultado final.
pub mod consolidator;

/// Orquestrador: `run_analysis`.
pub mod orchestrator;

/// Eventos de progresso.
pub mod progress;

/// Utilitários: pool limitado, timing, texto.
pub mod utils;

// Re-exports principais
pub use config::{
    create_tokio_runtime, install_panic_hook, load_analysis_config, load_runtime_config,
    AnalysisConfig, RuntimeConfig, StrictnessMode,
};
pub use error::{AnalysisError, FetchError, ProviderError};
pub use orchestrator::AnalysisOrchestrator;
pub use progress::{AnalysisProgress, ProgressCallback};
pub use types::*;

/// Versão da biblioteca.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude com imports comuns para uso rápido.
///
/// ```rust,ignore
/// use deep_analysis::prelude::*;
/// ```
pub mod prelude {
    pub use crate::config::{AnalysisConfig, StrictnessMode};
    pub use crate::error::{AnalysisError, FetchError, ProviderError};
    pub use crate::llm::{GenerationClient, NamedBackend};
    pub use crate::orchestrator::AnalysisOrchestrator;
    pub use crate::progress::{AnalysisProgress, ProgressCallback};
    pub use crate::search::{DocumentFetcher, SearchClient};
    pub use crate::types::*;
    pub use std::time::Duration;
}
