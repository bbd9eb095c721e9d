// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// EVENTOS DE PROGRESSO
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

use std::sync::Arc;

use serde::Serialize;

use crate::types::TaskStatus;

/// Eventos emitidos durante uma análise
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AnalysisProgress {
    /// Início de uma fase (passo numerado)
    Phase {
        step: u8,
        phase: String,
        message: String,
    },
    /// Uma query de pesquisa terminou
    Query {
        /// Índice da query (0-based)
        index: usize,
        total: usize,
        query: String,
        /// Documentos aceitos
        documents: usize,
        /// "ok", "empty" ou "failed"
        status: String,
    },
    /// Um backend de análise terminou
    Backend { name: String, status: TaskStatus },
    /// Uma seção foi resolvida (real ou fallback)
    Section {
        name: String,
        status: TaskStatus,
        fallback: bool,
    },
    /// Análise concluída
    Completed {
        quality_score: f64,
        elapsed_ms: u64,
        degraded_sections: usize,
    },
}

/// Tipo do callback de progresso
pub type ProgressCallback = Arc<dyn Fn(AnalysisProgress) + Send + Sync>;

/// Envia evento se houver callback configurado
pub(crate) fn emit(callback: &Option<ProgressCallback>, event: AnalysisProgress) {
    if let Some(cb) = callback {
        cb(event);
    }
}
