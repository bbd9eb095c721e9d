// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// UTILITÁRIOS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//
// Utilitários compartilhados por todo o sistema:
// - Pool limitado com prazos por tarefa e por fase
// - Text processing
// - Timing
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Pool limitado usado pelos três fan-outs.
pub mod pool;
mod text;
mod timing;

pub use pool::{catch_panic, run_bounded, PoolLimits, PoolRun, SlotOutcome};
pub use text::*;
pub use timing::{duration_ms, format_elapsed, PhaseTimer};
