// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// SEÇÕES DO RELATÓRIO
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

mod catalog;
mod envelope;
mod fallback;
mod scheduler;

pub use catalog::*;
pub use envelope::*;
pub use fallback::{is_degraded_payload, DEGRADED_MARKER};
pub use scheduler::*;
