// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// PESQUISA: FAN-OUT, DEDUPLICAÇÃO E CONTEXTO
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

mod context;
mod engine;
mod ranker;

pub use context::*;
pub use engine::*;
pub use ranker::*;
