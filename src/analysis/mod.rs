// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// ANÁLISE SEMENTE (MULTI-BACKEND)
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

mod fanout;
mod json;
mod merge;
mod prompts;

pub use fanout::*;
pub use json::*;
pub use merge::*;
pub use prompts::*;
