// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// TIMING UTILITIES
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//
// Utilitários para medir tempo das fases e tarefas.
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

use std::time::{Duration, Instant};

/// Timer para medir duração de uma fase
pub struct PhaseTimer {
    start: Instant,
    phase: String,
}

impl PhaseTimer {
    /// Inicia um novo timer para uma fase
    pub fn start(phase: &str) -> Self {
        Self {
            start: Instant::now(),
            phase: phase.to_string(),
        }
    }

    /// Retorna o tempo decorrido em milissegundos
    pub fn elapsed_ms(&self) -> u64 {
        duration_ms(self.start.elapsed())
    }

    /// Retorna o tempo decorrido como Duration
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Para o timer e loga o tempo decorrido
    pub fn stop_and_log(self) -> u64 {
        let elapsed = self.elapsed_ms();
        log::info!("⏱️  {} completado em {}ms", self.phase, elapsed);
        elapsed
    }
}

/// Converte Duration para milissegundos (saturando em u64)
pub fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// Formata uma duração como "Xm Ys"
pub fn format_elapsed(duration: Duration) -> String {
    let secs = duration.as_secs();
    format!("{}m {}s", secs / 60, secs % 60)
}
