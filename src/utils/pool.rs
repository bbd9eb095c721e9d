// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// POOL LIMITADO COM PRAZOS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//
// Primitiva compartilhada pelos três pontos de fan-out (pesquisa, backends,
// seções). Cada tarefa escreve apenas no seu próprio slot, lido depois que
// a tarefa termina; por isso não há locks.
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::time::Duration;

use futures::stream::{FuturesUnordered, StreamExt};
use futures::FutureExt;
use tokio::sync::Semaphore;
use tokio::time::Instant;

/// Resultado do slot de uma tarefa
#[derive(Debug, Clone, PartialEq)]
pub enum SlotOutcome<T> {
    /// A tarefa terminou dentro dos prazos
    Completed(T),
    /// Prazo individual da tarefa estourou
    TimedOut(Duration),
    /// Prazo da fase chegou antes da tarefa terminar (ou começar)
    Abandoned,
}

impl<T> SlotOutcome<T> {
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed(_))
    }

    /// Valor produzido, se a tarefa terminou
    pub fn completed(self) -> Option<T> {
        match self {
            Self::Completed(value) => Some(value),
            _ => None,
        }
    }
}

/// Limites de uma execução do pool
#[derive(Debug, Clone, Copy)]
pub struct PoolLimits {
    /// Tarefas simultâneas
    pub workers: usize,
    /// Prazo individual, contado a partir da obtenção da vaga
    pub per_task: Option<Duration>,
    /// Prazo da fase inteira
    pub deadline: Instant,
}

/// Resultado de uma execução do pool, na ordem das tarefas de entrada
#[derive(Debug)]
pub struct PoolRun<T> {
    pub slots: Vec<SlotOutcome<T>>,
    /// Se o prazo da fase foi atingido com tarefas pendentes
    pub deadline_reached: bool,
}

impl<T> PoolRun<T> {
    pub fn completed_count(&self) -> usize {
        self.slots.iter().filter(|s| s.is_completed()).count()
    }
}

/// Executa as tarefas com no máximo `limits.workers` simultâneas.
///
/// Quando `limits.deadline` chega, as tarefas pendentes são descartadas
/// (o drop cancela os futures) e seus slots ficam como `Abandoned`.
///
/// # Exemplo
///
/// ```rust,ignore
/// let run = run_bounded(futures, PoolLimits {
///     workers: 2,
///     per_task: Some(Duration::from_secs(30)),
///     deadline: Instant::now() + Duration::from_secs(120),
/// }).await;
/// ```
pub async fn run_bounded<F, T>(tasks: Vec<F>, limits: PoolLimits) -> PoolRun<T>
where
    F: Future<Output = T>,
{
    let total = tasks.len();
    let mut slots: Vec<SlotOutcome<T>> = (0..total).map(|_| SlotOutcome::Abandoned).collect();
    if total == 0 {
        return PoolRun {
            slots,
            deadline_reached: false,
        };
    }

    let semaphore = Semaphore::new(limits.workers.max(1));
    let per_task = limits.per_task;

    let deadline_reached = {
        let mut pending: FuturesUnordered<_> = tasks
            .into_iter()
            .enumerate()
            .map(|(index, task)| {
                let semaphore = &semaphore;
                async move {
                    // Vaga no pool; o prazo individual só começa aqui
                    let _permit = semaphore.acquire().await;
                    let outcome = match per_task {
                        Some(limit) => match tokio::time::timeout(limit, task).await {
                            Ok(value) => SlotOutcome::Completed(value),
                            Err(_) => SlotOutcome::TimedOut(limit),
                        },
                        None => SlotOutcome::Completed(task.await),
                    };
                    (index, outcome)
                }
            })
            .collect();

        let drained = tokio::time::timeout_at(limits.deadline, async {
            while let Some((index, outcome)) = pending.next().await {
                slots[index] = outcome;
            }
        })
        .await;

        if drained.is_err() {
            log::warn!(
                "⏰ Prazo da fase atingido: {} tarefa(s) pendente(s) descartada(s)",
                pending.len()
            );
        }
        drained.is_err()
    };

    PoolRun {
        slots,
        deadline_reached,
    }
}

/// Executa o future convertendo um panic em erro com a mensagem do panic
pub async fn catch_panic<F: Future>(future: F) -> Result<F::Output, String> {
    AssertUnwindSafe(future)
        .catch_unwind()
        .await
        .map_err(|payload| panic_message(payload.as_ref()))
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "panic sem mensagem".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn limits(workers: usize, per_task: Option<u64>, deadline_ms: u64) -> PoolLimits {
        PoolLimits {
            workers,
            per_task: per_task.map(Duration::from_millis),
            deadline: Instant::now() + Duration::from_millis(deadline_ms),
        }
    }

    #[tokio::test]
    async fn test_slots_keep_input_order() {
        let tasks: Vec<_> = (0..5u64)
            .map(|i| async move {
                tokio::time::sleep(Duration::from_millis(50 - i * 10)).await;
                i
            })
            .collect();

        let run = run_bounded(tasks, limits(5, None, 2_000)).await;
        let values: Vec<_> = run.slots.into_iter().filter_map(SlotOutcome::completed).collect();
        assert_eq!(values, vec![0, 1, 2, 3, 4]);
        assert!(!run.deadline_reached);
    }

    #[tokio::test]
    async fn test_concurrency_is_bounded() {
        let active = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let tasks: Vec<_> = (0..8)
            .map(|_| {
                let active = active.clone();
                let peak = peak.clone();
                async move {
                    let now = active.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(20)).await;
                    active.fetch_sub(1, Ordering::SeqCst);
                }
            })
            .collect();

        let run = run_bounded(tasks, limits(2, None, 5_000)).await;
        assert_eq!(run.completed_count(), 8);
        assert!(peak.load(Ordering::SeqCst) <= 2);
    }

    #[tokio::test]
    async fn test_per_task_timeout() {
        let tasks: Vec<std::pin::Pin<Box<dyn Future<Output = u8> + Send>>> = vec![
            Box::pin(async { 1 }),
            Box::pin(std::future::pending::<u8>()),
        ];

        let run = run_bounded(tasks, limits(2, Some(50), 2_000)).await;
        assert_eq!(run.slots[0], SlotOutcome::Completed(1));
        assert_eq!(run.slots[1], SlotOutcome::TimedOut(Duration::from_millis(50)));
        assert!(!run.deadline_reached);
    }

    #[tokio::test]
    async fn test_phase_deadline_abandons_pending() {
        let started = std::time::Instant::now();
        let tasks: Vec<std::pin::Pin<Box<dyn Future<Output = u8> + Send>>> = vec![
            Box::pin(async { 7 }),
            Box::pin(std::future::pending::<u8>()),
            Box::pin(std::future::pending::<u8>()),
        ];

        let run = run_bounded(tasks, limits(1, None, 100)).await;
        assert!(started.elapsed() < Duration::from_millis(1_000));
        assert!(run.deadline_reached);
        assert_eq!(run.slots[0], SlotOutcome::Completed(7));
        assert_eq!(run.slots[1], SlotOutcome::Abandoned);
        assert_eq!(run.slots[2], SlotOutcome::Abandoned);
    }

    #[tokio::test]
    async fn test_empty_input() {
        let tasks: Vec<std::future::Ready<u8>> = vec![];
        let run = run_bounded(tasks, limits(2, None, 10)).await;
        assert!(run.slots.is_empty());
        assert!(!run.deadline_reached);
    }

    #[tokio::test]
    async fn test_catch_panic_returns_message() {
        let ok = catch_panic(async { 5 }).await;
        assert_eq!(ok, Ok(5));

        let err = catch_panic(async {
            if true {
                panic!("falha simulada");
            }
            5
        })
        .await;
        assert_eq!(err, Err("falha simulada".to_string()));
    }
}
