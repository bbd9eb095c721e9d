// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// FAN-OUT DE PESQUISA
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//
// Cada query é uma unidade independente no pool: busca, leitura do top-K
// e filtro de tamanho. Falhas (inclusive pânicos de busca ou leitura) ficam
// isoladas na própria query e viram contadores; nada aqui retorna erro ao
// chamador.
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

use std::sync::Arc;

use futures::stream::{self, StreamExt};
use tokio::time::Instant;

use super::Ranker;
use crate::config::ResearchConfig;
use crate::progress::{emit, AnalysisProgress, ProgressCallback};
use crate::search::{DocumentFetcher, SearchClient};
use crate::types::{
    AnalysisRequest, DiscoveryOrder, RawDocument, ResearchContext, ResearchStats, SearchQuery,
};
use crate::utils::{catch_panic, run_bounded, truncate_chars, PhaseTimer, PoolLimits, SlotOutcome};

/// Como terminou a busca de uma query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum QueryOutcome {
    Succeeded,
    Empty,
    Failed,
}

/// Contribuição de uma única query (descartada se a query estourar o prazo)
#[derive(Debug)]
struct QueryHarvest {
    outcome: QueryOutcome,
    hits: usize,
    fetched: usize,
    fetch_failures: usize,
    total_chars: usize,
    documents: Vec<RawDocument>,
}

impl QueryHarvest {
    fn without_documents(outcome: QueryOutcome) -> Self {
        Self {
            outcome,
            hits: 0,
            fetched: 0,
            fetch_failures: 0,
            total_chars: 0,
            documents: Vec::new(),
        }
    }
}

/// Motor de pesquisa: busca + leitura concorrentes com pool limitado
pub struct ResearchEngine {
    search: Arc<dyn SearchClient>,
    fetcher: Arc<dyn DocumentFetcher>,
    config: ResearchConfig,
    ranker: Ranker,
    progress_callback: Option<ProgressCallback>,
}

impl ResearchEngine {
    pub fn new(
        search: Arc<dyn SearchClient>,
        fetcher: Arc<dyn DocumentFetcher>,
        config: ResearchConfig,
        ranker: Ranker,
    ) -> Self {
        Self {
            search,
            fetcher,
            config,
            ranker,
            progress_callback: None,
        }
    }

    /// Configura callback de progresso por query
    pub fn with_progress_callback(mut self, callback: Option<ProgressCallback>) -> Self {
        self.progress_callback = callback;
        self
    }

    /// Executa todas as queries e monta o contexto congelado
    ///
    /// Quando `deadline` chega, queries pendentes são abandonadas e o
    /// contexto é montado com o que já terminou.
    pub async fn research(
        &self,
        queries: &[SearchQuery],
        request: &AnalysisRequest,
        deadline: Instant,
    ) -> ResearchContext {
        let timer = PhaseTimer::start("research");
        let total = queries.len();

        log::info!(
            "🔍 Pesquisa: {} queries, {} workers, top {} URLs por query",
            total,
            self.config.workers,
            self.config.fetch_top_k
        );

        let tasks: Vec<_> = queries
            .iter()
            .enumerate()
            .map(|(index, query)| async move {
                match catch_panic(self.research_query(index, total, query)).await {
                    Ok(harvest) => harvest,
                    Err(panic) => {
                        log::error!("❌ Query '{}' entrou em pânico: {}", query.text, panic);
                        self.report(index, total, query, 0, "failed");
                        QueryHarvest::without_documents(QueryOutcome::Failed)
                    }
                }
            })
            .collect();

        let run = run_bounded(
            tasks,
            PoolLimits {
                workers: self.config.workers,
                per_task: Some(self.config.query_timeout),
                deadline,
            },
        )
        .await;

        let mut stats = ResearchStats {
            queries_planned: total,
            deadline_reached: run.deadline_reached,
            ..Default::default()
        };
        let mut documents = Vec::new();

        for (query, slot) in queries.iter().zip(run.slots) {
            match slot {
                SlotOutcome::Completed(harvest) => {
                    match harvest.outcome {
                        QueryOutcome::Succeeded => stats.queries_succeeded += 1,
                        QueryOutcome::Empty => stats.queries_empty += 1,
                        QueryOutcome::Failed => stats.queries_failed += 1,
                    }
                    stats.total_hits += harvest.hits;
                    stats.documents_fetched += harvest.fetched;
                    stats.fetch_failures += harvest.fetch_failures;
                    stats.total_chars += harvest.total_chars;
                    documents.extend(harvest.documents);
                }
                SlotOutcome::TimedOut(after) => {
                    log::warn!("⏰ Query '{}' excedeu {:?}, contribuição descartada", query.text, after);
                    stats.queries_timed_out += 1;
                }
                SlotOutcome::Abandoned => stats.queries_abandoned += 1,
            }
        }

        let mut ranked = self.ranker.rank(documents, request);
        stats.unique_documents = ranked.len();
        ranked.truncate(self.config.max_context_documents);

        log::info!(
            "✅ Pesquisa: {}/{} queries ok, {} páginas únicas, {} caracteres",
            stats.queries_succeeded,
            total,
            stats.unique_documents,
            stats.total_chars
        );
        timer.stop_and_log();

        ResearchContext::new(ranked, queries.to_vec(), stats)
    }

    /// Busca uma query e lê os top-K resultados
    async fn research_query(&self, index: usize, total: usize, query: &SearchQuery) -> QueryHarvest {
        let hits = match self.search.search(&query.text, self.config.results_per_query).await {
            Ok(hits) => hits,
            Err(e) => {
                log::error!("❌ Erro na query '{}': {}", query.text, e);
                self.report(index, total, query, 0, "failed");
                return QueryHarvest::without_documents(QueryOutcome::Failed);
            }
        };

        if hits.is_empty() {
            log::warn!("⚠️ Query '{}' retornou resultados vazios", query.text);
            self.report(index, total, query, 0, "empty");
            return QueryHarvest::without_documents(QueryOutcome::Empty);
        }

        let hit_count = hits.len();
        let fetch_timeout = self.config.fetch_timeout;

        // buffered mantém a ordem dos resultados da busca
        let fetched: Vec<_> = stream::iter(hits.into_iter().take(self.config.fetch_top_k).enumerate())
            .map(|(position, hit)| async move {
                let result = catch_panic(tokio::time::timeout(fetch_timeout, self.fetcher.fetch(&hit.url))).await;
                (position, hit, result)
            })
            .buffered(self.config.fetch_concurrency.max(1))
            .collect()
            .await;

        let mut harvest = QueryHarvest {
            hits: hit_count,
            ..QueryHarvest::without_documents(QueryOutcome::Succeeded)
        };

        for (position, hit, result) in fetched {
            harvest.fetched += 1;
            let text = match result {
                Ok(Ok(Ok(text))) => text,
                Ok(Ok(Err(e))) => {
                    log::debug!("Falha ao ler {}: {}", hit.url, e);
                    harvest.fetch_failures += 1;
                    continue;
                }
                Ok(Err(_)) => {
                    log::debug!("Leitura de {} excedeu {:?}", hit.url, fetch_timeout);
                    harvest.fetch_failures += 1;
                    continue;
                }
                Err(panic) => {
                    log::warn!("⚠️ Leitura de {} entrou em pânico: {}", hit.url, panic);
                    harvest.fetch_failures += 1;
                    continue;
                }
            };

            let chars = text.chars().count();
            if chars < self.config.min_document_chars {
                log::debug!("Descartando {} ({} caracteres)", hit.url, chars);
                continue;
            }

            harvest.total_chars += chars;
            harvest.documents.push(RawDocument {
                body: truncate_chars(&text, self.config.max_document_chars).to_string(),
                url: hit.url,
                title: hit.title,
                snippet: hit.snippet,
                query: query.text.clone(),
                facet: query.facet,
                discovery: DiscoveryOrder {
                    query_index: index,
                    position,
                },
            });
        }

        log::info!(
            "✅ Query '{}': {} resultados, {} documentos",
            query.text,
            hit_count,
            harvest.documents.len()
        );
        self.report(index, total, query, harvest.documents.len(), "ok");

        harvest
    }

    fn report(&self, index: usize, total: usize, query: &SearchQuery, documents: usize, status: &str) {
        emit(
            &self.progress_callback,
            AnalysisProgress::Query {
                index,
                total,
                query: query.text.clone(),
                documents,
                status: status.to_string(),
            },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::time::Duration;

    use crate::search::{MockBehavior, MockDocumentFetcher, MockSearchClient};
    use crate::types::{FacetTag, SearchHit};

    fn body(chars: usize) -> String {
        "fitness coaching mercado ".repeat(chars / 25 + 1)
    }

    fn engine(search: MockSearchClient, fetcher: MockDocumentFetcher) -> ResearchEngine {
        ResearchEngine::new(
            Arc::new(search),
            Arc::new(fetcher),
            ResearchConfig {
                query_timeout: Duration::from_millis(500),
                fetch_timeout: Duration::from_millis(200),
                ..Default::default()
            },
            Ranker::default(),
        )
    }

    fn queries(n: usize) -> Vec<SearchQuery> {
        (0..n)
            .map(|i| SearchQuery::new(format!("query {}", i), FacetTag::Segment))
            .collect()
    }

    fn deadline(ms: u64) -> Instant {
        Instant::now() + Duration::from_millis(ms)
    }

    #[tokio::test]
    async fn test_collects_and_dedups_across_queries() {
        let hits = vec![
            SearchHit::new("https://a.com", "A", ""),
            SearchHit::new("https://b.com", "B", ""),
        ];
        let engine = engine(
            MockSearchClient::with_hits(hits),
            MockDocumentFetcher::with_default_body(body(400)),
        );

        let ctx = engine
            .research(&queries(3), &AnalysisRequest::new("fitness coaching"), deadline(2_000))
            .await;

        assert_eq!(ctx.source_count(), 2);
        assert_eq!(ctx.stats().queries_succeeded, 3);
        assert_eq!(ctx.stats().documents_fetched, 6);
        assert_eq!(ctx.stats().unique_documents, 2);
        assert_eq!(ctx.documents()[0].document.query, "query 0");
    }

    #[tokio::test]
    async fn test_short_documents_are_discarded_and_long_truncated() {
        let mut pages = HashMap::new();
        pages.insert("https://short.com".to_string(), "curto".to_string());
        pages.insert("https://long.com".to_string(), "x".repeat(10_000));
        let hits = vec![
            SearchHit::new("https://short.com", "S", ""),
            SearchHit::new("https://long.com", "L", ""),
        ];
        let engine = engine(MockSearchClient::with_hits(hits), MockDocumentFetcher::with_pages(pages));

        let ctx = engine
            .research(&queries(1), &AnalysisRequest::new("fitness coaching"), deadline(2_000))
            .await;

        assert_eq!(ctx.source_count(), 1);
        assert_eq!(ctx.documents()[0].document.body.chars().count(), 4000);
        assert_eq!(ctx.total_chars(), 10_000);
    }

    #[tokio::test]
    async fn test_bad_url_does_not_fail_query() {
        let hits = vec![
            SearchHit::new("https://ok.com", "OK", ""),
            SearchHit::new("https://broken.com", "Broken", ""),
        ];
        let fetcher = MockDocumentFetcher::with_default_body(body(300)).failing_url("https://broken.com");
        let engine = engine(MockSearchClient::with_hits(hits), fetcher);

        let ctx = engine
            .research(&queries(1), &AnalysisRequest::new("fitness coaching"), deadline(2_000))
            .await;

        assert_eq!(ctx.stats().queries_succeeded, 1);
        assert_eq!(ctx.stats().fetch_failures, 1);
        assert_eq!(ctx.source_count(), 1);
    }

    #[tokio::test]
    async fn test_failing_search_yields_empty_context() {
        let engine = engine(MockSearchClient::failing(), MockDocumentFetcher::with_default_body(body(300)));

        let ctx = engine
            .research(&queries(4), &AnalysisRequest::new("fitness coaching"), deadline(2_000))
            .await;

        assert!(ctx.is_empty());
        assert_eq!(ctx.stats().queries_failed, 4);
        assert!(!ctx.meets_floor(15, 50_000));
    }

    #[tokio::test]
    async fn test_hanging_search_respects_deadline() {
        let engine = engine(MockSearchClient::hanging(), MockDocumentFetcher::with_default_body(body(300)));
        let started = std::time::Instant::now();

        let ctx = engine
            .research(&queries(10), &AnalysisRequest::new("fitness coaching"), deadline(300))
            .await;

        assert!(started.elapsed() < Duration::from_millis(1_000));
        assert!(ctx.is_empty());
        assert!(ctx.stats().deadline_reached);
        assert_eq!(ctx.stats().queries_abandoned + ctx.stats().queries_timed_out, 10);
    }

    #[tokio::test]
    async fn test_hanging_fetch_times_out_per_url() {
        let fetcher = MockDocumentFetcher::with_default_body(body(300)).with_behavior(MockBehavior::Hang);
        let engine = engine(MockSearchClient::new(), fetcher);

        let ctx = engine
            .research(&queries(1), &AnalysisRequest::new("fitness coaching"), deadline(2_000))
            .await;

        assert_eq!(ctx.stats().queries_succeeded, 1);
        assert_eq!(ctx.stats().fetch_failures, 3);
        assert!(ctx.is_empty());
    }

    #[tokio::test]
    async fn test_panicking_search_counts_as_failed_query() {
        let engine = engine(
            MockSearchClient::with_behavior(MockBehavior::Panic),
            MockDocumentFetcher::with_default_body(body(300)),
        );

        let ctx = engine
            .research(&queries(3), &AnalysisRequest::new("fitness coaching"), deadline(2_000))
            .await;

        assert!(ctx.is_empty());
        assert_eq!(ctx.stats().queries_failed, 3);
        assert!(!ctx.stats().deadline_reached);
    }

    #[tokio::test]
    async fn test_panicking_fetch_only_loses_that_url() {
        let fetcher = MockDocumentFetcher::with_default_body(body(300)).with_behavior(MockBehavior::Panic);
        let engine = engine(MockSearchClient::new(), fetcher);

        let ctx = engine
            .research(&queries(2), &AnalysisRequest::new("fitness coaching"), deadline(2_000))
            .await;

        assert_eq!(ctx.stats().queries_succeeded, 2);
        assert_eq!(ctx.stats().queries_failed, 0);
        assert_eq!(ctx.stats().fetch_failures, 6);
        assert!(ctx.is_empty());
    }
}
