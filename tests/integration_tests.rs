//! # Testes de Integração
//!
//! Este módulo valida o fluxo completo do motor com clientes simulados:
//! - Planner → Pesquisa → Ranking: documentos únicos e ordem estável
//! - Falhas de provedores: nunca viram falha total
//! - Prazos: o pipeline termina dentro do orçamento mesmo com chamadas travadas
//! - Cenários completos de análise

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use mockall::mock;

use deep_analysis::config::AnalysisConfig;
use deep_analysis::error::{AnalysisError, FetchError, ProviderError};
use deep_analysis::llm::{GenerationClient, MockGenerationClient, NamedBackend};
use deep_analysis::planning::QueryPlanner;
use deep_analysis::progress::AnalysisProgress;
use deep_analysis::research::Ranker;
use deep_analysis::search::{
    DocumentFetcher, FallbackSearchClient, MockDocumentFetcher, MockSearchClient, SearchClient,
};
use deep_analysis::sections::is_degraded_payload;
use deep_analysis::types::{
    AnalysisRequest, DiscoveryOrder, FacetTag, RawDocument, SearchHit, TaskStatus,
};
use deep_analysis::AnalysisOrchestrator;

mock! {
    pub Search {}

    #[async_trait]
    impl SearchClient for Search {
        async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchHit>, ProviderError>;
    }
}

/// Leitor cujo extrator entra em pânico em qualquer página
struct PanickingFetcher;

#[async_trait]
impl DocumentFetcher for PanickingFetcher {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        panic!("extrator quebrou em {}", url)
    }
}

const BUDGET: Duration = Duration::from_secs(10);

fn body(topic: &str) -> String {
    format!("{} mercado brasil crescimento tendência. ", topic).repeat(20)
}

fn orchestrator(
    search: Arc<dyn SearchClient>,
    fetcher: Arc<dyn DocumentFetcher>,
    backends: Vec<NamedBackend>,
) -> AnalysisOrchestrator {
    AnalysisOrchestrator::new(search, fetcher, backends, AnalysisConfig::default())
}

fn backend(name: &str, client: MockGenerationClient) -> NamedBackend {
    NamedBackend::new(name, Arc::new(client))
}

fn raw(url: &str, body: &str, query_index: usize, position: usize) -> RawDocument {
    RawDocument {
        url: url.to_string(),
        title: url.to_string(),
        snippet: String::new(),
        body: body.to_string(),
        query: format!("q{}", query_index),
        facet: FacetTag::Segment,
        discovery: DiscoveryOrder {
            query_index,
            position,
        },
    }
}

// ============================================================================
// TESTE 1: Deduplicação e ranking
// ============================================================================

#[test]
fn test_ranker_never_returns_duplicate_urls() {
    let request = AnalysisRequest::new("fitness coaching");
    let documents: Vec<RawDocument> = (0..40)
        .map(|i| raw(&format!("https://site.com/{}", i % 7), &body("fitness coaching"), i / 5, i % 5))
        .collect();

    let ranked = Ranker::default().rank(documents, &request);

    let mut urls: Vec<&str> = ranked.iter().map(|d| d.url()).collect();
    urls.sort();
    urls.dedup();
    assert_eq!(urls.len(), ranked.len());
    assert_eq!(ranked.len(), 7);
    assert!(ranked.iter().enumerate().all(|(i, d)| d.rank == i + 1));
}

#[test]
fn test_ranking_is_stable_under_reshuffle() {
    let request = AnalysisRequest::new("fitness coaching");
    let same = body("fitness coaching");
    let documents: Vec<RawDocument> = (0..12)
        .map(|i| raw(&format!("https://site.com/{}", i), &same, i / 4, i % 4))
        .collect();

    let mut reversed = documents.clone();
    reversed.reverse();
    let mut rotated = documents.clone();
    rotated.rotate_left(5);

    let ranker = Ranker::default();
    let expected: Vec<String> = ranker
        .rank(documents, &request)
        .iter()
        .map(|d| d.url().to_string())
        .collect();

    for input in [reversed, rotated] {
        let order: Vec<String> = ranker.rank(input, &request).iter().map(|d| d.url().to_string()).collect();
        assert_eq!(order, expected);
    }
    // empate: primeiro descoberto fica à frente
    assert_eq!(expected[0], "https://site.com/0");
}

#[test]
fn test_planner_feeds_research_with_primary_query_first() {
    let request = AnalysisRequest::new("fitness coaching").with_product("app");
    let queries = QueryPlanner::new(20).plan(&request);

    assert!(!queries.is_empty());
    assert!(queries.len() <= 20);
    assert!(queries[0].text.contains("fitness coaching"));
    assert_eq!(queries, QueryPlanner::new(20).plan(&request));
}

// ============================================================================
// TESTE 2: Validação
// ============================================================================

#[tokio::test]
async fn test_validation_is_the_only_hard_failure() {
    let orchestrator = orchestrator(
        Arc::new(MockSearchClient::failing()),
        Arc::new(MockDocumentFetcher::with_default_body("")),
        vec![backend("primary", MockGenerationClient::failing())],
    );

    for segment in ["", "   ", "abc"] {
        let err = orchestrator
            .run_analysis(AnalysisRequest::new(segment), BUDGET)
            .await
            .unwrap_err();
        assert!(matches!(err, AnalysisError::Validation(_)), "{:?}", segment);
    }

    assert!(orchestrator
        .run_analysis(AnalysisRequest::new("fitness"), BUDGET)
        .await
        .is_ok());
}

// ============================================================================
// TESTE 3: Cenário sem provedores de busca
// ============================================================================

#[tokio::test]
async fn test_scenario_no_working_search_providers() {
    let search = FallbackSearchClient::new(vec![
        Arc::new(MockSearchClient::failing()) as Arc<dyn SearchClient>,
        Arc::new(MockSearchClient::failing()) as Arc<dyn SearchClient>,
    ]);
    let orchestrator = orchestrator(
        Arc::new(search),
        Arc::new(MockDocumentFetcher::with_default_body(body("fitness"))),
        vec![backend("primary", MockGenerationClient::failing())],
    );

    let result = orchestrator
        .run_analysis(AnalysisRequest::new("fitness coaching"), BUDGET)
        .await
        .unwrap();

    assert!(result.research.sources.is_empty());
    assert_eq!(result.research.stats.unique_documents, 0);
    assert_eq!(result.research.stats.queries_failed, result.research.stats.queries_planned);
    assert_eq!(result.metadata.degraded_sections, result.metadata.total_sections);
    assert_eq!(result.metadata.total_sections, 10);
    assert!(result.sections.values().all(|s| is_degraded_payload(&s.result.payload)));
}

// ============================================================================
// TESTE 4: Cenário com um de dois backends funcionando
// ============================================================================

#[tokio::test]
async fn test_scenario_one_of_two_backends_succeeds() {
    let hits = vec![
        SearchHit::new("https://a.com/fitness", "Fitness A", "a"),
        SearchHit::new("https://b.com/app", "App B", "b"),
        SearchHit::new("https://c.com/coach", "Coach C", "c"),
    ];
    let pages: HashMap<String, String> = hits
        .iter()
        .map(|h| (h.url.clone(), body("fitness coaching app")))
        .collect();

    let working = Arc::new(MockGenerationClient::responding(
        r#"```json
{"marcador_semente": "avatar fitness", "insights": ["Demanda crescente por apps"]}
```"#,
    ));
    let backends = vec![
        backend("primary", MockGenerationClient::failing()),
        NamedBackend::new("secondary", working.clone() as Arc<dyn GenerationClient>),
    ];

    let orchestrator = orchestrator(
        Arc::new(MockSearchClient::with_hits(hits)),
        Arc::new(MockDocumentFetcher::with_pages(pages)),
        backends,
    );

    let result = orchestrator
        .run_analysis(
            AnalysisRequest::new("fitness coaching").with_product("app"),
            BUDGET,
        )
        .await
        .unwrap();

    assert_eq!(result.research.sources.len(), 3);

    let seed = result.seed_analysis.as_ref().unwrap();
    assert_eq!(seed["marcador_semente"], "avatar fitness");

    assert_eq!(result.metadata.backends_total, 2);
    assert_eq!(result.metadata.backend_failures, 1);
    assert_eq!(result.metadata.backend_statuses["primary"], TaskStatus::Failed);
    assert_eq!(result.metadata.backend_statuses["secondary"], TaskStatus::Success);

    // todas as seções receberam a semente no prompt
    let seeded = working
        .prompts()
        .iter()
        .filter(|p| p.contains("marcador_semente"))
        .count();
    assert_eq!(seeded, 10);

    assert_eq!(result.metadata.real_sections, 10);
    assert!(result.insights.iter().any(|i| i == "Demanda crescente por apps"));
}

// ============================================================================
// TESTE 5: Prazo do pipeline com provedores travados
// ============================================================================

#[tokio::test]
async fn test_pipeline_returns_within_deadline_when_everything_hangs() {
    let orchestrator = orchestrator(
        Arc::new(MockSearchClient::hanging()),
        Arc::new(MockDocumentFetcher::with_default_body(body("fitness"))),
        vec![
            backend("primary", MockGenerationClient::hanging()),
            backend("secondary", MockGenerationClient::hanging()),
        ],
    );

    let deadline = Duration::from_millis(1_000);
    let started = Instant::now();
    let result = orchestrator
        .run_analysis(AnalysisRequest::new("fitness coaching"), deadline)
        .await
        .unwrap();

    assert!(started.elapsed() < deadline + Duration::from_millis(500));
    assert!(result.research.stats.deadline_reached);
    assert_eq!(result.metadata.backend_failures, 2);
    assert!(result
        .metadata
        .backend_statuses
        .values()
        .all(|s| *s == TaskStatus::TimedOut));
    assert!(result.is_fully_degraded());
}

#[tokio::test]
async fn test_hanging_fetches_do_not_block_research() {
    let orchestrator = orchestrator(
        Arc::new(MockSearchClient::new()),
        Arc::new(
            MockDocumentFetcher::with_default_body(body("fitness"))
                .with_behavior(deep_analysis::search::MockBehavior::Hang),
        ),
        vec![backend("primary", MockGenerationClient::new())],
    );

    let deadline = Duration::from_millis(1_500);
    let started = Instant::now();
    let result = orchestrator
        .run_analysis(AnalysisRequest::new("fitness coaching"), deadline)
        .await
        .unwrap();

    assert!(started.elapsed() < deadline + Duration::from_millis(500));
    assert!(result.research.sources.is_empty());
    assert_eq!(result.metadata.real_sections, 10);
}

// ============================================================================
// TESTE 6: Falha total de geração e score
// ============================================================================

#[tokio::test]
async fn test_all_generation_failures_still_produce_full_report() {
    let failing = orchestrator(
        Arc::new(MockSearchClient::new()),
        Arc::new(MockDocumentFetcher::with_default_body(body("fitness coaching"))),
        vec![
            backend("primary", MockGenerationClient::failing()),
            backend("secondary", MockGenerationClient::malformed()),
        ],
    );
    let working = orchestrator(
        Arc::new(MockSearchClient::new()),
        Arc::new(MockDocumentFetcher::with_default_body(body("fitness coaching"))),
        vec![backend("primary", MockGenerationClient::new())],
    );

    let degraded = failing
        .run_analysis(AnalysisRequest::new("fitness coaching"), BUDGET)
        .await
        .unwrap();
    let real = working
        .run_analysis(AnalysisRequest::new("fitness coaching"), BUDGET)
        .await
        .unwrap();

    assert_eq!(degraded.sections.len(), 10);
    assert!(degraded.sections.values().all(|s| s.result.fallback));
    assert!(degraded.seed_analysis.is_none());
    assert!(degraded.quality_score >= 0.0);
    assert!(degraded.quality_score < real.quality_score);
    assert!(real.quality_score <= 100.0);
}

#[tokio::test]
async fn test_panicking_backend_is_contained() {
    let orchestrator = orchestrator(
        Arc::new(MockSearchClient::new()),
        Arc::new(MockDocumentFetcher::with_default_body(body("fitness"))),
        vec![backend("primary", MockGenerationClient::panicking())],
    );

    let result = orchestrator
        .run_analysis(AnalysisRequest::new("fitness coaching"), BUDGET)
        .await
        .unwrap();

    assert!(result.is_fully_degraded());
    assert_eq!(result.metadata.backend_statuses["primary"], TaskStatus::Failed);
}

#[tokio::test]
async fn test_panicking_fetcher_is_contained() {
    let orchestrator = orchestrator(
        Arc::new(MockSearchClient::new()),
        Arc::new(PanickingFetcher),
        vec![backend("primary", MockGenerationClient::new())],
    );

    let result = orchestrator
        .run_analysis(AnalysisRequest::new("fitness coaching"), Duration::from_secs(5))
        .await
        .unwrap();

    let stats = &result.research.stats;
    assert!(result.research.sources.is_empty());
    assert_eq!(stats.queries_succeeded, stats.queries_planned);
    assert_eq!(stats.fetch_failures, stats.documents_fetched);
    assert!(stats.fetch_failures > 0);
    assert_eq!(result.sections.len(), 10);
}

// ============================================================================
// TESTE 7: Cadeia de busca com mock do mockall
// ============================================================================

#[tokio::test]
async fn test_rate_limited_provider_falls_back_to_next() {
    let mut limited = MockSearch::new();
    limited
        .expect_search()
        .returning(|_, _| Err(ProviderError::RateLimited));

    let backup = Arc::new(MockSearchClient::new());
    let search = FallbackSearchClient::new(vec![
        Arc::new(limited) as Arc<dyn SearchClient>,
        backup.clone() as Arc<dyn SearchClient>,
    ]);

    let orchestrator = orchestrator(
        Arc::new(search),
        Arc::new(MockDocumentFetcher::with_default_body(body("fitness coaching"))),
        vec![backend("primary", MockGenerationClient::new())],
    );

    let result = orchestrator
        .run_analysis(AnalysisRequest::new("fitness coaching"), BUDGET)
        .await
        .unwrap();

    assert_eq!(backup.calls(), result.research.stats.queries_planned);
    assert_eq!(result.research.stats.queries_failed, 0);
    assert!(!result.research.sources.is_empty());
}

// ============================================================================
// TESTE 8: Eventos de progresso
// ============================================================================

#[tokio::test]
async fn test_progress_events_cover_every_section() {
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = events.clone();

    let orchestrator = orchestrator(
        Arc::new(MockSearchClient::new()),
        Arc::new(MockDocumentFetcher::with_default_body(body("fitness"))),
        vec![backend("primary", MockGenerationClient::new())],
    )
    .with_progress_callback(Arc::new(move |event| sink.lock().unwrap().push(event)));

    orchestrator
        .run_analysis(AnalysisRequest::new("fitness coaching"), BUDGET)
        .await
        .unwrap();

    let events = events.lock().unwrap();
    let sections = events
        .iter()
        .filter(|e| matches!(e, AnalysisProgress::Section { .. }))
        .count();
    assert_eq!(sections, 10);
    assert!(matches!(events.last(), Some(AnalysisProgress::Completed { .. })));
}
