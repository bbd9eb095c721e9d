// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// CLIENTE DE BUSCA E LEITOR DE DOCUMENTOS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//
// Traits consumidas pelo motor para busca web e extração de texto.
// O motor só enxerga "a chamada falhou ou teve sucesso": retries e
// cadeias de provedores ficam dentro de cada implementação.
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::{FetchError, ProviderError};
use crate::types::{SearchHit, Url};
use crate::utils::clean_text;

/// Trait principal para provedores de busca
#[async_trait]
pub trait SearchClient: Send + Sync {
    /// Executa uma busca, retornando no máximo `max_results` resultados
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchHit>, ProviderError>;

    /// Nome do provedor para logs
    fn name(&self) -> &str {
        "search"
    }
}

/// Trait para leitura e extração de texto de uma URL
#[async_trait]
pub trait DocumentFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String, FetchError>;
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// CADEIA DE FALLBACK
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Tenta cada provedor em ordem até obter resultados.
///
/// Um provedor que responde vazio passa a vez ao próximo. Se todos
/// falharem com erro, retorna `ProviderError::Exhausted`.
pub struct FallbackSearchClient {
    providers: Vec<Arc<dyn SearchClient>>,
}

impl FallbackSearchClient {
    pub fn new(providers: Vec<Arc<dyn SearchClient>>) -> Self {
        Self { providers }
    }
}

#[async_trait]
impl SearchClient for FallbackSearchClient {
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchHit>, ProviderError> {
        let mut errors = Vec::new();
        let mut answered = false;

        for provider in &self.providers {
            match provider.search(query, max_results).await {
                Ok(hits) if !hits.is_empty() => return Ok(hits),
                Ok(_) => {
                    log::debug!("🔍 {} sem resultados para '{}'", provider.name(), query);
                    answered = true;
                }
                Err(e) => {
                    log::warn!("⚠️ Provedor {} falhou: {}", provider.name(), e);
                    errors.push(format!("{}: {}", provider.name(), e));
                }
            }
        }

        if answered {
            Ok(Vec::new())
        } else {
            Err(ProviderError::Exhausted(errors.join("; ")))
        }
    }

    fn name(&self) -> &str {
        "fallback-chain"
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// IMPLEMENTAÇÃO JINA
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Deserialize)]
struct JinaSearchResponse {
    #[serde(default)]
    data: Vec<JinaSearchItem>,
}

#[derive(Debug, Deserialize)]
struct JinaSearchItem {
    #[serde(default)]
    url: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    description: String,
}

/// Cliente para a API de busca da Jina AI
pub struct JinaSearchClient {
    api_key: String,
    endpoint: String,
    client: reqwest::Client,
}

impl JinaSearchClient {
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            endpoint: "https://s.jina.ai".into(),
            client: reqwest::Client::new(),
        }
    }

    pub fn with_endpoint(mut self, endpoint: &str) -> Self {
        self.endpoint = endpoint.trim_end_matches('/').into();
        self
    }
}

#[async_trait]
impl SearchClient for JinaSearchClient {
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchHit>, ProviderError> {
        let url = format!("{}/?q={}", self.endpoint, urlencoding::encode(query));

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.api_key)
            .header("Accept", "application/json")
            .header("X-Respond-With", "no-content")
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(ProviderError::RateLimited);
        }
        if !status.is_success() {
            return Err(ProviderError::Api(format!("Jina search HTTP {}", status.as_u16())));
        }

        let body: JinaSearchResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;

        Ok(body
            .data
            .into_iter()
            .filter(|item| !item.url.is_empty())
            .take(max_results)
            .map(|item| SearchHit::new(item.url, item.title, item.description))
            .collect())
    }

    fn name(&self) -> &str {
        "jina"
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// LEITOR HTTP LOCAL
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Leitor HTTP com extração Readability + html2text
pub struct HttpDocumentFetcher {
    client: reqwest::Client,
    timeout: Duration,
    min_chars: usize,
}

impl HttpDocumentFetcher {
    pub fn new(timeout: Duration, min_chars: usize) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent("Mozilla/5.0 (compatible; deep-analysis/0.1)")
            .build()
            .map_err(|e| FetchError::Network(e.to_string()))?;

        Ok(Self {
            client,
            timeout,
            min_chars,
        })
    }

    /// Extrai o texto principal de um HTML.
    ///
    /// Usa Readability primeiro; se falhar, converte o HTML inteiro.
    fn extract_html(data: &[u8], url: &url::Url) -> String {
        match readability::extractor::extract(&mut &data[..], url) {
            Ok(product) => html2text::from_read(product.content.as_bytes(), 120),
            Err(e) => {
                log::debug!("Readability falhou para {}: {}, usando html2text", url, e);
                html2text::from_read(data, 120)
            }
        }
    }
}

#[async_trait]
impl DocumentFetcher for HttpDocumentFetcher {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let parsed = url::Url::parse(url)
            .map_err(|e| FetchError::Network(format!("invalid url {}: {}", url, e)))?;

        let response = self.client.get(parsed.clone()).send().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout(self.timeout)
            } else {
                FetchError::Network(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::HttpStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("text/html")
            .to_lowercase();

        let bytes = response
            .bytes()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;

        let raw = if content_type.contains("html") {
            Self::extract_html(&bytes, &parsed)
        } else if content_type.starts_with("text/") || content_type.contains("json") || content_type.contains("xml") {
            String::from_utf8_lossy(&bytes).into_owned()
        } else {
            return Err(FetchError::NonTextContent {
                content_type,
                url: url.to_string(),
            });
        };

        let text = clean_text(&raw);
        let chars = text.chars().count();
        if chars < self.min_chars {
            return Err(FetchError::TooShort { chars });
        }

        Ok(text)
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// IMPLEMENTAÇÃO MOCK PARA TESTES
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Comportamento simulado de um provedor
#[derive(Debug, Clone, PartialEq)]
pub enum MockBehavior {
    /// Responde normalmente
    Succeed,
    /// Sempre falha
    Fail,
    /// Nunca responde
    Hang,
    /// Responde após o atraso
    Delay(Duration),
    /// Entra em pânico na chamada
    Panic,
}

impl MockBehavior {
    /// Aplica o comportamento; `false` significa falhar
    pub(crate) async fn apply(&self) -> bool {
        match self {
            Self::Succeed => true,
            Self::Fail => false,
            Self::Hang => std::future::pending::<bool>().await,
            Self::Delay(d) => {
                tokio::time::sleep(*d).await;
                true
            }
            Self::Panic => panic!("mock provider panic"),
        }
    }
}

/// Cliente de busca simulado
#[derive(Debug)]
pub struct MockSearchClient {
    behavior: MockBehavior,
    hits: Option<Vec<SearchHit>>,
    hits_per_query: usize,
    calls: AtomicUsize,
}

impl MockSearchClient {
    /// Gera 3 resultados distintos por query
    pub fn new() -> Self {
        Self {
            behavior: MockBehavior::Succeed,
            hits: None,
            hits_per_query: 3,
            calls: AtomicUsize::new(0),
        }
    }

    /// Sempre responde com os mesmos resultados
    pub fn with_hits(hits: Vec<SearchHit>) -> Self {
        Self {
            hits: Some(hits),
            ..Self::new()
        }
    }

    pub fn with_behavior(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            ..Self::new()
        }
    }

    pub fn failing() -> Self {
        Self::with_behavior(MockBehavior::Fail)
    }

    pub fn hanging() -> Self {
        Self::with_behavior(MockBehavior::Hang)
    }

    /// Número de buscas recebidas
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Default for MockSearchClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SearchClient for MockSearchClient {
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchHit>, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if !self.behavior.apply().await {
            return Err(ProviderError::Api("mock search failure".into()));
        }

        let hits = match &self.hits {
            Some(hits) => hits.clone(),
            None => {
                let slug: String = query
                    .chars()
                    .map(|c| if c.is_alphanumeric() { c } else { '-' })
                    .collect();
                (0..self.hits_per_query)
                    .map(|i| {
                        SearchHit::new(
                            format!("https://example.com/{}/{}", slug, i),
                            format!("Resultado {} para {}", i, query),
                            "Mock snippet",
                        )
                    })
                    .collect()
            }
        };

        Ok(hits.into_iter().take(max_results).collect())
    }

    fn name(&self) -> &str {
        "mock"
    }
}

/// Leitor de documentos simulado
#[derive(Debug)]
pub struct MockDocumentFetcher {
    behavior: MockBehavior,
    pages: HashMap<Url, String>,
    failing_urls: HashSet<Url>,
    default_body: Option<String>,
}

impl MockDocumentFetcher {
    /// Responde qualquer URL com o mesmo corpo
    pub fn with_default_body(body: impl Into<String>) -> Self {
        Self {
            behavior: MockBehavior::Succeed,
            pages: HashMap::new(),
            failing_urls: HashSet::new(),
            default_body: Some(body.into()),
        }
    }

    /// Responde apenas as URLs cadastradas (demais retornam 404)
    pub fn with_pages(pages: HashMap<Url, String>) -> Self {
        Self {
            behavior: MockBehavior::Succeed,
            pages,
            failing_urls: HashSet::new(),
            default_body: None,
        }
    }

    pub fn with_behavior(mut self, behavior: MockBehavior) -> Self {
        self.behavior = behavior;
        self
    }

    /// Faz uma URL específica falhar
    pub fn failing_url(mut self, url: impl Into<String>) -> Self {
        self.failing_urls.insert(url.into());
        self
    }
}

#[async_trait]
impl DocumentFetcher for MockDocumentFetcher {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        if !self.behavior.apply().await {
            return Err(FetchError::Network("mock fetch failure".into()));
        }

        if self.failing_urls.contains(url) {
            return Err(FetchError::HttpStatus {
                status: 500,
                url: url.to_string(),
            });
        }

        self.pages
            .get(url)
            .or(self.default_body.as_ref())
            .cloned()
            .ok_or_else(|| FetchError::HttpStatus {
                status: 404,
                url: url.to_string(),
            })
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// UTILITÁRIOS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Extrai hostname de uma URL
pub fn extract_hostname(url: &str) -> Option<String> {
    url::Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(String::from))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_hostname() {
        assert_eq!(
            extract_hostname("https://www.example.com/path"),
            Some("www.example.com".into())
        );
        assert_eq!(extract_hostname("invalid"), None);
    }

    #[tokio::test]
    async fn test_mock_search_generates_distinct_urls() {
        let client = MockSearchClient::new();
        let hits = client.search("fitness coaching", 10).await.unwrap();

        assert_eq!(hits.len(), 3);
        assert_eq!(hits[0].url, "https://example.com/fitness-coaching/0");
        assert_eq!(client.calls(), 1);
    }

    #[tokio::test]
    async fn test_mock_search_respects_max_results() {
        let client = MockSearchClient::new();
        let hits = client.search("x", 2).await.unwrap();
        assert_eq!(hits.len(), 2);
    }

    #[tokio::test]
    async fn test_fallback_chain_skips_failures() {
        let chain = FallbackSearchClient::new(vec![
            Arc::new(MockSearchClient::failing()),
            Arc::new(MockSearchClient::with_hits(vec![SearchHit::new("https://a.com", "A", "")])),
        ]);

        let hits = chain.search("q", 5).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].url, "https://a.com");
    }

    #[tokio::test]
    async fn test_fallback_chain_exhausted() {
        let chain = FallbackSearchClient::new(vec![
            Arc::new(MockSearchClient::failing()),
            Arc::new(MockSearchClient::failing()),
        ]);

        let err = chain.search("q", 5).await.unwrap_err();
        assert!(matches!(err, ProviderError::Exhausted(_)));
    }

    #[test]
    fn test_fallback_chain_empty_answer_is_ok() {
        let chain = FallbackSearchClient::new(vec![
            Arc::new(MockSearchClient::with_hits(vec![])),
            Arc::new(MockSearchClient::failing()),
        ]);

        let hits = tokio_test::block_on(chain.search("q", 5)).unwrap();
        assert!(hits.is_empty());
    }

    #[tokio::test]
    async fn test_mock_fetcher_pages_and_failures() {
        let mut pages = HashMap::new();
        pages.insert("https://a.com".to_string(), "conteúdo".to_string());
        let fetcher = MockDocumentFetcher::with_pages(pages).failing_url("https://b.com");

        assert_eq!(fetcher.fetch("https://a.com").await.unwrap(), "conteúdo");
        assert!(matches!(
            fetcher.fetch("https://b.com").await,
            Err(FetchError::HttpStatus { status: 500, .. })
        ));
        assert!(matches!(
            fetcher.fetch("https://c.com").await,
            Err(FetchError::HttpStatus { status: 404, .. })
        ));
    }
}
