// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// TIPOS COMPARTILHADOS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Tipo de URL (alias para String)
pub type Url = String;

/// Campos estruturados devolvidos por uma geração (objeto JSON)
pub type JsonMap = serde_json::Map<String, Value>;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// REQUISIÇÃO
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Requisição de análise - imutável durante toda a execução
///
/// `segment` é a única faceta obrigatória. As demais são opcionais e,
/// quando ausentes, apenas reduzem o número de queries planejadas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRequest {
    /// Segmento de mercado (obrigatório)
    pub segment: String,
    /// Produto ou serviço
    #[serde(default)]
    pub product: Option<String>,
    /// Público-alvo
    #[serde(default)]
    pub audience: Option<String>,
    /// Preço do produto
    #[serde(default)]
    pub price: Option<f64>,
    /// Orçamento de marketing
    #[serde(default)]
    pub budget: Option<f64>,
    /// Prazo de lançamento
    #[serde(default)]
    pub timeline: Option<String>,
    /// Query principal explícita (derivada do segmento quando ausente)
    #[serde(default)]
    pub query: Option<String>,
    /// Dados adicionais em texto livre
    #[serde(default)]
    pub extras: BTreeMap<String, String>,
    /// ID de correlação fornecido pelo chamador
    pub correlation_id: String,
    /// Ano de referência das queries temporais, fixado na criação
    #[serde(default = "current_year")]
    pub reference_year: i32,
}

fn current_year() -> i32 {
    Utc::now().year()
}

impl AnalysisRequest {
    /// Cria uma requisição apenas com o segmento e um ID de correlação novo
    pub fn new(segment: impl Into<String>) -> Self {
        Self {
            segment: segment.into(),
            product: None,
            audience: None,
            price: None,
            budget: None,
            timeline: None,
            query: None,
            extras: BTreeMap::new(),
            correlation_id: uuid::Uuid::new_v4().to_string(),
            reference_year: current_year(),
        }
    }

    pub fn with_product(mut self, product: impl Into<String>) -> Self {
        self.product = Some(product.into());
        self
    }

    pub fn with_audience(mut self, audience: impl Into<String>) -> Self {
        self.audience = Some(audience.into());
        self
    }

    pub fn with_price(mut self, price: f64) -> Self {
        self.price = Some(price);
        self
    }

    pub fn with_budget(mut self, budget: f64) -> Self {
        self.budget = Some(budget);
        self
    }

    pub fn with_timeline(mut self, timeline: impl Into<String>) -> Self {
        self.timeline = Some(timeline.into());
        self
    }

    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extras.insert(key.into(), value.into());
        self
    }

    pub fn with_correlation_id(mut self, id: impl Into<String>) -> Self {
        self.correlation_id = id.into();
        self
    }

    pub fn with_reference_year(mut self, year: i32) -> Self {
        self.reference_year = year;
        self
    }

    /// Segmento sem espaços nas pontas
    pub fn segment(&self) -> &str {
        self.segment.trim()
    }

    /// Produto, se informado e não vazio
    pub fn product(&self) -> Option<&str> {
        non_empty(&self.product)
    }

    /// Público, se informado e não vazio
    pub fn audience(&self) -> Option<&str> {
        non_empty(&self.audience)
    }

    /// Prazo, se informado e não vazio
    pub fn timeline(&self) -> Option<&str> {
        non_empty(&self.timeline)
    }

    /// Query principal explícita, se houver
    pub fn explicit_query(&self) -> Option<&str> {
        non_empty(&self.query)
    }

    /// Texto da faceta correspondente à tag
    pub fn facet(&self, tag: FacetTag) -> Option<&str> {
        match tag {
            FacetTag::Segment => Some(self.segment()).filter(|s| !s.is_empty()),
            FacetTag::Product => self.product(),
            FacetTag::Audience => self.audience(),
            FacetTag::Market => None,
        }
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// Faceta que originou uma query de busca
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FacetTag {
    /// Query centrada no segmento
    Segment,
    /// Query centrada no produto
    Product,
    /// Query centrada no público-alvo
    Audience,
    /// Inteligência de mercado genérica
    Market,
}

impl FacetTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Segment => "segment",
            Self::Product => "product",
            Self::Audience => "audience",
            Self::Market => "market",
        }
    }
}

/// Query de busca com a faceta de origem. Nunca é alterada após criada.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchQuery {
    pub text: String,
    pub facet: FacetTag,
}

impl SearchQuery {
    pub fn new(text: impl Into<String>, facet: FacetTag) -> Self {
        Self {
            text: text.into(),
            facet,
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// DOCUMENTOS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Resultado bruto do provedor de busca
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub url: Url,
    pub title: String,
    pub snippet: String,
}

impl SearchHit {
    pub fn new(url: impl Into<String>, title: impl Into<String>, snippet: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            title: title.into(),
            snippet: snippet.into(),
        }
    }
}

/// Posição de descoberta: (índice da query, posição no resultado)
///
/// A ordenação derivada é lexicográfica, o que torna o desempate do
/// ranking determinístico para um mesmo conjunto de documentos.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DiscoveryOrder {
    pub query_index: usize,
    pub position: usize,
}

/// Documento coletado pelo fan-out de pesquisa
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawDocument {
    pub url: Url,
    pub title: String,
    pub snippet: String,
    /// Texto extraído (já truncado)
    pub body: String,
    /// Query que originou o documento
    pub query: String,
    pub facet: FacetTag,
    pub discovery: DiscoveryOrder,
}

/// Documento deduplicado com score de relevância e rank (1-based)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedDocument {
    #[serde(flatten)]
    pub document: RawDocument,
    pub score: f64,
    pub rank: usize,
}

impl RankedDocument {
    pub fn url(&self) -> &str {
        &self.document.url
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// CONTEXTO DE PESQUISA
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Contadores agregados do fan-out de pesquisa
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResearchStats {
    pub queries_planned: usize,
    pub queries_succeeded: usize,
    /// Queries que responderam sem nenhum resultado
    pub queries_empty: usize,
    pub queries_failed: usize,
    pub queries_timed_out: usize,
    /// Queries descartadas pelo prazo da fase
    pub queries_abandoned: usize,
    pub total_hits: usize,
    pub documents_fetched: usize,
    pub fetch_failures: usize,
    pub unique_documents: usize,
    /// Caracteres extraídos (tamanho integral, antes do truncamento)
    pub total_chars: usize,
    /// Se o prazo da fase de pesquisa foi atingido
    pub deadline_reached: bool,
}

/// Conjunto congelado de documentos ranqueados, compartilhado (somente
/// leitura) por todas as gerações seguintes
#[derive(Debug, Clone, Default)]
pub struct ResearchContext {
    documents: Vec<RankedDocument>,
    queries: Vec<SearchQuery>,
    stats: ResearchStats,
}

impl ResearchContext {
    pub fn new(documents: Vec<RankedDocument>, queries: Vec<SearchQuery>, stats: ResearchStats) -> Self {
        Self {
            documents,
            queries,
            stats,
        }
    }

    /// Contexto vazio (nenhuma fonte)
    pub fn empty(queries: Vec<SearchQuery>) -> Self {
        let stats = ResearchStats {
            queries_planned: queries.len(),
            ..Default::default()
        };
        Self::new(Vec::new(), queries, stats)
    }

    pub fn documents(&self) -> &[RankedDocument] {
        &self.documents
    }

    pub fn queries(&self) -> &[SearchQuery] {
        &self.queries
    }

    pub fn stats(&self) -> &ResearchStats {
        &self.stats
    }

    pub fn source_count(&self) -> usize {
        self.documents.len()
    }

    pub fn total_chars(&self) -> usize {
        self.stats.total_chars
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Verifica os pisos (consultivos) de volume de pesquisa
    ///
    /// Conta as páginas únicas descobertas, não só as que couberam no contexto.
    pub fn meets_floor(&self, min_sources: usize, min_chars: usize) -> bool {
        self.stats.unique_documents >= min_sources && self.total_chars() >= min_chars
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// RESULTADOS DE TAREFAS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Status final de uma tarefa
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Success,
    Failed,
    TimedOut,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Failed => "failed",
            Self::TimedOut => "timed_out",
        }
    }
}

/// Resultado de uma tarefa (backend ou seção). Imutável após produzido.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskResult {
    pub task: String,
    pub status: TaskStatus,
    /// Dados estruturados, texto bruto ou payload de fallback
    pub payload: Value,
    /// Payload sintético produzido pelo gerador de fallback
    pub fallback: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub elapsed_ms: u64,
}

impl TaskResult {
    pub fn success(task: impl Into<String>, payload: Value, elapsed_ms: u64) -> Self {
        Self {
            task: task.into(),
            status: TaskStatus::Success,
            payload,
            fallback: false,
            error: None,
            elapsed_ms,
        }
    }

    pub fn failed(task: impl Into<String>, error: impl Into<String>, elapsed_ms: u64) -> Self {
        Self {
            task: task.into(),
            status: TaskStatus::Failed,
            payload: Value::Null,
            fallback: false,
            error: Some(error.into()),
            elapsed_ms,
        }
    }

    pub fn timed_out(task: impl Into<String>, error: impl Into<String>, elapsed_ms: u64) -> Self {
        Self {
            status: TaskStatus::TimedOut,
            ..Self::failed(task, error, elapsed_ms)
        }
    }

    /// Substitui o payload pelo resultado do gerador de fallback
    pub fn with_fallback(mut self, payload: Value) -> Self {
        self.payload = payload;
        self.fallback = true;
        self
    }

    /// Sucesso real (não sintético)
    pub fn is_real(&self) -> bool {
        self.status == TaskStatus::Success && !self.fallback
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// RESULTADO FINAL
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Peso da seção no relatório
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionKind {
    Primary,
    Secondary,
}

/// Seção do relatório já resolvida (real ou fallback)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionOutcome {
    pub kind: SectionKind,
    #[serde(flatten)]
    pub result: TaskResult,
}

/// Referência a uma fonte usada no contexto
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceRef {
    pub url: Url,
    pub title: String,
    pub score: f64,
    pub rank: usize,
    pub query: String,
}

/// Resumo da pesquisa anexado ao resultado
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResearchSummary {
    pub stats: ResearchStats,
    pub queries: Vec<String>,
    pub sources: Vec<SourceRef>,
    /// Se os pisos de volume de pesquisa foram atingidos
    pub floor_met: bool,
}

/// Metadados da execução
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunMetadata {
    pub correlation_id: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub elapsed_ms: u64,
    pub total_sections: usize,
    pub real_sections: usize,
    pub degraded_sections: usize,
    pub degraded_section_names: Vec<String>,
    pub backends_total: usize,
    pub backend_failures: usize,
    pub backend_statuses: BTreeMap<String, TaskStatus>,
    /// Modo de rigor usado ("robust" ou "strict")
    pub strictness: String,
    pub engine_version: String,
}

/// Resultado final entregue ao chamador.
///
/// Nenhum outro componente mantém referência a ele após o retorno.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub request: AnalysisRequest,
    pub research: ResearchSummary,
    /// Campos consolidados da análise semente (None se todos os backends falharam)
    pub seed_analysis: Option<JsonMap>,
    pub sections: BTreeMap<String, SectionOutcome>,
    pub insights: Vec<String>,
    pub quality_score: f64,
    pub metadata: RunMetadata,
}

impl AnalysisResult {
    pub fn section(&self, name: &str) -> Option<&SectionOutcome> {
        self.sections.get(name)
    }

    /// Nomes das seções resolvidas via fallback
    pub fn degraded_sections(&self) -> Vec<&str> {
        self.sections
            .iter()
            .filter(|(_, s)| s.result.fallback)
            .map(|(name, _)| name.as_str())
            .collect()
    }

    pub fn is_fully_degraded(&self) -> bool {
        !self.sections.is_empty() && self.sections.values().all(|s| s.result.fallback)
    }

    /// Serializa para JSON (valor opaco consumido por rotas/persistência)
    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}
