// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// CONFIGURAÇÃO DO RUNTIME E DO MOTOR DE ANÁLISE
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//
// Configurações para o runtime Tokio e para cada fase do motor.
// Todas as configurações podem ser definidas via .env
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Modo de rigor aplicado ao score final.
///
/// - `Robust`: sempre retorna o resultado com o score anexado (padrão)
/// - `Strict`: rejeita resultados abaixo do limiar
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum StrictnessMode {
    /// Nunca aborta; o score é apenas metadado.
    #[default]
    Robust,

    /// Rejeita com `AnalysisError::QualityBelowThreshold` abaixo do limiar.
    Strict {
        /// Score mínimo aceito (0-100)
        threshold: f64,
    },
}

impl StrictnessMode {
    /// Retorna nome legível para logs e metadados.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Robust => "robust",
            Self::Strict { .. } => "strict",
        }
    }

    /// Limiar de aceitação, se houver
    pub fn threshold(&self) -> Option<f64> {
        match self {
            Self::Robust => None,
            Self::Strict { threshold } => Some(*threshold),
        }
    }
}

impl fmt::Display for StrictnessMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Robust => write!(f, "robust"),
            Self::Strict { threshold } => write!(f, "strict (>= {:.1})", threshold),
        }
    }
}

/// Pesos do cálculo de relevância dos documentos.
#[derive(Debug, Clone)]
pub struct RelevanceWeights {
    /// Peso por ocorrência do segmento
    pub segment: f64,
    /// Peso por ocorrência do produto
    pub product: f64,
    /// Peso por ocorrência do público
    pub audience: f64,
    /// Peso por ocorrência de cada termo do vocabulário de mercado
    pub vocabulary_term: f64,
    /// Vocabulário de sinais de domínio (minúsculo)
    pub vocabulary: Vec<String>,
    /// Bônus para documentos trazidos por queries de produto/público
    pub targeted_query_bonus: f64,
    /// Faixas de tamanho: (mínimo de palavras, bônus), da maior para a menor
    pub length_tiers: Vec<(usize, f64)>,
}

impl Default for RelevanceWeights {
    fn default() -> Self {
        Self {
            segment: 3.0,
            product: 2.5,
            audience: 2.0,
            vocabulary_term: 0.5,
            vocabulary: [
                "mercado", "análise", "tendência", "oportunidade", "crescimento",
                "dados", "estatística", "pesquisa", "brasil", "2024", "2025",
                "investimento", "startup", "inovação", "tecnologia", "futuro",
            ]
            .iter()
            .map(|t| t.to_string())
            .collect(),
            targeted_query_bonus: 1.0,
            length_tiers: vec![(1000, 3.0), (500, 1.5), (200, 0.5)],
        }
    }
}

/// Configuração do fan-out de pesquisa.
#[derive(Debug, Clone)]
pub struct ResearchConfig {
    /// Máximo de queries planejadas
    pub max_queries: usize,
    /// Workers concorrentes (independente do número de queries)
    pub workers: usize,
    /// Resultados pedidos ao provedor de busca por query
    pub results_per_query: usize,
    /// URLs lidas por query (top-K)
    pub fetch_top_k: usize,
    /// Leituras simultâneas dentro de uma query
    pub fetch_concurrency: usize,
    /// Prazo por query (busca + leituras)
    pub query_timeout: Duration,
    /// Prazo por leitura de URL
    pub fetch_timeout: Duration,
    /// Documentos menores que isso são descartados
    pub min_document_chars: usize,
    /// Corpo mantido por documento
    pub max_document_chars: usize,
    /// Documentos mantidos no contexto final
    pub max_context_documents: usize,
}

impl Default for ResearchConfig {
    fn default() -> Self {
        Self {
            max_queries: 20,
            workers: 4,
            results_per_query: 20,
            fetch_top_k: 15,
            fetch_concurrency: 4,
            query_timeout: Duration::from_secs(90),
            fetch_timeout: Duration::from_secs(20),
            min_document_chars: 200,
            max_document_chars: 4000,
            max_context_documents: 25,
        }
    }
}

/// Orçamento do contexto enviado aos backends de geração.
#[derive(Debug, Clone)]
pub struct PromptBudget {
    /// Documentos renderizados no prompt
    pub context_documents: usize,
    /// Caracteres por documento no prompt
    pub chars_per_document: usize,
    /// Tokens pedidos para a análise semente
    pub seed_max_tokens: u32,
    /// Prazo por backend
    pub backend_timeout: Duration,
}

impl Default for PromptBudget {
    fn default() -> Self {
        Self {
            context_documents: 25,
            chars_per_document: 3000,
            seed_max_tokens: 8192,
            backend_timeout: Duration::from_secs(180),
        }
    }
}

/// Configuração do agendador de seções.
#[derive(Debug, Clone)]
pub struct SectionConfig {
    /// Workers concorrentes (conservador por causa de rate limits)
    pub workers: usize,
    /// Prazo por seção
    pub section_timeout: Duration,
    /// Caracteres de contexto de pesquisa no prompt da seção
    pub context_chars: usize,
    /// Caracteres da análise semente no prompt da seção
    pub seed_chars: usize,
}

impl Default for SectionConfig {
    fn default() -> Self {
        Self {
            workers: 2,
            section_timeout: Duration::from_secs(120),
            context_chars: 12_000,
            seed_chars: 6_000,
        }
    }
}

/// Rubrica aditiva do score de qualidade (soma limitada a 100).
#[derive(Debug, Clone)]
pub struct ScoringRubric {
    /// Piso de fontes únicas
    pub min_sources: usize,
    /// Piso de caracteres extraídos
    pub min_content_chars: usize,
    pub sources_points: f64,
    pub content_points: f64,
    /// Pontos pela análise semente (ao menos um backend respondeu)
    pub seed_points: f64,
    /// Pontos divididos entre as seções primárias
    pub primary_points: f64,
    /// Pontos divididos entre as seções secundárias
    pub secondary_points: f64,
    /// Tamanho serializado mínimo de uma seção primária não trivial
    pub min_section_chars: usize,
}

impl Default for ScoringRubric {
    fn default() -> Self {
        Self {
            min_sources: 15,
            min_content_chars: 50_000,
            sources_points: 15.0,
            content_points: 10.0,
            seed_points: 15.0,
            primary_points: 40.0,
            secondary_points: 20.0,
            min_section_chars: 200,
        }
    }
}

/// Frações do orçamento total em que cada fase deve terminar.
#[derive(Debug, Clone)]
pub struct PhaseBudget {
    /// Fim da pesquisa (fração do orçamento)
    pub research_end: f64,
    /// Fim da análise semente (fração do orçamento)
    pub analysis_end: f64,
}

impl Default for PhaseBudget {
    fn default() -> Self {
        Self {
            research_end: 0.4,
            analysis_end: 0.7,
        }
    }
}

impl PhaseBudget {
    /// Maior orçamento aceito; acima disso o prazo satura
    pub const MAX_BUDGET: Duration = Duration::from_secs(86_400 * 365);

    /// Limita o orçamento total a [`Self::MAX_BUDGET`]
    pub fn clamp_budget(total: Duration) -> Duration {
        total.min(Self::MAX_BUDGET)
    }

    /// Duração até o fim de uma fase, limitada ao intervalo [0, 1]
    pub fn portion(total: Duration, fraction: f64) -> Duration {
        Self::clamp_budget(total).mul_f64(fraction.clamp(0.0, 1.0))
    }
}

/// Configuração completa do motor de análise.
#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    pub research: ResearchConfig,
    pub relevance: RelevanceWeights,
    pub prompt: PromptBudget,
    pub sections: SectionConfig,
    pub scoring: ScoringRubric,
    pub phases: PhaseBudget,
    pub strictness: StrictnessMode,
    /// Tamanho mínimo do segmento
    pub min_segment_len: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            research: ResearchConfig::default(),
            relevance: RelevanceWeights::default(),
            prompt: PromptBudget::default(),
            sections: SectionConfig::default(),
            scoring: ScoringRubric::default(),
            phases: PhaseBudget::default(),
            strictness: StrictnessMode::default(),
            min_segment_len: 5,
        }
    }
}

impl AnalysisConfig {
    /// Cria configuração padrão.
    pub fn new() -> Self {
        Self::default()
    }

    /// Ativa o modo estrito com o limiar informado
    pub fn strict(mut self, threshold: f64) -> Self {
        self.strictness = StrictnessMode::Strict { threshold };
        self
    }
}

/// Lê e converte uma variável de ambiente positiva.
fn env_positive<T>(name: &str) -> Option<T>
where
    T: FromStr + PartialOrd + Default + fmt::Display,
{
    let raw = std::env::var(name).ok()?;
    match raw.trim().parse::<T>() {
        Ok(value) if value > T::default() => {
            log::info!("📦 {}={}", name, value);
            Some(value)
        }
        _ => {
            log::warn!("⚠️ Ignorando {}={:?} (valor inválido)", name, raw);
            None
        }
    }
}

fn env_secs(name: &str) -> Option<Duration> {
    env_positive::<u64>(name).map(Duration::from_secs)
}

/// Carrega configuração do motor a partir das variáveis de ambiente.
///
/// Variáveis suportadas:
/// - `ANALYSIS_MAX_QUERIES`, `ANALYSIS_RESEARCH_WORKERS`, `ANALYSIS_RESULTS_PER_QUERY`
/// - `ANALYSIS_FETCH_TOP_K`, `ANALYSIS_FETCH_CONCURRENCY`
/// - `ANALYSIS_QUERY_TIMEOUT_SECS`, `ANALYSIS_FETCH_TIMEOUT_SECS`
/// - `ANALYSIS_BACKEND_TIMEOUT_SECS`
/// - `ANALYSIS_SECTION_WORKERS`, `ANALYSIS_SECTION_TIMEOUT_SECS`
/// - `ANALYSIS_MIN_SOURCES`, `ANALYSIS_MIN_CONTENT_CHARS`
/// - `ANALYSIS_STRICT_THRESHOLD`: presença ativa o modo estrito
/// - `ANALYSIS_MIN_SEGMENT_LEN`
pub fn load_analysis_config() -> AnalysisConfig {
    let mut config = AnalysisConfig::default();

    if let Some(v) = env_positive("ANALYSIS_MAX_QUERIES") {
        config.research.max_queries = v;
    }
    if let Some(v) = env_positive("ANALYSIS_RESEARCH_WORKERS") {
        config.research.workers = v;
    }
    if let Some(v) = env_positive("ANALYSIS_RESULTS_PER_QUERY") {
        config.research.results_per_query = v;
    }
    if let Some(v) = env_positive("ANALYSIS_FETCH_TOP_K") {
        config.research.fetch_top_k = v;
    }
    if let Some(v) = env_positive("ANALYSIS_FETCH_CONCURRENCY") {
        config.research.fetch_concurrency = v;
    }
    if let Some(v) = env_secs("ANALYSIS_QUERY_TIMEOUT_SECS") {
        config.research.query_timeout = v;
    }
    if let Some(v) = env_secs("ANALYSIS_FETCH_TIMEOUT_SECS") {
        config.research.fetch_timeout = v;
    }
    if let Some(v) = env_secs("ANALYSIS_BACKEND_TIMEOUT_SECS") {
        config.prompt.backend_timeout = v;
    }
    if let Some(v) = env_positive("ANALYSIS_SECTION_WORKERS") {
        config.sections.workers = v;
    }
    if let Some(v) = env_secs("ANALYSIS_SECTION_TIMEOUT_SECS") {
        config.sections.section_timeout = v;
    }
    if let Some(v) = env_positive("ANALYSIS_MIN_SOURCES") {
        config.scoring.min_sources = v;
    }
    if let Some(v) = env_positive("ANALYSIS_MIN_CONTENT_CHARS") {
        config.scoring.min_content_chars = v;
    }
    if let Some(v) = env_positive("ANALYSIS_MIN_SEGMENT_LEN") {
        config.min_segment_len = v;
    }
    if let Some(threshold) = env_positive::<f64>("ANALYSIS_STRICT_THRESHOLD") {
        config.strictness = StrictnessMode::Strict {
            threshold: threshold.min(100.0),
        };
    }

    log::info!(
        "🔧 Motor: {} queries max, {} workers de pesquisa, {} workers de seção, modo {}",
        config.research.max_queries,
        config.research.workers,
        config.sections.workers,
        config.strictness
    );

    config
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// RUNTIME TOKIO
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Configuração do runtime Tokio.
///
/// Controla número de threads e comportamento do async runtime.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Número de worker threads do Tokio.
    /// Se None, usa cálculo dinâmico: min(cpu_cores, max_threads).
    pub worker_threads: Option<usize>,

    /// Número máximo de threads (limite superior para cálculo dinâmico).
    /// Padrão: 8
    pub max_threads: usize,

    /// Nome das threads do runtime.
    pub thread_name: String,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            worker_threads: None, // Dinâmico
            max_threads: 8,
            thread_name: "deep-analysis".to_string(),
        }
    }
}

impl RuntimeConfig {
    /// Calcula número efetivo de worker threads.
    pub fn effective_worker_threads(&self) -> usize {
        self.worker_threads
            .unwrap_or_else(|| std::cmp::min(num_cpus::get(), self.max_threads))
    }
}

/// Carrega configuração do runtime (`TOKIO_THREADS`, `TOKIO_MAX_THREADS`).
pub fn load_runtime_config() -> RuntimeConfig {
    let mut config = RuntimeConfig::default();

    if let Some(threads) = env_positive("TOKIO_THREADS") {
        config.worker_threads = Some(threads);
    }
    if let Some(max) = env_positive("TOKIO_MAX_THREADS") {
        config.max_threads = max;
    }

    if config.worker_threads.is_none() {
        log::info!(
            "🔧 Tokio: {} threads (dinâmico: min({} cores, {} max))",
            config.effective_worker_threads(),
            num_cpus::get(),
            config.max_threads
        );
    }

    config
}

/// Instala panic hook que apenas loga o panic.
///
/// O envelope de execução segura captura o unwind da tarefa; o hook
/// só registra thread e localização.
pub fn install_panic_hook() {
    std::panic::set_hook(Box::new(|panic_info| {
        let thread = std::thread::current();
        let thread_name = thread.name().unwrap_or("unnamed");

        let location = panic_info
            .location()
            .map(|loc| format!("{}:{}:{}", loc.file(), loc.line(), loc.column()))
            .unwrap_or_else(|| "unknown location".to_string());

        let message = if let Some(s) = panic_info.payload().downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = panic_info.payload().downcast_ref::<String>() {
            s.clone()
        } else {
            "Unknown panic payload".to_string()
        };

        log::error!("[PANIC] Thread {} at {}: {}", thread_name, location, message);
    }));
}

/// Cria o runtime Tokio multi-thread com configuração customizada.
pub fn create_tokio_runtime(config: &RuntimeConfig) -> std::io::Result<tokio::runtime::Runtime> {
    let worker_threads = config.effective_worker_threads();

    log::info!("🚀 Criando runtime Tokio: {} workers", worker_threads);

    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(worker_threads)
        .thread_name(&config.thread_name)
        .enable_all()
        .build()
}
