// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// DEEP ANALYSIS CLI
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//
// CLI para execução do motor de análise.
//
// Uso:
//   deep-analysis-cli --segment "fitness coaching"
//   deep-analysis-cli --segment "fitness coaching" --product app --price 297
//   deep-analysis-cli --segment "educação online" --deadline 900 --strict 80
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, bail, Context};
use deep_analysis::llm::{GenerationClient, NamedBackend, OpenAiGenerationClient};
use deep_analysis::prelude::*;
use deep_analysis::search::{HttpDocumentFetcher, JinaSearchClient};
use deep_analysis::{create_tokio_runtime, install_panic_hook, load_analysis_config, load_runtime_config};

/// Orçamento padrão do pipeline
const DEFAULT_DEADLINE_SECS: u64 = 600;

/// Argumentos da linha de comando
#[derive(Debug, Default)]
struct CliArgs {
    segment: Option<String>,
    product: Option<String>,
    audience: Option<String>,
    price: Option<f64>,
    budget: Option<f64>,
    timeline: Option<String>,
    query: Option<String>,
    deadline: Option<u64>,
    strict: Option<f64>,
}

fn print_usage(program: &str) {
    eprintln!("Deep Analysis CLI v{}", deep_analysis::VERSION);
    eprintln!();
    eprintln!("Uso: {} --segment <segmento> [opções]", program);
    eprintln!();
    eprintln!("Opções:");
    eprintln!("  --product <produto>     Produto ou serviço");
    eprintln!("  --audience <público>    Público-alvo");
    eprintln!("  --price <valor>         Preço do produto");
    eprintln!("  --budget <valor>        Orçamento de marketing");
    eprintln!("  --timeline <prazo>      Prazo de lançamento");
    eprintln!("  --query <texto>         Query principal de pesquisa");
    eprintln!("  --deadline <segundos>   Orçamento total (padrão: {})", DEFAULT_DEADLINE_SECS);
    eprintln!("  --strict <limiar>       Rejeita resultados com score abaixo do limiar");
}

fn parse_args(args: &[String]) -> anyhow::Result<CliArgs> {
    let mut parsed = CliArgs::default();
    let mut iter = args.iter().skip(1);

    while let Some(flag) = iter.next() {
        let mut value = || {
            iter.next()
                .cloned()
                .ok_or_else(|| anyhow!("{} exige um valor", flag))
        };

        match flag.as_str() {
            "--segment" => parsed.segment = Some(value()?),
            "--product" => parsed.product = Some(value()?),
            "--audience" => parsed.audience = Some(value()?),
            "--timeline" => parsed.timeline = Some(value()?),
            "--query" => parsed.query = Some(value()?),
            "--price" => parsed.price = Some(value()?.parse().context("--price inválido")?),
            "--budget" => parsed.budget = Some(value()?.parse().context("--budget inválido")?),
            "--deadline" => parsed.deadline = Some(value()?.parse().context("--deadline inválido")?),
            "--strict" => parsed.strict = Some(value()?.parse().context("--strict inválido")?),
            other => bail!("opção desconhecida: {}", other),
        }
    }

    Ok(parsed)
}

fn build_request(args: CliArgs) -> anyhow::Result<AnalysisRequest> {
    let segment = args.segment.ok_or_else(|| anyhow!("--segment é obrigatório"))?;
    let mut request = AnalysisRequest::new(segment);
    request.product = args.product;
    request.audience = args.audience;
    request.price = args.price;
    request.budget = args.budget;
    request.timeline = args.timeline;
    request.query = args.query;
    Ok(request)
}

/// Backends de geração a partir das variáveis de ambiente
fn build_backends() -> anyhow::Result<Vec<NamedBackend>> {
    let api_key = std::env::var("OPENAI_API_KEY").context(
        "OPENAI_API_KEY não encontrada. Defina no .env ou exporte a variável de ambiente",
    )?;
    let base_url = std::env::var("OPENAI_BASE_URL").ok();

    let make = |model: &str| -> Arc<dyn GenerationClient> {
        let client = OpenAiGenerationClient::new(api_key.clone()).with_model(model);
        match &base_url {
            Some(url) => Arc::new(client.with_base_url(url)),
            None => Arc::new(client),
        }
    };

    let primary_model = std::env::var("OPENAI_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string());
    let mut backends = vec![NamedBackend::new("primary", make(&primary_model))];

    if let Ok(secondary_model) = std::env::var("SECONDARY_LLM_MODEL") {
        backends.push(NamedBackend::new("secondary", make(&secondary_model)));
    }

    Ok(backends)
}

fn main() -> anyhow::Result<()> {
    // Carregar .env PRIMEIRO, antes de qualquer coisa
    if dotenvy::dotenv().is_err() {
        eprintln!("⚠ Nenhum arquivo .env encontrado; usando apenas variáveis de ambiente");
    }

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    install_panic_hook();

    let args: Vec<String> = std::env::args().collect();
    let program = args.first().map(String::as_str).unwrap_or("deep-analysis-cli");
    if args.len() < 2 {
        print_usage(program);
        std::process::exit(1);
    }

    let cli = match parse_args(&args) {
        Ok(cli) => cli,
        Err(e) => {
            eprintln!("✗ {}", e);
            eprintln!();
            print_usage(program);
            std::process::exit(1);
        }
    };

    let deadline = Duration::from_secs(cli.deadline.unwrap_or(DEFAULT_DEADLINE_SECS));
    let strict = cli.strict;
    let request = build_request(cli)?;

    let mut config = load_analysis_config();
    if let Some(threshold) = strict {
        config = config.strict(threshold);
    }

    let jina_key = std::env::var("JINA_API_KEY")
        .context("JINA_API_KEY não encontrada. Defina no .env ou exporte a variável de ambiente")?;
    let search: Arc<dyn SearchClient> = Arc::new(JinaSearchClient::new(jina_key));
    let fetcher: Arc<dyn DocumentFetcher> = Arc::new(HttpDocumentFetcher::new(
        config.research.fetch_timeout,
        config.research.min_document_chars,
    )?);
    let backends = build_backends()?;

    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!(" DEEP ANALYSIS v{}", deep_analysis::VERSION);
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!();
    println!("Segmento: {}", request.segment());
    if let Some(product) = request.product() {
        println!("Produto: {}", product);
    }
    println!("Backends: {}", backends.len());
    println!("Orçamento: {}s", deadline.as_secs());
    println!();

    let runtime = create_tokio_runtime(&load_runtime_config())?;
    let orchestrator = AnalysisOrchestrator::new(search, fetcher, backends, config);
    let result = runtime.block_on(orchestrator.run_analysis(request, deadline))?;

    println!("{}", serde_json::to_string_pretty(&result.to_json())?);

    eprintln!();
    eprintln!(
        "✓ Score: {:.1} | seções degradadas: {}/{} | {}ms",
        result.quality_score,
        result.metadata.degraded_sections,
        result.metadata.total_sections,
        result.metadata.elapsed_ms
    );

    Ok(())
}
