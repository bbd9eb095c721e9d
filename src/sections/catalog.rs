// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// CATÁLOGO DE SEÇÕES DO RELATÓRIO
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

use serde_json::Value;

use super::fallback;
use crate::analysis::describe_request;
use crate::types::{AnalysisRequest, ResearchStats, SectionKind};

/// Dados compartilhados (somente leitura) por todas as seções
#[derive(Debug, Clone, Copy)]
pub struct SectionInput<'a> {
    pub request: &'a AnalysisRequest,
    /// Contexto de pesquisa já renderizado e truncado
    pub research: &'a str,
    /// Análise semente renderizada, se algum backend respondeu
    pub seed: Option<&'a str>,
    pub stats: &'a ResearchStats,
}

/// Descritor sem estado de uma seção
///
/// Seções são independentes: nenhuma lê a saída de outra, então todas
/// podem rodar ao mesmo tempo.
#[derive(Clone, Copy)]
pub struct GenerationTask {
    pub name: &'static str,
    pub kind: SectionKind,
    /// Foco da seção (para logs e prompts)
    pub focus: &'static str,
    pub token_budget: u32,
    pub prompt: fn(&SectionInput<'_>) -> String,
    pub fallback: fn(&AnalysisRequest, &ResearchStats) -> Value,
}

impl GenerationTask {
    pub fn build_prompt(&self, input: &SectionInput<'_>) -> String {
        (self.prompt)(input)
    }

    pub fn build_fallback(&self, request: &AnalysisRequest, stats: &ResearchStats) -> Value {
        (self.fallback)(request, stats)
    }
}

impl std::fmt::Debug for GenerationTask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenerationTask")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("token_budget", &self.token_budget)
            .finish()
    }
}

/// Monta o prompt padrão de seção
///
/// Sem semente, a seção é gerada apenas com o contexto de pesquisa.
fn section_prompt(input: &SectionInput<'_>, title: &str, mission: &str, keys: &[&str]) -> String {
    let seed = match input.seed {
        Some(seed) => format!("## ANÁLISE SEMENTE:\n{}\n", seed),
        None => "## ANÁLISE SEMENTE:\n(indisponível; baseie-se apenas no contexto de pesquisa)\n".to_string(),
    };

    format!(
        "# {title}\n\n{project}\n{seed}\n## CONTEXTO DE PESQUISA:\n{research}\n\n\
         ## MISSÃO:\n{mission}\n\n\
         Responda com um único objeto JSON com as chaves: {keys}.\n",
        title = title,
        project = describe_request(input.request),
        seed = seed,
        research = input.research,
        mission = mission,
        keys = keys.join(", "),
    )
}

fn avatar_prompt(input: &SectionInput<'_>) -> String {
    section_prompt(
        input,
        "AVATAR ULTRA-DETALHADO",
        "Descreva o cliente ideal com perfil demográfico, psicográfico, dores e desejos.",
        &["perfil_demografico", "perfil_psicografico", "dores_viscerais", "desejos_secretos", "objecoes_reais"],
    )
}

fn competition_prompt(input: &SectionInput<'_>) -> String {
    section_prompt(
        input,
        "ANÁLISE DE CONCORRÊNCIA",
        "Mapeie concorrentes diretos e indiretos, posicionamento e lacunas de mercado.",
        &["concorrentes_identificados", "posicionamento", "lacunas_de_mercado"],
    )
}

fn drivers_prompt(input: &SectionInput<'_>) -> String {
    section_prompt(
        input,
        "DRIVERS MENTAIS CUSTOMIZADOS",
        "Crie gatilhos psicológicos específicos para este avatar e esta oferta.",
        &["drivers_customizados"],
    )
}

fn anti_objection_prompt(input: &SectionInput<'_>) -> String {
    section_prompt(
        input,
        "SISTEMA ANTI-OBJEÇÃO",
        "Liste as objeções reais do avatar e as respostas para cada uma.",
        &["objecoes_universais", "objecoes_ocultas"],
    )
}

fn action_plan_prompt(input: &SectionInput<'_>) -> String {
    section_prompt(
        input,
        "PLANO DE AÇÃO",
        "Monte um plano em três fases com atividades, investimento e entregas.",
        &["primeiros_30_dias", "dias_31_90", "dias_91_180"],
    )
}

fn visual_proofs_prompt(input: &SectionInput<'_>) -> String {
    section_prompt(
        input,
        "PROVAS VISUAIS",
        "Sugira demonstrações visuais que provem os principais conceitos da oferta.",
        &["provas"],
    )
}

fn pre_pitch_prompt(input: &SectionInput<'_>) -> String {
    section_prompt(
        input,
        "PRÉ-PITCH INVISÍVEL",
        "Desenhe a sequência de preparação emocional antes da oferta.",
        &["fases"],
    )
}

fn sales_funnel_prompt(input: &SectionInput<'_>) -> String {
    section_prompt(
        input,
        "FUNIL DE VENDAS",
        "Detalhe topo, meio e fundo de funil com estratégias, métricas e investimento.",
        &["topo_funil", "meio_funil", "fundo_funil"],
    )
}

fn predictions_prompt(input: &SectionInput<'_>) -> String {
    section_prompt(
        input,
        "PREDIÇÕES DE FUTURO",
        "Projete tendências e cenários para os próximos anos com base nos dados.",
        &["horizonte", "tendencias", "cenarios"],
    )
}

fn keywords_prompt(input: &SectionInput<'_>) -> String {
    section_prompt(
        input,
        "ESTRATÉGIA DE PALAVRAS-CHAVE",
        "Liste palavras-chave primárias e de cauda longa para o segmento.",
        &["palavras_primarias", "long_tail"],
    )
}

/// As 10 seções do relatório (5 primárias, 5 secundárias)
pub fn default_catalog() -> Vec<GenerationTask> {
    vec![
        GenerationTask {
            name: "avatar_ultra_detalhado",
            kind: SectionKind::Primary,
            focus: "Avatar ultra-detalhado e perfil psicográfico",
            token_budget: 4096,
            prompt: avatar_prompt,
            fallback: fallback::avatar,
        },
        GenerationTask {
            name: "analise_concorrencia_detalhada",
            kind: SectionKind::Primary,
            focus: "Análise de mercado e concorrência",
            token_budget: 4096,
            prompt: competition_prompt,
            fallback: fallback::competition,
        },
        GenerationTask {
            name: "drivers_mentais_customizados",
            kind: SectionKind::Primary,
            focus: "Gatilhos psicológicos",
            token_budget: 3072,
            prompt: drivers_prompt,
            fallback: fallback::mental_drivers,
        },
        GenerationTask {
            name: "sistema_anti_objecao",
            kind: SectionKind::Primary,
            focus: "Objeções e respostas",
            token_budget: 3072,
            prompt: anti_objection_prompt,
            fallback: fallback::anti_objection,
        },
        GenerationTask {
            name: "plano_acao_detalhado",
            kind: SectionKind::Primary,
            focus: "Plano de ação em fases",
            token_budget: 3072,
            prompt: action_plan_prompt,
            fallback: fallback::action_plan,
        },
        GenerationTask {
            name: "provas_visuais_sugeridas",
            kind: SectionKind::Secondary,
            focus: "Provas visuais",
            token_budget: 2048,
            prompt: visual_proofs_prompt,
            fallback: fallback::visual_proofs,
        },
        GenerationTask {
            name: "pre_pitch_invisivel",
            kind: SectionKind::Secondary,
            focus: "Pré-pitch",
            token_budget: 2048,
            prompt: pre_pitch_prompt,
            fallback: fallback::pre_pitch,
        },
        GenerationTask {
            name: "funil_vendas_detalhado",
            kind: SectionKind::Secondary,
            focus: "Funil de vendas",
            token_budget: 2048,
            prompt: sales_funnel_prompt,
            fallback: fallback::sales_funnel,
        },
        GenerationTask {
            name: "predicoes_futuro_completas",
            kind: SectionKind::Secondary,
            focus: "Predições e tendências futuras",
            token_budget: 2048,
            prompt: predictions_prompt,
            fallback: fallback::future_predictions,
        },
        GenerationTask {
            name: "estrategia_palavras_chave",
            kind: SectionKind::Secondary,
            focus: "Palavras-chave",
            token_budget: 2048,
            prompt: keywords_prompt,
            fallback: fallback::keyword_strategy,
        },
    ]
}
