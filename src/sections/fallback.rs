// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// GERADORES DE FALLBACK DETERMINÍSTICOS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//
// Funções puras da requisição (e dos contadores da pesquisa). Nenhuma
// chamada de rede. Todo payload sai marcado com `_degradado: true`.
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

use serde_json::{json, Value};

use crate::types::{AnalysisRequest, ResearchStats};

/// Chave que marca um payload sintético
pub const DEGRADED_MARKER: &str = "_degradado";

/// Preço assumido quando a requisição não informa
const DEFAULT_PRICE: f64 = 997.0;

/// Adiciona as chaves de marcação ao objeto
fn degraded(mut payload: Value, stats: &ResearchStats) -> Value {
    if let Value::Object(map) = &mut payload {
        map.insert(DEGRADED_MARKER.into(), Value::Bool(true));
        map.insert(
            "_origem".into(),
            json!(format!(
                "gerado sem IA a partir da requisição ({} fontes disponíveis)",
                stats.unique_documents
            )),
        );
    }
    payload
}

/// Verifica se um payload foi produzido por um gerador de fallback
pub fn is_degraded_payload(payload: &Value) -> bool {
    payload.get(DEGRADED_MARKER).and_then(Value::as_bool).unwrap_or(false)
}

fn audience_or_default(request: &AnalysisRequest) -> String {
    request
        .audience()
        .map(String::from)
        .unwrap_or_else(|| format!("clientes de {}", request.segment()))
}

fn offer(request: &AnalysisRequest) -> String {
    match request.product() {
        Some(product) => format!("{} para {}", product, request.segment()),
        None => request.segment().to_string(),
    }
}

fn money_band(price: f64, low: f64, high: f64) -> String {
    format!("R$ {:.0} - R$ {:.0} mensais", price * low, price * high)
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// SEÇÕES PRIMÁRIAS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub fn avatar(request: &AnalysisRequest, stats: &ResearchStats) -> Value {
    let segment = request.segment();
    degraded(
        json!({
            "perfil_demografico": {
                "segmento": segment,
                "publico": audience_or_default(request),
                "observacao": "dados demográficos a validar com pesquisa primária"
            },
            "dores_viscerais": [
                format!("Dificuldade em obter resultados consistentes em {}", segment),
                "Falta de tempo para implementar soluções complexas",
                "Excesso de informação desencontrada no mercado"
            ],
            "desejos_secretos": [
                format!("Ser reconhecido como referência em {}", segment),
                "Ter previsibilidade de resultados"
            ],
            "objecoes_reais": ["tempo", "dinheiro", "confiança"]
        }),
        stats,
    )
}

pub fn competition(request: &AnalysisRequest, stats: &ResearchStats) -> Value {
    degraded(
        json!({
            "concorrentes_identificados": [],
            "fontes_analisadas": stats.unique_documents,
            "lacunas_de_mercado": [
                format!("Atendimento especializado em {}", offer(request)),
                "Comunicação orientada a resultados mensuráveis"
            ],
            "proximos_passos": "mapear concorrentes diretos manualmente"
        }),
        stats,
    )
}

pub fn mental_drivers(request: &AnalysisRequest, stats: &ResearchStats) -> Value {
    let segment = request.segment();
    degraded(
        json!({
            "drivers_customizados": [
                {
                    "nome": "Urgência Temporal",
                    "gatilho": format!("O mercado de {} não espera quem adia decisões", segment),
                    "aplicacao": "abertura de conteúdos e ofertas"
                },
                {
                    "nome": "Prova Social",
                    "gatilho": format!("Outros profissionais de {} já estão avançando", segment),
                    "aplicacao": "depoimentos e estudos de caso"
                },
                {
                    "nome": "Autoridade",
                    "gatilho": format!("Método estruturado para {}", offer(request)),
                    "aplicacao": "apresentação do produto"
                }
            ]
        }),
        stats,
    )
}

pub fn anti_objection(request: &AnalysisRequest, stats: &ResearchStats) -> Value {
    degraded(
        json!({
            "objecoes_universais": {
                "tempo": {
                    "objecao": "Não tenho tempo agora",
                    "resposta": format!("{} foi pensado para rotinas com pouco tempo disponível", offer(request))
                },
                "dinheiro": {
                    "objecao": "Está caro",
                    "resposta": "Compare o investimento com o custo de continuar sem resultado"
                },
                "confianca": {
                    "objecao": "Não sei se funciona para mim",
                    "resposta": "Garantia e casos de clientes com perfil semelhante"
                }
            }
        }),
        stats,
    )
}

pub fn action_plan(request: &AnalysisRequest, stats: &ResearchStats) -> Value {
    let segment = request.segment();
    degraded(
        json!({
            "primeiros_30_dias": {
                "foco": "Estruturação e preparação da base",
                "atividades": [
                    "Definir posicionamento único no mercado",
                    format!("Validar o avatar de {} com entrevistas", segment),
                    "Estruturar funil de vendas básico",
                    "Definir métricas e KPIs principais"
                ],
                "investimento": "R$ 10.000 - R$ 25.000"
            },
            "dias_31_90": {
                "foco": "Implementação e otimização",
                "atividades": [
                    "Lançar campanhas de marketing digital",
                    "Testar e otimizar conversões",
                    "Implementar sistema de feedback"
                ],
                "investimento": "R$ 20.000 - R$ 50.000"
            },
            "dias_91_180": {
                "foco": "Escalonamento e crescimento",
                "atividades": [
                    "Escalar campanhas que funcionam",
                    "Expandir para novos canais",
                    "Criar programa de indicações"
                ],
                "investimento": "R$ 50.000 - R$ 100.000"
            },
            "prazo_informado": request.timeline().unwrap_or("não informado")
        }),
        stats,
    )
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// SEÇÕES SECUNDÁRIAS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub fn visual_proofs(request: &AnalysisRequest, stats: &ResearchStats) -> Value {
    let mut concepts = vec![format!("Resultados reais em {}", request.segment())];
    if let Some(product) = request.product() {
        concepts.push(format!("Eficácia do {}", product));
        concepts.push(format!("ROI do investimento em {}", product));
    }

    let proofs: Vec<Value> = concepts
        .into_iter()
        .map(|concept| {
            json!({
                "conceito": concept,
                "experimento": "comparativo antes/depois com dados do cliente",
                "materiais": ["gráfico simples", "depoimento curto"]
            })
        })
        .collect();

    degraded(json!({ "provas": proofs }), stats)
}

pub fn pre_pitch(request: &AnalysisRequest, stats: &ResearchStats) -> Value {
    degraded(
        json!({
            "fases": [
                { "fase": "quebra", "objetivo": format!("Expor o custo de não agir em {}", request.segment()) },
                { "fase": "vislumbre", "objetivo": "Mostrar o estado desejado" },
                { "fase": "necessidade", "objetivo": format!("Posicionar {} como caminho", offer(request)) }
            ]
        }),
        stats,
    )
}

/// Faixas de investimento escalonadas pelo preço informado
pub fn sales_funnel(request: &AnalysisRequest, stats: &ResearchStats) -> Value {
    let segment = request.segment();
    let price = request.price.filter(|p| *p > 0.0).unwrap_or(DEFAULT_PRICE);

    degraded(
        json!({
            "topo_funil": {
                "objetivo": format!("Atrair e educar prospects interessados em {}", segment),
                "estrategias": [
                    format!("Conteúdo educativo sobre {}", segment),
                    "SEO para palavras-chave do nicho",
                    "Webinars educativos gratuitos"
                ],
                "investimento": money_band(price, 0.3, 0.5)
            },
            "meio_funil": {
                "objetivo": "Nutrir leads e construir relacionamento",
                "estrategias": ["Email marketing segmentado", "Cases de sucesso", "Retargeting"],
                "investimento": money_band(price, 0.2, 0.4)
            },
            "fundo_funil": {
                "objetivo": "Converter leads qualificados em clientes",
                "estrategias": ["Ofertas com garantia", "Prova social", "Follow-up"],
                "investimento": money_band(price, 0.1, 0.3)
            }
        }),
        stats,
    )
}

pub fn future_predictions(request: &AnalysisRequest, stats: &ResearchStats) -> Value {
    let segment = request.segment();
    degraded(
        json!({
            "horizonte": "36 meses",
            "tendencias": [
                format!("Digitalização crescente de {}", segment),
                "Uso de IA para personalização",
                "Consolidação de players menores"
            ],
            "cenarios": {
                "conservador": "crescimento alinhado à economia",
                "provavel": "crescimento moderado com digitalização",
                "otimista": "expansão acelerada por novos canais"
            }
        }),
        stats,
    )
}

pub fn keyword_strategy(request: &AnalysisRequest, stats: &ResearchStats) -> Value {
    let segment = request.segment().to_lowercase();
    let mut primary = vec![segment.clone()];
    if let Some(product) = request.product() {
        primary.push(format!("{} {}", product.to_lowercase(), segment));
    }
    if let Some(audience) = request.audience() {
        primary.push(format!("{} para {}", segment, audience.to_lowercase()));
    }

    degraded(
        json!({
            "palavras_primarias": primary,
            "long_tail": [
                format!("como escolher {}", segment),
                format!("melhor {} no brasil", segment),
                format!("{} vale a pena", segment)
            ]
        }),
        stats,
    )
}
