// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// ÂNGULOS DE PESQUISA
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

use crate::types::{AnalysisRequest, FacetTag, SearchQuery};

/// Dados fixos durante um planejamento
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlanContext {
    /// Ano de referência usado nas queries temporais
    pub reference_year: i32,
}

/// Trait que define um ângulo de pesquisa de mercado
///
/// Cada ângulo olha a requisição por uma perspectiva diferente:
/// - Product Focus: mercado, concorrência e preço do produto
/// - Segment Focus: visão geral do segmento (sem produto)
/// - Audience Focus: perfil e comportamento do público
/// - Market Intelligence: investimentos, M&A, barreiras, futuro
///
/// # Requisitos de Thread Safety
///
/// O trait requer `Send + Sync` porque os ângulos são expandidos em
/// paralelo com Rayon.
pub trait QueryAngle: Send + Sync {
    /// Nome do ângulo para logging
    fn name(&self) -> &'static str;

    /// Faceta atribuída às queries geradas
    fn facet(&self) -> FacetTag;

    /// Gera as queries deste ângulo, em ordem fixa
    fn queries(&self, request: &AnalysisRequest, ctx: &PlanContext) -> Vec<SearchQuery>;

    /// Verifica se o ângulo se aplica à requisição
    fn is_applicable(&self, _request: &AnalysisRequest) -> bool {
        true
    }
}

fn tagged(facet: FacetTag, texts: Vec<String>) -> Vec<SearchQuery> {
    texts
        .into_iter()
        .map(|text| SearchQuery::new(crate::utils::clean_text(&text), facet))
        .collect()
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// 1. PRODUCT FOCUS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Mercado, concorrência, preços e regulação do produto dentro do segmento
pub struct ProductFocus;

impl QueryAngle for ProductFocus {
    fn name(&self) -> &'static str {
        "Product Focus"
    }

    fn facet(&self) -> FacetTag {
        FacetTag::Product
    }

    fn queries(&self, request: &AnalysisRequest, ctx: &PlanContext) -> Vec<SearchQuery> {
        let segment = request.segment();
        let Some(product) = request.product() else {
            return Vec::new();
        };
        let year = ctx.reference_year;

        tagged(
            self.facet(),
            vec![
                format!("mercado {segment} {product} Brasil {year} {} dados estatísticas crescimento", year + 1),
                format!("análise competitiva {segment} {product} principais players market share"),
                format!("tendências futuras {segment} {product} inovação tecnologia disrupção"),
                format!("comportamento consumidor {segment} {product} pesquisa insights"),
                format!("preços médios {segment} {product} benchmarks mercado brasileiro"),
                format!("regulamentação {segment} {product} mudanças legais impacto"),
                format!("cases sucesso {segment} {product} empresas brasileiras resultados"),
            ],
        )
    }

    fn is_applicable(&self, request: &AnalysisRequest) -> bool {
        request.product().is_some()
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// 2. SEGMENT FOCUS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Visão geral do segmento quando não há produto informado
pub struct SegmentFocus;

impl QueryAngle for SegmentFocus {
    fn name(&self) -> &'static str {
        "Segment Focus"
    }

    fn facet(&self) -> FacetTag {
        FacetTag::Segment
    }

    fn queries(&self, request: &AnalysisRequest, ctx: &PlanContext) -> Vec<SearchQuery> {
        let segment = request.segment();
        let year = ctx.reference_year;

        tagged(
            self.facet(),
            vec![
                format!("mercado {segment} Brasil {year} {} dados estatísticas crescimento oportunidades", year + 1),
                format!("análise competitiva {segment} principais empresas líderes market share"),
                format!("tendências futuras {segment} inovação tecnologia disrupção transformação"),
                format!("comportamento consumidor {segment} pesquisa insights demográficos"),
                format!("investimentos {segment} venture capital funding startups unicórnios"),
                format!("regulamentação {segment} mudanças legais compliance impacto negócios"),
            ],
        )
    }

    fn is_applicable(&self, request: &AnalysisRequest) -> bool {
        request.product().is_none()
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// 3. AUDIENCE FOCUS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Perfil, jornada e dores do público-alvo
pub struct AudienceFocus;

impl QueryAngle for AudienceFocus {
    fn name(&self) -> &'static str {
        "Audience Focus"
    }

    fn facet(&self) -> FacetTag {
        FacetTag::Audience
    }

    fn queries(&self, request: &AnalysisRequest, _ctx: &PlanContext) -> Vec<SearchQuery> {
        let segment = request.segment();
        let Some(audience) = request.audience() else {
            return Vec::new();
        };

        tagged(
            self.facet(),
            vec![
                format!("perfil demográfico {audience} {segment} Brasil dados IBGE pesquisas"),
                format!("comportamento compra {audience} {segment} jornada cliente insights"),
                format!("dores principais {audience} {segment} desafios problemas soluções"),
            ],
        )
    }

    fn is_applicable(&self, request: &AnalysisRequest) -> bool {
        request.audience().is_some()
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// 4. MARKET INTELLIGENCE
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Inteligência de mercado genérica: capital, consolidação, barreiras, futuro
pub struct MarketIntelligence;

impl QueryAngle for MarketIntelligence {
    fn name(&self) -> &'static str {
        "Market Intelligence"
    }

    fn facet(&self) -> FacetTag {
        FacetTag::Market
    }

    fn queries(&self, request: &AnalysisRequest, ctx: &PlanContext) -> Vec<SearchQuery> {
        let segment = request.segment();
        let year = ctx.reference_year;

        tagged(
            self.facet(),
            vec![
                format!("startups {segment} investimento venture capital Brasil {year} funding"),
                format!("fusões aquisições {segment} M&A consolidação mercado brasileiro"),
                format!("inovação tecnológica {segment} IA automação transformação digital"),
                format!("cases sucesso empresas {segment} brasileiras crescimento escalabilidade"),
                format!("desafios principais {segment} soluções mercado oportunidades gaps"),
                format!("futuro {segment} predições tendências próximos 5 anos Brasil"),
                format!("dados financeiros {segment} faturamento receita lucro margens"),
                format!("canais distribuição {segment} marketing digital vendas online"),
                format!("perfil investidor {segment} angel VC private equity Brasil"),
                format!("barreiras entrada {segment} regulamentação compliance custos"),
            ],
        )
    }
}
