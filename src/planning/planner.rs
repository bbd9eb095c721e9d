// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// PLANEJADOR DE QUERIES
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

use std::collections::HashSet;

use rayon::prelude::*;

use super::{AudienceFocus, MarketIntelligence, PlanContext, ProductFocus, QueryAngle, SegmentFocus};
use crate::types::{AnalysisRequest, FacetTag, SearchQuery};

/// Planejador que transforma as facetas da requisição em queries de busca
///
/// A lista retornada começa sempre pela query principal (explícita ou
/// derivada do segmento), seguida pelas queries de cada ângulo aplicável,
/// sem repetições e limitada a `max_queries`.
///
/// # Paralelismo
///
/// Os ângulos são expandidos com `par_iter()` do Rayon; o `collect`
/// ordenado mantém o resultado determinístico.
///
/// # Exemplo
///
/// ```rust
/// use deep_analysis::planning::QueryPlanner;
/// use deep_analysis::types::AnalysisRequest;
///
/// let planner = QueryPlanner::new(20);
/// let queries = planner.plan(&AnalysisRequest::new("fitness coaching"));
/// assert!(!queries.is_empty());
/// ```
pub struct QueryPlanner {
    angles: Vec<Box<dyn QueryAngle>>,
    max_queries: usize,
    reference_year: Option<i32>,
}

impl QueryPlanner {
    /// Cria um planejador com os 4 ângulos padrão
    ///
    /// O ano de referência vem da requisição, então a mesma requisição
    /// gera sempre o mesmo plano.
    pub fn new(max_queries: usize) -> Self {
        Self {
            angles: vec![
                Box::new(ProductFocus),
                Box::new(SegmentFocus),
                Box::new(AudienceFocus),
                Box::new(MarketIntelligence),
            ],
            max_queries: max_queries.max(1),
            reference_year: None,
        }
    }

    /// Cria um planejador com ângulos customizados
    pub fn with_angles(angles: Vec<Box<dyn QueryAngle>>, max_queries: usize) -> Self {
        Self {
            angles,
            ..Self::new(max_queries)
        }
    }

    /// Sobrescreve o ano de referência da requisição
    pub fn with_reference_year(mut self, year: i32) -> Self {
        self.reference_year = Some(year);
        self
    }

    /// Planeja as queries de pesquisa para a requisição
    ///
    /// Nunca falha: facetas opcionais ausentes apenas reduzem a lista.
    /// Retorna vazio somente se o segmento estiver vazio.
    pub fn plan(&self, request: &AnalysisRequest) -> Vec<SearchQuery> {
        if request.segment().is_empty() {
            return Vec::new();
        }

        let context = PlanContext {
            reference_year: self.reference_year.unwrap_or(request.reference_year),
        };
        let mut planned = vec![self.primary_query(request, &context)];

        let expanded: Vec<SearchQuery> = self
            .angles
            .par_iter()
            .filter(|angle| angle.is_applicable(request))
            .flat_map_iter(|angle| angle.queries(request, &context))
            .collect();
        planned.extend(expanded);

        let mut seen = HashSet::new();
        planned.retain(|q| !q.text.is_empty() && seen.insert(q.text.to_lowercase()));
        planned.truncate(self.max_queries);

        log::debug!(
            "🧭 {} queries planejadas para '{}' ({} ângulos)",
            planned.len(),
            request.segment(),
            self.angles.len()
        );

        planned
    }

    /// Query principal: a explícita da requisição ou uma derivada do segmento
    fn primary_query(&self, request: &AnalysisRequest, context: &PlanContext) -> SearchQuery {
        if let Some(query) = request.explicit_query() {
            return SearchQuery::new(crate::utils::clean_text(query), FacetTag::Segment);
        }

        let segment = request.segment();
        match request.product() {
            Some(product) => SearchQuery::new(
                crate::utils::clean_text(&format!(
                    "mercado {segment} {product} Brasil tendências oportunidades {}",
                    context.reference_year
                )),
                FacetTag::Product,
            ),
            None => SearchQuery::new(
                crate::utils::clean_text(&format!("análise mercado {segment} Brasil dados estatísticas crescimento")),
                FacetTag::Segment,
            ),
        }
    }

    /// Nomes dos ângulos ativos
    pub fn angle_names(&self) -> Vec<&'static str> {
        self.angles.iter().map(|a| a.name()).collect()
    }

    pub fn max_queries(&self) -> usize {
        self.max_queries
    }
}

impl Default for QueryPlanner {
    fn default() -> Self {
        Self::new(20)
    }
}
