// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// DEDUPLICAÇÃO E RANKING DE DOCUMENTOS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

use std::collections::HashSet;

use rayon::prelude::*;

use crate::config::RelevanceWeights;
use crate::types::{AnalysisRequest, FacetTag, RankedDocument, RawDocument};
use crate::utils::{count_occurrences, word_count};

/// Deduplica por URL e ordena por relevância
///
/// A ordem de saída depende apenas do conjunto de documentos: a entrada
/// é reordenada pela ordem de descoberta antes da deduplicação, e empates
/// de score são resolvidos pela mesma ordem.
#[derive(Debug, Clone, Default)]
pub struct Ranker {
    weights: RelevanceWeights,
}

impl Ranker {
    pub fn new(weights: RelevanceWeights) -> Self {
        Self { weights }
    }

    /// Remove duplicatas (primeira ocorrência vence) e ranqueia
    pub fn rank(&self, mut documents: Vec<RawDocument>, request: &AnalysisRequest) -> Vec<RankedDocument> {
        documents.sort_by_key(|d| d.discovery);

        let mut seen = HashSet::new();
        documents.retain(|d| seen.insert(d.url.clone()));

        // Score em paralelo; collect mantém a ordem de descoberta
        let mut ranked: Vec<RankedDocument> = documents
            .into_par_iter()
            .map(|document| {
                let score = self.score(&document, request);
                RankedDocument {
                    document,
                    score,
                    rank: 0,
                }
            })
            .collect();

        ranked.sort_by(|a, b| {
            b.score
                .total_cmp(&a.score)
                .then_with(|| a.document.discovery.cmp(&b.document.discovery))
        });

        for (i, doc) in ranked.iter_mut().enumerate() {
            doc.rank = i + 1;
        }

        ranked
    }

    /// Score de relevância de um documento para a requisição
    pub fn score(&self, document: &RawDocument, request: &AnalysisRequest) -> f64 {
        let w = &self.weights;
        let body = document.body.to_lowercase();

        let facet_weight = |facet: Option<&str>, weight: f64| {
            facet
                .map(|f| count_occurrences(&body, &f.to_lowercase()) as f64 * weight)
                .unwrap_or(0.0)
        };

        let mut score = facet_weight(request.facet(FacetTag::Segment), w.segment)
            + facet_weight(request.product(), w.product)
            + facet_weight(request.audience(), w.audience);

        score += w
            .vocabulary
            .iter()
            .map(|term| count_occurrences(&body, term) as f64 * w.vocabulary_term)
            .sum::<f64>();

        if matches!(document.facet, FacetTag::Product | FacetTag::Audience) {
            score += w.targeted_query_bonus;
        }

        let words = word_count(&body);
        if let Some((_, bonus)) = w.length_tiers.iter().find(|(min_words, _)| words > *min_words) {
            score += bonus;
        }

        score
    }
}
