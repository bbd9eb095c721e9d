// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// SCORE DE QUALIDADE
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//
// Rubrica aditiva sobre o resultado montado. Função pura: nunca falha e
// sempre fica em [0, 100]. Seções via fallback não pontuam.
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

use serde::Serialize;

use crate::config::ScoringRubric;
use crate::types::{AnalysisResult, SectionKind, SectionOutcome};

/// Pontos obtidos em cada item da rubrica
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ScoreBreakdown {
    pub sources: f64,
    pub content: f64,
    pub seed: f64,
    pub primary: f64,
    pub secondary: f64,
}

impl ScoreBreakdown {
    /// Soma limitada a [0, 100]
    pub fn total(&self) -> f64 {
        (self.sources + self.content + self.seed + self.primary + self.secondary).clamp(0.0, 100.0)
    }
}

/// Avaliador de qualidade do resultado final
#[derive(Debug, Clone, Default)]
pub struct QualityScorer {
    rubric: ScoringRubric,
}

impl QualityScorer {
    pub fn new(rubric: ScoringRubric) -> Self {
        Self { rubric }
    }

    pub fn rubric(&self) -> &ScoringRubric {
        &self.rubric
    }

    /// Score em [0, 100]
    pub fn score(&self, result: &AnalysisResult) -> f64 {
        let breakdown = self.breakdown(result);
        let total = breakdown.total();
        log::debug!("📊 Score: {:?} = {:.1}", breakdown, total);
        total
    }

    /// Pontos por item da rubrica
    pub fn breakdown(&self, result: &AnalysisResult) -> ScoreBreakdown {
        let rubric = &self.rubric;
        let research = &result.research;

        let sources = if research.stats.unique_documents >= rubric.min_sources {
            rubric.sources_points
        } else {
            0.0
        };
        let content = if research.stats.total_chars >= rubric.min_content_chars {
            rubric.content_points
        } else {
            0.0
        };
        let seed = if result.seed_analysis.as_ref().is_some_and(|s| !s.is_empty()) {
            rubric.seed_points
        } else {
            0.0
        };

        let primary = self.section_points(result, SectionKind::Primary, rubric.primary_points);
        let secondary = self.section_points(result, SectionKind::Secondary, rubric.secondary_points);

        ScoreBreakdown {
            sources,
            content,
            seed,
            primary,
            secondary,
        }
    }

    /// Divide `points` igualmente entre as seções do tipo e soma as que contam
    fn section_points(&self, result: &AnalysisResult, kind: SectionKind, points: f64) -> f64 {
        let sections: Vec<&SectionOutcome> = result.sections.values().filter(|s| s.kind == kind).collect();
        if sections.is_empty() {
            return 0.0;
        }

        let each = points / sections.len() as f64;
        let counted = sections.iter().filter(|s| self.counts(s)).count();
        each * counted as f64
    }

    /// Seção real; primárias precisam ainda ser não triviais
    fn counts(&self, section: &SectionOutcome) -> bool {
        if !section.result.is_real() {
            return false;
        }
        match section.kind {
            SectionKind::Primary => {
                let size = serde_json::to_string(&section.result.payload)
                    .map(|s| s.chars().count())
                    .unwrap_or(0);
                size >= self.rubric.min_section_chars
            }
            SectionKind::Secondary => true,
        }
    }
}
