// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// CONSOLIDADOR
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//
// Monta o AnalysisResult final a partir das partes já resolvidas.
// Não há caminho de falha: toda seção chega aqui real ou via fallback.
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::analysis::FanoutReport;
use crate::config::{ScoringRubric, StrictnessMode};
use crate::research::source_refs;
use crate::types::{
    AnalysisRequest, AnalysisResult, ResearchContext, ResearchSummary, RunMetadata, SectionOutcome,
};

/// Campos da semente aproveitados como insights
const SEED_INSIGHT_FIELDS: &[&str] = &["insights", "insights_exclusivos", "oportunidades"];

/// Máximo de insights copiados da semente
const MAX_SEED_INSIGHTS: usize = 5;

/// Montador do resultado final
#[derive(Debug, Clone)]
pub struct Consolidator {
    min_sources: usize,
    min_content_chars: usize,
    strictness: StrictnessMode,
}

impl Consolidator {
    pub fn new(rubric: &ScoringRubric, strictness: StrictnessMode) -> Self {
        Self {
            min_sources: rubric.min_sources,
            min_content_chars: rubric.min_content_chars,
            strictness,
        }
    }

    /// Monta o resultado; `quality_score` fica zerado até o scorer rodar
    pub fn consolidate(
        &self,
        request: &AnalysisRequest,
        context: &ResearchContext,
        fanout: FanoutReport,
        sections: BTreeMap<String, SectionOutcome>,
        started_at: DateTime<Utc>,
    ) -> AnalysisResult {
        let finished_at = Utc::now();
        let elapsed_ms = (finished_at - started_at).num_milliseconds().max(0) as u64;

        let research = ResearchSummary {
            stats: context.stats().clone(),
            queries: context.queries().iter().map(|q| q.text.clone()).collect(),
            sources: source_refs(context),
            floor_met: context.meets_floor(self.min_sources, self.min_content_chars),
        };

        let degraded_section_names: Vec<String> = sections
            .iter()
            .filter(|(_, s)| s.result.fallback)
            .map(|(name, _)| name.clone())
            .collect();

        let metadata = RunMetadata {
            correlation_id: request.correlation_id.clone(),
            started_at,
            finished_at,
            elapsed_ms,
            total_sections: sections.len(),
            real_sections: sections.values().filter(|s| s.result.is_real()).count(),
            degraded_sections: degraded_section_names.len(),
            degraded_section_names,
            backends_total: fanout.backends.len(),
            backend_failures: fanout.failures(),
            backend_statuses: fanout
                .backends
                .iter()
                .map(|(name, r)| (name.clone(), r.status))
                .collect(),
            strictness: self.strictness.display_name().to_string(),
            engine_version: crate::VERSION.to_string(),
        };

        let insights = self.derive_insights(&research, &fanout, &metadata);

        log::info!(
            "📦 Resultado consolidado: {}/{} seções reais, {} fontes",
            metadata.real_sections,
            metadata.total_sections,
            research.sources.len()
        );

        AnalysisResult {
            request: request.clone(),
            research,
            seed_analysis: fanout.seed.map(|s| s.fields),
            sections,
            insights,
            quality_score: 0.0,
            metadata,
        }
    }

    /// Lista determinística de insights a partir dos contadores e status
    fn derive_insights(&self, research: &ResearchSummary, fanout: &FanoutReport, metadata: &RunMetadata) -> Vec<String> {
        let stats = &research.stats;
        let mut insights = vec![format!(
            "Pesquisa: {} fontes únicas a partir de {} queries ({} caracteres extraídos)",
            research.sources.len(),
            stats.queries_planned,
            stats.total_chars
        )];

        if !research.floor_met {
            insights.push(format!(
                "Volume de pesquisa abaixo do recomendado ({} fontes / {} caracteres)",
                self.min_sources, self.min_content_chars
            ));
        }
        if stats.deadline_reached {
            insights.push("Prazo da pesquisa atingido; queries pendentes foram descartadas".to_string());
        }

        match &fanout.seed {
            Some(seed) => {
                insights.push(format!(
                    "Análise semente consolidada de {} backend(s): {}",
                    seed.contributors.len(),
                    seed.contributors.join(", ")
                ));
                insights.extend(seed_insights(&seed.fields));
            }
            None => insights.push(
                "Nenhum backend de análise respondeu; seções geradas apenas com o contexto de pesquisa".to_string(),
            ),
        }

        insights.push(format!(
            "{}/{} seções geradas com dados reais",
            metadata.real_sections, metadata.total_sections
        ));
        if !metadata.degraded_section_names.is_empty() {
            insights.push(format!(
                "Seções em modo degradado (fallback): {}",
                metadata.degraded_section_names.join(", ")
            ));
        }

        insights
    }
}

/// Textos de insight presentes na semente, na ordem dos campos conhecidos
fn seed_insights(fields: &serde_json::Map<String, Value>) -> Vec<String> {
    SEED_INSIGHT_FIELDS
        .iter()
        .filter_map(|key| fields.get(*key))
        .filter_map(Value::as_array)
        .flatten()
        .filter_map(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .take(MAX_SEED_INSIGHTS)
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    use crate::analysis::SeedAnalysis;
    use crate::types::{SectionKind, TaskResult, TaskStatus};

    fn sections() -> BTreeMap<String, SectionOutcome> {
        let mut map = BTreeMap::new();
        map.insert(
            "avatar".to_string(),
            SectionOutcome {
                kind: SectionKind::Primary,
                result: TaskResult::success("avatar", json!({"a": 1}), 5),
            },
        );
        map.insert(
            "funil".to_string(),
            SectionOutcome {
                kind: SectionKind::Secondary,
                result: TaskResult::timed_out("funil", "prazo", 5).with_fallback(json!({"_degradado": true})),
            },
        );
        map
    }

    fn fanout(seed: bool) -> FanoutReport {
        let mut report = FanoutReport::default();
        report
            .backends
            .insert("primary".into(), TaskResult::success("primary", json!({}), 1));
        report
            .backends
            .insert("secondary".into(), TaskResult::failed("secondary", "erro", 1));
        if seed {
            report.seed = Some(SeedAnalysis {
                fields: json!({"insights": ["Mercado em alta", " "], "mercado": "x"})
                    .as_object()
                    .cloned()
                    .unwrap(),
                contributors: vec!["primary".into()],
            });
        }
        report
    }

    #[test]
    fn test_metadata_counts() {
        let request = AnalysisRequest::new("fitness coaching").with_correlation_id("abc");
        let consolidator = Consolidator::new(&ScoringRubric::default(), StrictnessMode::Robust);
        let result = consolidator.consolidate(
            &request,
            &ResearchContext::empty(vec![]),
            fanout(true),
            sections(),
            Utc::now(),
        );

        assert_eq!(result.metadata.correlation_id, "abc");
        assert_eq!(result.metadata.total_sections, 2);
        assert_eq!(result.metadata.real_sections, 1);
        assert_eq!(result.metadata.degraded_section_names, vec!["funil".to_string()]);
        assert_eq!(result.metadata.backend_failures, 1);
        assert_eq!(result.metadata.backend_statuses["secondary"], TaskStatus::Failed);
        assert_eq!(result.metadata.strictness, "robust");
        assert!(!result.research.floor_met);
        assert_eq!(result.seed_analysis.unwrap()["mercado"], "x");
    }

    #[test]
    fn test_insights_mention_degraded_and_seed() {
        let consolidator = Consolidator::new(&ScoringRubric::default(), StrictnessMode::Robust);
        let result = consolidator.consolidate(
            &AnalysisRequest::new("fitness coaching"),
            &ResearchContext::empty(vec![]),
            fanout(true),
            sections(),
            Utc::now(),
        );

        assert!(result.insights.iter().any(|i| i.contains("funil")));
        assert!(result.insights.iter().any(|i| i == "Mercado em alta"));
        assert!(!result.insights.iter().any(|i| i.trim().is_empty()));
    }

    #[test]
    fn test_insights_without_seed() {
        let consolidator = Consolidator::new(&ScoringRubric::default(), StrictnessMode::Robust);
        let result = consolidator.consolidate(
            &AnalysisRequest::new("fitness coaching"),
            &ResearchContext::empty(vec![]),
            fanout(false),
            sections(),
            Utc::now(),
        );

        assert!(result.seed_analysis.is_none());
        assert!(result.insights.iter().any(|i| i.contains("Nenhum backend")));
    }
}
