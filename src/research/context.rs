// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// RENDERIZAÇÃO DO CONTEXTO DE PESQUISA
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

use std::fmt::Write;

use crate::config::PromptBudget;
use crate::types::{ResearchContext, SourceRef};
use crate::utils::truncate_chars;

/// Renderiza o contexto como texto para prompts
///
/// Limitado a `budget.context_documents` documentos com no máximo
/// `budget.chars_per_document` caracteres cada, seguido do bloco de
/// estatísticas da pesquisa.
pub fn render_context(context: &ResearchContext, budget: &PromptBudget) -> String {
    let mut out = String::from("PESQUISA WEB EXECUTADA:\n\n");

    if context.is_empty() {
        out.push_str("(nenhuma fonte disponível; use apenas os dados da requisição)\n");
    }

    for doc in context.documents().iter().take(budget.context_documents) {
        let _ = writeln!(out, "--- FONTE {}: {} ---", doc.rank, doc.document.title);
        let _ = writeln!(out, "URL: {}", doc.document.url);
        let _ = writeln!(out, "Relevância: {:.2}", doc.score);
        let _ = writeln!(out, "Query origem: {}", doc.document.query);
        let _ = writeln!(
            out,
            "Conteúdo: {}\n",
            truncate_chars(&doc.document.body, budget.chars_per_document)
        );
    }

    let stats = context.stats();
    out.push_str("\n=== ESTATÍSTICAS DA PESQUISA ===\n");
    let _ = writeln!(out, "Total de queries executadas: {}", stats.queries_planned);
    let _ = writeln!(out, "Total de resultados encontrados: {}", stats.total_hits);
    let _ = writeln!(out, "Páginas únicas analisadas: {}", stats.unique_documents);
    let _ = writeln!(out, "Total de caracteres extraídos: {}", stats.total_chars);

    out
}

/// Referências às fontes do contexto, na ordem do ranking
pub fn source_refs(context: &ResearchContext) -> Vec<SourceRef> {
    context
        .documents()
        .iter()
        .map(|doc| SourceRef {
            url: doc.document.url.clone(),
            title: doc.document.title.clone(),
            score: doc.score,
            rank: doc.rank,
            query: doc.document.query.clone(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{DiscoveryOrder, FacetTag, RankedDocument, RawDocument, ResearchStats};

    fn context(n: usize, body: &str) -> ResearchContext {
        let documents = (0..n)
            .map(|i| RankedDocument {
                document: RawDocument {
                    url: format!("https://site{}.com", i),
                    title: format!("Fonte {}", i),
                    snippet: String::new(),
                    body: body.to_string(),
                    query: "mercado fitness".into(),
                    facet: FacetTag::Segment,
                    discovery: DiscoveryOrder { query_index: 0, position: i },
                },
                score: 1.0,
                rank: i + 1,
            })
            .collect();
        let stats = ResearchStats {
            unique_documents: n,
            ..Default::default()
        };
        ResearchContext::new(documents, vec![], stats)
    }

    #[test]
    fn test_render_respects_budget() {
        let budget = PromptBudget {
            context_documents: 2,
            chars_per_document: 10,
            ..Default::default()
        };
        let rendered = render_context(&context(5, &"x".repeat(50)), &budget);

        assert!(rendered.contains("FONTE 1"));
        assert!(rendered.contains("FONTE 2"));
        assert!(!rendered.contains("FONTE 3"));
        assert!(rendered.contains(&format!("Conteúdo: {}\n", "x".repeat(10))));
        assert!(!rendered.contains(&"x".repeat(11)));
    }

    #[test]
    fn test_render_empty_context() {
        let rendered = render_context(&ResearchContext::empty(vec![]), &PromptBudget::default());
        assert!(rendered.contains("nenhuma fonte"));
        assert!(rendered.contains("Páginas únicas analisadas: 0"));
    }

    #[test]
    fn test_source_refs_follow_rank() {
        let refs = source_refs(&context(3, "corpo"));
        assert_eq!(refs.len(), 3);
        assert_eq!(refs[0].rank, 1);
        assert_eq!(refs[2].url, "https://site2.com");
    }
}
