// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// PROMPT DA ANÁLISE SEMENTE
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

use std::fmt::Write;

use crate::types::AnalysisRequest;

/// Bloco "DADOS DO PROJETO" com as facetas informadas
pub fn describe_request(request: &AnalysisRequest) -> String {
    let mut out = String::from("## DADOS DO PROJETO:\n");
    let _ = writeln!(out, "- Segmento: {}", request.segment());
    let _ = writeln!(out, "- Produto: {}", request.product().unwrap_or("Não informado"));
    let _ = writeln!(out, "- Público: {}", request.audience().unwrap_or("Não informado"));
    if let Some(price) = request.price {
        let _ = writeln!(out, "- Preço: R$ {:.2}", price);
    }
    if let Some(budget) = request.budget {
        let _ = writeln!(out, "- Orçamento de marketing: R$ {:.2}", budget);
    }
    if let Some(timeline) = request.timeline() {
        let _ = writeln!(out, "- Prazo: {}", timeline);
    }
    for (key, value) in &request.extras {
        let _ = writeln!(out, "- {}: {}", key, value);
    }
    out
}

/// Prompt enviado igualmente a todos os backends no fan-out de análise
pub fn build_seed_prompt(request: &AnalysisRequest, research_context: &str) -> String {
    format!(
        "# ANÁLISE DE MERCADO E PERSONA\n\n\
         Você é um analista de mercado sênior. Use APENAS os dados de pesquisa abaixo.\n\n\
         {project}\n\
         ## CONTEXTO DE PESQUISA:\n{context}\n\n\
         ## FORMATO DE SAÍDA\n\
         Responda com um único objeto JSON contendo as chaves:\n\
         \"resumo_executivo\", \"avatar\", \"mercado\", \"concorrencia\", \
         \"oportunidades\", \"tendencias\", \"insights\" (lista de strings).\n",
        project = describe_request(request),
        context = research_context,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe_request_lists_known_facets() {
        let request = AnalysisRequest::new("fitness coaching")
            .with_product("app")
            .with_price(997.0)
            .with_extra("concorrentes", "Nike Training");

        let text = describe_request(&request);
        assert!(text.contains("Segmento: fitness coaching"));
        assert!(text.contains("Produto: app"));
        assert!(text.contains("Público: Não informado"));
        assert!(text.contains("Preço: R$ 997.00"));
        assert!(text.contains("concorrentes: Nike Training"));
        assert!(!text.contains("Orçamento"));
    }

    #[test]
    fn test_seed_prompt_embeds_context() {
        let prompt = build_seed_prompt(&AnalysisRequest::new("fitness coaching"), "FONTE 1: xyz");
        assert!(prompt.contains("FONTE 1: xyz"));
        assert!(prompt.contains("resumo_executivo"));
    }
}
