// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// EXTRAÇÃO DE JSON DA SAÍDA DE GERAÇÃO
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::error::AnalysisError;
use crate::types::JsonMap;

/// Bloco markdown ```json ... ``` (ou ``` sem linguagem)
static FENCE: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"(?s)```(?:json|JSON)?\s*(.*?)\s*```").ok());

/// Remove cercas markdown, se houver
pub fn strip_fences(text: &str) -> &str {
    let trimmed = text.trim();
    FENCE
        .as_ref()
        .and_then(|re| re.captures(trimmed))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
        .unwrap_or(trimmed)
}

/// Extrai um objeto JSON não vazio da resposta de um backend
///
/// Aceita texto com cercas markdown ou com prosa em volta do objeto.
/// Qualquer coisa que não seja um objeto com ao menos um campo é
/// `AnalysisError::Parse`.
pub fn extract_json_object(text: &str) -> Result<JsonMap, AnalysisError> {
    let body = strip_fences(text);

    let value = match serde_json::from_str::<Value>(body) {
        Ok(value) => value,
        Err(first_error) => {
            // Prosa em volta: tenta do primeiro '{' ao último '}'
            let start = body.find('{');
            let end = body.rfind('}');
            match (start, end) {
                (Some(s), Some(e)) if s < e => serde_json::from_str::<Value>(&body[s..=e])
                    .map_err(|e| AnalysisError::Parse(e.to_string()))?,
                _ => return Err(AnalysisError::Parse(first_error.to_string())),
            }
        }
    };

    match value {
        Value::Object(map) if !map.is_empty() => Ok(map),
        Value::Object(_) => Err(AnalysisError::Parse("objeto JSON vazio".into())),
        other => Err(AnalysisError::Parse(format!(
            "esperado objeto JSON, recebido {}",
            json_kind(&other)
        ))),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
