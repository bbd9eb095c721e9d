// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// CONSOLIDAÇÃO DAS SAÍDAS DOS BACKENDS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::types::JsonMap;
use crate::utils::truncate_chars;

/// Análise semente consolidada a partir dos backends que responderam
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SeedAnalysis {
    pub fields: JsonMap,
    /// Backends que contribuíram, na ordem de consolidação
    pub contributors: Vec<String>,
}

impl SeedAnalysis {
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// JSON da semente, limitado a `max_chars` caracteres
    pub fn render(&self, max_chars: usize) -> String {
        let json = serde_json::to_string_pretty(&self.fields).unwrap_or_default();
        truncate_chars(&json, max_chars).to_string()
    }
}

/// Consolida as saídas estruturadas na ordem dos backends
///
/// - chaves novas são adicionadas
/// - listas em colisão são concatenadas
/// - demais colisões: vence o valor com maior payload serializado
pub fn merge_outputs(outputs: Vec<(String, JsonMap)>) -> SeedAnalysis {
    let mut seed = SeedAnalysis::default();

    for (backend, fields) in outputs {
        for (key, incoming) in fields {
            match seed.fields.get_mut(&key) {
                None => {
                    seed.fields.insert(key, incoming);
                }
                Some(Value::Array(existing)) if incoming.is_array() => {
                    if let Value::Array(items) = incoming {
                        existing.extend(items);
                    }
                }
                Some(existing) => {
                    if serialized_len(&incoming) > serialized_len(existing) {
                        *existing = incoming;
                    }
                }
            }
        }
        seed.contributors.push(backend);
    }

    seed
}

fn serialized_len(value: &Value) -> usize {
    serde_json::to_string(value).map(|s| s.len()).unwrap_or(0)
}
