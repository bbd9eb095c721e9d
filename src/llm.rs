// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// CLIENTE DE GERAÇÃO
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//
// Trait e implementações para geração de texto por modelos de linguagem.
// Cada backend é opaco para o motor: prompt + limite de tokens -> texto.
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ProviderError;
use crate::search::MockBehavior;

/// Trait principal para backends de geração
///
/// Permite fácil substituição entre provedores (OpenAI, compatíveis, local).
#[async_trait]
pub trait GenerationClient: Send + Sync {
    /// Gera texto para o prompt, limitado a `max_tokens`
    async fn generate(&self, prompt: &str, max_tokens: u32) -> Result<String, ProviderError>;
}

/// Backend nomeado usado no fan-out de análise
#[derive(Clone)]
pub struct NamedBackend {
    pub name: String,
    pub client: Arc<dyn GenerationClient>,
}

impl NamedBackend {
    pub fn new(name: impl Into<String>, client: Arc<dyn GenerationClient>) -> Self {
        Self {
            name: name.into(),
            client,
        }
    }
}

/// Nomes únicos na ordem dada: repetições ganham sufixo `#2`, `#3`...
pub fn unique_names<'a>(names: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    let mut seen = HashSet::new();
    names
        .into_iter()
        .map(|name| {
            let mut candidate = name.to_string();
            let mut n = 1;
            while !seen.insert(candidate.clone()) {
                n += 1;
                candidate = format!("{}#{}", name, n);
            }
            candidate
        })
        .collect()
}

/// Renomeia backends repetidos com [`unique_names`]
pub fn with_unique_names(backends: Vec<NamedBackend>) -> Vec<NamedBackend> {
    let names = unique_names(backends.iter().map(|b| b.name.as_str()));
    backends
        .into_iter()
        .zip(names)
        .map(|(backend, name)| {
            if backend.name != name {
                log::warn!("⚠️ Backend '{}' repetido, renomeado para '{}'", backend.name, name);
            }
            NamedBackend { name, ..backend }
        })
        .collect()
}

impl std::fmt::Debug for NamedBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NamedBackend").field("name", &self.name).finish()
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// CADEIA DE FALLBACK
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Tenta cada backend em ordem até um responder.
///
/// Usada pelo agendador de seções: o motor vê uma única chamada.
pub struct GenerationChain {
    backends: Vec<NamedBackend>,
}

impl GenerationChain {
    pub fn new(backends: Vec<NamedBackend>) -> Self {
        Self { backends }
    }

    pub fn len(&self) -> usize {
        self.backends.len()
    }

    pub fn is_empty(&self) -> bool {
        self.backends.is_empty()
    }
}

#[async_trait]
impl GenerationClient for GenerationChain {
    async fn generate(&self, prompt: &str, max_tokens: u32) -> Result<String, ProviderError> {
        let mut errors = Vec::new();

        for backend in &self.backends {
            match backend.client.generate(prompt, max_tokens).await {
                Ok(text) if !text.trim().is_empty() => return Ok(text),
                Ok(_) => errors.push(format!("{}: resposta vazia", backend.name)),
                Err(e) => {
                    log::warn!("⚠️ Backend {} falhou, tentando próximo: {}", backend.name, e);
                    errors.push(format!("{}: {}", backend.name, e));
                }
            }
        }

        Err(ProviderError::Exhausted(errors.join("; ")))
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// IMPLEMENTAÇÃO OPENAI
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Cliente para a API de chat completions (OpenAI ou compatível)
pub struct OpenAiGenerationClient {
    api_key: String,
    model: String,
    base_url: String,
    client: reqwest::Client,
}

impl OpenAiGenerationClient {
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            model: "gpt-4o-mini".into(),
            base_url: "https://api.openai.com/v1".into(),
            client: reqwest::Client::new(),
        }
    }

    pub fn with_model(mut self, model: &str) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').into();
        self
    }
}

#[async_trait]
impl GenerationClient for OpenAiGenerationClient {
    async fn generate(&self, prompt: &str, max_tokens: u32) -> Result<String, ProviderError> {
        let body = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: "Você é um analista de mercado sênior. Responda apenas com JSON válido.",
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            max_tokens,
            temperature: 0.7,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(ProviderError::RateLimited);
        }
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(ProviderError::Api(format!(
                "{} HTTP {}: {}",
                self.model,
                status.as_u16(),
                crate::utils::truncate_chars(&detail, 200)
            )));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|text| !text.trim().is_empty())
            .ok_or_else(|| ProviderError::InvalidResponse("resposta sem conteúdo".into()))
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// IMPLEMENTAÇÃO MOCK PARA TESTES
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Cliente de geração simulado
///
/// Responde sempre o mesmo texto (ou falha/trava conforme o comportamento)
/// e registra os prompts recebidos.
#[derive(Debug)]
pub struct MockGenerationClient {
    response: String,
    behavior: MockBehavior,
    panics: bool,
    calls: AtomicUsize,
    prompts: Mutex<Vec<String>>,
}

impl MockGenerationClient {
    /// Responde com o texto informado
    pub fn responding(response: impl Into<String>) -> Self {
        Self {
            response: response.into(),
            behavior: MockBehavior::Succeed,
            panics: false,
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Responde com um objeto JSON válido e não vazio
    pub fn new() -> Self {
        Self::responding(r#"{"resumo": "mercado em crescimento", "oportunidades": ["nicho premium"]}"#)
    }

    pub fn failing() -> Self {
        Self::new().with_behavior(MockBehavior::Fail)
    }

    pub fn hanging() -> Self {
        Self::new().with_behavior(MockBehavior::Hang)
    }

    /// Responde texto que não é JSON
    pub fn malformed() -> Self {
        Self::responding("isto não é json")
    }

    /// Entra em pânico ao ser chamado
    pub fn panicking() -> Self {
        Self {
            panics: true,
            ..Self::new()
        }
    }

    pub fn with_behavior(mut self, behavior: MockBehavior) -> Self {
        self.behavior = behavior;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Prompts recebidos, na ordem de chegada
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().map(|p| p.clone()).unwrap_or_default()
    }
}

impl Default for MockGenerationClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GenerationClient for MockGenerationClient {
    async fn generate(&self, prompt: &str, _max_tokens: u32) -> Result<String, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(prompt.to_string());
        }

        if self.panics {
            panic!("mock generation panic");
        }

        if !self.behavior.apply().await {
            return Err(ProviderError::Api("mock generation failure".into()));
        }

        Ok(self.response.clone())
    }
}
