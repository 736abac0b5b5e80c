use crate::error::KabuError;
use crate::generator::prompts::PromptTemplate;
use rig::client::CompletionClient;
use rig::completion::{AssistantContent, CompletionModel};
use rig::providers::{anthropic, gemini, openai};
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    pub model_name: String,
    pub api_key: Option<String>,
    pub timeout_seconds: u64,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
}

/// Opaque natural-language-to-script collaborator. The tool layer and the
/// tests depend on this trait, not on any concrete LLM client.
pub trait CodeGenerator: Send + Sync {
    /// Returns a ready-to-run Python script for the query (no markdown
    /// fences, no prose).
    fn generate<'a>(
        &'a self,
        query: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<String, KabuError>> + Send + 'a>>;

    fn get_model_name(&self) -> &str;

    fn get_timeout(&self) -> Duration;
}

impl std::fmt::Debug for dyn CodeGenerator + Send + Sync {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CodeGenerator")
            .field("model_name", &self.get_model_name())
            .finish()
    }
}

/// Pulls the script out of a model response. Models are asked for bare
/// code but regularly wrap it in a fence or preface it with a sentence, so
/// the first fenced block wins when one exists.
fn extract_script_from_response(response: &str) -> Result<String, KabuError> {
    let trimmed = response.trim();
    if trimmed.is_empty() {
        return Err(KabuError::InvalidResponse(
            "model returned an empty response".to_string(),
        ));
    }

    let script = match find_fenced_block(trimmed) {
        Some(block) => block,
        None => trimmed.to_string(),
    };

    let script = script.trim();
    if script.is_empty() {
        return Err(KabuError::InvalidResponse(
            "model response contained no code".to_string(),
        ));
    }

    Ok(script.to_string())
}

fn find_fenced_block(response: &str) -> Option<String> {
    let start = response.find("```")?;
    let after_fence = &response[start + 3..];

    // Skip the info string ("python", "py", or empty) on the fence line
    let body_start = after_fence.find('\n')? + 1;
    let body = &after_fence[body_start..];

    // An unterminated fence still yields everything after the opening line
    match body.find("```") {
        Some(end) => Some(body[..end].to_string()),
        None => Some(body.to_string()),
    }
}

pub struct RigCodeGenerator {
    config: GeneratorConfig,
    provider: RigProvider,
}

enum RigProvider {
    OpenAI(openai::Client),
    Anthropic(anthropic::Client),
    Gemini(gemini::Client),
}

impl RigCodeGenerator {
    pub fn new(config: GeneratorConfig) -> Result<Self, KabuError> {
        let provider = create_provider(&config)?;
        Ok(Self { config, provider })
    }

    async fn make_api_request(&self, query: &str) -> Result<String, KabuError> {
        let prompt = PromptTemplate::build_generation_prompt(query);
        let system_prompt = PromptTemplate::build_system_prompt();

        match &self.provider {
            RigProvider::OpenAI(client) => {
                let model = client.completion_model(&self.config.model_name);
                self.send_completion_request(model, &prompt, system_prompt)
                    .await
            }
            RigProvider::Anthropic(client) => {
                let model = client.completion_model(&self.config.model_name);
                self.send_completion_request(model, &prompt, system_prompt)
                    .await
            }
            RigProvider::Gemini(client) => {
                let model = client.completion_model(&self.config.model_name);
                self.send_completion_request(model, &prompt, system_prompt)
                    .await
            }
        }
    }

    async fn send_completion_request<M: CompletionModel>(
        &self,
        model: M,
        prompt: &str,
        system_prompt: String,
    ) -> Result<String, KabuError> {
        let mut builder = model.completion_request(prompt).preamble(system_prompt);

        // Skip temperature for models that don't support it (GPT-5 and o1 series)
        if let Some(temp) = self.config.temperature {
            if !self.config.model_name.starts_with("gpt-5")
                && !self.config.model_name.starts_with("o1")
            {
                builder = builder.temperature(temp as f64);
            }
        }

        if let Some(max_tokens) = self.config.max_tokens {
            builder = builder.max_tokens(max_tokens as u64);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| KabuError::LlmClientError(format!("Request failed: {}", e)))?;

        let mut extracted_text = String::new();
        for content in response.choice.iter() {
            if let AssistantContent::Text(text_content) = content {
                extracted_text.push_str(&text_content.text);
            }
        }

        Ok(extracted_text)
    }
}

impl CodeGenerator for RigCodeGenerator {
    fn generate<'a>(
        &'a self,
        query: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<String, KabuError>> + Send + 'a>> {
        Box::pin(async move {
            let start_time = std::time::Instant::now();

            let response =
                match tokio::time::timeout(self.get_timeout(), self.make_api_request(query)).await
                {
                    Ok(result) => result?,
                    Err(_) => {
                        return Err(KabuError::GenerationTimeout {
                            timeout: self.config.timeout_seconds,
                        })
                    }
                };

            debug!(
                "generated script with {} in {} ms",
                self.config.model_name,
                start_time.elapsed().as_millis()
            );

            extract_script_from_response(&response)
        })
    }

    fn get_model_name(&self) -> &str {
        &self.config.model_name
    }

    fn get_timeout(&self) -> Duration {
        Duration::from_secs(self.config.timeout_seconds)
    }
}

fn create_provider(config: &GeneratorConfig) -> Result<RigProvider, KabuError> {
    let model_name = config.model_name.trim();

    if is_openai_model(model_name) {
        let api_key = config
            .api_key
            .clone()
            .or_else(|| std::env::var("OPENAI_API_KEY").ok())
            .ok_or_else(|| KabuError::LlmClientError("OpenAI API key not found".to_string()))?;

        Ok(RigProvider::OpenAI(openai::Client::new(&api_key)))
    } else if is_claude_model(model_name) {
        let api_key = config
            .api_key
            .clone()
            .or_else(|| std::env::var("ANTHROPIC_API_KEY").ok())
            .ok_or_else(|| KabuError::LlmClientError("Anthropic API key not found".to_string()))?;

        Ok(RigProvider::Anthropic(
            anthropic::ClientBuilder::new(&api_key).build(),
        ))
    } else if is_gemini_model(model_name) {
        let api_key = config
            .api_key
            .clone()
            .or_else(|| std::env::var("GEMINI_API_KEY").ok())
            .ok_or_else(|| KabuError::LlmClientError("Gemini API key not found".to_string()))?;

        Ok(RigProvider::Gemini(gemini::Client::new(&api_key)))
    } else {
        Err(KabuError::LlmClientError(format!(
            "Unsupported model '{}'. Use OpenAI (gpt-*), Anthropic (claude-*), or Gemini (gemini-*) models",
            model_name
        )))
    }
}

pub fn create_code_generator(
    model: &str,
    api_key: Option<String>,
    timeout_seconds: u64,
) -> Result<Box<dyn CodeGenerator + Send + Sync>, KabuError> {
    let config = GeneratorConfig {
        model_name: model.to_string(),
        api_key,
        timeout_seconds,
        max_tokens: Some(4000),
        temperature: Some(0.2),
    };

    let generator = RigCodeGenerator::new(config)?;
    Ok(Box::new(generator))
}

fn is_openai_model(model: &str) -> bool {
    let candidate = model.strip_prefix("openai/").unwrap_or(model);
    let candidate = candidate.strip_prefix("ft:").unwrap_or(candidate);

    candidate.starts_with("gpt-")
        || candidate.starts_with("chatgpt-")
        || candidate.starts_with("o1")
        || candidate.starts_with("o3")
        || candidate.starts_with("o4")
}

fn is_claude_model(model: &str) -> bool {
    let candidate = model.strip_prefix("anthropic/").unwrap_or(model);
    candidate.starts_with("claude-")
}

fn is_gemini_model(model: &str) -> bool {
    let candidate = model.strip_prefix("gemini/").unwrap_or(model);
    candidate.starts_with("gemini-")
}
