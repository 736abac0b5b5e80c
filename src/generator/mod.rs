// Generator module - LLM-backed analysis script generation

pub mod llm_client;
pub mod prompts;

pub use llm_client::{create_code_generator, CodeGenerator, GeneratorConfig, RigCodeGenerator};
pub use prompts::PromptTemplate;
