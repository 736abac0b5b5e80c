// Pipeline module - run-and-publish orchestration

pub mod orchestrator;

pub use orchestrator::{PostPublishHook, PublishOrchestrator};
