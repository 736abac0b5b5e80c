use crate::error::KabuError;
use crate::executor::ScriptRunner;
use crate::models::{ArtifactSet, PublishedArtifact, RunReport};
use crate::storage::{publish_paths, ArtifactPublisher, S3Publisher, ScriptStore};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// Invoked after a publishing stage that produced at least one artifact.
/// Side effects only; the report is already sealed when the hook runs.
pub type PostPublishHook = Box<dyn Fn(&[PublishedArtifact]) + Send + Sync>;

/// Drives one `execute_code` invocation: snapshot the working directory,
/// run the stored script, snapshot again, publish exactly the new plot
/// files, and fold every failure mode into a single [`RunReport`].
///
/// The runner's return is the completion signal - by the time the second
/// snapshot is taken the script's process has fully exited, so there is no
/// settling delay between execution and diffing.
pub struct PublishOrchestrator {
    store: ScriptStore,
    runner: Box<dyn ScriptRunner>,
    workdir: PathBuf,
    publisher: Option<Arc<dyn ArtifactPublisher>>,
    post_publish: Option<PostPublishHook>,
}

impl PublishOrchestrator {
    pub fn new(store: ScriptStore, runner: Box<dyn ScriptRunner>, workdir: PathBuf) -> Self {
        Self {
            store,
            runner,
            workdir,
            publisher: None,
            post_publish: None,
        }
    }

    /// Injects a publisher instead of constructing one from the
    /// environment at publish time.
    pub fn with_publisher(mut self, publisher: Arc<dyn ArtifactPublisher>) -> Self {
        self.publisher = Some(publisher);
        self
    }

    pub fn with_post_publish_hook(mut self, hook: PostPublishHook) -> Self {
        self.post_publish = Some(hook);
        self
    }

    pub fn workdir(&self) -> &Path {
        &self.workdir
    }

    /// Never fails: every error becomes part of the returned report.
    pub async fn run(&self) -> RunReport {
        let before = match ArtifactSet::scan(&self.workdir) {
            Ok(snapshot) => snapshot,
            Err(e) => return RunReport::execution_error(e.to_string()),
        };

        let script = match self.store.load() {
            Ok(script) => script,
            Err(e @ KabuError::ScriptNotFound(_)) => {
                return RunReport::script_missing(e.to_string())
            }
            Err(e) => return RunReport::execution_error(e.to_string()),
        };

        debug!("executing stored script via {}", self.runner.command_line());
        let outcome = self.runner.run(&script).await;

        if !outcome.success {
            let message = outcome
                .error
                .unwrap_or_else(|| "script execution failed".to_string());
            return RunReport::execution_error(message);
        }

        let after = match ArtifactSet::scan(&self.workdir) {
            Ok(snapshot) => snapshot,
            Err(e) => return RunReport::publish_error(e.to_string()),
        };

        let new = after.new_since(&before);
        if new.is_empty() {
            return RunReport::success(Vec::new());
        }

        info!("script produced {} new plot file(s)", new.len());

        // Constructed here rather than at startup so a missing storage
        // config cannot fail runs that produce no artifacts.
        let publisher: Arc<dyn ArtifactPublisher> = match &self.publisher {
            Some(publisher) => Arc::clone(publisher),
            None => match S3Publisher::from_env().await {
                Ok(publisher) => Arc::new(publisher),
                Err(e) => return RunReport::publish_error(e.to_string()),
            },
        };

        let (published, last_failure) = publish_paths(publisher.as_ref(), &new).await;

        if published.is_empty() {
            // new was non-empty, so every upload failed
            let reason = last_failure
                .map(|e| e.to_string())
                .unwrap_or_else(|| "no artifacts could be uploaded".to_string());
            return RunReport::publish_error(reason);
        }

        if let Some(hook) = &self.post_publish {
            hook(&published);
        }

        RunReport::success(published)
    }
}
