pub mod s3;
pub mod script_store;

pub use s3::{
    derive_object_key, object_url, publish_directory, publish_paths, ArtifactPublisher, S3Config,
    S3Publisher,
};
pub use script_store::{ScriptStore, DEFAULT_SCRIPT_FILE};
