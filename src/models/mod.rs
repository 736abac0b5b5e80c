pub mod artifact;
pub mod report;

pub use artifact::{ArtifactSet, PublishedArtifact};
pub use report::{RunReport, RunStatus};
