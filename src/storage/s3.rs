use crate::error::KabuError;
use crate::models::{ArtifactSet, PublishedArtifact};
use aws_credential_types::Credentials;
use aws_sdk_s3::config::{BehaviorVersion, Region};
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::ObjectCannedAcl;
use chrono::{DateTime, Local};
use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use tracing::warn;

pub const DEFAULT_REGION: &str = "us-east-1";

/// Object storage seam. The orchestrator and the batch helpers work
/// against this trait; production uses [`S3Publisher`].
pub trait ArtifactPublisher: Send + Sync {
    /// Uploads one local file and returns its durable URL.
    ///
    /// `key` falls back to the derived `plots/{timestamp}_{filename}` form
    /// when omitted. `make_public` sets a public-read ACL on the object.
    fn upload<'a>(
        &'a self,
        local_path: &'a Path,
        key: Option<String>,
        make_public: bool,
    ) -> Pin<Box<dyn Future<Output = Result<String, KabuError>> + Send + 'a>>;
}

#[derive(Debug, Clone)]
pub struct S3Config {
    pub access_key: String,
    pub secret_key: String,
    pub region: String,
    pub bucket: String,
}

impl S3Config {
    /// Reads `AWS_ACCESS_KEY_ID`, `AWS_SECRET_ACCESS_KEY`, `AWS_REGION` and
    /// `AWS_S3_BUCKET_NAME`. The region defaults to us-east-1; the other
    /// three are required and validated before any client is built.
    pub fn from_env() -> Result<Self, KabuError> {
        Self::from_vars(
            std::env::var("AWS_ACCESS_KEY_ID").ok(),
            std::env::var("AWS_SECRET_ACCESS_KEY").ok(),
            std::env::var("AWS_REGION").ok(),
            std::env::var("AWS_S3_BUCKET_NAME").ok(),
        )
    }

    pub fn from_vars(
        access_key: Option<String>,
        secret_key: Option<String>,
        region: Option<String>,
        bucket: Option<String>,
    ) -> Result<Self, KabuError> {
        let access_key = access_key.filter(|v| !v.is_empty());
        let secret_key = secret_key.filter(|v| !v.is_empty());
        let bucket = bucket.filter(|v| !v.is_empty());

        match (access_key, secret_key, bucket) {
            (Some(access_key), Some(secret_key), Some(bucket)) => Ok(Self {
                access_key,
                secret_key,
                region: region
                    .filter(|v| !v.is_empty())
                    .unwrap_or_else(|| DEFAULT_REGION.to_string()),
                bucket,
            }),
            _ => Err(KabuError::ConfigError(
                "Missing AWS credentials. Please set AWS_ACCESS_KEY_ID, \
                 AWS_SECRET_ACCESS_KEY, and AWS_S3_BUCKET_NAME in .env"
                    .to_string(),
            )),
        }
    }
}

/// Derived object key: `plots/{YYYYMMDD_HHMMSS}_{filename}`. Distinct
/// filenames never collide; identical filenames within the same second
/// overwrite each other (accepted).
pub fn derive_object_key(now: DateTime<Local>, local_path: &Path) -> String {
    let filename = local_path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();

    format!("plots/{}_{}", now.format("%Y%m%d_%H%M%S"), filename)
}

/// Virtual-hosted-style URL, computed locally rather than read back from
/// the backend.
pub fn object_url(bucket: &str, region: &str, key: &str) -> String {
    format!("https://{}.s3.{}.amazonaws.com/{}", bucket, region, key)
}

pub struct S3Publisher {
    client: aws_sdk_s3::Client,
    bucket: String,
    region: String,
}

impl S3Publisher {
    pub async fn new(config: S3Config) -> Self {
        let credentials = Credentials::new(
            config.access_key,
            config.secret_key,
            None,
            None,
            "kabu-static",
        );

        let sdk_config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .credentials_provider(credentials)
            .load()
            .await;

        Self {
            client: aws_sdk_s3::Client::new(&sdk_config),
            bucket: config.bucket,
            region: config.region,
        }
    }

    pub async fn from_env() -> Result<Self, KabuError> {
        Ok(Self::new(S3Config::from_env()?).await)
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    async fn upload_file(
        &self,
        local_path: &Path,
        key: Option<String>,
        make_public: bool,
    ) -> Result<String, KabuError> {
        if !local_path.exists() {
            return Err(KabuError::FileNotFound(local_path.display().to_string()));
        }

        let key = key.unwrap_or_else(|| derive_object_key(Local::now(), local_path));

        let body = ByteStream::from_path(local_path)
            .await
            .map_err(|e| KabuError::PublishError(e.to_string()))?;

        let mut request = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .body(body);

        if make_public {
            request = request.acl(ObjectCannedAcl::PublicRead);
        }

        request
            .send()
            .await
            .map_err(|e| KabuError::PublishError(format!("{}", DisplayErrorContext(&e))))?;

        Ok(object_url(&self.bucket, &self.region, &key))
    }

    /// Batch convenience: uploads every `*.png` in `directory` with derived
    /// keys. Never fails as a whole; see [`publish_directory`].
    pub async fn upload_plot_files(&self, directory: &Path) -> Vec<PublishedArtifact> {
        publish_directory(self, directory).await
    }
}

impl ArtifactPublisher for S3Publisher {
    fn upload<'a>(
        &'a self,
        local_path: &'a Path,
        key: Option<String>,
        make_public: bool,
    ) -> Pin<Box<dyn Future<Output = Result<String, KabuError>> + Send + 'a>> {
        Box::pin(self.upload_file(local_path, key, make_public))
    }
}

/// Uploads each path in order with derived keys. A failed file is logged
/// as a warning and skipped, so one bad file never aborts the rest. The
/// last failure, if any, is returned alongside the successes for callers
/// that report partial outcomes.
pub async fn publish_paths(
    publisher: &dyn ArtifactPublisher,
    paths: &[PathBuf],
) -> (Vec<PublishedArtifact>, Option<KabuError>) {
    let mut published = Vec::new();
    let mut last_failure = None;

    for path in paths {
        match publisher.upload(path, None, false).await {
            Ok(url) => published.push(PublishedArtifact::new(path.clone(), url)),
            Err(e) => {
                warn!("Failed to upload {}: {}", display_name(path), e);
                last_failure = Some(e);
            }
        }
    }

    (published, last_failure)
}

/// Uploads every plot file currently in `directory`, one at a time. A
/// failed file is logged as a warning and skipped; the remaining files are
/// still attempted, so the batch never fails because of one bad file.
pub async fn publish_directory(
    publisher: &dyn ArtifactPublisher,
    directory: &Path,
) -> Vec<PublishedArtifact> {
    let snapshot = match ArtifactSet::scan(directory) {
        Ok(snapshot) => snapshot,
        Err(e) => {
            warn!("Failed to scan {} for plot files: {}", directory.display(), e);
            return Vec::new();
        }
    };

    let paths: Vec<PathBuf> = snapshot.paths().cloned().collect();
    let (published, _) = publish_paths(publisher, &paths).await;
    published
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
