use std::path::PathBuf;

use domain_upload::model::vo::{default_max_concurrency, QueryParams, DEFAULT_CHUNK_SIZE};
use infrastructure_telemetry::TelemetryConfig;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub auth: AuthConfig,
    #[serde(default)]
    pub upload: UploadConfig,
    pub provider: ProviderConfig,
    pub job: JobConfig,
    #[serde(default)]
    pub common: CommonConfig,
}

/// OAuth client registered with the identity provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    pub token_url: String,
    pub client_id: String,
    pub client_secret: String,
    #[serde(default)]
    pub scope: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadConfig {
    #[serde(default = "UploadConfig::default_chunk_size")]
    pub chunk_size: u64,
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,
    /// Seconds a created resource may stay pending before the upload gives up.
    #[serde(default = "UploadConfig::default_poll_timeout_secs")]
    pub poll_timeout_secs: u64,
}

impl UploadConfig {
    fn default_chunk_size() -> u64 {
        DEFAULT_CHUNK_SIZE
    }

    fn default_poll_timeout_secs() -> u64 {
        600
    }
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            chunk_size: Self::default_chunk_size(),
            max_concurrency: default_max_concurrency(),
            poll_timeout_secs: Self::default_poll_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    DataOcean,
    FileService,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub kind: ProviderKind,
    pub base_url: String,
    /// Space cached by the file service provider.
    #[serde(default)]
    pub space_id: Option<String>,
}

/// The one upload a run performs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobConfig {
    pub file: PathBuf,
    /// Creation payload as json text, in the shape the provider expects. Kept as text since
    /// configuration keys are case folded.
    pub payload: String,
    #[serde(default)]
    pub query: QueryParams,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CommonConfig {
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

/// `config.yaml` from the working directory, then any yaml file given as argument, then
/// `UPLOADER__` prefixed environment variables, e.g. `UPLOADER__AUTH__CLIENT_SECRET`.
pub fn build_config() -> anyhow::Result<AppConfig> {
    let mut config = config::Config::builder().add_source(
        config::File::with_name("config")
            .required(false)
            .format(config::FileFormat::Yaml),
    );
    for arg in std::env::args().skip(1) {
        if arg.ends_with("yaml") || arg.ends_with("yml") {
            config = config.add_source(
                config::File::from(std::path::Path::new(arg.as_str()))
                    .format(config::FileFormat::Yaml)
                    .required(true),
            );
        }
    }
    config = config.add_source(
        config::Environment::with_prefix("UPLOADER")
            .separator("__")
            .try_parsing(true),
    );
    Ok(config.build()?.try_deserialize()?)
}
