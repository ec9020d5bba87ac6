use relayforge_av::DEFAULT_ALLOWED_OPTIONS;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub tools: ToolsConfig,

    #[serde(default)]
    pub remote: RemoteConfig,

    #[serde(default)]
    pub paths: PathsConfig,

    #[serde(default)]
    pub pipeline: PipelineConfig,

    #[serde(default)]
    pub conversion: ConversionConfig,
}

/// Executable overrides. Unset tools are looked up on `PATH`.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ToolsConfig {
    #[serde(default)]
    pub ffmpeg_path: Option<PathBuf>,

    #[serde(default)]
    pub rsync_path: Option<PathBuf>,

    #[serde(default)]
    pub ssh_path: Option<PathBuf>,
}

/// The storage host sources are pulled from and results pushed back to.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RemoteConfig {
    /// Login user on the storage host
    #[serde(default)]
    pub user: String,

    /// Storage host name or address
    #[serde(default)]
    pub host: String,

    /// Directory on the storage host that receives source backups
    #[serde(default)]
    pub archive_dir: String,

    /// Private key used for rsync and ssh (optional)
    #[serde(default)]
    pub ssh_key_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PathsConfig {
    /// SQLite job ledger
    #[serde(default = "default_database")]
    pub database: PathBuf,

    /// Root for pulled source copies
    #[serde(default = "default_temp_dir")]
    pub temp_dir: PathBuf,

    /// Root for transcoder output
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

fn default_database() -> PathBuf {
    PathBuf::from("./relayforge.db")
}

fn default_temp_dir() -> PathBuf {
    PathBuf::from("/tmp/relayforge/temp")
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("/tmp/relayforge/output")
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            database: default_database(),
            temp_dir: default_temp_dir(),
            output_dir: default_output_dir(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PipelineConfig {
    /// Keep local working files after a successful run (test/debug)
    #[serde(default)]
    pub skip_cleanup: bool,

    /// Extension of the transcoded artifact, without the dot
    #[serde(default = "default_output_extension")]
    pub output_extension: String,

    /// Queue worker threads
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Seconds an idle worker waits before polling the ledger again
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,
}

fn default_output_extension() -> String {
    "mp4".to_string()
}

fn default_workers() -> usize {
    1
}

fn default_poll_interval() -> u64 {
    5
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            skip_cleanup: false,
            output_extension: default_output_extension(),
            workers: default_workers(),
            poll_interval_secs: default_poll_interval(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ConversionConfig {
    /// Reject conversion specs containing options outside `allowed_options`
    #[serde(default = "default_validate_spec")]
    pub validate_spec: bool,

    /// Transcoder options a conversion spec may use
    #[serde(default = "default_allowed_options")]
    pub allowed_options: Vec<String>,
}

fn default_validate_spec() -> bool {
    true
}

fn default_allowed_options() -> Vec<String> {
    DEFAULT_ALLOWED_OPTIONS.iter().map(|s| s.to_string()).collect()
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            validate_spec: default_validate_spec(),
            allowed_options: default_allowed_options(),
        }
    }
}
