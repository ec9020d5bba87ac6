mod types;

pub use types::*;

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Environment variables that override file values.
pub const ENV_REMOTE_USER: &str = "RELAYFORGE_REMOTE_USER";
pub const ENV_REMOTE_HOST: &str = "RELAYFORGE_REMOTE_HOST";
pub const ENV_SSH_KEY: &str = "RELAYFORGE_SSH_KEY";
pub const ENV_DATABASE: &str = "RELAYFORGE_DATABASE";

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<Config> {
    let mut config = read_config_file(path)?;
    apply_env_overrides(&mut config);
    validate_config(&config)?;
    Ok(config)
}

/// Load config from default locations or return default config
///
/// The default config is returned unvalidated so commands that only read the
/// ledger work without a remote host; pipeline commands call
/// [`validate_config`] themselves.
pub fn load_config_or_default(custom_path: Option<&Path>) -> Result<Config> {
    if let Some(path) = custom_path {
        return load_config(path);
    }

    let default_paths = [
        "./relayforge.toml",
        "~/.config/relayforge/config.toml",
        "/etc/relayforge/config.toml",
    ];

    for path_str in default_paths {
        let path = shellexpand::tilde(path_str);
        let path = Path::new(path.as_ref());
        if path.exists() {
            return load_config(path);
        }
    }

    let mut config = Config::default();
    apply_env_overrides(&mut config);
    Ok(config)
}

fn read_config_file(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let mut config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    expand_paths(&mut config);
    Ok(config)
}

fn expand_path(path: &Path) -> PathBuf {
    PathBuf::from(shellexpand::tilde(&path.to_string_lossy()).as_ref())
}

fn expand_paths(config: &mut Config) {
    config.paths.database = expand_path(&config.paths.database);
    config.paths.temp_dir = expand_path(&config.paths.temp_dir);
    config.paths.output_dir = expand_path(&config.paths.output_dir);
    config.remote.ssh_key_path = config.remote.ssh_key_path.as_deref().map(expand_path);
    for tool in [
        &mut config.tools.ffmpeg_path,
        &mut config.tools.rsync_path,
        &mut config.tools.ssh_path,
    ] {
        *tool = tool.as_deref().map(expand_path);
    }
}

/// Apply `RELAYFORGE_*` overrides from the process environment.
pub fn apply_env_overrides(config: &mut Config) {
    apply_overrides_from(config, |key| std::env::var(key).ok());
}

/// Apply overrides using `lookup` as the environment.
pub fn apply_overrides_from(config: &mut Config, lookup: impl Fn(&str) -> Option<String>) {
    let lookup = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(user) = lookup(ENV_REMOTE_USER) {
        config.remote.user = user;
    }
    if let Some(host) = lookup(ENV_REMOTE_HOST) {
        config.remote.host = host;
    }
    if let Some(key) = lookup(ENV_SSH_KEY) {
        config.remote.ssh_key_path = Some(expand_path(Path::new(&key)));
    }
    if let Some(db) = lookup(ENV_DATABASE) {
        config.paths.database = expand_path(Path::new(&db));
    }
}

/// Validate configuration
pub fn validate_config(config: &Config) -> Result<()> {
    if config.remote.user.trim().is_empty() {
        anyhow::bail!("remote.user is not set (or set {})", ENV_REMOTE_USER);
    }
    if config.remote.host.trim().is_empty() {
        anyhow::bail!("remote.host is not set (or set {})", ENV_REMOTE_HOST);
    }
    if config.remote.archive_dir.trim().is_empty() {
        anyhow::bail!("remote.archive_dir is not set");
    }

    if let Some(ref key) = config.remote.ssh_key_path {
        if !key.exists() {
            tracing::warn!("SSH key does not exist: {:?}", key);
        }
    }

    if config.pipeline.workers == 0 {
        anyhow::bail!("pipeline.workers must be at least 1");
    }

    let ext = &config.pipeline.output_extension;
    if ext.is_empty() || ext.contains(['.', '/', '\\']) {
        anyhow::bail!(
            "pipeline.output_extension must be a bare extension like \"mp4\", got {:?}",
            ext
        );
    }

    if config.conversion.validate_spec && config.conversion.allowed_options.is_empty() {
        tracing::warn!("conversion.allowed_options is empty; every non-empty spec will be rejected");
    }

    Ok(())
}
