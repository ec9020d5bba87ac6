pub mod executor;
pub mod orchestrator;

pub use executor::{StageExecutor, StageOutcome};
pub use orchestrator::{PipelineOrchestrator, PipelineOutcome};

use crate::config::Config;
use relayforge_av::{resolve_tool, RemoteCopyTool, SpecPolicy, TranscodeTool, TransferTool};
use relayforge_common::paths::{LocalLayout, RemoteTarget};

/// Everything a pipeline run needs besides the ledger and the runner.
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub remote: RemoteTarget,
    pub layout: LocalLayout,
    pub transfer: TransferTool,
    pub remote_copy: RemoteCopyTool,
    pub transcode: TranscodeTool,
    /// Keep local working files after a successful run
    pub skip_cleanup: bool,
    /// Extension of the transcoded artifact, without the dot
    pub output_extension: String,
    /// `None` accepts any conversion spec
    pub spec_policy: Option<SpecPolicy>,
}

impl PipelineSettings {
    /// Build settings from config, resolving tool paths.
    pub fn from_config(config: &Config) -> Self {
        let rsync = resolve_tool("rsync", config.tools.rsync_path.as_deref());
        let ssh = resolve_tool("ssh", config.tools.ssh_path.as_deref());
        let ffmpeg = resolve_tool("ffmpeg", config.tools.ffmpeg_path.as_deref());
        let key = config.remote.ssh_key_path.clone();

        Self {
            remote: RemoteTarget::new(
                &config.remote.user,
                &config.remote.host,
                &config.remote.archive_dir,
            ),
            layout: LocalLayout::new(&config.paths.temp_dir, &config.paths.output_dir),
            transfer: TransferTool::new(rsync, &ssh, key.clone()),
            remote_copy: RemoteCopyTool::new(ssh, key),
            transcode: TranscodeTool::new(ffmpeg),
            skip_cleanup: config.pipeline.skip_cleanup,
            output_extension: config.pipeline.output_extension.clone(),
            spec_policy: config
                .conversion
                .validate_spec
                .then(|| SpecPolicy::new(config.conversion.allowed_options.iter().cloned())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_settings_from_config() {
        let mut config = Config::default();
        config.remote.user = "media".into();
        config.remote.host = "nas.local".into();
        config.remote.archive_dir = "/archive".into();
        config.tools.ffmpeg_path = Some(PathBuf::from("/no/such/ffmpeg"));
        config.pipeline.skip_cleanup = true;

        let settings = PipelineSettings::from_config(&config);
        assert_eq!(settings.remote.identity(), "media@nas.local");
        assert_eq!(settings.layout.output_dir, PathBuf::from("/tmp/relayforge/output"));
        assert!(settings.skip_cleanup);
        assert!(settings.spec_policy.is_some());

        config.conversion.validate_spec = false;
        assert!(PipelineSettings::from_config(&config).spec_policy.is_none());
    }
}
