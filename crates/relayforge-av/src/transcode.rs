//! Transcoder invocation and conversion spec checking.
//!
//! A conversion spec is the caller-supplied, whitespace-delimited parameter
//! string placed between the transcoder's input and output. The pipeline
//! supplies both files itself, so a spec may only contain options and their
//! values.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::command::ToolCommand;
use crate::{Error, Result};

/// Options accepted in a conversion spec unless configured otherwise.
pub const DEFAULT_ALLOWED_OPTIONS: &[&str] = &[
    "-c:v",
    "-c:a",
    "-c:s",
    "-codec:v",
    "-codec:a",
    "-vcodec",
    "-acodec",
    "-crf",
    "-qp",
    "-preset",
    "-tune",
    "-profile:v",
    "-level",
    "-pix_fmt",
    "-b:v",
    "-b:a",
    "-maxrate",
    "-minrate",
    "-bufsize",
    "-g",
    "-r",
    "-s",
    "-aspect",
    "-vf",
    "-af",
    "-ac",
    "-ar",
    "-map",
    "-movflags",
    "-t",
    "-ss",
    "-threads",
    "-x264-params",
    "-x265-params",
    "-y",
    "-an",
    "-vn",
    "-sn",
    "-dn",
    "-shortest",
];

/// Options that take no value.
pub const FLAG_OPTIONS: &[&str] = &["-y", "-an", "-vn", "-sn", "-dn", "-shortest"];

/// Split a conversion spec on whitespace without checking it.
pub fn spec_tokens(spec: &str) -> Vec<String> {
    spec.split_whitespace().map(String::from).collect()
}

/// Allow-list check for conversion specs.
#[derive(Debug, Clone)]
pub struct SpecPolicy {
    allowed: HashSet<String>,
}

impl Default for SpecPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_ALLOWED_OPTIONS.iter().copied())
    }
}

impl SpecPolicy {
    pub fn new(allowed: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            allowed: allowed.into_iter().map(Into::into).collect(),
        }
    }

    /// Tokenize `spec` and reject anything that is not an allowed option
    /// followed by an acceptable value.
    ///
    /// # Example
    ///
    /// ```
    /// use relayforge_av::SpecPolicy;
    ///
    /// let policy = SpecPolicy::default();
    /// let tokens = policy.validate("-c:v libx265 -crf 28").unwrap();
    /// assert_eq!(tokens, ["-c:v", "libx265", "-crf", "28"]);
    ///
    /// assert!(policy.validate("-c:v libx265 /etc/cron.d/job").is_err());
    /// ```
    pub fn validate(&self, spec: &str) -> Result<Vec<String>> {
        let tokens = spec_tokens(spec);
        let mut pending_option: Option<&str> = None;

        for token in &tokens {
            if pending_option.take().is_some() {
                check_value(token)?;
                continue;
            }

            if token.len() > 1 && token.starts_with('-') {
                if token == "-i" {
                    return Err(Error::invalid_spec(token, "inputs are supplied by the pipeline"));
                }
                if !self.allowed.contains(token.as_str()) {
                    return Err(Error::invalid_spec(token, "option is not allowed"));
                }
                if !FLAG_OPTIONS.contains(&token.as_str()) {
                    pending_option = Some(token.as_str());
                }
            } else {
                return Err(Error::invalid_spec(
                    token,
                    "unexpected positional argument; outputs are supplied by the pipeline",
                ));
            }
        }

        if let Some(option) = pending_option {
            return Err(Error::invalid_spec(option, "missing value"));
        }
        Ok(tokens)
    }
}

fn check_value(token: &str) -> Result<()> {
    if token.chars().any(char::is_control) {
        return Err(Error::invalid_spec(token, "contains control characters"));
    }
    if token.starts_with('/') {
        return Err(Error::invalid_spec(token, "absolute paths are not allowed"));
    }
    if token.contains("..") {
        return Err(Error::invalid_spec(token, "parent directory references are not allowed"));
    }
    Ok(())
}

/// Builds `<transcoder> -i <input> <spec tokens...> <output>` commands.
#[derive(Debug, Clone)]
pub struct TranscodeTool {
    ffmpeg: PathBuf,
}

impl TranscodeTool {
    pub fn new(ffmpeg: impl Into<PathBuf>) -> Self {
        Self { ffmpeg: ffmpeg.into() }
    }

    pub fn command(&self, input: &Path, spec_tokens: &[String], output: &Path) -> ToolCommand {
        let mut cmd = ToolCommand::new(&self.ffmpeg);
        cmd.arg("-i")
            .arg(input.to_string_lossy())
            .args_from(spec_tokens.iter().cloned())
            .arg(output.to_string_lossy());
        cmd
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rejects(spec: &str) -> String {
        match SpecPolicy::default().validate(spec) {
            Err(Error::InvalidConversionSpec { token, .. }) => token,
            other => panic!("expected rejection of {:?}, got {:?}", spec, other),
        }
    }

    #[test]
    fn test_transcode_command_layout() {
        let tool = TranscodeTool::new("ffmpeg");
        let tokens = spec_tokens("-c:v  libx265\t-crf 28");
        let cmd = tool.command(Path::new("/work/temp/1/clip.mkv"), &tokens, Path::new("/work/output/1/1_clip.mp4"));
        assert_eq!(
            cmd.args(),
            ["-i", "/work/temp/1/clip.mkv", "-c:v", "libx265", "-crf", "28", "/work/output/1/1_clip.mp4"]
        );
    }

    #[test]
    fn test_accepts_common_specs() {
        let policy = SpecPolicy::default();
        assert!(policy.validate("").unwrap().is_empty());
        assert!(policy.validate("-c:v libx265 -crf 28 -preset slow -c:a copy").is_ok());
        assert!(policy.validate("-vf scale=-2:720 -an -y").is_ok());
        // Values may start with a dash.
        assert!(policy.validate("-g -1").is_ok());
    }

    #[test]
    fn test_flag_options_are_allowed_by_default() {
        for flag in FLAG_OPTIONS {
            assert!(DEFAULT_ALLOWED_OPTIONS.contains(flag), "{flag} not allowed");
        }
        // A flag takes no value, so the next option is checked as an option.
        let tokens = SpecPolicy::default().validate("-c:v libx265 -shortest -crf 28").unwrap();
        assert_eq!(tokens.len(), 5);
    }

    #[test]
    fn test_rejects_extra_input() {
        assert_eq!(rejects("-i /etc/passwd"), "-i");
    }

    #[test]
    fn test_rejects_unknown_option() {
        assert_eq!(rejects("-c:v libx265 -filter_complex x"), "-filter_complex");
    }

    #[test]
    fn test_rejects_extra_output() {
        assert_eq!(rejects("-c:v libx265 stolen.mp4"), "stolen.mp4");
        assert_eq!(rejects("-y stolen.mp4"), "stolen.mp4");
    }

    #[test]
    fn test_rejects_bad_values() {
        assert_eq!(rejects("-vf /abs/filter"), "/abs/filter");
        assert_eq!(rejects("-map ../x"), "../x");
        assert_eq!(rejects("-c:v lib\u{7}x265"), "lib\u{7}x265");
    }

    #[test]
    fn test_rejects_missing_value() {
        assert_eq!(rejects("-c:v libx265 -crf"), "-crf");
    }

    #[test]
    fn test_custom_allow_list() {
        let policy = SpecPolicy::new(["-crf"]);
        assert!(policy.validate("-crf 20").is_ok());
        assert!(policy.validate("-c:v libx265").is_err());
    }
}
