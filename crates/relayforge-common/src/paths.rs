//! Path resolution for a job's local working files and remote locators.
//!
//! Everything here is pure string and path arithmetic; nothing touches the
//! filesystem. Local working paths are keyed by job id so that two jobs whose
//! remote sources share a base name never share a local file.

use std::path::{Path, PathBuf};

use crate::{Error, JobId, Result};

/// Remote storage host that sources are pulled from and results pushed to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteTarget {
    /// Login user on the storage host.
    pub user: String,
    /// Storage host name or address.
    pub host: String,
    /// Archive directory on the storage host receiving source backups.
    pub archive_dir: String,
}

impl RemoteTarget {
    /// Create a new remote target.
    pub fn new(
        user: impl Into<String>,
        host: impl Into<String>,
        archive_dir: impl Into<String>,
    ) -> Self {
        Self {
            user: user.into(),
            host: host.into(),
            archive_dir: archive_dir.into(),
        }
    }

    /// The `user@host` identity.
    #[must_use]
    pub fn identity(&self) -> String {
        format!("{}@{}", self.user, self.host)
    }

    /// A `user@host:path` locator for `path` on this host.
    #[must_use]
    pub fn locator(&self, path: &str) -> String {
        format!("{}:{}", self.identity(), path)
    }
}

/// Root directories for local working files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalLayout {
    /// Root for pulled source copies.
    pub temp_dir: PathBuf,
    /// Root for transcoder output.
    pub output_dir: PathBuf,
}

impl LocalLayout {
    /// Create a new layout from the two roots.
    pub fn new(temp_dir: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            temp_dir: temp_dir.into(),
            output_dir: output_dir.into(),
        }
    }

    /// Per-job directory receiving the pulled source.
    #[must_use]
    pub fn job_temp_dir(&self, job_id: JobId) -> PathBuf {
        self.temp_dir.join(job_id.to_string())
    }

    /// Per-job directory receiving transcoder output.
    #[must_use]
    pub fn job_output_dir(&self, job_id: JobId) -> PathBuf {
        self.output_dir.join(job_id.to_string())
    }

    /// The job-id-prefixed output path chosen when a job is created.
    ///
    /// `/remote/media/clip.mkv` with extension `mp4` becomes
    /// `<output_dir>/<id>/<id>_clip.mp4`.
    pub fn output_path_for(&self, job_id: JobId, source_path: &str, extension: &str) -> Result<PathBuf> {
        let stem = source_stem(source_path)?;
        let file_name = format!("{}_{}.{}", job_id, stem, extension);
        Ok(self.job_output_dir(job_id).join(file_name))
    }
}

/// Final path component of a remote source path.
pub fn source_file_name(source_path: &str) -> Result<&str> {
    Path::new(source_path)
        .file_name()
        .and_then(|name| name.to_str())
        .filter(|name| !name.is_empty())
        .ok_or_else(|| Error::invalid_input(format!("Source path has no file name: {:?}", source_path)))
}

/// Source file name with its extension removed.
pub fn source_stem(source_path: &str) -> Result<&str> {
    Path::new(source_file_name(source_path)?)
        .file_stem()
        .and_then(|stem| stem.to_str())
        .ok_or_else(|| Error::invalid_input(format!("Source path has no file stem: {:?}", source_path)))
}

/// Directory part of a remote source path.
///
/// A bare relative name such as `clip.mkv` lives in the remote login
/// directory, so its directory is empty and the locator becomes `user@host:`.
#[must_use]
pub fn source_dir(source_path: &str) -> String {
    Path::new(source_path)
        .parent()
        .map(|parent| parent.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Strip a leading `"<job_id>_"` from `file_name`.
///
/// A name without that prefix is treated as already clean and returned
/// unchanged.
#[must_use]
pub fn strip_job_prefix<'a>(job_id: &str, file_name: &'a str) -> &'a str {
    file_name
        .strip_prefix(job_id)
        .and_then(|rest| rest.strip_prefix('_'))
        .unwrap_or(file_name)
}

/// Every path and locator one pipeline run needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobPaths {
    /// Per-job temp directory; the transfer-in destination.
    pub temp_dir: PathBuf,
    /// Local copy of the remote source; the transcoder input.
    pub temp_file: PathBuf,
    /// Per-job output directory.
    pub output_dir: PathBuf,
    /// Job-id-prefixed transcoder output.
    pub prefixed_output: PathBuf,
    /// Output after the prefix is stripped; the transfer-out source.
    pub clean_output: PathBuf,
    /// `user@host:<source>`; the transfer-in source.
    pub pull_source: String,
    /// `user@host:<source dir>`; the transfer-out destination.
    pub push_destination: String,
}

impl JobPaths {
    /// Resolve the paths for a job from its ledger row fields.
    ///
    /// `output_path` is the prefixed path recorded at job creation.
    pub fn resolve(
        job_id: JobId,
        source_path: &str,
        output_path: &Path,
        layout: &LocalLayout,
        remote: &RemoteTarget,
    ) -> Result<Self> {
        let temp_dir = layout.job_temp_dir(job_id);
        let temp_file = temp_dir.join(source_file_name(source_path)?);

        let output_name = output_path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| Error::invalid_input(format!("Output path has no file name: {:?}", output_path)))?;
        let output_dir = output_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| layout.job_output_dir(job_id));
        let clean_output = output_dir.join(strip_job_prefix(&job_id.to_string(), output_name));

        Ok(Self {
            temp_dir,
            temp_file,
            prefixed_output: output_path.to_path_buf(),
            clean_output,
            output_dir,
            pull_source: remote.locator(source_path),
            push_destination: remote.locator(&source_dir(source_path)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn remote() -> RemoteTarget {
        RemoteTarget::new("media", "nas.local", "/archive")
    }

    #[test]
    fn test_strip_job_prefix() {
        assert_eq!(strip_job_prefix("abc123", "abc123_movie.mp4"), "movie.mp4");
        assert_eq!(strip_job_prefix("abc123", "movie.mp4"), "movie.mp4");
        // Prefix without the separator is not a match.
        assert_eq!(strip_job_prefix("abc123", "abc123movie.mp4"), "abc123movie.mp4");
        assert_eq!(strip_job_prefix("abc123", "xyz_abc123_movie.mp4"), "xyz_abc123_movie.mp4");
    }

    #[test]
    fn test_locators() {
        let r = remote();
        assert_eq!(r.identity(), "media@nas.local");
        assert_eq!(r.locator("/remote/media/clip.mkv"), "media@nas.local:/remote/media/clip.mkv");
    }

    #[test]
    fn test_source_name_parts() {
        assert_eq!(source_file_name("/remote/media/clip.mkv").unwrap(), "clip.mkv");
        assert_eq!(source_stem("/remote/media/clip.mkv").unwrap(), "clip");
        assert_eq!(source_stem("/remote/media/archive.tar.gz").unwrap(), "archive.tar");
        assert_eq!(source_dir("/remote/media/clip.mkv"), "/remote/media");
        assert_eq!(source_dir("/clip.mkv"), "/");
        assert_eq!(source_dir("media/clip.mkv"), "media");
        assert_eq!(source_dir("clip.mkv"), "");
        assert!(source_file_name("/").is_err());
        assert!(source_file_name("").is_err());
    }

    #[test]
    fn test_output_path_for_embeds_job_id() {
        let layout = LocalLayout::new("/work/temp", "/work/output");
        let id = JobId::new();
        let path = layout.output_path_for(id, "/remote/media/clip.mkv", "mp4").unwrap();
        assert_eq!(
            path,
            PathBuf::from(format!("/work/output/{id}/{id}_clip.mp4"))
        );
    }

    #[test]
    fn test_resolve_job_paths() {
        let layout = LocalLayout::new("/work/temp", "/work/output");
        let id = JobId::new();
        let output = layout.output_path_for(id, "/remote/media/clip.mkv", "mp4").unwrap();
        let paths = JobPaths::resolve(id, "/remote/media/clip.mkv", &output, &layout, &remote()).unwrap();

        assert_eq!(paths.temp_dir, PathBuf::from(format!("/work/temp/{id}")));
        assert_eq!(paths.temp_file, PathBuf::from(format!("/work/temp/{id}/clip.mkv")));
        assert_eq!(paths.prefixed_output, output);
        assert_eq!(paths.clean_output, PathBuf::from(format!("/work/output/{id}/clip.mp4")));
        assert_eq!(paths.pull_source, "media@nas.local:/remote/media/clip.mkv");
        assert_eq!(paths.push_destination, "media@nas.local:/remote/media");
    }

    #[test]
    fn test_relative_source_returns_to_login_dir() {
        let layout = LocalLayout::new("/work/temp", "/work/output");
        let id = JobId::new();
        let output = layout.output_path_for(id, "clip.mkv", "mp4").unwrap();
        let paths = JobPaths::resolve(id, "clip.mkv", &output, &layout, &remote()).unwrap();

        assert_eq!(paths.pull_source, "media@nas.local:clip.mkv");
        assert_eq!(paths.push_destination, "media@nas.local:");
        assert_eq!(paths.temp_file, PathBuf::from(format!("/work/temp/{id}/clip.mkv")));
    }

    #[test]
    fn test_same_basename_jobs_do_not_collide() {
        let layout = LocalLayout::new("/work/temp", "/work/output");
        let (a, b) = (JobId::new(), JobId::new());
        let out_a = layout.output_path_for(a, "/show/s1/episode.mkv", "mp4").unwrap();
        let out_b = layout.output_path_for(b, "/show/s2/episode.mkv", "mp4").unwrap();
        let pa = JobPaths::resolve(a, "/show/s1/episode.mkv", &out_a, &layout, &remote()).unwrap();
        let pb = JobPaths::resolve(b, "/show/s2/episode.mkv", &out_b, &layout, &remote()).unwrap();

        assert_ne!(pa.temp_file, pb.temp_file);
        assert_ne!(pa.clean_output, pb.clean_output);
    }
}
