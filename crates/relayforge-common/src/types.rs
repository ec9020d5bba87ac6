//! Job lifecycle types.
//!
//! A job moves through four ordered [`Stage`]s. Each stage contributes three
//! [`JobStatus`] values: the working state, its `_COMPLETE` variant and its
//! terminal `_FAILED` variant. Statuses are stored and displayed in
//! SCREAMING_SNAKE_CASE, the form external pollers read from the ledger.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One of the four externally-executed operations of a job pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Pull the remote source file into the local temp directory.
    TransferIn,
    /// Copy the remote source into the archive directory on the same host.
    BackupSource,
    /// Run the transcoder on the local temp copy.
    Processing,
    /// Push the transcoded artifact back next to the remote source.
    TransferOut,
}

impl Stage {
    /// All stages in pipeline order.
    pub const ALL: [Stage; 4] = [
        Stage::TransferIn,
        Stage::BackupSource,
        Stage::Processing,
        Stage::TransferOut,
    ];

    /// The status recorded while this stage is running.
    #[must_use]
    pub fn running(self) -> JobStatus {
        match self {
            Self::TransferIn => JobStatus::TransferringIn,
            Self::BackupSource => JobStatus::BackupSource,
            Self::Processing => JobStatus::Processing,
            Self::TransferOut => JobStatus::TransferringOut,
        }
    }

    /// The status recorded when this stage succeeds.
    #[must_use]
    pub fn complete(self) -> JobStatus {
        match self {
            Self::TransferIn => JobStatus::TransferringInComplete,
            Self::BackupSource => JobStatus::BackupSourceComplete,
            Self::Processing => JobStatus::ProcessingComplete,
            Self::TransferOut => JobStatus::TransferringOutComplete,
        }
    }

    /// The terminal status recorded when this stage fails.
    #[must_use]
    pub fn failed(self) -> JobStatus {
        match self {
            Self::TransferIn => JobStatus::TransferringInFailed,
            Self::BackupSource => JobStatus::BackupSourceFailed,
            Self::Processing => JobStatus::ProcessingFailed,
            Self::TransferOut => JobStatus::TransferringOutFailed,
        }
    }

    /// The stage that follows this one, if any.
    #[must_use]
    pub fn next(self) -> Option<Stage> {
        match self {
            Self::TransferIn => Some(Self::BackupSource),
            Self::BackupSource => Some(Self::Processing),
            Self::Processing => Some(Self::TransferOut),
            Self::TransferOut => None,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Stage names share the working status label.
        write!(f, "{}", self.running())
    }
}

/// Lifecycle state of a job as persisted in the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    Submitted,
    TransferringIn,
    TransferringInComplete,
    TransferringInFailed,
    BackupSource,
    BackupSourceComplete,
    BackupSourceFailed,
    Processing,
    ProcessingComplete,
    ProcessingFailed,
    TransferringOut,
    TransferringOutComplete,
    TransferringOutFailed,
    Completed,
}

impl JobStatus {
    /// Every status, in traversal order with each stage's failure variant
    /// following its completion variant.
    pub const ALL: [JobStatus; 14] = [
        JobStatus::Submitted,
        JobStatus::TransferringIn,
        JobStatus::TransferringInComplete,
        JobStatus::TransferringInFailed,
        JobStatus::BackupSource,
        JobStatus::BackupSourceComplete,
        JobStatus::BackupSourceFailed,
        JobStatus::Processing,
        JobStatus::ProcessingComplete,
        JobStatus::ProcessingFailed,
        JobStatus::TransferringOut,
        JobStatus::TransferringOutComplete,
        JobStatus::TransferringOutFailed,
        JobStatus::Completed,
    ];

    /// Wire label, e.g. `TRANSFERRING_IN_COMPLETE`.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Submitted => "SUBMITTED",
            Self::TransferringIn => "TRANSFERRING_IN",
            Self::TransferringInComplete => "TRANSFERRING_IN_COMPLETE",
            Self::TransferringInFailed => "TRANSFERRING_IN_FAILED",
            Self::BackupSource => "BACKUP_SOURCE",
            Self::BackupSourceComplete => "BACKUP_SOURCE_COMPLETE",
            Self::BackupSourceFailed => "BACKUP_SOURCE_FAILED",
            Self::Processing => "PROCESSING",
            Self::ProcessingComplete => "PROCESSING_COMPLETE",
            Self::ProcessingFailed => "PROCESSING_FAILED",
            Self::TransferringOut => "TRANSFERRING_OUT",
            Self::TransferringOutComplete => "TRANSFERRING_OUT_COMPLETE",
            Self::TransferringOutFailed => "TRANSFERRING_OUT_FAILED",
            Self::Completed => "COMPLETED",
        }
    }

    /// The stage this status belongs to. `Submitted` and `Completed` belong
    /// to no stage.
    #[must_use]
    pub fn stage(self) -> Option<Stage> {
        Stage::ALL.into_iter().find(|stage| {
            self == stage.running() || self == stage.complete() || self == stage.failed()
        })
    }

    /// Whether this is one of the four `_FAILED` variants.
    #[must_use]
    pub fn is_failed(self) -> bool {
        Stage::ALL.iter().any(|stage| stage.failed() == self)
    }

    /// Whether the orchestrator will never advance a job in this state.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        self == Self::Completed || self.is_failed()
    }

    /// Whether `next` is an edge of the lifecycle graph starting at `self`.
    ///
    /// `PROCESSING_COMPLETE -> PROCESSING_FAILED` is an edge: it records a
    /// transcode that reported success but left no artifact to rename.
    #[must_use]
    pub fn can_transition_to(self, next: JobStatus) -> bool {
        if self.is_terminal() {
            return false;
        }
        match self {
            Self::Submitted => next == Self::TransferringIn,
            Self::TransferringOutComplete => next == Self::Completed,
            Self::ProcessingComplete => {
                next == Self::TransferringOut || next == Self::ProcessingFailed
            }
            status => match status.stage() {
                Some(stage) if status == stage.running() => {
                    next == stage.complete() || next == stage.failed()
                }
                Some(stage) => stage.next().map(Stage::running) == Some(next),
                None => false,
            },
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("Invalid job status: {}", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_labels_roundtrip() {
        for status in JobStatus::ALL {
            assert_eq!(status.as_str().parse::<JobStatus>().unwrap(), status);
        }
        assert_eq!(
            "processing_failed".parse::<JobStatus>().unwrap(),
            JobStatus::ProcessingFailed
        );
        assert!("RUNNING".parse::<JobStatus>().is_err());
    }

    #[test]
    fn test_status_serde_matches_display() {
        let json = serde_json::to_string(&JobStatus::TransferringInComplete).unwrap();
        assert_eq!(json, "\"TRANSFERRING_IN_COMPLETE\"");
        let back: JobStatus = serde_json::from_str("\"BACKUP_SOURCE_FAILED\"").unwrap();
        assert_eq!(back, JobStatus::BackupSourceFailed);
    }

    #[test]
    fn test_stage_status_labels() {
        assert_eq!(Stage::TransferIn.failed().to_string(), "TRANSFERRING_IN_FAILED");
        assert_eq!(Stage::BackupSource.complete().to_string(), "BACKUP_SOURCE_COMPLETE");
        assert_eq!(Stage::Processing.running().to_string(), "PROCESSING");
        assert_eq!(Stage::TransferOut.to_string(), "TRANSFERRING_OUT");
    }

    #[test]
    fn test_terminal_states() {
        assert!(JobStatus::Completed.is_terminal());
        for stage in Stage::ALL {
            assert!(stage.failed().is_terminal());
            assert!(!stage.running().is_terminal());
            assert!(!stage.complete().is_terminal());
        }
        assert!(!JobStatus::Submitted.is_terminal());
        assert!(!JobStatus::Completed.is_failed());
    }

    #[test]
    fn test_happy_path_is_a_walk_of_the_graph() {
        let path = [
            JobStatus::Submitted,
            JobStatus::TransferringIn,
            JobStatus::TransferringInComplete,
            JobStatus::BackupSource,
            JobStatus::BackupSourceComplete,
            JobStatus::Processing,
            JobStatus::ProcessingComplete,
            JobStatus::TransferringOut,
            JobStatus::TransferringOutComplete,
            JobStatus::Completed,
        ];
        for pair in path.windows(2) {
            assert!(
                pair[0].can_transition_to(pair[1]),
                "{} -> {} should be allowed",
                pair[0],
                pair[1]
            );
        }
    }

    #[test]
    fn test_failed_states_do_not_advance() {
        for stage in Stage::ALL {
            for next in JobStatus::ALL {
                assert!(!stage.failed().can_transition_to(next));
            }
        }
        assert!(!JobStatus::Completed.can_transition_to(JobStatus::TransferringIn));
    }

    #[test]
    fn test_skipping_stages_is_rejected() {
        assert!(!JobStatus::Submitted.can_transition_to(JobStatus::Processing));
        assert!(!JobStatus::TransferringIn.can_transition_to(JobStatus::BackupSource));
        assert!(!JobStatus::BackupSourceComplete.can_transition_to(JobStatus::Completed));
        assert!(JobStatus::TransferringIn.can_transition_to(JobStatus::TransferringInFailed));
    }

    #[test]
    fn test_missing_artifact_edge() {
        assert!(JobStatus::ProcessingComplete.can_transition_to(JobStatus::ProcessingFailed));
        assert!(!JobStatus::TransferringInComplete.can_transition_to(JobStatus::TransferringInFailed));
    }

    #[test]
    fn test_status_stage_lookup() {
        assert_eq!(JobStatus::Submitted.stage(), None);
        assert_eq!(JobStatus::Completed.stage(), None);
        assert_eq!(JobStatus::BackupSourceFailed.stage(), Some(Stage::BackupSource));
        assert_eq!(Stage::TransferOut.next(), None);
    }
}
