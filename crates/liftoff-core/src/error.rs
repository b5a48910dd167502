//! Error taxonomy for a launch.
//!
//! Operations return `anyhow::Result`; the variants below travel inside
//! `anyhow::Error` and are recovered with `downcast_ref` where the kind of
//! failure matters (exit codes, cancellation).

use std::path::PathBuf;
use std::process::ExitStatus;

use crate::version::Version;

#[derive(Debug, thiserror::Error)]
pub enum LaunchError {
    /// Malformed or incomplete descriptor.
    #[error("Invalid descriptor: {0}")]
    Validation(String),

    /// Descriptor schema newer than this client understands.
    #[error(
        "Unsupported descriptor version ({found}). Please consider updating liftoff - your current version is {client}"
    )]
    UnsupportedDescriptorVersion { found: Version, client: &'static str },

    #[error("Failed to retrieve {url}: {reason}")]
    Network { url: String, reason: String },

    #[error("The current OS ({0}) is not supported")]
    RequirementsNotMet(String),

    #[error("Another instance is already running for this app (lock held on {})", path.display())]
    LockConflict { path: PathBuf },

    #[error("The descriptors have different {field} values: '{left}' vs '{right}'")]
    DescriptorMismatch {
        field: &'static str,
        left: String,
        right: String,
    },

    /// The release tag reported by the distribution point disagrees with
    /// the downloaded descriptor.
    #[error("The latest release is tagged as version {tag}, but its descriptor declares {descriptor}")]
    ReleaseVersionMismatch { tag: Version, descriptor: Version },

    #[error("Cannot run the application: it is not installed and cannot be downloaded")]
    NotInstalled,

    #[error("Empty command line found")]
    EmptyCommandLine,

    #[error("The application terminated with {0}")]
    AppFailed(ExitStatus),

    /// The user declined to proceed or closed the user interface.
    #[error("Execution canceled")]
    ExecutionCanceled,
}

impl LaunchError {
    /// True if `err` carries [`LaunchError::ExecutionCanceled`].
    pub fn is_canceled(err: &anyhow::Error) -> bool {
        matches!(
            err.downcast_ref::<LaunchError>(),
            Some(LaunchError::ExecutionCanceled)
        )
    }
}
