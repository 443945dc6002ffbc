//! Domain-specific errors.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RepolinkError {
    #[error("not a git repository (no .git found above {})", path.display())]
    NotARepository { path: PathBuf },
    #[error("remote '{name}' is not configured")]
    NoMatchingRemote { name: String },
    #[error("unsupported hosting provider for remote '{url}' (expected GitHub or Bitbucket)")]
    UnsupportedProvider { url: String },
    #[error("cannot derive a repository URL from remote '{url}'")]
    MalformedRemoteUrl { url: String },
    #[error("HEAD is detached; no current branch to link to")]
    DetachedHead,
    #[error("invalid line range '{input}': {reason}")]
    InvalidLineRange { input: String, reason: &'static str },
    #[error("`{command}` failed: {stderr}")]
    GitCommand { command: String, stderr: String },
}
