//! The link command: resolve the editor's file, inspect its repository, build and deliver a URL.

use anyhow::{Context, Result};

use crate::app::link::{compose_link, normalize_remote};
use crate::domain::errors::RepolinkError;
use crate::domain::model::{EditorContext, RepoLink, RepoPath};
use crate::infra::clipboard::LinkSink;
use crate::infra::config::Config;
use crate::infra::fs;
use crate::infra::git::{Backend, RepositoryInspector};

/// Runtime options for a single invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkOptions {
    pub remote: String,
    /// Link to this branch instead of the checked-out one.
    pub branch: Option<String>,
    pub backend: Backend,
    pub copy_to_clipboard: bool,
}

impl LinkOptions {
    /// Build options from configuration defaults.
    pub fn from_config(config: &Config) -> Self {
        Self {
            remote: config.defaults.remote().to_owned(),
            branch: None,
            backend: config.defaults.backend(),
            copy_to_clipboard: config.defaults.copy_to_clipboard(),
        }
    }
}

impl Default for LinkOptions {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// Resolve the editor context, build its link with the configured backend, and deliver it.
pub fn run(
    context: &EditorContext,
    options: &LinkOptions,
    sink: &mut dyn LinkSink,
) -> Result<RepoLink> {
    let repo_path = fs::relative_path(&context.current_file_path)?;
    let inspector = options
        .backend
        .open(&repo_path.root)
        .with_context(|| format!("failed to open {} backend", options.backend.as_str()))?;

    let link = link_for(context, &repo_path, inspector.as_ref(), options)?;

    if options.copy_to_clipboard {
        sink.deliver(&link.url)?;
        tracing::info!(url = %link.url, "link copied");
    }
    Ok(link)
}

/// Build the link for an already resolved file.
pub fn link_for(
    context: &EditorContext,
    repo_path: &RepoPath,
    inspector: &dyn RepositoryInspector,
    options: &LinkOptions,
) -> Result<RepoLink> {
    let remote_url = inspector
        .remote_url(&options.remote)?
        .ok_or_else(|| RepolinkError::NoMatchingRemote {
            name: options.remote.clone(),
        })?;
    tracing::debug!(remote = %options.remote, url = %remote_url, "found remote");

    let branch = match &options.branch {
        Some(branch) => branch.clone(),
        None => inspector.current_branch()?,
    };
    tracing::debug!(%branch, "using branch");

    let remote = normalize_remote(&remote_url)?;
    let provider = remote.provider;
    let url = compose_link(&remote, &branch, &repo_path.relative, context.active_selection);
    tracing::info!(%provider, %url, "built link");

    Ok(RepoLink {
        url,
        provider,
        remote: options.remote.clone(),
        branch,
        path: repo_path.relative.clone(),
        lines: context.active_selection,
    })
}
