//! Git integration utilities.
//!
//! Everything the link builder needs from a repository goes through [`RepositoryInspector`], so
//! the text scraping of `git` output stays out of the URL logic.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use std::str::FromStr;

use anyhow::{Context, Result, anyhow};
use clap::ValueEnum;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::domain::errors::RepolinkError;

static REMOTE_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<name>\S+)\s+(?P<url>\S+)").expect("remote listing pattern")
});

/// Read-only view of the repository metadata a link is built from.
pub trait RepositoryInspector {
    /// URL configured for the remote `name`, or `None` when no such remote exists.
    fn remote_url(&self, name: &str) -> Result<Option<String>>;

    /// Name of the checked-out branch.
    fn current_branch(&self) -> Result<String>;
}

/// Which [`RepositoryInspector`] implementation to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum, Default)]
#[serde(rename_all = "kebab-case")]
#[value(rename_all = "kebab-case")]
pub enum Backend {
    /// Shell out to the `git` executable.
    #[default]
    Git,
    /// Read the repository in-process with gix.
    Gix,
}

impl Backend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Backend::Git => "git",
            Backend::Gix => "gix",
        }
    }

    /// Open an inspector of this kind for the repository rooted at `root`.
    pub fn open(&self, root: &Path) -> Result<Box<dyn RepositoryInspector>> {
        Ok(match self {
            Backend::Git => Box::new(GitCliInspector::new(root)),
            Backend::Gix => Box::new(GixInspector::discover(root)?),
        })
    }
}

impl FromStr for Backend {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "git" | "cli" => Ok(Backend::Git),
            "gix" => Ok(Backend::Gix),
            other => Err(anyhow!("unknown git backend '{other}'")),
        }
    }
}

/// Inspector backed by the `git` command line tool.
#[derive(Debug, Clone)]
pub struct GitCliInspector {
    root: PathBuf,
}

impl GitCliInspector {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn git(&self, args: &[&str]) -> Result<String> {
        let (command, output) = self.spawn(args)?;
        into_stdout(command, output)
    }

    fn spawn(&self, args: &[&str]) -> Result<(String, Output)> {
        let command = format!("git {}", args.join(" "));
        tracing::debug!(%command, cwd = %self.root.display(), "running git");

        let output = Command::new("git")
            .args(args)
            .current_dir(&self.root)
            .env("GIT_TERMINAL_PROMPT", "0")
            .output()
            .with_context(|| format!("failed to spawn `{command}`"))?;
        Ok((command, output))
    }
}

fn into_stdout(command: String, output: Output) -> Result<String> {
    if !output.status.success() {
        return Err(RepolinkError::GitCommand {
            command,
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_owned(),
        }
        .into());
    }

    String::from_utf8(output.stdout).with_context(|| format!("`{command}` printed non UTF-8"))
}

impl RepositoryInspector for GitCliInspector {
    fn remote_url(&self, name: &str) -> Result<Option<String>> {
        let listing = self.git(&["remote", "-v"])?;
        Ok(parse_remote_listing(&listing, name))
    }

    /// Reads HEAD's symbolic ref, which also names an unborn branch in a repository without
    /// commits. `-q` makes a detached HEAD exit with status 1 and no output.
    fn current_branch(&self) -> Result<String> {
        let (command, output) = self.spawn(&["symbolic-ref", "--short", "-q", "HEAD"])?;
        if output.status.code() == Some(1) && output.stdout.is_empty() {
            return Err(RepolinkError::DetachedHead.into());
        }
        parse_current_branch(&into_stdout(command, output)?)
    }
}

/// Find the URL of `name` in `git remote -v` output.
///
/// Lines look like `origin\tgit@github.com:owner/repo.git (fetch)`; the trailing direction is
/// dropped and the first matching line wins.
pub fn parse_remote_listing(listing: &str, name: &str) -> Option<String> {
    listing
        .lines()
        .filter_map(|line| REMOTE_LINE.captures(line))
        .find(|captures| &captures["name"] == name)
        .map(|captures| captures["url"].to_owned())
}

fn parse_current_branch(output: &str) -> Result<String> {
    match output.trim() {
        "" | "HEAD" => Err(RepolinkError::DetachedHead.into()),
        branch => Ok(branch.to_owned()),
    }
}

/// Inspector reading the repository through [`gix`] without spawning processes.
pub struct GixInspector {
    repo: gix::Repository,
}

impl GixInspector {
    /// Locate the repository containing `path`.
    pub fn discover(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let repo = gix::discover(path).map_err(|_| RepolinkError::NotARepository {
            path: path.to_path_buf(),
        })?;
        Ok(Self { repo })
    }
}

impl RepositoryInspector for GixInspector {
    fn remote_url(&self, name: &str) -> Result<Option<String>> {
        let Some(remote) = self.repo.try_find_remote(name) else {
            return Ok(None);
        };
        let remote = remote.with_context(|| format!("failed to read remote '{name}'"))?;
        Ok(remote
            .url(gix::remote::Direction::Fetch)
            .map(|url| url.to_bstring().to_string()))
    }

    fn current_branch(&self) -> Result<String> {
        let head = self
            .repo
            .head_name()
            .context("failed to read HEAD")?
            .ok_or(RepolinkError::DetachedHead)?;
        Ok(head.shorten().to_string())
    }
}

/// Fixed answers, for callers that already know the repository state.
#[derive(Debug, Clone, Default)]
pub struct StaticInspector {
    pub remotes: Vec<(String, String)>,
    pub branch: Option<String>,
}

impl StaticInspector {
    pub fn new(branch: impl Into<String>) -> Self {
        Self {
            remotes: Vec::new(),
            branch: Some(branch.into()),
        }
    }

    pub fn with_remote(mut self, name: impl Into<String>, url: impl Into<String>) -> Self {
        self.remotes.push((name.into(), url.into()));
        self
    }
}

impl RepositoryInspector for StaticInspector {
    fn remote_url(&self, name: &str) -> Result<Option<String>> {
        Ok(self
            .remotes
            .iter()
            .find(|(remote, _)| remote == name)
            .map(|(_, url)| url.clone()))
    }

    fn current_branch(&self) -> Result<String> {
        self.branch
            .clone()
            .ok_or_else(|| RepolinkError::DetachedHead.into())
    }
}
