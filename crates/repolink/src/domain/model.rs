//! Domain models for editor context, line ranges, and produced links.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::Serialize;

use crate::domain::errors::RepolinkError;

/// Hosting providers a link can be built for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    GitHub,
    Bitbucket,
}

impl Provider {
    /// Canonical browsing host, scheme included.
    pub fn host(&self) -> &'static str {
        match self {
            Provider::GitHub => "https://github.com",
            Provider::Bitbucket => "https://bitbucket.org",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::GitHub => "github",
            Provider::Bitbucket => "bitbucket",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Inclusive, 1-based line range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LineRange {
    start: usize,
    end: usize,
}

impl LineRange {
    pub fn new(start: usize, end: usize) -> Result<Self, RepolinkError> {
        if start == 0 {
            return Err(RepolinkError::InvalidLineRange {
                input: format!("{start}:{end}"),
                reason: "line numbers start at 1",
            });
        }
        if end < start {
            return Err(RepolinkError::InvalidLineRange {
                input: format!("{start}:{end}"),
                reason: "end line precedes start line",
            });
        }
        Ok(Self { start, end })
    }

    /// Range covering a single line.
    pub fn single(line: usize) -> Result<Self, RepolinkError> {
        Self::new(line, line)
    }

    /// Derive the range touched by a byte region of `contents`.
    ///
    /// `end` is exclusive, so a region that stops right after a newline ends on the line holding
    /// that newline rather than the one after it. Offsets past the end of `contents` are clamped.
    pub fn from_region(contents: &str, start: usize, end: usize) -> Self {
        let bytes = contents.as_bytes();
        let start = start.min(bytes.len());
        let end = end.min(bytes.len()).max(start);

        let start_line = line_at(bytes, start);
        let end_line = if end > start {
            line_at(bytes, end - 1)
        } else {
            start_line
        };

        Self {
            start: start_line,
            end: end_line,
        }
    }

    pub fn start(&self) -> usize {
        self.start
    }

    pub fn end(&self) -> usize {
        self.end
    }
}

fn line_at(bytes: &[u8], offset: usize) -> usize {
    bytes[..offset].iter().filter(|byte| **byte == b'\n').count() + 1
}

impl FromStr for LineRange {
    type Err = RepolinkError;

    /// Accepts `N`, `N:M`, or `N-M`.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let invalid = |reason| RepolinkError::InvalidLineRange {
            input: value.to_owned(),
            reason,
        };
        let parse = |part: &str| {
            part.trim()
                .parse::<usize>()
                .map_err(|_| invalid("expected a line number"))
        };

        match value.split_once([':', '-']) {
            Some((start, end)) => Self::new(parse(start)?, parse(end)?),
            None => Self::single(parse(value)?),
        }
    }
}

impl fmt::Display for LineRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.start, self.end)
    }
}

/// The slice of editor state a link is built from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditorContext {
    pub current_file_path: PathBuf,
    pub active_selection: Option<LineRange>,
}

impl EditorContext {
    pub fn new(current_file_path: impl Into<PathBuf>) -> Self {
        Self {
            current_file_path: current_file_path.into(),
            active_selection: None,
        }
    }

    pub fn with_selection(mut self, selection: Option<LineRange>) -> Self {
        self.active_selection = selection;
        self
    }
}

/// File location relative to the repository that contains it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoPath {
    pub root: PathBuf,
    /// Forward-slash separated path below `root`.
    pub relative: String,
}

/// A finished link together with the inputs it was built from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RepoLink {
    pub url: String,
    pub provider: Provider,
    pub remote: String,
    pub branch: String,
    pub path: String,
    pub lines: Option<LineRange>,
}
