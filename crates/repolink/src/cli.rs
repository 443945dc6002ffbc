//! Command line front end.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{Context, Result};
use clap::{ArgAction, CommandFactory, Parser};
use clap_complete::Shell;

use crate::app::command::{self, LinkOptions};
use crate::domain::model::{EditorContext, LineRange};
use crate::infra::clipboard::Clipboard;
use crate::infra::config::Config;
use crate::infra::fs::{canonical_path, find_repo_root};
use crate::infra::git::Backend;

#[derive(Debug, Parser)]
#[command(
    name = "repolink",
    author,
    version,
    about = "Build a GitHub or Bitbucket link to a file and copy it to the clipboard",
    long_about = None
)]
pub struct Cli {
    /// File to link to.
    #[arg(required_unless_present = "completions")]
    pub file: Option<PathBuf>,

    /// Line range to highlight, e.g. `12` or `10:20`.
    #[arg(short = 'L', long, value_name = "START[:END]", conflicts_with = "region")]
    pub lines: Option<LineRange>,

    /// Byte-offset region inside FILE; converted to the lines it touches.
    #[arg(long, value_name = "START:END")]
    pub region: Option<Region>,

    /// Remote to link against (default: origin).
    #[arg(short, long)]
    pub remote: Option<String>,

    /// Branch to link to instead of the checked-out one.
    #[arg(short, long)]
    pub branch: Option<String>,

    /// How repository metadata is read.
    #[arg(long, value_enum)]
    pub backend: Option<Backend>,

    /// Print the link without touching the clipboard.
    #[arg(long)]
    pub no_copy: bool,

    /// Print the link and its inputs as JSON.
    #[arg(long)]
    pub json: bool,

    /// Increase log verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Print shell completions and exit.
    #[arg(long, value_enum, value_name = "SHELL")]
    pub completions: Option<Shell>,
}

/// Half-open byte range `START:END` as reported by an editor's mark and point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    pub start: usize,
    pub end: usize,
}

impl FromStr for Region {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let (start, end) = value
            .split_once(':')
            .ok_or_else(|| format!("expected START:END, got '{value}'"))?;
        let parse = |part: &str| {
            part.trim()
                .parse::<usize>()
                .map_err(|err| format!("invalid offset '{part}': {err}"))
        };
        let (start, end) = (parse(start)?, parse(end)?);
        // Mark may sit after point.
        Ok(Self {
            start: start.min(end),
            end: start.max(end),
        })
    }
}

impl Cli {
    fn selection(&self, file: &Path) -> Result<Option<LineRange>> {
        if let Some(region) = self.region {
            let contents = fs::read_to_string(file)
                .with_context(|| format!("failed to read {}", file.display()))?;
            return Ok(Some(LineRange::from_region(&contents, region.start, region.end)));
        }
        Ok(self.lines)
    }

    fn options(&self, config: &Config) -> LinkOptions {
        let mut options = LinkOptions::from_config(config);
        if let Some(remote) = &self.remote {
            options.remote = remote.clone();
        }
        if let Some(backend) = self.backend {
            options.backend = backend;
        }
        options.branch = self.branch.clone();
        if self.no_copy {
            options.copy_to_clipboard = false;
        }
        options
    }
}

/// Execute a parsed command line.
pub fn run(cli: Cli) -> Result<()> {
    let mut stdout = io::stdout().lock();

    if let Some(shell) = cli.completions {
        clap_complete::generate(shell, &mut Cli::command(), "repolink", &mut stdout);
        return Ok(());
    }

    let file = cli.file.clone().context("missing FILE argument")?;
    let absolute = canonical_path(&file)?;
    let repo_root = absolute.parent().and_then(find_repo_root);
    let config = Config::load(repo_root.as_deref())?;

    let context = EditorContext::new(&absolute).with_selection(cli.selection(&absolute)?);
    let options = cli.options(&config);
    let mut clipboard = Clipboard::new();

    let link = command::run(&context, &options, &mut clipboard)?;

    if cli.json {
        let rendered = serde_json::to_string_pretty(&link).context("failed to serialize link")?;
        writeln!(stdout, "{rendered}")?;
    } else {
        writeln!(stdout, "{}", link.url)?;
    }
    Ok(())
}
