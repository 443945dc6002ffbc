//! Locating files inside their repository.

use std::path::{Component, Path, PathBuf};

use anyhow::{Context, Result};

use crate::domain::errors::RepolinkError;
use crate::domain::model::RepoPath;

/// Resolve `file` against the nearest enclosing repository.
///
/// Relative paths are taken from the current working directory. Symlinks and `..` are resolved
/// before searching, so a path spelled through a repository does not count as inside it.
pub fn relative_path(file: &Path) -> Result<RepoPath> {
    let canonical = canonical_path(file)?;
    let start = canonical.parent().unwrap_or(&canonical);
    let root = find_repo_root(start).ok_or_else(|| RepolinkError::NotARepository {
        path: canonical.clone(),
    })?;

    let relative = canonical
        .strip_prefix(&root)
        .with_context(|| format!("{} is outside {}", canonical.display(), root.display()))?;
    let relative = to_slash(relative).ok_or_else(|| RepolinkError::NotARepository {
        path: canonical.clone(),
    })?;
    tracing::debug!(root = %root.display(), path = %relative, "resolved repository path");

    Ok(RepoPath { relative, root })
}

/// Canonical form of `file`. A file that does not exist yet (an unsaved buffer) is resolved
/// through its parent directory.
pub fn canonical_path(file: &Path) -> Result<PathBuf> {
    if let Ok(canonical) = std::fs::canonicalize(file) {
        return Ok(canonical);
    }

    let absolute = std::path::absolute(file)
        .with_context(|| format!("failed to resolve absolute path for {}", file.display()))?;
    let (Some(parent), Some(name)) = (absolute.parent(), absolute.file_name()) else {
        anyhow::bail!("cannot resolve {}", file.display());
    };
    let parent = std::fs::canonicalize(parent)
        .with_context(|| format!("failed to resolve directory {}", parent.display()))?;
    Ok(parent.join(name))
}

/// Walk upward from `start` until a directory holding a `.git` entry is found.
///
/// `.git` may be a file as well, which is how worktrees and submodules point at their git dir.
pub fn find_repo_root(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| dir.join(".git").exists())
        .map(Path::to_path_buf)
}

/// Join the components with `/`; `None` when the path climbs out through `..`.
fn to_slash(path: &Path) -> Option<String> {
    let mut parts = Vec::new();
    for component in path.components() {
        match component {
            Component::Normal(part) => parts.push(part.to_string_lossy()),
            Component::CurDir => {}
            _ => return None,
        }
    }
    Some(parts.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn nested_file_resolves_with_forward_slashes() -> Result<()> {
        let temp = tempfile::tempdir()?;
        fs::create_dir_all(temp.path().join(".git"))?;
        fs::create_dir_all(temp.path().join("src/infra"))?;
        let file = temp.path().join("src/infra/git.rs");
        fs::write(&file, "")?;

        let resolved = relative_path(&file)?;
        assert_eq!(resolved.relative, "src/infra/git.rs");
        assert_eq!(resolved.root, fs::canonicalize(temp.path())?);
        Ok(())
    }

    #[test]
    fn nearest_marker_wins() -> Result<()> {
        let temp = tempfile::tempdir()?;
        fs::create_dir_all(temp.path().join(".git"))?;
        let nested = temp.path().join("vendor/lib");
        fs::create_dir_all(&nested)?;
        // Submodules carry a `.git` file rather than a directory.
        fs::write(temp.path().join("vendor/.git"), "gitdir: ../.git/modules/vendor")?;
        let file = nested.join("mod.rs");
        fs::write(&file, "")?;

        let resolved = relative_path(&file)?;
        assert_eq!(resolved.relative, "lib/mod.rs");
        assert_eq!(resolved.root, fs::canonicalize(temp.path().join("vendor"))?);
        Ok(())
    }

    #[test]
    fn file_outside_repository_is_an_error() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let file = temp.path().join("loose.txt");
        fs::write(&file, "")?;

        // The temp dir could live under a checkout; only assert when nothing above it is one.
        if find_repo_root(temp.path()).is_none() {
            let err = relative_path(&file).unwrap_err();
            assert!(matches!(
                err.downcast_ref::<RepolinkError>(),
                Some(RepolinkError::NotARepository { .. })
            ));
        }
        Ok(())
    }

    #[test]
    fn parent_components_do_not_reenter_the_repository() -> Result<()> {
        let temp = tempfile::tempdir()?;
        fs::create_dir_all(temp.path().join("proj/.git"))?;
        fs::create_dir_all(temp.path().join("notes"))?;
        fs::write(temp.path().join("notes/todo.md"), "")?;

        let spelled_through_repo = temp.path().join("proj/../notes/todo.md");
        if find_repo_root(temp.path()).is_none() {
            let err = relative_path(&spelled_through_repo).unwrap_err();
            assert!(matches!(
                err.downcast_ref::<RepolinkError>(),
                Some(RepolinkError::NotARepository { .. })
            ));
        } else {
            // Whatever encloses the temp dir, the result must not be rooted at `proj`.
            let resolved = relative_path(&spelled_through_repo)?;
            assert_ne!(resolved.root, fs::canonicalize(temp.path().join("proj"))?);
        }
        Ok(())
    }

    #[test]
    fn unsaved_file_resolves_through_its_directory() -> Result<()> {
        let temp = tempfile::tempdir()?;
        fs::create_dir_all(temp.path().join(".git"))?;
        fs::create_dir_all(temp.path().join("docs"))?;

        let resolved = relative_path(&temp.path().join("docs/./draft.md"))?;
        assert_eq!(resolved.relative, "docs/draft.md");
        Ok(())
    }

    #[test]
    fn climbing_components_are_rejected() {
        assert_eq!(to_slash(Path::new("a/./b")).as_deref(), Some("a/b"));
        assert_eq!(to_slash(Path::new("../notes/todo.md")), None);
    }
}
