//! Git metadata of a local checkout, read through the `git` CLI.

use std::path::{Path, PathBuf};
use std::process::Command;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Field separator in the `git log` format string (ASCII unit separator).
const FIELD_SEPARATOR: char = '\u{1f}';

const LATEST_COMMIT_FORMAT: &str = "--pretty=format:%H%x1f%h%x1f%s%x1f%cD%x1f%cN%x1f%cE";

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum GitError {
    #[error("failed to run git in '{dir}': {source}")]
    Spawn {
        dir: PathBuf,
        source: std::io::Error,
    },

    #[error("`git {args}` failed: {stderr}")]
    Command { args: String, stderr: String },

    #[error("unexpected output from `git log`: {0}")]
    MalformedCommit(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitInfo {
    /// Name of the repository's top-level directory.
    pub package: String,
    pub url: String,
    /// Empty on a detached HEAD.
    pub branch: String,
    /// Tag pointing at HEAD, if any.
    pub tag: String,
    pub commit: Commit,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commit {
    pub id: String,
    pub abbr: String,
    pub sub: String,
    pub date: String,
    pub committer: Committer,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Committer {
    pub name: String,
    pub email: String,
}

impl GitInfo {
    /// Collects metadata for the repository containing `dir`.
    pub fn collect(dir: impl AsRef<Path>) -> Result<Self, GitError> {
        let dir = dir.as_ref();

        let toplevel = run_git(dir, &["rev-parse", "--show-toplevel"])?;
        // Repositories without a remote are fine
        let url = run_git(dir, &["config", "--get", "remote.origin.url"]).unwrap_or_default();
        let branch = run_git(dir, &["rev-parse", "--abbrev-ref", "HEAD"])?;
        let tag = run_git(dir, &["tag", "--points-at", "HEAD"])?;
        let commit = run_git(dir, &["log", "-n1", LATEST_COMMIT_FORMAT])?;

        Ok(Self {
            package: package_name(&toplevel),
            url: normalize_remote_url(&url),
            branch: normalize_branch(&branch),
            tag: tag.lines().next().unwrap_or_default().to_string(),
            commit: parse_commit(&commit)?,
        })
    }
}

fn run_git(dir: &Path, args: &[&str]) -> Result<String, GitError> {
    let output = Command::new("git")
        .args(args)
        .current_dir(dir)
        .output()
        .map_err(|source| GitError::Spawn {
            dir: dir.to_path_buf(),
            source,
        })?;

    if !output.status.success() {
        return Err(GitError::Command {
            args: args.join(" "),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    Ok(String::from_utf8_lossy(&output.stdout).trim_end().to_string())
}

fn package_name(toplevel: &str) -> String {
    Path::new(toplevel.trim())
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Strips `.git`; SSH remotes (`git@host:org/repo`) keep the part after `@`.
fn normalize_remote_url(raw: &str) -> String {
    let url = raw.trim();
    let url = url.strip_suffix(".git").unwrap_or(url);

    if url.starts_with("http://") || url.starts_with("https://") {
        return url.to_string();
    }

    match url.split_once('@') {
        Some((_, rest)) => rest.to_string(),
        None => url.to_string(),
    }
}

fn normalize_branch(raw: &str) -> String {
    let branch = raw.trim();
    if branch == "HEAD" {
        String::new()
    } else {
        branch.to_string()
    }
}

fn parse_commit(raw: &str) -> Result<Commit, GitError> {
    let fields: Vec<&str> = raw.trim_end().split(FIELD_SEPARATOR).collect();
    let [id, abbr, sub, date, name, email] = fields.as_slice() else {
        return Err(GitError::MalformedCommit(raw.to_string()));
    };

    Ok(Commit {
        id: id.to_string(),
        abbr: abbr.to_string(),
        sub: sub.to_string(),
        date: date.to_string(),
        committer: Committer {
            name: name.to_string(),
            email: email.to_string(),
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_package_name() {
        assert_eq!(package_name("/home/dev/orders-service\n"), "orders-service");
        assert_eq!(package_name(""), "");
    }

    #[test]
    fn test_normalize_remote_url() {
        assert_eq!(
            normalize_remote_url("https://github.com/org/repo.git\n"),
            "https://github.com/org/repo"
        );
        assert_eq!(
            normalize_remote_url("git@github.com:org/repo.git"),
            "github.com:org/repo"
        );
        assert_eq!(normalize_remote_url("/srv/git/repo"), "/srv/git/repo");
        assert_eq!(normalize_remote_url(""), "");
    }

    #[test]
    fn test_detached_head_has_no_branch() {
        assert_eq!(normalize_branch("HEAD\n"), "");
        assert_eq!(normalize_branch("main"), "main");
    }

    #[test]
    fn test_parse_commit() {
        let raw = "abc123def\u{1f}abc123\u{1f}Fix \"quoted\", subject\u{1f}Mon, 1 Jan 2024 10:00:00 +0000\u{1f}Dev Person\u{1f}dev@example.com";
        let commit = parse_commit(raw).unwrap();

        assert_eq!(commit.id, "abc123def");
        assert_eq!(commit.abbr, "abc123");
        assert_eq!(commit.sub, "Fix \"quoted\", subject");
        assert_eq!(commit.date, "Mon, 1 Jan 2024 10:00:00 +0000");
        assert_eq!(commit.committer.name, "Dev Person");
        assert_eq!(commit.committer.email, "dev@example.com");
    }

    #[test]
    fn test_parse_malformed_commit() {
        assert!(matches!(
            parse_commit("only\u{1f}two"),
            Err(GitError::MalformedCommit(_))
        ));
    }

    #[test]
    fn test_collect_outside_repository_fails() {
        let dir = tempfile::tempdir().unwrap();
        assert!(GitInfo::collect(dir.path()).is_err());
    }
}
