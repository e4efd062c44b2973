//! `git` subprocess wrapper used by the remote store.

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use log::{debug, warn};
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;
use tracing::instrument;

/// Which references `git ls-remote` should report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefFilter {
    pub tags: bool,
    pub branches: bool,
    /// Extra `ls-remote` patterns, e.g. `v*` or `master`.
    pub patterns: Vec<String>,
}

impl Default for RefFilter {
    fn default() -> Self {
        Self {
            tags: true,
            branches: false,
            patterns: Vec::new(),
        }
    }
}

impl RefFilter {
    pub fn tags_and_branches() -> Self {
        Self {
            tags: true,
            branches: true,
            patterns: Vec::new(),
        }
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GitClient: Send + Sync {
    /// List remote references, newest version first. Returns raw listing lines.
    async fn list_refs(&self, url: &str, filter: &RefFilter) -> Result<Vec<String>>;

    /// Shallow clone a single branch or tag into `target_dir`.
    async fn shallow_clone(&self, url: &str, git_ref: &str, target_dir: &Path) -> Result<()>;
}

/// Arguments for `git ls-remote`.
///
/// Peeled tags (`refs/tags/x^{}`) are excluded with `--refs`; only the
/// tag itself is of interest.
pub fn ls_remote_args(url: &str, filter: &RefFilter) -> Vec<String> {
    let mut args: Vec<String> = ["ls-remote", "--sort=-version:refname", "--refs"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    if filter.tags {
        args.push("--tags".into());
    }
    if filter.branches {
        args.push("--heads".into());
    }
    args.push(url.to_string());
    args.extend(filter.patterns.iter().cloned());
    args
}

pub fn clone_args(url: &str, git_ref: &str, target_dir: &Path) -> Vec<String> {
    vec![
        "clone".into(),
        url.to_string(),
        "-b".into(),
        git_ref.to_string(),
        "--depth".into(),
        "1".into(),
        target_dir.display().to_string(),
    ]
}

/// Runs the system `git` binary.
#[derive(Debug, Clone, Copy, Default)]
pub struct GitCli;

impl GitCli {
    async fn run(&self, args: &[String]) -> Result<Vec<u8>> {
        let mut cmd = Command::new("git");
        cmd.args(args);
        cmd.env("GIT_TERMINAL_PROMPT", "0");
        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());

        let subcommand = args.first().map(String::as_str).unwrap_or_default();
        debug!("spawning git {}", args.join(" "));

        let output = cmd
            .output()
            .await
            .with_context(|| format!("Failed to spawn git {}", subcommand))?;

        let stderr = String::from_utf8_lossy(&output.stderr);
        if !output.status.success() {
            bail!(
                "git {} failed (status {}): {}",
                subcommand,
                output.status,
                stderr.trim()
            );
        }
        for line in stderr.lines().filter(|l| !l.trim().is_empty()) {
            warn!("{}", line);
        }
        Ok(output.stdout)
    }
}

#[async_trait]
impl GitClient for GitCli {
    #[instrument(skip(self, filter))]
    async fn list_refs(&self, url: &str, filter: &RefFilter) -> Result<Vec<String>> {
        let stdout = self.run(&ls_remote_args(url, filter)).await?;
        Ok(String::from_utf8_lossy(&stdout)
            .lines()
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect())
    }

    #[instrument(skip(self))]
    async fn shallow_clone(&self, url: &str, git_ref: &str, target_dir: &Path) -> Result<()> {
        self.run(&clone_args(url, git_ref, target_dir)).await?;

        // Installed bundles are plain directories, not working copies.
        let git_dir = target_dir.join(".git");
        tokio::fs::remove_dir_all(&git_dir)
            .await
            .with_context(|| format!("Failed to remove {:?}", git_dir))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ls_remote_args_tags_and_branches() {
        let args = ls_remote_args("git@github.com:user/dummy.git", &RefFilter::tags_and_branches());
        assert_eq!(
            args,
            vec![
                "ls-remote",
                "--sort=-version:refname",
                "--refs",
                "--tags",
                "--heads",
                "git@github.com:user/dummy.git",
            ]
        );
    }

    #[test]
    fn test_ls_remote_args_with_patterns() {
        let filter = RefFilter {
            tags: true,
            branches: false,
            patterns: vec!["v*".into(), "latest".into()],
        };
        let args = ls_remote_args("https://github.com/user/repo.git", &filter);
        assert_eq!(args[3], "--tags");
        assert_eq!(&args[4..], ["https://github.com/user/repo.git", "v*", "latest"]);
    }

    #[test]
    fn test_clone_args() {
        let args = clone_args(
            "git@github.com:user/dummy.git",
            "v1.0.0",
            Path::new("/home/user/.ndb/dummy/v1.0.0"),
        );
        assert_eq!(
            args.join(" "),
            "clone git@github.com:user/dummy.git -b v1.0.0 --depth 1 /home/user/.ndb/dummy/v1.0.0"
        );
    }

    #[tokio::test]
    async fn test_list_refs_failure_is_an_error() {
        let err = GitCli
            .list_refs("file:///nonexistent/dbm-test-repo.git", &RefFilter::default())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("git ls-remote"));
    }
}
