use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use log::{debug, info, warn};
use std::path::Path;
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;

/// Installs the packages pinned by a project's lockfile.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PackageInstaller: Send + Sync {
    async fn install_packages(&self, base_dir: &Path) -> Result<()>;
}

/// Runs `npm ci`, forwarding its output to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct Npm;

#[async_trait]
impl PackageInstaller for Npm {
    #[tracing::instrument(skip(self))]
    async fn install_packages(&self, base_dir: &Path) -> Result<()> {
        debug!("Running npm ci in {:?}", base_dir);
        let mut child = Command::new("npm")
            .arg("ci")
            .current_dir(base_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .context("Failed to spawn npm")?;

        let stdout = child.stdout.take().context("npm stdout is not captured")?;
        let stderr = child.stderr.take().context("npm stderr is not captured")?;
        let forward_stdout = async {
            let mut lines = BufReader::new(stdout).lines();
            while let Some(line) = lines.next_line().await? {
                info!("{}", line);
            }
            Ok::<_, std::io::Error>(())
        };
        let forward_stderr = async {
            let mut lines = BufReader::new(stderr).lines();
            while let Some(line) = lines.next_line().await? {
                warn!("{}", line);
            }
            Ok::<_, std::io::Error>(())
        };
        let (out, err) = tokio::join!(forward_stdout, forward_stderr);
        out?;
        err?;

        let status = child.wait().await.context("Failed to wait for npm")?;
        if !status.success() {
            bail!("Error during 'npm ci' ({})", status);
        }
        Ok(())
    }
}
