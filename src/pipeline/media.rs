//! External media tooling: stream merging and output branding

use crate::{HarvestError, Result};
use async_trait::async_trait;
use std::io::SeekFrom;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::fs::OpenOptions;
use tokio::io::{AsyncReadExt, AsyncSeekExt, AsyncWriteExt};

/// Combines separate streams into one container
#[async_trait]
pub trait MediaProcessor: Send + Sync {
    /// Merges `inputs` into `output` without re-encoding
    ///
    /// Returns the tool's exit code; anything but 0 is a failed merge.
    async fn merge(&self, inputs: &[PathBuf], output: &Path) -> Result<i32>;
}

/// `MediaProcessor` that shells out to ffmpeg
#[derive(Debug, Clone)]
pub struct FfmpegProcessor {
    program: String,
}

impl FfmpegProcessor {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }
}

impl Default for FfmpegProcessor {
    fn default() -> Self {
        Self::new("ffmpeg")
    }
}

#[async_trait]
impl MediaProcessor for FfmpegProcessor {
    async fn merge(&self, inputs: &[PathBuf], output: &Path) -> Result<i32> {
        if let Some(parent) = output.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let mut command = tokio::process::Command::new(&self.program);
        command.args(["-hide_banner", "-nostdin"]);
        for input in inputs {
            command.arg("-i").arg(input);
        }
        command
            .args(["-c", "copy", "-y"])
            .arg(output)
            .stdin(Stdio::null());

        let result = command.output().await.map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => HarvestError::ToolMissing {
                tool: self.program.clone(),
            },
            _ => HarvestError::Io(e),
        })?;

        let code = result.status.code().unwrap_or(-1);
        if code != 0 {
            let stderr = String::from_utf8_lossy(&result.stderr);
            let tail: Vec<&str> = stderr.lines().rev().take(5).collect();
            tracing::warn!(
                "{} exited with {} merging into {}: {}",
                self.program,
                code,
                output.display(),
                tail.into_iter().rev().collect::<Vec<_>>().join(" | ")
            );
        }

        Ok(code)
    }
}

/// Overwrites the last byte of `path` with `symbol`
///
/// Returns `Ok(false)` for an empty file, which has no byte to overwrite.
pub async fn brand(path: &Path, symbol: u8) -> Result<bool> {
    let mut file = OpenOptions::new().read(true).write(true).open(path).await?;
    let len = file.metadata().await?.len();
    if len == 0 {
        return Ok(false);
    }

    file.seek(SeekFrom::End(-1)).await?;
    file.write_all(&[symbol]).await?;
    file.flush().await?;
    Ok(true)
}

/// Whether the last byte of `path` equals `symbol`
pub async fn is_branded(path: &Path, symbol: u8) -> Result<bool> {
    let mut file = tokio::fs::File::open(path).await?;
    if file.metadata().await?.len() == 0 {
        return Ok(false);
    }

    file.seek(SeekFrom::End(-1)).await?;
    let mut last = [0u8; 1];
    file.read_exact(&mut last).await?;
    Ok(last[0] == symbol)
}
