//! Splitting of oversized audio with ffmpeg.

use crate::error::{PodsearchError, Result};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, info, instrument};

const BYTES_PER_MB: u64 = 1_000_000;

/// Decides which files to upload for an episode, splitting when needed.
#[derive(Debug, Clone)]
pub struct AudioSplitter {
    dir: PathBuf,
    max_upload_mb: u64,
    segment_seconds: u32,
}

impl AudioSplitter {
    /// Splitter working on audio in `dir`.
    pub fn new(dir: impl Into<PathBuf>, max_upload_mb: u64, segment_seconds: u32) -> Self {
        Self {
            dir: dir.into(),
            max_upload_mb,
            segment_seconds,
        }
    }

    /// File name prefix of an episode's split parts.
    fn part_prefix(guid: &str) -> String {
        format!("{}-chunked", guid)
    }

    /// Parts already present for an episode, in name order.
    pub fn existing_parts(&self, guid: &str) -> Result<Vec<PathBuf>> {
        let prefix = Self::part_prefix(guid);
        let mut parts: Vec<PathBuf> = std::fs::read_dir(&self.dir)?
            .flatten()
            .filter(|entry| entry.file_name().to_string_lossy().starts_with(&prefix))
            .map(|entry| entry.path())
            .collect();
        parts.sort();
        Ok(parts)
    }

    /// Files to transcribe for an episode's audio file.
    ///
    /// Audio within the upload limit is returned as is. Larger audio is split
    /// into `<guid>-chunked-NN.mp3` parts, reusing parts from an earlier run.
    #[instrument(skip(self), fields(dir = %self.dir.display()))]
    pub async fn parts(&self, guid: &str, filename: &str) -> Result<Vec<PathBuf>> {
        let source = self.dir.join(filename);
        let size = std::fs::metadata(&source)
            .map_err(|e| {
                PodsearchError::Transcription(format!("cannot stat {}: {}", source.display(), e))
            })?
            .len();

        if size <= self.max_upload_mb * BYTES_PER_MB {
            return Ok(vec![source]);
        }

        let existing = self.existing_parts(guid)?;
        if !existing.is_empty() {
            debug!("Reusing {} existing parts", existing.len());
            return Ok(existing);
        }

        info!(
            "Audio is {} MB, splitting into {}s parts",
            size / BYTES_PER_MB,
            self.segment_seconds
        );
        self.split(&source, guid).await?;

        let parts = self.existing_parts(guid)?;
        if parts.is_empty() {
            return Err(PodsearchError::ToolFailed(format!(
                "ffmpeg produced no parts for {}",
                source.display()
            )));
        }
        Ok(parts)
    }

    async fn split(&self, source: &Path, guid: &str) -> Result<()> {
        let pattern = self.dir.join(format!("{}-%02d.mp3", Self::part_prefix(guid)));

        let result = Command::new("ffmpeg")
            .arg("-i").arg(source)
            .arg("-f").arg("segment")
            .arg("-segment_time").arg(self.segment_seconds.to_string())
            .arg("-c").arg("copy")
            .arg("-loglevel").arg("error")
            .arg(&pattern)
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .await;

        match result {
            Ok(out) if out.status.success() => Ok(()),
            Ok(out) => {
                let err = String::from_utf8_lossy(&out.stderr);
                Err(PodsearchError::ToolFailed(format!("ffmpeg split failed: {err}")))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(PodsearchError::ToolNotFound("ffmpeg".into()))
            }
            Err(e) => Err(PodsearchError::ToolFailed(format!("ffmpeg error: {e}"))),
        }
    }
}
