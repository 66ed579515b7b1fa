//! Transcription of episode audio.
//!
//! Whisper rejects uploads above a size limit, so oversized episodes are first
//! split into fixed-length parts with ffmpeg. Part transcripts are joined with
//! a single space, in part order.

mod splitter;
mod whisper;

pub use splitter::AudioSplitter;
pub use whisper::{is_api_key_configured, WhisperTranscriber};

use crate::error::Result;
use async_trait::async_trait;
use std::path::Path;

/// Trait for transcription services.
#[async_trait]
pub trait Transcriber: Send + Sync {
    /// Transcribe one audio file small enough to upload.
    async fn transcribe(&self, audio_path: &Path) -> Result<String>;
}

/// Transcribe audio parts in order and join the results.
pub async fn transcribe_parts(transcriber: &dyn Transcriber, parts: &[impl AsRef<Path>]) -> Result<String> {
    let mut texts = Vec::with_capacity(parts.len());
    for part in parts {
        let text = transcriber.transcribe(part.as_ref()).await?;
        texts.push(text.trim().to_string());
    }
    Ok(texts.join(" "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    /// Echoes the file name back as the transcript.
    struct EchoTranscriber;

    #[async_trait]
    impl Transcriber for EchoTranscriber {
        async fn transcribe(&self, audio_path: &Path) -> Result<String> {
            Ok(format!(" {} ", audio_path.file_stem().unwrap().to_string_lossy()))
        }
    }

    #[tokio::test]
    async fn test_parts_are_joined_in_order() {
        let parts = vec![PathBuf::from("ep-chunked-00.mp3"), PathBuf::from("ep-chunked-01.mp3")];
        let text = transcribe_parts(&EchoTranscriber, &parts).await.unwrap();
        assert_eq!(text, "ep-chunked-00 ep-chunked-01");
    }
}
