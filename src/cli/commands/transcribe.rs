//! Transcribe command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::pipeline::Pipeline;
use anyhow::Result;

/// Run the transcribe command.
pub async fn run_transcribe(settings: Settings) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Transcribe) {
        Output::error(&format!("{}", e));
        return Err(e.into());
    }

    let pipeline = Pipeline::new(settings)?;
    let pending = pipeline.manifest()?.pending_transcription().count();
    if pending == 0 {
        Output::info("Every episode in the manifest is already transcribed.");
        return Ok(());
    }

    let spinner = Output::spinner(&format!("Transcribing {} episode(s)...", pending));
    let result = pipeline.transcribe_pending().await;
    spinner.finish_and_clear();

    match result {
        Ok(count) => {
            Output::success(&format!("Transcribed {} episode(s)", count));
            Ok(())
        }
        Err(e) => {
            Output::error(&format!("Transcription failed: {}", e));
            Output::info("Episodes finished before the failure were saved; re-run to continue.");
            Err(e.into())
        }
    }
}
