//! Embed command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::pipeline::Pipeline;
use anyhow::Result;

/// Run the embed command.
pub async fn run_embed(settings: Settings) -> Result<()> {
    if let Err(e) = preflight::check(Operation::OpenAI) {
        Output::error(&format!("{}", e));
        return Err(e.into());
    }

    let pipeline = Pipeline::new(settings)?;

    let spinner = Output::spinner("Embedding transcripts...");
    let result = pipeline.embed_all().await;
    spinner.finish_and_clear();

    let summary = match result {
        Ok(summary) => summary,
        Err(e) => {
            Output::error(&format!("Embedding failed: {}", e));
            return Err(e.into());
        }
    };

    Output::success(&format!(
        "Built {} artifact(s) with {} embedded windows",
        summary.built, summary.embedded
    ));
    Output::kv("Already embedded", &summary.skipped.to_string());
    if summary.untranscribed > 0 {
        Output::warning(&format!(
            "{} episode(s) have no transcript yet; run 'podsearch transcribe' first.",
            summary.untranscribed
        ));
    }
    if summary.failed > 0 {
        Output::warning(&format!(
            "{} window(s) failed to embed and were left out.",
            summary.failed
        ));
    }

    Ok(())
}
