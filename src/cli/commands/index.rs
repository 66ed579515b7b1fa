//! Index command implementation.

use crate::cli::Output;
use crate::config::Settings;
use crate::pipeline::Pipeline;
use anyhow::Result;

/// Run the index command.
pub async fn run_index(settings: Settings) -> Result<()> {
    let index_name = settings.index.index_name.clone();
    let pipeline = Pipeline::new(settings)?;

    let spinner = Output::spinner(&format!("Uploading embeddings to '{}'...", index_name));
    let result = pipeline.index_all().await;
    spinner.finish_and_clear();

    match result {
        Ok(summary) => {
            Output::success(&format!(
                "Indexed {} documents from {} episode(s)",
                summary.documents, summary.episodes
            ));
            Ok(())
        }
        Err(e) => {
            Output::error(&format!("Indexing failed: {}", e));
            Err(e.into())
        }
    }
}
