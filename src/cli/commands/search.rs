//! Search command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::pipeline::Pipeline;
use anyhow::Result;

/// Run the search command.
pub async fn run_search(question: &str, settings: Settings) -> Result<()> {
    if let Err(e) = preflight::check(Operation::OpenAI) {
        Output::error(&format!("{}", e));
        return Err(e.into());
    }

    let pipeline = Pipeline::new(settings)?;

    let spinner = Output::spinner("Searching...");
    let result = pipeline.search(question).await;
    spinner.finish_and_clear();

    let retrieval = match result {
        Ok(retrieval) => retrieval,
        Err(e) => {
            Output::error(&format!("Search failed: {}", e));
            return Err(anyhow::anyhow!("{}", e));
        }
    };

    if retrieval.is_empty() {
        Output::warning("No results found matching your query.");
        return Ok(());
    }

    Output::success(&format!(
        "Found {} hits and {} neighbors",
        retrieval.hits.len(),
        retrieval.neighbors.len()
    ));
    for doc in retrieval.combined() {
        Output::search_result(
            &doc.document.title,
            &doc.key.to_string(),
            doc.score,
            doc.content(),
        );
    }

    Ok(())
}
