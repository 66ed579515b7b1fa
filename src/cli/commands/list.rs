//! List command implementation.

use crate::cli::Output;
use crate::config::Settings;
use crate::embedding_store::ArtifactStore;
use crate::manifest::Manifest;
use anyhow::Result;

/// Run the list command.
pub fn run_list(settings: Settings) -> Result<()> {
    let data_dir = settings.data_dir();
    let manifest = Manifest::load(&data_dir)?;
    let artifacts = ArtifactStore::new(&data_dir);

    if manifest.is_empty() {
        Output::info(&format!(
            "No episodes in {}. Add episodes to the manifest to get started.",
            Manifest::path_in(&data_dir).display()
        ));
        return Ok(());
    }

    Output::header(&format!("Episodes ({})", manifest.len()));
    println!();

    let mut embedded = 0;
    for episode in manifest.episodes.values() {
        let has_artifact = artifacts.exists(&episode.guid);
        if has_artifact {
            embedded += 1;
        }
        Output::episode_info(&episode.title, &episode.guid, episode.is_transcribed(), has_artifact);
    }

    println!();
    Output::kv("Transcribed", &manifest.transcribed().count().to_string());
    Output::kv("Embedded", &embedded.to_string());
    if let Some(updated) = manifest.last_updated {
        Output::kv("Last updated", &updated.format("%Y-%m-%d %H:%M UTC").to_string());
    }

    Ok(())
}
