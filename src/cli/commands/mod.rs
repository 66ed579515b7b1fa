//! CLI command implementations.

mod config;
mod embed;
mod index;
mod list;
mod query;
mod search;
mod serve;
mod transcribe;

pub use config::run_config;
pub use embed::run_embed;
pub use index::run_index;
pub use list::run_list;
pub use query::run_query;
pub use search::run_search;
pub use serve::run_serve;
pub use transcribe::run_transcribe;
