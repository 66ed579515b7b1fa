//! Prompt templates for podsearch.
//!
//! The defaults can be replaced by pointing `prompts.custom_file` at a TOML file.

use serde::{Deserialize, Serialize};

/// Collection of prompt templates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Prompts {
    pub rag: RagPrompts,
}

/// Prompts for answer generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RagPrompts {
    /// First system message of every conversation.
    pub system: String,
}

impl Default for RagPrompts {
    fn default() -> Self {
        Self {
            system: "You are a technical leader in the open source community, maybe affiliated \
                     with Oxide computers, and are discussing technical and social topics with \
                     friends and colleagues and answering questions from the audience"
                .to_string(),
        }
    }
}

impl Prompts {
    /// Load prompts, overriding the defaults from `custom_file` when given.
    pub fn load(custom_file: Option<&str>) -> crate::error::Result<Self> {
        let Some(file) = custom_file else {
            return Ok(Prompts::default());
        };

        let path = crate::config::Settings::expand_path(file);
        if !path.exists() {
            return Err(crate::error::PodsearchError::Config(format!(
                "Prompt file not found: {}",
                path.display()
            )));
        }

        let content = std::fs::read_to_string(&path)?;
        Ok(toml::from_str(&content)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_prompts() {
        let prompts = Prompts::load(None).unwrap();
        assert!(prompts.rag.system.contains("Oxide"));
    }

    #[test]
    fn test_custom_prompt_file_overrides_system() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prompts.toml");
        std::fs::write(&path, "[rag]\nsystem = \"You host a hardware podcast.\"\n").unwrap();

        let prompts = Prompts::load(path.to_str()).unwrap();
        assert_eq!(prompts.rag.system, "You host a hardware podcast.");
    }

    #[test]
    fn test_missing_prompt_file_is_an_error() {
        assert!(Prompts::load(Some("/nonexistent/prompts.toml")).is_err());
    }
}
