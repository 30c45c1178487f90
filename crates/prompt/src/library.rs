//! Prompt catalog used by the agent stages.
//!
//! The catalog starts from the built-in definitions compiled into the crate
//! and replaces any of them that the workspace overrides under
//! `.claims/prompts/<id>.yml`.

use crate::builder::build_prompt;
use crate::loader::{list_prompts, load_prompt, parse_prompt};
use crate::types::{PromptDefinition, PromptSource};
use claims_core::{AppError, AppResult};
use std::collections::HashMap;
use std::path::Path;

pub const ROUTER_CLASSIFY: &str = "router.classify";
pub const SQL_GENERATE: &str = "sql.generate";
pub const SQL_REPAIR: &str = "sql.repair";
pub const ANSWER_RAG: &str = "answer.rag";
pub const ANSWER_SYNTHESIZE: &str = "answer.synthesize";

const BUILTIN_PROMPTS: [(&str, &str); 5] = [
    (ROUTER_CLASSIFY, include_str!("../prompts/router.classify.yml")),
    (SQL_GENERATE, include_str!("../prompts/sql.generate.yml")),
    (SQL_REPAIR, include_str!("../prompts/sql.repair.yml")),
    (ANSWER_RAG, include_str!("../prompts/answer.rag.yml")),
    (ANSWER_SYNTHESIZE, include_str!("../prompts/answer.synthesize.yml")),
];

/// Resolved set of prompt definitions.
#[derive(Debug, Clone)]
pub struct PromptLibrary {
    definitions: HashMap<String, (PromptDefinition, PromptSource)>,
}

impl PromptLibrary {
    /// Catalog with only the built-in definitions.
    pub fn builtin() -> AppResult<Self> {
        let mut definitions = HashMap::new();
        for (id, contents) in BUILTIN_PROMPTS {
            let definition = parse_prompt(contents)
                .map_err(|e| AppError::Prompt(format!("Built-in prompt {}: {}", id, e)))?;
            definitions.insert(id.to_string(), (definition, PromptSource::Builtin));
        }
        Ok(Self { definitions })
    }

    /// Built-in catalog with workspace overrides applied.
    ///
    /// Only IDs that exist in the built-in catalog can be overridden; other
    /// files in the prompts directory are ignored with a warning.
    pub fn load(workspace_path: &Path) -> AppResult<Self> {
        let mut library = Self::builtin()?;

        for id in list_prompts(workspace_path)? {
            if !library.definitions.contains_key(&id) {
                tracing::warn!("Ignoring unknown prompt override: {}", id);
                continue;
            }
            let definition = load_prompt(workspace_path, &id)?;
            library
                .definitions
                .insert(id, (definition, PromptSource::Workspace));
        }

        Ok(library)
    }

    pub fn get(&self, id: &str) -> Option<&PromptDefinition> {
        self.definitions.get(id).map(|(def, _)| def)
    }

    pub fn source(&self, id: &str) -> Option<PromptSource> {
        self.definitions.get(id).map(|(_, source)| *source)
    }

    /// Render a prompt by ID.
    pub fn render(&self, id: &str, variables: &HashMap<String, String>) -> AppResult<String> {
        let definition = self
            .get(id)
            .ok_or_else(|| AppError::Prompt(format!("Unknown prompt: {}", id)))?;
        Ok(build_prompt(definition, variables)?.text)
    }
}

/// Collect `(name, value)` pairs into a template variable map.
pub fn vars<const N: usize>(pairs: [(&str, String); N]) -> HashMap<String, String> {
    pairs
        .into_iter()
        .map(|(name, value)| (name.to_string(), value))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_builtin_catalog_parses() {
        let library = PromptLibrary::builtin().unwrap();
        for (id, _) in BUILTIN_PROMPTS {
            assert!(library.get(id).is_some(), "missing {}", id);
            assert_eq!(library.source(id), Some(PromptSource::Builtin));
        }
    }

    #[test]
    fn test_classify_prompt_embeds_inputs() {
        let library = PromptLibrary::builtin().unwrap();
        let text = library
            .render(
                ROUTER_CLASSIFY,
                &vars([
                    ("query", "total amount by status".to_string()),
                    ("schema", "CREATE TABLE claims (...)".to_string()),
                    ("documents", "No documents loaded.".to_string()),
                ]),
            )
            .unwrap();
        assert!(text.contains("User question: total amount by status"));
        assert!(text.contains("CREATE TABLE claims"));
        assert!(text.contains("No documents loaded."));
        assert!(text.contains(r#""intent""#));
    }

    #[test]
    fn test_generate_prompt_names_sqlite() {
        let library = PromptLibrary::builtin().unwrap();
        let text = library
            .render(
                SQL_GENERATE,
                &vars([
                    ("query", "q".to_string()),
                    ("schema", "s".to_string()),
                    ("sample_data", "d".to_string()),
                ]),
            )
            .unwrap();
        assert!(text.contains("SQLite"));
        assert!(text.contains(r#"REPLACE(REPLACE("Total Charges", '$', ''), ',', '')"#));
    }

    #[test]
    fn test_history_section_only_when_present() {
        let library = PromptLibrary::builtin().unwrap();
        let base = |history: &str| {
            library
                .render(
                    ANSWER_SYNTHESIZE,
                    &vars([
                        ("query", "q".to_string()),
                        ("intent", "clarify".to_string()),
                        ("context", "c".to_string()),
                        ("history", history.to_string()),
                    ]),
                )
                .unwrap()
        };
        assert!(!base("").contains("Earlier in this conversation"));
        assert!(base("user: hi").contains("Earlier in this conversation:\nuser: hi"));
    }

    #[test]
    fn test_render_missing_input_is_error() {
        let library = PromptLibrary::builtin().unwrap();
        let result = library.render(SQL_REPAIR, &vars([("sql", "SELECT".to_string())]));
        assert!(result.is_err());
    }

    #[test]
    fn test_workspace_override_replaces_builtin() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().join(".claims/prompts");
        fs::create_dir_all(&dir).unwrap();
        fs::write(
            dir.join("sql.repair.yml"),
            "id: sql.repair\ntitle: Custom\napiVersion: \"1.0\"\ninputs: [sql, error]\ntemplate: \"fix {{sql}} / {{error}}\"\n",
        )
        .unwrap();
        fs::write(
            dir.join("other.yml"),
            "id: other\ntitle: Other\napiVersion: \"1.0\"\ntemplate: x\n",
        )
        .unwrap();

        let library = PromptLibrary::load(temp_dir.path()).unwrap();
        assert_eq!(library.source(SQL_REPAIR), Some(PromptSource::Workspace));
        assert!(library.get("other").is_none());

        let text = library
            .render(
                SQL_REPAIR,
                &vars([
                    ("sql", "SELEC 1".to_string()),
                    ("error", "syntax error".to_string()),
                    ("schema", String::new()),
                ]),
            )
            .unwrap();
        assert_eq!(text, "fix SELEC 1 / syntax error");
    }
}
