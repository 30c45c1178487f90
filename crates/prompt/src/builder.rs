//! Prompt builder for rendering templates.

use crate::types::{BuiltPrompt, BuiltPromptMetadata, PromptDefinition};
use claims_core::{AppError, AppResult};
use handlebars::Handlebars;
use std::collections::{BTreeMap, HashMap};

/// Build a prompt from a definition and input variables.
///
/// Every input the definition declares must be present in `variables`; an
/// empty string counts as present. Extra variables are passed through to the
/// template.
///
/// # Example
/// ```no_run
/// use claims_prompt::{build_prompt, PromptDefinition};
/// use std::collections::HashMap;
///
/// # fn example(def: PromptDefinition) -> Result<(), Box<dyn std::error::Error>> {
/// let mut vars = HashMap::new();
/// vars.insert("query".to_string(), "total amount by status".to_string());
///
/// let built = build_prompt(&def, &vars)?;
/// println!("{}", built.text);
/// # Ok(())
/// # }
/// ```
pub fn build_prompt(
    definition: &PromptDefinition,
    variables: &HashMap<String, String>,
) -> AppResult<BuiltPrompt> {
    tracing::debug!("Building prompt: {}", definition.id);

    let missing: Vec<&str> = definition
        .inputs
        .iter()
        .filter(|input| !variables.contains_key(input.as_str()))
        .map(String::as_str)
        .collect();
    if !missing.is_empty() {
        return Err(AppError::Prompt(format!(
            "Prompt {} is missing inputs: {}",
            definition.id,
            missing.join(", ")
        )));
    }

    let text = render_template(&definition.template, variables)?;

    let resolved_variables: BTreeMap<String, usize> = variables
        .iter()
        .map(|(name, value)| (name.clone(), value.len()))
        .collect();

    Ok(BuiltPrompt {
        text,
        metadata: BuiltPromptMetadata {
            source_prompt_id: definition.id.clone(),
            resolved_variables,
        },
    })
}

/// Render a Handlebars template with variables.
pub(crate) fn render_template(
    template: &str,
    variables: &HashMap<String, String>,
) -> AppResult<String> {
    let mut handlebars = Handlebars::new();

    // Plain text, not HTML
    handlebars.register_escape_fn(handlebars::no_escape);

    handlebars
        .register_template_string("prompt", template)
        .map_err(|e| AppError::Prompt(format!("Failed to register template: {}", e)))?;

    handlebars
        .render("prompt", variables)
        .map_err(|e| AppError::Prompt(format!("Failed to render template: {}", e)))
}
