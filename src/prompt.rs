use crate::{
    error::{ImageGenError, Result},
    models::{single_line, PromptFields},
};

pub const MODIFICATION_LABEL: &str = "Modification request:";

/// Flattens form fields into the text prompt sent to the images endpoint.
pub struct PromptBuilder;

impl PromptBuilder {
    /// One `Label: value` line per non-blank field, always in declared order,
    /// negative prompt last among the fields. A non-blank `modification` is
    /// appended after everything else. Returns an empty string when there is
    /// nothing to say; callers must not send that to the service.
    pub fn build(fields: &PromptFields, modification: Option<&str>) -> String {
        let mut parts: Vec<String> = fields
            .ordered()
            .into_iter()
            .filter_map(|(field, value)| value.map(|v| format!("{} {}", field.label(), v)))
            .collect();

        if let Some(modification) = modification.map(single_line).filter(|m| !m.is_empty()) {
            parts.push(format!("{} {}", MODIFICATION_LABEL, modification));
        }

        parts.join("\n")
    }

    /// Adds one more correction round on top of an already assembled prompt.
    pub fn append_modification(prompt: &str, modification: &str) -> Result<String> {
        let modification = single_line(modification);
        if modification.is_empty() {
            return Err(ImageGenError::ValidationError(
                "Modification request cannot be empty".into(),
            ));
        }

        let segment = format!("{} {}", MODIFICATION_LABEL, modification);
        if prompt.trim().is_empty() {
            Ok(segment)
        } else {
            Ok(format!("{}\n{}", prompt, segment))
        }
    }

    /// Rejects prompts that would be sent empty.
    pub fn ensure_not_empty(prompt: &str) -> Result<()> {
        if prompt.trim().is_empty() {
            return Err(ImageGenError::ValidationError(
                "At least one field is required".into(),
            ));
        }
        Ok(())
    }
}
