use serde::{Deserialize, Serialize};

/// The seven description fields collected from the form. Every field is
/// optional; blank fields are left out of the assembled prompt.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptFields {
    pub subject: Option<String>,
    pub attributes: Option<String>,
    pub style: Option<String>,
    pub environment: Option<String>,
    pub composition: Option<String>,
    pub extra: Option<String>,
    pub negative: Option<String>,
}

impl PromptFields {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    pub fn with_attributes(mut self, attributes: impl Into<String>) -> Self {
        self.attributes = Some(attributes.into());
        self
    }

    pub fn with_style(mut self, style: impl Into<String>) -> Self {
        self.style = Some(style.into());
        self
    }

    pub fn with_environment(mut self, environment: impl Into<String>) -> Self {
        self.environment = Some(environment.into());
        self
    }

    pub fn with_composition(mut self, composition: impl Into<String>) -> Self {
        self.composition = Some(composition.into());
        self
    }

    pub fn with_extra(mut self, extra: impl Into<String>) -> Self {
        self.extra = Some(extra.into());
        self
    }

    pub fn with_negative(mut self, negative: impl Into<String>) -> Self {
        self.negative = Some(negative.into());
        self
    }

    /// Fields in emission order, each folded onto one line, with blank
    /// values filtered to `None`.
    pub fn ordered(&self) -> [(PromptField, Option<String>); 7] {
        [
            (PromptField::Subject, non_blank(&self.subject)),
            (PromptField::Attributes, non_blank(&self.attributes)),
            (PromptField::Style, non_blank(&self.style)),
            (PromptField::Environment, non_blank(&self.environment)),
            (PromptField::Composition, non_blank(&self.composition)),
            (PromptField::Extra, non_blank(&self.extra)),
            (PromptField::Negative, non_blank(&self.negative)),
        ]
    }

    pub fn is_empty(&self) -> bool {
        self.ordered().iter().all(|(_, value)| value.is_none())
    }
}

/// Collapses every run of whitespace, line breaks included, into one space.
/// A field value can never spill onto an unlabeled line of its own.
pub fn single_line(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(single_line)
        .filter(|value| !value.is_empty())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptField {
    Subject,
    Attributes,
    Style,
    Environment,
    Composition,
    Extra,
    Negative,
}

impl PromptField {
    pub fn label(&self) -> &'static str {
        match self {
            PromptField::Subject => "Subject:",
            PromptField::Attributes => "Attributes:",
            PromptField::Style => "Style:",
            PromptField::Environment => "Environment:",
            PromptField::Composition => "Composition:",
            PromptField::Extra => "Extra details:",
            PromptField::Negative => "Negative prompt (avoid):",
        }
    }
}
