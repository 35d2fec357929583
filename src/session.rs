use crate::{
    config::DEFAULT_HISTORY_DISPLAY_LIMIT,
    error::{ImageGenError, Result},
    models::{GenerationOptions, HistoryEntry, PromptFields},
    openai::ImageClient,
    prompt::PromptBuilder,
};

/// Per-user state: generated images and the prompt of the last round.
///
/// History is append-only, oldest first. Nothing here outlives the session
/// and nothing is shared between sessions.
#[derive(Debug, Default)]
pub struct Session {
    history: Vec<HistoryEntry>,
    current: Option<usize>,
    last_prompt: Option<String>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// First round: assemble the prompt from the form fields and generate.
    pub async fn generate(
        &mut self,
        client: &ImageClient,
        fields: &PromptFields,
        options: &GenerationOptions,
    ) -> Result<&HistoryEntry> {
        let prompt = PromptBuilder::build(fields, None);
        PromptBuilder::ensure_not_empty(&prompt)?;
        self.run(client, prompt, options).await
    }

    /// Follow-up round: the previous prompt plus a correction request.
    /// Always asks for a single variant.
    pub async fn refine(
        &mut self,
        client: &ImageClient,
        modification: &str,
        options: &GenerationOptions,
    ) -> Result<&HistoryEntry> {
        let previous = self.last_prompt.as_deref().ok_or_else(|| {
            ImageGenError::ValidationError("Generate an image before requesting changes".into())
        })?;
        let prompt = PromptBuilder::append_modification(previous, modification)?;
        let options = options.with_variants(1);
        self.run(client, prompt, &options).await
    }

    async fn run(
        &mut self,
        client: &ImageClient,
        prompt: String,
        options: &GenerationOptions,
    ) -> Result<&HistoryEntry> {
        // State is only touched once the image is in hand.
        let generated = client.generate(&prompt, options).await?;

        self.last_prompt = Some(prompt.clone());
        self.history.push(HistoryEntry::new(prompt, generated));
        let index = self.history.len() - 1;
        self.current = Some(index);
        Ok(&self.history[index])
    }

    pub fn history(&self) -> &[HistoryEntry] {
        &self.history
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    /// Up to `limit` entries, most recent first.
    pub fn recent(&self, limit: usize) -> impl Iterator<Item = &HistoryEntry> {
        self.history.iter().rev().take(limit)
    }

    pub fn recent_default(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.recent(DEFAULT_HISTORY_DISPLAY_LIMIT)
    }

    /// Shows the `rank`-th most recent entry (0 = newest). History is not
    /// reordered.
    pub fn select(&mut self, rank: usize) -> Result<&HistoryEntry> {
        if rank >= self.history.len() {
            return Err(ImageGenError::ValidationError(format!(
                "No history entry #{} (history has {} entries)",
                rank + 1,
                self.history.len()
            )));
        }
        let index = self.history.len() - 1 - rank;
        self.current = Some(index);
        Ok(&self.history[index])
    }

    pub fn current(&self) -> Option<&HistoryEntry> {
        self.current.map(|index| &self.history[index])
    }

    pub fn last_prompt(&self) -> Option<&str> {
        self.last_prompt.as_deref()
    }

    /// Ends the session.
    pub fn clear(&mut self) {
        log::debug!("Clearing session with {} history entries", self.history.len());
        self.history.clear();
        self.current = None;
        self.last_prompt = None;
    }
}
