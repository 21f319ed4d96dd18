use anyhow::{Context, Result};
use regex::Regex;

/// Whitespace, punctuation, symbols and emoji allowed after the trigger word.
/// U+FE0F, U+200D and the tag block glue multi-codepoint emoji together;
/// U+200B is invisible.
const TRAILING: &str =
    r"[\s\p{P}\p{S}\p{Extended_Pictographic}\x{FE0F}\x{200D}\x{200B}\x{E0020}-\x{E007F}]*";

/// Decides whether a message ends with the trigger word.
#[derive(Debug, Clone)]
pub struct TriggerDetector {
    word: String,
    pattern: Regex,
}

impl TriggerDetector {
    pub fn new(word: &str) -> Result<Self> {
        let word = word.trim().to_lowercase();
        if word.is_empty() {
            anyhow::bail!("Trigger word cannot be empty");
        }

        let pattern = Regex::new(&format!("{}{}$", regex::escape(&word), TRAILING))
            .with_context(|| format!("Invalid trigger word {:?}", word))?;

        Ok(Self { word, pattern })
    }

    pub fn word(&self) -> &str {
        &self.word
    }

    /// True when the lowercased, trimmed text ends with the trigger word,
    /// optionally followed by punctuation, symbols or emoji.
    pub fn matches(&self, text: &str) -> bool {
        let text = text.trim().to_lowercase();
        if text.chars().count() < self.word.chars().count() {
            return false;
        }
        self.pattern.is_match(&text)
    }
}
