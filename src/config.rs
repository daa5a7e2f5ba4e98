//! Replacement parameters.

use crate::domain::Rgb;
use crate::error::{PatchError, PatchResult};
use crate::replacement::{SimpleWatermark, TextReplacement};

pub const DEFAULT_OLD_TEXT: &str = "KYC Report";
pub const DEFAULT_NEW_TEXT: &str = "PD Report";
pub const DEFAULT_ACCENT: &str = "#0066cc";

/// What to replace and how replaced text looks.
#[derive(Debug, Clone, PartialEq)]
pub struct ReplacementConfig {
    pub old_text: String,
    pub new_text: String,
    /// Colour of redrawn text containing the replacement.
    pub accent: Rgb,
    /// Label drawn by the `simple` fallback.
    pub watermark: SimpleWatermark,
}

impl ReplacementConfig {
    /// Config replacing `old_text` with `new_text`; the watermark shows
    /// `new_text`.
    pub fn new(old_text: impl Into<String>, new_text: impl Into<String>) -> Self {
        let new_text = new_text.into();
        Self {
            old_text: old_text.into(),
            watermark: SimpleWatermark::new(new_text.clone()),
            new_text,
            accent: default_accent(),
        }
    }

    pub fn with_accent(mut self, accent: Rgb) -> Self {
        self.accent = accent;
        self
    }

    pub fn validate(&self) -> PatchResult<()> {
        if self.old_text.is_empty() {
            return Err(PatchError::Configuration {
                parameter: "old_text".to_string(),
                reason: "text to replace must not be empty".to_string(),
            });
        }
        if self.watermark.style.font_size <= 0.0 {
            return Err(PatchError::Configuration {
                parameter: "watermark".to_string(),
                reason: "font size must be positive".to_string(),
            });
        }
        Ok(())
    }

    pub fn replacement(&self) -> TextReplacement {
        TextReplacement {
            old_text: self.old_text.clone(),
            new_text: self.new_text.clone(),
            accent: self.accent,
        }
    }
}

impl Default for ReplacementConfig {
    fn default() -> Self {
        Self::new(DEFAULT_OLD_TEXT, DEFAULT_NEW_TEXT)
    }
}

fn default_accent() -> Rgb {
    Rgb::new(0.0, 102.0 / 255.0, 204.0 / 255.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ReplacementConfig::default();
        assert_eq!(config.old_text, "KYC Report");
        assert_eq!(config.new_text, "PD Report");
        assert_eq!(config.accent.to_string(), DEFAULT_ACCENT);
        assert_eq!(Rgb::from_hex(DEFAULT_ACCENT).unwrap(), config.accent);
        assert_eq!(config.watermark.text, "PD Report");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_old_text_rejected() {
        let config = ReplacementConfig::new("", "x");
        assert!(matches!(
            config.validate(),
            Err(PatchError::Configuration { .. })
        ));
    }

    #[test]
    fn test_watermark_follows_new_text() {
        let config = ReplacementConfig::new("Draft", "Final");
        assert_eq!(config.watermark.text, "Final");
        assert_eq!(config.replacement().new_text, "Final");
    }
}
