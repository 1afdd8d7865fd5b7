use serde::{Deserialize, Serialize};
use std::path::Path;

/// Raw decoder output label. Negative values never name a symbol; the beam
/// root uses `-1` as its "no previous label" marker.
pub type Label = i32;

pub const NO_LABEL: Label = -1;

#[derive(thiserror::Error, Debug)]
pub enum LabelError {
    #[error("Label {label} is outside the configured alphabet of size {alphabet_size}")]
    InvalidLabel { label: Label, alphabet_size: usize },
    #[error("Invalid label configuration: {0}")]
    InvalidConfig(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Label configuration is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl LabelError {
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::InvalidLabel { .. } => {
                "The decoder produced a label the scorer does not know. Check the label alphabet."
            }
            Self::InvalidConfig(_) | Self::Json(_) => {
                "The label alphabet configuration is inconsistent."
            }
            Self::Io(_) => "The label alphabet configuration could not be read.",
        }
    }
}

/// Layout of the decoder's output alphabet.
///
/// Letters occupy `0..letter_count` and map onto `'a'..`; the three reserved
/// labels may sit anywhere else below `alphabet_size`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LabelConfig {
    pub alphabet_size: usize,
    pub letter_count: usize,
    pub apostrophe: Label,
    pub space: Label,
    pub blank: Label,
}

impl Default for LabelConfig {
    fn default() -> Self {
        Self {
            alphabet_size: 30,
            letter_count: 26,
            apostrophe: 27,
            space: 28,
            blank: 29,
        }
    }
}

impl LabelConfig {
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env_overrides("CTC_LABEL_");
        config
    }

    pub fn from_json_str(json: &str) -> Result<Self, LabelError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, LabelError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    fn apply_env_overrides(&mut self, prefix: &str) {
        let parse_env = |suffix: &str| std::env::var(format!("{prefix}{suffix}")).ok();
        let apply = |suffix: &str, target: &mut Label| {
            if let Some(v) = parse_env(suffix).and_then(|s| s.trim().parse().ok()) {
                *target = v;
            }
        };

        apply("APOSTROPHE", &mut self.apostrophe);
        apply("SPACE", &mut self.space);
        apply("BLANK", &mut self.blank);

        if let Some(v) = parse_env("ALPHABET_SIZE").and_then(|s| s.trim().parse().ok()) {
            self.alphabet_size = v;
        }
        if let Some(v) = parse_env("LETTER_COUNT").and_then(|s| s.trim().parse().ok()) {
            self.letter_count = v;
        }
    }

    pub fn validate(&self) -> Result<(), LabelError> {
        if self.letter_count > 26 {
            return Err(LabelError::InvalidConfig(format!(
                "letter_count {} exceeds the 26 lowercase letters",
                self.letter_count
            )));
        }

        let reserved = [
            ("apostrophe", self.apostrophe),
            ("space", self.space),
            ("blank", self.blank),
        ];
        for (name, label) in reserved {
            if label < 0 || label as usize >= self.alphabet_size {
                return Err(LabelError::InvalidConfig(format!(
                    "{name} label {label} is outside alphabet of size {}",
                    self.alphabet_size
                )));
            }
            if (label as usize) < self.letter_count {
                return Err(LabelError::InvalidConfig(format!(
                    "{name} label {label} collides with the letter range 0..{}",
                    self.letter_count
                )));
            }
        }

        if self.apostrophe == self.space
            || self.apostrophe == self.blank
            || self.space == self.blank
        {
            return Err(LabelError::InvalidConfig(
                "apostrophe, space and blank labels must be distinct".to_string(),
            ));
        }
        Ok(())
    }
}

/// What a label means to the scorer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Symbol {
    Blank,
    WordBoundary,
    Character(char),
}

/// Stateless label → symbol mapping for one validated [`LabelConfig`].
#[derive(Debug, Clone, Copy)]
pub struct LabelTranslator {
    config: LabelConfig,
}

impl LabelTranslator {
    pub fn new(config: LabelConfig) -> Result<Self, LabelError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &LabelConfig {
        &self.config
    }

    #[inline]
    pub fn is_blank(&self, label: Label) -> bool {
        label == self.config.blank
    }

    #[inline]
    pub fn is_space(&self, label: Label) -> bool {
        label == self.config.space
    }

    pub fn translate(&self, label: Label) -> Result<Symbol, LabelError> {
        if label == self.config.blank {
            return Ok(Symbol::Blank);
        }
        if label == self.config.space {
            return Ok(Symbol::WordBoundary);
        }
        if label == self.config.apostrophe {
            return Ok(Symbol::Character('\''));
        }
        if label >= 0 && (label as usize) < self.config.letter_count {
            return Ok(Symbol::Character(char::from(b'a' + label as u8)));
        }
        Err(LabelError::InvalidLabel {
            label,
            alphabet_size: self.config.alphabet_size,
        })
    }

    /// Inverse of [`translate`](Self::translate) for characters, used to build
    /// label paths from text.
    pub fn label_for(&self, c: char) -> Option<Label> {
        match c {
            '\'' => Some(self.config.apostrophe),
            ' ' => Some(self.config.space),
            'a'..='z' => {
                let offset = c as usize - 'a' as usize;
                (offset < self.config.letter_count).then_some(offset as Label)
            }
            _ => None,
        }
    }
}

impl Default for LabelTranslator {
    fn default() -> Self {
        Self {
            config: LabelConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(LabelConfig::default().validate().is_ok());
    }

    #[test]
    fn reserved_labels_must_be_distinct() {
        let config = LabelConfig {
            space: 29,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(LabelError::InvalidConfig(_))
        ));
    }

    #[test]
    fn reserved_label_cannot_overlap_letters() {
        let config = LabelConfig {
            apostrophe: 3,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn reserved_label_must_fit_alphabet() {
        let config = LabelConfig {
            alphabet_size: 29,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn translate_reserved_and_letters() {
        let t = LabelTranslator::default();
        assert_eq!(t.translate(29).unwrap(), Symbol::Blank);
        assert_eq!(t.translate(28).unwrap(), Symbol::WordBoundary);
        assert_eq!(t.translate(27).unwrap(), Symbol::Character('\''));
        assert_eq!(t.translate(0).unwrap(), Symbol::Character('a'));
        assert_eq!(t.translate(25).unwrap(), Symbol::Character('z'));
    }

    #[test]
    fn unused_and_out_of_range_labels_are_invalid() {
        let t = LabelTranslator::default();
        for label in [26, 30, 100, -1] {
            assert!(matches!(
                t.translate(label),
                Err(LabelError::InvalidLabel { .. })
            ));
        }
    }

    #[test]
    fn label_for_inverts_translate() {
        let t = LabelTranslator::default();
        for c in "abcxyz' ".chars() {
            let label = t.label_for(c).unwrap();
            let back = match t.translate(label).unwrap() {
                Symbol::Character(ch) => ch,
                Symbol::WordBoundary => ' ',
                Symbol::Blank => unreachable!(),
            };
            assert_eq!(back, c);
        }
        assert_eq!(t.label_for('A'), None);
    }

    #[test]
    fn config_from_json_fills_defaults() {
        let config = LabelConfig::from_json_str(r#"{"alphabet_size": 29, "apostrophe": 26, "space": 27, "blank": 28}"#)
            .unwrap();
        assert_eq!(config.letter_count, 26);
        assert_eq!(config.blank, 28);
    }
}
