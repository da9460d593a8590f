//! Random identifier generator with a regex validator.

use rand::Rng;
use regex::Regex;

use crate::types::{StoreError, StoreResult};

use super::UidValidator;

/// Default identifier alphabet.
pub const DEFAULT_CHARS: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Default identifier format: 32 random characters.
pub const DEFAULT_FORMAT: &str = "XXXXXXXXXXXXXXXXXXXXXXXXXXXXXXXX";

/// Default validator pattern matching [`DEFAULT_FORMAT`] over [`DEFAULT_CHARS`].
pub const DEFAULT_VALIDATOR: &str = "^[A-Z0-9]{32}$";

/// Placeholder in a format string replaced by a random alphabet character.
const PLACEHOLDER: char = 'X';

/// Generates fresh identifiers and validates candidates.
///
/// Every `X` in the format is replaced by a random character from the
/// alphabet; any other character is copied as-is. Validation trims surrounding
/// whitespace and requires the whole candidate to match the validator.
#[derive(Debug, Clone)]
pub struct UidGenerator {
    alphabet: Vec<char>,
    format: String,
    validator: Regex,
}

impl UidGenerator {
    /// Build a generator, rejecting configurations that could mint unusable ids.
    pub fn new(chars: &str, format: &str, validator: &str) -> StoreResult<Self> {
        let alphabet: Vec<char> = chars.chars().collect();
        if alphabet.is_empty() {
            return Err(StoreError::Config("uid alphabet is empty".to_string()));
        }
        if !format.contains(PLACEHOLDER) {
            return Err(StoreError::Config(format!(
                "uid format {format:?} has no '{PLACEHOLDER}' placeholder"
            )));
        }
        if chars.contains(is_separator) || format.contains(is_separator) {
            return Err(StoreError::Config(
                "uid alphabet and format must not contain path separators".to_string(),
            ));
        }

        // Anchor the pattern so that a match always covers the whole candidate.
        let anchored = format!("^(?:{validator})$");
        let validator = Regex::new(&anchored)
            .map_err(|e| StoreError::Config(format!("invalid uid validator: {e}")))?;

        let generator = Self {
            alphabet,
            format: format.to_string(),
            validator,
        };

        let sample = generator.new_uid();
        if generator.validate(&sample).is_err() {
            return Err(StoreError::Config(format!(
                "uid format {format:?} produces ids rejected by the validator (e.g. {sample:?})"
            )));
        }

        Ok(generator)
    }

    /// Produce a fresh identifier. Always passes [`UidValidator::validate`].
    pub fn new_uid(&self) -> String {
        let mut rng = rand::thread_rng();
        self.format
            .chars()
            .map(|c| {
                if c == PLACEHOLDER {
                    self.alphabet[rng.gen_range(0..self.alphabet.len())]
                } else {
                    c
                }
            })
            .collect()
    }

    /// The id format string.
    pub fn format(&self) -> &str {
        &self.format
    }
}

impl Default for UidGenerator {
    fn default() -> Self {
        Self {
            alphabet: DEFAULT_CHARS.chars().collect(),
            format: DEFAULT_FORMAT.to_string(),
            validator: Regex::new(DEFAULT_VALIDATOR).expect("default validator pattern compiles"),
        }
    }
}

impl UidValidator for UidGenerator {
    fn validate(&self, candidate: &str) -> StoreResult<String> {
        let trimmed = candidate.trim();
        if self.validator.is_match(trimmed) {
            Ok(trimmed.to_string())
        } else {
            Err(StoreError::InvalidId(candidate.to_string()))
        }
    }
}

fn is_separator(c: char) -> bool {
    c == '/' || c == '\\'
}
