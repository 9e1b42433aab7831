//! Validated interface locale codes.
//!
//! Unlike a closed language enum, any well-formed code is accepted here: the
//! translation engine decides at call time whether it can serve a target
//! language. Only `"en"` is special: it is the source language of the
//! catalog, and selecting it means "no translation needed".

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The distinguished "no translation needed" locale code.
pub const DEFAULT_LOCALE: &str = "en";

/// A validated locale code (e.g. `"en"`, `"fr"`, `"pt-br"`).
///
/// Codes are lowercased on parse: a primary subtag of 2–8 ASCII letters,
/// optionally followed by `-` and a region subtag of 2–8 letters or digits.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Locale(String);

impl Locale {
    /// Parse and validate a locale code.
    pub fn parse(code: &str) -> Result<Self> {
        let code = code.trim().to_ascii_lowercase();

        let (primary, region) = match code.split_once('-') {
            Some((primary, region)) => (primary, Some(region)),
            None => (code.as_str(), None),
        };

        if !(2..=8).contains(&primary.len()) || !primary.bytes().all(|b| b.is_ascii_lowercase()) {
            bail!("invalid locale code: '{}'", code);
        }
        if let Some(region) = region {
            if !(2..=8).contains(&region.len())
                || !region.bytes().all(|b| b.is_ascii_alphanumeric())
            {
                bail!("invalid locale region in: '{}'", code);
            }
        }

        Ok(Locale(code))
    }

    /// The source locale of the string catalog.
    pub fn default_locale() -> Self {
        Locale(DEFAULT_LOCALE.to_string())
    }

    /// Whether this locale needs no translation.
    pub fn is_default(&self) -> bool {
        self.0 == DEFAULT_LOCALE
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
