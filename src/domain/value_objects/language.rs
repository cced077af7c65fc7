//! Site languages and localized text.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A language the site is published in.
///
/// Ukrainian is the primary language; every localized value falls back to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    Uk,
    En,
    Pl,
}

impl Language {
    pub const ALL: [Language; 3] = [Language::Uk, Language::En, Language::Pl];

    /// Parse a language code. Accepts `ua` as an alias of `uk` and
    /// region-qualified codes such as `en-US`.
    pub fn parse(code: &str) -> Option<Self> {
        let primary = code
            .trim()
            .split(['-', '_'])
            .next()
            .unwrap_or_default()
            .to_ascii_lowercase();

        match primary.as_str() {
            "uk" | "ua" => Some(Self::Uk),
            "en" => Some(Self::En),
            "pl" => Some(Self::Pl),
            _ => None,
        }
    }

    /// Parse a language code, defaulting to Ukrainian.
    pub fn from_code_or_default(code: Option<&str>) -> Self {
        code.and_then(Self::parse).unwrap_or_default()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Uk => "uk",
            Self::En => "en",
            Self::Pl => "pl",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A value stored once per language.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalizedText {
    #[serde(default)]
    pub uk: String,
    #[serde(default)]
    pub en: String,
    #[serde(default)]
    pub pl: String,
}

impl LocalizedText {
    pub fn new(uk: impl Into<String>, en: impl Into<String>, pl: impl Into<String>) -> Self {
        Self {
            uk: uk.into(),
            en: en.into(),
            pl: pl.into(),
        }
    }

    /// Raw value for a language, possibly empty.
    pub fn raw(&self, lang: Language) -> &str {
        match lang {
            Language::Uk => &self.uk,
            Language::En => &self.en,
            Language::Pl => &self.pl,
        }
    }

    /// Value for a language, falling back to Ukrainian when the
    /// translation is blank.
    pub fn get(&self, lang: Language) -> &str {
        let value = self.raw(lang);
        if value.trim().is_empty() {
            &self.uk
        } else {
            value
        }
    }

    pub fn is_empty(&self) -> bool {
        Language::ALL.iter().all(|l| self.raw(*l).trim().is_empty())
    }
}
