use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Languages a post can be labelled with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    /// Pure English.
    English,
    /// Hindi mixed with English.
    MixHindi,
}

impl Language {
    /// Every recognized label, in display form.
    pub const LABELS: [&'static str; 2] = ["english", "mixhindi"];
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::English => write!(f, "english"),
            Self::MixHindi => write!(f, "mixhindi"),
        }
    }
}

/// Error returned for a label outside the vocabulary.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error(
    "unrecognized language label '{0}' (expected one of: {})",
    Language::LABELS.join(", ")
)]
pub struct UnknownLanguage(pub String);

impl FromStr for Language {
    type Err = UnknownLanguage;

    /// Parses a model-provided label, ignoring case and surrounding whitespace.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "english" => Ok(Self::English),
            "mixhindi" => Ok(Self::MixHindi),
            _ => Err(UnknownLanguage(s.to_string())),
        }
    }
}
