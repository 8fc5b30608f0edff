//! Display language for classification labels.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error returned when parsing an unsupported locale code.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unsupported locale: {0} (expected \"en\" or \"es\")")]
pub struct UnknownLocale(pub String);

/// Languages the labels are available in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    En,
    Es,
}

impl Locale {
    /// Locale code for configuration files.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::En => "en",
            Self::Es => "es",
        }
    }

    /// The label table for this locale.
    #[must_use]
    pub const fn labels(self) -> &'static Labels {
        match self {
            Self::En => &ENGLISH,
            Self::Es => &SPANISH,
        }
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Locale {
    type Err = UnknownLocale;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "en" => Ok(Self::En),
            "es" => Ok(Self::Es),
            _ => Err(UnknownLocale(s.to_string())),
        }
    }
}

/// Strings used to build diff and bus labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Labels {
    pub arrival_earlier: &'static str,
    pub arrival_later: &'static str,
    pub departure_earlier: &'static str,
    pub departure_later: &'static str,
    pub diff_separator: &'static str,
    pub bus_morning: &'static str,
    pub bus_afternoon: &'static str,
    pub bus_both: &'static str,
}

pub const ENGLISH: Labels = Labels {
    arrival_earlier: "arrival earlier",
    arrival_later: "arrival later",
    departure_earlier: "departure earlier",
    departure_later: "departure later",
    diff_separator: " • ",
    bus_morning: "morning",
    bus_afternoon: "afternoon",
    bus_both: "morning & afternoon",
};

pub const SPANISH: Labels = Labels {
    arrival_earlier: "Entrada antes",
    arrival_later: "Entrada después",
    departure_earlier: "Salida antes",
    departure_later: "Salida después",
    diff_separator: " • ",
    bus_morning: "mañana",
    bus_afternoon: "tarde",
    bus_both: "mañana y tarde",
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn locale_from_str() {
        assert_eq!("en".parse::<Locale>().unwrap(), Locale::En);
        assert_eq!(" ES ".parse::<Locale>().unwrap(), Locale::Es);
        assert!("fr".parse::<Locale>().is_err());
    }

    #[test]
    fn locale_serde_roundtrip() {
        let json = serde_json::to_string(&Locale::Es).unwrap();
        assert_eq!(json, "\"es\"");
        let parsed: Locale = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, Locale::Es);
    }

    #[test]
    fn default_locale_is_english() {
        assert_eq!(Locale::default().labels(), &ENGLISH);
    }
}
