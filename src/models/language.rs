// Source/target language identifiers

use crate::error::{ConvertError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A language the converter understands.
///
/// Serializes as its code tag; deserializes from any spelling `FromStr` accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub enum Language {
    #[serde(rename = "python")]
    Python,
    #[serde(rename = "cpp")]
    Cpp,
}

impl Language {
    /// Human-readable name, used in prompts and the UI.
    pub fn display_name(&self) -> &'static str {
        match self {
            Language::Python => "Python",
            Language::Cpp => "C++",
        }
    }

    /// Short tag used for code blocks and highlighting.
    pub fn code_tag(&self) -> &'static str {
        match self {
            Language::Python => "python",
            Language::Cpp => "cpp",
        }
    }

    /// The conversion target for this source language.
    pub fn other(&self) -> Language {
        match self {
            Language::Python => Language::Cpp,
            Language::Cpp => Language::Python,
        }
    }

    pub fn all() -> [Language; 2] {
        [Language::Python, Language::Cpp]
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

fn parse_language(s: &str) -> std::result::Result<Language, String> {
    match s.trim().to_ascii_lowercase().as_str() {
        "python" | "py" => Ok(Language::Python),
        "c++" | "cpp" | "cxx" => Ok(Language::Cpp),
        other => Err(format!(
            "Unsupported language: '{}'. Supported languages: Python, C++",
            other
        )),
    }
}

impl FromStr for Language {
    type Err = ConvertError;

    fn from_str(s: &str) -> Result<Self> {
        parse_language(s).map_err(ConvertError::InvalidRequest)
    }
}

impl TryFrom<String> for Language {
    type Error = String;

    fn try_from(s: String) -> std::result::Result<Self, Self::Error> {
        parse_language(&s)
    }
}

/// A conversion direction, always between the two supported languages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Direction {
    pub source: Language,
    pub target: Language,
}

impl Direction {
    pub fn from_source(source: Language) -> Self {
        Self {
            source,
            target: source.other(),
        }
    }

    /// Metrics/log label, e.g. `python_to_cpp`.
    pub fn label(&self) -> &'static str {
        match self.source {
            Language::Python => "python_to_cpp",
            Language::Cpp => "cpp_to_python",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.source, self.target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_aliases() {
        assert_eq!("Python".parse::<Language>().unwrap(), Language::Python);
        assert_eq!("py".parse::<Language>().unwrap(), Language::Python);
        assert_eq!("C++".parse::<Language>().unwrap(), Language::Cpp);
        assert_eq!(" cpp ".parse::<Language>().unwrap(), Language::Cpp);
        assert!("rust".parse::<Language>().is_err());
    }

    #[test]
    fn test_direction() {
        let d = Direction::from_source(Language::Cpp);
        assert_eq!(d.target, Language::Python);
        assert_eq!(d.label(), "cpp_to_python");
        assert_eq!(d.to_string(), "C++ -> Python");
    }

    #[test]
    fn test_serde_names() {
        assert_eq!(serde_json::to_string(&Language::Cpp).unwrap(), "\"cpp\"");
        assert_eq!(serde_json::to_string(&Language::Python).unwrap(), "\"python\"");
        let lang: Language = serde_json::from_str("\"C++\"").unwrap();
        assert_eq!(lang, Language::Cpp);
    }

    #[test]
    fn test_deserialize_ignores_case() {
        for (raw, expected) in [
            ("\"Cpp\"", Language::Cpp),
            ("\"CXX\"", Language::Cpp),
            ("\"PYTHON\"", Language::Python),
            ("\" Py \"", Language::Python),
        ] {
            assert_eq!(serde_json::from_str::<Language>(raw).unwrap(), expected);
        }

        let err = serde_json::from_str::<Language>("\"rust\"").unwrap_err();
        assert!(err.to_string().contains("Unsupported language: 'rust'"));
    }
}
