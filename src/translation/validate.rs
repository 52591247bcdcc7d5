// Input validation for both source languages

use super::python;
use crate::error::{ConvertError, Result};
use crate::models::{Language, Validation};
use tracing::error;

/// Elements a C++ snippet must contain, checked in order.
const CPP_REQUIRED: [char; 3] = [';', '{', '}'];

pub const EMPTY_INPUT_MESSAGE: &str = "Please enter some code to convert";

/// Reject blank input before any validation or conversion.
pub fn ensure_not_empty(code: &str) -> Result<()> {
    if code.trim().is_empty() {
        return Err(ConvertError::InvalidRequest(EMPTY_INPUT_MESSAGE.to_string()));
    }
    Ok(())
}

pub fn validate(code: &str, language: Language) -> Validation {
    match language {
        Language::Python => validate_python(code),
        Language::Cpp => validate_cpp(code),
    }
}

/// Python input must parse under the supported grammar.
pub fn validate_python(code: &str) -> Validation {
    match python::parse(code) {
        Ok(_) => Validation::ok("Valid Python code"),
        Err(e) => {
            error!("Invalid Python code: {}", e);
            Validation::invalid(format!("Invalid Python code: {}", e))
        }
    }
}

/// C++ input only has to contain a statement terminator and a braced block.
pub fn validate_cpp(code: &str) -> Validation {
    for element in CPP_REQUIRED {
        if !code.contains(element) {
            error!("Invalid C++ code: Missing {}", element);
            return Validation::invalid(format!(
                "Invalid C++ code: Missing required element '{}'",
                element
            ));
        }
    }
    Validation::ok("Valid C++ code")
}
