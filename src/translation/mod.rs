//! Local code translation between Python and C++.
//!
//! - `python`: tokenizer and parser for the supported Python subset.
//! - `py_to_cpp` / `cpp_to_py`: the basic (non-AI) converters.
//! - `format`: display formatting of converted code.
//! - `validate`: input checks run before any conversion.
//! - `prompt`: prompt text and answer cleanup for AI conversion.

pub mod cpp_to_py;
pub mod format;
pub mod prompt;
pub mod py_to_cpp;
pub mod python;
pub mod validate;

pub use cpp_to_py::cpp_to_python;
pub use format::format_code;
pub use prompt::{build_prompt, clean_response};
pub use py_to_cpp::python_to_cpp;
pub use validate::{ensure_not_empty, validate, validate_cpp, validate_python};

use crate::error::Result;
use crate::models::{Direction, Language};

/// Run the basic converter for `direction`, without formatting.
pub fn basic_convert(code: &str, direction: Direction) -> Result<String> {
    match direction.source {
        Language::Python => python_to_cpp(code),
        Language::Cpp => Ok(cpp_to_python(code)),
    }
}
