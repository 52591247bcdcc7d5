// Output formatting for converted code

use crate::models::Language;

const INDENT: &str = "    ";

/// Normalize converted code for display.
///
/// Python is only trimmed. C++ is re-indented by brace depth: a line
/// starting with `}` dedents before it is emitted and a line ending with `{`
/// indents the lines after it. Blank lines are kept, emptied.
pub fn format_code(code: &str, language: Language) -> String {
    match language {
        Language::Python => code.trim().to_string(),
        Language::Cpp => format_braces(code),
    }
}

fn format_braces(code: &str) -> String {
    let mut depth = 0usize;
    let mut out = Vec::new();

    for line in code.split('\n') {
        let line = line.trim();
        if line.is_empty() {
            out.push(String::new());
            continue;
        }
        if line.starts_with('}') {
            depth = depth.saturating_sub(1);
        }
        out.push(format!("{}{}", INDENT.repeat(depth), line));
        if line.ends_with('{') {
            depth += 1;
        }
    }

    out.join("\n")
}
