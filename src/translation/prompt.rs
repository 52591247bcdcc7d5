// Prompt construction and response cleanup for AI conversion

use crate::models::Direction;
use once_cell::sync::Lazy;
use regex::Regex;

static FENCE_OPEN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"```[^\n]*\n").unwrap());
static FENCE_CLOSE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"```\s*$").unwrap());

/// Build the conversion prompt sent to the model.
pub fn build_prompt(source_code: &str, direction: Direction) -> String {
    let source = direction.source.display_name();
    let target = direction.target.display_name();
    format!(
        "You are a professional code converter. Convert the following {source} code to {target}.
Follow these guidelines:
1. Maintain the exact same functionality
2. Use proper {target} conventions and best practices
3. Include necessary imports/headers
4. Handle edge cases and error conditions
5. Use appropriate data types and structures
6. Add comments for complex logic
7. Ensure proper memory management (for C++)
8. Follow the language's style guide

{source} code:
{source_code}

Provide only the converted code without any explanations or markdown formatting.
"
    )
}

/// Strip Markdown code fences the model may wrap its answer in.
pub fn clean_response(text: &str) -> String {
    let text = text.trim();
    let text = FENCE_OPEN_RE.replace_all(text, "");
    let text = FENCE_CLOSE_RE.replace(&text, "");
    text.trim().to_string()
}
