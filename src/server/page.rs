// Server-rendered HTML page for the converter form

use crate::highlight::{escape_html, stylesheet};
use crate::models::{ConversionOutcome, Language};
use std::fmt::Write;

const DESCRIPTION: &str = "Convert your code between Python and C++ with professional-grade \
accuracy. This tool provides both basic and AI-enhanced conversion capabilities, ensuring \
high-quality output that maintains functionality and follows best practices.";

const MISSING_KEY_WARNING: &str = "Google API key not found. Please set GOOGLE_API_KEY in your \
environment or config file for enhanced conversion.";

const INFO_SECTIONS: &str = r#"<hr>
<h3>Features and Best Practices:</h3>
<ol>
  <li><strong>Code Validation</strong>: Ensures input code is syntactically correct</li>
  <li><strong>AI Enhancement</strong>: Uses Gemini AI for context-aware conversion</li>
  <li><strong>Syntax Highlighting</strong>: Makes code more readable</li>
  <li><strong>Proper Formatting</strong>: Maintains consistent code style</li>
  <li><strong>Error Handling</strong>: Graceful fallback if AI conversion fails</li>
</ol>
<h3>Setting up AI Enhancement:</h3>
<ol>
  <li>Get a Google API key from <a href="https://makersuite.google.com/app/apikey">Google AI Studio</a></li>
  <li>Export it in the server environment or add it to <code>convertifier.toml</code> under <code>[gemini]</code></li>
  <li>Add your API key: <code>GOOGLE_API_KEY=your_api_key_here</code></li>
</ol>
<h3>Tips for Best Results:</h3>
<ol>
  <li>Write clean, well-formatted input code</li>
  <li>Use AI enhancement for complex code structures</li>
  <li>Review the converted code for accuracy</li>
  <li>Test the converted code before using in production</li>
</ol>"#;

const PAGE_CSS: &str = r#"body { font-family: -apple-system, "Segoe UI", Roboto, sans-serif; margin: 2rem auto; max-width: 1200px; padding: 0 1rem; color: #262730; }
.columns { display: flex; gap: 2rem; flex-wrap: wrap; }
.columns > section { flex: 1 1 480px; min-width: 0; }
textarea { width: 100%; height: 300px; font-family: 'Consolas', monospace; box-sizing: border-box; }
select, button { font-size: 1rem; margin: 0.5rem 0; }
button { background: #ff4b4b; color: white; border: none; border-radius: 0.5rem; padding: 0.5rem 1.5rem; cursor: pointer; }
.code-output { background-color: #f0f2f6; padding: 1rem; border-radius: 0.5rem; margin: 1rem 0; overflow-x: auto; }
.error-message { color: #ff4b4b; padding: 1rem; border-radius: 0.5rem; background-color: #ffebee; margin: 1rem 0; }
.success-message { color: #00acb5; padding: 1rem; border-radius: 0.5rem; background-color: #e0f7fa; margin: 1rem 0; }
.warning-message { color: #926c05; padding: 1rem; border-radius: 0.5rem; background-color: #fffbe6; margin: 1rem 0; }
"#;

/// Everything the page shows for one request.
#[derive(Debug, Default)]
pub struct PageView {
    pub source_language: Option<Language>,
    pub code: String,
    pub use_ai: bool,
    pub ai_available: bool,
    pub outcome: Option<ConversionOutcome>,
    pub error: Option<String>,
}

impl PageView {
    pub fn blank(ai_available: bool) -> Self {
        Self {
            ai_available,
            ..Self::default()
        }
    }
}

pub fn render(view: &PageView) -> String {
    let mut html = String::with_capacity(8 * 1024);
    let selected = view.source_language.unwrap_or(Language::Python);

    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n");
    html.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n");
    html.push_str("<title>Convertifier</title>\n<style>\n");
    html.push_str(PAGE_CSS);
    html.push_str(stylesheet());
    html.push_str("</style>\n</head>\n<body>\n<h1>&#x1F504; Convertifier</h1>\n");
    let _ = writeln!(html, "<p>{}</p>", DESCRIPTION);

    if !view.ai_available {
        banner(&mut html, "warning-message", MISSING_KEY_WARNING);
    }

    html.push_str("<div class=\"columns\">\n<section>\n<h3>Input Code</h3>\n");
    html.push_str("<form method=\"post\" action=\"/convert\">\n");
    html.push_str("<label for=\"source_language\">Select source language</label><br>\n");
    html.push_str("<select id=\"source_language\" name=\"source_language\">\n");
    for language in Language::all() {
        let _ = writeln!(
            html,
            "<option value=\"{}\"{}>{}</option>",
            language.code_tag(),
            if language == selected { " selected" } else { "" },
            escape_html(language.display_name())
        );
    }
    html.push_str("</select><br>\n");
    html.push_str("<label for=\"code\">Enter your code here</label>\n");
    let _ = writeln!(
        html,
        "<textarea id=\"code\" name=\"code\" placeholder=\"Enter your code here...\" \
         title=\"Enter valid code in the selected language. The converter will maintain \
         functionality while following best practices.\">{}</textarea>",
        escape_html(&view.code)
    );
    let _ = writeln!(
        html,
        "<label title=\"Enable AI-powered conversion for more accurate and context-aware results\">\
         <input type=\"checkbox\" name=\"use_ai\" value=\"on\"{}> \
         Use AI Enhancement (requires Google API key)</label><br>",
        if view.use_ai { " checked" } else { "" }
    );
    html.push_str("<button type=\"submit\">Convert</button>\n</form>\n</section>\n");

    html.push_str("<section>\n");
    if let Some(error) = &view.error {
        banner(&mut html, "error-message", error);
    }
    if let Some(outcome) = &view.outcome {
        render_outcome(&mut html, outcome);
    }
    html.push_str("</section>\n</div>\n");

    html.push_str(INFO_SECTIONS);
    html.push_str("\n</body>\n</html>\n");
    html
}

fn render_outcome(html: &mut String, outcome: &ConversionOutcome) {
    if let Some(warning) = &outcome.warning {
        banner(html, "warning-message", warning);
    }
    banner(html, "success-message", &outcome.message);

    let _ = writeln!(
        html,
        "<h3>Converted {} Code</h3>\n<div class=\"code-output\"><pre><code class=\"language-{}\">{}</code></pre></div>",
        escape_html(outcome.target_language.display_name()),
        outcome.target_language.code_tag(),
        escape_html(&outcome.code)
    );
    let _ = writeln!(
        html,
        "<h3>Syntax Highlighted Version</h3>\n<div class=\"code-output\">{}</div>",
        outcome.highlighted_html
    );
}

fn banner(html: &mut String, class: &str, text: &str) {
    let _ = writeln!(html, "<div class=\"{}\">{}</div>", class, escape_html(text));
}
