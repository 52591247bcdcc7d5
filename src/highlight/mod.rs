// Regex-driven syntax highlighting to HTML

use crate::models::Language;
use once_cell::sync::Lazy;
use phf::phf_set;
use regex::Regex;

static PYTHON_KEYWORDS: phf::Set<&'static str> = phf_set! {
    "False", "None", "True", "and", "as", "assert", "async", "await", "break",
    "class", "continue", "def", "del", "elif", "else", "except", "finally",
    "for", "from", "global", "if", "import", "in", "is", "lambda", "nonlocal",
    "not", "or", "pass", "raise", "return", "try", "while", "with", "yield",
};

static PYTHON_BUILTINS: phf::Set<&'static str> = phf_set! {
    "abs", "all", "any", "bool", "dict", "enumerate", "filter", "float",
    "input", "int", "isinstance", "len", "list", "map", "max", "min", "open",
    "print", "range", "reversed", "round", "self", "set", "sorted", "str",
    "sum", "super", "tuple", "type", "zip",
};

static CPP_KEYWORDS: phf::Set<&'static str> = phf_set! {
    "break", "case", "catch", "class", "const", "constexpr", "continue",
    "default", "delete", "do", "else", "enum", "explicit", "false", "for",
    "friend", "goto", "if", "inline", "namespace", "new", "nullptr",
    "operator", "private", "protected", "public", "return", "sizeof",
    "static", "static_cast", "struct", "switch", "template", "this", "throw",
    "true", "try", "typedef", "typename", "using", "virtual", "while",
};

static CPP_TYPES: phf::Set<&'static str> = phf_set! {
    "auto", "bool", "char", "double", "float", "int", "long", "short",
    "signed", "size_t", "unsigned", "void", "wchar_t",
};

static PYTHON_TOKENS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r#"(?P<comment>#[^\n]*)"#,
        r#"|(?P<string>(?i:[rbfu]{0,2})(?s:""".*?"""|'''.*?''')"#,
        r#"|(?i:[rbfu]{0,2})"(?:[^"\\\n]|\\.)*"|(?i:[rbfu]{0,2})'(?:[^'\\\n]|\\.)*')"#,
        r#"|(?P<decorator>@[A-Za-z_][\w.]*)"#,
        r#"|(?P<word>[A-Za-z_]\w*)"#,
        r#"|(?P<number>0[xX][0-9a-fA-F_]+|0[bB][01_]+|0[oO][0-7_]+"#,
        r#"|(?:\d[\d_]*\.?[\d_]*|\.\d[\d_]*)(?:[eE][+-]?\d+)?[jJ]?)"#,
        r#"|(?P<operator>\*\*=?|//=?|<<=?|>>=?|->|[-+*/%@&|^~<>!=]=?)"#,
    ))
    .unwrap()
});

static CPP_TOKENS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r#"(?P<preproc>(?m:^[ \t]*#[^\n]*))"#,
        r#"|(?P<comment>//[^\n]*|(?s:/\*.*?\*/))"#,
        r#"|(?P<string>(?:u8|[uUL])?"(?:[^"\\\n]|\\.)*"|'(?:[^'\\\n]|\\.)*')"#,
        r#"|(?P<word>[A-Za-z_]\w*)"#,
        r#"|(?P<number>(?:0[xX][0-9a-fA-F']+|0[bB][01']+|(?:\d[\d']*\.?\d*|\.\d+)(?:[eE][+-]?\d+)?)[uUlLfF]*)"#,
        r#"|(?P<operator><<=?|>>=?|->|::|\+\+|--|&&|\|\||[-+*/%&|^~<>!=?]=?)"#,
    ))
    .unwrap()
});

/// Render `code` as highlighted HTML.
///
/// The markup follows the Pygments HTML formatter layout, so the classes
/// from [`stylesheet`] apply: `k` keyword, `kt` type, `s` string, `c`
/// comment, `m` number, `nf` function name, `o` operator, `cp`
/// preprocessor, `bp` builtin.
pub fn highlight_code(code: &str, language: Language) -> String {
    let body = match language {
        Language::Python => render(code, &PYTHON_TOKENS, classify_python),
        Language::Cpp => render(code, &CPP_TOKENS, classify_cpp),
    };
    let newline = if body.ends_with('\n') { "" } else { "\n" };
    format!(
        "<div class=\"highlight\"><pre><span></span>{}{}</pre></div>",
        body, newline
    )
}

/// Word class, and whether the next word names a function.
type Classifier = fn(&str, bool) -> (Option<&'static str>, bool);

fn classify_python(word: &str, naming: bool) -> (Option<&'static str>, bool) {
    if naming {
        return (Some("nf"), false);
    }
    if PYTHON_KEYWORDS.contains(word) {
        (Some("k"), matches!(word, "def" | "class"))
    } else if PYTHON_BUILTINS.contains(word) {
        (Some("bp"), false)
    } else {
        (None, false)
    }
}

fn classify_cpp(word: &str, _naming: bool) -> (Option<&'static str>, bool) {
    if CPP_KEYWORDS.contains(word) {
        (Some("k"), false)
    } else if CPP_TYPES.contains(word) {
        (Some("kt"), false)
    } else {
        (None, false)
    }
}

fn render(code: &str, tokens: &Regex, classify: Classifier) -> String {
    let mut out = String::with_capacity(code.len() * 2);
    let mut last = 0;
    let mut naming = false;

    for caps in tokens.captures_iter(code) {
        let Some(m) = caps.get(0) else {
            continue;
        };
        escape_into(&mut out, &code[last..m.start()]);
        last = m.end();

        let class = if caps.name("word").is_some() {
            let (class, next) = classify(m.as_str(), naming);
            naming = next;
            class
        } else {
            naming = false;
            if caps.name("comment").is_some() {
                Some("c")
            } else if caps.name("string").is_some() {
                Some("s")
            } else if caps.name("number").is_some() {
                Some("m")
            } else if caps.name("operator").is_some() {
                Some("o")
            } else if caps.name("preproc").is_some() {
                Some("cp")
            } else if caps.name("decorator").is_some() {
                Some("nd")
            } else {
                None
            }
        };

        match class {
            Some(class) => {
                out.push_str("<span class=\"");
                out.push_str(class);
                out.push_str("\">");
                escape_into(&mut out, m.as_str());
                out.push_str("</span>");
            }
            None => escape_into(&mut out, m.as_str()),
        }
    }

    escape_into(&mut out, &code[last..]);
    out
}

/// Append `text` with HTML special characters escaped.
pub fn escape_into(out: &mut String, text: &str) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
}

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    escape_into(&mut out, text);
    out
}

/// Monokai palette for the highlight classes.
pub fn stylesheet() -> &'static str {
    r#".highlight { background: #272822; color: #f8f8f2; padding: 1em; border-radius: 6px; overflow-x: auto; }
.highlight pre { margin: 0; line-height: 1.4; }
.highlight .k { color: #66d9ef; }
.highlight .kt { color: #66d9ef; }
.highlight .s { color: #e6db74; }
.highlight .c { color: #75715e; font-style: italic; }
.highlight .m { color: #ae81ff; }
.highlight .nf { color: #a6e22e; }
.highlight .nd { color: #a6e22e; }
.highlight .o { color: #f92672; }
.highlight .cp { color: #75715e; }
.highlight .bp { color: #f8f8f2; font-weight: bold; }
"#
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_python_tokens() {
        let html = highlight_code("def add(a, b):\n    return a + 1  # sum\n", Language::Python);
        assert!(html.starts_with("<div class=\"highlight\"><pre><span></span>"));
        assert!(html.ends_with("\n</pre></div>"));
        assert!(html.contains("<span class=\"k\">def</span> <span class=\"nf\">add</span>"));
        assert!(html.contains("<span class=\"k\">return</span>"));
        assert!(html.contains("<span class=\"o\">+</span>"));
        assert!(html.contains("<span class=\"m\">1</span>"));
        assert!(html.contains("<span class=\"c\"># sum</span>"));
    }

    #[test]
    fn test_python_strings_are_escaped() {
        let html = highlight_code("print(\"<b>\")\ns = '''a\n#b'''", Language::Python);
        assert!(html.contains("<span class=\"bp\">print</span>"));
        assert!(html.contains("<span class=\"s\">&quot;&lt;b&gt;&quot;</span>"));
        // the hash inside the triple-quoted string is not a comment
        assert!(html.contains("<span class=\"s\">&#39;&#39;&#39;a\n#b&#39;&#39;&#39;</span>"));
    }

    #[test]
    fn test_identifier_digits_are_not_numbers() {
        let html = highlight_code("x1 = 2", Language::Python);
        assert!(html.contains("x1 <span class=\"o\">=</span> <span class=\"m\">2</span>"));
    }

    #[test]
    fn test_cpp_tokens() {
        let code = "#include <iostream>\nint main() {\n    /* hi */ std::cout << 'c' << 3.5f; // done\n    return 0;\n}";
        let html = highlight_code(code, Language::Cpp);
        assert!(html.contains("<span class=\"cp\">#include &lt;iostream&gt;</span>"));
        assert!(html.contains("<span class=\"kt\">int</span> main"));
        assert!(html.contains("<span class=\"c\">/* hi */</span>"));
        assert!(html.contains("<span class=\"s\">&#39;c&#39;</span>"));
        assert!(html.contains("<span class=\"m\">3.5f</span>"));
        assert!(html.contains("<span class=\"c\">// done</span>"));
        assert!(html.contains("<span class=\"k\">return</span>"));
    }

    #[test]
    fn test_stylesheet_covers_classes() {
        let css = stylesheet();
        for class in ["k", "kt", "s", "c", "m", "nf", "o", "cp", "bp"] {
            assert!(css.contains(&format!(".highlight .{} ", class)), "missing {}", class);
        }
    }
}
