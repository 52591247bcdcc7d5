// Tokenizer for Python source, including INDENT/DEDENT synthesis

use super::SyntaxError;

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Name(String),
    Number(String),
    /// A string literal. `value` has escapes decoded (unless raw).
    Str { value: String, prefix: String },
    Op(&'static str),
    Newline,
    Indent,
    Dedent,
    Eof,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    /// 1-based line of the first character.
    pub line: usize,
    /// Byte span in the source.
    pub start: usize,
    pub end: usize,
}

impl Token {
    pub fn is_op(&self, op: &str) -> bool {
        matches!(&self.kind, TokenKind::Op(o) if *o == op)
    }

    pub fn is_keyword(&self, kw: &str) -> bool {
        matches!(&self.kind, TokenKind::Name(n) if n == kw)
    }
}

/// Operators, longest first so that the first prefix match wins.
const OPERATORS: &[&str] = &[
    "**=", "//=", ">>=", "<<=", "...", "->", ":=", "**", "//", "<<", ">>", "<=", ">=", "==", "!=",
    "+=", "-=", "*=", "/=", "%=", "&=", "|=", "^=", "@=", "+", "-", "*", "/", "%", "@", "&", "|",
    "^", "~", "<", ">", "(", ")", "[", "]", "{", "}", ",", ":", ".", ";", "=",
];

const TAB_SIZE: usize = 8;

/// Deepest bracket nesting accepted, as in CPython's tokenizer.
const MAX_BRACKET_DEPTH: usize = 200;

/// Deepest block indentation accepted, as in CPython's tokenizer.
const MAX_INDENT_LEVELS: usize = 100;

pub struct Lexer<'a> {
    src: &'a str,
    pos: usize,
    line: usize,
    tokens: Vec<Token>,
    indents: Vec<usize>,
    /// Open brackets with the line they were opened on.
    brackets: Vec<(char, usize)>,
    at_line_start: bool,
}

impl<'a> Lexer<'a> {
    pub fn new(src: &'a str) -> Self {
        Self {
            src,
            pos: 0,
            line: 1,
            tokens: Vec::new(),
            indents: vec![0],
            brackets: Vec::new(),
            at_line_start: true,
        }
    }

    pub fn tokenize(mut self) -> Result<Vec<Token>, SyntaxError> {
        while self.pos < self.src.len() {
            if self.at_line_start && self.brackets.is_empty() {
                self.at_line_start = false;
                if !self.handle_indentation()? {
                    continue;
                }
            }

            let Some(c) = self.peek() else { break };
            match c {
                ' ' | '\t' | '\x0c' | '\r' => {
                    self.bump();
                }
                '#' => self.skip_comment(),
                '\\' => {
                    self.bump();
                    match self.peek() {
                        Some('\n') => {
                            self.bump();
                            self.line += 1;
                        }
                        Some('\r') if self.peek_at(1) == Some('\n') => {
                            self.bump();
                            self.bump();
                            self.line += 1;
                        }
                        _ => {
                            return Err(self.error("unexpected character after line continuation character"))
                        }
                    }
                }
                '\n' => {
                    let start = self.pos;
                    self.bump();
                    if self.brackets.is_empty() {
                        self.push(TokenKind::Newline, start);
                        self.at_line_start = true;
                    }
                    self.line += 1;
                }
                '"' | '\'' => self.lex_string(String::new(), self.pos)?,
                c if c.is_ascii_digit() => self.lex_number(),
                '.' if self.peek_at(1).map_or(false, |n| n.is_ascii_digit()) => self.lex_number(),
                c if c == '_' || c.is_alphabetic() => self.lex_name()?,
                _ => self.lex_operator()?,
            }
        }

        if let Some((open, line)) = self.brackets.last() {
            return Err(SyntaxError::new(format!("'{}' was never closed", open), *line));
        }

        let end = self.src.len();
        if self
            .tokens
            .last()
            .map_or(false, |t| t.kind != TokenKind::Newline)
        {
            self.push(TokenKind::Newline, end);
        }
        while self.indents.len() > 1 {
            self.indents.pop();
            self.push(TokenKind::Dedent, end);
        }
        self.push(TokenKind::Eof, end);
        Ok(self.tokens)
    }

    /// Measures the indentation of a logical line start. Returns `false` when
    /// the line is blank or comment-only and was consumed entirely.
    fn handle_indentation(&mut self) -> Result<bool, SyntaxError> {
        let mut width = 0;
        while let Some(c) = self.peek() {
            match c {
                ' ' => width += 1,
                '\t' => width = (width / TAB_SIZE + 1) * TAB_SIZE,
                '\x0c' => width = 0,
                _ => break,
            }
            self.bump();
        }

        match self.peek() {
            None => return Ok(false),
            Some('\n') | Some('\r') => {
                if self.peek() == Some('\r') {
                    self.bump();
                }
                if self.peek() == Some('\n') {
                    self.bump();
                }
                self.line += 1;
                self.at_line_start = true;
                return Ok(false);
            }
            Some('#') => {
                self.skip_comment();
                if self.peek() == Some('\n') {
                    self.bump();
                    self.line += 1;
                }
                self.at_line_start = true;
                return Ok(false);
            }
            _ => {}
        }

        let current = *self.indents.last().unwrap_or(&0);
        if width > current {
            if self.indents.len() > MAX_INDENT_LEVELS {
                return Err(self.error("too many levels of indentation"));
            }
            self.indents.push(width);
            self.push(TokenKind::Indent, self.pos);
        } else if width < current {
            while self.indents.last().map_or(false, |&w| w > width) {
                self.indents.pop();
                self.push(TokenKind::Dedent, self.pos);
            }
            if self.indents.last() != Some(&width) {
                return Err(self.error("unindent does not match any outer indentation level"));
            }
        }
        Ok(true)
    }

    fn lex_name(&mut self) -> Result<(), SyntaxError> {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c == '_' || c.is_alphanumeric() {
                self.bump();
            } else {
                break;
            }
        }
        let word = &self.src[start..self.pos];
        if matches!(self.peek(), Some('"') | Some('\'')) && is_string_prefix(word) {
            return self.lex_string(word.to_string(), start);
        }
        self.push(TokenKind::Name(word.to_string()), start);
        Ok(())
    }

    fn lex_number(&mut self) {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c.is_ascii_alphanumeric() || c == '_' || c == '.' {
                self.bump();
                let is_hex = self.src[start..].starts_with("0x") || self.src[start..].starts_with("0X");
                if (c == 'e' || c == 'E') && !is_hex && matches!(self.peek(), Some('+') | Some('-')) {
                    self.bump();
                }
            } else {
                break;
            }
        }
        let text = self.src[start..self.pos].to_string();
        self.push(TokenKind::Number(text), start);
    }

    fn lex_string(&mut self, prefix: String, start: usize) -> Result<(), SyntaxError> {
        let start_line = self.line;
        let quote = self.bump().unwrap_or('"');
        let triple = self.peek() == Some(quote) && self.peek_at(1) == Some(quote);
        if triple {
            self.bump();
            self.bump();
        }
        let raw = prefix.to_ascii_lowercase().contains('r');
        let mut value = String::new();

        loop {
            let Some(c) = self.bump() else {
                let msg = if triple {
                    "unterminated triple-quoted string literal"
                } else {
                    "unterminated string literal"
                };
                return Err(SyntaxError::new(msg, start_line));
            };
            match c {
                '\\' => {
                    let Some(next) = self.bump() else { continue };
                    if next == '\n' {
                        self.line += 1;
                        if raw {
                            value.push('\\');
                            value.push('\n');
                        }
                        continue;
                    }
                    if raw {
                        value.push('\\');
                        value.push(next);
                    } else {
                        value.push_str(&decode_escape(next));
                    }
                }
                '\n' if !triple => {
                    return Err(SyntaxError::new("unterminated string literal", start_line));
                }
                '\n' => {
                    self.line += 1;
                    value.push('\n');
                }
                c if c == quote => {
                    if !triple {
                        break;
                    }
                    if self.peek() == Some(quote) && self.peek_at(1) == Some(quote) {
                        self.bump();
                        self.bump();
                        break;
                    }
                    value.push(c);
                }
                c => value.push(c),
            }
        }

        let token = Token {
            kind: TokenKind::Str { value, prefix },
            line: start_line,
            start,
            end: self.pos,
        };
        self.tokens.push(token);
        Ok(())
    }

    fn lex_operator(&mut self) -> Result<(), SyntaxError> {
        let start = self.pos;
        let rest = &self.src[start..];
        let Some(op) = OPERATORS.iter().copied().find(|op| rest.starts_with(op)) else {
            let c = self.peek().unwrap_or('?');
            return Err(self.error(&format!("invalid character '{}'", c)));
        };
        self.pos += op.len();

        match op {
            "(" | "[" | "{" => {
                if self.brackets.len() >= MAX_BRACKET_DEPTH {
                    return Err(self.error("too many nested parentheses"));
                }
                let open = op.chars().next().unwrap_or('(');
                self.brackets.push((open, self.line));
            }
            ")" | "]" | "}" => {
                let close = op.chars().next().unwrap_or(')');
                match self.brackets.pop() {
                    None => return Err(self.error(&format!("unmatched '{}'", close))),
                    Some((open, _)) if matching_close(open) != close => {
                        return Err(self.error(&format!(
                            "closing parenthesis '{}' does not match opening parenthesis '{}'",
                            close, open
                        )));
                    }
                    Some(_) => {}
                }
            }
            _ => {}
        }

        self.push(TokenKind::Op(op), start);
        Ok(())
    }

    fn skip_comment(&mut self) {
        while let Some(c) = self.peek() {
            if c == '\n' {
                break;
            }
            self.bump();
        }
    }

    fn push(&mut self, kind: TokenKind, start: usize) {
        self.tokens.push(Token {
            kind,
            line: self.line,
            start,
            end: self.pos.max(start),
        });
    }

    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn peek_at(&self, n: usize) -> Option<char> {
        self.src[self.pos..].chars().nth(n)
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn error(&self, message: &str) -> SyntaxError {
        SyntaxError::new(message, self.line)
    }
}

fn is_string_prefix(word: &str) -> bool {
    matches!(
        word.to_ascii_lowercase().as_str(),
        "r" | "u" | "b" | "f" | "br" | "rb" | "fr" | "rf"
    )
}

fn matching_close(open: char) -> char {
    match open {
        '(' => ')',
        '[' => ']',
        _ => '}',
    }
}

fn decode_escape(c: char) -> String {
    match c {
        'n' => "\n".to_string(),
        't' => "\t".to_string(),
        'r' => "\r".to_string(),
        '0' => "\0".to_string(),
        '\\' => "\\".to_string(),
        '\'' => "'".to_string(),
        '"' => "\"".to_string(),
        other => format!("\\{}", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        Lexer::new(src)
            .tokenize()
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn test_indent_and_dedent() {
        let toks = kinds("if x:\n    y = 1\nz = 2\n");
        assert!(toks.contains(&TokenKind::Indent));
        assert!(toks.contains(&TokenKind::Dedent));
        assert_eq!(toks.last(), Some(&TokenKind::Eof));
    }

    #[test]
    fn test_blank_and_comment_lines_ignored() {
        let toks = kinds("x = 1\n\n    # indented comment\ny = 2");
        assert!(!toks.contains(&TokenKind::Indent));
        let newlines = toks.iter().filter(|t| **t == TokenKind::Newline).count();
        assert_eq!(newlines, 2);
    }

    #[test]
    fn test_implicit_line_joining() {
        let toks = kinds("f(1,\n  2)\n");
        let newlines = toks.iter().filter(|t| **t == TokenKind::Newline).count();
        assert_eq!(newlines, 1);
        assert!(!toks.contains(&TokenKind::Indent));
    }

    #[test]
    fn test_string_literals() {
        let toks = kinds(r#"s = 'a\nb' + r"\d" + """x"y""""#);
        assert!(toks.contains(&TokenKind::Str {
            value: "a\nb".to_string(),
            prefix: String::new()
        }));
        assert!(toks.contains(&TokenKind::Str {
            value: "\\d".to_string(),
            prefix: "r".to_string()
        }));
        assert!(toks.contains(&TokenKind::Str {
            value: "x\"y".to_string(),
            prefix: String::new()
        }));
    }

    #[test]
    fn test_longest_operator_match() {
        let toks = kinds("x **= 2 // 3\n");
        assert!(toks.contains(&TokenKind::Op("**=")));
        assert!(toks.contains(&TokenKind::Op("//")));
    }

    #[test]
    fn test_scientific_number() {
        let toks = kinds("x = 1.5e-3\n");
        assert!(toks.contains(&TokenKind::Number("1.5e-3".to_string())));
    }

    #[test]
    fn test_unterminated_string() {
        let err = Lexer::new("x = 'abc\n").tokenize().unwrap_err();
        assert_eq!(err.message, "unterminated string literal");
        assert_eq!(err.line, 1);
    }

    #[test]
    fn test_unclosed_bracket() {
        let err = Lexer::new("x = (1,\n2\n").tokenize().unwrap_err();
        assert_eq!(err.message, "'(' was never closed");
        assert_eq!(err.line, 1);
    }

    #[test]
    fn test_mismatched_bracket() {
        let err = Lexer::new("x = [1)\n").tokenize().unwrap_err();
        assert!(err.message.contains("does not match"));
    }

    #[test]
    fn test_bad_dedent() {
        let err = Lexer::new("if x:\n        y\n    z\n").tokenize().unwrap_err();
        assert_eq!(err.message, "unindent does not match any outer indentation level");
        assert_eq!(err.line, 3);
    }

    #[test]
    fn test_bracket_nesting_limit() {
        let deep = format!("x = {}1{}\n", "(".repeat(10_000), ")".repeat(10_000));
        let err = Lexer::new(&deep).tokenize().unwrap_err();
        assert_eq!(err.message, "too many nested parentheses");
        assert_eq!(err.line, 1);

        let ok = format!("x = {}1{}\n", "[".repeat(MAX_BRACKET_DEPTH), "]".repeat(MAX_BRACKET_DEPTH));
        assert!(Lexer::new(&ok).tokenize().is_ok());
    }

    #[test]
    fn test_indentation_limit() {
        let mut src = String::new();
        for level in 0..=MAX_INDENT_LEVELS {
            src.push_str(&" ".repeat(level));
            src.push_str("if x:\n");
        }
        src.push_str(&" ".repeat(MAX_INDENT_LEVELS + 1));
        src.push_str("pass\n");
        let err = Lexer::new(&src).tokenize().unwrap_err();
        assert_eq!(err.message, "too many levels of indentation");
    }

    #[test]
    fn test_invalid_character() {
        let err = Lexer::new("x = $\n").tokenize().unwrap_err();
        assert_eq!(err.message, "invalid character '$'");
    }
}
