// Python subset front end: tokenizer, syntax tree and parser

pub mod ast;
pub mod lexer;
mod parser;

use std::fmt;

/// A Python syntax error with a 1-based line number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxError {
    pub message: String,
    pub line: usize,
}

impl SyntaxError {
    pub fn new(message: impl Into<String>, line: usize) -> Self {
        Self {
            message: message.into(),
            line,
        }
    }
}

impl fmt::Display for SyntaxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (line {})", self.message, self.line)
    }
}

impl std::error::Error for SyntaxError {}

/// Parse Python source into a [`ast::Module`].
pub fn parse(src: &str) -> Result<ast::Module, SyntaxError> {
    parser::parse_module(src)
}
