// Recursive-descent parser for the supported Python subset

use super::ast::*;
use super::lexer::{Lexer, Token, TokenKind};
use super::SyntaxError;

const KEYWORDS: &[&str] = &[
    "False", "None", "True", "and", "as", "assert", "async", "await", "break", "class", "continue",
    "def", "del", "elif", "else", "except", "finally", "for", "from", "global", "if", "import",
    "in", "is", "lambda", "nonlocal", "not", "or", "pass", "raise", "return", "try", "while",
    "with", "yield",
];

type PResult<T> = Result<T, SyntaxError>;

/// Deepest expression nesting the recursive descent will follow.
const MAX_EXPR_DEPTH: usize = 40;

/// Deepest syntax tree accepted, counting operator chains and `elif` ladders
/// that the parser builds iteratively but later passes walk recursively.
const MAX_TREE_DEPTH: usize = 500;

/// Parse a whole module.
pub fn parse_module(src: &str) -> PResult<Module> {
    let tokens = Lexer::new(src).tokenize()?;
    Parser::new(src, tokens).parse_module()
}

/// Parse a single expression (used for f-string replacement fields).
pub fn parse_expression(src: &str) -> PResult<Expr> {
    parse_nested_expression(src, 0)
}

fn parse_nested_expression(src: &str, depth: usize) -> PResult<Expr> {
    let tokens = Lexer::new(src.trim()).tokenize()?;
    let mut parser = Parser::new(src.trim(), tokens);
    parser.depth = depth;
    parser.tree_depth = depth;
    let expr = parser.parse_testlist_star()?;
    parser.skip_newlines();
    if !matches!(parser.peek().kind, TokenKind::Eof) {
        return Err(parser.error_here("invalid syntax"));
    }
    Ok(expr)
}

fn is_keyword(word: &str) -> bool {
    KEYWORDS.contains(&word)
}

struct Parser<'a> {
    src: &'a str,
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
    tree_depth: usize,
}

impl<'a> Parser<'a> {
    fn new(src: &'a str, tokens: Vec<Token>) -> Self {
        Self {
            src,
            tokens,
            pos: 0,
            depth: 0,
            tree_depth: 0,
        }
    }

    // ------------------------------------------------------------------
    // Statements
    // ------------------------------------------------------------------

    fn parse_module(&mut self) -> PResult<Module> {
        let mut body = Vec::new();
        loop {
            match self.peek().kind {
                TokenKind::Eof => break,
                TokenKind::Newline => {
                    self.advance();
                }
                _ => body.extend(self.parse_statement()?),
            }
        }
        Ok(Module { body })
    }

    fn parse_statement(&mut self) -> PResult<Vec<Stmt>> {
        let tok = self.peek().clone();
        match &tok.kind {
            TokenKind::Indent => Err(SyntaxError::new("unexpected indent", tok.line)),
            TokenKind::Dedent => Err(SyntaxError::new("unexpected unindent", tok.line)),
            TokenKind::Op("@") => {
                let start = self.pos;
                while !matches!(self.peek().kind, TokenKind::Newline | TokenKind::Eof) {
                    self.advance();
                }
                let text = self.text(start, self.pos);
                self.advance();
                Ok(vec![Stmt::Unsupported(text)])
            }
            TokenKind::Name(name) => match name.as_str() {
                "def" => Ok(vec![self.parse_funcdef()?]),
                "if" => {
                    self.advance();
                    Ok(vec![self.parse_if_rest()?])
                }
                "while" => Ok(vec![self.parse_while()?]),
                "for" => Ok(vec![self.parse_for()?]),
                "class" | "try" | "with" | "async" => Ok(vec![self.parse_unsupported_compound()?]),
                _ => self.parse_simple_line(),
            },
            _ => self.parse_simple_line(),
        }
    }

    fn parse_block(&mut self) -> PResult<Vec<Stmt>> {
        if !matches!(self.peek().kind, TokenKind::Newline) {
            return self.parse_simple_line();
        }
        self.advance();
        if !matches!(self.peek().kind, TokenKind::Indent) {
            return Err(self.error_here("expected an indented block"));
        }
        self.advance();

        let mut body = Vec::new();
        loop {
            match self.peek().kind {
                TokenKind::Dedent => {
                    self.advance();
                    break;
                }
                TokenKind::Eof => break,
                TokenKind::Newline => {
                    self.advance();
                }
                _ => body.extend(self.parse_statement()?),
            }
        }
        Ok(body)
    }

    fn parse_funcdef(&mut self) -> PResult<Stmt> {
        self.advance();
        let name = self.expect_name()?;
        self.expect_op("(")?;
        let params = self.parse_params()?;
        let returns = if self.eat_op("->") {
            Some(self.parse_test()?)
        } else {
            None
        };
        self.expect_op(":")?;
        let body = self.parse_block()?;
        Ok(Stmt::FunctionDef(FunctionDef {
            name,
            params,
            returns,
            body,
        }))
    }

    /// Parameters after the opening parenthesis, consuming the closing one.
    fn parse_params(&mut self) -> PResult<Vec<Param>> {
        let mut params = Vec::new();
        loop {
            if self.eat_op(")") {
                break;
            }
            if self.eat_op("/") {
                // positional-only marker
            } else if self.eat_op("**") {
                let name = self.expect_name()?;
                let annotation = self.parse_optional_annotation()?;
                params.push(Param {
                    name,
                    annotation,
                    default: None,
                    kind: ParamKind::KwArgs,
                });
            } else if self.eat_op("*") {
                if self.peek_name().is_some() {
                    let name = self.expect_name()?;
                    let annotation = self.parse_optional_annotation()?;
                    params.push(Param {
                        name,
                        annotation,
                        default: None,
                        kind: ParamKind::VarArgs,
                    });
                }
            } else {
                let name = self.expect_name()?;
                let annotation = self.parse_optional_annotation()?;
                let default = if self.eat_op("=") {
                    Some(self.parse_test()?)
                } else {
                    None
                };
                params.push(Param {
                    name,
                    annotation,
                    default,
                    kind: ParamKind::Normal,
                });
            }
            if !self.eat_op(",") {
                self.expect_op(")")?;
                break;
            }
        }
        Ok(params)
    }

    fn parse_optional_annotation(&mut self) -> PResult<Option<Expr>> {
        if self.eat_op(":") {
            Ok(Some(self.parse_test()?))
        } else {
            Ok(None)
        }
    }

    /// `if`/`elif` after the keyword has been consumed.
    fn parse_if_rest(&mut self) -> PResult<Stmt> {
        let test = self.parse_test()?;
        self.expect_op(":")?;
        let body = self.parse_block()?;
        let orelse = if self.check_kw("elif") {
            self.advance();
            vec![self.deeper(Self::parse_if_rest)?]
        } else {
            self.parse_else_clause()?
        };
        Ok(Stmt::If { test, body, orelse })
    }

    fn parse_else_clause(&mut self) -> PResult<Vec<Stmt>> {
        if self.check_kw("else") {
            self.advance();
            self.expect_op(":")?;
            self.parse_block()
        } else {
            Ok(Vec::new())
        }
    }

    fn parse_while(&mut self) -> PResult<Stmt> {
        self.advance();
        let test = self.parse_test()?;
        self.expect_op(":")?;
        let body = self.parse_block()?;
        let orelse = self.parse_else_clause()?;
        Ok(Stmt::While { test, body, orelse })
    }

    fn parse_for(&mut self) -> PResult<Stmt> {
        self.advance();
        let target = self.parse_target_list()?;
        self.validate_target(&target)?;
        self.expect_kw("in")?;
        let iter = self.parse_testlist_star()?;
        self.expect_op(":")?;
        let body = self.parse_block()?;
        let orelse = self.parse_else_clause()?;
        Ok(Stmt::For {
            target,
            iter,
            body,
            orelse,
        })
    }

    /// Compound statements outside the convertible subset. Bodies are still
    /// parsed so that malformed code is rejected.
    fn parse_unsupported_compound(&mut self) -> PResult<Stmt> {
        let is_try = self.check_kw("try");
        let header = self.skip_header()?;
        self.parse_block()?;
        if is_try {
            while self.check_kw("except") || self.check_kw("else") || self.check_kw("finally") {
                self.skip_header()?;
                self.parse_block()?;
            }
        }
        Ok(Stmt::Unsupported(header))
    }

    /// Consumes a clause header through its `:` and returns the header text.
    fn skip_header(&mut self) -> PResult<String> {
        let start = self.pos;
        let mut depth = 0usize;
        loop {
            match self.peek().kind {
                TokenKind::Op("(") | TokenKind::Op("[") | TokenKind::Op("{") => depth += 1,
                TokenKind::Op(")") | TokenKind::Op("]") | TokenKind::Op("}") => {
                    depth = depth.saturating_sub(1)
                }
                TokenKind::Op(":") if depth == 0 => {
                    let text = self.text(start, self.pos);
                    self.advance();
                    return Ok(text);
                }
                TokenKind::Newline | TokenKind::Eof => return Err(self.error_here("expected ':'")),
                _ => {}
            }
            self.advance();
        }
    }

    fn parse_simple_line(&mut self) -> PResult<Vec<Stmt>> {
        let mut stmts = Vec::new();
        loop {
            stmts.push(self.parse_simple_stmt()?);
            if self.eat_op(";") {
                if matches!(self.peek().kind, TokenKind::Newline | TokenKind::Eof) {
                    break;
                }
                continue;
            }
            break;
        }
        match self.peek().kind {
            TokenKind::Newline => {
                self.advance();
                Ok(stmts)
            }
            TokenKind::Eof => Ok(stmts),
            _ => Err(self.error_here("invalid syntax")),
        }
    }

    fn parse_simple_stmt(&mut self) -> PResult<Stmt> {
        if let Some(name) = self.peek_name() {
            match name.as_str() {
                "pass" => {
                    self.advance();
                    return Ok(Stmt::Pass);
                }
                "break" => {
                    self.advance();
                    return Ok(Stmt::Break);
                }
                "continue" => {
                    self.advance();
                    return Ok(Stmt::Continue);
                }
                "return" => {
                    self.advance();
                    if self.at_stmt_end() {
                        return Ok(Stmt::Return(None));
                    }
                    return Ok(Stmt::Return(Some(self.parse_testlist_star()?)));
                }
                "import" => return self.parse_import(),
                "from" => return self.parse_from_import(),
                "global" | "nonlocal" | "del" | "assert" | "raise" | "yield" => {
                    let start = self.pos;
                    while !self.at_stmt_end() {
                        self.advance();
                    }
                    return Ok(Stmt::Unsupported(self.text(start, self.pos)));
                }
                _ => {}
            }
        }
        self.parse_expr_stmt()
    }

    fn parse_import(&mut self) -> PResult<Stmt> {
        self.advance();
        let mut names = Vec::new();
        loop {
            let name = self.parse_dotted_name()?;
            let asname = if self.eat_kw("as") {
                Some(self.expect_name()?)
            } else {
                None
            };
            names.push(Alias { name, asname });
            if !self.eat_op(",") {
                break;
            }
        }
        Ok(Stmt::Import(names))
    }

    fn parse_from_import(&mut self) -> PResult<Stmt> {
        self.advance();
        let mut dots = String::new();
        while self.check_op(".") || self.check_op("...") {
            if let TokenKind::Op(op) = self.advance().kind {
                dots.push_str(op);
            }
        }
        let module = if self.check_kw("import") {
            if dots.is_empty() {
                return Err(self.error_here("invalid syntax"));
            }
            None
        } else {
            Some(format!("{}{}", dots, self.parse_dotted_name()?))
        };
        self.expect_kw("import")?;

        let mut names = Vec::new();
        if self.eat_op("*") {
            names.push(Alias {
                name: "*".to_string(),
                asname: None,
            });
            return Ok(Stmt::ImportFrom { module, names });
        }

        let parenthesized = self.eat_op("(");
        loop {
            let name = self.expect_name()?;
            let asname = if self.eat_kw("as") {
                Some(self.expect_name()?)
            } else {
                None
            };
            names.push(Alias { name, asname });
            if !self.eat_op(",") {
                break;
            }
            if parenthesized && self.check_op(")") {
                break;
            }
        }
        if parenthesized {
            self.expect_op(")")?;
        }
        Ok(Stmt::ImportFrom { module, names })
    }

    fn parse_dotted_name(&mut self) -> PResult<String> {
        let mut name = self.expect_name()?;
        while self.eat_op(".") {
            name.push('.');
            name.push_str(&self.expect_name()?);
        }
        Ok(name)
    }

    fn parse_expr_stmt(&mut self) -> PResult<Stmt> {
        let first = self.parse_testlist_star()?;

        if self.check_op("=") {
            let mut exprs = vec![first];
            while self.eat_op("=") {
                exprs.push(self.parse_testlist_star()?);
            }
            let value = exprs
                .pop()
                .ok_or_else(|| self.error_here("invalid syntax"))?;
            for target in &exprs {
                self.validate_target(target)?;
            }
            return Ok(Stmt::Assign {
                targets: exprs,
                value,
            });
        }

        if self.check_op(":") {
            self.advance();
            self.validate_target(&first)?;
            let annotation = self.parse_test()?;
            let value = if self.eat_op("=") {
                Some(self.parse_testlist_star()?)
            } else {
                None
            };
            return Ok(Stmt::AnnAssign {
                target: first,
                annotation,
                value,
            });
        }

        if let TokenKind::Op(op) = self.peek().kind {
            let is_augmented = op.len() >= 2
                && op.ends_with('=')
                && !matches!(op, "==" | "<=" | ">=" | "!=");
            if is_augmented {
                if let Some(bin) = BinOp::from_symbol(&op[..op.len() - 1]) {
                    self.advance();
                    self.validate_target(&first)?;
                    let value = self.parse_testlist_star()?;
                    return Ok(Stmt::AugAssign {
                        target: first,
                        op: bin,
                        value,
                    });
                }
            }
        }

        Ok(Stmt::Expr(first))
    }

    fn validate_target(&self, target: &Expr) -> PResult<()> {
        match target {
            Expr::Name(_) | Expr::Attribute { .. } | Expr::Subscript { .. } => Ok(()),
            Expr::Tuple(items) | Expr::List(items) => {
                items.iter().try_for_each(|item| self.validate_target(item))
            }
            Expr::Starred(inner) => self.validate_target(inner),
            Expr::Num(_) | Expr::Str(_) | Expr::Bool(_) | Expr::NoneLit => {
                Err(self.error_here("cannot assign to literal"))
            }
            Expr::Call { .. } => Err(self.error_here("cannot assign to function call")),
            _ => Err(self.error_here("cannot assign to expression")),
        }
    }

    // ------------------------------------------------------------------
    // Expressions
    // ------------------------------------------------------------------

    /// Comma-separated expressions; more than one item forms a tuple.
    fn parse_testlist_star(&mut self) -> PResult<Expr> {
        let first = self.parse_test_or_star()?;
        if !self.check_op(",") {
            return Ok(first);
        }
        let mut items = vec![first];
        while self.eat_op(",") {
            if !self.starts_expression() {
                break;
            }
            items.push(self.parse_test_or_star()?);
        }
        Ok(Expr::Tuple(items))
    }

    fn parse_test_or_star(&mut self) -> PResult<Expr> {
        if self.eat_op("*") {
            return Ok(Expr::Starred(Box::new(self.nested(Self::parse_bitor)?)));
        }
        self.parse_test()
    }

    fn parse_target_list(&mut self) -> PResult<Expr> {
        let first = self.parse_target()?;
        if !self.check_op(",") {
            return Ok(first);
        }
        let mut items = vec![first];
        while self.eat_op(",") {
            if self.check_kw("in") {
                break;
            }
            items.push(self.parse_target()?);
        }
        Ok(Expr::Tuple(items))
    }

    fn parse_target(&mut self) -> PResult<Expr> {
        if self.eat_op("*") {
            return Ok(Expr::Starred(Box::new(self.nested(Self::parse_bitor)?)));
        }
        self.parse_bitor()
    }

    fn parse_test(&mut self) -> PResult<Expr> {
        self.nested(Self::parse_test_inner)
    }

    fn parse_test_inner(&mut self) -> PResult<Expr> {
        if self.check_kw("lambda") {
            return self.parse_lambda();
        }
        let start = self.pos;
        let expr = self.parse_or()?;

        if self.check_kw("if") {
            self.advance();
            let test = self.parse_or()?;
            self.expect_kw("else")?;
            let orelse = self.parse_test()?;
            return Ok(Expr::IfExp {
                test: Box::new(test),
                body: Box::new(expr),
                orelse: Box::new(orelse),
            });
        }

        if self.eat_op(":=") {
            if !matches!(expr, Expr::Name(_)) {
                return Err(self.error_here("cannot use assignment expressions with this target"));
            }
            self.parse_test()?;
            return Ok(Expr::Opaque(self.text(start, self.pos)));
        }

        Ok(expr)
    }

    fn parse_lambda(&mut self) -> PResult<Expr> {
        let start = self.pos;
        self.advance();
        let mut depth = 0usize;
        loop {
            match self.peek().kind {
                TokenKind::Op("(") | TokenKind::Op("[") | TokenKind::Op("{") => depth += 1,
                TokenKind::Op(")") | TokenKind::Op("]") | TokenKind::Op("}") => {
                    depth = depth.saturating_sub(1)
                }
                TokenKind::Op(":") if depth == 0 => break,
                TokenKind::Newline | TokenKind::Eof => return Err(self.error_here("expected ':'")),
                _ => {}
            }
            self.advance();
        }
        self.advance();
        self.parse_test()?;
        Ok(Expr::Opaque(self.text(start, self.pos)))
    }

    fn parse_or(&mut self) -> PResult<Expr> {
        let mut values = vec![self.parse_and()?];
        while self.eat_kw("or") {
            values.push(self.parse_and()?);
        }
        Ok(bool_op(BoolOp::Or, values))
    }

    fn parse_and(&mut self) -> PResult<Expr> {
        let mut values = vec![self.parse_not()?];
        while self.eat_kw("and") {
            values.push(self.parse_not()?);
        }
        Ok(bool_op(BoolOp::And, values))
    }

    fn parse_not(&mut self) -> PResult<Expr> {
        if self.eat_kw("not") {
            let operand = self.nested(Self::parse_not)?;
            return Ok(Expr::UnaryOp {
                op: UnaryOp::Not,
                operand: Box::new(operand),
            });
        }
        self.parse_comparison()
    }

    fn parse_comparison(&mut self) -> PResult<Expr> {
        let left = self.parse_bitor()?;
        let mut ops = Vec::new();
        let mut comparators = Vec::new();
        while let Some(op) = self.eat_comparison_op() {
            ops.push(op);
            comparators.push(self.parse_bitor()?);
        }
        if ops.is_empty() {
            return Ok(left);
        }
        Ok(Expr::Compare {
            left: Box::new(left),
            ops,
            comparators,
        })
    }

    fn eat_comparison_op(&mut self) -> Option<CmpOp> {
        if self.eat_kw("is") {
            return Some(if self.eat_kw("not") {
                CmpOp::IsNot
            } else {
                CmpOp::Is
            });
        }
        if self.check_kw("not") && self.peek_nth(1).is_keyword("in") {
            self.advance();
            self.advance();
            return Some(CmpOp::NotIn);
        }
        if self.eat_kw("in") {
            return Some(CmpOp::In);
        }
        let op = match self.peek().kind {
            TokenKind::Op("==") => CmpOp::Eq,
            TokenKind::Op("!=") => CmpOp::NotEq,
            TokenKind::Op("<") => CmpOp::Lt,
            TokenKind::Op("<=") => CmpOp::LtE,
            TokenKind::Op(">") => CmpOp::Gt,
            TokenKind::Op(">=") => CmpOp::GtE,
            _ => return None,
        };
        self.advance();
        Some(op)
    }

    fn parse_binary_level(
        &mut self,
        ops: &[&str],
        next: fn(&mut Self) -> PResult<Expr>,
    ) -> PResult<Expr> {
        let mut left = next(self)?;
        let mut links = 0;
        loop {
            let op = match self.peek().kind {
                TokenKind::Op(o) if ops.contains(&o) => o,
                _ => break,
            };
            let bin = BinOp::from_symbol(op).ok_or_else(|| self.error_here("invalid syntax"))?;
            self.advance();
            self.extend_chain(&mut links)?;
            let right = next(self)?;
            left = Expr::BinOp {
                left: Box::new(left),
                op: bin,
                right: Box::new(right),
            };
        }
        self.tree_depth -= links;
        Ok(left)
    }

    fn parse_bitor(&mut self) -> PResult<Expr> {
        self.parse_binary_level(&["|"], Self::parse_xor)
    }

    fn parse_xor(&mut self) -> PResult<Expr> {
        self.parse_binary_level(&["^"], Self::parse_bitand)
    }

    fn parse_bitand(&mut self) -> PResult<Expr> {
        self.parse_binary_level(&["&"], Self::parse_shift)
    }

    fn parse_shift(&mut self) -> PResult<Expr> {
        self.parse_binary_level(&["<<", ">>"], Self::parse_arith)
    }

    fn parse_arith(&mut self) -> PResult<Expr> {
        self.parse_binary_level(&["+", "-"], Self::parse_term)
    }

    fn parse_term(&mut self) -> PResult<Expr> {
        self.parse_binary_level(&["*", "/", "//", "%", "@"], Self::parse_factor)
    }

    fn parse_factor(&mut self) -> PResult<Expr> {
        let op = match self.peek().kind {
            TokenKind::Op("+") => Some(UnaryOp::Plus),
            TokenKind::Op("-") => Some(UnaryOp::Minus),
            TokenKind::Op("~") => Some(UnaryOp::Invert),
            _ => None,
        };
        if let Some(op) = op {
            self.advance();
            let operand = self.nested(Self::parse_factor)?;
            return Ok(Expr::UnaryOp {
                op,
                operand: Box::new(operand),
            });
        }
        self.parse_power()
    }

    fn parse_power(&mut self) -> PResult<Expr> {
        if self.check_kw("await") {
            let start = self.pos;
            self.advance();
            self.parse_primary()?;
            return Ok(Expr::Opaque(self.text(start, self.pos)));
        }
        let base = self.parse_primary()?;
        if self.eat_op("**") {
            let exponent = self.nested(Self::parse_factor)?;
            return Ok(Expr::BinOp {
                left: Box::new(base),
                op: BinOp::Pow,
                right: Box::new(exponent),
            });
        }
        Ok(base)
    }

    fn parse_primary(&mut self) -> PResult<Expr> {
        let mut expr = self.parse_atom()?;
        let mut links = 0;
        loop {
            if matches!(self.peek().kind, TokenKind::Op("(" | "[" | ".")) {
                self.extend_chain(&mut links)?;
            }
            if self.eat_op("(") {
                let (args, keywords) = self.parse_call_args()?;
                expr = Expr::Call {
                    func: Box::new(expr),
                    args,
                    keywords,
                };
            } else if self.eat_op("[") {
                let index = self.parse_subscript_list()?;
                self.expect_op("]")?;
                expr = Expr::Subscript {
                    value: Box::new(expr),
                    index: Box::new(index),
                };
            } else if self.eat_op(".") {
                let attr = self.expect_name()?;
                expr = Expr::Attribute {
                    value: Box::new(expr),
                    attr,
                };
            } else {
                break;
            }
        }
        self.tree_depth -= links;
        Ok(expr)
    }

    /// Call arguments after `(`, consuming the closing `)`.
    fn parse_call_args(&mut self) -> PResult<(Vec<Expr>, Vec<Keyword>)> {
        let mut args = Vec::new();
        let mut keywords = Vec::new();
        loop {
            if self.eat_op(")") {
                break;
            }
            let start = self.pos;
            if self.eat_op("**") {
                let value = self.parse_test()?;
                keywords.push(Keyword { name: None, value });
            } else if self.eat_op("*") {
                args.push(Expr::Starred(Box::new(self.parse_test()?)));
            } else if let Some(name) = self
                .peek_name()
                .filter(|n| !is_keyword(n) && self.peek_nth(1).is_op("="))
            {
                self.advance();
                self.advance();
                let value = self.parse_test()?;
                keywords.push(Keyword {
                    name: Some(name),
                    value,
                });
            } else {
                let arg = self.parse_test()?;
                if self.check_kw("for") || self.check_kw("async") {
                    self.skip_comprehension_tail()?;
                    args.push(Expr::Opaque(self.text(start, self.pos)));
                } else {
                    args.push(arg);
                }
            }
            if !self.eat_op(",") {
                self.expect_op(")")?;
                break;
            }
        }
        Ok((args, keywords))
    }

    fn parse_subscript_list(&mut self) -> PResult<Expr> {
        let first = self.parse_subscript()?;
        if !self.check_op(",") {
            return Ok(first);
        }
        let mut items = vec![first];
        while self.eat_op(",") {
            if self.check_op("]") {
                break;
            }
            items.push(self.parse_subscript()?);
        }
        Ok(Expr::Tuple(items))
    }

    fn parse_subscript(&mut self) -> PResult<Expr> {
        let lower = if self.check_op(":") {
            None
        } else {
            let expr = self.parse_test_or_star()?;
            if !self.check_op(":") {
                return Ok(expr);
            }
            Some(Box::new(expr))
        };
        self.expect_op(":")?;
        let upper = if self.at_slice_end() || self.check_op(":") {
            None
        } else {
            Some(Box::new(self.parse_test()?))
        };
        let step = if self.eat_op(":") {
            if self.at_slice_end() {
                None
            } else {
                Some(Box::new(self.parse_test()?))
            }
        } else {
            None
        };
        Ok(Expr::Slice { lower, upper, step })
    }

    fn at_slice_end(&self) -> bool {
        self.check_op(",") || self.check_op("]")
    }

    fn parse_atom(&mut self) -> PResult<Expr> {
        let start = self.pos;
        let tok = self.advance();
        match tok.kind {
            TokenKind::Name(name) => match name.as_str() {
                "True" => Ok(Expr::Bool(true)),
                "False" => Ok(Expr::Bool(false)),
                "None" => Ok(Expr::NoneLit),
                kw if is_keyword(kw) => Err(SyntaxError::new("invalid syntax", tok.line)),
                _ => Ok(Expr::Name(name)),
            },
            TokenKind::Number(text) => Ok(Expr::Num(text)),
            TokenKind::Str { value, prefix } => self.parse_string_run(value, prefix, tok.line),
            TokenKind::Op("(") => self.parse_paren(start),
            TokenKind::Op("[") => self.parse_list(start),
            TokenKind::Op("{") => self.parse_brace(start),
            TokenKind::Op("...") => Ok(Expr::Opaque("...".to_string())),
            TokenKind::Indent => Err(SyntaxError::new("unexpected indent", tok.line)),
            _ => Err(SyntaxError::new("invalid syntax", tok.line)),
        }
    }

    /// Adjacent string literals concatenate; any f-prefix makes the run an f-string.
    fn parse_string_run(&mut self, value: String, prefix: String, line: usize) -> PResult<Expr> {
        let mut pieces = vec![(value, prefix)];
        while let TokenKind::Str { .. } = self.peek().kind {
            if let TokenKind::Str { value, prefix } = self.advance().kind {
                pieces.push((value, prefix));
            }
        }

        let has_fstring = pieces
            .iter()
            .any(|(_, prefix)| prefix.to_ascii_lowercase().contains('f'));
        if !has_fstring {
            return Ok(Expr::Str(pieces.into_iter().map(|(v, _)| v).collect()));
        }

        let mut parts = Vec::new();
        for (value, prefix) in pieces {
            if prefix.to_ascii_lowercase().contains('f') {
                parts.extend(parse_fstring(&value, line, self.depth)?);
            } else {
                parts.push(FStringPart::Literal(value));
            }
        }
        Ok(Expr::FString(merge_literals(parts)))
    }

    fn parse_paren(&mut self, start: usize) -> PResult<Expr> {
        if self.eat_op(")") {
            return Ok(Expr::Tuple(Vec::new()));
        }
        if self.check_kw("yield") {
            self.skip_comprehension_tail()?;
            self.expect_op(")")?;
            return Ok(Expr::Opaque(self.text(start, self.pos)));
        }
        let first = self.parse_test_or_star()?;
        if self.check_kw("for") || self.check_kw("async") {
            self.skip_comprehension_tail()?;
            self.expect_op(")")?;
            return Ok(Expr::Opaque(self.text(start, self.pos)));
        }
        if !self.check_op(",") {
            self.expect_op(")")?;
            return Ok(first);
        }
        let mut items = vec![first];
        while self.eat_op(",") {
            if self.check_op(")") {
                break;
            }
            items.push(self.parse_test_or_star()?);
        }
        self.expect_op(")")?;
        Ok(Expr::Tuple(items))
    }

    fn parse_list(&mut self, start: usize) -> PResult<Expr> {
        if self.eat_op("]") {
            return Ok(Expr::List(Vec::new()));
        }
        let first = self.parse_test_or_star()?;
        if self.check_kw("for") || self.check_kw("async") {
            self.skip_comprehension_tail()?;
            self.expect_op("]")?;
            return Ok(Expr::Opaque(self.text(start, self.pos)));
        }
        let mut items = vec![first];
        while self.eat_op(",") {
            if self.check_op("]") {
                break;
            }
            items.push(self.parse_test_or_star()?);
        }
        self.expect_op("]")?;
        Ok(Expr::List(items))
    }

    fn parse_brace(&mut self, start: usize) -> PResult<Expr> {
        if self.eat_op("}") {
            return Ok(Expr::Dict(Vec::new()));
        }
        if self.check_op("**") {
            self.skip_comprehension_tail()?;
            self.expect_op("}")?;
            return Ok(Expr::Opaque(self.text(start, self.pos)));
        }

        let first = self.parse_test_or_star()?;
        if self.eat_op(":") {
            let value = self.parse_test()?;
            if self.check_kw("for") || self.check_kw("async") {
                self.skip_comprehension_tail()?;
                self.expect_op("}")?;
                return Ok(Expr::Opaque(self.text(start, self.pos)));
            }
            let mut pairs = vec![(first, value)];
            while self.eat_op(",") {
                if self.check_op("}") {
                    break;
                }
                let key = self.parse_test()?;
                self.expect_op(":")?;
                let value = self.parse_test()?;
                pairs.push((key, value));
            }
            self.expect_op("}")?;
            return Ok(Expr::Dict(pairs));
        }

        if self.check_kw("for") || self.check_kw("async") {
            self.skip_comprehension_tail()?;
            self.expect_op("}")?;
            return Ok(Expr::Opaque(self.text(start, self.pos)));
        }
        let mut items = vec![first];
        while self.eat_op(",") {
            if self.check_op("}") {
                break;
            }
            items.push(self.parse_test_or_star()?);
        }
        self.expect_op("}")?;
        Ok(Expr::Set(items))
    }

    /// Skips to the bracket closing the current group, leaving it unconsumed.
    fn skip_comprehension_tail(&mut self) -> PResult<()> {
        let mut depth = 0usize;
        loop {
            match self.peek().kind {
                TokenKind::Op("(") | TokenKind::Op("[") | TokenKind::Op("{") => depth += 1,
                TokenKind::Op(")") | TokenKind::Op("]") | TokenKind::Op("}") => {
                    if depth == 0 {
                        return Ok(());
                    }
                    depth -= 1;
                }
                TokenKind::Eof => return Err(self.error_here("unexpected EOF while parsing")),
                _ => {}
            }
            self.advance();
        }
    }

    // ------------------------------------------------------------------
    // Token helpers
    // ------------------------------------------------------------------

    fn peek(&self) -> &Token {
        let idx = self.pos.min(self.tokens.len().saturating_sub(1));
        &self.tokens[idx]
    }

    fn peek_nth(&self, n: usize) -> &Token {
        let idx = (self.pos + n).min(self.tokens.len().saturating_sub(1));
        &self.tokens[idx]
    }

    fn peek_name(&self) -> Option<String> {
        match &self.peek().kind {
            TokenKind::Name(n) => Some(n.clone()),
            _ => None,
        }
    }

    fn advance(&mut self) -> Token {
        let tok = self.peek().clone();
        if self.pos < self.tokens.len().saturating_sub(1) {
            self.pos += 1;
        }
        tok
    }

    fn skip_newlines(&mut self) {
        while matches!(self.peek().kind, TokenKind::Newline) {
            self.advance();
        }
    }

    fn check_op(&self, op: &str) -> bool {
        self.peek().is_op(op)
    }

    fn eat_op(&mut self, op: &str) -> bool {
        if self.check_op(op) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn check_kw(&self, kw: &str) -> bool {
        self.peek().is_keyword(kw)
    }

    fn eat_kw(&mut self, kw: &str) -> bool {
        if self.check_kw(kw) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect_op(&mut self, op: &str) -> PResult<Token> {
        if self.check_op(op) {
            Ok(self.advance())
        } else {
            Err(self.error_here(&format!("expected '{}'", op)))
        }
    }

    fn expect_kw(&mut self, kw: &str) -> PResult<()> {
        if self.eat_kw(kw) {
            Ok(())
        } else {
            Err(self.error_here(&format!("expected '{}'", kw)))
        }
    }

    fn expect_name(&mut self) -> PResult<String> {
        match self.peek_name() {
            Some(name) if !is_keyword(&name) => {
                self.advance();
                Ok(name)
            }
            _ => Err(self.error_here("invalid syntax")),
        }
    }

    fn at_stmt_end(&self) -> bool {
        matches!(self.peek().kind, TokenKind::Newline | TokenKind::Eof) || self.check_op(";")
    }

    fn starts_expression(&self) -> bool {
        match &self.peek().kind {
            TokenKind::Name(n) => {
                !is_keyword(n) || matches!(n.as_str(), "True" | "False" | "None" | "not" | "lambda" | "await")
            }
            TokenKind::Number(_) | TokenKind::Str { .. } => true,
            TokenKind::Op(op) => matches!(*op, "(" | "[" | "{" | "-" | "+" | "~" | "*" | "..."),
            _ => false,
        }
    }

    /// Source text covered by tokens `start..end`.
    fn text(&self, start: usize, end: usize) -> String {
        if end <= start || start >= self.tokens.len() {
            return String::new();
        }
        let from = self.tokens[start].start;
        let to = self.tokens[(end - 1).min(self.tokens.len() - 1)].end;
        self.src.get(from..to).unwrap_or_default().trim().to_string()
    }

    /// Runs `parse` one nesting level deeper, refusing input nested past
    /// `MAX_EXPR_DEPTH` before it can exhaust the stack.
    fn nested<T>(&mut self, parse: fn(&mut Self) -> PResult<T>) -> PResult<T> {
        if self.depth >= MAX_EXPR_DEPTH {
            return Err(self.error_here("expression nested too deeply"));
        }
        self.depth += 1;
        let result = self.deeper(parse);
        self.depth -= 1;
        result
    }

    /// Runs `parse` for a node one level further down the syntax tree.
    fn deeper<T>(&mut self, parse: fn(&mut Self) -> PResult<T>) -> PResult<T> {
        if self.tree_depth >= MAX_TREE_DEPTH {
            return Err(self.error_here("statement too deeply nested"));
        }
        self.tree_depth += 1;
        let result = parse(self);
        self.tree_depth -= 1;
        result
    }

    /// Accounts for one more node in a left-leaning chain such as `a + b + c`
    /// or `a.b.c`. The caller releases `links` once the chain is complete.
    fn extend_chain(&mut self, links: &mut usize) -> PResult<()> {
        if self.tree_depth >= MAX_TREE_DEPTH {
            return Err(self.error_here("statement too deeply nested"));
        }
        self.tree_depth += 1;
        *links += 1;
        Ok(())
    }

    fn error_here(&self, message: &str) -> SyntaxError {
        SyntaxError::new(message, self.peek().line)
    }
}

fn bool_op(op: BoolOp, mut values: Vec<Expr>) -> Expr {
    if values.len() == 1 {
        values.remove(0)
    } else {
        Expr::BoolOp { op, values }
    }
}

/// Splits a decoded f-string body into literal text and replacement fields.
fn parse_fstring(body: &str, line: usize, depth: usize) -> PResult<Vec<FStringPart>> {
    let mut parts = Vec::new();
    let mut literal = String::new();
    let mut chars = body.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '{' if chars.peek() == Some(&'{') => {
                chars.next();
                literal.push('{');
            }
            '}' if chars.peek() == Some(&'}') => {
                chars.next();
                literal.push('}');
            }
            '{' => {
                let mut field = String::new();
                let mut depth = 0usize;
                let mut quote: Option<char> = None;
                let mut closed = false;
                for c in chars.by_ref() {
                    match (quote, c) {
                        (Some(q), c) if c == q => quote = None,
                        (Some(_), _) => {}
                        (None, '\'' | '"') => quote = Some(c),
                        (None, '(' | '[' | '{') => depth += 1,
                        (None, ')' | ']') => depth = depth.saturating_sub(1),
                        (None, '}') if depth == 0 => {
                            closed = true;
                            break;
                        }
                        (None, '}') => depth -= 1,
                        _ => {}
                    }
                    field.push(c);
                }
                if !closed {
                    return Err(SyntaxError::new("f-string: expecting '}'", line));
                }
                let expr_src = strip_format_spec(&field);
                if expr_src.trim().is_empty() {
                    return Err(SyntaxError::new("f-string: empty expression not allowed", line));
                }
                let expr = parse_nested_expression(expr_src, depth)
                    .map_err(|e| SyntaxError::new(format!("f-string: {}", e.message), line))?;
                if !literal.is_empty() {
                    parts.push(FStringPart::Literal(std::mem::take(&mut literal)));
                }
                parts.push(FStringPart::Expr(expr));
            }
            '}' => return Err(SyntaxError::new("f-string: single '}' is not allowed", line)),
            c => literal.push(c),
        }
    }
    if !literal.is_empty() {
        parts.push(FStringPart::Literal(literal));
    }
    Ok(parts)
}

/// Drops a trailing `!r`/`!s` conversion and `:spec` from a replacement field.
fn strip_format_spec(field: &str) -> &str {
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let bytes: Vec<(usize, char)> = field.char_indices().collect();
    for (i, (idx, c)) in bytes.iter().enumerate() {
        match (quote, *c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '\'' | '"') => quote = Some(*c),
            (None, '(' | '[' | '{') => depth += 1,
            (None, ')' | ']' | '}') => depth = depth.saturating_sub(1),
            (None, '!') if depth == 0 && bytes.get(i + 1).map(|(_, n)| *n) != Some('=') => {
                return &field[..*idx]
            }
            (None, ':') if depth == 0 => return &field[..*idx],
            _ => {}
        }
    }
    field
}

fn merge_literals(parts: Vec<FStringPart>) -> Vec<FStringPart> {
    let mut merged: Vec<FStringPart> = Vec::with_capacity(parts.len());
    for part in parts {
        match (merged.last_mut(), part) {
            (Some(FStringPart::Literal(prev)), FStringPart::Literal(next)) => prev.push_str(&next),
            (_, part) => merged.push(part),
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(src: &str) -> Vec<Stmt> {
        parse_module(src).unwrap().body
    }

    #[test]
    fn test_function_with_annotations() {
        let body = parse("def add(a: int, b: int = 2) -> int:\n    return a + b\n");
        let Stmt::FunctionDef(def) = &body[0] else {
            panic!("expected function")
        };
        assert_eq!(def.name, "add");
        assert_eq!(def.params.len(), 2);
        assert_eq!(def.params[0].annotation, Some(Expr::Name("int".to_string())));
        assert_eq!(def.params[1].default, Some(Expr::Num("2".to_string())));
        assert_eq!(def.returns, Some(Expr::Name("int".to_string())));
        assert!(matches!(def.body[0], Stmt::Return(Some(Expr::BinOp { op: BinOp::Add, .. }))));
    }

    #[test]
    fn test_elif_chain_nests() {
        let body = parse("if a:\n    x = 1\nelif b:\n    x = 2\nelse:\n    x = 3\n");
        let Stmt::If { orelse, .. } = &body[0] else {
            panic!("expected if")
        };
        let Stmt::If { orelse: inner, .. } = &orelse[0] else {
            panic!("expected nested if")
        };
        assert_eq!(inner.len(), 1);
    }

    #[test]
    fn test_precedence() {
        let body = parse("x = 1 + 2 * 3 ** 2\n");
        let Stmt::Assign { value, .. } = &body[0] else {
            panic!("expected assign")
        };
        let Expr::BinOp { op, right, .. } = value else {
            panic!("expected binop")
        };
        assert_eq!(*op, BinOp::Add);
        assert!(matches!(**right, Expr::BinOp { op: BinOp::Mult, .. }));
    }

    #[test]
    fn test_chained_comparison_and_not_in() {
        let body = parse("ok = 0 < x <= 10 and y not in z\n");
        let Stmt::Assign { value, .. } = &body[0] else {
            panic!("expected assign")
        };
        let Expr::BoolOp { values, .. } = value else {
            panic!("expected boolop")
        };
        assert!(matches!(&values[0], Expr::Compare { ops, .. } if ops == &[CmpOp::Lt, CmpOp::LtE]));
        assert!(matches!(&values[1], Expr::Compare { ops, .. } if ops == &[CmpOp::NotIn]));
    }

    #[test]
    fn test_unsupported_constructs_still_validate() {
        let src = "class Foo:\n    def bar(self):\n        return 1\n\ntry:\n    x = 1\nexcept ValueError as e:\n    pass\nfinally:\n    pass\n";
        let body = parse(src);
        assert_eq!(body[0], Stmt::Unsupported("class Foo".to_string()));
        assert_eq!(body[1], Stmt::Unsupported("try".to_string()));
    }

    #[test]
    fn test_comprehension_is_opaque() {
        let body = parse("squares = [i * i for i in range(10) if i % 2]\n");
        let Stmt::Assign { value, .. } = &body[0] else {
            panic!("expected assign")
        };
        assert_eq!(
            *value,
            Expr::Opaque("[i * i for i in range(10) if i % 2]".to_string())
        );
    }

    #[test]
    fn test_fstring_fields() {
        let body = parse("print(f\"Hello {name!r:>10}, {{ok}}\")\n");
        let Stmt::Expr(Expr::Call { args, .. }) = &body[0] else {
            panic!("expected call")
        };
        assert_eq!(
            args[0],
            Expr::FString(vec![
                FStringPart::Literal("Hello ".to_string()),
                FStringPart::Expr(Expr::Name("name".to_string())),
                FStringPart::Literal(", {ok}".to_string()),
            ])
        );
    }

    #[test]
    fn test_from_import() {
        let body = parse("from math import (sqrt,\n    pi as PI,)\n");
        assert_eq!(
            body[0],
            Stmt::ImportFrom {
                module: Some("math".to_string()),
                names: vec![
                    Alias {
                        name: "sqrt".to_string(),
                        asname: None
                    },
                    Alias {
                        name: "pi".to_string(),
                        asname: Some("PI".to_string())
                    },
                ],
            }
        );
    }

    #[test]
    fn test_missing_colon() {
        let err = parse_module("def f()\n    return 1\n").unwrap_err();
        assert_eq!(err.message, "expected ':'");
        assert_eq!(err.line, 1);
    }

    #[test]
    fn test_missing_indented_block() {
        let err = parse_module("if x:\ny = 1\n").unwrap_err();
        assert_eq!(err.message, "expected an indented block");
        assert_eq!(err.line, 2);
    }

    #[test]
    fn test_unexpected_indent() {
        let err = parse_module("x = 1\n    y = 2\n").unwrap_err();
        assert_eq!(err.message, "unexpected indent");
    }

    #[test]
    fn test_python2_print_rejected() {
        let err = parse_module("print \"hello\"\n").unwrap_err();
        assert_eq!(err.message, "invalid syntax");
    }

    #[test]
    fn test_assign_to_literal_rejected() {
        let err = parse_module("1 = x\n").unwrap_err();
        assert_eq!(err.message, "cannot assign to literal");
    }

    #[test]
    fn test_keyword_as_name_rejected() {
        assert!(parse_module("class = 3\n").is_err());
        assert!(parse_module("x = def\n").is_err());
    }

    #[test]
    fn test_deep_nesting_is_a_syntax_error() {
        let parens = format!("x = {}1{}\n", "(".repeat(10_000), ")".repeat(10_000));
        assert_eq!(parse_module(&parens).unwrap_err().message, "too many nested parentheses");

        let parens = format!("x = {}1{}\n", "(".repeat(150), ")".repeat(150));
        assert_eq!(parse_module(&parens).unwrap_err().message, "expression nested too deeply");

        let unary = format!("x = {}1\n", "-".repeat(10_000));
        assert_eq!(parse_module(&unary).unwrap_err().message, "expression nested too deeply");

        let nots = format!("x = {}y\n", "not ".repeat(10_000));
        assert_eq!(parse_module(&nots).unwrap_err().message, "expression nested too deeply");

        let powers = format!("x = 2{}\n", " ** 2".repeat(10_000));
        assert_eq!(parse_module(&powers).unwrap_err().message, "expression nested too deeply");
    }

    #[test]
    fn test_long_chains_are_bounded() {
        let sum = format!("x = 1{}\n", " + 1".repeat(100_000));
        assert_eq!(parse_module(&sum).unwrap_err().message, "statement too deeply nested");

        let attrs = format!("x = a{}\n", ".b".repeat(100_000));
        assert_eq!(parse_module(&attrs).unwrap_err().message, "statement too deeply nested");

        let ladder = format!("if a: pass\n{}", "elif a: pass\n".repeat(10_000));
        assert_eq!(parse_module(&ladder).unwrap_err().message, "statement too deeply nested");
    }

    #[test]
    fn test_moderate_nesting_still_parses() {
        let src = format!("x = {}1{}\n", "(".repeat(20), ")".repeat(20));
        assert!(parse_module(&src).is_ok());

        let sum = format!("total = 0{}\n", " + n".repeat(300));
        assert!(parse_module(&sum).is_ok());

        let ladder = format!("if a == 0:\n    pass\n{}", "elif a == 1:\n    pass\n".repeat(100));
        assert!(parse_module(&ladder).is_ok());
    }

    #[test]
    fn test_slices_and_keywords() {
        let body = parse("y = data[1:-1:2]\nprint(a, sep=', ', end='')\n");
        let Stmt::Assign { value, .. } = &body[0] else {
            panic!("expected assign")
        };
        assert!(matches!(value, Expr::Subscript { index, .. } if matches!(**index, Expr::Slice { .. })));
        let Stmt::Expr(Expr::Call { keywords, .. }) = &body[1] else {
            panic!("expected call")
        };
        assert_eq!(keywords.len(), 2);
    }
}
