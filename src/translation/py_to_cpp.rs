// Template-based Python -> C++ conversion over the parsed syntax tree

use super::python::{self, ast::*};
use crate::error::{ConvertError, Result};
use phf::phf_map;
use std::collections::{BTreeSet, HashSet};

/// Headers pulled in by `import <module>` / `from <module> import ...`.
static MODULE_HEADERS: phf::Map<&'static str, &'static str> = phf_map! {
    "math" => "<cmath>",
    "random" => "<random>",
    "time" => "<ctime>",
};

/// Python annotation names with a different C++ spelling.
static TYPE_MAP: phf::Map<&'static str, &'static str> = phf_map! {
    "int" => "int",
    "float" => "double",
    "str" => "std::string",
    "bool" => "bool",
};

/// Builtins and `from math import` names that map onto the standard library.
static CALL_MAP: phf::Map<&'static str, &'static str> = phf_map! {
    "abs" => "std::abs",
    "sqrt" => "std::sqrt",
    "pow" => "std::pow",
    "floor" => "std::floor",
    "ceil" => "std::ceil",
    "min" => "std::min",
    "max" => "std::max",
};

const BASE_INCLUDES: [&str; 2] = ["<iostream>", "<string>"];
const INDENT: &str = "    ";

/// Appended when the output has no `main`.
pub const MAIN_STUB: &str = "int main() {\n    // Your code will be executed here\n    return 0;\n}";

/// Convert Python source to C++.
pub fn python_to_cpp(src: &str) -> Result<String> {
    let module = python::parse(src).map_err(|e| {
        ConvertError::Conversion(format!("Error converting Python to C++: {}", e))
    })?;

    let mut includes: BTreeSet<&'static str> = BASE_INCLUDES.into_iter().collect();
    collect_includes(&module.body, &mut includes);

    let mut emitter = Emitter::default();
    for include in &includes {
        emitter.lines.push(format!("#include {}", include));
    }
    emitter.lines.push(String::new());

    let mut globals = HashSet::new();
    for stmt in &module.body {
        match stmt {
            Stmt::FunctionDef(def) => emitter.function(def),
            other => emitter.stmt(other, 0, &mut globals),
        }
    }

    let mut lines = emitter.lines;
    if !lines.iter().any(|line| line.contains("main")) {
        while lines.last().is_some_and(|l| l.is_empty()) {
            lines.pop();
        }
        lines.push(String::new());
        lines.push(MAIN_STUB.to_string());
    }
    Ok(lines.join("\n"))
}

fn collect_includes(body: &[Stmt], includes: &mut BTreeSet<&'static str>) {
    for stmt in body {
        match stmt {
            Stmt::Import(names) => {
                for alias in names {
                    if let Some(header) = MODULE_HEADERS.get(alias.name.as_str()) {
                        includes.insert(*header);
                    }
                }
            }
            Stmt::ImportFrom {
                module: Some(module),
                ..
            } => {
                if let Some(header) = MODULE_HEADERS.get(module.as_str()) {
                    includes.insert(*header);
                }
            }
            Stmt::FunctionDef(def) => collect_includes(&def.body, includes),
            Stmt::If { body, orelse, .. }
            | Stmt::While { body, orelse, .. }
            | Stmt::For { body, orelse, .. } => {
                collect_includes(body, includes);
                collect_includes(orelse, includes);
            }
            _ => {}
        }
    }
}

#[derive(Default)]
struct Emitter {
    lines: Vec<String>,
}

impl Emitter {
    fn push(&mut self, depth: usize, line: impl AsRef<str>) {
        self.lines
            .push(format!("{}{}", INDENT.repeat(depth), line.as_ref()));
    }

    fn function(&mut self, def: &FunctionDef) {
        let params: Vec<String> = def.params.iter().map(param).collect();
        self.push(
            0,
            format!("{} {}({}) {{", return_type(def), def.name, params.join(", ")),
        );

        let mut scope: HashSet<String> = def.params.iter().map(|p| p.name.clone()).collect();
        self.block(&def.body, 1, &mut scope);

        self.push(0, "}");
        self.lines.push(String::new());
    }

    fn block(&mut self, body: &[Stmt], depth: usize, scope: &mut HashSet<String>) {
        for stmt in body {
            self.stmt(stmt, depth, scope);
        }
    }

    fn stmt(&mut self, stmt: &Stmt, depth: usize, scope: &mut HashSet<String>) {
        match stmt {
            Stmt::Return(None) => self.push(depth, "return;"),
            Stmt::Return(Some(value)) => self.push(depth, format!("return {};", expr(value))),
            Stmt::Expr(Expr::Str(doc)) => {
                for line in doc.lines().map(str::trim).filter(|l| !l.is_empty()) {
                    self.push(depth, format!("// {}", line));
                }
            }
            Stmt::Expr(Expr::Call { func, args, .. }) if is_name(func, "print") => {
                self.push(depth, format!("{};", print(args)));
            }
            Stmt::Expr(value) => self.push(depth, format!("{};", expr(value))),
            Stmt::Assign { targets, value } => {
                let value = expr(value);
                for target in targets {
                    let line = assignment(target, &value, scope);
                    self.push(depth, line);
                }
            }
            Stmt::AnnAssign {
                target,
                annotation,
                value,
            } => {
                let line = match (target, value) {
                    (Expr::Name(name), value) if !scope.contains(name) => {
                        scope.insert(name.clone());
                        match value {
                            Some(v) => format!("{} {} = {};", annotation_type(annotation), name, expr(v)),
                            None => format!("{} {};", annotation_type(annotation), name),
                        }
                    }
                    (target, Some(v)) => format!("{} = {};", expr(target), expr(v)),
                    (_, None) => return,
                };
                self.push(depth, line);
            }
            Stmt::AugAssign { target, op, value } => {
                let target = expr(target);
                let value = expr(value);
                let line = match op {
                    BinOp::Pow => format!("{} = std::pow({}, {});", target, target, value),
                    BinOp::FloorDiv => format!("{} /= {};", target, value),
                    BinOp::MatMult => format!("// unsupported: {} @= {}", target, value),
                    op => format!("{} {}= {};", target, op.symbol(), value),
                };
                self.push(depth, line);
            }
            Stmt::If { test, body, orelse } => {
                self.push(depth, format!("if ({}) {{", condition(test)));
                self.if_tail(body, orelse, depth, scope);
            }
            Stmt::While { test, body, orelse } => {
                self.push(depth, format!("while ({}) {{", condition(test)));
                self.block(&body[..], depth + 1, &mut scope.clone());
                self.push(depth, "}");
                if !orelse.is_empty() {
                    self.push(depth, "// unsupported: while ... else");
                }
            }
            Stmt::For {
                target,
                iter,
                body,
                orelse,
            } => {
                self.push(depth, for_header(target, iter));
                let mut inner = scope.clone();
                bind_names(target, &mut inner);
                self.block(body, depth + 1, &mut inner);
                self.push(depth, "}");
                if !orelse.is_empty() {
                    self.push(depth, "// unsupported: for ... else");
                }
            }
            Stmt::Import(_) | Stmt::ImportFrom { .. } | Stmt::Pass => {}
            Stmt::Break => self.push(depth, "break;"),
            Stmt::Continue => self.push(depth, "continue;"),
            Stmt::FunctionDef(def) => {
                self.push(depth, format!("// unsupported: def {}(...)", def.name));
            }
            Stmt::Unsupported(text) => self.push(depth, format!("// unsupported: {}", text)),
        }
    }

    /// Body of an `if` plus its `else if` / `else` chain.
    fn if_tail(&mut self, body: &[Stmt], orelse: &[Stmt], depth: usize, scope: &HashSet<String>) {
        self.block(body, depth + 1, &mut scope.clone());
        match orelse {
            [] => self.push(depth, "}"),
            [Stmt::If {
                test,
                body,
                orelse,
            }] => {
                self.push(depth, format!("}} else if ({}) {{", condition(test)));
                self.if_tail(body, orelse, depth, scope);
            }
            _ => {
                self.push(depth, "} else {");
                self.block(orelse, depth + 1, &mut scope.clone());
                self.push(depth, "}");
            }
        }
    }
}

fn param(p: &Param) -> String {
    match p.kind {
        ParamKind::Normal => {
            let ty = p
                .annotation
                .as_ref()
                .map(annotation_type)
                .unwrap_or_else(|| "auto".to_string());
            match &p.default {
                Some(default) => format!("{} {} = {}", ty, p.name, expr(default)),
                None => format!("{} {}", ty, p.name),
            }
        }
        ParamKind::VarArgs => format!("/* *{} */", p.name),
        ParamKind::KwArgs => format!("/* **{} */", p.name),
    }
}

fn annotation_type(annotation: &Expr) -> String {
    match annotation {
        Expr::Name(name) => TYPE_MAP
            .get(name.as_str())
            .map(|ty| ty.to_string())
            .unwrap_or_else(|| name.clone()),
        Expr::NoneLit => "void".to_string(),
        _ => "auto".to_string(),
    }
}

fn return_type(def: &FunctionDef) -> String {
    match &def.returns {
        Some(annotation) => annotation_type(annotation),
        None if returns_value(&def.body) => "auto".to_string(),
        None => "void".to_string(),
    }
}

fn returns_value(body: &[Stmt]) -> bool {
    body.iter().any(|stmt| match stmt {
        Stmt::Return(Some(_)) => true,
        Stmt::If { body, orelse, .. }
        | Stmt::While { body, orelse, .. }
        | Stmt::For { body, orelse, .. } => returns_value(body) || returns_value(orelse),
        _ => false,
    })
}

fn assignment(target: &Expr, value: &str, scope: &mut HashSet<String>) -> String {
    match target {
        Expr::Name(name) if scope.insert(name.clone()) => format!("auto {} = {};", name, value),
        Expr::Tuple(items) | Expr::List(items) => {
            let names: Option<Vec<&String>> = items
                .iter()
                .map(|item| match item {
                    Expr::Name(name) => Some(name),
                    _ => None,
                })
                .collect();
            match names {
                Some(names) if names.iter().all(|n| !scope.contains(*n)) => {
                    let joined = names.iter().map(|n| n.as_str()).collect::<Vec<_>>().join(", ");
                    for name in names {
                        scope.insert(name.clone());
                    }
                    format!("auto [{}] = {};", joined, value)
                }
                _ => {
                    let parts: Vec<String> = items.iter().map(expr).collect();
                    format!("std::tie({}) = {};", parts.join(", "), value)
                }
            }
        }
        target => format!("{} = {};", expr(target), value),
    }
}

fn bind_names(target: &Expr, scope: &mut HashSet<String>) {
    match target {
        Expr::Name(name) => {
            scope.insert(name.clone());
        }
        Expr::Tuple(items) | Expr::List(items) => items.iter().for_each(|i| bind_names(i, scope)),
        _ => {}
    }
}

fn for_header(target: &Expr, iter: &Expr) -> String {
    if let (
        Expr::Name(var),
        Expr::Call {
            func,
            args,
            keywords,
        },
    ) = (target, iter)
    {
        let bounds = match args.as_slice() {
            [stop] => Some(("0".to_string(), expr(stop))),
            [start, stop] | [start, stop, _] => Some((expr(start), expr(stop))),
            _ => None,
        };
        if let Some((start, stop)) = bounds.filter(|_| is_name(func, "range") && keywords.is_empty()) {
            return match args.get(2).map(expr) {
                None => format!("for (int {v} = {}; {v} < {}; {v}++) {{", start, stop, v = var),
                Some(step) if step.starts_with('-') => format!(
                    "for (int {v} = {}; {v} > {}; {v} += {}) {{",
                    start,
                    stop,
                    step,
                    v = var
                ),
                Some(step) => format!(
                    "for (int {v} = {}; {v} < {}; {v} += {}) {{",
                    start,
                    stop,
                    step,
                    v = var
                ),
            };
        }
    }

    let binding = match target {
        Expr::Tuple(items) | Expr::List(items) => {
            format!("[{}]", items.iter().map(expr).collect::<Vec<_>>().join(", "))
        }
        other => expr(other),
    };
    format!("for (auto {} : {}) {{", binding, expr(iter))
}

fn is_name(expr: &Expr, name: &str) -> bool {
    matches!(expr, Expr::Name(n) if n == name)
}

/// Condition text without one redundant layer of parentheses.
fn condition(test: &Expr) -> String {
    strip_outer_parens(&expr(test)).to_string()
}

fn strip_outer_parens(s: &str) -> &str {
    if !(s.starts_with('(') && s.ends_with(')')) {
        return s;
    }
    let mut depth = 0i32;
    let mut quote: Option<char> = None;
    let mut escaped = false;
    for (i, c) in s.char_indices() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '"' | '\'' => quote = Some(c),
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 && i != s.len() - 1 {
                    return s;
                }
            }
            _ => {}
        }
    }
    &s[1..s.len() - 1]
}

fn print(args: &[Expr]) -> String {
    let mut items = Vec::new();
    for arg in args {
        match arg {
            Expr::FString(parts) => {
                for part in parts {
                    match part {
                        FStringPart::Literal(text) => items.push(string_literal(text)),
                        FStringPart::Expr(e) => items.push(expr(e)),
                    }
                }
            }
            other => items.push(expr(other)),
        }
    }
    if items.is_empty() {
        "std::cout << std::endl".to_string()
    } else {
        format!("std::cout << {} << std::endl", items.join(" << "))
    }
}

fn string_literal(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for c in text.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            '\0' => out.push_str("\\0"),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

fn number(text: &str) -> String {
    let cleaned = text.replace('_', "");
    match cleaned.strip_prefix("0o").or_else(|| cleaned.strip_prefix("0O")) {
        Some(octal) => format!("0{}", octal),
        None => cleaned,
    }
}

fn opaque(e: &Expr) -> String {
    format!("/* {} */", to_python(e).replace("*/", "* /"))
}

/// Convert a Python expression to C++ source.
fn expr(e: &Expr) -> String {
    match e {
        Expr::Num(text) if text.ends_with(|c| c == 'j' || c == 'J') => opaque(e),
        Expr::Num(text) => number(text),
        Expr::Str(text) => string_literal(text),
        Expr::FString(parts) => {
            let pieces: Vec<String> = parts
                .iter()
                .map(|part| match part {
                    FStringPart::Literal(text) => format!("std::string({})", string_literal(text)),
                    FStringPart::Expr(e) => expr(e),
                })
                .collect();
            match pieces.len() {
                0 => "std::string()".to_string(),
                1 => pieces.into_iter().collect(),
                _ => format!("({})", pieces.join(" + ")),
            }
        }
        Expr::Name(name) => name.clone(),
        Expr::Bool(true) => "true".to_string(),
        Expr::Bool(false) => "false".to_string(),
        Expr::NoneLit => "nullptr".to_string(),
        Expr::BinOp { left, op, right } => match op {
            BinOp::Pow => format!("std::pow({}, {})", expr(left), expr(right)),
            BinOp::FloorDiv => format!("({} / {})", expr(left), expr(right)),
            BinOp::MatMult => opaque(e),
            op => format!("({} {} {})", expr(left), op.symbol(), expr(right)),
        },
        Expr::UnaryOp { op, operand } => {
            let symbol = match op {
                UnaryOp::Not => "!",
                UnaryOp::Minus => "-",
                UnaryOp::Plus => "+",
                UnaryOp::Invert => "~",
            };
            format!("{}({})", symbol, expr(operand))
        }
        Expr::BoolOp { op, values } => {
            let joiner = match op {
                BoolOp::And => " && ",
                BoolOp::Or => " || ",
            };
            format!(
                "({})",
                values.iter().map(expr).collect::<Vec<_>>().join(joiner)
            )
        }
        Expr::Compare {
            left,
            ops,
            comparators,
        } => {
            let mut terms = Vec::with_capacity(ops.len());
            let mut lhs = left.as_ref();
            for (op, rhs) in ops.iter().zip(comparators) {
                let symbol = match op {
                    CmpOp::Eq | CmpOp::Is => "==",
                    CmpOp::NotEq | CmpOp::IsNot => "!=",
                    CmpOp::Lt => "<",
                    CmpOp::LtE => "<=",
                    CmpOp::Gt => ">",
                    CmpOp::GtE => ">=",
                    CmpOp::In | CmpOp::NotIn => return opaque(e),
                };
                terms.push(format!("({} {} {})", expr(lhs), symbol, expr(rhs)));
                lhs = rhs;
            }
            if terms.len() == 1 {
                terms.remove(0)
            } else {
                format!("({})", terms.join(" && "))
            }
        }
        Expr::Call { func, args, .. } => call(e, func, args),
        Expr::Attribute { value, attr } if is_name(value, "math") => format!("std::{}", attr),
        Expr::Attribute { value, attr } => format!("{}.{}", expr(value), attr),
        Expr::Subscript { value, index } => match index.as_ref() {
            Expr::Slice { .. } | Expr::Tuple(_) => opaque(e),
            index => format!("{}[{}]", expr(value), expr(index)),
        },
        Expr::List(items) | Expr::Tuple(items) | Expr::Set(items) => {
            format!("{{{}}}", items.iter().map(expr).collect::<Vec<_>>().join(", "))
        }
        Expr::Dict(pairs) => {
            let entries: Vec<String> = pairs
                .iter()
                .map(|(k, v)| format!("{{{}, {}}}", expr(k), expr(v)))
                .collect();
            format!("{{{}}}", entries.join(", "))
        }
        Expr::IfExp { test, body, orelse } => {
            format!("({} ? {} : {})", condition(test), expr(body), expr(orelse))
        }
        Expr::Slice { .. } | Expr::Starred(_) | Expr::Opaque(_) => opaque(e),
    }
}

fn call(whole: &Expr, func: &Expr, args: &[Expr]) -> String {
    if args.iter().any(|a| matches!(a, Expr::Starred(_))) {
        return opaque(whole);
    }
    let rendered: Vec<String> = args.iter().map(expr).collect();

    if let Expr::Name(name) = func {
        match (name.as_str(), rendered.as_slice()) {
            ("print", _) => return print(args),
            ("input", [prompt, ..]) => return format!("std::cin >> {}", prompt),
            ("input", []) => return "std::cin >> input_var".to_string(),
            ("len", [x]) => return format!("{}.size()", x),
            ("str", [x]) => return format!("std::to_string({})", x),
            ("int", [x]) => return format!("static_cast<int>({})", x),
            ("float", [x]) => return format!("static_cast<double>({})", x),
            _ => {}
        }
        if let Some(mapped) = CALL_MAP.get(name.as_str()) {
            return format!("{}({})", mapped, rendered.join(", "));
        }
    }
    format!("{}({})", expr(func), rendered.join(", "))
}

/// Approximate Python source for expressions carried into comments.
fn to_python(e: &Expr) -> String {
    match e {
        Expr::Name(name) | Expr::Num(name) | Expr::Opaque(name) => name.clone(),
        Expr::Str(text) => format!("{:?}", text),
        Expr::FString(parts) => {
            let body: String = parts
                .iter()
                .map(|part| match part {
                    FStringPart::Literal(text) => text.replace('{', "{{").replace('}', "}}"),
                    FStringPart::Expr(e) => format!("{{{}}}", to_python(e)),
                })
                .collect();
            format!("f{:?}", body)
        }
        Expr::Bool(true) => "True".to_string(),
        Expr::Bool(false) => "False".to_string(),
        Expr::NoneLit => "None".to_string(),
        Expr::BinOp { left, op, right } => {
            format!("{} {} {}", to_python(left), op.symbol(), to_python(right))
        }
        Expr::UnaryOp { op, operand } => {
            let symbol = match op {
                UnaryOp::Not => "not ",
                UnaryOp::Minus => "-",
                UnaryOp::Plus => "+",
                UnaryOp::Invert => "~",
            };
            format!("{}{}", symbol, to_python(operand))
        }
        Expr::BoolOp { op, values } => {
            let joiner = match op {
                BoolOp::And => " and ",
                BoolOp::Or => " or ",
            };
            values.iter().map(to_python).collect::<Vec<_>>().join(joiner)
        }
        Expr::Compare {
            left,
            ops,
            comparators,
        } => {
            let mut out = to_python(left);
            for (op, rhs) in ops.iter().zip(comparators) {
                let symbol = match op {
                    CmpOp::Eq => "==",
                    CmpOp::NotEq => "!=",
                    CmpOp::Lt => "<",
                    CmpOp::LtE => "<=",
                    CmpOp::Gt => ">",
                    CmpOp::GtE => ">=",
                    CmpOp::Is => "is",
                    CmpOp::IsNot => "is not",
                    CmpOp::In => "in",
                    CmpOp::NotIn => "not in",
                };
                out.push_str(&format!(" {} {}", symbol, to_python(rhs)));
            }
            out
        }
        Expr::Call {
            func,
            args,
            keywords,
        } => {
            let mut parts: Vec<String> = args.iter().map(to_python).collect();
            for kw in keywords {
                match &kw.name {
                    Some(name) => parts.push(format!("{}={}", name, to_python(&kw.value))),
                    None => parts.push(format!("**{}", to_python(&kw.value))),
                }
            }
            format!("{}({})", to_python(func), parts.join(", "))
        }
        Expr::Attribute { value, attr } => format!("{}.{}", to_python(value), attr),
        Expr::Subscript { value, index } => format!("{}[{}]", to_python(value), to_python(index)),
        Expr::Slice { lower, upper, step } => {
            let part = |p: &Option<Box<Expr>>| p.as_deref().map(to_python).unwrap_or_default();
            match step {
                Some(_) => format!("{}:{}:{}", part(lower), part(upper), part(step)),
                None => format!("{}:{}", part(lower), part(upper)),
            }
        }
        Expr::List(items) => format!("[{}]", join_python(items)),
        Expr::Tuple(items) => format!("({})", join_python(items)),
        Expr::Set(items) => format!("{{{}}}", join_python(items)),
        Expr::Dict(pairs) => {
            let entries: Vec<String> = pairs
                .iter()
                .map(|(k, v)| format!("{}: {}", to_python(k), to_python(v)))
                .collect();
            format!("{{{}}}", entries.join(", "))
        }
        Expr::IfExp { test, body, orelse } => format!(
            "{} if {} else {}",
            to_python(body),
            to_python(test),
            to_python(orelse)
        ),
        Expr::Starred(inner) => format!("*{}", to_python(inner)),
    }
}

fn join_python(items: &[Expr]) -> String {
    items.iter().map(to_python).collect::<Vec<_>>().join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn convert(src: &str) -> String {
        python_to_cpp(src).unwrap()
    }

    #[test]
    fn test_includes_sorted_and_deduplicated() {
        let out = convert("import math\nimport time\nfrom math import sqrt\nx = 1\n");
        assert!(out.starts_with(
            "#include <cmath>\n#include <ctime>\n#include <iostream>\n#include <string>\n\n"
        ));
    }

    #[test]
    fn test_function_with_typed_params() {
        let out = convert("def add(a: int, b: float) -> float:\n    return a + b\n");
        assert!(out.contains("double add(int a, double b) {\n    return (a + b);\n}"));
    }

    #[test]
    fn test_return_type_inference() {
        let out = convert("def f(x):\n    if x:\n        return 1\n    return 0\n\ndef g():\n    print('hi')\n");
        assert!(out.contains("auto f(auto x) {"));
        assert!(out.contains("void g() {"));
        assert!(out.contains("std::cout << \"hi\" << std::endl;"));
    }

    #[test]
    fn test_strip_outer_parens_ignores_literals() {
        assert_eq!(strip_outer_parens(r#"(a + "(").f(b)"#), r#"(a + "(").f(b)"#);
        assert_eq!(strip_outer_parens(r#"(x == ")")"#), r#"x == ")""#);
        assert_eq!(strip_outer_parens(r#"(c == '\'')"#), r#"c == '\''"#);
        assert_eq!(strip_outer_parens("(a) + (b)"), "(a) + (b)");

        let out = convert("if x == \")\":\n    y = 1\n");
        assert!(out.contains("if (x == \")\") {"));
    }

    #[test]
    fn test_main_stub_appended() {
        let out = convert("x = 5\n");
        assert!(out.contains("auto x = 5;"));
        assert!(out.ends_with(&format!("\n\n{}", MAIN_STUB)));
    }

    #[test]
    fn test_main_stub_skipped_when_main_present() {
        let out = convert("def main():\n    pass\n");
        assert!(out.contains("void main() {"));
        assert!(!out.contains("Your code will be executed here"));
    }

    #[test]
    fn test_redeclaration_avoided() {
        let out = convert("def f():\n    total = 0\n    total = total + 1\n    total += 2\n");
        assert!(out.contains("    auto total = 0;\n    total = (total + 1);\n    total += 2;"));
    }

    #[test]
    fn test_range_loops() {
        let out = convert("for i in range(10):\n    print(i)\nfor j in range(1, 10, 2):\n    pass\nfor k in range(5, 0, -1):\n    pass\n");
        assert!(out.contains("for (int i = 0; i < 10; i++) {\n    std::cout << i << std::endl;\n}"));
        assert!(out.contains("for (int j = 1; j < 10; j += 2) {"));
        assert!(out.contains("for (int k = 5; k > 0; k += -(1)) {"));
    }

    #[test]
    fn test_range_for_over_iterable() {
        let out = convert("for name in names:\n    print(name)\n");
        assert!(out.contains("for (auto name : names) {"));
    }

    #[test]
    fn test_if_elif_else_chain() {
        let out = convert("if x > 1:\n    y = 1\nelif x == 0:\n    y = 0\nelse:\n    y = 2\n");
        assert!(out.contains("if (x > 1) {\n    auto y = 1;\n} else if (x == 0) {\n    auto y = 0;\n} else {\n    auto y = 2;\n}"));
    }

    #[test]
    fn test_expression_mappings() {
        let out = convert(
            "a = 2 ** 3\nb = 7 // 2\nc = not a\nd = len(s)\ne = str(5)\nf = math.sqrt(4)\ng = input()\nh = [1, 2]\ni = a if b else c\nj = x is None\n",
        );
        assert!(out.contains("auto a = std::pow(2, 3);"));
        assert!(out.contains("auto b = (7 / 2);"));
        assert!(out.contains("auto c = !(a);"));
        assert!(out.contains("auto d = s.size();"));
        assert!(out.contains("auto e = std::to_string(5);"));
        assert!(out.contains("auto f = std::sqrt(4);"));
        assert!(out.contains("auto g = std::cin >> input_var;"));
        assert!(out.contains("auto h = {1, 2};"));
        assert!(out.contains("auto i = (b ? a : c);"));
        assert!(out.contains("auto j = (x == nullptr);"));
    }

    #[test]
    fn test_print_fstring() {
        let out = convert("name = 'Ann'\nprint(f\"Hi {name}!\")\n");
        assert!(out.contains("std::cout << \"Hi \" << name << \"!\" << std::endl;"));
    }

    #[test]
    fn test_unsupported_statements_become_comments() {
        let out = convert("class Point:\n    pass\n\nsquares = [i * i for i in range(3)]\n");
        assert!(out.contains("// unsupported: class Point"));
        assert!(out.contains("auto squares = /* [i * i for i in range(3)] */;"));
    }

    #[test]
    fn test_chained_comparison() {
        let out = convert("ok = 0 < x < 10\n");
        assert!(out.contains("auto ok = ((0 < x) && (x < 10));"));
    }

    #[test]
    fn test_parse_error_reported() {
        let err = python_to_cpp("def broken(:\n").unwrap_err();
        assert!(err.to_string().contains("Error converting Python to C++"));
    }

    #[test]
    fn test_string_escapes() {
        let out = convert("print(\"say \\\"hi\\\"\\n\")\n");
        assert!(out.contains(r#"std::cout << "say \"hi\"\n" << std::endl;"#));
    }
}
