//! Constructors for synthesized syntax trees.
//!
//! Every node gets [`Location::DUMMY`]; use [`Stmt::at`] / [`Expr::at`] when
//! a test needs to observe a particular location.
//!
//! ```text
//! let f = def("f", vec![param("x", ann("i32"))], Some(ann("i32")),
//!     vec![ret(Some(binop(name("x"), Operator::Add, int(1))))]);
//! ```

use super::{
    Alias, Arg, BoolOperator, ClassDef, CmpOperator, Expr, ExprKind, FunctionDef, Keyword, Module,
    Operator, Stmt, StmtKind, UnaryOperator, WithItem,
};
use crate::Location;

fn expr(kind: ExprKind) -> Expr {
    Expr::new(kind, Location::DUMMY)
}

fn stmt(kind: StmtKind) -> Stmt {
    Stmt::new(kind, Location::DUMMY)
}

pub fn module(body: Vec<Stmt>) -> Module {
    Module {
        body,
        loc: Location::DUMMY,
    }
}

// Expressions

pub fn name(id: &str) -> Expr {
    expr(ExprKind::Name(id.to_owned()))
}

pub fn int(value: i64) -> Expr {
    expr(ExprKind::Int(value))
}

pub fn float(value: f64) -> Expr {
    expr(ExprKind::Float(value))
}

pub fn imag(value: f64) -> Expr {
    expr(ExprKind::Imag(value))
}

pub fn string(value: &str) -> Expr {
    expr(ExprKind::Str(value.to_owned()))
}

pub fn boolean(value: bool) -> Expr {
    expr(ExprKind::Bool(value))
}

pub fn none() -> Expr {
    expr(ExprKind::NoneLit)
}

pub fn binop(left: Expr, op: Operator, right: Expr) -> Expr {
    expr(ExprKind::BinOp {
        left: Box::new(left),
        op,
        right: Box::new(right),
    })
}

pub fn unary(op: UnaryOperator, operand: Expr) -> Expr {
    expr(ExprKind::UnaryOp {
        op,
        operand: Box::new(operand),
    })
}

pub fn boolop(op: BoolOperator, values: Vec<Expr>) -> Expr {
    expr(ExprKind::BoolOp { op, values })
}

pub fn compare(left: Expr, op: CmpOperator, right: Expr) -> Expr {
    expr(ExprKind::Compare {
        left: Box::new(left),
        ops: vec![op],
        comparators: vec![right],
    })
}

pub fn compare_chain(left: Expr, rest: Vec<(CmpOperator, Expr)>) -> Expr {
    let (ops, comparators) = rest.into_iter().unzip();
    expr(ExprKind::Compare {
        left: Box::new(left),
        ops,
        comparators,
    })
}

pub fn call(func: Expr, args: Vec<Expr>) -> Expr {
    call_kw(func, args, Vec::new())
}

pub fn call_kw(func: Expr, args: Vec<Expr>, keywords: Vec<(&str, Expr)>) -> Expr {
    let keywords = keywords
        .into_iter()
        .map(|(arg, value)| Keyword {
            arg: arg.to_owned(),
            value,
            loc: Location::DUMMY,
        })
        .collect();
    expr(ExprKind::Call {
        func: Box::new(func),
        args,
        keywords,
    })
}

pub fn attr(value: Expr, attr: &str) -> Expr {
    expr(ExprKind::Attribute {
        value: Box::new(value),
        attr: attr.to_owned(),
    })
}

pub fn subscript(value: Expr, slice: Expr) -> Expr {
    expr(ExprKind::Subscript {
        value: Box::new(value),
        slice: Box::new(slice),
    })
}

pub fn slice(lower: Option<Expr>, upper: Option<Expr>) -> Expr {
    expr(ExprKind::Slice {
        lower: lower.map(Box::new),
        upper: upper.map(Box::new),
        step: None,
    })
}

pub fn list(elements: Vec<Expr>) -> Expr {
    expr(ExprKind::List(elements))
}

pub fn tuple(elements: Vec<Expr>) -> Expr {
    expr(ExprKind::Tuple(elements))
}

pub fn set(elements: Vec<Expr>) -> Expr {
    expr(ExprKind::Set(elements))
}

pub fn dict(entries: Vec<(Expr, Expr)>) -> Expr {
    let (keys, values) = entries.into_iter().unzip();
    expr(ExprKind::Dict { keys, values })
}

pub fn if_exp(test: Expr, body: Expr, orelse: Expr) -> Expr {
    expr(ExprKind::IfExp {
        test: Box::new(test),
        body: Box::new(body),
        orelse: Box::new(orelse),
    })
}

/// Parse an annotation written in source syntax, e.g. `"dict[i32, f64]"`.
///
/// Text that does not parse is kept as a single name, which the analyser
/// then reports as an undeclared type.
pub fn ann(src: &str) -> Expr {
    parse_annotation(src).unwrap_or_else(|_| name(src))
}

/// Parse an annotation written in source syntax.
pub fn parse_annotation(src: &str) -> Result<Expr, String> {
    let mut parser = AnnotationParser {
        chars: src.chars().collect(),
        pos: 0,
    };
    let parsed = parser.primary()?;
    parser.skip_ws();
    if parser.pos != parser.chars.len() {
        return Err(format!("trailing input at offset {} in `{src}`", parser.pos));
    }
    Ok(parsed)
}

struct AnnotationParser {
    chars: Vec<char>,
    pos: usize,
}

impl AnnotationParser {
    fn skip_ws(&mut self) {
        while self.chars.get(self.pos).is_some_and(|c| c.is_whitespace()) {
            self.pos += 1;
        }
    }

    fn peek(&mut self) -> Option<char> {
        self.skip_ws();
        self.chars.get(self.pos).copied()
    }

    fn eat(&mut self, c: char) -> bool {
        if self.peek() == Some(c) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn word(&mut self) -> String {
        let start = self.pos;
        while self
            .chars
            .get(self.pos)
            .is_some_and(|c| c.is_alphanumeric() || *c == '_')
        {
            self.pos += 1;
        }
        self.chars[start..self.pos].iter().collect()
    }

    fn atom(&mut self) -> Result<Expr, String> {
        match self.peek() {
            Some('[') => {
                self.pos += 1;
                let mut elements = Vec::new();
                if !self.eat(']') {
                    loop {
                        elements.push(self.primary()?);
                        if self.eat(']') {
                            break;
                        }
                        if !self.eat(',') {
                            return Err(format!("expected `,` or `]` at offset {}", self.pos));
                        }
                    }
                }
                Ok(list(elements))
            }
            Some(c) if c.is_ascii_digit() => {
                let digits = self.word();
                digits
                    .parse()
                    .map(int)
                    .map_err(|_| format!("invalid integer `{digits}`"))
            }
            Some(c) if c.is_alphabetic() || c == '_' => {
                let word = self.word();
                Ok(if word == "None" { none() } else { name(&word) })
            }
            other => Err(format!("unexpected {other:?} at offset {}", self.pos)),
        }
    }

    fn primary(&mut self) -> Result<Expr, String> {
        let mut value = self.atom()?;
        loop {
            if self.eat('.') {
                let field = self.word();
                if field.is_empty() {
                    return Err(format!("expected attribute name at offset {}", self.pos));
                }
                value = attr(value, &field);
            } else if self.eat('[') {
                let mut items = vec![self.item()?];
                while self.eat(',') {
                    items.push(self.item()?);
                }
                if !self.eat(']') {
                    return Err(format!("expected `]` at offset {}", self.pos));
                }
                let index = if items.len() == 1 {
                    items.remove(0)
                } else {
                    tuple(items)
                };
                value = subscript(value, index);
            } else {
                return Ok(value);
            }
        }
    }

    fn item(&mut self) -> Result<Expr, String> {
        let lower = if self.peek() == Some(':') {
            None
        } else {
            Some(self.primary()?)
        };
        if !self.eat(':') {
            return lower.ok_or_else(|| format!("expected expression at offset {}", self.pos));
        }
        let upper = match self.peek() {
            Some(',' | ']') | None => None,
            Some(_) => Some(self.primary()?),
        };
        Ok(slice(lower, upper))
    }
}

// Statements

/// A parameter with an annotation.
pub fn param(name: &str, annotation: Expr) -> Arg {
    Arg {
        name: name.to_owned(),
        annotation: Some(annotation),
        default: None,
        loc: Location::DUMMY,
    }
}

/// A parameter with an annotation and a default value.
pub fn param_default(name: &str, annotation: Expr, default: Expr) -> Arg {
    Arg {
        default: Some(default),
        ..param(name, annotation)
    }
}

pub fn def(name: &str, args: Vec<Arg>, returns: Option<Expr>, body: Vec<Stmt>) -> Stmt {
    stmt(StmtKind::FunctionDef(FunctionDef {
        name: name.to_owned(),
        args,
        returns,
        body,
        decorators: Vec::new(),
    }))
}

pub fn class(name: &str, bases: Vec<Expr>, body: Vec<Stmt>) -> Stmt {
    stmt(StmtKind::ClassDef(ClassDef {
        name: name.to_owned(),
        bases,
        body,
        decorators: Vec::new(),
    }))
}

/// Attach decorators to a function or class definition.
///
/// Other statements are returned unchanged.
pub fn decorated(mut definition: Stmt, decorators: Vec<Expr>) -> Stmt {
    match &mut definition.kind {
        StmtKind::FunctionDef(def) => def.decorators.extend(decorators),
        StmtKind::ClassDef(class) => class.decorators.extend(decorators),
        _ => {}
    }
    definition
}

pub fn ann_assign(target: &str, annotation: Expr, value: Option<Expr>) -> Stmt {
    stmt(StmtKind::AnnAssign {
        target: name(target),
        annotation,
        value,
    })
}

pub fn assign(target: Expr, value: Expr) -> Stmt {
    stmt(StmtKind::Assign {
        targets: vec![target],
        value,
    })
}

pub fn aug_assign(target: Expr, op: Operator, value: Expr) -> Stmt {
    stmt(StmtKind::AugAssign { target, op, value })
}

pub fn expr_stmt(value: Expr) -> Stmt {
    stmt(StmtKind::Expr(value))
}

pub fn ret(value: Option<Expr>) -> Stmt {
    stmt(StmtKind::Return(value))
}

pub fn if_(test: Expr, body: Vec<Stmt>, orelse: Vec<Stmt>) -> Stmt {
    stmt(StmtKind::If { test, body, orelse })
}

pub fn while_(test: Expr, body: Vec<Stmt>) -> Stmt {
    stmt(StmtKind::While {
        test,
        body,
        orelse: Vec::new(),
    })
}

pub fn for_(target: &str, iter: Expr, body: Vec<Stmt>) -> Stmt {
    stmt(StmtKind::For {
        target: name(target),
        iter,
        body,
    })
}

pub fn assert_(test: Expr) -> Stmt {
    stmt(StmtKind::Assert { test, msg: None })
}

pub fn pass() -> Stmt {
    stmt(StmtKind::Pass)
}

pub fn brk() -> Stmt {
    stmt(StmtKind::Break)
}

pub fn cont() -> Stmt {
    stmt(StmtKind::Continue)
}

pub fn raise(exc: Option<Expr>) -> Stmt {
    stmt(StmtKind::Raise(exc))
}

pub fn delete(targets: Vec<Expr>) -> Stmt {
    stmt(StmtKind::Delete(targets))
}

pub fn with(context: Expr, target: Option<&str>, body: Vec<Stmt>) -> Stmt {
    stmt(StmtKind::With {
        items: vec![WithItem {
            context,
            target: target.map(name),
        }],
        body,
    })
}

/// `import module` or `import module as asname`.
pub fn import(module: &str, asname: Option<&str>) -> Stmt {
    stmt(StmtKind::Import(vec![Alias {
        name: module.to_owned(),
        asname: asname.map(str::to_owned),
        loc: Location::DUMMY,
    }]))
}

/// `from module import a, b`; pass `&["*"]` for a star import.
pub fn import_from(module: &str, names: &[&str]) -> Stmt {
    let pairs: Vec<(&str, Option<&str>)> = names.iter().map(|n| (*n, None)).collect();
    import_from_as(module, &pairs)
}

/// `from module import a as x, b`.
pub fn import_from_as(module: &str, names: &[(&str, Option<&str>)]) -> Stmt {
    let names = names
        .iter()
        .map(|(name, asname)| Alias {
            name: (*name).to_owned(),
            asname: asname.map(str::to_owned),
            loc: Location::DUMMY,
        })
        .collect();
    stmt(StmtKind::ImportFrom {
        module: module.to_owned(),
        names,
    })
}

#[cfg(test)]
mod tests;
