use lasr_diagnostic::ErrorCode;
use lasr_ir::ast::build::{ann, binop, call, float, int, name, subscript, unary};
use lasr_ir::ast::{Operator, UnaryOperator};
use lasr_ir::Location;
use pretty_assertions::assert_eq;

use super::*;
use crate::compile::NoModules;
use crate::options::CompilerOptions;
use crate::symbols::{Abi, StructType, Symbol, SymbolId, Variable};

/// A compilation whose root scope holds `Point { x: f64 }`, a constant
/// `n = 10` and a runtime `m: i32`.
struct Fixture<'a> {
    cx: Compilation<'a>,
    point: SymbolId,
    m: SymbolId,
}

impl Fixture<'_> {
    fn new() -> Self {
        let mut cx = Compilation::new(&NoModules, CompilerOptions::default());
        let root = cx.root;
        let arena = &mut cx.arena;

        let members = arena.new_scope(Some(root));
        let point = arena
            .add(
                root,
                Symbol::new(
                    "Point",
                    Location::DUMMY,
                    SymbolKind::Struct(StructType {
                        scope: members,
                        members: vec!["x".to_owned()],
                        abi: Abi::Source,
                    }),
                ),
            )
            .unwrap();
        arena.set_scope_owner(members, point);
        arena
            .add(
                members,
                Symbol::new(
                    "x",
                    Location::DUMMY,
                    SymbolKind::Variable(Variable::local(Ty::real(8))),
                ),
            )
            .unwrap();

        let mut n = Variable::local(Ty::constant(Ty::integer(4)));
        n.value = Some(Constant::Integer(10));
        arena
            .add(root, Symbol::new("n", Location::DUMMY, SymbolKind::Variable(n)))
            .unwrap();
        let m = arena
            .add(
                root,
                Symbol::new(
                    "m",
                    Location::DUMMY,
                    SymbolKind::Variable(Variable::local(Ty::integer(4))),
                ),
            )
            .unwrap();
        Fixture { cx, point, m }
    }

    fn resolve(&mut self, src: &str) -> SemaResult<Annotation> {
        let root = self.cx.root;
        resolve(&mut self.cx, root, &ann(src))
    }

    fn ty(&mut self, src: &str) -> Ty {
        self.resolve(src).unwrap().finish()
    }

    fn error(&mut self, src: &str) -> ErrorCode {
        self.resolve(src).unwrap_err().code()
    }

    fn lower(&self, expr: &ast::Expr) -> SemaResult<Expr> {
        lower_static_expr(&self.cx.arena, self.cx.root, expr)
    }
}

#[test]
fn scalars_and_containers() {
    let mut f = Fixture::new();
    assert_eq!(f.ty("i32"), Ty::integer(4));
    assert_eq!(f.ty("u16"), Ty::unsigned(2));
    assert_eq!(f.ty("c64"), Ty::complex(8));
    assert_eq!(f.ty("list[f64]"), Ty::list(Ty::real(8)));
    assert_eq!(f.ty("set[str]"), Ty::set(Ty::Character));
    assert_eq!(
        f.ty("dict[str, list[i64]]"),
        Ty::dict(Ty::Character, Ty::list(Ty::integer(8)))
    );
    assert_eq!(
        f.ty("tuple[i32, bool]"),
        Ty::Tuple(vec![Ty::integer(4), Ty::logical()])
    );
    assert_eq!(
        f.ty("Callable[[i32, f64], bool]"),
        Ty::Function(FunctionType {
            params: vec![Ty::integer(4), Ty::real(8)],
            ret: Some(Box::new(Ty::logical())),
        })
    );
    assert_eq!(
        f.ty("Callable[[], None]"),
        Ty::Function(FunctionType {
            params: Vec::new(),
            ret: None,
        })
    );
}

#[test]
fn wrappers_and_aggregates() {
    let mut f = Fixture::new();
    let point = f.point;
    assert_eq!(f.ty("Pointer[Point]"), Ty::pointer(Ty::Struct(point)));
    assert_eq!(f.ty("Const[i64]"), Ty::constant(Ty::integer(8)));
    assert_eq!(f.ty("Point.x"), Ty::real(8));

    let allocatable = f.resolve("Allocatable[f64[:]]").unwrap();
    assert!(allocatable.allocatable);
    assert_eq!(
        allocatable.finish(),
        Ty::allocatable(Ty::array(Ty::real(8), vec![Dimension::deferred()]))
    );

    let inout = f.resolve("InOut[i32[:]]").unwrap();
    assert_eq!(inout.intent, Some(Intent::InOut));
    assert_eq!(inout.ty.rank(), 1);
}

#[test]
fn array_dimensions() {
    let mut f = Fixture::new();
    let Ty::Array(base, dims) = f.ty("f64[3, :, 1:n]") else {
        panic!("expected an array");
    };
    assert_eq!(*base, Ty::real(8));
    assert_eq!(dims[0].constant_length(), Some(3));
    assert_eq!(dims[0].start.as_ref().and_then(Expr::integer_value), Some(0));
    assert!(dims[1].is_deferred());
    assert_eq!(dims[2].constant_length(), Some(10));
    assert_eq!(dims[2].start.as_ref().and_then(Expr::integer_value), Some(1));

    // A runtime bound stays symbolic.
    let m = f.m;
    let Ty::Array(_, dims) = f.ty("i32[m]") else {
        panic!("expected an array");
    };
    assert_eq!(dims[0].length.as_ref().and_then(Expr::as_var), Some(m));

    assert_eq!(f.ty("Array[i64, 2, 4]").rank(), 2);
}

#[test]
fn annotation_errors() {
    let mut f = Fixture::new();
    assert_eq!(f.error("dict[f64, i32]"), ErrorCode::E1005);
    assert_eq!(f.error("dict[c32, i32]"), ErrorCode::E1005);
    assert_eq!(f.error("Nope"), ErrorCode::E1004);
    assert_eq!(f.error("Nope.x"), ErrorCode::E1004);
    assert_eq!(f.error("n"), ErrorCode::E1003);
    assert_eq!(f.error("list[i32, i32]"), ErrorCode::E1003);
    assert_eq!(f.error("f64[:][:]"), ErrorCode::E1003);
    assert_eq!(f.error("Point.y"), ErrorCode::E1003);

    let root = f.cx.root;
    let real_bound = subscript(name("f64"), float(1.5));
    let err = resolve(&mut f.cx, root, &real_bound).unwrap_err();
    assert_eq!(err.code(), ErrorCode::E2001);
}

#[test]
fn dimension_length_simplifies() {
    let loc = Location::DUMMY;
    let n = Expr::var(SymbolId::from_raw(0), Ty::integer(4), loc);
    let one = Expr::integer(1, 4, loc);

    let length = dimension_length(&Expr::integer(3, 4, loc), Expr::integer(7, 4, loc));
    assert_eq!(length.integer_value(), Some(5));

    assert_eq!(dimension_length(&one, n.clone()), n);

    let minus_one = integer_binop(n.clone(), BinOp::Sub, one.clone());
    assert_eq!(dimension_length(&one, minus_one.clone()), minus_one);

    let plus_one = integer_binop(n.clone(), BinOp::Add, one.clone());
    assert_eq!(dimension_length(&Expr::integer(2, 4, loc), plus_one), n);
    assert_eq!(
        dimension_length(&Expr::integer(0, 4, loc), n.clone()),
        integer_binop(n.clone(), BinOp::Add, one)
    );

    // Both ends symbolic: end - start + 1.
    let a = Expr::var(SymbolId::from_raw(1), Ty::integer(4), loc);
    let length = dimension_length(&a, n.clone());
    let ExprKind::IntegerBinOp { left, op: BinOp::Add, right } = &length.kind else {
        panic!("expected an addition, found {:?}", length.kind);
    };
    assert_eq!(right.integer_value(), Some(1));
    assert!(matches!(left.kind, ExprKind::IntegerBinOp { op: BinOp::Sub, .. }));
}

#[test]
fn dimension_length_near_integer_limits() {
    let loc = Location::DUMMY;
    let n = Expr::var(SymbolId::from_raw(0), Ty::integer(8), loc);
    let zero = Expr::integer(0, 8, loc);
    let one = Expr::integer(1, 8, loc);

    // No adjustment fits in an i64: fall back to `end + 1`.
    for end in [
        integer_binop(n.clone(), BinOp::Add, Expr::integer(i64::MAX, 8, loc)),
        integer_binop(n.clone(), BinOp::Sub, Expr::integer(i64::MIN, 8, loc)),
    ] {
        assert_eq!(
            dimension_length(&zero, end.clone()),
            integer_binop(end, BinOp::Add, one.clone())
        );
    }

    let lowest = Expr::integer(i64::MIN, 8, loc);
    let whole = dimension_length(&lowest, Expr::integer(i64::MAX, 8, loc));
    assert!(matches!(whole.kind, ExprKind::IntegerBinOp { .. }));
    assert_eq!(whole.integer_value(), None);
}

#[test]
fn static_expressions_fold() {
    let f = Fixture::new();
    let value = |e: &ast::Expr| f.lower(e).unwrap().value;

    let widened = f.lower(&call(name("i64"), vec![int(5)])).unwrap();
    assert_eq!(widened.ty, Ty::integer(8));
    assert_eq!(widened.value, Some(Constant::Integer(5)));

    assert_eq!(value(&unary(UnaryOperator::USub, int(3))), Some(Constant::Integer(-3)));
    assert_eq!(value(&binop(int(7), Operator::FloorDiv, int(2))), Some(Constant::Integer(3)));
    assert_eq!(value(&binop(float(7.0), Operator::Div, float(2.0))), Some(Constant::Real(3.5)));
    assert_eq!(value(&binop(name("n"), Operator::Mult, int(2))), Some(Constant::Integer(20)));
    assert_eq!(value(&name("m")), None);

    assert_eq!(f.lower(&int(1 << 40)).unwrap().ty, Ty::integer(8));
    assert_eq!(f.lower(&int(7)).unwrap().ty, Ty::integer(4));
}

#[test]
fn static_expression_errors() {
    let f = Fixture::new();
    let code = |e: &ast::Expr| f.lower(e).unwrap_err().code();
    assert_eq!(code(&binop(int(1), Operator::FloorDiv, int(0))), ErrorCode::E2005);
    assert_eq!(code(&binop(int(7), Operator::Mod, int(2))), ErrorCode::E2008);
    assert_eq!(code(&name("missing")), ErrorCode::E1001);
    assert_eq!(code(&name("Point")), ErrorCode::E2008);
    assert_eq!(code(&call(name("len"), vec![name("m")])), ErrorCode::E9001);
}

#[test]
fn render_reads_like_source() {
    assert_eq!(render(&ann("dict[str, list[i64]]")), "dict[str, list[i64]]");
    assert_eq!(render(&ann("f64[:, 1:n]")), "f64[:, 1:n]");
    assert_eq!(render(&ann("Callable[[i32], None]")), "Callable[[i32], None]");
    assert_eq!(render(&ann("mod.Type")), "mod.Type");
}
