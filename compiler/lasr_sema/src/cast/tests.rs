use super::*;
use crate::ir::Constant;
use crate::symbols::{Symbol, SymbolKind, Variable};
use pretty_assertions::assert_eq;

fn loc() -> Location {
    Location::on_line(1, 1, 2)
}

fn var_of(arena: &mut SymbolArena, ty: Ty) -> Expr {
    let root = arena.new_scope(None);
    let name = arena.unique_name(root, "v");
    let id = arena
        .add(
            root,
            Symbol::new(name, loc(), SymbolKind::Variable(Variable::local(ty.clone()))),
        )
        .unwrap();
    Expr::var(id, ty, loc())
}

#[test]
fn casting_is_idempotent() {
    let arena = SymbolArena::new();
    let once = perform_casting(Expr::integer(3, 4, loc()), &Ty::real(8), &arena).unwrap();
    let twice = perform_casting(once.clone(), &Ty::real(8), &arena).unwrap();
    assert_eq!(once, twice);
    assert_eq!(once.value, Some(Constant::Real(3.0)));
    assert!(matches!(
        once.kind,
        ExprKind::Cast {
            kind: CastKind::IntegerToReal,
            ..
        }
    ));
}

#[test]
fn equal_types_are_not_wrapped() {
    let arena = SymbolArena::new();
    let expr = Expr::integer(3, 4, loc());
    let cast = perform_casting(expr.clone(), &Ty::constant(Ty::integer(4)), &arena).unwrap();
    assert_eq!(cast, expr);
}

#[test]
fn binop_operands_widen_toward_priority() {
    let mut arena = SymbolArena::new();
    let x = var_of(&mut arena, Ty::integer(4));
    let y = var_of(&mut arena, Ty::real(8));
    let (l, r, ty) = unify_binop_operands(x, y.clone(), &arena).unwrap();
    assert_eq!(ty, Ty::real(8));
    assert_eq!(r, y);
    assert_eq!(l.ty, Ty::real(8));

    let b = var_of(&mut arena, Ty::logical());
    let n = var_of(&mut arena, Ty::integer(8));
    let (l, _, ty) = unify_binop_operands(b, n, &arena).unwrap();
    assert_eq!(ty, Ty::integer(8));
    assert!(matches!(
        l.kind,
        ExprKind::Cast {
            kind: CastKind::LogicalToInteger,
            ..
        }
    ));
}

#[test]
fn wider_integer_wins_ties_in_category() {
    let mut arena = SymbolArena::new();
    let a = var_of(&mut arena, Ty::integer(8));
    let b = var_of(&mut arena, Ty::integer(4));
    let (_, r, ty) = unify_binop_operands(a, b, &arena).unwrap();
    assert_eq!(ty, Ty::integer(8));
    assert_eq!(r.ty, Ty::integer(8));
}

#[test]
fn pointer_operands_need_identical_pointees() {
    let mut arena = SymbolArena::new();
    let p = var_of(&mut arena, Ty::pointer(Ty::integer(4)));
    let q = var_of(&mut arena, Ty::pointer(Ty::integer(8)));
    let err = unify_binop_operands(p.clone(), q, &arena).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::IncompatiblePointerTypes { .. }));

    let i = var_of(&mut arena, Ty::integer(4));
    let (_, _, ty) = unify_binop_operands(p, i, &arena).unwrap();
    assert_eq!(ty, Ty::integer(4));
}

#[test]
fn strict_assignment_rejects_integer_to_real() {
    let mut arena = SymbolArena::new();
    let options = CompilerOptions::default();
    let x = var_of(&mut arena, Ty::integer(4));
    let err = cast_for_assignment(x, &Ty::real(8), &arena, &options).unwrap_err();
    assert_eq!(
        err.kind,
        ErrorKind::ImplicitNarrowing {
            from: "i32".to_owned(),
            to: "f64".to_owned(),
        }
    );

    let f = var_of(&mut arena, Ty::real(8));
    let err = cast_for_assignment(f, &Ty::complex(8), &arena, &options).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::ImplicitNarrowing { .. }));

    let s = var_of(&mut arena, Ty::Character);
    let err = cast_for_assignment(s, &Ty::integer(4), &arena, &options).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::TypeMismatch { .. }));
}

#[test]
fn permissive_assignment_inserts_cast() {
    let mut arena = SymbolArena::new();
    let options = CompilerOptions::default().with_implicit_casting(true);
    let x = var_of(&mut arena, Ty::integer(4));
    let cast = cast_for_assignment(x, &Ty::real(8), &arena, &options).unwrap();
    assert!(matches!(
        cast.kind,
        ExprKind::Cast {
            kind: CastKind::IntegerToReal,
            ..
        }
    ));
    let f = var_of(&mut arena, Ty::real(8));
    let cast = cast_for_argument(f, &Ty::integer(8), &arena, &options).unwrap();
    assert_eq!(cast.ty, Ty::integer(8));
}

#[test]
fn literals_adapt_within_category() {
    let arena = SymbolArena::new();
    let options = CompilerOptions::default();
    let wide = cast_for_assignment(Expr::integer(5, 4, loc()), &Ty::integer(8), &arena, &options)
        .unwrap();
    assert_eq!(wide.ty, Ty::integer(8));
    assert_eq!(wide.value, Some(Constant::Integer(5)));

    let err = cast_for_assignment(
        Expr::integer(300, 4, loc()),
        &Ty::integer(1),
        &arena,
        &options,
    )
    .unwrap_err();
    assert!(matches!(err.kind, ErrorKind::TypeMismatch { .. }));
}

#[test]
fn unrelated_types_do_not_cast() {
    let arena = SymbolArena::new();
    assert_eq!(cast_kind(&Ty::Character, &Ty::real(8)), None);
    assert_eq!(cast_kind(&Ty::list(Ty::integer(4)), &Ty::integer(4)), None);
    let err = perform_casting(Expr::string("a", loc()), &Ty::real(8), &arena).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::TypeMismatch { .. }));
}
