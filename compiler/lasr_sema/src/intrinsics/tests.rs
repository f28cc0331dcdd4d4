use super::*;
use pretty_assertions::assert_eq;

fn loc() -> Location {
    Location::on_line(3, 1, 10)
}

#[test]
fn names_round_trip() {
    for name in ["abs", "len", "min", "max", "pow"] {
        assert_eq!(Intrinsic::from_name(name).map(Intrinsic::name), Some(name));
    }
    assert_eq!(Intrinsic::from_name("round"), None);
    assert_eq!(Intrinsic::from_name("divmod"), None);
}

#[test]
fn abs_folds_and_keeps_type() {
    let arena = SymbolArena::new();
    let expr = lower_intrinsic(
        Intrinsic::Abs,
        vec![Expr::integer(-4, 8, loc())],
        loc(),
        &arena,
    )
    .unwrap();
    assert_eq!(expr.ty, Ty::integer(8));
    assert_eq!(expr.value, Some(Constant::Integer(4)));
}

#[test]
fn len_of_string_literal_is_known() {
    let arena = SymbolArena::new();
    let expr = lower_intrinsic(
        Intrinsic::Len,
        vec![Expr::string("héllo", loc())],
        loc(),
        &arena,
    )
    .unwrap();
    assert_eq!(expr.ty, Ty::integer(4));
    assert_eq!(expr.integer_value(), Some(5));
}

#[test]
fn len_rejects_scalars() {
    let arena = SymbolArena::new();
    let err = lower_intrinsic(
        Intrinsic::Len,
        vec![Expr::integer(1, 4, loc())],
        loc(),
        &arena,
    )
    .unwrap_err();
    assert_eq!(err.code(), lasr_diagnostic::ErrorCode::E2008);
}

#[test]
fn min_widens_mixed_arguments() {
    let arena = SymbolArena::new();
    let expr = lower_intrinsic(
        Intrinsic::Min,
        vec![
            Expr::integer(3, 4, loc()),
            Expr::real(2.5, 8, loc()),
            Expr::integer(7, 4, loc()),
        ],
        loc(),
        &arena,
    )
    .unwrap();
    assert_eq!(expr.ty, Ty::real(8));
    assert_eq!(expr.value, Some(Constant::Real(2.5)));
}

#[test]
fn max_needs_two_arguments() {
    let arena = SymbolArena::new();
    let err = lower_intrinsic(
        Intrinsic::Max,
        vec![Expr::integer(3, 4, loc())],
        loc(),
        &arena,
    )
    .unwrap_err();
    assert_eq!(
        err.kind,
        ErrorKind::ArityMismatch {
            callee: "max".to_owned(),
            expected: 2,
            found: 1,
        }
    );
}

#[test]
fn pow_folds_like_the_operator() {
    let arena = SymbolArena::new();
    let expr = lower_intrinsic(
        Intrinsic::Pow,
        vec![Expr::integer(2, 4, loc()), Expr::integer(5, 4, loc())],
        loc(),
        &arena,
    )
    .unwrap();
    assert_eq!(expr.value, Some(Constant::Integer(32)));
}

#[test]
fn real_floor_division() {
    let arena = SymbolArena::new();
    let expr = lower_intrinsic(
        Intrinsic::FloorDiv,
        vec![Expr::real(7.0, 8, loc()), Expr::real(2.0, 8, loc())],
        loc(),
        &arena,
    )
    .unwrap();
    assert_eq!(expr.value, Some(Constant::Real(3.0)));
}
