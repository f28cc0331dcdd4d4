use super::*;
use pretty_assertions::assert_eq;

#[test]
fn integer_arithmetic_on_six_and_three() {
    let six = Constant::Integer(6);
    let three = Constant::Integer(3);
    let results: Vec<_> = [BinOp::Add, BinOp::Sub, BinOp::Mul, BinOp::Div]
        .into_iter()
        .map(|op| fold_binop(&six, op, &three))
        .collect();
    assert_eq!(
        results,
        vec![
            Some(Constant::Integer(9)),
            Some(Constant::Integer(3)),
            Some(Constant::Integer(18)),
            Some(Constant::Integer(2)),
        ]
    );
}

#[test]
fn division_and_modulo_round_toward_negative_infinity() {
    assert_eq!(integer_binop(-7, BinOp::Div, 2), Some(-4));
    assert_eq!(integer_binop(7, BinOp::Div, -2), Some(-4));
    assert_eq!(integer_binop(-7, BinOp::Mod, 2), Some(1));
    assert_eq!(integer_binop(7, BinOp::Mod, -2), Some(-1));
    assert_eq!(integer_binop(6, BinOp::Mod, 3), Some(0));
}

#[test]
fn unfoldable_operations_yield_nothing() {
    assert_eq!(integer_binop(1, BinOp::Div, 0), None);
    assert_eq!(integer_binop(i64::MAX, BinOp::Add, 1), None);
    assert_eq!(integer_binop(2, BinOp::Pow, -1), None);
    assert_eq!(integer_binop(1, BinOp::BitLShift, 64), None);
    assert_eq!(real_binop(1.0, BinOp::Div, 0.0), None);
    assert_eq!(
        fold_binop(&Constant::Integer(1), BinOp::Add, &Constant::Real(1.0)),
        None
    );
}

#[test]
fn powers_and_shifts() {
    assert_eq!(integer_binop(2, BinOp::Pow, 10), Some(1024));
    assert_eq!(integer_binop(1, BinOp::BitLShift, 4), Some(16));
    assert_eq!(integer_binop(-16, BinOp::BitRShift, 2), Some(-4));
    assert_eq!(unsigned_binop(5, BinOp::Sub, 6), None);
}

#[test]
fn complex_arithmetic() {
    assert_eq!(
        complex_binop((1.0, 2.0), BinOp::Mul, (3.0, 4.0)),
        Some((-5.0, 10.0))
    );
    assert_eq!(complex_binop((1.0, 0.0), BinOp::Div, (0.0, 0.0)), None);
}

#[test]
fn comparisons() {
    assert_eq!(
        fold_compare(&Constant::Integer(1), CmpOp::Lt, &Constant::Integer(2)),
        Some(true)
    );
    assert_eq!(
        fold_compare(
            &Constant::Str("b".to_owned()),
            CmpOp::GtE,
            &Constant::Str("a".to_owned())
        ),
        Some(true)
    );
    assert_eq!(
        fold_compare(
            &Constant::Complex(1.0, 1.0),
            CmpOp::Lt,
            &Constant::Complex(2.0, 0.0)
        ),
        None
    );
}

#[test]
fn unary_and_logical() {
    assert_eq!(
        fold_unary_minus(&Constant::Integer(5)),
        Some(Constant::Integer(-5))
    );
    assert_eq!(fold_unary_minus(&Constant::Integer(i64::MIN)), None);
    assert_eq!(fold_bit_not(&Constant::Integer(0)), Some(Constant::Integer(-1)));
    assert_eq!(
        fold_not(&Constant::Logical(true)),
        Some(Constant::Logical(false))
    );
    assert_eq!(
        fold_logical(
            &Constant::Logical(true),
            LogicalOp::And,
            &Constant::Logical(false)
        ),
        Some(Constant::Logical(false))
    );
}

#[test]
fn casts_convert_values() {
    assert_eq!(
        fold_cast(CastKind::IntegerToReal, &Constant::Integer(3), &Ty::real(8)),
        Some(Constant::Real(3.0))
    );
    assert_eq!(
        fold_cast(CastKind::RealToInteger, &Constant::Real(-2.7), &Ty::integer(4)),
        Some(Constant::Integer(-2))
    );
    assert_eq!(
        fold_cast(
            CastKind::CharacterToInteger,
            &Constant::Str("A".to_owned()),
            &Ty::integer(4)
        ),
        Some(Constant::Integer(65))
    );
    assert_eq!(
        fold_cast(
            CastKind::IntegerToSymbolicExpression,
            &Constant::Integer(1),
            &Ty::SymbolicExpression
        ),
        None
    );
}

#[test]
fn real_floor_division() {
    assert_eq!(real_floor_div(7.0, 2.0), Some(3.0));
    assert_eq!(real_floor_div(-7.0, 2.0), Some(-4.0));
    assert_eq!(real_floor_div(1.0, 0.0), None);
}
