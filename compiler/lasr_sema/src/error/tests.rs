use super::*;
use pretty_assertions::assert_eq;

#[test]
fn duplicate_symbol_diagnostic_carries_both_locations() {
    let first = Location::on_line(1, 1, 10);
    let second = Location::on_line(5, 1, 10);
    let err = SemanticError::new(
        ErrorKind::DuplicateSymbol {
            name: "f".to_owned(),
        },
        second,
    )
    .with_label(first, "first declared here");

    let diag = err.to_diagnostic();
    assert_eq!(diag.code, ErrorCode::E1002);
    assert_eq!(diag.primary_location(), Some(second));
    assert_eq!(diag.labels.len(), 2);
    assert_eq!(diag.labels[1].loc, first);
    assert!(!diag.labels[1].is_primary);
}

#[test]
fn hint_becomes_suggestion() {
    let err = SemanticError::new(
        ErrorKind::InputParameterAssignment {
            name: "x".to_owned(),
        },
        Location::on_line(2, 5, 9),
    )
    .with_hint("declare the parameter as `InOut[i32]`");

    let diag = err.to_diagnostic();
    assert_eq!(diag.code, ErrorCode::E5002);
    assert_eq!(diag.message, "cannot assign to `in` parameter `x`");
    assert_eq!(diag.suggestions, vec!["declare the parameter as `InOut[i32]`"]);
}

#[test]
fn messages_render_from_kind() {
    let kind = ErrorKind::ArityMismatch {
        callee: "f".to_owned(),
        expected: 2,
        found: 3,
    };
    assert_eq!(kind.to_string(), "`f` takes 2 argument(s) but 3 were given");

    let err = SemanticError::new(ErrorKind::DivisionByZero, Location::on_line(4, 2, 6));
    assert_eq!(err.to_string(), "4:2-6: division by zero");
}

#[test]
fn codes_group_by_area() {
    assert!(ErrorKind::ModuleNotFound {
        module: "m".to_owned()
    }
    .code()
    .is_module_error());
    assert!(ErrorKind::InconsistentTypeVariable {
        param: "T".to_owned(),
        first: "i32".to_owned(),
        second: "f64".to_owned(),
    }
    .code()
    .is_generic_error());
}
