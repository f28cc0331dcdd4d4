use super::*;

#[test]
fn test_error_code_display() {
    assert_eq!(ErrorCode::E1001.to_string(), "E1001");
    assert_eq!(ErrorCode::W2001.as_str(), "W2001");
}

#[test]
fn test_every_code_round_trips_through_from_str() {
    for code in ErrorCode::ALL {
        assert_eq!(code.as_str().parse::<ErrorCode>(), Ok(*code));
    }
}

#[test]
fn test_from_str_is_case_insensitive() {
    assert_eq!("e4001".parse::<ErrorCode>(), Ok(ErrorCode::E4001));
    assert_eq!("X0000".parse::<ErrorCode>(), Err(()));
}

#[test]
fn test_categories_are_disjoint() {
    for code in ErrorCode::ALL {
        let categories = [
            code.is_symbol_error(),
            code.is_type_error(),
            code.is_generic_error(),
            code.is_module_error(),
            code.is_warning(),
        ];
        assert!(
            categories.iter().filter(|c| **c).count() <= 1,
            "{code} belongs to more than one category"
        );
    }
}

#[test]
fn test_module_codes() {
    assert!(ErrorCode::E4001.is_module_error());
    assert!(ErrorCode::E4002.is_module_error());
    assert!(!ErrorCode::E4001.is_type_error());
    assert!(!ErrorCode::E4001.is_warning());
}
