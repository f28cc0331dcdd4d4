use super::*;
use pretty_assertions::assert_eq;

#[test]
fn builder_collects_labels_in_order() {
    let first = Location::on_line(1, 1, 5);
    let second = Location::on_line(4, 1, 5);
    let diag = Diagnostic::error(ErrorCode::E1002)
        .with_message("symbol `x` is already declared in this scope")
        .with_label(second, "redeclared here")
        .with_secondary_label(first, "first declared here");

    assert!(diag.is_error());
    assert_eq!(diag.primary_location(), Some(second));
    assert_eq!(diag.labels.len(), 2);
    assert!(!diag.labels[1].is_primary);
    assert_eq!(diag.labels[1].loc, first);
}

#[test]
fn warning_is_not_error() {
    let diag = Diagnostic::warning(ErrorCode::W2001).with_message("style");
    assert!(!diag.is_error());
    assert_eq!(diag.primary_location(), None);
}

#[test]
fn display_renders_all_parts() {
    let diag = Diagnostic::error(ErrorCode::E5002)
        .with_message("cannot assign to `in` parameter `x`")
        .with_label(Location::on_line(2, 5, 5), "assignment here")
        .with_note("parameters default to intent `in`")
        .with_suggestion("copy `x` into a local variable");

    assert_eq!(
        diag.to_string(),
        "error [E5002]: cannot assign to `in` parameter `x`\n  \
         --> 2:5-5: assignment here\n  \
         = note: parameters default to intent `in`\n  \
         = help: copy `x` into a local variable"
    );
}
