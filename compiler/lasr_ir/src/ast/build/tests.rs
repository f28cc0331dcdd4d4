use super::*;
use pretty_assertions::assert_eq;

#[test]
fn parses_scalar_keyword() {
    assert_eq!(ann("i32"), name("i32"));
}

#[test]
fn parses_nested_subscripts() {
    assert_eq!(
        ann("dict[str, list[f64]]"),
        subscript(
            name("dict"),
            tuple(vec![name("str"), subscript(name("list"), name("f64"))])
        )
    );
}

#[test]
fn parses_dimension_slices() {
    assert_eq!(
        ann("f64[:, 1:n]"),
        subscript(
            name("f64"),
            tuple(vec![
                slice(None, None),
                slice(Some(int(1)), Some(name("n")))
            ])
        )
    );
}

#[test]
fn parses_callable_parameter_list() {
    assert_eq!(
        ann("Callable[[i32, i32], f64]"),
        subscript(
            name("Callable"),
            tuple(vec![list(vec![name("i32"), name("i32")]), name("f64")])
        )
    );
}

#[test]
fn parses_attribute_chain() {
    assert_eq!(ann("geometry.Point"), attr(name("geometry"), "Point"));
}

#[test]
fn malformed_annotation_falls_back_to_name() {
    assert!(parse_annotation("list[i32").is_err());
    assert_eq!(ann("list[i32"), name("list[i32"));
}

#[test]
fn decorated_attaches_to_definitions_only() {
    let f = decorated(def("f", vec![], None, vec![pass()]), vec![name("pure")]);
    let StmtKind::FunctionDef(def) = f.kind else {
        panic!("expected function definition");
    };
    assert_eq!(def.decorators, vec![name("pure")]);

    let untouched = decorated(pass(), vec![name("pure")]);
    assert_eq!(untouched.kind, StmtKind::Pass);
}

#[test]
fn alias_local_name_prefers_asname() {
    let stmt = import_from_as("m", &[("f", Some("g")), ("h", None)]);
    let StmtKind::ImportFrom { names, .. } = stmt.kind else {
        panic!("expected import");
    };
    assert_eq!(names[0].local_name(), "g");
    assert_eq!(names[1].local_name(), "h");
}
