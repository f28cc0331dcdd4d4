use super::*;
use crate::symbols::{Abi, StructType, Symbol, SymbolKind};
use lasr_ir::Location;
use pretty_assertions::assert_eq;

#[test]
fn pointer_never_nests() {
    let p = Ty::pointer(Ty::integer(4));
    assert_eq!(Ty::pointer(p.clone()), p);
    assert_eq!(p.peel_pointer(), &Ty::integer(4));
}

#[test]
fn const_never_nests() {
    let c = Ty::constant(Ty::real(8));
    assert_eq!(Ty::constant(c.clone()), c);
    assert!(c.is_real());
    assert!(c.is_const());
}

#[test]
fn array_without_dimensions_is_scalar() {
    assert_eq!(Ty::array(Ty::integer(4), Vec::new()), Ty::integer(4));
    let a = Ty::array(Ty::real(8), vec![Dimension::deferred(), Dimension::deferred()]);
    assert!(a.is_array());
    assert_eq!(a.rank(), 2);
    assert_eq!(a.array_base(), &Ty::real(8));
}

#[test]
fn equality_ignores_const_but_not_pointer() {
    let arena = SymbolArena::new();
    assert!(types_equal(
        &Ty::constant(Ty::integer(4)),
        &Ty::integer(4),
        &arena
    ));
    assert!(!types_equal(
        &Ty::pointer(Ty::integer(4)),
        &Ty::integer(4),
        &arena
    ));
    assert!(!types_equal(&Ty::integer(4), &Ty::integer(8), &arena));
    assert!(!types_equal(&Ty::integer(4), &Ty::unsigned(4), &arena));
}

#[test]
fn arrays_compare_by_rank() {
    let arena = SymbolArena::new();
    let length = Expr::integer(3, 4, Location::DUMMY);
    let fixed = Ty::array(
        Ty::integer(4),
        vec![Dimension {
            start: Some(Expr::integer(0, 4, Location::DUMMY)),
            length: Some(length),
        }],
    );
    let deferred = Ty::array(Ty::integer(4), vec![Dimension::deferred()]);
    let matrix = Ty::array(Ty::integer(4), vec![Dimension::deferred(); 2]);
    assert!(types_equal(&fixed, &deferred, &arena));
    assert!(!types_equal(&fixed, &matrix, &arena));
}

#[test]
fn struct_and_class_of_same_symbol_are_equal() {
    let mut arena = SymbolArena::new();
    let root = arena.new_scope(None);
    let scope = arena.new_scope(Some(root));
    let point = arena
        .add(
            root,
            Symbol::new(
                "Point",
                Location::DUMMY,
                SymbolKind::Struct(StructType {
                    scope,
                    members: Vec::new(),
                    abi: Abi::Source,
                }),
            ),
        )
        .unwrap();
    assert!(types_equal(&Ty::Struct(point), &Ty::Class(point), &arena));
    assert_eq!(type_to_string(&Ty::list(Ty::Struct(point)), &arena), "list[Point]");
}

#[test]
fn container_spelling() {
    let arena = SymbolArena::new();
    let ty = Ty::dict(Ty::Character, Ty::Tuple(vec![Ty::integer(8), Ty::logical()]));
    assert_eq!(type_to_string(&ty, &arena), "dict[str, tuple[i64, bool]]");

    let callable = Ty::Function(FunctionType {
        params: vec![Ty::real(4)],
        ret: None,
    });
    assert_eq!(type_to_string(&callable, &arena), "Callable[[f32], None]");

    let array = Ty::array(
        Ty::real(8),
        vec![
            Dimension::deferred(),
            Dimension {
                start: Some(Expr::integer(0, 4, Location::DUMMY)),
                length: Some(Expr::integer(3, 4, Location::DUMMY)),
            },
        ],
    );
    assert_eq!(type_to_string(&array, &arena), "f64[:, 3]");
}

#[test]
fn collects_type_parameters_in_order() {
    let ty = Ty::dict(
        Ty::TypeParameter("K".to_owned()),
        Ty::list(Ty::TypeParameter("V".to_owned())),
    );
    let mut found = vec!["V".to_owned()];
    ty.collect_type_parameters(&mut found);
    assert_eq!(found, vec!["V".to_owned(), "K".to_owned()]);
    assert!(!Ty::integer(4).contains_type_parameter());
}
