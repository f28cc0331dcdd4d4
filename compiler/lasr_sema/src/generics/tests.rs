use lasr_diagnostic::ErrorCode;
use lasr_ir::ast::build::*;
use lasr_ir::ast::{self, Operator};
use pretty_assertions::assert_eq;

use super::*;
use crate::compile::{compile_standalone, TranslationUnit};
use crate::ir::StmtKind;
use crate::types::Dimension;

/// `T = TypeVar("T")`.
fn type_var(var: &str) -> ast::Stmt {
    assign(name(var), call(name("TypeVar"), vec![string(var)]))
}

fn restriction(function: &str, params: &[&str]) -> ast::Stmt {
    let args = params.iter().map(|p| param(p, ann("T"))).collect();
    decorated(def(function, args, Some(ann("T")), vec![pass()]), vec![name("restriction")])
}

/// `T`, the `add` restriction and `twice(x: T) -> T = add(x, x)`.
fn prelude() -> Vec<ast::Stmt> {
    vec![
        type_var("T"),
        restriction("add", &["x", "y"]),
        def(
            "twice",
            vec![param("x", ann("T"))],
            Some(ann("T")),
            vec![ret(Some(call(name("add"), vec![name("x"), name("x")])))],
        ),
    ]
}

fn with_main(mut items: Vec<ast::Stmt>, body: Vec<ast::Stmt>) -> ast::Module {
    items.push(def("main", vec![], None, body));
    module(items)
}

fn analyze(module: &ast::Module) -> TranslationUnit {
    let result = compile_standalone(module);
    match result.unit {
        Ok(unit) => unit,
        Err(_) => panic!("unexpected errors: {:#?}", result.diagnostics),
    }
}

fn error_code(module: &ast::Module) -> ErrorCode {
    let result = compile_standalone(module);
    assert!(result.unit.is_err(), "expected an error");
    result.diagnostics[0].code
}

/// Callees of the calls assigned in `function`'s body, in order.
fn assigned_callees(unit: &TranslationUnit, function: &str) -> Vec<(SymbolId, Option<SymbolId>)> {
    let id = unit.lookup(function).unwrap();
    unit.arena
        .function(id)
        .unwrap()
        .body
        .iter()
        .filter_map(|s| match &s.kind {
            StmtKind::Assignment { value, .. } => match &value.kind {
                ExprKind::FunctionCall {
                    callee, original, ..
                } => Some((*callee, *original)),
                _ => None,
            },
            _ => None,
        })
        .collect()
}

#[test]
fn instances_are_shared_per_substitution() {
    let unit = analyze(&with_main(
        prelude(),
        vec![
            ann_assign("a", ann("i32"), Some(call(name("twice"), vec![int(1)]))),
            ann_assign("b", ann("i32"), Some(call(name("twice"), vec![int(2)]))),
            ann_assign("c", ann("f64"), Some(call(name("twice"), vec![float(1.5)]))),
        ],
    ));
    let calls = assigned_callees(&unit, "main");
    assert_eq!(calls.len(), 3);
    assert_eq!(calls[0].0, calls[1].0);
    assert_ne!(calls[0].0, calls[2].0);
    let twice = unit.lookup("twice").unwrap();
    assert!(calls.iter().all(|(_, original)| *original == Some(twice)));

    let first = unit.lookup("__asr_generic_twice_0").unwrap();
    let second = unit.lookup("__asr_generic_twice_1").unwrap();
    assert_eq!(first, calls[0].0);
    assert_eq!(second, calls[2].0);
    assert!(unit.lookup("__asr_generic_twice_2").is_none());
}

#[test]
fn instance_is_concrete() {
    let unit = analyze(&with_main(
        prelude(),
        vec![ann_assign(
            "a",
            ann("i64"),
            Some(call(name("twice"), vec![call(name("i64"), vec![int(3)])])),
        )],
    ));
    let instance = unit.lookup("__asr_generic_twice_0").unwrap();
    let function = unit.arena.function(instance).unwrap();
    assert!(!function.is_generic());
    assert!(function.restrictions.is_empty());
    assert_eq!(unit.arena.variable_type(function.params[0]), Some(&Ty::integer(8)));
    assert_eq!(unit.arena.return_type(instance), Some(&Ty::integer(8)));

    // The builtin `add` became arithmetic.
    let StmtKind::Assignment { value, .. } = &function.body[0].kind else {
        panic!("expected the return assignment, found {:?}", function.body[0].kind);
    };
    assert!(matches!(value.kind, ExprKind::IntegerBinOp { op: BinOp::Add, .. }));
    assert_eq!(value.ty, Ty::integer(8));

    // The generic definition is untouched.
    let generic = unit.arena.function(unit.lookup("twice").unwrap()).unwrap();
    assert!(generic.is_generic());
    assert_eq!(generic.type_params, vec!["T".to_owned()]);
}

#[test]
fn supplied_witness_replaces_the_restriction() {
    let mut items = vec![
        type_var("T"),
        restriction("combine", &["x", "y"]),
        def(
            "fold2",
            vec![param("x", ann("T")), param("y", ann("T"))],
            Some(ann("T")),
            vec![ret(Some(call(name("combine"), vec![name("x"), name("y")])))],
        ),
        def(
            "concat",
            vec![param("a", ann("str")), param("b", ann("str"))],
            Some(ann("str")),
            vec![ret(Some(binop(name("a"), Operator::Add, name("b"))))],
        ),
    ];
    items.push(def(
        "main",
        vec![],
        None,
        vec![ann_assign(
            "s",
            ann("str"),
            Some(call_kw(
                name("fold2"),
                vec![string("a"), string("b")],
                vec![("combine", name("concat"))],
            )),
        )],
    ));
    let unit = analyze(&module(items));
    let instance = unit.lookup("__asr_generic_fold2_0").unwrap();
    let callees = assigned_callees(&unit, "__asr_generic_fold2_0");
    assert_eq!(callees.len(), 1);
    assert_eq!(unit.arena.symbol_name(callees[0].0), "concat");
    assert_eq!(unit.arena.return_type(instance), Some(&Ty::Character));
}

#[test]
fn restriction_errors() {
    // `add` on strings has no builtin meaning.
    let strings = with_main(
        prelude(),
        vec![ann_assign("s", ann("str"), Some(call(name("twice"), vec![string("x")])))],
    );
    assert_eq!(error_code(&strings), ErrorCode::E3002);

    // A restriction without a builtin needs a witness.
    let mut items = vec![
        type_var("T"),
        restriction("combine", &["x", "y"]),
        def(
            "fold2",
            vec![param("x", ann("T")), param("y", ann("T"))],
            Some(ann("T")),
            vec![ret(Some(call(name("combine"), vec![name("x"), name("y")])))],
        ),
        def(
            "pick",
            vec![param("a", ann("f64"))],
            Some(ann("f64")),
            vec![ret(Some(name("a")))],
        ),
    ];
    let missing = with_main(
        items.clone(),
        vec![ann_assign(
            "v",
            ann("f64"),
            Some(call(name("fold2"), vec![float(1.0), float(2.0)])),
        )],
    );
    assert_eq!(error_code(&missing), ErrorCode::E3002);

    // Arity of the witness must match.
    items.push(def(
        "main",
        vec![],
        None,
        vec![ann_assign(
            "v",
            ann("f64"),
            Some(call_kw(
                name("fold2"),
                vec![float(1.0), float(2.0)],
                vec![("combine", name("pick"))],
            )),
        )],
    ));
    assert_eq!(error_code(&module(items)), ErrorCode::E3002);
}

#[test]
fn type_variable_must_bind_consistently() {
    let mut items = prelude();
    items.push(def(
        "both",
        vec![param("x", ann("T")), param("y", ann("T"))],
        Some(ann("T")),
        vec![ret(Some(call(name("add"), vec![name("x"), name("y")])))],
    ));
    let mixed = with_main(
        items,
        vec![ann_assign(
            "v",
            ann("f64"),
            Some(call(name("both"), vec![int(1), float(2.0)])),
        )],
    );
    assert_eq!(error_code(&mixed), ErrorCode::E3001);
}

#[test]
fn operators_on_type_parameters_are_rejected() {
    let items = vec![
        type_var("T"),
        def(
            "bad",
            vec![param("x", ann("T"))],
            Some(ann("T")),
            vec![ret(Some(binop(name("x"), Operator::Add, name("x"))))],
        ),
    ];
    assert_eq!(error_code(&module(items)), ErrorCode::E2008);
}

#[test]
fn binding_walks_container_shapes() {
    let arena = SymbolArena::new();
    let t = Ty::TypeParameter("T".to_owned());
    let mut subs = Vec::new();
    bind_type_parameters(
        &Ty::dict(Ty::Character, Ty::list(t.clone())),
        &Ty::dict(Ty::Character, Ty::list(Ty::real(4))),
        &mut subs,
        &arena,
        Location::DUMMY,
    )
    .unwrap();
    assert_eq!(subs, vec![("T".to_owned(), Ty::real(4))]);

    let one_d = Ty::array(t, vec![Dimension::deferred()]);
    let two_d = Ty::array(Ty::integer(4), vec![Dimension::deferred(), Dimension::deferred()]);
    let err = bind_type_parameters(&one_d, &two_d, &mut Vec::new(), &arena, Location::DUMMY)
        .unwrap_err();
    assert!(matches!(err.kind, ErrorKind::TypeMismatch { .. }));
}

#[test]
fn substitution_reaches_nested_types() {
    let subs = vec![("T".to_owned(), Ty::integer(2))];
    let ty = Ty::pointer(Ty::set(Ty::TypeParameter("T".to_owned())));
    assert_eq!(substitute(&ty, &subs), Ty::pointer(Ty::set(Ty::integer(2))));
}
