use lasr_diagnostic::ErrorCode;
use lasr_ir::ast::build::*;
use lasr_ir::ast::{self, Stmt as AstStmt};
use pretty_assertions::assert_eq;

use crate::compile::{compile_standalone, Compilation, NoModules, TranslationUnit};
use crate::ir::Constant;
use crate::options::CompilerOptions;
use crate::symbols::{
    Abi, DefType, EnumClassification, Intent, Presence, SymbolId, SymbolKind, Variable,
};
use crate::types::{Dimension, Ty};

use super::RETURN_VAR;

fn declare(body: Vec<AstStmt>) -> TranslationUnit {
    let options = CompilerOptions::default().with_symtab_only(true);
    let result = Compilation::new(&NoModules, options).compile_main(&module(body));
    match result.unit {
        Ok(unit) => unit,
        Err(_) => panic!("unexpected errors: {:#?}", result.diagnostics),
    }
}

fn error_code(body: Vec<AstStmt>) -> ErrorCode {
    let result = compile_standalone(&module(body));
    assert!(result.unit.is_err(), "expected an error");
    result.diagnostics[0].code
}

fn variable(unit: &TranslationUnit, id: SymbolId) -> &Variable {
    unit.arena.symbol(id).as_variable().unwrap()
}

fn self_param() -> ast::Arg {
    ast::Arg {
        annotation: None,
        ..param("self", ann("i32"))
    }
}

#[test]
fn function_scope_holds_parameters_and_return_variable() {
    let unit = declare(vec![def(
        "f",
        vec![
            param("x", ann("i32")),
            param("ys", ann("f64[:]")),
            param_default("k", ann("i64"), int(2)),
        ],
        Some(ann("f64")),
        vec![pass()],
    )]);
    let f = unit.lookup("f").unwrap();
    let function = unit.arena.function(f).unwrap();
    assert_eq!(unit.arena.scope(function.scope).owner, Some(f));
    assert_eq!(function.params.len(), 3);

    let x = variable(&unit, function.params[0]);
    assert_eq!(x.intent, Intent::In);
    assert_eq!(x.ty, Ty::integer(4));

    let ys = variable(&unit, function.params[1]);
    assert_eq!(ys.intent, Intent::InOut);
    assert_eq!(ys.ty, Ty::array(Ty::real(8), vec![Dimension::deferred()]));

    let k = variable(&unit, function.params[2]);
    assert_eq!(k.presence, Presence::Optional);
    assert_eq!(k.value, Some(Constant::Integer(2)));

    let rv = function.return_var.unwrap();
    assert_eq!(unit.arena.symbol_name(rv), RETURN_VAR);
    assert_eq!(variable(&unit, rv).intent, Intent::ReturnVar);
    assert_eq!(unit.arena.return_type(f), Some(&Ty::real(8)));
}

#[test]
fn local_named_after_function_is_the_return_variable() {
    let unit = declare(vec![def(
        "g",
        vec![param("x", ann("i32"))],
        None,
        vec![
            ann_assign("g", ann("i32"), None),
            assign(name("g"), name("x")),
        ],
    )]);
    let g = unit.lookup("g").unwrap();
    let function = unit.arena.function(g).unwrap();
    let rv = function.return_var.unwrap();
    assert_eq!(unit.arena.symbol_name(rv), "g");
    assert_eq!(unit.arena.get_local(function.scope, "g"), Some(rv));
    assert_eq!(variable(&unit, rv).intent, Intent::ReturnVar);
}

#[test]
fn return_value_errors() {
    let untyped = def("h", vec![], None, vec![ret(Some(int(1)))]);
    assert_eq!(error_code(vec![untyped]), ErrorCode::E1006);

    let both = def(
        "h",
        vec![],
        Some(ann("i32")),
        vec![ann_assign("h", ann("i32"), None), ret(Some(name("h")))],
    );
    assert_eq!(error_code(vec![both]), ErrorCode::E1006);
}

#[test]
fn declarations_in_compound_statements_belong_to_the_function() {
    let unit = declare(vec![def(
        "f",
        vec![],
        None,
        vec![if_(
            boolean(true),
            vec![while_(
                boolean(false),
                vec![ann_assign("deep", ann("i64"), Some(int(1)))],
            )],
            vec![ann_assign("other", ann("bool"), None)],
        )],
    )]);
    let scope = unit.arena.function(unit.lookup("f").unwrap()).unwrap().scope;
    let deep = unit.arena.get_local(scope, "deep").unwrap();
    assert_eq!(variable(&unit, deep).ty, Ty::integer(8));
    assert!(unit.arena.get_local(scope, "other").is_some());
    assert!(unit.lookup("deep").is_none());
}

#[test]
fn module_level_initializers() {
    let unit = declare(vec![
        ann_assign("n", ann("Const[i32]"), Some(binop(int(2), ast::Operator::Mult, int(3)))),
        ann_assign("m", ann("i64"), Some(int(7))),
        ann_assign("s", ann("str"), None),
    ]);
    let n = variable(&unit, unit.lookup("n").unwrap());
    assert_eq!(n.ty, Ty::constant(Ty::integer(4)));
    assert_eq!(n.value, Some(Constant::Integer(6)));

    let m = variable(&unit, unit.lookup("m").unwrap());
    assert_eq!(m.value, Some(Constant::Integer(7)));
    assert_eq!(m.initializer.as_ref().map(|e| e.ty.clone()), Some(Ty::integer(8)));

    let s = variable(&unit, unit.lookup("s").unwrap());
    assert!(s.initializer.is_none());
}

#[test]
fn declaration_errors() {
    assert_eq!(
        error_code(vec![ann_assign("n", ann("Const[i32]"), None)]),
        ErrorCode::E2007
    );
    assert_eq!(
        error_code(vec![
            ann_assign("x", ann("i32"), None),
            ann_assign("x", ann("f64"), None),
        ]),
        ErrorCode::E1002
    );
    assert_eq!(
        error_code(vec![ann_assign("x", ann("In[i32]"), None)]),
        ErrorCode::E9001
    );
    assert_eq!(
        error_code(vec![decorated(
            def("f", vec![], None, vec![pass()]),
            vec![name("lru_cache")],
        )]),
        ErrorCode::E9001
    );
    assert_eq!(
        error_code(vec![def("f", vec![self_param()], None, vec![pass()])]),
        ErrorCode::E2008
    );
    assert_eq!(
        error_code(vec![assign(name("T"), call(name("TypeVar"), vec![string("U")]))]),
        ErrorCode::E2008
    );
}

#[test]
fn overloads_become_a_generic_procedure() {
    let overload = |ty: &str| {
        decorated(
            def(
                "add",
                vec![param("a", ann(ty)), param("b", ann(ty))],
                Some(ann(ty)),
                vec![ret(Some(binop(name("a"), ast::Operator::Add, name("b"))))],
            ),
            vec![name("overload")],
        )
    };
    let unit = declare(vec![overload("i32"), overload("f64")]);
    let SymbolKind::GenericProcedure(generic) = &unit.arena.symbol(unit.lookup("add").unwrap()).kind
    else {
        panic!("expected a generic procedure");
    };
    let names: Vec<&str> = generic
        .procs
        .iter()
        .map(|p| unit.arena.symbol_name(*p))
        .collect();
    assert_eq!(names, vec!["__asr_overloaded_0__add", "__asr_overloaded_1__add"]);
    assert_eq!(unit.arena.return_type(generic.procs[1]), Some(&Ty::real(8)));
}

#[test]
fn interface_and_pure_decorators() {
    let unit = compile_standalone(&module(vec![
        decorated(
            def("c_sin", vec![param("x", ann("f64"))], Some(ann("f64")), vec![pass()]),
            vec![name("ccall")],
        ),
        decorated(
            def(
                "square",
                vec![param("x", ann("i32"))],
                Some(ann("i32")),
                vec![ret(Some(binop(name("x"), ast::Operator::Mult, name("x"))))],
            ),
            vec![name("pure")],
        ),
    ]))
    .unit
    .unwrap();
    let c_sin = unit.arena.function(unit.lookup("c_sin").unwrap()).unwrap();
    assert_eq!(c_sin.abi, Abi::BindC);
    assert_eq!(c_sin.deftype, DefType::Interface);
    assert!(c_sin.body.is_empty());

    let square = unit.arena.function(unit.lookup("square").unwrap()).unwrap();
    assert!(square.deterministic && square.side_effect_free);
    assert!(!square.body.is_empty());
}

#[test]
fn dataclass_members_and_methods() {
    let unit = declare(vec![decorated(
        class(
            "Point",
            vec![],
            vec![
                ann_assign("x", ann("i32"), None),
                ann_assign("y", ann("f64"), Some(float(0.5))),
                def(
                    "norm",
                    vec![self_param()],
                    Some(ann("f64")),
                    vec![ret(Some(attr(name("self"), "y")))],
                ),
            ],
        ),
        vec![name("dataclass")],
    )]);
    let point = unit.lookup("Point").unwrap();
    let SymbolKind::Struct(def) = &unit.arena.symbol(point).kind else {
        panic!("expected a struct");
    };
    assert_eq!(def.members, vec!["x".to_owned(), "y".to_owned()]);
    let y = unit.arena.get_local(def.scope, "y").unwrap();
    assert_eq!(variable(&unit, y).value, Some(Constant::Real(0.5)));

    let method = unit.lookup("__asr_Point_norm").unwrap();
    let this = unit.arena.function(method).unwrap().params[0];
    assert_eq!(variable(&unit, this).ty, Ty::Class(point));
    assert_eq!(variable(&unit, this).intent, Intent::InOut);

    let SymbolKind::ClassProcedure(bound) =
        &unit.arena.symbol(unit.arena.get_local(def.scope, "norm").unwrap()).kind
    else {
        panic!("expected a class procedure");
    };
    assert_eq!(bound.owner, point);
    assert_eq!(bound.procedure, method);
}

#[test]
fn unions_and_unsupported_classes() {
    let unit = declare(vec![decorated(
        class(
            "Number",
            vec![],
            vec![ann_assign("i", ann("i32"), None), ann_assign("r", ann("f64"), None)],
        ),
        vec![name("union")],
    )]);
    assert!(matches!(
        unit.arena.symbol(unit.lookup("Number").unwrap()).kind,
        SymbolKind::Union(_)
    ));

    assert_eq!(
        error_code(vec![class("Child", vec![name("Base")], vec![pass()])]),
        ErrorCode::E9001
    );
    assert_eq!(
        error_code(vec![class("C", vec![], vec![expr_stmt(int(1)), assign(name("a"), int(1))])]),
        ErrorCode::E9001
    );
}

#[test]
fn enum_classification() {
    let enumeration = |name: &str, values: &[i64]| {
        let body = values
            .iter()
            .enumerate()
            .map(|(i, v)| assign(lasr_ir::ast::build::name(&format!("M{i}")), int(*v)))
            .collect();
        class(name, vec![lasr_ir::ast::build::name("Enum")], body)
    };
    let unit = declare(vec![
        enumeration("Zero", &[0, 1, 2]),
        enumeration("Sparse", &[1, 5, 9]),
        enumeration("Repeats", &[1, 1]),
    ]);
    let classify = |name: &str| match &unit.arena.symbol(unit.lookup(name).unwrap()).kind {
        SymbolKind::Enum(e) => (e.classification, e.underlying.clone(), e.members.len()),
        other => panic!("expected an enum, found {other:?}"),
    };
    assert_eq!(
        classify("Zero"),
        (EnumClassification::UniqueConsecutiveFromZero, Ty::integer(4), 3)
    );
    assert_eq!(classify("Sparse").0, EnumClassification::Unique);
    assert_eq!(classify("Repeats").0, EnumClassification::NonUnique);

    let mixed = class(
        "Mixed",
        vec![name("Enum")],
        vec![assign(name("A"), int(1)), assign(name("B"), float(2.0))],
    );
    assert_eq!(error_code(vec![mixed]), ErrorCode::E2001);
}

#[test]
fn type_variables_and_restrictions() {
    let unit = declare(vec![
        assign(name("T"), call(name("TypeVar"), vec![string("T")])),
        decorated(
            def(
                "zero",
                vec![param("x", ann("T"))],
                Some(ann("T")),
                vec![pass()],
            ),
            vec![name("restriction")],
        ),
        def(
            "reset",
            vec![param("x", ann("T"))],
            Some(ann("T")),
            vec![ret(Some(call(name("zero"), vec![name("x")])))],
        ),
    ]);
    let t = variable(&unit, unit.lookup("T").unwrap());
    assert_eq!(t.ty, Ty::TypeParameter("T".to_owned()));

    let zero = unit.lookup("zero").unwrap();
    assert!(unit.arena.function(zero).unwrap().is_restriction);
    let reset = unit.arena.function(unit.lookup("reset").unwrap()).unwrap();
    assert_eq!(reset.type_params, vec!["T".to_owned()]);
    assert_eq!(reset.restrictions, vec![zero]);
    assert!(reset.dependencies.contains(&"zero".to_owned()));
}
