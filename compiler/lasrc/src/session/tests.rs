use std::collections::HashMap;

use lasr_diagnostic::ErrorCode;
use lasr_ir::ast::build::*;
use lasr_sema::NoModules;
use pretty_assertions::assert_eq;

use super::*;

fn library() -> HashMap<String, ast::Module> {
    let c = vec![def("f", vec![], Some(ann("i32")), vec![ret(Some(int(1)))])];
    [("c", c), ("b", vec![import_from("c", &["f"])])]
        .into_iter()
        .map(|(name, body)| (name.to_owned(), module(body)))
        .collect()
}

fn main_module() -> ast::Module {
    module(vec![
        import_from("b", &["f"]),
        expr_stmt(call(name("print"), vec![call(name("f"), vec![])])),
    ])
}

fn loaded_from_cache(unit: &TranslationUnit, name: &str) -> bool {
    let module = unit.module(name).unwrap();
    unit.arena.symbol(module).as_module().unwrap().loaded_from_cache
}

#[test]
fn check_reports_errors() {
    let mut session = Session::new(&NoModules, CompilerOptions::default());
    let err = session
        .check(&module(vec![ann_assign("x", ann("i32"), Some(name("missing")))]))
        .unwrap_err();
    let SessionError::Failed { diagnostics } = &err else {
        panic!("expected analysis errors, found {err:?}");
    };
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].code, ErrorCode::E1001);
    assert_eq!(err.to_string(), "analysis failed with 1 error(s)");
}

#[test]
fn compile_without_cache() {
    let sources = library();
    let mut session = Session::new(&sources, CompilerOptions::default());
    assert!(session.cache().is_none());
    let unit = session.check(&main_module()).unwrap();
    assert!(!loaded_from_cache(&unit, "b"));
    assert!(!loaded_from_cache(&unit, "c"));
}

#[test]
fn second_session_reuses_cached_modules() {
    let dir = tempfile::tempdir().unwrap_or_else(|e| panic!("failed to create temp dir: {e}"));
    let sources = library();

    let mut first = Session::new(&sources, CompilerOptions::default())
        .with_cache_dir(dir.path())
        .unwrap();
    let unit = first.check(&main_module()).unwrap();
    assert!(!loaded_from_cache(&unit, "b"));
    let cache = first.cache().unwrap();
    assert!(cache.has("b"));
    assert!(cache.has("c"));
    assert!(!cache.has("__main__"));

    let mut second = Session::new(&sources, CompilerOptions::default())
        .with_cache_dir(dir.path())
        .unwrap();
    let unit = second.check(&main_module()).unwrap();
    assert!(loaded_from_cache(&unit, "b"));
    assert!(loaded_from_cache(&unit, "c"));
    let f = unit.lookup("f").unwrap();
    assert_eq!(unit.arena.symbol_name(unit.arena.symbol_get_past_external(f)), "f");
}

#[test]
fn options_reach_the_analyser() {
    let body = || {
        let x = ann_assign("x", ann("f64"), Some(int(1)));
        module(vec![def("main", vec![], None, vec![x])])
    };
    let mut strict = Session::new(&NoModules, CompilerOptions::default());
    assert!(strict.check(&body()).is_err());

    let mut permissive =
        Session::new(&NoModules, CompilerOptions::default().with_implicit_casting(true));
    assert!(permissive.options().implicit_casting);
    assert!(permissive.check(&body()).is_ok());
}

#[test]
fn rendering_separates_diagnostics() {
    let mut session = Session::new(&NoModules, CompilerOptions::default());
    let result = session.compile(&module(vec![import("nowhere", None)]));
    let rendered = render_diagnostics(&result.diagnostics);
    assert!(rendered.starts_with("error [E4001]: module `nowhere` not found"));
    assert!(!rendered.contains("\n\n"));
    assert_eq!(render_diagnostics(&[]), "");
}
