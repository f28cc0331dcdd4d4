// Test code uses unwrap/expect for clarity - panics provide good test failure messages
#![allow(clippy::unwrap_used, clippy::expect_used)]

//! The driver's public surface, as a front end would use it.

use lasr_ir::ast::build::*;
use lasr_ir::ast::Operator;
use lasr_sema::CompilerOptions;
use lasrc::{init_tracing, render_diagnostics, MemorySources, Session, SessionError};

#[test]
fn tracing_can_be_initialized_repeatedly() {
    init_tracing();
    init_tracing();
}

#[test]
fn multi_module_program_with_cache() {
    init_tracing();
    let dir = tempfile::tempdir().expect("temp dir");
    let sources = MemorySources::new().with_module(
        "geometry",
        module(vec![def(
            "area",
            vec![param("w", ann("f64")), param("h", ann("f64"))],
            Some(ann("f64")),
            vec![ret(Some(binop(name("w"), Operator::Mult, name("h"))))],
        )]),
    );
    let main = module(vec![
        import("geometry", None),
        expr_stmt(call(
            name("print"),
            vec![call(attr(name("geometry"), "area"), vec![float(2.0), float(3.0)])],
        )),
    ]);

    for _ in 0..2 {
        let mut session = Session::new(&sources, CompilerOptions::default())
            .with_cache_dir(dir.path())
            .expect("cache dir");
        let unit = session.check(&main).expect("analysis succeeds");
        assert!(unit.module("geometry").is_some());
        assert_eq!(unit.items.len(), 1);
    }
}

#[test]
fn failures_render_every_diagnostic() {
    let sources = MemorySources::new();
    let mut session = Session::new(&sources, CompilerOptions::default());
    let Err(SessionError::Failed { diagnostics }) =
        session.check(&module(vec![import_from("nowhere", &["f"])]))
    else {
        panic!("expected the import to fail");
    };
    let rendered = render_diagnostics(&diagnostics);
    assert!(rendered.contains("E4001"));
    assert!(rendered.contains("nowhere"));
}
