use lasr_ir::ast::build::*;
use lasr_sema::{compile_standalone, SymbolId};
use pretty_assertions::assert_eq;

use super::*;

fn sample_module() -> TypedModule {
    let result = compile_standalone(&module(vec![
        def("f", vec![param("x", ann("i32"))], Some(ann("i32")), vec![ret(Some(name("x")))]),
        ann_assign("limit", ann("i64"), Some(int(3))),
    ]));
    let unit = result.unit.unwrap();
    TypedModule::export(&unit.arena, unit.main_module)
}

fn temp_cache() -> (tempfile::TempDir, FileModuleCache) {
    let dir = tempfile::tempdir().unwrap_or_else(|e| panic!("failed to create temp dir: {e}"));
    let cache = FileModuleCache::new(&dir.path().join("modules")).unwrap();
    (dir, cache)
}

#[test]
fn store_then_load() {
    let (_dir, mut cache) = temp_cache();
    let typed = sample_module();

    assert!(!cache.has("__main__"));
    assert!(cache.load_cached("__main__").is_none());

    cache.store_cached("__main__", &typed).unwrap();
    assert!(cache.has("__main__"));
    let loaded = cache.load_cached("__main__").unwrap();
    assert_eq!(loaded, typed);
    assert_eq!(loaded.arena.symbol_name(loaded.module()), "__main__");
    assert_eq!(loaded.module(), SymbolId::from_raw(0));
}

#[test]
fn corrupt_entries_are_misses() {
    let (_dir, mut cache) = temp_cache();
    std::fs::write(cache.entry_path("broken"), b"not a module").unwrap();
    assert!(cache.has("broken"));
    assert!(cache.load_cached("broken").is_none());
}

#[test]
fn other_format_versions_are_misses() {
    let (_dir, mut cache) = temp_cache();
    let typed = sample_module();
    let entry = EntryRef {
        format: FORMAT_VERSION + 1,
        module: &typed,
    };
    std::fs::write(cache.entry_path("__main__"), bincode::serialize(&entry).unwrap()).unwrap();
    assert!(cache.load_cached("__main__").is_none());
}

#[test]
fn entries_are_keyed_by_module_name() {
    let (_dir, mut cache) = temp_cache();
    cache.store_cached("other", &sample_module()).unwrap();
    // The stored module is named `__main__`, not `other`.
    assert!(cache.load_cached("other").is_none());
}

#[test]
fn clear_removes_only_module_entries() {
    let (_dir, mut cache) = temp_cache();
    cache.store_cached("__main__", &sample_module()).unwrap();
    let notes = cache.dir().join("notes.txt");
    std::fs::write(&notes, "kept").unwrap();

    cache.clear().unwrap();
    assert!(!cache.has("__main__"));
    assert!(notes.exists());
}
