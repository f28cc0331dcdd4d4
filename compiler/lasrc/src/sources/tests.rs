use lasr_ir::ast::build::*;
use pretty_assertions::assert_eq;

use super::*;

#[test]
fn lookup_by_exact_name() {
    let sources = MemorySources::new()
        .with_module("pkg.util", module(vec![pass()]))
        .with_module("main", module(Vec::new()));
    assert_eq!(sources.len(), 2);
    assert!(sources.contains("pkg.util"));
    assert!(sources.parse_module("pkg.util").is_some());
    assert!(sources.parse_module("pkg").is_none());
    assert_eq!(sources.names().collect::<Vec<_>>(), vec!["main", "pkg.util"]);
}

#[test]
fn insert_replaces() {
    let mut sources: MemorySources = [("m", module(Vec::new()))].into_iter().collect();
    let previous = sources.insert("m", module(vec![pass()]));
    assert_eq!(previous.map(|m| m.body.len()), Some(0));
    assert_eq!(sources.parse_module("m").map(|m| m.body.len()), Some(1));
    assert!(!MemorySources::new().contains("m"));
    assert!(MemorySources::new().is_empty());
}
