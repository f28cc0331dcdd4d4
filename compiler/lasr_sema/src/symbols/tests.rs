use super::*;
use pretty_assertions::assert_eq;

fn var(name: &str, ty: Ty) -> Symbol {
    Symbol::new(
        name,
        Location::DUMMY,
        SymbolKind::Variable(Variable::local(ty)),
    )
}

/// A module symbol owning a fresh scope under the root.
fn module(arena: &mut SymbolArena, root: ScopeId, name: &str) -> (SymbolId, ScopeId) {
    let scope = arena.new_scope(Some(root));
    let id = arena
        .add(
            root,
            Symbol::new(
                name,
                Location::DUMMY,
                SymbolKind::Module(Module {
                    scope,
                    dependencies: Vec::new(),
                    module_aliases: BTreeMap::new(),
                    loaded_from_cache: false,
                }),
            ),
        )
        .unwrap();
    arena.set_scope_owner(scope, id);
    (id, scope)
}

fn function(arena: &mut SymbolArena, parent: ScopeId, name: &str, stub: bool) -> SymbolId {
    let scope = arena.new_scope(Some(parent));
    let mut f = Function::new(scope);
    if stub {
        f.abi = Abi::Interactive;
        f.deftype = DefType::Interface;
    }
    let id = arena
        .add(
            parent,
            Symbol::new(name, Location::DUMMY, SymbolKind::Function(f)),
        )
        .unwrap();
    arena.set_scope_owner(scope, id);
    id
}

#[test]
fn inner_binding_shadows_outer() {
    let mut arena = SymbolArena::new();
    let root = arena.new_scope(None);
    let (_, outer) = module(&mut arena, root, "m");
    let f = function(&mut arena, outer, "f", false);
    let inner = arena.function(f).unwrap().scope;

    let outer_x = arena.add(outer, var("x", Ty::integer(4))).unwrap();
    let inner_x = arena.add(inner, var("x", Ty::real(8))).unwrap();

    assert_eq!(arena.resolve(inner, "x"), Some(inner_x));
    assert_eq!(arena.resolve(outer, "x"), Some(outer_x));
    assert_eq!(arena.get_local(inner, "f"), None);
    assert_eq!(arena.resolve(inner, "f"), Some(f));
}

#[test]
fn duplicate_rejected_for_every_kind() {
    let mut arena = SymbolArena::new();
    let root = arena.new_scope(None);
    let (_, scope) = module(&mut arena, root, "m");
    let first = arena.add(scope, var("x", Ty::integer(4))).unwrap();
    let first_loc = Location::on_line(1, 1, 1);
    arena.symbol_mut(first).loc = first_loc;

    let other = arena.new_scope(Some(scope));
    let kinds = vec![
        SymbolKind::Variable(Variable::local(Ty::real(8))),
        SymbolKind::Function(Function::new(other)),
        SymbolKind::Struct(StructType {
            scope: other,
            members: Vec::new(),
            abi: Abi::Source,
        }),
        SymbolKind::Enum(EnumType {
            scope: other,
            members: Vec::new(),
            underlying: Ty::integer(4),
            classification: EnumClassification::Unique,
        }),
        SymbolKind::Union(UnionType {
            scope: other,
            members: Vec::new(),
        }),
        SymbolKind::GenericProcedure(GenericProcedure { procs: Vec::new() }),
        SymbolKind::External(ExternalSymbol {
            target: first,
            module_name: "n".to_owned(),
            original_name: "x".to_owned(),
        }),
        SymbolKind::Block(Block {
            scope: other,
            body: Vec::new(),
        }),
        SymbolKind::ClassProcedure(ClassProcedure {
            owner: first,
            procedure: first,
        }),
    ];

    for kind in kinds {
        let err = arena
            .add(scope, Symbol::new("x", Location::on_line(9, 1, 1), kind))
            .unwrap_err();
        assert_eq!(
            err.kind,
            ErrorKind::DuplicateSymbol {
                name: "x".to_owned()
            }
        );
        assert_eq!(err.loc, Location::on_line(9, 1, 1));
        assert_eq!(err.labels[0].0, first_loc);
    }
}

#[test]
fn interface_stub_replaced_in_nested_scope() {
    let mut arena = SymbolArena::new();
    let root = arena.new_scope(None);
    let (_, module_scope) = module(&mut arena, root, "m");
    let outer = function(&mut arena, module_scope, "outer", false);
    let nested = arena.function(outer).unwrap().scope;

    let stub = function(&mut arena, nested, "g", true);
    let full = function(&mut arena, nested, "g", false);

    assert_eq!(stub, full);
    assert!(!arena.function(full).unwrap().is_interface_stub());
}

#[test]
fn interface_stub_not_replaced_at_global_scope() {
    let mut arena = SymbolArena::new();
    let root = arena.new_scope(None);
    let (_, module_scope) = module(&mut arena, root, "m");
    function(&mut arena, module_scope, "g", true);

    let scope = arena.new_scope(Some(module_scope));
    let err = arena
        .add(
            module_scope,
            Symbol::new(
                "g",
                Location::DUMMY,
                SymbolKind::Function(Function::new(scope)),
            ),
        )
        .unwrap_err();
    assert_eq!(err.code(), lasr_diagnostic::ErrorCode::E1002);
}

#[test]
fn unique_name_appends_counter() {
    let mut arena = SymbolArena::new();
    let root = arena.new_scope(None);
    assert_eq!(arena.unique_name(root, "tmp"), "tmp");
    arena.add(root, var("tmp", Ty::integer(4))).unwrap();
    assert_eq!(arena.unique_name(root, "tmp"), "tmp1");
    arena.add(root, var("tmp1", Ty::integer(4))).unwrap();
    assert_eq!(arena.unique_name(root, "tmp"), "tmp2");
}

#[test]
fn past_external_resolves_in_one_step() {
    let mut arena = SymbolArena::new();
    let root = arena.new_scope(None);
    let (_, a) = module(&mut arena, root, "a");
    let (_, b) = module(&mut arena, root, "b");
    let real = arena.add(a, var("x", Ty::integer(4))).unwrap();
    let ext = arena
        .add(
            b,
            Symbol::new(
                "x",
                Location::DUMMY,
                SymbolKind::External(ExternalSymbol {
                    target: real,
                    module_name: "a".to_owned(),
                    original_name: "x".to_owned(),
                }),
            ),
        )
        .unwrap();

    assert_eq!(arena.symbol_get_past_external(ext), real);
    assert_eq!(arena.symbol_get_past_external(real), real);
    assert_eq!(arena.variable_type(ext), Some(&Ty::integer(4)));
}

#[test]
fn module_dependencies_are_deduplicated() {
    let mut arena = SymbolArena::new();
    let root = arena.new_scope(None);
    let (m, scope) = module(&mut arena, root, "m");
    let f = function(&mut arena, scope, "f", false);
    let inner = arena.function(f).unwrap().scope;

    arena.add_unit_dependency(inner, "math");
    arena.add_unit_dependency(scope, "io");
    arena.add_unit_dependency(scope, "math");

    let deps = &arena.symbol(m).as_module().unwrap().dependencies;
    assert_eq!(deps, &vec!["math".to_owned(), "io".to_owned()]);
}

#[test]
fn enclosing_lookups() {
    let mut arena = SymbolArena::new();
    let root = arena.new_scope(None);
    let (m, scope) = module(&mut arena, root, "m");
    let f = function(&mut arena, scope, "f", false);
    let inner = arena.function(f).unwrap().scope;

    assert_eq!(arena.enclosing_unit(inner), Some(m));
    assert_eq!(arena.enclosing_function(inner), Some(f));
    assert_eq!(arena.enclosing_function(scope), None);
    assert!(arena.is_global_scope(scope));
    assert!(arena.is_global_scope(root));
    assert!(!arena.is_global_scope(inner));
}
