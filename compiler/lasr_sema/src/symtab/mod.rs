//! Pass 1: scopes and declarations.
//!
//! Walks a module's declarations depth-first and creates every scope and
//! symbol: globals, functions with their parameters, return variables and
//! locals, structs, enums, unions and their members. Imports are resolved
//! here, loading imported modules on demand. Statement bodies are left for
//! pass 2; the returned [`Skeleton`] lists the functions whose bodies still
//! need lowering.
//!
//! Overloads and methods are collected while a scope is visited and turned
//! into `GenericProcedure` / `ClassProcedure` symbols once the scope is
//! complete.

use lasr_ir::ast::{self, ExprKind as AstKind, StmtKind as AstStmt};
use lasr_ir::Location;

use crate::annotation::{self, lower_static_expr};
use crate::cast::cast_for_assignment;
use crate::compile::Compilation;
use crate::error::{ErrorKind, SemaResult, SemanticError};
use crate::imports;
use crate::ir::{Constant, Expr};
use crate::symbols::{
    add_dependency, Abi, ClassProcedure, DefType, EnumClassification, EnumType, Function,
    GenericProcedure, Intent, Presence, ScopeId, StructType, Symbol, SymbolArena, SymbolId,
    SymbolKind, UnionType, Variable,
};
use crate::types::{type_to_string, types_equal, Ty};

/// Prefix of the hidden per-signature functions of an overload set.
const OVERLOAD_PREFIX: &str = "__asr_overloaded_";

/// Name of the synthesized return variable of a function with `-> T`.
pub(crate) const RETURN_VAR: &str = "__return_var";

/// What pass 1 hands to pass 2.
#[derive(Debug, Default)]
pub(crate) struct Skeleton<'a> {
    /// Functions with bodies to lower, enclosing functions first.
    pub(crate) functions: Vec<(SymbolId, &'a ast::FunctionDef)>,
}

/// Declare everything in `parsed` inside `module`'s scope.
#[tracing::instrument(level = "debug", skip_all, fields(module = %cx.arena.symbol_name(module)))]
pub(crate) fn build_module<'a>(
    cx: &mut Compilation<'_>,
    module: SymbolId,
    parsed: &'a ast::Module,
) -> SemaResult<Skeleton<'a>> {
    let Some(scope) = cx.arena.symbol(module).owned_scope() else {
        return Ok(Skeleton::default());
    };
    let mut builder = Builder {
        cx,
        skeleton: Skeleton::default(),
    };
    builder.declare_items(scope, &parsed.body, None)?;
    builder.collect_restrictions();
    tracing::debug!(
        functions = builder.skeleton.functions.len(),
        "declarations complete"
    );
    Ok(builder.skeleton)
}

struct Builder<'cx, 'src, 'a> {
    cx: &'cx mut Compilation<'src>,
    skeleton: Skeleton<'a>,
}

/// Decorators understood on function definitions.
#[derive(Default)]
struct FunctionDecorators {
    overload: bool,
    abi: Option<Abi>,
    pure: bool,
    restriction: bool,
}

impl FunctionDecorators {
    fn parse(def: &ast::FunctionDef) -> SemaResult<Self> {
        let mut parsed = FunctionDecorators::default();
        for decorator in &def.decorators {
            match decorator_name(decorator) {
                Some("overload") => parsed.overload = true,
                Some("interface") => parsed.abi = Some(Abi::Interactive),
                Some("ccall") => parsed.abi = Some(Abi::BindC),
                Some("pythoncall") => parsed.abi = Some(Abi::BindPython),
                Some("pure") => parsed.pure = true,
                Some("restriction") => parsed.restriction = true,
                _ => {
                    return Err(SemanticError::new(
                        ErrorKind::unsupported(format!(
                            "decorator `@{}`",
                            annotation::render(decorator)
                        )),
                        decorator.loc,
                    ))
                }
            }
        }
        Ok(parsed)
    }
}

/// `@name` or `@name(...)`.
fn decorator_name(decorator: &ast::Expr) -> Option<&str> {
    match &decorator.kind {
        AstKind::Call { func, .. } => func.as_name(),
        _ => decorator.as_name(),
    }
}

/// Naming and `self` handling for a function being declared.
struct FunctionSite {
    /// Symbol name; differs from the source name for methods.
    name: String,
    /// The struct whose method this is.
    method_of: Option<SymbolId>,
}

impl<'a> Builder<'_, '_, 'a> {
    /// Declare the statements of a module or function body.
    ///
    /// `skip` names a local that was already declared as the return
    /// variable.
    fn declare_items(
        &mut self,
        scope: ScopeId,
        body: &'a [ast::Stmt],
        skip: Option<&str>,
    ) -> SemaResult<()> {
        let mut overloads: Vec<(String, Vec<SymbolId>, Location)> = Vec::new();
        for stmt in body {
            match &stmt.kind {
                AstStmt::FunctionDef(def) => {
                    let decorators = FunctionDecorators::parse(def)?;
                    if decorators.overload {
                        let index = match overloads.iter().position(|(n, ..)| *n == def.name) {
                            Some(index) => index,
                            None => {
                                overloads.push((def.name.clone(), Vec::new(), stmt.loc));
                                overloads.len() - 1
                            }
                        };
                        let site = FunctionSite {
                            name: format!(
                                "{OVERLOAD_PREFIX}{}__{}",
                                overloads[index].1.len(),
                                def.name
                            ),
                            method_of: None,
                        };
                        let id = self.declare_function(scope, def, &decorators, site, stmt.loc)?;
                        overloads[index].1.push(id);
                    } else {
                        let site = FunctionSite {
                            name: def.name.clone(),
                            method_of: None,
                        };
                        self.declare_function(scope, def, &decorators, site, stmt.loc)?;
                    }
                }
                AstStmt::ClassDef(class) => self.declare_class(scope, class, stmt.loc)?,
                AstStmt::Import(names) => imports::import_module(self.cx, scope, names, stmt.loc)?,
                AstStmt::ImportFrom { module, names } => {
                    imports::import_from(self.cx, scope, module, names, stmt.loc)?;
                }
                AstStmt::AnnAssign {
                    target,
                    annotation,
                    value,
                } => {
                    let Some(name) = target.as_name() else {
                        continue;
                    };
                    if skip != Some(name) {
                        self.declare_variable(
                            scope,
                            name,
                            annotation,
                            value.as_ref(),
                            stmt.loc,
                            true,
                        )?;
                    }
                }
                AstStmt::Assign { targets, value } => {
                    if let Some(param) = type_var_declaration(targets, value)? {
                        self.declare_type_variable(scope, param, stmt.loc)?;
                    }
                }
                AstStmt::If { body, orelse, .. } | AstStmt::While { body, orelse, .. } => {
                    self.declare_nested_locals(scope, body, skip)?;
                    self.declare_nested_locals(scope, orelse, skip)?;
                }
                AstStmt::For { body, .. } | AstStmt::With { body, .. } => {
                    self.declare_nested_locals(scope, body, skip)?;
                }
                _ => {}
            }
        }
        for (name, procs, loc) in overloads {
            tracing::trace!(name = %name, candidates = procs.len(), "overload set");
            self.cx.arena.add(
                scope,
                Symbol::new(name, loc, SymbolKind::GenericProcedure(GenericProcedure { procs })),
            )?;
        }
        Ok(())
    }

    /// Annotated declarations inside compound statements belong to the
    /// enclosing scope.
    fn declare_nested_locals(
        &mut self,
        scope: ScopeId,
        body: &'a [ast::Stmt],
        skip: Option<&str>,
    ) -> SemaResult<()> {
        for stmt in body {
            match &stmt.kind {
                AstStmt::AnnAssign {
                    target,
                    annotation,
                    value,
                } => {
                    if let Some(name) = target.as_name().filter(|n| skip != Some(*n)) {
                        self.declare_variable(
                            scope,
                            name,
                            annotation,
                            value.as_ref(),
                            stmt.loc,
                            false,
                        )?;
                    }
                }
                AstStmt::If { body, orelse, .. } | AstStmt::While { body, orelse, .. } => {
                    self.declare_nested_locals(scope, body, skip)?;
                    self.declare_nested_locals(scope, orelse, skip)?;
                }
                AstStmt::For { body, .. } | AstStmt::With { body, .. } => {
                    self.declare_nested_locals(scope, body, skip)?;
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn declare_variable(
        &mut self,
        scope: ScopeId,
        name: &str,
        annotation: &ast::Expr,
        value: Option<&ast::Expr>,
        loc: Location,
        top_level: bool,
    ) -> SemaResult<SymbolId> {
        let resolved = annotation::resolve(self.cx, scope, annotation)?;
        if resolved.intent.is_some() {
            return Err(SemanticError::new(
                ErrorKind::unsupported("an intent wrapper outside a parameter list"),
                annotation.loc,
            ));
        }
        let ty = resolved.finish();
        let mut variable = Variable::local(ty.clone());
        variable.dependencies = type_dependencies(&ty, &self.cx.arena);
        if ty.is_const() {
            let Some(value) = value else {
                return Err(not_constant(name, loc));
            };
            let init = self.static_initializer(scope, name, value, &ty)?;
            variable.value.clone_from(&init.value);
            variable.initializer = Some(init);
        } else if let Some(value) = value {
            // Top-level module constants are initialized statically.
            // Declarations nested in blocks are assigned where they appear.
            if top_level && self.cx.arena.is_global_scope(scope) {
                let init = lower_static_expr(&self.cx.arena, scope, value)
                    .ok()
                    .filter(|init| init.value.is_some())
                    .and_then(|init| {
                        cast_for_assignment(init, &ty, &self.cx.arena, &self.cx.options).ok()
                    });
                if let Some(init) = init {
                    variable.value.clone_from(&init.value);
                    variable.initializer = Some(init);
                }
            }
        }
        tracing::trace!(name, ty = %type_to_string(&ty, &self.cx.arena), "variable");
        self.cx
            .arena
            .add(scope, Symbol::new(name, loc, SymbolKind::Variable(variable)))
    }

    /// A statically known initializer converted to `ty`.
    fn static_initializer(
        &self,
        scope: ScopeId,
        name: &str,
        value: &ast::Expr,
        ty: &Ty,
    ) -> SemaResult<Expr> {
        let init = lower_static_expr(&self.cx.arena, scope, value)?;
        if init.value.is_none() {
            return Err(not_constant(name, value.loc));
        }
        let init = cast_for_assignment(init, ty, &self.cx.arena, &self.cx.options)?;
        if init.value.is_none() {
            return Err(not_constant(name, value.loc));
        }
        Ok(init)
    }

    fn declare_type_variable(&mut self, scope: ScopeId, name: &str, loc: Location) -> SemaResult<()> {
        let variable = Variable::local(Ty::TypeParameter(name.to_owned()));
        self.cx
            .arena
            .add(scope, Symbol::new(name, loc, SymbolKind::Variable(variable)))?;
        Ok(())
    }

    fn declare_function(
        &mut self,
        parent: ScopeId,
        def: &'a ast::FunctionDef,
        decorators: &FunctionDecorators,
        site: FunctionSite,
        loc: Location,
    ) -> SemaResult<SymbolId> {
        let scope = self.cx.arena.new_scope(Some(parent));
        let mut function = Function::new(scope);
        if let Some(abi) = decorators.abi {
            function.abi = abi;
            function.deftype = DefType::Interface;
        }
        function.deterministic = decorators.pure;
        function.side_effect_free = decorators.pure;
        function.is_restriction = decorators.restriction;
        let id = self.cx.arena.add(
            parent,
            Symbol::new(site.name, loc, SymbolKind::Function(function)),
        )?;
        self.cx.arena.set_scope_owner(scope, id);

        let mut params = Vec::with_capacity(def.args.len());
        let mut type_params = Vec::new();
        for (index, arg) in def.args.iter().enumerate() {
            let param = self.declare_parameter(scope, arg, index, site.method_of)?;
            if let Some(ty) = self.cx.arena.variable_type(param) {
                ty.collect_type_parameters(&mut type_params);
            }
            params.push(param);
        }

        let (return_var, local_return) = self.declare_return(scope, def, loc)?;
        if let Some(ty) = return_var.and_then(|rv| self.cx.arena.variable_type(rv)) {
            ty.collect_type_parameters(&mut type_params);
        }
        if let Some(f) = self.cx.arena.function_mut(id) {
            f.params = params;
            f.return_var = return_var;
            f.type_params = type_params;
        }

        let has_body = decorators.abi.is_none();
        if has_body {
            self.skeleton.functions.push((id, def));
        }
        self.declare_items(scope, &def.body, local_return.then_some(def.name.as_str()))?;
        tracing::trace!(name = %def.name, "function declared");
        Ok(id)
    }

    fn declare_parameter(
        &mut self,
        scope: ScopeId,
        arg: &ast::Arg,
        index: usize,
        method_of: Option<SymbolId>,
    ) -> SemaResult<SymbolId> {
        let (ty, explicit_intent) = match (&arg.annotation, method_of) {
            (None, Some(owner)) if index == 0 => (Ty::Class(owner), Some(Intent::InOut)),
            (None, _) => {
                return Err(SemanticError::new(
                    ErrorKind::invalid(format!("parameter `{}` needs a type annotation", arg.name)),
                    arg.loc,
                ))
            }
            (Some(annotation), _) => {
                let resolved = annotation::resolve(self.cx, scope, annotation)?;
                let intent = resolved.intent;
                (resolved.finish(), intent)
            }
        };
        let intent = explicit_intent.unwrap_or(if ty.is_array() {
            Intent::InOut
        } else {
            Intent::In
        });
        let mut variable = Variable::new(ty.clone(), intent);
        variable.dependencies = type_dependencies(&ty, &self.cx.arena);
        if let Some(default) = &arg.default {
            let init = self.static_initializer(scope, &arg.name, default, &ty)?;
            variable.value.clone_from(&init.value);
            variable.initializer = Some(init);
            variable.presence = Presence::Optional;
        }
        self.cx.arena.add(
            scope,
            Symbol::new(arg.name.as_str(), arg.loc, SymbolKind::Variable(variable)),
        )
    }

    /// The return variable, from `-> T` or from a local named after the
    /// function. The flag reports the second form.
    fn declare_return(
        &mut self,
        scope: ScopeId,
        def: &'a ast::FunctionDef,
        loc: Location,
    ) -> SemaResult<(Option<SymbolId>, bool)> {
        let declared = def
            .returns
            .as_ref()
            .filter(|r| !matches!(r.kind, AstKind::NoneLit));
        let local = find_local_declaration(&def.body, &def.name);
        match (declared, local) {
            (Some(_), Some(_)) => Err(SemanticError::new(
                ErrorKind::ReturnValue {
                    function: def.name.clone(),
                    reason: "declared both by a return annotation and by a local of the same name"
                        .to_owned(),
                },
                loc,
            )),
            (Some(annotation), None) => {
                let ty = annotation::resolve_type(self.cx, scope, annotation)?;
                let name = self.cx.arena.unique_name(scope, RETURN_VAR);
                let variable = Variable::new(ty, Intent::ReturnVar);
                let id = self.cx.arena.add(
                    scope,
                    Symbol::new(name, annotation.loc, SymbolKind::Variable(variable)),
                )?;
                Ok((Some(id), false))
            }
            (None, Some((annotation, decl_loc))) => {
                let ty = annotation::resolve_type(self.cx, scope, annotation)?;
                let variable = Variable::new(ty, Intent::ReturnVar);
                let id = self.cx.arena.add(
                    scope,
                    Symbol::new(def.name.as_str(), decl_loc, SymbolKind::Variable(variable)),
                )?;
                Ok((Some(id), true))
            }
            (None, None) => {
                if returns_value(&def.body) {
                    return Err(SemanticError::new(
                        ErrorKind::ReturnValue {
                            function: def.name.clone(),
                            reason: "a value is returned but no return type is declared".to_owned(),
                        },
                        loc,
                    ));
                }
                Ok((None, false))
            }
        }
    }

    fn declare_class(
        &mut self,
        parent: ScopeId,
        class: &'a ast::ClassDef,
        loc: Location,
    ) -> SemaResult<()> {
        let mut is_union = false;
        for decorator in &class.decorators {
            match decorator_name(decorator) {
                Some("dataclass") => {}
                Some("union") => is_union = true,
                _ => {
                    return Err(SemanticError::new(
                        ErrorKind::unsupported(format!(
                            "class decorator `@{}`",
                            annotation::render(decorator)
                        )),
                        decorator.loc,
                    ))
                }
            }
        }
        let mut is_enum = false;
        for base in &class.bases {
            match base.as_name() {
                Some("Enum") => is_enum = true,
                _ => {
                    return Err(SemanticError::new(
                        ErrorKind::unsupported(format!(
                            "base class `{}`",
                            annotation::render(base)
                        )),
                        base.loc,
                    ))
                }
            }
        }
        if is_enum {
            return self.declare_enum(parent, class, loc);
        }

        let scope = self.cx.arena.new_scope(Some(parent));
        let kind = if is_union {
            SymbolKind::Union(UnionType {
                scope,
                members: Vec::new(),
            })
        } else {
            SymbolKind::Struct(StructType {
                scope,
                members: Vec::new(),
                abi: Abi::Source,
            })
        };
        let id = self
            .cx
            .arena
            .add(parent, Symbol::new(class.name.as_str(), loc, kind))?;
        self.cx.arena.set_scope_owner(scope, id);

        let mut members = Vec::new();
        let mut methods = Vec::new();
        for stmt in &class.body {
            match &stmt.kind {
                AstStmt::AnnAssign {
                    target,
                    annotation,
                    value,
                } => {
                    let Some(name) = target.as_name() else {
                        return Err(SemanticError::new(
                            ErrorKind::unsupported("a member declaration that is not a plain name"),
                            stmt.loc,
                        ));
                    };
                    self.declare_member(scope, name, annotation, value.as_ref(), stmt.loc)?;
                    members.push(name.to_owned());
                }
                AstStmt::FunctionDef(def) if !is_union => methods.push((def, stmt.loc)),
                AstStmt::Pass | AstStmt::Expr(_) => {}
                _ => {
                    return Err(SemanticError::new(
                        ErrorKind::unsupported(format!(
                            "this statement in the body of `{}`",
                            class.name
                        )),
                        stmt.loc,
                    ))
                }
            }
        }
        match &mut self.cx.arena.symbol_mut(id).kind {
            SymbolKind::Struct(s) => s.members = members,
            SymbolKind::Union(u) => u.members = members,
            _ => {}
        }

        for (def, method_loc) in methods {
            let decorators = FunctionDecorators::parse(def)?;
            let site = FunctionSite {
                name: format!("__asr_{}_{}", class.name, def.name),
                method_of: Some(id),
            };
            let procedure = self.declare_function(parent, def, &decorators, site, method_loc)?;
            self.cx.arena.add(
                scope,
                Symbol::new(
                    def.name.as_str(),
                    method_loc,
                    SymbolKind::ClassProcedure(ClassProcedure {
                        owner: id,
                        procedure,
                    }),
                ),
            )?;
        }
        Ok(())
    }

    fn declare_member(
        &mut self,
        scope: ScopeId,
        name: &str,
        annotation: &ast::Expr,
        value: Option<&ast::Expr>,
        loc: Location,
    ) -> SemaResult<()> {
        let ty = annotation::resolve_type(self.cx, scope, annotation)?;
        let mut variable = Variable::local(ty.clone());
        variable.dependencies = type_dependencies(&ty, &self.cx.arena);
        if let Some(value) = value {
            let init = self.static_initializer(scope, name, value, &ty)?;
            variable.value.clone_from(&init.value);
            variable.initializer = Some(init);
        }
        self.cx
            .arena
            .add(scope, Symbol::new(name, loc, SymbolKind::Variable(variable)))?;
        Ok(())
    }

    fn declare_enum(
        &mut self,
        parent: ScopeId,
        class: &'a ast::ClassDef,
        loc: Location,
    ) -> SemaResult<()> {
        let scope = self.cx.arena.new_scope(Some(parent));
        let id = self.cx.arena.add(
            parent,
            Symbol::new(
                class.name.as_str(),
                loc,
                SymbolKind::Enum(EnumType {
                    scope,
                    members: Vec::new(),
                    underlying: Ty::integer(4),
                    classification: EnumClassification::UniqueConsecutiveFromZero,
                }),
            ),
        )?;
        self.cx.arena.set_scope_owner(scope, id);

        let mut members = Vec::new();
        let mut values: Vec<Constant> = Vec::new();
        let mut underlying: Option<Ty> = None;
        for stmt in &class.body {
            let (name, value) = match &stmt.kind {
                AstStmt::Assign { targets, value } => match targets.as_slice() {
                    [target] => match target.as_name() {
                        Some(name) => (name, value),
                        None => return Err(enum_member_error(stmt.loc)),
                    },
                    _ => return Err(enum_member_error(stmt.loc)),
                },
                AstStmt::Pass | AstStmt::Expr(_) => continue,
                _ => return Err(enum_member_error(stmt.loc)),
            };
            let init = lower_static_expr(&self.cx.arena, parent, value)?;
            let Some(constant) = init.value.clone() else {
                return Err(not_constant(name, value.loc));
            };
            let ty = init.ty.clone();
            match &underlying {
                None => underlying = Some(ty.clone()),
                Some(first) if !types_equal(first, &ty, &self.cx.arena) => {
                    return Err(SemanticError::new(
                        ErrorKind::TypeMismatch {
                            expected: type_to_string(first, &self.cx.arena),
                            found: type_to_string(&ty, &self.cx.arena),
                        },
                        value.loc,
                    )
                    .with_hint("all members of an enum share one value type"));
                }
                Some(_) => {}
            }
            let mut variable = Variable::local(Ty::constant(ty));
            variable.value = Some(constant.clone());
            variable.initializer = Some(init);
            self.cx
                .arena
                .add(scope, Symbol::new(name, stmt.loc, SymbolKind::Variable(variable)))?;
            members.push(name.to_owned());
            values.push(constant);
        }
        let classification = classify_enum(&values);
        if let SymbolKind::Enum(e) = &mut self.cx.arena.symbol_mut(id).kind {
            e.members = members;
            e.underlying = underlying.unwrap_or(Ty::integer(4));
            e.classification = classification;
        }
        Ok(())
    }

    /// Attach the restriction functions each generic function calls.
    fn collect_restrictions(&mut self) {
        for (id, def) in &self.skeleton.functions {
            let Some(function) = self.cx.arena.function(*id) else {
                continue;
            };
            if !function.is_generic() {
                continue;
            }
            let scope = function.scope;
            let mut called = Vec::new();
            for stmt in &def.body {
                called_names_stmt(stmt, &mut called);
            }
            let mut restrictions = Vec::new();
            let mut dependencies = Vec::new();
            for name in called {
                let Some(callee) = self.cx.arena.resolve(scope, &name) else {
                    continue;
                };
                let real = self.cx.arena.symbol_get_past_external(callee);
                if self.cx.arena.function(real).is_some_and(|f| f.is_restriction)
                    && !restrictions.contains(&callee)
                {
                    restrictions.push(callee);
                    add_dependency(&mut dependencies, &name);
                }
            }
            if let Some(function) = self.cx.arena.function_mut(*id) {
                function.restrictions = restrictions;
                for name in dependencies {
                    add_dependency(&mut function.dependencies, &name);
                }
            }
        }
    }
}

/// `T = TypeVar("T")`: the declared name.
pub(crate) fn type_var_declaration<'e>(
    targets: &'e [ast::Expr],
    value: &ast::Expr,
) -> SemaResult<Option<&'e str>> {
    let AstKind::Call { func, args, .. } = &value.kind else {
        return Ok(None);
    };
    if func.as_name() != Some("TypeVar") {
        return Ok(None);
    }
    let [target] = targets else {
        return Ok(None);
    };
    let (Some(name), [arg]) = (target.as_name(), args.as_slice()) else {
        return Err(SemanticError::new(
            ErrorKind::invalid("`TypeVar` takes the variable's own name as its only argument"),
            value.loc,
        ));
    };
    match &arg.kind {
        AstKind::Str(s) if s == name => Ok(Some(name)),
        _ => Err(SemanticError::new(
            ErrorKind::invalid(format!("`TypeVar` argument must be \"{name}\"")),
            arg.loc,
        )),
    }
}

/// An annotated declaration of `name` anywhere in `body`, outside nested
/// definitions.
fn find_local_declaration<'b>(
    body: &'b [ast::Stmt],
    name: &str,
) -> Option<(&'b ast::Expr, Location)> {
    for stmt in body {
        let found = match &stmt.kind {
            AstStmt::AnnAssign {
                target, annotation, ..
            } if target.as_name() == Some(name) => Some((annotation, stmt.loc)),
            AstStmt::If { body, orelse, .. } | AstStmt::While { body, orelse, .. } => {
                find_local_declaration(body, name).or_else(|| find_local_declaration(orelse, name))
            }
            AstStmt::For { body, .. } | AstStmt::With { body, .. } => {
                find_local_declaration(body, name)
            }
            _ => None,
        };
        if found.is_some() {
            return found;
        }
    }
    None
}

/// Whether a `return <value>` occurs in `body`, outside nested definitions.
fn returns_value(body: &[ast::Stmt]) -> bool {
    body.iter().any(|stmt| match &stmt.kind {
        AstStmt::Return(value) => value.is_some(),
        AstStmt::If { body, orelse, .. } | AstStmt::While { body, orelse, .. } => {
            returns_value(body) || returns_value(orelse)
        }
        AstStmt::For { body, .. } | AstStmt::With { body, .. } => returns_value(body),
        _ => false,
    })
}

fn called_names_stmt(stmt: &ast::Stmt, out: &mut Vec<String>) {
    match &stmt.kind {
        AstStmt::Expr(e) | AstStmt::Return(Some(e)) => called_names_expr(e, out),
        AstStmt::Assign { value, .. } | AstStmt::AugAssign { value, .. } => {
            called_names_expr(value, out);
        }
        AstStmt::AnnAssign { value: Some(v), .. } => called_names_expr(v, out),
        AstStmt::If { test, body, orelse } | AstStmt::While { test, body, orelse } => {
            called_names_expr(test, out);
            for s in body.iter().chain(orelse) {
                called_names_stmt(s, out);
            }
        }
        AstStmt::For { iter, body, .. } => {
            called_names_expr(iter, out);
            for s in body {
                called_names_stmt(s, out);
            }
        }
        AstStmt::With { body, .. } => {
            for s in body {
                called_names_stmt(s, out);
            }
        }
        _ => {}
    }
}

fn called_names_expr(expr: &ast::Expr, out: &mut Vec<String>) {
    match &expr.kind {
        AstKind::Call { func, args, keywords } => {
            if let Some(name) = func.as_name() {
                if !out.iter().any(|n| n == name) {
                    out.push(name.to_owned());
                }
            }
            for arg in args {
                called_names_expr(arg, out);
            }
            for keyword in keywords {
                called_names_expr(&keyword.value, out);
            }
        }
        AstKind::BinOp { left, right, .. } => {
            called_names_expr(left, out);
            called_names_expr(right, out);
        }
        AstKind::UnaryOp { operand, .. } => called_names_expr(operand, out),
        AstKind::BoolOp { values, .. } => {
            for v in values {
                called_names_expr(v, out);
            }
        }
        AstKind::Compare {
            left, comparators, ..
        } => {
            called_names_expr(left, out);
            for c in comparators {
                called_names_expr(c, out);
            }
        }
        AstKind::IfExp { test, body, orelse } => {
            called_names_expr(test, out);
            called_names_expr(body, out);
            called_names_expr(orelse, out);
        }
        AstKind::Subscript { value, slice } => {
            called_names_expr(value, out);
            called_names_expr(slice, out);
        }
        AstKind::List(items) | AstKind::Tuple(items) | AstKind::Set(items) => {
            for item in items {
                called_names_expr(item, out);
            }
        }
        _ => {}
    }
}

/// Names of the aggregates a type mentions.
fn type_dependencies(ty: &Ty, arena: &SymbolArena) -> Vec<String> {
    let mut out = Vec::new();
    collect_type_dependencies(ty, arena, &mut out);
    out
}

fn collect_type_dependencies(ty: &Ty, arena: &SymbolArena, out: &mut Vec<String>) {
    match ty {
        Ty::Struct(id) | Ty::Class(id) | Ty::Enum(id) | Ty::Union(id) => {
            add_dependency(out, arena.symbol_name(*id));
        }
        Ty::List(inner)
        | Ty::Set(inner)
        | Ty::Pointer(inner)
        | Ty::Allocatable(inner)
        | Ty::Const(inner)
        | Ty::Array(inner, _) => collect_type_dependencies(inner, arena, out),
        Ty::Dict(key, value) => {
            collect_type_dependencies(key, arena, out);
            collect_type_dependencies(value, arena, out);
        }
        Ty::Tuple(elements) => {
            for element in elements {
                collect_type_dependencies(element, arena, out);
            }
        }
        _ => {}
    }
}

fn classify_enum(values: &[Constant]) -> EnumClassification {
    let consecutive = values
        .iter()
        .enumerate()
        .all(|(i, v)| v.as_integer() == i64::try_from(i).ok());
    if consecutive {
        return EnumClassification::UniqueConsecutiveFromZero;
    }
    let unique = values
        .iter()
        .enumerate()
        .all(|(i, v)| values[..i].iter().all(|w| w != v));
    if unique {
        EnumClassification::Unique
    } else {
        EnumClassification::NonUnique
    }
}

fn enum_member_error(loc: Location) -> SemanticError {
    SemanticError::new(
        ErrorKind::unsupported("an enum member that is not `NAME = value`"),
        loc,
    )
}

fn not_constant(name: &str, loc: Location) -> SemanticError {
    SemanticError::new(
        ErrorKind::NotCompileTimeConstant {
            name: name.to_owned(),
        },
        loc,
    )
}

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]
mod tests;
