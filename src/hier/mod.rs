//! The elaborated design hierarchy: definitions, symbols, scopes, and the
//! compilation that owns them.

pub mod binder;
pub mod scope;
pub mod symbols;

mod elab;

#[cfg(test)]
mod tests;

use std::collections::BTreeMap;

use log::debug;

pub use binder::ConstantValue;
pub use scope::{LookupLocation, Scope, ScopeId};
pub use symbols::{ProceduralBlockKind, Symbol, SymbolData, SymbolId, SymbolKind};

use crate::errors::Errors;
use crate::names::{Ident, Names};
use crate::parse::cst::{Node, SyntaxNode, TokenKind};
use crate::parse::SyntaxTree;
use crate::source::Span;

use self::elab::Elaborator;

/// Identifies a pre-elaboration module/interface/program descriptor.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct DefinitionId(pub(crate) usize);

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum DefinitionKind {
    Module,
    Interface,
    Program,
}

/// One parameter declaration of a definition, in source order.
#[derive(Clone, Copy, Debug)]
pub struct ParameterDecl<'a> {
    pub name: Ident,
    pub location: Span,
    pub default: Option<&'a SyntaxNode<'a>>,

    /// `localparam`: never overridable.
    pub is_local: bool,

    /// Declared in the `#(...)` header rather than the body.
    pub is_port: bool,
}

/// An unelaborated module/interface/program declaration; the template from
/// which instance symbols are produced. One definition may back many
/// instances.
#[derive(Debug)]
pub struct Definition<'a> {
    pub name: Ident,
    pub kind: DefinitionKind,
    pub location: Span,
    pub parameters: Vec<ParameterDecl<'a>>,
    pub members: &'a [&'a SyntaxNode<'a>],
}

/// A parameter value resolved for one instance: the declaration it
/// satisfies plus the override, if any.
#[derive(Clone, Copy, Debug)]
pub(crate) struct ParameterMetadata {
    pub decl: usize,
    pub overridden: bool,
    pub value: Option<ConstantValue>,
}

#[derive(Clone, Debug)]
pub struct CompilationOptions {
    /// Explicit top-level module names. When empty, every module definition
    /// that no instantiation references becomes a top.
    pub top_modules: Vec<String>,

    /// Upper bound on loop-generate iterations per construct.
    pub max_generate_steps: usize,

    /// Upper bound on instance nesting, which also breaks recursive
    /// instantiation.
    pub max_instance_depth: usize,
}

impl Default for CompilationOptions {
    fn default() -> Self {
        Self {
            top_modules: Vec::new(),
            max_generate_steps: 1 << 17,
            max_instance_depth: 128,
        }
    }
}

/// Owns every symbol, scope, and definition elaborated from the syntax
/// trees added to it. Single-threaded; independent compilations may run on
/// independent threads.
#[derive(Debug)]
pub struct Compilation<'a> {
    options: CompilationOptions,
    units: Vec<&'a SyntaxTree<'a>>,

    pub(crate) names: Names,
    pub(crate) symbols: Vec<Symbol<'a>>,
    pub(crate) scopes: Vec<Scope>,

    pub(crate) definitions: Vec<Definition<'a>>,
    pub(crate) definition_names: BTreeMap<Ident, DefinitionId>,

    root: Option<SymbolId>,
}

impl<'a> Compilation<'a> {
    pub fn new(options: CompilationOptions) -> Self {
        Self {
            options,
            units: Vec::new(),
            names: Names::new(),
            symbols: Vec::new(),
            scopes: Vec::new(),
            definitions: Vec::new(),
            definition_names: BTreeMap::new(),
            root: None,
        }
    }

    /// Add a parsed compilation unit. Must happen before `elaborate`.
    pub fn add_unit(&mut self, tree: &'a SyntaxTree<'a>) {
        debug_assert!(self.root.is_none(), "units cannot be added after elaboration");
        self.units.push(tree);
    }

    /// Materialize the symbol hierarchy and return `$root`. Idempotent:
    /// later calls return the same root.
    pub fn elaborate(&mut self, errors: &mut Errors) -> SymbolId {
        if let Some(root) = self.root {
            return root;
        }

        debug!("elaborating {} compilation units", self.units.len());

        let root = self.alloc_symbol(Symbol {
            kind: SymbolKind::Root,
            name: None,
            location: None,
            parent: None,
            order: 0,
            scope: None,
            data: SymbolData::Root { top_instances: Vec::new(), compilation_units: Vec::new() },
        });
        let root_scope = self.alloc_scope(root);
        self.symbols[root.0].scope = Some(root_scope);

        let units = std::mem::take(&mut self.units);
        let mut elab = Elaborator::new(self, errors);

        let mut unit_symbols = Vec::new();
        for &tree in &units {
            unit_symbols.push(elab.compilation_unit(root_scope, tree));
        }

        let tops = elab.top_instances(root_scope, &units);

        self.units = units;
        match &mut self.symbols[root.0].data {
            SymbolData::Root { top_instances, compilation_units } => {
                *top_instances = tops;
                *compilation_units = unit_symbols;
            }
            _ => unreachable!("the root symbol was just created"),
        }

        self.root = Some(root);
        root
    }

    /// The `$root` symbol. Only valid after `elaborate`.
    pub fn root(&self) -> SymbolId {
        self.root.expect("`elaborate` must run before querying the hierarchy")
    }

    pub fn symbol(&self, id: SymbolId) -> &Symbol<'a> {
        &self.symbols[id.0]
    }

    pub fn scope(&self, id: ScopeId) -> &Scope {
        &self.scopes[id.0]
    }

    pub fn definition(&self, id: DefinitionId) -> &Definition<'a> {
        &self.definitions[id.0]
    }

    /// The display name of a symbol; `$root` for the root, empty for other
    /// unnamed symbols.
    pub fn symbol_name(&self, id: SymbolId) -> &str {
        let symbol = self.symbol(id);
        match symbol.kind {
            SymbolKind::Root => "$root",
            _ => symbol.name.map(|ident| self.names.get_ident(&ident)).unwrap_or(""),
        }
    }

    pub fn options(&self) -> &CompilationOptions {
        &self.options
    }

    pub(crate) fn alloc_symbol(&mut self, symbol: Symbol<'a>) -> SymbolId {
        let id = SymbolId(self.symbols.len());
        self.symbols.push(symbol);
        id
    }

    pub(crate) fn alloc_scope(&mut self, owner: SymbolId) -> ScopeId {
        let id = ScopeId(self.scopes.len());
        self.scopes.push(Scope::new(owner));
        id
    }
}

/// Type names referenced by any instantiation under these members,
/// gathered syntactically before elaboration. Drives the default
/// top-module heuristic.
pub(crate) fn collect_instantiated<'a>(
    members: &'a [&'a SyntaxNode<'a>],
    out: &mut std::collections::BTreeSet<&'a str>,
) {
    for member in members {
        collect_instantiated_member(member, out);
    }
}

fn collect_instantiated_member<'a>(
    member: &'a SyntaxNode<'a>,
    out: &mut std::collections::BTreeSet<&'a str>,
) {
    match &member.node {
        Node::HierarchyInstantiation { type_name, .. } => {
            out.insert(type_name.text);
        }
        Node::GenerateRegion { members, .. } | Node::GenerateBlock { members, .. } => {
            collect_instantiated(members, out);
        }
        Node::IfGenerate { block, else_clause, .. } => {
            collect_instantiated_member(block, out);
            if let Some(else_clause) = else_clause {
                collect_instantiated_member(else_clause, out);
            }
        }
        Node::ElseClause { block, .. } => collect_instantiated_member(block, out),
        Node::LoopGenerate { block, .. } => collect_instantiated_member(block, out),
        _ => {}
    }
}

pub(crate) fn definition_kind(keyword: TokenKind) -> Option<DefinitionKind> {
    match keyword {
        TokenKind::Module => Some(DefinitionKind::Module),
        TokenKind::Interface => Some(DefinitionKind::Interface),
        TokenKind::Program => Some(DefinitionKind::Program),
        _ => None,
    }
}
