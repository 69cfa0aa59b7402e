//! Materializes syntax into the symbol/scope graph. Each construct follows
//! the same discipline: evaluate whatever gates it first, then create the
//! symbol, link it into its parent scope, and only then elaborate its body,
//! so that name lookup can ascend out of the new scope while the body is
//! being built.

use std::collections::BTreeSet;

use log::{debug, trace};

use crate::errors::Errors;
use crate::names::Ident;
use crate::parse::cst::{Node, SyntaxNode, TokenKind, TokenOrSyntax};
use crate::parse::SyntaxTree;
use crate::source::Span;

use super::binder::ConstantValue;
use super::scope::{LookupLocation, ScopeId};
use super::symbols::{ProceduralBlockKind, Symbol, SymbolData, SymbolId, SymbolKind};
use super::{
    collect_instantiated, definition_kind, Compilation, Definition, DefinitionId, DefinitionKind,
    ParameterDecl, ParameterMetadata,
};

pub(super) struct Elaborator<'a, 'c, 'e> {
    pub(super) comp: &'c mut Compilation<'a>,
    pub(super) errors: &'e mut Errors,
    depth: usize,
}

impl<'a, 'c, 'e> Elaborator<'a, 'c, 'e> {
    pub fn new(comp: &'c mut Compilation<'a>, errors: &'e mut Errors) -> Self {
        Self { comp, errors, depth: 0 }
    }

    fn create_symbol(
        &mut self,
        kind: SymbolKind,
        name: Option<Ident>,
        location: Option<Span>,
        data: SymbolData<'a>,
    ) -> SymbolId {
        self.comp.alloc_symbol(Symbol {
            kind,
            name,
            location,
            parent: None,
            order: 0,
            scope: None,
            data,
        })
    }

    fn create_scope(&mut self, symbol: SymbolId) -> ScopeId {
        let scope = self.comp.alloc_scope(symbol);
        self.comp.symbols[symbol.0].scope = Some(scope);
        scope
    }

    /// Append a symbol to a scope's member list and name index. The first
    /// declaration of a name wins; later ones stay in the member list and
    /// are diagnosed.
    fn add_member(&mut self, scope: ScopeId, symbol: SymbolId) {
        let order = self.comp.scopes[scope.0].members.len() as u32;

        let member = &mut self.comp.symbols[symbol.0];
        member.parent = Some(scope);
        member.order = order;
        self.comp.scopes[scope.0].members.push(symbol);

        let Some(name) = self.comp.symbols[symbol.0].name else { return };
        let previous = self.comp.scopes[scope.0].names.get(&name).copied();
        match previous {
            Some(previous) => {
                let previous_at = self.comp.symbols[previous.0].location;
                let at = self.comp.symbols[symbol.0].location;
                if let (Some(at), Some(previous_at)) = (at, previous_at) {
                    let text = self.comp.names.get_ident(&name).to_owned();
                    self.errors.hier_error(at).redefined(previous_at, &text);
                }
            }
            None => {
                self.comp.scopes[scope.0].names.insert(name, symbol);
            }
        }
    }

    /// The position at the current end of a scope; everything already added
    /// is visible from here.
    fn end_location(&self, scope: ScopeId) -> LookupLocation {
        LookupLocation { scope, index: self.comp.scope(scope).members().len() as u32 }
    }

    /// Build one compilation unit: packages become members, module-like
    /// declarations register definitions.
    pub fn compilation_unit(&mut self, root_scope: ScopeId, tree: &'a SyntaxTree<'a>) -> SymbolId {
        let unit = self.create_symbol(SymbolKind::CompilationUnit, None, None, SymbolData::None);
        self.add_member(root_scope, unit);
        let scope = self.create_scope(unit);

        let Node::SourceText { members, .. } = &tree.root.node else { return unit };

        for &member in *members {
            if let Node::ModuleDeclaration { keyword, .. } = &member.node {
                if keyword.kind == TokenKind::Package {
                    self.package_from_syntax(scope, member);
                } else {
                    self.register_definition(member);
                }
            }
        }

        unit
    }

    fn package_from_syntax(&mut self, scope: ScopeId, syntax: &'a SyntaxNode<'a>) {
        let Node::ModuleDeclaration { name, members, .. } = &syntax.node else { return };

        trace!("elaborating package `{}`", name.text);
        let ident = (!name.missing).then(|| self.comp.names.intern(name.text));
        let symbol =
            self.create_symbol(SymbolKind::Package, ident, Some(name.span), SymbolData::None);
        self.add_member(scope, symbol);

        let package_scope = self.create_scope(symbol);
        for &member in *members {
            self.member(package_scope, member);
        }
    }

    fn register_definition(&mut self, syntax: &'a SyntaxNode<'a>) {
        let Node::ModuleDeclaration { keyword, name, parameter_ports, members, .. } = &syntax.node
        else {
            return;
        };
        let Some(kind) = definition_kind(keyword.kind) else { return };
        if name.missing {
            return;
        }

        let ident = self.comp.names.intern(name.text);
        if let Some(&previous) = self.comp.definition_names.get(&ident) {
            let previous_at = self.comp.definition(previous).location;
            self.errors.hier_error(name.span).duplicate_definition(previous_at, name.text);
            return;
        }

        let mut parameters = Vec::new();

        if let Some(port_list) = parameter_ports {
            if let Node::ParameterPortList { list, .. } = &port_list.node {
                // A keyword-less declaration inherits the previous one's
                // localness.
                let mut last_local = false;
                for item in list.items() {
                    let Node::ParameterDeclaration { keyword, declarators, .. } = &item.node
                    else {
                        continue;
                    };

                    let is_local = match keyword.map(|keyword| keyword.kind) {
                        Some(TokenKind::LocalParam) => true,
                        Some(_) => false,
                        None => last_local,
                    };
                    last_local = is_local;

                    self.gather_declarators(declarators, is_local, true, &mut parameters);
                }
            }
        }

        for &member in *members {
            if let Node::ParameterDeclaration { keyword: Some(keyword), declarators, .. } =
                &member.node
            {
                let is_local = keyword.kind == TokenKind::LocalParam;
                self.gather_declarators(declarators, is_local, false, &mut parameters);
            }
        }

        debug!("registered definition `{}` with {} parameters", name.text, parameters.len());

        let id = DefinitionId(self.comp.definitions.len());
        self.comp.definitions.push(Definition {
            name: ident,
            kind,
            location: name.span,
            parameters,
            members,
        });
        self.comp.definition_names.insert(ident, id);
    }

    fn gather_declarators(
        &mut self,
        declarators: &'a [TokenOrSyntax<'a>],
        is_local: bool,
        is_port: bool,
        out: &mut Vec<ParameterDecl<'a>>,
    ) {
        for element in declarators {
            let TokenOrSyntax::Node(node) = element else { continue };
            let Node::Declarator { name, init, .. } = &node.node else { continue };
            if name.missing {
                continue;
            }

            out.push(ParameterDecl {
                name: self.comp.names.intern(name.text),
                location: name.span,
                default: *init,
                is_local,
                is_port,
            });
        }
    }

    /// Decide which definitions are design roots and instantiate them with
    /// default parameter values.
    pub fn top_instances(
        &mut self,
        root_scope: ScopeId,
        units: &[&'a SyntaxTree<'a>],
    ) -> Vec<SymbolId> {
        let mut referenced = BTreeSet::new();
        for definition in &self.comp.definitions {
            collect_instantiated(definition.members, &mut referenced);
        }

        let explicit = self.comp.options().top_modules.clone();
        let top_definitions: Vec<DefinitionId> = if !explicit.is_empty() {
            let anchor = units
                .first()
                .map(|tree| tree.root.span.source.at(tree.root.span.start));

            explicit
                .iter()
                .filter_map(|name| {
                    let found = self
                        .comp
                        .names
                        .get(name)
                        .and_then(|ident| self.comp.definition_names.get(&ident).copied());

                    if found.is_none() {
                        if let Some(anchor) = anchor {
                            self.errors.hier_error(anchor).unknown_top_module(name);
                        }
                    }

                    found
                })
                .collect()
        } else {
            self.comp
                .definitions
                .iter()
                .enumerate()
                .filter(|(_, definition)| definition.kind == DefinitionKind::Module)
                .filter(|(_, definition)| {
                    !referenced.contains(self.comp.names.get_ident(&definition.name))
                })
                .map(|(index, _)| DefinitionId(index))
                .collect()
        };

        let mut tops = Vec::new();
        for definition in top_definitions {
            let def = self.comp.definition(definition);
            let (name, location) = (def.name, def.location);
            trace!("instantiating top module `{}`", self.comp.names.get_ident(&name));

            let instance =
                self.instantiate(root_scope, Some(name), Some(location), definition, &[]);
            tops.push(instance);
        }

        debug!("{} top-level instances", tops.len());
        tops
    }

    /// Create an instance symbol in `scope` and populate it from its
    /// definition with the given resolved parameters.
    fn instantiate(
        &mut self,
        scope: ScopeId,
        name: Option<Ident>,
        location: Option<Span>,
        definition: DefinitionId,
        parameters: &[ParameterMetadata],
    ) -> SymbolId {
        let kind = match self.comp.definition(definition).kind {
            DefinitionKind::Module => SymbolKind::ModuleInstance,
            DefinitionKind::Interface => SymbolKind::InterfaceInstance,
            DefinitionKind::Program => SymbolKind::ProgramInstance,
        };

        let symbol =
            self.create_symbol(kind, name, location, SymbolData::Instance { definition });
        self.add_member(scope, symbol);

        let instance_scope = self.create_scope(symbol);
        self.populate(instance_scope, definition, parameters);
        symbol
    }

    /// Fill an instance scope from its definition: header parameters first,
    /// then body members in source order. Parameter symbols created here
    /// are disjoint from those of every other instance.
    fn populate(
        &mut self,
        scope: ScopeId,
        definition: DefinitionId,
        parameters: &[ParameterMetadata],
    ) {
        let limit = self.comp.options().max_instance_depth;
        if self.depth >= limit {
            let at = self.comp.definition(definition).location;
            self.errors.hier_error(at).instance_depth_limit(limit);
            return;
        }
        self.depth += 1;

        let port_count = self
            .comp
            .definition(definition)
            .parameters
            .iter()
            .filter(|decl| decl.is_port)
            .count();

        for index in 0..port_count {
            self.parameter_symbol(scope, definition, index, parameters);
        }

        // Body parameter declarations line up with the remaining decls in
        // gathering order.
        let mut cursor = port_count;
        let members = self.comp.definition(definition).members;
        for &member in members {
            match &member.node {
                Node::ParameterDeclaration { keyword: Some(_), declarators, .. } => {
                    for element in *declarators {
                        let TokenOrSyntax::Node(node) = element else { continue };
                        let Node::Declarator { name, .. } = &node.node else { continue };
                        if name.missing {
                            continue;
                        }

                        self.parameter_symbol(scope, definition, cursor, parameters);
                        cursor += 1;
                    }
                }
                _ => self.member(scope, member),
            }
        }

        self.depth -= 1;
    }

    fn parameter_symbol(
        &mut self,
        scope: ScopeId,
        definition: DefinitionId,
        decl_index: usize,
        parameters: &[ParameterMetadata],
    ) {
        let decl = self.comp.definition(definition).parameters[decl_index];
        let metadata = parameters.iter().find(|metadata| metadata.decl == decl_index);

        let value = match metadata {
            Some(metadata) if metadata.overridden => metadata.value,
            _ => decl.default.and_then(|expr| {
                let location = self.end_location(scope);
                self.evaluate_constant(location, expr, None).map(ConstantValue::Int)
            }),
        };

        let symbol = self.create_symbol(
            SymbolKind::Parameter,
            Some(decl.name),
            Some(decl.location),
            SymbolData::Parameter { value, is_local: decl.is_local },
        );
        self.add_member(scope, symbol);
    }

    /// Elaborate one member into `scope`. Used for instance bodies,
    /// packages, and generate blocks alike.
    fn member(&mut self, scope: ScopeId, member: &'a SyntaxNode<'a>) {
        match &member.node {
            Node::ParameterDeclaration { keyword, declarators, .. } => {
                let is_local =
                    matches!(keyword.map(|keyword| keyword.kind), Some(TokenKind::LocalParam));

                for element in *declarators {
                    let TokenOrSyntax::Node(node) = element else { continue };
                    let Node::Declarator { name, init, .. } = &node.node else { continue };
                    if name.missing {
                        continue;
                    }

                    let ident = self.comp.names.intern(name.text);
                    let location = self.end_location(scope);
                    let value = init
                        .and_then(|expr| self.evaluate_constant(location, expr, None))
                        .map(ConstantValue::Int);

                    let symbol = self.create_symbol(
                        SymbolKind::Parameter,
                        Some(ident),
                        Some(name.span),
                        SymbolData::Parameter { value, is_local },
                    );
                    self.add_member(scope, symbol);
                }
            }

            Node::HierarchyInstantiation { .. } => self.instances_from_syntax(scope, member),

            Node::ProceduralBlock { .. } => self.procedural_block_from_syntax(scope, member),

            Node::IfGenerate { .. } => {
                self.if_generate_from_syntax(scope, member);
            }

            Node::LoopGenerate { .. } => {
                self.loop_generate_from_syntax(scope, member);
            }

            // Generate regions are transparent.
            Node::GenerateRegion { members, .. } => {
                for &inner in *members {
                    self.member(scope, inner);
                }
            }

            // A bare generate block is an anonymous scope.
            Node::GenerateBlock { .. } => {
                self.generate_block_symbol(scope, member);
            }

            _ => {}
        }
    }

    /// Resolve the referenced definition and create one instance symbol per
    /// instance name, in source order.
    fn instances_from_syntax(&mut self, scope: ScopeId, syntax: &'a SyntaxNode<'a>) {
        let Node::HierarchyInstantiation { type_name, parameters, instances, .. } = &syntax.node
        else {
            return;
        };
        if type_name.missing {
            return;
        }

        let location = self.end_location(scope);
        let definition = self
            .comp
            .names
            .get(type_name.text)
            .and_then(|ident| self.comp.definition_names.get(&ident).copied());

        let Some(definition) = definition else {
            self.errors.hier_error(type_name.span).unknown_definition(type_name.text);
            return;
        };

        trace!("instantiating `{}`", type_name.text);
        let metadata = self.resolve_parameter_overrides(definition, *parameters, location);

        for element in *instances {
            let TokenOrSyntax::Node(instance) = element else { continue };
            let Node::HierarchicalInstance { name, .. } = &instance.node else { continue };

            let ident = (!name.missing).then(|| self.comp.names.intern(name.text));
            self.instantiate(scope, ident, Some(name.span), definition, &metadata);
        }
    }

    fn procedural_block_from_syntax(&mut self, scope: ScopeId, syntax: &'a SyntaxNode<'a>) {
        let Node::ProceduralBlock { keyword, statement } = &syntax.node else { return };

        let kind = ProceduralBlockKind::from_token(keyword.kind);
        let symbol = self.create_symbol(
            SymbolKind::ProceduralBlock,
            None,
            Some(keyword.span),
            SymbolData::ProceduralBlock { kind, body: statement },
        );
        self.add_member(scope, symbol);

        let block_scope = self.create_scope(symbol);
        self.statement_blocks(block_scope, statement);
    }

    /// Sequential `begin ... end` blocks in a statement tree become child
    /// symbols of the enclosing statement-bodied scope.
    fn statement_blocks(&mut self, scope: ScopeId, statement: &'a SyntaxNode<'a>) {
        let Node::BlockStatement { begin, label, statements, .. } = &statement.node else {
            return;
        };

        let name = label
            .as_ref()
            .filter(|label| !label.name.missing)
            .map(|label| self.comp.names.intern(label.name.text));

        let symbol = self.create_symbol(
            SymbolKind::SequentialBlock,
            name,
            Some(begin.span),
            SymbolData::Block { body: statement },
        );
        self.add_member(scope, symbol);

        let inner = self.create_scope(symbol);
        for &nested in *statements {
            self.statement_blocks(inner, nested);
        }
    }

    /// Evaluate an if-generate guard and build the selected branch, if any.
    /// Returns `None` (publishing nothing) when the guard is false with no
    /// else branch, or when it fails to evaluate.
    fn if_generate_from_syntax(
        &mut self,
        scope: ScopeId,
        syntax: &'a SyntaxNode<'a>,
    ) -> Option<SymbolId> {
        let Node::IfGenerate { condition, block, else_clause, .. } = &syntax.node else {
            return None;
        };

        let location = self.end_location(scope);
        let value = self.evaluate_constant(location, condition, None)?;

        let branch = if value != 0 {
            Some(*block)
        } else {
            else_clause.and_then(|clause| match &clause.node {
                Node::ElseClause { block, .. } => Some(*block),
                _ => None,
            })
        };

        let branch = branch?;
        trace!("if-generate selected a branch");

        // An `else if` chain continues with the nested construct.
        if let Node::IfGenerate { .. } = &branch.node {
            return self.if_generate_from_syntax(scope, branch);
        }

        Some(self.generate_block_symbol(scope, branch))
    }

    /// Build a generate block symbol around a selected branch: either a
    /// labeled/anonymous `begin ... end` or a single member.
    fn generate_block_symbol(&mut self, scope: ScopeId, branch: &'a SyntaxNode<'a>) -> SymbolId {
        match &branch.node {
            Node::GenerateBlock { begin, label, members, .. } => {
                let name = label
                    .as_ref()
                    .filter(|label| !label.name.missing)
                    .map(|label| self.comp.names.intern(label.name.text));

                let symbol = self.create_symbol(
                    SymbolKind::GenerateBlock,
                    name,
                    Some(begin.span),
                    SymbolData::None,
                );
                self.add_member(scope, symbol);

                let block_scope = self.create_scope(symbol);
                for &member in *members {
                    self.member(block_scope, member);
                }

                symbol
            }

            _ => {
                let symbol = self.create_symbol(
                    SymbolKind::GenerateBlock,
                    None,
                    Some(branch.span),
                    SymbolData::None,
                );
                self.add_member(scope, symbol);

                let block_scope = self.create_scope(symbol);
                self.member(block_scope, branch);
                symbol
            }
        }
    }

    /// Expand a loop-generate construct into an array of blocks, one per
    /// iteration, each exposing the genvar as an implicit parameter.
    fn loop_generate_from_syntax(
        &mut self,
        scope: ScopeId,
        syntax: &'a SyntaxNode<'a>,
    ) -> Option<SymbolId> {
        let Node::LoopGenerate { keyword, identifier, init, condition, step, block, .. } =
            &syntax.node
        else {
            return None;
        };
        if identifier.missing {
            return None;
        }

        let genvar = self.comp.names.intern(identifier.text);
        let location = self.end_location(scope);

        let mut value = self.evaluate_constant(location, init, None)?;
        let mut guard = self.evaluate_constant(location, condition, Some((genvar, value)))?;

        let (name, array_location) = match &block.node {
            Node::GenerateBlock { begin, label, .. } => {
                let name = label
                    .as_ref()
                    .filter(|label| !label.name.missing)
                    .map(|label| self.comp.names.intern(label.name.text));
                (name, begin.span)
            }
            _ => (None, keyword.span),
        };

        let array = self.create_symbol(
            SymbolKind::GenerateBlockArray,
            name,
            Some(array_location),
            SymbolData::None,
        );
        self.add_member(scope, array);
        let array_scope = self.create_scope(array);

        let limit = self.comp.options().max_generate_steps;
        let mut steps = 0usize;

        while guard != 0 {
            if steps >= limit {
                self.errors.hier_error(keyword.span).generate_loop_limit(limit);
                break;
            }
            steps += 1;

            let child = self.create_symbol(
                SymbolKind::GenerateBlock,
                None,
                Some(block.span),
                SymbolData::None,
            );
            self.add_member(array_scope, child);
            let child_scope = self.create_scope(child);

            let parameter = self.create_symbol(
                SymbolKind::Parameter,
                Some(genvar),
                Some(identifier.span),
                SymbolData::Parameter { value: Some(ConstantValue::Int(value)), is_local: true },
            );
            self.add_member(child_scope, parameter);

            match &block.node {
                Node::GenerateBlock { members, .. } => {
                    for &member in *members {
                        self.member(child_scope, member);
                    }
                }
                _ => self.member(child_scope, block),
            }

            let Some(next) = self.evaluate_step(location, step, genvar, value) else { break };
            value = next;

            let Some(next_guard) =
                self.evaluate_constant(location, condition, Some((genvar, value)))
            else {
                break;
            };
            guard = next_guard;
        }

        debug!("loop-generate expanded to {steps} blocks");
        Some(array)
    }
}
