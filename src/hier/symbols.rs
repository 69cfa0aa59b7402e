use crate::names::Ident;
use crate::parse::cst::{SyntaxNode, TokenKind};
use crate::source::Span;

use super::binder::ConstantValue;
use super::scope::ScopeId;
use super::DefinitionId;

/// Identifies a symbol within its owning [`Compilation`](super::Compilation).
/// Stable for the compilation's lifetime.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct SymbolId(pub(crate) usize);

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum SymbolKind {
    CompilationUnit,
    Package,
    ModuleInstance,
    InterfaceInstance,
    ProgramInstance,
    SequentialBlock,
    ProceduralBlock,
    GenerateBlock,
    GenerateBlockArray,
    Parameter,
    Root,
}

impl SymbolKind {
    pub fn is_instance(&self) -> bool {
        matches!(
            self,
            Self::ModuleInstance | Self::InterfaceInstance | Self::ProgramInstance
        )
    }
}

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ProceduralBlockKind {
    Initial,
    Always,
    AlwaysComb,
    AlwaysLatch,
    AlwaysFf,
    Final,
}

impl ProceduralBlockKind {
    pub(crate) fn from_token(kind: TokenKind) -> Self {
        match kind {
            TokenKind::Initial => Self::Initial,
            TokenKind::Always => Self::Always,
            TokenKind::AlwaysComb => Self::AlwaysComb,
            TokenKind::AlwaysLatch => Self::AlwaysLatch,
            TokenKind::AlwaysFf => Self::AlwaysFf,
            TokenKind::Final => Self::Final,
            _ => unreachable!("guarded by the member dispatch"),
        }
    }
}

/// A named entity in the elaborated design. Symbols are arena-owned by the
/// compilation; identity is the [`SymbolId`].
#[derive(Debug)]
pub struct Symbol<'a> {
    pub kind: SymbolKind,
    pub name: Option<Ident>,
    pub location: Option<Span>,

    /// The scope containing this symbol, and this symbol's position in its
    /// member list. `None` only for `$root`.
    pub parent: Option<ScopeId>,
    pub order: u32,

    /// The scope this symbol owns, for symbols that are scopes.
    pub scope: Option<ScopeId>,

    pub data: SymbolData<'a>,
}

#[derive(Debug)]
pub enum SymbolData<'a> {
    None,

    Instance {
        definition: DefinitionId,
    },

    /// A statement-bodied scope: the body statement tree lives on the
    /// symbol.
    Block {
        body: &'a SyntaxNode<'a>,
    },

    ProceduralBlock {
        kind: ProceduralBlockKind,
        body: &'a SyntaxNode<'a>,
    },

    Parameter {
        /// `None` when constant evaluation of the value failed; the
        /// failure has already been diagnosed.
        value: Option<ConstantValue>,
        is_local: bool,
    },

    Root {
        top_instances: Vec<SymbolId>,
        compilation_units: Vec<SymbolId>,
    },
}

impl Symbol<'_> {
    pub fn is_kind(&self, kind: SymbolKind) -> bool {
        self.kind == kind
    }

    /// The resolved constant value, for parameter symbols.
    pub fn parameter_value(&self) -> Option<ConstantValue> {
        match &self.data {
            SymbolData::Parameter { value, .. } => *value,
            _ => None,
        }
    }
}
