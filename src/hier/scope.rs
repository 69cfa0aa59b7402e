use std::collections::BTreeMap;

use crate::names::Ident;

use super::symbols::SymbolId;
use super::Compilation;

/// Identifies a scope within its owning compilation.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct ScopeId(pub(crate) usize);

/// An ordered collection of member symbols with a name index. Each scope is
/// owned by exactly one symbol; scopes form a tree rooted at `$root`.
#[derive(Debug)]
pub struct Scope {
    pub owner: SymbolId,
    pub(crate) members: Vec<SymbolId>,

    /// First declaration wins; duplicates stay in `members` but never
    /// shadow the index entry.
    pub(crate) names: BTreeMap<Ident, SymbolId>,
}

impl Scope {
    pub(crate) fn new(owner: SymbolId) -> Self {
        Self { owner, members: Vec::new(), names: BTreeMap::new() }
    }

    /// Members in declaration order.
    pub fn members(&self) -> &[SymbolId] {
        &self.members
    }

    /// Exact-name lookup restricted to this scope.
    pub fn find(&self, name: Ident) -> Option<SymbolId> {
        self.names.get(&name).copied()
    }
}

/// A textual position within a scope, used to enforce forward-visibility
/// during name lookup: only members declared at strictly smaller order
/// indices are visible.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct LookupLocation {
    pub scope: ScopeId,
    pub index: u32,
}

impl LookupLocation {
    /// The very start of a scope; nothing declared in it is visible yet.
    pub fn start(scope: ScopeId) -> Self {
        Self { scope, index: 0 }
    }

    /// Past the end of a scope; everything declared in it is visible.
    pub fn max(scope: ScopeId) -> Self {
        Self { scope, index: u32::MAX }
    }
}

impl<'a> Compilation<'a> {
    /// The position just before the given symbol in its parent scope.
    pub fn location_before(&self, symbol: SymbolId) -> Option<LookupLocation> {
        let symbol = self.symbol(symbol);
        Some(LookupLocation { scope: symbol.parent?, index: symbol.order })
    }

    /// The position just after the given symbol in its parent scope.
    pub fn location_after(&self, symbol: SymbolId) -> Option<LookupLocation> {
        let symbol = self.symbol(symbol);
        Some(LookupLocation { scope: symbol.parent?, index: symbol.order + 1 })
    }

    /// Exact-name lookup in one scope, without visibility rules.
    pub fn find(&self, scope: ScopeId, name: &str) -> Option<SymbolId> {
        let ident = self.names.get(name)?;
        self.scope(scope).find(ident)
    }

    /// Location-aware name lookup: search the location's scope respecting
    /// forward visibility, then ascend parent scopes with the owner's own
    /// position. `$root` is the terminal parent.
    pub fn lookup(&self, name: &str, location: LookupLocation) -> Option<SymbolId> {
        let ident = self.names.get(name)?;
        self.lookup_ident(ident, location)
    }

    pub(crate) fn lookup_ident(&self, ident: Ident, location: LookupLocation) -> Option<SymbolId> {
        let mut scope_id = location.scope;
        let mut index = location.index;

        loop {
            let scope = self.scope(scope_id);
            if let Some(found) = scope.find(ident) {
                if self.symbol(found).order < index {
                    return Some(found);
                }
            }

            let owner = self.symbol(scope.owner);
            match owner.parent {
                Some(parent) => {
                    index = owner.order + 1;
                    scope_id = parent;
                }
                None => return None,
            }
        }
    }
}
