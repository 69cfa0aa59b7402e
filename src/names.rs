use lasso::{Key, Rodeo};

/// An identifier directly corresponds to the literal identifiers appearing
/// in the source code.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Ident(usize);

/// A name store is responsible for interning identifiers. Each Compilation
/// owns exactly one; idents from separate stores are never mixed.
pub struct Names {
    idents: Rodeo<Ident>,
}

impl std::fmt::Debug for Names {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Names").field("len", &self.idents.len()).finish()
    }
}

impl Names {
    pub fn new() -> Self {
        Self { idents: Rodeo::new() }
    }

    pub fn intern(&mut self, name: impl AsRef<str>) -> Ident {
        self.idents.get_or_intern(name)
    }

    /// Look up an already-interned identifier without creating one.
    pub fn get(&self, name: impl AsRef<str>) -> Option<Ident> {
        self.idents.get(name)
    }

    pub fn get_ident(&self, ident: &Ident) -> &str {
        self.idents.resolve(ident)
    }
}

impl Default for Names {
    fn default() -> Self {
        Self::new()
    }
}

// SAFETY: `Ident` is a dumb newtype over usizes, so `try_from_usize` and
// `into_usize` are exactly symmetrical.
unsafe impl Key for Ident {
    fn into_usize(self) -> usize {
        self.0
    }

    fn try_from_usize(value: usize) -> Option<Self> {
        Some(Self(value))
    }
}
