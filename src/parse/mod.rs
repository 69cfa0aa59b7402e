pub mod cst;

mod lexer;
mod parser;
mod tokens;

#[cfg(test)]
mod tests;

pub use lexer::{Lexer, TokenSource};

use bumpalo::Bump;

use self::cst::SyntaxNode;
use self::parser::{Parser, Pools};
use crate::errors::Errors;
use crate::source::{Source, SourceId};

/// A parsed compilation unit. The tree borrows the arena and the source
/// buffer; it is structurally complete even when the input was not.
#[derive(Debug)]
pub struct SyntaxTree<'a> {
    pub root: &'a SyntaxNode<'a>,
    pub source: SourceId,
}

pub fn parse<'a>(alloc: &'a Bump, errors: &mut Errors, source: &'a Source) -> SyntaxTree<'a> {
    let lexer = Lexer::new(alloc, source);
    let pools = Pools::new();

    let mut parser = Parser::new(alloc, errors, &pools, lexer);
    let root = parser.source_text();

    SyntaxTree { root, source: source.id }
}
