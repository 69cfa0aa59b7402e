use bumpalo::Bump;

use crate::parse::cst::{TokenKind, Trivia};
use crate::parse::{Lexer, TokenSource};
use crate::source::Sources;

#[test]
fn trivia_attaches_to_the_following_token() {
    let alloc = Bump::new();
    let mut sources = Sources::new();
    let id = sources.add("  // note\nmodule /* inline */ m");

    let mut lexer = Lexer::new(&alloc, sources.get(id));

    let module = lexer.next_token();
    assert_eq!(TokenKind::Module, module.kind);
    assert!(matches!(module.trivia[0], Trivia::Whitespace("  ")));
    assert!(matches!(module.trivia[1], Trivia::LineComment("// note")));
    assert!(matches!(module.trivia[2], Trivia::Whitespace("\n")));

    let name = lexer.next_token();
    assert_eq!(TokenKind::Identifier, name.kind);
    assert_eq!("m", name.text);
    assert!(matches!(name.trivia[1], Trivia::BlockComment("/* inline */")));
}

#[test]
fn directives_become_trivia() {
    let alloc = Bump::new();
    let mut sources = Sources::new();
    let id = sources.add("`timescale 1ns / 1ps\nmodule m;");

    let mut lexer = Lexer::new(&alloc, sources.get(id));

    let module = lexer.next_token();
    assert_eq!(TokenKind::Module, module.kind);
    assert!(matches!(module.trivia[0], Trivia::Directive("`timescale 1ns / 1ps")));
}

#[test]
fn unmatched_lexemes_become_unknown_tokens() {
    let alloc = Bump::new();
    let mut sources = Sources::new();
    let id = sources.add("@");

    let mut lexer = Lexer::new(&alloc, sources.get(id));

    let unknown = lexer.next_token();
    assert_eq!(TokenKind::Unknown, unknown.kind);
    assert_eq!("@", unknown.text);
}

#[test]
fn end_of_file_repeats() {
    let alloc = Bump::new();
    let mut sources = Sources::new();
    let id = sources.add("m ");

    let mut lexer = Lexer::new(&alloc, sources.get(id));

    assert_eq!(TokenKind::Identifier, lexer.next_token().kind);

    let eof = lexer.next_token();
    assert_eq!(TokenKind::EndOfFile, eof.kind);
    assert!(matches!(eof.trivia[0], Trivia::Whitespace(" ")));

    let again = lexer.next_token();
    assert_eq!(eof, again);
}

#[test]
fn longest_keyword_wins() {
    let alloc = Bump::new();
    let mut sources = Sources::new();
    let id = sources.add("always always_comb alwaysx");

    let mut lexer = Lexer::new(&alloc, sources.get(id));

    assert_eq!(TokenKind::Always, lexer.next_token().kind);
    assert_eq!(TokenKind::AlwaysComb, lexer.next_token().kind);
    assert_eq!(TokenKind::Identifier, lexer.next_token().kind);
}
