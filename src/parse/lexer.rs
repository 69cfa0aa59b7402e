use bumpalo::Bump;
use logos::Logos;

use super::cst::{Token, TokenKind, Trivia};
use super::tokens::RawToken;
use crate::source::{Source, SourceId};

/// A forward-only cursor over the tokens of one source. End of input is
/// signaled by a token of kind [`TokenKind::EndOfFile`]; the cursor keeps
/// yielding that same token once exhausted.
pub trait TokenSource<'a> {
    fn next_token(&mut self) -> Token<'a>;
}

/// Wraps the raw DFA, folding whitespace, comments, and directives into the
/// leading trivia of the next significant token. Lexemes no rule matches
/// become `Unknown` tokens for the parser to recover over; nothing is
/// dropped.
pub struct Lexer<'a> {
    alloc: &'a Bump,
    raw: logos::SpannedIter<'a, RawToken>,
    content: &'a str,
    source: SourceId,
    eof: Option<Token<'a>>,
}

impl<'a> Lexer<'a> {
    pub fn new(alloc: &'a Bump, source: &'a Source) -> Self {
        Self {
            alloc,
            raw: RawToken::lexer(&source.content).spanned(),
            content: &source.content,
            source: source.id,
            eof: None,
        }
    }
}

impl<'a> TokenSource<'a> for Lexer<'a> {
    fn next_token(&mut self) -> Token<'a> {
        if let Some(eof) = self.eof {
            return eof;
        }

        let mut trivia = Vec::new();
        loop {
            let Some((result, range)) = self.raw.next() else {
                let trivia = &*self.alloc.alloc_slice_copy(&trivia);
                let at = self.source.at(self.content.len());
                let eof = Token::new(TokenKind::EndOfFile, "", at, trivia);
                self.eof = Some(eof);
                return eof;
            };

            let text = &self.content[range.clone()];
            let span = self.source.span(range.start, range.end);

            let kind = match result {
                Ok(RawToken::Whitespace) => {
                    trivia.push(Trivia::Whitespace(text));
                    continue;
                }
                Ok(RawToken::LineComment) => {
                    trivia.push(Trivia::LineComment(text));
                    continue;
                }
                Ok(RawToken::BlockComment) => {
                    trivia.push(Trivia::BlockComment(text));
                    continue;
                }
                Ok(RawToken::Directive) => {
                    trivia.push(Trivia::Directive(text));
                    continue;
                }

                Err(()) => TokenKind::Unknown,
                Ok(raw) => token_kind(raw),
            };

            let trivia = &*self.alloc.alloc_slice_copy(&trivia);
            return Token::new(kind, text, span, trivia);
        }
    }
}

fn token_kind(raw: RawToken) -> TokenKind {
    match raw {
        RawToken::Whitespace
        | RawToken::LineComment
        | RawToken::BlockComment
        | RawToken::Directive => unreachable!("trivia is folded before kind mapping"),

        RawToken::Identifier => TokenKind::Identifier,
        RawToken::IntLiteral => TokenKind::IntLiteral,
        RawToken::Module => TokenKind::Module,
        RawToken::EndModule => TokenKind::EndModule,
        RawToken::Interface => TokenKind::Interface,
        RawToken::EndInterface => TokenKind::EndInterface,
        RawToken::Program => TokenKind::Program,
        RawToken::EndProgram => TokenKind::EndProgram,
        RawToken::Package => TokenKind::Package,
        RawToken::EndPackage => TokenKind::EndPackage,
        RawToken::Begin => TokenKind::Begin,
        RawToken::End => TokenKind::End,
        RawToken::If => TokenKind::If,
        RawToken::Else => TokenKind::Else,
        RawToken::For => TokenKind::For,
        RawToken::Generate => TokenKind::Generate,
        RawToken::EndGenerate => TokenKind::EndGenerate,
        RawToken::Genvar => TokenKind::Genvar,
        RawToken::Parameter => TokenKind::Parameter,
        RawToken::LocalParam => TokenKind::LocalParam,
        RawToken::Initial => TokenKind::Initial,
        RawToken::Always => TokenKind::Always,
        RawToken::AlwaysComb => TokenKind::AlwaysComb,
        RawToken::AlwaysLatch => TokenKind::AlwaysLatch,
        RawToken::AlwaysFf => TokenKind::AlwaysFf,
        RawToken::Final => TokenKind::Final,
        RawToken::OpenParen => TokenKind::OpenParen,
        RawToken::CloseParen => TokenKind::CloseParen,
        RawToken::Hash => TokenKind::Hash,
        RawToken::Comma => TokenKind::Comma,
        RawToken::Semicolon => TokenKind::Semicolon,
        RawToken::Colon => TokenKind::Colon,
        RawToken::Dot => TokenKind::Dot,
        RawToken::Equals => TokenKind::Equals,
        RawToken::PlusEqual => TokenKind::PlusEqual,
        RawToken::MinusEqual => TokenKind::MinusEqual,
        RawToken::Plus => TokenKind::Plus,
        RawToken::Minus => TokenKind::Minus,
        RawToken::Star => TokenKind::Star,
        RawToken::Slash => TokenKind::Slash,
        RawToken::Percent => TokenKind::Percent,
        RawToken::Lt => TokenKind::Lt,
        RawToken::Lte => TokenKind::Lte,
        RawToken::Gt => TokenKind::Gt,
        RawToken::Gte => TokenKind::Gte,
        RawToken::EqEq => TokenKind::EqEq,
        RawToken::NotEq => TokenKind::NotEq,
        RawToken::AndAnd => TokenKind::AndAnd,
        RawToken::OrOr => TokenKind::OrOr,
        RawToken::Not => TokenKind::Not,
        RawToken::PlusPlus => TokenKind::PlusPlus,
        RawToken::MinusMinus => TokenKind::MinusMinus,
    }
}
