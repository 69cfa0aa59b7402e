mod expressions;
mod members;

use bumpalo::Bump;
use log::trace;

use super::cst::{SeparatedList, SyntaxNode, Token, TokenKind, TokenOrSyntax, Trivia};
use super::lexer::TokenSource;
use crate::errors::Errors;
use crate::pool::BufferPool;
use crate::source::Span;

/// Scratch buffers shared by every recognizer frame. Buffers are returned
/// to their pool when the frame ends; published arrays are copied into the
/// arena first.
pub(crate) struct Pools<'a> {
    tokens: BufferPool<Token<'a>>,
    trivia: BufferPool<Trivia<'a>>,
    nodes: BufferPool<&'a SyntaxNode<'a>>,
    tos: BufferPool<TokenOrSyntax<'a>>,
}

impl Pools<'_> {
    pub fn new() -> Self {
        Self {
            tokens: BufferPool::new(),
            trivia: BufferPool::new(),
            nodes: BufferPool::new(),
            tos: BufferPool::new(),
        }
    }
}

/// Outcome of a recovery scan: either a legal restart token was reached, or
/// a token disruptive enough that recovery must surface to the caller.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum SkipAction {
    Continue,
    Abort,
}

/// Buffered lookahead over a forward-only token source.
struct Window<'a, S> {
    source: S,
    buffer: Vec<Token<'a>>,
    current: usize,
    last_consumed: Option<Token<'a>>,
}

impl<'a, S: TokenSource<'a>> Window<'a, S> {
    fn new(source: S) -> Self {
        Self { source, buffer: Vec::with_capacity(32), current: 0, last_consumed: None }
    }

    fn fill_to(&mut self, offset: usize) {
        while self.buffer.len() <= self.current + offset {
            let token = self.source.next_token();
            self.buffer.push(token);
        }
    }

    fn peek(&mut self, offset: usize) -> Token<'a> {
        self.fill_to(offset);
        self.buffer[self.current + offset]
    }

    fn consume(&mut self) -> Token<'a> {
        self.fill_to(0);
        let token = self.buffer[self.current];
        self.current += 1;
        self.last_consumed = Some(token);

        if self.current == self.buffer.len() {
            self.buffer.clear();
            self.current = 0;
        }

        token
    }

    /// Rewrite the upcoming token's leading trivia in place.
    fn set_trivia(&mut self, trivia: &'a [Trivia<'a>]) {
        self.fill_to(0);
        self.buffer[self.current].trivia = trivia;
    }

    /// Strip the upcoming token's trivia, returning what it had.
    fn take_trivia(&mut self) -> &'a [Trivia<'a>] {
        self.fill_to(0);
        std::mem::take(&mut self.buffer[self.current].trivia)
    }
}

/// Base parsing machinery: the token window, missing-token synthesis, and
/// the recovery primitives every grammar production builds on.
pub(crate) struct Parser<'a, 'e, 'p, S> {
    pub alloc: &'a Bump,
    pub errors: &'e mut Errors,
    pools: &'p Pools<'a>,
    window: Window<'a, S>,
}

impl<'a, 'e, 'p, S: TokenSource<'a>> Parser<'a, 'e, 'p, S> {
    pub fn new(alloc: &'a Bump, errors: &'e mut Errors, pools: &'p Pools<'a>, source: S) -> Self {
        Self { alloc, errors, pools, window: Window::new(source) }
    }

    pub fn peek(&mut self) -> Token<'a> {
        self.window.peek(0)
    }

    pub fn peek_kind(&mut self, kind: TokenKind) -> bool {
        self.peek().kind == kind
    }

    pub fn consume(&mut self) -> Token<'a> {
        self.window.consume()
    }

    pub fn consume_if(&mut self, kind: TokenKind) -> Option<Token<'a>> {
        self.peek_kind(kind).then(|| self.consume())
    }

    /// Consume a token of the given kind, or synthesize a missing one. The
    /// missing token takes over the actual token's leading trivia so the
    /// tree stays lossless, and is anchored just before the actual token.
    pub fn expect(&mut self, kind: TokenKind) -> Token<'a> {
        if self.peek_kind(kind) {
            return self.consume();
        }

        self.create_expected_token(kind)
    }

    fn create_expected_token(&mut self, expected: TokenKind) -> Token<'a> {
        let actual = self.peek();
        trace!("expected {:?}, found {:?}", expected, actual.kind);

        if !self.have_diag_at(actual.span) {
            self.errors.parse_error(actual.span).expected_token(expected);
        }

        let trivia = self.window.take_trivia();
        Token::missing(expected, actual.span.source.at(actual.span.start), trivia)
    }

    /// Whether the most recent diagnostic is already anchored at this span.
    /// Keeps a single junk run from being reported more than once.
    pub fn have_diag_at(&self, span: Span) -> bool {
        self.errors.last_span() == Some(span)
    }

    /// The span of the most recently consumed token, used to close off node
    /// spans.
    pub fn last_span(&self, fallback: Span) -> Span {
        self.window.last_consumed.map(|token| token.span).unwrap_or(fallback)
    }

    pub fn node(&mut self, start: Span, node: super::cst::Node<'a>) -> &'a SyntaxNode<'a> {
        let span = start + self.last_span(start);
        self.alloc.alloc(SyntaxNode { node, span })
    }

    /// Attach the pending skipped-token trivium (if any) to the next token
    /// the parser will consume. Since that token is the left-most token of
    /// whatever node is produced next, this re-homes skipped source onto
    /// the closest surviving node.
    pub fn apply_skipped(&mut self, skipped: &mut Option<Trivia<'a>>) {
        let Some(trivium) = skipped.take() else { return };

        let pools = self.pools;
        let mut merged = pools.trivia.get();
        merged.push(trivium);
        merged.extend_from_slice(self.peek().trivia);
        let merged = &*self.alloc.alloc_slice_copy(&merged);
        self.window.set_trivia(merged);
    }

    /// Pack the scratch token buffer into a single `SkippedTokens` trivium
    /// in the accumulator slot, clearing the buffer. Consecutive runs merge.
    fn reduce_skipped(&mut self, tokens: &mut Vec<Token<'a>>, skipped: &mut Option<Trivia<'a>>) {
        if tokens.is_empty() {
            return;
        }

        let slice = match skipped.take() {
            Some(Trivia::SkippedTokens(previous)) => {
                let pools = self.pools;
                let mut all = pools.tokens.get();
                all.extend_from_slice(previous);
                all.extend_from_slice(tokens);
                &*self.alloc.alloc_slice_copy(&all)
            }
            _ => &*self.alloc.alloc_slice_copy(tokens),
        };

        *skipped = Some(Trivia::SkippedTokens(slice));
        tokens.clear();
    }

    /// Consume tokens until a legal restart token (per `is_expected`), an
    /// abort token, or end of file. The diagnostic is raised once, at the
    /// first bad token. Consumed tokens land in the accumulator slot.
    pub fn skip_bad_tokens(
        &mut self,
        skipped: &mut Option<Trivia<'a>>,
        what: &str,
        is_expected: impl Fn(TokenKind) -> bool,
        is_abort: impl Fn(TokenKind) -> bool,
    ) -> SkipAction {
        let pools = self.pools;
        let mut tokens = pools.tokens.get();
        let mut result = SkipAction::Continue;

        let mut current = self.peek();
        let mut reported = self.have_diag_at(current.span);

        while !is_expected(current.kind) {
            if !reported {
                trace!("skipping tokens at {:?}", current.span);
                self.errors.parse_error(current.span).skipped_tokens(what);
                reported = true;
            }

            if current.kind == TokenKind::EndOfFile || is_abort(current.kind) {
                result = SkipAction::Abort;
                break;
            }

            tokens.push(self.consume());
            current = self.peek();
        }

        self.reduce_skipped(&mut tokens, skipped);
        result
    }

    /// The generalized recognizer for `open item (sep item)* close` runs.
    ///
    /// `is_expected` must accept every token that can begin an item *and*
    /// the separator, so that recovery restarts at either; `is_end` is the
    /// hard-stop set (typically just the close kind). Skipped source is
    /// attached to the next surviving item, separator, or close token.
    pub fn parse_separated_list(
        &mut self,
        open_kind: TokenKind,
        close_kind: TokenKind,
        separator_kind: TokenKind,
        what: &str,
        is_expected: impl Fn(TokenKind) -> bool + Copy,
        is_end: impl Fn(TokenKind) -> bool + Copy,
        parse_item: impl FnMut(&mut Self, bool) -> &'a SyntaxNode<'a>,
    ) -> SeparatedList<'a> {
        let open = self.expect(open_kind);

        let pools = self.pools;
        let mut buffer = pools.tos.get();
        let close = self.parse_separated_list_core(
            &mut buffer,
            close_kind,
            separator_kind,
            what,
            is_expected,
            is_end,
            parse_item,
        );

        let elements = &*self.alloc.alloc_slice_copy(&buffer);
        SeparatedList { open, elements, close }
    }

    /// The bookend-free core, also used directly for lists that run up to a
    /// statement terminator. Returns the close token (missing if the list
    /// was cut short).
    pub fn parse_separated_list_core(
        &mut self,
        buffer: &mut Vec<TokenOrSyntax<'a>>,
        close_kind: TokenKind,
        separator_kind: TokenKind,
        what: &str,
        is_expected: impl Fn(TokenKind) -> bool + Copy,
        is_end: impl Fn(TokenKind) -> bool + Copy,
        mut parse_item: impl FnMut(&mut Self, bool) -> &'a SyntaxNode<'a>,
    ) -> Token<'a> {
        let mut skipped: Option<Trivia<'a>> = None;

        let mut current = self.peek();
        if !is_end(current.kind) {
            loop {
                if is_expected(current.kind) {
                    self.apply_skipped(&mut skipped);
                    let item = parse_item(self, true);
                    buffer.push(TokenOrSyntax::Node(item));

                    loop {
                        current = self.peek();
                        if is_end(current.kind) {
                            break;
                        }

                        if is_expected(current.kind) {
                            self.apply_skipped(&mut skipped);
                            let separator = self.expect(separator_kind);
                            buffer.push(TokenOrSyntax::Token(separator));

                            self.apply_skipped(&mut skipped);
                            let item = parse_item(self, false);
                            buffer.push(TokenOrSyntax::Node(item));
                            continue;
                        }

                        let action =
                            self.skip_bad_tokens(&mut skipped, what, is_expected, is_end);
                        if action == SkipAction::Abort {
                            break;
                        }
                    }

                    // found the end
                    break;
                }

                let action = self.skip_bad_tokens(&mut skipped, what, is_expected, is_end);
                if action == SkipAction::Abort {
                    break;
                }

                current = self.peek();
            }
        }

        self.apply_skipped(&mut skipped);
        self.expect(close_kind)
    }
}
