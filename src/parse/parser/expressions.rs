use super::Parser;
use crate::parse::cst::{Node, SyntaxNode, TokenKind};
use crate::parse::lexer::TokenSource;

pub(crate) fn is_expression_start(kind: TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::IntLiteral
            | TokenKind::Identifier
            | TokenKind::OpenParen
            | TokenKind::Plus
            | TokenKind::Minus
            | TokenKind::Not
            | TokenKind::PlusPlus
            | TokenKind::MinusMinus
    )
}

/// Binding power for binary operators; higher binds tighter. `<=` doubles
/// as the nonblocking-assignment operator in statements, which costs
/// nothing here since the front-end never binds statement expressions.
fn binary_precedence(kind: TokenKind) -> Option<u8> {
    Some(match kind {
        TokenKind::OrOr => 1,
        TokenKind::AndAnd => 2,
        TokenKind::EqEq | TokenKind::NotEq => 3,
        TokenKind::Lt | TokenKind::Lte | TokenKind::Gt | TokenKind::Gte => 4,
        TokenKind::Plus | TokenKind::Minus => 5,
        TokenKind::Star | TokenKind::Slash | TokenKind::Percent => 6,
        _ => return None,
    })
}

impl<'a, S: TokenSource<'a>> Parser<'a, '_, '_, S> {
    /// ```abnf
    /// expression = binary [("=" / "+=" / "-=") expression]
    /// ```
    ///
    /// Assignment is part of the general expression grammar so that
    /// loop-generate steps (`i = i + 1`, `i += 1`) parse with the same
    /// recognizer as everything else.
    pub fn expression(&mut self) -> &'a SyntaxNode<'a> {
        let left = self.binary_expression(0);

        let op = match self.peek().kind {
            TokenKind::Equals | TokenKind::PlusEqual | TokenKind::MinusEqual => self.consume(),
            _ => return left,
        };

        let right = self.expression();
        self.node(left.span, Node::BinaryExpression { left, op, right })
    }

    fn binary_expression(&mut self, min_precedence: u8) -> &'a SyntaxNode<'a> {
        let mut left = self.unary_expression();

        while let Some(precedence) = binary_precedence(self.peek().kind) {
            if precedence < min_precedence {
                break;
            }

            let op = self.consume();
            let right = self.binary_expression(precedence + 1);
            left = self.node(left.span, Node::BinaryExpression { left, op, right });
        }

        left
    }

    /// ```abnf
    /// unary = ("+" / "-" / "!" / "++" / "--") unary / postfix
    /// ```
    fn unary_expression(&mut self) -> &'a SyntaxNode<'a> {
        match self.peek().kind {
            TokenKind::Plus
            | TokenKind::Minus
            | TokenKind::Not
            | TokenKind::PlusPlus
            | TokenKind::MinusMinus => {
                let op = self.consume();
                let operand = self.unary_expression();
                self.node(op.span, Node::UnaryExpression { op, operand })
            }
            _ => self.postfix_expression(),
        }
    }

    /// ```abnf
    /// postfix = primary *("++" / "--")
    /// ```
    fn postfix_expression(&mut self) -> &'a SyntaxNode<'a> {
        let mut operand = self.primary_expression();

        loop {
            match self.peek().kind {
                TokenKind::PlusPlus | TokenKind::MinusMinus => {
                    let op = self.consume();
                    operand = self.node(operand.span, Node::PostfixExpression { operand, op });
                }
                _ => break,
            }
        }

        operand
    }

    /// ```abnf
    /// primary = NUMBER / IDENT / "(" expression ")"
    /// ```
    fn primary_expression(&mut self) -> &'a SyntaxNode<'a> {
        let current = self.peek();
        match current.kind {
            TokenKind::IntLiteral => {
                let token = self.consume();
                self.node(token.span, Node::LiteralExpression(token))
            }
            TokenKind::Identifier => {
                let token = self.consume();
                self.node(token.span, Node::IdentifierExpression(token))
            }
            TokenKind::OpenParen => {
                let open = self.consume();
                let inner = self.expression();
                let close = self.expect(TokenKind::CloseParen);
                self.node(open.span, Node::ParenthesizedExpression { open, inner, close })
            }
            _ => {
                let e = if self.have_diag_at(current.span) {
                    self.errors.last_id().expect("suppression implies a prior diagnostic")
                } else {
                    self.errors.parse_error(current.span).expected_expression()
                };
                let span = current.span.source.at(current.span.start);
                self.alloc.alloc(SyntaxNode { node: Node::Invalid(e), span })
            }
        }
    }
}
