use log::trace;

use super::{Parser, SkipAction};
use crate::parse::cst::{NamedLabel, Node, SyntaxNode, TokenKind, TokenOrSyntax, Trivia};
use crate::parse::lexer::TokenSource;

pub(crate) fn is_declaration_start(kind: TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::Module | TokenKind::Interface | TokenKind::Program | TokenKind::Package
    )
}

pub(crate) fn is_member_start(kind: TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::Parameter
            | TokenKind::LocalParam
            | TokenKind::Identifier
            | TokenKind::Initial
            | TokenKind::Always
            | TokenKind::AlwaysComb
            | TokenKind::AlwaysLatch
            | TokenKind::AlwaysFf
            | TokenKind::Final
            | TokenKind::If
            | TokenKind::For
            | TokenKind::Generate
            | TokenKind::Begin
            | TokenKind::Semicolon
    )
}

/// Keywords that close some enclosing construct; recovery never consumes
/// them.
pub(crate) fn is_end_keyword(kind: TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::End
            | TokenKind::EndModule
            | TokenKind::EndInterface
            | TokenKind::EndProgram
            | TokenKind::EndPackage
            | TokenKind::EndGenerate
    )
}

/// The hard-stop set for lists that run up to a semicolon.
fn is_semi_or_end(kind: TokenKind) -> bool {
    kind == TokenKind::Semicolon || is_end_keyword(kind)
}

/// The hard-stop set for parenthesized lists. A semicolon or closing
/// keyword means the closing paren was forgotten; stopping here keeps
/// recovery from eating the rest of the enclosing declaration.
fn is_paren_list_end(kind: TokenKind) -> bool {
    kind == TokenKind::CloseParen || kind == TokenKind::Semicolon || is_end_keyword(kind)
}

fn is_statement_start(kind: TokenKind) -> bool {
    kind == TokenKind::Begin || kind == TokenKind::Semicolon || super::expressions::is_expression_start(kind)
}

impl<'a, S: TokenSource<'a>> Parser<'a, '_, '_, S> {
    /// ```abnf
    /// source-text = *declaration EOF
    /// ```
    pub fn source_text(&mut self) -> &'a SyntaxNode<'a> {
        trace!("parse source text");

        let start = self.peek().span;
        let pools = self.pools;
        let mut members = pools.nodes.get();
        let mut skipped: Option<Trivia<'a>> = None;

        loop {
            let current = self.peek();
            if current.kind == TokenKind::EndOfFile {
                break;
            }

            if is_declaration_start(current.kind) {
                self.apply_skipped(&mut skipped);
                members.push(self.module_declaration());
            } else {
                let action = self.skip_bad_tokens(
                    &mut skipped,
                    "a module, interface, program, or package declaration",
                    is_declaration_start,
                    |_| false,
                );
                if action == SkipAction::Abort {
                    break;
                }
            }
        }

        self.apply_skipped(&mut skipped);
        let eof = self.expect(TokenKind::EndOfFile);

        let members = &*self.alloc.alloc_slice_copy(&members);
        self.node(start, Node::SourceText { members, eof })
    }

    /// ```abnf
    /// declaration = decl-kw IDENT [param-ports] [ports] ";" *member end-kw
    /// ```
    fn module_declaration(&mut self) -> &'a SyntaxNode<'a> {
        let keyword = self.consume();
        trace!("parse declaration `{}`", keyword.text);

        let name = self.expect(TokenKind::Identifier);

        let parameter_ports =
            self.peek_kind(TokenKind::Hash).then(|| self.parameter_port_list());
        let ports = self.peek_kind(TokenKind::OpenParen).then(|| self.port_list());
        let semi = self.expect(TokenKind::Semicolon);

        let end_kind = match keyword.kind {
            TokenKind::Module => TokenKind::EndModule,
            TokenKind::Interface => TokenKind::EndInterface,
            TokenKind::Program => TokenKind::EndProgram,
            TokenKind::Package => TokenKind::EndPackage,
            _ => unreachable!("guarded by is_declaration_start"),
        };

        let members = self.member_list(end_kind);
        let end_keyword = self.expect(end_kind);

        self.node(
            keyword.span,
            Node::ModuleDeclaration {
                keyword,
                name,
                parameter_ports,
                ports,
                semi,
                members,
                end_keyword,
            },
        )
    }

    /// Members up to (not including) `end_kind`. Junk between members is
    /// skipped once per run and re-homed onto the next member or the end
    /// keyword.
    fn member_list(&mut self, end_kind: TokenKind) -> &'a [&'a SyntaxNode<'a>] {
        let pools = self.pools;
        let mut members = pools.nodes.get();
        let mut skipped: Option<Trivia<'a>> = None;

        loop {
            let current = self.peek();
            if current.kind == end_kind || current.kind == TokenKind::EndOfFile {
                break;
            }

            if is_member_start(current.kind) {
                self.apply_skipped(&mut skipped);
                members.push(self.member());
            } else {
                let action = self.skip_bad_tokens(
                    &mut skipped,
                    "a module item",
                    is_member_start,
                    is_end_keyword,
                );
                if action == SkipAction::Abort {
                    break;
                }
            }
        }

        self.apply_skipped(&mut skipped);
        self.alloc.alloc_slice_copy(&members)
    }

    fn member(&mut self) -> &'a SyntaxNode<'a> {
        match self.peek().kind {
            TokenKind::Parameter | TokenKind::LocalParam => self.parameter_declaration(),
            TokenKind::Identifier => self.hierarchy_instantiation(),
            TokenKind::Initial
            | TokenKind::Always
            | TokenKind::AlwaysComb
            | TokenKind::AlwaysLatch
            | TokenKind::AlwaysFf
            | TokenKind::Final => self.procedural_block(),
            TokenKind::If => self.if_generate(),
            TokenKind::For => self.loop_generate(),
            TokenKind::Generate => self.generate_region(),
            TokenKind::Begin => self.generate_block(),
            TokenKind::Semicolon => {
                let semi = self.consume();
                self.node(semi.span, Node::EmptyMember { semi })
            }
            _ => unreachable!("guarded by is_member_start"),
        }
    }

    /// ```abnf
    /// param-ports = "#" "(" param-decl *("," param-decl) ")"
    /// ```
    fn parameter_port_list(&mut self) -> &'a SyntaxNode<'a> {
        let hash = self.consume();

        let list = self.parse_separated_list(
            TokenKind::OpenParen,
            TokenKind::CloseParen,
            TokenKind::Comma,
            "a parameter declaration",
            |kind| {
                matches!(
                    kind,
                    TokenKind::Parameter
                        | TokenKind::LocalParam
                        | TokenKind::Identifier
                        | TokenKind::Comma
                )
            },
            is_paren_list_end,
            |parser, _| parser.parameter_port_declaration(),
        );

        self.node(hash.span, Node::ParameterPortList { hash, list })
    }

    /// A single `[parameter|localparam] name [= expr]` in a header list.
    fn parameter_port_declaration(&mut self) -> &'a SyntaxNode<'a> {
        let start = self.peek().span;
        let keyword = self
            .consume_if(TokenKind::Parameter)
            .or_else(|| self.consume_if(TokenKind::LocalParam));

        let declarator = self.declarator();
        let declarators =
            &*self.alloc.alloc_slice_copy(&[TokenOrSyntax::Node(declarator)]);

        self.node(start, Node::ParameterDeclaration { keyword, declarators, semi: None })
    }

    /// ```abnf
    /// param-member = ("parameter" / "localparam") declarator *("," declarator) ";"
    /// ```
    fn parameter_declaration(&mut self) -> &'a SyntaxNode<'a> {
        let keyword = self.consume();
        trace!("parse parameter declaration");

        let pools = self.pools;
        let mut buffer = pools.tos.get();
        let semi = self.parse_separated_list_core(
            &mut buffer,
            TokenKind::Semicolon,
            TokenKind::Comma,
            "a parameter declarator",
            |kind| kind == TokenKind::Identifier || kind == TokenKind::Comma,
            is_semi_or_end,
            |parser, _| parser.declarator(),
        );

        let declarators = &*self.alloc.alloc_slice_copy(&buffer);
        self.node(
            keyword.span,
            Node::ParameterDeclaration { keyword: Some(keyword), declarators, semi: Some(semi) },
        )
    }

    /// ```abnf
    /// declarator = IDENT ["=" expression]
    /// ```
    fn declarator(&mut self) -> &'a SyntaxNode<'a> {
        let start = self.peek().span;
        let name = self.expect(TokenKind::Identifier);

        let (eq, init) = if let Some(eq) = self.consume_if(TokenKind::Equals) {
            (Some(eq), Some(self.expression()))
        } else {
            (None, None)
        };

        self.node(start, Node::Declarator { name, eq, init })
    }

    /// ```abnf
    /// ports = "(" [IDENT *("," IDENT)] ")"
    /// ```
    fn port_list(&mut self) -> &'a SyntaxNode<'a> {
        let start = self.peek().span;

        let list = self.parse_separated_list(
            TokenKind::OpenParen,
            TokenKind::CloseParen,
            TokenKind::Comma,
            "a port",
            |kind| kind == TokenKind::Identifier || kind == TokenKind::Comma,
            is_paren_list_end,
            |parser, _| {
                let name = parser.expect(TokenKind::Identifier);
                parser.node(name.span, Node::IdentifierExpression(name))
            },
        );

        self.node(start, Node::PortList { list })
    }

    /// ```abnf
    /// instantiation = IDENT [param-values] instance *("," instance) ";"
    /// ```
    fn hierarchy_instantiation(&mut self) -> &'a SyntaxNode<'a> {
        let type_name = self.consume();
        trace!("parse instantiation of `{}`", type_name.text);

        let parameters =
            self.peek_kind(TokenKind::Hash).then(|| self.parameter_value_assignment());

        let pools = self.pools;
        let mut buffer = pools.tos.get();
        let semi = self.parse_separated_list_core(
            &mut buffer,
            TokenKind::Semicolon,
            TokenKind::Comma,
            "an instance",
            |kind| kind == TokenKind::Identifier || kind == TokenKind::Comma,
            is_semi_or_end,
            |parser, _| parser.hierarchical_instance(),
        );

        let instances = &*self.alloc.alloc_slice_copy(&buffer);
        self.node(
            type_name.span,
            Node::HierarchyInstantiation { type_name, parameters, instances, semi },
        )
    }

    /// ```abnf
    /// param-values = "#" "(" [argument *("," argument)] ")"
    /// ```
    fn parameter_value_assignment(&mut self) -> &'a SyntaxNode<'a> {
        let hash = self.consume();

        let list = self.parse_separated_list(
            TokenKind::OpenParen,
            TokenKind::CloseParen,
            TokenKind::Comma,
            "a parameter assignment",
            |kind| {
                kind == TokenKind::Dot
                    || kind == TokenKind::Comma
                    || super::expressions::is_expression_start(kind)
            },
            is_paren_list_end,
            |parser, _| parser.argument(),
        );

        self.node(hash.span, Node::ParameterValueAssignment { hash, list })
    }

    /// An ordered expression or a named `.name(expr)` argument.
    fn argument(&mut self) -> &'a SyntaxNode<'a> {
        if !self.peek_kind(TokenKind::Dot) {
            return self.expression();
        }

        let dot = self.consume();
        let name = self.expect(TokenKind::Identifier);
        let open = self.expect(TokenKind::OpenParen);
        let expr =
            (!self.peek_kind(TokenKind::CloseParen)).then(|| self.expression());
        let close = self.expect(TokenKind::CloseParen);

        self.node(dot.span, Node::NamedArgument { dot, name, open, expr, close })
    }

    /// ```abnf
    /// instance = IDENT "(" [connection *("," connection)] ")"
    /// ```
    fn hierarchical_instance(&mut self) -> &'a SyntaxNode<'a> {
        let start = self.peek().span;
        let name = self.expect(TokenKind::Identifier);

        let connections = self.parse_separated_list(
            TokenKind::OpenParen,
            TokenKind::CloseParen,
            TokenKind::Comma,
            "a port connection",
            |kind| {
                kind == TokenKind::Dot
                    || kind == TokenKind::Comma
                    || super::expressions::is_expression_start(kind)
            },
            is_paren_list_end,
            |parser, _| parser.argument(),
        );

        self.node(start, Node::HierarchicalInstance { name, connections })
    }

    /// ```abnf
    /// procedural = proc-kw statement
    /// ```
    fn procedural_block(&mut self) -> &'a SyntaxNode<'a> {
        let keyword = self.consume();
        trace!("parse procedural block `{}`", keyword.text);

        let statement = self.statement();
        self.node(keyword.span, Node::ProceduralBlock { keyword, statement })
    }

    /// ```abnf
    /// statement = block / ";" / expression ";"
    /// ```
    fn statement(&mut self) -> &'a SyntaxNode<'a> {
        let current = self.peek();
        match current.kind {
            TokenKind::Begin => self.block_statement(),
            TokenKind::Semicolon => {
                let semi = self.consume();
                self.node(semi.span, Node::EmptyStatement { semi })
            }
            kind if super::expressions::is_expression_start(kind) => {
                let expr = self.expression();
                let semi = self.expect(TokenKind::Semicolon);
                self.node(expr.span, Node::ExpressionStatement { expr, semi })
            }
            _ => {
                let e = if self.have_diag_at(current.span) {
                    self.errors.last_id().expect("suppression implies a prior diagnostic")
                } else {
                    self.errors.parse_error(current.span).expected("a statement")
                };
                let span = current.span.source.at(current.span.start);
                self.alloc.alloc(SyntaxNode { node: Node::Invalid(e), span })
            }
        }
    }

    /// ```abnf
    /// block = "begin" [":" IDENT] *statement "end"
    /// ```
    fn block_statement(&mut self) -> &'a SyntaxNode<'a> {
        let begin = self.consume();
        let label = self.block_label();

        let pools = self.pools;
        let mut statements = pools.nodes.get();
        let mut skipped: Option<Trivia<'a>> = None;

        loop {
            let current = self.peek();
            if current.kind == TokenKind::End || current.kind == TokenKind::EndOfFile {
                break;
            }

            if is_statement_start(current.kind) {
                self.apply_skipped(&mut skipped);
                statements.push(self.statement());
            } else {
                let action = self.skip_bad_tokens(
                    &mut skipped,
                    "a statement",
                    is_statement_start,
                    is_end_keyword,
                );
                if action == SkipAction::Abort {
                    break;
                }
            }
        }

        self.apply_skipped(&mut skipped);
        let end = self.expect(TokenKind::End);

        let statements = &*self.alloc.alloc_slice_copy(&statements);
        self.node(begin.span, Node::BlockStatement { begin, label, statements, end })
    }

    fn block_label(&mut self) -> Option<NamedLabel<'a>> {
        let colon = self.consume_if(TokenKind::Colon)?;
        let name = self.expect(TokenKind::Identifier);
        Some(NamedLabel { colon, name })
    }

    /// ```abnf
    /// generate-region = "generate" *member "endgenerate"
    /// ```
    fn generate_region(&mut self) -> &'a SyntaxNode<'a> {
        let keyword = self.consume();
        let members = self.member_list(TokenKind::EndGenerate);
        let end_keyword = self.expect(TokenKind::EndGenerate);
        self.node(keyword.span, Node::GenerateRegion { keyword, members, end_keyword })
    }

    /// ```abnf
    /// if-generate = "if" "(" expression ")" gen-block ["else" (if-generate / gen-block)]
    /// ```
    fn if_generate(&mut self) -> &'a SyntaxNode<'a> {
        let keyword = self.consume();
        trace!("parse if-generate");

        let open = self.expect(TokenKind::OpenParen);
        let condition = self.expression();
        let close = self.expect(TokenKind::CloseParen);
        let block = self.generate_member_block();

        let else_clause = self.consume_if(TokenKind::Else).map(|else_kw| {
            let block = if self.peek_kind(TokenKind::If) {
                self.if_generate()
            } else {
                self.generate_member_block()
            };
            self.node(else_kw.span, Node::ElseClause { keyword: else_kw, block })
        });

        self.node(
            keyword.span,
            Node::IfGenerate { keyword, open, condition, close, block, else_clause },
        )
    }

    /// ```abnf
    /// loop-generate = "for" "(" ["genvar"] IDENT "=" expression ";"
    ///                 expression ";" expression ")" gen-block
    /// ```
    fn loop_generate(&mut self) -> &'a SyntaxNode<'a> {
        let keyword = self.consume();
        trace!("parse loop-generate");

        let open = self.expect(TokenKind::OpenParen);
        let genvar = self.consume_if(TokenKind::Genvar);
        let identifier = self.expect(TokenKind::Identifier);
        let eq = self.expect(TokenKind::Equals);
        let init = self.expression();
        let semi1 = self.expect(TokenKind::Semicolon);
        let condition = self.expression();
        let semi2 = self.expect(TokenKind::Semicolon);
        let step = self.expression();
        let close = self.expect(TokenKind::CloseParen);
        let block = self.generate_member_block();

        self.node(
            keyword.span,
            Node::LoopGenerate {
                keyword,
                open,
                genvar,
                identifier,
                eq,
                init,
                semi1,
                condition,
                semi2,
                step,
                close,
                block,
            },
        )
    }

    /// The body of a generate construct: a `begin ... end` block or a
    /// single member.
    fn generate_member_block(&mut self) -> &'a SyntaxNode<'a> {
        let current = self.peek();
        if current.kind == TokenKind::Begin {
            return self.generate_block();
        }

        if is_member_start(current.kind) {
            return self.member();
        }

        let e = if self.have_diag_at(current.span) {
            self.errors.last_id().expect("suppression implies a prior diagnostic")
        } else {
            self.errors.parse_error(current.span).expected("a generate block")
        };
        let span = current.span.source.at(current.span.start);
        self.alloc.alloc(SyntaxNode { node: Node::Invalid(e), span })
    }

    /// ```abnf
    /// gen-block = "begin" [":" IDENT] *member "end"
    /// ```
    fn generate_block(&mut self) -> &'a SyntaxNode<'a> {
        let begin = self.consume();
        let label = self.block_label();

        let pools = self.pools;
        let mut members = pools.nodes.get();
        let mut skipped: Option<Trivia<'a>> = None;

        loop {
            let current = self.peek();
            if current.kind == TokenKind::End || current.kind == TokenKind::EndOfFile {
                break;
            }

            if is_member_start(current.kind) {
                self.apply_skipped(&mut skipped);
                members.push(self.member());
            } else {
                let action = self.skip_bad_tokens(
                    &mut skipped,
                    "a module item",
                    is_member_start,
                    is_end_keyword,
                );
                if action == SkipAction::Abort {
                    break;
                }
            }
        }

        self.apply_skipped(&mut skipped);
        let end = self.expect(TokenKind::End);

        let members = &*self.alloc.alloc_slice_copy(&members);
        self.node(begin.span, Node::GenerateBlock { begin, label, members, end })
    }
}
