//! The concrete syntax tree. Every token of the input ends up in exactly one
//! place in the tree (possibly inside a [`Trivia::SkippedTokens`] trivium),
//! so writing the tree back out reproduces the source byte-for-byte.

use crate::errors::ErrorId;
use crate::source::Span;

/// The kind of a [`Token`].
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum TokenKind {
    Identifier,
    IntLiteral,

    // Keywords
    Module,
    EndModule,
    Interface,
    EndInterface,
    Program,
    EndProgram,
    Package,
    EndPackage,
    Begin,
    End,
    If,
    Else,
    For,
    Generate,
    EndGenerate,
    Genvar,
    Parameter,
    LocalParam,
    Initial,
    Always,
    AlwaysComb,
    AlwaysLatch,
    AlwaysFf,
    Final,

    // Punctuation
    OpenParen,
    CloseParen,
    Hash,
    Comma,
    Semicolon,
    Colon,
    Dot,
    Equals,
    PlusEqual,
    MinusEqual,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Lt,
    Lte,
    Gt,
    Gte,
    EqEq,
    NotEq,
    AndAnd,
    OrOr,
    Not,
    PlusPlus,
    MinusMinus,

    /// A lexeme no rule matched. Always skipped by the parser.
    Unknown,
    EndOfFile,
}

impl TokenKind {
    /// How this kind reads in a diagnostic.
    pub fn display(&self) -> &'static str {
        match self {
            Self::Identifier => "identifier",
            Self::IntLiteral => "integer literal",
            Self::Module => "module",
            Self::EndModule => "endmodule",
            Self::Interface => "interface",
            Self::EndInterface => "endinterface",
            Self::Program => "program",
            Self::EndProgram => "endprogram",
            Self::Package => "package",
            Self::EndPackage => "endpackage",
            Self::Begin => "begin",
            Self::End => "end",
            Self::If => "if",
            Self::Else => "else",
            Self::For => "for",
            Self::Generate => "generate",
            Self::EndGenerate => "endgenerate",
            Self::Genvar => "genvar",
            Self::Parameter => "parameter",
            Self::LocalParam => "localparam",
            Self::Initial => "initial",
            Self::Always => "always",
            Self::AlwaysComb => "always_comb",
            Self::AlwaysLatch => "always_latch",
            Self::AlwaysFf => "always_ff",
            Self::Final => "final",
            Self::OpenParen => "(",
            Self::CloseParen => ")",
            Self::Hash => "#",
            Self::Comma => ",",
            Self::Semicolon => ";",
            Self::Colon => ":",
            Self::Dot => ".",
            Self::Equals => "=",
            Self::PlusEqual => "+=",
            Self::MinusEqual => "-=",
            Self::Plus => "+",
            Self::Minus => "-",
            Self::Star => "*",
            Self::Slash => "/",
            Self::Percent => "%",
            Self::Lt => "<",
            Self::Lte => "<=",
            Self::Gt => ">",
            Self::Gte => ">=",
            Self::EqEq => "==",
            Self::NotEq => "!=",
            Self::AndAnd => "&&",
            Self::OrOr => "||",
            Self::Not => "!",
            Self::PlusPlus => "++",
            Self::MinusMinus => "--",
            Self::Unknown => "token",
            Self::EndOfFile => "end of file",
        }
    }
}

/// Non-semantic lexical material attached to the token that follows it.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Trivia<'a> {
    Whitespace(&'a str),
    LineComment(&'a str),
    BlockComment(&'a str),
    Directive(&'a str),

    /// Tokens the parser discarded during recovery.
    SkippedTokens(&'a [Token<'a>]),
}

impl Trivia<'_> {
    pub fn write_into(&self, out: &mut String) {
        match self {
            Self::Whitespace(text)
            | Self::LineComment(text)
            | Self::BlockComment(text)
            | Self::Directive(text) => out.push_str(text),
            Self::SkippedTokens(tokens) => {
                for token in *tokens {
                    token.write_into(out);
                }
            }
        }
    }
}

/// A single lexeme with its leading trivia. Cheap to copy; the trivia slice
/// and text point into arena- and source-owned storage.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    pub text: &'a str,
    pub span: Span,
    pub trivia: &'a [Trivia<'a>],

    /// Set on tokens synthesized by `expect` in place of something the
    /// source never contained. Missing tokens have empty text.
    pub missing: bool,
}

impl<'a> Token<'a> {
    pub fn new(kind: TokenKind, text: &'a str, span: Span, trivia: &'a [Trivia<'a>]) -> Self {
        Self { kind, text, span, trivia, missing: false }
    }

    /// A synthesized placeholder for a token the parser expected but did not
    /// find. Carries the given trivia so no source text is lost.
    pub fn missing(kind: TokenKind, span: Span, trivia: &'a [Trivia<'a>]) -> Self {
        Self { kind, text: "", span, trivia, missing: true }
    }

    pub fn write_into(&self, out: &mut String) {
        for trivia in self.trivia {
            trivia.write_into(out);
        }
        out.push_str(self.text);
    }
}

/// Either a parsed item or a separator token; the element type of
/// separated-list buffers. Both are preserved losslessly.
#[derive(Clone, Copy, Debug)]
pub enum TokenOrSyntax<'a> {
    Token(Token<'a>),
    Node(&'a SyntaxNode<'a>),
}

/// A `open item (sep item)* close` run as recognized by the generic list
/// parser. `elements` alternates items and separators.
#[derive(Clone, Copy, Debug)]
pub struct SeparatedList<'a> {
    pub open: Token<'a>,
    pub elements: &'a [TokenOrSyntax<'a>],
    pub close: Token<'a>,
}

impl<'a> SeparatedList<'a> {
    /// The parsed items, skipping the separator tokens.
    pub fn items(&self) -> impl Iterator<Item = &'a SyntaxNode<'a>> + '_ {
        self.elements.iter().filter_map(|element| match element {
            TokenOrSyntax::Node(node) => Some(*node),
            TokenOrSyntax::Token(_) => None,
        })
    }
}

/// A `: name` block label.
#[derive(Clone, Copy, Debug)]
pub struct NamedLabel<'a> {
    pub colon: Token<'a>,
    pub name: Token<'a>,
}

/// A syntax node and the source region it covers. Nodes are immutable and
/// owned by the bump arena of their compilation.
#[derive(Debug)]
pub struct SyntaxNode<'a> {
    pub node: Node<'a>,
    pub span: Span,
}

#[derive(Debug)]
pub enum Node<'a> {
    /// Placeholder produced when a recognizer could make no progress.
    Invalid(ErrorId),

    SourceText {
        members: &'a [&'a SyntaxNode<'a>],
        eof: Token<'a>,
    },

    /// Covers module, interface, program, and package declarations; the
    /// keyword token discriminates.
    ModuleDeclaration {
        keyword: Token<'a>,
        name: Token<'a>,
        parameter_ports: Option<&'a SyntaxNode<'a>>,
        ports: Option<&'a SyntaxNode<'a>>,
        semi: Token<'a>,
        members: &'a [&'a SyntaxNode<'a>],
        end_keyword: Token<'a>,
    },

    /// `#(parameter N = 1, ...)` in a declaration header.
    ParameterPortList {
        hash: Token<'a>,
        list: SeparatedList<'a>,
    },

    /// One or more parameter declarators under a single keyword. In a
    /// header list the keyword may be elided and there is no semicolon.
    ParameterDeclaration {
        keyword: Option<Token<'a>>,
        declarators: &'a [TokenOrSyntax<'a>],
        semi: Option<Token<'a>>,
    },

    Declarator {
        name: Token<'a>,
        eq: Option<Token<'a>>,
        init: Option<&'a SyntaxNode<'a>>,
    },

    PortList {
        list: SeparatedList<'a>,
    },

    /// `Type #(...) u1(...), u2(...);`
    HierarchyInstantiation {
        type_name: Token<'a>,
        parameters: Option<&'a SyntaxNode<'a>>,
        instances: &'a [TokenOrSyntax<'a>],
        semi: Token<'a>,
    },

    /// `#(...)` on an instantiation.
    ParameterValueAssignment {
        hash: Token<'a>,
        list: SeparatedList<'a>,
    },

    /// `.name(expr)` in a parameter override or connection list.
    NamedArgument {
        dot: Token<'a>,
        name: Token<'a>,
        open: Token<'a>,
        expr: Option<&'a SyntaxNode<'a>>,
        close: Token<'a>,
    },

    /// `name(...)`: one instance of a hierarchy instantiation.
    HierarchicalInstance {
        name: Token<'a>,
        connections: SeparatedList<'a>,
    },

    ProceduralBlock {
        keyword: Token<'a>,
        statement: &'a SyntaxNode<'a>,
    },

    BlockStatement {
        begin: Token<'a>,
        label: Option<NamedLabel<'a>>,
        statements: &'a [&'a SyntaxNode<'a>],
        end: Token<'a>,
    },

    ExpressionStatement {
        expr: &'a SyntaxNode<'a>,
        semi: Token<'a>,
    },

    EmptyStatement {
        semi: Token<'a>,
    },

    EmptyMember {
        semi: Token<'a>,
    },

    /// `generate ... endgenerate`. Transparent: introduces no scope.
    GenerateRegion {
        keyword: Token<'a>,
        members: &'a [&'a SyntaxNode<'a>],
        end_keyword: Token<'a>,
    },

    IfGenerate {
        keyword: Token<'a>,
        open: Token<'a>,
        condition: &'a SyntaxNode<'a>,
        close: Token<'a>,
        block: &'a SyntaxNode<'a>,
        else_clause: Option<&'a SyntaxNode<'a>>,
    },

    ElseClause {
        keyword: Token<'a>,
        block: &'a SyntaxNode<'a>,
    },

    LoopGenerate {
        keyword: Token<'a>,
        open: Token<'a>,
        genvar: Option<Token<'a>>,
        identifier: Token<'a>,
        eq: Token<'a>,
        init: &'a SyntaxNode<'a>,
        semi1: Token<'a>,
        condition: &'a SyntaxNode<'a>,
        semi2: Token<'a>,
        step: &'a SyntaxNode<'a>,
        close: Token<'a>,
        block: &'a SyntaxNode<'a>,
    },

    /// `begin [: label] ... end` in a generate context; contains members,
    /// not statements.
    GenerateBlock {
        begin: Token<'a>,
        label: Option<NamedLabel<'a>>,
        members: &'a [&'a SyntaxNode<'a>],
        end: Token<'a>,
    },

    LiteralExpression(Token<'a>),
    IdentifierExpression(Token<'a>),

    UnaryExpression {
        op: Token<'a>,
        operand: &'a SyntaxNode<'a>,
    },

    PostfixExpression {
        operand: &'a SyntaxNode<'a>,
        op: Token<'a>,
    },

    BinaryExpression {
        left: &'a SyntaxNode<'a>,
        op: Token<'a>,
        right: &'a SyntaxNode<'a>,
    },

    ParenthesizedExpression {
        open: Token<'a>,
        inner: &'a SyntaxNode<'a>,
        close: Token<'a>,
    },
}

/// Discriminator for [`Node`] variants.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum SyntaxKind {
    Invalid,
    SourceText,
    ModuleDeclaration,
    ParameterPortList,
    ParameterDeclaration,
    Declarator,
    PortList,
    HierarchyInstantiation,
    ParameterValueAssignment,
    NamedArgument,
    HierarchicalInstance,
    ProceduralBlock,
    BlockStatement,
    ExpressionStatement,
    EmptyStatement,
    EmptyMember,
    GenerateRegion,
    IfGenerate,
    ElseClause,
    LoopGenerate,
    GenerateBlock,
    LiteralExpression,
    IdentifierExpression,
    UnaryExpression,
    PostfixExpression,
    BinaryExpression,
    ParenthesizedExpression,
}

impl<'a> SyntaxNode<'a> {
    pub fn kind(&self) -> SyntaxKind {
        match &self.node {
            Node::Invalid(_) => SyntaxKind::Invalid,
            Node::SourceText { .. } => SyntaxKind::SourceText,
            Node::ModuleDeclaration { .. } => SyntaxKind::ModuleDeclaration,
            Node::ParameterPortList { .. } => SyntaxKind::ParameterPortList,
            Node::ParameterDeclaration { .. } => SyntaxKind::ParameterDeclaration,
            Node::Declarator { .. } => SyntaxKind::Declarator,
            Node::PortList { .. } => SyntaxKind::PortList,
            Node::HierarchyInstantiation { .. } => SyntaxKind::HierarchyInstantiation,
            Node::ParameterValueAssignment { .. } => SyntaxKind::ParameterValueAssignment,
            Node::NamedArgument { .. } => SyntaxKind::NamedArgument,
            Node::HierarchicalInstance { .. } => SyntaxKind::HierarchicalInstance,
            Node::ProceduralBlock { .. } => SyntaxKind::ProceduralBlock,
            Node::BlockStatement { .. } => SyntaxKind::BlockStatement,
            Node::ExpressionStatement { .. } => SyntaxKind::ExpressionStatement,
            Node::EmptyStatement { .. } => SyntaxKind::EmptyStatement,
            Node::EmptyMember { .. } => SyntaxKind::EmptyMember,
            Node::GenerateRegion { .. } => SyntaxKind::GenerateRegion,
            Node::IfGenerate { .. } => SyntaxKind::IfGenerate,
            Node::ElseClause { .. } => SyntaxKind::ElseClause,
            Node::LoopGenerate { .. } => SyntaxKind::LoopGenerate,
            Node::GenerateBlock { .. } => SyntaxKind::GenerateBlock,
            Node::LiteralExpression(_) => SyntaxKind::LiteralExpression,
            Node::IdentifierExpression(_) => SyntaxKind::IdentifierExpression,
            Node::UnaryExpression { .. } => SyntaxKind::UnaryExpression,
            Node::PostfixExpression { .. } => SyntaxKind::PostfixExpression,
            Node::BinaryExpression { .. } => SyntaxKind::BinaryExpression,
            Node::ParenthesizedExpression { .. } => SyntaxKind::ParenthesizedExpression,
        }
    }

    /// Concatenate every token's trivia and text under this node.
    pub fn write(&self) -> String {
        let mut out = String::new();
        self.write_into(&mut out);
        out
    }

    pub fn write_into(&self, out: &mut String) {
        self.each_token(&mut |token| token.write_into(out));
    }

    /// Visit every token under this node in source order.
    pub fn each_token(&self, f: &mut impl FnMut(&Token<'a>)) {
        fn list<'a>(elements: &[TokenOrSyntax<'a>], f: &mut impl FnMut(&Token<'a>)) {
            for element in elements {
                match element {
                    TokenOrSyntax::Token(token) => f(token),
                    TokenOrSyntax::Node(node) => node.each_token(f),
                }
            }
        }

        fn bookended<'a>(sep: &SeparatedList<'a>, f: &mut impl FnMut(&Token<'a>)) {
            f(&sep.open);
            list(sep.elements, f);
            f(&sep.close);
        }

        match &self.node {
            Node::Invalid(_) => {}

            Node::SourceText { members, eof } => {
                for member in *members {
                    member.each_token(f);
                }
                f(eof);
            }

            Node::ModuleDeclaration {
                keyword,
                name,
                parameter_ports,
                ports,
                semi,
                members,
                end_keyword,
            } => {
                f(keyword);
                f(name);
                if let Some(params) = parameter_ports {
                    params.each_token(f);
                }
                if let Some(ports) = ports {
                    ports.each_token(f);
                }
                f(semi);
                for member in *members {
                    member.each_token(f);
                }
                f(end_keyword);
            }

            Node::ParameterPortList { hash, list: sep } => {
                f(hash);
                bookended(sep, f);
            }

            Node::ParameterDeclaration { keyword, declarators, semi } => {
                if let Some(keyword) = keyword {
                    f(keyword);
                }
                list(declarators, f);
                if let Some(semi) = semi {
                    f(semi);
                }
            }

            Node::Declarator { name, eq, init } => {
                f(name);
                if let Some(eq) = eq {
                    f(eq);
                }
                if let Some(init) = init {
                    init.each_token(f);
                }
            }

            Node::PortList { list: sep } => bookended(sep, f),

            Node::HierarchyInstantiation { type_name, parameters, instances, semi } => {
                f(type_name);
                if let Some(parameters) = parameters {
                    parameters.each_token(f);
                }
                list(instances, f);
                f(semi);
            }

            Node::ParameterValueAssignment { hash, list: sep } => {
                f(hash);
                bookended(sep, f);
            }

            Node::NamedArgument { dot, name, open, expr, close } => {
                f(dot);
                f(name);
                f(open);
                if let Some(expr) = expr {
                    expr.each_token(f);
                }
                f(close);
            }

            Node::HierarchicalInstance { name, connections } => {
                f(name);
                bookended(connections, f);
            }

            Node::ProceduralBlock { keyword, statement } => {
                f(keyword);
                statement.each_token(f);
            }

            Node::BlockStatement { begin, label, statements, end } => {
                f(begin);
                if let Some(label) = label {
                    f(&label.colon);
                    f(&label.name);
                }
                for statement in *statements {
                    statement.each_token(f);
                }
                f(end);
            }

            Node::ExpressionStatement { expr, semi } => {
                expr.each_token(f);
                f(semi);
            }

            Node::EmptyStatement { semi } | Node::EmptyMember { semi } => f(semi),

            Node::GenerateRegion { keyword, members, end_keyword } => {
                f(keyword);
                for member in *members {
                    member.each_token(f);
                }
                f(end_keyword);
            }

            Node::IfGenerate { keyword, open, condition, close, block, else_clause } => {
                f(keyword);
                f(open);
                condition.each_token(f);
                f(close);
                block.each_token(f);
                if let Some(else_clause) = else_clause {
                    else_clause.each_token(f);
                }
            }

            Node::ElseClause { keyword, block } => {
                f(keyword);
                block.each_token(f);
            }

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
            } => {
                f(keyword);
                f(open);
                if let Some(genvar) = genvar {
                    f(genvar);
                }
                f(identifier);
                f(eq);
                init.each_token(f);
                f(semi1);
                condition.each_token(f);
                f(semi2);
                step.each_token(f);
                f(close);
                block.each_token(f);
            }

            Node::GenerateBlock { begin, label, members, end } => {
                f(begin);
                if let Some(label) = label {
                    f(&label.colon);
                    f(&label.name);
                }
                for member in *members {
                    member.each_token(f);
                }
                f(end);
            }

            Node::LiteralExpression(token) | Node::IdentifierExpression(token) => f(token),

            Node::UnaryExpression { op, operand } => {
                f(op);
                operand.each_token(f);
            }

            Node::PostfixExpression { operand, op } => {
                operand.each_token(f);
                f(op);
            }

            Node::BinaryExpression { left, op, right } => {
                left.each_token(f);
                f(op);
                right.each_token(f);
            }

            Node::ParenthesizedExpression { open, inner, close } => {
                f(open);
                inner.each_token(f);
                f(close);
            }
        }
    }
}
