use logos::Logos;

/// Raw lexemes as produced by the DFA. Whitespace, comments, and directives
/// are lexed as ordinary tokens here and folded into trivia by the lexer
/// wrapper.
#[derive(Logos, Clone, Copy, Debug, Eq, PartialEq)]
pub enum RawToken {
    #[regex(r"[ \t\r\n]+")]
    Whitespace,

    #[regex(r"//[^\n]*")]
    LineComment,

    // An unterminated block comment runs to the end of the input.
    #[regex(r"/\*([^*]|\*[^/])*\*?/?", priority = 3)]
    BlockComment,

    // Preprocessor directives are not expanded; the whole line is kept as
    // trivia.
    #[regex(r"`[^\n]*")]
    Directive,

    #[regex(r"[a-zA-Z_][a-zA-Z0-9_$]*")]
    Identifier,

    #[regex(r"[0-9][0-9_]*")]
    IntLiteral,

    #[token("module")]
    Module,
    #[token("endmodule")]
    EndModule,
    #[token("interface")]
    Interface,
    #[token("endinterface")]
    EndInterface,
    #[token("program")]
    Program,
    #[token("endprogram")]
    EndProgram,
    #[token("package")]
    Package,
    #[token("endpackage")]
    EndPackage,
    #[token("begin")]
    Begin,
    #[token("end")]
    End,
    #[token("if")]
    If,
    #[token("else")]
    Else,
    #[token("for")]
    For,
    #[token("generate")]
    Generate,
    #[token("endgenerate")]
    EndGenerate,
    #[token("genvar")]
    Genvar,
    #[token("parameter")]
    Parameter,
    #[token("localparam")]
    LocalParam,
    #[token("initial")]
    Initial,
    #[token("always")]
    Always,
    #[token("always_comb")]
    AlwaysComb,
    #[token("always_latch")]
    AlwaysLatch,
    #[token("always_ff")]
    AlwaysFf,
    #[token("final")]
    Final,

    #[token("(")]
    OpenParen,
    #[token(")")]
    CloseParen,
    #[token("#")]
    Hash,
    #[token(",")]
    Comma,
    #[token(";")]
    Semicolon,
    #[token(":")]
    Colon,
    #[token(".")]
    Dot,
    #[token("=")]
    Equals,
    #[token("+=")]
    PlusEqual,
    #[token("-=")]
    MinusEqual,
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("%")]
    Percent,
    #[token("<")]
    Lt,
    #[token("<=")]
    Lte,
    #[token(">")]
    Gt,
    #[token(">=")]
    Gte,
    #[token("==")]
    EqEq,
    #[token("!=")]
    NotEq,
    #[token("&&")]
    AndAnd,
    #[token("||")]
    OrOr,
    #[token("!")]
    Not,
    #[token("++")]
    PlusPlus,
    #[token("--")]
    MinusMinus,
}
