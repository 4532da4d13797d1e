//! Token kinds for the Ruby lexer
//!
//! Plain tokens are matched by logos. Literal bodies (strings, heredocs,
//! percent literals, regular expressions) are scanned by hand in the lexer
//! once logos reports their opening delimiter, so the corresponding kinds
//! below carry no logos attribute.

use logos::Logos;

#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[logos(skip r"([ \t\r\f]+|\\\r?\n)")]
pub enum TokenKind {
    // ========== Trivia ==========
    #[token("\n")]
    Newline,

    #[regex(r"#[^\n]*")]
    Comment,

    // ========== Keywords ==========
    #[token("def")]
    Def,
    #[token("class")]
    Class,
    #[token("module")]
    Module,
    #[token("end")]
    End,
    #[token("do")]
    Do,
    #[token("if")]
    If,
    #[token("unless")]
    Unless,
    #[token("elsif")]
    Elsif,
    #[token("else")]
    Else,
    #[token("then")]
    Then,
    #[token("while")]
    While,
    #[token("until")]
    Until,
    #[token("for")]
    For,
    #[token("in")]
    In,
    #[token("case")]
    Case,
    #[token("when")]
    When,
    #[token("begin")]
    Begin,
    #[token("rescue")]
    Rescue,
    #[token("ensure")]
    Ensure,
    #[token("return")]
    Return,
    #[token("break")]
    Break,
    #[token("next")]
    Next,
    #[token("redo")]
    Redo,
    #[token("retry")]
    Retry,
    #[token("yield")]
    Yield,
    #[token("super")]
    Super,
    #[token("self")]
    SelfKw,
    #[token("nil")]
    Nil,
    #[token("true")]
    True,
    #[token("false")]
    False,
    #[token("and")]
    And,
    #[token("or")]
    Or,
    #[token("not")]
    Not,
    #[token("defined?")]
    Defined,
    #[token("alias")]
    Alias,
    #[token("undef")]
    Undef,

    // ========== Names ==========
    #[regex(r"[a-z_][a-zA-Z0-9_]*[?!]?")]
    Ident,
    #[regex(r"[A-Z][a-zA-Z0-9_]*")]
    Constant,
    #[regex(r"@[a-zA-Z_][a-zA-Z0-9_]*")]
    IVar,
    #[regex(r"@@[a-zA-Z_][a-zA-Z0-9_]*")]
    CVar,
    #[regex(r"\$[a-zA-Z_][a-zA-Z0-9_]*", priority = 3)]
    #[regex(r"\$[0-9!@&`'+~=/\\,;.<>_*$?:]")]
    GVar,
    /// `name:` in a hash or keyword argument (produced by the lexer)
    Label,

    // ========== Literals ==========
    #[regex(r"[0-9][0-9_]*(\.[0-9][0-9_]*)?([eE][+-]?[0-9]+)?")]
    #[regex(r"0[xX][0-9a-fA-F_]+")]
    #[regex(r"0[bB][01_]+")]
    Number,
    #[regex(r":[a-zA-Z_][a-zA-Z0-9_]*[?!]?")]
    #[regex(r":@[a-zA-Z_][a-zA-Z0-9_]*")]
    #[regex(r":(\[\]=?|<=>|===?|=~|!=|!~|<<|>>|<=|>=|\*\*|[+\-!~]@?|[*/%&|^<>])")]
    Symbol,

    /// Opening `'`
    #[token("'")]
    SingleQuote,
    /// Opening `"`
    #[token("\"")]
    DoubleQuote,
    /// Opening backtick
    #[token("`")]
    Backtick,
    /// Opening `:"` or `:'`
    #[token(":\"")]
    #[token(":'")]
    SymbolQuote,
    /// Opening `%q(`, `%w[`, `%(` ...
    #[regex(r"%[qQwWiIr]?[(\[{<|!/^]")]
    PercentStart,
    /// Opening `<<-EOS`, `<<~EOS`, `<<EOS`
    #[regex(r"<<[~-]?[A-Za-z_][A-Za-z0-9_]*")]
    #[regex(r"<<[~-]?'[^'\n]+'")]
    #[regex(r#"<<[~-]?"[^"\n]+""#)]
    HeredocStart,

    /// A complete string literal (produced by the lexer)
    Str,
    /// A complete quoted symbol (produced by the lexer)
    QuotedSymbol,
    /// A complete command string (produced by the lexer)
    XStr,
    /// A complete regular expression (produced by the lexer)
    Regex,
    /// `%w[...]` word list (produced by the lexer)
    Words,
    /// `%i[...]` symbol list (produced by the lexer)
    SymbolWords,

    // ========== Punctuation ==========
    #[token("::")]
    ColonColon,
    #[token(".")]
    Dot,
    #[token("&.")]
    SafeNav,
    #[token(",")]
    Comma,
    #[token(";")]
    Semicolon,
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token("=>")]
    FatArrow,
    #[token("->")]
    Arrow,
    #[token("=")]
    Assign,
    #[regex(r"(\+|-|\*|\*\*|/|%|\|\||&&|\||&|\^|<<|>>)=")]
    OpAssign,
    #[token("?")]
    Question,
    #[token(":")]
    Colon,
    #[token("!")]
    Bang,
    #[token("*")]
    Star,
    #[token("**")]
    DoubleStar,
    #[token("&")]
    Amp,
    #[token("-")]
    Minus,
    #[token("+")]
    Plus,
    #[token("/")]
    Slash,
    #[token("|")]
    Pipe,
    #[token("<")]
    Lt,
    #[token("..")]
    #[token("...")]
    Range,
    #[token("||")]
    OrOr,
    #[token("&&")]
    AndAnd,
    #[token("==")]
    #[token("===")]
    #[token("!=")]
    #[token("=~")]
    #[token("!~")]
    #[token(">")]
    #[token("<=")]
    #[token(">=")]
    #[token("<=>")]
    #[token("%")]
    #[token("^")]
    #[token("~")]
    #[token("<<")]
    #[token(">>")]
    Operator,

    // ========== Special ==========
    /// Character the lexer does not model (kept so the parser can skip it)
    Unknown,

    /// End of input (added by the lexer)
    Eof,
}

impl TokenKind {
    /// Keywords that may also be used as method names after `.`
    pub const fn is_keyword(&self) -> bool {
        matches!(
            self,
            Self::Def
                | Self::Class
                | Self::Module
                | Self::End
                | Self::Do
                | Self::If
                | Self::Unless
                | Self::Elsif
                | Self::Else
                | Self::Then
                | Self::While
                | Self::Until
                | Self::For
                | Self::In
                | Self::Case
                | Self::When
                | Self::Begin
                | Self::Rescue
                | Self::Ensure
                | Self::Return
                | Self::Break
                | Self::Next
                | Self::Redo
                | Self::Retry
                | Self::Yield
                | Self::Super
                | Self::SelfKw
                | Self::Nil
                | Self::True
                | Self::False
                | Self::And
                | Self::Or
                | Self::Not
                | Self::Defined
                | Self::Alias
                | Self::Undef
        )
    }

    /// Tokens after which an expression has just ended. Used to tell a
    /// regular expression from a division, or a heredoc from a shift.
    pub const fn ends_value(&self) -> bool {
        matches!(
            self,
            Self::Ident
                | Self::Constant
                | Self::IVar
                | Self::CVar
                | Self::GVar
                | Self::Number
                | Self::Symbol
                | Self::Str
                | Self::QuotedSymbol
                | Self::XStr
                | Self::Regex
                | Self::Words
                | Self::SymbolWords
                | Self::RParen
                | Self::RBracket
                | Self::RBrace
                | Self::End
                | Self::SelfKw
                | Self::Nil
                | Self::True
                | Self::False
        )
    }
}
