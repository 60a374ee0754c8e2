//! Token table for the Java subset the greeting demo was written in.
//!
//! Tokenizing walks the source once. At each position the rules are tried in
//! table order and the first one that matches wins, so keyword rules sit
//! before [`TokenKind::Identifier`] and longer operators sit before their
//! prefixes (`>>>=` before `>>=` before `>>` before `>`).
//!
//! Comments, whitespace and newlines are consumed but never emitted. A
//! character no other rule accepts becomes a one-character
//! [`TokenKind::Error`] row and scanning carries on, so the table always
//! covers the whole input.
//!
//! ```
//! use greeting::{tokenize, TokenKind};
//!
//! let tokens = tokenize("int edad = 30;");
//! let kinds: Vec<TokenKind> = tokens.iter().map(|t| t.kind).collect();
//! assert_eq!(
//!     kinds,
//!     [
//!         TokenKind::DataType,
//!         TokenKind::Identifier,
//!         TokenKind::AssignmentOperator,
//!         TokenKind::Number,
//!         TokenKind::Delimiter,
//!     ]
//! );
//! ```

use std::fs;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, IntoStaticStr};
use tracing::{debug, trace};

use crate::error::{GreetingError, Result};

/// Java source of the greeting demo.
pub const DEMO_SOURCE: &str = include_str!("../fixtures/EjemploPatterns.java");

/// Lexical category of a [`Token`].
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumIter,
    IntoStaticStr,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TokenKind {
    Comment,
    DataType,
    Conditional,
    Loop,
    Exception,
    AccessModifier,
    DataStructure,
    /// `System.out.print`, `System.out.println` or `System.out.printf`
    PrintCall,
    StringLiteral,
    CharLiteral,
    Number,
    ReservedWord,
    BooleanLiteral,
    NullLiteral,
    Identifier,
    ArithmeticOperator,
    AssignmentOperator,
    /// `+=`, `>>>=` and friends
    CompoundOperator,
    LogicalOperator,
    RelationalOperator,
    /// `++` and `--`
    IncrementOperator,
    BitwiseOperator,
    Delimiter,
    OpenBracket,
    CloseBracket,
    Newline,
    Whitespace,
    /// A single character no other rule accepts
    Error,
}

impl TokenKind {
    /// Kinds that are consumed but left out of the token table.
    pub fn is_skipped(self) -> bool {
        matches!(
            self,
            TokenKind::Comment | TokenKind::Newline | TokenKind::Whitespace
        )
    }
}

/// One row of the token table. `line` and `column` are 1-based and count
/// characters, not bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub kind: TokenKind,
    pub lexeme: String,
    pub line: usize,
    pub column: usize,
}

const RULE_TABLE: &[(TokenKind, &str)] = &[
    (TokenKind::Comment, r"//[^\n]*|/\*[\s\S]*?\*/"),
    (TokenKind::Newline, r"\n"),
    (TokenKind::Whitespace, r"[ \t\r]+"),
    (TokenKind::StringLiteral, r#""(?:[^"\\\n]|\\.)*""#),
    (TokenKind::CharLiteral, r"'(?:[^'\\\n]|\\.)'"),
    (TokenKind::PrintCall, r"System\.out\.(?:println|printf|print)\b"),
    (
        TokenKind::DataType,
        r"(?:int|float|double|boolean|char|string|String|long|short|byte)\b",
    ),
    (TokenKind::Conditional, r"(?:if|else)\b"),
    (TokenKind::Loop, r"(?:for|while|do)\b"),
    (TokenKind::Exception, r"(?:try|catch|throw|finally)\b"),
    (
        TokenKind::AccessModifier,
        r"(?:public|private|protected|static|final|abstract)\b",
    ),
    (
        TokenKind::DataStructure,
        r"(?:array|list|set|map|queue|stack)\b",
    ),
    (
        TokenKind::ReservedWord,
        r"(?:class|void|return|new|this|super|instanceof|switch|case|default|break|continue)\b",
    ),
    (TokenKind::BooleanLiteral, r"(?:true|false)\b"),
    (TokenKind::NullLiteral, r"null\b"),
    (TokenKind::Number, r"\d+(?:\.\d+)?(?:[eE][+-]?\d+)?\b"),
    (TokenKind::Identifier, r"[a-zA-Z_][a-zA-Z0-9_]*"),
    (
        TokenKind::CompoundOperator,
        r">>>=|<<=|>>=|\+=|-=|\*=|/=|%=|&=|\|=|\^=",
    ),
    (TokenKind::BitwiseOperator, r">>>|<<|>>"),
    (TokenKind::IncrementOperator, r"\+\+|--"),
    (TokenKind::LogicalOperator, r"&&|\|\|"),
    (TokenKind::RelationalOperator, r"==|!=|<=|>=|<|>"),
    (TokenKind::LogicalOperator, r"!"),
    (TokenKind::BitwiseOperator, r"[&|^~]"),
    (TokenKind::ArithmeticOperator, r"[+\-*/%]"),
    (TokenKind::AssignmentOperator, r"="),
    (TokenKind::Delimiter, r"[;{}(),:.]"),
    (TokenKind::OpenBracket, r"\["),
    (TokenKind::CloseBracket, r"\]"),
    (TokenKind::Error, r"."),
];

struct Rule {
    kind: TokenKind,
    regex: Regex,
}

/// Rules compiled once, each anchored to the start of the remaining input.
static RULES: LazyLock<Vec<Rule>> = LazyLock::new(|| {
    RULE_TABLE
        .iter()
        .map(|(kind, pattern)| Rule {
            kind: *kind,
            regex: Regex::new(&format!("^(?:{pattern})")).expect("Invalid token regex"),
        })
        .collect()
});

/// Splits `source` into its token table.
///
/// Never fails: unrecognized characters show up as [`TokenKind::Error`]
/// tokens for the parser to reject.
pub fn tokenize(source: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut offset = 0;
    let mut line = 1;
    let mut column = 1;

    while offset < source.len() {
        let rest = &source[offset..];
        // The `Error` rule accepts any character but `\n`, which has its own rule.
        let Some((kind, lexeme)) = RULES
            .iter()
            .find_map(|rule| rule.regex.find(rest).map(|m| (rule.kind, m.as_str())))
        else {
            break;
        };

        if kind == TokenKind::Error {
            debug!(lexeme, line, column, "unrecognized character");
        }
        if !kind.is_skipped() {
            trace!(%kind, lexeme, line, column, "token");
            tokens.push(Token {
                kind,
                lexeme: lexeme.to_string(),
                line,
                column,
            });
        }

        match lexeme.rfind('\n') {
            Some(last) => {
                line += lexeme.matches('\n').count();
                column = lexeme[last + 1..].chars().count() + 1;
            }
            None => column += lexeme.chars().count(),
        }
        offset += lexeme.len();
    }

    debug!(count = tokens.len(), lines = line, "tokenized source");
    tokens
}

/// Reads a source file into memory.
pub fn read_source(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|source| GreetingError::ReadSource {
        path: path.to_path_buf(),
        source,
    })
}

/// Reads the file at `path` and tokenizes it.
pub fn tokenize_file(path: &Path) -> Result<Vec<Token>> {
    Ok(tokenize(&read_source(path)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    fn kinds(source: &str) -> Vec<TokenKind> {
        tokenize(source).into_iter().map(|t| t.kind).collect()
    }

    fn find<'a>(tokens: &'a [Token], lexeme: &str) -> &'a Token {
        tokens
            .iter()
            .find(|t| t.lexeme == lexeme)
            .unwrap_or_else(|| panic!("no token {lexeme:?}"))
    }

    #[test]
    fn every_rule_compiles() {
        assert_eq!(RULES.len(), RULE_TABLE.len());
    }

    #[test]
    fn every_emitted_kind_has_a_rule() {
        for kind in TokenKind::iter() {
            assert!(
                RULE_TABLE.iter().any(|(k, _)| *k == kind),
                "{kind} has no rule"
            );
        }
    }

    #[test]
    fn empty_source_has_no_tokens() {
        assert!(tokenize("").is_empty());
        assert!(tokenize("  \n\t\n").is_empty());
    }

    #[test]
    fn demo_source_opens_with_class_header() {
        let tokens = tokenize(DEMO_SOURCE);
        let head: Vec<(&str, TokenKind)> = tokens
            .iter()
            .take(4)
            .map(|t| (t.lexeme.as_str(), t.kind))
            .collect();
        assert_eq!(
            head,
            [
                ("public", TokenKind::AccessModifier),
                ("class", TokenKind::ReservedWord),
                ("EjemploPatterns", TokenKind::Identifier),
                ("{", TokenKind::Delimiter),
            ]
        );
    }

    #[test]
    fn demo_source_drops_comments() {
        let tokens = tokenize(DEMO_SOURCE);
        assert!(tokens.iter().all(|t| !t.kind.is_skipped()));
        assert!(tokens.iter().all(|t| t.kind != TokenKind::Error));
        assert!(!tokens.iter().any(|t| t.lexeme.contains("Variables")));
    }

    #[test]
    fn print_calls_are_single_tokens() {
        let tokens = tokenize(DEMO_SOURCE);
        let prints: Vec<&str> = tokens
            .iter()
            .filter(|t| t.kind == TokenKind::PrintCall)
            .map(|t| t.lexeme.as_str())
            .collect();
        assert_eq!(
            prints,
            [
                "System.out.printf",
                "System.out.println",
                "System.out.println",
                "System.out.println",
            ]
        );
    }

    #[test]
    fn demo_positions_are_one_based() {
        let tokens = tokenize(DEMO_SOURCE);
        let printf = find(&tokens, "System.out.printf");
        assert_eq!((printf.line, printf.column), (9, 9));
        let juan = find(&tokens, "\"Juan\"");
        assert_eq!((juan.line, juan.column), (4, 25));
        assert_eq!(juan.kind, TokenKind::StringLiteral);
    }

    #[test]
    fn increment_is_maximal_munch() {
        let tokens = tokenize("for (int i = 0; i < 3; i++) {");
        let inc = find(&tokens, "++");
        assert_eq!(inc.kind, TokenKind::IncrementOperator);
        assert_eq!(inc.column, 25);
        assert_eq!(find(&tokens, "<").kind, TokenKind::RelationalOperator);
    }

    #[test]
    fn longer_operators_win() {
        assert_eq!(
            kinds("a >>>= b >> c >= d > e"),
            [
                TokenKind::Identifier,
                TokenKind::CompoundOperator,
                TokenKind::Identifier,
                TokenKind::BitwiseOperator,
                TokenKind::Identifier,
                TokenKind::RelationalOperator,
                TokenKind::Identifier,
                TokenKind::RelationalOperator,
                TokenKind::Identifier,
            ]
        );
        assert_eq!(
            kinds("x == y && !z"),
            [
                TokenKind::Identifier,
                TokenKind::RelationalOperator,
                TokenKind::Identifier,
                TokenKind::LogicalOperator,
                TokenKind::LogicalOperator,
                TokenKind::Identifier,
            ]
        );
    }

    #[test]
    fn keywords_need_whole_words() {
        let tokens = tokenize("integer format iffy int");
        let kinds: Vec<TokenKind> = tokens.iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            [
                TokenKind::Identifier,
                TokenKind::Identifier,
                TokenKind::Identifier,
                TokenKind::DataType,
            ]
        );
    }

    #[test]
    fn literals_are_classified() {
        assert_eq!(
            kinds(r#"true null 2500.75 1e10 'a' "say \"hi\"""#),
            [
                TokenKind::BooleanLiteral,
                TokenKind::NullLiteral,
                TokenKind::Number,
                TokenKind::Number,
                TokenKind::CharLiteral,
                TokenKind::StringLiteral,
            ]
        );
    }

    #[test]
    fn block_comment_advances_lines() {
        let tokens = tokenize("/* one\n   two */ x\ny");
        assert_eq!(tokens.len(), 2);
        assert_eq!((tokens[0].line, tokens[0].column), (2, 11));
        assert_eq!((tokens[1].line, tokens[1].column), (3, 1));
    }

    #[test]
    fn columns_count_characters() {
        let tokens = tokenize("\"línea\" x");
        assert_eq!(tokens[1].column, 9);
    }

    #[test]
    fn unknown_characters_become_error_tokens() {
        let tokens = tokenize("int $x = 1;");
        let dollar = find(&tokens, "$");
        assert_eq!(dollar.kind, TokenKind::Error);
        assert_eq!((dollar.line, dollar.column), (1, 5));
        assert_eq!(
            kinds("int $x = 1;"),
            [
                TokenKind::DataType,
                TokenKind::Error,
                TokenKind::Identifier,
                TokenKind::AssignmentOperator,
                TokenKind::Number,
                TokenKind::Delimiter,
            ]
        );
    }

    #[test]
    fn scanning_continues_after_error() {
        let tokens = tokenize("int x = 5 # 3;\n  @Override");
        let hash = find(&tokens, "#");
        assert_eq!((hash.kind, hash.line, hash.column), (TokenKind::Error, 1, 11));
        assert_eq!(find(&tokens, "3").kind, TokenKind::Number);
        let at = find(&tokens, "@");
        assert_eq!((at.line, at.column), (2, 3));
        assert_eq!(find(&tokens, "Override").kind, TokenKind::Identifier);
    }

    #[test]
    fn number_needs_word_boundary() {
        assert_eq!(kinds("9int"), [TokenKind::Error, TokenKind::DataType]);
        assert_eq!(kinds("12abc"), [TokenKind::Error, TokenKind::Error, TokenKind::Identifier]);
        assert_eq!(kinds("2500.75;"), [TokenKind::Number, TokenKind::Delimiter]);
    }

    #[test]
    fn non_ascii_error_keeps_columns_in_characters() {
        let tokens = tokenize("ñ x");
        assert_eq!(tokens[0].kind, TokenKind::Error);
        assert_eq!(tokens[1].column, 3);
    }

    #[test]
    fn missing_file_is_read_error() {
        let err = tokenize_file(Path::new("/definitely/not/here.java")).unwrap_err();
        assert!(matches!(err, GreetingError::ReadSource { .. }));
        assert!(err.to_string().contains("/definitely/not/here.java"));
    }

    #[test]
    fn token_serializes_kind_in_screaming_case() {
        let token = Token {
            kind: TokenKind::PrintCall,
            lexeme: "System.out.println".into(),
            line: 1,
            column: 1,
        };
        let json = serde_json::to_value(&token).unwrap();
        assert_eq!(json["kind"], "PRINT_CALL");
        assert_eq!(TokenKind::PrintCall.to_string(), "PRINT_CALL");
    }
}
