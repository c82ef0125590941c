//! Keyword promotion: an `id`-shaped lexeme whose lowercased text names a
//! keyword has its token kind rewritten from `Id` to the keyword's kind.
//! COOL keywords are case-insensitive except `true`/`false`, which must
//! additionally start with a lowercase letter (enforced by the `id` rule
//! itself, since `True`/`False` lex as `Type`).

use crate::token::TokenKind;

pub fn promote(lexeme: &str) -> Option<TokenKind> {
    let lowered = lexeme.to_ascii_lowercase();
    let kind = match lowered.as_str() {
        "class" => TokenKind::Class,
        "inherits" => TokenKind::Inherits,
        "if" => TokenKind::If,
        "then" => TokenKind::Then,
        "else" => TokenKind::Else,
        "fi" => TokenKind::Fi,
        "while" => TokenKind::While,
        "loop" => TokenKind::Loop,
        "pool" => TokenKind::Pool,
        "let" => TokenKind::Let,
        "in" => TokenKind::In,
        "case" => TokenKind::Case,
        "of" => TokenKind::Of,
        "esac" => TokenKind::Esac,
        "new" => TokenKind::New,
        "isvoid" => TokenKind::IsVoid,
        "not" => TokenKind::Not,
        "true" if lexeme.starts_with('t') => TokenKind::True,
        "false" if lexeme.starts_with('f') => TokenKind::False,
        _ => return None,
    };
    Some(kind)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn promotes_case_insensitive_keyword() {
        assert_eq!(promote("WHILE"), Some(TokenKind::While));
        assert_eq!(promote("While"), Some(TokenKind::While));
    }

    #[test]
    fn true_false_require_lowercase_first_letter() {
        assert_eq!(promote("true"), Some(TokenKind::True));
        assert_eq!(promote("True"), None);
        assert_eq!(promote("false"), Some(TokenKind::False));
        assert_eq!(promote("False"), None);
    }

    #[test]
    fn non_keyword_identifier_is_not_promoted() {
        assert_eq!(promote("counter"), None);
    }
}
