//! Tokenizer for plotted equations.

use crate::errors::{CalcError, CalcResult};

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Number(f64),
    /// Lowercased identifier: variable, constant or function name
    Ident(String),
    Plus,
    Minus,
    Star,
    Slash,
    Caret,
    LeftParen,
    RightParen,
}

/// A token and the char offset it started at
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub position: usize,
}

/// Split an equation into tokens.
///
/// `×` and `÷` are accepted as `*` and `/`, and the Unicode minus sign as
/// `-`, so calculator-style expressions tokenize too.
pub fn tokenize(input: &str) -> CalcResult<Vec<Token>> {
    let chars: Vec<char> = input.chars().collect();
    let mut tokens = Vec::new();
    let mut pos = 0;

    while pos < chars.len() {
        let ch = chars[pos];
        if ch.is_whitespace() {
            pos += 1;
            continue;
        }

        let start = pos;
        let kind = match ch {
            '0'..='9' | '.' => {
                let mut has_dot = false;
                while pos < chars.len() && (chars[pos].is_ascii_digit() || (chars[pos] == '.' && !has_dot)) {
                    if chars[pos] == '.' {
                        has_dot = true;
                    }
                    pos += 1;
                }
                let text: String = chars[start..pos].iter().collect();
                let value = text
                    .parse::<f64>()
                    .map_err(|_| CalcError::parse_error(start, format!("Invalid number: '{}'", text)))?;
                tokens.push(Token { kind: TokenKind::Number(value), position: start });
                continue;
            }
            c if c.is_alphabetic() => {
                while pos < chars.len() && chars[pos].is_alphabetic() {
                    pos += 1;
                }
                let name: String = chars[start..pos].iter().collect::<String>().to_lowercase();
                tokens.push(Token { kind: TokenKind::Ident(name), position: start });
                continue;
            }
            '+' => TokenKind::Plus,
            '-' | '−' => TokenKind::Minus,
            '*' | '×' => TokenKind::Star,
            '/' | '÷' => TokenKind::Slash,
            '^' => TokenKind::Caret,
            '(' => TokenKind::LeftParen,
            ')' => TokenKind::RightParen,
            other => {
                return Err(CalcError::parse_error(start, format!("Unexpected character: '{}'", other)));
            }
        };
        tokens.push(Token { kind, position: start });
        pos += 1;
    }

    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<TokenKind> {
        tokenize(input).unwrap().into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_numbers_and_operators() {
        assert_eq!(
            kinds("2.5 * x ^ 2"),
            vec![
                TokenKind::Number(2.5),
                TokenKind::Star,
                TokenKind::Ident("x".into()),
                TokenKind::Caret,
                TokenKind::Number(2.0),
            ]
        );
    }

    #[test]
    fn test_identifiers_are_lowercased() {
        assert_eq!(kinds("PI"), vec![TokenKind::Ident("pi".into())]);
        assert_eq!(kinds("Sin("), vec![TokenKind::Ident("sin".into()), TokenKind::LeftParen]);
    }

    #[test]
    fn test_calculator_symbols() {
        assert_eq!(kinds("6 ÷ 3 × 2"), kinds("6 / 3 * 2"));
    }

    #[test]
    fn test_positions() {
        let tokens = tokenize("  x+1").unwrap();
        assert_eq!(tokens[0].position, 2);
        assert_eq!(tokens[2].position, 4);
    }

    #[test]
    fn test_rejects_unknown_characters() {
        let err = tokenize("x $ 2").unwrap_err();
        assert_eq!(err, CalcError::parse_error(2, "Unexpected character: '$'"));
    }

    #[test]
    fn test_second_dot_ends_number() {
        // "1.2.3" lexes as 1.2 then .3; the parser rejects the pair
        assert_eq!(kinds("1.2.3"), vec![TokenKind::Number(1.2), TokenKind::Number(0.3)]);
    }
}
