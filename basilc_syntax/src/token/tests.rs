use super::Token;
use logos::Logos;

fn kinds(src: &str) -> Vec<Token> {
    Token::lexer(src).map(|r| r.unwrap_or(Token::Error)).collect()
}

#[test]
fn lexes_keywords_and_idents() {
    assert_eq!(
        kinds("let print x"),
        vec![Token::KwLet, Token::KwPrint, Token::Ident]
    );
}

#[test]
fn lexes_numbers() {
    assert_eq!(kinds("42 3.5"), vec![Token::Integer, Token::Float]);
}

#[test]
fn lexes_operators_without_confusing_arrow_and_minus() {
    assert_eq!(
        kinds("x -> x - 1"),
        vec![
            Token::Ident,
            Token::Arrow,
            Token::Ident,
            Token::Minus,
            Token::Integer
        ]
    );
}

#[test]
fn lexes_strings_and_chars() {
    assert_eq!(kinds("\"hi there\" 'a'"), vec![Token::Str, Token::Char]);
}
