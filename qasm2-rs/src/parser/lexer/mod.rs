// Copyright 2024 Rigetti Computing
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
// http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

mod error;
mod wrapped_parsers;

use nom::{
    branch::alt as nom_alt,
    bytes::complete::{is_not, take_while, take_while1},
    character::complete::{char, digit0, digit1, multispace1, one_of},
    combinator::{all_consuming, map, opt, recognize, value},
    multi::many0,
    sequence::{delimited, pair, preceded, terminated, tuple},
    Finish, IResult,
};
use nom_locate::LocatedSpan;
use wrapped_parsers::{alt, tag};

pub use super::token::{LocatedToken, Token};
use crate::parser::lexer::wrapped_parsers::expecting;
use crate::parser::token::located;
pub(crate) use error::InternalLexError;
pub use error::{LexError, LexErrorKind};

/// The reserved words of OpenQASM 2.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, strum::Display, strum::EnumString)]
pub enum Keyword {
    #[strum(serialize = "barrier")]
    Barrier,
    #[strum(serialize = "creg")]
    CReg,
    #[strum(serialize = "CX")]
    CX,
    #[strum(serialize = "gate")]
    Gate,
    #[strum(serialize = "if")]
    If,
    #[strum(serialize = "include")]
    Include,
    #[strum(serialize = "measure")]
    Measure,
    #[strum(serialize = "opaque")]
    Opaque,
    #[strum(serialize = "OPENQASM")]
    OpenQasm,
    #[strum(serialize = "pi")]
    Pi,
    #[strum(serialize = "qreg")]
    QReg,
    #[strum(serialize = "reset")]
    Reset,
    #[strum(serialize = "U")]
    U,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum Operator {
    #[strum(serialize = "^")]
    Caret,
    #[strum(serialize = "-")]
    Minus,
    #[strum(serialize = "+")]
    Plus,
    #[strum(serialize = "/")]
    Slash,
    #[strum(serialize = "*")]
    Star,
}

pub type LexInput<'a> = LocatedSpan<&'a str>;
pub(crate) type InternalLexResult<'a, T = Token, E = InternalLexError<'a>> =
    IResult<LexInput<'a>, T, E>;
pub type LexResult<'a, T = Token, E = LexError> = IResult<LexInput<'a>, T, E>;

/// Completely lex a string, returning the tokens within.
pub(crate) fn lex(input: LexInput) -> Result<Vec<LocatedToken>, LexError> {
    all_consuming(_lex)(input)
        .finish()
        .map(|(_, tokens)| tokens)
        .map_err(LexError::from)
}

fn _lex(input: LexInput) -> InternalLexResult<Vec<LocatedToken>> {
    terminated(many0(preceded(skip_trivia, lex_token)), skip_trivia)(input)
}

/// Skip over any whitespace (newlines included) and `//` comments.
fn skip_trivia(input: LexInput) -> InternalLexResult<()> {
    value(
        (),
        many0(nom_alt((
            multispace1::<_, InternalLexError>,
            recognize(pair(tag("//"), opt(is_not("\r\n")))),
        ))),
    )(input)
}

fn lex_token(input: LexInput) -> InternalLexResult<LocatedToken> {
    alt(
        "a token",
        (
            located(lex_string),
            // Two-character punctuation must come before operators, or `->` lexes as a minus
            located(lex_punctuation),
            located(lex_operator),
            located(lex_number),
            // This should come last because it's sort of a catch all
            located(lex_keyword_or_identifier),
        ),
    )(input)
}

/// If the given identifier string matches a keyword, return the keyword;
/// otherwise, return the original identifier as a token.
fn recognize_keyword_or_identifier(identifier: String) -> Token {
    match identifier.parse::<Keyword>() {
        Ok(keyword) => Token::Keyword(keyword),
        Err(_) => Token::Identifier(identifier),
    }
}

fn is_valid_identifier_leading_character(chr: char) -> bool {
    chr.is_ascii_alphabetic() || chr == '_'
}

fn is_valid_identifier_end_character(chr: char) -> bool {
    is_valid_identifier_leading_character(chr) || chr.is_ascii_digit()
}

fn lex_identifier_raw(input: LexInput) -> InternalLexResult<String> {
    expecting(
        "a valid identifier",
        map(
            recognize(pair(
                take_while1::<_, _, InternalLexError>(is_valid_identifier_leading_character),
                take_while(is_valid_identifier_end_character),
            )),
            |ident: LexInput| ident.fragment().to_string(),
        ),
    )(input)
}

fn lex_keyword_or_identifier(input: LexInput) -> InternalLexResult {
    let (input, identifier) = lex_identifier_raw(input)?;
    let token = recognize_keyword_or_identifier(identifier);
    Ok((input, token))
}

/// Lex an integer or real literal.
///
/// Unlike [`nom::number::complete::double`], this does not accept a leading sign (signs are
/// operators) nor the spellings `inf` and `nan`, which are valid identifiers.
fn lex_number(input: LexInput) -> InternalLexResult {
    let (remainder, text) = recognize::<_, _, InternalLexError, _>(pair(
        nom_alt((
            recognize(pair(digit1, opt(pair(char('.'), digit0)))),
            recognize(pair(char('.'), digit1)),
        )),
        opt(tuple((one_of("eE"), opt(one_of("+-")), digit1))),
    ))(input)?;

    let fragment = *text.fragment();
    if fragment.bytes().all(|byte| byte.is_ascii_digit()) {
        return match fragment.parse::<u64>() {
            Ok(integer) => Ok((remainder, Token::Integer(integer))),
            Err(_) => Err(nom::Err::Failure(InternalLexError::from_kind(
                text,
                LexErrorKind::IntegerOverflow,
            ))),
        };
    }

    match fragment.parse::<f64>() {
        Ok(real) => Ok((remainder, Token::Real(real))),
        Err(_) => Err(nom::Err::Error(InternalLexError::from_kind(
            text,
            LexErrorKind::ExpectedContext("a real number"),
        ))),
    }
}

fn lex_operator(input: LexInput) -> InternalLexResult {
    use Operator::*;
    map(
        alt(
            "an operator",
            (
                value(Caret, tag("^")),
                value(Minus, tag("-")),
                value(Plus, tag("+")),
                value(Slash, tag("/")),
                value(Star, tag("*")),
            ),
        ),
        Token::Operator,
    )(input)
}

fn lex_punctuation(input: LexInput) -> InternalLexResult {
    use Token::*;
    alt(
        "punctuation",
        (
            value(Arrow, tag("->")),
            value(Comma, tag(",")),
            value(EqualsEquals, tag("==")),
            value(LBrace, tag("{")),
            value(LBracket, tag("[")),
            value(LParenthesis, tag("(")),
            value(RBrace, tag("}")),
            value(RBracket, tag("]")),
            value(RParenthesis, tag(")")),
            value(Semicolon, tag(";")),
        ),
    )(input)
}

/// OpenQASM 2 strings have no escape sequences and may not span lines.
fn lex_string(input: LexInput) -> InternalLexResult {
    map(
        delimited(
            tag("\""),
            take_while(|chr: char| chr != '"' && chr != '\n' && chr != '\r'),
            tag("\""),
        ),
        |contents: LexInput| Token::String(contents.fragment().to_string()),
    )(input)
}

#[cfg(test)]
mod tests {
    use nom_locate::LocatedSpan;
    use rstest::*;

    use super::{lex, Keyword, LexErrorKind, Operator, Token};
    use crate::program::SourceLocation;

    fn tokens(input: &str) -> Vec<Token> {
        lex(LocatedSpan::new(input))
            .unwrap()
            .into_iter()
            .map(|token| token.into_token())
            .collect()
    }

    #[test]
    fn comment() {
        assert_eq!(
            tokens("// hello\nqreg // trailing\n//world"),
            vec![Token::Keyword(Keyword::QReg)]
        )
    }

    #[test]
    fn keywords() {
        assert_eq!(
            tokens("OPENQASM include qreg creg gate opaque U CX u cx Gate"),
            vec![
                Token::Keyword(Keyword::OpenQasm),
                Token::Keyword(Keyword::Include),
                Token::Keyword(Keyword::QReg),
                Token::Keyword(Keyword::CReg),
                Token::Keyword(Keyword::Gate),
                Token::Keyword(Keyword::Opaque),
                Token::Keyword(Keyword::U),
                Token::Keyword(Keyword::CX),
                Token::Identifier("u".to_owned()),
                Token::Identifier("cx".to_owned()),
                Token::Identifier("Gate".to_owned()),
            ]
        )
    }

    #[rstest(input, expected,
        case("2", Token::Integer(2)),
        case("2.0", Token::Real(2.0)),
        case("2.", Token::Real(2.0)),
        case(".5", Token::Real(0.5)),
        case("2e3", Token::Real(2000.0)),
        case("1.5E-3", Token::Real(0.0015)),
    )]
    fn number(input: &str, expected: Token) {
        assert_eq!(tokens(input), vec![expected]);
    }

    #[test]
    fn number_does_not_swallow_sign_or_words() {
        assert_eq!(
            tokens("-1 inf nan"),
            vec![
                Token::Operator(Operator::Minus),
                Token::Integer(1),
                Token::Identifier("inf".to_owned()),
                Token::Identifier("nan".to_owned()),
            ]
        )
    }

    #[test]
    fn integer_overflow() {
        let err = lex(LocatedSpan::new("qreg q[99999999999999999999999];")).unwrap_err();
        assert_eq!(err.kind(), Some(&LexErrorKind::IntegerOverflow));
    }

    #[test]
    fn string() {
        assert_eq!(
            tokens("include \"qelib1.inc\";"),
            vec![
                Token::Keyword(Keyword::Include),
                Token::String("qelib1.inc".to_owned()),
                Token::Semicolon,
            ]
        )
    }

    #[test]
    fn gate_operation() {
        assert_eq!(
            tokens("cx q[0],q[1];\nmeasure q -> c;"),
            vec![
                Token::Identifier("cx".to_owned()),
                Token::Identifier("q".to_owned()),
                Token::LBracket,
                Token::Integer(0),
                Token::RBracket,
                Token::Comma,
                Token::Identifier("q".to_owned()),
                Token::LBracket,
                Token::Integer(1),
                Token::RBracket,
                Token::Semicolon,
                Token::Keyword(Keyword::Measure),
                Token::Identifier("q".to_owned()),
                Token::Arrow,
                Token::Identifier("c".to_owned()),
                Token::Semicolon,
            ]
        )
    }

    #[test]
    fn conditional() {
        assert_eq!(
            tokens("if(c==1)"),
            vec![
                Token::Keyword(Keyword::If),
                Token::LParenthesis,
                Token::Identifier("c".to_owned()),
                Token::EqualsEquals,
                Token::Integer(1),
                Token::RParenthesis,
            ]
        )
    }

    #[test]
    fn token_locations() {
        let lexed = lex(LocatedSpan::new("qreg q[2];\n  creg c[2];")).unwrap();
        let creg = &lexed[6];
        assert_eq!(creg.token(), &Token::Keyword(Keyword::CReg));
        assert_eq!(creg.location(), SourceLocation { line: 2, column: 3 });
    }

    #[rstest(input, case("qreg q[2]; $"), case("\"unterminated"), case("a = b;"))]
    fn it_fails_to_lex(input: &str) {
        assert!(lex(LocatedSpan::new(input)).is_err());
    }

    #[test]
    fn surrounding_whitespace() {
        assert_eq!(
            tokens("\n\t reset   q ;\r\n"),
            vec![
                Token::Keyword(Keyword::Reset),
                Token::Identifier("q".to_owned()),
                Token::Semicolon,
            ]
        )
    }
}
