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

use nom::{
    combinator::opt,
    multi::separated_list1,
    sequence::delimited,
};

use crate::{expected_token, program::Argument, token};

use super::{
    error::{InternalParseError, ParserErrorKind},
    lexer::Token,
    InternalParserResult, ParserInput,
};

/// Parse a non-empty, comma-separated list of items.
///
/// A trailing comma is consumed outside of strict mode and is an error within it.
pub(crate) fn parse_list<'a, O, F>(
    mut item: F,
    strict: bool,
) -> impl FnMut(ParserInput<'a>) -> InternalParserResult<'a, Vec<O>>
where
    F: FnMut(ParserInput<'a>) -> InternalParserResult<'a, O>,
{
    move |input: ParserInput<'a>| {
        let (input, items) = separated_list1(token!(Comma), &mut item)(input)?;
        match super::split_first_token(input) {
            Some((Token::Comma, _)) if strict => Err(nom::Err::Failure(
                InternalParseError::from_kind(&input[..1], ParserErrorKind::Strict("trailing comma")),
            )),
            Some((Token::Comma, remainder)) => Ok((remainder, items)),
            _ => Ok((input, items)),
        }
    }
}

/// Parse an optional parenthesized list, such as the parameters of a gate. Both `name` and
/// `name()` produce an empty list.
pub(crate) fn parse_parenthesized_list<'a, O, F>(
    item: F,
    strict: bool,
) -> impl FnMut(ParserInput<'a>) -> InternalParserResult<'a, Vec<O>>
where
    F: FnMut(ParserInput<'a>) -> InternalParserResult<'a, O>,
{
    let mut list = opt(delimited(
        token!(LParenthesis),
        opt(parse_list(item, strict)),
        token!(RParenthesis),
    ));
    move |input: ParserInput<'a>| {
        let (input, items) = list(input)?;
        Ok((input, items.flatten().unwrap_or_default()))
    }
}

/// Parse an identifier which names something the program declares: a register, gate, or
/// parameter.
///
/// Strict mode requires that it begin with a lowercase letter.
pub(crate) fn parse_identifier<'a>(
    strict: bool,
) -> impl FnMut(ParserInput<'a>) -> InternalParserResult<'a, String> {
    move |input: ParserInput<'a>| match super::split_first_token(input) {
        None => Err(nom::Err::Error(InternalParseError::from_kind(
            input,
            ParserErrorKind::UnexpectedEOF("an identifier"),
        ))),
        Some((Token::Identifier(name), remainder)) => {
            if strict && !name.starts_with(|chr: char| chr.is_ascii_lowercase()) {
                return Err(nom::Err::Failure(InternalParseError::from_kind(
                    &input[..1],
                    ParserErrorKind::Strict("identifiers must begin with a lowercase letter"),
                )));
            }
            Ok((remainder, name.clone()))
        }
        Some((other_token, _)) => expected_token!(input, other_token, "an identifier".to_owned()),
    }
}

/// Parse a register or one bit of it, such as `q` or `q[0]`.
pub(crate) fn parse_argument<'a>(
    strict: bool,
) -> impl FnMut(ParserInput<'a>) -> InternalParserResult<'a, Argument> {
    move |input: ParserInput<'a>| {
        let (input, register) = parse_identifier(strict)(input)?;
        let (input, index) = opt(delimited(
            token!(LBracket),
            token!(Integer(v)),
            token!(RBracket),
        ))(input)?;
        Ok((input, Argument { register, index }))
    }
}

/// Parse the statement terminator.
pub(crate) fn parse_semicolon<'a>(input: ParserInput<'a>) -> InternalParserResult<'a, ()> {
    token!(Semicolon)(input)
}

/// Parse `[size]` following a register name.
pub(crate) fn parse_register_size<'a>(input: ParserInput<'a>) -> InternalParserResult<'a, u64> {
    delimited(token!(LBracket), token!(Integer(v)), token!(RBracket))(input)
}

#[cfg(test)]
mod tests {
    use nom_locate::LocatedSpan;
    use rstest::rstest;

    use super::{parse_argument, parse_list, parse_parenthesized_list};
    use crate::parser::{error::ParserErrorKind, lexer::lex, ParseError};
    use crate::program::Argument;

    fn arguments(input: &str, strict: bool) -> Result<Vec<Argument>, ParseError> {
        let tokens = lex(LocatedSpan::new(input)).unwrap();
        let parsed = parse_list(parse_argument(strict), strict)(&tokens)
            .map(|(_, parsed)| parsed)
            .map_err(|err| match err {
                nom::Err::Error(err) | nom::Err::Failure(err) => err.into(),
                nom::Err::Incomplete(_) => unreachable!(),
            });
        parsed
    }

    #[test]
    fn argument_list() {
        assert_eq!(
            arguments("q[0], r", false).unwrap(),
            vec![Argument::bit("q", 0), Argument::register("r")]
        );
    }

    #[rstest]
    #[case(false, true)]
    #[case(true, false)]
    fn trailing_comma(#[case] strict: bool, #[case] accepted: bool) {
        let result = arguments("q[0], r,", strict);
        assert_eq!(result.is_ok(), accepted);
        if let Err(err) = result {
            assert_eq!(err.kind(), Some(&ParserErrorKind::Strict("trailing comma")));
        }
    }

    #[test]
    fn strict_identifiers() {
        assert!(arguments("Q", false).is_ok());
        let err = arguments("Q", true).unwrap_err();
        assert_eq!(
            err.kind(),
            Some(&ParserErrorKind::Strict(
                "identifiers must begin with a lowercase letter"
            ))
        );
    }

    #[rstest]
    #[case("", 0)]
    #[case("()", 0)]
    #[case("(a, b)", 2)]
    fn parenthesized(#[case] input: &str, #[case] expected: usize) {
        let tokens = lex(LocatedSpan::new(input)).unwrap();
        let (remainder, parsed) =
            parse_parenthesized_list(super::parse_identifier(false), false)(&tokens).unwrap();
        assert!(remainder.is_empty());
        assert_eq!(parsed.len(), expected);
    }
}
