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

use nom::IResult;

use error::InternalParseError;
pub(crate) use error::ErrorInput;
pub use error::{ParseError, ParserErrorKind};
pub(crate) use expression::parse_expression;
pub(crate) use lexer::lex;
pub use lexer::{Keyword, LexError, LexErrorKind, Operator};
pub(crate) use statement::parse_program;
use token::LocatedToken;
pub use token::Token;

mod common;
mod error;
mod expression;
mod gate;
pub(crate) mod lexer;
mod macros;
mod statement;
mod token;

pub(crate) type ParserInput<'a> = &'a [LocatedToken];
type InternalParserResult<'a, R, E = InternalParseError<'a>> = IResult<ParserInput<'a>, R, E>;

/// Returns the next token of the input, along with the input after it.
pub(crate) fn split_first_token<'a>(
    input: ParserInput<'a>,
) -> Option<(&'a Token, ParserInput<'a>)> {
    input
        .split_first()
        .map(|(first, rest)| (first.token(), rest))
}

/// Returns the next token of the input without consuming it.
pub(crate) fn first_token<'a>(input: ParserInput<'a>) -> Option<&'a Token> {
    input.first().map(LocatedToken::token)
}

/// Returns the error within a nom error.
///
/// Every parser here works on complete input, so `Incomplete` never occurs; it is reported as an
/// internal error at the end of input.
pub(crate) fn extract_nom_err<'a>(
    err: nom::Err<InternalParseError<'a>>,
    input: ParserInput<'a>,
) -> InternalParseError<'a> {
    match err {
        nom::Err::Incomplete(_) => InternalParseError::from_kind(
            &input[input.len()..],
            ParserErrorKind::EndOfInput,
        ),
        nom::Err::Error(inner) | nom::Err::Failure(inner) => inner,
    }
}
