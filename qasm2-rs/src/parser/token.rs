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

use std::fmt;

use crate::parser::lexer::{Keyword, LexInput, LexResult, Operator};
use crate::program::SourceLocation;

#[derive(Clone, Debug, PartialEq)]
pub enum Token {
    Arrow,
    Comma,
    EqualsEquals,
    Identifier(String),
    Integer(u64),
    Keyword(Keyword),
    LBrace,
    LBracket,
    LParenthesis,
    Operator(Operator),
    RBrace,
    RBracket,
    Real(f64),
    RParenthesis,
    Semicolon,
    String(String),
}

impl Token {
    /// How to refer to this token in an error message, such as ``keyword `creg` ``.
    pub fn describe(&self) -> String {
        match self {
            Token::Identifier(name) => format!("identifier `{name}`"),
            Token::Integer(value) => format!("integer {value}"),
            Token::Real(value) => format!("real {value}"),
            Token::String(contents) => format!("string {contents:?}"),
            Token::Keyword(keyword) => format!("keyword `{keyword}`"),
            punctuation => format!("`{punctuation}`"),
        }
    }
}

/// Tokens display as they would be written in a program.
impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Arrow => f.write_str("->"),
            Token::Comma => f.write_str(","),
            Token::EqualsEquals => f.write_str("=="),
            Token::Identifier(name) => f.write_str(name),
            Token::Integer(value) => write!(f, "{value}"),
            Token::Keyword(keyword) => write!(f, "{keyword}"),
            Token::LBrace => f.write_str("{"),
            Token::LBracket => f.write_str("["),
            Token::LParenthesis => f.write_str("("),
            Token::Operator(operator) => write!(f, "{operator}"),
            Token::RBrace => f.write_str("}"),
            Token::RBracket => f.write_str("]"),
            Token::Real(value) => write!(f, "{value}"),
            Token::RParenthesis => f.write_str(")"),
            Token::Semicolon => f.write_str(";"),
            Token::String(contents) => write!(f, "{contents:?}"),
        }
    }
}

impl nom::InputLength for Token {
    fn input_len(&self) -> usize {
        1
    }
}

/// A token and the place in the source where it starts.
#[derive(Clone, Debug, PartialEq)]
pub struct LocatedToken {
    token: Token,
    location: SourceLocation,
}

impl LocatedToken {
    pub fn token(&self) -> &Token {
        &self.token
    }

    pub fn into_token(self) -> Token {
        self.token
    }

    pub fn location(&self) -> SourceLocation {
        self.location
    }
}

impl PartialEq<Token> for LocatedToken {
    fn eq(&self, other: &Token) -> bool {
        &self.token == other
    }
}

impl nom::InputLength for LocatedToken {
    fn input_len(&self) -> usize {
        1
    }
}

/// Run a lexer for a single token, noting where in the source the token began.
pub(crate) fn located<'i, E, P>(
    mut lexer: P,
) -> impl FnMut(LexInput<'i>) -> LexResult<'i, LocatedToken, E>
where
    P: nom::Parser<LexInput<'i>, Token, E>,
    E: nom::error::ParseError<LexInput<'i>>,
{
    move |input| {
        let location = SourceLocation {
            line: input.location_line(),
            column: input.get_utf8_column(),
        };
        let (rest, token) = lexer.parse(input)?;
        Ok((rest, LocatedToken { token, location }))
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::Token;
    use crate::parser::lexer::{Keyword, Operator};

    #[rstest]
    #[case(Token::Identifier("theta".to_owned()), "identifier `theta`")]
    #[case(Token::Keyword(Keyword::CReg), "keyword `creg`")]
    #[case(Token::Integer(3), "integer 3")]
    #[case(Token::String("qelib1.inc".to_owned()), "string \"qelib1.inc\"")]
    #[case(Token::Semicolon, "`;`")]
    #[case(Token::Operator(Operator::Plus), "`+`")]
    fn describe(#[case] token: Token, #[case] expected: &str) {
        assert_eq!(token.describe(), expected);
    }
}
