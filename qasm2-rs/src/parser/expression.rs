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

use nom::{combinator::opt, multi::separated_list0, sequence::delimited};

use crate::{
    expected_token,
    expression::{
        Expression, ExpressionFunction, FunctionCallExpression, InfixExpression, InfixOperator,
        PrefixExpression, PrefixOperator,
    },
    token, unexpected_eof,
};

use super::lexer::{Keyword, Operator, Token};
use super::{InternalParserResult, ParserInput};

/// Binding power of the operators, from loosest to tightest.
///
/// Unary minus binds more loosely than exponentiation, so `-2^2` is `-(2^2)`.
#[derive(Debug, PartialEq, PartialOrd)]
enum Precedence {
    Lowest,
    Sum,
    Product,
    Prefix,
    Exponentiation,
}

impl From<&Operator> for Precedence {
    fn from(operator: &Operator) -> Self {
        match operator {
            Operator::Plus | Operator::Minus => Precedence::Sum,
            Operator::Star | Operator::Slash => Precedence::Product,
            Operator::Caret => Precedence::Exponentiation,
        }
    }
}

fn get_precedence(input: ParserInput) -> Precedence {
    match super::first_token(input) {
        Some(Token::Operator(operator)) => Precedence::from(operator),
        _ => Precedence::Lowest,
    }
}

/// Parse an expression at the head of the current input, for as long as the expression continues.
/// Return an error only if the first token(s) do not form an expression.
pub(crate) fn parse_expression(input: ParserInput) -> InternalParserResult<Expression> {
    parse(input, Precedence::Lowest)
}

/// Recursively parse an expression as long as operator precedence is satisfied.
fn parse(input: ParserInput, precedence: Precedence) -> InternalParserResult<Expression> {
    let (mut input, mut left) = match super::split_first_token(input) {
        None => unexpected_eof!(input),
        Some((Token::Operator(Operator::Minus), remainder)) => {
            let (remainder, operand) = parse(remainder, Precedence::Prefix)?;
            Ok((
                remainder,
                Expression::Prefix(PrefixExpression {
                    operator: PrefixOperator::Minus,
                    expression: Box::new(operand),
                }),
            ))
        }
        Some((Token::Integer(value), remainder)) => {
            Ok((remainder, Expression::Constant(*value as f64)))
        }
        Some((Token::Real(value), remainder)) => Ok((remainder, Expression::Constant(*value))),
        Some((Token::Keyword(Keyword::Pi), remainder)) => Ok((remainder, Expression::Pi)),
        Some((Token::Identifier(name), remainder)) => parse_identifier(name, remainder),
        Some((Token::LParenthesis, remainder)) => parse_grouped_expression(remainder),
        Some((token, _)) => {
            expected_token!(input, token, "expression".to_owned())
        }
    }?;

    while get_precedence(input) > precedence {
        let (remainder, expression) = parse_infix(input, left)?;
        left = expression;
        input = remainder;
    }

    Ok((input, left))
}

/// An identifier is either a reference to a parameter or, if followed by parentheses, a call of
/// a built-in or custom classical function.
fn parse_identifier<'a>(
    name: &str,
    input: ParserInput<'a>,
) -> InternalParserResult<'a, Expression> {
    let (input, arguments) = opt(delimited(
        token!(LParenthesis),
        separated_list0(token!(Comma), parse_expression),
        token!(RParenthesis),
    ))(input)?;
    match arguments {
        None => Ok((input, Expression::Parameter(name.to_owned()))),
        Some(arguments) => {
            let function = ExpressionFunction::builtin(name)
                .unwrap_or_else(|| ExpressionFunction::Custom(name.to_owned()));
            Ok((
                input,
                Expression::FunctionCall(FunctionCallExpression {
                    function,
                    arguments,
                }),
            ))
        }
    }
}

/// To be called following an opening parenthesis, this will parse the expression to its end
/// and then expect a closing right parenthesis.
fn parse_grouped_expression(input: ParserInput) -> InternalParserResult<Expression> {
    let (input, expression) = parse(input, Precedence::Lowest)?;
    match super::split_first_token(input) {
        None => unexpected_eof!(input),
        Some((Token::RParenthesis, remainder)) => Ok((remainder, expression)),
        Some((other_token, _)) => {
            expected_token!(input, other_token, "right parenthesis".to_owned())
        }
    }
}

/// Parse an infix operator and then the expression to the right of the operator, and return the
/// resulting infixed expression.
fn parse_infix(input: ParserInput, left: Expression) -> InternalParserResult<Expression> {
    match super::split_first_token(input) {
        None => unexpected_eof!(input),
        Some((Token::Operator(token_operator), remainder)) => {
            let (operator, precedence) = match token_operator {
                Operator::Plus => (InfixOperator::Plus, Precedence::Sum),
                Operator::Minus => (InfixOperator::Minus, Precedence::Sum),
                Operator::Star => (InfixOperator::Star, Precedence::Product),
                Operator::Slash => (InfixOperator::Slash, Precedence::Product),
                // Parsing the right-hand side one level lower makes `^` right-associative.
                Operator::Caret => (InfixOperator::Caret, Precedence::Prefix),
            };
            let (remainder, right) = parse(remainder, precedence)?;
            let infix_expression = Expression::Infix(InfixExpression {
                left: Box::new(left),
                operator,
                right: Box::new(right),
            });
            Ok((remainder, infix_expression))
        }
        Some((other_token, _)) => expected_token!(input, other_token, "infix operator".to_owned()),
    }
}
