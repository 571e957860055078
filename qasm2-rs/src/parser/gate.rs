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

use nom::{combinator::map, sequence::preceded};

use crate::{
    expected_token,
    program::{
        Argument, Barrier, GateBodyStatement, GateCall, GateDefinition, OpaqueDefinition,
    },
    token, unexpected_eof,
};

use super::{
    common::{
        parse_argument, parse_identifier, parse_list, parse_parenthesized_list, parse_semicolon,
    },
    error::{InternalParseError, ParserErrorKind},
    expression::parse_expression,
    lexer::{Keyword, Token},
    InternalParserResult, ParserInput,
};

/// Parse the name of a gate being applied: an identifier, or one of the built-in `U` and `CX`.
fn parse_gate_name<'a>(
    input: ParserInput<'a>,
    strict: bool,
) -> InternalParserResult<'a, String> {
    match super::split_first_token(input) {
        None => unexpected_eof!(input),
        Some((Token::Keyword(keyword @ (Keyword::U | Keyword::CX)), remainder)) => {
            Ok((remainder, keyword.to_string()))
        }
        Some((Token::Identifier(_), _)) => parse_identifier(strict)(input),
        Some((other_token, _)) => expected_token!(input, other_token, "a gate name".to_owned()),
    }
}

/// Parse a gate application in the main program, such as `cx q[0], q[1];`.
pub(crate) fn parse_gate_call<'a>(
    input: ParserInput<'a>,
    strict: bool,
) -> InternalParserResult<'a, GateCall> {
    let (input, name) = parse_gate_name(input, strict)?;
    let (input, parameters) = parse_parenthesized_list(parse_expression, strict)(input)?;
    let (input, arguments) = parse_list(parse_argument(strict), strict)(input)?;
    let (input, _) = parse_semicolon(input)?;
    Ok((
        input,
        GateCall {
            name,
            parameters,
            arguments,
        },
    ))
}

/// Qubits within a gate body are referred to by bare name.
fn parse_body_qubits<'a>(
    strict: bool,
) -> impl FnMut(ParserInput<'a>) -> InternalParserResult<'a, Vec<Argument>> {
    parse_list(map(parse_identifier(strict), Argument::register), strict)
}

fn parse_body_statement<'a>(
    input: ParserInput<'a>,
    strict: bool,
) -> InternalParserResult<'a, GateBodyStatement> {
    match super::split_first_token(input) {
        None => unexpected_eof!(input),
        Some((Token::Keyword(Keyword::Barrier), remainder)) => {
            let (remainder, arguments) = parse_body_qubits(strict)(remainder)?;
            let (remainder, _) = parse_semicolon(remainder)?;
            Ok((remainder, GateBodyStatement::Barrier(Barrier { arguments })))
        }
        Some(_) => {
            let (input, name) = parse_gate_name(input, strict)?;
            let (input, parameters) = parse_parenthesized_list(parse_expression, strict)(input)?;
            let (input, arguments) = parse_body_qubits(strict)(input)?;
            let (input, _) = parse_semicolon(input)?;
            Ok((
                input,
                GateBodyStatement::Gate(GateCall {
                    name,
                    parameters,
                    arguments,
                }),
            ))
        }
    }
}

/// Parse the statements between the braces of a gate definition, consuming the closing brace.
fn parse_gate_body<'a>(
    mut input: ParserInput<'a>,
    strict: bool,
) -> InternalParserResult<'a, Vec<GateBodyStatement>> {
    let mut body = Vec::new();
    loop {
        match super::split_first_token(input) {
            None => return unexpected_eof!(input),
            Some((Token::RBrace, remainder)) => return Ok((remainder, body)),
            Some((Token::Semicolon, _)) if strict => {
                return Err(nom::Err::Failure(InternalParseError::from_kind(
                    &input[..1],
                    ParserErrorKind::Strict("empty statements are not allowed"),
                )))
            }
            Some((Token::Semicolon, remainder)) => input = remainder,
            Some(_) => {
                let (remainder, statement) = parse_body_statement(input, strict)?;
                body.push(statement);
                input = remainder;
            }
        }
    }
}

/// Parse the signature shared by `gate` and `opaque`: a name, optional parameters, and qubits.
fn parse_signature<'a>(
    input: ParserInput<'a>,
    strict: bool,
) -> InternalParserResult<'a, (String, Vec<String>, Vec<String>)> {
    let (input, name) = parse_identifier(strict)(input)?;
    let (input, parameters) = parse_parenthesized_list(parse_identifier(strict), strict)(input)?;
    let (input, qubits) = parse_list(parse_identifier(strict), strict)(input)?;
    Ok((input, (name, parameters, qubits)))
}

/// Parse the contents of a `gate` definition, following the keyword.
pub(crate) fn parse_gate_definition<'a>(
    input: ParserInput<'a>,
    strict: bool,
) -> InternalParserResult<'a, GateDefinition> {
    let (input, (name, parameters, qubits)) = parse_signature(input, strict)?;
    let (input, body) = preceded(token!(LBrace), |input: ParserInput<'a>| {
        parse_gate_body(input, strict)
    })(input)?;
    Ok((
        input,
        GateDefinition {
            name,
            parameters,
            qubits,
            body,
        },
    ))
}

/// Parse the contents of an `opaque` declaration, following the keyword.
pub(crate) fn parse_opaque_definition<'a>(
    input: ParserInput<'a>,
    strict: bool,
) -> InternalParserResult<'a, OpaqueDefinition> {
    let (input, (name, parameters, qubits)) = parse_signature(input, strict)?;
    let (input, _) = parse_semicolon(input)?;
    Ok((
        input,
        OpaqueDefinition {
            name,
            parameters,
            qubits,
        },
    ))
}

#[cfg(test)]
mod tests {
    use nom_locate::LocatedSpan;
    use pretty_assertions::assert_eq;

    use super::{parse_gate_call, parse_gate_definition, parse_opaque_definition};
    use crate::expression::Expression;
    use crate::parser::lexer::lex;
    use crate::program::{Argument, Barrier, GateBodyStatement, GateCall, OpaqueDefinition};

    macro_rules! test {
        ($name: ident, $parser: ident, $input: expr, $expected: expr) => {
            #[test]
            fn $name() {
                let input = LocatedSpan::new($input);
                let tokens = lex(input).unwrap();
                let (remainder, parsed) = $parser(&tokens, false).unwrap();
                assert_eq!(remainder.len(), 0);
                assert_eq!(parsed, $expected);
            }
        };
    }

    test!(
        builtin_u,
        parse_gate_call,
        "U(pi, 0, pi) q[0];",
        GateCall {
            name: "U".to_owned(),
            parameters: vec![Expression::Pi, Expression::Constant(0.0), Expression::Pi],
            arguments: vec![Argument::bit("q", 0)],
        }
    );

    test!(
        builtin_cx,
        parse_gate_call,
        "CX q, r;",
        GateCall {
            name: "CX".to_owned(),
            parameters: vec![],
            arguments: vec![Argument::register("q"), Argument::register("r")],
        }
    );

    test!(
        empty_parentheses,
        parse_gate_call,
        "h() q[1];",
        GateCall {
            name: "h".to_owned(),
            parameters: vec![],
            arguments: vec![Argument::bit("q", 1)],
        }
    );

    test!(
        opaque,
        parse_opaque_definition,
        "magic(a) q, r;",
        OpaqueDefinition {
            name: "magic".to_owned(),
            parameters: vec!["a".to_owned()],
            qubits: vec!["q".to_owned(), "r".to_owned()],
        }
    );

    #[test]
    fn gate_definition() {
        let tokens = lex(LocatedSpan::new("g(theta,) a, b, { ; U(theta,0,0) a; barrier a,b; }"))
            .unwrap();
        let (remainder, definition) = parse_gate_definition(&tokens, false).unwrap();
        assert!(remainder.is_empty());
        assert_eq!(definition.name, "g");
        assert_eq!(definition.parameters, vec!["theta".to_owned()]);
        assert_eq!(definition.qubits, vec!["a".to_owned(), "b".to_owned()]);
        assert_eq!(
            definition.body,
            vec![
                GateBodyStatement::Gate(GateCall {
                    name: "U".to_owned(),
                    parameters: vec![
                        Expression::Parameter("theta".to_owned()),
                        Expression::Constant(0.0),
                        Expression::Constant(0.0),
                    ],
                    arguments: vec![Argument::register("a")],
                }),
                GateBodyStatement::Barrier(Barrier {
                    arguments: vec![Argument::register("a"), Argument::register("b")],
                }),
            ]
        );
    }

    #[test]
    fn strict_gate_definition() {
        let tokens = lex(LocatedSpan::new("g a { ; }")).unwrap();
        assert!(parse_gate_definition(&tokens, true).is_err());
        let tokens = lex(LocatedSpan::new("g a { }")).unwrap();
        assert!(parse_gate_definition(&tokens, true).is_ok());
    }

    #[test]
    fn body_qubits_cannot_be_indexed() {
        let tokens = lex(LocatedSpan::new("g a { U(0,0,0) a[0]; }")).unwrap();
        assert!(parse_gate_definition(&tokens, false).is_err());
    }
}
