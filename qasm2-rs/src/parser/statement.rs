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

use nom::sequence::{delimited, terminated, tuple};

use crate::{
    expected_token,
    program::{
        Barrier, Conditional, Measure, Program, QuantumOperation, RegisterDeclaration,
        RegisterKind, Reset, Statement, StatementWithLocation, Version,
    },
    token, unexpected_eof,
};

use super::{
    common::{parse_argument, parse_identifier, parse_list, parse_register_size, parse_semicolon},
    error::{InternalParseError, ParserErrorKind},
    extract_nom_err, gate,
    lexer::{Keyword, Token},
    InternalParserResult, ParserInput,
};

/// Parse a whole program.
///
/// Only a `top_level` source may begin with a version statement, which strict mode requires.
pub(crate) fn parse_program<'a>(
    input: ParserInput<'a>,
    strict: bool,
    top_level: bool,
) -> InternalParserResult<'a, Program> {
    let (mut input, version) = match super::first_token(input) {
        Some(Token::Keyword(Keyword::OpenQasm)) if top_level => {
            let (input, version) = parse_version(input, strict)?;
            (input, Some(version))
        }
        _ if strict && top_level => {
            return Err(nom::Err::Failure(InternalParseError::from_kind(
                input,
                ParserErrorKind::Strict("the program must begin with 'OPENQASM 2.0;'"),
            )))
        }
        _ => (input, None),
    };

    let mut statements = Vec::new();
    loop {
        match super::first_token(input) {
            None => break,
            Some(Token::Semicolon) if strict => {
                return Err(nom::Err::Failure(InternalParseError::from_kind(
                    &input[..1],
                    ParserErrorKind::Strict("empty statements are not allowed"),
                )))
            }
            Some(Token::Semicolon) => input = &input[1..],
            Some(_) => {
                let (remainder, statement) = parse_statement(input, strict)?;
                statements.push(statement);
                input = remainder;
            }
        }
    }

    Ok((
        input,
        Program {
            version,
            statements,
        },
    ))
}

/// Parse `OPENQASM 2.0;`.
fn parse_version<'a>(input: ParserInput<'a>, strict: bool) -> InternalParserResult<'a, Version> {
    let (remainder, _) = token!(Keyword(OpenQasm))(input)?;
    let (remainder, version) = match super::split_first_token(remainder) {
        None => unexpected_eof!(remainder),
        Some((Token::Real(real), rest)) if *real == 2.0 => Ok((rest, Version::default())),
        Some((Token::Integer(2), _)) if strict => Err(nom::Err::Failure(
            InternalParseError::from_kind(remainder, ParserErrorKind::Strict("the version must be written '2.0'")),
        )),
        Some((Token::Integer(2), rest)) => Ok((
            rest,
            Version {
                major: 2,
                minor: None,
            },
        )),
        Some((token @ (Token::Real(_) | Token::Integer(_)), _)) => Err(nom::Err::Failure(
            InternalParseError::from_kind(
                remainder,
                ParserErrorKind::UnsupportedVersion(token.to_string()),
            ),
        )),
        Some((other_token, _)) => {
            expected_token!(remainder, other_token, "a version number".to_owned())
        }
    }?;
    let (remainder, _) = parse_semicolon(remainder)?;
    Ok((remainder, version))
}

/// Parse the next statement from the input, which must not be empty.
fn parse_statement<'a>(
    input: ParserInput<'a>,
    strict: bool,
) -> InternalParserResult<'a, StatementWithLocation> {
    let location = match input.first() {
        None => {
            return Err(nom::Err::Error(InternalParseError::from_kind(
                input,
                ParserErrorKind::EndOfInput,
            )))
        }
        Some(first) => first.location(),
    };

    let (remainder, statement) = match super::split_first_token(input) {
        None => unexpected_eof!(input),
        Some((Token::Keyword(keyword), remainder)) => match keyword {
            Keyword::Barrier => parse_barrier(remainder, strict).map(|(rest, barrier)| {
                (rest, Statement::Barrier(barrier))
            }),
            Keyword::CReg => parse_register(remainder, RegisterKind::Classical, strict),
            Keyword::Gate => gate::parse_gate_definition(remainder, strict)
                .map(|(rest, definition)| (rest, Statement::GateDefinition(definition))),
            Keyword::If => parse_conditional(remainder, strict),
            Keyword::Include => parse_include(remainder),
            Keyword::Measure | Keyword::Reset => parse_quantum_operation(input, strict)
                .map(|(rest, operation)| (rest, Statement::Operation(operation))),
            Keyword::Opaque => gate::parse_opaque_definition(remainder, strict)
                .map(|(rest, definition)| (rest, Statement::OpaqueDefinition(definition))),
            Keyword::QReg => parse_register(remainder, RegisterKind::Quantum, strict),
            Keyword::U | Keyword::CX => parse_quantum_operation(input, strict)
                .map(|(rest, operation)| (rest, Statement::Operation(operation))),
            Keyword::OpenQasm => Err(nom::Err::Failure(InternalParseError::from_kind(
                &input[..1],
                ParserErrorKind::MisplacedVersion,
            ))),
            Keyword::Pi => Err(nom::Err::Failure(InternalParseError::from_kind(
                &input[..1],
                ParserErrorKind::NotAStatement,
            ))),
        }
        .map_err(|err| match keyword {
            Keyword::OpenQasm | Keyword::Pi => err,
            Keyword::U | Keyword::CX => wrap_gate_call_error(input, keyword.to_string(), err),
            _ => nom::Err::Failure(
                InternalParseError::from_kind(
                    &input[..1],
                    ParserErrorKind::InvalidStatement { keyword: *keyword },
                )
                .caused_by(extract_nom_err(err, input)),
            ),
        }),
        Some((Token::Identifier(name), _)) => parse_quantum_operation(input, strict)
            .map(|(rest, operation)| (rest, Statement::Operation(operation)))
            .map_err(|err| wrap_gate_call_error(input, name.clone(), err)),
        Some(_) => Err(nom::Err::Failure(InternalParseError::from_kind(
            &input[..1],
            ParserErrorKind::NotAStatement,
        ))),
    }?;

    Ok((
        remainder,
        StatementWithLocation {
            statement,
            location,
        },
    ))
}

fn wrap_gate_call_error<'a>(
    input: ParserInput<'a>,
    name: String,
    err: nom::Err<InternalParseError<'a>>,
) -> nom::Err<InternalParseError<'a>> {
    nom::Err::Failure(
        InternalParseError::from_kind(&input[..1], ParserErrorKind::InvalidGateCall { name })
            .caused_by(extract_nom_err(err, input)),
    )
}

/// Parse `include "path";`, following the keyword.
fn parse_include<'a>(input: ParserInput<'a>) -> InternalParserResult<'a, Statement> {
    let (input, path) = terminated(token!(String(v)), parse_semicolon)(input)?;
    Ok((input, Statement::Include(path)))
}

/// Parse the name and size of a register declaration, following the `qreg` or `creg` keyword.
fn parse_register<'a>(
    input: ParserInput<'a>,
    kind: RegisterKind,
    strict: bool,
) -> InternalParserResult<'a, Statement> {
    let (input, (name, size, _)) =
        tuple((parse_identifier(strict), parse_register_size, parse_semicolon))(input)?;
    Ok((
        input,
        Statement::Register(RegisterDeclaration { kind, name, size }),
    ))
}

/// Parse a barrier's arguments, following the keyword.
fn parse_barrier<'a>(input: ParserInput<'a>, strict: bool) -> InternalParserResult<'a, Barrier> {
    let (input, arguments) =
        terminated(parse_list(parse_argument(strict), strict), parse_semicolon)(input)?;
    Ok((input, Barrier { arguments }))
}

/// Parse a gate application, `measure`, or `reset`, including its keyword.
fn parse_quantum_operation<'a>(
    input: ParserInput<'a>,
    strict: bool,
) -> InternalParserResult<'a, QuantumOperation> {
    match super::split_first_token(input) {
        None => unexpected_eof!(input),
        Some((Token::Keyword(Keyword::Measure), remainder)) => {
            let (remainder, (qubit, _, target, _)) = tuple((
                parse_argument(strict),
                token!(Arrow),
                parse_argument(strict),
                parse_semicolon,
            ))(remainder)?;
            Ok((remainder, QuantumOperation::Measure(Measure { qubit, target })))
        }
        Some((Token::Keyword(Keyword::Reset), remainder)) => {
            let (remainder, qubit) = terminated(parse_argument(strict), parse_semicolon)(remainder)?;
            Ok((remainder, QuantumOperation::Reset(Reset { qubit })))
        }
        Some(_) => {
            let (remainder, call) = gate::parse_gate_call(input, strict)?;
            Ok((remainder, QuantumOperation::Gate(call)))
        }
    }
}

/// Parse `(creg == value) operation`, following the `if` keyword.
fn parse_conditional<'a>(
    input: ParserInput<'a>,
    strict: bool,
) -> InternalParserResult<'a, Statement> {
    let (input, (register, _, value)) = delimited(
        token!(LParenthesis),
        tuple((
            parse_identifier(strict),
            token!(EqualsEquals),
            token!(Integer(v)),
        )),
        token!(RParenthesis),
    )(input)?;
    let (input, operation) = parse_quantum_operation(input, strict)?;
    Ok((
        input,
        Statement::Conditional(Conditional {
            register,
            value,
            operation,
        }),
    ))
}
