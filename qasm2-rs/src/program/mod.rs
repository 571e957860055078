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

//! The syntax tree of an OpenQASM 2 program, as written.
//!
//! A [`Program`] is the direct result of parsing and has not been checked for meaning; see
//! [`crate::loader`] for turning it into a [`crate::circuit::Circuit`].

use std::str::FromStr;

use nom_locate::LocatedSpan;

use crate::{
    parser::{lex, parse_program},
    qasm::{ToQasm, ToQasmResult},
};

mod error;
mod statement;

pub(crate) use error::disallow_leftover;
pub use error::{LeftoverError, SyntaxError};
/// The pieces of a [`SyntaxError`].
pub use crate::parser::{
    Keyword, LexError, LexErrorKind, Operator, ParseError, ParserErrorKind, Token,
};
pub use statement::{
    Argument, Barrier, Conditional, GateBodyStatement, GateCall, GateDefinition, Measure,
    OpaqueDefinition, QuantumOperation, RegisterDeclaration, RegisterKind, Reset,
    SourceLocation, Statement, StatementWithLocation, Version,
};

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Program {
    pub version: Option<Version>,
    pub statements: Vec<StatementWithLocation>,
}

impl Program {
    /// Parse OpenQASM 2 source text.
    ///
    /// In strict mode the source must begin with `OPENQASM 2.0;` and only the syntax of the
    /// OpenQASM 2.0 paper is accepted.
    pub fn parse(source: &str, strict: bool) -> Result<Self, SyntaxError> {
        Self::parse_source(source, strict, true)
    }

    /// Parse the contents of an included file, which may not contain a version statement.
    pub(crate) fn parse_included(source: &str, strict: bool) -> Result<Self, SyntaxError> {
        Self::parse_source(source, strict, false)
    }

    fn parse_source(source: &str, strict: bool, top_level: bool) -> Result<Self, SyntaxError> {
        let input = LocatedSpan::new(source);
        let tokens = lex(input)?;
        disallow_leftover(
            parse_program(&tokens, strict, top_level).map_err(|err| err.map(ParseError::from)),
        )
    }

    /// The paths named by this program's `include` statements, in order.
    pub fn includes(&self) -> impl Iterator<Item = &str> {
        self.statements
            .iter()
            .filter_map(|statement| match &statement.statement {
                Statement::Include(path) => Some(path.as_str()),
                _ => None,
            })
    }
}

impl FromStr for Program {
    type Err = SyntaxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s, false)
    }
}

impl ToQasm for Program {
    fn write(&self, f: &mut impl std::fmt::Write, fall_back_to_debug: bool) -> ToQasmResult<()> {
        if let Some(version) = &self.version {
            version.write(f, fall_back_to_debug)?;
            writeln!(f)?;
        }
        for statement in &self.statements {
            statement.write(f, fall_back_to_debug)?;
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::{Program, SourceLocation, Statement, SyntaxError};
    use crate::qasm::ToQasm;

    const BELL: &str = r#"OPENQASM 2.0;
include "qelib1.inc";
qreg q[2];
creg c[2];
gate bell(theta) a, b {
  h a;
  cx a, b;
  barrier a, b;
}
opaque magic(x, y) a;
bell(pi/2) q[0], q[1];
measure q -> c;
if (c == 3) reset q[0];
"#;

    #[test]
    fn it_prints_programs() {
        let program = Program::from_str(BELL).unwrap();
        insta::assert_snapshot!(program.to_qasm().unwrap(), @r###"
        OPENQASM 2.0;
        include "qelib1.inc";
        qreg q[2];
        creg c[2];
        gate bell(theta) a,b {
          h a;
          cx a,b;
          barrier a,b;
        }
        opaque magic(x,y) a;
        bell(pi/2) q[0],q[1];
        measure q -> c;
        if(c==3) reset q[0];
        "###);
    }

    #[test]
    fn printing_is_stable() {
        let program = Program::from_str(BELL).unwrap();
        let printed = program.to_qasm().unwrap();
        let reparsed = Program::from_str(&printed).unwrap();
        assert_eq!(
            reparsed
                .statements
                .iter()
                .map(|s| &s.statement)
                .collect::<Vec<_>>(),
            program
                .statements
                .iter()
                .map(|s| &s.statement)
                .collect::<Vec<_>>()
        );
        assert_eq!(reparsed.to_qasm().unwrap(), printed);
    }

    #[test]
    fn statements_have_locations() {
        let program = Program::from_str(BELL).unwrap();
        assert_eq!(
            program.statements[1].location,
            SourceLocation { line: 3, column: 1 }
        );
        assert_eq!(
            program.statements.last().unwrap().location,
            SourceLocation {
                line: 13,
                column: 1
            }
        );
    }

    #[test]
    fn includes() {
        let program = Program::from_str("include \"a.inc\";\nqreg q[1];\ninclude \"b.inc\";").unwrap();
        assert_eq!(program.includes().collect::<Vec<_>>(), vec!["a.inc", "b.inc"]);
        assert!(matches!(program.statements[0].statement, Statement::Include(_)));
    }

    #[rstest]
    #[case("qreg q[2];\nx q[0]")]
    #[case("qreg q[2]; cx q[0] q[1];")]
    #[case("gate g a { U(0,0,0) a[0]; }")]
    #[case("qreg q[2]; measure q;")]
    fn it_reports_syntax_errors(#[case] input: &str) {
        assert!(matches!(
            Program::from_str(input),
            Err(SyntaxError::ParseError(_))
        ));
    }

    #[test]
    fn syntax_errors_have_locations() {
        let err = Program::from_str("qreg q[2];\ncreg c[2];\nmeasure q -> ;").unwrap_err();
        assert_eq!(err.location().line, 3);
    }
}
