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

//! Loading OpenQASM 2 programs into [`Circuit`]s.
//!
//! Loading parses the source, resolves `include` statements, checks the program's meaning, and
//! produces a flat circuit in which register arguments have been broadcast into one instruction
//! per bit.
//!
//! ```
//! use qasm2_rs::{loads, LoadOptions};
//!
//! let circuit = loads(
//!     r#"
//!     OPENQASM 2.0;
//!     include "qelib1.inc";
//!     qreg q[2];
//!     h q[0];
//!     cx q[0], q[1];
//!     "#,
//!     &LoadOptions::default(),
//! )
//! .unwrap();
//! assert_eq!(circuit.num_qubits(), 2);
//! ```

use std::{
    fs,
    path::{Path, PathBuf},
};

use tracing::debug;

use crate::{circuit::Circuit, expression::CustomClassical};

mod error;
mod include;
mod lower;
pub(crate) mod qelib1;

pub use error::{LoadError, SemanticErrorKind};
pub use include::IncludeInputDirectory;
pub use qelib1::LEGACY_CUSTOM_INSTRUCTIONS;

use error::STRING_INPUT;
use lower::Lowerer;

/// A gate whose implementation is supplied by the caller rather than by the program.
///
/// A `builtin` instruction is in scope from the start of every program. Any other custom
/// instruction takes effect when the program defines a `gate` or `opaque` of the same name, whose
/// body is then ignored; the definition must have the same numbers of parameters and qubits.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CustomInstruction {
    pub name: String,
    pub num_params: usize,
    pub num_qubits: usize,
    pub builtin: bool,
}

impl CustomInstruction {
    pub fn new(name: impl Into<String>, num_params: usize, num_qubits: usize, builtin: bool) -> Self {
        Self {
            name: name.into(),
            num_params,
            num_qubits,
            builtin,
        }
    }
}

/// Configuration of [`load`] and [`loads`].
#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    /// Directories searched, in order, for files named by `include` statements.
    pub include_path: Vec<PathBuf>,
    pub include_input_directory: IncludeInputDirectory,
    pub custom_instructions: Vec<CustomInstruction>,
    pub custom_classical: Vec<CustomClassical>,
    /// Accept only the syntax of the OpenQASM 2.0 paper.
    pub strict: bool,
}

impl LoadOptions {
    pub fn with_include_path<I, P>(mut self, include_path: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.include_path = include_path.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_include_input_directory(mut self, policy: IncludeInputDirectory) -> Self {
        self.include_input_directory = policy;
        self
    }

    pub fn with_custom_instructions(
        mut self,
        instructions: impl IntoIterator<Item = CustomInstruction>,
    ) -> Self {
        self.custom_instructions.extend(instructions);
        self
    }

    pub fn with_custom_classical(
        mut self,
        functions: impl IntoIterator<Item = CustomClassical>,
    ) -> Self {
        self.custom_classical.extend(functions);
        self
    }

    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }
}

/// Load an OpenQASM 2 program from a string.
///
/// Relative includes are searched for only in [`LoadOptions::include_path`].
pub fn loads(source: &str, options: &LoadOptions) -> Result<Circuit, LoadError> {
    debug!(strict = options.strict, "loading OpenQASM 2 from a string");
    Lowerer::new(options, None)?.run(source, STRING_INPUT, None)
}

/// Load an OpenQASM 2 program from a file.
///
/// The file's own directory is also searched for includes, according to
/// [`LoadOptions::include_input_directory`].
pub fn load(path: impl AsRef<Path>, options: &LoadOptions) -> Result<Circuit, LoadError> {
    let path = path.as_ref();
    debug!(path = %path.display(), strict = options.strict, "loading OpenQASM 2 from a file");
    let source = fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let directory = match path.parent() {
        Some(parent) if parent.as_os_str().is_empty() => Path::new("."),
        Some(parent) => parent,
        None => Path::new("."),
    };
    Lowerer::new(options, Some(directory))?.run(&source, &path.display().to_string(), Some(path))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::{
        loads, CustomInstruction, LoadError, LoadOptions, SemanticErrorKind,
        LEGACY_CUSTOM_INSTRUCTIONS,
    };
    use crate::circuit::{GateBody, Operation};
    use crate::expression::{CustomClassical, EvaluationError};
    use crate::program::SourceLocation;

    fn semantic_error(source: &str) -> SemanticErrorKind {
        match loads(source, &LoadOptions::default()) {
            Err(LoadError::Semantic { kind, .. }) => kind,
            other => panic!("expected a semantic error, got {other:?}"),
        }
    }

    #[test]
    fn broadcasts_registers() {
        let circuit = loads(
            "include \"qelib1.inc\"; qreg a[3]; qreg b[3]; qreg c[1]; \
             cx a, b; cx c[0], b; barrier a, b[0], c;",
            &LoadOptions::default(),
        )
        .unwrap();
        let qubits: Vec<_> = circuit
            .instructions()
            .iter()
            .map(|instruction| instruction.qubits.clone())
            .collect();
        assert_eq!(
            qubits,
            vec![
                vec![0, 3],
                vec![1, 4],
                vec![2, 5],
                vec![6, 3],
                vec![6, 4],
                vec![6, 5],
                vec![0, 1, 2, 3, 6],
            ]
        );
    }

    #[test]
    fn conditions_apply_to_every_broadcast_instruction() {
        let circuit = loads(
            "qreg q[2]; creg c[2]; measure q -> c; if (c == 1) U(0, 0, pi) q;",
            &LoadOptions::default(),
        )
        .unwrap();
        let instructions = circuit.instructions();
        assert_eq!(instructions.len(), 4);
        assert_eq!(instructions[0].operation, Operation::Measure);
        assert_eq!(instructions[1].clbits, vec![1]);
        assert!(instructions[2..]
            .iter()
            .all(|instruction| instruction.condition.as_ref().map(|c| c.value) == Some(1)));
    }

    #[rstest]
    #[case("qreg q[1]; creg q[1];", SemanticErrorKind::AlreadyDefined("q".to_owned()))]
    #[case("qreg q[1]; gate q a { }", SemanticErrorKind::AlreadyDefined("q".to_owned()))]
    #[case("qreg q[1]; h q;", SemanticErrorKind::Undefined("h".to_owned()))]
    #[case("qreg q[1]; creg c[1]; c q;", SemanticErrorKind::NotAGate("c".to_owned()))]
    #[case("creg c[1]; U(0,0,0) c;", SemanticErrorKind::NotAQuantumRegister("c".to_owned()))]
    #[case("qreg q[1]; if (q == 1) U(0,0,0) q;", SemanticErrorKind::NotAClassicalRegister("q".to_owned()))]
    #[case(
        "qreg q[2]; U(0,0,0) q[2];",
        SemanticErrorKind::IndexOutOfRange { register: "q".to_owned(), index: 2, size: 2 }
    )]
    #[case("qreg a[2]; qreg b[3]; CX a, b;", SemanticErrorKind::MismatchedBroadcast(2, 3))]
    #[case("qreg q[2]; creg c[3]; measure q -> c;", SemanticErrorKind::MismatchedBroadcast(2, 3))]
    #[case("qreg q[2]; creg c[2]; measure q[0] -> c;", SemanticErrorKind::MixedMeasure)]
    #[case("qreg q[2]; CX q[1], q[1];", SemanticErrorKind::DuplicateQubit("q[1]".to_owned()))]
    #[case("qreg q[2]; CX q, q;", SemanticErrorKind::DuplicateQubit("q[0]".to_owned()))]
    #[case(
        "qreg q[1]; U(0,0) q;",
        SemanticErrorKind::ParameterCount { name: "U".to_owned(), expected: 3, found: 2 }
    )]
    #[case(
        "qreg q[2]; CX q[0];",
        SemanticErrorKind::QubitCount { name: "CX".to_owned(), expected: 2, found: 1 }
    )]
    #[case("gate g(a, a) q { }", SemanticErrorKind::DuplicateName("a".to_owned()))]
    #[case("gate g(a) a { }", SemanticErrorKind::DuplicateName("a".to_owned()))]
    #[case("gate g(a) q { U(a, b, 0) q; }", SemanticErrorKind::Undefined("b".to_owned()))]
    #[case("gate g q { U(0, 0, 0) r; }", SemanticErrorKind::Undefined("r".to_owned()))]
    #[case("gate g q { g q; }", SemanticErrorKind::Undefined("g".to_owned()))]
    #[case("gate g a, b { CX a, a; }", SemanticErrorKind::DuplicateQubit("a".to_owned()))]
    #[case("gate g q { U(f(1), 0, 0) q; }", SemanticErrorKind::Undefined("f".to_owned()))]
    #[case("qreg q[1]; U(theta, 0, 0) q;", SemanticErrorKind::NonConstantExpression("theta".to_owned()))]
    #[case(
        "qreg q[1]; U(1/0, 0, 0) q;",
        SemanticErrorKind::Evaluation(EvaluationError::DivisionByZero)
    )]
    #[case(
        "qreg q[1]; U(sin(1, 2), 0, 0) q;",
        SemanticErrorKind::Evaluation(EvaluationError::ArgumentCount {
            function: "sin".to_owned(),
            expected: 1,
            found: 2
        })
    )]
    #[case("include \"missing.inc\";", SemanticErrorKind::IncludeNotFound("missing.inc".to_owned()))]
    #[case(
        "include \"qelib1.inc\"; include \"qelib1.inc\";",
        SemanticErrorKind::AlreadyDefined("u3".to_owned())
    )]
    fn semantic_errors(#[case] source: &str, #[case] expected: SemanticErrorKind) {
        assert_eq!(semantic_error(source), expected);
    }

    #[test]
    fn errors_have_locations() {
        let err = loads("qreg q[1];\n\n  h q;", &LoadOptions::default()).unwrap_err();
        assert_eq!(err.location(), Some(SourceLocation { line: 3, column: 3 }));
        assert_eq!(err.to_string(), "<input>:3:3: 'h' is not defined");
    }

    #[test]
    fn syntax_errors_name_the_file() {
        let err = loads("qreg q[1]", &LoadOptions::default()).unwrap_err();
        assert!(matches!(&err, LoadError::Syntax { file, .. } if file == "<input>"));
    }

    #[test]
    fn errors_in_the_standard_library_name_it() {
        let err = loads("gate x a { } include \"qelib1.inc\";", &LoadOptions::default()).unwrap_err();
        assert!(matches!(&err, LoadError::Semantic { file, .. } if file == "qelib1.inc"));
    }

    #[test]
    fn builtin_custom_instructions_are_in_scope() {
        let options = LoadOptions::default()
            .with_custom_instructions([CustomInstruction::new("rzz", 1, 2, true)]);
        let circuit = loads("qreg q[2]; rzz(0.5) q[0], q[1];", &options).unwrap();
        assert_eq!(circuit.gate("rzz").unwrap().body, GateBody::Custom);
        assert_eq!(circuit.instructions().len(), 1);

        // A definition with the same signature is skipped.
        let circuit = loads(
            "gate rzz(t) a, b { CX a, b; U(0, 0, t) b; CX a, b; } qreg q[2]; rzz(0.5) q[0], q[1];",
            &options,
        )
        .unwrap();
        assert_eq!(circuit.gate("rzz").unwrap().body, GateBody::Custom);
    }

    #[test]
    fn custom_instructions_replace_definitions() {
        let options = LoadOptions::default()
            .with_custom_instructions(LEGACY_CUSTOM_INSTRUCTIONS.iter().cloned());
        let circuit = loads("include \"qelib1.inc\"; qreg q[1]; h q[0];", &options).unwrap();
        let h = circuit.gate("h").unwrap();
        assert_eq!(h.body, GateBody::Custom);
        assert!(h.standard);
        assert_eq!(circuit.decompose().unwrap().instructions()[0].operation.name(), "h");
    }

    #[test]
    fn custom_instruction_signatures_must_match() {
        let options =
            LoadOptions::default().with_custom_instructions([CustomInstruction::new("g", 1, 1, false)]);
        let err = loads("gate g a, b { }", &options).unwrap_err();
        assert_eq!(
            err.semantic_kind(),
            Some(&SemanticErrorKind::CustomSignatureMismatch {
                name: "g".to_owned(),
                expected_params: 1,
                expected_qubits: 1,
                found_params: 0,
                found_qubits: 2,
            })
        );
    }

    #[test]
    fn custom_classical_functions() {
        let options = LoadOptions::default().with_custom_classical([CustomClassical::new(
            "atan2",
            2,
            |args: &[f64]| args[0].atan2(args[1]),
        )]);
        let circuit = loads(
            "gate r(a, b) q { U(atan2(a, b), 0, 0) q; } qreg q[1]; r(1, 1) q[0]; U(atan2(0, 1), 0, 0) q[0];",
            &options,
        )
        .unwrap();
        let Operation::Gate(u) = &circuit.instructions()[1].operation else {
            panic!("expected a gate");
        };
        assert_eq!(u.params, vec![0.0, 0.0, 0.0]);
        let decomposed = circuit.decompose().unwrap();
        let Operation::Gate(r) = &decomposed.instructions()[0].operation else {
            panic!("expected a gate");
        };
        approx::assert_relative_eq!(r.params[0], std::f64::consts::FRAC_PI_4);
    }

    #[test]
    fn custom_classical_may_not_shadow_builtins() {
        let options = LoadOptions::default()
            .with_custom_classical([CustomClassical::new("sin", 1, |args: &[f64]| args[0])]);
        assert!(matches!(
            loads("", &options),
            Err(LoadError::InvalidOptions(_))
        ));
    }

    #[test]
    fn strict_mode() {
        let options = LoadOptions::default().with_strict(true);
        assert!(loads("qreg q[1];", &options).is_err());
        assert!(loads("OPENQASM 2.0; qreg q[1];", &options).is_ok());
    }

    #[test]
    fn empty_registers_are_allowed() {
        let circuit = loads("qreg q[0]; creg c[0]; barrier q; measure q -> c;", &LoadOptions::default())
            .unwrap();
        assert_eq!(circuit.num_qubits(), 0);
        assert_eq!(circuit.instructions().len(), 1);
    }
}
