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

use crate::{
    expression::Expression,
    qasm::{write_join_qasm, ToQasm, ToQasmError, ToQasmResult},
};

/// A position within an OpenQASM source, counted from 1.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SourceLocation {
    pub line: u32,
    pub column: usize,
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// The `OPENQASM` version header.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Version {
    pub major: u64,
    /// `None` when the version was written without a minor part, as in `OPENQASM 2;`.
    pub minor: Option<u64>,
}

impl Default for Version {
    fn default() -> Self {
        Self {
            major: 2,
            minor: Some(0),
        }
    }
}

impl ToQasm for Version {
    fn write(&self, f: &mut impl fmt::Write, _fall_back_to_debug: bool) -> ToQasmResult<()> {
        match self.minor {
            Some(minor) => write!(f, "OPENQASM {}.{minor};", self.major)?,
            None => write!(f, "OPENQASM {};", self.major)?,
        }
        Ok(())
    }
}

/// A reference to a whole register (`q`) or a single bit of it (`q[0]`).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Argument {
    pub register: String,
    pub index: Option<u64>,
}

impl Argument {
    pub fn register(name: impl Into<String>) -> Self {
        Self {
            register: name.into(),
            index: None,
        }
    }

    pub fn bit(name: impl Into<String>, index: u64) -> Self {
        Self {
            register: name.into(),
            index: Some(index),
        }
    }
}

impl ToQasm for Argument {
    fn write(&self, f: &mut impl fmt::Write, _fall_back_to_debug: bool) -> ToQasmResult<()> {
        match self.index {
            Some(index) => write!(f, "{}[{index}]", self.register)?,
            None => write!(f, "{}", self.register)?,
        }
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display)]
pub enum RegisterKind {
    #[strum(serialize = "qreg")]
    Quantum,
    #[strum(serialize = "creg")]
    Classical,
}

/// A `qreg` or `creg` declaration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RegisterDeclaration {
    pub kind: RegisterKind,
    pub name: String,
    pub size: u64,
}

impl ToQasm for RegisterDeclaration {
    fn write(&self, f: &mut impl fmt::Write, _fall_back_to_debug: bool) -> ToQasmResult<()> {
        write!(f, "{} {}[{}];", self.kind, self.name, self.size)?;
        Ok(())
    }
}

/// The application of a gate, `name(parameters) arguments;`.
///
/// The built-in gates are named `U` and `CX`.
#[derive(Clone, Debug, PartialEq)]
pub struct GateCall {
    pub name: String,
    pub parameters: Vec<Expression>,
    pub arguments: Vec<Argument>,
}

impl ToQasm for GateCall {
    fn write(&self, f: &mut impl fmt::Write, fall_back_to_debug: bool) -> ToQasmResult<()> {
        write!(f, "{}", self.name)?;
        if !self.parameters.is_empty() {
            write!(f, "(")?;
            write_join_qasm(f, fall_back_to_debug, &self.parameters, ",")?;
            write!(f, ")")?;
        }
        write!(f, " ")?;
        write_join_qasm(f, fall_back_to_debug, &self.arguments, ",")?;
        write!(f, ";")?;
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Measure {
    pub qubit: Argument,
    pub target: Argument,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Reset {
    pub qubit: Argument,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Barrier {
    pub arguments: Vec<Argument>,
}

impl ToQasm for Barrier {
    fn write(&self, f: &mut impl fmt::Write, fall_back_to_debug: bool) -> ToQasmResult<()> {
        write!(f, "barrier ")?;
        write_join_qasm(f, fall_back_to_debug, &self.arguments, ",")?;
        write!(f, ";")?;
        Ok(())
    }
}

/// An operation which may be the subject of an `if` statement.
#[derive(Clone, Debug, PartialEq)]
pub enum QuantumOperation {
    Gate(GateCall),
    Measure(Measure),
    Reset(Reset),
}

impl ToQasm for QuantumOperation {
    fn write(&self, f: &mut impl fmt::Write, fall_back_to_debug: bool) -> ToQasmResult<()> {
        match self {
            Self::Gate(call) => call.write(f, fall_back_to_debug),
            Self::Measure(Measure { qubit, target }) => {
                write!(f, "measure ")?;
                qubit.write(f, fall_back_to_debug)?;
                write!(f, " -> ")?;
                target.write(f, fall_back_to_debug)?;
                write!(f, ";")?;
                Ok(())
            }
            Self::Reset(Reset { qubit }) => {
                write!(f, "reset ")?;
                qubit.write(f, fall_back_to_debug)?;
                write!(f, ";")?;
                Ok(())
            }
        }
    }
}

/// `if (register == value) operation`
#[derive(Clone, Debug, PartialEq)]
pub struct Conditional {
    pub register: String,
    pub value: u64,
    pub operation: QuantumOperation,
}

/// A statement inside a `gate` body.
#[derive(Clone, Debug, PartialEq)]
pub enum GateBodyStatement {
    Gate(GateCall),
    Barrier(Barrier),
}

impl ToQasm for GateBodyStatement {
    fn write(&self, f: &mut impl fmt::Write, fall_back_to_debug: bool) -> ToQasmResult<()> {
        match self {
            Self::Gate(call) => call.write(f, fall_back_to_debug),
            Self::Barrier(barrier) => barrier.write(f, fall_back_to_debug),
        }
    }
}

/// `gate name(parameters) qubits { body }`
#[derive(Clone, Debug, PartialEq)]
pub struct GateDefinition {
    pub name: String,
    pub parameters: Vec<String>,
    pub qubits: Vec<String>,
    pub body: Vec<GateBodyStatement>,
}

/// `opaque name(parameters) qubits;`
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OpaqueDefinition {
    pub name: String,
    pub parameters: Vec<String>,
    pub qubits: Vec<String>,
}

fn write_signature(
    f: &mut impl fmt::Write,
    keyword: &str,
    name: &str,
    parameters: &[String],
    qubits: &[String],
) -> ToQasmResult<()> {
    write!(f, "{keyword} {name}")?;
    if !parameters.is_empty() {
        write!(f, "({})", parameters.join(","))?;
    }
    write!(f, " {}", qubits.join(","))?;
    Ok(())
}

impl ToQasm for GateDefinition {
    fn write(&self, f: &mut impl fmt::Write, fall_back_to_debug: bool) -> ToQasmResult<()> {
        write_signature(f, "gate", &self.name, &self.parameters, &self.qubits)?;
        if self.body.is_empty() {
            write!(f, " {{ }}")?;
            return Ok(());
        }
        writeln!(f, " {{")?;
        for statement in &self.body {
            write!(f, "  ")?;
            statement.write(f, fall_back_to_debug)?;
            writeln!(f)?;
        }
        write!(f, "}}")?;
        Ok(())
    }
}

impl ToQasm for OpaqueDefinition {
    fn write(&self, f: &mut impl fmt::Write, _fall_back_to_debug: bool) -> ToQasmResult<()> {
        write_signature(f, "opaque", &self.name, &self.parameters, &self.qubits)?;
        write!(f, ";")?;
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Statement {
    Include(String),
    Register(RegisterDeclaration),
    GateDefinition(GateDefinition),
    OpaqueDefinition(OpaqueDefinition),
    Operation(QuantumOperation),
    Conditional(Conditional),
    Barrier(Barrier),
}

impl ToQasm for Statement {
    fn write(&self, f: &mut impl fmt::Write, fall_back_to_debug: bool) -> ToQasmResult<()> {
        match self {
            Self::Include(path) => {
                if path.contains('"') {
                    return Err(ToQasmError::UnsupportedOperation(format!(
                        "include of a path containing a quote: {path}"
                    )));
                }
                write!(f, "include \"{path}\";")?;
                Ok(())
            }
            Self::Register(declaration) => declaration.write(f, fall_back_to_debug),
            Self::GateDefinition(definition) => definition.write(f, fall_back_to_debug),
            Self::OpaqueDefinition(definition) => definition.write(f, fall_back_to_debug),
            Self::Operation(operation) => operation.write(f, fall_back_to_debug),
            Self::Conditional(Conditional {
                register,
                value,
                operation,
            }) => {
                write!(f, "if({register}=={value}) ")?;
                operation.write(f, fall_back_to_debug)
            }
            Self::Barrier(barrier) => barrier.write(f, fall_back_to_debug),
        }
    }
}

/// A [`Statement`] along with where it began in its source.
#[derive(Clone, Debug, PartialEq)]
pub struct StatementWithLocation {
    pub statement: Statement,
    pub location: SourceLocation,
}

impl ToQasm for StatementWithLocation {
    fn write(&self, f: &mut impl fmt::Write, fall_back_to_debug: bool) -> ToQasmResult<()> {
        self.statement.write(f, fall_back_to_debug)
    }
}
