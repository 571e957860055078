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

//! Checking the meaning of a parsed program and lowering it into a [`Circuit`].

use std::{
    collections::{HashMap, HashSet},
    fs,
    path::{Path, PathBuf},
};

use itertools::Itertools;
use tracing::{debug, trace};

use crate::{
    circuit::{Circuit, CircuitInstruction, GateBody, GateSignature, Operation},
    expression::{CustomFunctions, EvaluationError, Expression, ExpressionFunction},
    program::{
        Argument, Barrier, Conditional, GateBodyStatement, GateCall, GateDefinition, Measure,
        OpaqueDefinition, Program, QuantumOperation, RegisterDeclaration, RegisterKind, Reset,
        SourceLocation, Statement,
    },
};

use super::{
    error::{LoadError, SemanticErrorKind},
    include::{resolve, search_path},
    qelib1::{QELIB1, QELIB1_NAME},
    CustomInstruction, LoadOptions,
};

type SemanticResult<T> = Result<T, SemanticErrorKind>;

/// An argument resolved to circuit bit indices.
#[derive(Clone, Debug)]
enum Bits {
    Single(usize),
    Register(Vec<usize>),
}

/// The numbers of parameters and qubits a gate takes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Arity {
    params: usize,
    qubits: usize,
}

pub(crate) struct Lowerer<'o> {
    options: &'o LoadOptions,
    search_path: Vec<PathBuf>,
    custom_instructions: HashMap<&'o str, &'o CustomInstruction>,
    /// Files currently being lowered, outermost first, to detect include cycles.
    include_stack: Vec<PathBuf>,
    circuit: Circuit,
}

impl<'o> Lowerer<'o> {
    pub(crate) fn new(
        options: &'o LoadOptions,
        input_directory: Option<&Path>,
    ) -> Result<Self, LoadError> {
        let mut functions = CustomFunctions::new();
        for function in &options.custom_classical {
            if ExpressionFunction::builtin(&function.name).is_some() {
                return Err(LoadError::InvalidOptions(format!(
                    "custom classical function '{}' shadows a built-in function",
                    function.name
                )));
            }
            if functions
                .insert(function.name.clone(), function.clone())
                .is_some()
            {
                return Err(LoadError::InvalidOptions(format!(
                    "custom classical function '{}' is given more than once",
                    function.name
                )));
            }
        }

        let mut custom_instructions = HashMap::new();
        for instruction in &options.custom_instructions {
            if instruction.name == "U" || instruction.name == "CX" {
                return Err(LoadError::InvalidOptions(format!(
                    "custom instruction '{}' would replace a built-in gate",
                    instruction.name
                )));
            }
            if custom_instructions
                .insert(instruction.name.as_str(), instruction)
                .is_some()
            {
                return Err(LoadError::InvalidOptions(format!(
                    "custom instruction '{}' is given more than once",
                    instruction.name
                )));
            }
        }

        let mut circuit = Circuit::new();
        circuit.functions = functions;
        for instruction in options.custom_instructions.iter().filter(|i| i.builtin) {
            circuit.define_gate(GateSignature {
                name: instruction.name.clone(),
                parameters: (0..instruction.num_params)
                    .map(|index| format!("p{index}"))
                    .collect(),
                qubits: (0..instruction.num_qubits)
                    .map(|index| format!("q{index}"))
                    .collect(),
                body: GateBody::Custom,
                standard: false,
            });
        }

        Ok(Self {
            options,
            search_path: search_path(options, input_directory),
            custom_instructions,
            include_stack: Vec::new(),
            circuit,
        })
    }

    /// Lower a top-level program. `path` is the file it was read from, if any.
    pub(crate) fn run(
        mut self,
        source: &str,
        file: &str,
        path: Option<&Path>,
    ) -> Result<Circuit, LoadError> {
        let program =
            Program::parse(source, self.options.strict).map_err(|source| LoadError::Syntax {
                file: file.to_owned(),
                source,
            })?;
        if let Some(path) = path {
            self.include_stack.push(canonical(path));
        }
        self.lower_program(program, file, false)?;
        debug!(
            file,
            qubits = self.circuit.num_qubits(),
            clbits = self.circuit.num_clbits(),
            instructions = self.circuit.instructions().len(),
            "loaded OpenQASM 2 program"
        );
        Ok(self.circuit)
    }

    fn lower_program(
        &mut self,
        program: Program,
        file: &str,
        standard: bool,
    ) -> Result<(), LoadError> {
        debug!(file, statements = program.statements.len(), "lowering program");
        for statement in program.statements {
            let location = statement.location;
            trace!(file, line = location.line, "lowering statement");
            let semantic_error = |kind| LoadError::Semantic {
                file: file.to_owned(),
                location,
                kind,
            };
            match statement.statement {
                Statement::Include(name) => self.include(&name, file, location)?,
                Statement::Register(declaration) => self
                    .declare_register(declaration)
                    .map_err(semantic_error)?,
                Statement::GateDefinition(definition) => self
                    .define_gate(definition, standard)
                    .map_err(semantic_error)?,
                Statement::OpaqueDefinition(definition) => self
                    .declare_opaque(definition, standard)
                    .map_err(semantic_error)?,
                Statement::Operation(operation) => {
                    self.apply(operation, None).map_err(semantic_error)?
                }
                Statement::Conditional(conditional) => {
                    self.apply_conditional(conditional).map_err(semantic_error)?
                }
                Statement::Barrier(barrier) => self.barrier(barrier).map_err(semantic_error)?,
            }
        }
        Ok(())
    }

    fn include(
        &mut self,
        name: &str,
        file: &str,
        location: SourceLocation,
    ) -> Result<(), LoadError> {
        let semantic_error = |kind| LoadError::Semantic {
            file: file.to_owned(),
            location,
            kind,
        };

        if name == QELIB1_NAME {
            debug!("including the embedded standard library");
            let program = Program::parse_included(QELIB1, false).map_err(|source| {
                LoadError::Syntax {
                    file: QELIB1_NAME.to_owned(),
                    source,
                }
            })?;
            return self.lower_program(program, QELIB1_NAME, true);
        }

        let path = resolve(name, &self.search_path)
            .ok_or_else(|| semantic_error(SemanticErrorKind::IncludeNotFound(name.to_owned())))?;
        let canonical_path = canonical(&path);
        if self.include_stack.contains(&canonical_path) {
            return Err(semantic_error(SemanticErrorKind::IncludeCycle(
                name.to_owned(),
            )));
        }

        let source = fs::read_to_string(&path).map_err(|source| LoadError::Io {
            path: path.clone(),
            source,
        })?;
        let included_file = path.display().to_string();
        let program = Program::parse_included(&source, self.options.strict).map_err(|source| {
            LoadError::Syntax {
                file: included_file.clone(),
                source,
            }
        })?;

        self.include_stack.push(canonical_path);
        let result = self.lower_program(program, &included_file, false);
        self.include_stack.pop();
        result
    }

    fn is_defined(&self, name: &str) -> bool {
        self.circuit.qreg(name).is_some()
            || self.circuit.creg(name).is_some()
            || self.circuit.gate(name).is_some()
    }

    fn declare_register(&mut self, declaration: RegisterDeclaration) -> SemanticResult<()> {
        if self.is_defined(&declaration.name) {
            return Err(SemanticErrorKind::AlreadyDefined(declaration.name));
        }
        let size = declaration.size as usize;
        let added = match declaration.kind {
            RegisterKind::Quantum => self.circuit.add_qreg(declaration.name.clone(), size),
            RegisterKind::Classical => self.circuit.add_creg(declaration.name.clone(), size),
        };
        added
            .map(|_| ())
            .map_err(|_| SemanticErrorKind::AlreadyDefined(declaration.name))
    }

    /// Check the names in a `gate` or `opaque` signature, and decide whether a custom instruction
    /// takes its place. Returns `None` if the definition should be skipped entirely.
    fn check_signature(
        &self,
        name: &str,
        parameters: &[String],
        qubits: &[String],
    ) -> SemanticResult<Option<Option<&'o CustomInstruction>>> {
        if let Some(duplicate) = parameters.iter().chain(qubits).duplicates().next() {
            return Err(SemanticErrorKind::DuplicateName(duplicate.clone()));
        }

        let custom = self.custom_instructions.get(name).copied();
        if let Some(custom) = custom {
            if custom.num_params != parameters.len() || custom.num_qubits != qubits.len() {
                return Err(SemanticErrorKind::CustomSignatureMismatch {
                    name: name.to_owned(),
                    expected_params: custom.num_params,
                    expected_qubits: custom.num_qubits,
                    found_params: parameters.len(),
                    found_qubits: qubits.len(),
                });
            }
            if custom.builtin {
                return Ok(None);
            }
        }

        if self.is_defined(name) {
            return Err(SemanticErrorKind::AlreadyDefined(name.to_owned()));
        }
        Ok(Some(custom))
    }

    fn define_gate(&mut self, definition: GateDefinition, standard: bool) -> SemanticResult<()> {
        let GateDefinition {
            name,
            parameters,
            qubits,
            body,
        } = definition;
        let body = match self.check_signature(&name, &parameters, &qubits)? {
            None => return Ok(()),
            Some(Some(_)) => GateBody::Custom,
            Some(None) => {
                for statement in &body {
                    self.check_body_statement(statement, &parameters, &qubits)?;
                }
                GateBody::Defined(body)
            }
        };
        self.circuit.define_gate(GateSignature {
            name,
            parameters,
            qubits,
            body,
            standard,
        });
        Ok(())
    }

    fn declare_opaque(
        &mut self,
        definition: OpaqueDefinition,
        standard: bool,
    ) -> SemanticResult<()> {
        let OpaqueDefinition {
            name,
            parameters,
            qubits,
        } = definition;
        let body = match self.check_signature(&name, &parameters, &qubits)? {
            None => return Ok(()),
            Some(Some(_)) => GateBody::Custom,
            Some(None) => GateBody::Opaque,
        };
        self.circuit.define_gate(GateSignature {
            name,
            parameters,
            qubits,
            body,
            standard,
        });
        Ok(())
    }

    /// The arity of a gate which may be applied, or why it may not.
    fn gate_arity(&self, name: &str) -> SemanticResult<Arity> {
        match name {
            "U" => Ok(Arity {
                params: 3,
                qubits: 1,
            }),
            "CX" => Ok(Arity {
                params: 0,
                qubits: 2,
            }),
            _ => match self.circuit.gate(name) {
                Some(signature) => Ok(Arity {
                    params: signature.num_params(),
                    qubits: signature.num_qubits(),
                }),
                None if self.is_defined(name) => {
                    Err(SemanticErrorKind::NotAGate(name.to_owned()))
                }
                None => Err(SemanticErrorKind::Undefined(name.to_owned())),
            },
        }
    }

    fn check_call_arity(&self, call: &GateCall) -> SemanticResult<()> {
        let arity = self.gate_arity(&call.name)?;
        if arity.params != call.parameters.len() {
            return Err(SemanticErrorKind::ParameterCount {
                name: call.name.clone(),
                expected: arity.params,
                found: call.parameters.len(),
            });
        }
        if arity.qubits != call.arguments.len() {
            return Err(SemanticErrorKind::QubitCount {
                name: call.name.clone(),
                expected: arity.qubits,
                found: call.arguments.len(),
            });
        }
        Ok(())
    }

    /// Check that every function an expression calls exists and is given the right number of
    /// arguments.
    fn check_functions(&self, expression: &Expression) -> SemanticResult<()> {
        for (function, found) in expression.function_calls() {
            let expected = match function {
                ExpressionFunction::Custom(name) => self
                    .circuit
                    .functions
                    .get(name)
                    .map(|custom| custom.num_params)
                    .ok_or_else(|| SemanticErrorKind::Undefined(name.clone()))?,
                _ => 1,
            };
            if expected != found {
                return Err(EvaluationError::ArgumentCount {
                    function: function.to_string(),
                    expected,
                    found,
                }
                .into());
            }
        }
        Ok(())
    }

    fn check_body_statement(
        &self,
        statement: &GateBodyStatement,
        parameters: &[String],
        qubits: &[String],
    ) -> SemanticResult<()> {
        let arguments = match statement {
            GateBodyStatement::Gate(call) => {
                self.check_call_arity(call)?;
                for expression in &call.parameters {
                    self.check_functions(expression)?;
                    if let Some(unknown) = expression
                        .parameters()
                        .into_iter()
                        .find(|&name| !parameters.iter().any(|parameter| parameter == name))
                    {
                        return Err(SemanticErrorKind::Undefined(unknown.to_owned()));
                    }
                }
                &call.arguments
            }
            GateBodyStatement::Barrier(Barrier { arguments }) => arguments,
        };

        if let Some(unknown) = arguments
            .iter()
            .find(|argument| !qubits.contains(&argument.register))
        {
            return Err(SemanticErrorKind::Undefined(unknown.register.clone()));
        }
        if let GateBodyStatement::Gate(_) = statement {
            if let Some(duplicate) = arguments
                .iter()
                .map(|argument| &argument.register)
                .duplicates()
                .next()
            {
                return Err(SemanticErrorKind::DuplicateQubit(duplicate.clone()));
            }
        }
        Ok(())
    }

    fn resolve(&self, argument: &Argument, kind: RegisterKind) -> SemanticResult<Bits> {
        let register = match kind {
            RegisterKind::Quantum => self.circuit.qreg(&argument.register),
            RegisterKind::Classical => self.circuit.creg(&argument.register),
        };
        let register = match register {
            Some(register) => register,
            None if self.is_defined(&argument.register) => {
                return Err(match kind {
                    RegisterKind::Quantum => {
                        SemanticErrorKind::NotAQuantumRegister(argument.register.clone())
                    }
                    RegisterKind::Classical => {
                        SemanticErrorKind::NotAClassicalRegister(argument.register.clone())
                    }
                })
            }
            None => return Err(SemanticErrorKind::Undefined(argument.register.clone())),
        };
        match argument.index {
            None => Ok(Bits::Register(register.bits().collect())),
            Some(index) if index < register.size as u64 => {
                Ok(Bits::Single(register.start + index as usize))
            }
            Some(index) => Err(SemanticErrorKind::IndexOutOfRange {
                register: register.name.clone(),
                index,
                size: register.size as u64,
            }),
        }
    }

    fn qubit_name(&self, qubit: usize) -> String {
        match self.circuit.qubit_location(qubit) {
            Some((register, index)) => format!("{register}[{index}]"),
            None => qubit.to_string(),
        }
    }

    fn push(&mut self, instruction: CircuitInstruction) -> SemanticResult<()> {
        let qubit = instruction.qubits.iter().duplicates().next().copied();
        if let Some(qubit) = qubit {
            return Err(SemanticErrorKind::DuplicateQubit(self.qubit_name(qubit)));
        }
        // Every index was resolved against a declared register.
        self.circuit
            .append(instruction)
            .map_err(|err| SemanticErrorKind::Undefined(err.to_string()))
    }

    fn evaluate(&self, expression: &Expression) -> SemanticResult<f64> {
        if let Some(parameter) = expression.parameters().into_iter().next() {
            return Err(SemanticErrorKind::NonConstantExpression(parameter.to_owned()));
        }
        self.check_functions(expression)?;
        Ok(expression.evaluate(&HashMap::new(), &self.circuit.functions)?)
    }

    fn apply_conditional(&mut self, conditional: Conditional) -> SemanticResult<()> {
        let Conditional {
            register,
            value,
            operation,
        } = conditional;
        self.resolve(&Argument::register(register.clone()), RegisterKind::Classical)?;
        self.apply(operation, Some((register, value)))
    }

    fn apply(
        &mut self,
        operation: QuantumOperation,
        condition: Option<(String, u64)>,
    ) -> SemanticResult<()> {
        let instructions = match operation {
            QuantumOperation::Gate(call) => {
                self.check_call_arity(&call)?;
                let params = call
                    .parameters
                    .iter()
                    .map(|expression| self.evaluate(expression))
                    .collect::<SemanticResult<Vec<_>>>()?;
                let arguments = call
                    .arguments
                    .iter()
                    .map(|argument| self.resolve(argument, RegisterKind::Quantum))
                    .collect::<SemanticResult<Vec<_>>>()?;
                broadcast(&arguments)?
                    .into_iter()
                    .map(|qubits| CircuitInstruction::gate(call.name.clone(), params.clone(), qubits))
                    .collect::<Vec<_>>()
            }
            QuantumOperation::Measure(Measure { qubit, target }) => {
                let qubits = self.resolve(&qubit, RegisterKind::Quantum)?;
                let clbits = self.resolve(&target, RegisterKind::Classical)?;
                let pairs = match (qubits, clbits) {
                    (Bits::Single(qubit), Bits::Single(clbit)) => vec![(qubit, clbit)],
                    (Bits::Register(qubits), Bits::Register(clbits)) => {
                        if qubits.len() != clbits.len() {
                            return Err(SemanticErrorKind::MismatchedBroadcast(
                                qubits.len() as u64,
                                clbits.len() as u64,
                            ));
                        }
                        qubits.into_iter().zip(clbits).collect()
                    }
                    _ => return Err(SemanticErrorKind::MixedMeasure),
                };
                pairs
                    .into_iter()
                    .map(|(qubit, clbit)| {
                        CircuitInstruction::new(Operation::Measure, vec![qubit], vec![clbit])
                    })
                    .collect()
            }
            QuantumOperation::Reset(Reset { qubit }) => {
                let qubits = match self.resolve(&qubit, RegisterKind::Quantum)? {
                    Bits::Single(qubit) => vec![qubit],
                    Bits::Register(qubits) => qubits,
                };
                qubits
                    .into_iter()
                    .map(|qubit| CircuitInstruction::new(Operation::Reset, vec![qubit], vec![]))
                    .collect()
            }
        };

        for mut instruction in instructions {
            if let Some((register, value)) = &condition {
                instruction = instruction.with_condition(register.clone(), *value);
            }
            self.push(instruction)?;
        }
        Ok(())
    }

    fn barrier(&mut self, barrier: Barrier) -> SemanticResult<()> {
        let mut qubits = Vec::new();
        for argument in &barrier.arguments {
            match self.resolve(argument, RegisterKind::Quantum)? {
                Bits::Single(qubit) => qubits.push(qubit),
                Bits::Register(bits) => qubits.extend(bits),
            }
        }
        let mut seen = HashSet::new();
        qubits.retain(|qubit| seen.insert(*qubit));
        self.push(CircuitInstruction::new(Operation::Barrier, qubits, vec![]))
    }
}

/// Expand register arguments element-wise, repeating single bits, into the bits of each
/// resulting instruction.
fn broadcast(arguments: &[Bits]) -> SemanticResult<Vec<Vec<usize>>> {
    let mut size: Option<usize> = None;
    for argument in arguments {
        if let Bits::Register(bits) = argument {
            match size {
                None => size = Some(bits.len()),
                Some(size) if size != bits.len() => {
                    return Err(SemanticErrorKind::MismatchedBroadcast(
                        size as u64,
                        bits.len() as u64,
                    ))
                }
                Some(_) => {}
            }
        }
    }

    let instance = |index: usize| {
        arguments
            .iter()
            .map(|argument| match argument {
                Bits::Single(bit) => *bit,
                Bits::Register(bits) => bits[index],
            })
            .collect::<Vec<_>>()
    };
    Ok(match size {
        None => vec![instance(0)],
        Some(size) => (0..size).map(instance).collect(),
    })
}

fn canonical(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}
