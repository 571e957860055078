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

//! A quantum circuit: registers, gate definitions, and a flat list of instructions on numbered
//! qubits and classical bits.
//!
//! This is the result of [loading](crate::loader) an OpenQASM 2 program, but may also be built
//! directly.

use std::ops::Range;

use indexmap::IndexMap;
use itertools::Itertools;

use crate::{
    expression::CustomFunctions,
    program::GateBodyStatement,
    pulse::Schedule,
    units::Duration,
};

mod decompose;
mod export;

pub use export::ExportError;

#[derive(Debug, PartialEq, thiserror::Error)]
pub enum CircuitError {
    #[error("a register named '{0}' already exists")]
    DuplicateRegister(String),
    #[error("qubit {index} is out of range for a circuit of {num_qubits} qubit(s)")]
    QubitOutOfRange { index: usize, num_qubits: usize },
    #[error("clbit {index} is out of range for a circuit of {num_clbits} clbit(s)")]
    ClbitOutOfRange { index: usize, num_clbits: usize },
    #[error("there is no classical register named '{0}'")]
    UnknownClassicalRegister(String),
    #[error("qubit {0} appears more than once in a single instruction")]
    DuplicateQubit(usize),
}

/// A named, contiguous range of qubits or clbits.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Register {
    pub name: String,
    pub size: usize,
    /// The index of the register's first bit within the circuit.
    pub start: usize,
}

impl Register {
    /// The circuit indices of this register's bits.
    pub fn bits(&self) -> Range<usize> {
        self.start..self.start + self.size
    }

    pub fn contains(&self, bit: usize) -> bool {
        self.bits().contains(&bit)
    }
}

/// The application of a named gate with evaluated parameters.
#[derive(Clone, Debug, PartialEq)]
pub struct Gate {
    pub name: String,
    pub params: Vec<f64>,
}

impl Gate {
    pub fn new(name: impl Into<String>, params: Vec<f64>) -> Self {
        Self {
            name: name.into(),
            params,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Operation {
    Gate(Gate),
    Measure,
    Reset,
    Barrier,
    Delay(Duration),
}

impl Operation {
    pub fn name(&self) -> &str {
        match self {
            Operation::Gate(gate) => &gate.name,
            Operation::Measure => "measure",
            Operation::Reset => "reset",
            Operation::Barrier => "barrier",
            Operation::Delay(_) => "delay",
        }
    }
}

/// `if (register == value)`
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Condition {
    pub register: String,
    pub value: u64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct CircuitInstruction {
    pub operation: Operation,
    pub qubits: Vec<usize>,
    pub clbits: Vec<usize>,
    pub condition: Option<Condition>,
    /// How long the instruction takes, once known; see
    /// [`TimeUnitConversion`](crate::scheduling::TimeUnitConversion).
    pub duration: Option<Duration>,
}

impl CircuitInstruction {
    pub fn new(operation: Operation, qubits: Vec<usize>, clbits: Vec<usize>) -> Self {
        Self {
            operation,
            qubits,
            clbits,
            condition: None,
            duration: None,
        }
    }

    pub fn gate(name: impl Into<String>, params: Vec<f64>, qubits: Vec<usize>) -> Self {
        Self::new(Operation::Gate(Gate::new(name, params)), qubits, vec![])
    }

    pub fn with_condition(mut self, register: impl Into<String>, value: u64) -> Self {
        self.condition = Some(Condition {
            register: register.into(),
            value,
        });
        self
    }
}

/// How a gate known to a circuit is implemented.
#[derive(Clone, Debug, PartialEq)]
pub enum GateBody {
    /// Defined by a `gate` statement in terms of other gates.
    Defined(Vec<GateBodyStatement>),
    /// Declared by an `opaque` statement.
    Opaque,
    /// Supplied by the user of the loader as a custom instruction.
    Custom,
}

/// A gate known to a circuit, other than the built-in `U` and `CX`.
#[derive(Clone, Debug, PartialEq)]
pub struct GateSignature {
    pub name: String,
    pub parameters: Vec<String>,
    pub qubits: Vec<String>,
    pub body: GateBody,
    /// Whether the gate came from the `qelib1.inc` standard library.
    pub standard: bool,
}

impl GateSignature {
    pub fn num_params(&self) -> usize {
        self.parameters.len()
    }

    pub fn num_qubits(&self) -> usize {
        self.qubits.len()
    }
}

/// A pulse schedule which implements one gate on particular qubits with particular parameters.
#[derive(Clone, Debug, PartialEq)]
pub struct Calibration {
    pub gate: String,
    pub qubits: Vec<usize>,
    pub params: Vec<f64>,
    pub schedule: Schedule,
}

impl Calibration {
    fn matches(&self, gate: &str, qubits: &[usize], params: &[f64]) -> bool {
        self.gate == gate && self.qubits == qubits && self.params == params
    }
}

#[derive(Clone, Debug, Default)]
pub struct Circuit {
    qregs: Vec<Register>,
    cregs: Vec<Register>,
    gates: IndexMap<String, GateSignature>,
    instructions: Vec<CircuitInstruction>,
    calibrations: Vec<Calibration>,
    /// Classical functions which gate bodies may call, needed to expand those bodies.
    pub(crate) functions: CustomFunctions,
}

impl PartialEq for Circuit {
    fn eq(&self, other: &Self) -> bool {
        self.qregs == other.qregs
            && self.cregs == other.cregs
            && self.gates == other.gates
            && self.instructions == other.instructions
            && self.calibrations == other.calibrations
    }
}

impl Circuit {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a quantum register of `size` qubits after all existing qubits.
    pub fn add_qreg(&mut self, name: impl Into<String>, size: usize) -> Result<&Register, CircuitError> {
        let name = name.into();
        self.check_register_name(&name)?;
        let start = self.num_qubits();
        self.qregs.push(Register { name, size, start });
        Ok(&self.qregs[self.qregs.len() - 1])
    }

    /// Add a classical register of `size` bits after all existing clbits.
    pub fn add_creg(&mut self, name: impl Into<String>, size: usize) -> Result<&Register, CircuitError> {
        let name = name.into();
        self.check_register_name(&name)?;
        let start = self.num_clbits();
        self.cregs.push(Register { name, size, start });
        Ok(&self.cregs[self.cregs.len() - 1])
    }

    fn check_register_name(&self, name: &str) -> Result<(), CircuitError> {
        if self.qreg(name).is_some() || self.creg(name).is_some() {
            Err(CircuitError::DuplicateRegister(name.to_owned()))
        } else {
            Ok(())
        }
    }

    /// Append an instruction, checking that the bits it refers to exist.
    pub fn append(&mut self, instruction: CircuitInstruction) -> Result<(), CircuitError> {
        let num_qubits = self.num_qubits();
        if let Some(&index) = instruction.qubits.iter().find(|&&qubit| qubit >= num_qubits) {
            return Err(CircuitError::QubitOutOfRange { index, num_qubits });
        }
        if let Some(&index) = instruction.qubits.iter().duplicates().next() {
            return Err(CircuitError::DuplicateQubit(index));
        }
        let num_clbits = self.num_clbits();
        if let Some(&index) = instruction.clbits.iter().find(|&&clbit| clbit >= num_clbits) {
            return Err(CircuitError::ClbitOutOfRange { index, num_clbits });
        }
        if let Some(condition) = &instruction.condition {
            if self.creg(&condition.register).is_none() {
                return Err(CircuitError::UnknownClassicalRegister(
                    condition.register.clone(),
                ));
            }
        }
        self.instructions.push(instruction);
        Ok(())
    }

    /// Append a delay of the given duration on each of `qubits`.
    pub fn delay(
        &mut self,
        duration: Duration,
        qubits: impl IntoIterator<Item = usize>,
    ) -> Result<(), CircuitError> {
        for qubit in qubits {
            self.append(CircuitInstruction::new(
                Operation::Delay(duration),
                vec![qubit],
                vec![],
            ))?;
        }
        Ok(())
    }

    pub(crate) fn define_gate(&mut self, signature: GateSignature) {
        self.gates.insert(signature.name.clone(), signature);
    }

    pub fn qregs(&self) -> &[Register] {
        &self.qregs
    }

    pub fn cregs(&self) -> &[Register] {
        &self.cregs
    }

    pub fn qreg(&self, name: &str) -> Option<&Register> {
        self.qregs.iter().find(|register| register.name == name)
    }

    pub fn creg(&self, name: &str) -> Option<&Register> {
        self.cregs.iter().find(|register| register.name == name)
    }

    /// The gates known to this circuit, in the order they were defined.
    pub fn gates(&self) -> &IndexMap<String, GateSignature> {
        &self.gates
    }

    pub fn gate(&self, name: &str) -> Option<&GateSignature> {
        self.gates.get(name)
    }

    pub fn instructions(&self) -> &[CircuitInstruction] {
        &self.instructions
    }

    pub(crate) fn instructions_mut(&mut self) -> &mut [CircuitInstruction] {
        &mut self.instructions
    }

    /// Register a pulse schedule implementing `gate` on `qubits` with `params`, replacing any
    /// calibration already registered for the same gate, qubits, and parameters.
    pub fn add_calibration(
        &mut self,
        gate: impl Into<String>,
        qubits: Vec<usize>,
        params: Vec<f64>,
        schedule: Schedule,
    ) -> Result<(), CircuitError> {
        let num_qubits = self.num_qubits();
        if let Some(&index) = qubits.iter().find(|&&qubit| qubit >= num_qubits) {
            return Err(CircuitError::QubitOutOfRange { index, num_qubits });
        }
        let gate = gate.into();
        match self
            .calibrations
            .iter_mut()
            .find(|calibration| calibration.matches(&gate, &qubits, &params))
        {
            Some(existing) => existing.schedule = schedule,
            None => self.calibrations.push(Calibration {
                gate,
                qubits,
                params,
                schedule,
            }),
        }
        Ok(())
    }

    pub fn calibrations(&self) -> &[Calibration] {
        &self.calibrations
    }

    /// The schedule calibrated for `gate` on exactly `qubits` with exactly `params`.
    pub fn calibration(&self, gate: &str, qubits: &[usize], params: &[f64]) -> Option<&Schedule> {
        self.calibrations
            .iter()
            .find(|calibration| calibration.matches(gate, qubits, params))
            .map(|calibration| &calibration.schedule)
    }

    /// The calibration for an instruction of this circuit, matched on its name, qubits, and
    /// any gate parameters.
    pub fn instruction_calibration(&self, instruction: &CircuitInstruction) -> Option<&Schedule> {
        let params: &[f64] = match &instruction.operation {
            Operation::Gate(gate) => gate.params.as_slice(),
            _ => &[],
        };
        self.calibration(instruction.operation.name(), &instruction.qubits, params)
    }

    /// A copy of this circuit with the same registers, gates, and calibrations, but no
    /// instructions.
    pub fn copy_empty_like(&self) -> Self {
        Self {
            qregs: self.qregs.clone(),
            cregs: self.cregs.clone(),
            gates: self.gates.clone(),
            instructions: Vec::new(),
            calibrations: self.calibrations.clone(),
            functions: self.functions.clone(),
        }
    }

    pub fn num_qubits(&self) -> usize {
        self.qregs.iter().map(|register| register.size).sum()
    }

    pub fn num_clbits(&self) -> usize {
        self.cregs.iter().map(|register| register.size).sum()
    }

    /// The register and offset within it of a qubit, such as `("q", 1)`.
    pub fn qubit_location(&self, qubit: usize) -> Option<(&str, usize)> {
        self.qregs
            .iter()
            .find(|register| register.contains(qubit))
            .map(|register| (register.name.as_str(), qubit - register.start))
    }

    /// The register and offset within it of a clbit.
    pub fn clbit_location(&self, clbit: usize) -> Option<(&str, usize)> {
        self.cregs
            .iter()
            .find(|register| register.contains(clbit))
            .map(|register| (register.name.as_str(), clbit - register.start))
    }

    /// The clbits an instruction depends on through its condition.
    pub fn condition_clbits(&self, instruction: &CircuitInstruction) -> Vec<usize> {
        instruction
            .condition
            .as_ref()
            .and_then(|condition| self.creg(&condition.register))
            .map(|register| register.bits().collect())
            .unwrap_or_default()
    }

    /// The number of each kind of operation, most frequent first.
    pub fn count_ops(&self) -> IndexMap<String, usize> {
        let mut counts: IndexMap<String, usize> = IndexMap::new();
        for instruction in &self.instructions {
            *counts
                .entry(instruction.operation.name().to_owned())
                .or_default() += 1;
        }
        counts.sort_by(|_, left, _, right| right.cmp(left));
        counts
    }

    /// The length of the longest path through the circuit, counting every operation but
    /// barriers. Conditions count as uses of their register's clbits.
    pub fn depth(&self) -> usize {
        let num_qubits = self.num_qubits();
        let mut levels = vec![0usize; num_qubits + self.num_clbits()];
        for instruction in &self.instructions {
            if instruction.operation == Operation::Barrier {
                continue;
            }
            let wires = instruction
                .qubits
                .iter()
                .copied()
                .chain(
                    instruction
                        .clbits
                        .iter()
                        .chain(self.condition_clbits(instruction).iter())
                        .map(|clbit| num_qubits + clbit),
                )
                .collect::<Vec<_>>();
            let level = wires.iter().map(|&wire| levels[wire]).max().unwrap_or(0) + 1;
            for wire in wires {
                levels[wire] = level;
            }
        }
        levels.into_iter().max().unwrap_or(0)
    }
}
