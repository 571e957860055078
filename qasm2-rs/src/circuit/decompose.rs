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

use std::collections::HashMap;

use crate::{
    expression::EvaluationError,
    program::{Argument, GateBodyStatement},
};

use super::{Circuit, CircuitInstruction, Gate, GateBody, Operation};

impl Circuit {
    /// Expand every application of a gate defined by a `gate` statement into the gates of its
    /// body, recursively, so that only `U`, `CX`, opaque, and custom gates remain.
    pub fn decompose(&self) -> Result<Circuit, EvaluationError> {
        let mut decomposed = self.copy_empty_like();
        for instruction in &self.instructions {
            self.expand_into(instruction, &mut decomposed.instructions)?;
        }
        Ok(decomposed)
    }

    fn expand_into(
        &self,
        instruction: &CircuitInstruction,
        output: &mut Vec<CircuitInstruction>,
    ) -> Result<(), EvaluationError> {
        let (gate, body, signature) = match &instruction.operation {
            Operation::Gate(gate) => match self.gates.get(&gate.name) {
                Some(signature) => match &signature.body {
                    GateBody::Defined(body) => (gate, body, signature),
                    GateBody::Opaque | GateBody::Custom => {
                        output.push(instruction.clone());
                        return Ok(());
                    }
                },
                None => {
                    output.push(instruction.clone());
                    return Ok(());
                }
            },
            _ => {
                output.push(instruction.clone());
                return Ok(());
            }
        };

        let bindings: HashMap<String, f64> = signature
            .parameters
            .iter()
            .cloned()
            .zip(gate.params.iter().copied())
            .collect();
        let qubits: HashMap<&str, usize> = signature
            .qubits
            .iter()
            .map(String::as_str)
            .zip(instruction.qubits.iter().copied())
            .collect();
        let map_qubits = |arguments: &[Argument]| {
            arguments
                .iter()
                .filter_map(|argument| qubits.get(argument.register.as_str()).copied())
                .collect::<Vec<_>>()
        };

        for statement in body {
            match statement {
                GateBodyStatement::Gate(call) => {
                    let params = call
                        .parameters
                        .iter()
                        .map(|parameter| parameter.evaluate(&bindings, &self.functions))
                        .collect::<Result<Vec<_>, _>>()?;
                    let inner = CircuitInstruction {
                        operation: Operation::Gate(Gate::new(call.name.clone(), params)),
                        qubits: map_qubits(&call.arguments),
                        clbits: vec![],
                        condition: instruction.condition.clone(),
                        duration: None,
                    };
                    self.expand_into(&inner, output)?;
                }
                GateBodyStatement::Barrier(barrier) => output.push(CircuitInstruction::new(
                    Operation::Barrier,
                    map_qubits(&barrier.arguments),
                    vec![],
                )),
            }
        }
        Ok(())
    }
}
