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

use std::{collections::HashSet, fmt::Write};

use indexmap::IndexMap;

use crate::{
    expression::format_angle,
    loader::qelib1,
    program::{GateBodyStatement, GateDefinition, OpaqueDefinition, RegisterDeclaration, RegisterKind},
    qasm::{ToQasm, ToQasmError},
};

use super::{Circuit, CircuitInstruction, GateBody, Operation};

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error(transparent)]
    Qasm(#[from] ToQasmError),
    #[error("OpenQASM 2 has no way to express the operation '{0}'")]
    Unsupported(String),
    #[error("bit {0} does not belong to any register")]
    UnregisteredBit(usize),
}

impl From<std::fmt::Error> for ExportError {
    fn from(err: std::fmt::Error) -> Self {
        Self::Qasm(err.into())
    }
}

impl Circuit {
    /// Export this circuit as an OpenQASM 2 program.
    ///
    /// Gates from the standard library are referenced by including `qelib1.inc`; gates defined
    /// by the program are written out again, and any other gate is declared `opaque`.
    pub fn dumps(&self) -> Result<String, ExportError> {
        let mut output = String::from("OPENQASM 2.0;\n");

        let mut include_standard = self.gates.values().any(|gate| gate.standard);
        let mut undeclared: IndexMap<&str, (usize, usize)> = IndexMap::new();
        for instruction in &self.instructions {
            if let Operation::Gate(gate) = &instruction.operation {
                if gate.name == "U" || gate.name == "CX" || self.gates.contains_key(&gate.name) {
                    continue;
                }
                if qelib1::is_standard_gate(&gate.name) {
                    include_standard = true;
                } else {
                    undeclared
                        .entry(gate.name.as_str())
                        .or_insert((gate.params.len(), instruction.qubits.len()));
                }
            }
        }
        if include_standard {
            output.push_str("include \"qelib1.inc\";\n");
        }

        // Custom instructions are only worth declaring if something refers to them.
        let mut referenced: HashSet<&str> = self
            .instructions
            .iter()
            .map(|instruction| instruction.operation.name())
            .collect();
        for signature in self.gates.values() {
            if let GateBody::Defined(body) = &signature.body {
                referenced.extend(body.iter().filter_map(|statement| match statement {
                    GateBodyStatement::Gate(call) => Some(call.name.as_str()),
                    GateBodyStatement::Barrier(_) => None,
                }));
            }
        }

        for signature in self.gates.values().filter(|gate| {
            !gate.standard
                && (gate.body != GateBody::Custom || referenced.contains(gate.name.as_str()))
        }) {
            match &signature.body {
                GateBody::Defined(body) => GateDefinition {
                    name: signature.name.clone(),
                    parameters: signature.parameters.clone(),
                    qubits: signature.qubits.clone(),
                    body: body.clone(),
                }
                .write(&mut output, false)?,
                GateBody::Opaque | GateBody::Custom => OpaqueDefinition {
                    name: signature.name.clone(),
                    parameters: signature.parameters.clone(),
                    qubits: signature.qubits.clone(),
                }
                .write(&mut output, false)?,
            }
            output.push('\n');
        }
        for (name, (num_params, num_qubits)) in undeclared {
            OpaqueDefinition {
                name: name.to_owned(),
                parameters: (0..num_params).map(|index| format!("p{index}")).collect(),
                qubits: (0..num_qubits).map(|index| format!("q{index}")).collect(),
            }
            .write(&mut output, false)?;
            output.push('\n');
        }

        for (kind, registers) in [
            (RegisterKind::Quantum, &self.qregs),
            (RegisterKind::Classical, &self.cregs),
        ] {
            for register in registers {
                RegisterDeclaration {
                    kind,
                    name: register.name.clone(),
                    size: register.size as u64,
                }
                .write(&mut output, false)?;
                output.push('\n');
            }
        }

        for instruction in &self.instructions {
            self.write_instruction(&mut output, instruction)?;
            output.push('\n');
        }
        Ok(output)
    }

    fn write_instruction(
        &self,
        output: &mut String,
        instruction: &CircuitInstruction,
    ) -> Result<(), ExportError> {
        let qubits = instruction
            .qubits
            .iter()
            .map(|&qubit| {
                self.qubit_location(qubit)
                    .map(|(register, index)| format!("{register}[{index}]"))
                    .ok_or(ExportError::UnregisteredBit(qubit))
            })
            .collect::<Result<Vec<_>, _>>()?;
        let clbits = instruction
            .clbits
            .iter()
            .map(|&clbit| {
                self.clbit_location(clbit)
                    .map(|(register, index)| format!("{register}[{index}]"))
                    .ok_or(ExportError::UnregisteredBit(clbit))
            })
            .collect::<Result<Vec<_>, _>>()?;

        if let Some(condition) = &instruction.condition {
            write!(output, "if({}=={}) ", condition.register, condition.value)?;
        }
        match &instruction.operation {
            Operation::Gate(gate) => {
                output.push_str(&gate.name);
                if !gate.params.is_empty() {
                    let params = gate
                        .params
                        .iter()
                        .map(|&param| format_angle(param))
                        .collect::<Result<Vec<_>, _>>()?;
                    write!(output, "({})", params.join(","))?;
                }
                write!(output, " {};", qubits.join(","))?;
            }
            Operation::Measure => {
                for (qubit, clbit) in qubits.iter().zip(clbits.iter()) {
                    write!(output, "measure {qubit} -> {clbit};")?;
                }
            }
            Operation::Reset => write!(output, "reset {};", qubits.join(","))?,
            Operation::Barrier => write!(output, "barrier {};", qubits.join(","))?,
            Operation::Delay(_) => return Err(ExportError::Unsupported("delay".to_owned())),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::f64::consts::PI;

    use pretty_assertions::assert_eq;

    use crate::circuit::{Circuit, CircuitInstruction, ExportError};
    use crate::loader::{loads, LoadOptions, LEGACY_CUSTOM_INSTRUCTIONS};
    use crate::units::{Duration, TimeUnit};

    #[test]
    fn dumps_loaded_program() {
        let circuit = loads(
            r#"OPENQASM 2.0;
include "qelib1.inc";
gate rot(theta) a { rz(theta) a; rx(-theta) a; }
opaque magic a, b;
qreg q[2];
creg c[2];
rot(pi/4) q;
magic q[0], q[1];
measure q -> c;
if (c == 2) x q[1];
"#,
            &LoadOptions::default(),
        )
        .unwrap();
        insta::assert_snapshot!(circuit.dumps().unwrap(), @r###"
        OPENQASM 2.0;
        include "qelib1.inc";
        gate rot(theta) a {
          rz(theta) a;
          rx(-theta) a;
        }
        opaque magic a,b;
        qreg q[2];
        creg c[2];
        rot(pi/4) q[0];
        rot(pi/4) q[1];
        magic q[0],q[1];
        measure q[0] -> c[0];
        measure q[1] -> c[1];
        if(c==2) x q[1];
        "###);
    }

    #[test]
    fn dumps_built_circuit() {
        let mut circuit = Circuit::new();
        circuit.add_qreg("q", 1).unwrap();
        circuit
            .append(CircuitInstruction::gate("rz", vec![PI / 2.0], vec![0]))
            .unwrap();
        circuit
            .append(CircuitInstruction::gate("mystery", vec![0.25], vec![0]))
            .unwrap();
        assert_eq!(
            circuit.dumps().unwrap(),
            "OPENQASM 2.0;\ninclude \"qelib1.inc\";\nopaque mystery(p0) q0;\nqreg q[1];\n\
             rz(pi/2) q[0];\nmystery(0.25) q[0];\n"
        );
    }

    #[test]
    fn delay_cannot_be_exported() {
        let mut circuit = Circuit::new();
        circuit.add_qreg("q", 1).unwrap();
        circuit
            .delay(Duration::new(10.0, TimeUnit::Nanoseconds), [0])
            .unwrap();
        assert!(matches!(circuit.dumps(), Err(ExportError::Unsupported(_))));
    }

    #[test]
    fn only_used_custom_instructions_are_declared() {
        let options = LoadOptions::default()
            .with_custom_instructions(LEGACY_CUSTOM_INSTRUCTIONS.iter().cloned());
        let circuit = loads("qreg q[2];\nswap q[0], q[1];\n", &options).unwrap();
        assert_eq!(
            circuit.dumps().unwrap(),
            "OPENQASM 2.0;\nopaque swap q0,q1;\nqreg q[2];\nswap q[0],q[1];\n"
        );
    }

    #[test]
    fn round_trip() {
        let source = "OPENQASM 2.0;\ninclude \"qelib1.inc\";\nqreg q[3];\ncx q[0],q[2];\nu3(pi,pi/2,0.1) q[1];\n";
        let circuit = loads(source, &LoadOptions::default()).unwrap();
        let reloaded = loads(&circuit.dumps().unwrap(), &LoadOptions::default()).unwrap();
        assert_eq!(reloaded, circuit);
    }
}
