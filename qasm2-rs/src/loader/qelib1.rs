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

//! The OpenQASM 2 standard library, `qelib1.inc`, which is always served from this embedded
//! copy rather than from disk.

use once_cell::sync::Lazy;

use super::CustomInstruction;

pub(crate) const QELIB1_NAME: &str = "qelib1.inc";

pub(crate) const QELIB1: &str = r#"// Quantum Experience (QE) Standard Header
// file: qelib1.inc

// --- QE Hardware primitives ---

// 3-parameter 2-pulse single qubit gate
gate u3(theta,phi,lambda) q { U(theta,phi,lambda) q; }
// 2-parameter 1-pulse single qubit gate
gate u2(phi,lambda) q { U(pi/2,phi,lambda) q; }
// 1-parameter 0-pulse single qubit gate
gate u1(lambda) q { U(0,0,lambda) q; }
// controlled-NOT
gate cx c,t { CX c,t; }
// idle gate (identity)
gate id a { U(0,0,0) a; }
// idle gate (identity) with length gamma*sqglen
gate u0(gamma) q { U(0,0,0) q; }

// --- QE Standard Gates ---

// Pauli gate: bit-flip
gate x a { u3(pi,0,pi) a; }
// Pauli gate: bit and phase flip
gate y a { u3(pi,pi/2,pi/2) a; }
// Pauli gate: phase flip
gate z a { u1(pi) a; }
// Clifford gate: Hadamard
gate h a { u2(0,pi) a; }
// Clifford gate: sqrt(Z) phase gate
gate s a { u1(pi/2) a; }
// Clifford gate: conjugate of sqrt(Z)
gate sdg a { u1(-pi/2) a; }
// C3 gate: sqrt(S) phase gate
gate t a { u1(pi/4) a; }
// C3 gate: conjugate of sqrt(S)
gate tdg a { u1(-pi/4) a; }

// --- Standard rotations ---
// Rotation around X-axis
gate rx(theta) a { u3(theta,-pi/2,pi/2) a; }
// rotation around Y-axis
gate ry(theta) a { u3(theta,0,0) a; }
// rotation around Z axis
gate rz(phi) a { u1(phi) a; }

// --- QE Standard User-Defined Gates  ---

// controlled-Phase
gate cz a,b { h b; cx a,b; h b; }
// controlled-Y
gate cy a,b { sdg b; cx a,b; s b; }
// controlled-H
gate ch a,b {
h b; sdg b;
cx a,b;
h b; t b;
cx a,b;
t b; h b; s b; x b; s a;
}
// C3 gate: Toffoli
gate ccx a,b,c
{
  h c;
  cx b,c; tdg c;
  cx a,c; t c;
  cx b,c; tdg c;
  cx a,c; t b; t c; h c;
  cx a,b; t a; tdg b;
  cx a,b;
}
// controlled rz rotation
gate crz(lambda) a,b
{
  u1(lambda/2) b;
  cx a,b;
  u1(-lambda/2) b;
  cx a,b;
}
// controlled phase rotation
gate cu1(lambda) a,b
{
  u1(lambda/2) a;
  cx a,b;
  u1(-lambda/2) b;
  cx a,b;
  u1(lambda/2) b;
}
// controlled-U
gate cu3(theta,phi,lambda) c, t
{
  // implements controlled-U(theta,phi,lambda) with  target t and control c
  u1((lambda-phi)/2) t;
  cx c,t;
  u3(-theta/2,0,-(phi+lambda)/2) t;
  cx c,t;
  u3(theta/2,phi,0) t;
}
"#;

/// The gates of `qelib1.inc`, as `(name, parameters, qubits)`.
pub(crate) const QELIB1_GATES: &[(&str, usize, usize)] = &[
    ("u3", 3, 1),
    ("u2", 2, 1),
    ("u1", 1, 1),
    ("cx", 0, 2),
    ("id", 0, 1),
    ("u0", 1, 1),
    ("x", 0, 1),
    ("y", 0, 1),
    ("z", 0, 1),
    ("h", 0, 1),
    ("s", 0, 1),
    ("sdg", 0, 1),
    ("t", 0, 1),
    ("tdg", 0, 1),
    ("rx", 1, 1),
    ("ry", 1, 1),
    ("rz", 1, 1),
    ("cz", 0, 2),
    ("cy", 0, 2),
    ("ch", 0, 2),
    ("ccx", 0, 3),
    ("crz", 1, 2),
    ("cu1", 1, 2),
    ("cu3", 3, 2),
];

pub(crate) fn is_standard_gate(name: &str) -> bool {
    QELIB1_GATES.iter().any(|(gate, _, _)| *gate == name)
}

/// Custom instructions describing the gates that older versions of this loader treated as
/// standard: the gates of `qelib1.inc`, plus several which are always in scope even without an
/// include.
///
/// Passing these as [`LoadOptions::custom_instructions`](super::LoadOptions) makes every such
/// gate opaque to [`Circuit::decompose`](crate::circuit::Circuit::decompose).
pub static LEGACY_CUSTOM_INSTRUCTIONS: Lazy<Vec<CustomInstruction>> = Lazy::new(|| {
    let builtin = [
        ("u", 3, 1),
        ("p", 1, 1),
        ("sx", 0, 1),
        ("sxdg", 0, 1),
        ("swap", 0, 2),
        ("cswap", 0, 3),
        ("crx", 1, 2),
        ("cry", 1, 2),
        ("cp", 1, 2),
        ("csx", 0, 2),
        ("cu", 4, 2),
        ("rxx", 1, 2),
        ("rzz", 1, 2),
        ("rccx", 0, 3),
        ("rc3x", 0, 4),
        ("c3x", 0, 4),
        ("c3sqrtx", 0, 4),
        ("c4x", 0, 5),
    ];
    QELIB1_GATES
        .iter()
        .map(|&(name, num_params, num_qubits)| {
            CustomInstruction::new(name, num_params, num_qubits, false)
        })
        .chain(
            builtin
                .into_iter()
                .map(|(name, num_params, num_qubits)| {
                    CustomInstruction::new(name, num_params, num_qubits, true)
                }),
        )
        .collect()
});

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::{LEGACY_CUSTOM_INSTRUCTIONS, QELIB1, QELIB1_GATES};
    use crate::program::{Program, Statement};

    #[test]
    fn gate_table_matches_library() {
        let program = Program::parse_included(QELIB1, true).unwrap();
        let defined: Vec<_> = program
            .statements
            .iter()
            .filter_map(|statement| match &statement.statement {
                Statement::GateDefinition(definition) => Some((
                    definition.name.as_str(),
                    definition.parameters.len(),
                    definition.qubits.len(),
                )),
                _ => None,
            })
            .collect();
        assert_eq!(defined, QELIB1_GATES.to_vec());
    }

    #[test]
    fn legacy_names_are_unique() {
        let names: HashSet<_> = LEGACY_CUSTOM_INSTRUCTIONS
            .iter()
            .map(|instruction| instruction.name.as_str())
            .collect();
        assert_eq!(names.len(), LEGACY_CUSTOM_INSTRUCTIONS.len());
    }
}
