//! Rendering of circuit graphs in the Graphviz dot format

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

use dot_writer::{Attributes, DotWriter, Shape};
use itertools::Itertools;

use crate::circuit::{CircuitInstruction, Operation};
use crate::expression::format_angle;

use super::{CircuitDag, DagNode, Wire};

impl CircuitDag {
    /// Return a DOT format string (as bytes) for use with Graphviz.
    ///
    /// Inputs and outputs are drawn as circles labelled with their bit, operations as boxes.
    /// Each edge is labelled with the bit it carries.
    pub fn to_dot(&self) -> Vec<u8> {
        let mut output_bytes = Vec::new();

        {
            let mut writer = DotWriter::from(&mut output_bytes);
            writer.set_pretty_print(true);
            let mut digraph = writer.digraph();

            for index in self.graph.node_indices() {
                let node_id = get_node_id(index.index());
                match &self.graph[index] {
                    DagNode::In(wire) => {
                        digraph
                            .node_named(node_id)
                            .set_shape(Shape::Circle)
                            .set_label(&escape_label(&format!("in {}", self.wire_name(*wire))));
                    }
                    DagNode::Out(wire) => {
                        digraph
                            .node_named(node_id)
                            .set_shape(Shape::Circle)
                            .set_label(&escape_label(&format!("out {}", self.wire_name(*wire))));
                    }
                    DagNode::Op(instruction) => {
                        digraph
                            .node_named(node_id)
                            .set_shape(Shape::Rectangle)
                            .set_label(&escape_label(&op_label(instruction)));
                    }
                }
            }

            for edge in self.graph.raw_edges() {
                digraph
                    .edge(
                        get_node_id(edge.source().index()),
                        get_node_id(edge.target().index()),
                    )
                    .attributes()
                    .set_label(&escape_label(&self.wire_name(edge.weight)));
            }
        }

        output_bytes
    }

    fn wire_name(&self, wire: Wire) -> String {
        let location = match wire {
            Wire::Qubit(index) => self.template.qubit_location(index),
            Wire::Clbit(index) => self.template.clbit_location(index),
        };
        match location {
            Some((register, offset)) => format!("{register}[{offset}]"),
            None => wire.to_string(),
        }
    }
}

fn op_label(instruction: &CircuitInstruction) -> String {
    let mut label = instruction.operation.name().to_owned();
    match &instruction.operation {
        Operation::Gate(gate) if !gate.params.is_empty() => {
            let params = gate
                .params
                .iter()
                .map(|&param| format_angle(param).unwrap_or_else(|_| param.to_string()))
                .join(",");
            label.push_str(&format!("({params})"));
        }
        Operation::Delay(duration) => label.push_str(&format!("({duration})")),
        _ => {}
    }
    if let Some(condition) = &instruction.condition {
        label = format!("if({}=={}) {label}", condition.register, condition.value);
    }
    label
}

/// Escape a string for safe use as a Graphviz node ID or label
fn escape_label(original: &str) -> String {
    original.replace('\\', "\\\\").replace('"', "\\\"")
}

fn get_node_id(index: usize) -> String {
    format!("\"n{index}\"")
}
