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

//! A directed acyclic graph view of a [`Circuit`], in which each operation is a node and each
//! edge follows one qubit or clbit from one operation to the next.

use std::{
    cmp::Reverse,
    collections::{BinaryHeap, HashMap},
    fmt,
};

use indexmap::IndexMap;
use itertools::Itertools;
use petgraph::{
    graph::{DiGraph, NodeIndex},
    visit::EdgeRef,
    Direction,
};

use crate::circuit::{Circuit, CircuitError, CircuitInstruction};

#[cfg(feature = "graphviz-dot")]
mod graphviz_dot;

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum DagError {
    #[error("the {kind} order {order:?} does not contain exactly the same {kind}s as the circuit, which has {expected}")]
    WireOrder {
        kind: &'static str,
        order: Vec<usize>,
        expected: usize,
    },
    #[error("the graph has no {0}")]
    UnknownWire(Wire),
}

/// A qubit or clbit of the circuit, by its index in the circuit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Wire {
    Qubit(usize),
    Clbit(usize),
}

impl fmt::Display for Wire {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Wire::Qubit(index) => write!(f, "qubit {index}"),
            Wire::Clbit(index) => write!(f, "clbit {index}"),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum DagNode {
    /// Where a wire enters the circuit.
    In(Wire),
    /// Where a wire leaves the circuit.
    Out(Wire),
    Op(CircuitInstruction),
}

impl DagNode {
    pub fn as_op(&self) -> Option<&CircuitInstruction> {
        match self {
            DagNode::Op(instruction) => Some(instruction),
            _ => None,
        }
    }
}

/// Operations are nodes, and wires keep the indices they have in the circuit. The graph also
/// records an order of its wires, which need not be the circuit's.
///
/// Two graphs are equal when they have the same registers and wire order, and the same
/// operations in the same order along every wire, however their nodes happen to be numbered.
#[derive(Clone, Debug)]
pub struct CircuitDag {
    graph: DiGraph<DagNode, Wire>,
    inputs: IndexMap<Wire, NodeIndex>,
    outputs: IndexMap<Wire, NodeIndex>,
    /// The registers and gates of the circuit this was built from.
    template: Circuit,
}

impl CircuitDag {
    pub fn from_circuit(circuit: &Circuit) -> Self {
        let qubits = (0..circuit.num_qubits()).collect::<Vec<_>>();
        let clbits = (0..circuit.num_clbits()).collect::<Vec<_>>();
        let mut dag = Self::build(circuit, &qubits, &clbits);
        dag.extend_from(circuit);
        dag
    }

    /// Like [`CircuitDag::from_circuit`], but with the wires in the given orders. Each order
    /// must hold every index of its kind of bit exactly once; `None` keeps the circuit's order.
    pub fn from_circuit_with_order(
        circuit: &Circuit,
        qubit_order: Option<&[usize]>,
        clbit_order: Option<&[usize]>,
    ) -> Result<Self, DagError> {
        let qubits = wire_order("qubit", qubit_order, circuit.num_qubits())?;
        let clbits = wire_order("clbit", clbit_order, circuit.num_clbits())?;
        let mut dag = Self::build(circuit, &qubits, &clbits);
        dag.extend_from(circuit);
        Ok(dag)
    }

    /// A graph with the registers and gates of `circuit` but no operations, its wires in the
    /// given orders.
    pub fn empty_like(
        circuit: &Circuit,
        qubit_order: Option<&[usize]>,
        clbit_order: Option<&[usize]>,
    ) -> Result<Self, DagError> {
        let qubits = wire_order("qubit", qubit_order, circuit.num_qubits())?;
        let clbits = wire_order("clbit", clbit_order, circuit.num_clbits())?;
        Ok(Self::build(circuit, &qubits, &clbits))
    }

    fn build(circuit: &Circuit, qubits: &[usize], clbits: &[usize]) -> Self {
        let mut graph = DiGraph::new();
        let wires = qubits
            .iter()
            .map(|&qubit| Wire::Qubit(qubit))
            .chain(clbits.iter().map(|&clbit| Wire::Clbit(clbit)))
            .collect::<Vec<_>>();
        let inputs: IndexMap<Wire, NodeIndex> = wires
            .iter()
            .map(|&wire| (wire, graph.add_node(DagNode::In(wire))))
            .collect();
        let outputs: IndexMap<Wire, NodeIndex> = wires
            .iter()
            .map(|&wire| (wire, graph.add_node(DagNode::Out(wire))))
            .collect();
        for &wire in &wires {
            graph.add_edge(inputs[&wire], outputs[&wire], wire);
        }
        Self {
            graph,
            inputs,
            outputs,
            template: circuit.copy_empty_like(),
        }
    }

    fn extend_from(&mut self, circuit: &Circuit) {
        for instruction in circuit.instructions() {
            let wires = self.instruction_wires(instruction);
            self.push_op(instruction.clone(), wires);
        }
    }

    /// Add an operation after everything already on its wires.
    pub fn apply_operation_back(
        &mut self,
        instruction: CircuitInstruction,
    ) -> Result<NodeIndex, DagError> {
        let wires = self.instruction_wires(&instruction);
        if let Some(&wire) = wires.iter().find(|wire| !self.outputs.contains_key(*wire)) {
            return Err(DagError::UnknownWire(wire));
        }
        Ok(self.push_op(instruction, wires))
    }

    fn push_op(&mut self, instruction: CircuitInstruction, wires: Vec<Wire>) -> NodeIndex {
        let node = self.graph.add_node(DagNode::Op(instruction));
        for wire in wires {
            let Some(&output) = self.outputs.get(&wire) else {
                continue;
            };
            let last = self
                .graph
                .edges_directed(output, Direction::Incoming)
                .find(|edge| *edge.weight() == wire)
                .map(|edge| (edge.id(), edge.source()));
            if let Some((edge, previous)) = last {
                self.graph.remove_edge(edge);
                self.graph.add_edge(previous, node, wire);
            }
            self.graph.add_edge(node, output, wire);
        }
        node
    }

    /// The qubits, in the order of the graph's wires.
    pub fn qubits(&self) -> Vec<usize> {
        self.inputs
            .keys()
            .filter_map(|wire| match wire {
                Wire::Qubit(index) => Some(*index),
                Wire::Clbit(_) => None,
            })
            .collect()
    }

    /// The clbits, in the order of the graph's wires.
    pub fn clbits(&self) -> Vec<usize> {
        self.inputs
            .keys()
            .filter_map(|wire| match wire {
                Wire::Clbit(index) => Some(*index),
                Wire::Qubit(_) => None,
            })
            .collect()
    }

    /// The wires an instruction occupies: its qubits and clbits, and the clbits its condition
    /// reads.
    fn instruction_wires(&self, instruction: &CircuitInstruction) -> Vec<Wire> {
        instruction
            .qubits
            .iter()
            .map(|&qubit| Wire::Qubit(qubit))
            .chain(
                instruction
                    .clbits
                    .iter()
                    .copied()
                    .chain(self.template.condition_clbits(instruction))
                    .map(Wire::Clbit),
            )
            .unique()
            .collect()
    }

    /// Rebuild a circuit from the operations of this graph, in topological order.
    pub fn to_circuit(&self) -> Result<Circuit, CircuitError> {
        let mut circuit = self.template.copy_empty_like();
        for node in self.topological_op_nodes() {
            if let DagNode::Op(instruction) = &self.graph[node] {
                circuit.append(instruction.clone())?;
            }
        }
        Ok(circuit)
    }

    pub fn graph(&self) -> &DiGraph<DagNode, Wire> {
        &self.graph
    }

    pub fn node(&self, index: NodeIndex) -> Option<&DagNode> {
        self.graph.node_weight(index)
    }

    pub fn input_node(&self, wire: Wire) -> Option<NodeIndex> {
        self.inputs.get(&wire).copied()
    }

    pub fn output_node(&self, wire: Wire) -> Option<NodeIndex> {
        self.outputs.get(&wire).copied()
    }

    /// Every operation node, in the order the operations were added.
    pub fn op_nodes(&self) -> impl Iterator<Item = (NodeIndex, &CircuitInstruction)> + '_ {
        self.graph
            .node_indices()
            .filter_map(|index| self.graph[index].as_op().map(|op| (index, op)))
    }

    /// The operation nodes in a topological order. Among the nodes that are ready at any point,
    /// the one added earliest comes first, so a circuit's own order is preserved.
    pub fn topological_op_nodes(&self) -> Vec<NodeIndex> {
        let mut in_degree = self
            .graph
            .node_indices()
            .map(|index| {
                self.graph
                    .edges_directed(index, Direction::Incoming)
                    .count()
            })
            .collect::<Vec<_>>();
        let mut ready = self
            .graph
            .node_indices()
            .filter(|index| in_degree[index.index()] == 0)
            .map(Reverse)
            .collect::<BinaryHeap<_>>();

        let mut order = Vec::new();
        while let Some(Reverse(node)) = ready.pop() {
            if self.graph[node].as_op().is_some() {
                order.push(node);
            }
            for edge in self.graph.edges_directed(node, Direction::Outgoing) {
                let target = edge.target();
                in_degree[target.index()] -= 1;
                if in_degree[target.index()] == 0 {
                    ready.push(Reverse(target));
                }
            }
        }
        order
    }

    /// The edges leaving `node` as `(source, target, wire)`.
    pub fn edges(&self, node: NodeIndex) -> Vec<(NodeIndex, NodeIndex, Wire)> {
        self.graph
            .edges_directed(node, Direction::Outgoing)
            .map(|edge| (edge.source(), edge.target(), *edge.weight()))
            .sorted_by_key(|(_, _, wire)| *wire)
            .collect()
    }

    /// The operations on a single wire, in order.
    pub fn wire_ops(&self, wire: Wire) -> Vec<NodeIndex> {
        let mut ops = Vec::new();
        let mut current = self.input_node(wire);
        while let Some(node) = current {
            current = self
                .graph
                .edges_directed(node, Direction::Outgoing)
                .find(|edge| *edge.weight() == wire)
                .map(|edge| edge.target());
            if let Some(next) = current {
                if self.graph[next].as_op().is_some() {
                    ops.push(next);
                }
            }
        }
        ops
    }

    pub fn num_ops(&self) -> usize {
        self.op_nodes().count()
    }

    /// Name each operation by the first of its wires and its position along that wire, which
    /// does not depend on the order the nodes were added in.
    fn op_labels(&self) -> HashMap<NodeIndex, (Wire, usize)> {
        let mut labels = HashMap::new();
        for wire in self.inputs.keys().sorted() {
            for (position, node) in self.wire_ops(*wire).into_iter().enumerate() {
                labels.entry(node).or_insert((*wire, position));
            }
        }
        labels
    }

    fn wire_sequences(&self) -> Vec<(Wire, Vec<((Wire, usize), &CircuitInstruction)>)> {
        let labels = self.op_labels();
        self.inputs
            .keys()
            .map(|&wire| {
                let ops = self
                    .wire_ops(wire)
                    .into_iter()
                    .filter_map(|node| Some((*labels.get(&node)?, self.graph[node].as_op()?)))
                    .collect();
                (wire, ops)
            })
            .collect()
    }
}

impl PartialEq for CircuitDag {
    fn eq(&self, other: &Self) -> bool {
        self.template == other.template
            && self.graph.node_count() == other.graph.node_count()
            && self.wire_sequences() == other.wire_sequences()
    }
}

/// Check that `order` is a permutation of `0..expected`, defaulting to the identity.
fn wire_order(
    kind: &'static str,
    order: Option<&[usize]>,
    expected: usize,
) -> Result<Vec<usize>, DagError> {
    let Some(order) = order else {
        return Ok((0..expected).collect());
    };
    if order.len() != expected || !order.iter().sorted().copied().eq(0..expected) {
        return Err(DagError::WireOrder {
            kind,
            order: order.to_vec(),
            expected,
        });
    }
    Ok(order.to_vec())
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use rstest::rstest;

    use super::{CircuitDag, DagError, DagNode, Wire};
    use crate::circuit::{Circuit, CircuitInstruction, Operation};
    use crate::loader::{loads, LoadOptions};
    use crate::pulse::{Channel, PulseInstruction, Schedule};

    fn load(source: &str) -> Circuit {
        loads(source, &LoadOptions::default()).unwrap()
    }

    #[test]
    fn edges_follow_wires() {
        let circuit = load(
            "include \"qelib1.inc\"; qreg q[2]; creg c[1]; h q[0]; cx q[0], q[1]; measure q[1] -> c[0];",
        );
        let dag = CircuitDag::from_circuit(&circuit);
        let ops = dag.topological_op_nodes();
        assert_eq!(ops.len(), 3);

        let (h, cx, measure) = (ops[0], ops[1], ops[2]);
        assert_eq!(dag.edges(h), vec![(h, cx, Wire::Qubit(0))]);
        assert_eq!(
            dag.edges(cx),
            vec![
                (cx, dag.output_node(Wire::Qubit(0)).unwrap(), Wire::Qubit(0)),
                (cx, measure, Wire::Qubit(1)),
            ]
        );
        assert_eq!(
            dag.edges(measure),
            vec![
                (measure, dag.output_node(Wire::Qubit(1)).unwrap(), Wire::Qubit(1)),
                (measure, dag.output_node(Wire::Clbit(0)).unwrap(), Wire::Clbit(0)),
            ]
        );
        assert_eq!(
            dag.node(dag.input_node(Wire::Clbit(0)).unwrap()),
            Some(&DagNode::In(Wire::Clbit(0)))
        );
    }

    #[test]
    fn conditions_are_wires() {
        let circuit = load(
            "include \"qelib1.inc\"; qreg q[1]; creg c[2]; measure q[0] -> c[1]; if (c == 1) x q[0];",
        );
        let dag = CircuitDag::from_circuit(&circuit);
        let ops = dag.topological_op_nodes();
        let conditional = ops[1];
        assert_eq!(dag.wire_ops(Wire::Clbit(0)), vec![conditional]);
        assert_eq!(dag.wire_ops(Wire::Clbit(1)), ops);
    }

    #[test]
    fn round_trip() {
        let circuit = load(
            r#"
include "qelib1.inc";
qreg q[3];
qreg r[1];
creg c[3];
h q;
cx q[0], r[0];
barrier q, r;
x q[2];
measure q -> c;
if (c == 5) u1(0.25) r[0];
reset q[1];
"#,
        );
        let dag = CircuitDag::from_circuit(&circuit);
        assert_eq!(dag.num_ops(), circuit.instructions().len());
        assert_eq!(dag.to_circuit().unwrap(), circuit);
    }

    #[test]
    fn calibrations_survive_round_trip() {
        let mut circuit = load("include \"qelib1.inc\"; qreg q[2]; cx q[0], q[1];");
        let mut schedule = Schedule::new("cx");
        schedule
            .append(PulseInstruction::Delay {
                duration: 800,
                channel: Channel::Control(0),
            })
            .unwrap();
        circuit
            .add_calibration("cx", vec![0, 1], vec![], schedule.clone())
            .unwrap();

        let rebuilt = CircuitDag::from_circuit(&circuit).to_circuit().unwrap();
        assert_eq!(rebuilt.calibration("cx", &[0, 1], &[]), Some(&schedule));
        assert_eq!(rebuilt, circuit);
    }

    #[test]
    fn independent_operations_keep_their_order() {
        let mut circuit = Circuit::new();
        circuit.add_qreg("q", 3).unwrap();
        for qubit in [2, 0, 1] {
            circuit
                .append(CircuitInstruction::gate("U", vec![0.0, 0.0, 0.0], vec![qubit]))
                .unwrap();
        }
        let rebuilt = CircuitDag::from_circuit(&circuit).to_circuit().unwrap();
        assert_eq!(
            rebuilt
                .instructions()
                .iter()
                .map(|instruction| instruction.qubits[0])
                .collect::<Vec<_>>(),
            vec![2, 0, 1]
        );
    }

    #[test]
    fn empty_circuit() {
        let mut circuit = Circuit::new();
        circuit.add_qreg("q", 2).unwrap();
        let dag = CircuitDag::from_circuit(&circuit);
        assert!(dag.topological_op_nodes().is_empty());
        assert_eq!(
            dag.edges(dag.input_node(Wire::Qubit(1)).unwrap()),
            vec![(
                dag.input_node(Wire::Qubit(1)).unwrap(),
                dag.output_node(Wire::Qubit(1)).unwrap(),
                Wire::Qubit(1)
            )]
        );
        assert!(matches!(
            dag.node(dag.output_node(Wire::Qubit(0)).unwrap()),
            Some(DagNode::Out(_))
        ));
        assert_eq!(dag.to_circuit().unwrap(), circuit);
    }

    fn measured(size: usize) -> Circuit {
        let mut circuit = Circuit::new();
        circuit.add_qreg("qr", size).unwrap();
        circuit.add_creg("cr", size).unwrap();
        for bit in 0..size {
            circuit
                .append(CircuitInstruction::gate("h", vec![], vec![bit]))
                .unwrap();
            circuit
                .append(CircuitInstruction::new(
                    Operation::Measure,
                    vec![bit],
                    vec![bit],
                ))
                .unwrap();
        }
        circuit
    }

    #[test]
    fn wire_order() {
        let permutation = vec![2, 3, 1, 4, 0, 5];
        let order = Some(permutation.as_slice());
        let circuit = measured(permutation.len());
        let dag = CircuitDag::from_circuit_with_order(&circuit, order, order).unwrap();

        let mut expected = CircuitDag::empty_like(&circuit, order, order).unwrap();
        for instruction in circuit.instructions() {
            expected.apply_operation_back(instruction.clone()).unwrap();
        }

        assert_eq!(dag, expected);
        assert_eq!(dag.qubits(), permutation);
        assert_eq!(dag.clbits(), permutation);
        assert_ne!(dag, CircuitDag::from_circuit(&circuit));
        assert_eq!(dag.to_circuit().unwrap(), circuit);
    }

    #[rstest]
    #[case::missing_qubit(Some(vec![0, 1]), None, "qubit")]
    #[case::repeated_qubit(Some(vec![0, 1, 1]), None, "qubit")]
    #[case::extra_qubit(Some(vec![0, 1, 2, 3]), None, "qubit")]
    #[case::missing_clbit(None, Some(vec![0, 1]), "clbit")]
    #[case::repeated_clbit(None, Some(vec![0, 1, 1]), "clbit")]
    fn wire_order_failures(
        #[case] qubit_order: Option<Vec<usize>>,
        #[case] clbit_order: Option<Vec<usize>>,
        #[case] kind: &str,
    ) {
        let circuit = measured(3);
        let error = CircuitDag::from_circuit_with_order(
            &circuit,
            qubit_order.as_deref(),
            clbit_order.as_deref(),
        )
        .unwrap_err();
        assert!(matches!(
            &error,
            DagError::WireOrder { kind: found, expected: 3, .. } if *found == kind
        ));
        assert!(error
            .to_string()
            .contains(&format!("does not contain exactly the same {kind}s")));
    }

    #[test]
    fn equality_ignores_the_order_of_independent_operations() {
        let mut circuit = Circuit::new();
        circuit.add_qreg("q", 2).unwrap();
        let mut first = CircuitDag::empty_like(&circuit, None, None).unwrap();
        let mut second = first.clone();
        for qubit in [0, 1] {
            first
                .apply_operation_back(CircuitInstruction::gate("h", vec![], vec![qubit]))
                .unwrap();
        }
        for qubit in [1, 0] {
            second
                .apply_operation_back(CircuitInstruction::gate("h", vec![], vec![qubit]))
                .unwrap();
        }
        assert_eq!(first, second);

        second
            .apply_operation_back(CircuitInstruction::gate("x", vec![], vec![0]))
            .unwrap();
        assert_ne!(first, second);
        assert_eq!(
            first.apply_operation_back(CircuitInstruction::gate("x", vec![], vec![2])),
            Err(DagError::UnknownWire(Wire::Qubit(2)))
        );
    }
}
