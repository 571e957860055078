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

use std::path::PathBuf;

use crate::{
    expression::EvaluationError,
    program::{SourceLocation, SyntaxError},
};

/// The name given to source text which did not come from a file.
pub(crate) const STRING_INPUT: &str = "<input>";

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{file}: {source}")]
    Syntax {
        file: String,
        #[source]
        source: SyntaxError,
    },

    #[error("{file}:{location}: {kind}")]
    Semantic {
        file: String,
        location: SourceLocation,
        kind: SemanticErrorKind,
    },

    #[error("invalid load options: {0}")]
    InvalidOptions(String),
}

impl LoadError {
    /// The kind of semantic error, if this is one.
    pub fn semantic_kind(&self) -> Option<&SemanticErrorKind> {
        match self {
            Self::Semantic { kind, .. } => Some(kind),
            _ => None,
        }
    }

    /// Where in its file the error occurred, if it arose from the source text.
    pub fn location(&self) -> Option<SourceLocation> {
        match self {
            Self::Syntax { source, .. } => Some(source.location()),
            Self::Semantic { location, .. } => Some(*location),
            Self::Io { .. } | Self::InvalidOptions(_) => None,
        }
    }
}

/// A program which is syntactically valid but has no meaning.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum SemanticErrorKind {
    #[error("'{0}' is already defined")]
    AlreadyDefined(String),
    #[error("'{0}' is not defined")]
    Undefined(String),
    #[error("'{0}' is not a gate")]
    NotAGate(String),
    #[error("'{0}' is not a quantum register")]
    NotAQuantumRegister(String),
    #[error("'{0}' is not a classical register")]
    NotAClassicalRegister(String),
    #[error("index {index} is out of range for register '{register}' of size {size}")]
    IndexOutOfRange {
        register: String,
        index: u64,
        size: u64,
    },
    #[error("cannot broadcast over registers of different sizes ({0} and {1})")]
    MismatchedBroadcast(u64, u64),
    #[error("measure requires both arguments to be single bits or both to be registers")]
    MixedMeasure,
    #[error("qubit '{0}' is used more than once in a single operation")]
    DuplicateQubit(String),
    #[error("'{name}' takes {expected} parameter(s), but {found} were given")]
    ParameterCount {
        name: String,
        expected: usize,
        found: usize,
    },
    #[error("'{name}' acts on {expected} qubit(s), but {found} were given")]
    QubitCount {
        name: String,
        expected: usize,
        found: usize,
    },
    #[error("'{0}' is declared more than once in the same signature")]
    DuplicateName(String),
    #[error("'{name}' is defined with {found_params} parameter(s) and {found_qubits} qubit(s), but the custom instruction has {expected_params} and {expected_qubits}")]
    CustomSignatureMismatch {
        name: String,
        expected_params: usize,
        expected_qubits: usize,
        found_params: usize,
        found_qubits: usize,
    },
    #[error("expressions outside a gate body must be constant, but '{0}' is a parameter")]
    NonConstantExpression(String),
    #[error("failed to evaluate expression: {0}")]
    Evaluation(#[from] EvaluationError),
    #[error("unable to find '{0}' in the include path")]
    IncludeNotFound(String),
    #[error("'{0}' includes itself")]
    IncludeCycle(String),
}
