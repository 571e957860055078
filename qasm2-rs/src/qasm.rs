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

/// A trait to wrap items which represent some construct within the OpenQASM 2 language.
pub trait ToQasm {
    /// Return a string in valid OpenQASM 2 syntax or an error if the item cannot be represented
    /// in OpenQASM 2.
    fn to_qasm(&self) -> Result<String, ToQasmError> {
        let mut buffer = String::new();
        self.write(&mut buffer, false)?;
        Ok(buffer)
    }

    /// Return a string in valid OpenQASM 2 syntax if possible or otherwise the debug
    /// representation of the item.
    fn to_qasm_or_debug(&self) -> String
    where
        Self: std::fmt::Debug,
    {
        let mut buffer = String::new();
        self.write(&mut buffer, true).ok();
        buffer
    }

    /// Write the OpenQASM 2 representation of the item to the given writer.
    fn write(
        &self,
        writer: &mut impl std::fmt::Write,
        fall_back_to_debug: bool,
    ) -> Result<(), ToQasmError>;
}

pub type ToQasmResult<T> = Result<T, ToQasmError>;

/// Errors which can occur when converting an item to OpenQASM 2.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ToQasmError {
    #[error("Failed to write OpenQASM: {0}")]
    FormatError(#[from] std::fmt::Error),
    #[error("OpenQASM 2 has no representation for the non-finite number {0}")]
    NonFiniteNumber(f64),
    #[error("OpenQASM 2 has no representation for the operation {0}")]
    UnsupportedOperation(String),
}

/// Write a sequence of OpenQASM items to the given writer, joined with the provided `joiner`.
pub(crate) fn write_join_qasm<'i, I, T>(
    writer: &mut impl std::fmt::Write,
    fall_back_to_debug: bool,
    values: I,
    joiner: &str,
) -> Result<(), ToQasmError>
where
    I: IntoIterator<Item = &'i T>,
    T: ToQasm + 'i,
{
    let mut iter = values.into_iter();
    if let Some(first) = iter.next() {
        first.write(writer, fall_back_to_debug)?;

        for value in iter {
            write!(writer, "{joiner}")?;
            value.write(writer, fall_back_to_debug)?;
        }
    }
    Ok(())
}
