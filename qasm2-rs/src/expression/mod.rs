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

//! Classical expressions, as used for gate parameters.
//!
//! Within a gate body an expression may refer to the gate's parameters by name; everywhere else
//! an expression must be constant, and is evaluated to an [`f64`] when a program is loaded.

use std::{
    collections::{BTreeSet, HashMap},
    f64::consts::PI,
    fmt,
    num::NonZeroI32,
    str::FromStr,
    sync::Arc,
};

use lexical::{format, to_string_with_options, WriteFloatOptions};
use nom_locate::LocatedSpan;
use once_cell::sync::Lazy;

use crate::{
    parser::{lex, parse_expression, ParseError},
    program::{disallow_leftover, SyntaxError},
    qasm::{ToQasm, ToQasmError, ToQasmResult},
};

mod simplification;

/// The different possible types of errors that could occur during expression evaluation.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum EvaluationError {
    #[error("the parameter '{0}' is not bound to a value")]
    UnboundParameter(String),
    #[error("'{0}' is not a defined classical function")]
    UnknownFunction(String),
    #[error("the function '{function}' takes {expected} argument(s), but {found} were given")]
    ArgumentCount {
        function: String,
        expected: usize,
        found: usize,
    },
    #[error("division by zero")]
    DivisionByZero,
    #[error("the function '{function}' is not defined for the value {value}")]
    Domain { function: &'static str, value: f64 },
    #[error("the expression does not evaluate to a finite number")]
    NotFinite,
}

/// A classical function, callable from expressions, supplied by the user of the loader.
///
/// The function receives exactly `num_params` arguments.
#[derive(Clone)]
pub struct CustomClassical {
    pub name: String,
    pub num_params: usize,
    function: Arc<dyn Fn(&[f64]) -> f64 + Send + Sync>,
}

impl CustomClassical {
    pub fn new<F>(name: impl Into<String>, num_params: usize, function: F) -> Self
    where
        F: Fn(&[f64]) -> f64 + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            num_params,
            function: Arc::new(function),
        }
    }

    /// Call the function; the argument count has already been checked by the caller.
    pub fn call(&self, arguments: &[f64]) -> f64 {
        (self.function)(arguments)
    }
}

impl fmt::Debug for CustomClassical {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomClassical")
            .field("name", &self.name)
            .field("num_params", &self.num_params)
            .finish_non_exhaustive()
    }
}

/// Custom classical functions, keyed by name.
pub type CustomFunctions = HashMap<String, CustomClassical>;

/// An OpenQASM 2 classical expression.
#[derive(Clone, Debug, PartialEq)]
pub enum Expression {
    /// An integer or real literal.
    Constant(f64),
    FunctionCall(FunctionCallExpression),
    Infix(InfixExpression),
    /// A reference to a gate parameter.
    Parameter(String),
    Pi,
    Prefix(PrefixExpression),
}

/// A function call, such as `sin(theta/2)`.
#[derive(Clone, Debug, PartialEq)]
pub struct FunctionCallExpression {
    pub function: ExpressionFunction,
    pub arguments: Vec<Expression>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct InfixExpression {
    pub left: Box<Expression>,
    pub operator: InfixOperator,
    pub right: Box<Expression>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct PrefixExpression {
    pub operator: PrefixOperator,
    pub expression: Box<Expression>,
}

/// A function which may appear in an expression.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ExpressionFunction {
    Cosine,
    Exponent,
    NaturalLogarithm,
    Sine,
    SquareRoot,
    Tangent,
    /// A function resolved by name against the [`CustomFunctions`] at evaluation time.
    Custom(String),
}

impl ExpressionFunction {
    /// Resolve a function name to a built-in function, if there is one by that name.
    pub fn builtin(name: &str) -> Option<Self> {
        match name {
            "cos" => Some(Self::Cosine),
            "exp" => Some(Self::Exponent),
            "ln" => Some(Self::NaturalLogarithm),
            "sin" => Some(Self::Sine),
            "sqrt" => Some(Self::SquareRoot),
            "tan" => Some(Self::Tangent),
            _ => None,
        }
    }

    fn name(&self) -> &str {
        match self {
            Self::Cosine => "cos",
            Self::Exponent => "exp",
            Self::NaturalLogarithm => "ln",
            Self::Sine => "sin",
            Self::SquareRoot => "sqrt",
            Self::Tangent => "tan",
            Self::Custom(name) => name,
        }
    }

    /// Apply a built-in function to its single argument.
    fn apply_builtin(&self, value: f64) -> Result<f64, EvaluationError> {
        match self {
            Self::Cosine => Ok(value.cos()),
            Self::Exponent => Ok(value.exp()),
            Self::NaturalLogarithm if value <= 0.0 => Err(EvaluationError::Domain {
                function: "ln",
                value,
            }),
            Self::NaturalLogarithm => Ok(value.ln()),
            Self::Sine => Ok(value.sin()),
            Self::SquareRoot if value < 0.0 => Err(EvaluationError::Domain {
                function: "sqrt",
                value,
            }),
            Self::SquareRoot => Ok(value.sqrt()),
            Self::Tangent => Ok(value.tan()),
            Self::Custom(name) => Err(EvaluationError::UnknownFunction(name.clone())),
        }
    }
}

impl fmt::Display for ExpressionFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display)]
pub enum InfixOperator {
    #[strum(serialize = "^")]
    Caret,
    #[strum(serialize = "+")]
    Plus,
    #[strum(serialize = "-")]
    Minus,
    #[strum(serialize = "/")]
    Slash,
    #[strum(serialize = "*")]
    Star,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display)]
pub enum PrefixOperator {
    #[strum(serialize = "-")]
    Minus,
}

impl Expression {
    /// Evaluate the expression to a real number.
    ///
    /// `bindings` supplies values for any parameters, and `functions` any custom classical
    /// functions referenced by the expression.
    pub fn evaluate(
        &self,
        bindings: &HashMap<String, f64>,
        functions: &CustomFunctions,
    ) -> Result<f64, EvaluationError> {
        let value = match self {
            Expression::Constant(value) => *value,
            Expression::Pi => PI,
            Expression::Parameter(name) => *bindings
                .get(name)
                .ok_or_else(|| EvaluationError::UnboundParameter(name.clone()))?,
            Expression::Prefix(PrefixExpression {
                operator: PrefixOperator::Minus,
                expression,
            }) => -expression.evaluate(bindings, functions)?,
            Expression::Infix(InfixExpression {
                left,
                operator,
                right,
            }) => {
                let left = left.evaluate(bindings, functions)?;
                let right = right.evaluate(bindings, functions)?;
                match operator {
                    InfixOperator::Plus => left + right,
                    InfixOperator::Minus => left - right,
                    InfixOperator::Star => left * right,
                    InfixOperator::Slash if right == 0.0 => {
                        return Err(EvaluationError::DivisionByZero)
                    }
                    InfixOperator::Slash => left / right,
                    InfixOperator::Caret => left.powf(right),
                }
            }
            Expression::FunctionCall(FunctionCallExpression {
                function,
                arguments,
            }) => {
                let values = arguments
                    .iter()
                    .map(|argument| argument.evaluate(bindings, functions))
                    .collect::<Result<Vec<_>, _>>()?;
                call_function(function, &values, functions)?
            }
        };

        if value.is_finite() {
            Ok(value)
        } else {
            Err(EvaluationError::NotFinite)
        }
    }

    /// Replace every parameter named in `substitutions` with the given expression.
    pub fn substitute(&self, substitutions: &HashMap<String, Expression>) -> Expression {
        match self {
            Expression::Parameter(name) => substitutions
                .get(name)
                .cloned()
                .unwrap_or_else(|| self.clone()),
            Expression::Prefix(PrefixExpression {
                operator,
                expression,
            }) => Expression::Prefix(PrefixExpression {
                operator: *operator,
                expression: Box::new(expression.substitute(substitutions)),
            }),
            Expression::Infix(InfixExpression {
                left,
                operator,
                right,
            }) => Expression::Infix(InfixExpression {
                left: Box::new(left.substitute(substitutions)),
                operator: *operator,
                right: Box::new(right.substitute(substitutions)),
            }),
            Expression::FunctionCall(FunctionCallExpression {
                function,
                arguments,
            }) => Expression::FunctionCall(FunctionCallExpression {
                function: function.clone(),
                arguments: arguments
                    .iter()
                    .map(|argument| argument.substitute(substitutions))
                    .collect(),
            }),
            Expression::Constant(_) | Expression::Pi => self.clone(),
        }
    }

    /// The names of all parameters referenced within this expression.
    pub fn parameters(&self) -> BTreeSet<&str> {
        let mut names = BTreeSet::new();
        self.collect_parameters(&mut names);
        names
    }

    fn collect_parameters<'a>(&'a self, names: &mut BTreeSet<&'a str>) {
        match self {
            Expression::Parameter(name) => {
                names.insert(name);
            }
            Expression::Prefix(PrefixExpression { expression, .. }) => {
                expression.collect_parameters(names)
            }
            Expression::Infix(InfixExpression { left, right, .. }) => {
                left.collect_parameters(names);
                right.collect_parameters(names);
            }
            Expression::FunctionCall(FunctionCallExpression { arguments, .. }) => arguments
                .iter()
                .for_each(|argument| argument.collect_parameters(names)),
            Expression::Constant(_) | Expression::Pi => {}
        }
    }

    /// Return every function called anywhere in this expression, with its number of arguments.
    pub fn function_calls(&self) -> Vec<(&ExpressionFunction, usize)> {
        let mut found = Vec::new();
        self.visit_calls(&mut |function, argument_count| found.push((function, argument_count)));
        found
    }

    /// Return the custom functions called anywhere in this expression.
    pub fn custom_functions(&self) -> Vec<(&str, usize)> {
        self.function_calls()
            .into_iter()
            .filter_map(|(function, argument_count)| match function {
                ExpressionFunction::Custom(name) => Some((name.as_str(), argument_count)),
                _ => None,
            })
            .collect()
    }

    fn visit_calls<'a>(&'a self, visit: &mut impl FnMut(&'a ExpressionFunction, usize)) {
        match self {
            Expression::FunctionCall(FunctionCallExpression {
                function,
                arguments,
            }) => {
                visit(function, arguments.len());
                arguments
                    .iter()
                    .for_each(|argument| argument.visit_calls(visit));
            }
            Expression::Prefix(PrefixExpression { expression, .. }) => {
                expression.visit_calls(visit)
            }
            Expression::Infix(InfixExpression { left, right, .. }) => {
                left.visit_calls(visit);
                right.visit_calls(visit);
            }
            Expression::Constant(_) | Expression::Parameter(_) | Expression::Pi => {}
        }
    }
}

fn call_function(
    function: &ExpressionFunction,
    values: &[f64],
    functions: &CustomFunctions,
) -> Result<f64, EvaluationError> {
    let check_arity = |expected: usize| {
        if values.len() == expected {
            Ok(())
        } else {
            Err(EvaluationError::ArgumentCount {
                function: function.name().to_string(),
                expected,
                found: values.len(),
            })
        }
    };

    match function {
        ExpressionFunction::Custom(name) => {
            let custom = functions
                .get(name)
                .ok_or_else(|| EvaluationError::UnknownFunction(name.clone()))?;
            check_arity(custom.num_params)?;
            Ok(custom.call(values))
        }
        builtin => {
            check_arity(1)?;
            builtin.apply_builtin(values[0])
        }
    }
}

impl FromStr for Expression {
    type Err = SyntaxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let input = LocatedSpan::new(s);
        let tokens = lex(input)?;
        disallow_leftover(parse_expression(&tokens).map_err(|err| err.map(ParseError::from)))
    }
}

static FORMAT_REAL_OPTIONS: Lazy<WriteFloatOptions> = Lazy::new(|| {
    WriteFloatOptions::builder()
        .negative_exponent_break(NonZeroI32::new(-5))
        .positive_exponent_break(NonZeroI32::new(15))
        .trim_floats(true)
        .build()
        .expect("options are valid")
});

/// Format a real number as an OpenQASM 2 literal, omitting a trailing `.0`.
pub(crate) fn format_real(value: f64) -> ToQasmResult<String> {
    const FORMAT: u128 = format::STANDARD;
    if !value.is_finite() {
        return Err(ToQasmError::NonFiniteNumber(value));
    }
    Ok(to_string_with_options::<_, FORMAT>(value, &FORMAT_REAL_OPTIONS))
}

/// The largest denominator tried when recognising rational multiples of π.
const MAX_PI_DENOMINATOR: i64 = 16;

/// Format a gate angle, writing small rational multiples of π symbolically (`pi/2`,
/// `-3*pi/4`) and any other value as a literal.
pub fn format_angle(value: f64) -> ToQasmResult<String> {
    if !value.is_finite() {
        return Err(ToQasmError::NonFiniteNumber(value));
    }
    if value.abs() < 1e-12 {
        return Ok("0".to_string());
    }

    for denominator in 1..=MAX_PI_DENOMINATOR {
        let numerator = value * denominator as f64 / PI;
        let rounded = numerator.round();
        if rounded == 0.0 || (numerator - rounded).abs() > 1e-9 * numerator.abs().max(1.0) {
            continue;
        }
        let numerator = rounded as i64;
        let sign = if numerator < 0 { "-" } else { "" };
        let magnitude = numerator.abs();
        let coefficient = match magnitude {
            1 => "pi".to_string(),
            _ => format!("{magnitude}*pi"),
        };
        return Ok(match denominator {
            1 => format!("{sign}{coefficient}"),
            _ => format!("{sign}{coefficient}/{denominator}"),
        });
    }

    format_real(value)
}

impl ToQasm for Expression {
    fn write(
        &self,
        f: &mut impl std::fmt::Write,
        fall_back_to_debug: bool,
    ) -> Result<(), ToQasmError> {
        use Expression::*;
        match self {
            Constant(value) => match format_real(*value) {
                Ok(text) => write!(f, "{text}").map_err(Into::into),
                Err(_) if fall_back_to_debug => write!(f, "{value:?}").map_err(Into::into),
                Err(err) => Err(err),
            },
            FunctionCall(FunctionCallExpression {
                function,
                arguments,
            }) => {
                write!(f, "{function}(")?;
                crate::qasm::write_join_qasm(f, fall_back_to_debug, arguments, ",")?;
                write!(f, ")")?;
                Ok(())
            }
            Infix(InfixExpression {
                left,
                operator,
                right,
            }) => {
                // A negated base must keep its parentheses, as `-2^2` is `-(2^2)`.
                let negative_base = *operator == InfixOperator::Caret
                    && match left.as_ref() {
                        Prefix(_) => true,
                        Constant(value) => value.is_sign_negative(),
                        _ => false,
                    };
                if negative_base {
                    write!(f, "(")?;
                    left.write(f, fall_back_to_debug)?;
                    write!(f, ")")?;
                } else {
                    format_inner_expression(f, fall_back_to_debug, left)?;
                }
                write!(f, "{operator}")?;
                format_inner_expression(f, fall_back_to_debug, right)
            }
            Parameter(name) => write!(f, "{name}").map_err(Into::into),
            Pi => write!(f, "pi").map_err(Into::into),
            Prefix(PrefixExpression {
                operator,
                expression,
            }) => {
                write!(f, "{operator}")?;
                format_inner_expression(f, fall_back_to_debug, expression)
            }
        }
    }
}

/// Utility function to wrap infix expressions that are part of an expression in parentheses, so
/// that correct precedence rules are enforced.
fn format_inner_expression(
    f: &mut impl std::fmt::Write,
    fall_back_to_debug: bool,
    expression: &Expression,
) -> ToQasmResult<()> {
    match expression {
        Expression::Infix(_) => {
            write!(f, "(")?;
            expression.write(f, fall_back_to_debug)?;
            write!(f, ")")?;
            Ok(())
        }
        _ => expression.write(f, fall_back_to_debug),
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_qasm_or_debug())
    }
}
