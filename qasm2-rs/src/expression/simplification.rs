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

use super::{
    CustomFunctions, Expression, ExpressionFunction, FunctionCallExpression, InfixExpression,
    InfixOperator, PrefixExpression, PrefixOperator,
};

impl Expression {
    /// Fold constant subexpressions and remove arithmetic identities (`x+0`, `x*1`, `x/1`, `x^1`
    /// and double negation).
    ///
    /// Subexpressions whose evaluation fails (such as `1/0`) and calls to custom functions are
    /// left in place, so that the error surfaces when the expression is finally evaluated.
    /// A lone `pi` is kept symbolic.
    pub fn simplify(&self) -> Expression {
        match self {
            Expression::Constant(_) | Expression::Parameter(_) | Expression::Pi => self.clone(),
            Expression::Prefix(PrefixExpression {
                operator: PrefixOperator::Minus,
                expression,
            }) => match expression.simplify() {
                Expression::Constant(value) => Expression::Constant(-value),
                Expression::Prefix(PrefixExpression {
                    operator: PrefixOperator::Minus,
                    expression,
                }) => *expression,
                simplified => Expression::Prefix(PrefixExpression {
                    operator: PrefixOperator::Minus,
                    expression: Box::new(simplified),
                }),
            },
            Expression::Infix(InfixExpression {
                left,
                operator,
                right,
            }) => simplify_infix(left.simplify(), *operator, right.simplify()),
            Expression::FunctionCall(FunctionCallExpression {
                function,
                arguments,
            }) => {
                let call = Expression::FunctionCall(FunctionCallExpression {
                    function: function.clone(),
                    arguments: arguments.iter().map(Expression::simplify).collect(),
                });
                match function {
                    ExpressionFunction::Custom(_) => call,
                    _ => fold(call),
                }
            }
        }
    }

    fn is_constant(&self) -> bool {
        matches!(self, Expression::Constant(_) | Expression::Pi)
    }
}

fn simplify_infix(left: Expression, operator: InfixOperator, right: Expression) -> Expression {
    use Expression::Constant;
    use InfixOperator::*;

    match (&left, operator, &right) {
        (_, Plus | Minus, Constant(zero)) if *zero == 0.0 => left,
        (Constant(zero), Plus, _) if *zero == 0.0 => right,
        (_, Star | Slash | Caret, Constant(one)) if *one == 1.0 => left,
        (Constant(one), Star, _) if *one == 1.0 => right,
        _ => fold(Expression::Infix(InfixExpression {
            left: Box::new(left),
            operator,
            right: Box::new(right),
        })),
    }
}

/// Replace the expression with its value if all of its immediate operands are constant and it
/// evaluates successfully.
fn fold(expression: Expression) -> Expression {
    let operands_constant = match &expression {
        Expression::Infix(InfixExpression { left, right, .. }) => {
            left.is_constant() && right.is_constant()
        }
        Expression::FunctionCall(FunctionCallExpression { arguments, .. }) => {
            arguments.iter().all(Expression::is_constant)
        }
        _ => false,
    };
    if !operands_constant {
        return expression;
    }

    match expression.evaluate(&HashMap::new(), &CustomFunctions::new()) {
        Ok(value) => Expression::Constant(value),
        Err(_) => expression,
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use rstest::rstest;

    use crate::expression::Expression;
    use crate::qasm::ToQasm;

    #[rstest(input, expected,
        case("1+2", "3"),
        case("theta+0", "theta"),
        case("0+theta", "theta"),
        case("1*theta/1", "theta"),
        case("--theta", "theta"),
        case("-(2*3)", "-6"),
        case("pi", "pi"),
        case("theta*(2-2)", "theta*0"),
        case("1/0 + theta", "(1/0)+theta"),
        case("f(1+1)", "f(2)"),
        case("sqrt(4)*theta", "2*theta"),
    )]
    fn simplifies(input: &str, expected: &str) {
        let simplified = Expression::from_str(input).unwrap().simplify();
        assert_eq!(simplified.to_qasm().unwrap(), expected);
    }
}
