use std::collections::BTreeSet;
use std::fmt;

mod evaluator;
mod parser;
mod tokenizer;

pub use crate::functions::{Constant, Function};
pub use evaluator::{evaluate, Environment, EvalResult, Evaluator};
pub use parser::{parse, Parser, MAX_DEPTH};
pub use tokenizer::{tokenize, SpannedToken, Token};

/// Parsed expression tree. Each node owns its children; a tree is never
/// mutated after the parser builds it, so one tree may be evaluated from many
/// threads at once.
#[derive(Debug, Clone, PartialEq)]
pub enum ASTNode {
    Literal(f64),
    Variable(String),
    Constant(Constant),
    UnaryOperation {
        operator: UnaryOperator,
        operand: Box<ASTNode>,
    },
    BinaryOperation {
        left: Box<ASTNode>,
        operator: Operator,
        right: Box<ASTNode>,
    },
    FunctionCall {
        function: Function,
        argument: Box<ASTNode>,
    },
}

impl ASTNode {
    pub fn binary(left: ASTNode, operator: Operator, right: ASTNode) -> Self {
        ASTNode::BinaryOperation {
            left: Box::new(left),
            operator,
            right: Box::new(right),
        }
    }

    pub fn negate(operand: ASTNode) -> Self {
        ASTNode::UnaryOperation {
            operator: UnaryOperator::Negate,
            operand: Box::new(operand),
        }
    }

    pub fn call(function: Function, argument: ASTNode) -> Self {
        ASTNode::FunctionCall {
            function,
            argument: Box::new(argument),
        }
    }

    /// Names of all variables the expression references, in sorted order.
    pub fn variables(&self) -> BTreeSet<&str> {
        let mut names = BTreeSet::new();
        self.collect_variables(&mut names);
        names
    }

    fn collect_variables<'a>(&'a self, names: &mut BTreeSet<&'a str>) {
        match self {
            ASTNode::Variable(name) => {
                names.insert(name.as_str());
            }
            ASTNode::Literal(_) | ASTNode::Constant(_) => {}
            ASTNode::UnaryOperation { operand, .. } => operand.collect_variables(names),
            ASTNode::BinaryOperation { left, right, .. } => {
                left.collect_variables(names);
                right.collect_variables(names);
            }
            ASTNode::FunctionCall { argument, .. } => argument.collect_variables(names),
        }
    }
}

impl fmt::Display for ASTNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ASTNode::Literal(value) => write!(f, "{}", value),
            ASTNode::Variable(name) => f.write_str(name),
            ASTNode::Constant(constant) => write!(f, "{}", constant),
            ASTNode::UnaryOperation { operator, operand } => {
                write!(f, "({}{})", operator, operand)
            }
            ASTNode::BinaryOperation {
                left,
                operator,
                right,
            } => write!(f, "({} {} {})", left, operator, right),
            ASTNode::FunctionCall { function, argument } => {
                write!(f, "{}({})", function, argument)
            }
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum UnaryOperator {
    Negate,
}

impl UnaryOperator {
    pub fn apply(&self, operand: f64) -> f64 {
        match self {
            UnaryOperator::Negate => -operand,
        }
    }
}

impl fmt::Display for UnaryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnaryOperator::Negate => f.write_str("-"),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Operator {
    Add,
    Subtract,
    Multiply,
    Divide,
    Power,
}

impl Operator {
    /// Plain IEEE-754 arithmetic: `1/0` is `inf`, `0/0` is `NaN`.
    pub fn apply(&self, left: f64, right: f64) -> f64 {
        match self {
            Operator::Add => left + right,
            Operator::Subtract => left - right,
            Operator::Multiply => left * right,
            Operator::Divide => left / right,
            Operator::Power => left.powf(right),
        }
    }

    pub fn symbol(&self) -> char {
        match self {
            Operator::Add => '+',
            Operator::Subtract => '-',
            Operator::Multiply => '*',
            Operator::Divide => '/',
            Operator::Power => '^',
        }
    }
}

impl TryFrom<char> for Operator {
    type Error = String;

    fn try_from(value: char) -> Result<Self, Self::Error> {
        match value {
            '+' => Ok(Operator::Add),
            '-' => Ok(Operator::Subtract),
            '*' => Ok(Operator::Multiply),
            '/' => Ok(Operator::Divide),
            '^' => Ok(Operator::Power),
            _ => Err(format!("Unknown operator: {}", value)),
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operator_ieee_semantics() {
        assert_eq!(Operator::Divide.apply(1.0, 0.0), f64::INFINITY);
        assert_eq!(Operator::Divide.apply(-1.0, 0.0), f64::NEG_INFINITY);
        assert!(Operator::Divide.apply(0.0, 0.0).is_nan());
        assert_eq!(Operator::Power.apply(2.0, 10.0), 1024.0);
    }

    #[test]
    fn test_operator_from_symbol() {
        for symbol in ['+', '-', '*', '/', '^'] {
            let operator = Operator::try_from(symbol).unwrap();
            assert_eq!(operator.symbol(), symbol);
        }
        assert!(Operator::try_from('%').is_err());
    }

    #[test]
    fn test_variables_are_collected_once() {
        let ast = ASTNode::binary(
            ASTNode::call(Function::Sin, ASTNode::Variable("x".to_string())),
            Operator::Multiply,
            ASTNode::binary(
                ASTNode::Variable("y".to_string()),
                Operator::Add,
                ASTNode::Variable("x".to_string()),
            ),
        );
        let variables: Vec<_> = ast.variables().into_iter().collect();
        assert_eq!(variables, vec!["x", "y"]);
    }

    #[test]
    fn test_display_is_fully_parenthesized() {
        let ast = ASTNode::negate(ASTNode::binary(
            ASTNode::Literal(2.0),
            Operator::Power,
            ASTNode::Constant(Constant::Pi),
        ));
        assert_eq!(ast.to_string(), "(-(2 ^ pi))");
    }
}
