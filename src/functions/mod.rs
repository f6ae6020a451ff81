//! The closed table of functions and constants an expression may name.
//!
//! Names are resolved once, at parse time. Anything not listed here is
//! rejected by the parser, so evaluation never has to look a name up.

pub mod constants;

pub use constants::Constant;

use std::fmt;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Function {
    Sin,
    Cos,
    Tan,
    Sqrt,
    /// Natural logarithm.
    Log,
    Exp,
}

impl Function {
    pub const ALL: [Function; 6] = [
        Function::Sin,
        Function::Cos,
        Function::Tan,
        Function::Sqrt,
        Function::Log,
        Function::Exp,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Function::Sin => "sin",
            Function::Cos => "cos",
            Function::Tan => "tan",
            Function::Sqrt => "sqrt",
            Function::Log => "log",
            Function::Exp => "exp",
        }
    }

    /// Number of arguments the function takes. Every supported function is unary.
    pub fn arity(&self) -> usize {
        1
    }

    /// Applies the function. Domain violations (`sqrt(-1)`, `log(0)`) yield the
    /// IEEE-754 result (`NaN`, `-inf`) instead of an error.
    pub fn apply(&self, argument: f64) -> f64 {
        match self {
            Function::Sin => argument.sin(),
            Function::Cos => argument.cos(),
            Function::Tan => argument.tan(),
            Function::Sqrt => argument.sqrt(),
            Function::Log => argument.ln(),
            Function::Exp => argument.exp(),
        }
    }
}

impl TryFrom<&str> for Function {
    type Error = String;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Function::ALL
            .into_iter()
            .find(|function| function.name() == value)
            .ok_or_else(|| format!("Unknown function: {}", value))
    }
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_by_name() {
        for function in Function::ALL {
            assert_eq!(Function::try_from(function.name()), Ok(function));
        }
        assert!(Function::try_from("ln").is_err());
        assert!(Function::try_from("SIN").is_err());
    }

    #[test]
    fn test_domain_edges_propagate_sentinels() {
        assert!(Function::Sqrt.apply(-1.0).is_nan());
        assert!(Function::Log.apply(-1.0).is_nan());
        assert_eq!(Function::Log.apply(0.0), f64::NEG_INFINITY);
        assert_eq!(Function::Exp.apply(1000.0), f64::INFINITY);
    }

    #[test]
    fn test_log_is_natural() {
        assert!((Function::Log.apply(std::f64::consts::E) - 1.0).abs() < 1e-15);
        assert_eq!(Function::Log.apply(1.0), 0.0);
    }
}
