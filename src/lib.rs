pub mod ast;
pub mod config;
pub mod error;
pub mod functions;
pub mod normalizer;
pub mod sampler;
pub mod service;

pub use ast::{evaluate, parse, tokenize, ASTNode, Environment, EvalResult, Evaluator, Parser};
pub use error::{Error, EvalError, LexError, ParseError, SampleError};
pub use normalizer::normalize;
pub use sampler::{sample_line, sample_surface, AxisRange, LineSamples, SurfaceSamples};

use std::collections::HashMap;

pub fn evaluate_expression(
    expression: &str,
    context: &HashMap<String, f64>,
) -> Result<f64, Error> {
    let ast = Parser::parse_expression(expression)?;
    Ok(evaluate(&ast, &Environment::from(context))?)
}
