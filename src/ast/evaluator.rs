use crate::ast::{ASTNode, Parser};
use crate::error::{Error, EvalError};
use crate::sampler::{self, AxisRange, LineSamples, SurfaceSamples};
use log::{debug, trace};
use lru::LruCache;
use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::sync::Arc;

pub type EvalResult = Result<f64, EvalError>;

/// Variable bindings for a single evaluation.
///
/// Built per call and never shared between threads; rebinding a name
/// overwrites its value in place, which keeps sweeps allocation-free.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Environment {
    bindings: Vec<(String, f64)>,
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style binding: `Environment::new().with("x", 3.0)`.
    pub fn with(mut self, name: &str, value: f64) -> Self {
        self.bind(name, value);
        self
    }

    pub fn bind(&mut self, name: &str, value: f64) {
        match self.bindings.iter_mut().find(|(bound, _)| bound == name) {
            Some((_, slot)) => *slot = value,
            None => self.bindings.push((name.to_string(), value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.bindings
            .iter()
            .find(|(bound, _)| bound == name)
            .map(|(_, value)| *value)
    }

    pub fn is_bound(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.bindings.iter().map(|(name, _)| name.as_str())
    }
}

impl From<&HashMap<String, f64>> for Environment {
    fn from(context: &HashMap<String, f64>) -> Self {
        context.iter().map(|(name, value)| (name.clone(), *value)).collect()
    }
}

impl FromIterator<(String, f64)> for Environment {
    fn from_iter<I: IntoIterator<Item = (String, f64)>>(iter: I) -> Self {
        let mut environment = Environment::new();
        for (name, value) in iter {
            environment.bind(&name, value);
        }
        environment
    }
}

/// Evaluates `ast` against `environment`.
///
/// Floating-point domain problems (division by zero, `sqrt(-1)`, `log(0)`)
/// are not errors: the IEEE-754 value is returned as is. The only failure is
/// a variable the environment does not bind. Operands are evaluated left to
/// right, so the first unbound name encountered is the one reported.
pub fn evaluate(ast: &ASTNode, environment: &Environment) -> EvalResult {
    match ast {
        ASTNode::Literal(value) => Ok(*value),
        ASTNode::Variable(name) => environment
            .get(name)
            .ok_or_else(|| EvalError::UnboundVariable(name.clone())),
        ASTNode::Constant(constant) => Ok(constant.value()),
        ASTNode::UnaryOperation { operator, operand } => {
            Ok(operator.apply(evaluate(operand, environment)?))
        }
        ASTNode::BinaryOperation {
            left,
            operator,
            right,
        } => {
            let left_value = evaluate(left, environment)?;
            let right_value = evaluate(right, environment)?;
            Ok(operator.apply(left_value, right_value))
        }
        ASTNode::FunctionCall { function, argument } => {
            Ok(function.apply(evaluate(argument, environment)?))
        }
    }
}

/// Parses and evaluates expression strings, memoizing parsed trees by their
/// exact source text.
///
/// The cache only saves parsing work; results are identical with or without
/// it. Failed parses are never cached.
pub struct Evaluator {
    cache: Option<LruCache<String, Arc<ASTNode>>>,
}

impl Evaluator {
    /// Creates a new `Evaluator` with a given maximum cache size. A size of
    /// zero disables memoization.
    pub fn new(max_cache_size: usize) -> Self {
        Self {
            cache: NonZeroUsize::new(max_cache_size).map(LruCache::new),
        }
    }

    /// Parse an expression string into a shareable AST.
    pub fn parse_expression(&mut self, expression: &str) -> Result<Arc<ASTNode>, Error> {
        let Some(cache) = self.cache.as_mut() else {
            return Ok(Arc::new(Parser::parse_expression(expression)?));
        };

        if let Some(ast) = cache.get(expression) {
            trace!("AST cache hit: {}", expression);
            return Ok(Arc::clone(ast));
        }

        let ast = Arc::new(Parser::parse_expression(expression)?);
        cache.put(expression.to_string(), Arc::clone(&ast));
        debug!("Cached AST for '{}' ({} entries)", expression, cache.len());
        Ok(ast)
    }

    /// Evaluates a given expression string against the provided bindings.
    ///
    /// # Returns
    ///
    /// * `Ok(f64)` if parsing and evaluation succeed (the value may be `NaN`
    ///   or infinite).
    /// * `Err(Error)` for lexical, syntax or unbound-variable failures.
    pub fn evaluate_expression(
        &mut self,
        expression: &str,
        environment: &Environment,
    ) -> Result<f64, Error> {
        let ast = self.parse_expression(expression)?;
        Ok(evaluate(&ast, environment)?)
    }

    /// Parses `expression` and sweeps `variable` across `[x_min, x_max]`.
    pub fn sample_line(
        &mut self,
        expression: &str,
        variable: &str,
        x_min: f64,
        x_max: f64,
        point_count: usize,
    ) -> Result<LineSamples, Error> {
        let ast = self.parse_expression(expression)?;
        Ok(sampler::sample_line(&ast, variable, x_min, x_max, point_count)?)
    }

    /// Parses `expression` and samples it over an `x`/`y` grid.
    pub fn sample_surface(
        &mut self,
        expression: &str,
        x_range: impl Into<AxisRange>,
        y_range: impl Into<AxisRange>,
        resolution: usize,
    ) -> Result<SurfaceSamples, Error> {
        let ast = self.parse_expression(expression)?;
        Ok(sampler::sample_surface(&ast, x_range, y_range, resolution)?)
    }

    pub fn cache_len(&self) -> usize {
        self.cache.as_ref().map_or(0, LruCache::len)
    }

    pub fn clear_cache(&mut self) {
        if let Some(cache) = self.cache.as_mut() {
            cache.clear();
        }
    }
}

impl Default for Evaluator {
    fn default() -> Self {
        Self::new(100)
    }
}
