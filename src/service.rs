//! Request/response adapter between the dashboard and the evaluation engine.
//!
//! Every failure is converted into a `{ "success": false, "error": ... }`
//! response; nothing internal (debug output, backtraces) leaks into it.

use crate::ast::{ASTNode, Environment, Evaluator};
use crate::config::ServiceConfig;
use crate::error::{Error, EvalError};
use crate::normalizer::normalize;
use crate::sampler::{self, LineSamples, SurfaceSamples, X_VARIABLE, Y_VARIABLE};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Scalar,
    Line,
    Surface,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ranges {
    pub x: (f64, f64),
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<(f64, f64)>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EvaluationRequest {
    pub expression: String,
    #[serde(default)]
    pub mode: Mode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ranges: Option<Ranges>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolution: Option<usize>,
    /// Bindings for scalar mode.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub variables: HashMap<String, f64>,
    /// Run the text through [`normalize`] before parsing.
    #[serde(default)]
    pub spoken: bool,
}

impl EvaluationRequest {
    pub fn new(expression: &str, mode: Mode) -> Self {
        Self {
            expression: expression.to_string(),
            mode,
            ..Default::default()
        }
    }

    pub fn with_ranges(mut self, x: (f64, f64), y: Option<(f64, f64)>) -> Self {
        self.ranges = Some(Ranges { x, y });
        self
    }

    pub fn with_resolution(mut self, resolution: usize) -> Self {
        self.resolution = Some(resolution);
        self
    }

    pub fn with_variable(mut self, name: &str, value: f64) -> Self {
        self.variables.insert(name.to_string(), value);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScalarResponse {
    pub expression: String,
    pub success: bool,
    /// Present on success. May be `NaN` or infinite, which JSON renders as `null`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Sampled values aligned with the coordinate arrays. `None` marks a point
/// whose evaluation failed.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PlotValues {
    Line(Vec<Option<f64>>),
    Surface(Vec<Vec<Option<f64>>>),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlotResponse {
    pub success: bool,
    pub x: Vec<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y: Option<Vec<f64>>,
    pub z: PlotValues,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PlotResponse {
    fn failure(mode: Mode, error: String) -> Self {
        let (y, z) = match mode {
            Mode::Surface => (Some(Vec::new()), PlotValues::Surface(Vec::new())),
            _ => (None, PlotValues::Line(Vec::new())),
        };
        Self {
            success: false,
            x: Vec::new(),
            y,
            z,
            error: Some(error),
        }
    }
}

impl From<LineSamples> for PlotResponse {
    fn from(samples: LineSamples) -> Self {
        Self {
            success: true,
            x: samples.x,
            y: None,
            z: PlotValues::Line(samples.values.into_iter().map(Result::ok).collect()),
            error: None,
        }
    }
}

impl From<SurfaceSamples> for PlotResponse {
    fn from(samples: SurfaceSamples) -> Self {
        let z = samples
            .values
            .into_iter()
            .map(|row| row.into_iter().map(Result::ok).collect())
            .collect();
        Self {
            success: true,
            x: samples.x,
            y: Some(samples.y),
            z: PlotValues::Surface(z),
            error: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum EvaluationResponse {
    Scalar(ScalarResponse),
    Plot(PlotResponse),
}

impl EvaluationResponse {
    pub fn success(&self) -> bool {
        match self {
            EvaluationResponse::Scalar(response) => response.success,
            EvaluationResponse::Plot(response) => response.success,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            EvaluationResponse::Scalar(response) => response.error.as_deref(),
            EvaluationResponse::Plot(response) => response.error.as_deref(),
        }
    }
}

/// Answers evaluation requests, keeping parsed expressions memoized across
/// calls.
pub struct Service {
    evaluator: Evaluator,
    config: ServiceConfig,
}

impl Service {
    pub fn new(config: ServiceConfig) -> Self {
        Self {
            evaluator: Evaluator::new(config.cache_capacity),
            config,
        }
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    pub fn handle(&mut self, request: &EvaluationRequest) -> EvaluationResponse {
        let expression = if request.spoken {
            normalize(&request.expression)
        } else {
            request.expression.clone()
        };
        debug!("Handling {:?} request for '{}'", request.mode, expression);

        match request.mode {
            Mode::Scalar => EvaluationResponse::Scalar(self.scalar(expression, request)),
            Mode::Line | Mode::Surface => {
                let result = match request.mode {
                    Mode::Line => self.line(&expression, request),
                    _ => self.surface(&expression, request),
                };
                EvaluationResponse::Plot(result.unwrap_or_else(|err| {
                    warn!("Rejected {:?} request '{}': {}", request.mode, expression, err);
                    PlotResponse::failure(request.mode, err.to_string())
                }))
            }
        }
    }

    /// JSON in, JSON out. A body that is not a valid request yields a failed
    /// scalar response rather than an error.
    pub fn handle_json(&mut self, body: &str) -> Result<String, serde_json::Error> {
        let response = match serde_json::from_str::<EvaluationRequest>(body) {
            Ok(request) => self.handle(&request),
            Err(err) => {
                warn!("Malformed request: {}", err);
                EvaluationResponse::Scalar(ScalarResponse {
                    expression: String::new(),
                    success: false,
                    value: None,
                    error: Some(format!("invalid request: {}", err)),
                })
            }
        };
        serde_json::to_string(&response)
    }

    fn scalar(&mut self, expression: String, request: &EvaluationRequest) -> ScalarResponse {
        let environment = Environment::from(&request.variables);
        match self.evaluator.evaluate_expression(&expression, &environment) {
            Ok(value) => ScalarResponse {
                expression,
                success: true,
                value: Some(value),
                error: None,
            },
            Err(err) => {
                warn!("Rejected scalar request '{}': {}", expression, err);
                ScalarResponse {
                    expression,
                    success: false,
                    value: None,
                    error: Some(err.to_string()),
                }
            }
        }
    }

    fn line(&mut self, expression: &str, request: &EvaluationRequest) -> Result<PlotResponse, Error> {
        let ast = self.evaluator.parse_expression(expression)?;
        require_bound(&ast, &[X_VARIABLE])?;

        let (x_min, x_max) = request
            .ranges
            .as_ref()
            .map_or(self.config.line_range, |ranges| ranges.x);
        let points = request.resolution.unwrap_or(self.config.line_points);
        check_limit(points, self.config.max_line_points)?;

        let samples = sampler::sample_line(&ast, X_VARIABLE, x_min, x_max, points)?;
        Ok(samples.into())
    }

    fn surface(&mut self, expression: &str, request: &EvaluationRequest) -> Result<PlotResponse, Error> {
        let ast = self.evaluator.parse_expression(expression)?;
        require_bound(&ast, &[X_VARIABLE, Y_VARIABLE])?;

        let (x_range, y_range) = match &request.ranges {
            Some(ranges) => (ranges.x, ranges.y.unwrap_or(ranges.x)),
            None => (self.config.surface_range, self.config.surface_range),
        };
        let resolution = request
            .resolution
            .unwrap_or(self.config.surface_resolution);
        check_limit(resolution, self.config.max_surface_resolution)?;

        let samples = sampler::sample_surface(&ast, x_range, y_range, resolution)?;
        Ok(samples.into())
    }
}

impl Default for Service {
    fn default() -> Self {
        Self::new(ServiceConfig::default())
    }
}

/// A plot mode binds a fixed set of variables; anything else in the
/// expression would fail at every point, so it is rejected up front.
fn require_bound(ast: &ASTNode, bound: &[&str]) -> Result<(), Error> {
    match ast.variables().into_iter().find(|name| !bound.contains(name)) {
        Some(name) => Err(EvalError::UnboundVariable(name.to_string()).into()),
        None => Ok(()),
    }
}

fn check_limit(requested: usize, limit: usize) -> Result<(), Error> {
    if requested > limit {
        Err(Error::ResolutionLimit { requested, limit })
    } else {
        Ok(())
    }
}
