//! Closed-form gradient rules for the surrounding autodiff engine
//!
//! Most operations in this crate are differentiated by composing primitive
//! derivatives in the (external) autodiff engine. Matrix inversion is the
//! exception: it is not decomposed into differentiable primitives at this
//! layer, so its analytic derivative is registered here explicitly. The
//! registry is a table from operation identity to a closed-form rule,
//! looked up by the engine at backward time.

use crate::error::Result;
use crate::ops::matmul;
use crate::tensor::Tensor;
use std::collections::HashMap;

/// A closed-form gradient rule: maps the forward output and the upstream
/// gradient to the gradient with respect to the operation's input
pub type GradRule = fn(output: &Tensor, upstream: &Tensor) -> Result<Tensor>;

/// Registration table mapping operation identity to its gradient rule
pub struct GradRegistry {
    rules: HashMap<&'static str, GradRule>,
}

impl GradRegistry {
    /// An empty registry
    pub fn new() -> Self {
        Self {
            rules: HashMap::new(),
        }
    }

    /// A registry with the built-in rules registered
    pub fn with_builtin_rules() -> Self {
        let mut registry = Self::new();
        registry.register("invert", invert_grad);
        registry
    }

    /// Register (or replace) the rule for an operation
    pub fn register(&mut self, op: &'static str, rule: GradRule) {
        self.rules.insert(op, rule);
    }

    /// Look up the rule for an operation, if one is registered
    pub fn lookup(&self, op: &str) -> Option<GradRule> {
        self.rules.get(op).copied()
    }
}

impl Default for GradRegistry {
    fn default() -> Self {
        Self::with_builtin_rules()
    }
}

/// Gradient of `Y = invert(A)`: given upstream gradient `G`, the gradient
/// with respect to `A` is `-Yᴴ · G · Yᴴ`
pub fn invert_grad(output: &Tensor, upstream: &Tensor) -> Result<Tensor> {
    let yh = output.adjoint()?;
    Ok(matmul(&matmul(&yh, upstream)?, &yh)?.neg())
}
