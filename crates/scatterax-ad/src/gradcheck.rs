//! Gradient checking utilities
//!
//! Verifies analytical gradients against finite differences. For a function
//! `f: x -> y` and an upstream gradient `grad_y`, the numerical gradient of
//! `L(x) = <grad_y, f(x)>` is compared elementwise with the analytical one.
//!
//! - **Central difference**: `f'(x) ≈ [f(x+h) - f(x-h)] / (2h)` (more accurate)
//! - **Forward difference**: `f'(x) ≈ [f(x+h) - f(x)] / h` (faster)
//!
//! # Example
//!
//! ```
//! use scatterax_ad::gradcheck::{check_gradient, GradCheckConfig};
//! use scatterax_core::DenseND;
//!
//! let f = |x: &DenseND<f64>| Ok(x.map(|v| v * v));
//! let df = |x: &DenseND<f64>, g: &DenseND<f64>| {
//!     let d: Vec<f64> = x.iter().zip(g.iter()).map(|(x, g)| 2.0 * x * g).collect();
//!     DenseND::from_vec(d, x.shape())
//! };
//!
//! let x = DenseND::from_vec(vec![1.0, 2.0, 3.0], &[3]).unwrap();
//! let g = DenseND::ones(&[3]);
//! let result = check_gradient(f, df, &x, &g, &GradCheckConfig::default()).unwrap();
//! assert!(result.passed);
//! ```

use anyhow::{anyhow, Result};
use scatterax_core::DenseND;
use scirs2_core::numeric::Float;

/// Gradient checking configuration
#[derive(Debug, Clone)]
pub struct GradCheckConfig {
    /// Step size for finite differences (default: 1e-5)
    pub epsilon: f64,

    /// Relative tolerance for gradient comparison (default: 1e-3)
    pub rtol: f64,

    /// Absolute tolerance for gradient comparison (default: 1e-5)
    pub atol: f64,

    /// Use central difference (more accurate but 2x slower)
    pub use_central_diff: bool,

    /// Log every mismatching element
    pub verbose: bool,
}

impl Default for GradCheckConfig {
    fn default() -> Self {
        Self {
            epsilon: 1e-5,
            rtol: 1e-3,
            atol: 1e-5,
            use_central_diff: true,
            verbose: false,
        }
    }
}

/// Result of gradient checking
#[derive(Debug)]
pub struct GradCheckResult {
    /// Maximum absolute difference between analytical and numerical gradients
    pub max_abs_diff: f64,

    /// Maximum relative difference
    pub max_rel_diff: f64,

    /// Whether the gradient check passed
    pub passed: bool,

    /// Number of elements checked
    pub num_elements: usize,

    /// Number of elements that failed the check
    pub num_failures: usize,
}

/// Check gradient using finite differences
///
/// # Arguments
///
/// * `f` - Forward function: x -> y
/// * `df` - Gradient function: (x, grad_y) -> grad_x
/// * `x` - Input tensor to check gradients at
/// * `grad_y` - Upstream gradient (∂L/∂y)
/// * `config` - Gradient checking configuration
pub fn check_gradient<T, F, G>(
    f: F,
    df: G,
    x: &DenseND<T>,
    grad_y: &DenseND<T>,
    config: &GradCheckConfig,
) -> Result<GradCheckResult>
where
    T: Float,
    F: Fn(&DenseND<T>) -> Result<DenseND<T>>,
    G: Fn(&DenseND<T>, &DenseND<T>) -> Result<DenseND<T>>,
{
    let analytical_grad = df(x, grad_y)?;

    if analytical_grad.shape() != x.shape() {
        return Err(anyhow!(
            "Gradient shape {:?} doesn't match input shape {:?}",
            analytical_grad.shape(),
            x.shape()
        ));
    }

    let numerical_grad = compute_numerical_gradient(f, x, grad_y, config)?;
    compare_gradients(&analytical_grad, &numerical_grad, config)
}

/// Compute the numerical gradient of `<grad_y, f(x)>` with respect to `x`
pub fn compute_numerical_gradient<T, F>(
    f: F,
    x: &DenseND<T>,
    grad_y: &DenseND<T>,
    config: &GradCheckConfig,
) -> Result<DenseND<T>>
where
    T: Float,
    F: Fn(&DenseND<T>) -> Result<DenseND<T>>,
{
    let epsilon = T::from(config.epsilon).ok_or_else(|| anyhow!("Failed to convert epsilon"))?;
    let base = x.to_vec();
    let y = if config.use_central_diff {
        None
    } else {
        Some(f(x)?)
    };

    let mut numerical = Vec::with_capacity(base.len());
    for idx in 0..base.len() {
        let mut plus = base.clone();
        plus[idx] = base[idx] + epsilon;
        let y_plus = f(&DenseND::from_vec(plus, x.shape())?)?;

        let contribution = match &y {
            None => {
                let mut minus = base.clone();
                minus[idx] = base[idx] - epsilon;
                let y_minus = f(&DenseND::from_vec(minus, x.shape())?)?;
                directional(grad_y, &y_plus, &y_minus)? / (epsilon + epsilon)
            }
            Some(y) => directional(grad_y, &y_plus, y)? / epsilon,
        };
        numerical.push(contribution);
    }

    DenseND::from_vec(numerical, x.shape())
}

/// `<g, a - b>`
fn directional<T: Float>(g: &DenseND<T>, a: &DenseND<T>, b: &DenseND<T>) -> Result<T> {
    if g.shape() != a.shape() || a.shape() != b.shape() {
        return Err(anyhow!(
            "Shape mismatch: {:?} vs {:?} vs {:?}",
            g.shape(),
            a.shape(),
            b.shape()
        ));
    }
    Ok(g
        .iter()
        .zip(a.iter().zip(b.iter()))
        .fold(T::zero(), |acc, (&g, (&a, &b))| acc + g * (a - b)))
}

/// Compare analytical and numerical gradients
pub fn compare_gradients<T>(
    analytical: &DenseND<T>,
    numerical: &DenseND<T>,
    config: &GradCheckConfig,
) -> Result<GradCheckResult>
where
    T: Float,
{
    if analytical.shape() != numerical.shape() {
        return Err(anyhow!(
            "Shape mismatch: {:?} vs {:?}",
            analytical.shape(),
            numerical.shape()
        ));
    }

    let mut max_abs_diff = 0.0_f64;
    let mut max_rel_diff = 0.0_f64;
    let mut num_failures = 0;

    for (idx, (a_val, n_val)) in analytical.iter().zip(numerical.iter()).enumerate() {
        let a = a_val
            .to_f64()
            .ok_or_else(|| anyhow!("Conversion error"))?;
        let n = n_val
            .to_f64()
            .ok_or_else(|| anyhow!("Conversion error"))?;

        let abs_diff = (a - n).abs();
        let rel_diff = if n.abs() > f64::EPSILON {
            abs_diff / n.abs()
        } else {
            abs_diff
        };

        max_abs_diff = max_abs_diff.max(abs_diff);
        max_rel_diff = max_rel_diff.max(rel_diff);

        if abs_diff > config.atol && rel_diff > config.rtol {
            num_failures += 1;
            if config.verbose {
                tracing::warn!(
                    element = idx,
                    analytical = a,
                    numerical = n,
                    abs_diff,
                    rel_diff,
                    "gradient mismatch"
                );
            }
        }
    }

    let passed = num_failures == 0;
    if config.verbose {
        tracing::info!(
            passed,
            num_failures,
            num_elements = analytical.len(),
            max_abs_diff,
            max_rel_diff,
            "gradient check finished"
        );
    }

    Ok(GradCheckResult {
        max_abs_diff,
        max_rel_diff,
        passed,
        num_elements: analytical.len(),
        num_failures,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gradcheck_identity() {
        let f = |x: &DenseND<f64>| Ok(x.clone());
        let df = |_x: &DenseND<f64>, grad_y: &DenseND<f64>| Ok(grad_y.clone());

        let x = DenseND::ones(&[2, 3]);
        let grad_y = DenseND::ones(&[2, 3]);

        let result = check_gradient(f, df, &x, &grad_y, &GradCheckConfig::default()).unwrap();
        assert!(result.passed, "Gradient check should pass for identity");
        assert!(result.max_abs_diff < 1e-6);
        assert_eq!(result.num_elements, 6);
    }

    #[test]
    fn test_gradcheck_forward_difference() {
        let f = |x: &DenseND<f64>| Ok(x.map(|v| 3.0 * v));
        let df = |_x: &DenseND<f64>, g: &DenseND<f64>| Ok(g.map(|v| 3.0 * v));

        let x = DenseND::from_vec(vec![1.0, -2.0], &[2]).unwrap();
        let g = DenseND::from_vec(vec![0.5, 2.0], &[2]).unwrap();
        let config = GradCheckConfig {
            use_central_diff: false,
            ..GradCheckConfig::default()
        };
        let result = check_gradient(f, df, &x, &g, &config).unwrap();
        assert!(result.passed);
    }

    #[test]
    fn test_gradcheck_detects_wrong_gradient() {
        let f = |x: &DenseND<f64>| Ok(x.map(|v| v * v));
        let df = |_x: &DenseND<f64>, g: &DenseND<f64>| Ok(g.clone());

        let x = DenseND::from_vec(vec![1.0, 2.0, 3.0, 4.0], &[2, 2]).unwrap();
        let g = DenseND::ones(&[2, 2]);
        let result = check_gradient(f, df, &x, &g, &GradCheckConfig::default()).unwrap();
        assert!(!result.passed);
        assert!(result.num_failures > 0);
    }

    #[test]
    fn test_gradcheck_shape_mismatch() {
        let f = |x: &DenseND<f64>| Ok(x.clone());
        let df = |_x: &DenseND<f64>, _g: &DenseND<f64>| Ok(DenseND::ones(&[5]));
        let x = DenseND::ones(&[2]);
        let g = DenseND::ones(&[2]);
        assert!(check_gradient(f, df, &x, &g, &GradCheckConfig::default()).is_err());
    }

    #[test]
    fn test_gradcheck_config_default() {
        let config = GradCheckConfig::default();
        assert_eq!(config.epsilon, 1e-5);
        assert_eq!(config.rtol, 1e-3);
        assert!(config.use_central_diff);
    }
}
