//! First-order optimizers and learning-rate schedulers that act on a flat parameter
//! vector. The objective is passed to [`Optimizer::step`] as a closure returning the
//! loss and its gradient, so that optimizers that need several evaluations per step
//! (L-BFGS) can call it repeatedly.

mod adam;
mod lbfgs;
mod rmsprop;
mod scheduler;
mod sgd;

pub use adam::Adam;
pub use lbfgs::Lbfgs;
pub use rmsprop::RmsProp;
pub use scheduler::{CosineAnnealingLr, ExponentialLr, LrScheduler, Scheduler};
pub use sgd::Sgd;

use crate::defaults::RMSPROP_MOMENTUM;
use crate::error::{FitError, Result};
use ndarray::prelude::*;

/// Loss and gradient of the objective at the given parameters.
pub type Objective<'a> = dyn FnMut(ArrayView1<f64>) -> Result<(f64, Array1<f64>)> + 'a;

pub trait Optimizer {
    /// Performs one optimization step in place and returns the loss at the parameters
    /// the step started from.
    fn step(&mut self, params: &mut Array1<f64>, objective: &mut Objective) -> Result<f64>;

    fn learning_rate(&self) -> f64;

    fn set_learning_rate(&mut self, lr: f64);

    fn name(&self) -> &'static str;
}

/// Creates an optimizer by its (case insensitive) name: SGD, RMSprop, Adam or LBFGS.
pub fn optimizer_by_name(name: &str, lr: f64) -> Result<Box<dyn Optimizer>> {
    match name.to_lowercase().as_str() {
        "sgd" => Ok(Box::new(Sgd::new(lr))),
        "rmsprop" => Ok(Box::new(RmsProp::new(lr, RMSPROP_MOMENTUM))),
        "adam" => Ok(Box::new(Adam::new(lr))),
        "lbfgs" => Ok(Box::new(Lbfgs::new(lr))),
        _ => Err(FitError::config(format!(
            "unknown optimizer '{}', available: SGD, RMSprop, Adam, LBFGS",
            name
        ))),
    }
}

/// Checks that the gradient returned by the objective matches the parameters.
pub(crate) fn check_gradient(params: &Array1<f64>, grad: &Array1<f64>) -> Result<()> {
    if params.len() != grad.len() {
        return Err(FitError::shape("gradient", params.len(), grad.len()));
    }
    Ok(())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// f(x) = sum_i c_i (x_i - i)^2 with c = 1, 2, 3, ...
    pub fn quadratic(x: ArrayView1<f64>) -> Result<(f64, Array1<f64>)> {
        let mut loss: f64 = 0.0;
        let mut grad: Array1<f64> = Array1::zeros(x.len());
        for (i, xi) in x.iter().enumerate() {
            let c: f64 = (i + 1) as f64;
            loss += c * (xi - i as f64).powi(2);
            grad[i] = 2.0 * c * (xi - i as f64);
        }
        Ok((loss, grad))
    }

    pub fn minimize(optimizer: &mut dyn Optimizer, nstep: usize) -> (f64, Array1<f64>) {
        let mut x: Array1<f64> = array![3.0, -2.0, 0.5];
        for _ in 0..nstep {
            optimizer.step(&mut x, &mut quadratic).unwrap();
        }
        (quadratic(x.view()).unwrap().0, x)
    }

    #[test]
    fn registry_ignores_case() {
        for name in ["rmsprop", "RMSprop", "ADAM", "sgd", "LBFGS"].iter() {
            assert!(optimizer_by_name(name, 0.1).is_ok());
        }
        assert_eq!(optimizer_by_name("RmSpRoP", 0.1).unwrap().name(), "RMSprop");
    }

    #[test]
    fn unknown_optimizer_is_a_configuration_error() {
        match optimizer_by_name("newton", 0.1) {
            Err(FitError::Config(_)) => {}
            _ => panic!("expected a configuration error"),
        }
    }

    #[test]
    fn wrong_gradient_length_is_rejected() {
        let mut optimizer = optimizer_by_name("sgd", 0.1).unwrap();
        let mut x: Array1<f64> = array![1.0, 2.0];
        let mut objective = |_: ArrayView1<f64>| Ok::<_, FitError>((0.0, Array1::<f64>::zeros(3)));
        assert!(optimizer.step(&mut x, &mut objective).is_err());
    }
}
