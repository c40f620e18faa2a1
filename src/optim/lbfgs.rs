use super::{check_gradient, Objective, Optimizer};
use crate::defaults::{
    LBFGS_HISTORY_SIZE, LBFGS_MAX_ITER, LBFGS_TOLERANCE_CHANGE, LBFGS_TOLERANCE_GRAD,
};
use crate::error::Result;
use log::trace;
use ndarray::prelude::*;
use std::collections::VecDeque;

/// Limited-memory BFGS without line search. One call of `step` performs up to
/// `max_iter` iterations with a fixed step length `lr`, the curvature history is kept
/// between calls.
pub struct Lbfgs {
    lr: f64,
    max_iter: usize,
    max_eval: usize,
    history_size: usize,
    tolerance_grad: f64,
    tolerance_change: f64,
    // state
    n_iter: usize,
    direction: Option<Array1<f64>>,
    step_length: f64,
    prev_grad: Option<Array1<f64>>,
    h_diag: f64,
    /// pairs of step s_k and gradient difference y_k, together with 1 / (y_k s_k)
    history: VecDeque<(Array1<f64>, Array1<f64>, f64)>,
}

impl Lbfgs {
    pub fn new(lr: f64) -> Self {
        Lbfgs {
            lr,
            max_iter: LBFGS_MAX_ITER,
            max_eval: LBFGS_MAX_ITER * 5 / 4,
            history_size: LBFGS_HISTORY_SIZE,
            tolerance_grad: LBFGS_TOLERANCE_GRAD,
            tolerance_change: LBFGS_TOLERANCE_CHANGE,
            n_iter: 0,
            direction: None,
            step_length: lr,
            prev_grad: None,
            h_diag: 1.0,
            history: VecDeque::new(),
        }
    }

    /// Approximates -H^-1 g with the two-loop recursion.
    fn two_loop(&self, grad: &Array1<f64>) -> Array1<f64> {
        let mut q: Array1<f64> = -grad;
        let mut alphas: Vec<f64> = Vec::with_capacity(self.history.len());
        for (sk, yk, rho) in self.history.iter().rev() {
            let alpha: f64 = sk.dot(&q) * rho;
            q.scaled_add(-alpha, yk);
            alphas.push(alpha);
        }
        let mut r: Array1<f64> = q * self.h_diag;
        for ((sk, yk, rho), alpha) in self.history.iter().zip(alphas.iter().rev()) {
            let beta: f64 = yk.dot(&r) * rho;
            r.scaled_add(alpha - beta, sk);
        }
        r
    }
}

fn max_abs(values: &Array1<f64>) -> f64 {
    values.iter().fold(0.0, |acc: f64, v| acc.max(v.abs()))
}

impl Optimizer for Lbfgs {
    fn step(&mut self, params: &mut Array1<f64>, objective: &mut Objective) -> Result<f64> {
        let (orig_loss, mut grad) = objective(params.view())?;
        check_gradient(params, &grad)?;
        let mut loss: f64 = orig_loss;
        let mut func_evals: usize = 1;

        if max_abs(&grad) <= self.tolerance_grad {
            return Ok(orig_loss);
        }

        let mut iterations: usize = 0;
        while iterations < self.max_iter {
            iterations += 1;
            self.n_iter += 1;

            let direction: Array1<f64> = match (self.n_iter, &self.direction, &self.prev_grad) {
                (1, _, _) | (_, None, _) | (_, _, None) => {
                    self.h_diag = 1.0;
                    self.history.clear();
                    -&grad
                }
                (_, Some(d), Some(prev_grad)) => {
                    let yk: Array1<f64> = &grad - prev_grad;
                    let sk: Array1<f64> = d * self.step_length;
                    let ys: f64 = yk.dot(&sk);
                    if ys > 1e-10 {
                        if self.history.len() == self.history_size {
                            self.history.pop_front();
                        }
                        self.h_diag = ys / yk.dot(&yk);
                        self.history.push_back((sk, yk, 1.0 / ys));
                    }
                    self.two_loop(&grad)
                }
            };

            let prev_loss: f64 = loss;
            self.prev_grad = Some(grad.clone());
            self.step_length = if self.n_iter == 1 {
                (1.0 / grad.iter().map(|g| g.abs()).sum::<f64>()).min(1.0) * self.lr
            } else {
                self.lr
            };

            // directional derivative, stop if it is not a descent direction
            let gtd: f64 = grad.dot(&direction);
            if gtd > -self.tolerance_change {
                self.direction = Some(direction);
                break;
            }

            params.scaled_add(self.step_length, &direction);
            if iterations != self.max_iter {
                let (new_loss, new_grad) = objective(params.view())?;
                check_gradient(params, &new_grad)?;
                loss = new_loss;
                grad = new_grad;
                func_evals += 1;
            }
            let max_step: f64 = max_abs(&direction) * self.step_length;
            self.direction = Some(direction);
            trace!("L-BFGS iteration {:>4}: loss {:>18.10e}", self.n_iter, loss);

            if iterations == self.max_iter || func_evals >= self.max_eval {
                break;
            }
            if max_abs(&grad) <= self.tolerance_grad {
                break;
            }
            if max_step <= self.tolerance_change || (loss - prev_loss).abs() < self.tolerance_change
            {
                break;
            }
        }
        Ok(orig_loss)
    }

    fn learning_rate(&self) -> f64 {
        self.lr
    }

    fn set_learning_rate(&mut self, lr: f64) {
        self.lr = lr;
    }

    fn name(&self) -> &'static str {
        "LBFGS"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optim::tests::{minimize, quadratic};
    use approx::assert_abs_diff_eq;

    #[test]
    fn lbfgs_solves_a_quadratic() {
        let (loss, x) = minimize(&mut Lbfgs::new(1.0), 10);
        assert!(loss < 1e-8);
        assert_abs_diff_eq!(x, array![0.0, 1.0, 2.0], epsilon = 1e-4);
    }

    #[test]
    fn step_returns_the_initial_loss() {
        let mut optimizer = Lbfgs::new(1.0);
        let mut x: Array1<f64> = array![3.0, -2.0, 0.5];
        let initial: f64 = quadratic(x.view()).unwrap().0;
        let returned: f64 = optimizer.step(&mut x, &mut quadratic).unwrap();
        assert_abs_diff_eq!(initial, returned, epsilon = 1e-14);
        assert!(quadratic(x.view()).unwrap().0 < initial);
    }

    #[test]
    fn converged_parameters_are_not_moved() {
        let mut optimizer = Lbfgs::new(1.0);
        let mut x: Array1<f64> = array![0.0, 1.0, 2.0];
        optimizer.step(&mut x, &mut quadratic).unwrap();
        assert_eq!(x, array![0.0, 1.0, 2.0]);
    }
}
