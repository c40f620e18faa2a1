use super::{check_gradient, Objective, Optimizer};
use crate::defaults::{ADAM_BETAS, OPTIMIZER_EPS};
use crate::error::Result;
use ndarray::prelude::*;
use ndarray::Zip;

/// Adam with bias-corrected first and second moment estimates.
pub struct Adam {
    lr: f64,
    betas: (f64, f64),
    eps: f64,
    iteration: i32,
    exp_avg: Option<Array1<f64>>,
    exp_avg_sq: Option<Array1<f64>>,
}

impl Adam {
    pub fn new(lr: f64) -> Self {
        Adam {
            lr,
            betas: ADAM_BETAS,
            eps: OPTIMIZER_EPS,
            iteration: 0,
            exp_avg: None,
            exp_avg_sq: None,
        }
    }
}

impl Optimizer for Adam {
    fn step(&mut self, params: &mut Array1<f64>, objective: &mut Objective) -> Result<f64> {
        let (loss, grad) = objective(params.view())?;
        check_gradient(params, &grad)?;
        let n: usize = params.len();
        let (beta1, beta2) = self.betas;
        self.iteration += 1;

        let exp_avg = self.exp_avg.get_or_insert_with(|| Array1::zeros(n));
        exp_avg.zip_mut_with(&grad, |m, g| *m = beta1 * *m + (1.0 - beta1) * g);
        let exp_avg_sq = self.exp_avg_sq.get_or_insert_with(|| Array1::zeros(n));
        exp_avg_sq.zip_mut_with(&grad, |v, g| *v = beta2 * *v + (1.0 - beta2) * g * g);

        let correction1: f64 = 1.0 - beta1.powi(self.iteration);
        let correction2: f64 = 1.0 - beta2.powi(self.iteration);
        let (lr, eps) = (self.lr, self.eps);
        Zip::from(params)
            .and(&*exp_avg)
            .and(&*exp_avg_sq)
            .for_each(|x, m, v| {
                *x -= lr * (m / correction1) / ((v / correction2).sqrt() + eps);
            });
        Ok(loss)
    }

    fn learning_rate(&self) -> f64 {
        self.lr
    }

    fn set_learning_rate(&mut self, lr: f64) {
        self.lr = lr;
    }

    fn name(&self) -> &'static str {
        "Adam"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optim::tests::{minimize, quadratic};
    use approx::assert_abs_diff_eq;

    #[test]
    fn first_step_has_the_size_of_the_learning_rate() {
        let mut optimizer = Adam::new(0.05);
        let mut x: Array1<f64> = array![1.0, 4.0];
        optimizer.step(&mut x, &mut quadratic).unwrap();
        assert_abs_diff_eq!(x, array![0.95, 3.95], epsilon = 1e-6);
    }

    #[test]
    fn adam_decreases_the_loss() {
        let (loss, _) = minimize(&mut Adam::new(0.05), 2000);
        assert!(loss < 1e-2);
    }
}
