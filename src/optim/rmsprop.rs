use super::{check_gradient, Objective, Optimizer};
use crate::defaults::{OPTIMIZER_EPS, RMSPROP_ALPHA};
use crate::error::Result;
use ndarray::prelude::*;
use ndarray::Zip;

/// RMSprop with optional momentum:
/// v = alpha v + (1 - alpha) g^2, b = momentum b + g / (sqrt(v) + eps), x = x - lr b
pub struct RmsProp {
    lr: f64,
    alpha: f64,
    eps: f64,
    momentum: f64,
    square_avg: Option<Array1<f64>>,
    buffer: Option<Array1<f64>>,
}

impl RmsProp {
    pub fn new(lr: f64, momentum: f64) -> Self {
        RmsProp {
            lr,
            alpha: RMSPROP_ALPHA,
            eps: OPTIMIZER_EPS,
            momentum,
            square_avg: None,
            buffer: None,
        }
    }
}

impl Optimizer for RmsProp {
    fn step(&mut self, params: &mut Array1<f64>, objective: &mut Objective) -> Result<f64> {
        let (loss, grad) = objective(params.view())?;
        check_gradient(params, &grad)?;
        let n: usize = params.len();

        let alpha: f64 = self.alpha;
        let square_avg = self.square_avg.get_or_insert_with(|| Array1::zeros(n));
        square_avg.zip_mut_with(&grad, |v, g| *v = alpha * *v + (1.0 - alpha) * g * g);
        let eps: f64 = self.eps;
        let scaled: Array1<f64> = Zip::from(&grad)
            .and(&*square_avg)
            .map_collect(|g, v| g / (v.sqrt() + eps));

        if self.momentum > 0.0 {
            let momentum: f64 = self.momentum;
            let buffer = self.buffer.get_or_insert_with(|| Array1::zeros(n));
            buffer.zip_mut_with(&scaled, |b, s| *b = momentum * *b + s);
            params.scaled_add(-self.lr, &*buffer);
        } else {
            params.scaled_add(-self.lr, &scaled);
        }
        Ok(loss)
    }

    fn learning_rate(&self) -> f64 {
        self.lr
    }

    fn set_learning_rate(&mut self, lr: f64) {
        self.lr = lr;
    }

    fn name(&self) -> &'static str {
        "RMSprop"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optim::tests::{minimize, quadratic};
    use approx::assert_abs_diff_eq;

    #[test]
    fn first_step_is_scaled_by_the_running_average() {
        let mut optimizer = RmsProp::new(0.01, 0.0);
        let mut x: Array1<f64> = array![1.0];
        optimizer.step(&mut x, &mut quadratic).unwrap();
        // g = 2, v = 0.01 * 4, step = lr * g / sqrt(v) = 0.1
        assert_abs_diff_eq!(x[0], 0.9, epsilon = 1e-6);
    }

    #[test]
    fn rmsprop_decreases_the_loss() {
        let (loss, _) = minimize(&mut RmsProp::new(0.01, 0.2), 2000);
        assert!(loss < 1e-2);
    }
}
