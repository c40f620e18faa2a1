use super::{check_gradient, Objective, Optimizer};
use crate::error::Result;
use ndarray::prelude::*;

/// Plain gradient descent.
pub struct Sgd {
    lr: f64,
}

impl Sgd {
    pub fn new(lr: f64) -> Self {
        Sgd { lr }
    }
}

impl Optimizer for Sgd {
    fn step(&mut self, params: &mut Array1<f64>, objective: &mut Objective) -> Result<f64> {
        let (loss, grad) = objective(params.view())?;
        check_gradient(params, &grad)?;
        params.scaled_add(-self.lr, &grad);
        Ok(loss)
    }

    fn learning_rate(&self) -> f64 {
        self.lr
    }

    fn set_learning_rate(&mut self, lr: f64) {
        self.lr = lr;
    }

    fn name(&self) -> &'static str {
        "SGD"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optim::tests::minimize;

    #[test]
    fn sgd_converges_on_a_quadratic() {
        let (loss, _) = minimize(&mut Sgd::new(0.05), 500);
        assert!(loss < 1e-10);
    }
}
