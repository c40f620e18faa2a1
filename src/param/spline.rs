use rusty_fitpack::{splev_uniform, splrep};
use serde::{Deserialize, Serialize};

/// Interpolating cubic B-spline through tabulated points, stored by its knots `t`,
/// coefficients `c` and degree `k`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Spline {
    t: Vec<f64>,
    c: Vec<f64>,
    k: usize,
}

impl Spline {
    pub fn new(x: &[f64], y: &[f64]) -> Self {
        let (t, c, k) = splrep(
            x.to_vec(),
            y.to_vec(),
            None,
            None,
            None,
            None,
            None,
            None,
            None,
            None,
            None,
            None,
        );
        Self { t, c, k }
    }

    pub fn eval(&self, x: f64) -> f64 {
        splev_uniform(&self.t, &self.c, self.k, x)
    }
}
