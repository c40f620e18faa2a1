//! Closed-form distance dependence of the Slater-Koster integrals. Every family takes
//! four parameters per integral channel and is damped by the smooth cutoff
//! `fc(r) = 1 / (1 + exp((r - rs) / w))`.
//!
//! | name        | h(r) / fc(r)                                          |
//! |-------------|-------------------------------------------------------|
//! | `poly2pow`  | (a1 + a2 dr + a3 dr^2 / 2) (r0/r)^(1+\|a4\|)          |
//! | `varTang96` | a1 (r0/r)^(1+\|a2\|) exp(-\|a3\| ((r/r0)^\|a4\| - 1)) |
//! | `powerlaw`  | a1 (r0/r)^(1+\|a2\|) + a3 (r0/r)^(2+\|a2\|+\|a4\|)    |
//! | `NRL`       | (a1 + a2 r + a3 r^2) exp(-a4^2 r)                     |
//!
//! with dr = r - r0.

use crate::defaults::MIN_DISTANCE;
use crate::error::{FitError, Result};
use ndarray::prelude::*;
use serde::{Deserialize, Serialize};
use std::convert::TryFrom;
use std::fmt;
use std::str::FromStr;

/// Number of parameters per integral channel.
pub const NUM_PARAS: usize = 4;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum HoppingFormula {
    Poly2Pow,
    VarTang96,
    Powerlaw,
    Nrl,
}

impl Default for HoppingFormula {
    fn default() -> Self {
        HoppingFormula::Poly2Pow
    }
}

/// |x| and its derivative, which is taken as 0 at x = 0.
fn abs_with_sign(x: f64) -> (f64, f64) {
    let sign: f64 = if x > 0.0 {
        1.0
    } else if x < 0.0 {
        -1.0
    } else {
        0.0
    };
    (x.abs(), sign)
}

/// Smooth Fermi-like cutoff function.
pub fn smooth_cutoff(r: f64, rs: f64, w: f64) -> f64 {
    1.0 / (1.0 + ((r - rs) / w).exp())
}

impl HoppingFormula {
    pub fn name(&self) -> &'static str {
        match self {
            HoppingFormula::Poly2Pow => "poly2pow",
            HoppingFormula::VarTang96 => "varTang96",
            HoppingFormula::Powerlaw => "powerlaw",
            HoppingFormula::Nrl => "NRL",
        }
    }

    pub fn num_paras(&self) -> usize {
        NUM_PARAS
    }

    /// Value of the integral at distance `r` for the parameters `p` of one channel.
    pub fn eval(&self, r: f64, p: ArrayView1<f64>, rs: f64, w: f64, r0: f64) -> f64 {
        self.radial(r.max(MIN_DISTANCE), p, r0).0 * smooth_cutoff(r, rs, w)
    }

    /// Value of the integral and its derivatives with respect to the parameters.
    pub fn eval_with_grad(
        &self,
        r: f64,
        p: ArrayView1<f64>,
        rs: f64,
        w: f64,
        r0: f64,
    ) -> (f64, [f64; NUM_PARAS]) {
        let fc: f64 = smooth_cutoff(r, rs, w);
        let (value, mut grad) = self.radial(r.max(MIN_DISTANCE), p, r0);
        grad.iter_mut().for_each(|g| *g *= fc);
        (value * fc, grad)
    }

    /// The formula without the cutoff function.
    fn radial(&self, r: f64, p: ArrayView1<f64>, r0: f64) -> (f64, [f64; NUM_PARAS]) {
        let x: f64 = r0 / r;
        let ln_x: f64 = x.ln();
        match self {
            HoppingFormula::Poly2Pow => {
                let dr: f64 = r - r0;
                let poly: f64 = p[0] + p[1] * dr + 0.5 * p[2] * dr.powi(2);
                let (a4, sign4) = abs_with_sign(p[3]);
                let pow: f64 = x.powf(1.0 + a4);
                (
                    poly * pow,
                    [pow, dr * pow, 0.5 * dr.powi(2) * pow, poly * pow * ln_x * sign4],
                )
            }
            HoppingFormula::VarTang96 => {
                let (a2, sign2) = abs_with_sign(p[1]);
                let (a3, sign3) = abs_with_sign(p[2]);
                let (a4, sign4) = abs_with_sign(p[3]);
                let y: f64 = r / r0;
                let y_a4: f64 = y.powf(a4);
                let pow: f64 = x.powf(1.0 + a2);
                let decay: f64 = (-a3 * (y_a4 - 1.0)).exp();
                let value: f64 = p[0] * pow * decay;
                (
                    value,
                    [
                        pow * decay,
                        value * ln_x * sign2,
                        -value * (y_a4 - 1.0) * sign3,
                        -value * a3 * y_a4 * y.ln() * sign4,
                    ],
                )
            }
            HoppingFormula::Powerlaw => {
                let (a2, sign2) = abs_with_sign(p[1]);
                let (a4, sign4) = abs_with_sign(p[3]);
                let pow1: f64 = x.powf(1.0 + a2);
                let pow2: f64 = x.powf(2.0 + a2 + a4);
                let value: f64 = p[0] * pow1 + p[2] * pow2;
                (
                    value,
                    [
                        pow1,
                        value * ln_x * sign2,
                        pow2,
                        p[2] * pow2 * ln_x * sign4,
                    ],
                )
            }
            HoppingFormula::Nrl => {
                let poly: f64 = p[0] + p[1] * r + p[2] * r.powi(2);
                let decay: f64 = (-p[3].powi(2) * r).exp();
                (
                    poly * decay,
                    [
                        decay,
                        r * decay,
                        r.powi(2) * decay,
                        -2.0 * p[3] * r * poly * decay,
                    ],
                )
            }
        }
    }
}

impl FromStr for HoppingFormula {
    type Err = FitError;

    fn from_str(name: &str) -> Result<Self> {
        match name {
            "poly2pow" => Ok(HoppingFormula::Poly2Pow),
            "varTang96" => Ok(HoppingFormula::VarTang96),
            "powerlaw" => Ok(HoppingFormula::Powerlaw),
            "NRL" => Ok(HoppingFormula::Nrl),
            _ => Err(FitError::config(format!(
                "unknown formula type '{}', available: poly2pow, varTang96, powerlaw, NRL",
                name
            ))),
        }
    }
}

impl TryFrom<String> for HoppingFormula {
    type Error = FitError;

    fn try_from(name: String) -> Result<Self> {
        name.parse()
    }
}

impl From<HoppingFormula> for String {
    fn from(formula: HoppingFormula) -> Self {
        formula.name().to_string()
    }
}

impl fmt::Display for HoppingFormula {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::numerical::assert_deriv;
    use approx::assert_abs_diff_eq;

    const FORMULAS: [HoppingFormula; 4] = [
        HoppingFormula::Poly2Pow,
        HoppingFormula::VarTang96,
        HoppingFormula::Powerlaw,
        HoppingFormula::Nrl,
    ];

    #[test]
    fn names_round_trip() {
        for formula in FORMULAS.iter() {
            assert_eq!(formula.name().parse::<HoppingFormula>().unwrap(), *formula);
        }
        assert!("tang".parse::<HoppingFormula>().is_err());
    }

    #[test]
    fn analytic_gradients_agree_with_finite_differences() {
        let origin: Array1<f64> = array![-1.3, 0.7, 0.4, 0.9];
        for formula in FORMULAS.iter() {
            for r in [0.8, 1.5, 2.9].iter() {
                let value = |p: Array1<f64>| formula.eval(*r, p.view(), 6.0, 0.3, 1.55);
                let gradient = |p: Array1<f64>| {
                    Array1::from(formula.eval_with_grad(*r, p.view(), 6.0, 0.3, 1.55).1.to_vec())
                };
                assert_deriv(value, gradient, origin.clone(), 0.01, 1e-6);
            }
        }
    }

    #[test]
    fn cutoff_suppresses_long_distances() {
        let p: Array1<f64> = array![1.0, 0.5, 0.2, 0.3];
        for formula in FORMULAS.iter() {
            let far = formula.eval(12.0, p.view(), 6.0, 0.2, 1.5);
            assert_abs_diff_eq!(far, 0.0, epsilon = 1e-10);
        }
    }

    #[test]
    fn short_distances_stay_finite() {
        let p: Array1<f64> = array![1.0, 0.5, 0.2, 0.3];
        for formula in FORMULAS.iter() {
            let (value, grad) = formula.eval_with_grad(0.0, p.view(), 6.0, 0.2, 1.5);
            assert!(value.is_finite());
            assert!(grad.iter().all(|g| g.is_finite()));
        }
    }
}
