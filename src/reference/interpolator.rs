use crate::error::{FitError, Result};
use crate::param::Spline;
use ndarray::prelude::*;

/// Continuous representation of tabulated Slater-Koster integrals. Every integral channel
/// is splined on the distance grid of the table. Below the first grid point the value of
/// the first point is returned and beyond the last grid point the integrals vanish.
#[derive(Clone, Debug)]
pub struct HoppingIntp {
    splines: Vec<Spline>,
    rmin: f64,
    rmax: f64,
    /// values at the first grid point
    head: Array1<f64>,
}

impl HoppingIntp {
    /// `values` holds one row per integral channel and one column per grid point.
    pub fn new(grid: &[f64], values: ArrayView2<f64>) -> Result<Self> {
        if grid.len() < 4 {
            return Err(FitError::config(format!(
                "at least 4 grid points are needed for a cubic spline, got {}",
                grid.len()
            )));
        }
        if !grid.windows(2).all(|pair| pair[1] > pair[0]) {
            return Err(FitError::config("the distance grid is not strictly increasing"));
        }
        if values.ncols() != grid.len() {
            return Err(FitError::shape(
                "tabulated values per channel",
                grid.len(),
                values.ncols(),
            ));
        }
        let splines: Vec<Spline> = values
            .outer_iter()
            .map(|row| Spline::new(grid, &row.to_vec()))
            .collect();

        Ok(HoppingIntp {
            splines,
            rmin: grid[0],
            rmax: grid[grid.len() - 1],
            head: values.column(0).to_owned(),
        })
    }

    pub fn num_ingrls(&self) -> usize {
        self.splines.len()
    }

    /// Range of the tabulated distances.
    pub fn range(&self) -> (f64, f64) {
        (self.rmin, self.rmax)
    }

    /// Values of all channels at the distance `r`.
    pub fn eval(&self, r: f64) -> Array1<f64> {
        if r <= self.rmin {
            self.head.clone()
        } else if r > self.rmax {
            Array1::zeros(self.num_ingrls())
        } else {
            self.splines.iter().map(|spline| spline.eval(r)).collect()
        }
    }

    /// Values of all channels for a set of distances, `[n_r, n_channels]`.
    pub fn eval_batch(&self, r: ArrayView1<f64>) -> Array2<f64> {
        let mut out: Array2<f64> = Array2::zeros((r.len(), self.num_ingrls()));
        for (mut row, ri) in out.outer_iter_mut().zip(r.iter()) {
            row.assign(&self.eval(*ri));
        }
        out
    }
}
