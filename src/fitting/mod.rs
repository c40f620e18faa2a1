//! Fit of the closed-form hopping and overlap integrals of an NNSK model to the
//! tabulated Slater-Koster integrals of a DFTB parametrization.

mod checkpoint;
mod config;
mod export;
mod optimize;
mod sampling;
mod visualize;

pub use config::{AtomicRadius, Cutoff, FitConfig};
pub use optimize::{OptimizeOptions, OptimizeOptionsBuilder};
pub use sampling::truncated_normal;

use crate::error::{FitError, Result};
use crate::formula::{HoppingFormula, NUM_PARAS};
use crate::index::BondIndex;
use crate::reference::DftbReference;
use log::{debug, info};
use ndarray::prelude::*;
use ndarray_rand::rand_distr::StandardNormal;
use ndarray_rand::RandomExt;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::Path;

/// Parameter fitting engine. Owns one parameter tensor for the hopping and one for the
/// overlap integrals, both of shape `[n_bond_types, n_channels, NUM_PARAS]`.
pub struct Dftb2Nnsk {
    config: FitConfig,
    reference: DftbReference,
    /// r0 = r(A) + r(B) per bond type
    bond_r0: Vec<f64>,
    /// cutoff radius per bond type
    cutoffs: Vec<f64>,
    /// tabulated distance range per bond type, only kept with cal_rcuts
    bond_ranges: Option<Vec<(f64, f64)>>,
    hopping_params: Array3<f64>,
    overlap_params: Array3<f64>,
    rng: StdRng,
    last_loss: Option<f64>,
}

impl Dftb2Nnsk {
    pub fn new(config: FitConfig, skdata: &Path) -> Result<Self> {
        let reference: DftbReference = DftbReference::new(&config.basis, skdata)?;
        let idx: &BondIndex = reference.index();

        let radii: Vec<f64> = config.atomic_radius.resolve(idx.type_names())?;
        let bond_r0: Vec<f64> = (0..idx.n_bond_types())
            .map(|bond| {
                let (ia, ib) = idx.type_pair(bond);
                radii[ia] + radii[ib]
            })
            .collect();

        let cutoffs: Vec<f64> = config::resolve_cutoffs(&config, idx, reference.bond_r_max())?;
        let bond_ranges: Option<Vec<(f64, f64)>> = if config.cal_rcuts {
            Some(
                reference
                    .bond_r_min()
                    .iter()
                    .copied()
                    .zip(reference.bond_r_max().iter().copied())
                    .collect(),
            )
        } else {
            None
        };

        let mut rng: StdRng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let shape = (idx.n_bond_types(), idx.n_channels(), NUM_PARAS);
        let hopping_params: Array3<f64> = Array3::random_using(shape, StandardNormal, &mut rng);
        let overlap_params: Array3<f64> = Array3::random_using(shape, StandardNormal, &mut rng);

        info!("{: <25} {}", "formula:", config.functype);
        info!("{: <25} {}", "bond types:", idx.bond_types().join(", "));
        info!(
            "{: <25} {}",
            "orbital pairs:",
            idx.orbpairs()
                .iter()
                .map(|pair| pair.name.as_str())
                .collect::<Vec<&str>>()
                .join(", ")
        );
        info!("{: <25} {}", "integral channels:", idx.n_channels());
        for (bond, name) in idx.bond_types().iter().enumerate() {
            debug!(
                "{: <8} r0 = {:>8.4} A, rs = {:>8.4} A",
                name, bond_r0[bond], cutoffs[bond]
            );
        }

        Ok(Dftb2Nnsk {
            config,
            reference,
            bond_r0,
            cutoffs,
            bond_ranges,
            hopping_params,
            overlap_params,
            rng,
            last_loss: None,
        })
    }

    pub fn config(&self) -> &FitConfig {
        &self.config
    }

    pub fn index(&self) -> &BondIndex {
        self.reference.index()
    }

    pub fn reference(&self) -> &DftbReference {
        &self.reference
    }

    pub fn hopping_params(&self) -> ArrayView3<f64> {
        self.hopping_params.view()
    }

    pub fn overlap_params(&self) -> ArrayView3<f64> {
        self.overlap_params.view()
    }

    /// Cutoff radius of every bond type.
    pub fn cutoffs(&self) -> &[f64] {
        &self.cutoffs
    }

    /// Replaces both parameter tensors. The shapes must not change.
    pub fn set_params(&mut self, hopping: Array3<f64>, overlap: Array3<f64>) -> Result<()> {
        check_shape("hopping parameters", self.hopping_params.dim(), hopping.dim())?;
        check_shape("overlap parameters", self.overlap_params.dim(), overlap.dim())?;
        self.hopping_params = hopping;
        self.overlap_params = overlap;
        Ok(())
    }

    /// Hopping and overlap integrals of the fitted formula, both
    /// `[bonds.len(), n_samples, n_channels]`, for one row of distances per bond type
    /// in `bonds`.
    pub fn evaluate_step(
        &self,
        distances: ArrayView2<f64>,
        bonds: &[usize],
    ) -> Result<(Array3<f64>, Array3<f64>)> {
        self.check_bonds(distances, bonds)?;
        if let Some(Cutoff::BondWise(map)) = &self.config.rs {
            let r_max: &[f64] = self.reference.bond_r_max();
            for bond in bonds.iter() {
                let name: &str = &self.index().bond_types()[*bond];
                let consistent: bool = map
                    .get(name)
                    .map(|rs| (rs - r_max[*bond]).abs() <= 1e-8 * r_max[*bond].abs().max(1.0))
                    .unwrap_or(false);
                if !consistent {
                    return Err(FitError::config(format!(
                        "the cutoff of {} does not agree with the tabulated data",
                        name
                    )));
                }
            }
        }
        let model: FormulaModel = self.model();
        Ok((
            model.integrals(self.hopping_params.view(), bonds, distances),
            model.integrals(self.overlap_params.view(), bonds, distances),
        ))
    }

    /// Averages the parameters of every channel with identical orbitals on both sides with
    /// the same channel of the reflected bond type, so that A-B and B-A agree.
    pub fn symmetrize(&mut self) {
        let hopping: Array3<f64> = symmetrized(self.hopping_params.view(), self.reference.index());
        let overlap: Array3<f64> = symmetrized(self.overlap_params.view(), self.reference.index());
        self.hopping_params = hopping;
        self.overlap_params = overlap;
    }

    fn check_bonds(&self, distances: ArrayView2<f64>, bonds: &[usize]) -> Result<()> {
        if distances.nrows() != bonds.len() {
            return Err(FitError::shape(
                "rows of distances per bond type",
                bonds.len(),
                distances.nrows(),
            ));
        }
        let n_bonds: usize = self.index().n_bond_types();
        match bonds.iter().find(|bond| **bond >= n_bonds) {
            Some(bond) => Err(FitError::config(format!(
                "bond index {} out of range, there are {} bond types",
                bond, n_bonds
            ))),
            None => Ok(()),
        }
    }

    fn model(&self) -> FormulaModel {
        FormulaModel {
            formula: self.config.functype,
            bond_r0: &self.bond_r0,
            cutoffs: &self.cutoffs,
            w: self.config.w,
        }
    }
}

fn check_shape(
    context: &str,
    expected: (usize, usize, usize),
    found: (usize, usize, usize),
) -> Result<()> {
    if expected != found {
        let size = |(a, b, c): (usize, usize, usize)| a * b * c;
        return Err(FitError::Shape {
            context: format!("{}, expected {:?} found {:?}", context, expected, found),
            expected: size(expected),
            found: size(found),
        });
    }
    Ok(())
}

/// The fitted formula with everything it needs besides the parameters.
#[derive(Copy, Clone)]
struct FormulaModel<'a> {
    formula: HoppingFormula,
    bond_r0: &'a [f64],
    cutoffs: &'a [f64],
    w: f64,
}

impl<'a> FormulaModel<'a> {
    /// Integrals `[bonds.len(), n_samples, n_channels]`.
    fn integrals(
        &self,
        params: ArrayView3<f64>,
        bonds: &[usize],
        distances: ArrayView2<f64>,
    ) -> Array3<f64> {
        let n_channels: usize = params.dim().1;
        Array3::from_shape_fn((bonds.len(), distances.ncols(), n_channels), |(i, s, c)| {
            let bond: usize = bonds[i];
            self.formula.eval(
                distances[[i, s]],
                params.slice(s![bond, c, ..]),
                self.cutoffs[bond],
                self.w,
                self.bond_r0[bond],
            )
        })
    }

    /// Integrals and their derivatives with respect to the parameters,
    /// `[bonds.len(), n_samples, n_channels]` and `[bonds.len(), n_samples, n_channels, NUM_PARAS]`.
    fn integrals_with_grad(
        &self,
        params: ArrayView3<f64>,
        bonds: &[usize],
        distances: ArrayView2<f64>,
    ) -> (Array3<f64>, Array4<f64>) {
        let n_channels: usize = params.dim().1;
        let n_samples: usize = distances.ncols();
        let mut values: Array3<f64> = Array3::zeros((bonds.len(), n_samples, n_channels));
        let mut grads: Array4<f64> =
            Array4::zeros((bonds.len(), n_samples, n_channels, NUM_PARAS));
        for (i, bond) in bonds.iter().enumerate() {
            for s in 0..n_samples {
                for c in 0..n_channels {
                    let (value, grad) = self.formula.eval_with_grad(
                        distances[[i, s]],
                        params.slice(s![*bond, c, ..]),
                        self.cutoffs[*bond],
                        self.w,
                        self.bond_r0[*bond],
                    );
                    values[[i, s, c]] = value;
                    grads
                        .slice_mut(s![i, s, c, ..])
                        .assign(&ArrayView1::from(&grad[..]));
                }
            }
        }
        (values, grads)
    }
}

/// New parameter tensor in which the channels of identical orbitals are averaged over
/// each bond type and its reflection.
fn symmetrized(params: ArrayView3<f64>, idx: &BondIndex) -> Array3<f64> {
    let mut out: Array3<f64> = params.to_owned();
    for pair in idx.orbpairs().iter().filter(|pair| pair.is_diagonal()) {
        for bond in 0..idx.n_bond_types() {
            let reflected: usize = idx.reflect(bond);
            let mean: Array2<f64> = 0.5
                * (&params.slice(s![bond, pair.channels.clone(), ..])
                    + &params.slice(s![reflected, pair.channels.clone(), ..]));
            out.slice_mut(s![bond, pair.channels.clone(), ..])
                .assign(&mean);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::Basis;
    use std::path::PathBuf;

    pub(crate) fn skdata() -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/data/slakos")
    }

    pub(crate) fn basis(orbitals: &[&str]) -> Basis {
        let orbitals: Vec<String> = orbitals.iter().map(|o| o.to_string()).collect();
        let mut basis = Basis::new();
        basis.insert("B".to_string(), orbitals.clone());
        basis.insert("N".to_string(), orbitals);
        basis
    }

    pub(crate) fn engine(orbitals: &[&str]) -> Dftb2Nnsk {
        let config = FitConfig::new(basis(orbitals))
            .with_cutoff(Cutoff::Uniform(6.0), 1.0)
            .with_seed(42);
        Dftb2Nnsk::new(config, &skdata()).unwrap()
    }

    #[test]
    fn parameters_have_the_expected_shape() {
        let fit = engine(&["2s", "2p"]);
        assert_eq!(fit.hopping_params().dim(), (4, 4, NUM_PARAS));
        assert_eq!(fit.overlap_params().dim(), (4, 4, NUM_PARAS));
        assert_ne!(fit.hopping_params(), fit.overlap_params());
    }

    #[test]
    fn seeded_engines_are_identical() {
        assert_eq!(engine(&["2s"]).hopping_params(), engine(&["2s"]).hopping_params());
    }

    #[test]
    fn symmetrize_averages_reflected_bonds() {
        let mut fit = engine(&["2s", "2p"]);
        let before: Array3<f64> = fit.hopping_params().to_owned();
        fit.symmetrize();
        let idx = fit.index().clone();
        let (bn, nb) = (idx.bond_index("B-N").unwrap(), idx.bond_index("N-B").unwrap());
        // 1s-1s and 1p-1p channels
        for c in [0, 2, 3].iter() {
            let expected = 0.5 * (&before.slice(s![bn, *c, ..]) + &before.slice(s![nb, *c, ..]));
            assert_eq!(fit.hopping_params().slice(s![bn, *c, ..]), expected);
            assert_eq!(fit.hopping_params().slice(s![nb, *c, ..]), expected);
        }
        // the 1s-1p channel is left alone
        assert_eq!(fit.hopping_params().slice(s![bn, 1, ..]), before.slice(s![bn, 1, ..]));
    }

    #[test]
    fn symmetrize_is_idempotent() {
        let mut fit = engine(&["2s", "2p"]);
        fit.symmetrize();
        let snapshot = (fit.hopping_params().to_owned(), fit.overlap_params().to_owned());
        fit.symmetrize();
        assert_eq!(fit.hopping_params(), snapshot.0);
        assert_eq!(fit.overlap_params(), snapshot.1);
    }

    #[test]
    fn evaluate_step_checks_its_input() {
        let fit = engine(&["2s"]);
        let distances: Array2<f64> = array![[1.0, 2.0], [1.5, 2.5]];
        assert!(fit.evaluate_step(distances.view(), &[0]).is_err());
        assert!(fit.evaluate_step(distances.view(), &[0, 4]).is_err());
        let (h, s) = fit.evaluate_step(distances.view(), &[0, 3]).unwrap();
        assert_eq!(h.dim(), (2, 2, 1));
        assert_eq!(s.dim(), (2, 2, 1));
    }

    #[test]
    fn analytic_jacobian_matches_the_values() {
        let fit = engine(&["2s", "2p"]);
        let distances: Array2<f64> = array![[1.1, 2.3, 3.7]];
        let model = fit.model();
        let values = model.integrals(fit.hopping_params(), &[2], distances.view());
        let (with_grad, grads) = model.integrals_with_grad(fit.hopping_params(), &[2], distances.view());
        assert_eq!(values, with_grad);
        assert_eq!(grads.dim(), (1, 3, 4, NUM_PARAS));
    }

    #[test]
    fn invalid_parameter_shapes_are_rejected() {
        let mut fit = engine(&["2s"]);
        let wrong: Array3<f64> = Array3::zeros((4, 2, NUM_PARAS));
        let right: Array3<f64> = Array3::zeros((4, 1, NUM_PARAS));
        assert!(fit.set_params(wrong, right.clone()).is_err());
        assert!(fit.set_params(right.clone(), right).is_ok());
    }
}
