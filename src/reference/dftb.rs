use crate::error::{FitError, Result};
use crate::index::{Basis, BondIndex};
use crate::param::skf_handler::skf_column;
use crate::param::{SkfHandler, SkfTable};
use crate::reference::HoppingIntp;
use log::debug;
use ndarray::prelude::*;
use std::convert::TryFrom;
use std::path::Path;

/// Kind of two-center integral.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Integral {
    Hopping,
    Overlap,
}

/// Reference Slater-Koster integrals of the DFTB parametrization. For every bond type A-B
/// the integrals of all orbital-pair channels are interpolated from the file `A-B.skf`.
/// Channels of orbitals that do not exist on the atoms of a bond are zero.
#[derive(Clone, Debug)]
pub struct DftbReference {
    idx: BondIndex,
    hopping: Vec<HoppingIntp>,
    overlap: Vec<HoppingIntp>,
    bond_r_min: Vec<f64>,
    bond_r_max: Vec<f64>,
    /// onsite energies `[n_types, n_full_orbitals]` in eV
    onsite: Array2<f64>,
}

impl DftbReference {
    pub fn new(basis: &Basis, skdata: &Path) -> Result<Self> {
        let idx: BondIndex = BondIndex::new(basis)?;
        let n_bonds: usize = idx.n_bond_types();
        let n_channels: usize = idx.n_channels();

        let mut hopping: Vec<HoppingIntp> = Vec::with_capacity(n_bonds);
        let mut overlap: Vec<HoppingIntp> = Vec::with_capacity(n_bonds);
        let mut bond_r_min: Vec<f64> = Vec::with_capacity(n_bonds);
        let mut bond_r_max: Vec<f64> = Vec::with_capacity(n_bonds);
        let mut onsite: Array2<f64> = Array2::zeros((idx.n_types(), idx.full_basis().len()));

        for bond in 0..n_bonds {
            let (el_a, el_b) = idx.bond_elements(bond);
            let handler: SkfHandler = SkfHandler::new(el_a, el_b, skdata)?;
            let table: SkfTable = SkfTable::try_from(&handler)?;
            let n_grid: usize = table.grid.len();

            let mut h: Array2<f64> = Array2::zeros((n_channels, n_grid));
            let mut s: Array2<f64> = Array2::zeros((n_channels, n_grid));
            for pair in idx.orbpairs().iter() {
                if !idx.pair_is_present(bond, pair) {
                    continue;
                }
                let l_i: u8 = idx.full_basis()[pair.iorb].l;
                let l_j: u8 = idx.full_basis()[pair.jorb].l;
                for (m, channel) in pair.channels.clone().enumerate() {
                    let column: usize = skf_column(l_i, l_j, m as u8).ok_or_else(|| {
                        FitError::config(format!("no tabulated integral for {}", pair.name))
                    })?;
                    h.row_mut(channel).assign(&table.h.row(column));
                    s.row_mut(channel).assign(&table.s.row(column));
                }
            }

            if el_a == el_b {
                let (itype, _) = idx.type_pair(bond);
                let energies: [f64; 3] = table.onsite.ok_or_else(|| FitError::Parse {
                    file: handler.filename.display().to_string(),
                    message: "missing onsite energies".to_string(),
                })?;
                for (iorb, full) in idx.full_basis().iter().enumerate() {
                    if idx.element_orbital(itype, iorb).is_some() {
                        onsite[[itype, iorb]] = energies[full.l as usize];
                    }
                }
            }

            hopping.push(HoppingIntp::new(&table.grid, h.view())?);
            overlap.push(HoppingIntp::new(&table.grid, s.view())?);
            bond_r_min.push(table.grid[0]);
            bond_r_max.push(table.grid[n_grid - 1]);
            debug!(
                "{: <8} {:>4} grid points in [{:.4}, {:.4}] A",
                idx.bond_types()[bond],
                n_grid,
                table.grid[0],
                table.grid[n_grid - 1]
            );
        }

        Ok(DftbReference {
            idx,
            hopping,
            overlap,
            bond_r_min,
            bond_r_max,
            onsite,
        })
    }

    pub fn index(&self) -> &BondIndex {
        &self.idx
    }

    pub fn num_ingrls(&self) -> usize {
        self.idx.n_channels()
    }

    /// Smallest tabulated distance of every bond type.
    pub fn bond_r_min(&self) -> &[f64] {
        &self.bond_r_min
    }

    /// Largest tabulated distance of every bond type.
    pub fn bond_r_max(&self) -> &[f64] {
        &self.bond_r_max
    }

    pub fn onsite_energies(&self) -> ArrayView2<f64> {
        self.onsite.view()
    }

    fn table(&self, bond: usize, mode: Integral) -> Result<&HoppingIntp> {
        let tables: &[HoppingIntp] = match mode {
            Integral::Hopping => &self.hopping,
            Integral::Overlap => &self.overlap,
        };
        tables.get(bond).ok_or_else(|| {
            FitError::config(format!(
                "bond index {} out of range, there are {} bond types",
                bond,
                tables.len()
            ))
        })
    }

    /// Integrals `[n_pairs, n_channels]` for pairs of distance and bond index.
    pub fn evaluate(
        &self,
        distances: ArrayView1<f64>,
        bond_indices: &[usize],
        mode: Integral,
    ) -> Result<Array2<f64>> {
        if bond_indices.len() != distances.len() {
            return Err(FitError::shape(
                "bond indices per distance",
                distances.len(),
                bond_indices.len(),
            ));
        }
        let mut out: Array2<f64> = Array2::zeros((distances.len(), self.num_ingrls()));
        for ((mut row, r), bond) in out
            .outer_iter_mut()
            .zip(distances.iter())
            .zip(bond_indices.iter())
        {
            row.assign(&self.table(*bond, mode)?.eval(*r));
        }
        Ok(out)
    }

    /// Integrals `[n_bonds, n_samples, n_channels]` for a row of sampled distances per bond.
    pub fn evaluate_samples(
        &self,
        distances: ArrayView2<f64>,
        bond_indices: &[usize],
        mode: Integral,
    ) -> Result<Array3<f64>> {
        if bond_indices.len() != distances.nrows() {
            return Err(FitError::shape(
                "bond indices per row of distances",
                distances.nrows(),
                bond_indices.len(),
            ));
        }
        let mut out: Array3<f64> =
            Array3::zeros((distances.nrows(), distances.ncols(), self.num_ingrls()));
        for ((mut block, r), bond) in out
            .outer_iter_mut()
            .zip(distances.outer_iter())
            .zip(bond_indices.iter())
        {
            block.assign(&self.table(*bond, mode)?.eval_batch(r));
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::HARTREE_TO_EV;
    use approx::assert_abs_diff_eq;
    use std::path::PathBuf;

    fn skdata() -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/data/slakos")
    }

    fn basis(sp: bool) -> Basis {
        let orbitals: Vec<String> = if sp {
            vec!["2s".to_string(), "2p".to_string()]
        } else {
            vec!["2s".to_string()]
        };
        let mut basis = Basis::new();
        basis.insert("B".to_string(), orbitals.clone());
        basis.insert("N".to_string(), orbitals);
        basis
    }

    #[test]
    fn reference_has_one_table_per_bond() {
        let dftb = DftbReference::new(&basis(true), &skdata()).unwrap();
        assert_eq!(dftb.index().n_bond_types(), 4);
        assert_eq!(dftb.num_ingrls(), 4);
        assert_eq!(dftb.bond_r_max().len(), 4);
        assert!(dftb.bond_r_min().iter().zip(dftb.bond_r_max()).all(|(a, b)| a < b));
    }

    #[test]
    fn onsite_energies_are_read_from_homonuclear_files() {
        let dftb = DftbReference::new(&basis(true), &skdata()).unwrap();
        // B-B.skf: Es = -0.35 Ha, Ep = -0.1 Ha
        assert_abs_diff_eq!(dftb.onsite_energies()[[0, 0]], -0.35 * HARTREE_TO_EV, epsilon = 1e-10);
        assert_abs_diff_eq!(dftb.onsite_energies()[[0, 1]], -0.1 * HARTREE_TO_EV, epsilon = 1e-10);
    }

    #[test]
    fn evaluate_checks_the_number_of_bonds() {
        let dftb = DftbReference::new(&basis(false), &skdata()).unwrap();
        let r: Array1<f64> = array![1.0, 2.0, 3.0];
        assert!(dftb.evaluate(r.view(), &[0, 1], Integral::Hopping).is_err());
        let out = dftb.evaluate(r.view(), &[0, 1, 3], Integral::Overlap).unwrap();
        assert_eq!(out.dim(), (3, 1));
    }

    #[test]
    fn batched_and_pairwise_evaluation_agree() {
        let dftb = DftbReference::new(&basis(true), &skdata()).unwrap();
        let r: Array2<f64> = array![[1.2, 2.5], [1.7, 3.1]];
        let batched = dftb
            .evaluate_samples(r.view(), &[1, 2], Integral::Hopping)
            .unwrap();
        let single = dftb
            .evaluate(r.row(1), &[2, 2], Integral::Hopping)
            .unwrap();
        assert_abs_diff_eq!(batched.slice(s![1, .., ..]), single.view(), epsilon = 1e-14);
    }
}
