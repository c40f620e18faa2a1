use super::{Cutoff, Dftb2Nnsk};
use crate::error::{FitError, Result};
use crate::nnsk::{HoppingOptions, NnskModel, OnsiteMethod};
use crate::param::onsite_db::onsite_energy;
use ndarray::prelude::*;
use serde_json::Value;

impl Dftb2Nnsk {
    /// NNSK model with the fitted hopping and overlap parameters. With
    /// `use_reference_onsite` the onsite energies are stored relative to the free-atom
    /// orbital energies, otherwise the DFTB onsite energies are taken as they are.
    pub fn to_nnsk(&self, use_reference_onsite: bool) -> Result<NnskModel> {
        let idx = self.index();
        let rs: Cutoff = match &self.config.rs {
            Some(rs) => rs.clone(),
            None => Cutoff::BondWise(
                idx.bond_types()
                    .iter()
                    .cloned()
                    .zip(self.cutoffs.iter().copied())
                    .collect(),
            ),
        };
        let onsite_method: OnsiteMethod = if use_reference_onsite {
            OnsiteMethod::Uniform
        } else {
            OnsiteMethod::UniformNoref
        };

        let dftb_onsite: ArrayView2<f64> = self.reference.onsite_energies();
        let mut onsite: Array3<f64> = Array3::zeros((idx.n_types(), idx.full_basis().len(), 1));
        for (itype, element) in idx.type_names().iter().enumerate() {
            for iorb in 0..idx.full_basis().len() {
                let orbital: &str = match idx.element_orbital(itype, iorb) {
                    Some(orbital) => orbital,
                    None => continue,
                };
                let base: f64 = if use_reference_onsite {
                    onsite_energy(*element, orbital).ok_or_else(|| {
                        FitError::config(format!(
                            "no free-atom energy of the {} orbital of {} available",
                            orbital, element
                        ))
                    })?
                } else {
                    0.0
                };
                onsite[[itype, iorb, 0]] = dftb_onsite[[itype, iorb]] - base;
            }
        }

        let mut model = NnskModel::new(
            idx.clone(),
            onsite_method,
            HoppingOptions {
                method: self.config.functype,
                rs,
                w: self.config.w,
            },
            true,
        );
        model.set_hopping_param(self.hopping_params.view())?;
        model.set_overlap_param(self.overlap_params.view())?;
        model.set_onsite_param(onsite.view())?;
        Ok(model)
    }

    /// JSON representation of the fitted model with onsite energies relative to the
    /// free atoms.
    pub fn to_json(&self) -> Result<Value> {
        Ok(self.to_nnsk(true)?.to_json())
    }
}
