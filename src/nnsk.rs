//! Parametric Slater-Koster (NNSK) model as consumed by DeePTB. Only the parameter
//! containers and the JSON model format are provided here.

use crate::error::{FitError, Result};
use crate::fitting::Cutoff;
use crate::formula::{HoppingFormula, NUM_PARAS};
use crate::index::BondIndex;
use ndarray::prelude::*;
use serde_json::{json, Map, Value};
use std::fmt;

/// Version of the JSON model format.
pub const MODEL_VERSION: u32 = 2;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum OnsiteMethod {
    /// onsite energies relative to the free atom
    Uniform,
    /// absolute onsite energies
    UniformNoref,
}

impl OnsiteMethod {
    pub fn name(&self) -> &'static str {
        match self {
            OnsiteMethod::Uniform => "uniform",
            OnsiteMethod::UniformNoref => "uniform_noref",
        }
    }
}

impl fmt::Display for OnsiteMethod {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct HoppingOptions {
    pub method: HoppingFormula,
    pub rs: Cutoff,
    pub w: f64,
}

pub struct NnskModel {
    idx: BondIndex,
    onsite_method: OnsiteMethod,
    hopping_options: HoppingOptions,
    /// `[n_types, n_full_orbitals, 1]`
    onsite_param: Array3<f64>,
    /// `[n_bond_types, n_channels, NUM_PARAS]`
    hopping_param: Array3<f64>,
    overlap_param: Option<Array3<f64>>,
}

impl NnskModel {
    /// Model with zero parameters.
    pub fn new(
        idx: BondIndex,
        onsite_method: OnsiteMethod,
        hopping_options: HoppingOptions,
        overlap: bool,
    ) -> Self {
        let shape = (idx.n_bond_types(), idx.n_channels(), NUM_PARAS);
        let onsite_param: Array3<f64> = Array3::zeros((idx.n_types(), idx.full_basis().len(), 1));
        NnskModel {
            onsite_method,
            hopping_options,
            onsite_param,
            hopping_param: Array3::zeros(shape),
            overlap_param: if overlap {
                Some(Array3::zeros(shape))
            } else {
                None
            },
            idx,
        }
    }

    pub fn index(&self) -> &BondIndex {
        &self.idx
    }

    pub fn onsite_method(&self) -> OnsiteMethod {
        self.onsite_method
    }

    pub fn hopping_options(&self) -> &HoppingOptions {
        &self.hopping_options
    }

    pub fn onsite_param(&self) -> ArrayView3<f64> {
        self.onsite_param.view()
    }

    pub fn hopping_param(&self) -> ArrayView3<f64> {
        self.hopping_param.view()
    }

    pub fn overlap_param(&self) -> Option<ArrayView3<f64>> {
        self.overlap_param.as_ref().map(|param| param.view())
    }

    pub fn set_onsite_param(&mut self, param: ArrayView3<f64>) -> Result<()> {
        assign_checked(&mut self.onsite_param, param, "onsite parameters")
    }

    pub fn set_hopping_param(&mut self, param: ArrayView3<f64>) -> Result<()> {
        assign_checked(&mut self.hopping_param, param, "hopping parameters")
    }

    pub fn set_overlap_param(&mut self, param: ArrayView3<f64>) -> Result<()> {
        match self.overlap_param.as_mut() {
            Some(overlap) => assign_checked(overlap, param, "overlap parameters"),
            None => Err(FitError::config("the model has no overlap integrals")),
        }
    }

    /// The model in the JSON format of DeePTB (version 2).
    pub fn to_json(&self) -> Value {
        let mut onsite: Map<String, Value> = Map::new();
        for (itype, element) in self.idx.type_names().iter().enumerate() {
            for iorb in 0..self.idx.full_basis().len() {
                if let Some(orbital) = self.idx.element_orbital(itype, iorb) {
                    onsite.insert(
                        format!("{}-{}-0", element, orbital),
                        json!(self.onsite_param.slice(s![itype, iorb, ..]).to_vec()),
                    );
                }
            }
        }

        let mut model_params: Map<String, Value> = Map::new();
        model_params.insert("onsite".to_string(), Value::Object(onsite));
        model_params.insert(
            "hopping".to_string(),
            Value::Object(self.bond_params(self.hopping_param.view())),
        );
        if let Some(overlap) = &self.overlap_param {
            model_params.insert(
                "overlap".to_string(),
                Value::Object(self.bond_params(overlap.view())),
            );
        }

        json!({
            "version": MODEL_VERSION,
            "common_options": {
                "basis": self.idx.basis(),
                "overlap": self.overlap_param.is_some(),
            },
            "model_options": {
                "nnsk": {
                    "onsite": {"method": self.onsite_method.name()},
                    "hopping": {
                        "method": self.hopping_options.method.name(),
                        "rs": self.hopping_options.rs,
                        "w": self.hopping_options.w,
                    },
                    "freeze": false,
                    "push": false,
                }
            },
            "model_params": model_params,
        })
    }

    /// Parameters of every channel keyed by "A-B-orbA-orbB-m", for orbital pairs that
    /// exist on both atoms.
    fn bond_params(&self, params: ArrayView3<f64>) -> Map<String, Value> {
        let mut map: Map<String, Value> = Map::new();
        for (bond, name) in self.idx.bond_types().iter().enumerate() {
            let (ia, ib) = self.idx.type_pair(bond);
            for pair in self.idx.orbpairs().iter() {
                let orbitals = (
                    self.idx.element_orbital(ia, pair.iorb),
                    self.idx.element_orbital(ib, pair.jorb),
                );
                if let (Some(orb_a), Some(orb_b)) = orbitals {
                    for (m, channel) in pair.channels.clone().enumerate() {
                        map.insert(
                            format!("{}-{}-{}-{}", name, orb_a, orb_b, m),
                            json!(params.slice(s![bond, channel, ..]).to_vec()),
                        );
                    }
                }
            }
        }
        map
    }
}

fn assign_checked(target: &mut Array3<f64>, source: ArrayView3<f64>, context: &str) -> Result<()> {
    if target.dim() != source.dim() {
        return Err(FitError::shape(context, target.len(), source.len()));
    }
    target.assign(&source);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::Basis;

    fn model(overlap: bool) -> NnskModel {
        let mut basis = Basis::new();
        basis.insert("B".to_string(), vec!["2s".to_string(), "2p".to_string()]);
        basis.insert("H".to_string(), vec!["1s".to_string()]);
        NnskModel::new(
            BondIndex::new(&basis).unwrap(),
            OnsiteMethod::Uniform,
            HoppingOptions {
                method: HoppingFormula::Powerlaw,
                rs: Cutoff::Uniform(5.0),
                w: 0.1,
            },
            overlap,
        )
    }

    #[test]
    fn parameters_are_zero_initialised() {
        let model = model(true);
        assert_eq!(model.hopping_param().dim(), (4, 4, NUM_PARAS));
        assert_eq!(model.onsite_param().dim(), (2, 2, 1));
        assert!(model.hopping_param().iter().all(|p| *p == 0.0));
        assert!(model.overlap_param().is_some());
    }

    #[test]
    fn shapes_are_checked() {
        let mut model = model(false);
        assert!(model.set_hopping_param(Array3::zeros((4, 3, NUM_PARAS)).view()).is_err());
        assert!(model.set_overlap_param(Array3::zeros((4, 4, NUM_PARAS)).view()).is_err());
        assert!(model.set_onsite_param(Array3::ones((2, 2, 1)).view()).is_ok());
    }

    #[test]
    fn json_contains_only_existing_orbitals() {
        let mut model = model(true);
        let hopping: Array3<f64> = Array3::from_shape_fn((4, 4, NUM_PARAS), |(b, c, k)| {
            (100 * b + 10 * c + k) as f64
        });
        model.set_hopping_param(hopping.view()).unwrap();
        let json = model.to_json();

        assert_eq!(json["version"], 2);
        assert_eq!(json["model_options"]["nnsk"]["hopping"]["method"], "powerlaw");
        assert_eq!(json["model_options"]["nnsk"]["hopping"]["rs"], 5.0);
        assert_eq!(json["model_options"]["nnsk"]["onsite"]["method"], "uniform");
        assert_eq!(json["common_options"]["basis"]["B"][1], "2p");

        let onsite = json["model_params"]["onsite"].as_object().unwrap();
        assert_eq!(onsite.len(), 3);
        assert!(onsite.contains_key("H-1s-0"));

        // types are H (0) and B (1), the s-p channel of B-H has no p orbital on H
        let hopping = json["model_params"]["hopping"].as_object().unwrap();
        assert!(hopping.contains_key("H-B-1s-2p-0"));
        assert!(!hopping.contains_key("B-H-2p-1s-0"));
        assert_eq!(hopping["B-B-2p-2p-1"], json!([330.0, 331.0, 332.0, 333.0]));
        // H-H: 1, B-H: 1, H-B: 2, B-B: 4 channels
        assert_eq!(hopping.len(), 8);
        assert!(json["model_params"]["overlap"].is_object());
    }
}
