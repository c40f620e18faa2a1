use crate::defaults::{ATOMIC_RADIUS, CAL_RCUTS, SMOOTH_WIDTH};
use crate::error::{FitError, Result};
use crate::formula::HoppingFormula;
use crate::index::{Basis, BondIndex};
use crate::param::radii::{covalent_radius, empirical_radius};
use crate::param::Element;
use enum_as_inner::EnumAsInner;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::convert::TryFrom;

/// Cutoff radius `rs` of the smooth cutoff function, either one value for all bond types
/// or one value per bond type "A-B". Serialized as a number or as a map.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, EnumAsInner)]
#[serde(untagged)]
pub enum Cutoff {
    Uniform(f64),
    BondWise(BTreeMap<String, f64>),
}

/// Source of the atomic radii for the reference bond length r0 = r(A) + r(B). Either the
/// name of a database ("cov" covalent radii, "v1" empirical radii) or a map
/// element -> radius in angstrom.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(untagged)]
pub enum AtomicRadius {
    Named(String),
    Custom(BTreeMap<String, Option<f64>>),
}

impl Default for AtomicRadius {
    fn default() -> Self {
        AtomicRadius::Named(String::from(ATOMIC_RADIUS))
    }
}

impl AtomicRadius {
    /// Radius of every element of `types` (in this order). Fails for unknown database
    /// names and for elements without a defined radius.
    pub fn resolve(&self, types: &[Element]) -> Result<Vec<f64>> {
        types
            .iter()
            .map(|element| {
                let radius: Option<f64> = match self {
                    AtomicRadius::Named(name) => match name.as_str() {
                        "cov" => covalent_radius(*element),
                        "v1" => empirical_radius(*element),
                        _ => {
                            return Err(FitError::config(format!(
                                "unknown atomic radius database '{}', available: cov, v1",
                                name
                            )))
                        }
                    },
                    AtomicRadius::Custom(radii) => radii
                        .iter()
                        .find(|(symbol, _)| {
                            Element::try_from(symbol.as_str()).ok() == Some(*element)
                        })
                        .and_then(|(_, radius)| *radius),
                };
                radius.ok_or_else(|| {
                    FitError::config(format!("the atomic radius of {} is not defined", element))
                })
            })
            .collect()
    }
}

fn default_w() -> f64 {
    SMOOTH_WIDTH
}
fn default_cal_rcuts() -> bool {
    CAL_RCUTS
}

/// Model options of the fit. The basis is the last field, as tables have to follow the
/// plain values in a TOML document.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct FitConfig {
    #[serde(default)]
    pub functype: HoppingFormula,
    #[serde(default = "default_w")]
    pub w: f64,
    #[serde(default = "default_cal_rcuts")]
    pub cal_rcuts: bool,
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default)]
    pub rs: Option<Cutoff>,
    #[serde(default)]
    pub atomic_radius: AtomicRadius,
    #[serde(default)]
    pub basis: Basis,
}

impl FitConfig {
    pub fn new(basis: Basis) -> Self {
        FitConfig {
            functype: HoppingFormula::default(),
            w: SMOOTH_WIDTH,
            cal_rcuts: CAL_RCUTS,
            seed: None,
            rs: None,
            atomic_radius: AtomicRadius::default(),
            basis,
        }
    }

    pub fn with_functype(mut self, functype: HoppingFormula) -> Self {
        self.functype = functype;
        self
    }

    pub fn with_cutoff(mut self, rs: Cutoff, w: f64) -> Self {
        self.rs = Some(rs);
        self.w = w;
        self
    }

    pub fn with_cal_rcuts(mut self, cal_rcuts: bool) -> Self {
        self.cal_rcuts = cal_rcuts;
        self
    }

    pub fn with_atomic_radius(mut self, atomic_radius: AtomicRadius) -> Self {
        self.atomic_radius = atomic_radius;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

/// Cutoff radius of every bond type. With `cal_rcuts` the cutoffs are the largest
/// tabulated distances `bond_r_max`, a user given map has to agree with them exactly.
/// Without `cal_rcuts` a single cutoff for all bond types is required.
pub(crate) fn resolve_cutoffs(
    config: &FitConfig,
    idx: &BondIndex,
    bond_r_max: &[f64],
) -> Result<Vec<f64>> {
    if config.w <= 0.0 {
        return Err(FitError::config(format!(
            "the smoothing width w must be positive, got {}",
            config.w
        )));
    }
    if config.cal_rcuts {
        match &config.rs {
            None => {}
            Some(Cutoff::Uniform(value)) => {
                return Err(FitError::config(format!(
                    "a single cutoff rs = {} can not be combined with cal_rcuts = true, \
                     give one cutoff per bond type or none",
                    value
                )))
            }
            Some(Cutoff::BondWise(map)) => {
                for (bond, r_max) in idx.bond_types().iter().zip(bond_r_max.iter()) {
                    match map.get(bond) {
                        Some(value) if value == r_max => {}
                        Some(value) => {
                            return Err(FitError::config(format!(
                                "the cutoff {} of {} differs from the largest tabulated \
                                 distance {}",
                                value, bond, r_max
                            )))
                        }
                        None => {
                            return Err(FitError::config(format!("no cutoff given for {}", bond)))
                        }
                    }
                }
            }
        }
        Ok(bond_r_max.to_vec())
    } else {
        match &config.rs {
            None => Err(FitError::config(
                "a cutoff rs is required unless cal_rcuts = true",
            )),
            Some(Cutoff::BondWise(_)) => Err(FitError::config(
                "cutoffs per bond type require cal_rcuts = true",
            )),
            Some(Cutoff::Uniform(value)) => Ok(vec![*value; idx.n_bond_types()]),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn basis() -> Basis {
        let mut basis = Basis::new();
        basis.insert("B".to_string(), vec!["2s".to_string()]);
        basis.insert("N".to_string(), vec!["2s".to_string()]);
        basis
    }

    fn elements(symbols: &[&str]) -> Vec<Element> {
        symbols
            .iter()
            .map(|s| Element::try_from(*s).unwrap())
            .collect()
    }

    #[test]
    fn named_radius_databases() {
        let cov = AtomicRadius::Named("cov".to_string())
            .resolve(&elements(&["B", "N"]))
            .unwrap();
        assert_eq!(cov, vec![0.84, 0.71]);
        let v1 = AtomicRadius::Named("v1".to_string())
            .resolve(&elements(&["B"]))
            .unwrap();
        assert_eq!(v1, vec![0.85]);
        assert!(AtomicRadius::Named("vdw".to_string())
            .resolve(&elements(&["B"]))
            .is_err());
    }

    #[test]
    fn missing_radius_names_the_element() {
        let mut radii: BTreeMap<String, Option<f64>> = BTreeMap::new();
        radii.insert("B".to_string(), Some(0.8));
        radii.insert("N".to_string(), None);
        let err = AtomicRadius::Custom(radii)
            .resolve(&elements(&["B", "N"]))
            .unwrap_err();
        assert!(err.to_string().contains("N"));
        assert!(AtomicRadius::Named("v1".to_string())
            .resolve(&elements(&["Ne"]))
            .is_err());
    }

    #[test]
    fn cutoff_resolution() {
        let idx = BondIndex::new(&basis()).unwrap();
        let r_max: Vec<f64> = vec![5.0, 5.5, 5.5, 6.0];

        let uniform = FitConfig::new(basis()).with_cutoff(Cutoff::Uniform(6.0), 1.0);
        assert_eq!(resolve_cutoffs(&uniform, &idx, &r_max).unwrap(), vec![6.0; 4]);
        assert!(resolve_cutoffs(&uniform.clone().with_cal_rcuts(true), &idx, &r_max).is_err());
        assert!(resolve_cutoffs(&FitConfig::new(basis()), &idx, &r_max).is_err());

        let derived = FitConfig::new(basis()).with_cal_rcuts(true);
        assert_eq!(resolve_cutoffs(&derived, &idx, &r_max).unwrap(), r_max);

        let mut map: BTreeMap<String, f64> = idx
            .bond_types()
            .iter()
            .cloned()
            .zip(r_max.iter().cloned())
            .collect();
        let agreeing = derived.clone().with_cutoff(Cutoff::BondWise(map.clone()), 0.2);
        assert!(resolve_cutoffs(&agreeing, &idx, &r_max).is_ok());
        assert!(resolve_cutoffs(&agreeing.with_cal_rcuts(false), &idx, &r_max).is_err());
        map.insert("N-B".to_string(), 5.4);
        let disagreeing = derived.with_cutoff(Cutoff::BondWise(map), 0.2);
        assert!(resolve_cutoffs(&disagreeing, &idx, &r_max).is_err());
    }

    #[test]
    fn cutoff_is_a_number_or_a_map() {
        let uniform: Cutoff = serde_json::from_str("6.5").unwrap();
        assert_eq!(uniform.as_uniform(), Some(&6.5));
        let map: Cutoff = serde_json::from_str(r#"{"B-B": 5.0}"#).unwrap();
        assert_eq!(map.as_bond_wise().map(|m| m.len()), Some(1));
    }

    #[test]
    fn defaults_are_filled_in() {
        let config: FitConfig = toml::from_str("[basis]\nB = [\"2s\"]\n").unwrap();
        assert_eq!(config.functype, HoppingFormula::Poly2Pow);
        assert_eq!(config.w, SMOOTH_WIDTH);
        assert_eq!(config.atomic_radius, AtomicRadius::Named("cov".to_string()));
        assert!(config.rs.is_none());
    }
}
