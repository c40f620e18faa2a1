//! Bond-type index system. The element basis is mapped to type indices, ordered bond types
//! "A-B", a common (full) orbital basis and the integral channels of every orbital pair.
//! Parameter tensors are indexed by `[bond type, channel, formula parameter]`.

use crate::constants::ANGULAR_MOMENTA;
use crate::error::{FitError, Result};
use crate::param::Element;
use hashbrown::HashMap;
use itertools::Itertools;
use std::collections::BTreeMap;
use std::convert::TryFrom;
use std::ops::Range;

/// Valence orbitals of each element, e.g. {"B": ["2s", "2p"], "N": ["2s", "2p"]}.
pub type Basis = BTreeMap<String, Vec<String>>;

/// Angular momentum of an orbital label like "2s" or "3d".
pub fn angular_momentum(orbital: &str) -> Result<u8> {
    orbital
        .trim()
        .chars()
        .last()
        .and_then(|c| {
            ANGULAR_MOMENTA
                .iter()
                .position(|&l| l == c.to_ascii_lowercase())
        })
        .map(|l| l as u8)
        .ok_or_else(|| FitError::config(format!("invalid orbital label '{}'", orbital)))
}

/// Orbital of the full basis. There is one full orbital per angular momentum that occurs
/// in the basis of any element.
#[derive(Clone, Debug, PartialEq)]
pub struct FullOrbital {
    pub name: String,
    pub l: u8,
}

/// Pair of full orbitals (iorb <= jorb) and the range of integral channels it owns.
/// A pair of orbitals with angular momenta l_i, l_j has min(l_i, l_j) + 1 channels
/// (sigma, pi, delta).
#[derive(Clone, Debug, PartialEq)]
pub struct OrbitalPair {
    pub name: String,
    pub iorb: usize,
    pub jorb: usize,
    pub channels: Range<usize>,
}

impl OrbitalPair {
    pub fn is_diagonal(&self) -> bool {
        self.iorb == self.jorb
    }
}

#[derive(Clone, Debug)]
pub struct BondIndex {
    basis: Basis,
    /// Elements sorted by their atomic number. The position is the type index.
    type_names: Vec<Element>,
    bond_types: Vec<String>,
    bond_to_type: HashMap<String, usize>,
    /// bond index of "B-A" for every bond "A-B"
    reflection: Vec<usize>,
    full_basis: Vec<FullOrbital>,
    /// element orbital label for every full orbital, per type
    type_orbitals: Vec<Vec<Option<String>>>,
    orbpairs: Vec<OrbitalPair>,
    n_channels: usize,
}

impl BondIndex {
    pub fn new(basis: &Basis) -> Result<Self> {
        if basis.is_empty() {
            return Err(FitError::config("the basis is empty"));
        }
        let mut typed: Vec<(Element, &Vec<String>)> = basis
            .iter()
            .map(|(symbol, orbitals)| Ok((Element::try_from(symbol.as_str())?, orbitals)))
            .collect::<Result<_>>()?;
        typed.sort_by_key(|(element, _)| *element);
        if typed.windows(2).any(|pair| pair[0].0 == pair[1].0) {
            return Err(FitError::config("an element occurs twice in the basis"));
        }

        // angular momenta of the orbitals of each element, one shell per l at most
        let mut momenta: Vec<Vec<(String, u8)>> = Vec::with_capacity(typed.len());
        for (element, orbitals) in typed.iter() {
            if orbitals.is_empty() {
                return Err(FitError::config(format!("no orbitals given for {}", element)));
            }
            let mut current: Vec<(String, u8)> = Vec::with_capacity(orbitals.len());
            for orbital in orbitals.iter() {
                let l: u8 = angular_momentum(orbital)?;
                if current.iter().any(|(_, l_other)| *l_other == l) {
                    return Err(FitError::config(format!(
                        "{} has more than one {}-shell, only one shell per angular momentum \
                         is tabulated in the Slater-Koster files",
                        element, ANGULAR_MOMENTA[l as usize]
                    )));
                }
                current.push((orbital.trim().to_string(), l));
            }
            momenta.push(current);
        }

        let full_basis: Vec<FullOrbital> = (0..ANGULAR_MOMENTA.len() as u8)
            .filter(|l| momenta.iter().flatten().any(|(_, lo)| lo == l))
            .map(|l| FullOrbital {
                name: format!("1{}", ANGULAR_MOMENTA[l as usize]),
                l,
            })
            .collect();

        let type_orbitals: Vec<Vec<Option<String>>> = momenta
            .iter()
            .map(|orbitals| {
                full_basis
                    .iter()
                    .map(|full| {
                        orbitals
                            .iter()
                            .find(|(_, l)| *l == full.l)
                            .map(|(name, _)| name.clone())
                    })
                    .collect()
            })
            .collect();

        let mut orbpairs: Vec<OrbitalPair> = Vec::new();
        let mut n_channels: usize = 0;
        for (iorb, jorb) in (0..full_basis.len()).tuple_combinations::<(usize, usize)>()
            .chain((0..full_basis.len()).map(|i| (i, i)))
            .sorted()
        {
            let width: usize = full_basis[iorb].l.min(full_basis[jorb].l) as usize + 1;
            orbpairs.push(OrbitalPair {
                name: format!("{}-{}", full_basis[iorb].name, full_basis[jorb].name),
                iorb,
                jorb,
                channels: n_channels..n_channels + width,
            });
            n_channels += width;
        }

        let type_names: Vec<Element> = typed.iter().map(|(element, _)| *element).collect();
        let n_types: usize = type_names.len();
        let bond_types: Vec<String> = type_names
            .iter()
            .cartesian_product(type_names.iter())
            .map(|(a, b)| format!("{}-{}", a.symbol(), b.symbol()))
            .collect();
        let bond_to_type: HashMap<String, usize> = bond_types
            .iter()
            .enumerate()
            .map(|(idx, name)| (name.clone(), idx))
            .collect();
        let reflection: Vec<usize> = (0..bond_types.len())
            .map(|idx| (idx % n_types) * n_types + idx / n_types)
            .collect();

        Ok(BondIndex {
            basis: basis.clone(),
            type_names,
            bond_types,
            bond_to_type,
            reflection,
            full_basis,
            type_orbitals,
            orbpairs,
            n_channels,
        })
    }

    pub fn basis(&self) -> &Basis {
        &self.basis
    }

    pub fn type_names(&self) -> &[Element] {
        &self.type_names
    }

    pub fn n_types(&self) -> usize {
        self.type_names.len()
    }

    pub fn bond_types(&self) -> &[String] {
        &self.bond_types
    }

    pub fn n_bond_types(&self) -> usize {
        self.bond_types.len()
    }

    pub fn n_channels(&self) -> usize {
        self.n_channels
    }

    pub fn full_basis(&self) -> &[FullOrbital] {
        &self.full_basis
    }

    pub fn orbpairs(&self) -> &[OrbitalPair] {
        &self.orbpairs
    }

    /// Index of the bond type "A-B".
    pub fn bond_index(&self, bond: &str) -> Result<usize> {
        self.bond_to_type
            .get(bond)
            .copied()
            .ok_or_else(|| FitError::config(format!("the bond type {} is not in the basis", bond)))
    }

    /// Type indices of both atoms of a bond type.
    pub fn type_pair(&self, bond: usize) -> (usize, usize) {
        (bond / self.n_types(), bond % self.n_types())
    }

    pub fn bond_elements(&self, bond: usize) -> (Element, Element) {
        let (ia, ib) = self.type_pair(bond);
        (self.type_names[ia], self.type_names[ib])
    }

    /// Index of the reflected bond type "B-A".
    pub fn reflect(&self, bond: usize) -> usize {
        self.reflection[bond]
    }

    pub fn reflection(&self) -> &[usize] {
        &self.reflection
    }

    /// Orbital label of the element `itype` that maps onto the full orbital `iorb`.
    pub fn element_orbital(&self, itype: usize, iorb: usize) -> Option<&str> {
        self.type_orbitals[itype][iorb].as_deref()
    }

    /// Both orbitals of the pair exist on the atoms of the bond type.
    pub fn pair_is_present(&self, bond: usize, pair: &OrbitalPair) -> bool {
        let (ia, ib) = self.type_pair(bond);
        self.type_orbitals[ia][pair.iorb].is_some() && self.type_orbitals[ib][pair.jorb].is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn basis(entries: &[(&str, &[&str])]) -> Basis {
        entries
            .iter()
            .map(|(el, orbs)| (el.to_string(), orbs.iter().map(|o| o.to_string()).collect()))
            .collect()
    }

    #[test]
    fn bond_types_are_sorted_by_atomic_number() {
        let idx = BondIndex::new(&basis(&[("N", &["2s"]), ("B", &["2s"])])).unwrap();
        assert_eq!(idx.bond_types(), &["B-B", "B-N", "N-B", "N-N"]);
        assert_eq!(idx.bond_index("N-B").unwrap(), 2);
        assert_eq!(idx.type_pair(2), (1, 0));
        assert!(idx.bond_index("C-C").is_err());
    }

    #[test]
    fn reflection_is_an_involution() {
        let idx = BondIndex::new(&basis(&[
            ("H", &["1s"]),
            ("C", &["2s", "2p"]),
            ("N", &["2s", "2p"]),
        ]))
        .unwrap();
        for bond in 0..idx.n_bond_types() {
            assert_eq!(idx.reflect(idx.reflect(bond)), bond);
            let (a, b) = idx.bond_elements(bond);
            let (ra, rb) = idx.bond_elements(idx.reflect(bond));
            assert_eq!((a, b), (rb, ra));
        }
    }

    #[test]
    fn channels_of_sp_basis() {
        let idx = BondIndex::new(&basis(&[("B", &["2s", "2p"]), ("N", &["2s", "2p"])])).unwrap();
        let names: Vec<&str> = idx.orbpairs().iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["1s-1s", "1s-1p", "1p-1p"]);
        assert_eq!(idx.n_channels(), 4);
        assert_eq!(idx.orbpairs()[2].channels, 2..4);
    }

    #[test]
    fn missing_orbitals_are_detected() {
        let idx = BondIndex::new(&basis(&[("H", &["1s"]), ("C", &["2s", "2p"])])).unwrap();
        let sp = idx.orbpairs()[1].clone();
        assert!(!idx.pair_is_present(idx.bond_index("H-H").unwrap(), &sp));
        assert!(idx.pair_is_present(idx.bond_index("H-C").unwrap(), &sp));
        assert!(!idx.pair_is_present(idx.bond_index("C-H").unwrap(), &sp));
        assert_eq!(idx.element_orbital(0, 0), Some("1s"));
    }

    #[test]
    fn invalid_basis_is_rejected() {
        assert!(BondIndex::new(&basis(&[("B", &["2s", "3s"])])).is_err());
        assert!(BondIndex::new(&basis(&[("B", &["2f"])])).is_err());
        assert!(BondIndex::new(&basis(&[("Bx", &["2s"])])).is_err());
        assert!(BondIndex::new(&Basis::new()).is_err());
    }
}
