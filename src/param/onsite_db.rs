//! Orbital energies of the free, neutral atoms in eV (LDA, NIST atomic reference data).
//! These are the base values that are subtracted from the DFTB onsite energies when the
//! fitted model stores its onsite energies relative to the free atom.

use crate::param::Element;

/// (element, [(orbital, energy)])
const ONSITE_ENERGIES: [(&str, &[(&str, f64)]); 17] = [
    ("H", &[("1s", -6.353)]),
    ("Li", &[("2s", -2.874), ("2p", -1.082)]),
    ("Be", &[("2s", -5.600), ("2p", -2.098)]),
    ("B", &[("2s", -9.380), ("2p", -3.717)]),
    ("C", &[("2s", -13.639), ("2p", -5.420)]),
    ("N", &[("2s", -18.400), ("2p", -7.246)]),
    ("O", &[("2s", -23.711), ("2p", -9.208)]),
    ("F", &[("2s", -29.687), ("2p", -11.309)]),
    ("Na", &[("3s", -2.820), ("3p", -0.854)]),
    ("Mg", &[("3s", -4.782), ("3p", -1.368)]),
    ("Al", &[("3s", -7.831), ("3p", -2.784)]),
    ("Si", &[("3s", -10.878), ("3p", -4.163)]),
    ("P", &[("3s", -14.040), ("3p", -5.596)]),
    ("S", &[("3s", -17.251), ("3p", -7.106)]),
    ("Cl", &[("3s", -20.690), ("3p", -8.704)]),
    ("Ga", &[("4s", -9.258), ("4p", -2.737)]),
    ("As", &[("4s", -14.350), ("4p", -5.341)]),
];

/// Energy of the orbital `orbital` (e.g. "2s") of the free atom.
pub fn onsite_energy(element: Element, orbital: &str) -> Option<f64> {
    ONSITE_ENERGIES
        .iter()
        .find(|(symbol, _)| *symbol == element.symbol())
        .and_then(|(_, orbitals)| {
            orbitals
                .iter()
                .find(|(name, _)| *name == orbital)
                .map(|(_, energy)| *energy)
        })
}
