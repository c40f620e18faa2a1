//! Atomic radius databases in angstrom. The reference bond length of a bond A-B is the sum
//! of the radii of both atoms, r0 = r(A) + r(B).

use crate::param::Element;

/// Covalent radii, B. Cordero et al., Dalton Trans. 2008, 2832 (Z = 1 - 36).
const COVALENT_RADII: [f64; 36] = [
    0.31, 0.28, 1.28, 0.96, 0.84, 0.76, 0.71, 0.66, 0.57, 0.58, 1.66, 1.41, 1.21, 1.11, 1.07,
    1.05, 1.02, 1.06, 2.03, 1.76, 1.70, 1.60, 1.53, 1.39, 1.39, 1.32, 1.26, 1.24, 1.32, 1.22,
    1.22, 1.20, 1.19, 1.20, 1.20, 1.16,
];

/// Empirical atomic radii, J. C. Slater, J. Chem. Phys. 41, 3199 (1964). The noble gases
/// have no entry.
const EMPIRICAL_RADII: [Option<f64>; 36] = [
    Some(0.25), None, Some(1.45), Some(1.05), Some(0.85), Some(0.70), Some(0.65), Some(0.60),
    Some(0.50), None, Some(1.80), Some(1.50), Some(1.25), Some(1.10), Some(1.00), Some(1.00),
    Some(1.00), None, Some(2.20), Some(1.80), Some(1.60), Some(1.40), Some(1.35), Some(1.40),
    Some(1.40), Some(1.40), Some(1.35), Some(1.35), Some(1.35), Some(1.35), Some(1.30),
    Some(1.25), Some(1.15), Some(1.15), Some(1.15), None,
];

pub fn covalent_radius(element: Element) -> Option<f64> {
    COVALENT_RADII.get(element.number() as usize - 1).copied()
}

pub fn empirical_radius(element: Element) -> Option<f64> {
    EMPIRICAL_RADII
        .get(element.number() as usize - 1)
        .copied()
        .flatten()
}
