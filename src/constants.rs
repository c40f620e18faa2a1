// UNIT CONVERSION
// one bohr in angstrom
pub const BOHR_TO_ANGS: f64 = 0.52917721067;
// one hartree in electron volts
pub const HARTREE_TO_EV: f64 = 27.211386245988;

// chemical symbols ordered by their atomic number, Z = index + 1
pub const ATOM_NAMES: [&str; 86] = [
    "H", "He", "Li", "Be", "B", "C", "N", "O", "F", "Ne", "Na", "Mg", "Al", "Si", "P", "S", "Cl",
    "Ar", "K", "Ca", "Sc", "Ti", "V", "Cr", "Mn", "Fe", "Co", "Ni", "Cu", "Zn", "Ga", "Ge", "As",
    "Se", "Br", "Kr", "Rb", "Sr", "Y", "Zr", "Nb", "Mo", "Tc", "Ru", "Rh", "Pd", "Ag", "Cd", "In",
    "Sn", "Sb", "Te", "I", "Xe", "Cs", "Ba", "La", "Ce", "Pr", "Nd", "Pm", "Sm", "Eu", "Gd", "Tb",
    "Dy", "Ho", "Er", "Tm", "Yb", "Lu", "Hf", "Ta", "W", "Re", "Os", "Ir", "Pt", "Au", "Hg", "Tl",
    "Pb", "Bi", "Po", "At", "Rn",
];

// SLATER-KOSTER FILES
// number of tabulated integrals per kind (H or S) in a row of the simple SKF format
pub const SKF_N_INTEGRALS: usize = 10;
// column order of the integrals in a row of an A-B.skf file as (l_A, l_B, m)
pub const SKF_COLUMNS: [(u8, u8, u8); SKF_N_INTEGRALS] = [
    (2, 2, 0),
    (2, 2, 1),
    (2, 2, 2),
    (1, 2, 0),
    (1, 2, 1),
    (1, 1, 0),
    (1, 1, 1),
    (0, 2, 0),
    (0, 1, 0),
    (0, 0, 0),
];
// angular momentum labels
pub const ANGULAR_MOMENTA: [char; 3] = ['s', 'p', 'd'];
