use crate::constants::{BOHR_TO_ANGS, HARTREE_TO_EV, SKF_COLUMNS, SKF_N_INTEGRALS};
use crate::error::{FitError, Result};
use crate::param::Element;
use ndarray::prelude::*;
use std::convert::TryFrom;
use std::fs;
use std::path::{Path, PathBuf};

/// Raw content of the Slater-Koster file `A-B.skf` of an element pair.
#[derive(Clone)]
pub struct SkfHandler {
    pub el_a: Element,
    pub el_b: Element,
    pub filename: PathBuf,
    pub data_string: String,
}

impl SkfHandler {
    pub fn new(el_a: Element, el_b: Element, path_prefix: &Path) -> Result<SkfHandler> {
        let filename: PathBuf =
            path_prefix.join(format!("{}-{}.skf", el_a.symbol(), el_b.symbol()));
        if !filename.exists() {
            return Err(FitError::NotFound(filename));
        }
        let data: String = fs::read_to_string(&filename)?;

        Ok(SkfHandler {
            el_a,
            el_b,
            filename,
            data_string: data,
        })
    }

    fn parse_error<S: Into<String>>(&self, message: S) -> FitError {
        FitError::Parse {
            file: self.filename.display().to_string(),
            message: message.into(),
        }
    }
}

/// Converts a line into a list of column values respecting the format conventions used
/// in the Slater-Koster files (.skf). Note: In these files, zero columns are not written!
/// e.g. 4*0.0 has to be replaced by four columns with zeros "0.0 0.0 0.0 0.0".
pub fn process_slako_line(line: &str) -> std::result::Result<Vec<f64>, String> {
    let mut float_vec: Vec<f64> = Vec::new();
    for string in line
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|s| !s.is_empty())
    {
        if string.contains('*') {
            let temp: Vec<&str> = string.split('*').collect();
            if temp.len() != 2 {
                return Err(format!("invalid repetition '{}'", string));
            }
            let count: usize = temp[0]
                .trim()
                .parse::<usize>()
                .map_err(|e| format!("invalid repetition count in '{}': {}", string, e))?;
            let value: f64 = temp[1]
                .trim()
                .parse::<f64>()
                .map_err(|e| format!("invalid value in '{}': {}", string, e))?;
            float_vec.extend(std::iter::repeat(value).take(count));
        } else {
            let value: f64 = string
                .parse::<f64>()
                .map_err(|e| format!("invalid value '{}': {}", string, e))?;
            float_vec.push(value);
        }
    }
    Ok(float_vec)
}

/// Column of the integral (l_a, l_b, m) in a row of an SKF file. Only combinations with
/// `l_a <= l_b` are tabulated in `A-B.skf`.
pub fn skf_column(l_a: u8, l_b: u8, m: u8) -> Option<usize> {
    SKF_COLUMNS
        .iter()
        .position(|&column| column == (l_a, l_b, m))
}

/// Tabulated integrals of one SKF file. Distances are given in angstrom and energies in eV.
#[derive(Clone, Debug)]
pub struct SkfTable {
    /// Distances of the grid points.
    pub grid: Vec<f64>,
    /// Hamiltonian integrals `[SKF_N_INTEGRALS, n_grid]` in the column order of the file.
    pub h: Array2<f64>,
    /// Overlap integrals `[SKF_N_INTEGRALS, n_grid]`.
    pub s: Array2<f64>,
    /// Onsite energies ordered by angular momentum (s, p, d). Only homonuclear files
    /// contain this line.
    pub onsite: Option<[f64; 3]>,
}

impl TryFrom<&SkfHandler> for SkfTable {
    type Error = FitError;

    fn try_from(handler: &SkfHandler) -> Result<Self> {
        // Blank lines are not part of the format and are skipped.
        let mut lines = handler
            .data_string
            .lines()
            .filter(|line| !line.trim().is_empty());

        // The first line contains the grid distance and the number of grid points.
        let first_line: &str = lines
            .next()
            .ok_or_else(|| handler.parse_error("the file is empty"))?;
        if first_line.trim_start().starts_with('@') {
            return Err(handler.parse_error("the extended SKF format is not supported"));
        }
        let first: Vec<f64> = process_slako_line(first_line).map_err(|e| handler.parse_error(e))?;
        if first.len() < 2 || first[0] <= 0.0 || first[1] < 2.0 {
            return Err(handler.parse_error("invalid grid specification in the first line"));
        }
        let grid_dist: f64 = first[0];
        let npoints: usize = first[1] as usize;

        // Homonuclear files carry the onsite energies in the second line:
        // Ed Ep Es SPE Ud Up Us fd fp fs
        let onsite: Option<[f64; 3]> = if handler.el_a == handler.el_b {
            let line: &str = lines
                .next()
                .ok_or_else(|| handler.parse_error("missing onsite energies"))?;
            let values: Vec<f64> = process_slako_line(line).map_err(|e| handler.parse_error(e))?;
            if values.len() < 3 {
                return Err(handler.parse_error("incomplete line of onsite energies"));
            }
            Some([
                values[2] * HARTREE_TO_EV,
                values[1] * HARTREE_TO_EV,
                values[0] * HARTREE_TO_EV,
            ])
        } else {
            None
        };

        // The line with the mass and the polynomial repulsive potential is not needed.
        lines
            .next()
            .ok_or_else(|| handler.parse_error("missing repulsive polynomial line"))?;

        let mut h: Array2<f64> = Array2::zeros((SKF_N_INTEGRALS, npoints));
        let mut s: Array2<f64> = Array2::zeros((SKF_N_INTEGRALS, npoints));
        for it in 0..npoints {
            let line: &str = lines.next().ok_or_else(|| {
                handler.parse_error(format!("expected {} grid rows, found {}", npoints, it))
            })?;
            let row: Vec<f64> = process_slako_line(line).map_err(|e| handler.parse_error(e))?;
            if row.len() < 2 * SKF_N_INTEGRALS {
                return Err(handler.parse_error(format!(
                    "grid row {} has {} columns instead of {}",
                    it + 1,
                    row.len(),
                    2 * SKF_N_INTEGRALS
                )));
            }
            for pos in 0..SKF_N_INTEGRALS {
                h[[pos, it]] = row[pos] * HARTREE_TO_EV;
                s[[pos, it]] = row[SKF_N_INTEGRALS + pos];
            }
        }

        // The table starts at r = grid_dist.
        let grid: Vec<f64> = (1..=npoints)
            .map(|i| i as f64 * grid_dist * BOHR_TO_ANGS)
            .collect();

        Ok(SkfTable {
            grid,
            h,
            s,
            onsite,
        })
    }
}
