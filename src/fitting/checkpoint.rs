use super::{AtomicRadius, Cutoff, Dftb2Nnsk, FitConfig};
use crate::defaults::CHECKPOINT_FILE_NAME;
use crate::error::{FitError, Result};
use crate::formula::HoppingFormula;
use crate::index::Basis;
use log::info;
use ndarray::prelude::*;
use ron::ser::PrettyConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Everything needed to rebuild a fit: the model options and both parameter tensors.
#[derive(Serialize, Deserialize)]
struct Checkpoint {
    basis: Basis,
    functype: HoppingFormula,
    rs: Option<Cutoff>,
    w: f64,
    cal_rcuts: bool,
    atomic_radius: AtomicRadius,
    seed: Option<u64>,
    hopping_params: Array3<f64>,
    overlap_params: Array3<f64>,
}

impl Checkpoint {
    fn config(&self) -> FitConfig {
        FitConfig {
            functype: self.functype,
            w: self.w,
            cal_rcuts: self.cal_rcuts,
            seed: self.seed,
            rs: self.rs.clone(),
            atomic_radius: self.atomic_radius.clone(),
            basis: self.basis.clone(),
        }
    }
}

impl Dftb2Nnsk {
    /// Writes a checkpoint in RON format. If `path` is a directory the checkpoint is
    /// written to `path/dftb2nnsk.ron`. Returns the path of the written file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<PathBuf> {
        let path: &Path = path.as_ref();
        let filename: PathBuf = if path.is_dir() {
            path.join(CHECKPOINT_FILE_NAME)
        } else {
            path.to_path_buf()
        };
        let checkpoint = Checkpoint {
            basis: self.config.basis.clone(),
            functype: self.config.functype,
            rs: self.config.rs.clone(),
            w: self.config.w,
            cal_rcuts: self.config.cal_rcuts,
            atomic_radius: self.config.atomic_radius.clone(),
            seed: self.config.seed,
            hopping_params: self.hopping_params.clone(),
            overlap_params: self.overlap_params.clone(),
        };
        let data: String = ron::ser::to_string_pretty(&checkpoint, PrettyConfig::default())?;
        fs::write(&filename, data)?;
        info!("checkpoint written to {}", filename.display());
        Ok(filename)
    }

    /// Rebuilds a fit from a checkpoint written by [`Dftb2Nnsk::save`]. The reference
    /// integrals are read again from `skdata`.
    pub fn load<P: AsRef<Path>>(path: P, skdata: &Path) -> Result<Self> {
        let path: &Path = path.as_ref();
        let filename: PathBuf = if path.is_dir() {
            path.join(CHECKPOINT_FILE_NAME)
        } else {
            path.to_path_buf()
        };
        if !filename.is_file() {
            return Err(FitError::NotFound(filename));
        }
        let data: String = fs::read_to_string(&filename)?;
        let checkpoint: Checkpoint = ron::de::from_str(&data)?;
        let mut fit: Dftb2Nnsk = Dftb2Nnsk::new(checkpoint.config(), skdata)?;
        fit.set_params(checkpoint.hopping_params, checkpoint.overlap_params)?;
        info!("parameters restored from {}", filename.display());
        Ok(fit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fitting::tests::{engine, skdata};
    use std::env;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir: PathBuf = env::temp_dir().join(format!("dftb2nnsk-{}-{}", name, std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn save_into_a_directory_uses_the_default_name() {
        let dir = scratch_dir("ckpt-dir");
        let written = engine(&["2s"]).save(&dir).unwrap();
        assert_eq!(written, dir.join(CHECKPOINT_FILE_NAME));
        assert!(written.is_file());
        fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn loaded_fit_has_identical_parameters() {
        let dir = scratch_dir("ckpt-load");
        let mut fit = engine(&["2s", "2p"]);
        fit.symmetrize();
        let written = fit.save(dir.join("fit.ron")).unwrap();
        let loaded = Dftb2Nnsk::load(&written, &skdata()).unwrap();
        assert_eq!(loaded.config(), fit.config());
        assert_eq!(loaded.hopping_params(), fit.hopping_params());
        assert_eq!(loaded.overlap_params(), fit.overlap_params());
        fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn missing_checkpoint_is_not_found() {
        match Dftb2Nnsk::load("/nonexistent/dftb2nnsk.ron", &skdata()) {
            Err(FitError::NotFound(path)) => {
                assert_eq!(path, PathBuf::from("/nonexistent/dftb2nnsk.ron"))
            }
            _ => panic!("expected a not-found error"),
        }
    }

    #[test]
    fn mismatching_parameters_are_rejected() {
        let dir = scratch_dir("ckpt-shape");
        let written = engine(&["2s", "2p"]).save(&dir).unwrap();
        let data = fs::read_to_string(&written).unwrap();
        // a checkpoint of the sp basis can not be loaded into an s-only fit
        let mut checkpoint: Checkpoint = ron::de::from_str(&data).unwrap();
        for orbitals in checkpoint.basis.values_mut() {
            orbitals.truncate(1);
        }
        let data = ron::ser::to_string(&checkpoint).unwrap();
        fs::write(&written, data).unwrap();
        match Dftb2Nnsk::load(&written, &skdata()) {
            Err(FitError::Shape { .. }) => {}
            _ => panic!("expected a shape error"),
        }
        fs::remove_dir_all(dir).unwrap();
    }
}
