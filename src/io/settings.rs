use crate::defaults::*;
use crate::fitting::FitConfig;
use crate::index::Basis;
use serde::{Deserialize, Serialize};

fn default_skdata() -> String {
    String::from(SKDATA_DIR)
}
fn default_model() -> FitConfig {
    FitConfig::new(Basis::new())
}
fn default_nstep() -> usize {
    NSTEP
}
fn default_dis_freq() -> usize {
    DISPLAY_FREQUENCY
}
fn default_nsample() -> usize {
    NSAMPLE
}
fn default_save_freq() -> usize {
    SAVE_FREQUENCY
}
fn default_max_elmt_batch() -> usize {
    MAX_ELMT_BATCH
}
fn default_optimizer_kind() -> String {
    String::from(OPTIMIZER)
}
fn default_learning_rate() -> f64 {
    LEARNING_RATE
}
fn default_optimizer() -> OptimizerConfig {
    OptimizerConfig {
        kind: default_optimizer_kind(),
        lr: default_learning_rate(),
    }
}
fn default_scheduler_kind() -> String {
    String::from(LR_SCHEDULER)
}
fn default_gamma() -> f64 {
    LR_DECAY_GAMMA
}
fn default_t_max() -> usize {
    COSINE_T_MAX
}
fn default_lr_scheduler() -> LrSchedulerConfig {
    LrSchedulerConfig {
        kind: default_scheduler_kind(),
        gamma: default_gamma(),
        t_max: default_t_max(),
    }
}
fn default_train_options() -> TrainOptions {
    TrainOptions {
        nstep: default_nstep(),
        dis_freq: default_dis_freq(),
        nsample: default_nsample(),
        save_freq: default_save_freq(),
        max_elmt_batch: default_max_elmt_batch(),
        r_min: None,
        r_max: None,
        optimizer: default_optimizer(),
        lr_scheduler: default_lr_scheduler(),
    }
}
fn default_output_directory() -> String {
    String::from(OUTPUT_DIR)
}
fn default_json_file() -> String {
    String::from(JSON_FILE_NAME)
}
fn default_plot() -> Vec<String> {
    Vec::new()
}
fn default_output() -> OutputConfig {
    OutputConfig {
        directory: default_output_directory(),
        json_file: default_json_file(),
        plot: default_plot(),
    }
}

/// Content of `dftb2nnsk.toml`. Every option has a default, so an empty file is a valid
/// configuration apart from the basis.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Configuration {
    #[serde(default = "default_skdata")]
    pub skdata: String,
    #[serde(default = "default_model")]
    pub model: FitConfig,
    #[serde(default = "default_train_options")]
    pub train_options: TrainOptions,
    #[serde(default = "default_output")]
    pub output: OutputConfig,
}

impl Default for Configuration {
    fn default() -> Self {
        Configuration {
            skdata: default_skdata(),
            model: default_model(),
            train_options: default_train_options(),
            output: default_output(),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct TrainOptions {
    #[serde(default = "default_nstep")]
    pub nstep: usize,
    #[serde(default = "default_dis_freq")]
    pub dis_freq: usize,
    #[serde(default = "default_nsample")]
    pub nsample: usize,
    #[serde(default = "default_save_freq")]
    pub save_freq: usize,
    #[serde(default = "default_max_elmt_batch")]
    pub max_elmt_batch: usize,
    /// sampling range in angstrom, required unless `cal_rcuts` is set
    #[serde(default)]
    pub r_min: Option<f64>,
    #[serde(default)]
    pub r_max: Option<f64>,
    #[serde(default = "default_optimizer")]
    pub optimizer: OptimizerConfig,
    #[serde(default = "default_lr_scheduler")]
    pub lr_scheduler: LrSchedulerConfig,
}

impl Default for TrainOptions {
    fn default() -> Self {
        default_train_options()
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct OptimizerConfig {
    #[serde(rename = "type", default = "default_optimizer_kind")]
    pub kind: String,
    #[serde(default = "default_learning_rate")]
    pub lr: f64,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct LrSchedulerConfig {
    #[serde(rename = "type", default = "default_scheduler_kind")]
    pub kind: String,
    #[serde(default = "default_gamma")]
    pub gamma: f64,
    #[serde(rename = "T_max", default = "default_t_max")]
    pub t_max: usize,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct OutputConfig {
    #[serde(default = "default_output_directory")]
    pub directory: String,
    #[serde(default = "default_json_file")]
    pub json_file: String,
    /// bond types ("A-B") whose integrals are plotted after the fit
    #[serde(default = "default_plot")]
    pub plot: Vec<String>,
}
