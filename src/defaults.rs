// config file
pub const CONFIG_FILE_NAME: &str = "dftb2nnsk.toml";
// file name of the checkpoint if only a directory is given
pub const CHECKPOINT_FILE_NAME: &str = "dftb2nnsk.ron";
// exported NNSK model
pub const JSON_FILE_NAME: &str = "nnsk.json";
pub const OUTPUT_DIR: &str = "./";
// directory with the A-B.skf files
pub const SKDATA_DIR: &str = "./slakos";

// MODEL
// formula family of the hopping and overlap integrals
pub const FUNCTYPE: &str = "poly2pow";
// width of the smooth cutoff in angstrom
pub const SMOOTH_WIDTH: f64 = 0.2;
// atomic radius database used for the bond length r0
pub const ATOMIC_RADIUS: &str = "cov";
pub const CAL_RCUTS: bool = false;
// distances are floored to this value in angstrom before the formula is evaluated
pub const MIN_DISTANCE: f64 = 1.0e-6;

// OPTIMIZATION
pub const NSTEP: usize = 40000;
pub const NSAMPLE: usize = 256;
pub const DISPLAY_FREQUENCY: usize = 1000;
pub const SAVE_FREQUENCY: usize = 1000;
// max_elmt_batch^2 bond types are optimized together
pub const MAX_ELMT_BATCH: usize = 4;
pub const OPTIMIZER: &str = "RMSprop";
pub const LEARNING_RATE: f64 = 0.1;
pub const RMSPROP_MOMENTUM: f64 = 0.2;
pub const RMSPROP_ALPHA: f64 = 0.99;
pub const ADAM_BETAS: (f64, f64) = (0.9, 0.999);
pub const OPTIMIZER_EPS: f64 = 1.0e-8;
// L-BFGS
pub const LBFGS_MAX_ITER: usize = 20;
pub const LBFGS_HISTORY_SIZE: usize = 100;
pub const LBFGS_TOLERANCE_GRAD: f64 = 1.0e-7;
pub const LBFGS_TOLERANCE_CHANGE: f64 = 1.0e-9;
// learning rate scheduler
pub const LR_SCHEDULER: &str = "exp";
pub const LR_DECAY_GAMMA: f64 = 0.9998;
pub const COSINE_T_MAX: usize = 1000;

// LOSS
// overlap errors are weighted by this factor
pub const OVERLAP_LOSS_WEIGHT: f64 = 15.0;
// the sampling interval spans +- STDSIGMA standard deviations around its centre
pub const STDSIGMA: f64 = 0.5;

// VISUALIZATION
pub const PLOT_NSAMPLE: usize = 100;
pub const PLOT_SIZE: (u32, u32) = (1200, 480);
