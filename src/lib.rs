pub mod constants;
pub mod defaults;
pub mod error;
pub mod fitting;
pub mod formula;
pub mod index;
pub mod io;
pub mod nnsk;
pub mod optim;
pub mod param;
pub mod reference;
pub mod utils;

pub use error::{FitError, Result};
pub use fitting::{AtomicRadius, Cutoff, Dftb2Nnsk, FitConfig, OptimizeOptions, OptimizeOptionsBuilder};
pub use formula::HoppingFormula;
pub use index::{Basis, BondIndex};
pub use nnsk::NnskModel;
