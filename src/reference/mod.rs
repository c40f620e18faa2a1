mod dftb;
mod interpolator;

pub use dftb::{DftbReference, Integral};
pub use interpolator::HoppingIntp;
