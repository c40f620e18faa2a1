mod elements;
pub mod onsite_db;
pub mod radii;
pub mod skf_handler;
mod spline;

pub use elements::Element;
pub use skf_handler::{SkfHandler, SkfTable};
pub use spline::Spline;
