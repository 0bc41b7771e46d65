mod aggregate;
mod backend;
pub mod backends;
mod result;

pub use aggregate::{aggregate, CandyCounts};
pub use backend::Detector;
pub use backends::{open_model, ScriptedDetector, StubDetector};
pub use result::{BBox, Detection};
