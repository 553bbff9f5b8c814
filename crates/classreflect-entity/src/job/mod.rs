//! Analysis job domain entities.

pub mod model;
pub mod status;

pub use model::AnalysisJob;
pub use status::AnalysisStatus;
