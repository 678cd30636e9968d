//! Statistics
//!
//! - `analysis`: Goodness of fit, RTP and symmetry for a bucket histogram
//! - `simulation`: Parallel Monte-Carlo runs feeding the analyzer

pub mod analysis;
pub mod simulation;

pub use analysis::{analyze, AnalysisReport, AnalysisSettings, ExpectedSource};
pub use simulation::{simulate, SimulationConfig, SimulationReport};
