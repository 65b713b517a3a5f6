pub mod report;
pub mod sweep;
pub mod writer;

pub use report::{build_report, identification_rate, ExpandedMatch, Report};
pub use writer::StagedOutputs;
