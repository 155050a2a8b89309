pub mod descriptor;
pub mod result;
pub mod strategy;

pub use descriptor::RequestDescriptor;
pub use result::{CommitOutcome, CommitSummary, FileOutcome, TargetResult};
pub use strategy::CommitStrategy;
