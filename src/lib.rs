pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod extract;
pub mod job;
pub mod normalize;
pub mod queue;
pub mod report;
pub mod util;
pub mod worker;

pub use error::{ExtractionError, QueueError};
pub use extract::{DocumentRef, Format};
pub use queue::{Job, JobEvent, JobId, JobState, JobStore};
pub use report::{ExtractionOutput, ExtractionRecord};
