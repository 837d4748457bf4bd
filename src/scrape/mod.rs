pub mod batch;
pub mod dtos;
pub mod handlers;
pub mod job;
pub mod outcome;

pub use batch::BatchScraper;
pub use job::UrlJob;
pub use outcome::{BatchReport, JobState, UrlOutcome};
