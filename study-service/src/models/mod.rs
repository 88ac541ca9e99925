pub mod assignment;
mod lenient;
pub mod submission;

pub use assignment::{Assignment, DifficultyLevel};
pub use submission::{Grade, Submission, SubmissionStatus};
