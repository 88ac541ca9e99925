pub mod acks;
pub mod assignments;
pub mod submissions;

pub use acks::{CountResponse, DeleteAck, InsertAck, UpdateAck};
pub use assignments::{AssignmentCountParams, AssignmentInput, AssignmentListParams, AssignmentResponse};
pub use submissions::{CreateSubmissionRequest, GradeSubmissionRequest, SubmissionResponse};
