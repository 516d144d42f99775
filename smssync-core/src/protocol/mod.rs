pub mod http;

// Re-export comodi
pub use http::{
    Envelope, IncomingParams, SendTaskPayload, SubmitResult, Task, TaskMessage, TaskQuery,
};
