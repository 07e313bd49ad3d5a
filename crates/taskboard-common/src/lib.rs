//! Shared domain types for Taskboard.
//!
//! Both the REST server and the terminal client depend on this crate, so
//! the wire shapes of `Project` and `Task` live here alongside the request
//! validation rules the server applies to incoming bodies.

pub mod models;
pub mod validation;

pub use models::{
    AnswerResponse, AskRequest, MessageResponse, Project, ProjectInput, StatusUpdate,
    SummaryResponse, Task, TaskInput, TaskStatus, is_object_id, new_object_id, now_timestamp,
};
pub use validation::ValidationError;
