//! Release actions for semrel.
//!
//! This crate runs remote release operations as a unit:
//! - [`ReleaseApi`]: the operations a release host must provide
//! - [`Action`]: one remote operation with a compensating undo
//! - [`Workflow`]: runs actions in order, retries transient failures and
//!   rolls back what was done when it gives up

mod action;
mod api;
mod context;
mod error;
mod executor;
#[cfg(test)]
mod fake;

pub use action::{Action, AddLink, Commit, CreatePipeline, CreateTag, GetTag, RefSource, Upload};
pub use api::{
    CommitHandle, FileChange, LinkHandle, PipelineHandle, ReleaseApi, ReleaseHandle, TagHandle,
    UploadHandle,
};
pub use context::WorkflowContext;
pub use error::{
    ActionError, ActionResult, ApiError, ApiResult, UndoError, WorkflowError, WorkflowResult,
};
pub use executor::{RetryPolicy, Workflow};
