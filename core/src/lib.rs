// src/lib.rs

//! electro-flow: asynchronous step pipelines for multi-stage business workflows.
//!
//! A pipeline is an ordered list of named steps run against a shared,
//! lock-protected context (`ContextData<T>`). Each step:
//!  - runs one or more asynchronous handlers in registration order,
//!  - may be marked optional (a step without handlers is then skipped),
//!  - may carry a skip condition evaluated against the context,
//!  - may halt the whole pipeline early by returning `PipelineControl::Stop`.
//!
//! The `Flows` registry stores pipelines keyed by their context type, so an
//! application can register each workflow once at startup and dispatch it
//! later from request handlers with `flows.run(ContextData::new(ctx))`.
//!
//! ```ignore
//! let mut signup = Pipeline::<SignupCtx, AppError>::new(&[
//!     ("validate", false, None),
//!     ("persist", false, None),
//!     ("notify", true, None),
//! ]);
//! signup.on_root("validate", |ctx| Box::pin(async move { /* ... */ Ok::<_, AppError>(PipelineControl::Continue) }))?;
//! flows.register_pipeline(signup);
//! ```

pub mod core;
pub mod error;
pub mod pipeline;
pub mod registry;

pub use crate::core::context_data::ContextData;
pub use crate::core::control::{PipelineControl, PipelineResult};
pub use crate::core::handler::Handler;
pub use crate::core::step::{SkipCondition, StepDef};

pub use crate::pipeline::definition::Pipeline;

pub use crate::error::{FlowError, FlowResult};

pub use crate::registry::Flows;
