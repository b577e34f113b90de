//! Core domain model types for filterflow.
//!
//! This module contains the fundamental types the pipeline operates on:
//! - The stage enum
//! - Action descriptors and their invocation outcome
//! - Controllers that resolve actions
//! - Action results and return-value wrapping

mod action;
mod controller;
mod result;
mod stage;

pub use action::{ActionDescriptor, ActionInvocation, AsyncAction, Parameters, SyncAction};
pub use controller::{ControllerDescriptor, StaticController};
pub use result::{
    create_action_result, ActionResult, ActionResultRef, ContentResult, EmptyResult, JsonResult,
    ReturnValue, StatusCodeResult,
};
pub use stage::Stage;
