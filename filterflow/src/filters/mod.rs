//! Filters and the chain they are run from.
//!
//! This module provides:
//! - The filter capability traits for the four stages
//! - Registration, providers and classification into stage groups
//! - The immutable merged chain and the cursor the pipeline walks it with

mod chain;
mod cursor;
mod provider;
mod traits;

pub use chain::{ChainEntry, FilterChain, FilterInfo};
pub use cursor::{
    ActionStage, AuthorizationStage, CursorItem, ExceptionStage, FilterCursor, FilterStage,
    ResultStage, StageFilter,
};
pub use provider::{
    ActionFilterProvider, ControllerFilterProvider, FilterProvider, FilterProviders,
    FilterRegistration, FilterScope, GlobalFilterCollection,
};
pub use traits::{
    ActionFilter, AsyncActionFilter, AsyncAuthorizationFilter, AsyncExceptionFilter,
    AsyncResultFilter, AuthorizationFilter, ExceptionFilter, Filter, ResultFilter,
};
