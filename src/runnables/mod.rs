//! # Runnable abstractions.
//!
//! This module provides the user-facing work types:
//! - [`Runnable`] - trait for async, cancelable units of work
//! - [`RunnableRef`] - shared handle (`Arc<dyn Runnable>`)
//! - [`RunnableFn`] - in-process, closure-backed runnable
//! - [`RunnableFactory`] - produces a fresh runnable per pool slot

mod factory;
mod runnable;
mod runnable_fn;

pub use factory::RunnableFactory;
pub use runnable::{Runnable, RunnableRef};
pub use runnable_fn::RunnableFn;
