// src/exec/mod.rs

//! Process execution layer.
//!
//! This module is responsible for actually running the commands bound to
//! events, using `tokio::process::Command`, and for keeping every in-flight
//! execution owned until it finishes.
//!
//! - [`invocation`] describes one execution and builds its argument vector.
//! - [`task_runner`] spawns the child process and waits for it.
//! - [`backend`] provides the `Invoker` trait and the production
//!   `ProcessInvoker`, which tests can replace with a fake implementation.
//! - [`tracker`] owns the set of background tasks (the retention set).

pub mod backend;
pub mod invocation;
pub mod task_runner;
pub mod tracker;

pub use backend::{Invoker, ProcessInvoker};
pub use invocation::{tokenize, Invocation, TokenizeError, NO_SUBJECT};
pub use tracker::{TaskId, TaskTracker};
