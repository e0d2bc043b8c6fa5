// src/exec/backend.rs

//! Pluggable invoker abstraction.
//!
//! The task tracker talks to an `Invoker` instead of spawning processes
//! itself. This makes it easy to swap in a fake invoker in tests while
//! keeping the production implementation in [`task_runner`].
//!
//! - `ProcessInvoker` is the default implementation used by `callbackd`.
//!   It runs the command as a child process and reports the outcome.
//! - Tests can provide their own `Invoker` that, for example, records which
//!   invocations happened or blocks until told to finish.
//!
//! [`task_runner`]: super::task_runner

use std::future::Future;
use std::pin::Pin;

use super::invocation::Invocation;
use super::task_runner::run_invocation;

/// Trait abstracting how a single invocation is executed.
///
/// Implementations must not fail: whatever goes wrong is reported by the
/// implementation itself and stays contained there.
pub trait Invoker: Send + Sync + 'static {
    fn invoke<'a>(
        &'a self,
        invocation: &'a Invocation,
    ) -> Pin<Box<dyn Future<Output = ()> + Send + 'a>>;
}

/// Real invoker used in production.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessInvoker;

impl Invoker for ProcessInvoker {
    fn invoke<'a>(
        &'a self,
        invocation: &'a Invocation,
    ) -> Pin<Box<dyn Future<Output = ()> + Send + 'a>> {
        Box::pin(run_invocation(invocation))
    }
}
