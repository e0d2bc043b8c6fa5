// src/exec/task_runner.rs

//! Individual command process runner.

use std::process::{ExitStatus, Stdio};

use anyhow::{Context, Result};
use tokio::process::Command;
use tracing::{debug, error, info, warn};

use crate::exec::invocation::Invocation;

/// Run a single invocation and report how it went.
///
/// Nothing escapes this function: a non-zero exit is logged as a warning,
/// any failure to tokenize, spawn or wait is logged as an error with its
/// full context chain.
pub async fn run_invocation(invocation: &Invocation) {
    match run_invocation_inner(invocation).await {
        Ok(status) if status.success() => {
            debug!(
                command = %invocation.template,
                event = %invocation.event,
                "command finished"
            );
        }
        Ok(status) => report_failure(invocation, status),
        Err(err) => {
            error!(
                command = %invocation.template,
                event = %invocation.event,
                error = ?err,
                "command execution error"
            );
        }
    }
}

/// Spawn the command for `invocation` and wait for it to exit.
///
/// - stdin is `/dev/null`
/// - stdout and stderr are inherited from the daemon
/// - the child is *not* killed if this future is dropped; it outlives the
///   daemon if need be.
pub async fn run_invocation_inner(invocation: &Invocation) -> Result<ExitStatus> {
    let argv = invocation
        .argv()
        .with_context(|| format!("preparing command '{}'", invocation.template))?;
    let (program, args) = argv
        .split_first()
        .context("command has no program to run")?;

    info!(
        command = %invocation.template,
        subject = invocation.subject.as_deref().unwrap_or(crate::exec::NO_SUBJECT),
        event = %invocation.event,
        "starting command"
    );

    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .kill_on_drop(false)
        .spawn()
        .with_context(|| format!("spawning process for command '{}'", invocation.template))?;

    let status = child
        .wait()
        .await
        .with_context(|| format!("waiting for process of command '{}'", invocation.template))?;

    Ok(status)
}

fn report_failure(invocation: &Invocation, status: ExitStatus) {
    match status.code() {
        Some(code) => warn!(
            command = %invocation.template,
            event = %invocation.event,
            exit_code = code,
            "The command {} returned a non-zero exit code {}.",
            invocation.template,
            code
        ),
        None => warn!(
            command = %invocation.template,
            event = %invocation.event,
            signal = ?terminating_signal(status),
            "The command {} was terminated by a signal.",
            invocation.template
        ),
    }
}

#[cfg(unix)]
fn terminating_signal(status: ExitStatus) -> Option<i32> {
    use std::os::unix::process::ExitStatusExt;
    status.signal()
}

#[cfg(not(unix))]
fn terminating_signal(_status: ExitStatus) -> Option<i32> {
    None
}
