//! Retry-then-compensate executor.

use std::thread;
use std::time::Duration;

use semrel_config::WorkflowConfig;
use tracing::{error, info, warn};

use crate::{Action, ActionError, ReleaseApi, UndoError, WorkflowContext, WorkflowError, WorkflowResult};

/// How often and how patiently a workflow retries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Passes after the first one.
    pub retry_count: u32,
    /// Wait before each retry.
    pub retry_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            retry_count: 3,
            retry_delay: Duration::from_secs(10),
        }
    }
}

impl From<&WorkflowConfig> for RetryPolicy {
    fn from(config: &WorkflowConfig) -> Self {
        Self {
            retry_count: config.retry_count,
            retry_delay: Duration::from_secs(config.retry_delay_secs),
        }
    }
}

/// Runs a list of actions as one unit.
#[derive(Debug, Clone, Default)]
pub struct Workflow {
    policy: RetryPolicy,
}

impl Workflow {
    /// Creates an executor with the given policy.
    #[must_use]
    pub fn new(policy: RetryPolicy) -> Self {
        Self { policy }
    }

    /// The retry policy.
    #[must_use]
    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// Applies `actions` in order.
    ///
    /// The first failing action ends a pass. A retryable failure starts a
    /// new pass from the first action after the retry delay, up to
    /// `retry_count` times. When retries run out or the failure is fatal,
    /// every action started in any pass is undone in reverse order,
    /// including failed ones, which may have taken effect behind a gateway
    /// error. Undo failures do not stop the rollback; they are collected
    /// in the returned error.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::Failed`] with the last action error.
    pub fn apply(
        &self,
        actions: &mut [Action],
        api: &dyn ReleaseApi,
        ctx: &mut WorkflowContext,
    ) -> WorkflowResult<()> {
        let mut started = vec![false; actions.len()];
        let mut attempts = 0;

        loop {
            attempts += 1;
            let Err(cause) = run_pass(actions, &mut started, api, ctx) else {
                info!(attempts, "workflow completed");
                return Ok(());
            };

            let retryable = cause.is_retryable();
            if retryable && attempts <= self.policy.retry_count {
                warn!(
                    attempt = attempts,
                    max = self.policy.retry_count,
                    delay = ?self.policy.retry_delay,
                    error = %cause,
                    "action failed, retrying"
                );
                thread::sleep(self.policy.retry_delay);
                continue;
            }

            if retryable {
                error!(attempts, error = %cause, "retries exhausted, rolling back");
            } else {
                error!(error = %cause, "fatal error, rolling back");
            }
            let rollback_failures = rollback(actions, &mut started, api, ctx);
            return Err(WorkflowError::Failed {
                cause,
                retryable,
                attempts,
                rollback_failures,
            });
        }
    }
}

fn run_pass(
    actions: &mut [Action],
    started: &mut [bool],
    api: &dyn ReleaseApi,
    ctx: &mut WorkflowContext,
) -> Result<(), ActionError> {
    for (action, started) in actions.iter_mut().zip(started.iter_mut()) {
        *started = true;
        action.apply(api, ctx)?;
    }
    Ok(())
}

fn rollback(
    actions: &mut [Action],
    started: &mut [bool],
    api: &dyn ReleaseApi,
    ctx: &mut WorkflowContext,
) -> Vec<UndoError> {
    let mut failures = Vec::new();
    for (action, started) in actions.iter_mut().zip(started.iter_mut()).rev() {
        if !*started {
            continue;
        }
        match action.undo(api, ctx) {
            Ok(()) => {
                info!(action = action.name(), "rolled back");
                *started = false;
            }
            Err(e) => {
                warn!(action = action.name(), error = %e, "rollback failed");
                failures.push(e);
            }
        }
    }
    failures
}
