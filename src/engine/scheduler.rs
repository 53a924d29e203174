// ABOUTME: Per-attempt timeout enforcement and retry decisions for task execution
// ABOUTME: Decides whether a failed task gets another attempt and waits out the delay

use std::future::Future;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{info, warn};

use super::context::InstanceContext;
use super::error::{EngineError, Result};
use crate::model::Task;

#[derive(Debug, Clone)]
pub struct TaskScheduler {
    enforce_timeouts: bool,
    default_timeout: Option<Duration>,
}

/// What to do after a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Run the task again; carries the attempt number about to start.
    Retry { attempt: u32 },
    /// No policy, or the retry budget is spent.
    GiveUp,
    /// The instance was cancelled while waiting out the delay.
    Cancelled,
}

impl TaskScheduler {
    pub fn new() -> Self {
        Self {
            enforce_timeouts: true,
            default_timeout: None,
        }
    }

    pub fn with_default_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.default_timeout = timeout;
        self
    }

    pub fn with_enforce_timeouts(mut self, enforce: bool) -> Self {
        self.enforce_timeouts = enforce;
        self
    }

    /// The timeout applied to one attempt of `task`, if any.
    pub fn effective_timeout(&self, task: &Task) -> Option<Duration> {
        if !self.enforce_timeouts {
            return None;
        }
        task.timeout.or(self.default_timeout)
    }

    /// Run one handler attempt, turning an expired timeout into a task error.
    pub async fn run_attempt<F, T>(&self, task: &Task, attempt: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        match self.effective_timeout(task) {
            Some(limit) => match timeout(limit, attempt).await {
                Ok(result) => result,
                Err(_) => {
                    warn!(task_id = %task.id, "Task timed out after {:?}", limit);
                    Err(EngineError::TaskTimeout {
                        task_id: task.id.clone(),
                        timeout: limit,
                    })
                }
            },
            None => attempt.await,
        }
    }

    /// Consult the task's retry policy and the instance's retry counter. When
    /// another attempt is allowed, bump the counter and wait out the delay.
    pub async fn next_attempt(&self, task: &Task, instance: &InstanceContext) -> RetryDecision {
        let Some(policy) = &task.retry_policy else {
            return RetryDecision::GiveUp;
        };

        let spent = instance.retry_count(&task.id).await;
        if spent >= policy.max_retries {
            warn!(
                task_id = %task.id,
                max_retries = policy.max_retries,
                "Retry budget exhausted"
            );
            return RetryDecision::GiveUp;
        }

        let retry = spent + 1;
        instance.set_retry_count(&task.id, retry).await;
        info!(
            task_id = %task.id,
            attempt = retry + 1,
            delay = ?policy.delay,
            "Retrying task ({}/{})",
            retry,
            policy.max_retries
        );

        if instance.sleep_unless_cancelled(policy.delay).await {
            RetryDecision::Retry { attempt: retry + 1 }
        } else {
            info!(task_id = %task.id, "Retry abandoned, instance cancelled");
            RetryDecision::Cancelled
        }
    }
}

impl Default for TaskScheduler {
    fn default() -> Self {
        Self::new()
    }
}
