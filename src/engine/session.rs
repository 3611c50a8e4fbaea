// ABOUTME: One-time login bootstrap run before the front door starts serving
// ABOUTME: Retries the login task with a fixed delay; the shared cookie store keeps the session

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use super::error::{ExecutionError, Result};
use super::executor::TaskRunner;
use super::result::TaskOutput;

/// Login bootstrap settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoginPolicy {
    #[serde(default = "default_login_task")]
    pub task: String,
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_retry_delay", with = "humantime_serde")]
    pub retry_delay: Duration,
}

fn default_login_task() -> String {
    "login".to_string()
}

fn default_max_attempts() -> u32 {
    5
}

fn default_retry_delay() -> Duration {
    Duration::from_secs(5)
}

impl Default for LoginPolicy {
    fn default() -> Self {
        Self {
            task: default_login_task(),
            max_attempts: default_max_attempts(),
            retry_delay: default_retry_delay(),
        }
    }
}

/// Run the login task until it succeeds or the attempts run out. Returns
/// `None` when the config has no login task.
pub async fn ensure_login(runner: &TaskRunner, policy: &LoginPolicy) -> Result<Option<TaskOutput>> {
    if runner.config().get_task_by_name(&policy.task).is_none() {
        info!("No '{}' task defined, skipping login", policy.task);
        return Ok(None);
    }

    let max_attempts = policy.max_attempts.max(1);
    let mut last_error = String::new();

    for attempt in 1..=max_attempts {
        info!("Logging in (attempt {}/{})", attempt, max_attempts);
        match runner.run_by_name(&policy.task).await {
            Ok(output) => {
                info!("Login succeeded on attempt {}", attempt);
                return Ok(Some(output));
            }
            Err(e) => {
                warn!("Login attempt {} failed: {}", attempt, e);
                last_error = e.to_string();
                if attempt < max_attempts {
                    debug!("Waiting {:?} before retry", policy.retry_delay);
                    sleep(policy.retry_delay).await;
                }
            }
        }
    }

    Err(ExecutionError::LoginFailed {
        task: policy.task.clone(),
        attempts: max_attempts,
        message: last_error,
    })
}
