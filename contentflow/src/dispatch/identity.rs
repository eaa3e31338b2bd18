//! Caller identity carried into background jobs.

use serde::{Deserialize, Serialize};
use std::future::Future;

tokio::task_local! {
    static CURRENT_CALLER: Option<CallerIdentity>;
}

/// The user on whose behalf a generation runs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CallerIdentity {
    /// The user's email, used as the owner key in the content store.
    pub email: String,
}

impl CallerIdentity {
    /// Creates an identity.
    #[must_use]
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
        }
    }
}

/// Runs `fut` with `caller` visible to [`current_caller`].
pub async fn with_caller<F: Future>(caller: Option<CallerIdentity>, fut: F) -> F::Output {
    CURRENT_CALLER.scope(caller, fut).await
}

/// Returns the caller of the enclosing [`with_caller`] scope, if any.
#[must_use]
pub fn current_caller() -> Option<CallerIdentity> {
    CURRENT_CALLER.try_with(Clone::clone).ok().flatten()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_caller_is_scoped() {
        assert_eq!(current_caller(), None);

        let seen = with_caller(Some(CallerIdentity::new("a@example.com")), async {
            current_caller()
        })
        .await;

        assert_eq!(seen, Some(CallerIdentity::new("a@example.com")));
        assert_eq!(current_caller(), None);
    }

    #[tokio::test]
    async fn test_spawned_tasks_do_not_inherit_caller() {
        let inner = with_caller(Some(CallerIdentity::new("a@example.com")), async {
            tokio::spawn(async { current_caller() }).await.unwrap()
        })
        .await;

        assert_eq!(inner, None);
    }
}
