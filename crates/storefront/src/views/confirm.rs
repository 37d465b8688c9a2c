//! Two-step guard for destructive and status-changing actions.

use tracing::debug;

/// An action waiting for the user to confirm it.
///
/// Views hand one out instead of calling the backend; only passing it back to
/// the view's `confirm` method issues the request. Dropping or declining it
/// issues nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "a confirmation does nothing unless confirmed"]
pub struct Confirmation<T> {
    action: T,
    prompt: String,
}

impl<T> Confirmation<T> {
    pub fn new(action: T, prompt: impl Into<String>) -> Self {
        Self {
            action,
            prompt: prompt.into(),
        }
    }

    /// Question to show the user.
    #[must_use]
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    #[must_use]
    pub const fn action(&self) -> &T {
        &self.action
    }

    /// Take the confirmed action.
    #[must_use]
    pub fn into_action(self) -> T {
        self.action
    }

    /// Abandon the action.
    pub fn decline(self) {
        debug!(prompt = %self.prompt, "Action declined");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confirmation_carries_action_and_prompt() {
        let pending = Confirmation::new(9_i64, "Cancel order 9?");
        assert_eq!(pending.prompt(), "Cancel order 9?");
        assert_eq!(*pending.action(), 9);
        assert_eq!(pending.into_action(), 9);
    }
}
