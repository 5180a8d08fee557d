//! Versioned sales prompt
//!
//! The process-wide current sales prompt is a versioned configuration
//! object. Sessions record the version they were created against and are
//! explicitly reset when an update lands; they never read this state ad hoc
//! mid-conversation.

use parking_lot::RwLock;

/// One version of the sales prompt
#[derive(Debug, Clone)]
pub struct PromptVersion {
    pub version: u64,
    pub text: String,
}

/// Holder of the current sales prompt
pub struct PromptManager {
    current: RwLock<PromptVersion>,
}

impl PromptManager {
    /// Create a manager with the initial prompt at version 1
    pub fn new(initial: String) -> Self {
        Self {
            current: RwLock::new(PromptVersion {
                version: 1,
                text: initial,
            }),
        }
    }

    /// Snapshot of the current prompt
    pub fn current(&self) -> PromptVersion {
        self.current.read().clone()
    }

    /// Replace the prompt wholesale, bumping the version
    pub fn update(&self, text: String) -> PromptVersion {
        let mut current = self.current.write();
        current.version += 1;
        current.text = text;

        tracing::info!(version = current.version, "Sales prompt updated");
        current.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_version_is_one() {
        let manager = PromptManager::new("first".to_string());
        let current = manager.current();

        assert_eq!(current.version, 1);
        assert_eq!(current.text, "first");
    }

    #[test]
    fn test_update_bumps_version() {
        let manager = PromptManager::new("first".to_string());

        let updated = manager.update("second".to_string());
        assert_eq!(updated.version, 2);
        assert_eq!(manager.current().text, "second");

        let again = manager.update("third".to_string());
        assert_eq!(again.version, 3);
    }
}
