//! Error decorator for user-supplied functions.
//!
//! Hooks, renders and initial-state producers return `anyhow::Result`. Any
//! failure is re-raised as [`LifecycleError::Hook`], whose message carries
//! the component and hook names ahead of the original message. The original
//! error stays reachable as the source.

use crate::error::{HookKind, LifecycleError};

/// Decorate the result of one hook call.
pub fn decorate<T>(component: &str, hook: HookKind, result: anyhow::Result<T>) -> Result<T, LifecycleError> {
    result.map_err(|source| {
        tracing::debug!(component, hook = %hook, error = %source, "hook failed");
        LifecycleError::Hook {
            component: component.to_string(),
            hook,
            source,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_success_passes_through() {
        assert_eq!(decorate("Row", HookKind::Render, Ok(3)).unwrap(), 3);
    }

    #[test]
    fn test_failure_is_prefixed() {
        let err = decorate::<()>("Row", HookKind::OnCreate, Err(anyhow::anyhow!("boom"))).unwrap_err();

        assert_eq!(err.to_string(), "Row: on_create: boom");
        assert_eq!(err.hook(), Some(HookKind::OnCreate));
        assert_eq!(err.source().map(|s| s.to_string()).as_deref(), Some("boom"));
    }
}
