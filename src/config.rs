//! Dispatcher configuration.

/// Tunables of one [`Dispatcher`](crate::Dispatcher).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatcherConfig {
    /// Hierarchical separator of thunk paths. Paths without it are context roots.
    pub path_separator: char,
    /// Name used in hook errors for components that declare none.
    pub anonymous_name: String,
    /// Run advisory prop/state shape checks.
    pub validate_shapes: bool,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            path_separator: '.',
            anonymous_name: "<anonymous>".to_string(),
            validate_shapes: cfg!(debug_assertions),
        }
    }
}

impl DispatcherConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_path_separator(mut self, separator: char) -> Self {
        self.path_separator = separator;
        self
    }

    pub fn with_anonymous_name(mut self, name: impl Into<String>) -> Self {
        self.anonymous_name = name.into();
        self
    }

    pub fn with_shape_validation(mut self, enabled: bool) -> Self {
        self.validate_shapes = enabled;
        self
    }
}
