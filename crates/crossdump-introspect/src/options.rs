use crossdump_core::{Dialect, Route, TypeOverride};

/// Options that control how introspection behaves.
#[derive(Debug, Clone)]
pub struct IntrospectOptions {
    /// Dialect the dump is headed for; only used to label errors.
    pub target: Dialect,
    /// Columns whose portable type is declared by the caller.
    pub type_overrides: Vec<TypeOverride>,
}

impl IntrospectOptions {
    pub fn new(target: Dialect) -> Self {
        Self {
            target,
            type_overrides: Vec::new(),
        }
    }

    pub fn with_type_overrides(mut self, overrides: Vec<TypeOverride>) -> Self {
        self.type_overrides = overrides;
        self
    }

    pub fn route(&self, source: Dialect) -> Route {
        Route::new(source, self.target)
    }
}
