//! Checker configuration.

use crate::registry::PackageRegistry;

/// Options for one checking run.
#[derive(Debug, Clone)]
pub struct CheckerConfig {
    /// Packages that may be imported.
    pub registry: PackageRegistry,
    /// Report unused local variables and imports.
    pub report_unused: bool,
    /// Stop collecting diagnostics after this many.
    pub max_errors: Option<usize>,
}

impl Default for CheckerConfig {
    fn default() -> Self {
        Self {
            registry: PackageRegistry::with_std(),
            report_unused: true,
            max_errors: None,
        }
    }
}

impl CheckerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_registry(mut self, registry: PackageRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn report_unused(mut self, report: bool) -> Self {
        self.report_unused = report;
        self
    }

    pub fn max_errors(mut self, max: usize) -> Self {
        self.max_errors = Some(max);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = CheckerConfig::default();
        assert!(config.report_unused);
        assert_eq!(config.max_errors, None);
        assert!(config.registry.get("fmt").is_some());
    }

    #[test]
    fn builder() {
        let config = CheckerConfig::new()
            .with_registry(PackageRegistry::new())
            .report_unused(false)
            .max_errors(10);
        assert!(config.registry.is_empty());
        assert!(!config.report_unused);
        assert_eq!(config.max_errors, Some(10));
    }
}
