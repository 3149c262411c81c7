//! Speculative checking with diagnostics switched off.

use std::ops::{Deref, DerefMut};

use goop_core::TypeError;

use crate::checker::Checker;
use crate::diagnostics::{DiagnosticSink, DiscardSink};

/// Routes every diagnostic of the wrapped checker into a [`DiscardSink`]
/// until dropped.
///
/// The previous sink, error count and first error are restored on drop, so
/// nothing reported inside the scope is visible afterwards. Scopes nest.
pub(crate) struct SuppressionScope<'c, 'a, 'ast> {
    checker: &'c mut Checker<'a, 'ast>,
    saved_sink: Option<Box<dyn DiagnosticSink + 'a>>,
    saved_count: usize,
    saved_first: Option<TypeError>,
}

impl<'c, 'a, 'ast> SuppressionScope<'c, 'a, 'ast> {
    pub(crate) fn new(checker: &'c mut Checker<'a, 'ast>) -> Self {
        let saved_sink = std::mem::replace(&mut checker.sink, Box::new(DiscardSink::default()));
        let saved_count = checker.error_count;
        let saved_first = checker.first_error.take();
        Self {
            checker,
            saved_sink: Some(saved_sink),
            saved_count,
            saved_first,
        }
    }

    /// No error was reported since the scope was opened.
    pub(crate) fn succeeded(&self) -> bool {
        self.checker.error_count == self.saved_count
    }
}

impl<'a, 'ast> Deref for SuppressionScope<'_, 'a, 'ast> {
    type Target = Checker<'a, 'ast>;

    fn deref(&self) -> &Self::Target {
        self.checker
    }
}

impl DerefMut for SuppressionScope<'_, '_, '_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.checker
    }
}

impl Drop for SuppressionScope<'_, '_, '_> {
    fn drop(&mut self) {
        if let Some(sink) = self.saved_sink.take() {
            self.checker.sink = sink;
        }
        self.checker.error_count = self.saved_count;
        self.checker.first_error = self.saved_first.take();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CheckerConfig;
    use crate::diagnostics::Diagnostics;
    use goop_core::{Span, TypeErrorKind};

    #[test]
    fn errors_inside_scope_are_discarded() {
        let config = CheckerConfig::default();
        let mut diagnostics = Diagnostics::new(None);
        {
            let mut checker = Checker::new(&config, &[], Box::new(&mut diagnostics));
            checker.error(TypeErrorKind::Other, Span::point(1, 1), "kept");

            {
                let mut scope = SuppressionScope::new(&mut checker);
                assert!(scope.succeeded());
                scope.error(TypeErrorKind::Other, Span::point(2, 1), "hidden");
                assert!(!scope.succeeded());

                let mut inner = SuppressionScope::new(&mut scope);
                inner.error(TypeErrorKind::Other, Span::point(3, 1), "hidden too");
                assert!(!inner.succeeded());
            }

            assert_eq!(checker.error_count, 1);
            assert_eq!(checker.first_error.as_ref().map(|e| e.message.as_str()), Some("kept"));
            checker.error(TypeErrorKind::Other, Span::point(4, 1), "after");
        }
        let messages: Vec<_> = diagnostics.into_errors().into_iter().map(|e| e.message).collect();
        assert_eq!(messages, ["kept", "after"]);
    }
}
