//! Where the checker sends its diagnostics.

use goop_core::TypeError;

/// Receives type errors as they are found.
pub trait DiagnosticSink {
    fn report(&mut self, error: TypeError);
}

impl<T: DiagnosticSink + ?Sized> DiagnosticSink for &mut T {
    fn report(&mut self, error: TypeError) {
        (**self).report(error);
    }
}

impl<T: DiagnosticSink + ?Sized> DiagnosticSink for Box<T> {
    fn report(&mut self, error: TypeError) {
        (**self).report(error);
    }
}

/// Collects diagnostics, optionally keeping only the first `max`.
#[derive(Debug, Default)]
pub struct Diagnostics {
    errors: Vec<TypeError>,
    max: Option<usize>,
    dropped: usize,
}

impl Diagnostics {
    pub fn new(max: Option<usize>) -> Self {
        Self {
            errors: Vec::new(),
            max,
            dropped: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Diagnostics beyond the limit that were not kept.
    pub fn dropped(&self) -> usize {
        self.dropped
    }

    pub fn into_errors(self) -> Vec<TypeError> {
        self.errors
    }
}

impl DiagnosticSink for Diagnostics {
    fn report(&mut self, error: TypeError) {
        if self.max.is_some_and(|max| self.errors.len() >= max) {
            self.dropped += 1;
            return;
        }
        self.errors.push(error);
    }
}

/// Counts diagnostics and drops them.
#[derive(Debug, Default)]
pub struct DiscardSink {
    pub count: usize,
}

impl DiagnosticSink for DiscardSink {
    fn report(&mut self, _error: TypeError) {
        self.count += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use goop_core::{FileId, Span, TypeErrorKind};

    fn error(message: &str) -> TypeError {
        TypeError::new(TypeErrorKind::Other, FileId(0), Span::point(1, 1), message)
    }

    #[test]
    fn limit_drops_extra_errors() {
        let mut diagnostics = Diagnostics::new(Some(2));
        for msg in ["a", "b", "c"] {
            diagnostics.report(error(msg));
        }
        assert_eq!(diagnostics.len(), 2);
        assert_eq!(diagnostics.dropped(), 1);
        let messages: Vec<_> = diagnostics.into_errors().into_iter().map(|e| e.message).collect();
        assert_eq!(messages, ["a", "b"]);
    }

    #[test]
    fn sink_through_reference() {
        let mut discard = DiscardSink::default();
        {
            let mut sink: Box<dyn DiagnosticSink + '_> = Box::new(&mut discard);
            sink.report(error("x"));
            sink.report(error("y"));
        }
        assert_eq!(discard.count, 2);
    }
}
