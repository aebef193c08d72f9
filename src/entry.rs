//! The view of a log message handed to handlers.

use bson::RawDocumentBuf;
use driverlog_core::{Component, Level, MaxDocumentLength};

use crate::field::Field;
use crate::observability::metrics;

/// Level, component, and message of an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Envelope<'a> {
    pub level: Level,
    pub component: Component,
    pub message: &'a str,
}

/// A log message being dispatched.
///
/// Only valid for the duration of a handler call: every field borrows from
/// the emitting call site.
#[derive(Debug, Clone, Copy)]
pub struct Entry<'a> {
    envelope: Envelope<'a>,
    fields: &'a [Field<'a>],
    max_document_length: MaxDocumentLength,
}

impl<'a> Entry<'a> {
    #[must_use]
    pub fn new(envelope: Envelope<'a>, fields: &'a [Field<'a>]) -> Self {
        Self {
            envelope,
            fields,
            max_document_length: MaxDocumentLength::default(),
        }
    }

    /// Overrides the limit applied to JSON renderings of documents.
    #[must_use]
    pub const fn with_max_document_length(mut self, limit: MaxDocumentLength) -> Self {
        self.max_document_length = limit;
        self
    }

    #[must_use]
    pub const fn level(&self) -> Level {
        self.envelope.level
    }

    #[must_use]
    pub const fn component(&self) -> Component {
        self.envelope.component
    }

    #[must_use]
    pub const fn message(&self) -> &'a str {
        self.envelope.message
    }

    /// Field descriptors in emission order, omitted ones included.
    #[must_use]
    pub const fn fields(&self) -> &'a [Field<'a>] {
        self.fields
    }

    #[must_use]
    pub const fn max_document_length(&self) -> MaxDocumentLength {
        self.max_document_length
    }

    /// Builds the full document for this entry.
    ///
    /// The first key is always `message`; each field follows in order.
    /// Repeated keys are kept. Every call builds a fresh document owned by
    /// the caller.
    #[must_use]
    pub fn materialize(&self) -> RawDocumentBuf {
        let mut doc = RawDocumentBuf::new();
        doc.append("message", self.envelope.message);
        for field in self.fields {
            field.append_to(&mut doc, self.max_document_length);
        }
        metrics::record_materialized();
        doc
    }

    /// The materialized document as relaxed extended JSON.
    #[must_use]
    pub fn to_json(&self) -> String {
        driverlog_core::raw_relaxed_json(&self.materialize())
    }
}
