//! Non-fatal parse findings
//!
//! Subtitle authoring tools routinely emit malformed override blocks, and a
//! line must still parse and round-trip no matter what it contains. Rather
//! than failing, the tokenizer and codec record what they had to repair as a
//! [`TagDiagnostic`] and carry on.
//!
//! Callers that don't care use [`crate::parse_blocks`]; callers that want to
//! surface the findings (linters, import reports) use
//! [`crate::parse_blocks_with_diagnostics`].

/// Severity of a diagnostic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DiagnosticLevel {
    /// Recovered silently; original text is preserved for round-trip
    Info,
    /// Recovered, but the serialized form may differ from the source
    Warning,
}

impl DiagnosticLevel {
    /// Get string representation for display
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Warning => "warning",
        }
    }
}

/// Types of tag parsing diagnostics
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DiagnosticKind {
    /// Tag name matched no prototype; kept verbatim as an invalid tag
    UnknownTag,
    /// Numeric argument had no numeric prefix or trailing junk
    MalformedNumber,
    /// A `(` was never closed before the end of the tag
    UnbalancedParentheses,
    /// A `{` had no matching `}`; the remainder was treated as text
    UnclosedOverride,
    /// Content after a tag's closing `)` kept as an extra argument
    TrailingGarbage,
}

impl DiagnosticKind {
    /// Severity associated with this kind of finding
    #[must_use]
    pub const fn level(&self) -> DiagnosticLevel {
        match self {
            Self::UnknownTag | Self::UnclosedOverride => DiagnosticLevel::Info,
            Self::MalformedNumber | Self::UnbalancedParentheses | Self::TrailingGarbage => {
                DiagnosticLevel::Warning
            }
        }
    }
}

/// Diagnostic information for tag parsing issues
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TagDiagnostic {
    /// Type of diagnostic issue
    pub kind: DiagnosticKind,
    /// Text span containing the issue
    pub span: String,
    /// Byte offset of the enclosing override block (or text span) in the line
    pub offset: usize,
}

impl TagDiagnostic {
    /// Create a new diagnostic
    pub fn new(kind: DiagnosticKind, span: impl Into<String>, offset: usize) -> Self {
        Self {
            kind,
            span: span.into(),
            offset,
        }
    }

    /// Severity of this diagnostic
    #[must_use]
    pub const fn level(&self) -> DiagnosticLevel {
        self.kind.level()
    }
}

/// Sink the parsing functions push findings into
///
/// Wraps a `Vec` with the byte offset of the block currently being parsed so
/// that the tokenizer does not need to thread offsets through every call.
#[derive(Debug, Default)]
pub(crate) struct DiagnosticSink {
    /// Collected findings
    items: Vec<TagDiagnostic>,
    /// Offset of the override block being tokenized
    offset: usize,
}

impl DiagnosticSink {
    /// Set the offset attached to subsequent findings
    pub(crate) fn at(&mut self, offset: usize) {
        self.offset = offset;
    }

    /// Record a finding at the current offset
    pub(crate) fn push(&mut self, kind: DiagnosticKind, span: &str) {
        let offset = self.offset;
        self.items.push(TagDiagnostic::new(kind, span, offset));
    }

    /// Consume the sink
    pub(crate) fn into_vec(self) -> Vec<TagDiagnostic> {
        self.items
    }
}
