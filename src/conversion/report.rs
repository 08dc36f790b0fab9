//! Issues, sinks and summaries for label conversion.
//!
//! Nothing recoverable aborts a run. Each skipped annotation, image or file
//! becomes a [`ConversionIssue`] handed to an [`IssueSink`] supplied by the
//! caller; the library never reaches for a global logger on its own.

use serde::Serialize;
use std::fmt;

use super::LabelFormat;
use crate::ir::{CategoryMap, SkipReason};

/// Receives issues as they are discovered.
pub trait IssueSink {
    fn record(&mut self, issue: ConversionIssue);
}

/// Collects issues in memory.
impl IssueSink for Vec<ConversionIssue> {
    fn record(&mut self, issue: ConversionIssue) {
        self.push(issue);
    }
}

/// Forwards issues to the `log` facade: warnings at `warn`, notes at `info`.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogSink;

impl IssueSink for LogSink {
    fn record(&mut self, issue: ConversionIssue) {
        match issue.severity {
            IssueSeverity::Warning => log::warn!("{}", issue),
            IssueSeverity::Info => log::info!("{}", issue),
        }
    }
}

/// Severity of a [`ConversionIssue`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum IssueSeverity {
    /// Something was skipped.
    Warning,
    /// A note about what the run did.
    Info,
}

/// Stable code for filtering and tests.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum ConversionIssueCode {
    // Per annotation
    AnnotationNotAnObject,
    MissingClassName,
    MissingGeometry,
    InvalidGeometry,

    // Per image
    MissingImageDimensions,
    MissingFileStem,
    UnreadableImage,
    MissingLabelFile,

    // Notes
    CategoryMapping,
    CategoryMapsDiffer,
    LabelFilesWritten,
}

impl From<&SkipReason> for ConversionIssueCode {
    fn from(reason: &SkipReason) -> Self {
        match reason {
            SkipReason::NotAnObject => ConversionIssueCode::AnnotationNotAnObject,
            SkipReason::MissingClassName => ConversionIssueCode::MissingClassName,
            SkipReason::MissingGeometry => ConversionIssueCode::MissingGeometry,
            SkipReason::InvalidGeometry(_) => ConversionIssueCode::InvalidGeometry,
        }
    }
}

/// A single recoverable problem or note.
#[derive(Clone, Debug, Serialize)]
pub struct ConversionIssue {
    pub severity: IssueSeverity,
    pub code: ConversionIssueCode,
    /// What the issue is about, usually a file name.
    pub context: String,
    pub message: String,
}

impl ConversionIssue {
    pub fn warning(
        code: ConversionIssueCode,
        context: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            severity: IssueSeverity::Warning,
            code,
            context: context.into(),
            message: message.into(),
        }
    }

    pub fn info(
        code: ConversionIssueCode,
        context: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            severity: IssueSeverity::Info,
            code,
            context: context.into(),
            message: message.into(),
        }
    }

    /// Warning for an annotation rejected while reading.
    pub fn skipped_annotation(file_name: &str, reason: &SkipReason) -> Self {
        Self::warning(
            reason.into(),
            file_name,
            format!("skipping annotation ({reason})"),
        )
    }

    pub fn is_warning(&self) -> bool {
        self.severity == IssueSeverity::Warning
    }
}

impl fmt::Display for ConversionIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.context.is_empty() {
            write!(f, "{}", self.message)
        } else {
            write!(f, "{}: {}", self.context, self.message)
        }
    }
}

/// Outcome of one label-file conversion call.
#[derive(Clone, Debug)]
pub struct ConversionSummary {
    pub format: LabelFormat,
    /// Label files created or overwritten, empty ones included.
    pub files_written: usize,
    pub lines_written: usize,
    pub annotations_skipped: usize,
    /// The map the ids were taken from, for downstream class-name config.
    pub category_map: CategoryMap,
}

impl fmt::Display for ConversionSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "  {} label file(s), {} line(s) ({})",
            self.files_written,
            self.lines_written,
            self.format.name()
        )?;
        writeln!(
            f,
            "  {} categor(y/ies): {}",
            self.category_map.len(),
            self.category_map
        )?;
        if self.annotations_skipped > 0 {
            writeln!(f, "  {} annotation(s) skipped", self.annotations_skipped)?;
        }
        Ok(())
    }
}
