use bytes::Bytes;

use super::transform::OutputFormat;

/// One uploaded file at a known position in the batch.
#[derive(Debug, Clone)]
pub struct BatchItem {
    /// Name declared by the client
    pub file_name: String,
    /// Media type declared by the client, if any
    pub content_type: Option<String>,
    pub data: Bytes,
}

impl BatchItem {
    pub fn new(file_name: impl Into<String>, content_type: Option<String>, data: Bytes) -> Self {
        Self {
            file_name: file_name.into(),
            content_type,
            data,
        }
    }

    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }
}

#[derive(Debug, Clone)]
pub struct TransformSuccess {
    pub index: usize,
    pub original_name: String,
    /// Archive-safe base name, without extension or position suffix
    pub safe_base_name: String,
    pub format: OutputFormat,
    pub width: u32,
    pub height: u32,
    pub input_bytes: u64,
    pub output_bytes: u64,
    pub data: Bytes,
}

impl TransformSuccess {
    /// Name used when this is the only file in the response.
    pub fn file_name(&self) -> String {
        format!("{}.{}", self.safe_base_name, self.format.extension())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformFailure {
    pub index: usize,
    pub original_name: String,
    pub reason: String,
}

/// Result of transforming one batch item. Exactly one per input, keyed by input index.
#[derive(Debug, Clone)]
pub enum TransformOutcome {
    Success(TransformSuccess),
    Failure(TransformFailure),
}

impl TransformOutcome {
    pub fn failure(index: usize, original_name: impl Into<String>, reason: impl Into<String>) -> Self {
        TransformOutcome::Failure(TransformFailure {
            index,
            original_name: original_name.into(),
            reason: reason.into(),
        })
    }

    pub fn index(&self) -> usize {
        match self {
            TransformOutcome::Success(s) => s.index,
            TransformOutcome::Failure(f) => f.index,
        }
    }

    pub fn original_name(&self) -> &str {
        match self {
            TransformOutcome::Success(s) => &s.original_name,
            TransformOutcome::Failure(f) => &f.original_name,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, TransformOutcome::Success(_))
    }

    pub fn as_success(&self) -> Option<&TransformSuccess> {
        match self {
            TransformOutcome::Success(s) => Some(s),
            TransformOutcome::Failure(_) => None,
        }
    }

    pub fn as_failure(&self) -> Option<&TransformFailure> {
        match self {
            TransformOutcome::Success(_) => None,
            TransformOutcome::Failure(f) => Some(f),
        }
    }
}
