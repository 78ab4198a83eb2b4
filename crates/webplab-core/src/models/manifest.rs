//! Summary document written next to the files of an archive response.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::outcome::TransformOutcome;
use super::transform::TransformConfiguration;

/// Aggregate counters for one batch. Byte totals cover successes only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchTotals {
    pub processed: usize,
    pub failed: usize,
    pub input_bytes: u64,
    pub output_bytes: u64,
}

impl BatchTotals {
    pub fn from_outcomes(outcomes: &[TransformOutcome]) -> Self {
        outcomes.iter().fold(Self::default(), |mut totals, outcome| {
            match outcome {
                TransformOutcome::Success(s) => {
                    totals.processed += 1;
                    totals.input_bytes += s.input_bytes;
                    totals.output_bytes += s.output_bytes;
                }
                TransformOutcome::Failure(_) => totals.failed += 1,
            }
            totals
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status")]
pub enum ManifestItem {
    #[serde(rename = "ok", rename_all = "camelCase")]
    Ok {
        original_name: String,
        /// Entry name inside the archive
        file_name: String,
        input_bytes: u64,
        output_bytes: u64,
        output_ext: String,
        width: u32,
        height: u32,
    },
    #[serde(rename = "error", rename_all = "camelCase")]
    Error {
        original_name: String,
        reason: String,
    },
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchManifest {
    pub generated_at: DateTime<Utc>,
    pub options: TransformConfiguration,
    pub totals: BatchTotals,
    pub items: Vec<ManifestItem>,
}

impl BatchManifest {
    /// Build the manifest in input order. `entry_name` resolves the archive entry of a success.
    pub fn build<F>(
        generated_at: DateTime<Utc>,
        options: &TransformConfiguration,
        outcomes: &[TransformOutcome],
        mut entry_name: F,
    ) -> Self
    where
        F: FnMut(usize) -> String,
    {
        let items = outcomes
            .iter()
            .map(|outcome| match outcome {
                TransformOutcome::Success(s) => ManifestItem::Ok {
                    original_name: s.original_name.clone(),
                    file_name: entry_name(s.index),
                    input_bytes: s.input_bytes,
                    output_bytes: s.output_bytes,
                    output_ext: s.format.extension().to_string(),
                    width: s.width,
                    height: s.height,
                },
                TransformOutcome::Failure(f) => ManifestItem::Error {
                    original_name: f.original_name.clone(),
                    reason: f.reason.clone(),
                },
            })
            .collect();

        Self {
            generated_at,
            options: options.clone(),
            totals: BatchTotals::from_outcomes(outcomes),
            items,
        }
    }
}
