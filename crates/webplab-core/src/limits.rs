//! Per-request batch limits resolved from the environment.
//!
//! Limits are re-read for every request so operators can adjust them without a restart.

use std::env;
use std::num::NonZeroUsize;

pub const MAX_INPUT_FILE_MB_ENV: &str = "MAX_INPUT_FILE_MB";
pub const MAX_TOTAL_INPUT_MB_ENV: &str = "MAX_TOTAL_INPUT_MB";
pub const MAX_BATCH_FILES_ENV: &str = "MAX_BATCH_FILES";
pub const TRANSFORM_CONCURRENCY_ENV: &str = "TRANSFORM_CONCURRENCY";

const DEFAULT_MAX_BATCH_FILES: usize = 250;
const MAX_DEFAULT_CONCURRENCY: usize = 8;
const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RuntimeLimits {
    /// Per-file cap in MB, 0 = unlimited
    pub max_input_file_mb: f64,
    /// Whole-batch cap in MB, 0 = unlimited
    pub max_total_input_mb: f64,
    pub max_batch_files: usize,
    /// Number of transform workers per batch
    pub concurrency: usize,
}

impl RuntimeLimits {
    pub fn from_env() -> Self {
        let units = std::thread::available_parallelism()
            .map(NonZeroUsize::get)
            .unwrap_or(1);
        Self::resolve(|name| env::var(name).ok(), units)
    }

    /// Resolve limits from a variable lookup and the number of available processing units.
    ///
    /// Each value must parse to a finite number greater than zero, otherwise its default applies.
    pub fn resolve<F>(lookup: F, processing_units: usize) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let positive = |name: &str| {
            lookup(name)
                .and_then(|raw| raw.trim().parse::<f64>().ok())
                .filter(|v| v.is_finite() && *v > 0.0)
        };
        let positive_int = |name: &str, fallback: usize| {
            positive(name)
                .map(|v| (v.floor() as usize).max(1))
                .unwrap_or(fallback)
        };

        Self {
            max_input_file_mb: positive(MAX_INPUT_FILE_MB_ENV).unwrap_or(0.0),
            max_total_input_mb: positive(MAX_TOTAL_INPUT_MB_ENV).unwrap_or(0.0),
            max_batch_files: positive_int(MAX_BATCH_FILES_ENV, DEFAULT_MAX_BATCH_FILES),
            concurrency: positive_int(
                TRANSFORM_CONCURRENCY_ENV,
                processing_units.clamp(1, MAX_DEFAULT_CONCURRENCY),
            ),
        }
    }

    /// Per-file byte cap, `None` when unlimited.
    pub fn max_input_file_bytes(&self) -> Option<u64> {
        mb_to_bytes(self.max_input_file_mb)
    }

    /// Whole-batch byte cap, `None` when unlimited.
    pub fn max_total_input_bytes(&self) -> Option<u64> {
        mb_to_bytes(self.max_total_input_mb)
    }
}

fn mb_to_bytes(mb: f64) -> Option<u64> {
    (mb > 0.0).then(|| (mb * BYTES_PER_MB) as u64)
}
