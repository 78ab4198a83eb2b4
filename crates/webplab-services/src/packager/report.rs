use chrono::{DateTime, SecondsFormat, Utc};
use webplab_core::{TransformConfiguration, TransformOutcome};

/// Plain-text summary of a batch, one numbered line per failure.
pub fn build_error_report(
    outcomes: &[TransformOutcome],
    config: &TransformConfiguration,
    generated_at: DateTime<Utc>,
) -> String {
    let processed = outcomes.iter().filter(|o| o.is_success()).count();
    let failures: Vec<_> = outcomes
        .iter()
        .filter_map(TransformOutcome::as_failure)
        .collect();

    let mut lines = vec![
        "WebP Lab transform report".to_string(),
        format!(
            "Generated: {}",
            generated_at.to_rfc3339_opts(SecondsFormat::Millis, true)
        ),
        format!("Processed: {}", processed),
        format!("Failed: {}", failures.len()),
        String::new(),
        format!("Output format: {}", config.format),
        format!("Quality: {}", config.quality),
        String::new(),
    ];

    if !failures.is_empty() {
        lines.push("Failures:".to_string());
        for (position, failure) in failures.iter().enumerate() {
            lines.push(format!(
                "{}. {} -> {}",
                position + 1,
                failure.original_name,
                failure.reason
            ));
        }
    }

    lines.join("\n")
}
