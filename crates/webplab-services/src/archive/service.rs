use anyhow::{Context, Result};
use bytes::Bytes;
use std::io::Write;
use std::path::Path;

/// DEFLATE effort for every entry (0 store .. 9 best)
const ZIP_COMPRESSION_LEVEL: i32 = 6;

/// One file to be written into an archive
#[derive(Debug, Clone)]
pub struct ArchiveEntry {
    pub name: String,
    pub data: Bytes,
}

impl ArchiveEntry {
    pub fn new(name: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            data: data.into(),
        }
    }
}

/// Strip directory components so an entry can never escape the archive root.
fn sanitize_archive_filename(filename: &str, fallback: &str) -> String {
    Path::new(filename)
        .file_name()
        .and_then(|n| n.to_str())
        .filter(|s| !s.is_empty() && *s != "." && *s != "..")
        .unwrap_or(fallback)
        .to_string()
}

/// Create a ZIP archive from in-memory entries, in the order given
pub fn create_zip_archive(entries: &[ArchiveEntry]) -> Result<Vec<u8>> {
    use zip::write::{FileOptions, ZipWriter};
    use zip::CompressionMethod;

    let mut buffer = Vec::new();
    {
        let mut zip = ZipWriter::new(std::io::Cursor::new(&mut buffer));
        let options = FileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .compression_level(Some(ZIP_COMPRESSION_LEVEL))
            .unix_permissions(0o644);

        for (position, entry) in entries.iter().enumerate() {
            let safe_filename =
                sanitize_archive_filename(&entry.name, &format!("entry-{}", position + 1));

            zip.start_file(safe_filename.as_str(), options)
                .with_context(|| format!("Failed to add file to ZIP: {}", safe_filename))?;
            zip.write_all(&entry.data)
                .with_context(|| format!("Failed to write file data to ZIP: {}", safe_filename))?;
        }

        zip.finish().context("Failed to finalize ZIP archive")?;
    }

    tracing::debug!(entries = entries.len(), size = buffer.len(), "Created ZIP archive");

    Ok(buffer)
}
