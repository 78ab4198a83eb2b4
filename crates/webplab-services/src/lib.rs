//! WebP Lab Services Layer
//!
//! Business services that sit between the processing pipeline and the HTTP crate:
//! - Archive creation (zip over named in-memory blobs)
//! - Result packaging (single file vs archive, manifest, error report)

pub mod archive;
pub mod packager;

pub use archive::{create_zip_archive, ArchiveEntry};
pub use packager::{pack, PackagedResponse, ResponseBody, ARCHIVE_FILE_NAME};
