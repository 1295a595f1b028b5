pub type RecordId = i64;

pub const DEFAULT_UPLOAD_FILENAME: &str = "upload.bin";

/// Coordinates of one container value: a column of one record in one table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerRef {
    pub table: String,
    pub field: String,
    pub record_id: RecordId,
}

impl ContainerRef {
    pub fn new(table: impl Into<String>, field: impl Into<String>, record_id: RecordId) -> Self {
        Self {
            table: table.into(),
            field: field.into(),
            record_id,
        }
    }
}

/// Content to be written to a container. The filename is advisory: FileMaker
/// stores it alongside the data and reports it back as the reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlobPayload {
    pub bytes: Vec<u8>,
    pub filename: Option<String>,
}

impl BlobPayload {
    pub fn new(bytes: Vec<u8>, filename: impl Into<String>) -> Self {
        Self {
            bytes,
            filename: Some(filename.into()),
        }
    }

    pub fn anonymous(bytes: Vec<u8>) -> Self {
        Self {
            bytes,
            filename: None,
        }
    }
}
