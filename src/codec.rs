//! Reading and writing FileMaker container fields.
//!
//! Container fields can't be mapped as plain large objects: writes need
//! `SET field = ? AS 'filename'` and reads go through `GetAs(field, 'code')`.
//! [`ContainerCodec`] renders those statements for the executor's dialect and
//! runs them, one pooled connection per call.
//!
//! Store failures never cross this boundary. They are logged and reported as
//! the operation's failure value (`false` / `None`), which callers can't tell
//! apart from a missing record or a format mismatch.

use std::sync::Arc;

use tracing::{debug, error, info};

use crate::data_types::{BlobPayload, ContainerRef, DEFAULT_UPLOAD_FILENAME};
use crate::format::{mime_for_filename, Format};
use crate::store::dialect::{sanitize_filename, Dialect};
use crate::store::interface::{Executor, Result};

#[derive(Debug, Clone)]
pub struct ContainerCodec {
    executor: Arc<dyn Executor>,
    default_filename: String,
}

fn or_log<T>(operation: &str, target: &ContainerRef, result: Result<T>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            error!(
                "Failed to {operation} container field {}.{} for record {}: {e}",
                target.table, target.field, target.record_id
            );
            None
        }
    }
}

impl ContainerCodec {
    pub fn new(executor: Arc<dyn Executor>) -> Self {
        Self {
            executor,
            default_filename: DEFAULT_UPLOAD_FILENAME.to_string(),
        }
    }

    /// Filename used for uploads that don't come with one.
    pub fn with_default_filename(mut self, filename: impl Into<String>) -> Self {
        self.default_filename = filename.into();
        self
    }

    pub fn dialect(&self) -> Dialect {
        self.executor.dialect()
    }

    pub fn executor(&self) -> Arc<dyn Executor> {
        self.executor.clone()
    }

    fn filename_for(&self, payload: &BlobPayload) -> String {
        sanitize_filename(payload.filename.as_deref(), &self.default_filename)
    }

    /// Store `payload` in the container. True if the record was updated.
    pub async fn upload(&self, target: &ContainerRef, payload: &BlobPayload) -> bool {
        let filename = self.filename_for(payload);
        info!(
            "Uploading {} bytes to {}.{} for record {} as {filename:?}",
            payload.bytes.len(),
            target.table,
            target.field,
            target.record_id
        );

        let statement = self.dialect().upload(target, &payload.bytes, &filename);
        match or_log("upload to", target, self.executor.execute(&statement).await) {
            Some(updated) => {
                info!("Container upload result: {updated} rows updated");
                updated > 0
            }
            None => false,
        }
    }

    /// Store `payload` and record its MIME type in `content_type_column` in
    /// one transaction, so the two can't drift apart. Without an explicit
    /// `content_type` the one matching the filename's extension is used.
    pub async fn upload_with_content_type(
        &self,
        target: &ContainerRef,
        payload: &BlobPayload,
        content_type_column: &str,
        content_type: Option<&str>,
    ) -> bool {
        let filename = self.filename_for(payload);
        let content_type = content_type
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| mime_for_filename(&filename));
        info!(
            "Uploading {} bytes ({content_type}) to {}.{} for record {} as {filename:?}",
            payload.bytes.len(),
            target.table,
            target.field,
            target.record_id
        );

        let dialect = self.dialect();
        let statements = [
            dialect.upload(target, &payload.bytes, &filename),
            dialect.set_content_type(target, content_type_column, Some(content_type)),
        ];
        match or_log(
            "upload to",
            target,
            self.executor.execute_in_transaction(&statements).await,
        ) {
            Some(updated) => {
                info!("Container upload result: {updated:?} rows updated");
                updated.first().is_some_and(|n| *n > 0)
            }
            None => false,
        }
    }

    /// Read the container converted to `format`. `None` when the record
    /// doesn't exist, the field is empty or holds a different format.
    pub async fn download(&self, target: &ContainerRef, format: &Format) -> Option<Vec<u8>> {
        info!(
            "Downloading from container: {}.{} for record {} as {:?}",
            target.table,
            target.field,
            target.record_id,
            format.dialect_code()
        );

        let statement = self.dialect().download(target, format);
        let data = or_log(
            "download from",
            target,
            self.executor.fetch_bytes(&statement).await,
        )
        .flatten()
        .filter(|data| !data.is_empty());

        match &data {
            Some(data) => info!("Downloaded {} bytes from container", data.len()),
            None => info!("Container field is empty or format not available"),
        }
        data
    }

    /// [`ContainerCodec::download`] with a caller supplied format name,
    /// defaulting to PDF.
    pub async fn download_as(
        &self,
        target: &ContainerRef,
        format: Option<&str>,
    ) -> Option<Vec<u8>> {
        self.download(target, &Format::normalize_or_default(format))
            .await
    }

    /// Empty the container. True if the record was updated.
    pub async fn clear(&self, target: &ContainerRef) -> bool {
        info!(
            "Clearing container: {}.{} for record {}",
            target.table, target.field, target.record_id
        );

        let statement = self.dialect().clear(target);
        match or_log("clear", target, self.executor.execute(&statement).await) {
            Some(updated) => {
                info!("Container clear result: {updated} rows updated");
                updated > 0
            }
            None => false,
        }
    }

    /// Empty the container and its MIME type column in one transaction.
    pub async fn clear_with_content_type(
        &self,
        target: &ContainerRef,
        content_type_column: &str,
    ) -> bool {
        info!(
            "Clearing container and {content_type_column}: {}.{} for record {}",
            target.table, target.field, target.record_id
        );

        let dialect = self.dialect();
        let statements = [
            dialect.clear(target),
            dialect.set_content_type(target, content_type_column, None),
        ];
        match or_log(
            "clear",
            target,
            self.executor.execute_in_transaction(&statements).await,
        ) {
            Some(updated) => {
                info!("Container clear result: {updated:?} rows updated");
                updated.first().is_some_and(|n| *n > 0)
            }
            None => false,
        }
    }

    /// Textual form of the container, usually the stored filename.
    pub async fn get_reference(&self, target: &ContainerRef) -> Option<String> {
        info!(
            "Reading container reference: {}.{} for record {}",
            target.table, target.field, target.record_id
        );

        let statement = self.dialect().reference(target);
        let reference = or_log(
            "read reference of",
            target,
            self.executor.fetch_text(&statement).await,
        )
        .flatten()
        .filter(|r| !r.is_empty());

        debug!("Container reference: {reference:?}");
        reference
    }

    /// MIME type recorded next to the container by the caller.
    pub async fn get_content_type(
        &self,
        target: &ContainerRef,
        content_type_column: &str,
    ) -> Option<String> {
        let statement = self.dialect().content_type(target, content_type_column);
        or_log(
            "read content type of",
            target,
            self.executor.fetch_text(&statement).await,
        )
        .flatten()
        .filter(|c| !c.is_empty())
    }
}
