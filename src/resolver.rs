//! Working out which format to ask the store for.
//!
//! FileMaker only hands back container data when it's requested in the
//! format it was stored in. When the caller doesn't say which one that is,
//! [`FormatResolver`] tries, in order:
//!
//! 1. the format the caller asked for,
//! 2. the MIME type the caller keeps next to the container,
//! 3. the extension of the container reference (one extra round trip),
//! 4. every typed format in [`PROBE_ORDER`] until one returns data (up to
//!    five round trips).
//!
//! A tier is only consulted when the ones before it produced no format.
//! The reference tier is the exception: if its guess turns out wrong we
//! still fall back to probing.

use serde::Serialize;
use tracing::{debug, info};

use crate::codec::ContainerCodec;
use crate::data_types::{ContainerRef, RecordId};
use crate::format::{Format, PROBE_ORDER};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionTier {
    Explicit,
    Metadata,
    Reference,
    Probe,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedContent {
    pub bytes: Vec<u8>,
    pub format: Format,
    pub tier: ResolutionTier,
}

impl ResolvedContent {
    pub fn mime_type(&self) -> &'static str {
        self.format.mime_type()
    }

    /// `<stem>.<ext>` for the resolved format, e.g. `photo.jpg`.
    pub fn filename(&self, stem: &str) -> String {
        format!("{stem}.{}", self.format.extension())
    }
}

/// What is known about a container without downloading it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContainerInfo {
    pub record_id: RecordId,
    pub reference: Option<String>,
    pub content_type: Option<String>,
    pub has_content: bool,
}

pub struct FormatResolver<'a> {
    codec: &'a ContainerCodec,
}

impl<'a> FormatResolver<'a> {
    pub fn new(codec: &'a ContainerCodec) -> Self {
        Self { codec }
    }

    async fn fetch(
        &self,
        target: &ContainerRef,
        format: Format,
        tier: ResolutionTier,
    ) -> Option<ResolvedContent> {
        let bytes = self.codec.download(target, &format).await?;
        Some(ResolvedContent { bytes, format, tier })
    }

    /// Download the container, picking the format as described in the
    /// module docs. `stored_mime` is the caller's MIME column, if any.
    pub async fn resolve(
        &self,
        target: &ContainerRef,
        explicit: Option<&str>,
        stored_mime: Option<&str>,
    ) -> Option<ResolvedContent> {
        if let Some(requested) = explicit.filter(|f| !f.is_empty()) {
            return self
                .fetch(target, Format::normalize(requested), ResolutionTier::Explicit)
                .await;
        }

        if let Some(format) = stored_mime.and_then(Format::from_mime) {
            debug!("Using format {format} from stored content type");
            return self.fetch(target, format, ResolutionTier::Metadata).await;
        }

        if let Some(format) = self
            .codec
            .get_reference(target)
            .await
            .as_deref()
            .and_then(Format::from_reference)
        {
            debug!("Using format {format} from container reference");
            if let Some(content) = self.fetch(target, format, ResolutionTier::Reference).await {
                return Some(content);
            }
        }

        self.probe(target).await
    }

    /// Try every typed format in turn, stopping at the first with data.
    pub async fn probe(&self, target: &ContainerRef) -> Option<ResolvedContent> {
        info!(
            "Probing formats for {}.{} on record {}",
            target.table, target.field, target.record_id
        );
        for format in PROBE_ORDER {
            if let Some(content) = self.fetch(target, format, ResolutionTier::Probe).await {
                return Some(content);
            }
        }
        None
    }

    pub async fn describe(
        &self,
        target: &ContainerRef,
        stored_mime: Option<&str>,
    ) -> ContainerInfo {
        let reference = self.codec.get_reference(target).await;
        let content_type = stored_mime
            .filter(|m| !m.is_empty())
            .map(str::to_string)
            .or_else(|| {
                reference
                    .as_deref()
                    .and_then(Format::from_reference)
                    .map(|f| f.mime_type().to_string())
            });

        ContainerInfo {
            record_id: target.record_id,
            has_content: reference.is_some(),
            reference,
            content_type,
        }
    }
}
