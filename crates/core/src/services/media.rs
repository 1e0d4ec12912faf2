//! Media planning and the blob upload saga.
//!
//! Media rows are staged in the unit of work before any blob is written.
//! Blobs are then uploaded while the transaction is still open, so a failed
//! upload can still be undone relationally. Compensation only has to clean
//! up the blobs this request wrote itself.

use std::collections::HashMap;

use boardhop_common::{AppError, AppResult, MediaConfig, StorageService, media_key};
use boardhop_db::entities::post_media::{self, MediaType};
use bytes::Bytes;
use chrono::Utc;
use futures::future::join_all;
use sea_orm::{NotSet, Set};
use serde::Deserialize;
use tracing::{debug, error, warn};

/// A file received with a write request.
#[derive(Debug, Clone)]
pub struct MediaUpload {
    pub file_name: String,
    pub content_type: String,
    pub data: Bytes,
}

/// One position of the ordered media list sent with an update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum MediaSlot {
    /// Keep an existing media row of the post.
    Existing { id: i32 },
    /// Use the `file`-th uploaded file of the request.
    Upload { file: usize },
}

/// A blob the staged rows reference but the store does not hold yet.
#[derive(Debug, Clone)]
pub(crate) struct PendingUpload {
    pub key: String,
    pub content_type: String,
    pub data: Bytes,
}

/// Rows and blobs for one full media replace.
#[derive(Debug, Default)]
pub(crate) struct MediaPlan {
    pub rows: Vec<post_media::ActiveModel>,
    pub uploads: Vec<PendingUpload>,
    /// Keys no longer referenced once the plan commits.
    pub dropped: Vec<String>,
}

impl MediaPlan {
    /// Media of a new post: every file in request order, revision 0.
    pub(crate) fn for_create(
        post_id: &str,
        files: Vec<MediaUpload>,
        storage: &StorageService,
    ) -> AppResult<Self> {
        let mut plan = Self::default();
        for (index, file) in files.into_iter().enumerate() {
            plan.push_upload(post_id, 0, index, file, storage)?;
        }
        Ok(plan)
    }

    /// Media of an updated post, laid out as `slots` describes.
    ///
    /// Every existing id must belong to the post and appear at most once.
    /// Every uploaded file must be used exactly once.
    pub(crate) fn for_update(
        post_id: &str,
        revision: i32,
        slots: &[MediaSlot],
        existing: Vec<post_media::Model>,
        files: Vec<MediaUpload>,
        storage: &StorageService,
    ) -> AppResult<Self> {
        let mut existing: HashMap<i32, post_media::Model> =
            existing.into_iter().map(|media| (media.id, media)).collect();
        let mut files: Vec<Option<MediaUpload>> = files.into_iter().map(Some).collect();
        let mut plan = Self::default();

        for (index, slot) in slots.iter().enumerate() {
            match *slot {
                MediaSlot::Existing { id } => {
                    let media = existing.remove(&id).ok_or_else(|| {
                        AppError::Validation(format!(
                            "Media {id} is not attached to this post or is listed twice"
                        ))
                    })?;
                    plan.rows.push(media_row(
                        post_id,
                        index,
                        media.storage_key,
                        media.media_url,
                        media.media_type,
                    )?);
                }
                MediaSlot::Upload { file } => {
                    let upload = files.get_mut(file).and_then(Option::take).ok_or_else(|| {
                        AppError::Validation(format!("File {file} is missing or listed twice"))
                    })?;
                    plan.push_upload(post_id, revision, index, upload, storage)?;
                }
            }
        }

        if files.iter().any(Option::is_some) {
            return Err(AppError::Validation(
                "Every uploaded file must appear in the media list".to_string(),
            ));
        }

        plan.dropped = existing.into_values().map(|media| media.storage_key).collect();
        plan.dropped.sort();
        Ok(plan)
    }

    fn push_upload(
        &mut self,
        post_id: &str,
        revision: i32,
        index: usize,
        file: MediaUpload,
        storage: &StorageService,
    ) -> AppResult<()> {
        let media_type = MediaType::from_content_type(&file.content_type).ok_or_else(|| {
            AppError::Validation(format!("Unsupported media type: {}", file.content_type))
        })?;
        let key = media_key(post_id, revision, index, &file.file_name);
        let url = storage.public_url(&key);

        self.rows
            .push(media_row(post_id, index, key.clone(), url, media_type)?);
        self.uploads.push(PendingUpload {
            key,
            content_type: file.content_type,
            data: file.data,
        });
        Ok(())
    }
}

fn media_row(
    post_id: &str,
    index: usize,
    storage_key: String,
    media_url: String,
    media_type: MediaType,
) -> AppResult<post_media::ActiveModel> {
    let position = i32::try_from(index)
        .map_err(|_| AppError::Validation("Too many media entries".to_string()))?;

    Ok(post_media::ActiveModel {
        id: NotSet,
        post_id: Set(post_id.to_string()),
        position: Set(position),
        storage_key: Set(storage_key),
        media_url: Set(media_url),
        media_type: Set(media_type),
        created_at: Set(Utc::now().fixed_offset()),
        deleted_at: Set(None),
    })
}

/// Reject file sets that break the configured limits before anything is written.
pub(crate) fn check_files(files: &[MediaUpload], limits: &MediaConfig) -> AppResult<()> {
    if files.len() > limits.max_files {
        return Err(AppError::Validation(format!(
            "At most {} files per request",
            limits.max_files
        )));
    }

    for file in files {
        if file.data.is_empty() {
            return Err(AppError::Validation(format!("File {} is empty", file.file_name)));
        }
        if file.data.len() > limits.max_file_size {
            return Err(AppError::Validation(format!(
                "File {} is larger than {} bytes",
                file.file_name, limits.max_file_size
            )));
        }
        if MediaType::from_content_type(&file.content_type).is_none() {
            return Err(AppError::Validation(format!(
                "Unsupported media type: {}",
                file.content_type
            )));
        }
    }

    Ok(())
}

/// Upload every pending blob concurrently.
///
/// If any upload fails, the uploads that did succeed are deleted and the
/// first failure is returned. On success returns the written keys.
pub(crate) async fn upload_all(
    storage: &StorageService,
    uploads: &[PendingUpload],
) -> AppResult<Vec<String>> {
    let results = join_all(uploads.iter().map(|upload| async move {
        storage
            .upload(&upload.key, &upload.data, &upload.content_type)
            .await
            .map(|_| upload.key.clone())
    }))
    .await;

    let mut written = Vec::with_capacity(results.len());
    let mut failure = None;
    for result in results {
        match result {
            Ok(key) => written.push(key),
            Err(err) if failure.is_none() => failure = Some(err),
            Err(err) => warn!(error = %err, "Additional blob upload failed"),
        }
    }

    match failure {
        None => {
            debug!(count = written.len(), "Uploaded media blobs");
            Ok(written)
        }
        Some(err) => {
            discard(storage, &written, "upload failed").await;
            Err(err)
        }
    }
}

/// Delete blobs without failing the caller.
///
/// A failed delete is a compensation failure: it is logged and the blob is
/// left for manual cleanup.
pub(crate) async fn discard(storage: &StorageService, keys: &[String], reason: &'static str) {
    if keys.is_empty() {
        return;
    }

    let results = join_all(keys.iter().map(|key| storage.delete(key))).await;
    for (key, result) in keys.iter().zip(results) {
        match result {
            Ok(()) => debug!(key = %key, reason, "Deleted media blob"),
            Err(err) => {
                warn!(key = %key, reason, error = %err, "Blob delete failed, manual cleanup needed");
            }
        }
    }
}

/// Log blobs whose owning rows may or may not exist.
pub(crate) fn flag_for_reconciliation(keys: &[String]) {
    for key in keys {
        error!(key = %key, "Blob needs reconciliation against post_media");
    }
}
