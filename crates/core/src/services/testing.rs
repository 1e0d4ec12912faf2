//! Fixtures shared by service tests.

use std::collections::BTreeMap;

use boardhop_common::{AppError, AppResult, MemoryStorage, StorageBackend, UploadedFile};
use boardhop_db::entities::post;
use bytes::Bytes;
use chrono::Utc;
use maplit::btreemap;
use sea_orm::{MockExecResult, Value};

use super::media::MediaUpload;

/// In-memory blob store that fails uploads whose key contains a marker.
pub struct FailingStorage {
    inner: MemoryStorage,
    fail_markers: Vec<String>,
}

impl FailingStorage {
    pub fn new(fail_markers: &[&str]) -> Self {
        Self {
            inner: MemoryStorage::new("/files"),
            fail_markers: fail_markers.iter().map(ToString::to_string).collect(),
        }
    }

    pub async fn keys(&self) -> Vec<String> {
        self.inner.keys().await
    }
}

#[async_trait::async_trait]
impl StorageBackend for FailingStorage {
    async fn upload(&self, key: &str, data: &[u8], content_type: &str) -> AppResult<UploadedFile> {
        if self.fail_markers.iter().any(|marker| key.contains(marker.as_str())) {
            return Err(AppError::Storage(format!("injected failure for {key}")));
        }
        self.inner.upload(key, data, content_type).await
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        self.inner.delete(key).await
    }

    fn public_url(&self, key: &str) -> String {
        self.inner.public_url(key)
    }

    async fn exists(&self, key: &str) -> AppResult<bool> {
        self.inner.exists(key).await
    }
}

pub fn upload(file_name: &str, content_type: &str) -> MediaUpload {
    MediaUpload {
        file_name: file_name.to_string(),
        content_type: content_type.to_string(),
        data: Bytes::from_static(b"blob"),
    }
}

pub fn exec(rows_affected: u64) -> MockExecResult {
    MockExecResult {
        last_insert_id: 0,
        rows_affected,
    }
}

pub fn post_model(id: &str, user_id: &str) -> post::Model {
    post::Model {
        id: id.to_string(),
        user_id: user_id.to_string(),
        title: "Twin fin".to_string(),
        description: None,
        price: 40.0,
        rate: "day".to_string(),
        pickup_latitude: None,
        pickup_longitude: None,
        media_revision: 0,
        created_at: Utc::now().fixed_offset(),
        updated_at: None,
        deleted_at: None,
    }
}

/// A row shaped like the post detail query.
pub fn detail_row(id: &str, user_id: &str) -> BTreeMap<&'static str, Value> {
    btreemap! {
        "id" => id.into(),
        "user_id" => user_id.into(),
        "title" => "Twin fin".into(),
        "description" => Option::<String>::None.into(),
        "price" => 40.0_f64.into(),
        "rate" => "day".into(),
        "pickup_latitude" => Option::<f64>::None.into(),
        "pickup_longitude" => Option::<f64>::None.into(),
        "media_revision" => 0_i32.into(),
        "created_at" => Utc::now().fixed_offset().into(),
        "updated_at" => Option::<chrono::DateTime<chrono::FixedOffset>>::None.into(),
        "email" => "owner@example.com".into(),
        "avatar_url" => Option::<String>::None.into(),
        "first_name" => "Kai".into(),
        "last_name" => "Lenny".into(),
    }
}

pub fn id_row(id: i32) -> BTreeMap<&'static str, Value> {
    btreemap! { "id" => id.into() }
}

pub fn empty_rows() -> Vec<BTreeMap<&'static str, Value>> {
    Vec::new()
}
