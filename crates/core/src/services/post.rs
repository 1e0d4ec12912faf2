//! Post service.
//!
//! Creates and updates run as one saga over a shared unit of work:
//! root row, tags, categories, media rows, then blob uploads, then commit.
//! A failure before commit rolls the transaction back and deletes the
//! blobs this request uploaded. A failed commit leaves its blobs in place
//! and logs their keys for reconciliation.

use boardhop_common::{AppError, AppResult, IdGenerator, ListingConfig, MediaConfig, StorageService};
use boardhop_db::{
    TxScope, UnitOfWork,
    composer::{ListingFilter, ListingQuery},
    entities::post,
    repositories::{PostRepository, TaxonomyRepository},
    views::{PostAggregate, PostListing},
};
use chrono::Utc;
use sea_orm::Set;
use serde::{Deserialize, Deserializer};
use tracing::{debug, error, info, warn};
use validator::Validate;

use super::media::{self, MediaPlan, MediaSlot, MediaUpload};

/// Input for creating a post.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreatePostInput {
    #[validate(length(min = 1, max = 256))]
    pub title: String,
    #[validate(range(min = 0.0))]
    pub price: f64,
    #[validate(length(min = 1, max = 32))]
    pub rate: String,
    #[validate(length(max = 8192))]
    pub description: Option<String>,
    #[validate(range(min = -90.0, max = 90.0))]
    pub pickup_latitude: Option<f64>,
    #[validate(range(min = -180.0, max = 180.0))]
    pub pickup_longitude: Option<f64>,
    #[serde(default)]
    pub tag_ids: Vec<i32>,
    #[serde(default)]
    pub category_ids: Vec<i32>,
}

/// Input for updating a post.
///
/// Absent fields are left unchanged. For the nullable scalars an explicit
/// `null` clears the value. A present id list or media list replaces the
/// whole collection, so an empty list clears it.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePostInput {
    #[validate(length(min = 1, max = 256))]
    pub title: Option<String>,
    #[validate(range(min = 0.0))]
    pub price: Option<f64>,
    #[validate(length(min = 1, max = 32))]
    pub rate: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub pickup_latitude: Option<Option<f64>>,
    #[serde(default, deserialize_with = "double_option")]
    pub pickup_longitude: Option<Option<f64>>,
    pub tag_ids: Option<Vec<i32>>,
    pub category_ids: Option<Vec<i32>>,
    pub media: Option<Vec<MediaSlot>>,
}

fn double_option<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

impl UpdatePostInput {
    fn check(&self) -> AppResult<()> {
        self.validate()?;

        if let Some(Some(description)) = &self.description
            && description.chars().count() > 8192
        {
            return Err(AppError::Validation(
                "description: length must be at most 8192".to_string(),
            ));
        }
        if let Some(Some(lat)) = self.pickup_latitude
            && !(-90.0..=90.0).contains(&lat)
        {
            return Err(AppError::Validation("pickupLatitude: out of range".to_string()));
        }
        if let Some(Some(lng)) = self.pickup_longitude
            && !(-180.0..=180.0).contains(&lng)
        {
            return Err(AppError::Validation("pickupLongitude: out of range".to_string()));
        }
        Ok(())
    }

    /// Scalar columns to write. `updated_at` is always set.
    fn changes(&self, media_revision: Option<i32>) -> post::ActiveModel {
        let mut model = post::ActiveModel {
            updated_at: Set(Some(Utc::now().fixed_offset())),
            ..Default::default()
        };
        if let Some(title) = &self.title {
            model.title = Set(title.clone());
        }
        if let Some(price) = self.price {
            model.price = Set(price);
        }
        if let Some(rate) = &self.rate {
            model.rate = Set(rate.clone());
        }
        if let Some(description) = &self.description {
            model.description = Set(description.clone());
        }
        if let Some(lat) = self.pickup_latitude {
            model.pickup_latitude = Set(lat);
        }
        if let Some(lng) = self.pickup_longitude {
            model.pickup_longitude = Set(lng);
        }
        if let Some(revision) = media_revision {
            model.media_revision = Set(revision);
        }
        model
    }
}

/// Service for listing and writing posts.
#[derive(Clone)]
pub struct PostService {
    post_repo: PostRepository,
    taxonomy_repo: TaxonomyRepository,
    storage: StorageService,
    listing: ListingConfig,
    media_limits: MediaConfig,
    id_gen: IdGenerator,
}

impl PostService {
    /// Create a new post service.
    #[must_use]
    pub const fn new(
        post_repo: PostRepository,
        taxonomy_repo: TaxonomyRepository,
        storage: StorageService,
        listing: ListingConfig,
        media_limits: MediaConfig,
    ) -> Self {
        Self {
            post_repo,
            taxonomy_repo,
            storage,
            listing,
            media_limits,
            id_gen: IdGenerator::new(),
        }
    }

    /// List posts for a raw listing query. Malformed filter values are ignored.
    pub async fn list(&self, query: &ListingQuery) -> AppResult<Vec<PostListing>> {
        let filter = ListingFilter::from_query(query, &self.listing);
        debug!(?filter, "Listing posts");

        let posts = self.post_repo.list(TxScope::Auto, &filter).await?;
        if posts.is_empty() {
            return Err(AppError::NotFound("No posts found".to_string()));
        }
        Ok(posts)
    }

    /// Get a post with categories, tags and media.
    pub async fn get(&self, id: &str) -> AppResult<PostAggregate> {
        self.post_repo.get(TxScope::Auto, id).await
    }

    /// Create a post with its tags, categories and media. Returns the new id.
    pub async fn create(
        &self,
        user_id: &str,
        input: CreatePostInput,
        files: Vec<MediaUpload>,
    ) -> AppResult<String> {
        input.validate()?;
        media::check_files(&files, &self.media_limits)?;
        let tag_ids = self.checked_tag_ids(input.tag_ids.clone()).await?;
        let category_ids = self.checked_category_ids(input.category_ids.clone()).await?;

        let post_id = self.id_gen.generate();
        let MediaPlan { rows, uploads, .. } = MediaPlan::for_create(&post_id, files, &self.storage)?;

        let model = post::ActiveModel {
            id: Set(post_id.clone()),
            user_id: Set(user_id.to_string()),
            title: Set(input.title),
            description: Set(input.description),
            price: Set(input.price),
            rate: Set(input.rate),
            pickup_latitude: Set(input.pickup_latitude),
            pickup_longitude: Set(input.pickup_longitude),
            media_revision: Set(0),
            created_at: Set(Utc::now().fixed_offset()),
            updated_at: Set(None),
            deleted_at: Set(None),
        };

        let mut uow = self.post_repo.begin().await?;
        let staged = async {
            self.post_repo.insert(uow.scope(), model).await?;
            debug!(post_id = %post_id, "Staged post row");
            self.post_repo
                .insert_post_tags(uow.scope(), &post_id, &tag_ids)
                .await?;
            self.post_repo
                .insert_post_categories(uow.scope(), &post_id, &category_ids)
                .await?;
            self.post_repo.insert_post_medias(uow.scope(), rows).await
        }
        .await;

        if let Err(err) = staged {
            abort(&mut uow, &err).await;
            return Err(err);
        }
        self.publish(uow, &uploads).await?;

        info!(post_id = %post_id, user_id = %user_id, files = uploads.len(), "Post created");
        Ok(post_id)
    }

    /// Apply a partial update to a post the caller owns.
    ///
    /// The post row is locked for the whole unit of work, so concurrent
    /// replaces of the same post serialize.
    pub async fn update(
        &self,
        user_id: &str,
        post_id: &str,
        input: UpdatePostInput,
        files: Vec<MediaUpload>,
    ) -> AppResult<PostAggregate> {
        input.check()?;
        if input.media.is_none() && !files.is_empty() {
            return Err(AppError::Validation(
                "Uploaded files need a media list".to_string(),
            ));
        }
        media::check_files(&files, &self.media_limits)?;
        let tag_ids = match &input.tag_ids {
            Some(ids) => Some(self.checked_tag_ids(ids.clone()).await?),
            None => None,
        };
        let category_ids = match &input.category_ids {
            Some(ids) => Some(self.checked_category_ids(ids.clone()).await?),
            None => None,
        };

        let mut uow = self.post_repo.begin().await?;
        let staged = async {
            let current = self
                .post_repo
                .find_for_update(uow.scope(), post_id)
                .await?
                .ok_or_else(|| AppError::PostNotFound(post_id.to_string()))?;
            if current.user_id != user_id {
                return Err(AppError::Forbidden("Not the post owner".to_string()));
            }

            let plan = match &input.media {
                Some(slots) => {
                    let existing = self.post_repo.find_medias(uow.scope(), post_id).await?;
                    Some(MediaPlan::for_update(
                        post_id,
                        current.media_revision + 1,
                        slots,
                        existing,
                        files,
                        &self.storage,
                    )?)
                }
                None => None,
            };

            let revision = plan.as_ref().map(|_| current.media_revision + 1);
            self.post_repo
                .update(uow.scope(), post_id, input.changes(revision))
                .await?;

            if let Some(ids) = &tag_ids {
                self.post_repo.delete_post_tags(uow.scope(), post_id).await?;
                self.post_repo
                    .insert_post_tags(uow.scope(), post_id, ids)
                    .await?;
            }
            if let Some(ids) = &category_ids {
                self.post_repo
                    .delete_post_categories(uow.scope(), post_id)
                    .await?;
                self.post_repo
                    .insert_post_categories(uow.scope(), post_id, ids)
                    .await?;
            }
            match plan {
                Some(plan) => {
                    self.post_repo
                        .delete_post_medias(uow.scope(), post_id)
                        .await?;
                    self.post_repo
                        .insert_post_medias(uow.scope(), plan.rows)
                        .await?;
                    Ok((plan.uploads, plan.dropped))
                }
                None => Ok((Vec::new(), Vec::new())),
            }
        }
        .await;

        let (uploads, dropped) = match staged {
            Ok(staged) => staged,
            Err(err) => {
                abort(&mut uow, &err).await;
                return Err(err);
            }
        };
        self.publish(uow, &uploads).await?;
        media::discard(&self.storage, &dropped, "media replaced").await;

        info!(post_id = %post_id, user_id = %user_id, "Post updated");
        self.post_repo.get(TxScope::Auto, post_id).await
    }

    /// Soft-delete a post the caller owns. Its blobs are kept.
    pub async fn delete(&self, user_id: &str, post_id: &str) -> AppResult<()> {
        let mut uow = self.post_repo.begin().await?;
        let result = async {
            let current = self
                .post_repo
                .find_for_update(uow.scope(), post_id)
                .await?
                .ok_or_else(|| AppError::PostNotFound(post_id.to_string()))?;
            if current.user_id != user_id {
                return Err(AppError::Forbidden("Not the post owner".to_string()));
            }
            self.post_repo.soft_delete(uow.scope(), post_id).await
        }
        .await;

        if let Err(err) = result {
            abort(&mut uow, &err).await;
            return Err(err);
        }
        uow.commit().await?;

        info!(post_id = %post_id, "Post deleted");
        Ok(())
    }

    /// Upload staged blobs, then commit.
    ///
    /// A failed upload rolls back after the uploads that succeeded are
    /// deleted. A failed commit keeps the blobs, see [`Self::after_commit`].
    async fn publish(&self, mut uow: UnitOfWork, uploads: &[media::PendingUpload]) -> AppResult<()> {
        let written = match media::upload_all(&self.storage, uploads).await {
            Ok(written) => written,
            Err(err) => {
                abort(&mut uow, &err).await;
                return Err(err);
            }
        };

        Self::after_commit(uow.commit().await, &written)
    }

    /// A commit error does not say whether the server applied the commit,
    /// so rows may reference the blobs. They are left in place and listed
    /// for reconciliation against `post_media`.
    fn after_commit(committed: AppResult<()>, written: &[String]) -> AppResult<()> {
        if let Err(err) = &committed {
            error!(error = %err, blobs = written.len(), "Commit outcome unknown after upload");
            media::flag_for_reconciliation(written);
        }
        committed
    }

    async fn checked_tag_ids(&self, ids: Vec<i32>) -> AppResult<Vec<i32>> {
        let ids = normalize_ids(ids);
        let found = self.taxonomy_repo.existing_tag_ids(TxScope::Auto, &ids).await?;
        require_all("tag", &ids, &found)?;
        Ok(ids)
    }

    async fn checked_category_ids(&self, ids: Vec<i32>) -> AppResult<Vec<i32>> {
        let ids = normalize_ids(ids);
        let found = self
            .taxonomy_repo
            .existing_category_ids(TxScope::Auto, &ids)
            .await?;
        require_all("category", &ids, &found)?;
        Ok(ids)
    }
}

/// Roll back after `cause`. A failed rollback is logged; the transaction is
/// discarded with the connection either way.
async fn abort(uow: &mut UnitOfWork, cause: &AppError) {
    debug!(error = %cause, "Rolling back post write");
    if let Err(err) = uow.rollback().await {
        warn!(error = %err, cause = %cause, "Rollback failed");
    }
}

fn normalize_ids(mut ids: Vec<i32>) -> Vec<i32> {
    ids.sort_unstable();
    ids.dedup();
    ids
}

fn require_all(kind: &str, wanted: &[i32], found: &[i32]) -> AppResult<()> {
    let missing: Vec<String> = wanted
        .iter()
        .filter(|id| !found.contains(id))
        .map(ToString::to_string)
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(AppError::Validation(format!(
            "Unknown {kind} ids: {}",
            missing.join(",")
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use boardhop_db::test_utils::render_log;
    use crate::services::testing::{
        FailingStorage, detail_row, empty_rows, exec, id_row, post_model, upload,
    };
    use boardhop_common::StorageBackend;
    use boardhop_db::entities::post_media;
    use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase, Transaction};
    use std::sync::Arc;

    fn service(db: &Arc<DatabaseConnection>, storage: StorageService) -> PostService {
        PostService::new(
            PostRepository::new(db.clone()),
            TaxonomyRepository::new(db.clone()),
            storage,
            ListingConfig::default(),
            MediaConfig::default(),
        )
    }

    fn transactions(db: Arc<DatabaseConnection>) -> Vec<Transaction> {
        let Ok(db) = Arc::try_unwrap(db) else {
            panic!("connection still shared");
        };
        db.into_transaction_log()
    }

    fn create_input(tag_ids: Vec<i32>, category_ids: Vec<i32>) -> CreatePostInput {
        CreatePostInput {
            title: "Twin fin".to_string(),
            price: 40.0,
            rate: "day".to_string(),
            description: None,
            pickup_latitude: None,
            pickup_longitude: None,
            tag_ids,
            category_ids,
        }
    }

    #[tokio::test]
    async fn test_create_commits_every_step_in_one_transaction() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[id_row(1), id_row(2)]])
                .append_query_results([[id_row(2)]])
                .append_exec_results([exec(1), exec(2), exec(1), exec(1)])
                .into_connection(),
        );
        let backend = Arc::new(FailingStorage::new(&[]));
        let svc = service(&db, backend.clone());

        let post_id = svc
            .create(
                "user1",
                create_input(vec![2, 1, 2], vec![2]),
                vec![upload("a.jpg", "image/jpeg")],
            )
            .await
            .unwrap();
        drop(svc);

        assert_eq!(backend.keys().await, [format!("posts/{post_id}/0/0.jpg")]);
        let log = transactions(db);
        let write = render_log(&log.last().unwrap());
        let order: Vec<_> = [
            "INSERT INTO \"post\"",
            "INSERT INTO \"post_tag\"",
            "INSERT INTO \"post_category\"",
            "INSERT INTO \"post_media\"",
            "COMMIT",
        ]
        .iter()
        .map(|needle| write.find(needle).unwrap())
        .collect();
        assert!(order.windows(2).all(|pair| pair[0] < pair[1]));
    }

    #[tokio::test]
    async fn test_create_upload_failure_rolls_back_and_compensates() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[id_row(1), id_row(2)]])
                .append_query_results([[id_row(3)]])
                .append_exec_results([exec(1), exec(2), exec(1), exec(2)])
                .into_connection(),
        );
        let backend = Arc::new(FailingStorage::new(&["/1."]));
        let svc = service(&db, backend.clone());

        let result = svc
            .create(
                "user1",
                create_input(vec![1, 2], vec![3]),
                vec![upload("a.jpg", "image/jpeg"), upload("b.jpg", "image/jpeg")],
            )
            .await;
        drop(svc);

        assert!(matches!(result, Err(AppError::Storage(_))));
        assert!(backend.keys().await.is_empty());
        let write = render_log(&transactions(db).last().unwrap());
        assert!(write.contains("INSERT INTO \"post_media\""));
        assert!(write.contains("ROLLBACK"));
        assert!(!write.contains("COMMIT"));
    }

    #[tokio::test]
    async fn test_create_join_failure_rolls_back_before_upload() {
        // Tag insert has no exec result buffered and fails.
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[id_row(1)]])
                .append_exec_results([exec(1)])
                .into_connection(),
        );
        let backend = Arc::new(FailingStorage::new(&[]));
        let svc = service(&db, backend.clone());

        let result = svc
            .create(
                "user1",
                create_input(vec![1], Vec::new()),
                vec![upload("a.jpg", "image/jpeg")],
            )
            .await;
        drop(svc);

        assert!(matches!(result, Err(AppError::Database(msg)) if msg.starts_with("insert post tags")));
        assert!(backend.keys().await.is_empty());
        let write = render_log(&transactions(db).last().unwrap());
        assert!(write.contains("ROLLBACK"));
    }

    #[tokio::test]
    async fn test_create_rejects_unknown_tag_before_writing() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[id_row(1)]])
                .into_connection(),
        );
        let svc = service(&db, Arc::new(FailingStorage::new(&[])));

        let result = svc
            .create("user1", create_input(vec![1, 42], Vec::new()), Vec::new())
            .await;
        drop(svc);

        assert!(matches!(result, Err(AppError::Validation(msg)) if msg.contains("42")));
        let log = render_log(&transactions(db));
        assert!(!log.contains("INSERT"));
    }

    #[tokio::test]
    async fn test_create_rejects_invalid_payload() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let svc = service(&db, Arc::new(FailingStorage::new(&[])));

        let mut input = create_input(Vec::new(), Vec::new());
        input.title = String::new();
        let result = svc.create("user1", input, Vec::new()).await;

        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_update_price_only_leaves_collections_untouched() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[post_model("p1", "owner")]])
                .append_exec_results([exec(1)])
                .append_query_results([[detail_row("p1", "owner")]])
                .append_query_results([empty_rows()])
                .append_query_results([empty_rows()])
                .append_query_results([Vec::<post_media::Model>::new()])
                .into_connection(),
        );
        let svc = service(&db, Arc::new(FailingStorage::new(&[])));

        let input = UpdatePostInput {
            price: Some(55.0),
            ..Default::default()
        };
        let post = svc.update("owner", "p1", input, Vec::new()).await.unwrap();
        assert_eq!(post.post.id, "p1");
        drop(svc);

        let log = render_log(&transactions(db));
        assert!(log.contains("FOR UPDATE"));
        assert!(log.contains("UPDATE \"post\" SET \"price\""));
        assert!(!log.contains("DELETE FROM \"post_tag\""));
        assert!(!log.contains("DELETE FROM \"post_category\""));
        assert!(!log.contains("DELETE FROM \"post_media\""));
    }

    #[tokio::test]
    async fn test_update_replaces_tags_with_empty_list() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[post_model("p1", "owner")]])
                .append_exec_results([exec(1), exec(3)])
                .append_query_results([[detail_row("p1", "owner")]])
                .append_query_results([empty_rows()])
                .append_query_results([empty_rows()])
                .append_query_results([Vec::<post_media::Model>::new()])
                .into_connection(),
        );
        let svc = service(&db, Arc::new(FailingStorage::new(&[])));

        let input = UpdatePostInput {
            tag_ids: Some(Vec::new()),
            ..Default::default()
        };
        let post = svc.update("owner", "p1", input, Vec::new()).await.unwrap();
        assert!(post.tags.is_empty());
        drop(svc);

        let log = render_log(&transactions(db));
        assert!(log.contains("DELETE FROM \"post_tag\""));
        assert!(!log.contains("INSERT INTO \"post_tag\""));
    }

    #[tokio::test]
    async fn test_update_by_other_user_is_forbidden() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[post_model("p1", "owner")]])
                .into_connection(),
        );
        let svc = service(&db, Arc::new(FailingStorage::new(&[])));

        let input = UpdatePostInput {
            price: Some(1.0),
            ..Default::default()
        };
        let result = svc.update("intruder", "p1", input, Vec::new()).await;
        drop(svc);

        assert!(matches!(result, Err(AppError::Forbidden(_))));
        let write = render_log(&transactions(db).last().unwrap());
        assert!(write.contains("ROLLBACK"));
        assert!(!write.contains("UPDATE \"post\""));
    }

    #[tokio::test]
    async fn test_update_files_without_media_list_is_invalid() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let svc = service(&db, Arc::new(FailingStorage::new(&[])));

        let result = svc
            .update(
                "owner",
                "p1",
                UpdatePostInput::default(),
                vec![upload("a.jpg", "image/jpeg")],
            )
            .await;

        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_update_media_bumps_revision_and_drops_old_blob() {
        let backend = Arc::new(FailingStorage::new(&[]));
        let storage: StorageService = backend.clone();
        storage
            .upload("posts/p1/0/0.jpg", b"old", "image/jpeg")
            .await
            .unwrap();

        let old = post_media::Model {
            id: 7,
            post_id: "p1".to_string(),
            position: 0,
            storage_key: "posts/p1/0/0.jpg".to_string(),
            media_url: "/files/posts/p1/0/0.jpg".to_string(),
            media_type: post_media::MediaType::Image,
            created_at: Utc::now().fixed_offset(),
            deleted_at: None,
        };
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[post_model("p1", "owner")]])
                .append_query_results([[old]])
                .append_exec_results([exec(1), exec(1), exec(1)])
                .append_query_results([[detail_row("p1", "owner")]])
                .append_query_results([empty_rows()])
                .append_query_results([empty_rows()])
                .append_query_results([Vec::<post_media::Model>::new()])
                .into_connection(),
        );
        let svc = service(&db, storage);

        let input = UpdatePostInput {
            media: Some(vec![MediaSlot::Upload { file: 0 }]),
            ..Default::default()
        };
        svc.update("owner", "p1", input, vec![upload("new.png", "image/png")])
            .await
            .unwrap();
        drop(svc);

        assert_eq!(backend.keys().await, ["posts/p1/1/0.png"]);
        let log = render_log(&transactions(db));
        assert!(log.contains("\"media_revision\""));
    }

    #[tokio::test]
    async fn test_delete_missing_post_is_not_found() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<post::Model>::new()])
                .into_connection(),
        );
        let svc = service(&db, Arc::new(FailingStorage::new(&[])));

        let result = svc.delete("owner", "gone").await;

        assert!(matches!(result, Err(AppError::PostNotFound(_))));
    }

    #[tokio::test]
    async fn test_list_empty_is_not_found() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([empty_rows()])
                .into_connection(),
        );
        let svc = service(&db, Arc::new(FailingStorage::new(&[])));

        let result = svc.list(&ListingQuery::default()).await;

        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[test]
    fn test_update_input_distinguishes_null_from_absent() {
        let input: UpdatePostInput =
            serde_json::from_str(r#"{"description": null, "tagIds": []}"#).unwrap();
        assert_eq!(input.description, Some(None));
        assert_eq!(input.pickup_latitude, None);
        assert_eq!(input.tag_ids, Some(Vec::new()));
        assert_eq!(input.category_ids, None);

        let slots: UpdatePostInput = serde_json::from_str(
            r#"{"media": [{"kind": "existing", "id": 3}, {"kind": "upload", "file": 0}]}"#,
        )
        .unwrap();
        assert_eq!(
            slots.media,
            Some(vec![MediaSlot::Existing { id: 3 }, MediaSlot::Upload { file: 0 }])
        );
    }

    #[test]
    fn test_update_check_bounds_only_present_values() {
        let cleared = UpdatePostInput {
            description: Some(None),
            pickup_latitude: Some(None),
            pickup_longitude: Some(None),
            ..Default::default()
        };
        assert!(cleared.check().is_ok());

        let lat = UpdatePostInput {
            pickup_latitude: Some(Some(90.5)),
            ..Default::default()
        };
        assert!(matches!(lat.check(), Err(AppError::Validation(msg)) if msg.starts_with("pickupLatitude")));

        let lng = UpdatePostInput {
            pickup_longitude: Some(Some(-180.0)),
            ..Default::default()
        };
        assert!(lng.check().is_ok());

        let description = UpdatePostInput {
            description: Some(Some("x".repeat(8193))),
            ..Default::default()
        };
        assert!(matches!(description.check(), Err(AppError::Validation(msg)) if msg.starts_with("description")));
    }

    #[tokio::test]
    async fn test_commit_error_keeps_written_blobs() {
        let backend = Arc::new(FailingStorage::new(&[]));
        let storage: StorageService = backend.clone();
        storage.upload("posts/p1/0/0.jpg", b"img", "image/jpeg").await.unwrap();

        let written = vec!["posts/p1/0/0.jpg".to_string()];
        let failed = Err(AppError::Database("commit: connection reset".to_string()));
        let result = PostService::after_commit(failed, &written);

        assert!(matches!(result, Err(AppError::Database(msg)) if msg.starts_with("commit")));
        assert_eq!(backend.keys().await, written);
        assert!(PostService::after_commit(Ok(()), &written).is_ok());
    }
}
