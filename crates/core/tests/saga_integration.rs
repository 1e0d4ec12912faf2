//! Post and order write sagas against a real database.
//!
//! These tests require a running `PostgreSQL` instance.
//! Run with: `cargo test -p boardhop-core --test saga_integration -- --ignored`

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use async_trait::async_trait;
use boardhop_common::{
    AppError, AppResult, CallerIdentity, ListingConfig, MediaConfig, MemoryStorage,
    StorageBackend, StorageService, UploadedFile,
};
use boardhop_core::{
    CreateOrderInput, CreatePostInput, MediaUpload, OrderService, PostService, SignupInput,
    UpdatePostInput, UserService,
};
use boardhop_db::{
    composer::ListingQuery,
    repositories::{
        MessageRepository, OrderRepository, PostRepository, TaxonomyRepository, UserRepository,
    },
    test_utils::TestDatabase,
};
use bytes::Bytes;
use chrono::Utc;

/// Fails every upload whose key ends with the given suffix.
struct RejectingStorage {
    inner: MemoryStorage,
    suffix: &'static str,
}

#[async_trait]
impl StorageBackend for RejectingStorage {
    async fn upload(&self, key: &str, data: &[u8], content_type: &str) -> AppResult<UploadedFile> {
        if key.ends_with(self.suffix) {
            return Err(AppError::Storage(format!("rejected {key}")));
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

struct Harness {
    db: TestDatabase,
    posts: PostService,
    orders: OrderService,
    post_repo: PostRepository,
    storage: Arc<RejectingStorage>,
    user_id: String,
}

async fn harness() -> Harness {
    let db = TestDatabase::migrated().await.unwrap();
    let conn = Arc::new(sea_orm::DatabaseConnection::from(db.conn.get_postgres_connection_pool().clone()));
    let storage = Arc::new(RejectingStorage {
        inner: MemoryStorage::new("/files"),
        suffix: "/1.jpg",
    });
    let service_storage: StorageService = storage.clone();

    let post_repo = PostRepository::new(conn.clone());
    let posts = PostService::new(
        post_repo.clone(),
        TaxonomyRepository::new(conn.clone()),
        service_storage,
        ListingConfig::default(),
        MediaConfig::default(),
    );
    let orders = OrderService::new(
        OrderRepository::new(conn.clone()),
        post_repo.clone(),
        MessageRepository::new(conn.clone()),
        ListingConfig::default(),
    );
    let users = UserService::new(UserRepository::new(conn));
    let user = users
        .signup(
            &CallerIdentity::new("test|owner"),
            SignupInput {
                email: "owner@example.com".to_string(),
                first_name: "Kai".to_string(),
                last_name: "Lenny".to_string(),
                phone: None,
                avatar_url: None,
            },
        )
        .await
        .unwrap();

    Harness {
        db,
        posts,
        orders,
        post_repo,
        storage,
        user_id: user.id,
    }
}

fn post_input() -> CreatePostInput {
    CreatePostInput {
        title: "Twin fin".to_string(),
        price: 40.0,
        rate: "day".to_string(),
        description: None,
        pickup_latitude: None,
        pickup_longitude: None,
        tag_ids: vec![1, 3],
        category_ids: vec![2],
    }
}

fn jpeg(name: &str) -> MediaUpload {
    MediaUpload {
        file_name: name.to_string(),
        content_type: "image/jpeg".to_string(),
        data: Bytes::from_static(b"jpeg"),
    }
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_failed_upload_leaves_nothing_behind() {
    let h = harness().await;

    let result = h
        .posts
        .create(&h.user_id, post_input(), vec![jpeg("a.jpg"), jpeg("b.jpg")])
        .await;
    assert!(matches!(result, Err(AppError::Storage(_))));

    assert!(matches!(
        h.posts.list(&ListingQuery::default()).await,
        Err(AppError::NotFound(_))
    ));
    assert!(h.storage.inner.is_empty().await);

    h.db.drop_database().await.unwrap();
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_price_update_keeps_collections() {
    let h = harness().await;
    let post_id = h
        .posts
        .create(&h.user_id, post_input(), vec![jpeg("a.jpg")])
        .await
        .unwrap();

    let updated = h
        .posts
        .update(
            &h.user_id,
            &post_id,
            UpdatePostInput {
                price: Some(55.0),
                ..Default::default()
            },
            Vec::new(),
        )
        .await
        .unwrap();

    assert_eq!(updated.post.price, 55.0);
    assert_eq!(updated.tags.iter().map(|t| t.id).collect::<Vec<_>>(), [1, 3]);
    assert_eq!(updated.categories.len(), 1);
    assert_eq!(updated.medias.len(), 1);

    h.db.drop_database().await.unwrap();
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_tag_replace_is_total() {
    let h = harness().await;
    let post_id = h
        .posts
        .create(&h.user_id, post_input(), Vec::new())
        .await
        .unwrap();

    let updated = h
        .posts
        .update(
            &h.user_id,
            &post_id,
            UpdatePostInput {
                tag_ids: Some(vec![2]),
                ..Default::default()
            },
            Vec::new(),
        )
        .await
        .unwrap();

    assert_eq!(updated.tags.iter().map(|t| t.id).collect::<Vec<_>>(), [2]);

    h.db.drop_database().await.unwrap();
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_listing_by_category_and_tags() {
    let h = harness().await;
    h.posts
        .create(&h.user_id, post_input(), Vec::new())
        .await
        .unwrap();

    let query = ListingQuery {
        cats: Some("surfboard".to_string()),
        tags: Some("beginner,advanced".to_string()),
        ..ListingQuery::default()
    };
    let posts = h.posts.list(&query).await.unwrap();

    assert_eq!(posts.len(), 1);
    assert!(posts[0].post.categories.as_deref().unwrap().contains("surfboard"));

    h.db.drop_database().await.unwrap();
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_order_with_message_is_atomic() {
    let h = harness().await;
    let post_id = h
        .posts
        .create(&h.user_id, post_input(), Vec::new())
        .await
        .unwrap();

    let start = Utc::now().fixed_offset();
    let order_id = h
        .orders
        .create(
            &h.user_id,
            CreateOrderInput {
                post_id: post_id.clone(),
                payment_id: None,
                quantity: 1,
                total: 80.0,
                start_date: start,
                end_date: start + chrono::Duration::days(2),
                message: Some("Pick up Saturday".to_string()),
            },
        )
        .await
        .unwrap();

    let order = h.orders.get(&h.user_id, &order_id).await.unwrap();
    assert_eq!(order.post.post.id, post_id);
    assert_eq!(order.messages.len(), 1);

    let missing_post = h
        .orders
        .create(
            &h.user_id,
            CreateOrderInput {
                post_id: "missing".to_string(),
                payment_id: None,
                quantity: 1,
                total: 1.0,
                start_date: start,
                end_date: start,
                message: Some("orphan".to_string()),
            },
        )
        .await;
    assert!(matches!(missing_post, Err(AppError::PostNotFound(_))));
    assert!(h.post_repo.find_detail(boardhop_db::TxScope::Auto, "missing").await.unwrap().is_none());

    h.db.drop_database().await.unwrap();
}
