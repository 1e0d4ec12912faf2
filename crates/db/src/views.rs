//! Read models assembled from composed queries.

use sea_orm::{FromQueryResult, prelude::DateTimeWithTimeZone};
use serde::Serialize;

use crate::entities::{category, order, order::OrderStatus, post_media, tag};

/// One row of the post listing.
#[derive(Debug, Clone, PartialEq, FromQueryResult, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostSummary {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub price: f64,
    pub rate: String,
    pub pickup_latitude: Option<f64>,
    pub pickup_longitude: Option<f64>,
    pub created_at: DateTimeWithTimeZone,
    pub email: String,
    pub avatar_url: Option<String>,
    /// Distinct category values, comma-joined.
    pub categories: Option<String>,
    /// Distinct tag values, comma-joined.
    pub tags: Option<String>,
}

/// A listing row with the post's media, for listing cards.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostListing {
    #[serde(flatten)]
    pub post: PostSummary,
    pub medias: Vec<post_media::Model>,
}

/// Scalar fields of a post and its owner's profile.
#[derive(Debug, Clone, PartialEq, FromQueryResult, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostDetail {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub description: Option<String>,
    pub price: f64,
    pub rate: String,
    pub pickup_latitude: Option<f64>,
    pub pickup_longitude: Option<f64>,
    #[serde(skip_serializing)]
    pub media_revision: i32,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: Option<DateTimeWithTimeZone>,
    pub email: String,
    pub avatar_url: Option<String>,
    pub first_name: String,
    pub last_name: String,
}

/// A post with its hydrated sub-collections.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostAggregate {
    #[serde(flatten)]
    pub post: PostDetail,
    pub categories: Vec<category::Model>,
    pub tags: Vec<tag::Model>,
    pub medias: Vec<post_media::Model>,
}

/// A message with its author's avatar.
#[derive(Debug, Clone, PartialEq, Eq, FromQueryResult, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageView {
    pub id: i32,
    pub user_id: String,
    pub post_id: Option<String>,
    pub order_id: Option<String>,
    pub message: String,
    pub created_at: DateTimeWithTimeZone,
    pub avatar_url: Option<String>,
}

/// One row of a renter's order listing.
#[derive(Debug, Clone, PartialEq, FromQueryResult, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderSummary {
    pub id: String,
    pub post_id: String,
    pub user_id: String,
    pub payment_id: Option<String>,
    pub status: OrderStatus,
    pub quantity: i32,
    pub total: f64,
    pub start_date: DateTimeWithTimeZone,
    pub end_date: DateTimeWithTimeZone,
    pub created_at: DateTimeWithTimeZone,
    pub post_title: String,
}

/// An order with the full post it rents and its message thread.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderAggregate {
    #[serde(flatten)]
    pub order: order::Model,
    pub post: PostAggregate,
    pub messages: Vec<MessageView>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_listing_serializes_flat_with_medias() {
        let listing = PostListing {
            post: PostSummary {
                id: "p1".to_string(),
                user_id: "u1".to_string(),
                title: "Twin fin".to_string(),
                price: 40.0,
                rate: "day".to_string(),
                pickup_latitude: None,
                pickup_longitude: None,
                created_at: Utc::now().fixed_offset(),
                email: "rider@example.com".to_string(),
                avatar_url: None,
                categories: Some("surfboard".to_string()),
                tags: None,
            },
            medias: Vec::new(),
        };

        let json = serde_json::to_value(&listing).unwrap();
        assert_eq!(json["id"], "p1");
        assert_eq!(json["userId"], "u1");
        assert_eq!(json["categories"], "surfboard");
        assert_eq!(json["medias"], serde_json::json!([]));
        assert!(json.get("post").is_none());
    }
}
