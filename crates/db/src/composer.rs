//! Statement composition for listing and detail reads.
//!
//! Every function here is pure: it turns a typed filter into a
//! [`SelectStatement`]. Repositories build it for the connection's backend
//! and run it. Filters are parsed leniently: a malformed value reads as
//! "filter absent" rather than failing the request.

use boardhop_common::ListingConfig;
use sea_orm::sea_query::{Alias, Asterisk, Expr, JoinType, Order, Query, SelectStatement};
use serde::Deserialize;

use crate::entities::{category, message, order, post, post_category, post_media, post_tag, tag, user};

fn alias(name: &'static str) -> Alias {
    Alias::new(name)
}

/// Raw query string of the post listing endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListingQuery {
    /// Comma-separated category values.
    pub cats: Option<String>,
    /// Comma-separated tag values.
    pub tags: Option<String>,
    /// Owning user id.
    pub uid: Option<String>,
    /// Board type discriminator, e.g. "snowboard".
    #[serde(rename = "type")]
    pub board_type: Option<String>,
    /// Page index.
    pub p: Option<String>,
    /// Page size.
    pub l: Option<String>,
}

/// Largest offset the driver can bind.
const MAX_OFFSET: u64 = i64::MAX.unsigned_abs();

/// Offset pagination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    /// Zero-based page index.
    pub page: u64,
    /// Rows per page.
    pub size: u64,
}

impl Pagination {
    /// Parse caller-supplied page and size.
    ///
    /// A size that is not an integer in `1..=max_page_size` becomes the
    /// default size. A page that is not a non-negative integer, or whose
    /// offset would not fit a Postgres `bigint`, becomes 0.
    #[must_use]
    pub fn parse(page: Option<&str>, size: Option<&str>, config: &ListingConfig) -> Self {
        let size = size
            .and_then(|l| l.trim().parse::<u64>().ok())
            .filter(|l| (1..=config.max_page_size).contains(l))
            .unwrap_or(config.default_page_size);
        let page = page
            .and_then(|p| p.trim().parse::<u64>().ok())
            .filter(|p| p.checked_mul(size).is_some_and(|offset| offset <= MAX_OFFSET))
            .unwrap_or(0);
        Self { page, size }
    }

    /// Rows to skip, never above `i64::MAX`.
    #[must_use]
    pub const fn offset(&self) -> u64 {
        let offset = self.page.saturating_mul(self.size);
        if offset > MAX_OFFSET { MAX_OFFSET } else { offset }
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self::parse(None, None, &ListingConfig::default())
    }
}

/// Materialized category path, e.g. `root.1.3`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryPath(String);

impl CategoryPath {
    /// The path text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Top-level board type branches of the taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoardType {
    Surfboard,
    Snowboard,
}

impl BoardType {
    /// Parse a case-insensitive discriminator. Unknown values yield `None`.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "surfboard" => Some(Self::Surfboard),
            "snowboard" => Some(Self::Snowboard),
            _ => None,
        }
    }

    /// Root of this branch in the seeded taxonomy.
    #[must_use]
    pub fn branch(self) -> CategoryPath {
        match self {
            Self::Surfboard => CategoryPath("root.1".to_string()),
            Self::Snowboard => CategoryPath("root.2".to_string()),
        }
    }
}

/// Typed post listing filter.
///
/// `None` means the dimension is not filtered. A present list is never
/// empty: blank input parses to `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListingFilter {
    /// Category values; a post matches if it has any of them.
    pub categories: Option<Vec<String>>,
    /// Tag values; a post matches if it has any of them.
    pub tags: Option<Vec<String>>,
    /// Owning user id.
    pub user_id: Option<String>,
    /// Restrict to categories at or below this path.
    pub branch: Option<CategoryPath>,
    pub pagination: Pagination,
}

impl ListingFilter {
    /// Build a filter from the raw query string.
    #[must_use]
    pub fn from_query(query: &ListingQuery, config: &ListingConfig) -> Self {
        Self {
            categories: value_list(query.cats.as_deref()),
            tags: value_list(query.tags.as_deref()),
            user_id: query
                .uid
                .as_deref()
                .map(str::trim)
                .filter(|uid| !uid.is_empty())
                .map(ToString::to_string),
            branch: query
                .board_type
                .as_deref()
                .and_then(BoardType::parse)
                .map(BoardType::branch),
            pagination: Pagination::parse(query.p.as_deref(), query.l.as_deref(), config),
        }
    }
}

fn value_list(raw: Option<&str>) -> Option<Vec<String>> {
    let mut values: Vec<String> = raw?
        .split(',')
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(ToString::to_string)
        .collect();
    values.dedup();
    (!values.is_empty()).then_some(values)
}

/// Orders of one renting user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderFilter {
    pub user_id: String,
    pub pagination: Pagination,
}

/// Key of a message thread. A thread belongs to a post or to an order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageOwner {
    Post(String),
    Order(String),
}

/// One row per post, with category and tag values folded into
/// comma-separated strings.
#[must_use]
pub fn post_list(filter: &ListingFilter) -> SelectStatement {
    let (p, u, pc, c, pt, t) = (
        alias("p"),
        alias("u"),
        alias("pc"),
        alias("c"),
        alias("pt"),
        alias("t"),
    );

    let mut query = Query::select();
    query
        .columns([
            (p.clone(), post::Column::Id),
            (p.clone(), post::Column::UserId),
            (p.clone(), post::Column::Title),
            (p.clone(), post::Column::Price),
            (p.clone(), post::Column::Rate),
            (p.clone(), post::Column::PickupLatitude),
            (p.clone(), post::Column::PickupLongitude),
            (p.clone(), post::Column::CreatedAt),
        ])
        .columns([
            (u.clone(), user::Column::Email),
            (u.clone(), user::Column::AvatarUrl),
        ])
        .expr_as(
            Expr::cust(r#"string_agg(DISTINCT "c"."value", ',')"#),
            alias("categories"),
        )
        .expr_as(
            Expr::cust(r#"string_agg(DISTINCT "t"."value", ',')"#),
            alias("tags"),
        )
        .from_as(post::Entity, p.clone())
        .join_as(
            JoinType::InnerJoin,
            user::Entity,
            u.clone(),
            Expr::col((p.clone(), post::Column::UserId)).equals((u.clone(), user::Column::Id)),
        )
        .join_as(
            JoinType::InnerJoin,
            post_category::Entity,
            pc.clone(),
            Expr::col((p.clone(), post::Column::Id))
                .equals((pc.clone(), post_category::Column::PostId)),
        )
        .join_as(
            JoinType::InnerJoin,
            category::Entity,
            c.clone(),
            Expr::col((pc, post_category::Column::CategoryId))
                .equals((c.clone(), category::Column::Id)),
        )
        .join_as(
            JoinType::LeftJoin,
            post_tag::Entity,
            pt.clone(),
            Expr::col((p.clone(), post::Column::Id)).equals((pt.clone(), post_tag::Column::PostId)),
        )
        .join_as(
            JoinType::LeftJoin,
            tag::Entity,
            t.clone(),
            Expr::col((pt, post_tag::Column::TagId)).equals((t.clone(), tag::Column::Id)),
        )
        .and_where(Expr::col((p.clone(), post::Column::DeletedAt)).is_null());

    if let Some(values) = &filter.categories {
        query.and_where(Expr::col((c.clone(), category::Column::Value)).is_in(values.clone()));
    }
    if let Some(branch) = &filter.branch {
        query.and_where(Expr::cust_with_values(
            r#""c"."path" <@ CAST($1 AS ltree)"#,
            [branch.as_str()],
        ));
    }
    if let Some(values) = &filter.tags {
        query.and_where(Expr::col((t, tag::Column::Value)).is_in(values.clone()));
    }
    if let Some(user_id) = &filter.user_id {
        query.and_where(Expr::col((p.clone(), post::Column::UserId)).eq(user_id.as_str()));
    }

    query
        .group_by_col((p.clone(), post::Column::Id))
        .group_by_col((u, user::Column::Id))
        .order_by((p, post::Column::Id), Order::Asc)
        .limit(filter.pagination.size)
        .offset(filter.pagination.offset());

    query
}

/// Scalar fields of one visible post plus its owner's profile.
#[must_use]
pub fn post_detail(post_id: &str) -> SelectStatement {
    let (p, u) = (alias("p"), alias("u"));

    let mut query = Query::select();
    query
        .columns([
            (p.clone(), post::Column::Id),
            (p.clone(), post::Column::UserId),
            (p.clone(), post::Column::Title),
            (p.clone(), post::Column::Description),
            (p.clone(), post::Column::Price),
            (p.clone(), post::Column::Rate),
            (p.clone(), post::Column::PickupLatitude),
            (p.clone(), post::Column::PickupLongitude),
            (p.clone(), post::Column::MediaRevision),
            (p.clone(), post::Column::CreatedAt),
            (p.clone(), post::Column::UpdatedAt),
        ])
        .columns([
            (u.clone(), user::Column::Email),
            (u.clone(), user::Column::AvatarUrl),
            (u.clone(), user::Column::FirstName),
            (u.clone(), user::Column::LastName),
        ])
        .from_as(post::Entity, p.clone())
        .join_as(
            JoinType::InnerJoin,
            user::Entity,
            u.clone(),
            Expr::col((p.clone(), post::Column::UserId)).equals((u, user::Column::Id)),
        )
        .and_where(Expr::col((p.clone(), post::Column::Id)).eq(post_id))
        .and_where(Expr::col((p, post::Column::DeletedAt)).is_null());
    query
}

/// Tags attached to a post.
#[must_use]
pub fn post_tags(post_id: &str) -> SelectStatement {
    let (pt, t) = (alias("pt"), alias("t"));

    let mut query = Query::select();
    query
        .columns([
            (t.clone(), tag::Column::Id),
            (t.clone(), tag::Column::TagType),
            (t.clone(), tag::Column::Value),
            (t.clone(), tag::Column::Label),
        ])
        .from_as(post_tag::Entity, pt.clone())
        .join_as(
            JoinType::InnerJoin,
            tag::Entity,
            t.clone(),
            Expr::col((pt.clone(), post_tag::Column::TagId)).equals((t.clone(), tag::Column::Id)),
        )
        .and_where(Expr::col((pt, post_tag::Column::PostId)).eq(post_id))
        .order_by((t, tag::Column::Id), Order::Asc);
    query
}

/// Categories attached to a post, paths cast to text.
#[must_use]
pub fn post_categories(post_id: &str) -> SelectStatement {
    let (pc, c) = (alias("pc"), alias("c"));

    let mut query = Query::select();
    query
        .columns([
            (c.clone(), category::Column::Id),
            (c.clone(), category::Column::ParentId),
            (c.clone(), category::Column::Value),
            (c.clone(), category::Column::Label),
        ])
        .expr_as(Expr::cust(r#"CAST("c"."path" AS text)"#), alias("path"))
        .from_as(post_category::Entity, pc.clone())
        .join_as(
            JoinType::InnerJoin,
            category::Entity,
            c.clone(),
            Expr::col((pc.clone(), post_category::Column::CategoryId))
                .equals((c.clone(), category::Column::Id)),
        )
        .and_where(Expr::col((pc, post_category::Column::PostId)).eq(post_id))
        .order_by((c, category::Column::Id), Order::Asc);
    query
}

/// Live media of a post in display order.
#[must_use]
pub fn post_medias(post_id: &str) -> SelectStatement {
    let mut query = Query::select();
    query
        .column(Asterisk)
        .from(post_media::Entity)
        .and_where(Expr::col(post_media::Column::PostId).eq(post_id))
        .and_where(Expr::col(post_media::Column::DeletedAt).is_null())
        .order_by(post_media::Column::Position, Order::Asc);
    query
}

/// Live media of several posts, grouped by post in display order.
#[must_use]
pub fn medias_of_posts(post_ids: &[String]) -> SelectStatement {
    let mut query = Query::select();
    query
        .column(Asterisk)
        .from(post_media::Entity)
        .and_where(Expr::col(post_media::Column::PostId).is_in(post_ids.iter().map(String::as_str)))
        .and_where(Expr::col(post_media::Column::DeletedAt).is_null())
        .order_by(post_media::Column::PostId, Order::Asc)
        .order_by(post_media::Column::Position, Order::Asc);
    query
}

/// The whole category tree, paths cast to text.
#[must_use]
pub fn categories() -> SelectStatement {
    let mut query = Query::select();
    query
        .columns([
            category::Column::Id,
            category::Column::ParentId,
            category::Column::Value,
            category::Column::Label,
        ])
        .expr_as(Expr::cust(r#"CAST("path" AS text)"#), alias("path"))
        .from(category::Entity)
        .order_by(category::Column::Id, Order::Asc);
    query
}

/// Messages of one thread with each author's avatar, oldest first.
#[must_use]
pub fn messages(owner: &MessageOwner) -> SelectStatement {
    let (m, u) = (alias("m"), alias("u"));

    let mut query = Query::select();
    query
        .columns([
            (m.clone(), message::Column::Id),
            (m.clone(), message::Column::UserId),
            (m.clone(), message::Column::PostId),
            (m.clone(), message::Column::OrderId),
            (m.clone(), message::Column::Message),
            (m.clone(), message::Column::CreatedAt),
        ])
        .column((u.clone(), user::Column::AvatarUrl))
        .from_as(message::Entity, m.clone())
        .join_as(
            JoinType::InnerJoin,
            user::Entity,
            u.clone(),
            Expr::col((m.clone(), message::Column::UserId)).equals((u, user::Column::Id)),
        );

    match owner {
        MessageOwner::Post(post_id) => {
            query.and_where(Expr::col((m.clone(), message::Column::PostId)).eq(post_id.as_str()))
        }
        MessageOwner::Order(order_id) => {
            query.and_where(Expr::col((m.clone(), message::Column::OrderId)).eq(order_id.as_str()))
        }
    };

    query.order_by((m, message::Column::Id), Order::Asc);
    query
}

/// A renter's orders with the title of each ordered post.
#[must_use]
pub fn order_list(filter: &OrderFilter) -> SelectStatement {
    let (o, p) = (alias("o"), alias("p"));

    let mut query = Query::select();
    query
        .columns([
            (o.clone(), order::Column::Id),
            (o.clone(), order::Column::PostId),
            (o.clone(), order::Column::UserId),
            (o.clone(), order::Column::PaymentId),
            (o.clone(), order::Column::Status),
            (o.clone(), order::Column::Quantity),
            (o.clone(), order::Column::Total),
            (o.clone(), order::Column::StartDate),
            (o.clone(), order::Column::EndDate),
            (o.clone(), order::Column::CreatedAt),
        ])
        .expr_as(Expr::col((p.clone(), post::Column::Title)), alias("post_title"))
        .from_as(order::Entity, o.clone())
        .join_as(
            JoinType::InnerJoin,
            post::Entity,
            p.clone(),
            Expr::col((o.clone(), order::Column::PostId)).equals((p, post::Column::Id)),
        )
        .and_where(Expr::col((o.clone(), order::Column::UserId)).eq(filter.user_id.as_str()))
        .and_where(Expr::col((o.clone(), order::Column::DeletedAt)).is_null())
        .order_by((o, order::Column::Id), Order::Asc)
        .limit(filter.pagination.size)
        .offset(filter.pagination.offset());
    query
}
