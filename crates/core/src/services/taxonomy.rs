//! Tag and category service.

use boardhop_common::{AppError, AppResult};
use boardhop_db::{
    TxScope,
    entities::{category, tag},
    repositories::TaxonomyRepository,
};

/// Tag type offered for every board.
pub const SKILL_LEVEL: &str = "Skill Level";
/// Tag type offered for surfboards.
pub const SURFBOARD_BRAND: &str = "Surfboard Brand";
/// Tag type offered for snowboards.
pub const SNOWBOARD_BRAND: &str = "Snowboard Brand";

/// Tag types to offer for a free-form board type discriminator.
#[must_use]
pub fn tag_types(discriminator: Option<&str>) -> Vec<&'static str> {
    let discriminator = discriminator.unwrap_or_default().to_ascii_lowercase();
    let mut types = vec![SKILL_LEVEL];
    if discriminator.contains("surfboard") {
        types.push(SURFBOARD_BRAND);
    }
    if discriminator.contains("snowboard") {
        types.push(SNOWBOARD_BRAND);
    }
    types
}

/// Service for the tag and category taxonomies.
#[derive(Clone)]
pub struct TaxonomyService {
    taxonomy_repo: TaxonomyRepository,
}

impl TaxonomyService {
    /// Create a new taxonomy service.
    #[must_use]
    pub const fn new(taxonomy_repo: TaxonomyRepository) -> Self {
        Self { taxonomy_repo }
    }

    /// Tags relevant to a board type.
    pub async fn list_tags(&self, discriminator: Option<&str>) -> AppResult<Vec<tag::Model>> {
        let tags = self
            .taxonomy_repo
            .list_tags(TxScope::Auto, &tag_types(discriminator))
            .await?;
        if tags.is_empty() {
            return Err(AppError::NotFound("No tags found".to_string()));
        }
        Ok(tags)
    }

    /// Every category with its tree path.
    pub async fn list_categories(&self) -> AppResult<Vec<category::Model>> {
        let categories = self.taxonomy_repo.list_categories(TxScope::Auto).await?;
        if categories.is_empty() {
            return Err(AppError::NotFound("No categories found".to_string()));
        }
        Ok(categories)
    }
}
