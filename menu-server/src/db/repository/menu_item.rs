//! Menu Item Repository
//!
//! One repository type serves both storage layouts:
//!
//! | Layout | Collection | Owner |
//! |--------|------------|-------|
//! | `Nested` | `restaurants/{restaurantId}/menuItems` | parent path |
//! | `Flat` | `menuItems` | `restaurantId` field |
//!
//! Every operation is scoped to the owning restaurant. In the flat layout an
//! item owned by another restaurant is treated as absent.

use super::{BaseRepository, RepoError, RepoResult};
use crate::db::{
    Document, DocumentStore, Fields, Filter, MENU_ITEMS, RESTAURANTS, nested_menu_items,
    save_document,
};
use serde::{Deserialize, Serialize};
use shared::models::{MenuItem, MenuItemCreate, MenuItemUpdate, StoredMenuItem, field};
use shared::util::ServerClock;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Default number of items returned by [`MenuItemRepository::popular`]
pub const DEFAULT_POPULAR_LIMIT: usize = 6;

/// Menu item storage layout, fixed at repository construction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Layout {
    /// Legacy subcollection under each restaurant
    Nested,
    /// Top-level collection with a `restaurantId` foreign key
    #[default]
    Flat,
}

impl Layout {
    /// Collection holding the items of one restaurant
    pub fn collection(self, restaurant_id: &str) -> String {
        match self {
            Layout::Nested => nested_menu_items(restaurant_id),
            Layout::Flat => MENU_ITEMS.to_string(),
        }
    }
}

impl FromStr for Layout {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "nested" => Ok(Layout::Nested),
            "flat" => Ok(Layout::Flat),
            other => Err(format!("unknown menu layout '{other}' (expected nested or flat)")),
        }
    }
}

impl fmt::Display for Layout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Layout::Nested => f.write_str("nested"),
            Layout::Flat => f.write_str("flat"),
        }
    }
}

#[derive(Clone)]
pub struct MenuItemRepository {
    base: BaseRepository,
    layout: Layout,
}

impl MenuItemRepository {
    pub fn new(store: Arc<dyn DocumentStore>, clock: Arc<ServerClock>, layout: Layout) -> Self {
        Self {
            base: BaseRepository::new(store, clock),
            layout,
        }
    }

    pub fn layout(&self) -> Layout {
        self.layout
    }

    /// All items of a restaurant (no particular order)
    pub async fn list(&self, restaurant_id: &str) -> RepoResult<Vec<MenuItem>> {
        let collection = self.layout.collection(restaurant_id);
        let filters = match self.layout {
            Layout::Nested => Vec::new(),
            Layout::Flat => vec![Filter::eq(field::RESTAURANT_ID, restaurant_id)],
        };
        let docs = self.base.store().query(&collection, &filters).await?;
        docs.iter()
            .map(|doc| self.decode(doc, restaurant_id))
            .collect()
    }

    pub async fn get(&self, restaurant_id: &str, item_id: &str) -> RepoResult<Option<MenuItem>> {
        match self.find_owned(restaurant_id, item_id).await? {
            Some(doc) => Ok(Some(self.decode(&doc, restaurant_id)?)),
            None => Ok(None),
        }
    }

    /// Create an item with a store-assigned id.
    ///
    /// The flat layout stamps `restaurantId` / `restaurantName` and requires
    /// the restaurant to exist.
    pub async fn create(
        &self,
        restaurant_id: &str,
        restaurant_name: Option<&str>,
        data: MenuItemCreate,
    ) -> RepoResult<MenuItem> {
        if restaurant_id.trim().is_empty() {
            return Err(RepoError::Validation("restaurantId cannot be empty".into()));
        }
        let mut fields = data.into_fields()?;

        if self.layout == Layout::Flat {
            let restaurant_name = restaurant_name
                .map(str::trim)
                .filter(|n| !n.is_empty())
                .ok_or_else(|| {
                    RepoError::Validation("restaurantName is required for flat menu items".into())
                })?;
            if self.base.store().get(RESTAURANTS, restaurant_id).await?.is_none() {
                return Err(RepoError::Validation(format!(
                    "restaurant {restaurant_id} does not exist"
                )));
            }
            fields.insert(field::RESTAURANT_ID.into(), restaurant_id.into());
            fields.insert(field::RESTAURANT_NAME.into(), restaurant_name.into());
        }

        let collection = self.layout.collection(restaurant_id);
        let id = save_document(
            self.base.store(),
            self.base.clock(),
            &collection,
            None,
            fields,
            false,
        )
        .await?;
        tracing::info!(restaurant_id = %restaurant_id, item_id = %id, layout = %self.layout, "Menu item created");

        self.require(restaurant_id, &id).await
    }

    /// Merge edits into an existing item; the foreign key is never changed
    pub async fn update(
        &self,
        restaurant_id: &str,
        item_id: &str,
        data: MenuItemUpdate,
    ) -> RepoResult<MenuItem> {
        let existing = self
            .find_owned(restaurant_id, item_id)
            .await?
            .ok_or_else(|| not_found(item_id))?;

        let mut patch = data.into_patch()?;
        if self.layout == Layout::Flat {
            for key in [field::RESTAURANT_ID, field::RESTAURANT_NAME] {
                match existing.data.get(key) {
                    Some(value) => patch.insert(key.into(), value.clone()),
                    None => patch.remove(key),
                };
            }
        }
        patch.insert(field::UPDATED_AT.into(), self.base.clock().now().into());

        let collection = self.layout.collection(restaurant_id);
        self.base.store().update(&collection, item_id, patch).await?;
        tracing::info!(restaurant_id = %restaurant_id, item_id = %item_id, "Menu item updated");

        self.require(restaurant_id, item_id).await
    }

    /// Toggle availability; writes only `isAvailable` and `updatedAt`
    pub async fn set_availability(
        &self,
        restaurant_id: &str,
        item_id: &str,
        is_available: bool,
    ) -> RepoResult<MenuItem> {
        self.find_owned(restaurant_id, item_id)
            .await?
            .ok_or_else(|| not_found(item_id))?;

        let mut patch = Fields::new();
        patch.insert(field::IS_AVAILABLE.into(), is_available.into());
        patch.insert(field::UPDATED_AT.into(), self.base.clock().now().into());

        let collection = self.layout.collection(restaurant_id);
        self.base.store().update(&collection, item_id, patch).await?;
        tracing::info!(restaurant_id = %restaurant_id, item_id = %item_id, is_available, "Menu item availability changed");

        self.require(restaurant_id, item_id).await
    }

    /// Hard delete. Deleting an absent item is left to the backend.
    pub async fn delete(&self, restaurant_id: &str, item_id: &str) -> RepoResult<()> {
        let collection = self.layout.collection(restaurant_id);
        if self.layout == Layout::Flat
            && let Some(doc) = self.base.store().get(&collection, item_id).await?
            && doc.str_field(field::RESTAURANT_ID) != Some(restaurant_id)
        {
            return Err(not_found(item_id));
        }
        self.base.store().delete(&collection, item_id).await?;
        tracing::info!(restaurant_id = %restaurant_id, item_id = %item_id, "Menu item deleted");
        Ok(())
    }

    /// Recategorize every item of a restaurant whose `category` equals `from`.
    ///
    /// Touches only `category` and `updatedAt`. Returns the number of items
    /// rewritten.
    pub async fn rename_category(
        &self,
        restaurant_id: &str,
        from: &str,
        to: &str,
    ) -> RepoResult<usize> {
        let (from, to) = (from.trim(), to.trim());
        if from.is_empty() || to.is_empty() {
            return Err(RepoError::Validation("category names cannot be empty".into()));
        }
        if from == to {
            return Ok(0);
        }

        let collection = self.layout.collection(restaurant_id);
        let mut filters = vec![Filter::eq(field::CATEGORY, from)];
        if self.layout == Layout::Flat {
            filters.push(Filter::eq(field::RESTAURANT_ID, restaurant_id));
        }
        let docs = self.base.store().query(&collection, &filters).await?;

        let mut updated = 0;
        for doc in &docs {
            let mut patch = Fields::new();
            patch.insert(field::CATEGORY.into(), to.into());
            patch.insert(field::UPDATED_AT.into(), self.base.clock().now().into());
            self.base.store().update(&collection, &doc.id, patch).await?;
            updated += 1;
        }

        tracing::info!(restaurant_id = %restaurant_id, from, to, count = updated, "Menu category renamed");
        Ok(updated)
    }

    /// Available items across all restaurants, cheapest first
    pub async fn popular(&self, limit: Option<usize>) -> RepoResult<Vec<MenuItem>> {
        let mut items = match self.layout {
            Layout::Flat => {
                let docs = self.base.store().query(MENU_ITEMS, &[]).await?;
                docs.iter()
                    .map(|doc| self.decode(doc, ""))
                    .collect::<RepoResult<Vec<_>>>()?
            }
            Layout::Nested => {
                let restaurants = self.base.store().query(RESTAURANTS, &[]).await?;
                let mut items = Vec::new();
                for restaurant in &restaurants {
                    items.extend(self.list(&restaurant.id).await?);
                }
                items
            }
        };

        items.retain(|item| item.is_available);
        items.sort_by(|a, b| a.price.total_cmp(&b.price));
        items.truncate(limit.unwrap_or(DEFAULT_POPULAR_LIMIT));
        Ok(items)
    }

    /// Raw document if it exists and belongs to `restaurant_id`
    async fn find_owned(&self, restaurant_id: &str, item_id: &str) -> RepoResult<Option<Document>> {
        let collection = self.layout.collection(restaurant_id);
        let Some(doc) = self.base.store().get(&collection, item_id).await? else {
            return Ok(None);
        };
        if self.layout == Layout::Flat && doc.str_field(field::RESTAURANT_ID) != Some(restaurant_id) {
            tracing::warn!(
                restaurant_id = %restaurant_id,
                item_id = %item_id,
                owner = ?doc.str_field(field::RESTAURANT_ID),
                "Menu item belongs to another restaurant"
            );
            return Ok(None);
        }
        Ok(Some(doc))
    }

    async fn require(&self, restaurant_id: &str, item_id: &str) -> RepoResult<MenuItem> {
        self.get(restaurant_id, item_id)
            .await?
            .ok_or_else(|| not_found(item_id))
    }

    fn decode(&self, doc: &Document, restaurant_id: &str) -> RepoResult<MenuItem> {
        let parent = match self.layout {
            Layout::Nested => Some(restaurant_id),
            Layout::Flat => None,
        };
        Ok(StoredMenuItem::from_fields(&doc.data)?.into_menu_item(&doc.id, parent)?)
    }
}

fn not_found(item_id: &str) -> RepoError {
    RepoError::NotFound(format!("Menu item {} not found", item_id))
}
