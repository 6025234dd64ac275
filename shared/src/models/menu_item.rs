//! Menu Item Model

use super::serde_helpers::{lenient_bool, lenient_f64, lenient_i64, lenient_millis, lenient_string};
use super::{FormNumber, ImageRef, ValidationError, field, normalize_image};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Read default when `price` is missing or non-numeric
pub const DEFAULT_PRICE: f64 = 0.0;
/// Read default when `preparationTime` is missing or non-numeric (minutes)
pub const DEFAULT_PREPARATION_TIME: u32 = 15;
/// Read default when `spicyLevel` is missing or non-numeric
pub const DEFAULT_SPICY_LEVEL: u8 = 0;
pub const MAX_SPICY_LEVEL: u8 = 5;

/// Menu item as returned to callers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuItem {
    pub id: String,
    /// Owning restaurant (from the field in flat layout, from the parent path in nested layout)
    pub restaurant_id: String,
    /// Denormalized copy of the restaurant name; may be stale
    pub restaurant_name: Option<String>,
    pub name: String,
    pub description: String,
    pub price: f64,
    pub category: String,
    pub is_vegetarian: bool,
    pub is_vegan: bool,
    pub is_gluten_free: bool,
    pub is_available: bool,
    /// Minutes
    pub preparation_time: u32,
    /// 0–5
    pub spicy_level: u8,
    /// Normalized image URL
    pub image: Option<String>,
    pub created_at: Option<i64>,
    pub updated_at: Option<i64>,
}

/// Menu item document as it may appear in the store (any historical shape)
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredMenuItem {
    #[serde(default, deserialize_with = "lenient_string")]
    pub restaurant_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub restaurant_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub price: Option<f64>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub category: Option<String>,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub is_vegetarian: Option<bool>,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub is_vegan: Option<bool>,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub is_gluten_free: Option<bool>,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub is_available: Option<bool>,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub preparation_time: Option<i64>,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub spicy_level: Option<i64>,
    #[serde(default)]
    pub image: Value,
    #[serde(default, deserialize_with = "lenient_millis")]
    pub created_at: Option<i64>,
    #[serde(default, deserialize_with = "lenient_millis")]
    pub updated_at: Option<i64>,
}

impl StoredMenuItem {
    /// Decode a raw document body
    pub fn from_fields(data: &Map<String, Value>) -> Result<Self, ValidationError> {
        Self::deserialize(Value::Object(data.clone()))
            .map_err(|e| ValidationError::new(format!("malformed menu item: {e}")))
    }

    /// Apply coercion defaults and image normalization.
    ///
    /// `parent_restaurant_id` is the restaurant implied by the document path
    /// (nested layout); the stored `restaurantId` field takes precedence when
    /// present. An item with neither is rejected.
    pub fn into_menu_item(
        self,
        id: &str,
        parent_restaurant_id: Option<&str>,
    ) -> Result<MenuItem, ValidationError> {
        let restaurant_id = self
            .restaurant_id
            .filter(|r| !r.is_empty())
            .or_else(|| parent_restaurant_id.map(str::to_string))
            .filter(|r| !r.is_empty())
            .ok_or_else(|| ValidationError::new(format!("menu item {id} has no restaurantId")))?;
        let name = self
            .name
            .ok_or_else(|| ValidationError::new(format!("menu item {id} has no name")))?;

        Ok(MenuItem {
            id: id.to_string(),
            restaurant_id,
            restaurant_name: self.restaurant_name,
            name,
            description: self.description.unwrap_or_default(),
            price: self.price.filter(|p| *p >= 0.0).unwrap_or(DEFAULT_PRICE),
            category: self.category.unwrap_or_default(),
            is_vegetarian: self.is_vegetarian.unwrap_or(false),
            is_vegan: self.is_vegan.unwrap_or(false),
            is_gluten_free: self.is_gluten_free.unwrap_or(false),
            // Items written before the availability toggle existed were always listed
            is_available: self.is_available.unwrap_or(true),
            preparation_time: self
                .preparation_time
                .and_then(|m| u32::try_from(m).ok())
                .unwrap_or(DEFAULT_PREPARATION_TIME),
            spicy_level: self
                .spicy_level
                .map(|s| s.clamp(0, MAX_SPICY_LEVEL as i64) as u8)
                .unwrap_or(DEFAULT_SPICY_LEVEL),
            image: normalize_image(&self.image, &Value::Null),
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// Create menu item payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuItemCreate {
    pub name: String,
    pub description: Option<String>,
    /// Numeric strings are accepted (form input)
    pub price: Option<FormNumber>,
    pub category: Option<String>,
    pub is_vegetarian: Option<bool>,
    pub is_vegan: Option<bool>,
    pub is_gluten_free: Option<bool>,
    pub is_available: Option<bool>,
    pub preparation_time: Option<FormNumber>,
    pub spicy_level: Option<FormNumber>,
    pub image: Option<ImageRef>,
}

impl MenuItemCreate {
    /// Validate and build the stored document body (without foreign keys or timestamps)
    pub fn into_fields(self) -> Result<Map<String, Value>, ValidationError> {
        let name = validate_name(&self.name)?;
        let price = self
            .price
            .ok_or_else(|| ValidationError::new("price must be a number"))?
            .to_f64("price")?;
        validate_price(price)?;
        let preparation_time = match self.preparation_time {
            Some(v) => validate_preparation_time(v.to_i64("preparationTime")?)?,
            None => DEFAULT_PREPARATION_TIME,
        };
        let spicy_level = match self.spicy_level {
            Some(v) => validate_spicy_level(v.to_i64("spicyLevel")?)?,
            None => DEFAULT_SPICY_LEVEL,
        };

        let mut fields = Map::new();
        fields.insert(field::NAME.into(), name.into());
        fields.insert("description".into(), self.description.unwrap_or_default().into());
        fields.insert("price".into(), price.into());
        fields.insert(field::CATEGORY.into(), self.category.unwrap_or_default().into());
        fields.insert("isVegetarian".into(), self.is_vegetarian.unwrap_or(false).into());
        fields.insert("isVegan".into(), self.is_vegan.unwrap_or(false).into());
        fields.insert("isGlutenFree".into(), self.is_gluten_free.unwrap_or(false).into());
        fields.insert(field::IS_AVAILABLE.into(), self.is_available.unwrap_or(true).into());
        fields.insert("preparationTime".into(), preparation_time.into());
        fields.insert("spicyLevel".into(), spicy_level.into());
        if let Some(image) = self.image {
            fields.insert(field::IMAGE.into(), image.to_value());
        }
        Ok(fields)
    }
}

/// Update menu item payload
///
/// Carries no `restaurantId` / `restaurantName`: the foreign key is owned by
/// the repository and never changed by an edit.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuItemUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<FormNumber>,
    pub category: Option<String>,
    pub is_vegetarian: Option<bool>,
    pub is_vegan: Option<bool>,
    pub is_gluten_free: Option<bool>,
    pub is_available: Option<bool>,
    pub preparation_time: Option<FormNumber>,
    pub spicy_level: Option<FormNumber>,
    pub image: Option<ImageRef>,
}

impl MenuItemUpdate {
    /// Validate and build the patch (only the fields present)
    pub fn into_patch(self) -> Result<Map<String, Value>, ValidationError> {
        let mut patch = Map::new();
        if let Some(name) = self.name {
            patch.insert(field::NAME.into(), validate_name(&name)?.into());
        }
        if let Some(v) = self.description {
            patch.insert("description".into(), v.into());
        }
        if let Some(price) = self.price {
            let price = price.to_f64("price")?;
            validate_price(price)?;
            patch.insert("price".into(), price.into());
        }
        if let Some(v) = self.category {
            patch.insert(field::CATEGORY.into(), v.into());
        }
        if let Some(v) = self.is_vegetarian {
            patch.insert("isVegetarian".into(), v.into());
        }
        if let Some(v) = self.is_vegan {
            patch.insert("isVegan".into(), v.into());
        }
        if let Some(v) = self.is_gluten_free {
            patch.insert("isGlutenFree".into(), v.into());
        }
        if let Some(v) = self.is_available {
            patch.insert(field::IS_AVAILABLE.into(), v.into());
        }
        if let Some(v) = self.preparation_time {
            let minutes = validate_preparation_time(v.to_i64("preparationTime")?)?;
            patch.insert("preparationTime".into(), minutes.into());
        }
        if let Some(v) = self.spicy_level {
            let level = validate_spicy_level(v.to_i64("spicyLevel")?)?;
            patch.insert("spicyLevel".into(), level.into());
        }
        if let Some(image) = self.image {
            patch.insert(field::IMAGE.into(), image.to_value());
        }
        Ok(patch)
    }
}

fn validate_name(name: &str) -> Result<String, ValidationError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::new("name cannot be empty"));
    }
    Ok(trimmed.to_string())
}

fn validate_price(price: f64) -> Result<(), ValidationError> {
    if !price.is_finite() || price < 0.0 {
        return Err(ValidationError::new(format!(
            "price must be a non-negative number, got {price}"
        )));
    }
    Ok(())
}

fn validate_preparation_time(minutes: i64) -> Result<u32, ValidationError> {
    u32::try_from(minutes).map_err(|_| {
        ValidationError::new(format!(
            "preparationTime must be a non-negative number of minutes, got {minutes}"
        ))
    })
}

fn validate_spicy_level(level: i64) -> Result<u8, ValidationError> {
    if !(0..=MAX_SPICY_LEVEL as i64).contains(&level) {
        return Err(ValidationError::new(format!(
            "spicyLevel must be between 0 and {MAX_SPICY_LEVEL}, got {level}"
        )));
    }
    Ok(level as u8)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn decode(value: Value, parent: Option<&str>) -> Result<MenuItem, ValidationError> {
        let Value::Object(data) = value else {
            panic!("test documents are objects");
        };
        StoredMenuItem::from_fields(&data)?.into_menu_item("m1", parent)
    }

    #[test]
    fn missing_numbers_take_defaults() {
        let item = decode(json!({ "name": "Dal", "restaurantId": "r1" }), None).unwrap();
        assert_eq!(item.preparation_time, 15);
        assert_eq!(item.spicy_level, 0);
        assert_eq!(item.price, 0.0);
        assert!(item.is_available);
    }

    #[test]
    fn string_price_is_coerced() {
        let item = decode(json!({ "name": "Dal", "restaurantId": "r1", "price": "12.5" }), None)
            .unwrap();
        assert_eq!(item.price, 12.5);
    }

    #[test]
    fn non_numeric_fields_take_defaults() {
        let item = decode(
            json!({
                "name": "Dal", "restaurantId": "r1",
                "price": "free", "preparationTime": "soon", "spicyLevel": {}
            }),
            None,
        )
        .unwrap();
        assert_eq!(item.price, 0.0);
        assert_eq!(item.preparation_time, 15);
        assert_eq!(item.spicy_level, 0);
    }

    #[test]
    fn spicy_level_is_clamped() {
        let item = decode(json!({ "name": "Vindaloo", "restaurantId": "r1", "spicyLevel": 9 }), None)
            .unwrap();
        assert_eq!(item.spicy_level, 5);
    }

    #[test]
    fn parent_path_supplies_restaurant_id() {
        let item = decode(json!({ "name": "Dal" }), Some("r7")).unwrap();
        assert_eq!(item.restaurant_id, "r7");
    }

    #[test]
    fn missing_restaurant_id_is_rejected() {
        let err = decode(json!({ "name": "Dal" }), None).unwrap_err();
        assert!(err.0.contains("restaurantId"));
    }

    #[test]
    fn missing_name_is_rejected() {
        assert!(decode(json!({ "restaurantId": "r1" }), None).is_err());
    }

    #[test]
    fn image_object_is_normalized_to_url() {
        let item = decode(
            json!({ "name": "Dal", "restaurantId": "r1", "image": { "url": "https://img/d.jpg", "path": "p" } }),
            None,
        )
        .unwrap();
        assert_eq!(item.image.as_deref(), Some("https://img/d.jpg"));
    }

    #[test]
    fn create_requires_numeric_price() {
        let create: MenuItemCreate =
            serde_json::from_value(json!({ "name": "Dal", "price": "abc" })).unwrap();
        assert!(create.into_fields().is_err());
    }

    #[test]
    fn create_accepts_form_strings() {
        let create: MenuItemCreate = serde_json::from_value(
            json!({ "name": " Dal ", "price": "199", "preparationTime": "20", "spicyLevel": "2" }),
        )
        .unwrap();
        let fields = create.into_fields().unwrap();
        assert_eq!(fields["name"], json!("Dal"));
        assert_eq!(fields["price"], json!(199.0));
        assert_eq!(fields["preparationTime"], json!(20));
        assert_eq!(fields["spicyLevel"], json!(2));
        assert_eq!(fields["isAvailable"], json!(true));
    }

    #[test]
    fn create_rejects_out_of_range_values() {
        let negative = MenuItemCreate {
            name: "Dal".into(),
            price: Some((-1.0).into()),
            ..Default::default()
        };
        assert!(negative.into_fields().is_err());

        let too_spicy = MenuItemCreate {
            name: "Dal".into(),
            price: Some(1.0.into()),
            spicy_level: Some(6i64.into()),
            ..Default::default()
        };
        assert!(too_spicy.into_fields().is_err());
    }

    #[test]
    fn update_patch_contains_only_present_fields() {
        let patch = MenuItemUpdate {
            price: Some(10.0.into()),
            ..Default::default()
        }
        .into_patch()
        .unwrap();
        assert_eq!(patch.len(), 1);
        assert_eq!(patch["price"], json!(10.0));
    }

    #[test]
    fn non_numeric_input_is_rejected_not_dropped() {
        let update: MenuItemUpdate =
            serde_json::from_value(json!({ "price": "abc" })).unwrap();
        let err = update.into_patch().unwrap_err();
        assert!(err.0.contains("price"));

        let update: MenuItemUpdate =
            serde_json::from_value(json!({ "spicyLevel": "hot" })).unwrap();
        assert!(update.into_patch().is_err());

        let create: MenuItemCreate = serde_json::from_value(
            json!({ "name": "Dal", "price": 5, "preparationTime": "soon" }),
        )
        .unwrap();
        let err = create.into_fields().unwrap_err();
        assert!(err.0.contains("preparationTime"));

        let create: MenuItemCreate =
            serde_json::from_value(json!({ "name": "Dal", "price": [5] })).unwrap();
        assert!(create.into_fields().is_err());
    }

    #[test]
    fn update_ignores_foreign_key_fields_in_payload() {
        let update: MenuItemUpdate =
            serde_json::from_value(json!({ "restaurantId": "evil", "price": 3 })).unwrap();
        let patch = update.into_patch().unwrap();
        assert!(!patch.contains_key("restaurantId"));
    }
}
