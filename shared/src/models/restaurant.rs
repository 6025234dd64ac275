//! Restaurant Model

use super::serde_helpers::{lenient_bool, lenient_millis, lenient_string, lenient_string_set};
use super::{ImageRef, ValidationError, field, normalize_image};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeSet;

/// Restaurant entity (document id = identity-provider user id)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Restaurant {
    pub id: String,
    pub name: String,
    pub owner_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub pincode: Option<String>,
    pub cuisine_types: BTreeSet<String>,
    /// Free-form, e.g. "09:00"
    pub opening_time: Option<String>,
    pub closing_time: Option<String>,
    pub description: Option<String>,
    /// Normalized from `image`, falling back to `restaurantImage`
    pub image: Option<String>,
    pub is_profile_complete: bool,
    pub is_verified: bool,
    pub created_at: Option<i64>,
    pub updated_at: Option<i64>,
}

/// Restaurant document as it may appear in the store
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredRestaurant {
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub owner_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub phone: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub address: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub city: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub state: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub pincode: Option<String>,
    #[serde(default, deserialize_with = "lenient_string_set")]
    pub cuisine_types: BTreeSet<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub opening_time: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub closing_time: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub description: Option<String>,
    #[serde(default)]
    pub image: Value,
    #[serde(default)]
    pub restaurant_image: Value,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub is_profile_complete: Option<bool>,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub is_verified: Option<bool>,
    #[serde(default, deserialize_with = "lenient_millis")]
    pub created_at: Option<i64>,
    #[serde(default, deserialize_with = "lenient_millis")]
    pub updated_at: Option<i64>,
}

impl StoredRestaurant {
    pub fn from_fields(data: &Map<String, Value>) -> Result<Self, ValidationError> {
        Self::deserialize(Value::Object(data.clone()))
            .map_err(|e| ValidationError::new(format!("malformed restaurant: {e}")))
    }

    pub fn into_restaurant(self, id: &str) -> Restaurant {
        Restaurant {
            id: id.to_string(),
            name: self.name.unwrap_or_default(),
            owner_name: self.owner_name,
            email: self.email,
            phone: self.phone,
            address: self.address,
            city: self.city,
            state: self.state,
            pincode: self.pincode,
            cuisine_types: self.cuisine_types,
            opening_time: self.opening_time,
            closing_time: self.closing_time,
            description: self.description,
            image: normalize_image(&self.image, &self.restaurant_image),
            is_profile_complete: self.is_profile_complete.unwrap_or(false),
            is_verified: self.is_verified.unwrap_or(false),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Profile payload for signup, profile setup and profile edits.
///
/// `isVerified` / `isProfileComplete` are not part of the profile; they change
/// only through their own transitions.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RestaurantProfile {
    pub name: Option<String>,
    pub owner_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub pincode: Option<String>,
    pub cuisine_types: Option<BTreeSet<String>>,
    pub opening_time: Option<String>,
    pub closing_time: Option<String>,
    pub description: Option<String>,
    pub image: Option<ImageRef>,
}

impl RestaurantProfile {
    /// Build the write body (only the fields present)
    pub fn into_fields(self) -> Result<Map<String, Value>, ValidationError> {
        let mut fields = Map::new();
        if let Some(name) = self.name {
            let name = name.trim();
            if name.is_empty() {
                return Err(ValidationError::new("restaurant name cannot be empty"));
            }
            fields.insert(field::NAME.into(), name.into());
        }
        if let Some(email) = self.email {
            if !email.is_empty() && !email.contains('@') {
                return Err(ValidationError::new(format!("invalid email: {email}")));
            }
            fields.insert("email".into(), email.into());
        }

        let optional = [
            ("ownerName", self.owner_name),
            ("phone", self.phone),
            ("address", self.address),
            ("city", self.city),
            ("state", self.state),
            ("pincode", self.pincode),
            ("openingTime", self.opening_time),
            ("closingTime", self.closing_time),
            ("description", self.description),
        ];
        for (key, value) in optional {
            if let Some(value) = value {
                fields.insert(key.into(), value.into());
            }
        }

        if let Some(cuisines) = self.cuisine_types {
            fields.insert(
                "cuisineTypes".into(),
                Value::Array(cuisines.into_iter().map(Value::String).collect()),
            );
        }
        if let Some(image) = self.image {
            fields.insert(field::IMAGE.into(), image.to_value());
        }
        Ok(fields)
    }
}
