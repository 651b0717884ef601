//! Department (listing) Model

use serde::{Deserialize, Serialize};

use super::image::{clean_image_urls, deserialize_images};
use crate::error::{ValidationError, ValidationResult};
use crate::types::EntityId;

fn default_bedrooms() -> u32 {
    1
}

/// Department entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Department {
    #[serde(alias = "_id")]
    pub id: EntityId,
    pub name: String,
    #[serde(default)]
    pub address: String,
    #[serde(default = "default_bedrooms")]
    pub bedrooms: u32,
    #[serde(default, alias = "price_per_night", alias = "price")]
    pub price_per_night: f64,
    #[serde(default)]
    pub rating: f64,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub amenities: Vec<String>,
    #[serde(default, deserialize_with = "deserialize_images")]
    pub images: Vec<String>,
}

impl Department {
    /// Merge the set fields of an update into this record
    pub fn apply(&mut self, update: &DepartmentUpdate) {
        if let Some(name) = &update.name {
            self.name = name.clone();
        }
        if let Some(address) = &update.address {
            self.address = address.clone();
        }
        if let Some(bedrooms) = update.bedrooms {
            self.bedrooms = bedrooms;
        }
        if let Some(price) = update.price_per_night {
            self.price_per_night = price;
        }
        if let Some(description) = &update.description {
            self.description = description.clone();
        }
        if let Some(amenities) = &update.amenities {
            self.amenities = amenities.clone();
        }
        if let Some(images) = &update.images {
            self.images = images.clone();
        }
    }
}

/// Create department payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DepartmentCreate {
    pub name: String,
    pub address: String,
    pub bedrooms: u32,
    pub price_per_night: f64,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub amenities: Vec<String>,
    #[serde(default)]
    pub images: Vec<String>,
}

impl DepartmentCreate {
    pub fn validate(&self) -> ValidationResult {
        validate_name(&self.name)?;
        validate_bedrooms(self.bedrooms)?;
        validate_price(self.price_per_night)
    }

    /// Trim blank image entries before the payload leaves the client
    pub fn clean(&mut self) {
        clean_image_urls(&mut self.images);
    }

    /// Build a local-only record carrying exactly the submitted fields
    pub fn into_department(self, id: EntityId) -> Department {
        Department {
            id,
            name: self.name,
            address: self.address,
            bedrooms: self.bedrooms,
            price_per_night: self.price_per_night,
            rating: 0.0,
            description: self.description,
            amenities: self.amenities,
            images: self.images,
        }
    }
}

/// Update department payload
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DepartmentUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bedrooms: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_per_night: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amenities: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<String>>,
}

impl DepartmentUpdate {
    pub fn validate(&self) -> ValidationResult {
        if let Some(name) = &self.name {
            validate_name(name)?;
        }
        if let Some(bedrooms) = self.bedrooms {
            validate_bedrooms(bedrooms)?;
        }
        if let Some(price) = self.price_per_night {
            validate_price(price)?;
        }
        Ok(())
    }

    pub fn clean(&mut self) {
        if let Some(images) = self.images.as_mut() {
            clean_image_urls(images);
        }
    }
}

fn validate_name(name: &str) -> ValidationResult {
    if name.trim().is_empty() {
        return Err(ValidationError::new("name", "must not be empty"));
    }
    Ok(())
}

fn validate_bedrooms(bedrooms: u32) -> ValidationResult {
    if bedrooms < 1 {
        return Err(ValidationError::new("bedrooms", "must be at least 1"));
    }
    Ok(())
}

fn validate_price(price: f64) -> ValidationResult {
    if !price.is_finite() || price < 0.0 {
        return Err(ValidationError::new("pricePerNight", "must be a non-negative number"));
    }
    Ok(())
}
