use mongodb::bson::oid::ObjectId;
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::category::{Category, CategoryResponse};
use crate::error::{AppError, AppResult};

/// Sale status of a food. Stored as `1` (on sale) / `0` (withdrawn).
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(into = "i32", try_from = "i32")]
pub enum FoodStatus {
    #[default]
    OnSale,
    Withdrawn,
}

impl From<FoodStatus> for i32 {
    fn from(status: FoodStatus) -> Self {
        match status {
            FoodStatus::OnSale => 1,
            FoodStatus::Withdrawn => 0,
        }
    }
}

impl TryFrom<i32> for FoodStatus {
    type Error = String;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(FoodStatus::OnSale),
            0 => Ok(FoodStatus::Withdrawn),
            other => Err(format!("unknown food status {}", other)),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Food {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub name: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    /// Percentage in `[0, 100]`.
    #[serde(default, with = "rust_decimal::serde::float")]
    pub discount: Decimal,
    #[serde(default)]
    pub description: String,
    /// On-hand stock. Orders can drive it below zero.
    #[serde(default)]
    pub so_luong_ton: i64,
    #[serde(default)]
    pub img_url: String,
    #[serde(default)]
    pub status: FoodStatus,
    pub category: ObjectId,
}

/// Fields of a food that an update may overwrite.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FoodPatch {
    pub name: Option<String>,
    pub price: Option<Decimal>,
    pub discount: Option<Decimal>,
    pub description: Option<String>,
    pub so_luong_ton: Option<i64>,
    pub img_url: Option<String>,
    pub status: Option<FoodStatus>,
    pub category: Option<ObjectId>,
}

impl FoodPatch {
    pub fn apply(&self, food: &mut Food) {
        if let Some(name) = &self.name {
            food.name = name.clone();
        }
        if let Some(price) = self.price {
            food.price = price;
        }
        if let Some(discount) = self.discount {
            food.discount = discount;
        }
        if let Some(description) = &self.description {
            food.description = description.clone();
        }
        if let Some(stock) = self.so_luong_ton {
            food.so_luong_ton = stock;
        }
        if let Some(img_url) = &self.img_url {
            food.img_url = img_url.clone();
        }
        if let Some(status) = self.status {
            food.status = status;
        }
        if let Some(category) = self.category {
            food.category = category;
        }
    }

    /// Builds a patch from a raw update body, rejecting fields outside the whitelist.
    pub fn from_body(body: serde_json::Map<String, serde_json::Value>) -> AppResult<Self> {
        let mut patch = FoodPatch::default();

        for (field, value) in body {
            match field.as_str() {
                "name" => {
                    let name: String = field_as(&field, value)?;
                    patch.name = Some(super::normalize_string(&name));
                }
                "price" => {
                    let price = decimal_field(&field, value)?;
                    if price.is_sign_negative() && !price.is_zero() {
                        return Err(AppError::Validation("price must not be negative".into()));
                    }
                    patch.price = Some(price);
                }
                "discount" => {
                    let discount = decimal_field(&field, value)?;
                    if discount < Decimal::ZERO || discount > Decimal::ONE_HUNDRED {
                        return Err(AppError::Validation(format!(
                            "Invalid discount {}",
                            discount
                        )));
                    }
                    patch.discount = Some(discount);
                }
                "description" => patch.description = Some(field_as(&field, value)?),
                "soLuongTon" => patch.so_luong_ton = Some(field_as(&field, value)?),
                "imgUrl" => patch.img_url = Some(field_as(&field, value)?),
                "status" => {
                    let raw: i32 = field_as(&field, value)?;
                    patch.status = Some(FoodStatus::try_from(raw).map_err(AppError::Validation)?);
                }
                "category" => {
                    let raw: String = field_as(&field, value)?;
                    patch.category = Some(super::parse_id(&raw, "category")?);
                }
                other => return Err(AppError::Validation(format!("Invalid field {}", other))),
            }
        }

        Ok(patch)
    }
}

fn field_as<T: DeserializeOwned>(field: &str, value: serde_json::Value) -> AppResult<T> {
    serde_json::from_value(value)
        .map_err(|e| AppError::Validation(format!("Invalid value for {}: {}", field, e)))
}

fn decimal_field(field: &str, value: serde_json::Value) -> AppResult<Decimal> {
    let raw: f64 = field_as(field, value)?;
    Decimal::try_from(raw)
        .map_err(|_| AppError::Validation(format!("Invalid value for {}: {}", field, raw)))
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct CreateFoodRequest {
    pub name: Option<String>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub price: Option<Decimal>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub discount: Option<Decimal>,
    pub description: Option<String>,
    pub so_luong_ton: Option<i64>,
    pub img_url: Option<String>,
    pub category: Option<String>,
}

/// Category as embedded in a food response. Falls back to the bare id when the
/// category document is gone.
#[derive(Serialize, Debug, Clone)]
#[serde(untagged)]
pub enum FoodCategory {
    Populated(CategoryResponse),
    Id(String),
}

#[derive(Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct FoodResponse {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub discount: Decimal,
    pub description: String,
    pub so_luong_ton: i64,
    pub img_url: String,
    pub status: FoodStatus,
    pub category: FoodCategory,
}

impl FoodResponse {
    pub fn new(food: Food, category: Option<Category>) -> Self {
        let category = match category {
            Some(category) => FoodCategory::Populated(category.into()),
            None => FoodCategory::Id(food.category.to_hex()),
        };
        FoodResponse {
            id: food.id.to_hex(),
            name: food.name,
            price: food.price,
            discount: food.discount,
            description: food.description,
            so_luong_ton: food.so_luong_ton,
            img_url: food.img_url,
            status: food.status,
            category,
        }
    }
}
