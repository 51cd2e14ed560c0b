use mongodb::bson::oid::ObjectId;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A line item: one food on one bill. `price` is the food price at order time.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct BillInfo {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub bill: ObjectId,
    pub food: ObjectId,
    pub quantity: i64,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    #[serde(default)]
    pub note: String,
}

impl BillInfo {
    pub fn new(bill: ObjectId, food: ObjectId, quantity: i64, price: Decimal) -> Self {
        BillInfo {
            id: ObjectId::new(),
            bill,
            food,
            quantity,
            price,
            note: String::new(),
        }
    }
}

#[derive(Deserialize, Debug, Default)]
pub struct CreateBillInfoRequest {
    pub bill: Option<String>,
    pub food: Option<String>,
    pub quantity: Option<i64>,
}

/// Body of `PATCH /billinfo/:id` (relative) and `PUT /billinfo/:id` (absolute).
#[derive(Deserialize, Debug, Default)]
pub struct UpdateBillInfoRequest {
    pub quantity: Option<i64>,
    pub food: Option<String>,
}

#[derive(Serialize, Debug, Clone)]
pub struct BillInfoResponse {
    #[serde(rename = "_id")]
    pub id: String,
    pub bill: String,
    pub food: String,
    pub quantity: i64,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
}

impl From<BillInfo> for BillInfoResponse {
    fn from(info: BillInfo) -> Self {
        BillInfoResponse {
            id: info.id.to_hex(),
            bill: info.bill.to_hex(),
            food: info.food.to_hex(),
            quantity: info.quantity,
            price: info.price,
        }
    }
}
