use mongodb::bson::oid::ObjectId;
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::bill_info::BillInfoResponse;
use crate::error::{AppError, AppResult};

/// Settlement state of a bill. Stored as `0` (open) / `1` (settled).
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(into = "i32", try_from = "i32")]
pub enum BillStatus {
    #[default]
    Open,
    Settled,
}

impl From<BillStatus> for i32 {
    fn from(status: BillStatus) -> Self {
        match status {
            BillStatus::Open => 0,
            BillStatus::Settled => 1,
        }
    }
}

impl TryFrom<i32> for BillStatus {
    type Error = String;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(BillStatus::Open),
            1 => Ok(BillStatus::Settled),
            other => Err(format!("unknown bill status {}", other)),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Bill {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    /// Milliseconds since the unix epoch.
    pub time_check_in: i64,
    #[serde(default)]
    pub time_checkout: Option<i64>,
    #[serde(default)]
    pub note: String,
    #[serde(default, with = "rust_decimal::serde::float")]
    pub tips: Decimal,
    #[serde(default)]
    pub status: BillStatus,
    pub table: ObjectId,
    pub seller: ObjectId,
}

impl Bill {
    pub fn open(table: ObjectId, seller: ObjectId, time_check_in: i64, note: String) -> Self {
        Bill {
            id: ObjectId::new(),
            time_check_in,
            time_checkout: None,
            note,
            tips: Decimal::ZERO,
            status: BillStatus::Open,
            table,
            seller,
        }
    }
}

/// Scalar fields a bill update may touch. `table` and `seller` are fixed at creation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BillPatch {
    pub time_checkout: Option<i64>,
    pub note: Option<String>,
    pub tips: Option<Decimal>,
    pub status: Option<BillStatus>,
}

impl BillPatch {
    pub fn apply(&self, bill: &mut Bill) {
        if let Some(time_checkout) = self.time_checkout {
            bill.time_checkout = Some(time_checkout);
        }
        if let Some(note) = &self.note {
            bill.note = note.clone();
        }
        if let Some(tips) = self.tips {
            bill.tips = tips;
        }
        if let Some(status) = self.status {
            bill.status = status;
        }
    }
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct CreateBillRequest {
    pub time_check_in: Option<i64>,
    pub table: Option<String>,
    pub seller: Option<String>,
    pub note: Option<String>,
}

/// One desired line of a full-bill save.
#[derive(Deserialize, Debug, Clone, Default)]
pub struct DesiredLineItem {
    pub bill: Option<String>,
    pub food: Option<String>,
    pub quantity: Option<i64>,
}

/// Parsed body of `PATCH /bills/:id`.
///
/// Only `timeCheckout`, `note`, `tips` and `status` change the bill itself. `table` and
/// `billinfos` drive the full-bill save; `timeCheckIn` and `seller` are tolerated and ignored.
#[derive(Debug, Default)]
pub struct UpdateBillRequest {
    pub patch: BillPatch,
    pub table: Option<String>,
    pub billinfos: Option<Vec<DesiredLineItem>>,
}

impl UpdateBillRequest {
    pub fn from_body(body: serde_json::Map<String, serde_json::Value>) -> AppResult<Self> {
        let mut request = UpdateBillRequest::default();

        for (field, value) in body {
            match field.as_str() {
                "timeCheckout" => request.patch.time_checkout = Some(field_as(&field, value)?),
                "note" => request.patch.note = Some(field_as(&field, value)?),
                "tips" => {
                    let tips: f64 = field_as(&field, value)?;
                    let tips = Decimal::try_from(tips)
                        .map_err(|_| AppError::Validation(format!("Invalid tips {}", tips)))?;
                    if tips.is_sign_negative() && !tips.is_zero() {
                        return Err(AppError::Validation("tips must not be negative".into()));
                    }
                    request.patch.tips = Some(tips);
                }
                "status" => {
                    let raw: i32 = field_as(&field, value)?;
                    let status = BillStatus::try_from(raw).map_err(AppError::Validation)?;
                    request.patch.status = Some(status);
                }
                "table" => request.table = Some(field_as(&field, value)?),
                "billinfos" => request.billinfos = Some(field_as(&field, value)?),
                "timeCheckIn" | "seller" => {}
                other => {
                    return Err(AppError::Validation(format!(
                        "Can not use {} to update bill",
                        other
                    )))
                }
            }
        }

        Ok(request)
    }
}

fn field_as<T: DeserializeOwned>(field: &str, value: serde_json::Value) -> AppResult<T> {
    serde_json::from_value(value)
        .map_err(|e| AppError::Validation(format!("Invalid value for {}: {}", field, e)))
}

#[derive(Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct BillResponse {
    #[serde(rename = "_id")]
    pub id: String,
    pub time_check_in: i64,
    /// `-1` while the guest has not checked out.
    pub time_checkout: i64,
    pub note: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub tips: Decimal,
    pub status: BillStatus,
    pub table: String,
    pub seller: String,
}

impl From<Bill> for BillResponse {
    fn from(bill: Bill) -> Self {
        BillResponse {
            id: bill.id.to_hex(),
            time_check_in: bill.time_check_in,
            time_checkout: bill.time_checkout.unwrap_or(-1),
            note: bill.note,
            tips: bill.tips,
            status: bill.status,
            table: bill.table.to_hex(),
            seller: bill.seller.to_hex(),
        }
    }
}

/// Bill plus its line items, returned by the full-bill save.
#[derive(Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct BillWithItemsResponse {
    #[serde(flatten)]
    pub bill: BillResponse,
    pub billinfos: Vec<BillInfoResponse>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn patch_applies_only_present_fields() {
        let mut bill = Bill::open(ObjectId::new(), ObjectId::new(), 1_700_000_000_000, "vip".into());
        let patch = BillPatch {
            tips: Some(Decimal::new(1500, 2)),
            ..BillPatch::default()
        };
        patch.apply(&mut bill);
        assert_eq!(bill.tips, Decimal::new(1500, 2));
        assert_eq!(bill.note, "vip");
        assert_eq!(bill.status, BillStatus::Open);
    }

    #[test]
    fn update_body_rejects_unknown_fields() {
        let body = serde_json::json!({ "seller": "x", "discount": 3 });
        let err = UpdateBillRequest::from_body(body.as_object().unwrap().clone()).unwrap_err();
        assert_eq!(err.to_string(), "Validation failed: Can not use discount to update bill");
    }

    #[test]
    fn update_body_splits_patch_and_line_items() {
        let body = serde_json::json!({
            "tips": 2.5,
            "status": 1,
            "table": "655f1c2e9d1e8a3b4c5d6e7f",
            "billinfos": [{ "food": "655f1c2e9d1e8a3b4c5d6e80", "quantity": 2, "price": 30000 }]
        });
        let request = UpdateBillRequest::from_body(body.as_object().unwrap().clone()).unwrap();
        assert_eq!(request.patch.tips, Some(Decimal::new(25, 1)));
        assert_eq!(request.patch.status, Some(BillStatus::Settled));
        assert_eq!(request.billinfos.unwrap()[0].quantity, Some(2));
    }

    #[test]
    fn update_body_rejects_negative_tips() {
        let body = serde_json::json!({ "tips": -1 });
        assert!(UpdateBillRequest::from_body(body.as_object().unwrap().clone()).is_err());
    }

    #[test]
    fn open_bill_renders_checkout_as_minus_one() {
        let bill = Bill::open(ObjectId::new(), ObjectId::new(), 42, String::new());
        let json = serde_json::to_value(BillResponse::from(bill)).unwrap();
        assert_eq!(json["timeCheckout"], -1);
        assert_eq!(json["timeCheckIn"], 42);
        assert_eq!(json["status"], 0);
        assert_eq!(json["tips"], 0.0);
    }
}
