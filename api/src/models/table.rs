// models/table.rs

use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

/// Occupancy of a table. Stored as `0` (free) / `1` (occupied).
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(into = "i32", try_from = "i32")]
pub enum TableStatus {
    #[default]
    Free,
    Occupied,
}

impl From<TableStatus> for i32 {
    fn from(status: TableStatus) -> Self {
        match status {
            TableStatus::Free => 0,
            TableStatus::Occupied => 1,
        }
    }
}

impl TryFrom<i32> for TableStatus {
    type Error = String;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(TableStatus::Free),
            1 => Ok(TableStatus::Occupied),
            other => Err(format!("unknown table status {}", other)),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Table {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub tablename: String,
    #[serde(default)]
    pub note: String,
    #[serde(default)]
    pub status: TableStatus,
    /// Bill currently open on this table. Only set while `status` is occupied.
    #[serde(default)]
    pub bill: Option<ObjectId>,
}

impl Table {
    pub fn new(tablename: String) -> Self {
        Table {
            id: ObjectId::new(),
            tablename,
            note: String::new(),
            status: TableStatus::Free,
            bill: None,
        }
    }
}

#[derive(Deserialize, Debug, Default)]
pub struct CreateTableRequest {
    pub tablename: Option<String>,
    pub note: Option<String>,
}

#[derive(Deserialize, Debug, Default)]
pub struct UpdateTableRequest {
    pub tablename: Option<String>,
    pub note: Option<String>,
}

#[derive(Deserialize, Debug, Default)]
pub struct TableRef {
    #[serde(rename = "_id")]
    pub id: Option<String>,
    pub bill: Option<String>,
}

/// Body of `PUT /tables/chuyenban`.
#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct TransferTableRequest {
    pub curr_table: Option<TableRef>,
    pub target_table: Option<TableRef>,
}

#[derive(Serialize, Debug, Clone)]
pub struct TableResponse {
    #[serde(rename = "_id")]
    pub id: String,
    pub tablename: String,
    pub note: String,
    pub status: TableStatus,
    /// Empty string when no bill is open.
    pub bill: String,
}

impl From<Table> for TableResponse {
    fn from(table: Table) -> Self {
        TableResponse {
            id: table.id.to_hex(),
            tablename: table.tablename,
            note: table.note,
            status: table.status,
            bill: table.bill.map(|b| b.to_hex()).unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_serializes_as_integer() {
        assert_eq!(serde_json::to_string(&TableStatus::Occupied).unwrap(), "1");
        let status: TableStatus = serde_json::from_str("0").unwrap();
        assert_eq!(status, TableStatus::Free);
        assert!(serde_json::from_str::<TableStatus>("7").is_err());
    }

    #[test]
    fn free_table_renders_empty_bill() {
        let response = TableResponse::from(Table::new("Ban 1".into()));
        assert_eq!(response.bill, "");
        assert_eq!(response.status, TableStatus::Free);
    }
}
