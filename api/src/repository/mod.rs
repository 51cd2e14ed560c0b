//! Storage seams of the service.
//!
//! Each collection gets an object-safe store trait. Every method is a single-document
//! operation that the backend executes atomically; multi-document sequences live in
//! `crate::services` and are not transactional.

pub mod bill_info_repository;
pub mod bill_repository;
pub mod category_repository;
pub mod food_repository;
pub mod memory;
pub mod table_repository;
pub mod user_repository;

use async_trait::async_trait;
use mongodb::bson::oid::ObjectId;
use mongodb::error::{ErrorKind, WriteFailure};
use thiserror::Error;

use crate::models::bill::{Bill, BillPatch};
use crate::models::bill_info::BillInfo;
use crate::models::category::Category;
use crate::models::food::{Food, FoodPatch};
use crate::models::table::Table;
use crate::models::user::User;

pub use bill_info_repository::BillInfoRepository;
pub use bill_repository::BillRepository;
pub use category_repository::CategoryRepository;
pub use food_repository::FoodRepository;
pub use memory::MemoryStore;
pub use table_repository::TableRepository;
pub use user_repository::UserRepository;

const DUPLICATE_KEY: i32 = 11000;

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("Duplicate: {0}")]
    Duplicate(String),

    #[error("Database error: {0}")]
    Database(String),
}

impl From<mongodb::error::Error> for RepoError {
    fn from(err: mongodb::error::Error) -> Self {
        if let ErrorKind::Write(WriteFailure::WriteError(write_error)) = err.kind.as_ref() {
            if write_error.code == DUPLICATE_KEY {
                return RepoError::Duplicate(write_error.message.clone());
            }
        }
        RepoError::Database(err.to_string())
    }
}

impl From<mongodb::bson::ser::Error> for RepoError {
    fn from(err: mongodb::bson::ser::Error) -> Self {
        RepoError::Database(err.to_string())
    }
}

pub type RepoResult<T> = Result<T, RepoError>;

#[async_trait]
pub trait TableStore: Send + Sync {
    async fn find_all(&self) -> RepoResult<Vec<Table>>;
    async fn find_by_id(&self, id: ObjectId) -> RepoResult<Option<Table>>;
    async fn find_by_name(&self, tablename: &str) -> RepoResult<Option<Table>>;
    /// Fails with `Duplicate` when the name is taken.
    async fn insert(&self, table: &Table) -> RepoResult<()>;
    async fn update_details(
        &self,
        id: ObjectId,
        tablename: Option<String>,
        note: Option<String>,
    ) -> RepoResult<Option<Table>>;
    /// Marks the table occupied by `bill` only if it is currently free.
    /// `None` when the table is missing or already occupied.
    async fn occupy_if_free(&self, id: ObjectId, bill: ObjectId) -> RepoResult<Option<Table>>;
    async fn occupy(&self, id: ObjectId, bill: ObjectId) -> RepoResult<Option<Table>>;
    async fn release(&self, id: ObjectId) -> RepoResult<Option<Table>>;
    async fn delete(&self, id: ObjectId) -> RepoResult<Option<Table>>;
}

#[async_trait]
pub trait BillStore: Send + Sync {
    async fn find_all(&self) -> RepoResult<Vec<Bill>>;
    async fn find_by_id(&self, id: ObjectId) -> RepoResult<Option<Bill>>;
    async fn insert(&self, bill: &Bill) -> RepoResult<()>;
    async fn update(&self, id: ObjectId, patch: &BillPatch) -> RepoResult<Option<Bill>>;
    async fn delete(&self, id: ObjectId) -> RepoResult<Option<Bill>>;
}

#[async_trait]
pub trait BillInfoStore: Send + Sync {
    async fn find_all(&self) -> RepoResult<Vec<BillInfo>>;
    async fn find_by_id(&self, id: ObjectId) -> RepoResult<Option<BillInfo>>;
    async fn find_by_bill(&self, bill: ObjectId) -> RepoResult<Vec<BillInfo>>;
    async fn find_by_bill_and_food(
        &self,
        bill: ObjectId,
        food: ObjectId,
    ) -> RepoResult<Option<BillInfo>>;
    /// Fails with `Duplicate` when the (bill, food) pair already has a row.
    async fn insert(&self, info: &BillInfo) -> RepoResult<()>;
    /// Adds `delta` to the quantity unless the result would drop to zero or below.
    async fn increment_quantity(&self, id: ObjectId, delta: i64) -> RepoResult<Option<BillInfo>>;
    async fn set_quantity(&self, id: ObjectId, quantity: i64) -> RepoResult<Option<BillInfo>>;
    async fn delete(&self, id: ObjectId) -> RepoResult<Option<BillInfo>>;
    async fn delete_by_bill(&self, bill: ObjectId) -> RepoResult<u64>;
}

#[async_trait]
pub trait FoodStore: Send + Sync {
    async fn find_all(&self) -> RepoResult<Vec<Food>>;
    async fn find_by_id(&self, id: ObjectId) -> RepoResult<Option<Food>>;
    async fn find_by_name(&self, name: &str) -> RepoResult<Option<Food>>;
    async fn insert(&self, food: &Food) -> RepoResult<()>;
    /// Applies the patch and returns the food as it was before it.
    async fn update(&self, id: ObjectId, patch: &FoodPatch) -> RepoResult<Option<Food>>;
    /// Atomic `stock += delta`, no lower bound.
    async fn adjust_stock(&self, id: ObjectId, delta: i64) -> RepoResult<Option<Food>>;
    /// Atomic `stock -= quantity`, applied only while `stock >= quantity`.
    async fn take_stock(&self, id: ObjectId, quantity: i64) -> RepoResult<Option<Food>>;
    async fn delete(&self, id: ObjectId) -> RepoResult<Option<Food>>;
    async fn delete_by_category(&self, category: ObjectId) -> RepoResult<u64>;
}

#[async_trait]
pub trait CategoryStore: Send + Sync {
    async fn find_all(&self) -> RepoResult<Vec<Category>>;
    async fn find_by_id(&self, id: ObjectId) -> RepoResult<Option<Category>>;
    async fn find_by_name(&self, name: &str) -> RepoResult<Option<Category>>;
    async fn insert(&self, category: &Category) -> RepoResult<()>;
    async fn rename(&self, id: ObjectId, name: &str) -> RepoResult<Option<Category>>;
    /// Atomic `foodnumber += delta`.
    async fn adjust_food_count(&self, id: ObjectId, delta: i64) -> RepoResult<Option<Category>>;
    async fn delete(&self, id: ObjectId) -> RepoResult<Option<Category>>;
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_all(&self) -> RepoResult<Vec<User>>;
    async fn find_by_id(&self, id: ObjectId) -> RepoResult<Option<User>>;
    async fn find_by_username(&self, username: &str) -> RepoResult<Option<User>>;
    async fn insert(&self, user: &User) -> RepoResult<()>;
    async fn delete(&self, id: ObjectId) -> RepoResult<Option<User>>;
}

/// `findOneAndUpdate` options returning the document after the update.
pub(crate) fn return_updated() -> mongodb::options::FindOneAndUpdateOptions {
    mongodb::options::FindOneAndUpdateOptions::builder()
        .return_document(mongodb::options::ReturnDocument::After)
        .build()
}

/// `findOneAndUpdate` options returning the document as it was matched.
pub(crate) fn return_previous() -> mongodb::options::FindOneAndUpdateOptions {
    mongodb::options::FindOneAndUpdateOptions::builder()
        .return_document(mongodb::options::ReturnDocument::Before)
        .build()
}

/// Declares a unique index on `keys`.
pub(crate) fn unique_index(keys: mongodb::bson::Document) -> mongodb::IndexModel {
    mongodb::IndexModel::builder()
        .keys(keys)
        .options(mongodb::options::IndexOptions::builder().unique(true).build())
        .build()
}
