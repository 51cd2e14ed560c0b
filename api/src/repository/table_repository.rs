// src/repository/table_repository.rs
use async_trait::async_trait;
use futures::stream::TryStreamExt;
use mongodb::bson::oid::ObjectId;
use mongodb::bson::{doc, Bson, Document};
use mongodb::{Client, Collection};

use super::{return_updated, unique_index, RepoResult, TableStore};
use crate::models::table::{Table, TableStatus};

#[derive(Clone)]
pub struct TableRepository {
    collection: Collection<Table>,
}

impl TableRepository {
    pub fn new(client: &Client, database: &str) -> Self {
        let db = client.database(database);
        let collection = db.collection::<Table>("tables");
        TableRepository { collection }
    }

    pub async fn ensure_indexes(&self) -> RepoResult<()> {
        self.collection
            .create_index(unique_index(doc! { "tablename": 1 }), None)
            .await?;
        Ok(())
    }

    async fn set_occupancy(
        &self,
        filter: Document,
        status: TableStatus,
        bill: Option<ObjectId>,
    ) -> RepoResult<Option<Table>> {
        let bill = bill.map(Bson::ObjectId).unwrap_or(Bson::Null);
        let update = doc! { "$set": { "status": i32::from(status), "bill": bill } };
        let table = self
            .collection
            .find_one_and_update(filter, update, return_updated())
            .await?;
        Ok(table)
    }
}

#[async_trait]
impl TableStore for TableRepository {
    async fn find_all(&self) -> RepoResult<Vec<Table>> {
        let cursor = self.collection.find(None, None).await?;
        let tables = cursor.try_collect().await?;
        Ok(tables)
    }

    async fn find_by_id(&self, id: ObjectId) -> RepoResult<Option<Table>> {
        let table = self.collection.find_one(doc! { "_id": id }, None).await?;
        Ok(table)
    }

    async fn find_by_name(&self, tablename: &str) -> RepoResult<Option<Table>> {
        let table = self
            .collection
            .find_one(doc! { "tablename": tablename }, None)
            .await?;
        Ok(table)
    }

    async fn insert(&self, table: &Table) -> RepoResult<()> {
        self.collection.insert_one(table, None).await?;
        Ok(())
    }

    async fn update_details(
        &self,
        id: ObjectId,
        tablename: Option<String>,
        note: Option<String>,
    ) -> RepoResult<Option<Table>> {
        let mut set = Document::new();
        if let Some(tablename) = tablename {
            set.insert("tablename", tablename);
        }
        if let Some(note) = note {
            set.insert("note", note);
        }
        if set.is_empty() {
            return self.find_by_id(id).await;
        }

        let table = self
            .collection
            .find_one_and_update(doc! { "_id": id }, doc! { "$set": set }, return_updated())
            .await?;
        Ok(table)
    }

    async fn occupy_if_free(&self, id: ObjectId, bill: ObjectId) -> RepoResult<Option<Table>> {
        let filter = doc! { "_id": id, "status": i32::from(TableStatus::Free) };
        self.set_occupancy(filter, TableStatus::Occupied, Some(bill)).await
    }

    async fn occupy(&self, id: ObjectId, bill: ObjectId) -> RepoResult<Option<Table>> {
        self.set_occupancy(doc! { "_id": id }, TableStatus::Occupied, Some(bill))
            .await
    }

    async fn release(&self, id: ObjectId) -> RepoResult<Option<Table>> {
        self.set_occupancy(doc! { "_id": id }, TableStatus::Free, None)
            .await
    }

    async fn delete(&self, id: ObjectId) -> RepoResult<Option<Table>> {
        let table = self
            .collection
            .find_one_and_delete(doc! { "_id": id }, None)
            .await?;
        Ok(table)
    }
}
