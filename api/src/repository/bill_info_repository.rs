use async_trait::async_trait;
use futures::stream::TryStreamExt;
use mongodb::bson::doc;
use mongodb::bson::oid::ObjectId;
use mongodb::{Client, Collection};

use super::{return_updated, unique_index, BillInfoStore, RepoResult};
use crate::models::bill_info::BillInfo;

#[derive(Clone)]
pub struct BillInfoRepository {
    collection: Collection<BillInfo>,
}

impl BillInfoRepository {
    pub fn new(client: &Client, database: &str) -> Self {
        let db = client.database(database);
        let collection = db.collection::<BillInfo>("billinfos");
        BillInfoRepository { collection }
    }

    /// One line per (bill, food); concurrent creations race on this index, not on a read.
    pub async fn ensure_indexes(&self) -> RepoResult<()> {
        self.collection
            .create_index(unique_index(doc! { "bill": 1, "food": 1 }), None)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl BillInfoStore for BillInfoRepository {
    async fn find_all(&self) -> RepoResult<Vec<BillInfo>> {
        let cursor = self.collection.find(None, None).await?;
        let infos = cursor.try_collect().await?;
        Ok(infos)
    }

    async fn find_by_id(&self, id: ObjectId) -> RepoResult<Option<BillInfo>> {
        let info = self.collection.find_one(doc! { "_id": id }, None).await?;
        Ok(info)
    }

    async fn find_by_bill(&self, bill: ObjectId) -> RepoResult<Vec<BillInfo>> {
        let cursor = self.collection.find(doc! { "bill": bill }, None).await?;
        let infos = cursor.try_collect().await?;
        Ok(infos)
    }

    async fn find_by_bill_and_food(
        &self,
        bill: ObjectId,
        food: ObjectId,
    ) -> RepoResult<Option<BillInfo>> {
        let info = self
            .collection
            .find_one(doc! { "bill": bill, "food": food }, None)
            .await?;
        Ok(info)
    }

    async fn insert(&self, info: &BillInfo) -> RepoResult<()> {
        self.collection.insert_one(info, None).await?;
        Ok(())
    }

    async fn increment_quantity(&self, id: ObjectId, delta: i64) -> RepoResult<Option<BillInfo>> {
        let filter = doc! { "_id": id, "quantity": { "$gt": -delta } };
        let update = doc! { "$inc": { "quantity": delta } };
        let info = self
            .collection
            .find_one_and_update(filter, update, return_updated())
            .await?;
        Ok(info)
    }

    async fn set_quantity(&self, id: ObjectId, quantity: i64) -> RepoResult<Option<BillInfo>> {
        let update = doc! { "$set": { "quantity": quantity } };
        let info = self
            .collection
            .find_one_and_update(doc! { "_id": id }, update, return_updated())
            .await?;
        Ok(info)
    }

    async fn delete(&self, id: ObjectId) -> RepoResult<Option<BillInfo>> {
        let info = self
            .collection
            .find_one_and_delete(doc! { "_id": id }, None)
            .await?;
        Ok(info)
    }

    async fn delete_by_bill(&self, bill: ObjectId) -> RepoResult<u64> {
        let result = self.collection.delete_many(doc! { "bill": bill }, None).await?;
        Ok(result.deleted_count)
    }
}
