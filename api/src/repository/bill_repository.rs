use async_trait::async_trait;
use futures::stream::TryStreamExt;
use mongodb::bson::oid::ObjectId;
use mongodb::bson::{doc, Document};
use mongodb::{Client, Collection};
use rust_decimal::prelude::ToPrimitive;

use super::{return_updated, BillStore, RepoResult};
use crate::models::bill::{Bill, BillPatch};

#[derive(Clone)]
pub struct BillRepository {
    collection: Collection<Bill>,
}

impl BillRepository {
    pub fn new(client: &Client, database: &str) -> Self {
        let db = client.database(database);
        let collection = db.collection::<Bill>("bills");
        BillRepository { collection }
    }
}

fn patch_document(patch: &BillPatch) -> Document {
    let mut set = Document::new();
    if let Some(time_checkout) = patch.time_checkout {
        set.insert("timeCheckout", time_checkout);
    }
    if let Some(note) = &patch.note {
        set.insert("note", note.clone());
    }
    if let Some(tips) = patch.tips {
        set.insert("tips", tips.to_f64().unwrap_or_default());
    }
    if let Some(status) = patch.status {
        set.insert("status", i32::from(status));
    }
    set
}

#[async_trait]
impl BillStore for BillRepository {
    async fn find_all(&self) -> RepoResult<Vec<Bill>> {
        let cursor = self.collection.find(None, None).await?;
        let bills = cursor.try_collect().await?;
        Ok(bills)
    }

    async fn find_by_id(&self, id: ObjectId) -> RepoResult<Option<Bill>> {
        let bill = self.collection.find_one(doc! { "_id": id }, None).await?;
        Ok(bill)
    }

    async fn insert(&self, bill: &Bill) -> RepoResult<()> {
        self.collection.insert_one(bill, None).await?;
        Ok(())
    }

    async fn update(&self, id: ObjectId, patch: &BillPatch) -> RepoResult<Option<Bill>> {
        let set = patch_document(patch);
        if set.is_empty() {
            return self.find_by_id(id).await;
        }
        let bill = self
            .collection
            .find_one_and_update(doc! { "_id": id }, doc! { "$set": set }, return_updated())
            .await?;
        Ok(bill)
    }

    async fn delete(&self, id: ObjectId) -> RepoResult<Option<Bill>> {
        let bill = self
            .collection
            .find_one_and_delete(doc! { "_id": id }, None)
            .await?;
        Ok(bill)
    }
}
