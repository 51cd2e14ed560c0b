use async_trait::async_trait;
use futures::stream::TryStreamExt;
use mongodb::bson::oid::ObjectId;
use mongodb::bson::{doc, Document};
use mongodb::{Client, Collection};
use rust_decimal::prelude::ToPrimitive;

use super::{return_previous, return_updated, unique_index, FoodStore, RepoResult};
use crate::models::food::{Food, FoodPatch};

#[derive(Clone)]
pub struct FoodRepository {
    collection: Collection<Food>,
}

impl FoodRepository {
    pub fn new(client: &Client, database: &str) -> Self {
        let db = client.database(database);
        let collection = db.collection::<Food>("foods");
        FoodRepository { collection }
    }

    pub async fn ensure_indexes(&self) -> RepoResult<()> {
        self.collection
            .create_index(unique_index(doc! { "name": 1 }), None)
            .await?;
        Ok(())
    }
}

fn patch_document(patch: &FoodPatch) -> Document {
    let mut set = Document::new();
    if let Some(name) = &patch.name {
        set.insert("name", name.clone());
    }
    if let Some(price) = patch.price {
        set.insert("price", price.to_f64().unwrap_or_default());
    }
    if let Some(discount) = patch.discount {
        set.insert("discount", discount.to_f64().unwrap_or_default());
    }
    if let Some(description) = &patch.description {
        set.insert("description", description.clone());
    }
    if let Some(stock) = patch.so_luong_ton {
        set.insert("soLuongTon", stock);
    }
    if let Some(img_url) = &patch.img_url {
        set.insert("imgUrl", img_url.clone());
    }
    if let Some(status) = patch.status {
        set.insert("status", i32::from(status));
    }
    if let Some(category) = patch.category {
        set.insert("category", category);
    }
    set
}

#[async_trait]
impl FoodStore for FoodRepository {
    async fn find_all(&self) -> RepoResult<Vec<Food>> {
        let cursor = self.collection.find(None, None).await?;
        let foods = cursor.try_collect().await?;
        Ok(foods)
    }

    async fn find_by_id(&self, id: ObjectId) -> RepoResult<Option<Food>> {
        let food = self.collection.find_one(doc! { "_id": id }, None).await?;
        Ok(food)
    }

    async fn find_by_name(&self, name: &str) -> RepoResult<Option<Food>> {
        let food = self.collection.find_one(doc! { "name": name }, None).await?;
        Ok(food)
    }

    async fn insert(&self, food: &Food) -> RepoResult<()> {
        self.collection.insert_one(food, None).await?;
        Ok(())
    }

    async fn update(&self, id: ObjectId, patch: &FoodPatch) -> RepoResult<Option<Food>> {
        let set = patch_document(patch);
        if set.is_empty() {
            return self.find_by_id(id).await;
        }
        let food = self
            .collection
            .find_one_and_update(doc! { "_id": id }, doc! { "$set": set }, return_previous())
            .await?;
        Ok(food)
    }

    async fn adjust_stock(&self, id: ObjectId, delta: i64) -> RepoResult<Option<Food>> {
        let update = doc! { "$inc": { "soLuongTon": delta } };
        let food = self
            .collection
            .find_one_and_update(doc! { "_id": id }, update, return_updated())
            .await?;
        Ok(food)
    }

    async fn take_stock(&self, id: ObjectId, quantity: i64) -> RepoResult<Option<Food>> {
        let filter = doc! { "_id": id, "soLuongTon": { "$gte": quantity } };
        let update = doc! { "$inc": { "soLuongTon": -quantity } };
        let food = self
            .collection
            .find_one_and_update(filter, update, return_updated())
            .await?;
        Ok(food)
    }

    async fn delete(&self, id: ObjectId) -> RepoResult<Option<Food>> {
        let food = self
            .collection
            .find_one_and_delete(doc! { "_id": id }, None)
            .await?;
        Ok(food)
    }

    async fn delete_by_category(&self, category: ObjectId) -> RepoResult<u64> {
        let result = self
            .collection
            .delete_many(doc! { "category": category }, None)
            .await?;
        Ok(result.deleted_count)
    }
}
