use async_trait::async_trait;
use futures::stream::TryStreamExt;
use mongodb::bson::doc;
use mongodb::bson::oid::ObjectId;
use mongodb::{Client, Collection};

use super::{return_updated, unique_index, CategoryStore, RepoResult};
use crate::models::category::Category;

#[derive(Clone)]
pub struct CategoryRepository {
    collection: Collection<Category>,
}

impl CategoryRepository {
    pub fn new(client: &Client, database: &str) -> Self {
        let db = client.database(database);
        let collection = db.collection::<Category>("categories");
        CategoryRepository { collection }
    }

    pub async fn ensure_indexes(&self) -> RepoResult<()> {
        self.collection
            .create_index(unique_index(doc! { "name": 1 }), None)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl CategoryStore for CategoryRepository {
    async fn find_all(&self) -> RepoResult<Vec<Category>> {
        let cursor = self.collection.find(None, None).await?;
        let categories = cursor.try_collect().await?;
        Ok(categories)
    }

    async fn find_by_id(&self, id: ObjectId) -> RepoResult<Option<Category>> {
        let category = self.collection.find_one(doc! { "_id": id }, None).await?;
        Ok(category)
    }

    async fn find_by_name(&self, name: &str) -> RepoResult<Option<Category>> {
        let category = self.collection.find_one(doc! { "name": name }, None).await?;
        Ok(category)
    }

    async fn insert(&self, category: &Category) -> RepoResult<()> {
        self.collection.insert_one(category, None).await?;
        Ok(())
    }

    async fn rename(&self, id: ObjectId, name: &str) -> RepoResult<Option<Category>> {
        let update = doc! { "$set": { "name": name } };
        let category = self
            .collection
            .find_one_and_update(doc! { "_id": id }, update, return_updated())
            .await?;
        Ok(category)
    }

    async fn adjust_food_count(&self, id: ObjectId, delta: i64) -> RepoResult<Option<Category>> {
        let update = doc! { "$inc": { "foodnumber": delta } };
        let category = self
            .collection
            .find_one_and_update(doc! { "_id": id }, update, return_updated())
            .await?;
        Ok(category)
    }

    async fn delete(&self, id: ObjectId) -> RepoResult<Option<Category>> {
        let category = self
            .collection
            .find_one_and_delete(doc! { "_id": id }, None)
            .await?;
        Ok(category)
    }
}
