// src/repository/user_repository.rs
use async_trait::async_trait;
use futures::stream::TryStreamExt;
use mongodb::bson::doc;
use mongodb::bson::oid::ObjectId;
use mongodb::{Client, Collection};

use super::{unique_index, RepoResult, UserStore};
use crate::models::user::User;

#[derive(Clone)]
pub struct UserRepository {
    collection: Collection<User>,
}

impl UserRepository {
    pub fn new(client: &Client, database: &str) -> Self {
        let db = client.database(database);
        let collection = db.collection::<User>("users");
        UserRepository { collection }
    }

    pub async fn ensure_indexes(&self) -> RepoResult<()> {
        self.collection
            .create_index(unique_index(doc! { "username": 1 }), None)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl UserStore for UserRepository {
    async fn find_all(&self) -> RepoResult<Vec<User>> {
        let cursor = self.collection.find(None, None).await?;
        let users = cursor.try_collect().await?;
        Ok(users)
    }

    async fn find_by_id(&self, id: ObjectId) -> RepoResult<Option<User>> {
        let user = self.collection.find_one(doc! { "_id": id }, None).await?;
        Ok(user)
    }

    async fn find_by_username(&self, username: &str) -> RepoResult<Option<User>> {
        let user = self
            .collection
            .find_one(doc! { "username": username }, None)
            .await?;
        Ok(user)
    }

    async fn insert(&self, user: &User) -> RepoResult<()> {
        self.collection.insert_one(user, None).await?;
        Ok(())
    }

    async fn delete(&self, id: ObjectId) -> RepoResult<Option<User>> {
        let user = self
            .collection
            .find_one_and_delete(doc! { "_id": id }, None)
            .await?;
        Ok(user)
    }
}
