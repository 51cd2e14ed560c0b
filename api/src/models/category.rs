use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Category {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub name: String,
    /// Number of foods referencing this category, maintained incrementally.
    #[serde(default)]
    pub foodnumber: i64,
}

impl Category {
    pub fn new(name: String) -> Self {
        Category {
            id: ObjectId::new(),
            name,
            foodnumber: 0,
        }
    }
}

#[derive(Deserialize, Debug, Default)]
pub struct CategoryRequest {
    pub name: Option<String>,
}

#[derive(Serialize, Debug, Clone)]
pub struct CategoryResponse {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub foodnumber: i64,
}

impl From<Category> for CategoryResponse {
    fn from(category: Category) -> Self {
        CategoryResponse {
            id: category.id.to_hex(),
            name: category.name,
            foodnumber: category.foodnumber,
        }
    }
}
