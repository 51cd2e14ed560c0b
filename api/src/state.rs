use std::sync::Arc;

use mongodb::Client;

use crate::config::{Config, StockPolicy, StorageBackend};
use crate::error::{AppError, AppResult};
use crate::repository::{
    BillInfoRepository, BillInfoStore, BillRepository, BillStore, CategoryRepository,
    CategoryStore, FoodRepository, FoodStore, MemoryStore, TableRepository, TableStore,
    UserRepository, UserStore,
};

/// Handles to every store plus the inventory policy, managed by Rocket.
#[derive(Clone)]
pub struct AppState {
    pub tables: Arc<dyn TableStore>,
    pub bills: Arc<dyn BillStore>,
    pub bill_infos: Arc<dyn BillInfoStore>,
    pub foods: Arc<dyn FoodStore>,
    pub categories: Arc<dyn CategoryStore>,
    pub users: Arc<dyn UserStore>,
    pub policy: StockPolicy,
}

impl AppState {
    pub async fn from_config(config: &Config) -> AppResult<Self> {
        match config.storage {
            StorageBackend::Mongo => Self::connect(config).await,
            StorageBackend::Memory => {
                tracing::warn!("using the in-memory store, data is lost on exit");
                Ok(Self::in_memory(config.stock_policy()))
            }
        }
    }

    /// Connects to MongoDB and makes sure the unique indexes exist.
    pub async fn connect(config: &Config) -> AppResult<Self> {
        let client = Client::with_uri_str(&config.mongo_uri)
            .await
            .map_err(|e| AppError::Internal(format!("MongoDB connection failed: {}", e)))?;
        let db = config.database_name.as_str();

        let tables = TableRepository::new(&client, db);
        let bills = BillRepository::new(&client, db);
        let bill_infos = BillInfoRepository::new(&client, db);
        let foods = FoodRepository::new(&client, db);
        let categories = CategoryRepository::new(&client, db);
        let users = UserRepository::new(&client, db);

        tables.ensure_indexes().await?;
        bill_infos.ensure_indexes().await?;
        foods.ensure_indexes().await?;
        categories.ensure_indexes().await?;
        users.ensure_indexes().await?;
        tracing::info!(database = db, "connected to MongoDB");

        Ok(AppState {
            tables: Arc::new(tables),
            bills: Arc::new(bills),
            bill_infos: Arc::new(bill_infos),
            foods: Arc::new(foods),
            categories: Arc::new(categories),
            users: Arc::new(users),
            policy: config.stock_policy(),
        })
    }

    pub fn in_memory(policy: StockPolicy) -> Self {
        let store = Arc::new(MemoryStore::new());
        AppState {
            tables: store.clone(),
            bills: store.clone(),
            bill_infos: store.clone(),
            foods: store.clone(),
            categories: store.clone(),
            users: store,
            policy,
        }
    }
}
