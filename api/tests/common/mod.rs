//! Test conventions:
//! - Every test builds its own `AppState` over the in-memory store.
//! - Fixtures are seeded through the service layer so the counters they maintain
//!   (`foodnumber`, stock) start consistent.
//! - MongoDB is only touched by `mongo_repository.rs`, and only when `MONGO_URI` is set.
#![allow(dead_code)]

use mongodb::bson::oid::ObjectId;
use pos_backend::build_rocket;
use pos_backend::config::StockPolicy;
use pos_backend::models::category::{Category, CategoryRequest};
use pos_backend::models::food::{CreateFoodRequest, Food};
use pos_backend::models::table::{CreateTableRequest, Table};
use pos_backend::models::user::{SignupRequest, User};
use pos_backend::services::{catalog, seating, staff};
use pos_backend::state::AppState;
use rocket::local::asynchronous::Client;
use rust_decimal::Decimal;

pub struct TestFixtures {
    pub table: Table,
    pub seller: User,
    pub category: Category,
    /// 10 in stock, 45 000 each.
    pub pho: Food,
}

pub fn memory_state() -> AppState {
    AppState::in_memory(StockPolicy::default())
}

pub fn memory_state_restoring_stock() -> AppState {
    AppState::in_memory(StockPolicy {
        restore_stock_on_remove: true,
    })
}

pub async fn seed_table(state: &AppState, name: &str) -> Table {
    seating::create_table(
        state,
        CreateTableRequest {
            tablename: Some(name.into()),
            note: None,
        },
    )
    .await
    .expect("seed table")
}

pub async fn seed_category(state: &AppState, name: &str) -> Category {
    catalog::create_category(
        state,
        CategoryRequest {
            name: Some(name.into()),
        },
    )
    .await
    .expect("seed category")
}

pub async fn seed_food(state: &AppState, category: &Category, name: &str, price: i64, stock: i64) -> Food {
    let (food, _) = catalog::create_food(
        state,
        CreateFoodRequest {
            name: Some(name.into()),
            price: Some(Decimal::new(price, 0)),
            so_luong_ton: Some(stock),
            category: Some(category.id.to_hex()),
            ..CreateFoodRequest::default()
        },
    )
    .await
    .expect("seed food");
    food
}

pub async fn seed_seller(state: &AppState, username: &str) -> User {
    staff::signup(
        state,
        SignupRequest {
            username: Some(username.into()),
            password: Some("thu-ngan-1".into()),
            ..SignupRequest::default()
        },
    )
    .await
    .expect("seed seller")
}

pub async fn seed_basic_fixtures(state: &AppState) -> TestFixtures {
    let table = seed_table(state, "Ban 1").await;
    let seller = seed_seller(state, "thungan").await;
    let category = seed_category(state, "Mon chinh").await;
    let pho = seed_food(state, &category, "Pho", 45_000, 10).await;
    TestFixtures {
        table,
        seller,
        category,
        pho,
    }
}

pub async fn stock_of(state: &AppState, food: ObjectId) -> i64 {
    state
        .foods
        .find_by_id(food)
        .await
        .expect("read food")
        .expect("food exists")
        .so_luong_ton
}

pub async fn foodnumber_of(state: &AppState, category: ObjectId) -> i64 {
    state
        .categories
        .find_by_id(category)
        .await
        .expect("read category")
        .expect("category exists")
        .foodnumber
}

pub async fn setup_client(state: &AppState) -> Client {
    Client::tracked(build_rocket(state.clone()))
        .await
        .expect("valid rocket instance")
}
