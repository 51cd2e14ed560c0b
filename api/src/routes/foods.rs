use rocket::serde::json::Json;
use rocket::{Route, State};
use serde_json::{Map, Value};

use crate::models::food::{CreateFoodRequest, FoodPatch, FoodResponse};
use crate::models::parse_id;
use crate::response::ApiResponse;
use crate::services::catalog;
use crate::state::AppState;

pub fn routes() -> Vec<Route> {
    routes![get_all_foods, get_food, create_food, update_food, delete_food]
}

#[get("/foods")]
async fn get_all_foods(state: &State<AppState>) -> ApiResponse {
    match catalog::list_foods(state).await {
        Ok(foods) => {
            let foods: Vec<FoodResponse> = foods
                .into_iter()
                .map(|(food, category)| FoodResponse::new(food, category))
                .collect();
            ApiResponse::list("Get list food successfully", "foods", &foods)
        }
        Err(e) => ApiResponse::failed_list("Get list food failed", "foods", &e),
    }
}

#[get("/foods/<id>")]
async fn get_food(state: &State<AppState>, id: &str) -> ApiResponse {
    let id = match parse_id(id, "food") {
        Ok(id) => id,
        Err(e) => return ApiResponse::failed("Get food failed", "food", &e),
    };

    match catalog::get_food(state, id).await {
        Ok((food, category)) => {
            ApiResponse::ok("Get food successfully", "food", &FoodResponse::new(food, category))
        }
        Err(e) => ApiResponse::failed("Get food failed", "food", &e),
    }
}

#[post("/foods", data = "<new_food>")]
async fn create_food(state: &State<AppState>, new_food: Json<CreateFoodRequest>) -> ApiResponse {
    match catalog::create_food(state, new_food.into_inner()).await {
        Ok((food, category)) => ApiResponse::created(
            "Create food successfully",
            "food",
            &FoodResponse::new(food, Some(category)),
        ),
        Err(e) => ApiResponse::failed("Create food failed", "food", &e),
    }
}

#[patch("/foods/<id>", data = "<changes>")]
async fn update_food(
    state: &State<AppState>,
    id: &str,
    changes: Json<Map<String, Value>>,
) -> ApiResponse {
    let id = match parse_id(id, "food") {
        Ok(id) => id,
        Err(e) => return ApiResponse::failed("Update food failed", "food", &e),
    };
    let patch = match FoodPatch::from_body(changes.into_inner()) {
        Ok(patch) => patch,
        Err(e) => return ApiResponse::failed("Update food failed", "food", &e),
    };

    match catalog::update_food(state, id, patch).await {
        Ok((food, category)) => {
            ApiResponse::ok("Update food successfully", "food", &FoodResponse::new(food, category))
        }
        Err(e) => ApiResponse::failed("Update food failed", "food", &e),
    }
}

#[delete("/foods/<id>")]
async fn delete_food(state: &State<AppState>, id: &str) -> ApiResponse {
    let id = match parse_id(id, "food") {
        Ok(id) => id,
        Err(e) => return ApiResponse::failed("Delete food failed", "food", &e),
    };

    match catalog::delete_food(state, id).await {
        Ok(food) => ApiResponse::ok("Delete food successfully", "food", &FoodResponse::new(food, None)),
        Err(e) => ApiResponse::failed("Delete food failed", "food", &e),
    }
}
