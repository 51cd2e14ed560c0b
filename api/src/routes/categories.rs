use rocket::serde::json::Json;
use rocket::{Route, State};

use crate::models::category::{CategoryRequest, CategoryResponse};
use crate::models::parse_id;
use crate::response::ApiResponse;
use crate::services::catalog;
use crate::state::AppState;

pub fn routes() -> Vec<Route> {
    routes![
        get_all_categories,
        get_category,
        create_category,
        update_category,
        delete_category
    ]
}

#[get("/categories")]
async fn get_all_categories(state: &State<AppState>) -> ApiResponse {
    match catalog::list_categories(state).await {
        Ok(categories) => {
            let categories: Vec<CategoryResponse> =
                categories.into_iter().map(Into::into).collect();
            ApiResponse::list("Get list category successfully", "categories", &categories)
        }
        Err(e) => ApiResponse::failed_list("Get list category failed", "categories", &e),
    }
}

#[get("/categories/<id>")]
async fn get_category(state: &State<AppState>, id: &str) -> ApiResponse {
    let id = match parse_id(id, "category") {
        Ok(id) => id,
        Err(e) => return ApiResponse::failed("Get category failed", "category", &e),
    };

    match catalog::get_category(state, id).await {
        Ok(category) => {
            ApiResponse::ok("Get category successfully", "category", &CategoryResponse::from(category))
        }
        Err(e) => ApiResponse::failed("Get category failed", "category", &e),
    }
}

#[post("/categories", data = "<new_category>")]
async fn create_category(
    state: &State<AppState>,
    new_category: Json<CategoryRequest>,
) -> ApiResponse {
    match catalog::create_category(state, new_category.into_inner()).await {
        Ok(category) => ApiResponse::created(
            "Create category successfully",
            "category",
            &CategoryResponse::from(category),
        ),
        Err(e) => ApiResponse::failed("Create category failed", "category", &e),
    }
}

#[patch("/categories/<id>", data = "<changes>")]
async fn update_category(
    state: &State<AppState>,
    id: &str,
    changes: Json<CategoryRequest>,
) -> ApiResponse {
    let id = match parse_id(id, "category") {
        Ok(id) => id,
        Err(e) => return ApiResponse::failed("Update category failed", "category", &e),
    };

    match catalog::rename_category(state, id, changes.into_inner()).await {
        Ok(category) => ApiResponse::ok(
            "Update category successfully",
            "category",
            &CategoryResponse::from(category),
        ),
        Err(e) => ApiResponse::failed("Update category failed", "category", &e),
    }
}

#[delete("/categories/<id>")]
async fn delete_category(state: &State<AppState>, id: &str) -> ApiResponse {
    let id = match parse_id(id, "category") {
        Ok(id) => id,
        Err(e) => return ApiResponse::failed("Delete category failed", "category", &e),
    };

    match catalog::delete_category(state, id).await {
        Ok(category) => ApiResponse::ok(
            "Delete category successfully",
            "category",
            &CategoryResponse::from(category),
        ),
        Err(e) => ApiResponse::failed("Delete category failed", "category", &e),
    }
}
