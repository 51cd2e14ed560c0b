use rocket::serde::json::Json;
use rocket::{Route, State};

use crate::models::parse_id;
use crate::models::user::{SignupRequest, UserResponse};
use crate::response::ApiResponse;
use crate::services::staff;
use crate::state::AppState;

pub fn routes() -> Vec<Route> {
    routes![get_all_users, get_user, signup, delete_user]
}

#[get("/users")]
async fn get_all_users(state: &State<AppState>) -> ApiResponse {
    match staff::list_users(state).await {
        Ok(users) => {
            let users: Vec<UserResponse> = users.into_iter().map(Into::into).collect();
            ApiResponse::list("Get list user successfully", "users", &users)
        }
        Err(e) => ApiResponse::failed_list("Get list user failed", "users", &e),
    }
}

#[get("/users/<username>")]
async fn get_user(state: &State<AppState>, username: &str) -> ApiResponse {
    match staff::get_user(state, username).await {
        Ok(user) => ApiResponse::ok("Get user successfully", "user", &UserResponse::from(user)),
        Err(e) => ApiResponse::failed("Get user failed", "user", &e),
    }
}

#[post("/users/signup", data = "<new_user>")]
async fn signup(state: &State<AppState>, new_user: Json<SignupRequest>) -> ApiResponse {
    match staff::signup(state, new_user.into_inner()).await {
        Ok(user) => ApiResponse::created("Sign up successfully", "user", &UserResponse::from(user)),
        Err(e) => ApiResponse::failed("Sign up failed", "user", &e),
    }
}

#[delete("/users/<id>")]
async fn delete_user(state: &State<AppState>, id: &str) -> ApiResponse {
    let id = match parse_id(id, "user") {
        Ok(id) => id,
        Err(e) => return ApiResponse::failed("Delete user failed", "user", &e),
    };

    match staff::delete_user(state, id).await {
        Ok(user) => ApiResponse::ok("Delete user successfully", "user", &UserResponse::from(user)),
        Err(e) => ApiResponse::failed("Delete user failed", "user", &e),
    }
}
