use rocket::http::Status;
use rocket::{Request, Route};

use crate::fairings::all_options;
use crate::response::ApiResponse;

pub mod bill_infos;
pub mod bills;
pub mod categories;
pub mod foods;
pub mod tables;
pub mod users;

pub fn all() -> Vec<Route> {
    let mut all = routes![all_options];
    all.extend(tables::routes());
    all.extend(bills::routes());
    all.extend(bill_infos::routes());
    all.extend(categories::routes());
    all.extend(foods::routes());
    all.extend(users::routes());
    all
}

#[catch(400)]
fn bad_request(req: &Request) -> ApiResponse {
    ApiResponse::bare(
        Status::BadRequest,
        "Bad request",
        format!("Malformed request to {}", req.uri()),
    )
}

#[catch(404)]
fn not_found(req: &Request) -> ApiResponse {
    ApiResponse::bare(
        Status::NotFound,
        "Not found",
        format!("'{}' route not found", req.uri()),
    )
}

#[catch(422)]
fn unprocessable(req: &Request) -> ApiResponse {
    ApiResponse::bare(
        Status::UnprocessableEntity,
        "Invalid request body",
        format!("Body of {} could not be parsed", req.uri()),
    )
}

#[catch(500)]
fn internal_error(_req: &Request) -> ApiResponse {
    ApiResponse::bare(
        Status::InternalServerError,
        "Internal server error",
        "Unexpected server error",
    )
}

pub fn catchers() -> Vec<rocket::Catcher> {
    catchers![bad_request, not_found, unprocessable, internal_error]
}
