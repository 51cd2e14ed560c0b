use rocket::serde::json::Json;
use rocket::{Route, State};

use crate::models::parse_id;
use crate::models::table::{
    CreateTableRequest, TableResponse, TransferTableRequest, UpdateTableRequest,
};
use crate::response::ApiResponse;
use crate::services::seating;
use crate::state::AppState;

pub fn routes() -> Vec<Route> {
    routes![
        get_all_tables,
        get_table,
        create_table,
        update_table,
        transfer_table,
        delete_table
    ]
}

#[get("/tables")]
async fn get_all_tables(state: &State<AppState>) -> ApiResponse {
    match seating::list_tables(state).await {
        Ok(tables) => {
            let tables: Vec<TableResponse> = tables.into_iter().map(Into::into).collect();
            ApiResponse::list("Get list table successfully", "tables", &tables)
        }
        Err(e) => ApiResponse::failed_list("Get list table failed", "tables", &e),
    }
}

#[get("/tables/<id>")]
async fn get_table(state: &State<AppState>, id: &str) -> ApiResponse {
    let id = match parse_id(id, "table") {
        Ok(id) => id,
        Err(e) => return ApiResponse::failed("Get table failed", "table", &e),
    };

    match seating::get_table(state, id).await {
        Ok(table) => ApiResponse::ok("Get table successfully", "table", &TableResponse::from(table)),
        Err(e) => ApiResponse::failed("Get table failed", "table", &e),
    }
}

#[post("/tables", data = "<new_table>")]
async fn create_table(state: &State<AppState>, new_table: Json<CreateTableRequest>) -> ApiResponse {
    match seating::create_table(state, new_table.into_inner()).await {
        Ok(table) => {
            ApiResponse::created("Create table successfully", "table", &TableResponse::from(table))
        }
        Err(e) => ApiResponse::failed("Create table failed", "table", &e),
    }
}

#[patch("/tables/<id>", data = "<changes>")]
async fn update_table(
    state: &State<AppState>,
    id: &str,
    changes: Json<UpdateTableRequest>,
) -> ApiResponse {
    let id = match parse_id(id, "table") {
        Ok(id) => id,
        Err(e) => return ApiResponse::failed("Update table failed", "table", &e),
    };

    match seating::update_table(state, id, changes.into_inner()).await {
        Ok(table) => ApiResponse::ok("Update table successfully", "table", &TableResponse::from(table)),
        Err(e) => ApiResponse::failed("Update table failed", "table", &e),
    }
}

#[put("/tables/chuyenban", data = "<transfer>")]
async fn transfer_table(
    state: &State<AppState>,
    transfer: Json<TransferTableRequest>,
) -> ApiResponse {
    match seating::transfer_table(state, transfer.into_inner()).await {
        Ok((source, target)) => {
            let tables = [TableResponse::from(source), TableResponse::from(target)];
            ApiResponse::list("Transfer table successfully", "tables", &tables)
        }
        Err(e) => ApiResponse::failed("Transfer table failed", "table", &e),
    }
}

#[delete("/tables/<id>")]
async fn delete_table(state: &State<AppState>, id: &str) -> ApiResponse {
    let id = match parse_id(id, "table") {
        Ok(id) => id,
        Err(e) => return ApiResponse::failed("Delete table failed", "table", &e),
    };

    match seating::delete_table(state, id).await {
        Ok(table) => ApiResponse::ok("Delete table successfully", "table", &TableResponse::from(table)),
        Err(e) => ApiResponse::failed("Delete table failed", "table", &e),
    }
}
