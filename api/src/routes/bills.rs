use rocket::serde::json::Json;
use rocket::{Route, State};
use serde_json::{Map, Value};

use crate::models::bill::{BillResponse, BillWithItemsResponse, CreateBillRequest, UpdateBillRequest};
use crate::models::bill_info::BillInfoResponse;
use crate::models::parse_id;
use crate::response::ApiResponse;
use crate::services::{ledger, seating};
use crate::state::AppState;

pub fn routes() -> Vec<Route> {
    routes![
        get_all_bills,
        get_bill,
        get_bill_items,
        create_bill,
        update_bill,
        delete_bill
    ]
}

#[get("/bills")]
async fn get_all_bills(state: &State<AppState>) -> ApiResponse {
    match ledger::list_bills(state).await {
        Ok(bills) => {
            let bills: Vec<BillResponse> = bills.into_iter().map(Into::into).collect();
            ApiResponse::list("Get list bill successfully", "bills", &bills)
        }
        Err(e) => ApiResponse::failed_list("Get list bill failed", "bills", &e),
    }
}

#[get("/bills/<id>")]
async fn get_bill(state: &State<AppState>, id: &str) -> ApiResponse {
    let id = match parse_id(id, "bill") {
        Ok(id) => id,
        Err(e) => return ApiResponse::failed("Get bill failed", "bill", &e),
    };

    match ledger::get_bill(state, id).await {
        Ok(bill) => ApiResponse::ok("Get bill successfully", "bill", &BillResponse::from(bill)),
        Err(e) => ApiResponse::failed("Get bill failed", "bill", &e),
    }
}

#[get("/bills/<id>/billinfo")]
async fn get_bill_items(state: &State<AppState>, id: &str) -> ApiResponse {
    let id = match parse_id(id, "bill") {
        Ok(id) => id,
        Err(e) => return ApiResponse::failed_list("Get bill items failed", "billInfos", &e),
    };

    match ledger::bill_items(state, id).await {
        Ok(lines) => {
            let lines: Vec<BillInfoResponse> = lines.into_iter().map(Into::into).collect();
            ApiResponse::list("Get bill items successfully", "billInfos", &lines)
        }
        Err(e) => ApiResponse::failed_list("Get bill items failed", "billInfos", &e),
    }
}

#[post("/bills", data = "<new_bill>")]
async fn create_bill(state: &State<AppState>, new_bill: Json<CreateBillRequest>) -> ApiResponse {
    match seating::open_bill(state, new_bill.into_inner()).await {
        Ok(bill) => ApiResponse::created("Create bill successfully", "bill", &BillResponse::from(bill)),
        Err(e) => ApiResponse::failed("Create bill failed", "bill", &e),
    }
}

#[patch("/bills/<id>", data = "<changes>")]
async fn update_bill(
    state: &State<AppState>,
    id: &str,
    changes: Json<Map<String, Value>>,
) -> ApiResponse {
    let id = match parse_id(id, "bill") {
        Ok(id) => id,
        Err(e) => return ApiResponse::failed("Update bill failed", "bill", &e),
    };
    let request = match UpdateBillRequest::from_body(changes.into_inner()) {
        Ok(request) => request,
        Err(e) => return ApiResponse::failed("Update bill failed", "bill", &e),
    };

    match ledger::update_bill(state, id, request).await {
        Ok(update) => match update.lines {
            Some(lines) => {
                let saved = BillWithItemsResponse {
                    bill: update.bill.into(),
                    billinfos: lines.into_iter().map(Into::into).collect(),
                };
                ApiResponse::ok("Save bill successfully", "bill", &saved)
            }
            None => ApiResponse::ok("Update bill successfully", "bill", &BillResponse::from(update.bill)),
        },
        Err(e) => ApiResponse::failed("Update bill failed", "bill", &e),
    }
}

#[delete("/bills/<id>")]
async fn delete_bill(state: &State<AppState>, id: &str) -> ApiResponse {
    let id = match parse_id(id, "bill") {
        Ok(id) => id,
        Err(e) => return ApiResponse::failed("Delete bill failed", "bill", &e),
    };

    match ledger::delete_bill(state, id).await {
        Ok(bill) => ApiResponse::ok("Delete bill successfully", "bill", &BillResponse::from(bill)),
        Err(e) => ApiResponse::failed("Delete bill failed", "bill", &e),
    }
}
