use rocket::serde::json::Json;
use rocket::{Route, State};

use crate::error::AppError;
use crate::models::bill_info::{BillInfoResponse, CreateBillInfoRequest, UpdateBillInfoRequest};
use crate::models::parse_id;
use crate::response::ApiResponse;
use crate::services::ledger;
use crate::state::AppState;

pub fn routes() -> Vec<Route> {
    routes![
        get_all_bill_infos,
        get_bill_info,
        create_bill_info,
        change_bill_info,
        set_bill_info,
        delete_bill_info
    ]
}

#[get("/billinfo")]
async fn get_all_bill_infos(state: &State<AppState>) -> ApiResponse {
    match ledger::list_line_items(state).await {
        Ok(lines) => {
            let lines: Vec<BillInfoResponse> = lines.into_iter().map(Into::into).collect();
            ApiResponse::list("Get list bill info successfully", "billInfos", &lines)
        }
        Err(e) => ApiResponse::failed_list("Get list bill info failed", "billInfos", &e),
    }
}

#[get("/billinfo/<id>")]
async fn get_bill_info(state: &State<AppState>, id: &str) -> ApiResponse {
    let id = match parse_id(id, "bill info") {
        Ok(id) => id,
        Err(e) => return ApiResponse::failed("Get bill info failed", "billInfo", &e),
    };

    match ledger::get_line_item(state, id).await {
        Ok(line) => ApiResponse::ok("Get bill info successfully", "billInfo", &BillInfoResponse::from(line)),
        Err(e) => ApiResponse::failed("Get bill info failed", "billInfo", &e),
    }
}

#[post("/billinfo", data = "<new_line>")]
async fn create_bill_info(
    state: &State<AppState>,
    new_line: Json<CreateBillInfoRequest>,
) -> ApiResponse {
    let CreateBillInfoRequest { bill, food, quantity } = new_line.into_inner();
    let (Some(bill), Some(food), Some(quantity)) = (bill, food, quantity) else {
        let err = AppError::MissingField("bill, food and quantity are required".into());
        return ApiResponse::failed("Create bill info failed", "billInfo", &err);
    };
    let bill = match parse_id(&bill, "bill") {
        Ok(id) => id,
        Err(e) => return ApiResponse::failed("Create bill info failed", "billInfo", &e),
    };
    let food = match parse_id(&food, "food") {
        Ok(id) => id,
        Err(e) => return ApiResponse::failed("Create bill info failed", "billInfo", &e),
    };

    match ledger::add_or_increment(state, bill, food, quantity).await {
        Ok(change) if change.created => ApiResponse::created(
            "Create bill info successfully",
            "billInfo",
            &BillInfoResponse::from(change.line),
        ),
        Ok(change) => ApiResponse::ok(
            "Update bill info successfully",
            "billInfo",
            &BillInfoResponse::from(change.line),
        ),
        Err(e) => ApiResponse::failed("Create bill info failed", "billInfo", &e),
    }
}

/// Relative change: `quantity` units are added to the line, or removed when negative.
#[patch("/billinfo/<id>", data = "<changes>")]
async fn change_bill_info(
    state: &State<AppState>,
    id: &str,
    changes: Json<UpdateBillInfoRequest>,
) -> ApiResponse {
    let id = match parse_id(id, "bill info") {
        Ok(id) => id,
        Err(e) => return ApiResponse::failed("Update bill info failed", "billInfo", &e),
    };
    let UpdateBillInfoRequest { quantity, food } = changes.into_inner();
    let Some(delta) = quantity else {
        let err = AppError::Validation("Missing quantity".into());
        return ApiResponse::failed("Update bill info failed", "billInfo", &err);
    };

    match ledger::change_quantity(state, id, delta, food.as_deref()).await {
        Ok(line) => ApiResponse::ok("Update bill info successfully", "billInfo", &BillInfoResponse::from(line)),
        Err(e) => ApiResponse::failed("Update bill info failed", "billInfo", &e),
    }
}

/// Absolute change: the line ends up with exactly `quantity` units.
#[put("/billinfo/<id>", data = "<changes>")]
async fn set_bill_info(
    state: &State<AppState>,
    id: &str,
    changes: Json<UpdateBillInfoRequest>,
) -> ApiResponse {
    let id = match parse_id(id, "bill info") {
        Ok(id) => id,
        Err(e) => return ApiResponse::failed("Update bill info failed", "billInfo", &e),
    };
    let UpdateBillInfoRequest { quantity, food } = changes.into_inner();
    let Some(quantity) = quantity else {
        let err = AppError::Validation("Missing quantity".into());
        return ApiResponse::failed("Update bill info failed", "billInfo", &err);
    };

    match ledger::set_quantity(state, id, quantity, food.as_deref()).await {
        Ok(line) => ApiResponse::ok("Update bill info successfully", "billInfo", &BillInfoResponse::from(line)),
        Err(e) => ApiResponse::failed("Update bill info failed", "billInfo", &e),
    }
}

#[delete("/billinfo/<id>")]
async fn delete_bill_info(state: &State<AppState>, id: &str) -> ApiResponse {
    let id = match parse_id(id, "bill info") {
        Ok(id) => id,
        Err(e) => return ApiResponse::failed("Delete bill info failed", "billInfo", &e),
    };

    match ledger::remove_line_item(state, id).await {
        Ok(line) => ApiResponse::ok("Delete bill info successfully", "billInfo", &BillInfoResponse::from(line)),
        Err(e) => ApiResponse::failed("Delete bill info failed", "billInfo", &e),
    }
}
