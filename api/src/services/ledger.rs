//! Bills, line items and the stock movements they cause.
//!
//! Stock is taken before a line item is written and given back after it is
//! reduced. Only a single-unit addition is gated on the stock on hand; larger
//! additions and the full-bill save may drive it negative.

use mongodb::bson::oid::ObjectId;

use crate::error::{AppError, AppResult};
use crate::models::bill::{Bill, BillPatch, BillStatus, DesiredLineItem, UpdateBillRequest};
use crate::models::bill_info::BillInfo;
use crate::models::food::Food;
use crate::models::{parse_id, require_id};
use crate::repository::RepoError;
use crate::state::AppState;

pub async fn list_bills(state: &AppState) -> AppResult<Vec<Bill>> {
    Ok(state.bills.find_all().await?)
}

pub async fn get_bill(state: &AppState, id: ObjectId) -> AppResult<Bill> {
    state
        .bills
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Bill {} not found", id)))
}

pub async fn bill_items(state: &AppState, id: ObjectId) -> AppResult<Vec<BillInfo>> {
    get_bill(state, id).await?;
    Ok(state.bill_infos.find_by_bill(id).await?)
}

pub async fn list_line_items(state: &AppState) -> AppResult<Vec<BillInfo>> {
    Ok(state.bill_infos.find_all().await?)
}

pub async fn get_line_item(state: &AppState, id: ObjectId) -> AppResult<BillInfo> {
    state
        .bill_infos
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Line item {} not found", id)))
}

async fn get_food(state: &AppState, id: ObjectId) -> AppResult<Food> {
    state
        .foods
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Food {} not found", id)))
}

/// Takes `quantity` units of a food. A single unit is refused when none is left.
async fn take_stock(state: &AppState, food: ObjectId, quantity: i64) -> AppResult<Food> {
    if quantity == 1 {
        return match state.foods.take_stock(food, 1).await? {
            Some(food) => Ok(food),
            None => match state.foods.find_by_id(food).await? {
                Some(food) => Err(AppError::InsufficientStock(format!(
                    "{} is out of stock",
                    food.name
                ))),
                None => Err(AppError::NotFound(format!("Food {} not found", food))),
            },
        };
    }

    state
        .foods
        .adjust_stock(food, -quantity)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Food {} not found", food)))
}

/// Best effort return of stock for a write that did not go through.
async fn give_back(state: &AppState, food: ObjectId, quantity: i64) -> AppResult<()> {
    match state.foods.adjust_stock(food, quantity).await {
        Ok(_) => Ok(()),
        Err(e) => {
            tracing::error!(food = %food, quantity, error = %e, "returning stock failed");
            Err(AppError::partial(
                &format!("{} units of food {} were taken", quantity, food),
                e,
            ))
        }
    }
}

/// Outcome of adding a food to a bill.
#[derive(Debug, Clone)]
pub struct LineItemChange {
    pub line: BillInfo,
    /// `true` when a new row was created, `false` when an existing one grew.
    pub created: bool,
}

/// Adds `quantity` of a food to a bill, growing the existing line when there is one.
///
/// A new line snapshots the current food price. Only the added quantity is taken
/// from stock, never the new total.
pub async fn add_or_increment(
    state: &AppState,
    bill_id: ObjectId,
    food_id: ObjectId,
    quantity: i64,
) -> AppResult<LineItemChange> {
    if quantity <= 0 {
        return Err(AppError::Validation("quantity must be positive".into()));
    }
    get_bill(state, bill_id).await?;
    let food = get_food(state, food_id).await?;

    let existing = state
        .bill_infos
        .find_by_bill_and_food(bill_id, food_id)
        .await?;
    take_stock(state, food_id, quantity).await?;

    match existing {
        Some(line) => match state.bill_infos.increment_quantity(line.id, quantity).await {
            Ok(Some(line)) => {
                tracing::info!(line = %line.id, quantity = line.quantity, "line item incremented");
                Ok(LineItemChange {
                    line,
                    created: false,
                })
            }
            Ok(None) => {
                give_back(state, food_id, quantity).await?;
                Err(AppError::NotFound(format!("Line item {} not found", line.id)))
            }
            Err(e) => Err(AppError::partial(
                &format!("{} units of {} were taken", quantity, food.name),
                e,
            )),
        },
        None => {
            let line = BillInfo::new(bill_id, food_id, quantity, food.price);
            match state.bill_infos.insert(&line).await {
                Ok(()) => {
                    tracing::info!(line = %line.id, bill = %bill_id, food = %food_id, quantity, "line item created");
                    Ok(LineItemChange {
                        line,
                        created: true,
                    })
                }
                Err(RepoError::Duplicate(_)) => {
                    give_back(state, food_id, quantity).await?;
                    Err(AppError::Conflict(format!(
                        "{} is already on bill {}",
                        food.name, bill_id
                    )))
                }
                Err(e) => Err(AppError::partial(
                    &format!("{} units of {} were taken", quantity, food.name),
                    e,
                )),
            }
        }
    }
}

fn check_food(line: &BillInfo, food: Option<&str>) -> AppResult<()> {
    if let Some(raw) = food {
        if parse_id(raw, "food")? != line.food {
            return Err(AppError::Validation(format!(
                "Food {} does not belong to line item {}",
                raw, line.id
            )));
        }
    }
    Ok(())
}

/// Changes a line item by `delta` units. Positive deltas take stock, negative
/// ones give it back.
pub async fn change_quantity(
    state: &AppState,
    id: ObjectId,
    delta: i64,
    food: Option<&str>,
) -> AppResult<BillInfo> {
    if delta == 0 {
        return Err(AppError::Validation("quantity must not be zero".into()));
    }
    let line = get_line_item(state, id).await?;
    check_food(&line, food)?;
    if line.quantity + delta <= 0 {
        return Err(AppError::Validation(format!(
            "quantity of line item {} must stay positive",
            id
        )));
    }

    if delta > 0 {
        take_stock(state, line.food, delta).await?;
    } else {
        state
            .foods
            .adjust_stock(line.food, -delta)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Food {} not found", line.food)))?;
    }

    match state.bill_infos.increment_quantity(id, delta).await {
        Ok(Some(line)) => Ok(line),
        Ok(None) => {
            give_back(state, line.food, delta).await?;
            Err(AppError::Validation(format!(
                "quantity of line item {} must stay positive",
                id
            )))
        }
        Err(e) => Err(AppError::partial(
            &format!("stock of food {} moved by {}", line.food, -delta),
            e,
        )),
    }
}

/// Overwrites the quantity of a line item, moving stock by the difference.
pub async fn set_quantity(
    state: &AppState,
    id: ObjectId,
    quantity: i64,
    food: Option<&str>,
) -> AppResult<BillInfo> {
    if quantity <= 0 {
        return Err(AppError::Validation("quantity must be positive".into()));
    }
    let line = get_line_item(state, id).await?;
    check_food(&line, food)?;

    let returned = line.quantity - quantity;
    if returned != 0 {
        state
            .foods
            .adjust_stock(line.food, returned)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Food {} not found", line.food)))?;
    }

    match state.bill_infos.set_quantity(id, quantity).await {
        Ok(Some(line)) => Ok(line),
        Ok(None) => Err(AppError::partial(
            &format!("stock of food {} moved by {}", line.food, returned),
            format!("line item {} disappeared", id),
        )),
        Err(e) => Err(AppError::partial(
            &format!("stock of food {} moved by {}", line.food, returned),
            e,
        )),
    }
}

/// Deletes a line item. Its stock comes back only under
/// `StockPolicy::restore_stock_on_remove`.
pub async fn remove_line_item(state: &AppState, id: ObjectId) -> AppResult<BillInfo> {
    let line = state
        .bill_infos
        .delete(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Line item {} not found", id)))?;

    if state.policy.restore_stock_on_remove {
        match state.foods.adjust_stock(line.food, line.quantity).await {
            Ok(Some(_)) => {}
            Ok(None) => {
                tracing::warn!(food = %line.food, "food of removed line item no longer exists")
            }
            Err(e) => {
                return Err(AppError::partial(
                    &format!("line item {} was deleted", id),
                    e,
                ))
            }
        }
    }

    tracing::info!(line = %id, bill = %line.bill, "line item removed");
    Ok(line)
}

/// Deletes a bill together with its line items. Stock stays consumed and the
/// table keeps its occupancy.
pub async fn delete_bill(state: &AppState, id: ObjectId) -> AppResult<Bill> {
    let bill = state
        .bills
        .delete(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Bill {} not found", id)))?;

    match state.bill_infos.delete_by_bill(id).await {
        Ok(removed) => {
            tracing::info!(bill = %id, removed, "bill deleted");
            Ok(bill)
        }
        Err(e) => Err(AppError::partial(&format!("bill {} was deleted", id), e)),
    }
}

/// A validated line of a full-bill save.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconcileLine {
    pub food: ObjectId,
    pub quantity: i64,
}

fn reconcile_lines(bill_id: ObjectId, lines: &[DesiredLineItem]) -> AppResult<Vec<ReconcileLine>> {
    lines
        .iter()
        .map(|line| {
            if let Some(raw) = line.bill.as_deref().filter(|raw| !raw.trim().is_empty()) {
                if parse_id(raw, "bill")? != bill_id {
                    return Err(AppError::Validation(format!(
                        "Line item for bill {} sent to bill {}",
                        raw, bill_id
                    )));
                }
            }
            let food = require_id(line.food.as_deref(), "food")?;
            match line.quantity {
                Some(quantity) if quantity > 0 => Ok(ReconcileLine { food, quantity }),
                _ => Err(AppError::Validation(format!(
                    "quantity of food {} must be positive",
                    food
                ))),
            }
        })
        .collect()
}

/// Brings the lines of a bill to the desired quantities.
///
/// Existing lines are overwritten and stock moves by the difference. Missing
/// lines are created at the current food price and take their stock unchecked.
/// Lines not named keep their quantity. Stops at the first failure; lines
/// already written stay written.
pub async fn bulk_reconcile(
    state: &AppState,
    bill_id: ObjectId,
    lines: &[ReconcileLine],
) -> AppResult<Vec<BillInfo>> {
    for (applied, desired) in lines.iter().enumerate() {
        if let Err(e) = reconcile_line(state, bill_id, desired).await {
            tracing::error!(bill = %bill_id, food = %desired.food, applied, error = %e, "bill save stopped");
            return Err(AppError::partial(
                &format!("{} line(s) of bill {} were saved", applied, bill_id),
                e,
            ));
        }
    }
    Ok(state.bill_infos.find_by_bill(bill_id).await?)
}

async fn reconcile_line(
    state: &AppState,
    bill_id: ObjectId,
    desired: &ReconcileLine,
) -> AppResult<BillInfo> {
    match state
        .bill_infos
        .find_by_bill_and_food(bill_id, desired.food)
        .await?
    {
        Some(line) => {
            let returned = line.quantity - desired.quantity;
            if returned != 0 {
                state
                    .foods
                    .adjust_stock(desired.food, returned)
                    .await?
                    .ok_or_else(|| {
                        AppError::NotFound(format!("Food {} not found", desired.food))
                    })?;
            }
            state
                .bill_infos
                .set_quantity(line.id, desired.quantity)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("Line item {} not found", line.id)))
        }
        None => {
            let food = get_food(state, desired.food).await?;
            state
                .foods
                .adjust_stock(food.id, -desired.quantity)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("Food {} not found", food.id)))?;
            let line = BillInfo::new(bill_id, food.id, desired.quantity, food.price);
            state.bill_infos.insert(&line).await?;
            Ok(line)
        }
    }
}

/// Result of `PATCH /bills/:id`.
#[derive(Debug, Clone)]
pub struct BillUpdate {
    pub bill: Bill,
    /// Lines after a full-bill save, `None` for a plain field update.
    pub lines: Option<Vec<BillInfo>>,
}

/// Updates the scalar fields of a bill and, when line items are sent, saves them
/// and frees the table.
///
/// Everything that can be checked without writing is checked first. Settling a
/// bill without a checkout time stamps the current time.
pub async fn update_bill(
    state: &AppState,
    id: ObjectId,
    request: UpdateBillRequest,
) -> AppResult<BillUpdate> {
    let UpdateBillRequest {
        mut patch,
        table,
        billinfos,
    } = request;

    let lines = billinfos
        .as_deref()
        .map(|lines| reconcile_lines(id, lines))
        .transpose()?;
    let current = get_bill(state, id).await?;
    let table_id = match (&lines, table.as_deref()) {
        (None, _) => None,
        (Some(_), Some(raw)) if !raw.trim().is_empty() => Some(parse_id(raw, "table")?),
        (Some(_), _) => Some(current.table),
    };
    if let Some(table_id) = table_id {
        if state.tables.find_by_id(table_id).await?.is_none() {
            return Err(AppError::NotFound(format!("Table {} not found", table_id)));
        }
    }

    stamp_checkout(&mut patch, &current);
    let bill = state
        .bills
        .update(id, &patch)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Bill {} not found", id)))?;

    let (Some(lines), Some(table_id)) = (lines, table_id) else {
        return Ok(BillUpdate { bill, lines: None });
    };

    let saved = bulk_reconcile(state, id, &lines).await?;
    match state.tables.release(table_id).await {
        Ok(_) => {
            tracing::info!(bill = %id, table = %table_id, lines = saved.len(), "bill saved, table freed");
            Ok(BillUpdate {
                bill,
                lines: Some(saved),
            })
        }
        Err(e) => Err(AppError::partial(
            &format!("lines of bill {} were saved", id),
            e,
        )),
    }
}

/// Older bills store `-1` for "not checked out", so negative times count as unset.
fn stamp_checkout(patch: &mut BillPatch, current: &Bill) {
    let unset = |time: Option<i64>| time.map_or(true, |t| t < 0);
    if patch.status == Some(BillStatus::Settled)
        && unset(patch.time_checkout)
        && unset(current.time_checkout)
    {
        patch.time_checkout = Some(chrono::Utc::now().timestamp_millis());
    }
}
