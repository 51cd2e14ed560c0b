//! Tables and the occupancy transitions driven by bills.

use mongodb::bson::oid::ObjectId;

use crate::error::{AppError, AppResult};
use crate::models::bill::{Bill, CreateBillRequest};
use crate::models::table::{
    CreateTableRequest, Table, TableStatus, TransferTableRequest, UpdateTableRequest,
};
use crate::models::{normalize_string, parse_id, require_id};
use crate::repository::RepoError;
use crate::state::AppState;

pub async fn list_tables(state: &AppState) -> AppResult<Vec<Table>> {
    Ok(state.tables.find_all().await?)
}

pub async fn get_table(state: &AppState, id: ObjectId) -> AppResult<Table> {
    state
        .tables
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Table {} not found", id)))
}

pub async fn create_table(state: &AppState, request: CreateTableRequest) -> AppResult<Table> {
    let tablename = normalize_string(request.tablename.as_deref().unwrap_or_default());
    if tablename.is_empty() {
        return Err(AppError::Validation("Missing tablename".into()));
    }

    if state.tables.find_by_name(&tablename).await?.is_some() {
        return Err(AppError::Conflict(format!("Table {} already exists", tablename)));
    }

    let mut table = Table::new(tablename);
    if let Some(note) = request.note {
        table.note = note;
    }

    match state.tables.insert(&table).await {
        Ok(()) => {
            tracing::info!(table = %table.id, tablename = %table.tablename, "table created");
            Ok(table)
        }
        Err(RepoError::Duplicate(_)) => Err(AppError::Conflict(format!(
            "Table {} already exists",
            table.tablename
        ))),
        Err(e) => Err(e.into()),
    }
}

/// Edits the name and note. Occupancy only moves through bills and transfers.
pub async fn update_table(
    state: &AppState,
    id: ObjectId,
    request: UpdateTableRequest,
) -> AppResult<Table> {
    let tablename = request.tablename.as_deref().map(normalize_string);
    if tablename.is_none() && request.note.is_none() {
        return Err(AppError::Validation("Nothing to update".into()));
    }
    if tablename.as_deref() == Some("") {
        return Err(AppError::Validation("Table name must not be empty".into()));
    }

    match state.tables.update_details(id, tablename, request.note).await {
        Ok(Some(table)) => Ok(table),
        Ok(None) => Err(AppError::NotFound(format!("Table {} not found", id))),
        Err(RepoError::Duplicate(msg)) => Err(AppError::Conflict(msg)),
        Err(e) => Err(e.into()),
    }
}

pub async fn delete_table(state: &AppState, id: ObjectId) -> AppResult<Table> {
    state
        .tables
        .delete(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Table {} not found", id)))
}

/// Opens a bill on a free table and marks the table occupied by it.
///
/// The table is claimed with a conditional update. If another request claimed it
/// between the read and the write, the freshly inserted bill is removed again and
/// the call fails with `TableInUse`.
pub async fn open_bill(state: &AppState, request: CreateBillRequest) -> AppResult<Bill> {
    let table_id = require_id(request.table.as_deref(), "table")?;
    let seller_id = require_id(request.seller.as_deref(), "seller")?;
    let time_check_in = request
        .time_check_in
        .ok_or_else(|| AppError::Validation("Missing timeCheckIn".into()))?;

    let table = get_table(state, table_id).await?;
    if table.status == TableStatus::Occupied {
        return Err(AppError::TableInUse(format!(
            "Table {} is in use",
            table.tablename
        )));
    }
    if state.users.find_by_id(seller_id).await?.is_none() {
        return Err(AppError::NotFound(format!("Seller {} not found", seller_id)));
    }

    let bill = Bill::open(
        table_id,
        seller_id,
        time_check_in,
        request.note.unwrap_or_default(),
    );
    state.bills.insert(&bill).await?;

    match state.tables.occupy_if_free(table_id, bill.id).await {
        Ok(Some(_)) => {
            tracing::info!(bill = %bill.id, table = %table_id, "bill opened");
            Ok(bill)
        }
        Ok(None) => {
            tracing::warn!(bill = %bill.id, table = %table_id, "table claimed concurrently");
            if let Err(e) = state.bills.delete(bill.id).await {
                return Err(AppError::partial(
                    &format!("bill {} was created on a busy table", bill.id),
                    e,
                ));
            }
            Err(AppError::TableInUse(format!(
                "Table {} is in use",
                table.tablename
            )))
        }
        Err(e) => {
            tracing::error!(bill = %bill.id, table = %table_id, error = %e, "occupying table failed");
            Err(AppError::partial(&format!("bill {} was created", bill.id), e))
        }
    }
}

/// Moves the open bill of one table to another.
///
/// The target is occupied first, then the source released, so a failure in
/// between leaves the bill reachable from both tables rather than from neither.
/// The bill's own `table` field keeps pointing at the source table.
pub async fn transfer_table(
    state: &AppState,
    request: TransferTableRequest,
) -> AppResult<(Table, Table)> {
    let (Some(source_ref), Some(target_ref)) = (request.curr_table, request.target_table) else {
        return Err(AppError::Validation("Missing table ids".into()));
    };
    let source_id = require_id(source_ref.id.as_deref(), "source table")?;
    let target_id = require_id(target_ref.id.as_deref(), "target table")?;
    if source_id == target_id {
        return Err(AppError::Validation("Cannot transfer a table onto itself".into()));
    }

    let source = get_table(state, source_id).await?;
    get_table(state, target_id).await?;

    let bill = match (source.bill, source_ref.bill.as_deref()) {
        (Some(bill), _) => bill,
        (None, Some(raw)) if !raw.trim().is_empty() => parse_id(raw, "bill")?,
        _ => {
            return Err(AppError::Validation(format!(
                "Table {} has no open bill",
                source.tablename
            )))
        }
    };

    let target = state
        .tables
        .occupy(target_id, bill)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Table {} not found", target_id)))?;

    let source = match state.tables.release(source_id).await {
        Ok(Some(table)) => table,
        Ok(None) => {
            return Err(AppError::partial(
                &format!("table {} now holds bill {}", target_id, bill),
                format!("table {} disappeared", source_id),
            ))
        }
        Err(e) => {
            tracing::error!(source = %source_id, target = %target_id, error = %e, "releasing table failed");
            return Err(AppError::partial(
                &format!("table {} now holds bill {}", target_id, bill),
                e,
            ));
        }
    };

    tracing::info!(bill = %bill, source = %source_id, target = %target_id, "table transferred");
    Ok((source, target))
}
