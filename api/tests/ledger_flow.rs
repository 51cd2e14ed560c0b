mod common;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use common::{
    memory_state, memory_state_restoring_stock, seed_basic_fixtures,
    seed_category, seed_food, seed_table, stock_of, TestFixtures,
};
use mongodb::bson::oid::ObjectId;
use pos_backend::config::StockPolicy;
use pos_backend::error::AppError;
use pos_backend::models::bill::{
    Bill, BillStatus, CreateBillRequest, DesiredLineItem, UpdateBillRequest,
};
use pos_backend::models::bill_info::BillInfo;
use pos_backend::models::food::FoodPatch;
use pos_backend::models::table::{TableRef, TableStatus, TransferTableRequest};
use pos_backend::repository::{BillInfoStore, MemoryStore, RepoResult};
use pos_backend::services::{catalog, ledger, seating};
use pos_backend::state::AppState;
use rust_decimal::Decimal;

/// Line item store where another cashier writes the (bill, food) row right
/// after our lookup came back empty.
struct RivalLine {
    inner: Arc<MemoryStore>,
    armed: AtomicBool,
}

#[async_trait]
impl BillInfoStore for RivalLine {
    async fn find_all(&self) -> RepoResult<Vec<BillInfo>> {
        BillInfoStore::find_all(&*self.inner).await
    }

    async fn find_by_id(&self, id: ObjectId) -> RepoResult<Option<BillInfo>> {
        BillInfoStore::find_by_id(&*self.inner, id).await
    }

    async fn find_by_bill(&self, bill: ObjectId) -> RepoResult<Vec<BillInfo>> {
        self.inner.find_by_bill(bill).await
    }

    async fn find_by_bill_and_food(
        &self,
        bill: ObjectId,
        food: ObjectId,
    ) -> RepoResult<Option<BillInfo>> {
        let found = self.inner.find_by_bill_and_food(bill, food).await?;
        if found.is_none() && self.armed.swap(false, Ordering::SeqCst) {
            let rival = BillInfo::new(bill, food, 1, Decimal::new(45_000, 0));
            BillInfoStore::insert(&*self.inner, &rival).await?;
        }
        Ok(found)
    }

    async fn insert(&self, info: &BillInfo) -> RepoResult<()> {
        BillInfoStore::insert(&*self.inner, info).await
    }

    async fn increment_quantity(&self, id: ObjectId, delta: i64) -> RepoResult<Option<BillInfo>> {
        self.inner.increment_quantity(id, delta).await
    }

    async fn set_quantity(&self, id: ObjectId, quantity: i64) -> RepoResult<Option<BillInfo>> {
        self.inner.set_quantity(id, quantity).await
    }

    async fn delete(&self, id: ObjectId) -> RepoResult<Option<BillInfo>> {
        BillInfoStore::delete(&*self.inner, id).await
    }

    async fn delete_by_bill(&self, bill: ObjectId) -> RepoResult<u64> {
        self.inner.delete_by_bill(bill).await
    }
}

async fn open_bill(state: &AppState, fixtures: &TestFixtures) -> Bill {
    seating::open_bill(
        state,
        CreateBillRequest {
            time_check_in: Some(1_700_000_000_000),
            table: Some(fixtures.table.id.to_hex()),
            seller: Some(fixtures.seller.id.to_hex()),
            note: None,
        },
    )
    .await
    .expect("open bill")
}

#[tokio::test]
async fn pho_orders_accumulate_on_one_line() {
    let state = memory_state();
    let fixtures = seed_basic_fixtures(&state).await;
    let bill = open_bill(&state, &fixtures).await;

    let table = seating::get_table(&state, fixtures.table.id).await.unwrap();
    assert_eq!(table.status, TableStatus::Occupied);
    assert_eq!(table.bill, Some(bill.id));

    let first = ledger::add_or_increment(&state, bill.id, fixtures.pho.id, 3)
        .await
        .unwrap();
    assert!(first.created);
    assert_eq!(first.line.quantity, 3);
    assert_eq!(first.line.price, Decimal::new(45_000, 0));
    assert_eq!(stock_of(&state, fixtures.pho.id).await, 7);

    let second = ledger::add_or_increment(&state, bill.id, fixtures.pho.id, 2)
        .await
        .unwrap();
    assert!(!second.created);
    assert_eq!(second.line.id, first.line.id);
    assert_eq!(second.line.quantity, 5);
    assert_eq!(stock_of(&state, fixtures.pho.id).await, 5);

    let lines = ledger::bill_items(&state, bill.id).await.unwrap();
    assert_eq!(lines.len(), 1);
}

#[tokio::test]
async fn repeated_orders_take_only_the_added_quantity() {
    let state = memory_state();
    let fixtures = seed_basic_fixtures(&state).await;
    let drinks = seed_category(&state, "Drinks").await;
    let cola = seed_food(&state, &drinks, "Cola", 15_000, 20).await;
    let bill = open_bill(&state, &fixtures).await;

    ledger::add_or_increment(&state, bill.id, cola.id, 2).await.unwrap();
    ledger::add_or_increment(&state, bill.id, cola.id, 3).await.unwrap();

    let lines = ledger::bill_items(&state, bill.id).await.unwrap();
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0].quantity, 5);
    assert_eq!(stock_of(&state, cola.id).await, 15);
}

#[tokio::test]
async fn line_price_is_frozen_at_order_time() {
    let state = memory_state();
    let fixtures = seed_basic_fixtures(&state).await;
    let bill = open_bill(&state, &fixtures).await;

    ledger::add_or_increment(&state, bill.id, fixtures.pho.id, 1).await.unwrap();
    catalog::update_food(
        &state,
        fixtures.pho.id,
        FoodPatch {
            price: Some(Decimal::new(50_000, 0)),
            ..FoodPatch::default()
        },
    )
    .await
    .unwrap();
    let line = ledger::add_or_increment(&state, bill.id, fixtures.pho.id, 1)
        .await
        .unwrap()
        .line;
    assert_eq!(line.price, Decimal::new(45_000, 0));
}

#[tokio::test]
async fn opening_a_bill_on_an_occupied_table_fails_without_a_bill() {
    let state = memory_state();
    let fixtures = seed_basic_fixtures(&state).await;
    open_bill(&state, &fixtures).await;

    let err = seating::open_bill(
        &state,
        CreateBillRequest {
            time_check_in: Some(1_700_000_100_000),
            table: Some(fixtures.table.id.to_hex()),
            seller: Some(fixtures.seller.id.to_hex()),
            note: None,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::TableInUse(_)));
    assert_eq!(ledger::list_bills(&state).await.unwrap().len(), 1);
}

#[tokio::test]
async fn opening_a_bill_checks_its_references() {
    let state = memory_state();
    let fixtures = seed_basic_fixtures(&state).await;

    let missing_table = seating::open_bill(
        &state,
        CreateBillRequest {
            time_check_in: Some(1),
            table: Some(mongodb::bson::oid::ObjectId::new().to_hex()),
            seller: Some(fixtures.seller.id.to_hex()),
            note: None,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(missing_table, AppError::NotFound(_)));

    let missing_time = seating::open_bill(
        &state,
        CreateBillRequest {
            time_check_in: None,
            table: Some(fixtures.table.id.to_hex()),
            seller: Some(fixtures.seller.id.to_hex()),
            note: None,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(missing_time, AppError::Validation(_)));
    assert!(ledger::list_bills(&state).await.unwrap().is_empty());
}

#[tokio::test]
async fn transfer_moves_the_bill_to_the_target_table() {
    let state = memory_state();
    let fixtures = seed_basic_fixtures(&state).await;
    let target = seed_table(&state, "Ban 2").await;
    let bill = open_bill(&state, &fixtures).await;

    let (source, moved) = seating::transfer_table(
        &state,
        TransferTableRequest {
            curr_table: Some(TableRef {
                id: Some(fixtures.table.id.to_hex()),
                bill: Some(bill.id.to_hex()),
            }),
            target_table: Some(TableRef {
                id: Some(target.id.to_hex()),
                bill: None,
            }),
        },
    )
    .await
    .unwrap();

    assert_eq!(source.status, TableStatus::Free);
    assert_eq!(source.bill, None);
    assert_eq!(moved.status, TableStatus::Occupied);
    assert_eq!(moved.bill, Some(bill.id));

    // The bill itself still names the source table.
    let bill = ledger::get_bill(&state, bill.id).await.unwrap();
    assert_eq!(bill.table, fixtures.table.id);
}

#[tokio::test]
async fn transfer_requires_both_tables() {
    let state = memory_state();
    let fixtures = seed_basic_fixtures(&state).await;

    let err = seating::transfer_table(
        &state,
        TransferTableRequest {
            curr_table: Some(TableRef {
                id: Some(fixtures.table.id.to_hex()),
                bill: None,
            }),
            target_table: None,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
}

#[tokio::test]
async fn transfer_onto_the_same_table_is_rejected() {
    let state = memory_state();
    let fixtures = seed_basic_fixtures(&state).await;
    let bill = open_bill(&state, &fixtures).await;

    let err = seating::transfer_table(
        &state,
        TransferTableRequest {
            curr_table: Some(TableRef {
                id: Some(fixtures.table.id.to_hex()),
                bill: Some(bill.id.to_hex()),
            }),
            target_table: Some(TableRef {
                id: Some(fixtures.table.id.to_hex()),
                bill: None,
            }),
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    let table = seating::get_table(&state, fixtures.table.id).await.unwrap();
    assert_eq!(table.status, TableStatus::Occupied);
    assert_eq!(table.bill, Some(bill.id));
}

#[tokio::test]
async fn losing_the_line_insert_race_returns_the_stock() {
    let store = Arc::new(MemoryStore::new());
    let lines = Arc::new(RivalLine {
        inner: store.clone(),
        armed: AtomicBool::new(false),
    });
    let state = AppState {
        tables: store.clone(),
        bills: store.clone(),
        bill_infos: lines.clone(),
        foods: store.clone(),
        categories: store.clone(),
        users: store,
        policy: StockPolicy::default(),
    };
    let fixtures = seed_basic_fixtures(&state).await;
    let bill = open_bill(&state, &fixtures).await;

    lines.armed.store(true, Ordering::SeqCst);
    let err = ledger::add_or_increment(&state, bill.id, fixtures.pho.id, 2)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    let items = ledger::bill_items(&state, bill.id).await.unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].quantity, 1);
    assert_eq!(stock_of(&state, fixtures.pho.id).await, 10);
}

#[tokio::test]
async fn single_unit_additions_are_gated_on_stock() {
    let state = memory_state();
    let fixtures = seed_basic_fixtures(&state).await;
    let drinks = seed_category(&state, "Drinks").await;
    let sold_out = seed_food(&state, &drinks, "Tra da", 5_000, 0).await;
    let bill = open_bill(&state, &fixtures).await;

    let err = ledger::add_or_increment(&state, bill.id, sold_out.id, 1)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InsufficientStock(_)));
    assert!(ledger::bill_items(&state, bill.id).await.unwrap().is_empty());

    // Larger additions are not gated and may overdraw.
    ledger::add_or_increment(&state, bill.id, sold_out.id, 2).await.unwrap();
    assert_eq!(stock_of(&state, sold_out.id).await, -2);

    // An overdrawn food refuses single units too.
    let err = ledger::add_or_increment(&state, bill.id, sold_out.id, 1)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InsufficientStock(_)));
    assert_eq!(stock_of(&state, sold_out.id).await, -2);
}

#[tokio::test]
async fn removing_a_line_keeps_its_stock_by_default() {
    let state = memory_state();
    let fixtures = seed_basic_fixtures(&state).await;
    let bill = open_bill(&state, &fixtures).await;
    let line = ledger::add_or_increment(&state, bill.id, fixtures.pho.id, 4)
        .await
        .unwrap()
        .line;

    ledger::remove_line_item(&state, line.id).await.unwrap();
    assert!(ledger::bill_items(&state, bill.id).await.unwrap().is_empty());
    assert_eq!(stock_of(&state, fixtures.pho.id).await, 6);
}

#[tokio::test]
async fn stock_matches_open_lines_when_removal_restores() {
    let state = memory_state_restoring_stock();
    let fixtures = seed_basic_fixtures(&state).await;
    let drinks = seed_category(&state, "Drinks").await;
    let cola = seed_food(&state, &drinks, "Cola", 15_000, 10).await;
    let bill = open_bill(&state, &fixtures).await;

    let pho_line = ledger::add_or_increment(&state, bill.id, fixtures.pho.id, 3)
        .await
        .unwrap()
        .line;
    ledger::add_or_increment(&state, bill.id, cola.id, 2).await.unwrap();
    ledger::add_or_increment(&state, bill.id, fixtures.pho.id, 1).await.unwrap();
    ledger::remove_line_item(&state, pho_line.id).await.unwrap();
    ledger::add_or_increment(&state, bill.id, cola.id, 4).await.unwrap();

    for (food, initial) in [(fixtures.pho.id, 10), (cola.id, 10)] {
        let ordered: i64 = ledger::bill_items(&state, bill.id)
            .await
            .unwrap()
            .iter()
            .filter(|line| line.food == food)
            .map(|line| line.quantity)
            .sum();
        assert_eq!(stock_of(&state, food).await, initial - ordered);
    }
}

#[tokio::test]
async fn relative_and_absolute_quantity_changes_move_stock() {
    let state = memory_state();
    let fixtures = seed_basic_fixtures(&state).await;
    let bill = open_bill(&state, &fixtures).await;
    let line = ledger::add_or_increment(&state, bill.id, fixtures.pho.id, 3)
        .await
        .unwrap()
        .line;

    let line = ledger::change_quantity(&state, line.id, -2, None).await.unwrap();
    assert_eq!(line.quantity, 1);
    assert_eq!(stock_of(&state, fixtures.pho.id).await, 9);

    let err = ledger::change_quantity(&state, line.id, -1, None).await.unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
    assert_eq!(stock_of(&state, fixtures.pho.id).await, 9);

    let pho = fixtures.pho.id.to_hex();
    let line = ledger::set_quantity(&state, line.id, 6, Some(&pho)).await.unwrap();
    assert_eq!(line.quantity, 6);
    assert_eq!(stock_of(&state, fixtures.pho.id).await, 4);

    let other_food = mongodb::bson::oid::ObjectId::new().to_hex();
    let err = ledger::set_quantity(&state, line.id, 2, Some(&other_food))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
}

#[tokio::test]
async fn single_unit_increment_of_a_sold_out_line_is_refused() {
    let state = memory_state();
    let fixtures = seed_basic_fixtures(&state).await;
    let bill = open_bill(&state, &fixtures).await;
    let line = ledger::add_or_increment(&state, bill.id, fixtures.pho.id, 10)
        .await
        .unwrap()
        .line;

    let err = ledger::change_quantity(&state, line.id, 1, None).await.unwrap_err();
    assert!(matches!(err, AppError::InsufficientStock(_)));
    assert_eq!(ledger::get_line_item(&state, line.id).await.unwrap().quantity, 10);
}

#[tokio::test]
async fn saving_a_bill_reconciles_lines_and_frees_the_table() {
    let state = memory_state();
    let fixtures = seed_basic_fixtures(&state).await;
    let drinks = seed_category(&state, "Drinks").await;
    let cola = seed_food(&state, &drinks, "Cola", 15_000, 10).await;
    let tea = seed_food(&state, &drinks, "Tra da", 5_000, 10).await;
    let bill = open_bill(&state, &fixtures).await;

    ledger::add_or_increment(&state, bill.id, fixtures.pho.id, 3).await.unwrap();
    ledger::add_or_increment(&state, bill.id, tea.id, 2).await.unwrap();

    let request = UpdateBillRequest {
        table: Some(fixtures.table.id.to_hex()),
        billinfos: Some(vec![
            DesiredLineItem {
                bill: Some(bill.id.to_hex()),
                food: Some(fixtures.pho.id.to_hex()),
                quantity: Some(1),
            },
            DesiredLineItem {
                bill: None,
                food: Some(cola.id.to_hex()),
                quantity: Some(2),
            },
        ]),
        ..UpdateBillRequest::default()
    };
    let saved = ledger::update_bill(&state, bill.id, request).await.unwrap();

    let lines = saved.lines.expect("lines returned");
    assert_eq!(lines.len(), 3);
    let quantity_of = |food| {
        lines
            .iter()
            .find(|line| line.food == food)
            .map(|line| line.quantity)
    };
    assert_eq!(quantity_of(fixtures.pho.id), Some(1));
    assert_eq!(quantity_of(cola.id), Some(2));
    assert_eq!(quantity_of(tea.id), Some(2));

    assert_eq!(stock_of(&state, fixtures.pho.id).await, 9);
    assert_eq!(stock_of(&state, cola.id).await, 8);
    assert_eq!(stock_of(&state, tea.id).await, 8);

    let table = seating::get_table(&state, fixtures.table.id).await.unwrap();
    assert_eq!(table.status, TableStatus::Free);
    assert_eq!(table.bill, None);
}

#[tokio::test]
async fn saving_stops_at_a_missing_food_and_keeps_earlier_lines() {
    let state = memory_state();
    let fixtures = seed_basic_fixtures(&state).await;
    let bill = open_bill(&state, &fixtures).await;

    let request = UpdateBillRequest {
        table: Some(fixtures.table.id.to_hex()),
        billinfos: Some(vec![
            DesiredLineItem {
                bill: None,
                food: Some(fixtures.pho.id.to_hex()),
                quantity: Some(2),
            },
            DesiredLineItem {
                bill: None,
                food: Some(mongodb::bson::oid::ObjectId::new().to_hex()),
                quantity: Some(1),
            },
        ]),
        ..UpdateBillRequest::default()
    };
    let err = ledger::update_bill(&state, bill.id, request).await.unwrap_err();
    assert!(matches!(err, AppError::Internal(_)));

    assert_eq!(ledger::bill_items(&state, bill.id).await.unwrap().len(), 1);
    assert_eq!(stock_of(&state, fixtures.pho.id).await, 8);
    let table = seating::get_table(&state, fixtures.table.id).await.unwrap();
    assert_eq!(table.status, TableStatus::Occupied);
}

#[tokio::test]
async fn settling_a_bill_stamps_checkout() {
    let state = memory_state();
    let fixtures = seed_basic_fixtures(&state).await;
    let bill = open_bill(&state, &fixtures).await;

    let mut request = UpdateBillRequest::default();
    request.patch.status = Some(BillStatus::Settled);
    request.patch.tips = Some(Decimal::new(20_000, 0));
    let updated = ledger::update_bill(&state, bill.id, request).await.unwrap();

    assert!(updated.lines.is_none());
    assert_eq!(updated.bill.status, BillStatus::Settled);
    assert_eq!(updated.bill.tips, Decimal::new(20_000, 0));
    assert!(updated.bill.time_checkout.is_some());
}

#[tokio::test]
async fn deleting_a_bill_drops_lines_but_not_occupancy_or_stock() {
    let state = memory_state();
    let fixtures = seed_basic_fixtures(&state).await;
    let bill = open_bill(&state, &fixtures).await;
    ledger::add_or_increment(&state, bill.id, fixtures.pho.id, 3).await.unwrap();

    ledger::delete_bill(&state, bill.id).await.unwrap();

    assert!(ledger::list_line_items(&state).await.unwrap().is_empty());
    assert_eq!(stock_of(&state, fixtures.pho.id).await, 7);
    let table = seating::get_table(&state, fixtures.table.id).await.unwrap();
    assert_eq!(table.status, TableStatus::Occupied);
    assert_eq!(table.bill, Some(bill.id));

    let err = ledger::bill_items(&state, bill.id).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}
