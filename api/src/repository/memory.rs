//! In-process backend used by tests and by `STORAGE_BACKEND=memory`.
//!
//! Each collection sits behind its own lock, so a single trait call is atomic the same
//! way a single-document Mongo update is. Unique keys mirror the Mongo indexes.

use async_trait::async_trait;
use mongodb::bson::oid::ObjectId;
use parking_lot::RwLock;

use super::{
    BillInfoStore, BillStore, CategoryStore, FoodStore, RepoError, RepoResult, TableStore,
    UserStore,
};
use crate::models::bill::{Bill, BillPatch};
use crate::models::bill_info::BillInfo;
use crate::models::category::Category;
use crate::models::food::{Food, FoodPatch};
use crate::models::table::{Table, TableStatus};
use crate::models::user::User;

#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Vec<Table>>,
    bills: RwLock<Vec<Bill>>,
    bill_infos: RwLock<Vec<BillInfo>>,
    foods: RwLock<Vec<Food>>,
    categories: RwLock<Vec<Category>>,
    users: RwLock<Vec<User>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn remove_where<T: Clone>(items: &mut Vec<T>, pred: impl Fn(&T) -> bool) -> Option<T> {
    let index = items.iter().position(pred)?;
    Some(items.remove(index))
}

fn duplicate(key: &str, value: &str) -> RepoError {
    RepoError::Duplicate(format!("{} {} already exists", key, value))
}

#[async_trait]
impl TableStore for MemoryStore {
    async fn find_all(&self) -> RepoResult<Vec<Table>> {
        Ok(self.tables.read().clone())
    }

    async fn find_by_id(&self, id: ObjectId) -> RepoResult<Option<Table>> {
        Ok(self.tables.read().iter().find(|t| t.id == id).cloned())
    }

    async fn find_by_name(&self, tablename: &str) -> RepoResult<Option<Table>> {
        Ok(self
            .tables
            .read()
            .iter()
            .find(|t| t.tablename == tablename)
            .cloned())
    }

    async fn insert(&self, table: &Table) -> RepoResult<()> {
        let mut tables = self.tables.write();
        if tables.iter().any(|t| t.tablename == table.tablename) {
            return Err(duplicate("tablename", &table.tablename));
        }
        tables.push(table.clone());
        Ok(())
    }

    async fn update_details(
        &self,
        id: ObjectId,
        tablename: Option<String>,
        note: Option<String>,
    ) -> RepoResult<Option<Table>> {
        let mut tables = self.tables.write();
        if let Some(name) = &tablename {
            if tables.iter().any(|t| t.id != id && &t.tablename == name) {
                return Err(duplicate("tablename", name));
            }
        }
        let Some(table) = tables.iter_mut().find(|t| t.id == id) else {
            return Ok(None);
        };
        if let Some(name) = tablename {
            table.tablename = name;
        }
        if let Some(note) = note {
            table.note = note;
        }
        Ok(Some(table.clone()))
    }

    async fn occupy_if_free(&self, id: ObjectId, bill: ObjectId) -> RepoResult<Option<Table>> {
        let mut tables = self.tables.write();
        match tables
            .iter_mut()
            .find(|t| t.id == id && t.status == TableStatus::Free)
        {
            Some(table) => {
                table.status = TableStatus::Occupied;
                table.bill = Some(bill);
                Ok(Some(table.clone()))
            }
            None => Ok(None),
        }
    }

    async fn occupy(&self, id: ObjectId, bill: ObjectId) -> RepoResult<Option<Table>> {
        let mut tables = self.tables.write();
        Ok(tables.iter_mut().find(|t| t.id == id).map(|table| {
            table.status = TableStatus::Occupied;
            table.bill = Some(bill);
            table.clone()
        }))
    }

    async fn release(&self, id: ObjectId) -> RepoResult<Option<Table>> {
        let mut tables = self.tables.write();
        Ok(tables.iter_mut().find(|t| t.id == id).map(|table| {
            table.status = TableStatus::Free;
            table.bill = None;
            table.clone()
        }))
    }

    async fn delete(&self, id: ObjectId) -> RepoResult<Option<Table>> {
        Ok(remove_where(&mut *self.tables.write(), |t| t.id == id))
    }
}

#[async_trait]
impl BillStore for MemoryStore {
    async fn find_all(&self) -> RepoResult<Vec<Bill>> {
        Ok(self.bills.read().clone())
    }

    async fn find_by_id(&self, id: ObjectId) -> RepoResult<Option<Bill>> {
        Ok(self.bills.read().iter().find(|b| b.id == id).cloned())
    }

    async fn insert(&self, bill: &Bill) -> RepoResult<()> {
        self.bills.write().push(bill.clone());
        Ok(())
    }

    async fn update(&self, id: ObjectId, patch: &BillPatch) -> RepoResult<Option<Bill>> {
        let mut bills = self.bills.write();
        Ok(bills.iter_mut().find(|b| b.id == id).map(|bill| {
            patch.apply(bill);
            bill.clone()
        }))
    }

    async fn delete(&self, id: ObjectId) -> RepoResult<Option<Bill>> {
        Ok(remove_where(&mut *self.bills.write(), |b| b.id == id))
    }
}

#[async_trait]
impl BillInfoStore for MemoryStore {
    async fn find_all(&self) -> RepoResult<Vec<BillInfo>> {
        Ok(self.bill_infos.read().clone())
    }

    async fn find_by_id(&self, id: ObjectId) -> RepoResult<Option<BillInfo>> {
        Ok(self.bill_infos.read().iter().find(|i| i.id == id).cloned())
    }

    async fn find_by_bill(&self, bill: ObjectId) -> RepoResult<Vec<BillInfo>> {
        Ok(self
            .bill_infos
            .read()
            .iter()
            .filter(|i| i.bill == bill)
            .cloned()
            .collect())
    }

    async fn find_by_bill_and_food(
        &self,
        bill: ObjectId,
        food: ObjectId,
    ) -> RepoResult<Option<BillInfo>> {
        Ok(self
            .bill_infos
            .read()
            .iter()
            .find(|i| i.bill == bill && i.food == food)
            .cloned())
    }

    async fn insert(&self, info: &BillInfo) -> RepoResult<()> {
        let mut infos = self.bill_infos.write();
        if infos.iter().any(|i| i.bill == info.bill && i.food == info.food) {
            return Err(RepoError::Duplicate(format!(
                "food {} already on bill {}",
                info.food, info.bill
            )));
        }
        infos.push(info.clone());
        Ok(())
    }

    async fn increment_quantity(&self, id: ObjectId, delta: i64) -> RepoResult<Option<BillInfo>> {
        let mut infos = self.bill_infos.write();
        match infos
            .iter_mut()
            .find(|i| i.id == id && i.quantity + delta > 0)
        {
            Some(info) => {
                info.quantity += delta;
                Ok(Some(info.clone()))
            }
            None => Ok(None),
        }
    }

    async fn set_quantity(&self, id: ObjectId, quantity: i64) -> RepoResult<Option<BillInfo>> {
        let mut infos = self.bill_infos.write();
        Ok(infos.iter_mut().find(|i| i.id == id).map(|info| {
            info.quantity = quantity;
            info.clone()
        }))
    }

    async fn delete(&self, id: ObjectId) -> RepoResult<Option<BillInfo>> {
        Ok(remove_where(&mut *self.bill_infos.write(), |i| i.id == id))
    }

    async fn delete_by_bill(&self, bill: ObjectId) -> RepoResult<u64> {
        let mut infos = self.bill_infos.write();
        let before = infos.len();
        infos.retain(|i| i.bill != bill);
        Ok((before - infos.len()) as u64)
    }
}

#[async_trait]
impl FoodStore for MemoryStore {
    async fn find_all(&self) -> RepoResult<Vec<Food>> {
        Ok(self.foods.read().clone())
    }

    async fn find_by_id(&self, id: ObjectId) -> RepoResult<Option<Food>> {
        Ok(self.foods.read().iter().find(|f| f.id == id).cloned())
    }

    async fn find_by_name(&self, name: &str) -> RepoResult<Option<Food>> {
        Ok(self.foods.read().iter().find(|f| f.name == name).cloned())
    }

    async fn insert(&self, food: &Food) -> RepoResult<()> {
        let mut foods = self.foods.write();
        if foods.iter().any(|f| f.name == food.name) {
            return Err(duplicate("name", &food.name));
        }
        foods.push(food.clone());
        Ok(())
    }

    async fn update(&self, id: ObjectId, patch: &FoodPatch) -> RepoResult<Option<Food>> {
        let mut foods = self.foods.write();
        if let Some(name) = &patch.name {
            if foods.iter().any(|f| f.id != id && &f.name == name) {
                return Err(duplicate("name", name));
            }
        }
        Ok(foods.iter_mut().find(|f| f.id == id).map(|food| {
            let previous = food.clone();
            patch.apply(food);
            previous
        }))
    }

    async fn adjust_stock(&self, id: ObjectId, delta: i64) -> RepoResult<Option<Food>> {
        let mut foods = self.foods.write();
        Ok(foods.iter_mut().find(|f| f.id == id).map(|food| {
            food.so_luong_ton += delta;
            food.clone()
        }))
    }

    async fn take_stock(&self, id: ObjectId, quantity: i64) -> RepoResult<Option<Food>> {
        let mut foods = self.foods.write();
        match foods
            .iter_mut()
            .find(|f| f.id == id && f.so_luong_ton >= quantity)
        {
            Some(food) => {
                food.so_luong_ton -= quantity;
                Ok(Some(food.clone()))
            }
            None => Ok(None),
        }
    }

    async fn delete(&self, id: ObjectId) -> RepoResult<Option<Food>> {
        Ok(remove_where(&mut *self.foods.write(), |f| f.id == id))
    }

    async fn delete_by_category(&self, category: ObjectId) -> RepoResult<u64> {
        let mut foods = self.foods.write();
        let before = foods.len();
        foods.retain(|f| f.category != category);
        Ok((before - foods.len()) as u64)
    }
}

#[async_trait]
impl CategoryStore for MemoryStore {
    async fn find_all(&self) -> RepoResult<Vec<Category>> {
        Ok(self.categories.read().clone())
    }

    async fn find_by_id(&self, id: ObjectId) -> RepoResult<Option<Category>> {
        Ok(self.categories.read().iter().find(|c| c.id == id).cloned())
    }

    async fn find_by_name(&self, name: &str) -> RepoResult<Option<Category>> {
        Ok(self
            .categories
            .read()
            .iter()
            .find(|c| c.name == name)
            .cloned())
    }

    async fn insert(&self, category: &Category) -> RepoResult<()> {
        let mut categories = self.categories.write();
        if categories.iter().any(|c| c.name == category.name) {
            return Err(duplicate("name", &category.name));
        }
        categories.push(category.clone());
        Ok(())
    }

    async fn rename(&self, id: ObjectId, name: &str) -> RepoResult<Option<Category>> {
        let mut categories = self.categories.write();
        if categories.iter().any(|c| c.id != id && c.name == name) {
            return Err(duplicate("name", name));
        }
        Ok(categories.iter_mut().find(|c| c.id == id).map(|category| {
            category.name = name.to_string();
            category.clone()
        }))
    }

    async fn adjust_food_count(&self, id: ObjectId, delta: i64) -> RepoResult<Option<Category>> {
        let mut categories = self.categories.write();
        Ok(categories.iter_mut().find(|c| c.id == id).map(|category| {
            category.foodnumber += delta;
            category.clone()
        }))
    }

    async fn delete(&self, id: ObjectId) -> RepoResult<Option<Category>> {
        Ok(remove_where(&mut *self.categories.write(), |c| c.id == id))
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn find_all(&self) -> RepoResult<Vec<User>> {
        Ok(self.users.read().clone())
    }

    async fn find_by_id(&self, id: ObjectId) -> RepoResult<Option<User>> {
        Ok(self.users.read().iter().find(|u| u.id == id).cloned())
    }

    async fn find_by_username(&self, username: &str) -> RepoResult<Option<User>> {
        Ok(self
            .users
            .read()
            .iter()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn insert(&self, user: &User) -> RepoResult<()> {
        let mut users = self.users.write();
        if users.iter().any(|u| u.username == user.username) {
            return Err(duplicate("username", &user.username));
        }
        users.push(user.clone());
        Ok(())
    }

    async fn delete(&self, id: ObjectId) -> RepoResult<Option<User>> {
        Ok(remove_where(&mut *self.users.write(), |u| u.id == id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn food(name: &str, stock: i64) -> Food {
        Food {
            id: ObjectId::new(),
            name: name.into(),
            price: Decimal::new(15000, 0),
            discount: Decimal::ZERO,
            description: String::new(),
            so_luong_ton: stock,
            img_url: String::new(),
            status: Default::default(),
            category: ObjectId::new(),
        }
    }

    #[tokio::test]
    async fn occupy_if_free_only_claims_free_tables() {
        let store = MemoryStore::new();
        let table = Table::new("Ban 1".into());
        TableStore::insert(&store, &table).await.unwrap();

        let first = ObjectId::new();
        let claimed = store.occupy_if_free(table.id, first).await.unwrap().unwrap();
        assert_eq!(claimed.bill, Some(first));
        assert!(store
            .occupy_if_free(table.id, ObjectId::new())
            .await
            .unwrap()
            .is_none());

        let released = store.release(table.id).await.unwrap().unwrap();
        assert_eq!(released.status, TableStatus::Free);
        assert_eq!(released.bill, None);
    }

    #[tokio::test]
    async fn table_names_are_unique() {
        let store = MemoryStore::new();
        TableStore::insert(&store, &Table::new("Ban 1".into())).await.unwrap();
        let err = TableStore::insert(&store, &Table::new("Ban 1".into()))
            .await
            .unwrap_err();
        assert!(matches!(err, RepoError::Duplicate(_)));
    }

    #[tokio::test]
    async fn take_stock_refuses_to_overdraw() {
        let store = MemoryStore::new();
        let cola = food("Cola", 1);
        FoodStore::insert(&store, &cola).await.unwrap();

        assert!(store.take_stock(cola.id, 2).await.unwrap().is_none());
        let after = store.take_stock(cola.id, 1).await.unwrap().unwrap();
        assert_eq!(after.so_luong_ton, 0);

        let after = store.adjust_stock(cola.id, -3).await.unwrap().unwrap();
        assert_eq!(after.so_luong_ton, -3);
    }

    #[tokio::test]
    async fn food_update_hands_back_the_previous_document() {
        let store = MemoryStore::new();
        let cola = food("Cola", 1);
        FoodStore::insert(&store, &cola).await.unwrap();

        let moved_to = ObjectId::new();
        let patch = FoodPatch {
            category: Some(moved_to),
            ..FoodPatch::default()
        };
        let previous = FoodStore::update(&store, cola.id, &patch).await.unwrap().unwrap();
        assert_eq!(previous.category, cola.category);

        let stored = FoodStore::find_by_id(&store, cola.id).await.unwrap().unwrap();
        assert_eq!(stored.category, moved_to);
    }

    #[tokio::test]
    async fn one_line_item_per_bill_and_food() {
        let store = MemoryStore::new();
        let (bill, food) = (ObjectId::new(), ObjectId::new());
        let line = BillInfo::new(bill, food, 2, Decimal::new(30000, 0));
        BillInfoStore::insert(&store, &line).await.unwrap();

        let err = BillInfoStore::insert(&store, &BillInfo::new(bill, food, 1, Decimal::ZERO))
            .await
            .unwrap_err();
        assert!(matches!(err, RepoError::Duplicate(_)));

        assert!(store.increment_quantity(line.id, -2).await.unwrap().is_none());
        let line = store.increment_quantity(line.id, 3).await.unwrap().unwrap();
        assert_eq!(line.quantity, 5);
        assert_eq!(store.delete_by_bill(bill).await.unwrap(), 1);
    }
}
