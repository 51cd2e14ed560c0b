//! Categories and foods. `Category::foodnumber` follows every food insert, delete
//! and reassignment through atomic increments.

use std::collections::HashMap;

use mongodb::bson::oid::ObjectId;
use rust_decimal::Decimal;

use crate::error::{AppError, AppResult};
use crate::models::category::{Category, CategoryRequest};
use crate::models::food::{CreateFoodRequest, Food, FoodPatch, FoodStatus};
use crate::models::{normalize_string, require_id};
use crate::repository::RepoError;
use crate::state::AppState;

fn required_name(raw: Option<&str>, what: &str) -> AppResult<String> {
    let name = normalize_string(raw.unwrap_or_default());
    if name.is_empty() {
        return Err(AppError::Validation(format!("Missing {} name", what)));
    }
    Ok(name)
}

fn duplicate_name(err: RepoError, what: &str, name: &str) -> AppError {
    match err {
        RepoError::Duplicate(_) => AppError::Conflict(format!("{} {} already exists", what, name)),
        other => other.into(),
    }
}

pub async fn list_categories(state: &AppState) -> AppResult<Vec<Category>> {
    Ok(state.categories.find_all().await?)
}

pub async fn get_category(state: &AppState, id: ObjectId) -> AppResult<Category> {
    state
        .categories
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Category {} not found", id)))
}

pub async fn create_category(state: &AppState, request: CategoryRequest) -> AppResult<Category> {
    let name = required_name(request.name.as_deref(), "category")?;
    if state.categories.find_by_name(&name).await?.is_some() {
        return Err(AppError::Conflict(format!("Category {} already exists", name)));
    }
    let category = Category::new(name);
    state
        .categories
        .insert(&category)
        .await
        .map_err(|e| duplicate_name(e, "Category", &category.name))?;
    tracing::info!(category = %category.id, name = %category.name, "category created");
    Ok(category)
}

pub async fn rename_category(
    state: &AppState,
    id: ObjectId,
    request: CategoryRequest,
) -> AppResult<Category> {
    let name = required_name(request.name.as_deref(), "category")?;
    state
        .categories
        .rename(id, &name)
        .await
        .map_err(|e| duplicate_name(e, "Category", &name))?
        .ok_or_else(|| AppError::NotFound(format!("Category {} not found", id)))
}

/// Deletes the foods of a category, then the category itself.
pub async fn delete_category(state: &AppState, id: ObjectId) -> AppResult<Category> {
    get_category(state, id).await?;
    let removed = state.foods.delete_by_category(id).await?;

    match state.categories.delete(id).await {
        Ok(Some(category)) => {
            tracing::info!(category = %id, foods = removed, "category deleted");
            Ok(category)
        }
        Ok(None) => Err(AppError::NotFound(format!("Category {} not found", id))),
        Err(e) => Err(AppError::partial(
            &format!("{} food(s) of category {} were deleted", removed, id),
            e,
        )),
    }
}

/// Foods paired with their category, `None` when the category is gone.
pub async fn list_foods(state: &AppState) -> AppResult<Vec<(Food, Option<Category>)>> {
    let foods = state.foods.find_all().await?;
    let categories: HashMap<ObjectId, Category> = state
        .categories
        .find_all()
        .await?
        .into_iter()
        .map(|category| (category.id, category))
        .collect();

    Ok(foods
        .into_iter()
        .map(|food| {
            let category = categories.get(&food.category).cloned();
            (food, category)
        })
        .collect())
}

pub async fn get_food(state: &AppState, id: ObjectId) -> AppResult<(Food, Option<Category>)> {
    let food = state
        .foods
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Food {} not found", id)))?;
    let category = state.categories.find_by_id(food.category).await?;
    Ok((food, category))
}

fn check_discount(discount: Decimal) -> AppResult<Decimal> {
    if discount < Decimal::ZERO || discount > Decimal::ONE_HUNDRED {
        return Err(AppError::Validation(format!("Invalid discount {}", discount)));
    }
    Ok(discount)
}

pub async fn create_food(
    state: &AppState,
    request: CreateFoodRequest,
) -> AppResult<(Food, Category)> {
    let name = required_name(request.name.as_deref(), "food")?;
    let price = request
        .price
        .ok_or_else(|| AppError::Validation("Missing price".into()))?;
    if price < Decimal::ZERO {
        return Err(AppError::Validation("price must not be negative".into()));
    }
    let discount = check_discount(request.discount.unwrap_or_default())?;
    let category_id = require_id(request.category.as_deref(), "category")?;
    get_category(state, category_id).await?;
    if state.foods.find_by_name(&name).await?.is_some() {
        return Err(AppError::Conflict(format!("Food {} already exists", name)));
    }

    let food = Food {
        id: ObjectId::new(),
        name,
        price,
        discount,
        description: request.description.unwrap_or_default(),
        so_luong_ton: request.so_luong_ton.unwrap_or_default(),
        img_url: request.img_url.unwrap_or_default(),
        status: FoodStatus::OnSale,
        category: category_id,
    };
    state
        .foods
        .insert(&food)
        .await
        .map_err(|e| duplicate_name(e, "Food", &food.name))?;

    match state.categories.adjust_food_count(category_id, 1).await {
        Ok(Some(category)) => {
            tracing::info!(food = %food.id, category = %category_id, "food created");
            Ok((food, category))
        }
        Ok(None) => Err(AppError::partial(
            &format!("food {} was created", food.id),
            format!("category {} disappeared", category_id),
        )),
        Err(e) => Err(AppError::partial(&format!("food {} was created", food.id), e)),
    }
}

/// Applies a whitelisted patch. Moving a food to another category moves one unit
/// of `foodnumber` with it.
pub async fn update_food(
    state: &AppState,
    id: ObjectId,
    patch: FoodPatch,
) -> AppResult<(Food, Option<Category>)> {
    if patch == FoodPatch::default() {
        return Err(AppError::Validation("Nothing to update".into()));
    }
    if let Some(target) = patch.category {
        get_category(state, target).await?;
    }

    // Counters follow the category this write replaced.
    let name = patch.name.clone().unwrap_or_default();
    let previous = state
        .foods
        .update(id, &patch)
        .await
        .map_err(|e| duplicate_name(e, "Food", &name))?
        .ok_or_else(|| AppError::NotFound(format!("Food {} not found", id)))?;
    let mut food = previous.clone();
    patch.apply(&mut food);

    if food.category != previous.category {
        let applied = format!("food {} moved to category {}", id, food.category);
        if let Err(e) = state.categories.adjust_food_count(previous.category, -1).await {
            return Err(AppError::partial(&applied, e));
        }
        if let Err(e) = state.categories.adjust_food_count(food.category, 1).await {
            return Err(AppError::partial(&applied, e));
        }
        tracing::info!(food = %id, from = %previous.category, to = %food.category, "food recategorised");
    }

    let category = state.categories.find_by_id(food.category).await?;
    Ok((food, category))
}

pub async fn delete_food(state: &AppState, id: ObjectId) -> AppResult<Food> {
    let food = state
        .foods
        .delete(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Food {} not found", id)))?;

    match state.categories.adjust_food_count(food.category, -1).await {
        Ok(Some(_)) => {}
        Ok(None) => tracing::warn!(food = %id, category = %food.category, "category of deleted food is gone"),
        Err(e) => return Err(AppError::partial(&format!("food {} was deleted", id), e)),
    }
    tracing::info!(food = %id, "food deleted");
    Ok(food)
}
