use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, QueryFilter,
    QueryOrder, Set,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;
use validator::Validate;

use crate::entities::{
    category, menu_item, Category, CategoryModel, MenuItem, MenuItemModel,
};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};

/// Menu catalog: categories and orderable menu items.
#[derive(Clone)]
pub struct CatalogService {
    db: Arc<DatabaseConnection>,
    event_sender: EventSender,
}

impl CatalogService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: EventSender) -> Self {
        Self { db, event_sender }
    }

    pub async fn list_categories(&self) -> Result<Vec<CategoryModel>, ServiceError> {
        let categories = Category::find()
            .order_by_asc(category::Column::Slug)
            .all(&*self.db)
            .await?;
        Ok(categories)
    }

    #[instrument(skip(self, input), fields(slug = %input.slug))]
    pub async fn create_category(
        &self,
        input: CreateCategoryInput,
    ) -> Result<CategoryModel, ServiceError> {
        input.validate()?;

        let model = category::ActiveModel {
            id: Set(Uuid::new_v4()),
            slug: Set(input.slug.clone()),
            title: Set(input.title),
        };

        let created = model.insert(&*self.db).await.map_err(|e| {
            ServiceError::conflict_on_unique(
                e,
                format!("category slug '{}' already exists", input.slug),
            )
        })?;

        self.event_sender
            .send_or_log(Event::CategoryCreated(created.id))
            .await;

        info!(category_id = %created.id, "Created category");
        Ok(created)
    }

    /// Lists menu items with optional category/featured filters and
    /// `price` / `title` ordering (`-` prefix for descending).
    pub async fn list_menu_items(
        &self,
        filters: MenuItemFilters,
    ) -> Result<Vec<MenuItemModel>, ServiceError> {
        let mut query = MenuItem::find();

        if let Some(category_id) = filters.category {
            query = query.filter(menu_item::Column::CategoryId.eq(category_id));
        }
        if let Some(featured) = filters.featured {
            query = query.filter(menu_item::Column::Featured.eq(featured));
        }

        query = match filters.ordering.as_deref() {
            None => query.order_by_asc(menu_item::Column::Title),
            Some("price") => query.order_by_asc(menu_item::Column::Price),
            Some("-price") => query.order_by_desc(menu_item::Column::Price),
            Some("title") => query.order_by_asc(menu_item::Column::Title),
            Some("-title") => query.order_by_desc(menu_item::Column::Title),
            Some(other) => {
                return Err(ServiceError::ValidationError(format!(
                    "unknown ordering field: {other}"
                )))
            }
        };

        Ok(query.all(&*self.db).await?)
    }

    #[instrument(skip(self, input), fields(title = %input.title))]
    pub async fn create_menu_item(
        &self,
        input: CreateMenuItemInput,
    ) -> Result<MenuItemModel, ServiceError> {
        input.validate()?;
        validate_price(input.price)?;
        self.ensure_category_exists(input.category_id).await?;

        let model = menu_item::ActiveModel {
            id: Set(Uuid::new_v4()),
            title: Set(input.title),
            price: Set(input.price),
            featured: Set(input.featured),
            category_id: Set(input.category_id),
        };

        let created = model.insert(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::MenuItemCreated(created.id))
            .await;

        info!(menu_item_id = %created.id, "Created menu item");
        Ok(created)
    }

    pub async fn get_menu_item(&self, id: Uuid) -> Result<MenuItemModel, ServiceError> {
        MenuItem::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("menu item {id} not found")))
    }

    /// Partial update; absent fields keep their stored values.
    #[instrument(skip(self, input))]
    pub async fn update_menu_item(
        &self,
        id: Uuid,
        input: UpdateMenuItemInput,
    ) -> Result<MenuItemModel, ServiceError> {
        let existing = self.get_menu_item(id).await?;

        if let Some(price) = input.price {
            validate_price(price)?;
        }
        if let Some(category_id) = input.category_id {
            self.ensure_category_exists(category_id).await?;
        }

        let mut model: menu_item::ActiveModel = existing.into();
        if let Some(title) = input.title {
            model.title = Set(title);
        }
        if let Some(price) = input.price {
            model.price = Set(price);
        }
        if let Some(featured) = input.featured {
            model.featured = Set(featured);
        }
        if let Some(category_id) = input.category_id {
            model.category_id = Set(category_id);
        }

        Ok(model.update(&*self.db).await?)
    }

    #[instrument(skip(self))]
    pub async fn delete_menu_item(&self, id: Uuid) -> Result<(), ServiceError> {
        let existing = self.get_menu_item(id).await?;
        existing.delete(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::MenuItemDeleted(id))
            .await;

        info!(menu_item_id = %id, "Deleted menu item");
        Ok(())
    }

    async fn ensure_category_exists(&self, category_id: Uuid) -> Result<(), ServiceError> {
        Category::find_by_id(category_id)
            .one(&*self.db)
            .await?
            .map(|_| ())
            .ok_or_else(|| {
                ServiceError::ValidationError(format!("category {category_id} does not exist"))
            })
    }
}

fn validate_price(price: Decimal) -> Result<(), ServiceError> {
    if price <= Decimal::ZERO {
        return Err(ServiceError::ValidationError(
            "price must be greater than zero".to_string(),
        ));
    }
    Ok(())
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateCategoryInput {
    #[validate(length(min = 1, max = 100, message = "slug is required"))]
    pub slug: String,
    #[validate(length(min = 1, max = 255, message = "title is required"))]
    pub title: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateMenuItemInput {
    #[validate(length(min = 1, max = 255, message = "title is required"))]
    pub title: String,
    pub price: Decimal,
    #[serde(default)]
    pub featured: bool,
    pub category_id: Uuid,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateMenuItemInput {
    pub title: Option<String>,
    pub price: Option<Decimal>,
    pub featured: Option<bool>,
    pub category_id: Option<Uuid>,
}

/// Query-string filters for the menu item listing.
#[derive(Debug, Default, Deserialize)]
pub struct MenuItemFilters {
    pub category: Option<Uuid>,
    pub featured: Option<bool>,
    pub ordering: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn price_must_be_positive() {
        assert!(validate_price(dec!(0.01)).is_ok());
        assert!(validate_price(Decimal::ZERO).is_err());
        assert!(validate_price(dec!(-3.50)).is_err());
    }

    #[test]
    fn create_menu_item_input_defaults_featured_off() {
        let json = r#"{
            "title": "Bruschetta",
            "price": "6.50",
            "category_id": "550e8400-e29b-41d4-a716-446655440000"
        }"#;

        let input: CreateMenuItemInput = serde_json::from_str(json).unwrap();
        assert!(!input.featured);
        assert_eq!(input.price, dec!(6.50));
    }

    #[test]
    fn blank_slug_fails_validation() {
        let input = CreateCategoryInput {
            slug: String::new(),
            title: "Mains".to_string(),
        };
        assert!(input.validate().is_err());
    }

    #[test]
    fn filters_deserialize_from_query_shape() {
        let query = r#"{"featured": true, "ordering": "-price"}"#;
        let filters: MenuItemFilters = serde_json::from_str(query).unwrap();
        assert_eq!(filters.featured, Some(true));
        assert_eq!(filters.ordering.as_deref(), Some("-price"));
        assert!(filters.category.is_none());
    }
}
