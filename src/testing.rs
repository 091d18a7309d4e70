//! In-memory backend used by the unit tests. Counts every call by operation
//! name and can be told to fail (500) or reject (401) specific operations.

use std::{
    collections::{HashMap, HashSet},
    sync::Mutex,
};

use async_trait::async_trait;

use crate::{
    api_client::{AdminApi, AuthApi},
    data_types::{
        inventory_data_types::{Ingredient, IngredientPayload, RestockPayload, Unit},
        order_data_types::{Order, OrderItem, OrderItemIngredient, OrderStatus, StatusPayload},
        recipe_data_types::{Drink, DrinkPayload, DrinkType, RecipeIngredient},
        report_data_types::{
            DashboardSummary, ExportRequest, InventoryAlert, MonthlyConsumption, PopularDrink,
        },
        AuthGrant, LoginRequest, RegisterRequest, User,
    },
    errors::ApiError,
};

pub(crate) const ADMIN_EMAIL: &str = "admin@bar.es";
pub(crate) const ADMIN_PASSWORD: &str = "secret";
pub(crate) const ADMIN_TOKEN: &str = "tok-admin";

#[derive(Default)]
pub(crate) struct FakeBackend {
    calls: Mutex<HashMap<String, usize>>,
    failing: Mutex<HashSet<String>>,
    rejecting: Mutex<HashSet<String>>,
    pub(crate) last_ingredient_payload: Mutex<Option<IngredientPayload>>,
    pub(crate) last_drink_payload: Mutex<Option<DrinkPayload>>,
    pub(crate) last_status_payload: Mutex<Option<(i64, StatusPayload)>>,
    pub(crate) last_restock: Mutex<Option<(i64, RestockPayload)>>,
    pub(crate) last_export: Mutex<Option<ExportRequest>>,
    pub(crate) last_year: Mutex<Option<i32>>,
}

impl FakeBackend {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn count(&self, op: &str) -> usize {
        self.calls.lock().unwrap().get(op).copied().unwrap_or(0)
    }

    pub(crate) fn fail(&self, op: &str) {
        self.failing.lock().unwrap().insert(op.to_string());
    }

    pub(crate) fn reject(&self, op: &str) {
        self.rejecting.lock().unwrap().insert(op.to_string());
    }

    pub(crate) fn heal(&self, op: &str) {
        self.failing.lock().unwrap().remove(op);
        self.rejecting.lock().unwrap().remove(op);
    }

    fn record(&self, op: &str) -> Result<(), ApiError> {
        *self.calls.lock().unwrap().entry(op.to_string()).or_default() += 1;
        if self.rejecting.lock().unwrap().contains(op) {
            return Err(ApiError::Unauthorized);
        }
        if self.failing.lock().unwrap().contains(op) {
            return Err(ApiError::Status(500));
        }
        Ok(())
    }
}

pub(crate) fn admin_user() -> User {
    User {
        id: 1,
        username: "admin".to_string(),
        email: ADMIN_EMAIL.to_string(),
        role: "admin".to_string(),
    }
}

pub(crate) fn ingredients() -> Vec<Ingredient> {
    vec![
        Ingredient {
            id: 1,
            name: "Ron".to_string(),
            current_stock: 750.0,
            min_stock_level: 200.0,
            unit: Unit::Ml,
            pump_id: Some(1),
        },
        Ingredient {
            id: 2,
            name: "Menta".to_string(),
            current_stock: 0.0,
            min_stock_level: 10.0,
            unit: Unit::G,
            pump_id: None,
        },
    ]
}

pub(crate) fn drinks() -> Vec<Drink> {
    vec![Drink {
        id: 10,
        name: "Mojito".to_string(),
        description: "Clásico cubano".to_string(),
        image_url: None,
        drink_type: DrinkType::Standard,
        ingredients: vec![
            RecipeIngredient {
                ingredient_id: 1,
                amount: 50.0,
            },
            RecipeIngredient {
                ingredient_id: 2,
                amount: 5.0,
            },
        ],
    }]
}

pub(crate) fn orders() -> Vec<Order> {
    vec![
        Order {
            id: 100,
            user: "lucia".to_string(),
            items: vec![OrderItem {
                drink: "Mojito".to_string(),
                ingredients: vec![OrderItemIngredient {
                    name: "Ron".to_string(),
                    amount: 50.0,
                    unit: "ml".to_string(),
                }],
            }],
            status: OrderStatus::Pending,
            created_at: "2024-05-01T18:30:00Z".to_string(),
        },
        Order {
            id: 101,
            user: "pablo".to_string(),
            items: vec![],
            status: OrderStatus::Preparing,
            created_at: "2024-05-01T18:35:00Z".to_string(),
        },
    ]
}

#[async_trait]
impl AuthApi for FakeBackend {
    async fn login(&self, request: &LoginRequest) -> Result<AuthGrant, ApiError> {
        self.record("login")?;
        if request.email == ADMIN_EMAIL && request.password == ADMIN_PASSWORD {
            Ok(AuthGrant {
                token: ADMIN_TOKEN.to_string(),
                user: Some(admin_user()),
            })
        } else {
            Err(ApiError::Unauthorized)
        }
    }

    async fn register(&self, request: &RegisterRequest) -> Result<AuthGrant, ApiError> {
        self.record("register")?;
        if request.email == ADMIN_EMAIL {
            Ok(AuthGrant {
                token: ADMIN_TOKEN.to_string(),
                user: None,
            })
        } else {
            Err(ApiError::Status(409))
        }
    }

    async fn me(&self, token: &str) -> Result<User, ApiError> {
        self.record("me")?;
        if token == ADMIN_TOKEN {
            Ok(admin_user())
        } else {
            Err(ApiError::Unauthorized)
        }
    }
}

#[async_trait]
impl AdminApi for FakeBackend {
    async fn list_ingredients(&self) -> Result<Vec<Ingredient>, ApiError> {
        self.record("list_ingredients")?;
        Ok(ingredients())
    }

    async fn create_ingredient(&self, payload: &IngredientPayload) -> Result<(), ApiError> {
        self.record("create_ingredient")?;
        *self.last_ingredient_payload.lock().unwrap() = Some(payload.clone());
        Ok(())
    }

    async fn update_ingredient(&self, _id: i64, payload: &IngredientPayload) -> Result<(), ApiError> {
        self.record("update_ingredient")?;
        *self.last_ingredient_payload.lock().unwrap() = Some(payload.clone());
        Ok(())
    }

    async fn delete_ingredient(&self, _id: i64) -> Result<(), ApiError> {
        self.record("delete_ingredient")
    }

    async fn restock_ingredient(&self, id: i64, payload: &RestockPayload) -> Result<(), ApiError> {
        self.record("restock_ingredient")?;
        *self.last_restock.lock().unwrap() = Some((id, payload.clone()));
        Ok(())
    }

    async fn list_drinks(&self) -> Result<Vec<Drink>, ApiError> {
        self.record("list_drinks")?;
        Ok(drinks())
    }

    async fn create_drink(&self, payload: &DrinkPayload) -> Result<(), ApiError> {
        self.record("create_drink")?;
        *self.last_drink_payload.lock().unwrap() = Some(payload.clone());
        Ok(())
    }

    async fn update_drink(&self, _id: i64, payload: &DrinkPayload) -> Result<(), ApiError> {
        self.record("update_drink")?;
        *self.last_drink_payload.lock().unwrap() = Some(payload.clone());
        Ok(())
    }

    async fn delete_drink(&self, _id: i64) -> Result<(), ApiError> {
        self.record("delete_drink")
    }

    async fn list_orders(&self) -> Result<Vec<Order>, ApiError> {
        self.record("list_orders")?;
        Ok(orders())
    }

    async fn update_order_status(&self, id: i64, payload: &StatusPayload) -> Result<(), ApiError> {
        self.record("update_order_status")?;
        *self.last_status_payload.lock().unwrap() = Some((id, payload.clone()));
        Ok(())
    }

    async fn dashboard_summary(&self) -> Result<DashboardSummary, ApiError> {
        self.record("dashboard_summary")?;
        Ok(DashboardSummary {
            total_orders: 2,
            low_stock_count: 1,
            popular_drinks: vec![PopularDrink {
                id: 10,
                name: "Mojito".to_string(),
                count: 7,
            }],
        })
    }

    async fn popular_drinks(&self) -> Result<Vec<PopularDrink>, ApiError> {
        self.record("popular_drinks")?;
        Ok(vec![PopularDrink {
            id: 10,
            name: "Mojito".to_string(),
            count: 7,
        }])
    }

    async fn inventory_alerts(&self) -> Result<Vec<InventoryAlert>, ApiError> {
        self.record("inventory_alerts")?;
        Ok(vec![InventoryAlert {
            id: 2,
            name: "Menta".to_string(),
            current_stock: 0.0,
            min_stock_level: 10.0,
            unit: "g".to_string(),
        }])
    }

    async fn monthly_consumption(&self, year: i32) -> Result<Vec<MonthlyConsumption>, ApiError> {
        self.record("monthly_consumption")?;
        *self.last_year.lock().unwrap() = Some(year);
        Ok(vec![MonthlyConsumption {
            month: "Enero".to_string(),
            value: 31,
        }])
    }

    async fn export_report(&self, request: &ExportRequest) -> Result<Vec<u8>, ApiError> {
        self.record("export_report")?;
        *self.last_export.lock().unwrap() = Some(request.clone());
        Ok(b"%PDF-1.4 fake".to_vec())
    }
}
