use std::time::Instant;

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::{de::DeserializeOwned, Serialize};

use crate::{
    config::Config,
    constants::{
        DASHBOARD_PATH, DRINKS_PATH, EXPORT_PATH, INGREDIENTS_PATH, INVENTORY_ALERTS_PATH,
        LOGIN_PATH, ME_PATH, MONTHLY_CONSUMPTION_PATH, ORDERS_ADMIN_PATH, ORDERS_PATH,
        POPULAR_DRINKS_PATH, REGISTER_PATH,
    },
    data_types::{
        inventory_data_types::{Ingredient, IngredientPayload, RestockPayload},
        order_data_types::{Order, OrderRecord, StatusPayload},
        recipe_data_types::{Drink, DrinkPayload},
        report_data_types::{
            DashboardSummary, ExportRequest, InventoryAlert, MonthlyConsumption,
            MonthlyConsumptionRecord, PopularDrink,
        },
        AuthEnvelope, AuthGrant, Envelope, LoginRequest, RegisterRequest, User,
    },
    errors::ApiError,
    session::CredentialHandle,
};

/// Unauthenticated endpoints plus identity resolution for an explicit credential.
#[async_trait]
pub trait AuthApi: Send + Sync {
    async fn login(&self, request: &LoginRequest) -> Result<AuthGrant, ApiError>;
    async fn register(&self, request: &RegisterRequest) -> Result<AuthGrant, ApiError>;
    async fn me(&self, token: &str) -> Result<User, ApiError>;
}

/// Resource endpoints; implementations attach the session's bearer credential.
#[async_trait]
pub trait AdminApi: Send + Sync {
    async fn list_ingredients(&self) -> Result<Vec<Ingredient>, ApiError>;
    async fn create_ingredient(&self, payload: &IngredientPayload) -> Result<(), ApiError>;
    async fn update_ingredient(&self, id: i64, payload: &IngredientPayload) -> Result<(), ApiError>;
    async fn delete_ingredient(&self, id: i64) -> Result<(), ApiError>;
    async fn restock_ingredient(&self, id: i64, payload: &RestockPayload) -> Result<(), ApiError>;

    async fn list_drinks(&self) -> Result<Vec<Drink>, ApiError>;
    async fn create_drink(&self, payload: &DrinkPayload) -> Result<(), ApiError>;
    async fn update_drink(&self, id: i64, payload: &DrinkPayload) -> Result<(), ApiError>;
    async fn delete_drink(&self, id: i64) -> Result<(), ApiError>;

    async fn list_orders(&self) -> Result<Vec<Order>, ApiError>;
    async fn update_order_status(&self, id: i64, payload: &StatusPayload) -> Result<(), ApiError>;

    async fn dashboard_summary(&self) -> Result<DashboardSummary, ApiError>;
    async fn popular_drinks(&self) -> Result<Vec<PopularDrink>, ApiError>;
    async fn inventory_alerts(&self) -> Result<Vec<InventoryAlert>, ApiError>;
    async fn monthly_consumption(&self, year: i32) -> Result<Vec<MonthlyConsumption>, ApiError>;
    async fn export_report(&self, request: &ExportRequest) -> Result<Vec<u8>, ApiError>;
}

pub struct ApiClient {
    http: reqwest::Client,
    config: Config,
    credential: CredentialHandle,
}

impl ApiClient {
    pub fn new(config: Config, credential: CredentialHandle) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;

        Ok(ApiClient {
            http,
            config,
            credential,
        })
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self.http.request(method, self.config.endpoint(path));
        match self.credential.get() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn read<T: DeserializeOwned>(&self, builder: RequestBuilder, path: &str) -> Result<T, ApiError> {
        let now = Instant::now();
        let resp = check_status(builder.send().await?)?;
        let bytes = resp.bytes().await?;
        let data = serde_json::from_slice::<Envelope<T>>(&bytes)?.into_data()?;
        log::debug!("GET {}: {:.2?}", path, now.elapsed());
        Ok(data)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.read(self.request(Method::GET, path), path).await
    }

    async fn write<B: Serialize + ?Sized + Sync>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<(), ApiError> {
        let now = Instant::now();
        let mut builder = self.request(method.clone(), path);
        if let Some(body) = body {
            builder = builder.json(body);
        }

        let resp = check_status(builder.send().await?)?;
        let bytes = resp.bytes().await?;
        log::debug!("{} {}: {:.2?}", method, path, now.elapsed());

        // some write endpoints answer with an empty body
        if bytes.iter().all(|b| b.is_ascii_whitespace()) {
            return Ok(());
        }
        let envelope: Envelope<serde_json::Value> = serde_json::from_slice(&bytes)?;
        if !envelope.success {
            return Err(ApiError::Unsuccessful(
                envelope.message.unwrap_or_else(|| "success: false".to_string()),
            ));
        }
        Ok(())
    }

    async fn authenticate<B: Serialize + Sync>(&self, path: &str, body: &B) -> Result<AuthGrant, ApiError> {
        let resp = self
            .http
            .post(self.config.endpoint(path))
            .json(body)
            .send()
            .await?;
        let bytes = check_status(resp)?.bytes().await?;
        serde_json::from_slice::<AuthEnvelope>(&bytes)?.into_grant()
    }
}

fn check_status(resp: Response) -> Result<Response, ApiError> {
    match resp.status() {
        StatusCode::UNAUTHORIZED => Err(ApiError::Unauthorized),
        status if !status.is_success() => Err(ApiError::Status(status.as_u16())),
        _ => Ok(resp),
    }
}

#[async_trait]
impl AuthApi for ApiClient {
    async fn login(&self, request: &LoginRequest) -> Result<AuthGrant, ApiError> {
        self.authenticate(LOGIN_PATH, request).await
    }

    async fn register(&self, request: &RegisterRequest) -> Result<AuthGrant, ApiError> {
        self.authenticate(REGISTER_PATH, request).await
    }

    async fn me(&self, token: &str) -> Result<User, ApiError> {
        let builder = self.http.get(self.config.endpoint(ME_PATH)).bearer_auth(token);
        self.read(builder, ME_PATH).await
    }
}

#[async_trait]
impl AdminApi for ApiClient {
    async fn list_ingredients(&self) -> Result<Vec<Ingredient>, ApiError> {
        self.get(INGREDIENTS_PATH).await
    }

    async fn create_ingredient(&self, payload: &IngredientPayload) -> Result<(), ApiError> {
        self.write(Method::POST, INGREDIENTS_PATH, Some(payload)).await
    }

    async fn update_ingredient(&self, id: i64, payload: &IngredientPayload) -> Result<(), ApiError> {
        let path = format!("{}/{}", INGREDIENTS_PATH, id);
        self.write(Method::PUT, &path, Some(payload)).await
    }

    async fn delete_ingredient(&self, id: i64) -> Result<(), ApiError> {
        let path = format!("{}/{}", INGREDIENTS_PATH, id);
        self.write::<()>(Method::DELETE, &path, None).await
    }

    async fn restock_ingredient(&self, id: i64, payload: &RestockPayload) -> Result<(), ApiError> {
        let path = format!("{}/{}/restock", INGREDIENTS_PATH, id);
        self.write(Method::PUT, &path, Some(payload)).await
    }

    async fn list_drinks(&self) -> Result<Vec<Drink>, ApiError> {
        self.get(DRINKS_PATH).await
    }

    async fn create_drink(&self, payload: &DrinkPayload) -> Result<(), ApiError> {
        self.write(Method::POST, DRINKS_PATH, Some(payload)).await
    }

    async fn update_drink(&self, id: i64, payload: &DrinkPayload) -> Result<(), ApiError> {
        let path = format!("{}/{}", DRINKS_PATH, id);
        self.write(Method::PUT, &path, Some(payload)).await
    }

    async fn delete_drink(&self, id: i64) -> Result<(), ApiError> {
        let path = format!("{}/{}", DRINKS_PATH, id);
        self.write::<()>(Method::DELETE, &path, None).await
    }

    async fn list_orders(&self) -> Result<Vec<Order>, ApiError> {
        let records: Vec<OrderRecord> = self.get(ORDERS_ADMIN_PATH).await?;
        Ok(records.into_iter().map(Order::from).collect())
    }

    async fn update_order_status(&self, id: i64, payload: &StatusPayload) -> Result<(), ApiError> {
        let path = format!("{}/{}/status", ORDERS_PATH, id);
        self.write(Method::PUT, &path, Some(payload)).await
    }

    async fn dashboard_summary(&self) -> Result<DashboardSummary, ApiError> {
        self.get(DASHBOARD_PATH).await
    }

    async fn popular_drinks(&self) -> Result<Vec<PopularDrink>, ApiError> {
        self.get(POPULAR_DRINKS_PATH).await
    }

    async fn inventory_alerts(&self) -> Result<Vec<InventoryAlert>, ApiError> {
        self.get(INVENTORY_ALERTS_PATH).await
    }

    async fn monthly_consumption(&self, year: i32) -> Result<Vec<MonthlyConsumption>, ApiError> {
        let builder = self
            .request(Method::GET, MONTHLY_CONSUMPTION_PATH)
            .query(&[("year", year)]);
        let records: Vec<MonthlyConsumptionRecord> =
            self.read(builder, MONTHLY_CONSUMPTION_PATH).await?;
        Ok(records.into_iter().map(MonthlyConsumption::from).collect())
    }

    async fn export_report(&self, request: &ExportRequest) -> Result<Vec<u8>, ApiError> {
        let now = Instant::now();
        let resp = self
            .request(Method::POST, EXPORT_PATH)
            .json(request)
            .send()
            .await?;
        let payload = check_status(resp)?.bytes().await?;
        log::debug!(
            "Export {} ({} bytes): {:.2?}",
            request.filename(),
            payload.len(),
            now.elapsed()
        );
        Ok(payload.to_vec())
    }
}
