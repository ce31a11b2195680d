//! Reqwest-backed hosted store adapter.
//!
//! Speaks the store's REST dialect: tables under `rest/v1/<table>`, row
//! filters as `column=eq.value`, `Prefer: return=representation` to get
//! written rows back, and the user endpoint at `auth/v1/user`.

use crate::{
    orders::models::{NewOrder, Order, OrderStatus},
    ports::{Identity, IdentityProvider, OrderRepository, PersistenceError, ProductRepository},
    pricing::Amount,
    products::models::Product,
};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, Url};
use serde::{de::DeserializeOwned, Deserialize};
use serde_json::json;
use uuid::Uuid;

const ORDERS_TABLE: &str = "orders";
const PRODUCTS_TABLE: &str = "products";
const RETURN_REPRESENTATION: &str = "return=representation";

/// Adapter for the hosted table store
pub struct RestStore {
    client: Client,
    base: Url,
    api_key: String,
}

impl RestStore {
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(base: Url, api_key: impl Into<String>) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: Client::builder().build()?,
            base: with_trailing_slash(base),
            api_key: api_key.into(),
        })
    }

    fn table_url(&self, table: &str, filter: Option<(&str, &str)>) -> Result<Url, PersistenceError> {
        table_url(&self.base, table, filter)
    }

    fn authorized(&self, request: RequestBuilder, bearer: &str) -> RequestBuilder {
        request
            .header("apikey", self.api_key.as_str())
            .bearer_auth(bearer)
    }

    async fn rows<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<Vec<T>, PersistenceError> {
        let response = self
            .authorized(request, &self.api_key)
            .send()
            .await
            .map_err(map_transport_error)?;

        decode(response).await
    }
}

#[async_trait]
impl OrderRepository for RestStore {
    async fn insert_order(&self, order: NewOrder) -> Result<Order, PersistenceError> {
        let url = self.table_url(ORDERS_TABLE, None)?;
        let rows: Vec<Order> = self
            .rows(
                self.client
                    .post(url)
                    .header("Prefer", RETURN_REPRESENTATION)
                    .json(&order),
            )
            .await?;

        rows.into_iter()
            .next()
            .ok_or_else(|| PersistenceError::decode("insert returned no rows"))
    }

    async fn find_order(&self, id: Uuid) -> Result<Option<Order>, PersistenceError> {
        let id = id.to_string();
        let url = self.table_url(ORDERS_TABLE, Some(("id", &id)))?;
        let rows: Vec<Order> = self.rows(self.client.get(url)).await?;
        Ok(rows.into_iter().next())
    }

    async fn update_order_status(
        &self,
        id: Uuid,
        status: OrderStatus,
    ) -> Result<Order, PersistenceError> {
        let id = id.to_string();
        let url = self.table_url(ORDERS_TABLE, Some(("id", &id)))?;
        let rows: Vec<Order> = self
            .rows(
                self.client
                    .patch(url)
                    .header("Prefer", RETURN_REPRESENTATION)
                    .json(&json!({ "status": status })),
            )
            .await?;

        rows.into_iter()
            .next()
            .ok_or_else(|| PersistenceError::not_found("order", id))
    }
}

#[async_trait]
impl ProductRepository for RestStore {
    async fn list_products(&self) -> Result<Vec<Product>, PersistenceError> {
        let url = self.table_url(PRODUCTS_TABLE, None)?;
        self.rows(self.client.get(url)).await
    }

    async fn find_product(&self, id: &str) -> Result<Option<Product>, PersistenceError> {
        let url = self.table_url(PRODUCTS_TABLE, Some(("id", id)))?;
        let rows: Vec<Product> = self.rows(self.client.get(url)).await?;
        Ok(rows.into_iter().next())
    }

    async fn update_product_price(
        &self,
        id: &str,
        price: Amount,
    ) -> Result<Product, PersistenceError> {
        let url = self.table_url(PRODUCTS_TABLE, Some(("id", id)))?;
        let rows: Vec<Product> = self
            .rows(
                self.client
                    .patch(url)
                    .header("Prefer", RETURN_REPRESENTATION)
                    .json(&json!({ "price": price })),
            )
            .await?;

        rows.into_iter()
            .next()
            .ok_or_else(|| PersistenceError::not_found("product", id))
    }
}

/// Shape of the user endpoint response
#[derive(Debug, Deserialize)]
struct UserDto {
    id: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    phone: Option<String>,
    #[serde(default)]
    user_metadata: UserMetadataDto,
}

#[derive(Debug, Default, Deserialize)]
struct UserMetadataDto {
    #[serde(default)]
    full_name: Option<String>,
    #[serde(default)]
    phone: Option<String>,
}

impl From<UserDto> for Identity {
    fn from(user: UserDto) -> Self {
        Identity {
            user_id: user.id,
            full_name: user.user_metadata.full_name,
            phone: user
                .user_metadata
                .phone
                .or(user.phone)
                .filter(|p| !p.is_empty()),
            email: user.email.filter(|e| !e.is_empty()),
        }
    }
}

#[async_trait]
impl IdentityProvider for RestStore {
    async fn current_identity(
        &self,
        token: Option<&str>,
    ) -> Result<Option<Identity>, PersistenceError> {
        let Some(token) = token else {
            return Ok(None);
        };

        let url = self
            .base
            .join("auth/v1/user")
            .map_err(|e| PersistenceError::request(format!("invalid store url: {e}")))?;
        let response = self
            .authorized(self.client.get(url), token)
            .send()
            .await
            .map_err(map_transport_error)?;

        // An expired or unknown token means "not signed in"
        if response.status() == reqwest::StatusCode::UNAUTHORIZED {
            return Ok(None);
        }

        let user: UserDto = decode(response).await?;
        Ok(Some(user.into()))
    }
}

fn with_trailing_slash(mut base: Url) -> Url {
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    base
}

fn table_url(base: &Url, table: &str, filter: Option<(&str, &str)>) -> Result<Url, PersistenceError> {
    let mut url = base
        .join(&format!("rest/v1/{table}"))
        .map_err(|e| PersistenceError::request(format!("invalid store url: {e}")))?;

    url.query_pairs_mut().append_pair("select", "*");
    if let Some((column, value)) = filter {
        url.query_pairs_mut()
            .append_pair(column, &format!("eq.{value}"));
    }

    Ok(url)
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, PersistenceError> {
    let status = response.status();
    let body = response.bytes().await.map_err(map_transport_error)?;

    if !status.is_success() {
        return Err(map_status_error(status, body.as_ref()));
    }

    serde_json::from_slice(&body).map_err(|e| PersistenceError::decode(e.to_string()))
}

fn map_transport_error(error: reqwest::Error) -> PersistenceError {
    PersistenceError::request(format!("store request failed: {error}"))
}

/// Error bodies carry a `message` field; fall back to the raw text.
fn map_status_error(status: reqwest::StatusCode, body: &[u8]) -> PersistenceError {
    #[derive(Deserialize)]
    struct ErrorBody {
        message: String,
    }

    let detail = serde_json::from_slice::<ErrorBody>(body)
        .map(|b| b.message)
        .unwrap_or_else(|_| String::from_utf8_lossy(body).into_owned());

    PersistenceError::request(format!("store returned {status}: {detail}"))
}
