use std::sync::RwLock;

use reqwest::{Client, RequestBuilder};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{json, Value};
use tracing::{error, warn};

use crate::error::ApiError;
use crate::i18n::Locale;
use crate::models::bot::{
    BotDetailResponse, BotResponse, BotsResponse, BroadcastResponse, BroadcastsResponse,
    MessageResponse, PakasirTestRequest,
};
use crate::models::bot_user::BotUsersResponse;
use crate::models::command::{CommandResponse, CommandsResponse};
use crate::models::product::{AddStockRequest, AddStockResponse, ProductResponse, ProductsResponse};
use crate::models::proxy::{ProxiesResponse, ProxyCheckRequest, ProxyResponse};
use crate::models::transaction::TransactionsResponse;
use crate::models::user::{LoginRequest, MeResponse, RegisterRequest};
use crate::models::verification::{
    SettingsResponse, TypesResponse, VerificationResponse, VerificationsResponse,
    VerifyLinkRequest,
};
use crate::models::{
    AuthSession, AuthUser, Bot, BotUser, Broadcast, Command, CreateBotRequest,
    LinkCheck, PakasirTestResult, Product, ProductInput, ProxyCheck, ProxyInput,
    SaveCommandRequest, SheerIdSettings, SheerIdType, Transaction, UpdateBotRequest, UserProxy,
    Verification, VerificationStatus, VerificationSubmission,
};
use crate::services::local_storage::{LocalStorage, ACCESS_TOKEN_KEY};

pub type ApiResult<T> = Result<T, ApiError>;

/// `{data|error}` envelope, as printed by `--json` output.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn from_result(result: ApiResult<T>, locale: Locale) -> Self {
        match result {
            Ok(data) => Self {
                data: Some(data),
                error: None,
            },
            Err(e) => Self {
                data: None,
                error: Some(e.message(locale)),
            },
        }
    }
}

/// REST client for the bot-store backend. Holds the bearer token and keeps
/// it in local storage when one is attached.
pub struct ApiClient {
    http: Client,
    base_url: String,
    locale: Locale,
    token: RwLock<Option<String>>,
    storage: Option<LocalStorage>,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>, locale: Locale) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            locale,
            token: RwLock::new(None),
            storage: None,
        }
    }

    /// Attaches persistent storage and loads any token saved by a previous run.
    pub async fn with_local_storage(mut self, storage: LocalStorage) -> Result<Self, sqlx::Error> {
        let saved = storage.get(ACCESS_TOKEN_KEY).await?;
        self.token = RwLock::new(saved);
        self.storage = Some(storage);
        Ok(self)
    }

    pub fn locale(&self) -> Locale {
        self.locale
    }

    pub fn token(&self) -> Option<String> {
        match self.token.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub async fn set_token(&self, token: Option<String>) {
        match self.token.write() {
            Ok(mut guard) => *guard = token.clone(),
            Err(poisoned) => *poisoned.into_inner() = token.clone(),
        }

        let Some(storage) = &self.storage else {
            return;
        };
        let persisted = match &token {
            Some(value) => storage.set(ACCESS_TOKEN_KEY, value).await,
            None => storage.remove(ACCESS_TOKEN_KEY).await,
        };
        if let Err(e) = persisted {
            warn!("Failed to persist access token: {}", e);
        }
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url, endpoint)
    }

    async fn get<T: DeserializeOwned>(&self, endpoint: &str) -> ApiResult<T> {
        self.send(self.http.get(self.url(endpoint))).await
    }

    async fn post<T, B>(&self, endpoint: &str, body: &B) -> ApiResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.send(self.http.post(self.url(endpoint)).json(body)).await
    }

    async fn put<T, B>(&self, endpoint: &str, body: &B) -> ApiResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.send(self.http.put(self.url(endpoint)).json(body)).await
    }

    async fn delete<T: DeserializeOwned>(&self, endpoint: &str) -> ApiResult<T> {
        self.send(self.http.delete(self.url(endpoint))).await
    }

    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder) -> ApiResult<T> {
        let builder = match self.token() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        };

        let response = builder.send().await.map_err(|e| {
            error!("API Error: {}", e);
            ApiError::Network(e)
        })?;
        let status = response.status();
        let body = response.bytes().await?;

        if !status.is_success() {
            let message = serde_json::from_slice::<Value>(&body)
                .ok()
                .and_then(|v| v.get("error").and_then(Value::as_str).map(str::to_string));
            return Err(ApiError::Application {
                status: status.as_u16(),
                message,
            });
        }

        serde_json::from_slice(&body).map_err(|e| {
            error!("API Error: unreadable response: {}", e);
            ApiError::Decode(e.to_string())
        })
    }

    // ==================== AUTH ====================

    pub async fn register(&self, email: &str, password: &str, name: &str) -> ApiResult<AuthSession> {
        let session: AuthSession = self
            .post("/auth/register", &RegisterRequest { email, password, name })
            .await?;
        self.set_token(Some(session.access_token.clone())).await;
        Ok(session)
    }

    pub async fn login(&self, email: &str, password: &str) -> ApiResult<AuthSession> {
        let session: AuthSession = self
            .post("/auth/login", &LoginRequest { email, password })
            .await?;
        self.set_token(Some(session.access_token.clone())).await;
        Ok(session)
    }

    pub async fn me(&self) -> ApiResult<AuthUser> {
        let me: MeResponse = self.get("/auth/me").await?;
        Ok(me.user)
    }

    pub async fn logout(&self) {
        self.set_token(None).await;
    }

    // ==================== BOTS ====================

    pub async fn bots(&self) -> ApiResult<Vec<Bot>> {
        let resp: BotsResponse = self.get("/bots").await?;
        Ok(resp.bots)
    }

    pub async fn create_bot(&self, request: &CreateBotRequest) -> ApiResult<Bot> {
        let resp: BotResponse = self.post("/bots", request).await?;
        Ok(resp.bot)
    }

    pub async fn bot(&self, bot_id: i64) -> ApiResult<BotDetailResponse> {
        self.get(&format!("/bots/{bot_id}")).await
    }

    pub async fn update_bot(&self, bot_id: i64, request: &UpdateBotRequest) -> ApiResult<Bot> {
        let resp: BotResponse = self.put(&format!("/bots/{bot_id}"), request).await?;
        Ok(resp.bot)
    }

    pub async fn delete_bot(&self, bot_id: i64) -> ApiResult<Option<String>> {
        let resp: MessageResponse = self.delete(&format!("/bots/{bot_id}")).await?;
        Ok(resp.message)
    }

    pub async fn test_pakasir(&self, slug: &str, api_key: &str) -> ApiResult<PakasirTestResult> {
        self.post("/pakasir/test", &PakasirTestRequest { slug, api_key })
            .await
    }

    // ==================== PRODUCTS ====================

    pub async fn products(&self, bot_id: i64) -> ApiResult<Vec<Product>> {
        let resp: ProductsResponse = self.get(&format!("/bots/{bot_id}/products")).await?;
        Ok(resp.products)
    }

    pub async fn create_product(&self, bot_id: i64, input: &ProductInput) -> ApiResult<Product> {
        let resp: ProductResponse = self.post(&format!("/bots/{bot_id}/products"), input).await?;
        Ok(resp.product)
    }

    pub async fn update_product(
        &self,
        bot_id: i64,
        product_id: i64,
        input: &ProductInput,
    ) -> ApiResult<Product> {
        let resp: ProductResponse = self
            .put(&format!("/bots/{bot_id}/products/{product_id}"), input)
            .await?;
        Ok(resp.product)
    }

    pub async fn delete_product(&self, bot_id: i64, product_id: i64) -> ApiResult<Option<String>> {
        let resp: MessageResponse = self
            .delete(&format!("/bots/{bot_id}/products/{product_id}"))
            .await?;
        Ok(resp.message)
    }

    pub async fn add_product_stock(&self, product_id: i64, stock_items: &[String]) -> ApiResult<i64> {
        let resp: AddStockResponse = self
            .post(
                &format!("/products/{product_id}/stock"),
                &AddStockRequest { stock_items },
            )
            .await?;
        Ok(resp.added_count)
    }

    // ==================== TRANSACTIONS / USERS / COMMANDS ====================

    pub async fn transactions(&self, bot_id: i64) -> ApiResult<Vec<Transaction>> {
        let resp: TransactionsResponse = self.get(&format!("/bots/{bot_id}/transactions")).await?;
        Ok(resp.transactions)
    }

    pub async fn bot_users(&self, bot_id: i64) -> ApiResult<Vec<BotUser>> {
        let resp: BotUsersResponse = self.get(&format!("/bots/{bot_id}/users")).await?;
        Ok(resp.users)
    }

    pub async fn commands(&self, bot_id: i64) -> ApiResult<Vec<Command>> {
        let resp: CommandsResponse = self.get(&format!("/bots/{bot_id}/commands")).await?;
        Ok(resp.commands)
    }

    pub async fn save_command(&self, bot_id: i64, request: &SaveCommandRequest) -> ApiResult<Command> {
        let resp: CommandResponse = self.post(&format!("/bots/{bot_id}/commands"), request).await?;
        Ok(resp.command)
    }

    // ==================== BROADCAST ====================

    pub async fn broadcasts(&self, bot_id: i64) -> ApiResult<Vec<Broadcast>> {
        let resp: BroadcastsResponse = self.get(&format!("/bots/{bot_id}/broadcast")).await?;
        Ok(resp.broadcasts)
    }

    pub async fn send_broadcast(&self, bot_id: i64, message: &str) -> ApiResult<Broadcast> {
        let resp: BroadcastResponse = self
            .post(&format!("/bots/{bot_id}/broadcast"), &json!({ "message": message }))
            .await?;
        Ok(resp.broadcast)
    }

    // ==================== SHEERID VERIFICATION ====================

    pub async fn sheerid_types(&self) -> ApiResult<Vec<SheerIdType>> {
        let resp: TypesResponse = self.get("/sheerid/types").await?;
        Ok(resp.types)
    }

    pub async fn check_link(&self, url: &str, verify_type: &str) -> ApiResult<LinkCheck> {
        self.post("/sheerid/check-link", &VerifyLinkRequest { url, verify_type })
            .await
    }

    pub async fn submit_verification(
        &self,
        url: &str,
        verify_type: &str,
    ) -> ApiResult<VerificationSubmission> {
        self.post("/sheerid/verify", &VerifyLinkRequest { url, verify_type })
            .await
    }

    pub async fn verifications(&self) -> ApiResult<Vec<Verification>> {
        let resp: VerificationsResponse = self.get("/sheerid/verifications").await?;
        Ok(resp.verifications)
    }

    pub async fn verification(&self, verification_id: i64) -> ApiResult<Verification> {
        let resp: VerificationResponse = self
            .get(&format!("/sheerid/verifications/{verification_id}"))
            .await?;
        Ok(resp.verification)
    }

    pub async fn verification_status(&self, verification_id: i64) -> ApiResult<VerificationStatus> {
        self.get(&format!("/sheerid/verifications/{verification_id}/status"))
            .await
    }

    pub async fn sheerid_settings(&self) -> ApiResult<SheerIdSettings> {
        let resp: SettingsResponse = self.get("/sheerid/settings").await?;
        Ok(resp.settings)
    }

    pub async fn save_sheerid_settings(&self, settings: &SheerIdSettings) -> ApiResult<SheerIdSettings> {
        let resp: SettingsResponse = self.post("/sheerid/settings", settings).await?;
        Ok(resp.settings)
    }

    pub async fn proxy_check(
        &self,
        host: &str,
        port: u16,
        username: Option<&str>,
        password: Option<&str>,
    ) -> ApiResult<ProxyCheck> {
        self.post(
            "/sheerid/proxy-check",
            &ProxyCheckRequest {
                host,
                port,
                username,
                password,
            },
        )
        .await
    }

    // ==================== SAVED PROXIES ====================

    pub async fn proxies(&self) -> ApiResult<Vec<UserProxy>> {
        let resp: ProxiesResponse = self.get("/sheerid/proxies").await?;
        Ok(resp.proxies)
    }

    pub async fn add_proxy(&self, input: &ProxyInput) -> ApiResult<UserProxy> {
        let resp: ProxyResponse = self.post("/sheerid/proxies", input).await?;
        Ok(resp.proxy)
    }

    pub async fn update_proxy(&self, proxy_id: i64, input: &ProxyInput) -> ApiResult<UserProxy> {
        let resp: ProxyResponse = self.put(&format!("/sheerid/proxies/{proxy_id}"), input).await?;
        Ok(resp.proxy)
    }

    pub async fn delete_proxy(&self, proxy_id: i64) -> ApiResult<Option<String>> {
        let resp: MessageResponse = self.delete(&format!("/sheerid/proxies/{proxy_id}")).await?;
        Ok(resp.message)
    }

    pub async fn activate_proxy(&self, proxy_id: i64) -> ApiResult<UserProxy> {
        let resp: ProxyResponse = self
            .post(&format!("/sheerid/proxies/{proxy_id}/activate"), &json!({}))
            .await?;
        Ok(resp.proxy)
    }

    pub async fn deactivate_proxy(&self, proxy_id: i64) -> ApiResult<Option<String>> {
        let resp: MessageResponse = self
            .post(&format!("/sheerid/proxies/{proxy_id}/deactivate"), &json!({}))
            .await?;
        Ok(resp.message)
    }

    pub async fn test_proxy(&self, proxy_id: i64) -> ApiResult<ProxyCheck> {
        self.post(&format!("/sheerid/proxies/{proxy_id}/test"), &json!({}))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use crate::testing::spawn_backend;
    use actix_web::{web, HttpRequest, HttpResponse};

    async fn whoami(req: HttpRequest) -> HttpResponse {
        match req.headers().get("authorization").and_then(|v| v.to_str().ok()) {
            Some("Bearer secret-token") => HttpResponse::Ok().json(json!({
                "user": { "id": 1, "email": "op@example.com", "name": "Operator" }
            })),
            _ => HttpResponse::Unauthorized().json(json!({ "error": "Token tidak valid" })),
        }
    }

    async fn login(body: web::Json<Value>) -> HttpResponse {
        if body["password"] == "hunter2" {
            HttpResponse::Ok().json(json!({
                "user": { "id": 1, "email": body["email"], "name": "Operator" },
                "access_token": "secret-token"
            }))
        } else {
            HttpResponse::Unauthorized().json(json!({ "error": "Email atau password salah" }))
        }
    }

    async fn broken() -> HttpResponse {
        HttpResponse::InternalServerError().body("<html>gateway exploded</html>")
    }

    fn routes(cfg: &mut web::ServiceConfig) {
        cfg.route("/api/auth/me", web::get().to(whoami))
            .route("/api/auth/login", web::post().to(login))
            .route("/api/bots", web::get().to(broken));
    }

    #[actix_web::test]
    async fn bearer_token_is_attached_when_present() {
        let (backend, handle) = spawn_backend(routes).await;
        let api = ApiClient::new(format!("{backend}/api"), Locale::Id);

        let err = api.me().await.unwrap_err();
        assert_eq!(err.status(), Some(401));
        assert_eq!(err.message(api.locale()), "Token tidak valid");

        api.set_token(Some("secret-token".into())).await;
        let user = api.me().await.unwrap();
        assert_eq!(user.email, "op@example.com");

        handle.stop(false).await;
    }

    #[actix_web::test]
    async fn non_json_errors_use_the_generic_message() {
        let (backend, handle) = spawn_backend(routes).await;
        let api = ApiClient::new(format!("{backend}/api"), Locale::Id);

        let err = api.bots().await.unwrap_err();
        assert_eq!(err.status(), Some(500));
        assert_eq!(err.message(Locale::Id), "Terjadi kesalahan");

        handle.stop(false).await;
    }

    #[actix_web::test]
    async fn unreachable_backend_reports_connectivity() {
        let api = ApiClient::new("http://127.0.0.1:1/api", Locale::Id);
        let err = api.bots().await.unwrap_err();
        assert!(matches!(err, ApiError::Network(_)));
        assert_eq!(err.message(Locale::Id), "Tidak dapat terhubung ke server");

        let envelope = ApiResponse::from_result(api.bots().await, Locale::En);
        assert!(envelope.data.is_none());
        assert_eq!(envelope.error.as_deref(), Some("Unable to reach the server"));
    }

    #[actix_web::test]
    async fn login_persists_token_and_logout_clears_it() {
        let (backend, handle) = spawn_backend(routes).await;
        let pool = db::init_pool("sqlite::memory:").await.unwrap();
        let storage = LocalStorage::new(pool);

        let api = ApiClient::new(format!("{backend}/api"), Locale::Id)
            .with_local_storage(storage.clone())
            .await
            .unwrap();
        assert_eq!(api.token(), None);

        let err = api.login("op@example.com", "wrong").await.unwrap_err();
        assert_eq!(err.message(Locale::Id), "Email atau password salah");
        assert_eq!(storage.get(ACCESS_TOKEN_KEY).await.unwrap(), None);

        let session = api.login("op@example.com", "hunter2").await.unwrap();
        assert_eq!(session.access_token, "secret-token");
        assert_eq!(
            storage.get(ACCESS_TOKEN_KEY).await.unwrap().as_deref(),
            Some("secret-token")
        );

        // a fresh client picks the saved token back up
        let reopened = ApiClient::new(format!("{backend}/api"), Locale::Id)
            .with_local_storage(storage.clone())
            .await
            .unwrap();
        assert_eq!(reopened.me().await.unwrap().name.as_deref(), Some("Operator"));

        api.logout().await;
        assert_eq!(api.token(), None);
        assert_eq!(storage.get(ACCESS_TOKEN_KEY).await.unwrap(), None);

        handle.stop(false).await;
    }
}
