use actix_web::{
    http::{Method, StatusCode},
    web, HttpRequest, HttpResponse, HttpResponseBuilder,
};
use tracing::{debug, error};
use uuid::Uuid;

use crate::error::ProxyError;
use crate::state::AppState;

pub const ALLOW_ORIGIN: &str = "*";
pub const ALLOW_METHODS: &str = "GET, POST, PUT, DELETE, OPTIONS";
pub const ALLOW_HEADERS: &str = "Content-Type, Authorization";

const REQUEST_HEADER_BLOCKLIST: [&str; 4] =
    ["host", "connection", "transfer-encoding", "content-length"];

// content-length is dropped too: actix frames the forwarded body itself
const RESPONSE_HEADER_BLOCKLIST: [&str; 4] = [
    "transfer-encoding",
    "connection",
    "content-encoding",
    "content-length",
];

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource(["/api", "/api/{tail:.*}"])
            .route(web::method(Method::OPTIONS).to(preflight))
            .route(web::route().to(forward)),
    );
}

pub fn forwards_request_header(name: &str) -> bool {
    !REQUEST_HEADER_BLOCKLIST
        .iter()
        .any(|blocked| name.eq_ignore_ascii_case(blocked))
}

pub fn forwards_response_header(name: &str) -> bool {
    !RESPONSE_HEADER_BLOCKLIST
        .iter()
        .any(|blocked| name.eq_ignore_ascii_case(blocked))
}

pub fn with_cors(mut builder: HttpResponseBuilder) -> HttpResponseBuilder {
    builder
        .insert_header(("Access-Control-Allow-Origin", ALLOW_ORIGIN))
        .insert_header(("Access-Control-Allow-Methods", ALLOW_METHODS))
        .insert_header(("Access-Control-Allow-Headers", ALLOW_HEADERS));
    builder
}

pub async fn preflight() -> HttpResponse {
    with_cors(HttpResponse::Ok()).finish()
}

/// Forwards `/api/{path}` to the backend with the same method, query and
/// body, and relays the backend's status, headers and body.
pub async fn forward(
    req: HttpRequest,
    body: web::Bytes,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ProxyError> {
    let request_id = Uuid::new_v4();
    let rest = req.uri().path().strip_prefix("/api").unwrap_or_default();
    let mut url = format!("{}/api{}", state.backend_url, rest);
    if let Some(query) = req.uri().query() {
        url.push('?');
        url.push_str(query);
    }

    let method = reqwest::Method::from_bytes(req.method().as_str().as_bytes())
        .map_err(|_| ProxyError::Method(req.method().to_string()))?;

    let mut upstream = state.client.request(method, &url);
    for (name, value) in req.headers() {
        if forwards_request_header(name.as_str()) {
            upstream = upstream.header(name.as_str(), value.as_bytes());
        }
    }
    if !matches!(*req.method(), Method::GET | Method::HEAD) && !body.is_empty() {
        upstream = upstream.body(body);
    }

    debug!(%request_id, method = %req.method(), %url, "forwarding request");

    let response = upstream.send().await.map_err(|e| {
        error!(%request_id, %url, "Proxy error: {}", e);
        ProxyError::Upstream(e)
    })?;

    let upstream_status = response.status().as_u16();
    let status = StatusCode::from_u16(upstream_status)
        .map_err(|_| ProxyError::UpstreamStatus(upstream_status))?;

    let mut builder = HttpResponse::build(status);
    for (name, value) in response.headers() {
        if forwards_response_header(name.as_str()) {
            builder.append_header((name.as_str(), value.as_bytes()));
        }
    }

    let payload = response.bytes().await.map_err(|e| {
        error!(%request_id, %url, "Proxy error reading body: {}", e);
        ProxyError::Upstream(e)
    })?;

    debug!(%request_id, status = upstream_status, bytes = payload.len(), "relayed response");

    Ok(with_cors(builder).body(payload))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::spawn_backend;
    use actix_web::{body::to_bytes, test, App};
    use serde_json::{json, Value};

    fn assert_cors(headers: &actix_web::http::header::HeaderMap) {
        assert_eq!(headers.get("access-control-allow-origin").unwrap(), ALLOW_ORIGIN);
        assert_eq!(headers.get("access-control-allow-methods").unwrap(), ALLOW_METHODS);
        assert_eq!(headers.get("access-control-allow-headers").unwrap(), ALLOW_HEADERS);
    }

    async fn echo(req: HttpRequest, body: web::Bytes) -> HttpResponse {
        let header = |name: &str| {
            req.headers()
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };
        HttpResponse::Created()
            .insert_header(("x-upstream", "yes"))
            .insert_header(("content-encoding", "identity"))
            .insert_header(("access-control-allow-origin", "https://backend.example"))
            .json(json!({
                "method": req.method().as_str(),
                "path": req.path(),
                "query": req.query_string(),
                "authorization": header("authorization"),
                "custom": header("x-custom"),
                "body": String::from_utf8_lossy(&body),
            }))
    }

    #[actix_web::test]
    async fn blocklists_are_case_insensitive() {
        assert!(!forwards_request_header("Host"));
        assert!(!forwards_request_header("Content-Length"));
        assert!(forwards_request_header("Authorization"));
        assert!(!forwards_response_header("Transfer-Encoding"));
        assert!(!forwards_response_header("Content-Encoding"));
        assert!(forwards_response_header("Set-Cookie"));
    }

    #[actix_web::test]
    async fn options_returns_empty_200_with_cors() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(AppState::new("http://127.0.0.1:1")))
                .configure(configure),
        )
        .await;

        let req = test::TestRequest::with_uri("/api/bots")
            .method(Method::OPTIONS)
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::OK);
        assert_cors(resp.headers());
        let body = to_bytes(resp.into_body()).await.unwrap();
        assert!(body.is_empty());
    }

    #[actix_web::test]
    async fn forwards_method_path_query_and_body() {
        let (backend, handle) = spawn_backend(|cfg| {
            cfg.route("/{tail:.*}", web::to(echo));
        })
        .await;

        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(AppState::new(backend)))
                .configure(configure),
        )
        .await;

        let req = test::TestRequest::with_uri("/api/bots/7/products?page=2")
            .method(Method::POST)
            .insert_header(("authorization", "Bearer abc"))
            .insert_header(("x-custom", "kept"))
            .insert_header(("content-type", "application/json"))
            .set_payload(r#"{"name":"Netflix"}"#)
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::CREATED);
        let headers = resp.headers().clone();
        assert_cors(&headers);
        assert!(headers.get("transfer-encoding").is_none());
        assert!(headers.get("connection").is_none());
        assert!(headers.get("content-encoding").is_none());
        assert_eq!(headers.get("x-upstream").unwrap(), "yes");

        let body: Value = serde_json::from_slice(&to_bytes(resp.into_body()).await.unwrap()).unwrap();
        assert_eq!(body["method"], "POST");
        assert_eq!(body["path"], "/api/bots/7/products");
        assert_eq!(body["query"], "page=2");
        assert_eq!(body["authorization"], "Bearer abc");
        assert_eq!(body["custom"], "kept");
        assert_eq!(body["body"], r#"{"name":"Netflix"}"#);

        handle.stop(false).await;
    }

    #[actix_web::test]
    async fn get_requests_carry_no_body() {
        let (backend, handle) = spawn_backend(|cfg| {
            cfg.route("/{tail:.*}", web::to(echo));
        })
        .await;

        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(AppState::new(backend)))
                .configure(configure),
        )
        .await;

        let req = test::TestRequest::with_uri("/api/sheerid/types")
            .set_payload("ignored")
            .to_request();
        let resp = test::call_service(&app, req).await;
        let body: Value = serde_json::from_slice(&to_bytes(resp.into_body()).await.unwrap()).unwrap();
        assert_eq!(body["method"], "GET");
        assert_eq!(body["body"], "");

        handle.stop(false).await;
    }

    #[actix_web::test]
    async fn unreachable_backend_yields_502() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(AppState::new("http://127.0.0.1:1")))
                .configure(configure),
        )
        .await;

        let req = test::TestRequest::with_uri("/api/bots").to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
        assert_cors(resp.headers());
        let body: Value = serde_json::from_slice(&to_bytes(resp.into_body()).await.unwrap()).unwrap();
        assert_eq!(body, json!({ "error": "Failed to connect to backend server" }));
    }
}
