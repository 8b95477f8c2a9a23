use reqwest::Client;

#[derive(Clone)]
pub struct AppState {
    pub client: Client,
    pub backend_url: String,
}

impl AppState {
    pub fn new(backend_url: impl Into<String>) -> Self {
        Self {
            // no timeout: a stalled backend keeps the caller waiting
            client: Client::new(),
            backend_url: backend_url.into(),
        }
    }
}
