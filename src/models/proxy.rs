use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct UserProxy {
    pub id: i64,
    pub name: String,
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub last_tested_at: Option<String>,
    #[serde(default)]
    pub last_test_success: Option<bool>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

impl UserProxy {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct ProxyInput {
    pub name: String,
    pub host: String,
    pub port: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ProxiesResponse {
    pub proxies: Vec<UserProxy>,
}

#[derive(Debug, Deserialize)]
pub struct ProxyResponse {
    pub proxy: UserProxy,
    pub message: Option<String>,
}

/// Connectivity test result, for a saved proxy or an ad-hoc one.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct ProxyCheck {
    #[serde(default)]
    pub success: bool,
    pub valid: Option<bool>,
    pub ip: Option<String>,
    pub city: Option<String>,
    pub region: Option<String>,
    pub country: Option<String>,
    pub country_code: Option<String>,
    pub isp: Option<String>,
    pub timezone: Option<String>,
    pub message: Option<String>,
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ProxyCheckRequest<'a> {
    pub host: &'a str,
    pub port: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<&'a str>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct IpLookup {
    #[serde(default)]
    pub success: bool,
    pub ip: Option<String>,
    pub city: Option<String>,
    pub region: Option<String>,
    pub country: Option<String>,
    pub country_code: Option<String>,
    pub isp: Option<String>,
    pub timezone: Option<String>,
    pub source: Option<String>,
    pub error: Option<String>,
}
