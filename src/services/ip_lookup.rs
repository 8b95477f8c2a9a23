//! Public address of the machine running the dashboard, taken from the first
//! geo-IP provider that answers. The backend is not involved; it would only
//! report its own address.

use std::time::Duration;

use reqwest::header::CACHE_CONTROL;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::models::IpLookup;

pub const IPAPI_URL: &str = "https://ipapi.co/json/";
pub const IPINFO_URL: &str = "https://ipinfo.io/json";
pub const IPIFY_URL: &str = "https://api.ipify.org?format=json";

const LOOKUP_FAILED: &str = "Could not fetch IP";
const PROVIDER_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IpProvider {
    IpApi,
    IpInfo,
    Ipify,
}

impl IpProvider {
    /// Reported back in `IpLookup::source`.
    pub fn name(self) -> &'static str {
        match self {
            IpProvider::IpApi => "ipapi.co",
            IpProvider::IpInfo => "ipinfo.io",
            IpProvider::Ipify => "ipify.org",
        }
    }
}

/// Union of the provider payloads; each one fills a different subset.
#[derive(Debug, Default, Deserialize)]
struct ProviderBody {
    ip: Option<String>,
    city: Option<String>,
    region: Option<String>,
    country: Option<String>,
    country_name: Option<String>,
    country_code: Option<String>,
    org: Option<String>,
    timezone: Option<String>,
}

impl ProviderBody {
    fn into_lookup(self, provider: IpProvider) -> IpLookup {
        let base = IpLookup {
            success: true,
            ip: self.ip,
            source: Some(provider.name().to_string()),
            ..Default::default()
        };
        match provider {
            IpProvider::IpApi => IpLookup {
                city: self.city,
                region: self.region,
                country: self.country_name,
                country_code: self.country_code,
                isp: self.org,
                timezone: self.timezone,
                ..base
            },
            IpProvider::IpInfo => IpLookup {
                city: self.city,
                region: self.region,
                country: self.country,
                isp: self.org,
                timezone: self.timezone,
                ..base
            },
            IpProvider::Ipify => base,
        }
    }
}

/// Ordered provider chain: ipapi.co, then ipinfo.io, then ipify.org.
#[derive(Debug, Clone)]
pub struct IpLocator {
    http: Client,
    providers: Vec<(IpProvider, String)>,
}

impl Default for IpLocator {
    fn default() -> Self {
        Self::with_providers(
            Client::new(),
            vec![
                (IpProvider::IpApi, IPAPI_URL.to_string()),
                (IpProvider::IpInfo, IPINFO_URL.to_string()),
                (IpProvider::Ipify, IPIFY_URL.to_string()),
            ],
        )
    }
}

impl IpLocator {
    pub fn with_providers(http: Client, providers: Vec<(IpProvider, String)>) -> Self {
        Self { http, providers }
    }

    /// Never fails: when no provider answers the result carries
    /// `success: false` and an error message instead.
    pub async fn lookup(&self) -> IpLookup {
        for (provider, url) in &self.providers {
            match self.fetch(*provider, url).await {
                Ok(found) => {
                    debug!(provider = provider.name(), "IP lookup answered");
                    return found;
                }
                Err(e) => warn!(provider = provider.name(), "IP lookup failed: {}", e),
            }
        }
        IpLookup {
            success: false,
            error: Some(LOOKUP_FAILED.to_string()),
            ..Default::default()
        }
    }

    async fn fetch(&self, provider: IpProvider, url: &str) -> Result<IpLookup, reqwest::Error> {
        let body: ProviderBody = self
            .http
            .get(url)
            .header(CACHE_CONTROL, "no-cache")
            .timeout(PROVIDER_TIMEOUT)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(body.into_lookup(provider))
    }
}
