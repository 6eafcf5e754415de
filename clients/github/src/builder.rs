use crate::cache::MetricsCache;
use crate::GithubMetricsClient;
use repo_roster::api::Result;
use reqwest::header;
use reqwest::header::HeaderMap;
use reqwest::header::HeaderName;
use reqwest::header::HeaderValue;
use reqwest::ClientBuilder;
use secrecy::ExposeSecret;
use secrecy::SecretString;

pub const DEFAULT_API_URL: &str = "https://api.github.com";

pub struct GithubClientBuilder {
    client_builder: ClientBuilder,
    api_url: String,
    headers: HeaderMap,
    cache: MetricsCache,
}

impl Default for GithubClientBuilder {
    fn default() -> Self {
        let mut headers = HeaderMap::default();
        headers.insert(header::USER_AGENT, HeaderValue::from_static("repo-roster"));
        headers.insert(header::ACCEPT, HeaderValue::from_static("application/vnd.github.v3+json"));
        Self {
            client_builder: ClientBuilder::default(),
            api_url: DEFAULT_API_URL.to_string(),
            headers,
            cache: MetricsCache::default(),
        }
    }
}

impl GithubClientBuilder {
    /// Adds the authorization header that lifts the API's anonymous rate
    /// ceiling.
    pub fn try_with_token(self, token: SecretString) -> Result<GithubClientBuilder> {
        let value = format!("token {}", token.expose_secret());
        Ok(self.try_with_header(header::AUTHORIZATION, value)?)
    }

    pub fn try_with_user_agent<STR: AsRef<str>>(self, user_agent: STR) -> Result<GithubClientBuilder> {
        Ok(self.try_with_header(header::USER_AGENT, user_agent)?)
    }

    pub fn with_api_url<STR: AsRef<str>>(mut self, url: STR) -> GithubClientBuilder {
        self.api_url = url.as_ref().to_string();
        self
    }

    /// Replaces the default cache, e.g. to shorten the TTL.
    pub fn with_cache(mut self, cache: MetricsCache) -> GithubClientBuilder {
        self.cache = cache;
        self
    }

    fn try_with_header(mut self, key: HeaderName, val: impl AsRef<str>) -> anyhow::Result<GithubClientBuilder> {
        let val = HeaderValue::from_str(val.as_ref())?;
        self.headers.insert(key, val);
        Ok(self)
    }

    pub fn build(self) -> Result<GithubMetricsClient> {
        let client = self.client_builder.default_headers(self.headers).build()?;
        Ok(GithubMetricsClient {
            client,
            api_url: self.api_url,
            cache: self.cache,
        })
    }
}
