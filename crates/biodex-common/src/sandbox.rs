use reqwest::{Client, ClientBuilder};
use std::collections::HashSet;
use std::time::Duration;
use url::Url;
use crate::error::BiodexError;

const USER_AGENT: &str = "Biodex/0.1 (species recommendations)";

/// Upper bound for any request that does not set its own timeout.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(45);

/// An HTTP client that only allows requests to approved hosts.
///
/// Every upstream call in the pipeline goes through this type, so a
/// misconfigured URL fails before any I/O with `SecurityError`.
#[derive(Debug, Clone)]
pub struct SandboxClient {
    client: Client,
    allowlist: HashSet<String>,
}

impl SandboxClient {
    /// Creates a client with the default allowlist (public catalog + loopback).
    pub fn new() -> Result<Self, BiodexError> {
        let mut allowlist = HashSet::new();
        let domains = [
            "api.inaturalist.org", // public species catalog
            "localhost",
            "127.0.0.1",
        ];
        for d in domains {
            allowlist.insert(d.to_string());
        }

        let client = ClientBuilder::new()
            .user_agent(USER_AGENT)
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .map_err(|e| BiodexError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client, allowlist })
    }

    /// Appends an exact hostname to the allowlist.
    pub fn allow_domain(&mut self, domain: &str) {
        self.allowlist.insert(domain.to_string());
    }

    /// Allows the host of a configured base URL (backend or catalog).
    pub fn allow_base_url(&mut self, base_url: &str) -> Result<(), BiodexError> {
        let parsed = Url::parse(base_url)
            .map_err(|e| BiodexError::Config(format!("Invalid base URL {}: {}", base_url, e)))?;
        let host = parsed
            .host_str()
            .ok_or_else(|| BiodexError::Config(format!("Base URL has no host: {}", base_url)))?;
        self.allow_domain(host);
        Ok(())
    }

    /// Validates if a URL is permitted under the current sandbox policy.
    pub fn is_allowed(&self, url: &str) -> bool {
        if let Ok(parsed) = Url::parse(url) {
            if let Some(host) = parsed.host_str() {
                // Exact match or a subdomain of an allowed host
                for allowed in &self.allowlist {
                    if host == allowed || host.ends_with(&format!(".{}", allowed)) {
                        return true;
                    }
                }
            }
        }
        false
    }

    pub fn get(&self, url: &str) -> Result<reqwest::RequestBuilder, BiodexError> {
        self.request(reqwest::Method::GET, url)
    }

    pub fn post(&self, url: &str) -> Result<reqwest::RequestBuilder, BiodexError> {
        self.request(reqwest::Method::POST, url)
    }

    pub fn request(&self, method: reqwest::Method, url: &str) -> Result<reqwest::RequestBuilder, BiodexError> {
        if !self.is_allowed(url) {
            return Err(BiodexError::SecurityError(format!(
                "Host not in allowlist for URL {}",
                url
            )));
        }

        Ok(self.client.request(method, url))
    }
}
