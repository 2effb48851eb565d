use crate::types::{FetchConfig, GlamrError, Result};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::warn;
use url::Url;

const SUBSCRIBE_REL: &str = "http://ostatus.org/schema/1.0/subscribe";

#[derive(Debug, Deserialize)]
pub struct WebfingerDoc {
    #[serde(default)]
    pub links: Vec<WebfingerLink>,
}

#[derive(Debug, Deserialize)]
pub struct WebfingerLink {
    pub rel: String,
    #[serde(default)]
    pub href: Option<String>,
    #[serde(default)]
    pub template: Option<String>,
}

/// Build the webfinger endpoint for a fediverse handle like
/// `@user@glam.example` (the leading `@` is optional).
pub fn webfinger_url(handle: &str) -> Result<String> {
    let account = handle.strip_prefix('@').unwrap_or(handle);
    let (_, domain) = account.split_once('@').ok_or_else(|| {
        GlamrError::General(format!("{handle} is not in the form '@user@domain.tld'"))
    })?;
    if domain.is_empty() {
        return Err(GlamrError::General(format!(
            "{handle} is not in the form '@user@domain.tld'"
        )));
    }
    let url = format!("https://{domain}/.well-known/webfinger?resource=acct:{account}");
    Url::parse(&url)?;
    Ok(url)
}

/// Pull the subscribe URI out of a webfinger document: the document must
/// carry both a `self` link and a subscribe template, and the template's
/// `{uri}` placeholder is filled with our own service account.
pub fn resolve_subscribe_uri(doc: &WebfingerDoc, service_account: &str) -> Option<String> {
    let has_self = doc
        .links
        .iter()
        .any(|l| l.rel == "self" && l.href.is_some());
    let template = doc
        .links
        .iter()
        .find(|l| l.rel == SUBSCRIBE_REL)
        .and_then(|l| l.template.as_deref())?;
    if !has_self {
        return None;
    }
    Some(template.replace("{uri}", service_account))
}

/// Resolves follow links for fediverse accounts shown in the directory.
pub struct WebfingerClient {
    client: Client,
    retry_client: Client,
    service_account: String,
}

impl WebfingerClient {
    pub fn new(config: &FetchConfig, service_account: &str) -> Result<Self> {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .timeout(Duration::from_secs(config.read_timeout_secs))
            .build()?;
        let retry_client = Client::builder()
            .user_agent(&config.user_agent)
            .connect_timeout(Duration::from_secs(config.retry_timeout_secs))
            .timeout(Duration::from_secs(config.retry_timeout_secs))
            .build()?;
        Ok(Self {
            client,
            retry_client,
            service_account: service_account.to_string(),
        })
    }

    /// Look up the OStatus subscribe URI for a handle. `None` when the
    /// account's server does not expose one.
    pub async fn subscribe_uri(&self, handle: &str) -> Result<Option<String>> {
        let url = webfinger_url(handle)?;

        let doc: WebfingerDoc = match self.get_doc(&self.client, &url).await {
            Ok(doc) => doc,
            Err(e) if e.is_timeout() => {
                warn!("timeout finding {handle}, trying longer timeout");
                self.get_doc(&self.retry_client, &url).await?
            }
            Err(e) => return Err(e.into()),
        };

        Ok(resolve_subscribe_uri(&doc, &self.service_account))
    }

    async fn get_doc(
        &self,
        client: &Client,
        url: &str,
    ) -> std::result::Result<WebfingerDoc, reqwest::Error> {
        let response = client.get(url).send().await?.error_for_status()?;
        response.json().await
    }
}
