//! reqwest implementation of the gateway.

use std::time::Duration;

use bytes::Bytes;
use lineage_core::{
  document::{self, QueryTemplate, ServiceDocument},
  person::{self, AncestorRecord},
};
use reqwest::{Client, Response, header};

use crate::{
  error::{Error, Result},
  gateway::AncestryGateway,
};

/// Connection settings for the genealogy service.
#[derive(Debug, Clone)]
pub struct ClientConfig {
  /// Discovery root URL (the collections document).
  pub discovery_url: String,
  /// Bearer token obtained by the login flow.
  pub access_token:  String,
}

/// HTTP gateway over a shared [`reqwest::Client`].
///
/// Cheap to clone — the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct HttpGateway {
  client: Client,
  config: ClientConfig,
}

impl HttpGateway {
  pub fn new(config: ClientConfig) -> Result<Self> {
    let client = Client::builder()
      .timeout(Duration::from_secs(30))
      .build()?;
    Ok(Self { client, config })
  }

  /// Build the tree-fetch request. Query pairs go through reqwest's
  /// percent-encoding; the upstream service accepts raw IDs too, and
  /// plain `KWQS-BBQ`-style IDs pass through unchanged.
  fn tree_request(
    &self,
    template: &QueryTemplate,
    person_id: &str,
    generations: u32,
  ) -> reqwest::RequestBuilder {
    self
      .client
      .get(template.as_str())
      .query(&[
        ("person", person_id),
        ("generations", &generations.to_string()),
      ])
      .header(header::ACCEPT, "application/json")
      .bearer_auth(&self.config.access_token)
  }

  /// Fail on non-2xx, then read the full body.
  async fn read_body(url: &str, resp: Response) -> Result<Bytes> {
    let status = resp.status();
    if !status.is_success() {
      return Err(Error::Status {
        url: url.to_string(),
        status,
      });
    }
    Ok(resp.bytes().await?)
  }
}

impl AncestryGateway for HttpGateway {
  async fn fetch_service_document(&self) -> Result<ServiceDocument> {
    let url = &self.config.discovery_url;
    tracing::debug!(%url, "fetching service document");
    let resp = self
      .client
      .get(url)
      .header(header::ACCEPT, "application/json")
      .send()
      .await?;
    let body = Self::read_body(url, resp).await?;
    Ok(document::parse_service_document(&body)?)
  }

  async fn fetch_ancestry_tree(
    &self,
    template: &QueryTemplate,
    person_id: &str,
    generations: u32,
  ) -> Result<Vec<AncestorRecord>> {
    tracing::debug!(
      template = %template,
      person = person_id,
      generations,
      "fetching ancestry tree"
    );
    let resp = self.tree_request(template, person_id, generations).send().await?;
    let body = Self::read_body(template.as_str(), resp).await?;
    Ok(person::parse_ancestry_tree(&body)?)
  }

  async fn fetch_image(&self, href: &str) -> Result<Bytes> {
    let resp = self
      .client
      .get(href)
      .bearer_auth(&self.config.access_token)
      .send()
      .await?;
    Self::read_body(href, resp).await
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn gateway() -> HttpGateway {
    HttpGateway::new(ClientConfig {
      discovery_url: "https://api.test/discovery".into(),
      access_token:  "t0ken".into(),
    })
    .unwrap()
  }

  #[test]
  fn tree_request_url_keeps_simple_ids_unchanged() {
    let template = QueryTemplate::from_template("https://api.test/tree{?person}").unwrap();
    let req = gateway()
      .tree_request(&template, "KWQS-BBQ", 4)
      .build()
      .unwrap();
    assert_eq!(
      req.url().as_str(),
      "https://api.test/tree?person=KWQS-BBQ&generations=4"
    );
  }

  #[test]
  fn tree_request_percent_encodes_unsafe_ids() {
    let template = QueryTemplate::from_template("https://api.test/tree").unwrap();
    let req = gateway()
      .tree_request(&template, "odd id&x", 4)
      .build()
      .unwrap();
    assert_eq!(
      req.url().as_str(),
      "https://api.test/tree?person=odd+id%26x&generations=4"
    );
  }

  #[test]
  fn tree_request_carries_bearer_token() {
    let template = QueryTemplate::from_template("https://api.test/tree").unwrap();
    let req = gateway().tree_request(&template, "1", 4).build().unwrap();
    let auth = req
      .headers()
      .get(header::AUTHORIZATION)
      .and_then(|v| v.to_str().ok())
      .unwrap_or_default()
      .to_string();
    assert_eq!(auth, "Bearer t0ken");
    assert_eq!(
      req.headers().get(header::ACCEPT).unwrap(),
      "application/json"
    );
  }
}
