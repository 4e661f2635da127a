use crate::cache::source::RemoteSource;
use crate::config::Config;
use crate::crm::api_types::{ApiCompaniesResponse, ApiRecentResponse};
use crate::crm::types::{CompanyPage, ListOptions};
use color_eyre::{eyre::eyre, Result};
use url::Url;

/// CRM API client wrapper
#[derive(Clone)]
pub struct CrmClient {
  http: reqwest::Client,
  base_url: Url,
  token: String,
}

impl CrmClient {
  pub fn new(config: &Config) -> Result<Self> {
    let token = Config::get_api_token()?;

    let base_url = Url::parse(&config.crm.url)
      .map_err(|e| eyre!("Invalid CRM base URL {}: {}", config.crm.url, e))?;

    let http = reqwest::Client::builder()
      .build()
      .map_err(|e| eyre!("Failed to create HTTP client: {}", e))?;

    Ok(Self {
      http,
      base_url,
      token,
    })
  }

  async fn get_page<T>(&self, path: &str, options: &ListOptions) -> Result<T>
  where
    T: serde::de::DeserializeOwned,
  {
    let mut url = self
      .base_url
      .join(path)
      .map_err(|e| eyre!("Invalid endpoint path {}: {}", path, e))?;

    {
      let mut query = url.query_pairs_mut();
      for property in &options.properties {
        query.append_pair("properties", property);
      }
      if let Some(offset) = options.offset {
        query.append_pair("offset", &offset.to_string());
      }
      if let Some(count) = options.count {
        query.append_pair("count", &count.to_string());
      }
    }

    let response = self
      .http
      .get(url)
      .bearer_auth(&self.token)
      .send()
      .await
      .map_err(|e| eyre!("Failed to request {}: {}", path, e))?
      .error_for_status()
      .map_err(|e| eyre!("CRM API error on {}: {}", path, e))?;

    response
      .json()
      .await
      .map_err(|e| eyre!("Failed to parse response from {}: {}", path, e))
  }
}

impl RemoteSource for CrmClient {
  async fn list_all(&self, options: ListOptions) -> Result<CompanyPage> {
    let response: ApiCompaniesResponse = self
      .get_page("companies/v2/companies/paged", &options)
      .await?;
    Ok(response.into())
  }

  async fn list_recently_modified(&self, options: ListOptions) -> Result<CompanyPage> {
    let response: ApiRecentResponse = self
      .get_page("companies/v2/companies/recent/modified", &options)
      .await?;
    Ok(response.into())
  }
}
