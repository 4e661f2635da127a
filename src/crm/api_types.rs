//! Serde-deserializable types matching the CRM API responses.
//!
//! These types are separate from domain types to allow clean deserialization
//! while keeping domain types focused on application needs.

use serde::{Deserialize, Deserializer};
use std::collections::HashMap;

use super::types::{Company, CompanyPage, Property};

/// Property values arrive as JSON strings for most properties but as bare
/// numbers for a few, so accept both and normalize to String.
fn de_value_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
  D: Deserializer<'de>,
{
  #[derive(Deserialize)]
  #[serde(untagged)]
  enum StringOrNumber {
    String(String),
    Number(serde_json::Number),
  }

  Ok(match StringOrNumber::deserialize(deserializer)? {
    StringOrNumber::String(s) => s,
    StringOrNumber::Number(n) => n.to_string(),
  })
}

#[derive(Debug, Deserialize)]
pub struct ApiProperty {
  #[serde(default, deserialize_with = "de_value_string")]
  pub value: String,
  pub timestamp: Option<i64>,
  pub source: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ApiCompany {
  #[serde(rename = "companyId")]
  pub company_id: u64,
  #[serde(default)]
  pub properties: HashMap<String, ApiProperty>,
}

impl From<ApiCompany> for Company {
  fn from(api: ApiCompany) -> Self {
    Company {
      id: api.company_id,
      properties: api
        .properties
        .into_iter()
        .map(|(name, p)| {
          (
            name,
            Property {
              value: p.value,
              timestamp: p.timestamp,
              source: p.source,
            },
          )
        })
        .collect(),
    }
  }
}

/// Response of the full-listing endpoint (`companies/paged`).
#[derive(Debug, Deserialize)]
pub struct ApiCompaniesResponse {
  #[serde(default)]
  pub companies: Vec<ApiCompany>,
  #[serde(rename = "has-more", default)]
  pub has_more: bool,
  #[serde(default)]
  pub offset: u64,
}

impl From<ApiCompaniesResponse> for CompanyPage {
  fn from(api: ApiCompaniesResponse) -> Self {
    CompanyPage {
      companies: api.companies.into_iter().map(Company::from).collect(),
      offset: api.offset,
      has_more: api.has_more,
    }
  }
}

/// Response of the recently-modified endpoint (`companies/recent/modified`).
/// Same shape as the full listing except the list field is named `results`.
#[derive(Debug, Deserialize)]
pub struct ApiRecentResponse {
  #[serde(default)]
  pub results: Vec<ApiCompany>,
  #[serde(rename = "has-more", default)]
  pub has_more: bool,
  #[serde(default)]
  pub offset: u64,
}

impl From<ApiRecentResponse> for CompanyPage {
  fn from(api: ApiRecentResponse) -> Self {
    CompanyPage {
      companies: api.results.into_iter().map(Company::from).collect(),
      offset: api.offset,
      has_more: api.has_more,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_deserialize_paged_response() {
    let json = r#"{
      "companies": [
        {
          "companyId": 115200636,
          "properties": {
            "name": { "value": "Acme", "timestamp": 1457708103721, "source": "API" },
            "createdate": { "value": "1457708103781" }
          }
        }
      ],
      "has-more": true,
      "offset": 115200636
    }"#;

    let page: CompanyPage = serde_json::from_str::<ApiCompaniesResponse>(json)
      .unwrap()
      .into();

    assert!(page.has_more);
    assert_eq!(page.offset, 115200636);
    assert_eq!(page.companies.len(), 1);

    let company = &page.companies[0];
    assert_eq!(company.id, 115200636);
    assert_eq!(company.name(), Some("Acme"));
    assert_eq!(company.createdate(), Some(1457708103781));
    assert_eq!(
      company.properties.get("name").and_then(|p| p.timestamp),
      Some(1457708103721)
    );
  }

  #[test]
  fn test_deserialize_recent_response_numeric_value() {
    // Some deployments return createdate as a bare number.
    let json = r#"{
      "results": [
        {
          "companyId": 42,
          "properties": { "createdate": { "value": 1584042163000 } }
        }
      ],
      "has-more": false,
      "offset": 42
    }"#;

    let page: CompanyPage = serde_json::from_str::<ApiRecentResponse>(json)
      .unwrap()
      .into();

    assert!(!page.has_more);
    assert_eq!(page.companies[0].createdate(), Some(1584042163000));
  }

  #[test]
  fn test_deserialize_tolerates_missing_fields() {
    let page: CompanyPage = serde_json::from_str::<ApiRecentResponse>(r#"{ "results": [] }"#)
      .unwrap()
      .into();

    assert!(page.companies.is_empty());
    assert!(!page.has_more);
  }
}
