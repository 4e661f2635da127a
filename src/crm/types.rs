use serde::Serialize;
use std::collections::HashMap;

/// A single CRM property: the value plus whatever metadata the API attaches.
/// Only `value` is consumed by the cache; the rest is carried for callers.
#[derive(Debug, Clone, Serialize)]
pub struct Property {
  pub value: String,
  pub timestamp: Option<i64>,
  pub source: Option<String>,
}

/// A company record as seen by the cache: opaque id plus named properties.
#[derive(Debug, Clone, Serialize)]
pub struct Company {
  pub id: u64,
  pub properties: HashMap<String, Property>,
}

impl Company {
  /// Value of a named property, if present.
  pub fn prop_value(&self, name: &str) -> Option<&str> {
    self.properties.get(name).map(|p| p.value.as_str())
  }

  pub fn name(&self) -> Option<&str> {
    self.prop_value("name")
  }

  /// Creation timestamp in milliseconds. A missing or unparseable
  /// `createdate` reads as None; callers pick the default appropriate
  /// to their loop (0 for the fill maximum, far-future for the update
  /// stop guard).
  pub fn createdate(&self) -> Option<i64> {
    self.prop_value("createdate")?.parse().ok()
  }
}

/// One page of companies from either listing endpoint.
#[derive(Debug, Clone)]
pub struct CompanyPage {
  pub companies: Vec<Company>,
  /// Opaque pagination cursor to pass back as `offset` on the next request.
  pub offset: u64,
  pub has_more: bool,
}

/// Options for a paginated listing request.
#[derive(Debug, Clone, Default)]
pub struct ListOptions {
  /// Property names to request for each company.
  pub properties: Vec<String>,
  /// Resume cursor from the previous page, None for the first page.
  pub offset: Option<u64>,
  /// Page size hint; None uses the API default.
  pub count: Option<u32>,
}

impl ListOptions {
  pub fn with_properties<I, S>(properties: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    Self {
      properties: properties.into_iter().map(Into::into).collect(),
      ..Self::default()
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn company_with(name: &str, value: &str) -> Company {
    let mut properties = HashMap::new();
    properties.insert(
      name.to_string(),
      Property {
        value: value.to_string(),
        timestamp: None,
        source: None,
      },
    );
    Company { id: 1, properties }
  }

  #[test]
  fn test_createdate_parses_millis() {
    let company = company_with("createdate", "1584042163000");
    assert_eq!(company.createdate(), Some(1584042163000));
  }

  #[test]
  fn test_createdate_malformed_is_absent() {
    let company = company_with("createdate", "not-a-date");
    assert_eq!(company.createdate(), None);
  }

  #[test]
  fn test_missing_property_is_absent() {
    let company = company_with("name", "Acme");
    assert_eq!(company.name(), Some("Acme"));
    assert_eq!(company.createdate(), None);
    assert_eq!(company.prop_value("environment"), None);
  }
}
