//! Snapshot of the dashboard's current URL.

use serde::{Deserialize, Serialize};
use url::Url;

/// The parts of the current URL the auth checks look at.
///
/// `search` keeps its leading `?` and `hash` its leading `#`, both empty
/// when absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub pathname: String,
    #[serde(default)]
    pub search: String,
    #[serde(default)]
    pub hash: String,
}

impl Default for Location {
    fn default() -> Self {
        Self {
            pathname: "/".to_string(),
            search: String::new(),
            hash: String::new(),
        }
    }
}

impl Location {
    /// Parse an absolute URL or a path such as `/#/sign-up`.
    pub fn parse(input: &str) -> Result<Self, url::ParseError> {
        let base = Url::parse("http://localhost/")?;
        let url = base.join(input)?;

        Ok(Self {
            pathname: url.path().to_string(),
            search: url.query().map(|q| format!("?{}", q)).unwrap_or_default(),
            hash: url.fragment().map(|f| format!("#{}", f)).unwrap_or_default(),
        })
    }

    /// Whether the dashboard is showing `page`, either through the path
    /// (`/sign-up`) or through hash routing (`/#/sign-up`).
    pub fn is_on_page(&self, page: &str) -> bool {
        self.pathname == page || self.hash.contains(&format!("#{}", page))
    }

    /// Look up a URL parameter in the query string, then in the hash.
    ///
    /// Hash parameters are read after the first `?` of the hash when the
    /// hash carries a route, otherwise from the whole hash
    /// (`#access_token=...&type=recovery`).
    pub fn param(&self, name: &str) -> Option<String> {
        let search = self.search.trim_start_matches('?');
        if let Some(value) = find_param(search, name) {
            return Some(value);
        }

        let hash = self.hash.trim_start_matches('#');
        let hash_params = match hash.split_once('?') {
            Some((_, params)) => params,
            None => hash,
        };
        find_param(hash_params, name)
    }
}

fn find_param(encoded: &str, name: &str) -> Option<String> {
    url::form_urlencoded::parse(encoded.as_bytes())
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.into_owned())
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}{}", self.pathname, self.search, self.hash)
    }
}
