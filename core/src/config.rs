//! Client configuration: base URL, default headers and the verb mapping.
//!
//! `ApiOptions` is what callers write (every field optional, loadable from
//! JSON); `ApiConfig::resolve` fills the gaps with defaults and yields an
//! immutable configuration shared by every call a client makes.

use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};

use crate::error::ApiError;

/// Base URL used when the caller does not supply one.
pub const DEFAULT_BASE_URL: &str = "http://localhost:3456/api/";

/// The four logical operations a resource client performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Query,
    Update,
    Insert,
    Delete,
}

impl Operation {
    pub const ALL: [Operation; 4] = [
        Operation::Query,
        Operation::Update,
        Operation::Insert,
        Operation::Delete,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Operation::Query => "query",
            Operation::Update => "update",
            Operation::Insert => "insert",
            Operation::Delete => "delete",
        }
    }

    /// Verb name used when the caller leaves this operation unmapped.
    pub fn default_verb(self) -> &'static str {
        match self {
            Operation::Query => "get",
            Operation::Update => "put",
            Operation::Insert => "post",
            Operation::Delete => "delete",
        }
    }
}

/// Partial verb mapping as supplied by the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct VerbOptions {
    pub query: Option<String>,
    pub update: Option<String>,
    pub insert: Option<String>,
    pub delete: Option<String>,
}

impl VerbOptions {
    fn get(&self, op: Operation) -> Option<&str> {
        match op {
            Operation::Query => self.query.as_deref(),
            Operation::Update => self.update.as_deref(),
            Operation::Insert => self.insert.as_deref(),
            Operation::Delete => self.delete.as_deref(),
        }
    }
}

/// Caller-supplied, possibly partial, configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ApiOptions {
    #[serde(alias = "urlAPI")]
    pub base_url: Option<String>,
    #[serde(deserialize_with = "deserialize_headers")]
    pub headers: Option<Vec<(String, String)>>,
    #[serde(alias = "verbs")]
    pub methods: Option<VerbOptions>,
}

impl ApiOptions {
    pub fn from_json(raw: &str) -> Result<Self, ApiError> {
        serde_json::from_str(raw).map_err(|e| ApiError::Deserialization(e.to_string()))
    }

    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers
            .get_or_insert_with(Vec::new)
            .push((name.into(), value.into()));
        self
    }

    pub fn verb(mut self, op: Operation, verb: impl Into<String>) -> Self {
        let verbs = self.methods.get_or_insert_with(VerbOptions::default);
        let slot = match op {
            Operation::Query => &mut verbs.query,
            Operation::Update => &mut verbs.update,
            Operation::Insert => &mut verbs.insert,
            Operation::Delete => &mut verbs.delete,
        };
        *slot = Some(verb.into());
        self
    }
}

/// Headers may be written as an object (`{"Accept": "..."}`) or as a list
/// of `[name, value]` pairs. Non-string object values keep their JSON text.
fn deserialize_headers<'de, D>(deserializer: D) -> Result<Option<Vec<(String, String)>>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Headers {
        Pairs(Vec<(String, String)>),
        Object(Map<String, Value>),
    }

    let headers = Option::<Headers>::deserialize(deserializer)?;
    Ok(headers.map(|headers| match headers {
        Headers::Pairs(pairs) => pairs,
        Headers::Object(map) => map
            .into_iter()
            .map(|(name, value)| match value {
                Value::String(s) => (name, s),
                other => (name, other.to_string()),
            })
            .collect(),
    }))
}

/// Fully resolved verb mapping: one verb name per operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerbMapping {
    query: String,
    update: String,
    insert: String,
    delete: String,
}

impl VerbMapping {
    pub fn get(&self, op: Operation) -> &str {
        match op {
            Operation::Query => &self.query,
            Operation::Update => &self.update,
            Operation::Insert => &self.insert,
            Operation::Delete => &self.delete,
        }
    }

    fn resolve(partial: Option<&VerbOptions>) -> Self {
        let pick = |op: Operation| {
            partial
                .and_then(|verbs| verbs.get(op))
                .filter(|verb| !verb.is_empty())
                .unwrap_or(op.default_verb())
                .to_string()
        };
        Self {
            query: pick(Operation::Query),
            update: pick(Operation::Update),
            insert: pick(Operation::Insert),
            delete: pick(Operation::Delete),
        }
    }
}

impl Default for VerbMapping {
    fn default() -> Self {
        Self::resolve(None)
    }
}

/// Resolved configuration, read by the client on every call.
///
/// No validation is performed: a malformed base URL or header is passed
/// through and surfaces as whatever error the transport raises.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    base_url: String,
    headers: Vec<(String, String)>,
    verbs: VerbMapping,
}

impl ApiConfig {
    pub fn resolve(options: Option<ApiOptions>) -> Self {
        let options = options.unwrap_or_default();
        let base_url = options
            .base_url
            .filter(|url| !url.is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        Self {
            base_url,
            headers: options.headers.unwrap_or_default(),
            verbs: VerbMapping::resolve(options.methods.as_ref()),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    pub fn verbs(&self) -> &VerbMapping {
        &self.verbs
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self::resolve(None)
    }
}

impl From<ApiOptions> for ApiConfig {
    fn from(options: ApiOptions) -> Self {
        Self::resolve(Some(options))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_when_nothing_supplied() {
        let config = ApiConfig::resolve(None);
        assert_eq!(config.base_url(), DEFAULT_BASE_URL);
        assert!(config.headers().is_empty());
        assert_eq!(config.verbs().get(Operation::Query), "get");
        assert_eq!(config.verbs().get(Operation::Update), "put");
        assert_eq!(config.verbs().get(Operation::Insert), "post");
        assert_eq!(config.verbs().get(Operation::Delete), "delete");
    }

    #[test]
    fn supplied_verbs_are_kept_and_gaps_filled() {
        let options = ApiOptions::default()
            .verb(Operation::Update, "patch")
            .verb(Operation::Delete, "");
        let config = ApiConfig::from(options);
        assert_eq!(config.verbs().get(Operation::Update), "patch");
        assert_eq!(config.verbs().get(Operation::Delete), "delete");
        assert_eq!(config.verbs().get(Operation::Query), "get");
        assert_eq!(config.verbs().get(Operation::Insert), "post");
    }

    #[test]
    fn every_operation_is_mapped_for_any_partial_input() {
        let partials = [
            None,
            Some(ApiOptions::default()),
            Some(ApiOptions::default().verb(Operation::Query, "head")),
            Some(ApiOptions::default().verb(Operation::Insert, "").verb(Operation::Update, "POST")),
        ];
        for partial in partials {
            let config = ApiConfig::resolve(partial);
            for op in Operation::ALL {
                assert!(!config.verbs().get(op).is_empty(), "{} unmapped", op.as_str());
            }
        }
    }

    #[test]
    fn empty_base_url_falls_back_to_default() {
        let config = ApiConfig::from(ApiOptions::default().base_url(""));
        assert_eq!(config.base_url(), DEFAULT_BASE_URL);
    }

    #[test]
    fn malformed_base_url_passes_through() {
        let config = ApiConfig::from(ApiOptions::default().base_url("not a url"));
        assert_eq!(config.base_url(), "not a url");
    }

    #[test]
    fn headers_keep_insertion_order() {
        let options = ApiOptions::default()
            .header("Authorization", "Bearer t")
            .header("Accept", "application/json");
        let config = ApiConfig::from(options);
        assert_eq!(
            config.headers(),
            &[
                ("Authorization".to_string(), "Bearer t".to_string()),
                ("Accept".to_string(), "application/json".to_string()),
            ]
        );
    }

    #[test]
    fn options_load_from_json_with_legacy_names() {
        let options = ApiOptions::from_json(
            r#"{"urlAPI":"https://api.example.com/v1/","headers":[["X-Key","abc"]],"methods":{"update":"patch"}}"#,
        )
        .unwrap();
        let config = ApiConfig::from(options);
        assert_eq!(config.base_url(), "https://api.example.com/v1/");
        assert_eq!(config.headers(), &[("X-Key".to_string(), "abc".to_string())]);
        assert_eq!(config.verbs().get(Operation::Update), "patch");
        assert_eq!(config.verbs().get(Operation::Query), "get");
    }

    #[test]
    fn options_accept_object_shaped_headers() {
        let options = ApiOptions::from_json(
            r#"{"urlAPI":"http://x/api/","headers":{"Authorization":"Bearer t","X-Retry":3}}"#,
        )
        .unwrap();
        let config = ApiConfig::from(options);
        assert_eq!(config.base_url(), "http://x/api/");
        assert_eq!(
            config.headers(),
            &[
                ("Authorization".to_string(), "Bearer t".to_string()),
                ("X-Retry".to_string(), "3".to_string()),
            ]
        );
    }

    #[test]
    fn options_accept_null_headers() {
        let options = ApiOptions::from_json(r#"{"headers":null}"#).unwrap();
        assert!(ApiConfig::from(options).headers().is_empty());
    }

    #[test]
    fn options_reject_malformed_json() {
        let err = ApiOptions::from_json("{").unwrap_err();
        assert!(matches!(err, ApiError::Deserialization(_)));
    }
}
