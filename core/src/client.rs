//! Active-record style client for one REST resource.
//!
//! # Design
//! `ActiveRecord` holds a configuration snapshot, a transport and the
//! resource name, and carries no mutable state between calls. Every
//! operation is split the same way: a pure `build_*` method produces the
//! `HttpRequest`, and the async operation hands it to the transport and
//! parses the response. Concurrent calls on one client are independent.
//!
//! The verb mapping is resolved into `HttpMethod`s once, in `new`, so a
//! mapping such as `update -> "patch"` changes the wire method without
//! touching any call site.

use std::fmt::{self, Display};
use std::marker::PhantomData;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, error};

use crate::config::{ApiConfig, Operation};
use crate::error::ApiError;
use crate::http::{find_header, HttpMethod, HttpRequest, HttpResponse};
use crate::params::{default_page_params, generate_param, to_params};
use crate::transport::Transport;

const CONTENT_TYPE: &str = "Content-Type";
const APPLICATION_JSON: &str = "application/json";

/// HTTP method chosen for each logical operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MethodTable {
    query: HttpMethod,
    update: HttpMethod,
    insert: HttpMethod,
    delete: HttpMethod,
}

impl MethodTable {
    /// `update` and `insert` send a JSON body, so they must map to a method
    /// that carries one.
    pub fn from_config(config: &ApiConfig) -> Result<Self, ApiError> {
        let verbs = config.verbs();
        let resolve = |op: Operation| -> Result<HttpMethod, ApiError> {
            let verb = verbs.get(op);
            let method: HttpMethod = verb.parse()?;
            let needs_body = matches!(op, Operation::Update | Operation::Insert);
            if needs_body && !method.allows_body() {
                return Err(ApiError::UnsupportedVerb(verb.to_string()));
            }
            Ok(method)
        };
        Ok(Self {
            query: resolve(Operation::Query)?,
            update: resolve(Operation::Update)?,
            insert: resolve(Operation::Insert)?,
            delete: resolve(Operation::Delete)?,
        })
    }

    pub fn method(&self, op: Operation) -> HttpMethod {
        match op {
            Operation::Query => self.query,
            Operation::Update => self.update,
            Operation::Insert => self.insert,
            Operation::Delete => self.delete,
        }
    }
}

/// Client for the resource at `base_url + resource`, yielding records of
/// type `R`.
pub struct ActiveRecord<R, T> {
    config: ApiConfig,
    methods: MethodTable,
    transport: T,
    resource: String,
    api_url: String,
    _record: PhantomData<fn() -> R>,
}

impl<R, T> fmt::Debug for ActiveRecord<R, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActiveRecord")
            .field("resource", &self.resource)
            .field("api_url", &self.api_url)
            .field("methods", &self.methods)
            .finish_non_exhaustive()
    }
}

impl<R, T> ActiveRecord<R, T>
where
    R: DeserializeOwned,
    T: Transport,
{
    /// Fails only when the verb mapping names an unknown HTTP method.
    pub fn new(config: ApiConfig, transport: T, resource: &str) -> Result<Self, ApiError> {
        let methods = MethodTable::from_config(&config)?;
        let api_url = format!("{}{resource}", config.base_url());
        Ok(Self {
            config,
            methods,
            transport,
            resource: resource.to_string(),
            api_url,
            _record: PhantomData,
        })
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    // -----------------------------------------------------------------------
    // Request builders
    // -----------------------------------------------------------------------

    /// `GET {resource}?page=1&...`
    pub fn build_find_all<P>(&self, params: &P) -> Result<HttpRequest, ApiError>
    where
        P: Serialize + ?Sized,
    {
        let query = generate_param(&to_params(params)?);
        Ok(self.request(Operation::Query, format!("{}{query}", self.api_url), None))
    }

    /// `GET {resource}/{name}?k=v&...`
    pub fn build_search<P>(&self, params: &P, name: &str) -> Result<HttpRequest, ApiError>
    where
        P: Serialize + ?Sized,
    {
        let query = generate_param(&to_params(params)?);
        Ok(self.request(Operation::Query, format!("{}/{name}{query}", self.api_url), None))
    }

    /// `GET {resource}/{id}`
    pub fn build_find(&self, id: impl Display) -> HttpRequest {
        self.request(Operation::Query, self.member_url(id), None)
    }

    /// `PUT {resource}/{id}` with a JSON body.
    pub fn build_update<D>(&self, id: impl Display, data: &D) -> Result<HttpRequest, ApiError>
    where
        D: Serialize + ?Sized,
    {
        let body = serialize(data)?;
        Ok(self.request(Operation::Update, self.member_url(id), Some(body)))
    }

    /// `POST {resource}` with a JSON body.
    pub fn build_insert<D>(&self, data: &D) -> Result<HttpRequest, ApiError>
    where
        D: Serialize + ?Sized,
    {
        let body = serialize(data)?;
        Ok(self.request(Operation::Insert, self.api_url.clone(), Some(body)))
    }

    /// `DELETE {resource}/{id}`
    pub fn build_delete(&self, id: impl Display) -> HttpRequest {
        self.request(Operation::Delete, self.member_url(id), None)
    }

    // -----------------------------------------------------------------------
    // Operations
    // -----------------------------------------------------------------------

    /// List records using the default filter `{page: 1, sort: ""}`.
    pub async fn find_all(&self) -> Result<Vec<R>, ApiError> {
        self.find_all_by(&default_page_params()).await
    }

    pub async fn find_all_by<P>(&self, params: &P) -> Result<Vec<R>, ApiError>
    where
        P: Serialize + ?Sized,
    {
        self.call(self.build_find_all(params), parse_json).await
    }

    pub async fn search<P>(&self, params: &P, name: &str) -> Result<Vec<R>, ApiError>
    where
        P: Serialize + ?Sized,
    {
        self.call(self.build_search(params, name), parse_json).await
    }

    pub async fn find(&self, id: impl Display) -> Result<R, ApiError> {
        self.call(Ok(self.build_find(id)), parse_json).await
    }

    pub async fn update<D>(&self, id: impl Display, data: &D) -> Result<R, ApiError>
    where
        D: Serialize + ?Sized,
    {
        self.call(self.build_update(id, data), parse_json).await
    }

    pub async fn insert<D>(&self, data: &D) -> Result<R, ApiError>
    where
        D: Serialize + ?Sized,
    {
        self.call(self.build_insert(data), parse_json).await
    }

    /// Returns whatever the server sent back; an empty body is `Null`.
    pub async fn delete(&self, id: impl Display) -> Result<Value, ApiError> {
        self.call(Ok(self.build_delete(id)), parse_optional_json).await
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    fn member_url(&self, id: impl Display) -> String {
        format!("{}/{id}", self.api_url)
    }

    /// Configured headers go out on every operation, reads included.
    fn request(&self, op: Operation, url: String, body: Option<String>) -> HttpRequest {
        let mut headers = self.config.headers().to_vec();
        if body.is_some() && find_header(&headers, CONTENT_TYPE).is_none() {
            headers.push((CONTENT_TYPE.to_string(), APPLICATION_JSON.to_string()));
        }
        HttpRequest {
            method: self.methods.method(op),
            url,
            headers,
            body,
        }
    }

    /// Run one request through the transport and parse the outcome. Every
    /// failure, whatever its origin, is logged here exactly once.
    async fn call<O>(
        &self,
        request: Result<HttpRequest, ApiError>,
        parse: fn(HttpResponse) -> Result<O, ApiError>,
    ) -> Result<O, ApiError> {
        let outcome = match request {
            Ok(request) => self.send(request).await.and_then(parse),
            Err(err) => Err(err),
        };
        outcome.map_err(|err| {
            error!(resource = %self.resource, error = %err, "An error occurred");
            err
        })
    }

    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        debug!(method = %request.method, url = %request.url, "dispatching request");
        let response = self.transport.execute(request).await?;
        check_status(response)
    }
}

fn serialize<D: Serialize + ?Sized>(data: &D) -> Result<String, ApiError> {
    serde_json::to_string(data).map_err(|e| ApiError::Serialization(e.to_string()))
}

fn check_status(response: HttpResponse) -> Result<HttpResponse, ApiError> {
    if response.is_success() {
        return Ok(response);
    }
    Err(ApiError::Status {
        status: response.status,
        body: response.body,
    })
}

fn parse_json<O: DeserializeOwned>(response: HttpResponse) -> Result<O, ApiError> {
    serde_json::from_str(&response.body).map_err(|e| ApiError::Deserialization(e.to_string()))
}

fn parse_optional_json(response: HttpResponse) -> Result<Value, ApiError> {
    if response.body.trim().is_empty() {
        return Ok(Value::Null);
    }
    parse_json(response)
}
