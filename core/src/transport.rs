//! The HTTP transport seam and a `ureq`-backed implementation.
//!
//! # Design
//! A transport executes one `HttpRequest` and resolves once with either the
//! `HttpResponse` or a `TransportError`. Non-2xx statuses are returned as
//! data; interpreting them is the client's job. Timeouts, connection reuse
//! and TLS all belong to the transport.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::TransportError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};

/// Executes HTTP requests on behalf of an `ActiveRecord`.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError>;
}

#[async_trait]
impl<'a, T: Transport + ?Sized> Transport for &'a T {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        (**self).execute(request).await
    }
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        (**self).execute(request).await
    }
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Box<T> {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        (**self).execute(request).await
    }
}

/// Transport running a blocking `ureq` agent on tokio's blocking pool.
///
/// Status codes are never turned into errors here, so 4xx/5xx responses
/// reach the client as data.
#[derive(Clone)]
pub struct UreqTransport {
    agent: ureq::Agent,
}

impl UreqTransport {
    pub fn new() -> Self {
        Self::build(None)
    }

    /// Abort any request that takes longer than `timeout` end to end.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self::build(Some(timeout))
    }

    fn build(timeout: Option<Duration>) -> Self {
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(timeout)
            .build()
            .new_agent();
        Self { agent }
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for UreqTransport {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let agent = self.agent.clone();
        tokio::task::spawn_blocking(move || execute_blocking(&agent, request))
            .await
            .map_err(TransportError::from_source)?
            .map_err(TransportError::from_source)
    }
}

fn execute_blocking(agent: &ureq::Agent, request: HttpRequest) -> Result<HttpResponse, ureq::Error> {
    let url = request.url.as_str();
    let headers = &request.headers;
    let body = request.body.as_deref();

    let mut response = match request.method {
        HttpMethod::Get => call(with_headers(agent.get(url), headers), body),
        HttpMethod::Delete => call(with_headers(agent.delete(url), headers), body),
        HttpMethod::Head => call(with_headers(agent.head(url), headers), body),
        HttpMethod::Options => call(with_headers(agent.options(url), headers), body),
        HttpMethod::Post => send(with_headers(agent.post(url), headers), body),
        HttpMethod::Put => send(with_headers(agent.put(url), headers), body),
        HttpMethod::Patch => send(with_headers(agent.patch(url), headers), body),
    }?;

    let status = response.status().as_u16();
    let headers = response
        .headers()
        .iter()
        .map(|(name, value)| {
            (
                name.as_str().to_string(),
                value.to_str().unwrap_or_default().to_string(),
            )
        })
        .collect();
    let body = if request.method == HttpMethod::Head {
        String::new()
    } else {
        response.body_mut().read_to_string()?
    };

    Ok(HttpResponse {
        status,
        headers,
        body,
    })
}

fn with_headers<B>(mut builder: ureq::RequestBuilder<B>, headers: &[(String, String)]) -> ureq::RequestBuilder<B> {
    for (name, value) in headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    builder
}

// A body handed to a bodyless method is still sent rather than dropped.
fn call(
    builder: ureq::RequestBuilder<ureq::typestate::WithoutBody>,
    body: Option<&str>,
) -> Result<ureq::http::Response<ureq::Body>, ureq::Error> {
    match body {
        Some(body) => builder.force_send_body().send(body.as_bytes()),
        None => builder.call(),
    }
}

fn send(
    builder: ureq::RequestBuilder<ureq::typestate::WithBody>,
    body: Option<&str>,
) -> Result<ureq::http::Response<ureq::Body>, ureq::Error> {
    match body {
        Some(body) => builder.send(body.as_bytes()),
        None => builder.send_empty(),
    }
}
