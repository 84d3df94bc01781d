//! Active-record style REST client.
//!
//! # Overview
//! Given a base URL, a resource name and an HTTP transport, `ActiveRecord`
//! builds CRUD URLs, dispatches `find_all`/`search`/`find`/`update`/
//! `insert`/`delete` calls and returns parsed JSON.
//!
//! # Design
//! - `ApiConfig` resolves caller options against defaults once; the client
//!   only reads it afterwards.
//! - Each operation is split into a pure `build_*` step (produces an
//!   `HttpRequest`) and an async dispatch through a `Transport`, so request
//!   shapes are testable without a network.
//! - Transports are injected; `UreqTransport` is the bundled one.
//! - All failures surface as `ApiError` and are logged once via `tracing`.

pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod params;
pub mod transport;

pub use client::{ActiveRecord, MethodTable};
pub use config::{ApiConfig, ApiOptions, Operation, VerbMapping, VerbOptions, DEFAULT_BASE_URL};
pub use error::{ApiError, TransportError};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use params::{generate_param, Params};
pub use transport::{Transport, UreqTransport};
