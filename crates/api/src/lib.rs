//! Roster public API façade (in-process).
//!
//! Front ends (CLI, hosts) depend on the [`RosterApi`] trait. The in-process
//! implementation composes the query builder, the paged fetch client and the
//! view adapter; configuration is passed in explicitly.

#![forbid(unsafe_code)]

use std::time::Instant;

use roster_client::{ClientConfig, ClientError, HttpTransport, ListClient, ListTransport};
use roster_core::{FieldMapping, PageDescriptor, PageResult};
use roster_query::{QueryBuilder, QueryError, QueryParams};
use roster_view::{ResultsView, ViewOptions};
use serde::{Deserialize, Serialize};
use tracing::info;

pub use roster_core::{FieldMappingEntry, Record};
pub use roster_query::QueryDefaults;
pub use roster_view::{Layout, SkillCard};

/// One search call: parameters, the field mapping in effect and how to shape the view.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchRequest {
    pub params: QueryParams,
    pub fields: FieldMapping,
    #[serde(default)]
    pub view: ViewOptions,
}

/// A built query that has not been sent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlannedQuery {
    pub descriptor: PageDescriptor,
    pub url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseMeta {
    pub took_ms: u64,
    pub request_url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    pub descriptor: PageDescriptor,
    pub page: PageResult,
    pub view: ResultsView,
    pub meta: ResponseMeta,
}

/// API errors suitable for transport to a rendering layer.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Serialize, Deserialize)]
pub enum RosterError {
    #[error("validation: {0}")]
    Validation(String),
    #[error("request: {0}")]
    Request(String),
    #[error("decode: {0}")]
    Decode(String),
    #[error("internal: {0}")]
    Internal(String),
}

pub type RosterResult<T> = Result<T, RosterError>;

impl From<QueryError> for RosterError {
    fn from(e: QueryError) -> Self { RosterError::Validation(e.to_string()) }
}

impl From<ClientError> for RosterError {
    fn from(e: ClientError) -> Self {
        match e {
            ClientError::RequestFailed { .. } | ClientError::Transport(_) => RosterError::Request(e.to_string()),
            ClientError::ParseFailed(_) => RosterError::Decode(e.to_string()),
            ClientError::InvalidEndpoint(_) => RosterError::Validation(e.to_string()),
        }
    }
}

#[async_trait::async_trait]
pub trait RosterApi: Send + Sync {
    /// Build the descriptor and request URL without touching the network.
    fn plan(&self, params: &QueryParams, fields: &FieldMapping) -> RosterResult<PlannedQuery>;

    /// Build, fetch and shape one page.
    async fn search(&self, request: SearchRequest) -> RosterResult<SearchResponse>;

    /// Same as [`RosterApi::search`] for a given 1-based page.
    async fn fetch_page(&self, mut request: SearchRequest, page_number: u32) -> RosterResult<SearchResponse> {
        request.params.page_number = Some(page_number);
        self.search(request).await
    }
}

/// In-process implementation calling the builder and client directly.
pub struct InProcApi<T = HttpTransport> {
    builder: QueryBuilder,
    client: ListClient<T>,
}

impl InProcApi<HttpTransport> {
    pub fn new(config: &ClientConfig) -> RosterResult<Self> {
        Ok(Self::with_parts(QueryBuilder::default(), ListClient::from_config(config)?))
    }
}

impl<T: ListTransport> InProcApi<T> {
    pub fn with_parts(builder: QueryBuilder, client: ListClient<T>) -> Self { Self { builder, client } }
}

#[async_trait::async_trait]
impl<T: ListTransport> RosterApi for InProcApi<T> {
    fn plan(&self, params: &QueryParams, fields: &FieldMapping) -> RosterResult<PlannedQuery> {
        let descriptor = self.builder.build(params, fields)?;
        let url = self.client.request_url(&descriptor).to_string();
        Ok(PlannedQuery { descriptor, url })
    }

    async fn search(&self, request: SearchRequest) -> RosterResult<SearchResponse> {
        let t0 = Instant::now();
        info!(search = ?request.params.search, page = ?request.params.page_number, fields = request.fields.len(), "api: search start");
        let PlannedQuery { descriptor, url } = self.plan(&request.params, &request.fields)?;
        let page = self.client.fetch(&descriptor).await?;
        let view = roster_view::render_results(&page, &request.fields, request.view)
            .map_err(|e| RosterError::Internal(e.to_string()))?;
        let took_ms = t0.elapsed().as_millis() as u64;
        info!(records = page.records.len(), has_next = page.has_next, took_ms, "api: search ok");
        Ok(SearchResponse { descriptor, page, view, meta: ResponseMeta { took_ms, request_url: url } })
    }
}
