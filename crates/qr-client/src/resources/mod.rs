//! Resource adapters
//!
//! An adapter maps logical operations on one entity type (list, get,
//! create, update) to [`RequestDescriptor`]s and parses the raw responses.
//! Adapters hold no mutable state: swapping the adapter changes which
//! endpoint a [`ListViewController`](crate::list::ListViewController)
//! drives without changing its semantics.

mod assessments;
mod certificates;
mod files;
mod users;

pub use assessments::{AssessmentsAdapter, ReportFormat};
pub use certificates::CertificatesAdapter;
pub use files::FilesAdapter;
pub use users::{RegistrationRequest, UsersAdapter};

use crate::error::{Error, Result};
use crate::gateway::RequestExecutor;
use crate::request::{ApiResponse, RequestDescriptor};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::num::NonZeroU32;
use std::sync::Arc;

/// Default number of rows per page
pub const DEFAULT_PAGE_SIZE: NonZeroU32 = match NonZeroU32::new(10) {
    Some(size) => size,
    None => NonZeroU32::MIN,
};

/// How a filter's edits are turned into fetches
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterKind {
    /// Free text, fetched after the typing pause
    Text,
    /// Dropdown-style choice, fetched right away
    Discrete,
}

/// A filter an adapter accepts as a list query parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterSpec {
    pub name: &'static str,
    pub kind: FilterKind,
}

impl FilterSpec {
    pub const fn text(name: &'static str) -> Self {
        Self {
            name,
            kind: FilterKind::Text,
        }
    }

    pub const fn discrete(name: &'static str) -> Self {
        Self {
            name,
            kind: FilterKind::Discrete,
        }
    }
}

/// Filters and pagination of one list
///
/// Page and page size are never zero. Changing any filter resets the page
/// to 1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery {
    filters: BTreeMap<String, String>,
    page: NonZeroU32,
    page_size: NonZeroU32,
}

impl ListQuery {
    pub fn new(page_size: NonZeroU32) -> Self {
        Self {
            filters: BTreeMap::new(),
            page: NonZeroU32::MIN,
            page_size,
        }
    }

    pub fn filters(&self) -> &BTreeMap<String, String> {
        &self.filters
    }

    pub fn filter(&self, name: &str) -> Option<&str> {
        self.filters.get(name).map(String::as_str)
    }

    pub fn page(&self) -> u32 {
        self.page.get()
    }

    pub fn page_size(&self) -> NonZeroU32 {
        self.page_size
    }

    /// Set a filter value; a blank value removes the filter. Resets the page.
    pub fn set_filter(&mut self, name: &str, value: &str) {
        let value = value.trim();
        if value.is_empty() {
            self.filters.remove(name);
        } else {
            self.filters.insert(name.to_string(), value.to_string());
        }
        self.page = NonZeroU32::MIN;
    }

    pub fn set_page(&mut self, page: NonZeroU32) {
        self.page = page;
    }

    /// Change the page size; resets the page
    pub fn set_page_size(&mut self, page_size: NonZeroU32) {
        self.page_size = page_size;
        self.page = NonZeroU32::MIN;
    }

    /// Query parameters: `page`, `limit`, then the filters by name
    pub fn to_params(&self) -> Vec<(String, String)> {
        let mut params = vec![
            ("page".to_string(), self.page.to_string()),
            ("limit".to_string(), self.page_size.to_string()),
        ];
        params.extend(self.filters.iter().map(|(k, v)| (k.clone(), v.clone())));
        params
    }
}

impl Default for ListQuery {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

/// One page of entities plus the total across all pages
#[derive(Debug, Clone, PartialEq)]
pub struct ListResult<E> {
    pub items: Vec<E>,
    pub total: u64,
}

impl<E> ListResult<E> {
    /// `ceil(total / page_size)`
    pub fn page_count(&self, page_size: NonZeroU32) -> u64 {
        self.total.div_ceil(u64::from(page_size.get()))
    }
}

/// Mapping from logical operations on one entity type to API calls
pub trait ResourceAdapter: Send + Sync + 'static {
    type Entity: DeserializeOwned + Clone + Send + Sync + 'static;

    /// Plural resource name, used as the error context label
    fn resource(&self) -> &'static str;

    /// Singular name of the wrapper field in single-entity responses
    fn entity_name(&self) -> &'static str;

    fn collection_path(&self) -> String;

    fn entity_path(&self, id: &str) -> String;

    /// Filters accepted by the list endpoint
    fn filters(&self) -> &'static [FilterSpec];

    /// Field of the list response holding the items
    fn items_field(&self) -> &'static str {
        self.resource()
    }

    fn filter_kind(&self, name: &str) -> Option<FilterKind> {
        self.filters()
            .iter()
            .find(|spec| spec.name == name)
            .map(|spec| spec.kind)
    }

    fn list_request(&self, query: &ListQuery) -> RequestDescriptor {
        RequestDescriptor::get(self.collection_path()).with_queries(query.to_params())
    }

    /// Items come from [`items_field`](Self::items_field); `total` from the
    /// top level or `pagination.total`, else the item count.
    fn parse_list(&self, response: &ApiResponse) -> Result<ListResult<Self::Entity>> {
        let body = response
            .as_json()
            .ok_or_else(|| Error::Decode(format!("{} list response is not JSON", self.resource())))?;

        let items = match body.get(self.items_field()) {
            Some(Value::Null) | None => Vec::new(),
            Some(items) => <Vec<Self::Entity> as Deserialize>::deserialize(items)?,
        };
        let total = body
            .get("total")
            .or_else(|| body.pointer("/pagination/total"))
            .and_then(Value::as_u64)
            .unwrap_or(items.len() as u64);

        Ok(ListResult { items, total })
    }

    fn get_request(&self, id: &str) -> RequestDescriptor {
        RequestDescriptor::get(self.entity_path(id))
    }

    /// Single entity, either wrapped in [`entity_name`](Self::entity_name) or bare
    fn parse_entity(&self, response: &ApiResponse) -> Result<Self::Entity> {
        let body = response
            .as_json()
            .ok_or_else(|| Error::Decode(format!("{} response is not JSON", self.entity_name())))?;
        let entity = body.get(self.entity_name()).unwrap_or(body);
        Ok(<Self::Entity as Deserialize>::deserialize(entity)?)
    }

    fn create_request(&self, body: Value) -> Result<RequestDescriptor> {
        Ok(RequestDescriptor::post(self.collection_path()).with_body(body))
    }

    fn update_request(&self, id: &str, body: Value) -> Result<RequestDescriptor> {
        Ok(RequestDescriptor::put(self.entity_path(id)).with_body(body))
    }
}

/// Adapter bound to an executor for single-entity operations
pub struct ResourceClient<A: ResourceAdapter> {
    adapter: A,
    executor: Arc<dyn RequestExecutor>,
}

impl<A: ResourceAdapter> ResourceClient<A> {
    pub fn new(adapter: A, executor: Arc<dyn RequestExecutor>) -> Self {
        Self { adapter, executor }
    }

    pub fn adapter(&self) -> &A {
        &self.adapter
    }

    pub async fn list(&self, query: &ListQuery) -> Result<ListResult<A::Entity>> {
        let response = self.executor.execute(&self.adapter.list_request(query)).await?;
        self.adapter.parse_list(&response)
    }

    pub async fn get(&self, id: &str) -> Result<A::Entity> {
        let response = self.executor.execute(&self.adapter.get_request(id)).await?;
        self.adapter.parse_entity(&response)
    }

    pub async fn create(&self, body: Value) -> Result<ApiResponse> {
        let request = self.adapter.create_request(body)?;
        self.executor.execute(&request).await
    }

    pub async fn update(&self, id: &str, body: Value) -> Result<ApiResponse> {
        let request = self.adapter.update_request(id, body)?;
        self.executor.execute(&request).await
    }

    /// Run an adapter-specific request, such as an assessment stage advance
    pub async fn execute(&self, request: RequestDescriptor) -> Result<ApiResponse> {
        self.executor.execute(&request).await
    }
}
