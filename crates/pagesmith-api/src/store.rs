//! The consumed persistence interface
//!
//! `RemoteStore` is the contract the synchronization layer calls; the
//! editing core never talks to it directly. Implementations live outside
//! this crate (HTTP client, in-memory fake).

use async_trait::async_trait;
use serde::Serialize;

use crate::widget::{Config, WidgetDefinition, WidgetInstance};
use crate::{ApiError, Page};

/// Mutable fields sent on a widget update.
///
/// The backend upserts these wholesale; identity fields (`id`, `pageId`,
/// `createdAt`) never travel on an update.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WidgetUpdate {
    pub parent_id: Option<String>,
    pub widget_type: String,
    pub label: Option<String>,
    pub config: Config,
    pub order_index: i64,
    pub is_visible: bool,
    pub is_page_title: bool,
}

impl From<&WidgetInstance> for WidgetUpdate {
    fn from(w: &WidgetInstance) -> Self {
        Self {
            parent_id: w.parent_id.clone(),
            widget_type: w.widget_type.clone(),
            label: w.label.clone(),
            config: w.config.clone(),
            order_index: w.order_index,
            is_visible: w.is_visible,
            is_page_title: w.is_page_title,
        }
    }
}

/// CRUD contract against the builder backend.
///
/// Every call is a suspension point for the caller; widgets arrive ordered
/// by `order_index` within each parent group, but groups may arrive in any
/// order - the core re-sorts.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Fetch the persisted widgets for one page
    async fn fetch_widgets(&self, page_id: &str) -> Result<Vec<WidgetInstance>, ApiError>;

    /// Create a widget. The server may echo the client id or assign its
    /// own; the returned record's id is authoritative either way.
    async fn create_widget(&self, widget: &WidgetInstance) -> Result<WidgetInstance, ApiError>;

    /// Upsert the mutable fields of an existing widget
    async fn update_widget(&self, id: &str, fields: &WidgetUpdate) -> Result<(), ApiError>;

    /// Delete server-side. The server may cascade-delete or re-parent
    /// children; callers must not assume either and should re-fetch.
    async fn delete_widget(&self, id: &str) -> Result<(), ApiError>;

    /// Fetch the definition for one widget type (used to seed config at
    /// creation time)
    async fn fetch_widget_definition(&self, widget_type: &str)
        -> Result<WidgetDefinition, ApiError>;

    /// Fetch the full widget-type catalog for the palette
    async fn fetch_widget_definitions(&self) -> Result<Vec<WidgetDefinition>, ApiError>;

    /// Fetch the pages of an app instance for the page selector
    async fn fetch_pages(&self, app_instance_id: &str) -> Result<Vec<Page>, ApiError>;
}
