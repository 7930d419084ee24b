//! In-memory `RemoteStore` for tests and offline work
//!
//! Behaves like the real backend at the API level: per-widget upserts,
//! deletes without cascading (children are left dangling, as the server
//! does), optional server-assigned ids on create. Every call is recorded
//! so tests can assert exactly which requests a scenario produced.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::{Mutex, RwLock};

use pagesmith_api::{
    ApiError, Page, RemoteStore, WidgetDefinition, WidgetInstance, WidgetUpdate,
};

/// One recorded store call, in arrival order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCall {
    FetchWidgets { page_id: String },
    CreateWidget { id: String },
    UpdateWidget { id: String },
    DeleteWidget { id: String },
    FetchWidgetDefinition { widget_type: String },
    FetchWidgetDefinitions,
    FetchPages { app_instance_id: String },
}

pub struct FakeRemoteStore {
    widgets: RwLock<HashMap<String, WidgetInstance>>,
    definitions: RwLock<HashMap<String, WidgetDefinition>>,
    pages: RwLock<Vec<Page>>,
    calls: Mutex<Vec<StoreCall>>,
    fail_writes: AtomicBool,
    fail_fetches: AtomicBool,
    assign_server_ids: AtomicBool,
    next_server_id: AtomicU64,
}

impl FakeRemoteStore {
    pub fn new() -> Self {
        Self {
            widgets: RwLock::new(HashMap::new()),
            definitions: RwLock::new(HashMap::new()),
            pages: RwLock::new(Vec::new()),
            calls: Mutex::new(Vec::new()),
            fail_writes: AtomicBool::new(false),
            fail_fetches: AtomicBool::new(false),
            assign_server_ids: AtomicBool::new(false),
            next_server_id: AtomicU64::new(1),
        }
    }

    pub async fn seed_widgets(&self, widgets: Vec<WidgetInstance>) {
        let mut store = self.widgets.write().await;
        for widget in widgets {
            store.insert(widget.id.clone(), widget);
        }
    }

    pub async fn seed_definition(&self, definition: WidgetDefinition) {
        self.definitions
            .write()
            .await
            .insert(definition.widget_type.clone(), definition);
    }

    pub async fn seed_pages(&self, pages: Vec<Page>) {
        *self.pages.write().await = pages;
    }

    /// Make every write call fail with a network error
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Make widget fetches fail with a network error
    pub fn set_fail_fetches(&self, fail: bool) {
        self.fail_fetches.store(fail, Ordering::SeqCst);
    }

    /// Make creates return a server-assigned id instead of echoing the
    /// client's
    pub fn set_assign_server_ids(&self, assign: bool) {
        self.assign_server_ids.store(assign, Ordering::SeqCst);
    }

    pub async fn calls(&self) -> Vec<StoreCall> {
        self.calls.lock().await.clone()
    }

    pub async fn clear_calls(&self) {
        self.calls.lock().await.clear();
    }

    pub async fn widget(&self, id: &str) -> Option<WidgetInstance> {
        self.widgets.read().await.get(id).cloned()
    }

    pub async fn widget_count(&self) -> usize {
        self.widgets.read().await.len()
    }

    async fn record(&self, call: StoreCall) {
        self.calls.lock().await.push(call);
    }

    fn check_writes(&self) -> Result<(), ApiError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(ApiError::NetworkError {
                message: "injected write failure".to_string(),
            });
        }
        Ok(())
    }
}

impl Default for FakeRemoteStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RemoteStore for FakeRemoteStore {
    async fn fetch_widgets(&self, page_id: &str) -> Result<Vec<WidgetInstance>, ApiError> {
        self.record(StoreCall::FetchWidgets {
            page_id: page_id.to_string(),
        })
        .await;
        if self.fail_fetches.load(Ordering::SeqCst) {
            return Err(ApiError::NetworkError {
                message: "injected fetch failure".to_string(),
            });
        }
        Ok(self
            .widgets
            .read()
            .await
            .values()
            .filter(|w| w.page_id == page_id)
            .cloned()
            .collect())
    }

    async fn create_widget(&self, widget: &WidgetInstance) -> Result<WidgetInstance, ApiError> {
        self.record(StoreCall::CreateWidget {
            id: widget.id.clone(),
        })
        .await;
        self.check_writes()?;

        let mut created = widget.clone();
        if self.assign_server_ids.load(Ordering::SeqCst) {
            let n = self.next_server_id.fetch_add(1, Ordering::SeqCst);
            created.id = format!("srv-{}", n);
        }
        created.created_at = Utc::now();

        self.widgets
            .write()
            .await
            .insert(created.id.clone(), created.clone());
        Ok(created)
    }

    async fn update_widget(&self, id: &str, fields: &WidgetUpdate) -> Result<(), ApiError> {
        self.record(StoreCall::UpdateWidget { id: id.to_string() }).await;
        self.check_writes()?;

        let mut store = self.widgets.write().await;
        let widget = store.get_mut(id).ok_or_else(|| ApiError::WidgetNotFound {
            id: id.to_string(),
        })?;
        widget.parent_id = fields.parent_id.clone();
        widget.widget_type = fields.widget_type.clone();
        widget.label = fields.label.clone();
        widget.config = fields.config.clone();
        widget.order_index = fields.order_index;
        widget.is_visible = fields.is_visible;
        widget.is_page_title = fields.is_page_title;
        widget.updated_at = Some(Utc::now());
        Ok(())
    }

    async fn delete_widget(&self, id: &str) -> Result<(), ApiError> {
        self.record(StoreCall::DeleteWidget { id: id.to_string() }).await;
        self.check_writes()?;

        // No cascade: children keep their parentId and dangle, as the
        // real backend does
        self.widgets
            .write()
            .await
            .remove(id)
            .ok_or_else(|| ApiError::WidgetNotFound { id: id.to_string() })?;
        Ok(())
    }

    async fn fetch_widget_definition(
        &self,
        widget_type: &str,
    ) -> Result<WidgetDefinition, ApiError> {
        self.record(StoreCall::FetchWidgetDefinition {
            widget_type: widget_type.to_string(),
        })
        .await;
        self.definitions
            .read()
            .await
            .get(widget_type)
            .cloned()
            .ok_or_else(|| ApiError::DefinitionNotFound {
                widget_type: widget_type.to_string(),
            })
    }

    async fn fetch_widget_definitions(&self) -> Result<Vec<WidgetDefinition>, ApiError> {
        self.record(StoreCall::FetchWidgetDefinitions).await;
        Ok(self.definitions.read().await.values().cloned().collect())
    }

    async fn fetch_pages(&self, app_instance_id: &str) -> Result<Vec<Page>, ApiError> {
        self.record(StoreCall::FetchPages {
            app_instance_id: app_instance_id.to_string(),
        })
        .await;
        Ok(self.pages.read().await.clone())
    }
}
