//! The page-editing session
//!
//! `PageSession` owns one page's tree, selection, and the persistence
//! baseline. Mutations apply locally first; placement changes are then
//! pushed as per-widget upserts diffed against what the server last
//! acknowledged. Persistence failures are logged and surfaced as events
//! but never roll the local state back.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use pagesmith_api::{
    ApiError, Config, Page, RemoteStore, WidgetDefinition, WidgetInstance, WidgetUpdate,
};
use pagesmith_core::{
    resolve_gesture, DragSource, DropTarget, EditState, Placement, WidgetNode, WidgetTree,
};

use crate::events::SessionEvent;

const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Lifecycle of a session with respect to its page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Unloaded,
    Loading,
    Ready,
}

/// Placement the server last acknowledged for one widget. `id` is the
/// diff key; everything else is compared against the local tree.
#[derive(Debug, Clone, PartialEq, Eq)]
struct PersistedPlacement {
    parent_id: Option<String>,
    order_index: i64,
}

impl From<&WidgetInstance> for PersistedPlacement {
    fn from(w: &WidgetInstance) -> Self {
        Self {
            parent_id: w.parent_id.clone(),
            order_index: w.order_index,
        }
    }
}

pub struct PageSession {
    store: Arc<dyn RemoteStore>,
    tree: WidgetTree,
    edit: EditState,
    state: SessionState,
    persisted: HashMap<String, PersistedPlacement>,
    events: broadcast::Sender<SessionEvent>,
}

impl PageSession {
    pub fn new(store: Arc<dyn RemoteStore>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            store,
            tree: WidgetTree::new(),
            edit: EditState::new(),
            state: SessionState::Unloaded,
            persisted: HashMap::new(),
            events,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn tree(&self) -> &WidgetTree {
        &self.tree
    }

    pub fn nodes(&self) -> Vec<WidgetNode> {
        self.tree.build_tree()
    }

    pub fn selected(&self) -> Option<&str> {
        self.edit.selected()
    }

    pub fn is_dirty(&self) -> bool {
        self.edit.is_dirty()
    }

    /// Load (or switch to) a page. On failure the previous state and tree
    /// are kept and the error is returned.
    pub async fn load_page(&mut self, page_id: &str) -> Result<(), ApiError> {
        let previous = self.state;
        self.state = SessionState::Loading;
        debug!("[PageSession] Loading page: page_id={}", page_id);

        match self.store.fetch_widgets(page_id).await {
            Ok(widgets) => {
                info!(
                    "[PageSession] Page loaded: page_id={}, widgets={}",
                    page_id,
                    widgets.len()
                );
                self.tree.load(page_id, widgets);
                self.snapshot_persisted();
                self.edit.clear();
                self.state = SessionState::Ready;
                self.emit(SessionEvent::PageLoaded {
                    page_id: page_id.to_string(),
                });
                Ok(())
            }
            Err(e) => {
                error!("[PageSession] Failed to load page {}: {}", page_id, e);
                self.state = previous;
                Err(e)
            }
        }
    }

    /// Resolve a drag gesture and, if it maps to a mutation, apply it
    /// locally and push the placement diff. Returns whether anything
    /// changed.
    pub async fn apply_gesture(
        &mut self,
        source: &DragSource,
        target: Option<&DropTarget>,
    ) -> bool {
        if self.state != SessionState::Ready {
            return false;
        }
        let Some(placement) = resolve_gesture(&self.tree, source, target) else {
            return false;
        };

        match placement {
            Placement::InsertNew {
                widget_type,
                parent_id,
                index,
            } => {
                // A missing definition never blocks the drop; the widget
                // starts with an empty config instead
                let config = match self.store.fetch_widget_definition(&widget_type).await {
                    Ok(definition) => definition.parsed_default_config(),
                    Err(e) => {
                        warn!(
                            "[PageSession] No definition for type {}: {} - using empty config",
                            widget_type, e
                        );
                        Config::new()
                    }
                };
                let page_id = self.tree.page_id().unwrap_or_default().to_string();
                let mut widget =
                    WidgetInstance::new(Uuid::new_v4().to_string(), page_id, widget_type);
                widget.config = config;
                self.tree.insert(widget, parent_id.as_deref(), index);
            }
            Placement::Move {
                id,
                parent_id,
                index,
            } => {
                self.tree.move_widget(&id, parent_id.as_deref(), index);
            }
        }

        self.emit(SessionEvent::WidgetsChanged);
        self.persist_placement().await;
        true
    }

    pub fn select_widget(&mut self, id: &str) {
        if !self.tree.contains(id) {
            return;
        }
        self.edit.select(id);
        self.emit(SessionEvent::WidgetSelected {
            id: Some(id.to_string()),
        });
    }

    pub fn clear_selection(&mut self) {
        self.edit.clear();
        self.emit(SessionEvent::WidgetSelected { id: None });
    }

    /// Apply one config edit locally. Nothing is sent until
    /// `save_selected` is called.
    pub fn update_config(
        &mut self,
        id: &str,
        key: impl Into<String>,
        value: impl Into<serde_json::Value>,
    ) -> Result<(), ApiError> {
        self.tree.update_config(id, key, value)?;
        if self.edit.is_selected(id) {
            self.edit.mark_dirty();
        }
        self.emit(SessionEvent::WidgetsChanged);
        Ok(())
    }

    /// Push the selected widget's full record to the backend. On failure
    /// the error propagates and the widget stays dirty for a retry.
    pub async fn save_selected(&mut self) -> Result<(), ApiError> {
        let Some(id) = self.edit.selected().map(str::to_string) else {
            return Ok(());
        };
        let Some(widget) = self.tree.get(&id).cloned() else {
            return Ok(());
        };

        if self.persisted.contains_key(&id) {
            self.store
                .update_widget(&id, &WidgetUpdate::from(&widget))
                .await?;
            self.persisted
                .insert(id.clone(), PersistedPlacement::from(&widget));
        } else {
            let created = self.store.create_widget(&widget).await?;
            if created.id != id {
                self.adopt_server_id(&id, &created.id);
            }
            self.persisted
                .insert(created.id.clone(), PersistedPlacement::from(&widget));
        }

        debug!("[PageSession] Saved widget: id={}", id);
        self.edit.clear_dirty();
        Ok(())
    }

    /// Remove a widget locally, delete it server-side, then re-fetch the
    /// page so whatever the server did with the children (cascade or
    /// re-parent) becomes the local truth. Unknown ids are a no-op.
    pub async fn delete_widget(&mut self, id: &str) -> Result<(), ApiError> {
        if self.state != SessionState::Ready || !self.tree.contains(id) {
            return Ok(());
        }

        self.tree.remove(id);
        if self.edit.is_selected(id) {
            self.edit.clear();
            self.emit(SessionEvent::WidgetSelected { id: None });
        }
        self.emit(SessionEvent::WidgetsChanged);

        if let Err(e) = self.store.delete_widget(id).await {
            error!("[PageSession] Failed to delete widget {}: {}", id, e);
            self.emit(SessionEvent::PersistFailed {
                message: e.to_string(),
            });
        }

        self.refresh().await
    }

    /// The widget-type catalog for the palette
    pub async fn palette(&self) -> Result<Vec<WidgetDefinition>, ApiError> {
        self.store.fetch_widget_definitions().await
    }

    /// The pages of an app instance for the page selector
    pub async fn pages(&self, app_instance_id: &str) -> Result<Vec<Page>, ApiError> {
        self.store.fetch_pages(app_instance_id).await
    }

    /// Re-fetch the active page, keeping the local tree if the fetch
    /// fails.
    async fn refresh(&mut self) -> Result<(), ApiError> {
        let Some(page_id) = self.tree.page_id().map(str::to_string) else {
            return Ok(());
        };
        self.state = SessionState::Loading;
        match self.store.fetch_widgets(&page_id).await {
            Ok(widgets) => {
                self.tree.load(&page_id, widgets);
                self.snapshot_persisted();
                self.state = SessionState::Ready;
                self.emit(SessionEvent::WidgetsChanged);
                Ok(())
            }
            Err(e) => {
                error!("[PageSession] Refresh failed for page {}: {}", page_id, e);
                self.state = SessionState::Ready;
                Err(e)
            }
        }
    }

    /// Push every placement the local tree holds that the server has not
    /// acknowledged: unknown ids are created, known ids whose parent or
    /// order changed are updated, untouched ids produce no call. Failures
    /// are logged per widget and skipped; the baseline only advances for
    /// acknowledged widgets.
    async fn persist_placement(&mut self) {
        let widgets: Vec<WidgetInstance> = self.tree.widgets().to_vec();
        let mut live: HashSet<String> = HashSet::new();

        for widget in widgets {
            live.insert(widget.id.clone());
            match self.persisted.get(&widget.id) {
                None => match self.store.create_widget(&widget).await {
                    Ok(created) => {
                        if created.id != widget.id {
                            self.adopt_server_id(&widget.id, &created.id);
                            live.remove(&widget.id);
                            live.insert(created.id.clone());
                        }
                        self.persisted
                            .insert(created.id.clone(), PersistedPlacement::from(&widget));
                    }
                    Err(e) => {
                        error!(
                            "[PageSession] Failed to create widget {}: {}",
                            widget.id, e
                        );
                        self.emit(SessionEvent::PersistFailed {
                            message: e.to_string(),
                        });
                    }
                },
                Some(placement) if *placement != PersistedPlacement::from(&widget) => {
                    match self
                        .store
                        .update_widget(&widget.id, &WidgetUpdate::from(&widget))
                        .await
                    {
                        Ok(()) => {
                            self.persisted
                                .insert(widget.id.clone(), PersistedPlacement::from(&widget));
                        }
                        Err(e) => {
                            error!(
                                "[PageSession] Failed to update widget {}: {}",
                                widget.id, e
                            );
                            self.emit(SessionEvent::PersistFailed {
                                message: e.to_string(),
                            });
                        }
                    }
                }
                Some(_) => {}
            }
        }

        // Ids the tree no longer holds are dropped from the baseline; the
        // delete path already issued the server call
        self.persisted.retain(|id, _| live.contains(id));
    }

    fn adopt_server_id(&mut self, old: &str, new: &str) {
        debug!(
            "[PageSession] Adopting server id: client_id={}, server_id={}",
            old, new
        );
        self.tree.replace_id(old, new);
        if self.edit.is_selected(old) {
            let was_dirty = self.edit.is_dirty();
            self.edit.select(new);
            if was_dirty {
                self.edit.mark_dirty();
            }
        }
    }

    fn snapshot_persisted(&mut self) {
        self.persisted = self
            .tree
            .widgets()
            .iter()
            .map(|w| (w.id.clone(), PersistedPlacement::from(w)))
            .collect();
    }

    fn emit(&self, event: SessionEvent) {
        // Fire-and-forget; no subscriber is fine
        let _ = self.events.send(event);
    }
}
