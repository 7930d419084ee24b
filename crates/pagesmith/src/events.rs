//! Session events for UI layers
//!
//! Emitted on a `tokio::sync::broadcast` channel, fire-and-forget: the
//! session never blocks on (or fails because of) a slow or absent
//! subscriber.

/// What just happened inside a `PageSession`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// A page finished loading and the tree was replaced
    PageLoaded { page_id: String },
    /// The widget tree changed shape or content
    WidgetsChanged,
    /// The selection changed; `None` means nothing is selected
    WidgetSelected { id: Option<String> },
    /// A background persistence call failed; local state was kept
    PersistFailed { message: String },
}
