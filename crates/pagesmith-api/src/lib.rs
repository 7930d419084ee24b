//! Shared contracts for the pagesmith workspace
//!
//! This crate holds the wire-shaped records exchanged with the builder
//! backend and the traits the rest of the workspace consumes:
//! - `widget` - WidgetInstance and WidgetDefinition records
//! - `page` - Page record (opaque selector for the core)
//! - `store` - RemoteStore trait, the consumed persistence interface

use serde::{Deserialize, Serialize};

pub mod page;
pub mod store;
pub mod widget;

pub use page::Page;
pub use store::{RemoteStore, WidgetUpdate};
pub use widget::{Config, WidgetDefinition, WidgetInstance};

/// Structured error types for remote store operations.
///
/// All persistence failures surface as one of these variants; the
/// synchronization layer catches them at its boundary and they never
/// propagate into the tree model or placement engine.
#[derive(Debug, Clone, Serialize, Deserialize, thiserror::Error)]
pub enum ApiError {
    #[error("Widget not found: {id}")]
    WidgetNotFound { id: String },

    #[error("Page not found: {page_id}")]
    PageNotFound { page_id: String },

    #[error("Widget definition not found: {widget_type}")]
    DefinitionNotFound { widget_type: String },

    #[error("Invalid operation: {message}")]
    InvalidOperation { message: String },

    #[error("Network error: {message}")]
    NetworkError { message: String },

    #[error("Internal error: {message}")]
    InternalError { message: String },
}
