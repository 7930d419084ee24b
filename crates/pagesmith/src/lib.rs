//! Page-editing session layer
//!
//! Ties the pure editing core to a `RemoteStore`: optimistic local
//! mutations, placement persistence by per-widget diff, explicit config
//! saves, and a broadcast event channel for UI layers.

pub mod events;
pub mod session;

pub use events::SessionEvent;
pub use session::{PageSession, SessionState};

pub use pagesmith_api::{
    ApiError, Config, Page, RemoteStore, WidgetDefinition, WidgetInstance, WidgetUpdate,
};
pub use pagesmith_core::{
    resolve_gesture, DragSource, DropTarget, EditState, Placement, WidgetNode, WidgetTree,
};
