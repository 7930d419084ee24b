//! Editing core for the pagesmith workspace
//!
//! Pure, synchronous, no I/O:
//! - `tree` - WidgetTree, the in-memory model of one page's widgets
//! - `placement` - drag-and-drop gesture resolution
//! - `selection` - selected-widget and buffered-edit state

pub mod placement;
pub mod selection;
pub mod tree;

pub use placement::{resolve_gesture, DragSource, DropTarget, Placement};
pub use selection::EditState;
pub use tree::{WidgetNode, WidgetTree};
