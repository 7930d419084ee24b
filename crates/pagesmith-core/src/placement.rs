//! Drag-and-drop gesture resolution
//!
//! Translates one gesture (source + target descriptor) into at most one
//! tree mutation. Gestures that resolve to nothing, target themselves, or
//! would make a widget its own ancestor produce `None`; the caller mutates
//! no state and issues no persistence call for them.

use pagesmith_api::WidgetInstance;

use crate::tree::WidgetTree;

/// What is being dragged
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DragSource {
    /// An existing widget, by id
    Widget(String),
    /// A palette item, by widget type
    Palette(String),
}

/// Where it was dropped.
///
/// When a drop point is ambiguous between two adjacent zones, the UI
/// resolves it as `Before` the element under the pointer - stable and
/// independent of pointer jitter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropTarget {
    /// Insertion point between two widgets in the source's sibling group
    /// (the root group for palette items), addressed against the
    /// pre-removal list
    Zone(usize),
    /// Land immediately before this widget, in its sibling group
    Before(String),
    /// Nest inside this widget, at the end of its children
    Container(String),
    /// The page's root canvas, at the end of the root group
    Canvas,
}

/// The single mutation a resolved gesture maps to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Placement {
    /// Materialize a new widget of `widget_type` and insert it
    InsertNew {
        widget_type: String,
        parent_id: Option<String>,
        index: usize,
    },
    /// Relocate an existing widget; `index` is post-removal
    Move {
        id: String,
        parent_id: Option<String>,
        index: usize,
    },
}

/// Resolve a gesture against the current tree. `None` means no-op.
pub fn resolve_gesture(
    tree: &WidgetTree,
    source: &DragSource,
    target: Option<&DropTarget>,
) -> Option<Placement> {
    let target = target?;
    match source {
        DragSource::Palette(widget_type) => resolve_palette(tree, widget_type, target),
        DragSource::Widget(id) => {
            let widget = tree.get(id)?;
            resolve_move(tree, widget, target)
        }
    }
}

fn resolve_palette(tree: &WidgetTree, widget_type: &str, target: &DropTarget) -> Option<Placement> {
    let (parent_id, index) = match target {
        DropTarget::Zone(k) => (None, (*k).min(tree.group_len(None))),
        DropTarget::Before(tid) => {
            let anchor = tree.get(tid)?;
            (anchor.parent_id.clone(), anchor.order_index as usize)
        }
        DropTarget::Container(c) => {
            if !tree.contains(c) {
                return None;
            }
            (Some(c.clone()), tree.group_len(Some(c)))
        }
        DropTarget::Canvas => (None, tree.group_len(None)),
    };
    Some(Placement::InsertNew {
        widget_type: widget_type.to_string(),
        parent_id,
        index,
    })
}

fn resolve_move(tree: &WidgetTree, widget: &WidgetInstance, target: &DropTarget) -> Option<Placement> {
    let id = widget.id.as_str();
    let current_parent = widget.parent_id.as_deref();
    let current_index = widget.order_index as usize;

    match target {
        DropTarget::Zone(k) => {
            reorder_within(tree, id, current_parent, current_index, *k)
        }
        DropTarget::Before(tid) => {
            if tid == id {
                return None;
            }
            let anchor = tree.get(tid)?;
            let anchor_parent = anchor.parent_id.as_deref();
            let anchor_index = anchor.order_index as usize;

            if anchor_parent == current_parent {
                return reorder_within(tree, id, current_parent, current_index, anchor_index);
            }
            if would_cycle(tree, id, anchor_parent) {
                return None;
            }
            Some(Placement::Move {
                id: id.to_string(),
                parent_id: anchor_parent.map(str::to_string),
                index: anchor_index,
            })
        }
        DropTarget::Container(c) => {
            if c == id || !tree.contains(c) || tree.is_ancestor(id, c) {
                return None;
            }
            let group_len = tree.group_len(Some(c));
            if current_parent == Some(c.as_str()) {
                // Already inside: append means last post-removal slot
                if current_index == group_len - 1 {
                    return None;
                }
                return Some(Placement::Move {
                    id: id.to_string(),
                    parent_id: Some(c.clone()),
                    index: group_len - 1,
                });
            }
            Some(Placement::Move {
                id: id.to_string(),
                parent_id: Some(c.clone()),
                index: group_len,
            })
        }
        DropTarget::Canvas => {
            let root_len = tree.group_len(None);
            if current_parent.is_none() {
                if current_index == root_len - 1 {
                    return None;
                }
                return Some(Placement::Move {
                    id: id.to_string(),
                    parent_id: None,
                    index: root_len - 1,
                });
            }
            Some(Placement::Move {
                id: id.to_string(),
                parent_id: None,
                index: root_len,
            })
        }
    }
}

/// Reorder inside the source's own sibling group. `k` addresses the
/// pre-removal list; landing on the current position (or the slot right
/// after it, which is the same place once the source is lifted out) is a
/// no-op.
fn reorder_within(
    tree: &WidgetTree,
    id: &str,
    parent: Option<&str>,
    current_index: usize,
    k: usize,
) -> Option<Placement> {
    let k = k.min(tree.group_len(parent));
    if k == current_index || k == current_index + 1 {
        return None;
    }
    let index = if k > current_index { k - 1 } else { k };
    Some(Placement::Move {
        id: id.to_string(),
        parent_id: parent.map(str::to_string),
        index,
    })
}

fn would_cycle(tree: &WidgetTree, id: &str, new_parent: Option<&str>) -> bool {
    match new_parent {
        Some(p) => p == id || tree.is_ancestor(id, p),
        None => false,
    }
}
