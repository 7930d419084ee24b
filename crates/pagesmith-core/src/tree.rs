//! In-memory widget tree for the active page
//!
//! `WidgetTree` owns the flat list of `WidgetInstance`s for one page and is
//! the only place that mutates it. Every mutation leaves each sibling group
//! (widgets sharing the same `parent_id`) with contiguous `order_index`
//! values `0..N-1`.

use std::collections::{HashMap, HashSet};

use pagesmith_api::{ApiError, WidgetInstance};
use serde_json::Value;

/// One node of the tree-shaped view over the flat widget list
#[derive(Debug, Clone, PartialEq)]
pub struct WidgetNode {
    pub widget: WidgetInstance,
    pub children: Vec<WidgetNode>,
}

/// Flat widget list for the active page with tree-shaped views and safe
/// mutation primitives
#[derive(Debug, Clone, Default)]
pub struct WidgetTree {
    page_id: Option<String>,
    widgets: Vec<WidgetInstance>,
}

impl WidgetTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the entire local set with a freshly fetched one.
    ///
    /// Dangling parent references are cleared (the widget becomes
    /// root-level) and every sibling group is renumbered, so the local copy
    /// satisfies the ordering invariant regardless of what the server sent.
    pub fn load(&mut self, page_id: impl Into<String>, widgets: Vec<WidgetInstance>) {
        self.page_id = Some(page_id.into());
        self.widgets = widgets;

        let known: HashSet<String> = self.widgets.iter().map(|w| w.id.clone()).collect();
        for w in &mut self.widgets {
            if let Some(pid) = &w.parent_id {
                if !known.contains(pid) {
                    w.parent_id = None;
                }
            }
        }
        self.renumber_all();
    }

    pub fn page_id(&self) -> Option<&str> {
        self.page_id.as_deref()
    }

    pub fn widgets(&self) -> &[WidgetInstance] {
        &self.widgets
    }

    pub fn len(&self) -> usize {
        self.widgets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.widgets.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&WidgetInstance> {
        self.widgets.iter().find(|w| w.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// Widgets of one sibling group, ascending by `order_index`
    pub fn siblings(&self, parent: Option<&str>) -> Vec<&WidgetInstance> {
        let mut group: Vec<&WidgetInstance> = self
            .widgets
            .iter()
            .filter(|w| w.parent_id.as_deref() == parent)
            .collect();
        group.sort_by_key(|w| w.order_index);
        group
    }

    pub fn group_len(&self, parent: Option<&str>) -> usize {
        self.widgets
            .iter()
            .filter(|w| w.parent_id.as_deref() == parent)
            .count()
    }

    /// True when `ancestor` appears on `id`'s parent chain
    pub fn is_ancestor(&self, ancestor: &str, id: &str) -> bool {
        let mut current = self.get(id).and_then(|w| w.parent_id.as_deref());
        // Hop bound guards against malformed chains
        let mut hops = self.widgets.len();
        while let Some(pid) = current {
            if pid == ancestor {
                return true;
            }
            if hops == 0 {
                return false;
            }
            hops -= 1;
            current = self.get(pid).and_then(|w| w.parent_id.as_deref());
        }
        false
    }

    /// Group the flat list by parent, producing root nodes with their
    /// children ordered by ascending `order_index`.
    ///
    /// Widgets whose `parent_id` does not resolve are silently treated as
    /// root-level.
    pub fn build_tree(&self) -> Vec<WidgetNode> {
        let known: HashSet<&str> = self.widgets.iter().map(|w| w.id.as_str()).collect();

        let mut children_of: HashMap<&str, Vec<&WidgetInstance>> = HashMap::new();
        let mut roots: Vec<&WidgetInstance> = Vec::new();
        for w in &self.widgets {
            match w.parent_id.as_deref().filter(|p| known.contains(p)) {
                Some(p) => children_of.entry(p).or_default().push(w),
                None => roots.push(w),
            }
        }
        roots.sort_by_key(|w| w.order_index);
        for group in children_of.values_mut() {
            group.sort_by_key(|w| w.order_index);
        }

        fn build(
            widget: &WidgetInstance,
            children_of: &HashMap<&str, Vec<&WidgetInstance>>,
        ) -> WidgetNode {
            let children = children_of
                .get(widget.id.as_str())
                .map(|group| group.iter().map(|c| build(c, children_of)).collect())
                .unwrap_or_default();
            WidgetNode {
                widget: widget.clone(),
                children,
            }
        }

        roots.iter().map(|w| build(w, &children_of)).collect()
    }

    /// Insert a widget into the sibling group `parent` at `at_index`
    /// (clamped to `[0, group_len]`), shifting subsequent siblings up by
    /// one. Other groups' numbering is untouched.
    pub fn insert(
        &mut self,
        mut widget: WidgetInstance,
        parent: Option<&str>,
        at_index: usize,
    ) -> &[WidgetInstance] {
        if let Some(pid) = &self.page_id {
            widget.page_id = pid.clone();
        }
        let at = at_index.min(self.group_len(parent));
        for w in &mut self.widgets {
            if w.parent_id.as_deref() == parent && w.order_index >= at as i64 {
                w.order_index += 1;
            }
        }
        widget.parent_id = parent.map(str::to_string);
        widget.order_index = at as i64;
        self.widgets.push(widget);
        &self.widgets
    }

    /// Delete a widget and renumber its former sibling group.
    ///
    /// Children of the removed widget become root-level, appended after the
    /// existing roots in their former relative order. They are not
    /// re-parented to the grandparent.
    pub fn remove(&mut self, id: &str) -> &[WidgetInstance] {
        let Some(pos) = self.widgets.iter().position(|w| w.id == id) else {
            return &self.widgets;
        };
        let removed = self.widgets.remove(pos);

        let root_base = self
            .widgets
            .iter()
            .filter(|w| w.parent_id.is_none())
            .map(|w| w.order_index)
            .max()
            .map(|max| max + 1)
            .unwrap_or(0);

        let mut orphans: Vec<usize> = (0..self.widgets.len())
            .filter(|&i| self.widgets[i].parent_id.as_deref() == Some(id))
            .collect();
        orphans.sort_by_key(|&i| self.widgets[i].order_index);
        for (n, &i) in orphans.iter().enumerate() {
            self.widgets[i].parent_id = None;
            self.widgets[i].order_index = root_base + n as i64;
        }

        self.renumber(None);
        if removed.parent_id.is_some() {
            self.renumber(removed.parent_id.as_deref());
        }
        &self.widgets
    }

    /// Relocate a widget into the sibling group `new_parent` at
    /// `new_index`, computed against the post-removal group.
    ///
    /// A move that would make the widget its own ancestor is ignored; the
    /// parent relation stays acyclic.
    pub fn move_widget(
        &mut self,
        id: &str,
        new_parent: Option<&str>,
        new_index: usize,
    ) -> &[WidgetInstance] {
        let Some(pos) = self.widgets.iter().position(|w| w.id == id) else {
            return &self.widgets;
        };
        if let Some(p) = new_parent {
            if p == id || self.is_ancestor(id, p) {
                return &self.widgets;
            }
        }

        let widget = self.widgets.remove(pos);
        let old_parent = widget.parent_id.clone();
        self.renumber(old_parent.as_deref());
        self.insert(widget, new_parent, new_index)
    }

    /// Shallow-merge one key into a widget's config; ordering is untouched
    pub fn update_config(
        &mut self,
        id: &str,
        key: impl Into<String>,
        value: impl Into<Value>,
    ) -> Result<&WidgetInstance, ApiError> {
        let widget = self
            .widgets
            .iter_mut()
            .find(|w| w.id == id)
            .ok_or_else(|| ApiError::WidgetNotFound { id: id.to_string() })?;
        widget.config.insert(key.into(), value.into());
        widget.updated_at = Some(chrono::Utc::now());
        Ok(widget)
    }

    /// Adopt a server-assigned id for a widget, rewriting children that
    /// reference the old one
    pub fn replace_id(&mut self, old: &str, new: &str) {
        for w in &mut self.widgets {
            if w.id == old {
                w.id = new.to_string();
            }
            if w.parent_id.as_deref() == Some(old) {
                w.parent_id = Some(new.to_string());
            }
        }
    }

    fn renumber(&mut self, parent: Option<&str>) {
        let mut group: Vec<usize> = (0..self.widgets.len())
            .filter(|&i| self.widgets[i].parent_id.as_deref() == parent)
            .collect();
        group.sort_by_key(|&i| self.widgets[i].order_index);
        for (n, &i) in group.iter().enumerate() {
            self.widgets[i].order_index = n as i64;
        }
    }

    fn renumber_all(&mut self) {
        let mut parents: Vec<Option<String>> = self
            .widgets
            .iter()
            .map(|w| w.parent_id.clone())
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        parents.sort();
        for parent in parents {
            self.renumber(parent.as_deref());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn widget(id: &str, parent: Option<&str>, order: i64) -> WidgetInstance {
        let mut w = WidgetInstance::new(id, "page-1", "Paragraph");
        w.parent_id = parent.map(str::to_string);
        w.order_index = order;
        w
    }

    fn loaded(widgets: Vec<WidgetInstance>) -> WidgetTree {
        let mut tree = WidgetTree::new();
        tree.load("page-1", widgets);
        tree
    }

    fn order_of(tree: &WidgetTree, parent: Option<&str>) -> Vec<(String, i64)> {
        tree.siblings(parent)
            .into_iter()
            .map(|w| (w.id.clone(), w.order_index))
            .collect()
    }

    fn assert_contiguous(tree: &WidgetTree) {
        let parents: HashSet<Option<String>> = tree
            .widgets()
            .iter()
            .map(|w| w.parent_id.clone())
            .collect();
        for parent in parents {
            let group = tree.siblings(parent.as_deref());
            for (n, w) in group.iter().enumerate() {
                assert_eq!(
                    w.order_index, n as i64,
                    "group {:?} is not contiguous: {:?}",
                    parent,
                    group.iter().map(|w| (&w.id, w.order_index)).collect::<Vec<_>>()
                );
            }
        }
    }

    #[test]
    fn test_load_sorts_and_renumbers() {
        // Server sends a group with gaps and out of order
        let tree = loaded(vec![
            widget("b", None, 7),
            widget("a", None, 2),
            widget("c", None, 9),
        ]);
        assert_eq!(
            order_of(&tree, None),
            vec![
                ("a".to_string(), 0),
                ("b".to_string(), 1),
                ("c".to_string(), 2)
            ]
        );
    }

    #[test]
    fn test_load_roots_dangling_parents() {
        let tree = loaded(vec![widget("a", None, 0), widget("b", Some("ghost"), 0)]);
        assert!(tree.get("b").unwrap().parent_id.is_none());
        assert_contiguous(&tree);
    }

    #[test]
    fn test_insert_shifts_only_its_group() {
        let mut tree = loaded(vec![
            widget("a", None, 0),
            widget("b", None, 1),
            widget("c", Some("a"), 0),
        ]);
        tree.insert(widget("x", None, 0), None, 1);

        assert_eq!(
            order_of(&tree, None),
            vec![
                ("a".to_string(), 0),
                ("x".to_string(), 1),
                ("b".to_string(), 2)
            ]
        );
        assert_eq!(order_of(&tree, Some("a")), vec![("c".to_string(), 0)]);
    }

    #[test]
    fn test_insert_clamps_index() {
        let mut tree = loaded(vec![widget("a", None, 0)]);
        tree.insert(widget("x", None, 0), None, 99);
        assert_eq!(
            order_of(&tree, None),
            vec![("a".to_string(), 0), ("x".to_string(), 1)]
        );
    }

    #[test]
    fn test_insert_then_remove_round_trip() {
        let mut tree = loaded(vec![
            widget("a", None, 0),
            widget("b", None, 1),
            widget("c", None, 2),
        ]);
        let before = order_of(&tree, None);

        tree.insert(widget("x", None, 0), None, 1);
        tree.remove("x");

        assert_eq!(order_of(&tree, None), before);
    }

    #[test]
    fn test_remove_renumbers_group() {
        let mut tree = loaded(vec![
            widget("a", None, 0),
            widget("b", None, 1),
            widget("c", None, 2),
        ]);
        tree.remove("b");
        assert_eq!(
            order_of(&tree, None),
            vec![("a".to_string(), 0), ("c".to_string(), 1)]
        );
    }

    #[test]
    fn test_remove_roots_children() {
        let mut tree = loaded(vec![
            widget("a", None, 0),
            widget("b", Some("a"), 0),
            widget("c", Some("a"), 1),
            widget("d", None, 1),
        ]);
        tree.remove("a");

        // Children surface at root level, after the surviving roots, in
        // their former relative order
        assert_eq!(
            order_of(&tree, None),
            vec![
                ("d".to_string(), 0),
                ("b".to_string(), 1),
                ("c".to_string(), 2)
            ]
        );
        assert_contiguous(&tree);
    }

    #[test]
    fn test_remove_unknown_id_is_noop() {
        let mut tree = loaded(vec![widget("a", None, 0)]);
        let before = tree.widgets().to_vec();
        tree.remove("nope");
        assert_eq!(tree.widgets(), &before[..]);
    }

    #[test]
    fn test_move_within_group() {
        let mut tree = loaded(vec![
            widget("a", None, 0),
            widget("b", None, 1),
            widget("c", None, 2),
        ]);
        // Post-removal index 0 puts c first
        tree.move_widget("c", None, 0);
        assert_eq!(
            order_of(&tree, None),
            vec![
                ("c".to_string(), 0),
                ("a".to_string(), 1),
                ("b".to_string(), 2)
            ]
        );
    }

    #[test]
    fn test_move_into_container() {
        let mut tree = loaded(vec![
            widget("box", None, 0),
            widget("a", None, 1),
            widget("b", Some("box"), 0),
        ]);
        tree.move_widget("a", Some("box"), 1);

        assert_eq!(
            order_of(&tree, Some("box")),
            vec![("b".to_string(), 0), ("a".to_string(), 1)]
        );
        assert_eq!(order_of(&tree, None), vec![("box".to_string(), 0)]);
    }

    #[test]
    fn test_move_rejects_cycle() {
        let mut tree = loaded(vec![
            widget("outer", None, 0),
            widget("inner", Some("outer"), 0),
        ]);
        let before = tree.widgets().to_vec();

        tree.move_widget("outer", Some("inner"), 0);
        assert_eq!(tree.widgets(), &before[..]);

        tree.move_widget("outer", Some("outer"), 0);
        assert_eq!(tree.widgets(), &before[..]);
    }

    #[test]
    fn test_build_tree_orders_children() {
        let tree = loaded(vec![
            widget("root2", None, 1),
            widget("root1", None, 0),
            widget("kid2", Some("root1"), 1),
            widget("kid1", Some("root1"), 0),
        ]);
        let forest = tree.build_tree();
        assert_eq!(forest.len(), 2);
        assert_eq!(forest[0].widget.id, "root1");
        assert_eq!(forest[0].children[0].widget.id, "kid1");
        assert_eq!(forest[0].children[1].widget.id, "kid2");
        assert_eq!(forest[1].widget.id, "root2");
    }

    #[test]
    fn test_build_tree_roots_orphans() {
        let mut tree = loaded(vec![widget("a", None, 0), widget("b", Some("a"), 0)]);
        tree.remove("a");

        let forest = tree.build_tree();
        assert_eq!(forest.len(), 1);
        assert_eq!(forest[0].widget.id, "b");
        assert!(forest[0].children.is_empty());
    }

    #[test]
    fn test_update_config_merges_one_key() {
        let mut tree = loaded(vec![widget("a", None, 0)]);
        tree.update_config("a", "text", "Hello").unwrap();
        tree.update_config("a", "size", "h2").unwrap();

        let w = tree.get("a").unwrap();
        assert_eq!(w.config_value("text").and_then(|v| v.as_str()), Some("Hello"));
        assert_eq!(w.config_value("size").and_then(|v| v.as_str()), Some("h2"));
        assert!(matches!(
            tree.update_config("nope", "k", "v"),
            Err(ApiError::WidgetNotFound { .. })
        ));
    }

    #[test]
    fn test_replace_id_rewrites_children() {
        let mut tree = loaded(vec![widget("tmp", None, 0), widget("kid", Some("tmp"), 0)]);
        tree.replace_id("tmp", "srv-1");
        assert!(tree.contains("srv-1"));
        assert_eq!(tree.get("kid").unwrap().parent_id.as_deref(), Some("srv-1"));
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        #[derive(Debug, Clone)]
        enum Op {
            Insert { parent_pick: usize, index: usize },
            Remove { pick: usize },
            Move { pick: usize, parent_pick: usize, index: usize },
        }

        fn op_strategy() -> impl Strategy<Value = Op> {
            prop_oneof![
                (0..8usize, 0..8usize).prop_map(|(parent_pick, index)| Op::Insert {
                    parent_pick,
                    index
                }),
                (0..8usize).prop_map(|pick| Op::Remove { pick }),
                (0..8usize, 0..8usize, 0..8usize).prop_map(|(pick, parent_pick, index)| {
                    Op::Move {
                        pick,
                        parent_pick,
                        index,
                    }
                }),
            ]
        }

        /// Resolve a pick into an existing widget id, or None for the root
        fn pick_parent(tree: &WidgetTree, pick: usize) -> Option<String> {
            if tree.is_empty() || pick % 3 == 0 {
                return None;
            }
            tree.widgets()
                .get(pick % tree.len())
                .map(|w| w.id.clone())
        }

        fn pick_id(tree: &WidgetTree, pick: usize) -> Option<String> {
            if tree.is_empty() {
                return None;
            }
            tree.widgets().get(pick % tree.len()).map(|w| w.id.clone())
        }

        fn assert_acyclic(tree: &WidgetTree) {
            for w in tree.widgets() {
                let mut seen = HashSet::new();
                seen.insert(w.id.as_str());
                let mut current = w.parent_id.as_deref();
                while let Some(pid) = current {
                    assert!(seen.insert(pid), "cycle through {}", pid);
                    current = tree.get(pid).and_then(|p| p.parent_id.as_deref());
                }
            }
        }

        proptest! {
            #[test]
            fn order_stays_contiguous_and_acyclic(ops in proptest::collection::vec(op_strategy(), 1..40)) {
                let mut tree = loaded(vec![
                    widget("seed-a", None, 0),
                    widget("seed-b", None, 1),
                ]);
                let mut next = 0u32;

                for op in ops {
                    match op {
                        Op::Insert { parent_pick, index } => {
                            let parent = pick_parent(&tree, parent_pick);
                            let id = format!("w{}", next);
                            next += 1;
                            tree.insert(widget(&id, None, 0), parent.as_deref(), index);
                        }
                        Op::Remove { pick } => {
                            if let Some(id) = pick_id(&tree, pick) {
                                tree.remove(&id);
                            }
                        }
                        Op::Move { pick, parent_pick, index } => {
                            if let Some(id) = pick_id(&tree, pick) {
                                let parent = pick_parent(&tree, parent_pick);
                                tree.move_widget(&id, parent.as_deref(), index);
                            }
                        }
                    }
                    assert_contiguous(&tree);
                    assert_acyclic(&tree);
                }
            }
        }
    }
}
