use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Open string-keyed configuration mapping for a widget instance.
///
/// The schema is determined externally by the widget-type definition; the
/// core never validates it.
pub type Config = serde_json::Map<String, Value>;

/// A single widget placed on a page.
///
/// Field names serialize in camelCase to match the backend wire format.
/// `parent_id` is a weak reference: a dangling value (pointing at a deleted
/// widget) is treated as root-level by consumers, never as an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WidgetInstance {
    /// Client-assigned UUID, immutable once the server has echoed it
    pub id: String,
    /// Owning page; never changes after creation
    pub page_id: String,
    /// Containment reference; `None` means root-level
    #[serde(default)]
    pub parent_id: Option<String>,
    /// Type tag selecting rendering and the default-config schema
    /// (e.g. "Heading", "Paragraph", "Container")
    pub widget_type: String,
    /// Optional display label for the editor UI
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub config: Config,
    /// Invisible widgets stay in the tree and keep their order
    pub is_visible: bool,
    pub is_page_title: bool,
    /// Zero-based, contiguous among siblings sharing the same parent
    pub order_index: i64,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl WidgetInstance {
    /// Create a new root-level widget with empty config, placed at the end
    /// of nothing in particular - the caller assigns `order_index`.
    pub fn new(
        id: impl Into<String>,
        page_id: impl Into<String>,
        widget_type: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            page_id: page_id.into(),
            parent_id: None,
            widget_type: widget_type.into(),
            label: None,
            config: Config::new(),
            is_visible: true,
            is_page_title: false,
            order_index: 0,
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    /// Get a config value by key
    pub fn config_value(&self, key: &str) -> Option<&Value> {
        self.config.get(key)
    }

    /// Shallow-merge a single key into the config mapping
    pub fn set_config_value(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.config.insert(key.into(), value.into());
    }

    /// True when this widget sits at root level (no resolvable parent is a
    /// consumer-side concern; this only checks the raw field)
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }
}

/// Metadata and default configuration for a widget type, served by the
/// backend's widget-definition catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WidgetDefinition {
    pub widget_type: String,
    /// Catalog grouping, e.g. "Core", "Form", "Chart"
    pub category: String,
    pub display_name: String,
    pub icon: String,
    /// JSON string; see [`WidgetDefinition::parsed_default_config`]
    pub default_config: String,
    #[serde(default)]
    pub icon_type: Option<String>,
}

impl WidgetDefinition {
    /// Parse `default_config` into a config mapping.
    ///
    /// An unparseable or non-object payload yields an empty config; widget
    /// creation proceeds rather than aborting.
    pub fn parsed_default_config(&self) -> Config {
        match serde_json::from_str::<Value>(&self.default_config) {
            Ok(Value::Object(map)) => map,
            _ => Config::new(),
        }
    }
}
