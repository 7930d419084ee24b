use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A page in the builder application.
///
/// The editing core treats pages as opaque selectors that scope which
/// widgets are loaded; only identity, display, and sibling-ordering fields
/// are carried here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    pub id: String,
    pub name: String,
    pub title: String,
    /// Order among sibling pages
    pub order_index: i64,
    #[serde(default)]
    pub parent_id: Option<String>,
    #[serde(default)]
    pub is_home_page: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}
