//! Wire types specific to the HTTP client

use pagesmith_api::{Config, WidgetInstance};
use serde::Serialize;

/// Body of a widget create. The client id travels with it; the server may
/// keep it or assign its own.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateWidgetDto<'a> {
    pub id: &'a str,
    pub page_id: &'a str,
    pub parent_id: Option<&'a str>,
    pub widget_type: &'a str,
    pub label: Option<&'a str>,
    pub config: &'a Config,
    pub order_index: i64,
    pub is_visible: bool,
    pub is_page_title: bool,
}

impl<'a> From<&'a WidgetInstance> for CreateWidgetDto<'a> {
    fn from(w: &'a WidgetInstance) -> Self {
        Self {
            id: &w.id,
            page_id: &w.page_id,
            parent_id: w.parent_id.as_deref(),
            widget_type: &w.widget_type,
            label: w.label.as_deref(),
            config: &w.config,
            order_index: w.order_index,
            is_visible: w.is_visible,
            is_page_title: w.is_page_title,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_dto_wire_format() {
        let mut widget = WidgetInstance::new("w1", "page-1", "Heading");
        widget.parent_id = Some("row-1".to_string());
        widget.order_index = 2;

        let dto = CreateWidgetDto::from(&widget);
        let json = serde_json::to_value(&dto).unwrap();
        assert_eq!(json["id"], "w1");
        assert_eq!(json["pageId"], "page-1");
        assert_eq!(json["parentId"], "row-1");
        assert_eq!(json["widgetType"], "Heading");
        assert_eq!(json["orderIndex"], 2);
        assert_eq!(json["isVisible"], true);
    }
}
