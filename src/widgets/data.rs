//! Persisted widget records
//!
//! Field names follow the camelCase layout the app has always written, so
//! collections produced by older builds (and their backups) still parse.

use std::collections::HashSet;
use std::hash::{Hash, Hasher};

use serde::de::value::StrDeserializer;
use serde::{Deserialize, Deserializer, Serialize};

/// Kind of item placed in a frame or the drawer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WidgetType {
    Widget,
    Shortcut,
    Header,
    LauncherShortcut,
    LauncherItem,
}

impl Default for WidgetType {
    fn default() -> Self {
        WidgetType::Widget
    }
}

/// Grid span of a widget, in cells
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WidgetSize {
    #[serde(default)]
    widget_width_span: i32,
    #[serde(default)]
    widget_height_span: i32,
}

impl WidgetSize {
    pub fn new(width_span: i32, height_span: i32) -> Self {
        Self {
            widget_width_span: width_span,
            widget_height_span: height_span,
        }
    }

    /// Width span, never less than one cell
    pub fn safe_width_span(&self) -> i32 {
        self.widget_width_span.max(1)
    }

    /// Height span, never less than one cell
    pub fn safe_height_span(&self) -> i32 {
        self.widget_height_span.max(1)
    }

    /// Copy with new spans, clamped to at least one cell
    pub fn safe_copy(&self, width_span: Option<i32>, height_span: Option<i32>) -> Self {
        Self {
            widget_width_span: width_span.unwrap_or(self.safe_width_span()).max(1),
            widget_height_span: height_span.unwrap_or(self.safe_height_span()).max(1),
        }
    }
}

impl Default for WidgetSize {
    fn default() -> Self {
        Self::new(1, 1)
    }
}

/// Icon shipped as a resource inside another package
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IconResource {
    pub package_name: String,
    pub resource_name: String,
}

/// A widget, shortcut or header stored in a frame or the drawer
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WidgetRecord {
    pub id: i32,
    /// Unknown type names read as `None`
    #[serde(default, rename = "type", deserialize_with = "lenient_type")]
    pub kind: Option<WidgetType>,
    #[serde(default)]
    pub label: Option<String>,
    /// Base64-encoded PNG
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub icon_res: Option<IconResource>,
    /// Launch intent, kept opaque
    #[serde(default)]
    pub shortcut_intent: Option<serde_json::Value>,
    /// Flattened component name (`package/class`)
    #[serde(default)]
    pub widget_provider: Option<String>,
    #[serde(default)]
    pub size: Option<WidgetSize>,
    #[serde(default)]
    pub package_name: Option<String>,
}

impl WidgetRecord {
    /// Bare record of the given type with no metadata
    pub fn new(id: i32, kind: WidgetType) -> Self {
        Self {
            id,
            kind: Some(kind),
            label: None,
            icon: None,
            icon_res: None,
            shortcut_intent: None,
            widget_provider: None,
            size: None,
            package_name: None,
        }
    }

    pub fn widget(id: i32, provider: &str, label: &str, icon: Option<String>, size: Option<WidgetSize>) -> Self {
        let mut record = Self::new(id, WidgetType::Widget);
        record.package_name = unflatten_component(provider).map(|(pkg, _)| pkg);
        record.widget_provider = Some(provider.to_string());
        record.label = Some(label.to_string());
        record.icon = icon;
        record.size = size;
        record
    }

    /// Type, treating a missing value as a plain widget
    pub fn safe_type(&self) -> WidgetType {
        self.kind.unwrap_or_default()
    }

    /// Size, treating a missing value as 1x1
    pub fn safe_size(&self) -> WidgetSize {
        self.size.unwrap_or_default()
    }

    /// Provider as a normalized `(package, class)` pair
    pub fn provider_component(&self) -> Option<(String, String)> {
        self.widget_provider.as_deref().and_then(unflatten_component)
    }
}

impl PartialEq for WidgetRecord {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.safe_type() == other.safe_type()
            && (self.safe_type() != WidgetType::Widget
                || self.provider_component() == other.provider_component())
    }
}

impl Eq for WidgetRecord {}

impl Hash for WidgetRecord {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
        self.safe_type().hash(state);
        if self.safe_type() == WidgetType::Widget {
            self.provider_component().hash(state);
        }
    }
}

fn lenient_type<'de, D>(deserializer: D) -> Result<Option<WidgetType>, D::Error>
where
    D: Deserializer<'de>,
{
    let name = Option::<String>::deserialize(deserializer)?;
    Ok(name.and_then(|name| WidgetType::deserialize(StrDeserializer::<D::Error>::new(&name)).ok()))
}

/// Split a flattened component name, expanding the `pkg/.Class` shorthand
pub fn unflatten_component(flat: &str) -> Option<(String, String)> {
    let (pkg, cls) = flat.split_once('/')?;
    if pkg.is_empty() || cls.is_empty() {
        return None;
    }

    let cls = if cls.starts_with('.') {
        format!("{}{}", pkg, cls)
    } else {
        cls.to_string()
    };

    Some((pkg.to_string(), cls))
}

/// Parse a widget collection, dropping duplicates but keeping first-seen order
pub fn parse_widgets(text: &str) -> serde_json::Result<Vec<WidgetRecord>> {
    let records: Vec<WidgetRecord> = serde_json::from_str(text)?;
    Ok(dedup_widgets(records))
}

pub fn widgets_to_string(widgets: &[WidgetRecord]) -> serde_json::Result<String> {
    serde_json::to_string(widgets)
}

pub fn dedup_widgets(records: Vec<WidgetRecord>) -> Vec<WidgetRecord> {
    let mut seen = HashSet::new();
    records
        .into_iter()
        .filter(|record| seen.insert(record.clone()))
        .collect()
}
