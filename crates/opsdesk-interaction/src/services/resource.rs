//! Backend collections and their record types.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use strum::{AsRefStr, Display, EnumIter, EnumString};

/// REST collections exposed by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, AsRefStr, Display, EnumIter, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Collection {
    Books,
    Employees,
    Events,
    Materials,
    Quotations,
}

impl Collection {
    /// Collection path relative to the API base, e.g. `books`.
    pub fn path(&self) -> &'static str {
        match self {
            Self::Books => "books",
            Self::Employees => "employees",
            Self::Events => "events",
            Self::Materials => "materials",
            Self::Quotations => "quotations",
        }
    }

    /// Path of a single record.
    pub fn item_path(&self, id: &str) -> String {
        format!("{}/{}", self.path(), id)
    }
}

/// A record type that lives in one [`Collection`].
pub trait Resource: Serialize + DeserializeOwned + Send + Sync + 'static {
    const COLLECTION: Collection;
}

macro_rules! impl_resource {
    ($ty:ty, $collection:expr) => {
        impl Resource for $ty {
            const COLLECTION: Collection = $collection;
        }
    };
}

// Records keep every field they do not model in `extra`, so an update
// round trip never drops server data.

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub isbn: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Material {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<i64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quotation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<f64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl_resource!(Book, Collection::Books);
impl_resource!(Employee, Collection::Employees);
impl_resource!(Event, Collection::Events);
impl_resource!(Material, Collection::Materials);
impl_resource!(Quotation, Collection::Quotations);

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::str::FromStr;
    use strum::IntoEnumIterator;

    #[test]
    fn test_collection_parse_and_path() {
        assert_eq!(Collection::from_str("Books").unwrap(), Collection::Books);
        assert_eq!(Collection::Quotations.item_path("9"), "quotations/9");
        for collection in Collection::iter() {
            assert_eq!(collection.to_string(), collection.path());
        }
    }

    #[test]
    fn test_unknown_fields_survive_roundtrip() {
        let raw = json!({"id": 42, "title": "Dune", "shelf": "B3"});
        let book: Book = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(book.title, "Dune");
        assert_eq!(book.extra.get("shelf"), Some(&json!("B3")));
        assert_eq!(serde_json::to_value(&book).unwrap(), raw);
    }

    #[test]
    fn test_event_dates_are_camel_case() {
        let event: Event =
            serde_json::from_value(json!({"title": "Fair", "startDate": "2026-05-01"})).unwrap();
        assert_eq!(event.start_date.as_deref(), Some("2026-05-01"));
        assert!(event.id.is_none());
    }
}
