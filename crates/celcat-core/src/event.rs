//! Event record type.
//!
//! An [`EventRecord`] is the shape a raw Celcat event takes once decoded from
//! its JSON payload. Only the fields the filter pipeline touches are typed;
//! everything else the server sent is kept verbatim in [`EventRecord::extra`]
//! so the record can be serialized back without losing data.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A single calendar event as scraped from Celcat.
///
/// Every known field is independently optional. A field that is absent, or
/// present but empty, is skipped by the filters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    /// Course name, historically with the module code and category embedded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub course: Option<String>,
    /// Module code, as it appears between brackets in `course`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub course_module: Option<String>,
    /// Category label (e.g. "CM", "TD"), as it appears in `course`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Professor names, in server order.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub professors: Option<Vec<String>>,
    /// Room names, in server order.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rooms: Option<Vec<String>>,
    /// Site names, in server order.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sites: Option<Vec<String>>,
    /// Any other fields present in the raw payload.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl EventRecord {
    /// Creates an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Decodes a record from a raw JSON object.
    ///
    /// Fails if a known field has the wrong type (e.g. `rooms` is a string).
    pub fn from_json(value: Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value)
    }

    /// Encodes the record back into a JSON object.
    pub fn to_json(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(self)
    }

    /// Builder method to set the course name.
    pub fn with_course(mut self, course: impl Into<String>) -> Self {
        self.course = Some(course.into());
        self
    }

    /// Builder method to set the module code.
    pub fn with_course_module(mut self, module: impl Into<String>) -> Self {
        self.course_module = Some(module.into());
        self
    }

    /// Builder method to set the category.
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Builder method to set the professors.
    pub fn with_professors<I, S>(mut self, professors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.professors = Some(professors.into_iter().map(Into::into).collect());
        self
    }

    /// Builder method to set the rooms.
    pub fn with_rooms<I, S>(mut self, rooms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.rooms = Some(rooms.into_iter().map(Into::into).collect());
        self
    }

    /// Builder method to set the sites.
    pub fn with_sites<I, S>(mut self, sites: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.sites = Some(sites.into_iter().map(Into::into).collect());
        self
    }

    /// Returns the course name if it is present and non-empty.
    pub fn course_name(&self) -> Option<&str> {
        non_empty(self.course.as_deref())
    }

    /// Returns the module code if it is present and non-empty.
    pub fn module(&self) -> Option<&str> {
        non_empty(self.course_module.as_deref())
    }

    /// Returns the category if it is present and non-empty.
    pub fn category_label(&self) -> Option<&str> {
        non_empty(self.category.as_deref())
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_known_and_extra_fields() {
        let record = EventRecord::from_json(json!({
            "id": "-123",
            "course": "Algebra [MATH101] CM",
            "course_module": "MATH101",
            "category": "CM",
            "rooms": ["A101bis"],
            "all_day": false
        }))
        .unwrap();

        assert_eq!(record.course.as_deref(), Some("Algebra [MATH101] CM"));
        assert_eq!(record.module(), Some("MATH101"));
        assert_eq!(record.rooms, Some(vec!["A101bis".to_string()]));
        assert!(record.professors.is_none());
        assert_eq!(record.extra.get("id"), Some(&json!("-123")));
        assert_eq!(record.extra.get("all_day"), Some(&json!(false)));
    }

    #[test]
    fn null_fields_are_absent() {
        let record = EventRecord::from_json(json!({ "course": null, "sites": null })).unwrap();
        assert!(record.course.is_none());
        assert!(record.sites.is_none());
    }

    #[test]
    fn wrong_field_type_is_rejected() {
        let result = EventRecord::from_json(json!({ "professors": "Dr. Who" }));
        assert!(result.is_err());
    }

    #[test]
    fn round_trips_extra_fields() {
        let raw = json!({ "course": "Physics", "start": "2024-09-02T08:00:00" });
        let record = EventRecord::from_json(raw.clone()).unwrap();
        assert_eq!(record.to_json().unwrap(), raw);
    }

    #[test]
    fn empty_strings_read_as_missing() {
        let record = EventRecord::new().with_course("").with_category("TD");
        assert!(record.course_name().is_none());
        assert_eq!(record.category_label(), Some("TD"));
    }

    #[test]
    fn builder_methods() {
        let record = EventRecord::new()
            .with_course("Algebra")
            .with_course_module("MATH101")
            .with_professors(["DOE JOHN"])
            .with_rooms(["A101", "B2"])
            .with_sites(["main campus"]);

        assert_eq!(record.course_name(), Some("Algebra"));
        assert_eq!(record.professors.as_ref().map(Vec::len), Some(1));
        assert_eq!(record.rooms.as_ref().map(Vec::len), Some(2));
        assert_eq!(record.sites, Some(vec!["main campus".to_string()]));
    }
}
