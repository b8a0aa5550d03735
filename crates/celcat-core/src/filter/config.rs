//! Filter configuration.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Toggles and tables driving the event filter pipeline.
///
/// Defaults mirror what most Celcat instances need: title-casing everywhere
/// and stripping the module code and category from course names. Grouping,
/// punctuation stripping and room truncation are opt-in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Convert course names to title case.
    pub course_title: bool,
    /// Remove `" [<module>]"` from course names.
    pub course_strip_modules: bool,
    /// Remove `" <category>"` from course names.
    pub course_strip_category: bool,
    /// Remove `. , : ; ! ?` from course names.
    pub course_strip_punctuation: bool,
    /// Collapse course names that contain one another onto the shortest one.
    pub course_group_similar: bool,
    /// Additional literal strings removed from every course name.
    pub remembered_strips: Vec<String>,
    /// Exact course name replacements, applied last.
    pub course_replacements: BTreeMap<String, String>,
    /// Convert professor names to title case.
    pub professors_title: bool,
    /// Cut room names after their number.
    pub rooms_strip_after_number: bool,
    /// Convert room names to title case.
    pub rooms_title: bool,
    /// Convert site names to title case.
    pub sites_title: bool,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            course_title: true,
            course_strip_modules: true,
            course_strip_category: true,
            course_strip_punctuation: false,
            course_group_similar: false,
            remembered_strips: Vec::new(),
            course_replacements: BTreeMap::new(),
            professors_title: true,
            rooms_strip_after_number: false,
            rooms_title: true,
            sites_title: true,
        }
    }
}

impl FilterConfig {
    /// A configuration with every transform switched off.
    pub fn disabled() -> Self {
        Self {
            course_title: false,
            course_strip_modules: false,
            course_strip_category: false,
            professors_title: false,
            rooms_title: false,
            sites_title: false,
            ..Self::default()
        }
    }

    /// Builder: set course title-casing.
    pub fn with_course_title(mut self, enabled: bool) -> Self {
        self.course_title = enabled;
        self
    }

    /// Builder: set module code stripping.
    pub fn with_course_strip_modules(mut self, enabled: bool) -> Self {
        self.course_strip_modules = enabled;
        self
    }

    /// Builder: set category stripping.
    pub fn with_course_strip_category(mut self, enabled: bool) -> Self {
        self.course_strip_category = enabled;
        self
    }

    /// Builder: set punctuation stripping.
    pub fn with_course_strip_punctuation(mut self, enabled: bool) -> Self {
        self.course_strip_punctuation = enabled;
        self
    }

    /// Builder: set similar course grouping.
    pub fn with_course_group_similar(mut self, enabled: bool) -> Self {
        self.course_group_similar = enabled;
        self
    }

    /// Builder: add a string to strip from every course name.
    pub fn with_remembered_strip(mut self, strip: impl Into<String>) -> Self {
        self.remembered_strips.push(strip.into());
        self
    }

    /// Builder: add a course replacement.
    pub fn with_course_replacement(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.course_replacements.insert(from.into(), to.into());
        self
    }

    /// Builder: set professor title-casing.
    pub fn with_professors_title(mut self, enabled: bool) -> Self {
        self.professors_title = enabled;
        self
    }

    /// Builder: set room truncation after the number.
    pub fn with_rooms_strip_after_number(mut self, enabled: bool) -> Self {
        self.rooms_strip_after_number = enabled;
        self
    }

    /// Builder: set room title-casing.
    pub fn with_rooms_title(mut self, enabled: bool) -> Self {
        self.rooms_title = enabled;
        self
    }

    /// Builder: set site title-casing.
    pub fn with_sites_title(mut self, enabled: bool) -> Self {
        self.sites_title = enabled;
        self
    }
}
