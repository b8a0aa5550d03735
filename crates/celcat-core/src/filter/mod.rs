//! Event filter pipeline.
//!
//! Normalizes a batch of [`EventRecord`]s in place. Per-event transforms run
//! first, in a fixed order (course, professors, rooms, sites), then the
//! cross-event passes: similar course grouping and finally the configured
//! course replacements.
//!
//! # Example
//!
//! ```
//! use celcat_core::{EventRecord, FilterConfig, filter_events};
//!
//! let mut events = vec![
//!     EventRecord::new()
//!         .with_course("ALGEBRA [MATH101] CM")
//!         .with_course_module("MATH101")
//!         .with_category("CM"),
//! ];
//!
//! filter_events(&mut events, &FilterConfig::default());
//! assert_eq!(events[0].course.as_deref(), Some("Algebra"));
//! ```

mod config;
mod grouping;

pub use config::FilterConfig;
pub use grouping::{course_names, group_similar_courses, replace_courses, similar_course_table};

use tracing::{info, trace};

use crate::event::EventRecord;
use crate::text::{
    remove_all_ignore_case, remove_first_ignore_case, strip_after_number, strip_punctuation,
    title_case,
};

/// Applies a [`FilterConfig`] to event batches.
///
/// The filter holds no state besides its configuration, so one instance can
/// be reused across batches.
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    config: FilterConfig,
}

impl EventFilter {
    /// Creates a filter with the given configuration.
    pub fn new(config: FilterConfig) -> Self {
        Self { config }
    }

    /// Returns the configuration.
    pub fn config(&self) -> &FilterConfig {
        &self.config
    }

    /// Applies every configured transform to `events`.
    ///
    /// Mutates the provided slice; does not return a new collection.
    pub fn filter_events(&self, events: &mut [EventRecord]) {
        info!(count = events.len(), "filtering events");

        for event in events.iter_mut() {
            if event.course_name().is_some() {
                self.filter_course(event);
            }
            if let Some(professors) = non_empty_list(&mut event.professors) {
                self.filter_professors(professors);
            }
            if let Some(rooms) = non_empty_list(&mut event.rooms) {
                self.filter_rooms(rooms);
            }
            if let Some(sites) = non_empty_list(&mut event.sites) {
                self.filter_sites(sites);
            }
        }

        if self.config.course_group_similar {
            group_similar_courses(events);
        }

        if !self.config.course_replacements.is_empty() {
            replace_courses(events, &self.config.course_replacements);
        }
    }

    fn filter_course(&self, event: &mut EventRecord) {
        let module = event.module().map(|m| format!(" [{m}]"));
        let category = event.category_label().map(|c| format!(" {c}"));
        let Some(course) = event.course.as_mut() else {
            return;
        };

        if self.config.course_strip_modules {
            if let Some(stripped) = module.and_then(|m| remove_first_ignore_case(course, &m)) {
                *course = stripped;
            }
        }

        if self.config.course_strip_category {
            if let Some(stripped) = category.and_then(|c| remove_first_ignore_case(course, &c)) {
                *course = stripped;
            }
        }

        if self.config.course_strip_punctuation {
            *course = strip_punctuation(course);
        }

        self.strip_remembered(course);

        if self.config.course_title {
            *course = title_case(course);
        }

        trace!(course = %course, "filtered course");
    }

    /// Removes every remembered strip until none occurs, since a removal can
    /// join text into a fresh occurrence of the same or another strip.
    fn strip_remembered(&self, course: &mut String) {
        let mut changed = true;
        while changed {
            changed = false;
            for strip in &self.config.remembered_strips {
                while let Some(stripped) = remove_all_ignore_case(course, strip) {
                    *course = stripped;
                    changed = true;
                }
            }
        }
    }

    fn filter_professors(&self, professors: &mut [String]) {
        if self.config.professors_title {
            title_case_all(professors);
        }
    }

    fn filter_rooms(&self, rooms: &mut [String]) {
        if self.config.rooms_strip_after_number {
            for room in rooms.iter_mut() {
                if let Some(stripped) = strip_after_number(room) {
                    *room = stripped;
                }
            }
        }

        if self.config.rooms_title {
            title_case_all(rooms);
        }
    }

    fn filter_sites(&self, sites: &mut [String]) {
        if self.config.sites_title {
            title_case_all(sites);
        }
    }
}

/// Applies `config` to `events` in place.
pub fn filter_events(events: &mut [EventRecord], config: &FilterConfig) {
    EventFilter::new(config.clone()).filter_events(events);
}

fn non_empty_list(list: &mut Option<Vec<String>>) -> Option<&mut [String]> {
    list.as_deref_mut().filter(|l| !l.is_empty())
}

fn title_case_all(values: &mut [String]) {
    for value in values.iter_mut() {
        *value = title_case(value);
    }
}
