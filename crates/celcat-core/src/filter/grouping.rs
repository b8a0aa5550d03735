//! Cross-event course name passes.
//!
//! Celcat often spells the same course several ways across a term
//! ("Algebra", "Algebra I", "Algebra - revision"). Grouping collapses names
//! that contain one another onto the shortest member of the cluster.

use std::collections::{BTreeMap, HashSet};

use tracing::debug;

use crate::event::EventRecord;

/// Returns the distinct non-empty course names, in order of first appearance.
pub fn course_names(events: &[EventRecord]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut names = Vec::new();

    for name in events.iter().filter_map(EventRecord::course_name) {
        if seen.insert(name) {
            names.push(name.to_string());
        }
    }

    names
}

/// Builds the replacement table mapping each clustered course name to its
/// canonical (shortest) form.
///
/// This is a single pass per candidate, not a fixed point. For every name
/// but the last, the candidate is compared against all names: a name
/// containing the running shortest joins the cluster; a name contained in
/// the running shortest pushes the shortest into the cluster and becomes the
/// new shortest for the rest of the scan. Later candidates overwrite earlier
/// mappings, so the result depends on the order of `names`.
pub fn similar_course_table(names: &[String]) -> BTreeMap<String, String> {
    let mut replacements = BTreeMap::new();

    for candidate in names.iter().take(names.len().saturating_sub(1)) {
        let mut shortest = candidate.as_str();
        let mut cluster: Vec<&str> = Vec::new();

        for other in names {
            if other.contains(shortest) {
                cluster.push(other);
            } else if shortest.contains(other.as_str()) {
                cluster.push(shortest);
                shortest = other;
            }
        }

        for name in cluster {
            replacements.insert(name.to_string(), shortest.to_string());
        }
    }

    replacements
}

/// Replaces `course` on every event whose current value is an exact key of
/// `replacements`.
pub fn replace_courses(events: &mut [EventRecord], replacements: &BTreeMap<String, String>) {
    if replacements.is_empty() {
        return;
    }

    for event in events.iter_mut() {
        let Some(course) = event.course.as_mut().filter(|c| !c.is_empty()) else {
            continue;
        };
        if let Some(replacement) = replacements.get(course.as_str()) {
            course.clone_from(replacement);
        }
    }
}

/// Collapses similar course names across the batch.
pub fn group_similar_courses(events: &mut [EventRecord]) {
    let names = course_names(events);
    let table = similar_course_table(&names);
    debug!(
        distinct = names.len(),
        remapped = table.iter().filter(|(from, to)| from != to).count(),
        "grouped similar courses"
    );
    replace_courses(events, &table);
}
