//! Core types: event records, filter configuration, normalization

pub mod event;
pub mod filter;
pub mod text;
pub mod tracing;

pub use event::EventRecord;
pub use filter::{EventFilter, FilterConfig, filter_events, group_similar_courses, replace_courses};
pub use text::{strip_after_number, strip_punctuation, title_case};
pub use crate::tracing::{LogFormat, TracingConfig, TracingError, init_tracing};
