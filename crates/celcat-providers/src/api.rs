//! Celcat endpoint calls.
//!
//! Thin wrappers building the form bodies Celcat expects and shaping the
//! decoded payload. Field extraction from the returned objects is left to
//! the caller (see [`celcat_core::EventRecord`]).

use chrono::NaiveDate;
use reqwest::Method;
use serde_json::Value;
use tracing::{debug, info};

use crate::error::{ProviderError, ProviderResult};
use crate::executor::RequestExecutor;
use crate::transport::{HttpTransport, RequestOptions};

/// Path of the calendar listing endpoint.
pub const CALENDAR_DATA_PATH: &str = "/Home/GetCalendarData";

/// Path of the event details endpoint.
pub const SIDE_BAR_EVENT_PATH: &str = "/Home/GetSideBarEvent";

/// Date format required by the remote service.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Resource type code for student groups.
const RES_TYPE: &str = "104";

/// Builds the `GetCalendarData` form body.
pub fn calendar_form(federation_ids: &str, start: NaiveDate, end: NaiveDate) -> RequestOptions {
    RequestOptions::new()
        .with_form_field("start", start.format(DATE_FORMAT).to_string())
        .with_form_field("end", end.format(DATE_FORMAT).to_string())
        .with_form_field("resType", RES_TYPE)
        .with_form_field("calView", "month")
        .with_form_field("federationIds[]", federation_ids)
}

/// Fetches the raw events of `federation_ids` between `start` and `end`
/// (inclusive dates).
///
/// # Errors
///
/// `InvalidInput` if `start` is after `end`, `InvalidResponse` if the server
/// does not return a JSON array, and any executor error.
pub async fn get_calendar_raw_data<T: HttpTransport>(
    executor: &RequestExecutor<T>,
    base_url: &str,
    federation_ids: &str,
    start: NaiveDate,
    end: NaiveDate,
) -> ProviderResult<Vec<Value>> {
    info!(%start, %end, "getting calendar raw data");

    if start > end {
        return Err(ProviderError::invalid_input(
            "Start time cannot be more recent than end time",
        ));
    }

    let url = endpoint(base_url, CALENDAR_DATA_PATH);
    let payload = executor
        .execute(Method::POST, &url, calendar_form(federation_ids, start, end))
        .await?
        .into_json()?;

    match payload {
        Value::Array(events) => {
            debug!(count = events.len(), "received calendar data");
            Ok(events)
        }
        other => Err(ProviderError::invalid_response(format!(
            "Expected a list of events, got {}",
            json_kind(&other)
        ))),
    }
}

/// Fetches the details of one event.
///
/// # Errors
///
/// `InvalidResponse` if the server does not return a JSON object, and any
/// executor error.
pub async fn get_side_bar_event_raw_data<T: HttpTransport>(
    executor: &RequestExecutor<T>,
    base_url: &str,
    event_id: &str,
) -> ProviderResult<Value> {
    let url = endpoint(base_url, SIDE_BAR_EVENT_PATH);
    let options = RequestOptions::new().with_form_field("eventid", event_id);
    let payload = executor.execute(Method::POST, &url, options).await?.into_json()?;

    if payload.is_object() {
        Ok(payload)
    } else {
        Err(ProviderError::invalid_response(format!(
            "Couldn't convert GetSideBarEvent to an object, got {}",
            json_kind(&payload)
        )))
    }
}

fn endpoint(base_url: &str, path: &str) -> String {
    format!("{}{}", base_url.trim_end_matches('/'), path)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
