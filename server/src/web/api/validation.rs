//! Request payload validation for the event endpoints.
//!
//! Validation failures collect one [FieldError] per offending field and surface as an
//! [APIError::Validation], so the client can highlight all problems at once.

use crate::data_store::models::{EventField, EventFieldValue};
use crate::web::api::APIError;
use chrono::{DateTime, Utc};
use serde::Serialize;

pub const MAX_NAME_LENGTH: usize = 50;
pub const MAX_LOCATION_LENGTH: usize = 50;
pub const MAX_URL_LENGTH: usize = 50;
pub const MAX_NOTES_LENGTH: usize = 255;

lazy_static::lazy_static! {
    static ref URL_REGEX: regex::Regex = regex::Regex::new(r"^https?://\S+$").unwrap();
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_owned(),
            message: message.into(),
        }
    }
}

pub fn validate_new_event(event: &evently_api_types::NewEvent) -> Result<(), APIError> {
    let mut errors = Vec::new();
    check_name(&event.name, &mut errors);
    check_location(&event.location, &mut errors);
    check_url(&event.url, &mut errors);
    check_notes(&event.notes, &mut errors);
    if errors.is_empty() {
        Ok(())
    } else {
        Err(APIError::Validation(errors))
    }
}

pub fn validate_info_update(update: &evently_api_types::EventInfoUpdate) -> Result<(), APIError> {
    let mut errors = Vec::new();
    if let Some(name) = &update.name {
        check_name(name, &mut errors);
    }
    if let Some(location) = &update.location {
        check_location(location, &mut errors);
    }
    if let Some(url) = &update.url {
        check_url(url, &mut errors);
    }
    if let Some(notes) = &update.notes {
        check_notes(notes, &mut errors);
    }
    if errors.is_empty() {
        Ok(())
    } else {
        Err(APIError::Validation(errors))
    }
}

/// Turn the untyped JSON body of a single-field update into a typed value, applying the same
/// constraints as the whole-record validators.
pub fn parse_field_value(
    field: EventField,
    value: &serde_json::Value,
) -> Result<EventFieldValue, APIError> {
    let mut errors = Vec::new();
    let result = match field {
        EventField::Name => as_string(field, value).map(|s| {
            check_name(&s, &mut errors);
            EventFieldValue::Name(s)
        }),
        EventField::Location => as_string(field, value).map(|s| {
            check_location(&s, &mut errors);
            EventFieldValue::Location(s)
        }),
        EventField::Start => as_datetime(field, value).map(EventFieldValue::Start),
        EventField::End => as_datetime(field, value).map(EventFieldValue::End),
        EventField::AllDay => as_bool(field, value).map(EventFieldValue::AllDay),
        EventField::Url => as_string(field, value).map(|s| {
            check_url(&s, &mut errors);
            EventFieldValue::Url(s)
        }),
        EventField::Notes => as_string(field, value).map(|s| {
            check_notes(&s, &mut errors);
            EventFieldValue::Notes(s)
        }),
        EventField::FlagEnabled => as_bool(field, value).map(EventFieldValue::FlagEnabled),
    };
    match result {
        Err(error) => Err(APIError::Validation(vec![error])),
        Ok(_) if !errors.is_empty() => Err(APIError::Validation(errors)),
        Ok(value) => Ok(value),
    }
}

fn as_string(field: EventField, value: &serde_json::Value) -> Result<String, FieldError> {
    value
        .as_str()
        .map(|s| s.to_owned())
        .ok_or_else(|| FieldError::new(field.name(), "Expected a string value."))
}

fn as_bool(field: EventField, value: &serde_json::Value) -> Result<bool, FieldError> {
    value
        .as_bool()
        .ok_or_else(|| FieldError::new(field.name(), "Expected a boolean value."))
}

fn as_datetime(
    field: EventField,
    value: &serde_json::Value,
) -> Result<DateTime<Utc>, FieldError> {
    serde_json::from_value(value.clone())
        .map_err(|_| FieldError::new(field.name(), "Expected an RFC 3339 timestamp."))
}

fn check_name(name: &str, errors: &mut Vec<FieldError>) {
    if name.trim().is_empty() {
        errors.push(FieldError::new("name", "Name must not be empty."));
    } else if name.len() > MAX_NAME_LENGTH {
        errors.push(FieldError::new(
            "name",
            format!("Name must not exceed {} characters.", MAX_NAME_LENGTH),
        ));
    }
}

fn check_location(location: &str, errors: &mut Vec<FieldError>) {
    if location.len() > MAX_LOCATION_LENGTH {
        errors.push(FieldError::new(
            "location",
            format!(
                "Location must not exceed {} characters.",
                MAX_LOCATION_LENGTH
            ),
        ));
    }
}

fn check_url(url: &str, errors: &mut Vec<FieldError>) {
    if url.len() > MAX_URL_LENGTH {
        errors.push(FieldError::new(
            "url",
            format!("URL must not exceed {} characters.", MAX_URL_LENGTH),
        ));
    } else if !url.is_empty() && !URL_REGEX.is_match(url) {
        errors.push(FieldError::new(
            "url",
            "URL must start with http:// or https://.",
        ));
    }
}

fn check_notes(notes: &str, errors: &mut Vec<FieldError>) {
    if notes.len() > MAX_NOTES_LENGTH {
        errors.push(FieldError::new(
            "notes",
            format!("Notes must not exceed {} characters.", MAX_NOTES_LENGTH),
        ));
    }
}
