use crate::data_store::access::Role;
use crate::data_store::{EventId, UserId};
use chrono::{DateTime, Utc};
use diesel::prelude::*;

#[derive(Clone, Debug, Queryable, Identifiable, Selectable)]
#[diesel(table_name=super::schema::events)]
pub struct Event {
    pub id: EventId,
    pub name: String,
    pub location: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub all_day: bool,
    pub url: String,
    pub notes: String,
    pub flag_enabled: bool,
    pub creator_id: UserId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl From<Event> for evently_api_types::Event {
    fn from(value: Event) -> Self {
        Self {
            id: value.id,
            name: value.name,
            location: value.location,
            start: value.start,
            end: value.end,
            all_day: value.all_day,
            url: value.url,
            notes: value.notes,
            flag_enabled: value.flag_enabled,
            creator_id: value.creator_id,
            created_at: value.created_at,
            updated_at: value.updated_at,
        }
    }
}

#[derive(Insertable)]
#[diesel(table_name=super::schema::events)]
pub struct NewEvent {
    pub name: String,
    pub location: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub all_day: bool,
    pub url: String,
    pub notes: String,
    pub creator_id: UserId,
}

impl NewEvent {
    pub fn from_api(event: evently_api_types::NewEvent, creator_id: UserId) -> Self {
        Self {
            name: event.name,
            location: event.location,
            start: event.start,
            end: event.end,
            all_day: event.all_day,
            url: event.url,
            notes: event.notes,
            creator_id,
        }
    }
}

/// Partial update of the informational fields of an event. `None` fields are left unchanged by
/// the generated UPDATE statement.
#[derive(Clone, Debug, Default, AsChangeset)]
#[diesel(table_name=super::schema::events)]
pub struct EventInfoChangeset {
    pub name: Option<String>,
    pub location: Option<String>,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    pub all_day: Option<bool>,
    pub url: Option<String>,
    pub notes: Option<String>,
    pub flag_enabled: Option<bool>,
}

impl EventInfoChangeset {
    /// The fields this changeset would touch, for the per-field permission check.
    pub fn fields(&self) -> Vec<EventField> {
        let mut fields = Vec::new();
        if self.name.is_some() {
            fields.push(EventField::Name);
        }
        if self.location.is_some() {
            fields.push(EventField::Location);
        }
        if self.start.is_some() {
            fields.push(EventField::Start);
        }
        if self.end.is_some() {
            fields.push(EventField::End);
        }
        if self.all_day.is_some() {
            fields.push(EventField::AllDay);
        }
        if self.url.is_some() {
            fields.push(EventField::Url);
        }
        if self.notes.is_some() {
            fields.push(EventField::Notes);
        }
        if self.flag_enabled.is_some() {
            fields.push(EventField::FlagEnabled);
        }
        fields
    }

    pub fn is_empty(&self) -> bool {
        self.fields().is_empty()
    }
}

impl From<evently_api_types::EventInfoUpdate> for EventInfoChangeset {
    fn from(value: evently_api_types::EventInfoUpdate) -> Self {
        Self {
            name: value.name,
            location: value.location,
            start: value.start,
            end: value.end,
            all_day: value.all_day,
            url: value.url,
            notes: value.notes,
            flag_enabled: value.flag_enabled,
        }
    }
}

/// Identifies a single updatable column of an event record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventField {
    Name,
    Location,
    Start,
    End,
    AllDay,
    Url,
    Notes,
    FlagEnabled,
}

impl EventField {
    /// Parse a field name as used in API paths and activity descriptions.
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "name" => Some(Self::Name),
            "location" => Some(Self::Location),
            "start" => Some(Self::Start),
            "end" => Some(Self::End),
            "all_day" => Some(Self::AllDay),
            "url" => Some(Self::Url),
            "notes" => Some(Self::Notes),
            "flag_enabled" => Some(Self::FlagEnabled),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Location => "location",
            Self::Start => "start",
            Self::End => "end",
            Self::AllDay => "all_day",
            Self::Url => "url",
            Self::Notes => "notes",
            Self::FlagEnabled => "flag_enabled",
        }
    }
}

/// A typed value for a single-field update.
#[derive(Debug, Clone, PartialEq)]
pub enum EventFieldValue {
    Name(String),
    Location(String),
    Start(DateTime<Utc>),
    End(DateTime<Utc>),
    AllDay(bool),
    Url(String),
    Notes(String),
    FlagEnabled(bool),
}

impl EventFieldValue {
    pub fn field(&self) -> EventField {
        match self {
            Self::Name(_) => EventField::Name,
            Self::Location(_) => EventField::Location,
            Self::Start(_) => EventField::Start,
            Self::End(_) => EventField::End,
            Self::AllDay(_) => EventField::AllDay,
            Self::Url(_) => EventField::Url,
            Self::Notes(_) => EventField::Notes,
            Self::FlagEnabled(_) => EventField::FlagEnabled,
        }
    }

    pub fn into_changeset(self) -> EventInfoChangeset {
        let mut changeset = EventInfoChangeset::default();
        match self {
            Self::Name(v) => changeset.name = Some(v),
            Self::Location(v) => changeset.location = Some(v),
            Self::Start(v) => changeset.start = Some(v),
            Self::End(v) => changeset.end = Some(v),
            Self::AllDay(v) => changeset.all_day = Some(v),
            Self::Url(v) => changeset.url = Some(v),
            Self::Notes(v) => changeset.notes = Some(v),
            Self::FlagEnabled(v) => changeset.flag_enabled = Some(v),
        }
        changeset
    }
}

#[derive(Clone, Debug, Queryable, Identifiable, Selectable)]
#[diesel(table_name=super::schema::users)]
pub struct User {
    pub id: UserId,
    pub user_name: String,
    pub password_hash: String,
    pub role: Role,
    /// Disabled accounts cannot log in and their sessions stop being accepted.
    pub flag_enabled: bool,
    pub created_at: DateTime<Utc>,
}

impl From<User> for evently_api_types::UserInfo {
    fn from(value: User) -> Self {
        Self {
            id: value.id,
            user_name: value.user_name,
            role: value.role.into(),
        }
    }
}

#[derive(Insertable)]
#[diesel(table_name=super::schema::users)]
pub struct NewUser {
    pub user_name: String,
    pub password_hash: String,
    pub role: Role,
    pub flag_enabled: bool,
}

/// A row of the audit log, written in the same transaction as the change it records.
#[derive(Clone, Debug, Queryable, Identifiable, Selectable)]
#[diesel(table_name=super::schema::activities)]
pub struct Activity {
    pub id: i32,
    pub user_id: UserId,
    pub event_id: Option<EventId>,
    pub activity_type: String,
    pub occurred_at: DateTime<Utc>,
    pub description: String,
}

#[derive(Insertable)]
#[diesel(table_name=super::schema::activities)]
pub struct NewActivity {
    pub user_id: UserId,
    pub event_id: Option<EventId>,
    pub activity_type: String,
    pub description: String,
}
