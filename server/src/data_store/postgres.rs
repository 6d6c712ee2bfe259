use super::{
    list_query, models, schema, EventId, EventPage, EventStore, EventStoreFacade, StoreError,
    THROTTLE_MAX_REQUESTS, THROTTLE_WINDOW_SECONDS,
};
use crate::auth_session::SessionToken;
use crate::data_store::access::{AuthToken, GlobalAuthToken, Permission};
use crate::data_store::list_query::{SortDirection, SortField};
use diesel::dsl::exists;
use diesel::expression::AsExpression;
use diesel::pg::PgConnection;
use diesel::prelude::*;

#[derive(Clone)]
pub struct PgDataStore {
    pool: diesel::r2d2::Pool<diesel::r2d2::ConnectionManager<PgConnection>>,
}

impl PgDataStore {
    pub fn new(database_url: &str) -> Result<Self, StoreError> {
        let connection_manager = diesel::r2d2::ConnectionManager::<PgConnection>::new(database_url);
        Ok(Self {
            pool: diesel::r2d2::Pool::builder()
                .test_on_check_out(true)
                .min_idle(Some(2))
                .build(connection_manager)?,
        })
    }
}

impl EventStore for PgDataStore {
    fn get_facade<'a>(&'a self) -> Result<Box<dyn EventStoreFacade + 'a>, StoreError> {
        Ok(Box::new(PgDataStoreFacade::with_pooled_connection(
            self.pool.get()?,
        )))
    }
}

pub struct PgDataStoreFacade {
    connection: diesel::r2d2::PooledConnection<diesel::r2d2::ConnectionManager<PgConnection>>,
}

impl PgDataStoreFacade {
    pub fn with_pooled_connection(
        connection: diesel::r2d2::PooledConnection<diesel::r2d2::ConnectionManager<PgConnection>>,
    ) -> Self {
        Self { connection }
    }
}

impl EventStoreFacade for PgDataStoreFacade {
    fn list_events(
        &mut self,
        auth_token: &AuthToken,
        params: &list_query::EventListParams,
    ) -> Result<EventPage, StoreError> {
        use schema::events::dsl::*;
        auth_token.check_permission(Permission::UriEvents)?;

        self.connection.transaction(|connection| {
            let count = events
                .filter(deleted_at.is_null())
                .count()
                .get_result::<i64>(connection)?;

            let count_filtered = events
                .filter(deleted_at.is_null())
                .filter(filters_to_sql(&params.filters))
                .count()
                .get_result::<i64>(connection)?;

            let mut query = events
                .filter(deleted_at.is_null())
                .filter(filters_to_sql(&params.filters))
                .select(models::Event::as_select())
                .into_boxed();
            query = match (params.sort, params.direction) {
                (SortField::Id, SortDirection::Asc) => query.order(id.asc()),
                (SortField::Id, SortDirection::Desc) => query.order(id.desc()),
                (SortField::Name, SortDirection::Asc) => query.order((name.asc(), id.asc())),
                (SortField::Name, SortDirection::Desc) => query.order((name.desc(), id.asc())),
                (SortField::Notes, SortDirection::Asc) => query.order((notes.asc(), id.asc())),
                (SortField::Notes, SortDirection::Desc) => query.order((notes.desc(), id.asc())),
            };
            let rows = query
                .offset(params.offset())
                .limit(params.limit())
                .load::<models::Event>(connection)?;

            Ok(EventPage {
                count,
                count_filtered,
                rows,
            })
        })
    }

    fn get_event(
        &mut self,
        auth_token: &AuthToken,
        event_id: EventId,
    ) -> Result<models::Event, StoreError> {
        use schema::events::dsl::*;
        auth_token.check_permission(Permission::UriEvent)?;

        events
            .filter(id.eq(event_id))
            .filter(deleted_at.is_null())
            .select(models::Event::as_select())
            .first::<models::Event>(&mut self.connection)
            .map_err(|e| e.into())
    }

    fn event_name_exists(
        &mut self,
        auth_token: &AuthToken,
        event_name: &str,
    ) -> Result<bool, StoreError> {
        auth_token.check_permission(Permission::UriEvents)?;

        // Soft-deleted events keep their name reserved, so no deleted_at filter here.
        Ok(name_exists(event_name, &mut self.connection)?)
    }

    fn create_event(
        &mut self,
        auth_token: &AuthToken,
        event: models::NewEvent,
    ) -> Result<models::Event, StoreError> {
        use schema::events::dsl::*;
        auth_token.check_permission(Permission::CreateEvent)?;

        self.connection.transaction(|connection| {
            if name_exists(&event.name, connection)? {
                return Err(StoreError::NameAlreadyExists);
            }

            // The unique index on the name column stays authoritative: a concurrent insert
            // between the check above and this statement surfaces as NameAlreadyExists via the
            // UniqueViolation mapping.
            let created = diesel::insert_into(events)
                .values(&event)
                .returning(models::Event::as_returning())
                .get_result::<models::Event>(connection)?;

            write_activity(
                auth_token.user_id(),
                Some(created.id),
                "create_event",
                format!(
                    "User {} created event {} ({}).",
                    auth_token.user_id(),
                    created.id,
                    created.name
                ),
                connection,
            )?;

            Ok(created)
        })
    }

    fn update_event_info(
        &mut self,
        auth_token: &AuthToken,
        event_id: EventId,
        changes: models::EventInfoChangeset,
    ) -> Result<models::Event, StoreError> {
        self.connection.transaction(|connection| {
            apply_event_update(auth_token, event_id, changes, "update_event_info", connection)
        })
    }

    fn update_event_field(
        &mut self,
        auth_token: &AuthToken,
        event_id: EventId,
        value: models::EventFieldValue,
    ) -> Result<models::Event, StoreError> {
        let changes = value.into_changeset();
        self.connection.transaction(|connection| {
            apply_event_update(
                auth_token,
                event_id,
                changes,
                "update_event_field",
                connection,
            )
        })
    }

    fn delete_event(
        &mut self,
        auth_token: &AuthToken,
        event_id: EventId,
    ) -> Result<(), StoreError> {
        use schema::events::dsl::*;

        self.connection.transaction(|connection| {
            let event = events
                .filter(id.eq(event_id))
                .filter(deleted_at.is_null())
                .select(models::Event::as_select())
                .first::<models::Event>(connection)?;
            auth_token.check_event_permission(Permission::DeleteEvent, event.creator_id)?;

            diesel::update(events)
                .filter(id.eq(event_id))
                .set(deleted_at.eq(diesel::dsl::now))
                .execute(connection)?;

            write_activity(
                auth_token.user_id(),
                Some(event.id),
                "delete_event",
                format!(
                    "User {} deleted event {} ({}).",
                    auth_token.user_id(),
                    event.id,
                    event.name
                ),
                connection,
            )?;

            Ok(())
        })
    }

    fn purge_event(
        &mut self,
        auth_token: &GlobalAuthToken,
        the_event_id: EventId,
    ) -> Result<(), StoreError> {
        use schema::events::dsl::*;
        auth_token.check_permission(Permission::PurgeEvent)?;

        self.connection.transaction(|connection| {
            diesel::delete(
                schema::activities::table.filter(schema::activities::event_id.eq(the_event_id)),
            )
            .execute(connection)?;

            let count = diesel::delete(events.filter(id.eq(the_event_id))).execute(connection)?;
            if count == 0 {
                return Err(StoreError::NotExisting);
            }
            Ok(())
        })
    }

    fn create_user(
        &mut self,
        auth_token: &GlobalAuthToken,
        user: models::NewUser,
    ) -> Result<models::User, StoreError> {
        use schema::users::dsl::*;
        auth_token.check_permission(Permission::ManageUsers)?;

        Ok(diesel::insert_into(users)
            .values(&user)
            .returning(models::User::as_returning())
            .get_result::<models::User>(&mut self.connection)?)
    }

    fn list_users(
        &mut self,
        auth_token: &GlobalAuthToken,
    ) -> Result<Vec<models::User>, StoreError> {
        use schema::users::dsl::*;
        auth_token.check_permission(Permission::ManageUsers)?;

        Ok(users
            .select(models::User::as_select())
            .order_by(user_name)
            .load::<models::User>(&mut self.connection)?)
    }

    fn verify_credentials(
        &mut self,
        the_user_name: &str,
        password: &str,
    ) -> Result<models::User, StoreError> {
        use schema::users::dsl::*;

        let user = users
            .filter(user_name.eq(the_user_name))
            .select(models::User::as_select())
            .first::<models::User>(&mut self.connection)
            .map_err(|e| match e {
                diesel::result::Error::NotFound => StoreError::InvalidCredentials,
                e => e.into(),
            })?;
        if !user.flag_enabled {
            return Err(StoreError::InvalidCredentials);
        }
        if crate::auth_session::verify_password(password, &user.password_hash) {
            Ok(user)
        } else {
            Err(StoreError::InvalidCredentials)
        }
    }

    fn get_auth_token_for_session(
        &mut self,
        session_token: &SessionToken,
    ) -> Result<AuthToken, StoreError> {
        let user = self.get_session_user(session_token)?;
        Ok(AuthToken::create_for_session(user.id, user.role))
    }

    fn get_session_user(
        &mut self,
        session_token: &SessionToken,
    ) -> Result<models::User, StoreError> {
        use schema::users::dsl::*;

        let user = users
            .filter(id.eq(session_token.user_id()))
            .select(models::User::as_select())
            .first::<models::User>(&mut self.connection)
            .map_err(StoreError::from)?;
        // Sessions of accounts disabled in the meantime stop being accepted.
        if !user.flag_enabled {
            return Err(StoreError::InvalidCredentials);
        }
        Ok(user)
    }

    fn check_name_check_throttle(&mut self, client_address: &str) -> Result<(), StoreError> {
        use schema::throttles::dsl::*;

        let cutoff = chrono::Utc::now() - chrono::Duration::seconds(THROTTLE_WINDOW_SECONDS);
        self.connection.transaction(|connection| {
            let recent_requests = throttles
                .filter(action.eq(NAME_CHECK_THROTTLE_ACTION))
                .filter(ip_address.eq(client_address))
                .filter(requested_at.gt(cutoff))
                .count()
                .get_result::<i64>(connection)?;
            if recent_requests >= THROTTLE_MAX_REQUESTS {
                return Err(StoreError::Throttled);
            }

            diesel::insert_into(throttles)
                .values((
                    action.eq(NAME_CHECK_THROTTLE_ACTION),
                    ip_address.eq(client_address),
                ))
                .execute(connection)?;
            Ok(())
        })
    }
}

const NAME_CHECK_THROTTLE_ACTION: &str = "check_event_name";

fn name_exists(event_name: &str, connection: &mut PgConnection) -> Result<bool, diesel::result::Error> {
    use schema::events::dsl::*;

    diesel::select(exists(events.filter(name.eq(event_name)))).get_result::<bool>(connection)
}

fn write_activity(
    user_id: super::UserId,
    event_id: Option<EventId>,
    activity_type: &str,
    description: String,
    connection: &mut PgConnection,
) -> Result<(), diesel::result::Error> {
    diesel::insert_into(schema::activities::table)
        .values(&models::NewActivity {
            user_id,
            event_id,
            activity_type: activity_type.to_owned(),
            description,
        })
        .execute(connection)
        .map(|_| ())
}

/// Shared implementation of the two update operations: loads the record, performs the permission
/// checks, applies the changeset and writes the audit log entry, all on the given transaction
/// connection.
fn apply_event_update(
    auth_token: &AuthToken,
    event_id: EventId,
    changes: models::EventInfoChangeset,
    activity_type: &str,
    connection: &mut PgConnection,
) -> Result<models::Event, StoreError> {
    use schema::events::dsl::*;

    let event = events
        .filter(id.eq(event_id))
        .filter(deleted_at.is_null())
        .select(models::Event::as_select())
        .first::<models::Event>(connection)?;
    auth_token.check_event_permission(Permission::UpdateEventField, event.creator_id)?;
    auth_token.check_event_fields(Permission::UpdateEventField, &changes.fields())?;

    if changes.is_empty() {
        return Ok(event);
    }

    if let Some(new_name) = &changes.name {
        if *new_name != event.name && name_exists(new_name, connection)? {
            return Err(StoreError::NameAlreadyExists);
        }
    }

    let field_names = changes
        .fields()
        .iter()
        .map(|f| f.name())
        .collect::<Vec<_>>()
        .join(", ");

    let updated = diesel::update(events)
        .filter(id.eq(event_id))
        .set((&changes, updated_at.eq(diesel::dsl::now)))
        .returning(models::Event::as_returning())
        .get_result::<models::Event>(connection)?;

    write_activity(
        auth_token.user_id(),
        Some(event.id),
        activity_type,
        format!(
            "User {} updated fields [{}] of event {} ({}).",
            auth_token.user_id(),
            field_names,
            event.id,
            event.name
        ),
        connection,
    )?;

    Ok(updated)
}

type BoxedBoolExpression<'a, Table> =
    Box<dyn BoxableExpression<Table, diesel::pg::Pg, SqlType = diesel::sql_types::Bool> + 'a>;

/// Translate the listing filters into a SQL predicate over the events table.
///
/// The semantics match [list_query::EventFilters::matches]: case-insensitive substring search for
/// the text filters, and an OR-combination over name and notes for each term of the `info` filter.
fn filters_to_sql<'a>(
    filter: &list_query::EventFilters,
) -> BoxedBoolExpression<'a, schema::events::table> {
    use schema::events::dsl::*;

    let mut expression: BoxedBoolExpression<'a, schema::events::table> =
        Box::new(diesel::dsl::sql::<diesel::sql_types::Bool>("TRUE"));
    if let Some(filter_id) = filter.id {
        expression = Box::new(expression.as_expression().and(id.eq(filter_id)));
    }
    if let Some(filter_name) = &filter.name {
        expression = Box::new(
            expression
                .as_expression()
                .and(name.ilike(format!("%{}%", filter_name))),
        );
    }
    if let Some(filter_notes) = &filter.notes {
        expression = Box::new(
            expression
                .as_expression()
                .and(notes.ilike(format!("%{}%", filter_notes))),
        );
    }
    if filter.info.is_some() {
        let mut info_expression: BoxedBoolExpression<'a, schema::events::table> =
            Box::new(diesel::dsl::sql::<diesel::sql_types::Bool>("FALSE"));
        for term in filter.info_terms() {
            let pattern = format!("%{}%", term);
            info_expression = Box::new(
                info_expression
                    .as_expression()
                    .or(name.ilike(pattern.clone()).or(notes.ilike(pattern))),
            );
        }
        expression = Box::new(expression.as_expression().and(info_expression));
    }
    expression
}
