use crate::cli::CliAuthTokenKey;
use crate::data_store::models::EventField;
use crate::data_store::{StoreError, UserId};
use diesel::deserialize::FromSql;
use diesel::query_builder::bind_collector::RawBytesBindCollector;
use diesel::serialize::ToSql;
use diesel::{AsExpression, FromSqlRow};
use std::fmt::{Display, Formatter};

pub struct EnumMemberNotExistingError {
    pub member_value: i32,
    pub enum_name: &'static str,
}

impl Display for EnumMemberNotExistingError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} is not a valid value for {} enum",
            self.member_value, self.enum_name
        )
    }
}

/// Authorization token for authorizing access to the data_store on behalf of a user.
///
/// The AuthToken identifies the acting user and carries their [Role]. This structure is our main
/// protection against accidental unauthorized-access bugs: all data_store access functions require
/// an AuthToken and check it against the required [Permission]. An AuthToken can only be created
/// by [crate::data_store::EventStoreFacade::get_auth_token_for_session], based on the verified
/// session of a client, and by cli functions via [AuthToken::create_for_cli].
///
/// For actions not tied to an acting user, a [GlobalAuthToken] is required instead.
pub struct AuthToken {
    user_id: UserId,
    role: Role,
}

impl AuthToken {
    /// Create a new AuthToken for a client session.
    ///
    /// This function must only be used by implementations of
    /// [crate::data_store::EventStoreFacade::get_auth_token_for_session] after verifying the
    /// client's session token and loading the user's role from the database!
    pub(super) fn create_for_session(user_id: UserId, role: Role) -> Self {
        AuthToken { user_id, role }
    }

    /// Create a new AuthToken for a command line interface functionality.
    ///
    /// The AuthToken is created with [Role::Admin] and a synthetic user id.
    ///
    /// This function must only be used by command line interface functions, not in the context of
    /// the web server!
    pub fn create_for_cli(_key: &CliAuthTokenKey) -> Self {
        AuthToken {
            user_id: 0,
            role: Role::Admin,
        }
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn role(&self) -> Role {
        self.role
    }

    /// Check if the AuthToken authorizes for the given `permission`.
    ///
    /// The actual authorization check is delegated to [Permission::qualifying_roles].
    pub fn has_permission(&self, permission: Permission) -> bool {
        permission.qualifying_roles().contains(&self.role)
    }

    /// Check if the AuthToken authorizes for the given `permission`. If not, return an appropriate
    /// PermissionDenied error.
    pub fn check_permission(&self, permission: Permission) -> Result<(), StoreError> {
        if self.has_permission(permission) {
            Ok(())
        } else {
            Err(StoreError::PermissionDenied {
                required_privilege: permission,
            })
        }
    }

    /// Check if the AuthToken authorizes for the given `permission` on a specific event record.
    ///
    /// Modifying permissions are owner-bound: besides the role check, the acting user must be the
    /// creator of the event. Admins bypass the ownership requirement.
    pub fn check_event_permission(
        &self,
        permission: Permission,
        event_creator: UserId,
    ) -> Result<(), StoreError> {
        self.check_permission(permission)?;
        if self.role == Role::Admin || self.user_id == event_creator {
            Ok(())
        } else {
            Err(StoreError::PermissionDenied {
                required_privilege: permission,
            })
        }
    }

    /// Check that all given fields are within the set of fields a client may modify.
    pub fn check_event_fields(
        &self,
        permission: Permission,
        fields: &[EventField],
    ) -> Result<(), StoreError> {
        if fields.iter().all(|f| UPDATABLE_FIELDS.contains(f)) {
            Ok(())
        } else {
            Err(StoreError::PermissionDenied {
                required_privilege: permission,
            })
        }
    }
}

/// The event fields a client with [Permission::UpdateEventField] may modify.
///
/// Currently this lists every [EventField], so [AuthToken::check_event_fields] always passes.
/// The check stays in place so that future server-managed fields can be excluded here without
/// touching the update code paths.
pub const UPDATABLE_FIELDS: [EventField; 8] = [
    EventField::Name,
    EventField::Location,
    EventField::Start,
    EventField::End,
    EventField::AllDay,
    EventField::Url,
    EventField::Notes,
    EventField::FlagEnabled,
];

/// Authorization token for authorizing access to the data_store for actions not performed on
/// behalf of a web user.
///
/// Together with [AuthToken], this structure is our main protection against accidental
/// unauthorized-access bugs. A GlobalAuthToken can only be created by cli functions.
pub struct GlobalAuthToken {
    role: Role,
}

impl GlobalAuthToken {
    pub(crate) fn create_for_cli(_key: &CliAuthTokenKey) -> Self {
        GlobalAuthToken { role: Role::Admin }
    }

    pub fn has_permission(&self, permission: Permission) -> bool {
        permission.qualifying_roles().contains(&self.role)
    }

    pub fn check_permission(&self, permission: Permission) -> Result<(), StoreError> {
        if self.has_permission(permission) {
            Ok(())
        } else {
            Err(StoreError::PermissionDenied {
                required_privilege: permission,
            })
        }
    }
}

/// Possible roles a user account can hold.
///
/// Each role qualifies for a set of [Permission]s. See [Permission::qualifying_roles].
#[derive(Debug, Eq, PartialEq, Ord, PartialOrd, Clone, Copy, FromSqlRow, AsExpression)]
#[diesel(sql_type = diesel::sql_types::Integer)]
#[repr(i32)]
pub enum Role {
    User = 1,
    Contributor = 2,
    Admin = 3,
}

impl TryFrom<i32> for Role {
    type Error = EnumMemberNotExistingError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Role::User),
            2 => Ok(Role::Contributor),
            3 => Ok(Role::Admin),
            value => Err(EnumMemberNotExistingError {
                member_value: value,
                enum_name: "Role",
            }),
        }
    }
}

impl From<Role> for i32 {
    fn from(value: Role) -> Self {
        value as i32
    }
}

impl From<Role> for evently_api_types::UserRole {
    fn from(value: Role) -> Self {
        match value {
            Role::User => evently_api_types::UserRole::User,
            Role::Contributor => evently_api_types::UserRole::Contributor,
            Role::Admin => evently_api_types::UserRole::Admin,
        }
    }
}

impl From<evently_api_types::UserRole> for Role {
    fn from(value: evently_api_types::UserRole) -> Self {
        match value {
            evently_api_types::UserRole::User => Role::User,
            evently_api_types::UserRole::Contributor => Role::Contributor,
            evently_api_types::UserRole::Admin => Role::Admin,
        }
    }
}

impl Role {
    pub fn name(&self) -> &str {
        match self {
            Role::User => "User",
            Role::Contributor => "Contributor",
            Role::Admin => "Admin",
        }
    }
}

impl<DB> ToSql<diesel::sql_types::Integer, DB> for Role
where
    DB: diesel::backend::Backend,
    for<'c> DB: diesel::backend::Backend<BindCollector<'c> = RawBytesBindCollector<DB>>,
    i32: ToSql<diesel::sql_types::Integer, DB>,
{
    fn to_sql<'b>(
        &'b self,
        out: &mut diesel::serialize::Output<'b, '_, DB>,
    ) -> diesel::serialize::Result {
        let value: i32 = (*self).into();
        value.to_sql(&mut out.reborrow())
    }
}

impl<DB> FromSql<diesel::sql_types::Integer, DB> for Role
where
    DB: diesel::backend::Backend,
    i32: FromSql<diesel::sql_types::Integer, DB>,
{
    fn from_sql(bytes: DB::RawValue<'_>) -> diesel::deserialize::Result<Self> {
        let x = i32::from_sql(bytes)?;
        x.try_into()
            .map_err(|e: EnumMemberNotExistingError| e.to_string().into())
    }
}

/// Enum of available authorization permissions.
///
/// Each data_store action and web endpoint typically requires a single permission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    /// Read access to the event listing
    UriEvents,
    /// Read access to a single event record
    UriEvent,
    /// Creating new event records
    CreateEvent,
    /// Modifying fields of an own event record
    UpdateEventField,
    /// Soft-deleting an own event record
    DeleteEvent,
    /// Permanently removing an event record and its audit trail
    PurgeEvent,
    /// Creating and listing user accounts
    ManageUsers,
}

impl Permission {
    /// Get the list of user [Role]s that qualify for this permission. Each returned role is
    /// individually sufficient for the permission.
    ///
    /// This function is our source of truth for authorization!
    /// Note that [Permission::UpdateEventField] and [Permission::DeleteEvent] are additionally
    /// owner-bound, see [AuthToken::check_event_permission].
    pub fn qualifying_roles(&self) -> &'static [Role] {
        match self {
            Permission::UriEvents => &[Role::User, Role::Contributor, Role::Admin],
            Permission::UriEvent => &[Role::User, Role::Contributor, Role::Admin],
            Permission::CreateEvent => &[Role::Contributor, Role::Admin],
            Permission::UpdateEventField => &[Role::Contributor, Role::Admin],
            Permission::DeleteEvent => &[Role::Contributor, Role::Admin],
            Permission::PurgeEvent => &[Role::Admin],
            Permission::ManageUsers => &[Role::Admin],
        }
    }
}
