use crate::auth_session::hash_password;
use crate::cli::util::query_user;
use crate::cli::CliAuthTokenKey;
use crate::cli_error::CliError;
use crate::data_store::access::{GlobalAuthToken, Role};
use crate::data_store::get_store_from_env;
use crate::data_store::models::NewUser;
use crate::data_store::EventStore;
use std::str::FromStr;

pub fn print_user_list() -> Result<(), CliError> {
    let data_store_pool = get_store_from_env()?;
    let mut data_store = data_store_pool.get_facade()?;

    let auth_key = CliAuthTokenKey::new();
    let auth_token = GlobalAuthToken::create_for_cli(&auth_key);
    let users = data_store.list_users(&auth_token)?;

    let mut table = comfy_table::Table::new();
    table
        .load_preset(comfy_table::presets::ASCII_BORDERS_ONLY_CONDENSED)
        .set_header(vec!["id", "user name", "role", "enabled", "created at"])
        .add_rows(users.into_iter().map(|user| {
            [
                user.id.to_string(),
                user.user_name,
                user.role.name().to_string(),
                user.flag_enabled.to_string(),
                user.created_at.to_string(),
            ]
        }));

    println!("{table}");
    Ok(())
}

pub fn add_user() -> Result<(), CliError> {
    let data_store_pool = get_store_from_env()?;
    let mut data_store = data_store_pool.get_facade()?;

    let user_name: String = query_user("Enter user name");
    let role: RoleEntry = query_user("Enter role (user/contributor/admin)");
    let password: String = query_user("Enter password");

    let auth_key = CliAuthTokenKey::new();
    let auth_token = GlobalAuthToken::create_for_cli(&auth_key);
    let user = data_store.create_user(
        &auth_token,
        NewUser {
            user_name,
            password_hash: hash_password(&password),
            role: role.0,
            flag_enabled: true,
        },
    )?;
    println!("Success. New user id: {}", user.id);
    Ok(())
}

struct RoleEntry(Role);

impl FromStr for RoleEntry {
    type Err = &'static str;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "u" | "user" => Ok(Self(Role::User)),
            "c" | "contributor" => Ok(Self(Role::Contributor)),
            "a" | "admin" => Ok(Self(Role::Admin)),
            _ => Err("Unknown role. Must be 'user', 'contributor' or 'admin'."),
        }
    }
}
