use crate::cli::util::query_user_bool;
use crate::cli::CliAuthTokenKey;
use crate::cli_error::CliError;
use crate::data_store::access::{AuthToken, GlobalAuthToken};
use crate::data_store::get_store_from_env;
use crate::data_store::list_query::EventListParams;
use crate::data_store::{EventId, EventStore};

pub fn print_event_list() -> Result<(), CliError> {
    let data_store_pool = get_store_from_env()?;
    let mut data_store = data_store_pool.get_facade()?;

    let auth_key = CliAuthTokenKey::new();
    let auth_token = AuthToken::create_for_cli(&auth_key);

    let mut table = comfy_table::Table::new();
    table
        .load_preset(comfy_table::presets::ASCII_BORDERS_ONLY_CONDENSED)
        .set_header(vec!["id", "name", "location", "start", "end", "enabled"]);

    let mut params = EventListParams::default();
    loop {
        let page = data_store.list_events(&auth_token, &params)?;
        let last_page = (page.rows.len() as i64) < params.limit();
        table.add_rows(page.rows.into_iter().map(|event| {
            [
                event.id.to_string(),
                event.name,
                event.location,
                event.start.to_string(),
                event.end.to_string(),
                event.flag_enabled.to_string(),
            ]
        }));
        if last_page {
            break;
        }
        params.page += 1;
    }

    println!("{table}");
    Ok(())
}

/// Permanently delete an event record together with its audit trail. Unlike the soft delete
/// available through the API, this cannot be undone.
pub fn purge_event(event_id: EventId) -> Result<(), CliError> {
    let data_store_pool = get_store_from_env()?;
    let mut data_store = data_store_pool.get_facade()?;

    let auth_key = CliAuthTokenKey::new();
    let auth_token = AuthToken::create_for_cli(&auth_key);
    // Soft-deleted events are not returned here, but they can still be purged.
    let name = match data_store.get_event(&auth_token, event_id) {
        Ok(event) => event.name,
        Err(crate::data_store::StoreError::NotExisting) => format!("<deleted event {}>", event_id),
        Err(e) => return Err(e.into()),
    };

    let confirm = query_user_bool(
        &format!(
            "Permanently delete event {} ({}) and its audit trail?",
            event_id, name
        ),
        None,
    );
    if confirm {
        let global_token = GlobalAuthToken::create_for_cli(&auth_key);
        data_store.purge_event(&global_token, event_id)?;
        println!("Event {} purged.", event_id);
    }
    Ok(())
}
