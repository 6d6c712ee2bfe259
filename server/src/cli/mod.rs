pub mod database_migration;
pub mod manage_events;
pub mod manage_users;
mod util;

/// Proof of running in a local CLI context. Possession of this key allows minting
/// administrative auth tokens without a user session, so it must never be constructable
/// from request-handling code.
pub struct CliAuthTokenKey {
    _private: (),
}

impl CliAuthTokenKey {
    #[allow(clippy::new_without_default)] // We always want to explicitly create these objects
    pub fn new() -> Self {
        Self { _private: () }
    }

    #[cfg(test)]
    pub(crate) fn for_tests() -> Self {
        Self { _private: () }
    }
}
