use janus_core::identity::{self, USERS_DB};
use janus_core::records::UserRecord;
use janus_core::secret::generate_secret;

use crate::error::GatewayError;
use crate::store::{get_typed, put_typed, DocumentStore};

/// Owner of the canonical user record, keyed by verified email.
pub struct UserStore<'a> {
    store: &'a dyn DocumentStore,
}

impl<'a> UserStore<'a> {
    pub fn new(store: &'a dyn DocumentStore) -> Self {
        Self { store }
    }

    /// Create the user on first sight, otherwise refresh it in place.
    ///
    /// A secret is generated only when the record is created. Existing records
    /// keep their secret and are written back with their current revision; a
    /// conflict means someone else won the race and surfaces as an error.
    pub async fn ensure(&self, email: &str) -> Result<UserRecord, GatewayError> {
        let doc_id = identity::user_doc_id(email);

        let existing: Option<UserRecord> = get_typed(self.store, USERS_DB, &doc_id)
            .await
            .map_err(GatewayError::RetrievingUser)?;

        let mut record = match existing {
            Some(stored) => {
                log::debug!("Refreshing existing user record for {email}");
                stored.refreshed(email)
            }
            None => {
                log::info!("Creating user record for {email}");
                UserRecord::new_federated(email, generate_secret())
            }
        };

        let rev = put_typed(self.store, USERS_DB, &doc_id, &record)
            .await
            .map_err(GatewayError::CreatingUser)?;

        record.rev = Some(rev);
        record.password = None;
        Ok(record)
    }
}
