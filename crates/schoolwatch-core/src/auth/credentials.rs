use anyhow::{Context, Result};
use keyring::Entry;

const SERVICE_NAME: &str = "schoolwatch";

/// Keychain account holding the database auth token
const TOKEN_ACCOUNT: &str = "database-auth-token";

pub struct CredentialStore;

impl CredentialStore {
    fn entry() -> Result<Entry> {
        Entry::new(SERVICE_NAME, TOKEN_ACCOUNT).context("Failed to create keyring entry")
    }

    /// Store the database auth token in the OS keychain
    pub fn store_token(token: &str) -> Result<()> {
        Self::entry()?
            .set_password(token)
            .context("Failed to store token in keychain")?;
        Ok(())
    }

    pub fn get_token() -> Result<String> {
        Self::entry()?
            .get_password()
            .context("Failed to retrieve token from keychain")
    }

    pub fn delete_token() -> Result<()> {
        Self::entry()?
            .delete_credential()
            .context("Failed to delete token from keychain")?;
        Ok(())
    }

    pub fn has_token() -> bool {
        Self::get_token().is_ok()
    }
}
