//! Credentials for the remote database.
//!
//! `CredentialStore` keeps the optional database auth token in the OS
//! keychain, so it never lands in the config file.

pub mod credentials;

pub use credentials::CredentialStore;
