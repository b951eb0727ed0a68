//! Record types synchronized from the remote database.
//!
//! - `School`: one directory entry (school / polling center) with contacts and location
//! - `EmergencyContact`: auxiliary reference data, synced as its own class
//! - `SchoolStats`: aggregate figures for the dashboard
//!
//! The sync core treats records as opaque payloads. It only needs them to be
//! serializable and to name the remote collection they live in.

pub mod emergency;
mod lenient;
pub mod school;

use serde::{de::DeserializeOwned, Serialize};

pub use emergency::EmergencyContact;
pub use school::{School, SchoolStats};

pub trait Record: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Remote collection the records are read from; also namespaces the local cache.
    const COLLECTION: &'static str;

    /// Called with the child key when the remote returns records keyed by id.
    fn adopt_remote_key(&mut self, _key: &str) {}
}
