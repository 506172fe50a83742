//! Router transport layer.
//!
//! Moves files and SOAP actions between the application and a home router.
//! Callers talk to [`RouterTransport`] only; it picks the FTP client
//! (`rtr-ftp`) or the TR-064 digest client (`rtr-tr64`) per router profile.

pub mod error;
pub mod facade;
pub mod profile;

pub use error::{TransportError, TransportResult};
pub use facade::RouterTransport;
pub use profile::{CredentialStore, MemoryCredentialStore, RouterProfile};

pub use rtr_ftp as ftp;
pub use rtr_tr64 as tr64;
