//! # rtr-tr64: TR-064 SOAP client
//!
//! Calls actions on a router's TR-064 control endpoints. Discovery calls go
//! over plain HTTP on the discovery port; everything else goes over HTTPS on
//! the router's security port and is authenticated with the SOAP digest
//! scheme (`InitChallenge` → nonce/realm → `ClientAuth`).
//!
//! Architecture:
//! - `types`: requests, responses, configuration
//! - `error`: TR-064 error type
//! - `envelope`: SOAP envelope and auth header construction
//! - `digest`: response computation and the shared auth cache
//! - `xml`: tag extraction from response documents
//! - `http`: `SoapTransport` seam and its reqwest implementation
//! - `client`: `DigestClient`: the challenge-response flow

pub mod types;
pub mod error;
pub mod envelope;
pub mod digest;
pub mod xml;
pub mod http;
pub mod client;

pub use client::DigestClient;
pub use digest::{DigestAuthState, SharedAuthState};
pub use error::{Tr64Error, Tr64ErrorKind, Tr64Result};
pub use http::{HttpSoapTransport, SoapTransport};
pub use types::*;
