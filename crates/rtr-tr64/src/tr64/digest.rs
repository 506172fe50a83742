//! Digest response computation and the per-router auth cache.
//!
//! ```text
//! secret   = md5_hex(user ":" realm ":" password)
//! response = md5_hex(secret ":" nonce)
//! ```

use md5::{Digest, Md5};
use std::sync::{Arc, Mutex, MutexGuard};

/// Lower-case hex MD5 of `input`.
pub fn md5_hex(input: &str) -> String {
    hex::encode(Md5::digest(input.as_bytes()))
}

/// Answer to a `(nonce, realm)` challenge.
pub fn compute_response(user: &str, realm: &str, password: &str, nonce: &str) -> String {
    let secret = md5_hex(&format!("{}:{}:{}", user, realm, password));
    md5_hex(&format!("{}:{}", secret, nonce))
}

// ─── Auth cache ──────────────────────────────────────────────────────

/// What survives between calls to one router.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DigestAuthState {
    /// Last accepted `<s:Header>` element, replayed verbatim.
    pub auth_header: Option<String>,
    /// HTTPS port for authenticated calls; 0 until discovered.
    pub secure_port: u16,
}

impl DigestAuthState {
    pub fn clear_auth(&mut self) {
        self.auth_header = None;
    }
}

pub type SharedAuthState = Arc<Mutex<DigestAuthState>>;

pub fn new_shared_state() -> SharedAuthState {
    Arc::new(Mutex::new(DigestAuthState::default()))
}

/// Lock the cache. The state is plain data, so a poisoned lock is still usable.
pub fn lock_state(state: &SharedAuthState) -> MutexGuard<'_, DigestAuthState> {
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
