//! pastebox: publish text snippets under public, unlisted, private,
//! password-gated, or zero-knowledge confidentiality regimes.
//!
//! Server side, the Access Gate decides per request whether a caller may
//! see a paste — existence, expiration, ownership, password verification,
//! and burn-after-read claims evaluated in a fixed order over an
//! explicitly injected context. Client side, the encryption envelope keeps
//! zero-knowledge content unreadable to the server: content is sealed with
//! AES-256-GCM before upload and the key rides a URL fragment that never
//! crosses the wire.

pub mod app;
pub mod config;
pub mod db;
pub mod error;
pub mod sessions;
pub mod state;

pub mod client {
    pub mod editor;
    pub mod share;
}

pub mod crypto {
    pub mod envelope;
    pub mod password;
    pub mod transport;
}

pub mod models {
    pub mod paste;
    pub mod session;
}

pub mod repositories {
    pub mod memory;
    pub mod paste;
    pub mod store;
}

pub mod services {
    pub mod access;
    pub mod reaper;
    pub mod views;
}

pub mod handlers {
    pub mod pastes;
}

pub mod middleware_layer {
    pub mod session;
}

pub mod validation {
    pub mod pastes;
}
