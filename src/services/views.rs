//! View Ledger entry point: deriving the ledger identity of a request.
//!
//! The dedup itself lives behind [`crate::repositories::store::PasteStore::record_view`];
//! this module only decides who a request counts as.

use std::net::SocketAddr;

use axum::http::HeaderMap;

/// Derives the ledger identity for a request: first forwarded-for entry,
/// then `x-real-ip`, then the peer address.
///
/// A heuristic against naive repeat loads, not a security boundary.
pub fn client_identity(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    if let Some(xff) = headers.get("x-forwarded-for").and_then(|v| v.to_str().ok()) {
        if let Some(first) = xff.split(',').next() {
            let trimmed = first.trim();
            if !trimmed.is_empty() {
                return trimmed.to_owned();
            }
        }
    }

    if let Some(real_ip) = headers.get("x-real-ip").and_then(|v| v.to_str().ok()) {
        let trimmed = real_ip.trim();
        if !trimmed.is_empty() {
            return trimmed.to_owned();
        }
    }

    peer.map(|addr| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn peer() -> Option<SocketAddr> {
        Some("192.0.2.7:443".parse().unwrap())
    }

    #[test]
    fn first_forwarded_entry_wins() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", "203.0.113.4 , 10.0.0.1".parse().unwrap());
        assert_eq!(client_identity(&headers, peer()), "203.0.113.4");
    }

    #[test]
    fn real_ip_is_second_choice() {
        let mut headers = HeaderMap::new();
        headers.insert("x-real-ip", "203.0.113.9".parse().unwrap());
        assert_eq!(client_identity(&headers, peer()), "203.0.113.9");
    }

    #[test]
    fn peer_address_is_the_fallback() {
        let headers = HeaderMap::new();
        assert_eq!(client_identity(&headers, peer()), "192.0.2.7");
        assert_eq!(client_identity(&headers, None), "unknown");
    }

    #[test]
    fn empty_forwarded_entries_are_skipped() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", "   ".parse().unwrap());
        assert_eq!(client_identity(&headers, peer()), "192.0.2.7");
    }
}
