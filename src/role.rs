//! The handful of places the frame parser behaves differently for
//! requests versus responses (§6), factored into a single trait so the
//! state machine in `frame` is written once.

use crate::error::Error;
use crate::head::MessageHead;
use crate::headers::HeaderBlock;

/// Parameterizes `FrameParser` over server (request) or client (response)
/// framing.
pub trait Role {
    /// Parse the first line of a message for this role.
    fn parse_head_line(line: &str) -> Result<MessageHead, Error>;

    /// Build the "malformed framing" error variant for this role
    /// (`BadRequest` for a server, `BadResponse` for a client).
    fn bad(reason: &'static str) -> Error;

    /// Normalize a header name into this role's public form.
    fn normalize_header_name(name: &str) -> String;

    /// Give a role the chance to inject synthetic headers once a head and
    /// its header block are fully parsed, before the message is handed to
    /// the consumer. The server role never adds anything; the client role
    /// injects `x-server-protocol` and `x-server-status-message` (§6).
    fn inject_synthetic_headers(head: &MessageHead, headers: &mut HeaderBlock);
}

/// The server role: parses request lines, normalizes headers into the
/// `HTTP_`-prefixed environment form, never injects synthetic headers.
#[derive(Debug, Clone, Copy, Default)]
pub struct Server;

impl Role for Server {
    fn parse_head_line(line: &str) -> Result<MessageHead, Error> {
        crate::head::parse_request_line(line)
    }

    fn bad(reason: &'static str) -> Error {
        Error::BadRequest(reason)
    }

    fn normalize_header_name(name: &str) -> String {
        crate::headers::normalize_env_name(name)
    }

    fn inject_synthetic_headers(_head: &MessageHead, _headers: &mut HeaderBlock) {}
}

/// The client role: parses status lines, normalizes headers by
/// lowercasing only, and injects `x-server-protocol` /
/// `x-server-status-message` so callers can recover those two values
/// through the ordinary header map.
#[derive(Debug, Clone, Copy, Default)]
pub struct Client;

impl Role for Client {
    fn parse_head_line(line: &str) -> Result<MessageHead, Error> {
        crate::head::parse_status_line(line)
    }

    fn bad(reason: &'static str) -> Error {
        Error::BadResponse(reason)
    }

    fn normalize_header_name(name: &str) -> String {
        crate::headers::normalize_client_name(name)
    }

    fn inject_synthetic_headers(head: &MessageHead, headers: &mut HeaderBlock) {
        if let MessageHead::Response { protocol, reason_phrase, .. } = head {
            headers.insert_or_append("x-server-protocol".into(), &protocol.to_string());
            headers.insert_or_append("x-server-status-message".into(), reason_phrase);
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn server_role_normalizes_env_style() {
        assert_eq!(Server::normalize_header_name("Content-Type"), "CONTENT_TYPE");
        assert!(matches!(Server::bad("x"), Error::BadRequest("x")));
    }

    #[test]
    fn client_role_injects_synthetic_headers() {
        let head = crate::head::parse_status_line("HTTP/1.1 404 Not Found").unwrap();
        let mut headers = HeaderBlock::new();
        Client::inject_synthetic_headers(&head, &mut headers);
        assert_eq!(headers.get("x-server-protocol"), Some("HTTP/1.1"));
        assert_eq!(headers.get("x-server-status-message"), Some("Not Found"));
    }
}
