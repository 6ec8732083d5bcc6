//! Request-line / status-line parsing into a `MessageHead`.

use crate::error::Error;
use crate::version::Version;

/// The parsed first line of an HTTP message, plus its protocol version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageHead {
    Request { method: String, uri: String, protocol: Version },
    Response { status_code: u16, reason_phrase: String, protocol: Version },
}

impl MessageHead {
    pub fn protocol(&self) -> Version {
        match *self {
            MessageHead::Request { protocol, .. } => protocol,
            MessageHead::Response { protocol, .. } => protocol,
        }
    }
}

/// Parse a request line: `METHOD SP request-uri SP protocol`.
///
/// The split bound is exactly 3: a request URI never legally contains an
/// unencoded space, so a third `splitn` part would only ever appear for a
/// malformed line, which `Version::parse` (or the missing-part check below)
/// rejects.
pub fn parse_request_line(line: &str) -> Result<MessageHead, Error> {
    let mut parts = line.splitn(3, ' ');
    let method = parts.next().filter(|s| !s.is_empty());
    let uri = parts.next();
    let protocol = parts.next();
    let (method, uri, protocol) = match (method, uri, protocol) {
        (Some(m), Some(u), Some(p)) => (m, u, p),
        _ => return Err(Error::BadRequest("malformed request line")),
    };
    let protocol = Version::parse(protocol, Error::BadRequest)?;
    Ok(MessageHead::Request {
        method: method.to_string(),
        uri: uri.to_string(),
        protocol,
    })
}

/// Parse a status line: `protocol SP status-code SP reason-phrase`.
///
/// The reason phrase may itself contain spaces, so the split bound is 3
/// (protocol, status-code, everything after the second space).
pub fn parse_status_line(line: &str) -> Result<MessageHead, Error> {
    let mut parts = line.splitn(3, ' ');
    let protocol = parts.next().filter(|s| !s.is_empty());
    let status_code = parts.next();
    let reason_phrase = parts.next();
    let (protocol, status_code, reason_phrase) =
        match (protocol, status_code, reason_phrase) {
            (Some(p), Some(s), Some(r)) => (p, s, r),
            _ => return Err(Error::BadResponse("malformed status line")),
        };
    let protocol = Version::parse(protocol, Error::BadResponse)?;
    let status_code: u16 = status_code
        .parse()
        .map_err(|_| Error::BadResponse("malformed status code"))?;
    Ok(MessageHead::Response {
        status_code,
        reason_phrase: reason_phrase.to_string(),
        protocol,
    })
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn request_line_ok() {
        let head = parse_request_line("POST /index.html HTTP/1.0").unwrap();
        assert_eq!(
            head,
            MessageHead::Request {
                method: "POST".into(),
                uri: "/index.html".into(),
                protocol: Version::Http10,
            }
        );
    }

    #[test]
    fn status_line_reason_may_contain_spaces() {
        let head = parse_status_line("HTTP/1.1 404 Not Found Today").unwrap();
        assert_eq!(
            head,
            MessageHead::Response {
                status_code: 404,
                reason_phrase: "Not Found Today".into(),
                protocol: Version::Http11,
            }
        );
    }

    #[test]
    fn request_line_bad_version_is_bad_request() {
        match parse_request_line("GET / HTTP") {
            Err(Error::BadRequest(_)) => {}
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn request_line_http2_preface() {
        match parse_request_line("PRI * HTTP/2.0") {
            Err(Error::UnsupportedProtocol(true)) => {}
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn status_line_bad_status_code() {
        match parse_status_line("HTTP/1.1 abc OK") {
            Err(Error::BadResponse(_)) => {}
            other => panic!("unexpected: {:?}", other),
        }
    }
}
