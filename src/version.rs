use std::fmt;

use crate::error::Error;

/// The HTTP protocol version named on a request or status line.
///
/// This crate supports exactly the two versions RFC 7230 framing assumes;
/// anything else is a parse failure (see `Version::parse`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Version {
    Http10,
    Http11,
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Version::Http10 => f.write_str("HTTP/1.0"),
            Version::Http11 => f.write_str("HTTP/1.1"),
        }
    }
}

impl Version {
    /// Parse a protocol token as it appears on a request or status line.
    ///
    /// `bad: fn(&'static str) -> Error` lets the caller pick `BadRequest`
    /// or `BadResponse` for the "doesn't even look like HTTP" case, while
    /// the "looks HTTP-ish but is an unsupported version" case always
    /// raises `UnsupportedProtocol` regardless of role.
    pub fn parse(
        token: &str,
        bad: impl FnOnce(&'static str) -> Error,
    ) -> Result<Version, Error> {
        match token {
            "HTTP/1.0" => Ok(Version::Http10),
            "HTTP/1.1" => Ok(Version::Http11),
            _ if looks_http_ish(token) => {
                Err(Error::UnsupportedProtocol(true))
            }
            _ => Err(bad("malformed protocol token")),
        }
    }
}

/// `true` if `token` matches the shape `HTTP/<digits>.<digits>`, regardless
/// of whether the specific version is one this crate supports. Used to
/// distinguish an HTTP/2-preface-like token (e.g. `HTTP/2.0`) from bytes
/// that aren't HTTP at all, per the `looks_http_ish` flag on
/// `Error::UnsupportedProtocol`.
fn looks_http_ish(token: &str) -> bool {
    let Some(rest) = token.strip_prefix("HTTP/") else {
        return false;
    };
    let Some((major, minor)) = rest.split_once('.') else {
        return false;
    };
    !major.is_empty()
        && !minor.is_empty()
        && major.bytes().all(|b| b.is_ascii_digit())
        && minor.bytes().all(|b| b.is_ascii_digit())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn supported_versions() {
        assert_eq!(
            Version::parse("HTTP/1.0", |r| Error::BadRequest(r)).unwrap(),
            Version::Http10
        );
        assert_eq!(
            Version::parse("HTTP/1.1", |r| Error::BadRequest(r)).unwrap(),
            Version::Http11
        );
    }

    #[test]
    fn http2_preface_is_unsupported_but_http_ish() {
        match Version::parse("HTTP/2.0", |r| Error::BadRequest(r)) {
            Err(Error::UnsupportedProtocol(true)) => {}
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn garbage_is_bad_request() {
        match Version::parse("PRI", |r| Error::BadRequest(r)) {
            Err(Error::BadRequest(_)) => {}
            other => panic!("unexpected: {:?}", other),
        }
    }
}
