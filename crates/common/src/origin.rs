//! Origin keys and their on-disk names.
//!
//! Origins are keyed as `scheme://authority` everywhere in memory and on the
//! wire. Some filesystems reject `:` and `/` in names, so a service directory
//! is named by replacing the `://` separator and every `:` in the authority
//! with `@`:
//!
//! ```text
//! http://a.com:80   <->   http@a.com@80
//! ```
//!
//! `@` never appears in a valid origin, so the first `@` of a filename is
//! always the scheme separator and the transform is a bijection over the keys
//! accepted by [`to_filename`].

const SCHEME_SEPARATOR: &str = "://";
const ESCAPE: char = '@';

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OriginError {
    #[error("origin is missing a scheme separator: {0}")]
    MissingScheme(String),
    #[error("origin has an empty scheme or authority: {0}")]
    Empty(String),
    #[error("origin contains a reserved character '{1}': {0}")]
    ReservedCharacter(String, char),
    #[error("not an origin filename: {0}")]
    InvalidFilename(String),
}

/// Convert an origin key into the name of its service directory.
pub fn to_filename(origin: &str) -> Result<String, OriginError> {
    let (scheme, authority) = origin
        .split_once(SCHEME_SEPARATOR)
        .ok_or_else(|| OriginError::MissingScheme(origin.to_string()))?;

    if scheme.is_empty() || authority.is_empty() {
        return Err(OriginError::Empty(origin.to_string()));
    }
    for reserved in [ESCAPE, '/', ':'] {
        if scheme.contains(reserved) {
            return Err(OriginError::ReservedCharacter(origin.to_string(), reserved));
        }
    }
    for reserved in [ESCAPE, '/'] {
        if authority.contains(reserved) {
            return Err(OriginError::ReservedCharacter(origin.to_string(), reserved));
        }
    }

    Ok(format!(
        "{}{}{}",
        scheme,
        ESCAPE,
        authority.replace(':', &ESCAPE.to_string())
    ))
}

/// Convert a service directory name back into its origin key.
pub fn from_filename(filename: &str) -> Result<String, OriginError> {
    let (scheme, authority) = filename
        .split_once(ESCAPE)
        .ok_or_else(|| OriginError::InvalidFilename(filename.to_string()))?;

    if scheme.is_empty() || authority.is_empty() {
        return Err(OriginError::InvalidFilename(filename.to_string()));
    }

    Ok(format!(
        "{}{}{}",
        scheme,
        SCHEME_SEPARATOR,
        authority.replace(ESCAPE, ":")
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_origin_with_port_round_trips() {
        let filename = to_filename("http://a.com:80").unwrap();
        assert_eq!(filename, "http@a.com@80");
        assert_eq!(from_filename(&filename).unwrap(), "http://a.com:80");
    }

    #[test]
    fn test_origin_without_port_round_trips() {
        let filename = to_filename("https://example.org").unwrap();
        assert_eq!(filename, "https@example.org");
        assert_eq!(from_filename(&filename).unwrap(), "https://example.org");
    }

    #[test]
    fn test_ipv6_authority_round_trips() {
        let origin = "http://[::1]:8080";
        let filename = to_filename(origin).unwrap();
        assert!(!filename.contains(':'));
        assert_eq!(from_filename(&filename).unwrap(), origin);
    }

    #[test]
    fn test_rejects_keys_that_would_break_the_bijection() {
        assert_eq!(
            to_filename("http:google.com:80"),
            Err(OriginError::MissingScheme("http:google.com:80".to_string()))
        );
        assert!(matches!(
            to_filename("http://user@a.com"),
            Err(OriginError::ReservedCharacter(_, '@'))
        ));
        assert!(matches!(
            to_filename("http://a.com/path"),
            Err(OriginError::ReservedCharacter(_, '/'))
        ));
        assert!(matches!(to_filename("://a.com"), Err(OriginError::Empty(_))));
    }

    #[test]
    fn test_rejects_foreign_filenames() {
        assert!(from_filename("README").is_err());
        assert!(from_filename("@a.com").is_err());
    }
}
