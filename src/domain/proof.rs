//! Payment-proof references.
//!
//! Customers paying by transfer or mobile wallet upload a receipt to the
//! store's media host and send us the resulting URL. We never touch the
//! upload itself; we only normalize the reference and refuse anything that
//! does not point at the trusted host.

use crate::error::{Error, Result};

/// Normalizes a proof reference and checks it against the trusted media host.
///
/// A reference without a scheme gets `https://` prepended (mobile clients
/// routinely strip it). Anything that then is not an http(s) URL on
/// `trusted_host` (or a subdomain of it) is rejected.
pub fn normalize_proof_url(raw: &str, trusted_host: &str) -> Result<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(Error::InvalidPaymentProof("empty reference".into()));
    }

    let url = if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else if trimmed.contains("://") {
        return Err(Error::InvalidPaymentProof(format!(
            "unsupported scheme in '{trimmed}'"
        )));
    } else {
        format!("https://{trimmed}")
    };

    let rest = url.split_once("://").map(|(_, r)| r).unwrap_or("");
    let host = rest
        .split(['/', '?', '#'])
        .next()
        .unwrap_or("")
        .split('@')
        .last()
        .unwrap_or("")
        .split(':')
        .next()
        .unwrap_or("");

    if host == trusted_host || host.ends_with(&format!(".{trusted_host}")) {
        Ok(url)
    } else {
        Err(Error::InvalidPaymentProof(format!(
            "'{host}' is not the trusted media host"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HOST: &str = "cloudinary.com";

    #[test]
    fn accepts_trusted_urls_as_is() {
        let url = "https://res.cloudinary.com/store/image/upload/v1/proof.jpg";
        assert_eq!(normalize_proof_url(url, HOST).unwrap(), url);
    }

    #[test]
    fn prepends_https_when_scheme_is_missing() {
        assert_eq!(
            normalize_proof_url("res.cloudinary.com/store/proof.jpg", HOST).unwrap(),
            "https://res.cloudinary.com/store/proof.jpg"
        );
    }

    #[test]
    fn rejects_untrusted_hosts() {
        assert!(normalize_proof_url("https://example.com/x.jpg", HOST).is_err());
        // Lookalike suffix without the dot boundary.
        assert!(normalize_proof_url("https://evilcloudinary.com/x.jpg", HOST).is_err());
    }

    #[test]
    fn rejects_non_http_schemes() {
        assert!(normalize_proof_url("ftp://example.com/x.jpg", HOST).is_err());
        assert!(normalize_proof_url("ftp://cloudinary.com/x.jpg", HOST).is_err());
    }

    #[test]
    fn rejects_empty_and_credentials_tricks() {
        assert!(normalize_proof_url("  ", HOST).is_err());
        // user@host trick: the real host is after the '@'.
        assert!(normalize_proof_url("https://cloudinary.com@evil.com/x.jpg", HOST).is_err());
    }
}
