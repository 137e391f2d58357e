//! Platform-wide constants.
//!
//! URN prefixes, response headers, and validity windows shared by the
//! control plane and the client SDK.

/// Validity window for certificates and receipts: 7 days in milliseconds.
pub const VALIDITY_WINDOW_MS: u64 = 604_800_000;

/// URN prefix for issued service certificates.
pub const CERT_URN_PREFIX: &str = "urn:hcp:cert";

/// URN prefix for registration receipts.
pub const RECEIPT_URN_PREFIX: &str = "urn:hcp:hc2:service-registration-receipt";

/// Response header carrying the number of resources in the body.
pub const HEADER_COUNT: &str = "X-Count";

/// Response header carrying the URN of the created resource.
pub const HEADER_RESOURCE: &str = "X-HC2-Resource";

/// Wire field name for the base64-embedded certificate in a registration.
pub const CERTIFICATE_FIELD: &str = "HC2ServiceCertificate";

/// Nonce length for registration receipts, in bytes (hex-encoded on wire).
pub const RECEIPT_NONCE_BYTES: usize = 16;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validity_window_is_seven_days() {
        assert_eq!(VALIDITY_WINDOW_MS, 7 * 24 * 60 * 60 * 1000);
    }
}
