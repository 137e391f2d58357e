//! Problem-detail documents for the registry HTTP surface.
//!
//! Error responses are JSON documents with `type`, `title`, `detail`, and
//! `instance` members plus a matching HTTP status. The HTTP layer owns the
//! status mapping; this module only shapes the document.

use serde::Deserialize;
use serde::Serialize;

/// A problem-detail document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProblemDetail {
    /// Problem type URI, e.g. `/probs/cert-invalid`.
    #[serde(rename = "type")]
    pub problem_type: String,
    /// Short human-readable summary.
    pub title: String,
    /// Occurrence-specific explanation.
    pub detail: String,
    /// URI of the request that produced the problem.
    pub instance: String,
}

impl ProblemDetail {
    /// Problem for a certificate that failed signature verification.
    pub fn cert_invalid(detail: impl Into<String>, instance: impl Into<String>) -> Self {
        Self {
            problem_type: "/probs/cert-invalid".to_string(),
            title: "certificate verification failed".to_string(),
            detail: detail.into(),
            instance: instance.into(),
        }
    }

    /// Problem for a registration whose fields diverge from its certificate.
    pub fn cert_claims_invalid(detail: impl Into<String>, instance: impl Into<String>) -> Self {
        Self {
            problem_type: "/probs/cert-claims-invalid".to_string(),
            title: "registration does not match certified claims".to_string(),
            detail: detail.into(),
            instance: instance.into(),
        }
    }

    /// Problem for an internal failure while handling a request.
    pub fn internal(detail: impl Into<String>, instance: impl Into<String>) -> Self {
        Self {
            problem_type: "/probs/internal".to_string(),
            title: "internal error".to_string(),
            detail: detail.into(),
            instance: instance.into(),
        }
    }

    /// Problem for an unreachable upstream behind the gateway.
    pub fn upstream_unavailable(detail: impl Into<String>, instance: impl Into<String>) -> Self {
        Self {
            problem_type: "/probs/upstream-unavailable".to_string(),
            title: "upstream unavailable".to_string(),
            detail: detail.into(),
            instance: instance.into(),
        }
    }
}
