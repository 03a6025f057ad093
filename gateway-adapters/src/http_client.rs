use std::sync::Arc;

use hyper::client::HttpConnector;
use hyper::{Body, Client, Uri};
use hyper_rustls::HttpsConnector;
use rustls::{ClientConfig, OwnedTrustAnchor, RootCertStore};
use webpki_roots::TLS_SERVER_ROOTS;

use crate::traits::{ApiError, ApiResult};

pub(crate) type HyperClient = Client<HttpsConnector<HttpConnector>, Body>;

#[allow(clippy::unnecessary_wraps)]
pub(crate) fn build_https_client() -> ApiResult<HyperClient> {
    let mut roots = RootCertStore::empty();
    roots.add_trust_anchors(TLS_SERVER_ROOTS.iter().map(|anchor| {
        OwnedTrustAnchor::from_subject_spki_name_constraints(
            anchor.subject,
            anchor.spki,
            anchor.name_constraints,
        )
    }));

    let config = ClientConfig::builder()
        .with_safe_defaults()
        .with_root_certificates(roots)
        .with_no_client_auth();

    let mut http = HttpConnector::new();
    http.enforce_http(false);

    let connector = HttpsConnector::from((http, Arc::new(config)));

    Ok(Client::builder().build::<_, Body>(connector))
}

/// Normalizes a base URL: trims whitespace, guarantees a trailing slash, and
/// verifies the result parses as a URI.
pub(crate) fn sanitize_base_url(raw: &str) -> ApiResult<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ApiError::configuration("base URL cannot be empty"));
    }

    let mut url = trimmed.to_owned();
    if !url.ends_with('/') {
        url.push('/');
    }

    url.parse::<Uri>()
        .map_err(|err| ApiError::configuration(format!("invalid base URL `{trimmed}`: {err}")))?;

    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_appends_trailing_slash() {
        let url = sanitize_base_url("https://api.github.com").expect("sanitize");
        assert_eq!(url, "https://api.github.com/");
    }

    #[test]
    fn sanitize_rejects_empty_input() {
        let err = sanitize_base_url("   ").expect_err("empty should fail");
        assert!(matches!(err, ApiError::Configuration { .. }));
    }
}
