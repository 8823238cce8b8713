use std::sync::Arc;
use std::time::Duration;

use hyper::body::{Bytes, to_bytes};
use hyper::client::HttpConnector;
use hyper::header::{CONTENT_TYPE, HeaderName, HeaderValue, RETRY_AFTER};
use hyper::{Body, Client, Request, StatusCode, Uri};
use hyper_rustls::HttpsConnector;
use rustls::{ClientConfig, OwnedTrustAnchor, RootCertStore};
use serde::Serialize;
use tokio::time::timeout;
use tracing::debug;
use webpki_roots::TLS_SERVER_ROOTS;

use crate::traits::{AdapterError, AdapterResult};

pub(crate) type HyperClient = Client<HttpsConnector<HttpConnector>, Body>;

pub(crate) fn build_https_client() -> HyperClient {
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

    Client::builder().build::<_, Body>(connector)
}

/// One JSON POST against a provider endpoint.
pub(crate) struct JsonPost<'a> {
    pub provider: &'static str,
    pub endpoint: &'a Uri,
    pub headers: Vec<(HeaderName, HeaderValue)>,
    pub timeout: Option<Duration>,
}

impl JsonPost<'_> {
    /// Sends `payload` and returns the body of a 2xx response.
    ///
    /// 429 maps to [`AdapterError::RateLimited`]; other non-success statuses
    /// map to [`AdapterError::Response`] carrying the body text.
    pub(crate) async fn send<T: Serialize>(
        self,
        client: &HyperClient,
        payload: &T,
    ) -> AdapterResult<Bytes> {
        let provider = self.provider;
        let body = serde_json::to_vec(payload).map_err(|err| {
            AdapterError::invalid_request(format!("failed to encode {provider} request: {err}"))
        })?;

        let mut builder = Request::post(self.endpoint.clone()).header(CONTENT_TYPE, "application/json");
        for (name, value) in self.headers {
            builder = builder.header(name, value);
        }
        let request = builder.body(Body::from(body)).map_err(|err| {
            AdapterError::transport(format!("failed to build {provider} request: {err}"))
        })?;

        debug!(provider, endpoint = %self.endpoint, "sending generation request");
        let call = client.request(request);
        let response = match self.timeout {
            Some(limit) => timeout(limit, call)
                .await
                .map_err(|_| AdapterError::transport(format!("{provider} request timed out")))?,
            None => call.await,
        }
        .map_err(|err| AdapterError::transport(format!("{provider} request failed: {err}")))?;

        let status = response.status();
        let retry_after = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.trim().parse::<u64>().ok())
            .map(Duration::from_secs);

        let bytes = to_bytes(response.into_body()).await.map_err(|err| {
            AdapterError::transport(format!("failed to read {provider} response: {err}"))
        })?;

        check_status(provider, status, retry_after, &bytes)?;
        Ok(bytes)
    }
}

fn check_status(
    provider: &str,
    status: StatusCode,
    retry_after: Option<Duration>,
    body: &[u8],
) -> AdapterResult<()> {
    if status == StatusCode::TOO_MANY_REQUESTS {
        return Err(AdapterError::RateLimited { retry_after });
    }
    if !status.is_success() {
        let reason = String::from_utf8_lossy(body);
        return Err(AdapterError::response(format!(
            "{provider} returned {status}: {reason}"
        )));
    }
    Ok(())
}

pub(crate) fn sanitize_base_url(provider: &str, input: &str) -> AdapterResult<String> {
    let mut base = input.trim().to_owned();
    if !(base.starts_with("http://") || base.starts_with("https://")) {
        return Err(AdapterError::configuration(format!(
            "{provider} base URL must start with http:// or https://"
        )));
    }
    if !base.ends_with('/') {
        base.push('/');
    }
    base.parse::<Uri>().map_err(|err| {
        AdapterError::configuration(format!("invalid {provider} base URL: {err}"))
    })?;
    Ok(base)
}
