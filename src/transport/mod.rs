//! Reverse-proxy transport.
//!
//! # Responsibilities
//! - Rewrite the request URI onto the backend (scheme, host, path prefix;
//!   query preserved)
//! - Enforce the route's per-request deadline
//! - Strip hop-by-hop headers both ways, stream everything else verbatim
//!
//! # Design Decisions
//! - Response bodies are streamed, never buffered
//! - One deadline bounds the whole exchange: request send, time to
//!   headers, and the streamed response body
//! - Timeouts are distinct from other failures: deadline → 504, anything
//!   else upstream → 502
//! - An invalid backend descriptor fails before any network call

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::uri::PathAndQuery;
use axum::http::{header, HeaderMap, HeaderValue, Request, Response, Uri};
use http_body::Frame;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;
use tokio::time::Instant;

use crate::error::GatewayError;
use crate::routing::Backend;

/// Headers that describe the connection, not the message. RFC 9110 §7.6.1.
const HOP_BY_HOP: [header::HeaderName; 8] = [
    header::CONNECTION,
    header::HeaderName::from_static("keep-alive"),
    header::PROXY_AUTHENTICATE,
    header::PROXY_AUTHORIZATION,
    header::TE,
    header::TRAILER,
    header::TRANSFER_ENCODING,
    header::UPGRADE,
];

/// Forwards a request to a backend and returns its response.
#[async_trait]
pub trait Transporter: Send + Sync {
    async fn forward(
        &self,
        req: Request<Body>,
        backend: &Backend,
    ) -> Result<Response<Body>, GatewayError>;
}

/// HTTP transporter over a shared connection-pooling client.
pub struct HttpTransporter {
    client: Client<HttpConnector, Body>,
}

impl HttpTransporter {
    pub fn new() -> Self {
        Self {
            client: Client::builder(TokioExecutor::new()).build(HttpConnector::new()),
        }
    }
}

impl Default for HttpTransporter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transporter for HttpTransporter {
    async fn forward(
        &self,
        mut req: Request<Body>,
        backend: &Backend,
    ) -> Result<Response<Body>, GatewayError> {
        let target = rewrite_uri(req.uri(), &backend.url)?;
        let authority = target
            .authority()
            .cloned()
            .ok_or_else(|| {
                GatewayError::transport(
                    "invalid_backend",
                    std::io::Error::new(std::io::ErrorKind::InvalidInput, "backend url missing host"),
                )
            })?;

        *req.uri_mut() = target;
        strip_hop_by_hop(req.headers_mut());
        req.headers_mut().insert(
            header::HOST,
            HeaderValue::from_str(authority.as_str())
                .map_err(|e| GatewayError::transport("host_rewrite", e))?,
        );
        for (name, value) in &backend.headers {
            let name: header::HeaderName = name
                .parse()
                .map_err(|e| GatewayError::transport("backend_header", e))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| GatewayError::transport("backend_header", e))?;
            req.headers_mut().insert(name, value);
        }

        // One deadline covers the request send, the wait for headers, and
        // the body copy below; a backend that answers promptly and then
        // stalls mid-body is cut at the same instant.
        let deadline = Instant::now() + backend.timeout;
        let response = tokio::time::timeout_at(deadline, self.client.request(req))
            .await
            .map_err(|_| GatewayError::GatewayTimeout)?
            .map_err(|e| GatewayError::transport("proxy_request", e))?;

        let mut response = response.map(|body| Body::new(DeadlineBody::new(body, deadline)));
        strip_hop_by_hop(response.headers_mut());
        Ok(response)
    }
}

/// A response body bounded by the backend deadline.
///
/// Headers have already been written by the time the body streams, so an
/// overrun cannot become a 504; the stream errors instead, aborting the
/// client copy exactly as an upstream cancellation would.
struct DeadlineBody<B> {
    inner: B,
    sleep: Pin<Box<tokio::time::Sleep>>,
}

impl<B> DeadlineBody<B> {
    fn new(inner: B, deadline: Instant) -> Self {
        Self {
            inner,
            sleep: Box::pin(tokio::time::sleep_until(deadline)),
        }
    }
}

impl<B> http_body::Body for DeadlineBody<B>
where
    B: http_body::Body + Unpin,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    type Data = B::Data;
    type Error = Box<dyn std::error::Error + Send + Sync>;

    fn poll_frame(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        let this = self.get_mut();

        if this.sleep.as_mut().poll(cx).is_ready() {
            return Poll::Ready(Some(Err(
                "upstream deadline exceeded while streaming response body".into(),
            )));
        }

        match Pin::new(&mut this.inner).poll_frame(cx) {
            Poll::Ready(Some(Ok(frame))) => Poll::Ready(Some(Ok(frame))),
            Poll::Ready(Some(Err(e))) => Poll::Ready(Some(Err(e.into()))),
            Poll::Ready(None) => Poll::Ready(None),
            Poll::Pending => Poll::Pending,
        }
    }

    fn size_hint(&self) -> http_body::SizeHint {
        self.inner.size_hint()
    }
}

/// Rebuild the request URI onto the backend: scheme and host come from the
/// backend, the backend's path is prefixed, and the query is preserved.
fn rewrite_uri(original: &Uri, backend: &Uri) -> Result<Uri, GatewayError> {
    let (scheme, authority) = match (backend.scheme(), backend.authority()) {
        (Some(scheme), Some(authority)) => (scheme.clone(), authority.clone()),
        _ => {
            return Err(GatewayError::transport(
                "invalid_backend",
                std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    "backend url missing scheme or host",
                ),
            ))
        }
    };

    let prefix = backend.path().trim_end_matches('/');
    let path = format!("{}{}", prefix, original.path());
    let path_and_query = match original.query() {
        Some(query) => format!("{path}?{query}"),
        None => path,
    };
    let path_and_query: PathAndQuery = path_and_query
        .parse()
        .map_err(|e| GatewayError::transport("uri_rewrite", e))?;

    Uri::builder()
        .scheme(scheme)
        .authority(authority)
        .path_and_query(path_and_query)
        .build()
        .map_err(|e| GatewayError::transport("uri_rewrite", e))
}

fn strip_hop_by_hop(headers: &mut HeaderMap) {
    // Headers named by Connection are hop-by-hop too.
    let named: Vec<header::HeaderName> = headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .filter_map(|name| name.trim().parse().ok())
        .collect();

    for name in named {
        headers.remove(name);
    }
    for name in HOP_BY_HOP {
        headers.remove(name);
    }
}
