//! Raw byte retrieval for validated sources.

use std::future::Future;
use std::path::Path;
use std::pin::Pin;

use crate::config::RefreshConfig;
use crate::error::FetchError;
use crate::source::{Endpoint, Scheme, ValidSource};

/// Type alias for a boxed future that can be sent between threads.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Loads the bytes behind a source.
///
/// Methods return boxed futures for dyn-compatibility.
pub trait SourceFetcher: Send + Sync {
    fn fetch<'a>(&'a self, source: &'a ValidSource) -> BoxFuture<'a, Result<Vec<u8>, FetchError>>;
}

/// Local files through `tokio::fs`, http(s) through `reqwest`.
#[derive(Debug, Clone)]
pub struct DefaultFetcher {
    http: reqwest::Client,
    max_response_bytes: u64,
}

impl DefaultFetcher {
    pub fn new(config: &RefreshConfig) -> Result<Self, FetchError> {
        let mut builder = reqwest::Client::builder().user_agent(config.user_agent.clone());
        if let Some(timeout) = config.fetch_timeout() {
            builder = builder.timeout(timeout);
        }
        let http = builder
            .build()
            .map_err(|e| FetchError::Client(e.to_string()))?;

        Ok(Self {
            http,
            max_response_bytes: config.max_response_bytes,
        })
    }

    async fn read_file(&self, path: &Path) -> Result<Vec<u8>, FetchError> {
        let data = tokio::fs::read(path).await.map_err(|e| FetchError::File {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        if data.len() as u64 > self.max_response_bytes {
            return Err(FetchError::TooLarge {
                address: path.display().to_string(),
                limit: self.max_response_bytes,
            });
        }
        Ok(data)
    }

    async fn download(&self, endpoint: &Endpoint) -> Result<Vec<u8>, FetchError> {
        if endpoint.scheme() == Scheme::Ftp {
            return Err(FetchError::UnsupportedScheme {
                scheme: Scheme::Ftp.as_str().to_string(),
            });
        }

        let address = endpoint.as_str();
        let unreachable = |e: reqwest::Error| FetchError::Unreachable {
            address: address.to_string(),
            reason: e.to_string(),
        };
        let too_large = || FetchError::TooLarge {
            address: address.to_string(),
            limit: self.max_response_bytes,
        };

        let mut resp = self.http.get(address).send().await.map_err(unreachable)?;
        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::HttpStatus {
                address: address.to_string(),
                status: status.as_u16(),
            });
        }
        if let Some(len) = resp.content_length()
            && len > self.max_response_bytes
        {
            return Err(too_large());
        }

        let mut body = Vec::new();
        while let Some(chunk) = resp.chunk().await.map_err(unreachable)? {
            if (body.len() + chunk.len()) as u64 > self.max_response_bytes {
                return Err(too_large());
            }
            body.extend_from_slice(&chunk);
        }
        Ok(body)
    }
}

impl SourceFetcher for DefaultFetcher {
    fn fetch<'a>(&'a self, source: &'a ValidSource) -> BoxFuture<'a, Result<Vec<u8>, FetchError>> {
        Box::pin(async move {
            match source {
                ValidSource::File(path) => self.read_file(path).await,
                ValidSource::Endpoint(endpoint) => self.download(endpoint).await,
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use std::net::SocketAddr;

    use axum::Router;
    use axum::http::StatusCode;
    use axum::routing::get;

    use super::{DefaultFetcher, SourceFetcher};
    use crate::config::RefreshConfig;
    use crate::error::FetchError;
    use crate::source::{SourceDescriptor, SourceResolver, ValidSource};
    use crate::test_support::quake_feed;

    async fn serve(router: Router) -> SocketAddr {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind");
        let addr = listener.local_addr().expect("local addr");
        tokio::spawn(async move {
            axum::serve(listener, router).await.expect("serve");
        });
        addr
    }

    fn endpoint(address: &str) -> ValidSource {
        SourceResolver::new("")
            .validate(&SourceDescriptor::address(address))
            .expect("valid address")
    }

    #[tokio::test]
    async fn downloads_feed_over_http() {
        let addr = serve(Router::new().route(
            "/feed.geojson",
            get(|| async { quake_feed(&[(1.0, 2.0)]) }),
        ))
        .await;
        let fetcher = DefaultFetcher::new(&RefreshConfig::default()).expect("client");

        let body = fetcher
            .fetch(&endpoint(&format!("http://{addr}/feed.geojson")))
            .await
            .expect("fetch");
        assert_eq!(body, quake_feed(&[(1.0, 2.0)]));
    }

    #[tokio::test]
    async fn reports_http_errors_and_oversized_bodies() {
        let addr = serve(
            Router::new()
                .route("/down", get(|| async { (StatusCode::SERVICE_UNAVAILABLE, "busy") }))
                .route("/big", get(|| async { vec![b'x'; 4096] })),
        )
        .await;

        let fetcher = DefaultFetcher::new(&RefreshConfig::default()).expect("client");
        let err = fetcher
            .fetch(&endpoint(&format!("http://{addr}/down")))
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::HttpStatus { status: 503, .. }));

        let small = RefreshConfig {
            max_response_bytes: 1024,
            ..RefreshConfig::default()
        };
        let fetcher = DefaultFetcher::new(&small).expect("client");
        let err = fetcher
            .fetch(&endpoint(&format!("http://{addr}/big")))
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::TooLarge { limit: 1024, .. }));
    }

    #[tokio::test]
    async fn unreachable_host_is_io_failure() {
        // Bind then drop to get a port nothing listens on.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
        let addr = listener.local_addr().expect("addr");
        drop(listener);

        let fetcher = DefaultFetcher::new(&RefreshConfig::default()).expect("client");
        let err = fetcher
            .fetch(&endpoint(&format!("http://{addr}/feed")))
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Unreachable { .. }));
    }

    #[tokio::test]
    async fn ftp_is_validated_but_not_fetched() {
        let fetcher = DefaultFetcher::new(&RefreshConfig::default()).expect("client");
        let err = fetcher
            .fetch(&endpoint("ftp://files.example.org/overlay.json"))
            .await
            .unwrap_err();
        assert_eq!(
            err,
            FetchError::UnsupportedScheme {
                scheme: "ftp".to_string()
            }
        );
    }

    #[tokio::test]
    async fn reads_local_files() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("quakes.geojson");
        std::fs::write(&path, quake_feed(&[(10.0, 20.0)])).expect("write");

        let fetcher = DefaultFetcher::new(&RefreshConfig::default()).expect("client");
        let body = fetcher
            .fetch(&ValidSource::File(path.clone()))
            .await
            .expect("read");
        assert_eq!(body, quake_feed(&[(10.0, 20.0)]));

        std::fs::remove_file(&path).expect("remove");
        let err = fetcher.fetch(&ValidSource::File(path)).await.unwrap_err();
        assert!(matches!(err, FetchError::File { .. }));
    }
}
