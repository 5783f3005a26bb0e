//! Integration test harness for Aurelia.
//!
//! Each test starts its own storefront on an ephemeral port with a fresh
//! in-memory store, so tests are independent and need no database.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p aurelia-integration-tests
//! ```

use std::net::SocketAddr;

use aurelia_storefront::config::StorefrontConfig;
use aurelia_storefront::db::{Db, ProductRepository};
use aurelia_storefront::state::AppState;
use reqwest::{Client, Response};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::net::TcpListener;
use tokio::sync::oneshot;

use aurelia_core::ApiResponse;

/// A storefront running in the background of the current test.
///
/// The server shuts down when this is dropped.
pub struct TestServer {
    pub client: Client,
    addr: SocketAddr,
    db: Db,
    shutdown: Option<oneshot::Sender<()>>,
}

impl TestServer {
    /// Start a storefront with default configuration.
    ///
    /// # Panics
    ///
    /// Panics if the listener cannot be bound.
    pub async fn start() -> Self {
        Self::start_with(StorefrontConfig::default()).await
    }

    /// Start a storefront with `config`. Host and port are ignored.
    ///
    /// The catalog is seeded before the server accepts requests, as the
    /// binary does on startup.
    ///
    /// # Panics
    ///
    /// Panics if the listener cannot be bound or seeding fails.
    #[allow(clippy::expect_used)]
    pub async fn start_with(config: StorefrontConfig) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test listener");
        let addr = listener.local_addr().expect("Listener has no address");

        let db = Db::memory();
        ProductRepository::new(&db)
            .ensure_seed()
            .await
            .expect("Failed to seed catalog");
        let state = AppState::new(config, db.clone());
        let (tx, rx) = oneshot::channel::<()>();
        tokio::spawn(aurelia_storefront::serve(listener, state, async move {
            let _ = rx.await;
        }));

        Self {
            client: Client::new(),
            addr,
            db,
            shutdown: Some(tx),
        }
    }

    /// Absolute URL for `path`.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{path}", self.addr)
    }

    /// The store behind the server, for assertions that bypass HTTP.
    #[must_use]
    pub const fn db(&self) -> &Db {
        &self.db
    }

    /// GET `path`.
    ///
    /// # Panics
    ///
    /// Panics if the request cannot be sent.
    #[allow(clippy::expect_used)]
    pub async fn get(&self, path: &str) -> Response {
        self.client
            .get(self.url(path))
            .send()
            .await
            .expect("GET failed")
    }

    /// POST `body` as JSON to `path`.
    ///
    /// # Panics
    ///
    /// Panics if the request cannot be sent.
    #[allow(clippy::expect_used)]
    pub async fn post<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Response {
        self.client
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .expect("POST failed")
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}

/// Decode a success envelope and return its data.
///
/// # Panics
///
/// Panics if the body is not a success envelope carrying `T`.
#[allow(clippy::expect_used)]
pub async fn data<T: DeserializeOwned>(response: Response) -> T {
    let status = response.status();
    let body: ApiResponse<T> = response.json().await.expect("Body is not an envelope");
    assert!(body.success, "expected success, got {status} {:?}", body.error);
    body.data.expect("Success envelope without data")
}

/// Decode an error envelope and return its message.
///
/// # Panics
///
/// Panics if the body is not an error envelope.
#[allow(clippy::expect_used)]
pub async fn error_message(response: Response) -> String {
    let body: Value = response.json().await.expect("Body is not JSON");
    assert_eq!(body["success"], false, "expected failure, got {body}");
    body["error"]
        .as_str()
        .expect("Error envelope without message")
        .to_string()
}
