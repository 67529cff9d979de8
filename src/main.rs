//! Demo application: a small user service assembled on the runtime.
//!
//! Shows the intended wiring: beans in the registry (metrics collector, a
//! store behind a trait, a service on top), routes on the router, the
//! middleware chain in its documented order, and a transactional write path
//! with explicitly passed contexts.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use axum::http::{Method, StatusCode};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::Mutex;
use std::time::Duration;
use tokio::net::TcpListener;

use chassis::config::{load_config, RuntimeConfig};
use chassis::container::{Bean, Registry, ResolveError};
use chassis::http::{HttpServer, Request, Response};
use chassis::observability::{logging, MetricsCollector};
use chassis::pipeline::{
    AccessLog, Authenticator, BearerAuth, BodyLimit, Cors, Pipeline, Principal, RateLimit,
    RequestIdMiddleware, SecurityHeaders,
};
use chassis::routing::{handler, Router};
use chassis::tx::{TransactionScope, TxDriver};

#[derive(Debug, Clone, Serialize, Deserialize)]
struct User {
    id: String,
    name: String,
}

/// Read side of the user store.
trait UserStore: Send + Sync {
    fn get(&self, id: &str) -> Option<User>;
}

/// Committed users plus the transactional write path.
#[derive(Default)]
struct MemoryStore {
    users: DashMap<String, User>,
}

impl UserStore for MemoryStore {
    fn get(&self, id: &str) -> Option<User> {
        self.users.get(id).map(|entry| entry.clone())
    }
}

/// Transaction handle over the store: writes stage here and land in the
/// store only on commit.
struct StoreTxn {
    store: Arc<MemoryStore>,
    staged: Mutex<Vec<User>>,
}

impl StoreTxn {
    fn insert(&self, user: User) {
        self.staged.lock().expect("staged lock poisoned").push(user);
    }
}

struct StoreDriver {
    store: Arc<MemoryStore>,
}

#[async_trait]
impl TxDriver for StoreDriver {
    type Handle = StoreTxn;
    type Error = std::io::Error;

    async fn acquire(&self) -> Result<StoreTxn, std::io::Error> {
        Ok(StoreTxn {
            store: self.store.clone(),
            staged: Mutex::new(Vec::new()),
        })
    }

    async fn commit(&self, handle: &StoreTxn) -> Result<(), std::io::Error> {
        let staged = std::mem::take(&mut *handle.staged.lock().expect("staged lock poisoned"));
        for user in staged {
            handle.store.users.insert(user.id.clone(), user);
        }
        Ok(())
    }

    async fn rollback(&self, handle: &StoreTxn) -> Result<(), std::io::Error> {
        handle.staged.lock().expect("staged lock poisoned").clear();
        Ok(())
    }
}

/// Accepts the token from `CHASSIS_API_TOKEN`.
struct EnvTokenAuthenticator {
    token: String,
}

impl Authenticator for EnvTokenAuthenticator {
    fn authenticate(&self, token: &str) -> Option<Principal> {
        (token == self.token).then(|| Principal {
            subject: "api-client".to_string(),
            roles: vec!["user".to_string()],
        })
    }
}

fn build_registry() -> Registry {
    let registry = Registry::new();
    registry.register_singleton(MetricsCollector::new());
    registry.register(
        Bean::singleton(|_| Ok(MemoryStore::default()))
            .implements(|s: Arc<MemoryStore>| s as Arc<dyn UserStore>),
    );
    registry.register(
        Bean::singleton(|r| {
            Ok(StoreDriver {
                store: r.resolve()?,
            })
        })
        .depends_on::<MemoryStore>(),
    );
    registry.register(
        Bean::singleton(|r| -> Result<TransactionScope<StoreDriver>, ResolveError> {
            Ok(TransactionScope::new(r.resolve()?))
        })
        .depends_on::<StoreDriver>(),
    );
    registry
}

fn build_router(registry: &Registry) -> Result<Router, Box<dyn std::error::Error>> {
    let mut router = Router::new();

    router.add_route(
        Method::GET,
        "/health",
        handler(|_req| async { Ok(Response::text(StatusCode::OK, "ok")) }),
    );

    let metrics = registry.resolve::<MetricsCollector>()?;
    router.add_route(
        Method::GET,
        "/metrics",
        handler(move |_req| {
            let metrics = metrics.clone();
            async move { Ok(Response::json(StatusCode::OK, &metrics.snapshot())) }
        }),
    );

    let store = registry.resolve::<dyn UserStore>()?;
    router.add_route(
        Method::GET,
        "/users/{id}",
        handler(move |req| {
            let store = store.clone();
            async move {
                let id = req.path_params.get("id").unwrap_or_default();
                match store.get(id) {
                    Some(user) => Ok(Response::json(StatusCode::OK, &user)),
                    None => Ok(Response::not_found()),
                }
            }
        }),
    );

    let scope = registry.resolve::<TransactionScope<StoreDriver>>()?;
    router.add_route(
        Method::POST,
        "/users",
        handler(move |req| {
            let scope = scope.clone();
            async move {
                let user: User = match serde_json::from_slice(&req.body) {
                    Ok(user) => user,
                    Err(err) => {
                        tracing::debug!(error = %err, "rejecting malformed user payload");
                        return Ok(Response::json(
                            StatusCode::BAD_REQUEST,
                            &serde_json::json!({"error": "Bad Request"}),
                        ));
                    }
                };
                let created = user.clone();
                scope
                    .run_in_transaction(None, move |tx| {
                        Box::pin(async move {
                            tx.handle().insert(user);
                            Ok::<_, std::io::Error>(())
                        })
                    })
                    .await?;
                Ok(Response::json(StatusCode::CREATED, &created))
            }
        }),
    );

    Ok(router)
}

fn build_pipeline(
    config: &RuntimeConfig,
    registry: &Registry,
    router: Router,
) -> Result<Pipeline, Box<dyn std::error::Error>> {
    let metrics = registry.resolve::<MetricsCollector>()?;

    // Chain order is a correctness requirement; see the pipeline docs.
    let mut builder = Pipeline::builder()
        .with(RequestIdMiddleware)
        .with(AccessLog::new(
            metrics,
            Duration::from_millis(config.observability.slow_request_ms),
        ))
        .with(SecurityHeaders);

    if config.cors.enabled {
        builder = builder.with(Cors::new(
            config.cors.allowed_origins.clone(),
            config.cors.allow_credentials,
        ));
    }

    builder = builder.with(BodyLimit::new(config.limits.max_body_bytes));

    if config.rate_limit.enabled {
        builder = builder.with(RateLimit::new(
            config.rate_limit.requests_per_second,
            config.rate_limit.burst_size,
        ));
    }

    if config.auth.enabled {
        let token = std::env::var("CHASSIS_API_TOKEN")
            .map_err(|_| "auth enabled but CHASSIS_API_TOKEN is not set")?;
        builder = builder.with(BearerAuth::new(
            Arc::new(EnvTokenAuthenticator { token }),
            config.auth.public_paths.clone(),
        ));
    }

    Ok(builder.build(Arc::new(router)))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = match std::env::var("CHASSIS_CONFIG") {
        Ok(path) => load_config(Path::new(&path))?,
        Err(_) => RuntimeConfig::default(),
    };

    logging::init(&config.observability.log_filter);
    tracing::info!(
        bind_address = %config.listener.bind_address,
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    let registry = build_registry();
    registry.verify()?;

    let router = build_router(&registry)?;
    let pipeline = build_pipeline(&config, &registry, router)?;

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let server = HttpServer::new(&config, Arc::new(pipeline));
    server.run(listener).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
