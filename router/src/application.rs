//! Transaction and query dispatch over one shared store.
//!
//! ```text
//! transact(request)
//!   route(method, path)          RouteNotFound / InvalidRoute
//!   verify signature             Unauthenticated
//!   authorize(role, path)        Unauthenticated / Unauthorized
//!   handler in a transaction     error or panic rolls the store back
//!
//! query(request)                 read lock, last committed state
//! ```
//!
//! Writes hold the write lock for the whole dispatch, so at most one
//! transaction runs at a time while queries share the read side.

use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use entity::{DataStore, Registry};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::codes::ResultCode;
use crate::config::NodeConfig;
use crate::controllers::{EntityControllers, GovernanceControllers};
use crate::crypto::PublicKey;
use crate::error::{Result, RouterError};
use crate::resource::{QueryRequest, TransactionPayload, TransactionRequest};
use crate::response::{QueryResponse, TransactionResponse};
use crate::route::{Handler, Method, QueryContext, TransactionContext};
use crate::router::Router;

/// Result of [`Application::commit`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(ts_rs::TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub struct CommitResponse {
    pub height: u64,
    /// Store head hash, hex encoded
    pub app_hash: String,
}

#[derive(Debug, Default)]
struct ChainState {
    height: u64,
    app_hash: String,
}

pub struct Application {
    store: RwLock<DataStore>,
    registry: Arc<Registry>,
    router: Router,
    chain: Mutex<ChainState>,
}

impl Application {
    pub fn new(store: DataStore, registry: Arc<Registry>, router: Router) -> Self {
        Self {
            store: RwLock::new(store),
            registry,
            router,
            chain: Mutex::new(ChainState::default()),
        }
    }

    /// Build a node: empty store with the configured codec, genesis applied,
    /// governance routes plus entity routes for every registered type.
    pub fn from_config(config: &NodeConfig, registry: Registry) -> Result<Self> {
        let mut store = DataStore::new(config.store.codec);
        config.genesis.apply(&mut store, &registry)?;

        let page_size = config.store.default_page_size;
        let price = config.router.gas_price_per_kb;
        let mut builder = Router::builder(config.router.role_key.clone()).routes(
            GovernanceControllers::new(config.governance.clone(), page_size, price).routes()?,
        );
        for (keyname, representation) in registry.iter() {
            let controllers = EntityControllers::new(representation.clone(), page_size, price);
            let routes = controllers.routes()?;
            debug!(keyname, prefix = controllers.prefix(), routes = routes.len(), "Mounted entity routes");
            builder = builder.routes(
                routes
                    .into_iter()
                    .map(|route| route.with_role(config.router.trusted_role_key.clone())),
            );
        }

        info!(
            entity_types = registry.keynames().count(),
            codec = ?config.store.codec,
            "Application ready"
        );
        Ok(Self::new(store, Arc::new(registry), builder.build()))
    }

    pub fn router(&self) -> &Router {
        &self.router
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Execute a signed write. Never fails: every error is a typed response.
    pub fn transact(&self, request: &TransactionRequest) -> TransactionResponse {
        let mut store = match self.store.write() {
            Ok(store) => store,
            Err(_) => {
                return TransactionResponse::from(RouterError::Server("store lock poisoned".into()))
            }
        };
        self.dispatch(&mut store, request)
    }

    /// Run `request` against a copy of the store and report what it would
    /// return. The shared store is left untouched.
    pub fn check_transact(&self, request: &TransactionRequest) -> TransactionResponse {
        let mut scratch = match self.store.read() {
            Ok(store) => store.clone(),
            Err(_) => {
                return TransactionResponse::from(RouterError::Server("store lock poisoned".into()))
            }
        };
        self.dispatch(&mut scratch, request)
    }

    fn dispatch(&self, store: &mut DataStore, request: &TransactionRequest) -> TransactionResponse {
        let path = request.pointer().path.as_str();
        match self.execute(store, request) {
            Ok(response) => {
                info!(path, signer = %request.signer(), gas_used = response.gas_used, "Transaction applied");
                response
            }
            Err(err) => {
                warn!(path, signer = %request.signer(), error = %err, "Transaction rejected");
                TransactionResponse::from(err)
            }
        }
    }

    fn execute(&self, store: &mut DataStore, request: &TransactionRequest) -> Result<TransactionResponse> {
        let method = match &request.payload {
            TransactionPayload::Save { .. } => Method::Save,
            TransactionPayload::Delete { .. } => Method::Delete,
        };
        let prepared = self.router.route(method, &request.pointer().path)?;

        if !request.is_signature_valid() {
            return Err(RouterError::Unauthenticated(format!(
                "bad signature from {}",
                request.signer()
            )));
        }
        self.router.authorize(store, &prepared, request.signer())?;

        let registry = self.registry.as_ref();
        let signer: &PublicKey = request.signer();
        store.transaction(|store| {
            let mut ctx = TransactionContext {
                store,
                registry,
                signer,
                path: &prepared.path,
                params: &prepared.params,
                signature: &request.signature,
                role_key: prepared.role_key,
            };
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
                match (prepared.route.handler(), &request.payload) {
                    (Handler::Save(handler), TransactionPayload::Save { resource }) => {
                        handler(&mut ctx, &resource.data)
                    }
                    (Handler::Delete(handler), TransactionPayload::Delete { .. }) => handler(&mut ctx),
                    _ => Err(RouterError::InvalidRoute(format!(
                        "{:?} handler cannot take this payload",
                        prepared.route.method()
                    ))),
                }
            }));
            outcome.unwrap_or_else(|payload| Err(RouterError::Server(panic_message(payload.as_ref()))))
        })
    }

    /// Answer a signed read from the last committed state.
    pub fn query(&self, request: &QueryRequest) -> QueryResponse {
        let path = request.pointer.path.as_str();
        let store = match self.store.read() {
            Ok(store) => store,
            Err(_) => {
                return QueryResponse::failure(ResultCode::ServerError, path, "store lock poisoned")
            }
        };

        let result = self.router.route(Method::Retrieve, path).and_then(|prepared| {
            let Handler::Query(handler) = prepared.route.handler() else {
                return Err(RouterError::InvalidRoute(path.to_string()));
            };
            let ctx = QueryContext {
                store: &*store,
                registry: self.registry.as_ref(),
                signer: &request.pointer.from,
                path,
                params: &prepared.params,
                signature_valid: request.is_signature_valid(),
            };
            panic::catch_unwind(AssertUnwindSafe(|| handler(&ctx)))
                .unwrap_or_else(|payload| Err(RouterError::Server(panic_message(payload.as_ref()))))
        });

        match result {
            Ok(response) => response,
            Err(err) => {
                debug!(path, error = %err, "Query failed");
                QueryResponse::failure(err.code(), path, err.to_string())
            }
        }
    }

    /// Close the current block: bump the height and report the head hash.
    pub fn commit(&self) -> CommitResponse {
        let app_hash = self.head_hash();
        let mut chain = self.chain.lock().unwrap_or_else(PoisonError::into_inner);
        chain.height += 1;
        chain.app_hash = app_hash;
        info!(height = chain.height, app_hash = %chain.app_hash, "Committed");
        CommitResponse {
            height: chain.height,
            app_hash: chain.app_hash.clone(),
        }
    }

    pub fn head_hash(&self) -> String {
        self.store
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .head_hash()
    }

    /// Run `f` against the committed store.
    pub fn read<T>(&self, f: impl FnOnce(&DataStore, &Registry) -> T) -> T {
        let store = self.store.read().unwrap_or_else(PoisonError::into_inner);
        f(&*store, self.registry.as_ref())
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    let message = payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string());
    format!("handler panicked: {}", message)
}
