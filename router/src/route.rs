//! Routes and their handlers.

use std::fmt;
use std::sync::Arc;

use entity::{DataStore, Registry, Repository, Service};

use crate::crypto::{PublicKey, Signature};
use crate::error::Result;
use crate::pattern::{Params, RoutePattern};
use crate::response::{QueryResponse, TransactionResponse};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Method {
    Save,
    Delete,
    Retrieve,
}

impl Method {
    pub fn is_write(&self) -> bool {
        !matches!(self, Method::Retrieve)
    }
}

/// Everything a write handler may use.
pub struct TransactionContext<'a> {
    pub store: &'a mut DataStore,
    pub registry: &'a Registry,
    pub signer: &'a PublicKey,
    pub path: &'a str,
    pub params: &'a Params,
    pub signature: &'a Signature,
    /// Role the write was authorized against
    pub role_key: &'a str,
}

impl TransactionContext<'_> {
    pub fn service(&mut self) -> Service<'_> {
        Service::new(&mut *self.store, self.registry)
    }

    pub fn repository(&self) -> Repository<'_> {
        Repository::new(&*self.store, self.registry)
    }
}

/// Everything a read handler may use.
pub struct QueryContext<'a> {
    pub store: &'a DataStore,
    pub registry: &'a Registry,
    pub signer: &'a PublicKey,
    pub path: &'a str,
    pub params: &'a Params,
    /// Queries are not rejected for a bad signature; handlers that care
    /// check this.
    pub signature_valid: bool,
}

impl QueryContext<'_> {
    pub fn repository(&self) -> Repository<'_> {
        Repository::new(self.store, self.registry)
    }
}

pub type SaveTransactionFn =
    Arc<dyn Fn(&mut TransactionContext<'_>, &[u8]) -> Result<TransactionResponse> + Send + Sync>;
pub type DeleteTransactionFn =
    Arc<dyn Fn(&mut TransactionContext<'_>) -> Result<TransactionResponse> + Send + Sync>;
pub type QueryFn = Arc<dyn Fn(&QueryContext<'_>) -> Result<QueryResponse> + Send + Sync>;

pub fn save_handler<F>(f: F) -> SaveTransactionFn
where
    F: Fn(&mut TransactionContext<'_>, &[u8]) -> Result<TransactionResponse> + Send + Sync + 'static,
{
    Arc::new(f)
}

pub fn delete_handler<F>(f: F) -> DeleteTransactionFn
where
    F: Fn(&mut TransactionContext<'_>) -> Result<TransactionResponse> + Send + Sync + 'static,
{
    Arc::new(f)
}

pub fn query_handler<F>(f: F) -> QueryFn
where
    F: Fn(&QueryContext<'_>) -> Result<QueryResponse> + Send + Sync + 'static,
{
    Arc::new(f)
}

#[derive(Clone)]
pub enum Handler {
    Save(SaveTransactionFn),
    Delete(DeleteTransactionFn),
    Query(QueryFn),
}

impl Handler {
    pub fn method(&self) -> Method {
        match self {
            Handler::Save(_) => Method::Save,
            Handler::Delete(_) => Method::Delete,
            Handler::Query(_) => Method::Retrieve,
        }
    }
}

#[derive(Clone)]
pub struct Route {
    pattern: RoutePattern,
    handler: Handler,
    role_key: Option<String>,
}

impl Route {
    pub fn new(pattern: &str, handler: Handler) -> Result<Self> {
        Ok(Self {
            pattern: RoutePattern::parse(pattern)?,
            handler,
            role_key: None,
        })
    }

    pub fn save<F>(pattern: &str, handler: F) -> Result<Self>
    where
        F: Fn(&mut TransactionContext<'_>, &[u8]) -> Result<TransactionResponse> + Send + Sync + 'static,
    {
        Self::new(pattern, Handler::Save(save_handler(handler)))
    }

    pub fn delete<F>(pattern: &str, handler: F) -> Result<Self>
    where
        F: Fn(&mut TransactionContext<'_>) -> Result<TransactionResponse> + Send + Sync + 'static,
    {
        Self::new(pattern, Handler::Delete(delete_handler(handler)))
    }

    pub fn query<F>(pattern: &str, handler: F) -> Result<Self>
    where
        F: Fn(&QueryContext<'_>) -> Result<QueryResponse> + Send + Sync + 'static,
    {
        Self::new(pattern, Handler::Query(query_handler(handler)))
    }

    /// Authorize writes against `role_key` instead of the router default.
    pub fn with_role(mut self, role_key: impl Into<String>) -> Self {
        self.role_key = Some(role_key.into());
        self
    }

    pub fn pattern(&self) -> &RoutePattern {
        &self.pattern
    }

    pub fn handler(&self) -> &Handler {
        &self.handler
    }

    pub fn role_key(&self) -> Option<&str> {
        self.role_key.as_deref()
    }

    pub fn method(&self) -> Method {
        self.handler.method()
    }
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("pattern", &self.pattern)
            .field("method", &self.method())
            .field("role_key", &self.role_key)
            .finish()
    }
}

/// A route matched against a concrete path.
#[derive(Debug)]
pub struct PreparedHandler<'r> {
    pub route: &'r Route,
    pub path: String,
    pub params: Params,
    /// Role writes are authorized against
    pub role_key: &'r str,
}
