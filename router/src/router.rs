//! Pattern dispatch and write authorization.

use std::collections::BTreeMap;

use entity::DataStore;
use tracing::debug;

use crate::crypto::PublicKey;
use crate::error::{Result, RouterError};
use crate::route::{Method, PreparedHandler, Route};

/// Routes grouped by method; within a method the first registered match
/// wins.
#[derive(Debug, Clone)]
pub struct Router {
    role_key: String,
    routes: BTreeMap<Method, Vec<Route>>,
}

impl Router {
    pub fn builder(role_key: impl Into<String>) -> RouterBuilder {
        RouterBuilder {
            role_key: role_key.into(),
            routes: Vec::new(),
        }
    }

    pub fn role_key(&self) -> &str {
        &self.role_key
    }

    pub fn routes(&self, method: Method) -> &[Route] {
        self.routes.get(&method).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Match `path` against the routes of `method`.
    ///
    /// `InvalidRoute` when only a route of another method matches,
    /// `RouteNotFound` when nothing does.
    pub fn route(&self, method: Method, path: &str) -> Result<PreparedHandler<'_>> {
        for route in self.routes(method) {
            if let Some(params) = route.pattern().matches(path) {
                debug!(path = %path, pattern = %route.pattern().as_str(), ?method, "Route matched");
                return Ok(PreparedHandler {
                    route,
                    path: path.to_string(),
                    params,
                    role_key: route.role_key().unwrap_or(&self.role_key),
                });
            }
        }

        let elsewhere = self
            .routes
            .iter()
            .filter(|(other, _)| **other != method)
            .flat_map(|(_, routes)| routes)
            .any(|route| route.pattern().matches(path).is_some());
        if elsewhere {
            Err(RouterError::InvalidRoute(format!(
                "{} does not accept {:?}",
                path, method
            )))
        } else {
            Err(RouterError::RouteNotFound(path.to_string()))
        }
    }

    /// A write needs a registered signer that belongs to the route's role
    /// and holds a write pattern matching the path.
    pub fn authorize(
        &self,
        store: &DataStore,
        prepared: &PreparedHandler<'_>,
        signer: &PublicKey,
    ) -> Result<()> {
        if !prepared.route.method().is_write() {
            return Ok(());
        }

        let signer = signer.to_hex();
        if !store.users().contains(&signer) {
            return Err(RouterError::Unauthenticated(format!(
                "{} is not a registered signer",
                signer
            )));
        }

        if !store.has_write_access(prepared.role_key, &signer, &prepared.path) {
            return Err(RouterError::Unauthorized(format!(
                "{} has no write access to {} in role {}",
                signer, prepared.path, prepared.role_key
            )));
        }
        Ok(())
    }
}

pub struct RouterBuilder {
    role_key: String,
    routes: Vec<Route>,
}

impl RouterBuilder {
    pub fn route(mut self, route: Route) -> Self {
        self.routes.push(route);
        self
    }

    pub fn routes(mut self, routes: impl IntoIterator<Item = Route>) -> Self {
        self.routes.extend(routes);
        self
    }

    pub fn build(self) -> Router {
        let mut routes: BTreeMap<Method, Vec<Route>> = BTreeMap::new();
        for route in self.routes {
            routes.entry(route.method()).or_default().push(route);
        }
        Router {
            role_key: self.role_key,
            routes,
        }
    }
}
