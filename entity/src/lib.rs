//! Entity - typed records over a tag-indexed, transactional store
//!
//! The store knows nothing about concrete record types. Each type describes
//! itself once through [`Model`]; [`ModelRepresentation`] adapts that into
//! the object-safe [`MetaData`] / [`Representation`] pair that the
//! [`Repository`] (reads) and [`Service`] (writes) consume.
//!
//! ## Indexing
//!
//! Every saved instance is registered under each tag its representation
//! returns. A tag is an insertion-ordered set of IDs, so set queries and
//! intersections come back in the same order on every replica.
//!
//! ## Atomicity
//!
//! [`Service::save`] and [`Service::delete`] run their hooks inside a
//! [`DataStore::transaction`]; a failure anywhere in a cascade rolls back
//! the whole cascade.

pub mod codec;
pub mod config;
pub mod datastore;
pub mod error;
pub mod model;
pub mod partial_set;
pub mod registry;
pub mod repository;
pub mod representation;
pub mod service;

pub use codec::Codec;
pub use config::StoreConfig;
pub use datastore::{DataStore, Role, Roles, TagSets, Users};
pub use error::{EntityError, Result};
pub use model::{downcast, object_key, DynEntity, Entity, Model};
pub use partial_set::{NormalizedPartialSet, PartialSet, UNBOUNDED};
pub use registry::Registry;
pub use repository::Repository;
pub use representation::{MetaData, ModelRepresentation, Payload, Representation};
pub use service::Service;
pub use uuid::Uuid;
