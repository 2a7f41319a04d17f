//! Router - signed dispatch and write authorization for the entity store
//!
//! Every write reaches the store as a [`TransactionRequest`]: a resource
//! addressed to a path, signed with the sender's Ed25519 key. The
//! [`Application`] matches the path against the [`Router`]'s
//! `<name|regex>` patterns, verifies the signature, checks that the signer
//! is registered and that its role may write to the path, then runs the
//! handler inside a store transaction. Whatever happens, the caller gets a
//! [`TransactionResponse`] with a [`ResultCode`].
//!
//! Reads go through [`Application::query`] and share a read lock on the last
//! committed state.
//!
//! ## Example
//!
//! ```ignore
//! let config = NodeConfig::load("node.yaml")?;
//! let registry = Registry::new().with_model::<Note>()?;
//! let app = Application::from_config(&config, registry)?;
//!
//! let proposal = ProposalPayload { keyname: "notes".into(), new_entity: Some(json), ..Default::default() };
//! let response = app.transact(&TransactionRequest::save("/requests", serde_json::to_vec(&proposal)?, &key));
//! assert!(response.code.is_success());
//! ```

pub mod application;
pub mod codes;
pub mod config;
pub mod controllers;
pub mod crypto;
pub mod error;
pub mod genesis;
pub mod pattern;
pub mod resource;
pub mod response;
pub mod route;
pub mod router;

pub use application::{Application, CommitResponse};
pub use codes::ResultCode;
pub use config::{NodeConfig, RouterConfig};
pub use controllers::{EntityControllers, GovernanceControllers, ProposalPayload, VotePayload};
pub use crypto::{PrivateKey, PublicKey, Signature};
pub use error::{Result, RouterError};
pub use genesis::{Genesis, GenesisRole, GenesisStakeholder};
pub use pattern::{Params, RoutePattern};
pub use resource::{QueryRequest, Resource, ResourcePointer, TransactionPayload, TransactionRequest};
pub use response::{QueryResponse, TransactionResponse};
pub use route::{Handler, Method, QueryContext, Route, TransactionContext};
pub use router::{Router, RouterBuilder};
