#![allow(dead_code)]

use entity::{impl_entity, EntityError, Model, NormalizedPartialSet, Registry, Repository, Result, Service, Uuid};
use governance::ThresholdPolicy;
use router::{
    Application, Genesis, GenesisRole, GenesisStakeholder, NodeConfig, PrivateKey, ProposalPayload,
    QueryRequest, QueryResponse, TransactionRequest, TransactionResponse, VotePayload,
};
use serde::{Deserialize, Serialize};

/// A record type the node stores, unique by title.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    pub id: Uuid,
    pub title: String,
    pub body: String,
}

impl_entity!(Note);

impl Note {
    pub fn new(n: u128, title: &str) -> Self {
        Self {
            id: Uuid::from_u128(0xa0_0000 + n),
            title: title.to_string(),
            body: format!("about {}", title),
        }
    }

    pub fn by_title(title: &str) -> String {
        format!("notes:by_title:{}", title)
    }
}

impl Model for Note {
    const NAME: &'static str = "Note";
    const KEYNAME: &'static str = "notes";

    type Storable = Note;
    type Normalized = Note;

    fn to_storable(&self) -> Result<Note> {
        Ok(self.clone())
    }

    fn from_storable(_repository: &Repository<'_>, storable: Note) -> Result<Self> {
        Ok(storable)
    }

    fn normalize(&self) -> Result<Note> {
        Ok(self.clone())
    }

    fn denormalize(normalized: Note, _registry: &Registry) -> Result<Self> {
        Ok(normalized)
    }

    fn keynames(&self) -> Vec<String> {
        vec![Self::KEYNAME.to_string(), Self::by_title(&self.title)]
    }

    fn on_save(&self, service: &mut Service<'_>) -> Result<()> {
        if service.repository().count(&Self::by_title(&self.title)) > 0 {
            return Err(EntityError::AlreadyExists(format!("note titled {}", self.title)));
        }
        Ok(())
    }
}

/// Signing keys of everyone the tests talk as.
pub struct Keys {
    pub alice: PrivateKey,
    pub bob: PrivateKey,
    pub carol: PrivateKey,
    pub dave: PrivateKey,
    /// Registered stakeholder outside every role
    pub erin: PrivateKey,
    /// Member of the trusted role
    pub root: PrivateKey,
    /// Not registered at all
    pub outsider: PrivateKey,
}

impl Keys {
    pub fn new() -> Self {
        Self {
            alice: PrivateKey::from_bytes([1; 32]),
            bob: PrivateKey::from_bytes([2; 32]),
            carol: PrivateKey::from_bytes([3; 32]),
            dave: PrivateKey::from_bytes([4; 32]),
            erin: PrivateKey::from_bytes([5; 32]),
            root: PrivateKey::from_bytes([9; 32]),
            outsider: PrivateKey::from_bytes([7; 32]),
        }
    }
}

fn stakeholder(name: &str, key: &PrivateKey, shares: u64) -> GenesisStakeholder {
    GenesisStakeholder {
        name: name.to_string(),
        public_key: key.public_key().to_hex(),
        shares,
    }
}

/// alice 60, bob 50, carol 30, dave 75 vote on requests with a fixed
/// threshold of 100; root may write notes directly.
pub fn config(keys: &Keys) -> NodeConfig {
    let mut config = NodeConfig::default();
    config.governance.threshold = ThresholdPolicy::Fixed { power: 100 };
    config.genesis = Genesis {
        stakeholders: vec![
            stakeholder("alice", &keys.alice, 60),
            stakeholder("bob", &keys.bob, 50),
            stakeholder("carol", &keys.carol, 30),
            stakeholder("dave", &keys.dave, 75),
            stakeholder("erin", &keys.erin, 10),
            stakeholder("root", &keys.root, 0),
        ],
        roles: vec![
            GenesisRole {
                key: "stakeholders".into(),
                members: vec!["alice".into(), "bob".into(), "carol".into(), "dave".into()],
                write_patterns: vec!["/requests(/.*)?".into()],
            },
            GenesisRole {
                key: "administrators".into(),
                members: vec!["root".into()],
                write_patterns: vec!["/notes".into()],
            },
        ],
    };
    config
}

pub fn registry() -> Registry {
    Registry::new().with_model::<Note>().unwrap()
}

pub fn node() -> (Application, Keys) {
    let keys = Keys::new();
    let app = Application::from_config(&config(&keys), registry()).unwrap();
    (app, keys)
}

pub fn propose_save(app: &Application, key: &PrivateKey, note: &Note) -> TransactionResponse {
    let payload = ProposalPayload {
        keyname: Note::KEYNAME.into(),
        reason: format!("add {}", note.title),
        new_entity: Some(serde_json::to_value(note).unwrap()),
        ..Default::default()
    };
    app.transact(&TransactionRequest::save(
        "/requests",
        serde_json::to_vec(&payload).unwrap(),
        key,
    ))
}

pub fn propose_delete(app: &Application, key: &PrivateKey, id: Uuid) -> TransactionResponse {
    let payload = ProposalPayload {
        keyname: Note::KEYNAME.into(),
        reason: "remove".into(),
        target_id: Some(id),
        ..Default::default()
    };
    app.transact(&TransactionRequest::save(
        "/requests",
        serde_json::to_vec(&payload).unwrap(),
        key,
    ))
}

pub fn vote(app: &Application, key: &PrivateKey, request: Uuid, approve: bool) -> TransactionResponse {
    let payload = VotePayload {
        reason: if approve { "yes".into() } else { "no".into() },
        is_approved: approve,
        ..Default::default()
    };
    app.transact(&TransactionRequest::save(
        format!("/requests/{}/votes", request),
        serde_json::to_vec(&payload).unwrap(),
        key,
    ))
}

/// ID of the active request opened by a successful proposal.
pub fn opened(response: &TransactionResponse) -> Uuid {
    assert!(response.code.is_success(), "proposal failed: {}", response.log);
    let key = response
        .tags
        .keys()
        .find_map(|key| key.strip_prefix("/requests/"))
        .expect("proposal response has a request tag");
    Uuid::parse_str(key).unwrap()
}

pub fn query(app: &Application, path: &str) -> QueryResponse {
    app.query(&QueryRequest::new(path, &PrivateKey::from_bytes([42; 32])))
}

pub fn page(response: &QueryResponse) -> NormalizedPartialSet {
    assert!(response.code.is_success(), "query failed: {}", response.log);
    response.json().unwrap()
}
