#![allow(dead_code)]

use entity::{
    impl_entity, DataStore, EntityError, Model, Registry, Repository,
    Result, Service, Uuid,
};
use governance::{
    ActiveRequest, ActiveVote, Group, Keyname, Proposal, Request, RequestService, User, Vote,
    VoteChoice,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// A proposable record used only by the tests.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: Uuid,
    pub name: String,
    pub title: String,
}

impl_entity!(Project);

impl Project {
    pub fn new(n: u128, name: &str) -> Self {
        Self {
            id: Uuid::from_u128(0xbeef_0000 + n),
            name: name.to_string(),
            title: format!("Project {}", name),
        }
    }
}

impl Model for Project {
    const NAME: &'static str = "Project";
    const KEYNAME: &'static str = "projects";

    type Storable = Project;
    type Normalized = Project;

    fn to_storable(&self) -> Result<Project> {
        Ok(self.clone())
    }

    fn from_storable(_repository: &Repository<'_>, storable: Project) -> Result<Self> {
        Ok(storable)
    }

    fn normalize(&self) -> Result<Project> {
        Ok(self.clone())
    }

    fn denormalize(normalized: Project, _registry: &Registry) -> Result<Self> {
        Ok(normalized)
    }

    fn keynames(&self) -> Vec<String> {
        vec![
            Self::KEYNAME.to_string(),
            format!("projects:by_name:{}", self.name),
        ]
    }

    fn on_save(&self, service: &mut Service<'_>) -> Result<()> {
        if service
            .repository()
            .count(&format!("projects:by_name:{}", self.name))
            > 0
        {
            return Err(EntityError::AlreadyExists(format!("project {}", self.name)));
        }
        Ok(())
    }
}

pub fn registry() -> Registry {
    Registry::new().with_model::<Project>().unwrap()
}

pub struct Fixture {
    pub store: DataStore,
    pub registry: Registry,
    pub users: Vec<User>,
}

impl Fixture {
    /// A store holding one stakeholder per `(name, shares)`.
    pub fn with_stakeholders(stakeholders: &[(&str, u64)]) -> Self {
        let registry = registry();
        let mut store = DataStore::default();
        let users = stakeholders
            .iter()
            .enumerate()
            .map(|(i, (name, shares))| User::new(*name, format!("{:064x}", i + 1), *shares))
            .collect::<Vec<_>>();
        {
            let mut service = Service::new(&mut store, &registry);
            for user in &users {
                service.insert(user).unwrap();
            }
        }
        Self {
            store,
            registry,
            users,
        }
    }

    pub fn user(&self, name: &str) -> User {
        self.users.iter().find(|u| u.name == name).cloned().unwrap()
    }

    pub fn keyname(&self) -> Keyname {
        Keyname::named(Group::named("core"), "projects")
    }

    pub fn request(&self, n: u128, from: &str, proposal: Proposal) -> Request {
        Request::new(
            Uuid::from_u128(0x1000 + n),
            self.user(from),
            proposal,
            "because",
            self.keyname(),
            &self.registry,
        )
        .unwrap()
    }

    pub fn open(&mut self, request: Request, threshold: u64) -> ActiveRequest {
        let active = ActiveRequest::new(request, threshold);
        RequestService::new(&mut self.store, &self.registry)
            .save(&active)
            .unwrap();
        active
    }

    pub fn ballot(&self, n: u128, active: &ActiveRequest, voter: &str, choice: VoteChoice) -> ActiveVote {
        let voter = self.user(voter);
        let power = voter.shares;
        ActiveVote::new(
            Vote {
                id: Uuid::from_u128(0x2000 + n),
                request: active.clone(),
                voter,
                reason: String::new(),
                choice,
            },
            power,
        )
    }

    pub fn repository(&self) -> Repository<'_> {
        Repository::new(&self.store, &self.registry)
    }

    pub fn project_representation(&self) -> Arc<dyn entity::Representation> {
        self.registry.representation(Project::KEYNAME).unwrap().clone()
    }
}
