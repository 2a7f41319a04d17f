use entity::{impl_entity, EntityError, Model, Registry, Repository, Result, Service};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{NormalizedRequest, Request};
use crate::ids;

/// A request open for voting, with the approval threshold fixed when it
/// was proposed.
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveRequest {
    pub id: Uuid,
    pub request: Request,
    pub threshold: u64,
}

impl_entity!(ActiveRequest);

#[derive(Debug, Serialize, Deserialize)]
pub struct StorableActiveRequest {
    pub id: Uuid,
    pub request_id: Uuid,
    pub threshold: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedActiveRequest {
    pub id: Uuid,
    pub request: NormalizedRequest,
    pub threshold: u64,
}

impl ActiveRequest {
    pub fn new(request: Request, threshold: u64) -> Self {
        Self {
            id: ids::active_request_id(request.id),
            request,
            threshold,
        }
    }

    pub fn by_request(request_id: Uuid) -> String {
        format!("{}:by_request:{}", Self::KEYNAME, request_id)
    }

    pub fn by_from(user_id: Uuid) -> String {
        format!("{}:by_from:{}", Self::KEYNAME, user_id)
    }

    pub fn by_keyname(keyname_id: Uuid) -> String {
        format!("{}:by_keyname:{}", Self::KEYNAME, keyname_id)
    }
}

impl Model for ActiveRequest {
    const NAME: &'static str = "ActiveRequest";
    const KEYNAME: &'static str = "active_requests";

    type Storable = StorableActiveRequest;
    type Normalized = NormalizedActiveRequest;

    fn to_storable(&self) -> Result<StorableActiveRequest> {
        Ok(StorableActiveRequest {
            id: self.id,
            request_id: self.request.id,
            threshold: self.threshold,
        })
    }

    fn from_storable(repository: &Repository<'_>, storable: StorableActiveRequest) -> Result<Self> {
        Ok(Self {
            id: storable.id,
            request: repository.fetch(storable.request_id)?,
            threshold: storable.threshold,
        })
    }

    fn normalize(&self) -> Result<NormalizedActiveRequest> {
        Ok(NormalizedActiveRequest {
            id: self.id,
            request: self.request.normalize()?,
            threshold: self.threshold,
        })
    }

    fn denormalize(normalized: NormalizedActiveRequest, registry: &Registry) -> Result<Self> {
        Ok(Self {
            id: normalized.id,
            request: Request::denormalize(normalized.request, registry)?,
            threshold: normalized.threshold,
        })
    }

    fn keynames(&self) -> Vec<String> {
        vec![
            Self::KEYNAME.to_string(),
            Self::by_request(self.request.id),
            Self::by_from(self.request.from.id),
            Self::by_keyname(self.request.keyname.id),
        ]
    }

    fn on_save(&self, service: &mut Service<'_>) -> Result<()> {
        if self.threshold == 0 {
            return Err(EntityError::InvalidEntity(format!(
                "active request {} needs a positive threshold",
                self.id
            )));
        }

        if service.repository().exists(Request::KEYNAME, self.request.id) {
            return Err(EntityError::AlreadyExists(format!("request {}", self.request.id)));
        }

        service.insert(&self.request)
    }

    fn on_delete(&self, service: &mut Service<'_>) -> Result<()> {
        if service.repository().exists(Request::KEYNAME, self.request.id) {
            service.remove(&self.request)?;
        }
        Ok(())
    }
}
