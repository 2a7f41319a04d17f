//! Deterministic identifiers.
//!
//! Every replica must mint the same IDs for the same transaction, so
//! anything the engine creates on its own derives its UUID (v5) from data
//! all replicas share.

use uuid::Uuid;

const NAMESPACE: Uuid = Uuid::from_u128(0x6c1f_3a8e_52d4_4b0f_9e7a_0d2c_44b1_8f35);

pub fn derive(kind: &str, seed: &str) -> Uuid {
    Uuid::new_v5(&NAMESPACE, format!("{}:{}", kind, seed).as_bytes())
}

pub fn group_id(name: &str) -> Uuid {
    derive("group", name)
}

pub fn keyname_id(group: &str, name: &str) -> Uuid {
    derive("keyname", &format!("{}/{}", group, name))
}

pub fn user_id(pub_key: &str) -> Uuid {
    derive("user", pub_key)
}

pub fn active_request_id(request_id: Uuid) -> Uuid {
    derive("active_request", &request_id.to_string())
}

pub fn active_vote_id(vote_id: Uuid) -> Uuid {
    derive("active_vote", &vote_id.to_string())
}

pub fn completed_request_id(request_id: Uuid) -> Uuid {
    derive("completed_request", &request_id.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_stable_and_distinct() {
        assert_eq!(group_id("core"), group_id("core"));
        assert_ne!(group_id("core"), group_id("other"));
        assert_ne!(keyname_id("a", "bc"), keyname_id("ab", "c"));
        let request = Uuid::from_u128(1);
        assert_ne!(active_request_id(request), completed_request_id(request));
    }
}
