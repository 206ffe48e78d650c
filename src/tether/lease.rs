//! Exclusive, restorable control over a body's physics properties.
//!
//! Acquiring a lease snapshots the body's properties; releasing it hands the
//! snapshot back for restoration. The registry refuses a second lease on the
//! same body, so two abilities can never fight over one body.

use bevy::prelude::*;
use bevy::utils::HashMap;

use super::body::BodyProperties;
use super::error::LeaseError;

#[derive(Debug, Clone, Copy)]
struct LeaseRecord {
    holder: Entity,
    snapshot: BodyProperties,
}

/// Proof that `holder` owns `body` until it is released.
///
/// Not `Clone`: a lease is given back to the registry exactly once.
#[derive(Debug, PartialEq, Eq)]
#[must_use = "a lease must be released to restore the body"]
pub struct BodyLease {
    body: Entity,
    holder: Entity,
}

/// All bodies currently under tether control.
#[derive(Resource, Debug, Default)]
pub struct LeaseRegistry {
    leases: HashMap<Entity, LeaseRecord>,
}

impl LeaseRegistry {
    /// Take control of `body` on behalf of `holder`, remembering `current`.
    pub fn acquire(
        &mut self,
        holder: Entity,
        body: Entity,
        current: BodyProperties,
    ) -> Result<BodyLease, LeaseError> {
        if let Some(record) = self.leases.get(&body) {
            return Err(LeaseError::AlreadyLeased { body, holder: record.holder });
        }
        if let Some((held, _)) = self.leases.iter().find(|(_, r)| r.holder == holder) {
            return Err(LeaseError::HolderBusy { holder, body: *held });
        }
        self.leases.insert(body, LeaseRecord { holder, snapshot: current });
        Ok(BodyLease { body, holder })
    }

    /// Give the body back, returning the properties it had before the lease.
    pub fn release(&mut self, lease: BodyLease) -> Option<BodyProperties> {
        match self.leases.get(&lease.body) {
            Some(record) if record.holder == lease.holder => {
                self.leases.remove(&lease.body).map(|r| r.snapshot)
            }
            _ => None,
        }
    }

    /// Drop whatever `holder` still owns, for holders that vanished.
    pub fn revoke_holder(&mut self, holder: Entity) -> Option<(Entity, BodyProperties)> {
        let body = self
            .leases
            .iter()
            .find(|(_, r)| r.holder == holder)
            .map(|(body, _)| *body)?;
        self.leases.remove(&body).map(|r| (body, r.snapshot))
    }

    pub fn is_leased(&self, body: Entity) -> bool {
        self.leases.contains_key(&body)
    }

    pub fn is_empty(&self) -> bool {
        self.leases.is_empty()
    }
}
