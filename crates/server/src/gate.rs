use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};

use sentinel_core::domain::identity::UserId;

/// At most one estimate in flight per user. Extra requests are refused,
/// not queued.
#[derive(Clone, Default)]
pub struct EstimateGate {
    in_flight: Arc<Mutex<HashSet<UserId>>>,
}

impl EstimateGate {
    pub fn try_acquire(&self, user_id: &UserId) -> Option<EstimatePermit> {
        let mut in_flight = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        if !in_flight.insert(user_id.clone()) {
            return None;
        }
        Some(EstimatePermit { in_flight: self.in_flight.clone(), user_id: user_id.clone() })
    }
}

/// Releases the user's slot on drop, whatever the estimate's outcome.
pub struct EstimatePermit {
    in_flight: Arc<Mutex<HashSet<UserId>>>,
    user_id: UserId,
}

impl Drop for EstimatePermit {
    fn drop(&mut self) {
        self.in_flight.lock().unwrap_or_else(PoisonError::into_inner).remove(&self.user_id);
    }
}
