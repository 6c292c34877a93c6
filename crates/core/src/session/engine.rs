use crate::session::states::{
    AuthEvent, SessionAction, SessionEvent, SessionState, TransitionOutcome,
};

/// Pure session transition. Provisioning outcomes that do not match the
/// pending identity are stale and leave the state untouched.
pub fn transition(current: &SessionState, event: SessionEvent) -> TransitionOutcome {
    let (to, actions) = match (current, &event) {
        (_, SessionEvent::Auth(AuthEvent::SignedIn(identity))) => (
            SessionState::Provisioning(identity.clone()),
            vec![SessionAction::EnsureProfile(identity.clone())],
        ),
        (_, SessionEvent::Auth(AuthEvent::SignedOut)) => (SessionState::Unauthenticated, Vec::new()),
        (SessionState::Provisioning(identity), SessionEvent::ProvisioningSucceeded { uid })
            if &identity.uid == uid =>
        {
            (SessionState::Authenticated(identity.clone()), Vec::new())
        }
        (SessionState::Provisioning(identity), SessionEvent::ProvisioningFailed { uid, reason })
            if &identity.uid == uid =>
        {
            (
                SessionState::ProvisioningFailed {
                    identity: identity.clone(),
                    reason: reason.clone(),
                },
                Vec::new(),
            )
        }
        _ => (current.clone(), Vec::new()),
    };

    TransitionOutcome { from: current.clone(), to, event, actions }
}
