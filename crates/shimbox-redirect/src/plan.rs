//! Registered redirections for one isolation scope.

use shimbox_model::{InstanceId, MemberId};

use crate::substitute::Substitute;

/// One registered replacement: a member, an optional bound receiver, and the
/// substitute to run in its place.
#[derive(Debug, Clone)]
pub struct Redirection {
    pub member: MemberId,
    /// When set, the redirection applies only to calls on this receiver.
    pub instance: Option<InstanceId>,
    pub substitute: Substitute,
}

/// The set of redirections consulted during one [`isolate`](crate::isolate)
/// call. The last registration for a given (member, instance) pair wins.
#[derive(Debug, Clone, Default)]
pub struct RedirectionPlan {
    redirections: Vec<Redirection>,
}

impl RedirectionPlan {
    pub fn new() -> Self {
        Self::default()
    }

    /// Begin registering a substitute for `member`.
    pub fn replace(&mut self, member: MemberId) -> RedirectionBuilder<'_> {
        RedirectionBuilder {
            plan: self,
            member,
            instance: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.redirections.is_empty()
    }

    pub fn len(&self) -> usize {
        self.redirections.len()
    }

    /// Select the governing substitute for a call on `member`: a redirection
    /// bound to the receiver's identity first, then an unbound one.
    pub fn lookup(&self, member: MemberId, receiver: Option<InstanceId>) -> Option<Substitute> {
        if let Some(id) = receiver {
            if let Some(hit) = self
                .redirections
                .iter()
                .rev()
                .find(|r| r.member == member && r.instance == Some(id))
            {
                return Some(hit.substitute.clone());
            }
        }
        self.redirections
            .iter()
            .rev()
            .find(|r| r.member == member && r.instance.is_none())
            .map(|r| r.substitute.clone())
    }
}

/// Builder returned by [`RedirectionPlan::replace`].
#[derive(Debug)]
pub struct RedirectionBuilder<'a> {
    plan: &'a mut RedirectionPlan,
    member: MemberId,
    instance: Option<InstanceId>,
}

impl RedirectionBuilder<'_> {
    /// Restrict the redirection to calls on one receiver.
    pub fn bound_to(mut self, instance: InstanceId) -> Self {
        self.instance = Some(instance);
        self
    }

    /// Finish the registration with the replacement body.
    pub fn with(self, substitute: Substitute) {
        self.plan.redirections.push(Redirection {
            member: self.member,
            instance: self.instance,
            substitute,
        });
    }
}
