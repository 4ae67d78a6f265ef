use userhub_core::UserId;

use crate::Role;

/// Authenticated caller, as derived from a verified bearer token.
///
/// Construction only happens in [`crate::AccessGate`] (or tests); the id is
/// never taken from client-supplied paths.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Caller {
    id: UserId,
    role: Role,
}

impl Caller {
    pub fn new(id: UserId, role: Role) -> Self {
        Self { id, role }
    }

    pub fn id(&self) -> UserId {
        self.id
    }

    pub fn role(&self) -> Role {
        self.role
    }
}
