use userhub_auth::Caller;

/// Authenticated caller for a request, derived from the bearer token.
///
/// Inserted by the auth middleware; present on every `/api/user` route.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct CallerContext {
    caller: Caller,
}

impl CallerContext {
    pub fn new(caller: Caller) -> Self {
        Self { caller }
    }

    pub fn caller(&self) -> &Caller {
        &self.caller
    }
}
