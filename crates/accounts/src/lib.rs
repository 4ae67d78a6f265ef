//! `userhub-accounts`: user records, the directory contract, validation and
//! the account workflows (registration, verification, login, profile and
//! admin mutation).

pub mod directory;
pub mod user;
pub mod validation;
pub mod workflow;

pub use directory::{DirectoryError, UserDirectory};
pub use user::{NewUser, UpdateUser, UpdateUserRole, UserDetailView, UserDraft, UserRecord, UserView};
pub use validation::PasswordPolicy;
pub use workflow::UserWorkflow;
