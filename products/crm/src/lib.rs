//! Sales-pipeline domain shared by the server and the workspace client.
//!
//! Everything here is synchronous and in-memory: record types, form
//! validation, the table/kanban transforms, summary statistics and CSV export.

pub mod activity;
pub mod board;
pub mod change;
pub mod consultoria;
pub mod export;
pub mod opportunity;
pub mod stage;
pub mod stats;
pub mod table;
pub mod user;
pub mod validation;

pub use activity::{ActivityAction, ActivityLog};
pub use change::{ChangeEvent, ChangeKind};
pub use opportunity::{Opportunity, OpportunityDraft, OpportunityPatch, Party};
pub use stage::Stage;
pub use user::{AuthResponse, SignInRequest, SignUpRequest, User};
pub use validation::ValidationError;
