//! Domain models for triage entities

mod category;
mod email;
mod lead;
mod thread;
mod timestamp;

pub use category::Category;
pub use email::{DraftStatus, Direction, Email, EmailBuilder, EmailId, Role};
pub use lead::{Lead, LeadId, LeadPatch, NewLead};
pub use thread::{EmailThread, ThreadId};
pub use timestamp::parse_lenient;
