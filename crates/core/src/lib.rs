pub mod error;
pub mod event;
pub mod result;
pub mod window;

pub use error::{CatalogError, ConfigError};
pub use event::{AuditEvent, EventTable};
pub use result::MatchResult;
pub use window::BehaviorWindow;
