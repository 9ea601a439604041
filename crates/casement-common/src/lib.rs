pub mod errors;
pub mod events;
pub mod id;
pub mod types;

pub use errors::{ConfigError, GroupError, HostError};
pub use events::{Event, EventBus};
pub use id::{new_correlation_id, new_id};
pub use types::{Rect, SnapGroupId, TabGroupId, WindowIdentity, WindowState};

pub type Result<T> = std::result::Result<T, GroupError>;
