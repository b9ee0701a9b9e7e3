mod errors;
mod event;
mod feature;
mod model;
mod state;
mod status;

pub use errors::{Result, TabError};
pub use feature::TabManager;
pub use model::{Tab, TabId, TabKind};
pub use status::SessionStatus;
