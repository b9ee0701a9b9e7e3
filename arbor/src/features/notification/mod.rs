mod errors;
mod transport;

pub use errors::NotificationError;
pub use transport::{
    Notifier, NotificationTransport, OsascriptTransport, osascript_args,
};
