//! Outbound collaborators: client notifications and file storage.

pub mod file_store;
pub mod notification;

pub use file_store::{FileStore, FileStoreError, InMemoryFileStore, StoredFile};
pub use notification::{
    Delivery, LinkNotifier, NotificationKind, NotificationOutcome, NotificationPort, NotifyError,
};
