// ABOUTME: Interfaces to the collaborators task handlers call out to
// ABOUTME: HTTP transport, notification dispatch, and data transformation, with defaults

pub mod notifier;
pub mod transformer;
pub mod transport;

use std::sync::Arc;

pub use notifier::{LogNotifier, Notification, NotificationAck, Notifier};
pub use transformer::{PassthroughTransformer, Transformer};
pub use transport::{HttpTransport, RemoteRequest, UnconfiguredTransport};

/// The collaborator set bound into the standard handlers.
#[derive(Clone)]
pub struct Collaborators {
    pub transport: Arc<dyn HttpTransport>,
    pub notifier: Arc<dyn Notifier>,
    pub transformer: Arc<dyn Transformer>,
}

impl Default for Collaborators {
    fn default() -> Self {
        Self {
            transport: Arc::new(UnconfiguredTransport),
            notifier: Arc::new(LogNotifier),
            transformer: Arc::new(PassthroughTransformer),
        }
    }
}
