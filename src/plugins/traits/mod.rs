pub mod notifier;

pub use notifier::{NotifierPlugin, NotificationEvent, NotificationResult};
