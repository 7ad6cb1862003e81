pub mod notifier;

pub use notifier::{build_notifier, Delivery, Notifier};
