pub mod http_notifier;
pub mod simulated;
