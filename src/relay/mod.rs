pub mod badge;
pub mod coordinator;
pub mod message;
pub mod port;
pub mod registry;
pub mod source;
