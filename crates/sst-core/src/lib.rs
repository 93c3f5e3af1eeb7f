mod errors;
pub mod events;
pub mod proto;

pub use errors::CoreError;
