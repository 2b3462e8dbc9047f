pub mod incident;
pub mod outbox;

pub use incident::*;
pub use outbox::*;
