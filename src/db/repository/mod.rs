//! Repository layer — entity-scoped database operations.
//!
//! One sub-module per table. Row mapping goes through an internal raw-row
//! struct so enum and UUID conversion failures surface as `DatabaseError`
//! rather than panics.

mod consultation;
mod follow_up;
mod message;
mod notification;
mod photo;
mod token;
mod user;

pub use consultation::*;
pub use follow_up::*;
pub use message::*;
pub use notification::*;
pub use photo::*;
pub use token::*;
pub use user::*;
