pub mod consultation;
pub mod enums;
pub mod follow_up;
pub mod message;
pub mod notification;
pub mod photo;
pub mod user;

pub use consultation::*;
pub use follow_up::*;
pub use message::*;
pub use notification::*;
pub use photo::*;
pub use user::*;
