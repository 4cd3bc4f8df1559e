
pub mod menu;
pub mod recommendation;
pub mod user;

pub use menu::*;
pub use recommendation::*;
pub use user::*;
