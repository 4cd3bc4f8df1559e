pub mod auth_service;
pub mod menu_cache;
pub mod menu_service;
pub mod profile_service;
pub mod recommendation_service;

pub use auth_service::*;
pub use menu_cache::*;
pub use menu_service::*;
pub use profile_service::*;
pub use recommendation_service::*;
