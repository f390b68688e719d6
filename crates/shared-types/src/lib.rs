pub mod error;
pub mod config;

// Claim domain modules
pub mod aggregate;
pub mod document;
pub mod entity;
pub mod kind;
pub mod schema;

pub use error::*;
pub use config::*;

pub use aggregate::*;
pub use document::*;
pub use entity::*;
pub use kind::*;
pub use schema::*;
