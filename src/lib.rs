pub mod associations;
pub mod db;
pub mod error;
pub mod models;
pub mod normalizer;
pub mod query;
pub mod reconciler;
pub mod service;
pub mod vocabulary;

pub use db::Database;
pub use error::{Result, TagError};
pub use models::{EntityRef, Tag, TagId};
pub use reconciler::{Reconciler, TagArg};
pub use service::TaggingService;
