mod entity_ref;
mod ids;
mod tag;

pub use entity_ref::EntityRef;
pub use ids::TagId;
pub use tag::Tag;
