pub mod annotation;
pub mod document;
pub mod location;
pub mod query;
pub mod reference;

pub use annotation::Annotation;
pub use document::Document;
pub use location::{LocationKey, ParseLocationError};
pub use reference::{CrossReference, SHARED_LEMMA_RELATION};
