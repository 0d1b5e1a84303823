//! Everything the rendering layer needs on top of raw documents.

pub mod feed;
pub mod post;
pub mod seo;
pub mod share;
pub mod time;

pub use post::Post;
