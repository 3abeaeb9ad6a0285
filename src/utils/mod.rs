mod hash;
mod slug;

pub use hash::hash_text;
pub use slug::slugify;
