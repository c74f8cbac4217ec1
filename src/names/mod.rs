// Name collection and counting: from pages to a flat list of person names.

pub mod collector;
pub mod frequency;
