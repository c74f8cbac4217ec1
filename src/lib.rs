// namescout: name-variant discovery for public figures
//
// This is the library root. Each module corresponds to a stage of the
// search -> pages -> names -> counts/clusters pipeline.

pub mod clustering;
pub mod config;
pub mod error;
pub mod names;
pub mod ner;
pub mod output;
pub mod pipeline;
pub mod scrape;
