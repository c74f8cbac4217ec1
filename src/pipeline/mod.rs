// Pipelines that tie the stages together.

pub mod batch;
