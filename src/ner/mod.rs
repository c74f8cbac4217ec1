// Named-entity recognition: trait-based abstraction over the NER model.
//
// The EntityRecognizer trait is the seam. OnnxEntityRecognizer runs a BERT
// token-classification model locally; tests substitute stubs.

pub mod download;
pub mod onnx;
pub mod traits;
