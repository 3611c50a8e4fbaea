// ABOUTME: Response extraction module: body decoding, parse contexts and rule application
// ABOUTME: Exports the extractor, decoder and error types

pub mod decode;
pub mod document;
pub mod error;
pub mod extractor;
pub mod pattern;

pub use decode::decode_body;
pub use document::Document;
pub use error::{ExtractError, Result};
pub use extractor::{ResponseExtractor, RAW_BODY_KEY};
