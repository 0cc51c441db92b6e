//! HTTP protocol layer module
//!
//! Cache validators, content types, byte ranges and response builders,
//! independent of how a request is mapped to a file.

pub mod cache;
pub mod mime;
pub mod range;
pub mod response;

// Re-export commonly used types
pub use range::{parse_range_header, RangeParseResult};
pub use response::{
    build_304_response, build_400_response, build_404_response, build_416_response,
    build_500_response, build_503_response, build_file_response, build_partial_response,
    FileHeaders, HttpResponse,
};
