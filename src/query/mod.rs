// Submodules for separation of concerns
mod length;
mod parse;
mod request;
mod types;

pub use length::DEFAULT_LEN;
pub use parse::parse_query_string;
pub use request::RawRequest;
pub use types::{
    DistinctRequest, FieldSpec, Filter, LengthIntent, QueryRequest, StoreLimit,
};
