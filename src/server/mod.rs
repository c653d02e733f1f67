pub mod request;
pub mod response;

pub use request::{parse_cookies, parse_query_pairs, HttpRequest};
pub use response::HttpResponse;
