//! # Router Module
//!
//! Path templates from the OpenAPI document (e.g. `/pets/{id}`) are compiled
//! into regex matchers once at startup. Matching a request path yields the
//! [`Route`] together with its named path parameters, which the path validator
//! then checks against the operation's path schema.
//!
//! ## Example
//!
//! ```rust
//! use openapi_guard::router::Route;
//!
//! let route = Route::new("/users/{name}").unwrap();
//! let matched = route.match_path("/users/bob").unwrap();
//! assert_eq!(matched.get_path_param("name"), Some("bob"));
//! ```

mod core;

pub use core::{ParamVec, Route, RouteMatch, MAX_INLINE_PARAMS};
