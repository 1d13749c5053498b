//! Registration errors.

use thiserror::Error;

/// Errors raised while building the router tree.
///
/// They only occur during registration; serving never produces them.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouterError {
    /// A method token could not be parsed.
    #[error("invalid HTTP method `{0}`")]
    InvalidMethod(String),

    /// The method specification was empty.
    #[error("route `{0}` has no methods")]
    NoMethods(String),

    /// The URI pattern could not be compiled.
    #[error("malformed route pattern `{pattern}`: {reason}")]
    MalformedPattern { pattern: String, reason: String },

    /// Another route of the tree already uses this name.
    #[error("route name `{0}` is already in use")]
    DuplicateRouteName(String),

    /// The route already has a name.
    #[error("route is already named `{0}`")]
    AlreadyNamed(String),

    /// The route does not belong to a router.
    #[error("route `{0}` is not attached to a router")]
    DetachedRoute(String),

    /// Building a URI with the wrong number of parameters.
    #[error("route `{uri}` expects {expected} parameters, got {actual}")]
    ParameterCount {
        uri: String,
        expected: usize,
        actual: usize,
    },
}
