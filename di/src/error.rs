use std::sync::Arc;

use thiserror::Error;

/// Errors produced while resolving components.
///
/// The type is `Clone` because a failed component memoizes its error and
/// hands the same value to every later caller.
#[derive(Debug, Clone, Error)]
pub enum Error {
  /// No provider is registered under the requested name.
  #[error("no component registered under '{name}'")]
  NotFound { name: String },

  /// The component was requested along a chain of factories that is
  /// already waiting on it.
  #[error("circular dependency detected while resolving '{name}': {}", .chain.join(" -> "))]
  CircularDependency { name: String, chain: Vec<String> },

  /// The component exists but its value is not of the requested type.
  #[error("component '{name}' is not of type {expected}")]
  TypeMismatch {
    name: String,
    expected: &'static str,
  },

  /// A factory's handle was used after every outside handle to its
  /// container had been dropped.
  #[error("container was dropped before '{name}' could be resolved")]
  ContainerDropped { name: String },

  /// An error raised by a user-supplied factory.
  #[error(transparent)]
  Factory(Arc<dyn std::error::Error + Send + Sync>),
}

impl Error {
  /// Wraps an arbitrary error (or message) raised inside a factory.
  ///
  /// ```
  /// use fibre_di::Error;
  ///
  /// let err = Error::factory("database unreachable");
  /// assert_eq!(err.to_string(), "database unreachable");
  /// ```
  pub fn factory<E>(err: E) -> Self
  where
    E: Into<Box<dyn std::error::Error + Send + Sync>>,
  {
    Error::Factory(Arc::from(err.into()))
  }

  /// The component this error names, if any.
  pub fn component(&self) -> Option<&str> {
    match self {
      Error::NotFound { name }
      | Error::CircularDependency { name, .. }
      | Error::TypeMismatch { name, .. }
      | Error::ContainerDropped { name } => Some(name.as_str()),
      Error::Factory(_) => None,
    }
  }
}

/// A specialized `Result` type for `fibre_di` operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;
