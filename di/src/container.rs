//! The `Container` handle and its resolution methods.

use crate::core::{downcast, Instance, WaitGraph};
use crate::error::{Error, Result};
use crate::provider::Provider;

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Weak};

use futures_util::future::try_join_all;

/// Everything a container shares between its handles. Immutable after
/// construction apart from per-provider state.
struct Registry {
  /// Registration order.
  providers: Vec<Arc<Provider>>,
  by_name: HashMap<Arc<str>, Arc<Provider>>,
  by_tag: HashMap<Arc<str>, Vec<Arc<Provider>>>,
}

/// How a handle reaches the registry.
///
/// A factory's handle is stored inside the in-flight construction, which the
/// registry itself owns, so it must not keep the registry alive.
#[derive(Clone)]
enum Link {
  Owned(Arc<Registry>),
  Scoped(Weak<Registry>),
}

/// The dependency injection container.
///
/// A `Container` is produced by [`Builder::build`](crate::Builder::build) and
/// is a cheap, cloneable handle. Every clone resolves against the same set of
/// singletons. Factories receive a handle of their own, through which they
/// resolve their dependencies; that handle also remembers which component is
/// asking, which is how circular construction is detected.
///
/// The singletons are dropped with the last handle obtained from `build()`
/// (or cloned from one). Handles given to factories do not keep them alive;
/// once the container is gone they fail with
/// [`Error::ContainerDropped`].
#[derive(Clone)]
pub struct Container {
  link: Link,
  waits: Arc<WaitGraph>,
  requester: Option<Arc<str>>,
}

impl Default for Container {
  fn default() -> Self {
    Self::from_providers(Vec::new())
  }
}

impl Container {
  pub(crate) fn from_providers(providers: Vec<Provider>) -> Self {
    let providers: Vec<Arc<Provider>> = providers.into_iter().map(Arc::new).collect();

    let mut by_name = HashMap::with_capacity(providers.len());
    let mut by_tag: HashMap<Arc<str>, Vec<Arc<Provider>>> = HashMap::new();
    for provider in &providers {
      by_name.insert(provider.name().clone(), provider.clone());
      for tag in provider.tags() {
        by_tag.entry(tag.clone()).or_default().push(provider.clone());
      }
    }

    Self {
      link: Link::Owned(Arc::new(Registry {
        providers,
        by_name,
        by_tag,
      })),
      waits: Arc::default(),
      requester: None,
    }
  }

  // --- Internal plumbing used by providers ---

  pub(crate) fn waits(&self) -> &WaitGraph {
    &self.waits
  }

  pub(crate) fn requester(&self) -> Option<&Arc<str>> {
    self.requester.as_ref()
  }

  pub(crate) fn scoped_to(&self, requester: Arc<str>) -> Self {
    let registry = match &self.link {
      Link::Owned(registry) => Arc::downgrade(registry),
      Link::Scoped(registry) => registry.clone(),
    };
    Self {
      link: Link::Scoped(registry),
      waits: self.waits.clone(),
      requester: Some(requester),
    }
  }

  /// A strong reference for the duration of a lookup. Never held across an
  /// await: a factory's future must only own providers, not the registry.
  fn registry(&self) -> Option<Arc<Registry>> {
    match &self.link {
      Link::Owned(registry) => Some(registry.clone()),
      Link::Scoped(registry) => registry.upgrade(),
    }
  }

  fn dropped(name: &str) -> Error {
    Error::ContainerDropped {
      name: name.to_owned(),
    }
  }

  pub(crate) async fn resolve(&self, name: &str) -> Result<Instance> {
    let provider = {
      let registry = self.registry().ok_or_else(|| Self::dropped(name))?;
      registry.by_name.get(name).cloned()
    };
    let provider = provider.ok_or_else(|| Error::NotFound {
      name: name.to_owned(),
    })?;
    provider.provide(self).await
  }

  pub(crate) async fn resolve_all<S: AsRef<str>>(&self, names: &[S]) -> Result<Vec<Instance>> {
    if names.is_empty() {
      return Ok(Vec::new());
    }
    try_join_all(names.iter().map(|name| self.resolve(name.as_ref()))).await
  }

  // --- Resolution ---

  /// Resolves the component registered under `name` as a `T`.
  ///
  /// The first call constructs the component; later calls return the same
  /// `Arc`. A failed construction is remembered and its error returned again.
  pub async fn get<T: ?Sized + Any + Send + Sync>(&self, name: &str) -> Result<Arc<T>> {
    let instance = self.resolve(name).await?;
    downcast(name, &instance)
  }

  /// Resolves several components concurrently.
  ///
  /// Results follow the order of `names`, whatever order the constructions
  /// complete in. The first failure fails the whole call.
  pub async fn get_all<T, S>(&self, names: &[S]) -> Result<Vec<Arc<T>>>
  where
    T: ?Sized + Any + Send + Sync,
    S: AsRef<str>,
  {
    let instances = self.resolve_all(names).await?;
    names
      .iter()
      .zip(&instances)
      .map(|(name, instance)| downcast(name.as_ref(), instance))
      .collect()
  }

  /// Resolves, concurrently, every component carrying `tag`.
  ///
  /// Values follow registration order. An unknown tag yields an empty vector.
  pub async fn get_all_tagged<T: ?Sized + Any + Send + Sync>(&self, tag: &str) -> Result<Vec<Arc<T>>> {
    let tagged = {
      let registry = self.registry().ok_or_else(|| Self::dropped(tag))?;
      registry.by_tag.get(tag).cloned()
    };
    let Some(tagged) = tagged else {
      return Ok(Vec::new());
    };
    let instances = try_join_all(tagged.iter().map(|provider| provider.provide(self))).await?;
    tagged
      .iter()
      .zip(&instances)
      .map(|(provider, instance)| downcast(provider.name(), instance))
      .collect()
  }

  // --- Introspection ---
  //
  // A factory's handle whose container is gone reports an empty registry.

  /// Returns `true` if a component is registered under `name`. Never
  /// triggers construction.
  pub fn has(&self, name: &str) -> bool {
    self
      .registry()
      .is_some_and(|registry| registry.by_name.contains_key(name))
  }

  /// Returns `true` if at least one component carries `tag`.
  pub fn has_tag(&self, tag: &str) -> bool {
    self
      .registry()
      .is_some_and(|registry| registry.by_tag.contains_key(tag))
  }

  /// Component names in registration order.
  pub fn names(&self) -> Vec<String> {
    self
      .registry()
      .map(|registry| {
        registry
          .providers
          .iter()
          .map(|provider| provider.name().to_string())
          .collect()
      })
      .unwrap_or_default()
  }

  /// Number of registered components.
  pub fn len(&self) -> usize {
    self.registry().map_or(0, |registry| registry.providers.len())
  }

  /// Returns `true` if no component is registered.
  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }
}

impl fmt::Debug for Container {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let providers = self.registry().map(|registry| registry.providers.clone());
    f.debug_struct("Container")
      .field("providers", &providers)
      .field("requester", &self.requester)
      .finish_non_exhaustive()
  }
}
