//! The `Builder` used to assemble a `Container` at bootstrap.

use crate::container::Container;
use crate::core::Instance;
use crate::error::Result;
use crate::provider::{Factory, Provider};

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures_util::future::{self, FutureExt};

/// Components carrying this tag are constructed by [`Builder::build`] before
/// the container is returned.
pub const EAGER_TAG: &str = "@eager";

/// A mutable registry of components, turned into a [`Container`] by
/// [`build`](Builder::build).
///
/// All registration methods are fluent. Registering a name twice replaces the
/// earlier registration (last write wins), keeping its position in
/// registration order.
///
/// ```
/// use fibre_di::Builder;
///
/// # tokio_test_block(async {
/// let mut builder = Builder::new();
/// builder
///   .constant("x", 5_i32)
///   .register("y", |c| async move { Ok(*c.get::<i32>("x").await? + 1) });
///
/// let container = builder.build().await.unwrap();
/// assert_eq!(*container.get::<i32>("y").await.unwrap(), 6);
/// assert!(!container.has("z"));
/// # });
/// # fn tokio_test_block<F: std::future::Future>(f: F) -> F::Output {
/// #   tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(f)
/// # }
/// ```
#[derive(Default)]
pub struct Builder {
  pending: Vec<Provider>,
  slots: HashMap<Arc<str>, usize>,
  eager: Vec<Arc<str>>,
}

impl Builder {
  /// Creates a new, empty `Builder`.
  pub fn new() -> Self {
    Self::default()
  }

  // --- PRIVATE HELPERS ---

  fn insert(&mut self, name: &str, tags: &[&str], factory: Factory) -> &mut Self {
    let name: Arc<str> = Arc::from(name);
    let tags: Vec<Arc<str>> = tags.iter().map(|tag| Arc::from(*tag)).collect();
    let eager = tags.iter().any(|tag| &**tag == EAGER_TAG);
    let provider = Provider::new(name.clone(), tags, factory);

    match self.slots.get(&name) {
      Some(&slot) => {
        tracing::warn!(component = %name, "replacing existing registration");
        self.pending[slot] = provider;
      }
      None => {
        self.slots.insert(name.clone(), self.pending.len());
        self.pending.push(provider);
      }
    }

    let listed = self.eager.iter().position(|n| *n == name);
    match (eager, listed) {
      (true, None) => self.eager.push(name),
      (false, Some(index)) => {
        self.eager.remove(index);
      }
      _ => {}
    }
    self
  }

  fn erase<T, F, Fut>(factory: F) -> Factory
  where
    T: Any + Send + Sync,
    F: Fn(Container) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T>> + Send + 'static,
  {
    Arc::new(move |container: Container| {
      factory(container)
        .map(|outcome| outcome.map(|value| Arc::new(Arc::new(value)) as Instance))
        .boxed()
    })
  }

  fn erase_trait<I, F, Fut>(factory: F) -> Factory
  where
    I: ?Sized + Any + Send + Sync,
    F: Fn(Container) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Arc<I>>> + Send + 'static,
  {
    Arc::new(move |container: Container| {
      factory(container)
        .map(|outcome| outcome.map(|value| Arc::new(value) as Instance))
        .boxed()
    })
  }

  // --- Registration ---

  /// Registers a component constructed by an async `factory`.
  ///
  /// The factory runs at most once, the first time the component is
  /// resolved. It receives a [`Container`] through which it resolves its own
  /// dependencies.
  pub fn register<T, F, Fut>(&mut self, name: &str, factory: F) -> &mut Self
  where
    T: Any + Send + Sync,
    F: Fn(Container) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T>> + Send + 'static,
  {
    self.insert(name, &[], Self::erase(factory))
  }

  /// Like [`register`](Builder::register), with tags. A component tagged
  /// [`EAGER_TAG`] is constructed during [`build`](Builder::build).
  pub fn register_tagged<T, F, Fut>(&mut self, name: &str, tags: &[&str], factory: F) -> &mut Self
  where
    T: Any + Send + Sync,
    F: Fn(Container) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T>> + Send + 'static,
  {
    self.insert(name, tags, Self::erase(factory))
  }

  /// Registers a component whose factory yields an `Arc<I>`, typically a
  /// trait object. Resolve it with `get::<I>`.
  pub fn register_trait<I, F, Fut>(&mut self, name: &str, factory: F) -> &mut Self
  where
    I: ?Sized + Any + Send + Sync,
    F: Fn(Container) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Arc<I>>> + Send + 'static,
  {
    self.insert(name, &[], Self::erase_trait(factory))
  }

  /// Like [`register_trait`](Self::register_trait), also attaching `tags`.
  pub fn register_trait_tagged<I, F, Fut>(&mut self, name: &str, tags: &[&str], factory: F) -> &mut Self
  where
    I: ?Sized + Any + Send + Sync,
    F: Fn(Container) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Arc<I>>> + Send + 'static,
  {
    self.insert(name, tags, Self::erase_trait(factory))
  }

  /// Registers an already-built value. Constants carry no tags and are never
  /// eager.
  pub fn constant<T: Any + Send + Sync>(&mut self, name: &str, value: T) -> &mut Self {
    let instance: Instance = Arc::new(Arc::new(value));
    self.insert(
      name,
      &[],
      Arc::new(move |_: Container| future::ready(Ok::<_, crate::Error>(instance.clone())).boxed()),
    )
  }

  // --- Lifecycle ---

  /// Moves every registration into a new [`Container`], then constructs the
  /// eager components before returning it.
  ///
  /// The builder is left empty whatever the outcome, so it can assemble an
  /// unrelated container afterwards. If an eager component fails, its error
  /// is returned.
  pub async fn build(&mut self) -> Result<Container> {
    let Builder { pending, eager, .. } = std::mem::take(self);

    let container = Container::from_providers(pending);
    tracing::debug!(
      components = container.len(),
      eager = eager.len(),
      "container built"
    );

    container.resolve_all(&eager).await?;
    Ok(container)
  }

  /// Discards every pending registration.
  pub fn reset(&mut self) {
    self.pending.clear();
    self.slots.clear();
    self.eager.clear();
  }

  /// Returns `true` if a registration is pending under `name`.
  pub fn contains(&self, name: &str) -> bool {
    self.slots.contains_key(name)
  }

  /// Number of pending registrations.
  pub fn len(&self) -> usize {
    self.pending.len()
  }

  /// Returns `true` if nothing is pending.
  pub fn is_empty(&self) -> bool {
    self.pending.is_empty()
  }
}

impl fmt::Debug for Builder {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Builder")
      .field("pending", &self.pending)
      .field("eager", &self.eager)
      .finish()
  }
}
