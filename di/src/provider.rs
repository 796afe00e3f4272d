//! A single component binding and its resolution state.

use crate::container::Container;
use crate::core::Instance;
use crate::error::Result;

use std::fmt;
use std::sync::Arc;

use futures_util::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;

/// The type-erased factory of a component. It receives a container handle
/// scoped to the component it constructs.
pub(crate) type Factory = Arc<dyn Fn(Container) -> BoxFuture<'static, Result<Instance>> + Send + Sync>;

/// A construction that has started and can be awaited by any number of callers.
type Pending = Shared<BoxFuture<'static, Result<Instance>>>;

/// The resolution state of a provider.
///
/// `Idle -> InFlight -> {Resolved | Failed}`. Both terminal states are final.
enum State {
  Idle,
  InFlight(Pending),
  Resolved(Instance),
  Failed(crate::Error),
}

impl State {
  fn label(&self) -> &'static str {
    match self {
      State::Idle => "idle",
      State::InFlight(_) => "in-flight",
      State::Resolved(_) => "resolved",
      State::Failed(_) => "failed",
    }
  }
}

pub(crate) struct Provider {
  name: Arc<str>,
  tags: Box<[Arc<str>]>,
  factory: Factory,
  state: Mutex<State>,
}

impl Provider {
  pub(crate) fn new(name: Arc<str>, tags: Vec<Arc<str>>, factory: Factory) -> Self {
    let mut unique: Vec<Arc<str>> = Vec::with_capacity(tags.len());
    for tag in tags {
      if !unique.contains(&tag) {
        unique.push(tag);
      }
    }
    Self {
      name,
      tags: unique.into_boxed_slice(),
      factory,
      state: Mutex::new(State::Idle),
    }
  }

  pub(crate) fn name(&self) -> &Arc<str> {
    &self.name
  }

  pub(crate) fn tags(&self) -> &[Arc<str>] {
    &self.tags
  }

  /// Resolves this component on behalf of `container`'s requester.
  ///
  /// The factory runs at most once. A request from a factory that the
  /// current construction is (transitively) waiting on fails with
  /// `CircularDependency` instead of waiting.
  pub(crate) async fn provide(&self, container: &Container) -> Result<Instance> {
    let (pending, _guard) = {
      let mut state = self.state.lock();
      match &*state {
        State::Resolved(instance) => return Ok(instance.clone()),
        State::Failed(err) => return Err(err.clone()),
        State::InFlight(pending) => {
          let guard = container.waits().enter(container.requester(), &self.name)?;
          (pending.clone(), guard)
        }
        State::Idle => {
          let guard = container.waits().enter(container.requester(), &self.name)?;
          // Marked in-flight before the factory is first polled.
          let pending = self.start(container.scoped_to(self.name.clone()));
          *state = State::InFlight(pending.clone());
          tracing::debug!(component = %self.name, "constructing component");
          (pending, guard)
        }
      }
    };

    let outcome = pending.await;
    self.settle(&outcome);
    outcome
  }

  fn start(&self, scoped: Container) -> Pending {
    let factory = self.factory.clone();
    async move { factory(scoped).await }.boxed().shared()
  }

  fn settle(&self, outcome: &Result<Instance>) {
    let mut state = self.state.lock();
    if !matches!(*state, State::InFlight(_)) {
      return;
    }
    *state = match outcome {
      Ok(instance) => {
        tracing::debug!(component = %self.name, "component resolved");
        State::Resolved(instance.clone())
      }
      Err(err) => {
        tracing::debug!(component = %self.name, error = %err, "component failed");
        State::Failed(err.clone())
      }
    };
  }
}

impl fmt::Debug for Provider {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Provider")
      .field("name", &self.name)
      .field("tags", &self.tags)
      .field("state", &self.state.lock().label())
      .finish_non_exhaustive()
  }
}
