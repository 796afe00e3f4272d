//! Core, non-public data structures for the container.

use crate::error::{Error, Result};

use std::any::{type_name, Any};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;

use parking_lot::Mutex;

/// A resolved component value. Always holds an `Arc<T>` so that unsized
/// values (trait objects) can be stored and handed out cheaply.
pub(crate) type Instance = Arc<dyn Any + Send + Sync>;

pub(crate) fn downcast<T: ?Sized + Any + Send + Sync>(name: &str, instance: &Instance) -> Result<Arc<T>> {
  instance
    .downcast_ref::<Arc<T>>()
    .cloned()
    .ok_or_else(|| Error::TypeMismatch {
      name: name.to_owned(),
      expected: type_name::<T>(),
    })
}

// requester -> (dependency -> number of outstanding awaits)
type Edges = HashMap<Arc<str>, HashMap<Arc<str>, usize>>;

/// The wait-for graph of one container.
///
/// An edge `a -> b` exists while the factory of `a` is awaiting `b`. Edges are
/// only added after checking that they do not close a cycle, so the graph is
/// always acyclic and no resolution can end up waiting on itself.
#[derive(Default)]
pub(crate) struct WaitGraph {
  edges: Mutex<Edges>,
}

impl WaitGraph {
  /// Records that `requester` is about to await `target`.
  ///
  /// Requests issued by application code (no requester) are never part of a
  /// cycle and are admitted without an edge.
  pub(crate) fn enter(&self, requester: Option<&Arc<str>>, target: &Arc<str>) -> Result<WaitGuard<'_>> {
    let Some(requester) = requester else {
      return Ok(WaitGuard {
        graph: self,
        edge: None,
      });
    };

    let mut edges = self.edges.lock();
    if let Some(path) = path_between(&edges, target, requester) {
      let mut chain = Vec::with_capacity(path.len() + 1);
      chain.push(requester.to_string());
      chain.extend(path.iter().map(|name| name.to_string()));
      tracing::trace!(component = %target, chain = ?chain, "rejected circular request");
      return Err(Error::CircularDependency {
        name: target.to_string(),
        chain,
      });
    }

    *edges
      .entry(requester.clone())
      .or_default()
      .entry(target.clone())
      .or_insert(0) += 1;

    Ok(WaitGuard {
      graph: self,
      edge: Some((requester.clone(), target.clone())),
    })
  }

  #[cfg(test)]
  fn edge_count(&self) -> usize {
    self.edges.lock().values().map(HashMap::len).sum()
  }
}

/// Shortest path `from -> .. -> to`, both ends included.
fn path_between(edges: &Edges, from: &Arc<str>, to: &Arc<str>) -> Option<Vec<Arc<str>>> {
  let mut parents: HashMap<Arc<str>, Arc<str>> = HashMap::new();
  let mut seen: HashSet<Arc<str>> = HashSet::from([from.clone()]);
  let mut queue = VecDeque::from([from.clone()]);

  while let Some(node) = queue.pop_front() {
    if node == *to {
      let mut path = vec![node.clone()];
      let mut cursor = node;
      while let Some(parent) = parents.get(&cursor) {
        path.push(parent.clone());
        cursor = parent.clone();
      }
      path.reverse();
      return Some(path);
    }
    if let Some(deps) = edges.get(&node) {
      for dep in deps.keys() {
        if seen.insert(dep.clone()) {
          parents.insert(dep.clone(), node.clone());
          queue.push_back(dep.clone());
        }
      }
    }
  }
  None
}

/// An RAII guard for one wait-for edge.
///
/// Dropping it (when the awaited resolution settles, or when the waiting
/// future is dropped) removes the edge again.
pub(crate) struct WaitGuard<'a> {
  graph: &'a WaitGraph,
  edge: Option<(Arc<str>, Arc<str>)>,
}

impl Drop for WaitGuard<'_> {
  fn drop(&mut self) {
    let Some((requester, target)) = self.edge.take() else {
      return;
    };
    let mut edges = self.graph.edges.lock();
    if let Some(deps) = edges.get_mut(&requester) {
      if let Some(count) = deps.get_mut(&target) {
        *count -= 1;
        if *count == 0 {
          deps.remove(&target);
        }
      }
      if deps.is_empty() {
        edges.remove(&requester);
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn name(s: &str) -> Arc<str> {
    Arc::from(s)
  }

  #[test]
  fn application_requests_add_no_edges() {
    let graph = WaitGraph::default();
    let _guard = graph.enter(None, &name("a")).unwrap();
    assert_eq!(graph.edge_count(), 0);
  }

  #[test]
  fn self_request_is_rejected() {
    let graph = WaitGraph::default();
    let err = graph.enter(Some(&name("x")), &name("x")).err().unwrap();
    match err {
      Error::CircularDependency { name, chain } => {
        assert_eq!(name, "x");
        assert_eq!(chain, vec!["x", "x"]);
      }
      other => panic!("unexpected error: {other:?}"),
    }
  }

  #[test]
  fn closing_edge_reports_full_chain() {
    let graph = WaitGraph::default();
    let _ab = graph.enter(Some(&name("a")), &name("b")).unwrap();
    let _bc = graph.enter(Some(&name("b")), &name("c")).unwrap();

    let err = graph.enter(Some(&name("c")), &name("a")).err().unwrap();
    assert_eq!(
      err.to_string(),
      "circular dependency detected while resolving 'a': c -> a -> b -> c"
    );
  }

  #[test]
  fn dropped_guard_releases_edge() {
    let graph = WaitGraph::default();
    let guard = graph.enter(Some(&name("a")), &name("b")).unwrap();
    assert!(graph.enter(Some(&name("b")), &name("a")).is_err());

    drop(guard);
    assert_eq!(graph.edge_count(), 0);
    assert!(graph.enter(Some(&name("b")), &name("a")).is_ok());
  }

  #[test]
  fn parallel_waits_on_same_edge_are_counted() {
    let graph = WaitGraph::default();
    let first = graph.enter(Some(&name("a")), &name("b")).unwrap();
    let second = graph.enter(Some(&name("a")), &name("b")).unwrap();

    drop(first);
    assert_eq!(graph.edge_count(), 1);
    drop(second);
    assert_eq!(graph.edge_count(), 0);
  }

  #[test]
  fn downcast_checks_type() {
    let instance: Instance = Arc::new(Arc::new(5_u32));
    assert_eq!(*downcast::<u32>("n", &instance).unwrap(), 5);
    assert!(matches!(
      downcast::<String>("n", &instance),
      Err(Error::TypeMismatch { .. })
    ));
  }
}
