//! # Fibre DI
//!
//! An asynchronous, lazily-resolving dependency injection container for Rust.
//!
//! Fibre DI is the composition root of an application: components are
//! registered by name on a [`Builder`], the builder produces an immutable
//! [`Container`], and everything else resolves its dependencies through that
//! container, including the factories of other components.
//!
//! ## Core Concepts
//!
//! - **Component**: a named value, constructed by an async factory the first
//!   time it is requested and shared afterwards (a singleton per container).
//! - **Tags**: free-form labels on a component. [`Container::get_all_tagged`]
//!   resolves every component carrying a tag, which is how plugin-like groups
//!   (for example CLI sub-commands) are discovered.
//! - **Eager components**: components tagged [`EAGER_TAG`] are constructed by
//!   [`Builder::build`] before the container is handed out.
//! - **Cycle detection**: a factory that ends up requesting a component its
//!   own construction is waiting on gets [`Error::CircularDependency`] instead
//!   of hanging.
//! - **Failures are final**: a factory error is remembered and returned to
//!   every later caller; the factory is never re-run.
//!
//! ## Quick Start
//!
//! ```
//! use fibre_di::{Builder, Container, Error};
//! use std::sync::Arc;
//!
//! trait Greeter: Send + Sync {
//!   fn greet(&self) -> String;
//! }
//!
//! struct EnglishGreeter {
//!   message: Arc<String>,
//! }
//!
//! impl Greeter for EnglishGreeter {
//!   fn greet(&self) -> String {
//!     self.message.to_string()
//!   }
//! }
//!
//! async fn run() -> Result<(), Error> {
//!   let mut builder = Builder::new();
//!   builder
//!     .constant("greeting_message", String::from("Hello, World!"))
//!     .register_trait::<dyn Greeter, _, _>("greeter", |c: Container| async move {
//!       let message = c.get::<String>("greeting_message").await?;
//!       Ok(Arc::new(EnglishGreeter { message }) as Arc<dyn Greeter>)
//!     });
//!
//!   let container = builder.build().await?;
//!   let greeter = container.get::<dyn Greeter>("greeter").await?;
//!   assert_eq!(greeter.greet(), "Hello, World!");
//!   Ok(())
//! }
//!
//! tokio::runtime::Builder::new_current_thread()
//!   .build()
//!   .unwrap()
//!   .block_on(run())
//!   .unwrap();
//! ```

mod builder;
mod container;
mod core;
mod error;
mod provider;

pub use builder::{Builder, EAGER_TAG};
pub use container::Container;
pub use error::{Error, Result};
