use fibre_di::{Builder, Error};

struct UnregisteredService;

#[tokio::main(flavor = "current_thread")]
async fn main() {
  tracing_subscriber::fmt()
    .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
    .init();

  let container = Builder::new().build().await.expect("empty build cannot fail");

  println!("Attempting to resolve a service that was never registered...");
  assert!(!container.has("unregistered"));

  match container.get::<UnregisteredService>("unregistered").await {
    Ok(_) => panic!("Should not have found the service!"),
    Err(Error::NotFound { name }) => println!("Correctly received NotFound for '{}'.", name),
    Err(other) => panic!("Unexpected error: {}", other),
  }
}
