use fibre_di::{Builder, Container};

// A function that runs some logic against whatever container it is given.
// By accepting a `&Container`, it can be tested with a controlled graph.
async fn process_data(container: &Container) -> String {
  let data = container
    .get::<String>("data")
    .await
    .expect("Data not found in container");
  format!("Processed: {}", data.to_uppercase())
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
  tracing_subscriber::fmt()
    .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
    .init();

  let mut builder = Builder::new();

  // --- Test Scenario with its own container ---
  println!("--- Running with a test container ---");
  builder.constant("data", String::from("test data"));
  let test_container = builder.build().await.unwrap();
  let result = process_data(&test_container).await;

  println!("Result: {}", result);
  assert_eq!(result, "Processed: TEST DATA");

  // --- The same builder assembles an unrelated graph ---
  builder.constant("data", String::from("production data"));
  let prod_container = builder.build().await.unwrap();
  let result = process_data(&prod_container).await;

  println!("Result: {}", result);
  assert_eq!(result, "Processed: PRODUCTION DATA");

  // The first container is untouched by the second build.
  assert_eq!(process_data(&test_container).await, "Processed: TEST DATA");
  println!("\nVerified that both containers are isolated from each other.");
}
