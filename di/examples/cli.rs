//! A command-line application assembled through the container.
//!
//! Settings enter the graph as a constant, services are lazy singletons, the
//! auth adapter is eager so a broken configuration fails at startup, and every
//! sub-command is discovered through the "command" tag.
//!
//! Run with `cargo run --example cli -- plugins` (set `RUST_LOG=debug` to see
//! the container's construction events).

use fibre_di::{Builder, Container, Error, EAGER_TAG};
use std::sync::Arc;

const COMMAND_TAG: &str = "command";

struct Settings {
  region: String,
  user_pool: String,
  plugin_dir: String,
}

struct SecretStore {
  entries: Vec<(String, String)>,
}

impl SecretStore {
  fn get(&self, key: &str) -> Option<&str> {
    self
      .entries
      .iter()
      .find(|(k, _)| k == key)
      .map(|(_, v)| v.as_str())
  }
}

struct AuthAdapter {
  pool: String,
  client_id: String,
}

struct PluginInstaller {
  dir: String,
}

trait Command: Send + Sync {
  fn name(&self) -> &'static str;
  fn run(&self) -> String;
}

struct LoginCommand {
  auth: Arc<AuthAdapter>,
}

impl Command for LoginCommand {
  fn name(&self) -> &'static str {
    "login"
  }

  fn run(&self) -> String {
    format!("logging in to {} as client {}", self.auth.pool, self.auth.client_id)
  }
}

struct PluginsCommand {
  installer: Arc<PluginInstaller>,
}

impl Command for PluginsCommand {
  fn name(&self) -> &'static str {
    "plugins"
  }

  fn run(&self) -> String {
    format!("listing plugins installed in {}", self.installer.dir)
  }
}

fn compose(builder: &mut Builder) -> &mut Builder {
  builder
    .constant(
      "settings",
      Settings {
        region: "eu-west-1".to_string(),
        user_pool: "eu-west-1_example".to_string(),
        plugin_dir: "~/.config/app/plugins".to_string(),
      },
    )
    .register("secrets", |_| async {
      Ok(SecretStore {
        entries: vec![("client_id".to_string(), "4f1c9a".to_string())],
      })
    })
    .register_tagged("auth", &[EAGER_TAG], |c: Container| async move {
      let settings = c.get::<Settings>("settings").await?;
      let secrets = c.get::<SecretStore>("secrets").await?;
      let client_id = secrets
        .get("client_id")
        .ok_or_else(|| Error::factory("secret 'client_id' is not set"))?;
      Ok(AuthAdapter {
        pool: format!("{}/{}", settings.region, settings.user_pool),
        client_id: client_id.to_string(),
      })
    })
    .register("plugin_installer", |c: Container| async move {
      let settings = c.get::<Settings>("settings").await?;
      Ok(PluginInstaller {
        dir: settings.plugin_dir.clone(),
      })
    })
    .register_trait_tagged::<dyn Command, _, _>("cmd.login", &[COMMAND_TAG], |c: Container| async move {
      let auth = c.get::<AuthAdapter>("auth").await?;
      Ok(Arc::new(LoginCommand { auth }) as Arc<dyn Command>)
    })
    .register_trait_tagged::<dyn Command, _, _>("cmd.plugins", &[COMMAND_TAG], |c: Container| async move {
      let installer = c.get::<PluginInstaller>("plugin_installer").await?;
      Ok(Arc::new(PluginsCommand { installer }) as Arc<dyn Command>)
    })
}

#[tokio::main]
async fn main() -> Result<(), Error> {
  tracing_subscriber::fmt()
    .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
    .init();

  let mut builder = Builder::new();
  let container = compose(&mut builder).build().await?;

  let commands = container.get_all_tagged::<dyn Command>(COMMAND_TAG).await?;
  let requested = std::env::args().nth(1);

  match requested.as_deref() {
    Some(name) => match commands.iter().find(|cmd| cmd.name() == name) {
      Some(cmd) => println!("{}", cmd.run()),
      None => println!("unknown command '{}'", name),
    },
    None => {
      println!("available commands:");
      for cmd in &commands {
        println!("  {}", cmd.name());
      }
    }
  }
  Ok(())
}
