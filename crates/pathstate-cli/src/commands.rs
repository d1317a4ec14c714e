use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context};
use colored::Colorize;
use serde_json::json;
use tracing::debug;

use pathstate_container::{Completion, ContainerConfig, ContainerResult, StateContainer};
use pathstate_persist::{Persistence, StorageKeys};
use pathstate_store::{FileSessionStore, SessionStore};
use pathstate_types::Tree;

use crate::cli::*;

struct Session {
    dir: PathBuf,
    namespace: String,
    version: Option<String>,
    validate: bool,
    format: OutputFormat,
}

impl Session {
    fn store(&self) -> anyhow::Result<Arc<dyn SessionStore>> {
        let store = FileSessionStore::open(&self.dir)
            .with_context(|| format!("cannot open session directory {}", self.dir.display()))?;
        debug!(dir = %self.dir.display(), namespace = %self.namespace, "session opened");
        Ok(Arc::new(store))
    }

    fn config(&self, store: Arc<dyn SessionStore>) -> ContainerConfig {
        let mut config = ContainerConfig::new(json!({}))
            .with_store(store)
            .with_namespace(self.namespace.clone())
            .with_validate(self.validate);
        if let Some(version) = &self.version {
            config = config.with_version(version.clone());
        }
        config
    }
}

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    runtime.block_on(execute(cli))
}

async fn execute(cli: Cli) -> anyhow::Result<()> {
    let Cli {
        command,
        dir,
        namespace,
        schema_version,
        validate,
        format,
    } = cli;
    let session = Session {
        dir,
        namespace,
        version: schema_version,
        validate,
        format,
    };
    let store = session.store()?;

    match command {
        Command::Version => cmd_version(&session, store.as_ref()),
        Command::Clear => cmd_clear(&session, store),
        command => {
            let container = StateContainer::new(session.config(store));
            let outcome = apply(&session, &container, command).await;
            container.close().await;
            let path = outcome?;
            match path {
                Some(path) => print_value(&session.format, &path, container.get(path.as_str()).as_ref()),
                None => print_tree(&session.format, &container.snapshot()),
            }
            Ok(())
        }
    }
}

/// Run one tree command; returns the path whose value should be printed, or
/// `None` to print the whole tree.
async fn apply(
    session: &Session,
    container: &StateContainer,
    command: Command,
) -> anyhow::Result<Option<String>> {
    let (path, pending): (String, ContainerResult<Completion>) = match command {
        Command::Show => return Ok(None),
        Command::Get(args) => return Ok(Some(args.path)),
        Command::Set(args) => {
            let value = parse_value(&args.value);
            let pending = container.set(args.path.as_str(), value);
            (args.path, pending)
        }
        Command::Delete(args) => {
            let pending = container.delete(args.path.as_str());
            (args.path, pending)
        }
        Command::Increment(args) => {
            let pending = container.increment_by(args.path.as_str(), parse_step(&args.by)?);
            (args.path, pending)
        }
        Command::Decrement(args) => {
            let pending = container.decrement_by(args.path.as_str(), parse_step(&args.by)?);
            (args.path, pending)
        }
        Command::Toggle(args) => {
            let pending = container.toggle(args.path.as_str());
            (args.path, pending)
        }
        Command::Push(args) => {
            let values: Vec<Tree> = args.values.iter().map(|v| parse_value(v)).collect();
            let pending = container.push(args.path.as_str(), values);
            (args.path, pending)
        }
        Command::Version | Command::Clear => return Ok(None),
    };
    pending?.await?;
    if matches!(session.format, OutputFormat::Text) {
        println!("{} {}", "✓".green().bold(), path.bold());
    }
    Ok(Some(path))
}

fn cmd_version(session: &Session, store: &dyn SessionStore) -> anyhow::Result<()> {
    let keys = StorageKeys::for_namespace(&session.namespace);
    let stored = store.get_item(&keys.version)?;
    match session.format {
        OutputFormat::Json => println!("{}", json!(stored)),
        OutputFormat::Text => match stored {
            Some(version) => println!("Schema version: {}", version.yellow()),
            None => println!("Schema version: {}", "none".dimmed()),
        },
    }
    Ok(())
}

fn cmd_clear(session: &Session, store: Arc<dyn SessionStore>) -> anyhow::Result<()> {
    let config = session.config(Arc::clone(&store)).persist_config();
    Persistence::new(config, store).discard()?;
    if matches!(session.format, OutputFormat::Text) {
        println!(
            "{} Cleared {} in {}",
            "✓".green().bold(),
            session.namespace.bold(),
            session.dir.display()
        );
    }
    Ok(())
}

fn print_value(format: &OutputFormat, path: &str, value: Option<&Tree>) {
    match (format, value) {
        (OutputFormat::Json, value) => println!("{}", value.unwrap_or(&Tree::Null)),
        (OutputFormat::Text, Some(value)) => {
            println!("{} = {}", path.bold(), value.to_string().cyan())
        }
        (OutputFormat::Text, None) => println!("{} = {}", path.bold(), "undefined".dimmed()),
    }
}

fn print_tree(format: &OutputFormat, tree: &Tree) {
    match format {
        OutputFormat::Json => println!("{tree}"),
        OutputFormat::Text => match serde_json::to_string_pretty(tree) {
            Ok(text) => println!("{text}"),
            Err(_) => println!("{tree}"),
        },
    }
}

/// JSON text, or the text itself as a string when it is not JSON.
fn parse_value(text: &str) -> Tree {
    serde_json::from_str(text).unwrap_or_else(|_| Tree::String(text.to_string()))
}

fn parse_step(text: &str) -> anyhow::Result<Tree> {
    let value: Tree =
        serde_json::from_str(text).with_context(|| format!("invalid step {text:?}"))?;
    if !value.is_number() {
        bail!("step must be a number, got {value}");
    }
    Ok(value)
}
