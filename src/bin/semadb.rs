//! Semadb CLI — fragment store with plugin-based requirement resolution.
//!
//! Usage:
//!   semadb upsert <document> <handle> <language> [--title ...] [--text ...]
//!   semadb search <document> key=value... [--contains KEY]

use clap::{Parser, Subcommand};
use semadb::plugins::{
    FieldEqualsPlugin, MetadataEqualsPlugin, StoreHydratePlugin, TextContainsPlugin,
};
use semadb::{DocumentRegistry, Fragment, FragmentKey};
use serde_json::{Map, Value};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(
    name = "semadb",
    version,
    about = "Fragment store with plugin-based requirement resolution"
)]
struct Cli {
    /// Root data directory (defaults to $SEMADB_DATA, else the platform data dir)
    #[arg(long, global = true)]
    root: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Insert or replace a fragment
    Upsert {
        /// Owning document name
        document: String,
        /// Fragment handle
        handle: String,
        /// Language tag
        language: String,
        /// Display label
        #[arg(long)]
        title: Option<String>,
        /// Body content
        #[arg(long)]
        text: Option<String>,
        /// Metadata as a JSON object
        #[arg(long)]
        metadata: Option<String>,
    },
    /// Print a fragment as JSON
    Get {
        document: String,
        handle: String,
        language: String,
    },
    /// List every fragment of a document
    List {
        document: String,
    },
    /// Remove a fragment
    Remove {
        document: String,
        handle: String,
        language: String,
    },
    /// Search fragments by requirements
    Search {
        document: String,
        /// Requirements as key=value (values parse as JSON, else as string)
        #[arg(required = true)]
        requirements: Vec<String>,
        /// Register a substring-match plugin for KEY (repeatable)
        #[arg(long = "contains", value_name = "KEY")]
        contains: Vec<String>,
    },
    /// Delete a document's storage entirely (irreversible)
    Wipe {
        document: String,
    },
}

/// Default data root: $SEMADB_DATA, else the platform data directory
fn default_root() -> PathBuf {
    if let Ok(dir) = std::env::var("SEMADB_DATA") {
        return PathBuf::from(dir);
    }
    let data_dir = dirs::data_dir()
        .unwrap_or_else(|| dirs::home_dir().unwrap_or_default().join(".local/share"));
    data_dir.join("semadb")
}

/// Parse `key=value`; the value parses as JSON, falling back to a string
fn parse_requirement(raw: &str) -> Result<(String, Value), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("invalid requirement '{raw}': expected key=value"))?;
    if key.is_empty() {
        return Err(format!("invalid requirement '{raw}': empty key"));
    }
    let value = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));
    Ok((key.to_string(), value))
}

fn print_fragment(fragment: &Fragment) {
    match serde_json::to_string_pretty(fragment) {
        Ok(json) => println!("{json}"),
        Err(e) => eprintln!("Error: {e}"),
    }
}

fn cmd_upsert(registry: &DocumentRegistry, fragment: Fragment) -> i32 {
    match registry.upsert_fragment(&fragment) {
        Ok(()) => {
            println!("Upserted {}", fragment.key());
            0
        }
        Err(e) => {
            eprintln!("Error: {e}");
            1
        }
    }
}

fn cmd_get(registry: &DocumentRegistry, key: &FragmentKey) -> i32 {
    match registry.get_fragment(key) {
        Ok(fragment) => {
            print_fragment(&fragment);
            0
        }
        Err(e) => {
            eprintln!("Error: {e}");
            1
        }
    }
}

fn cmd_list(registry: &DocumentRegistry, document: &str) -> i32 {
    let doc = match registry.get(document) {
        Ok(doc) => doc,
        Err(e) => {
            eprintln!("Error: {e}");
            return 1;
        }
    };
    match doc.all_fragments() {
        Ok(fragments) => {
            for fragment in &fragments {
                print_fragment(fragment);
            }
            println!("{} fragment(s)", fragments.len());
            0
        }
        Err(e) => {
            eprintln!("Error: {e}");
            1
        }
    }
}

fn cmd_remove(registry: &DocumentRegistry, key: &FragmentKey) -> i32 {
    match registry.remove_fragment(key) {
        Ok(()) => {
            println!("Removed {key}");
            0
        }
        Err(e) => {
            eprintln!("Error: {e}");
            1
        }
    }
}

fn cmd_search(
    registry: &DocumentRegistry,
    document: &str,
    raw_requirements: &[String],
    contains: &[String],
) -> i32 {
    let mut requirements = Vec::new();
    for raw in raw_requirements {
        match parse_requirement(raw) {
            Ok(req) => requirements.push(req),
            Err(e) => {
                eprintln!("Error: {e}");
                return 1;
            }
        }
    }

    let doc = match registry.get(document) {
        Ok(doc) => doc,
        Err(e) => {
            eprintln!("Error: {e}");
            return 1;
        }
    };

    for key in contains {
        doc.register_plugin(Arc::new(TextContainsPlugin::new(key)));
    }
    doc.register_plugin(Arc::new(FieldEqualsPlugin::new()));
    doc.register_plugin(Arc::new(MetadataEqualsPlugin::new()));
    doc.register_plugin(Arc::new(StoreHydratePlugin::new()));

    match doc.search(&requirements) {
        Ok(fragments) => {
            for fragment in &fragments {
                print_fragment(fragment);
            }
            println!("{} fragment(s)", fragments.len());
            0
        }
        Err(e) => {
            eprintln!("Error: {e}");
            1
        }
    }
}

fn cmd_wipe(registry: &DocumentRegistry, document: &str) -> i32 {
    match registry.wipe(document) {
        Ok(()) => {
            println!("Wiped document '{document}'");
            0
        }
        Err(e) => {
            eprintln!("Error: {e}");
            1
        }
    }
}

fn main() {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let root = cli.root.unwrap_or_else(default_root);
    let registry = DocumentRegistry::new(root);

    let code = match cli.command {
        Commands::Upsert {
            document,
            handle,
            language,
            title,
            text,
            metadata,
        } => {
            let metadata = match metadata
                .as_deref()
                .map(serde_json::from_str::<Map<String, Value>>)
                .transpose()
            {
                Ok(m) => m,
                Err(e) => {
                    eprintln!("Error: invalid --metadata JSON: {e}");
                    std::process::exit(1);
                }
            };
            let mut fragment = Fragment::new(document, handle, language);
            fragment.title = title;
            fragment.text = text;
            fragment.metadata = metadata;
            cmd_upsert(&registry, fragment)
        }
        Commands::Get {
            document,
            handle,
            language,
        } => cmd_get(&registry, &FragmentKey::new(document, handle, language)),
        Commands::List { document } => cmd_list(&registry, &document),
        Commands::Remove {
            document,
            handle,
            language,
        } => cmd_remove(&registry, &FragmentKey::new(document, handle, language)),
        Commands::Search {
            document,
            requirements,
            contains,
        } => cmd_search(&registry, &document, &requirements, &contains),
        Commands::Wipe { document } => cmd_wipe(&registry, &document),
    };

    std::process::exit(code);
}
