//! dmx-demo: build toy-encrypted DM events and run them through the pipeline

use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use dmx_core::{
    harness::{gift_wrap, hex_key, legacy_dm, ToyDecryptor},
    Bech32KeyNormalizer, DecryptConfig, DecryptContextBuilder, DecryptorCandidate, DmDecryptor,
};

/// DMX demo - toy direct-message encryption and decryption
#[derive(Parser, Debug)]
#[command(name = "dmx-demo")]
#[command(version, about = "Build toy-encrypted DM events and decrypt them")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path (overrides DMX_CONFIG)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print a toy-encrypted event as JSON
    Seal {
        #[arg(long, value_enum, default_value = "gift-wrap")]
        kind: EventKind,
        #[arg(long, default_value = "nip44")]
        scheme: String,
        /// Sender key (hex); defaults to a fixed test key
        #[arg(long)]
        sender: Option<String>,
        /// Recipient key (hex); defaults to a fixed test key
        #[arg(long)]
        recipient: Option<String>,
        #[arg(long)]
        message: String,
    },
    /// Decrypt an event read from a file, or stdin when the path is "-"
    Open {
        #[arg(long, default_value = "-")]
        event: String,
        /// Acting user's key, hex or npub
        #[arg(long, env = "DMX_ACTOR")]
        actor: String,
        /// Toy schemes to register as decryptors, in priority order
        #[arg(long = "scheme", default_values_t = vec!["nip44".to_string(), "nip04".to_string()])]
        schemes: Vec<String>,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum EventKind {
    Legacy,
    GiftWrap,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("reading config {}", path.display()))?;
            DecryptConfig::from_toml_str(&content)?
        }
        None => DecryptConfig::load()?,
    };

    match cli.command {
        Commands::Seal {
            kind,
            scheme,
            sender,
            recipient,
            message,
        } => {
            let sender = sender.unwrap_or_else(|| hex_key(1));
            let recipient = recipient.unwrap_or_else(|| hex_key(2));
            let event = match kind {
                EventKind::Legacy => legacy_dm(&scheme, &sender, &recipient, &message),
                EventKind::GiftWrap => {
                    gift_wrap(&scheme, &hex_key(9), &sender, &recipient, &message).wrap
                }
            };
            println!("{}", serde_json::to_string_pretty(&event)?);
            Ok(())
        }
        Commands::Open {
            event,
            actor,
            schemes,
        } => {
            let raw = if event == "-" {
                let mut buf = String::new();
                std::io::stdin()
                    .read_to_string(&mut buf)
                    .context("reading event from stdin")?;
                buf
            } else {
                std::fs::read_to_string(&event).with_context(|| format!("reading {}", event))?
            };
            let value: serde_json::Value = serde_json::from_str(&raw).context("parsing event JSON")?;

            let normalizer = Arc::new(Bech32KeyNormalizer);
            let ctx = DecryptContextBuilder::new()
                .with_normalizer(normalizer.clone())
                .actor(actor)
                .candidates(schemes.iter().enumerate().map(|(i, scheme)| {
                    DecryptorCandidate::from_decryptor(ToyDecryptor::new(scheme))
                        .with_scheme(scheme.clone())
                        .with_priority(i as i32)
                        .with_source("toy")
                }))
                .build();

            let service = DmDecryptor::new(config).with_normalizer(normalizer);
            let result = service.decrypt_value(&value, &ctx).await;
            info!(ok = result.ok, errors = result.errors.len(), "decrypt finished");

            println!("{}", serde_json::to_string_pretty(&result)?);
            if !result.ok {
                anyhow::bail!("decryption failed");
            }
            Ok(())
        }
    }
}
