//! wordvec Server Binary
//!
//! Serves similarity, neighbor and analogy queries over HTTP while the
//! vector file loads in the background.

use clap::Parser;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};
use wordvec::{Config, Server};

/// wordvec Server - Word Embedding Lookup Service
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Bind address
    #[arg(short, long, env = "WORDVEC_BIND", default_value = "0.0.0.0")]
    bind: String,

    /// Port number
    #[arg(short, long, env = "PORT", default_value_t = 8000)]
    port: u16,

    /// Vector file (GloVe/word2vec text or binary table)
    #[arg(long, env = "WORDVEC_VECTORS", default_value = "data/glove.6B.50d.txt")]
    vectors: PathBuf,

    /// Largest topn a query may ask for
    #[arg(long, env = "WORDVEC_MAX_TOPN", default_value_t = 20)]
    max_topn: usize,

    /// Longest accepted query word
    #[arg(long, env = "WORDVEC_MAX_WORD_LEN", default_value_t = 32)]
    max_word_len: usize,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("wordvec=info".parse()?))
        .init();

    let args = Args::parse();

    let config = Config::default()
        .with_bind(&args.bind)
        .with_port(args.port)
        .with_vectors_path(args.vectors)
        .with_max_topn(args.max_topn)
        .with_max_word_len(args.max_word_len);
    config.validate()?;

    info!(
        "Starting wordvec server on {} (vectors: {}, max topn: {})",
        config.addr(),
        config.vectors_path.display(),
        config.max_topn
    );

    Server::new(config).run().await?;

    Ok(())
}
