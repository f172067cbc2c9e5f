//! wordvec CLI
//!
//! Offline queries against a vector file, either one-shot or through an
//! interactive prompt.

use clap::{Parser, Subcommand};
use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Instant;
use wordvec::vector::{write_table, LoadStage};
use wordvec::{AnalogySolver, Neighbor, VectorStore};

/// wordvec CLI - Query Word Vectors Offline
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Vector file (GloVe/word2vec text or binary table)
    #[arg(long, env = "WORDVEC_VECTORS", default_value = "data/glove.6B.50d.txt")]
    vectors: PathBuf,

    /// Run a single query instead of the interactive prompt
    #[command(subcommand)]
    command: Option<Query>,
}

#[derive(Subcommand, Debug)]
enum Query {
    /// Cosine similarity between two words
    Similarity { word1: String, word2: String },

    /// Nearest neighbors of a word
    Neighbors {
        word: String,
        #[arg(long, default_value_t = 10)]
        topn: usize,
    },

    /// Solve "a - b + c"
    Analogy {
        a: String,
        b: String,
        c: String,
        #[arg(long, default_value_t = 5)]
        topn: usize,
    },

    /// Vocabulary size, dimension and sample words
    Info,

    /// Rewrite the loaded vectors as a binary table
    Convert {
        #[arg(short, long)]
        output: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    println!("Loading {}...", args.vectors.display());
    let started = Instant::now();
    let mut last_stage = None;
    let store = VectorStore::load_with_progress(&args.vectors, &mut |percent, stage: LoadStage| {
        if last_stage != Some(stage) {
            println!("  [{:>3}%] {}", percent, stage.message());
            last_stage = Some(stage);
        }
    })?;
    println!(
        "Loaded {} words ({} dimensions) in {:.2?}\n",
        store.len(),
        store.dimension(),
        started.elapsed()
    );

    if let Some(query) = args.command {
        return execute(&store, query);
    }

    println!("Type 'help' for available commands, 'quit' to exit.\n");

    loop {
        print!("wordvec> ");
        io::stdout().flush()?;

        let mut input = String::new();
        if io::stdin().read_line(&mut input)? == 0 {
            break;
        }
        let input = input.trim();

        if input.is_empty() {
            continue;
        }

        if input.eq_ignore_ascii_case("quit") || input.eq_ignore_ascii_case("exit") {
            println!("Goodbye!");
            break;
        }

        if input.eq_ignore_ascii_case("help") {
            print_help();
            continue;
        }

        match parse_command(input).and_then(|query| execute(&store, query)) {
            Ok(()) => {}
            Err(e) => eprintln!("Error: {}", e),
        }
    }

    Ok(())
}

fn parse_command(input: &str) -> anyhow::Result<Query> {
    let parts: Vec<&str> = input.split_whitespace().collect();

    if parts.is_empty() {
        anyhow::bail!("Empty command");
    }

    let cmd = parts[0].to_lowercase();

    match cmd.as_str() {
        "sim" | "similarity" => {
            if parts.len() < 3 {
                anyhow::bail!("sim requires two words: sim <word1> <word2>");
            }
            Ok(Query::Similarity {
                word1: parts[1].to_string(),
                word2: parts[2].to_string(),
            })
        }

        "nn" | "neighbors" => {
            if parts.len() < 2 {
                anyhow::bail!("nn requires a word: nn <word> [topn]");
            }
            let topn = match parts.get(2) {
                Some(n) => n.parse::<usize>()?,
                None => 10,
            };
            Ok(Query::Neighbors {
                word: parts[1].to_string(),
                topn,
            })
        }

        "analogy" => {
            if parts.len() < 4 {
                anyhow::bail!("analogy requires three words: analogy <a> <b> <c> [topn]");
            }
            let topn = match parts.get(4) {
                Some(n) => n.parse::<usize>()?,
                None => 5,
            };
            Ok(Query::Analogy {
                a: parts[1].to_string(),
                b: parts[2].to_string(),
                c: parts[3].to_string(),
                topn,
            })
        }

        "info" => Ok(Query::Info),

        _ => anyhow::bail!("Unknown command: {}. Type 'help' for available commands.", cmd),
    }
}

fn execute(store: &VectorStore, query: Query) -> anyhow::Result<()> {
    match query {
        Query::Similarity { word1, word2 } => {
            let (word1, word2) = (word1.to_lowercase(), word2.to_lowercase());
            let similarity = store.similarity(&word1, &word2)?;
            println!("similarity({}, {}) = {:.4}", word1, word2, similarity);
        }

        Query::Neighbors { word, topn } => {
            let word = word.to_lowercase();
            let topn = topn.min(store.len().saturating_sub(1));
            print_neighbors(&store.neighbors(&word, topn)?);
        }

        Query::Analogy { a, b, c, topn } => {
            let (a, b, c) = (a.to_lowercase(), b.to_lowercase(), c.to_lowercase());
            println!("{} - {} + {}", a, b, c);
            print_neighbors(&AnalogySolver::new(store).solve(&a, &b, &c, topn)?);
        }

        Query::Info => {
            println!("vocabulary size:   {}", store.len());
            println!("vector dimensions: {}", store.dimension());
            println!("sample words:      {}", store.sample_words(20).join(", "));
        }

        Query::Convert { output } => {
            write_table(&output, store)?;
            println!("Wrote {} words to {}", store.len(), output.display());
        }
    }
    Ok(())
}

fn print_neighbors(neighbors: &[Neighbor]) {
    if neighbors.is_empty() {
        println!("(no results)");
    }
    for (rank, neighbor) in neighbors.iter().enumerate() {
        println!("{:>3}. {:<24} {:.4}", rank + 1, neighbor.word, neighbor.similarity);
    }
}

fn print_help() {
    println!(
        r#"
Available commands:

  sim <word1> <word2>          - Cosine similarity between two words
  nn <word> [topn]             - Nearest neighbors (default topn 10)
  analogy <a> <b> <c> [topn]   - Words closest to a - b + c (default topn 5)
  info                         - Vocabulary size, dimension and sample words

  help                         - Show this help
  quit / exit                  - Exit the CLI

Examples:
  sim king queen
  nn frog 5
  analogy king man woman
"#
    );
}
