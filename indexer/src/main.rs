use anyhow::Result;
use clap::{Parser, Subcommand};
use kb_core::{explain, load_corpus, search_top_k, Index, MatchTier};
use serde::Serialize;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "kb-indexer")]
#[command(about = "Build the in-memory index from page files and inspect it", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print corpus and vocabulary statistics
    Stats {
        /// Directory of page files (JSON / JSONL)
        #[arg(long, default_value = "./data")]
        input: String,
        /// How many of the most common terms to list
        #[arg(long, default_value_t = 20)]
        top: usize,
    },
    /// Run a query and print the ranked documents
    Query {
        #[arg(long, default_value = "./data")]
        input: String,
        /// Maximum number of results
        #[arg(long, default_value_t = kb_core::config::TOP_K)]
        k: usize,
        /// Show how each keyword was expanded
        #[arg(long, default_value_t = false)]
        explain: bool,
        /// Emit JSON instead of text
        #[arg(long, default_value_t = false)]
        json: bool,
        query: String,
    },
}

#[derive(Serialize)]
struct QueryOutput<'a> {
    query: &'a str,
    hits: Vec<HitOutput<'a>>,
    keywords: Vec<KeywordOutput<'a>>,
}

#[derive(Serialize)]
struct HitOutput<'a> {
    id: &'a str,
    title: &'a str,
    source: Option<&'a str>,
    score: f32,
}

#[derive(Serialize)]
struct KeywordOutput<'a> {
    keyword: String,
    expansions: Vec<(&'a str, f32, String)>,
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Stats { input, top } => stats(&input, top),
        Commands::Query { input, k, explain, json, query } => run_query(&input, &query, k, explain, json),
    }
}

fn build(input: &str) -> Result<Index> {
    let docs = load_corpus(input)?;
    let index = Index::build(docs, 1);
    tracing::debug!(input, num_docs = index.len(), "index ready");
    Ok(index)
}

fn stats(input: &str, top: usize) -> Result<()> {
    let index = build(input)?;
    println!("documents:   {}", index.len());
    println!("vocabulary:  {}", index.vocabulary().len());
    println!("stem groups: {}", index.stem_group_count());

    let mut by_df: Vec<(&str, usize)> = index
        .vocabulary()
        .iter()
        .map(|t| (t.as_str(), index.postings(t).len()))
        .collect();
    by_df.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(b.0)));
    if top > 0 && !by_df.is_empty() {
        println!("\nmost common terms (df, idf):");
        for (term, df) in by_df.into_iter().take(top) {
            println!("  {term:<20} {df:>6} {:>8.4}", index.idf(term).unwrap_or_default());
        }
    }
    Ok(())
}

fn tier_label(tier: MatchTier) -> String {
    match tier {
        MatchTier::Exact => "exact".into(),
        MatchTier::Stem => "stem".into(),
        MatchTier::Fuzzy { distance } => format!("fuzzy({distance})"),
    }
}

fn run_query(input: &str, query: &str, k: usize, show_explain: bool, json: bool) -> Result<()> {
    let index = build(input)?;
    let hits = search_top_k(query, &index, k);
    let keywords = if show_explain || json { explain(query, &index) } else { Vec::new() };

    if json {
        let out = QueryOutput {
            query,
            hits: hits
                .iter()
                .map(|h| HitOutput { id: &h.document.id, title: &h.document.title, source: h.document.source.as_deref(), score: h.score })
                .collect(),
            keywords: keywords
                .into_iter()
                .map(|kw| KeywordOutput {
                    keyword: kw.keyword,
                    expansions: kw.expansions.into_iter().map(|e| (e.term, e.weight, tier_label(e.tier))).collect(),
                })
                .collect(),
        };
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    if show_explain {
        for kw in &keywords {
            if kw.expansions.is_empty() {
                println!("{:<16} -> (no match)", kw.keyword);
                continue;
            }
            let parts: Vec<String> = kw
                .expansions
                .iter()
                .map(|e| format!("{} x{:.2} [{}]", e.term, e.weight, tier_label(e.tier)))
                .collect();
            println!("{:<16} -> {}", kw.keyword, parts.join(", "));
        }
        println!();
    }

    if hits.is_empty() {
        println!("no matching documents");
    }
    for (rank, hit) in hits.iter().enumerate() {
        println!("{:>2}. {:.4}  {}  [{}]", rank + 1, hit.score, hit.document.title, hit.document.id);
        if let Some(source) = &hit.document.source {
            println!("      {source}");
        }
    }
    Ok(())
}
