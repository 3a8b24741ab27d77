use std::cmp;
use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use fast_index_rs::{
    FastIndex, Hit, IndexConfig, NormalizeOptions, ReplaceRuleSpec, RuleSet, SpellingMap,
};
use serde_json::{Value, json};
use tracing::debug;
use tracing_subscriber::{EnvFilter, fmt};

#[derive(Parser, Debug)]
#[command(name = "fast-index-rs", about = "Fuzzy alias lookup over JSON items", version)]
pub struct Cli {
    /// Emit JSON instead of human-readable tables.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show the weighted lookup keys derived from each text.
    Keys {
        /// Texts to normalize and expand.
        #[arg(required = true)]
        texts: Vec<String>,
        #[command(flatten)]
        index: IndexArgs,
    },
    /// Load items from a JSON file and look up one or more queries.
    Query {
        /// JSON array of items, or one item per line for `.jsonl` files.
        #[arg(short, long)]
        data: PathBuf,
        /// Queries to look up.
        #[arg(required = true)]
        queries: Vec<String>,
        /// Maximum number of matches to print per query.
        #[arg(short, long, default_value_t = 10)]
        limit: usize,
        /// Build keys on all cores before inserting.
        #[arg(long)]
        parallel: bool,
        #[command(flatten)]
        index: IndexArgs,
    },
}

#[derive(Args, Debug)]
struct IndexArgs {
    /// Item fields to index, in order.
    #[arg(short, long = "field", default_values_t = ["label".to_string()])]
    fields: Vec<String>,
    /// JSON file of `{pattern, replacement, weight}` spelling rules.
    #[arg(short, long)]
    rules: Option<PathBuf>,
    /// Do not fold accented letters.
    #[arg(long)]
    keep_accents: bool,
    /// Do not replace ASCII punctuation with spaces.
    #[arg(long)]
    keep_punctuation: bool,
    /// Do not collapse separator runs.
    #[arg(long)]
    keep_spaces: bool,
}

impl IndexArgs {
    fn config(&self) -> Result<IndexConfig, Box<dyn Error>> {
        let mut config = IndexConfig::default()
            .with_fields(self.fields.iter().cloned())
            .with_normalize(NormalizeOptions {
                remove_non_alpha: !self.keep_punctuation,
                remove_accents: !self.keep_accents,
                clean_spaces: !self.keep_spaces,
            });
        if let Some(path) = &self.rules {
            let raw = fs::read_to_string(path)
                .map_err(|err| format!("Failed to read rules {}: {err}", path.display()))?;
            let specs: Vec<ReplaceRuleSpec> = serde_json::from_str(&raw)?;
            let rules = RuleSet::from_specs(specs)?;
            debug!(rules = rules.len(), path = %path.display(), "loaded spelling rules");
            config = config.with_spellings(rules);
        }
        Ok(config)
    }
}

pub fn run() -> Result<(), Box<dyn Error>> {
    init_tracing();
    let cli = Cli::parse();
    match cli.command {
        Command::Keys { texts, index } => handle_keys(texts, &index, cli.json),
        Command::Query {
            data,
            queries,
            limit,
            parallel,
            index,
        } => handle_query(&data, queries, limit, parallel, &index, cli.json),
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn handle_keys(
    texts: Vec<String>,
    args: &IndexArgs,
    as_json: bool,
) -> Result<(), Box<dyn Error>> {
    let index: FastIndex = FastIndex::new(args.config()?);
    let mut rows = Vec::with_capacity(texts.len());
    for text in texts {
        let keys = index.keys(&text)?;
        rows.push((text, keys));
    }

    if as_json {
        let payload: Vec<_> = rows
            .iter()
            .map(|(text, keys)| {
                json!({
                    "text": text,
                    "keys": keys.entries().map(|(key, weight)| {
                        json!({"key": key, "weight": weight})
                    }).collect::<Vec<_>>(),
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&payload)?);
    } else {
        print_keys_table(&rows);
    }
    Ok(())
}

fn handle_query(
    data: &Path,
    queries: Vec<String>,
    limit: usize,
    parallel: bool,
    args: &IndexArgs,
    as_json: bool,
) -> Result<(), Box<dyn Error>> {
    let limit = cmp::max(1, limit);
    let items = read_items(data)?;
    let mut index = FastIndex::new(args.config()?);
    if parallel {
        index.load_parallel(&items)?;
    } else {
        index.load_sync(items)?;
    }

    let mut payload = Vec::with_capacity(queries.len());
    for query in &queries {
        let hits = index.get(query)?;
        let shown = &hits[..hits.len().min(limit)];
        if as_json {
            payload.push(json!({
                "query": query,
                "limit": limit,
                "total": hits.len(),
                "results": shown,
            }));
        } else {
            print_hits_table(query, shown, hits.len());
        }
    }
    if as_json {
        println!("{}", serde_json::to_string_pretty(&payload)?);
    }
    Ok(())
}

fn read_items(path: &Path) -> Result<Vec<Value>, Box<dyn Error>> {
    let raw = fs::read_to_string(path)
        .map_err(|err| format!("Failed to read data {}: {err}", path.display()))?;
    let is_lines = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("jsonl"));
    if is_lines {
        let mut items = Vec::new();
        for (idx, line) in raw.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let item: Value = serde_json::from_str(line)
                .map_err(|err| format!("Invalid JSON on line {}: {err}", idx + 1))?;
            items.push(item);
        }
        return Ok(items);
    }
    match serde_json::from_str::<Value>(&raw)? {
        Value::Array(items) => Ok(items),
        item => Ok(vec![item]),
    }
}

fn print_keys_table(rows: &[(String, SpellingMap)]) {
    let width = rows
        .iter()
        .flat_map(|(_, keys)| keys.entries().map(|(key, _)| key.chars().count()))
        .max()
        .unwrap_or(3)
        .max("KEY".len());
    for (text, keys) in rows {
        println!("Keys for \"{text}\":");
        println!("{:<width$}  {}", "KEY", "WEIGHT", width = width);
        println!("{:-<width$}  {}", "", "------", width = width);
        for (key, weight) in keys.entries() {
            println!("{:<width$}  {:.3}", key, weight, width = width);
        }
    }
}

fn print_hits_table(query: &str, hits: &[Hit<'_, Value>], total: usize) {
    if hits.is_empty() {
        println!("No items matched \"{query}\".");
        return;
    }
    println!("Matches for \"{query}\" ({} of {total}):", hits.len());
    println!("{:<6}  {}", "SCORE", "ITEM");
    println!("{:-<6}  {}", "", "----");
    for hit in hits {
        println!("{:<6.3}  {}", hit.score, hit.value);
    }
}
