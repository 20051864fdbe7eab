use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::Parser;
use dynastygen::genealogy::TraversalOptions;
use dynastygen::record::RecordOptions;
use dynastygen::source::{KnowledgeSource, MemorySource, WikidataClient};
use dynastygen::{export_characters, Config, PersonResolver, Qid};
use std::io::Write;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "dynastygen")]
#[command(about = "Generate character records for a person's genealogy from Wikidata")]
struct Args {
    /// Root person identifier (e.g. Q8081786 or an entity URL)
    #[arg(default_value = "Q8081786")]
    qid: String,

    /// Prefix for local character identifiers
    #[arg(long)]
    id_prefix: Option<String>,

    /// Prefix for name tokens
    #[arg(long)]
    name_prefix: Option<String>,

    /// Prefix for name tokens of people without a usable label
    #[arg(long)]
    name_fallback_prefix: Option<String>,

    #[arg(long)]
    culture: Option<String>,

    #[arg(long)]
    religion: Option<String>,

    /// Dynasty token written into every record
    #[arg(long)]
    dynasty: Option<String>,

    /// Country tag written into every record
    #[arg(long)]
    tag: Option<String>,

    /// Location token written as every record's birth place
    #[arg(long)]
    birth_location: Option<String>,

    /// Seconds to wait before each query
    #[arg(long)]
    sleep: Option<f64>,

    /// Generations of ancestors to walk
    #[arg(long)]
    depth: Option<usize>,

    /// Generations of descendants to walk
    #[arg(long)]
    descendant_depth: Option<usize>,

    /// Patriline steps to complete after collection (0 disables)
    #[arg(long)]
    ensure_fathers_depth: Option<usize>,

    /// Emit the root's family even if the root is not alive on the cutoff date
    #[arg(long)]
    include_root_if_not_alive: bool,

    /// Require a known birth date for descendants
    #[arg(long, overrides_with = "no_descendants_require_birth")]
    descendants_require_birth: bool,

    /// Accept descendants without a known birth date
    #[arg(long)]
    no_descendants_require_birth: bool,

    /// Reference date for liveness (YYYY-MM-DD)
    #[arg(long)]
    cutoff_date: Option<NaiveDate>,

    /// Read people from a JSON fixture instead of querying Wikidata
    #[arg(long)]
    fixture: Option<PathBuf>,

    /// Write records to this file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,
}

impl Args {
    /// Overlay command-line values onto the loaded configuration.
    fn apply(&self, config: &mut Config) {
        let record = &mut config.record;
        let overrides = [
            (&mut record.id_prefix, &self.id_prefix),
            (&mut record.name_prefix, &self.name_prefix),
            (&mut record.name_fallback_prefix, &self.name_fallback_prefix),
            (&mut record.culture, &self.culture),
            (&mut record.religion, &self.religion),
        ];
        for (target, value) in overrides {
            if let Some(value) = value {
                *target = value.clone();
            }
        }
        if self.dynasty.is_some() {
            record.dynasty = self.dynasty.clone();
        }
        if self.tag.is_some() {
            record.tag = self.tag.clone();
        }
        if self.birth_location.is_some() {
            record.birth_location = self.birth_location.clone();
        }

        if let Some(sleep) = self.sleep {
            config.source.request_delay_secs = sleep;
        }

        let traversal = &mut config.traversal;
        if let Some(depth) = self.depth {
            traversal.ancestor_depth = depth;
        }
        if let Some(depth) = self.descendant_depth {
            traversal.descendant_depth = depth;
        }
        if let Some(depth) = self.ensure_fathers_depth {
            traversal.ensure_fathers_depth = depth;
        }
        if self.include_root_if_not_alive {
            traversal.include_root_if_not_alive = true;
        }
        if self.descendants_require_birth {
            traversal.descendants_require_birth = true;
        }
        if self.no_descendants_require_birth {
            traversal.descendants_require_birth = false;
        }
        if let Some(date) = self.cutoff_date {
            traversal.cutoff_date = date;
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = Config::load()?;
    args.apply(&mut config);
    config.validate()?;

    // Logs go to stderr; stdout carries the records
    env_logger::Builder::from_env(
        env_logger::Env::default()
            .filter_or("RUST_LOG", &config.log_level)
    ).init();

    let root = Qid::parse(&args.qid)?;
    log::info!("Starting dynastygen v{} for {}", env!("CARGO_PKG_VERSION"), root);

    let text = match &args.fixture {
        Some(path) => {
            log::info!("Using fixture {}", path.display());
            let source = MemorySource::load(path)
                .with_context(|| format!("Failed to load fixture {}", path.display()))?;
            run(source, &config, &root).await
        }
        None => {
            log::info!("Querying {}", config.source.endpoint);
            let source = WikidataClient::new(&config.source)?;
            run(source, &config, &root).await
        }
    };

    match &args.output {
        Some(path) => {
            std::fs::write(path, &text)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            log::info!("Wrote records to {}", path.display());
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(text.as_bytes())?;
            stdout.flush()?;
        }
    }

    Ok(())
}

async fn run<S: KnowledgeSource>(source: S, config: &Config, root: &Qid) -> String {
    let mut resolver = PersonResolver::new(source, config.source.request_delay());
    let traversal = TraversalOptions::from(&config.traversal);
    let record = RecordOptions::from_config(&config.record, &config.traversal);

    let export = export_characters(&mut resolver, root, traversal, &record, &config.record.id_prefix).await;
    if export.genealogy.is_empty() {
        log::warn!("No one around {} is alive on {}; nothing to emit", root, config.traversal.cutoff_date);
    }
    export.text
}
