use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{CommandFactory, Parser};
use clap_complete::generate;
use colored::{ColoredString, Colorize};
use serde_json::Value;

use modsort_core::classify::{
    Classification, KeywordTier, ModClassifier, Priority, MAX_SCORE, SCORE_THRESHOLDS,
};
use modsort_core::config::Config;
use modsort_core::extract::{Extractor, HttpExtractor};
use modsort_core::link::normalize_url;
use modsort_core::notion::{
    ModPage, NotionClient, NotionStore, PageProperties, SyncAction, SyncMode, SyncReport,
};
use modsort_core::{ModRecord, ModSortError, Result};

mod args;
use args::{Cli, Commands, ConfigAction, Shell};

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    let base_dir = resolve_base_dir(cli.base_dir);
    log::debug!("base dir: {}", base_dir.display());

    let result = match cli.command {
        Some(Commands::Classify {
            name,
            description,
            creator,
            json,
        }) => handle_classify(&base_dir, &name, &description, &creator, json),
        Some(Commands::Batch { input, json }) => handle_batch(&base_dir, &input, json),
        Some(Commands::Extract { urls, json }) => handle_extract(&base_dir, &urls, json),
        Some(Commands::Add {
            urls,
            update,
            dry_run,
        }) => handle_add(&base_dir, &urls, update, dry_run),
        Some(Commands::Search { query, limit }) => handle_search(&base_dir, &query, limit),
        Some(Commands::NormalizeUrl { url }) => handle_normalize_url(&url),
        Some(Commands::Rules) => handle_rules(&base_dir),
        Some(Commands::Config { action }) => handle_config(action, &base_dir),
        Some(Commands::Completions { shell }) => {
            handle_completions(shell);
            Ok(())
        }
        None => {
            Cli::command().print_help().ok();
            Ok(())
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", "[ERROR]".red().bold(), e);
            ExitCode::from(e.exit_code() as u8)
        }
    }
}

/// `RUST_LOG` wins; otherwise the verbosity flags pick the level.
fn init_logging(verbose: bool, quiet: bool) {
    let level = if verbose {
        "debug"
    } else if quiet {
        "error"
    } else {
        "warn"
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}

fn handle_completions(shell: Shell) {
    let mut cmd = Cli::command();
    let shell = match shell {
        Shell::Bash => clap_complete::Shell::Bash,
        Shell::Zsh => clap_complete::Shell::Zsh,
        Shell::Fish => clap_complete::Shell::Fish,
        Shell::PowerShell => clap_complete::Shell::PowerShell,
        Shell::Elvish => clap_complete::Shell::Elvish,
    };
    generate(shell, &mut cmd, "modsort", &mut io::stdout());
}

fn resolve_base_dir(cli_base: Option<PathBuf>) -> PathBuf {
    if let Some(base) = cli_base {
        return base;
    }

    if let Ok(base) = std::env::var("MODSORT_BASE") {
        return PathBuf::from(base);
    }

    dirs::home_dir()
        .map(|h| h.join(".modsort"))
        .unwrap_or_else(|| PathBuf::from(".modsort"))
}

fn load_classifier(config: &Config) -> Result<ModClassifier> {
    Ok(ModClassifier::new(config.rule_set()?))
}

fn open_store(config: &Config) -> Result<NotionStore<NotionClient>> {
    let database_id = config.database_id()?;
    let client = NotionClient::from_env(&config.notion.api_key_env)?;
    Ok(NotionStore::new(
        client,
        database_id,
        config.notion.properties.clone(),
    ))
}

// ============================================================================
// Classification
// ============================================================================

fn handle_classify(
    base_dir: &Path,
    name: &str,
    description: &str,
    creator: &str,
    json: bool,
) -> Result<()> {
    if name.trim().is_empty() {
        return Err(ModSortError::InvalidInput {
            reason: "mod name must not be empty".to_string(),
        });
    }

    let config = Config::load(base_dir)?;
    let classifier = load_classifier(&config)?;
    let classification = classifier.classify(name, description, creator);

    if json {
        println!("{}", serde_json::to_string_pretty(&classification)?);
    } else {
        print_classification(&classification);
    }
    Ok(())
}

fn handle_batch(base_dir: &Path, input: &str, json: bool) -> Result<()> {
    let content = if input == "-" {
        let mut buf = String::new();
        io::stdin().read_to_string(&mut buf)?;
        buf
    } else {
        fs::read_to_string(input)?
    };

    let items = match serde_json::from_str::<Value>(&content)? {
        Value::Array(items) => items,
        _ => {
            return Err(ModSortError::InvalidInput {
                reason: "batch input must be a JSON array of mods".to_string(),
            })
        }
    };

    let config = Config::load(base_dir)?;
    let classifier = load_classifier(&config)?;
    let results = classifier.classify_json_batch(&items);

    if json {
        println!("{}", serde_json::to_string_pretty(&results)?);
        return Ok(());
    }

    println!();
    for (i, c) in results.iter().enumerate() {
        let name = if c.mod_name.is_empty() {
            "(unnamed)".dimmed()
        } else {
            c.mod_name.bold()
        };
        let mut line = format!(
            "{:>3}. {}  {} {}  {}%",
            i + 1,
            name,
            priority_label(c.priority),
            c.folder,
            c.confidence_percent()
        );
        if let Some(notes) = &c.notes_suffix {
            line.push_str(&format!("  {}", notes.dimmed()));
        }
        if c.is_fallback() {
            line.push_str(&format!("  {}", "(review)".yellow()));
        }
        println!("{}", line);
    }

    let failed = results.iter().filter(|c| c.is_fallback()).count();
    println!();
    println!(
        "{} {} mods ({} need review)",
        "Classified:".green(),
        results.len(),
        failed
    );
    Ok(())
}

fn print_classification(c: &Classification) {
    println!();
    println!("{}", c.mod_name.bold());
    println!(
        "  Priority:   {} ({})",
        priority_label(c.priority),
        c.folder.cyan()
    );
    println!(
        "  Score:      {}/{} (removal {}, framework {}, essential {})",
        c.score,
        MAX_SCORE,
        c.breakdown.removal_impact,
        c.breakdown.framework,
        c.breakdown.essentiality
    );
    println!("  Confidence: {}%", c.confidence_percent());
    if let Some(tier) = c.breakdown.tier {
        println!("  Tier:       {}", tier);
    }
    if let Some(notes) = &c.notes_suffix {
        println!("  Notes:      {}", notes);
    }
    if c.is_fallback() {
        println!("  {}", "Could not classify, review manually".yellow());
    }
    println!();
}

fn priority_label(priority: Priority) -> ColoredString {
    let label = format!("P{}", priority);
    match priority.value() {
        1 => label.red().bold(),
        2 => label.yellow().bold(),
        3 => label.green(),
        4 => label.blue(),
        5 => label.magenta(),
        _ => label.dimmed(),
    }
}

// ============================================================================
// Extraction / Notion
// ============================================================================

fn handle_extract(base_dir: &Path, urls: &[String], json: bool) -> Result<()> {
    let config = Config::load(base_dir)?;
    let extractor = HttpExtractor::new(&config.extractor)?;

    // A single URL reports its error; a batch keeps going.
    let records = match urls {
        [url] => vec![extractor.extract(url)?],
        _ => extractor.extract_batch(urls),
    };

    if json {
        match records.as_slice() {
            [record] => println!("{}", serde_json::to_string_pretty(record)?),
            _ => println!("{}", serde_json::to_string_pretty(&records)?),
        }
    } else {
        for record in &records {
            print_record(record);
        }
    }
    Ok(())
}

fn print_record(record: &ModRecord) {
    println!();
    println!("{} {}", "Name:       ".cyan(), record.name);
    println!("{} {}", "Creator:    ".cyan(), record.creator);
    println!("{} {}", "URL:        ".cyan(), record.url);
    println!("{} {}", "Description:".cyan(), record.description);
    println!();
}

fn handle_add(base_dir: &Path, urls: &[String], update: bool, dry_run: bool) -> Result<()> {
    let config = Config::load(base_dir)?;
    let extractor = HttpExtractor::new(&config.extractor)?;
    let classifier = load_classifier(&config)?;
    let mode = if update {
        SyncMode::Upsert
    } else {
        SyncMode::CreateOnly
    };

    if dry_run {
        for url in urls {
            match extractor.extract_for_import(url) {
                Ok(record) => {
                    let classification = classifier.classify_record(&record);
                    print_classification(&classification);
                    let properties = PageProperties::for_new_page(&record, &classification);
                    println!("{}", "[DRY RUN] Would write properties:".yellow());
                    let json = properties.to_json(&config.notion.properties);
                    println!("{}", serde_json::to_string_pretty(&json)?);
                }
                Err(e) if urls.len() == 1 => return Err(e),
                Err(e) => println!("{} {}: {}", "Failed:".red(), url, e),
            }
        }
        return Ok(());
    }

    let store = open_store(&config)?;

    if let [url] = urls {
        let record = extractor.extract_for_import(url)?;
        let classification = classifier.classify_record(&record);
        print_classification(&classification);
        let report = store.sync(&record, &classification, mode)?;
        print_sync_report(&record.name, &report);
        return Ok(());
    }

    let outcomes = store.import_urls(&extractor, &classifier, urls, mode);
    println!();
    for (i, outcome) in outcomes.iter().enumerate() {
        let (priority, name) = match &outcome.classification {
            Some(c) => (format!("P{}", c.priority), c.mod_name.as_str()),
            None => ("--".to_string(), ""),
        };
        let status = match &outcome.result {
            Ok(report) => match report.action {
                SyncAction::Created => format!("{:<8}", "created").green(),
                SyncAction::Updated => format!("{:<8}", "updated").green(),
                SyncAction::Skipped => format!("{:<8}", "skipped").yellow(),
            },
            Err(_) => format!("{:<8}", "failed").red(),
        };
        println!(
            "{:>3}. {} {:<3} {}  {}",
            i + 1,
            status,
            priority,
            name.bold(),
            outcome.url.dimmed()
        );
        if let Err(e) = &outcome.result {
            println!("     {}", e.to_string().dimmed());
        }
    }

    let count = |action: SyncAction| {
        outcomes
            .iter()
            .filter(|o| matches!(&o.result, Ok(r) if r.action == action))
            .count()
    };
    let failed = outcomes.iter().filter(|o| o.is_failure()).count();
    println!();
    println!(
        "{} {} created, {} updated, {} skipped, {} failed",
        "Imported:".green(),
        count(SyncAction::Created),
        count(SyncAction::Updated),
        count(SyncAction::Skipped),
        failed
    );
    Ok(())
}

fn print_sync_report(name: &str, report: &SyncReport) {
    match report.action {
        SyncAction::Created => {
            println!("{} {} ({})", "Created:".green(), name, report.page_id);
        }
        SyncAction::Updated => {
            println!("{} {} ({})", "Updated:".green(), name, report.page_id);
            if report.notes_appended {
                println!("  Notes extended");
            }
        }
        SyncAction::Skipped => {
            println!(
                "{} {} already exists ({}), use --update to refresh it",
                "Skipped:".yellow(),
                name,
                report.page_id
            );
        }
    }
    log::debug!(
        "synced at {}",
        report.synced_at.format("%Y-%m-%d %H:%M:%S UTC")
    );
}

fn handle_search(base_dir: &Path, query: &str, limit: usize) -> Result<()> {
    if query.trim().is_empty() {
        return Err(ModSortError::InvalidInput {
            reason: "search query must not be empty".to_string(),
        });
    }

    let config = Config::load(base_dir)?;
    let store = open_store(&config)?;
    let pages = store.search(query, limit)?;

    if pages.is_empty() {
        println!("No mods found for '{}'", query);
        return Ok(());
    }

    println!();
    for page in &pages {
        print_page(page);
    }
    println!("{} {} result(s)", "Found:".green(), pages.len());
    Ok(())
}

fn print_page(page: &ModPage) {
    println!("{}", page.name.bold());
    if !page.creator.is_empty() {
        println!("  Creator:  {}", page.creator);
    }
    if !page.priority.is_empty() || !page.folder.is_empty() {
        println!("  Priority: {} ({})", page.priority, page.folder.cyan());
    }
    if !page.url.is_empty() {
        println!("  Link:     {}", page.url);
    }
    for line in &page.notes {
        println!("  Notes:    {}", line.dimmed());
    }
    println!("  Page:     {}", page.page_id.dimmed());
    println!();
}

fn handle_normalize_url(url: &str) -> Result<()> {
    println!("{}", normalize_url(url)?);
    Ok(())
}

// ============================================================================
// Rules / Config
// ============================================================================

fn handle_rules(base_dir: &Path) -> Result<()> {
    let config = Config::load(base_dir)?;
    let rules = config.rule_set()?;

    println!();
    println!("{}", "Keyword tiers (first match wins):".bold());
    for (tier, keywords) in rules.tiers() {
        let framework = u8::from(tier == KeywordTier::Core);
        println!(
            "  {:<9} removal {}  framework {}  essential {}",
            tier.to_string().cyan(),
            tier.removal_impact(),
            framework,
            tier.essentiality()
        );
        println!("            {}", keywords.join(", ").dimmed());
    }

    println!();
    println!("{}", "Score thresholds:".bold());
    for (min, priority) in SCORE_THRESHOLDS {
        let priority = Priority::new(priority)?;
        println!("  score >= {}  ->  {} {}", min, priority_label(priority), priority.folder());
    }
    println!(
        "  score == 2  ->  {} {}",
        priority_label(Priority::PERSISTENT),
        Priority::PERSISTENT.folder()
    );
    println!(
        "  otherwise   ->  {} {}",
        priority_label(Priority::COSMETIC),
        Priority::COSMETIC.folder()
    );

    println!();
    println!("{}", "Folders:".bold());
    for priority in Priority::all() {
        println!("  {}  {}", priority_label(priority), priority.folder());
    }

    println!();
    println!("{}", "Sub-classification (first match wins):".bold());
    for rule in rules.subclasses() {
        println!("  {:<12} {}", rule.keyword.cyan(), rule.note());
    }
    println!();
    Ok(())
}

fn handle_config(action: ConfigAction, base_dir: &Path) -> Result<()> {
    match action {
        ConfigAction::Get { key } => {
            let config = Config::load(base_dir)?;
            match config.get(&key) {
                Some(value) => {
                    println!("{}", value);
                }
                None => {
                    return Err(ModSortError::ConfigKeyNotFound { key });
                }
            }
        }
        ConfigAction::Set { key, value } => {
            let mut config = Config::load(base_dir)?;
            config.set(&key, &value)?;
            config.save(base_dir)?;
            println!("{} {} = {}", "Set:".green(), key, value);
        }
        ConfigAction::List => {
            let config = Config::load(base_dir)?;
            println!();
            for (key, value) in config.list() {
                println!("{} = {}", key.cyan(), value);
            }
            println!();
        }
        ConfigAction::Path => {
            let path = Config::path(base_dir);
            println!("{}", path.display());
        }
        ConfigAction::Init => {
            let path = Config::init(base_dir)?;
            println!("{} {}", "Initialized:".green(), path.display());
        }
    }

    Ok(())
}
