use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "modsort")]
#[command(about = "Classify Sims 4 mods and keep a Notion database in sync")]
#[command(version)]
pub struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Quiet output (errors only)
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Base directory (default: ~/.modsort)
    #[arg(long, global = true)]
    pub base_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
#[allow(clippy::enum_variant_names)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Classify a mod from its name and optional description/creator
    Classify {
        /// Mod name
        name: String,

        /// Mod description
        #[arg(short, long, default_value = "")]
        description: String,

        /// Mod creator
        #[arg(short, long, default_value = "")]
        creator: String,

        /// Print the classification as JSON
        #[arg(long)]
        json: bool,
    },

    /// Classify a JSON array of mods ({name, description, creator, url})
    Batch {
        /// JSON file, or "-" for stdin
        input: String,

        /// Print the classifications as JSON
        #[arg(long)]
        json: bool,
    },

    /// Scrape name, description and creator from mod pages
    Extract {
        /// Mod page URLs (pages that fail are reported empty when several are given)
        #[arg(required = true)]
        urls: Vec<String>,

        /// Print the record as JSON
        #[arg(long)]
        json: bool,
    },

    /// Extract, classify and add mods to the Notion database
    Add {
        /// Mod page URLs (with several, a failing URL does not stop the rest)
        #[arg(required = true)]
        urls: Vec<String>,

        /// Update priority/folder and append to Notes if the mod already exists
        #[arg(long)]
        update: bool,

        /// Show what would be written without calling Notion
        #[arg(long)]
        dry_run: bool,
    },

    /// Search the Notion database by mod URL, Notion link or name
    Search {
        /// URL or (part of) a mod name
        query: String,

        /// Maximum results to show
        #[arg(short, long, default_value = "5")]
        limit: usize,
    },

    /// Print the normalized form of a URL
    NormalizeUrl {
        /// URL to normalize
        url: String,
    },

    /// Show keyword tiers, score thresholds and sub-classification rules
    Rules,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Generate shell completions
    Completions {
        /// Shell type
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Get a config value
    Get {
        /// Config key (e.g., notion.database_id)
        key: String,
    },

    /// Set a config value
    Set {
        /// Config key (e.g., extractor.timeout_secs)
        key: String,

        /// Value to set
        value: String,
    },

    /// List all config values
    List,

    /// Show config file path
    Path,

    /// Initialize config file with defaults
    Init,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_classify() {
        let cli = Cli::parse_from(["modsort", "classify", "UI Cheats", "-c", "weerbesu", "--json"]);
        match cli.command {
            Some(Commands::Classify {
                name,
                description,
                creator,
                json,
            }) => {
                assert_eq!(name, "UI Cheats");
                assert_eq!(description, "");
                assert_eq!(creator, "weerbesu");
                assert!(json);
            }
            _ => panic!("expected classify"),
        }
    }

    #[test]
    fn test_parse_add_many_urls() {
        let cli = Cli::parse_from(["modsort", "add", "https://a.com/1", "https://a.com/2", "--update"]);
        match cli.command {
            Some(Commands::Add {
                urls,
                update,
                dry_run,
            }) => {
                assert_eq!(urls, vec!["https://a.com/1", "https://a.com/2"]);
                assert!(update);
                assert!(!dry_run);
            }
            _ => panic!("expected add"),
        }
        assert!(Cli::try_parse_from(["modsort", "add"]).is_err());
    }

    #[test]
    fn test_quiet_conflicts_with_verbose() {
        assert!(Cli::try_parse_from(["modsort", "-v", "-q", "rules"]).is_err());
    }
}
