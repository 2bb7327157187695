use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "roomkey",
    version,
    about = "Deterministic render-cache keys for buyer-configured room visualization"
)]
pub struct Cli {
    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Compute the cache key for a selections file against one photo
    Key(KeyArgs),
    /// Compute the cache key and look it up in the render cache
    Check(CheckArgs),
    /// List subcategories a scene-visibility file suppresses
    Hidden(HiddenArgs),
    /// Show render-cache statistics
    Stats(StatsArgs),
    Version,
}

#[derive(clap::Args, Debug, Clone)]
pub struct KeyArgs {
    /// Engine config (generation parameters + rule tables); built-in rules
    /// are used when the file does not exist
    #[arg(long, default_value = "roomkey.yaml")]
    pub config: PathBuf,

    /// JSON file: subcategory id -> option id
    #[arg(long)]
    pub selections: PathBuf,

    #[arg(long, default_value = "")]
    pub photo_id: String,

    #[arg(long, default_value = "")]
    pub image_path: String,

    #[arg(long)]
    pub step: Option<String>,

    #[arg(long)]
    pub org: Option<String>,

    #[arg(long)]
    pub floorplan: Option<String>,

    /// JSON file: {"explicit": [...], "fallback": [...]}
    #[arg(long)]
    pub scope: Option<PathBuf>,

    /// JSON file: surface tag -> bool (missing tags count as visible)
    #[arg(long)]
    pub visibility: Option<PathBuf>,

    /// Content hash of a buyer-supplied source photo (switches to the short
    /// photo-anchored key)
    #[arg(long)]
    pub photo_hash: Option<String>,

    /// Output format: text|json
    #[arg(long, default_value = "text")]
    pub format: String,
}

#[derive(clap::Args, Debug, Clone)]
pub struct CheckArgs {
    #[command(flatten)]
    pub key: KeyArgs,

    #[arg(long, default_value = ".roomkey/renders.db")]
    pub db: PathBuf,
}

#[derive(clap::Args, Debug, Clone)]
pub struct HiddenArgs {
    #[arg(long, default_value = "roomkey.yaml")]
    pub config: PathBuf,

    /// JSON file: surface tag -> bool
    #[arg(long)]
    pub visibility: PathBuf,
}

#[derive(clap::Args, Debug, Clone)]
pub struct StatsArgs {
    #[arg(long, default_value = ".roomkey/renders.db")]
    pub db: PathBuf,
}
