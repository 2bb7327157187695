use crate::cli::args::{CheckArgs, Cli, Command, HiddenArgs, KeyArgs, StatsArgs};
use anyhow::{Context, Result};
use roomkey_core::config::EngineConfig;
use roomkey_core::engine::planner::{PlanRequest, Planner, RenderPlan};
use roomkey_core::model::{PhotoContext, Selections};
use roomkey_core::storage::Store;
use roomkey_core::visibility::SurfaceVisibility;
use serde::Deserialize;
use std::path::Path;

pub mod exit_codes {
    pub const OK: i32 = 0;
    pub const MISS: i32 = 1;
    pub const CONFIG_ERROR: i32 = 2;
}

#[derive(Debug, Default, Deserialize)]
struct ScopeFile {
    #[serde(default)]
    explicit: Vec<String>,
    #[serde(default)]
    fallback: Vec<String>,
}

pub fn dispatch(cli: Cli) -> Result<i32> {
    match cli.cmd {
        Command::Key(args) => cmd_key(args),
        Command::Check(args) => cmd_check(args),
        Command::Hidden(args) => cmd_hidden(args),
        Command::Stats(args) => cmd_stats(args),
        Command::Version => {
            println!("roomkey {}", env!("CARGO_PKG_VERSION"));
            Ok(exit_codes::OK)
        }
    }
}

fn load_engine_config(path: &Path) -> Result<EngineConfig> {
    if path.exists() {
        EngineConfig::load(path)
    } else {
        Ok(EngineConfig::builtin())
    }
}

fn open_store(path: &Path) -> Result<Store> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
    }
    let store = Store::open(path)?;
    store.init_schema()?;
    Ok(store)
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path, what: &str) -> Result<T> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {} file: {}", what, path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse {} file: {}", what, path.display()))
}

struct PlanInputs {
    selections: Selections,
    photo: PhotoContext,
    scope: ScopeFile,
    visibility: Option<SurfaceVisibility>,
}

fn load_plan_inputs(args: &KeyArgs) -> Result<PlanInputs> {
    let selections: Selections = read_json(&args.selections, "selections")?;
    let scope = match &args.scope {
        Some(path) => read_json(path, "scope")?,
        None => ScopeFile::default(),
    };
    let visibility = match &args.visibility {
        Some(path) => Some(read_json(path, "visibility")?),
        None => None,
    };
    let photo = PhotoContext {
        photo_id: args.photo_id.clone(),
        image_path: args.image_path.clone(),
        step_slug: args.step.clone(),
        org_slug: args.org.clone(),
        floorplan_slug: args.floorplan.clone(),
    };
    Ok(PlanInputs {
        selections,
        photo,
        scope,
        visibility,
    })
}

fn plan(args: &KeyArgs) -> Result<RenderPlan> {
    let config = load_engine_config(&args.config)?;
    let planner = Planner::new(config);
    let inputs = load_plan_inputs(args)?;

    Ok(planner.plan(PlanRequest {
        selections: &inputs.selections,
        photo: &inputs.photo,
        explicit_scope: &inputs.scope.explicit,
        fallback_scope: &inputs.scope.fallback,
        visibility: inputs.visibility.as_ref(),
        prompt: None,
        photo_hash: args.photo_hash.as_deref(),
    }))
}

fn cmd_key(args: KeyArgs) -> Result<i32> {
    let plan = plan(&args)?;

    if args.format == "json" {
        println!("{}", serde_json::to_string_pretty(&plan)?);
        return Ok(exit_codes::OK);
    }

    match plan {
        RenderPlan::NothingToRender { suppressed } => {
            if suppressed.is_empty() {
                println!("nothing to render");
            } else {
                println!("nothing to render (suppressed: {})", suppressed.join(", "));
            }
        }
        RenderPlan::Render(job) => println!("{}", job.cache_key),
    }
    Ok(exit_codes::OK)
}

fn cmd_check(args: CheckArgs) -> Result<i32> {
    let plan = plan(&args.key)?;

    let job = match plan {
        RenderPlan::NothingToRender { .. } => {
            println!("nothing to render");
            return Ok(exit_codes::OK);
        }
        RenderPlan::Render(job) => job,
    };

    let store = open_store(&args.db)?;

    match store.get_render(&job.cache_key)? {
        Some(cached) => {
            println!("hit {} -> {}", cached.cache_key, cached.asset_path);
            Ok(exit_codes::OK)
        }
        None => {
            println!("miss {}", job.cache_key);
            Ok(exit_codes::MISS)
        }
    }
}

fn cmd_hidden(args: HiddenArgs) -> Result<i32> {
    let config = load_engine_config(&args.config)?;
    let planner = Planner::new(config);
    let visibility: SurfaceVisibility = read_json(&args.visibility, "visibility")?;

    for sub_id in planner.visibility_index().hidden_subcategories(&visibility) {
        println!("{sub_id}");
    }
    Ok(exit_codes::OK)
}

fn cmd_stats(args: StatsArgs) -> Result<i32> {
    let store = open_store(&args.db)?;
    let stats = store.stats_best_effort()?;

    println!("renders:  {}", stats.renders.map_or("?".into(), |n| n.to_string()));
    println!("pending:  {}", stats.pending.map_or("?".into(), |n| n.to_string()));
    println!(
        "latest:   {}",
        stats.last_created_at.as_deref().unwrap_or("-")
    );
    Ok(exit_codes::OK)
}
