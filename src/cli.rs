use crate::aws::CloudFormationProvider;
use crate::builder::StackGraphBuilder;
use crate::config::load_config;
use crate::graph_dump::write_graph_dump;
use crate::provider::{CachedProvider, ChangeSetProvider, OfflineProvider};
use crate::render::{OutputFormat, render, write_output};
use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

pub const DEFAULT_REGION: &str = "us-east-1";

#[derive(Parser, Debug)]
#[command(
    name = "explain-changeset",
    version,
    about = "Explain a CloudFormation change set as a graph of change causes"
)]
pub struct Args {
    /// Root change set name or ARN
    #[arg(long = "change-set-name")]
    pub change_set_name: String,

    /// Root stack name (required when the change set is not given as ARN)
    #[arg(long = "stack-name")]
    pub stack_name: Option<String>,

    /// Directory for caching change set descriptions [default: current directory]
    #[arg(long = "cache-dir")]
    pub cache_dir: Option<PathBuf>,

    /// AWS region [default: $AWS_REGION, $AWS_DEFAULT_REGION, us-east-1]
    #[arg(long = "region")]
    pub region: Option<String>,

    /// AWS CLI profile
    #[arg(long = "profile")]
    pub profile: Option<String>,

    /// Only use change sets from the cache directory
    #[arg(long = "offline")]
    pub offline: bool,

    /// File to write the graph to (.dot/.svg/.png/.jpg). DOT goes to stdout if omitted.
    #[arg(short = 'o', long = "graph-output")]
    pub graph_output: Option<PathBuf>,

    /// Graphviz layout engine
    #[arg(short = 'K', long = "layout")]
    pub layout: Option<String>,

    /// Config file (JSON5)
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// Write the graph model as JSON
    #[arg(long = "dump-graph")]
    pub dump_graph: Option<PathBuf>,

    /// Log debug output
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,
}

pub fn run() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let mut config = load_config(args.config.as_deref())?;
    if let Some(layout) = &args.layout {
        config.layout.engine = layout.clone();
    }

    let cache_dir = match &args.cache_dir {
        Some(dir) => dir.clone(),
        None => std::env::current_dir().context("cannot determine current working directory")?,
    };
    let fetcher: Box<dyn ChangeSetProvider> = if args.offline {
        Box::new(OfflineProvider)
    } else {
        let region = args
            .region
            .clone()
            .unwrap_or_else(|| default_region(|name| std::env::var(name).ok()));
        let client = CloudFormationProvider::new(Some(region), args.profile.clone())
            .context("cannot set up AWS client")?;
        Box::new(client)
    };
    let provider = CachedProvider::new(fetcher, &cache_dir)
        .with_context(|| format!("cannot use cache directory {}", cache_dir.display()))?;

    let mut model = StackGraphBuilder::build(
        &provider,
        args.stack_name.as_deref(),
        &args.change_set_name,
        config.build_options(),
    )
    .context("unable to build graph")?;

    if config.layout.is_force_directed() {
        model.root_attrs_mut().set_overlap(config.layout.overlap.clone());
    }

    if let Some(path) = &args.dump_graph {
        write_graph_dump(path, &model)?;
    }

    let format = args
        .graph_output
        .as_deref()
        .map(OutputFormat::from_path)
        .unwrap_or(OutputFormat::Dot);
    let data = render(&model, format, &config.layout, &config.render)?;
    write_output(&data, args.graph_output.as_deref())?;
    Ok(())
}

fn init_tracing(verbose: bool) {
    let default = if verbose {
        "changeset_graph=debug"
    } else {
        "changeset_graph=info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// First of `AWS_REGION`, `AWS_DEFAULT_REGION` that is set.
fn default_region(lookup: impl Fn(&str) -> Option<String>) -> String {
    ["AWS_REGION", "AWS_DEFAULT_REGION"]
        .iter()
        .find_map(|name| lookup(name))
        .unwrap_or_else(|| DEFAULT_REGION.to_string())
}
