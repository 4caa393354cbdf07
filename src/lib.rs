pub mod arn;
#[cfg(feature = "aws")]
pub mod aws;
pub mod builder;
pub mod causes;
pub mod changeset;
#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod error;
pub mod graph;
pub mod graph_dump;
mod nested;
pub mod nodes;
pub mod provider;
pub mod render;
pub mod theme;

#[cfg(feature = "aws")]
pub use aws::CloudFormationProvider;
pub use builder::{BuildOptions, StackGraphBuilder};
pub use changeset::ChangeSet;
#[cfg(feature = "cli")]
pub use cli::run;
pub use config::{Config, LayoutConfig, RenderConfig, load_config};
pub use error::{Error, Result};
pub use graph::{GraphModel, RankDir};
pub use provider::{CachedProvider, ChangeSetProvider, InMemoryProvider, OfflineProvider};
pub use render::{OutputFormat, to_dot};
pub use theme::Palette;
