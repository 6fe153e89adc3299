use anyhow::Context;

use synthkit_core::config::load_schema;
use synthkit_core::graph::visualize::{visualize, GraphFormat};
use synthkit_core::graph::DependencyGraph;

use crate::args::{GraphArgs, GraphFormatArg};

pub fn run(args: &GraphArgs) -> anyhow::Result<()> {
    let (schema, _config_hash) = load_schema(&args.schema)
        .with_context(|| format!("loading schema {}", args.schema.display()))?;
    let graph = DependencyGraph::from_schema(&schema)?;

    let format = match args.format {
        GraphFormatArg::Mermaid => GraphFormat::Mermaid,
        GraphFormatArg::Dot => GraphFormat::Dot,
    };
    print!("{}", visualize(&graph, format));
    Ok(())
}
