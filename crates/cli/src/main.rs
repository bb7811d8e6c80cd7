use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use stacksift_core::parsers::parse_chrome_trace;
use stacksift_core::{
    FilterChain, GroupBy, NodeId, ProfileNode, ProfileTree, SortBy, TextFilter, TimeWindow,
    build_bottom_up, build_top_down,
};

#[derive(Parser)]
#[command(
    name = "stacksift",
    about = "Aggregate a DevTools trace into call trees",
    version
)]
struct Args {
    /// Trace JSON exported from DevTools.
    trace: PathBuf,
    /// Invert the tree: buckets of self time, broken down by caller.
    #[arg(long)]
    bottom_up: bool,
    #[arg(long, value_enum, default_value = "none")]
    group_by: GroupArg,
    /// Window start in µs.
    #[arg(long)]
    start: Option<f64>,
    /// Window end in µs.
    #[arg(long)]
    end: Option<f64>,
    /// Case-insensitive substring filter on event titles.
    #[arg(long)]
    filter: Option<String>,
    /// Maximum tree depth to print.
    #[arg(long, default_value_t = 6)]
    depth: usize,
    /// Print the heaviest stack of the heaviest top-level node instead of
    /// the whole tree.
    #[arg(long)]
    heaviest_stack: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum GroupArg {
    None,
    EventName,
    Category,
    Url,
    Domain,
    Subdomain,
    Frame,
}

impl From<GroupArg> for GroupBy {
    fn from(arg: GroupArg) -> Self {
        match arg {
            GroupArg::None => GroupBy::None,
            GroupArg::EventName => GroupBy::EventName,
            GroupArg::Category => GroupBy::Category,
            GroupArg::Url => GroupBy::Url,
            GroupArg::Domain => GroupBy::Domain,
            GroupArg::Subdomain => GroupBy::Subdomain,
            GroupArg::Frame => GroupBy::Frame,
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    let data = std::fs::read(&args.trace)
        .with_context(|| format!("reading {}", args.trace.display()))?;
    let events = parse_chrome_trace(&data).context("parsing trace")?;

    let window = TimeWindow::new(
        args.start.unwrap_or(f64::NEG_INFINITY),
        args.end.unwrap_or(f64::INFINITY),
    )?;
    let mut filters = FilterChain::new();
    if let Some(query) = &args.filter {
        filters.push(TextFilter::new(query.clone()));
    }
    let group_by = GroupBy::from(args.group_by);

    let (tree, sort) = if args.bottom_up {
        let tree = build_bottom_up(&events, &filters, window, group_by)?;
        (tree, SortBy::SelfTime)
    } else {
        let tree = build_top_down(&events, &filters, window, group_by, false)?;
        (tree, SortBy::TotalTime)
    };

    if args.heaviest_stack {
        print_heaviest_stack(&tree);
    } else {
        println!("{:>12} {:>12}  activity", "self (µs)", "total (µs)");
        for child in tree.sorted_children(tree.root(), sort) {
            print_subtree(&tree, child, 0, args.depth, sort);
        }
    }
    Ok(())
}

fn print_subtree(tree: &ProfileTree, id: NodeId, depth: usize, max_depth: usize, sort: SortBy) {
    if depth >= max_depth {
        return;
    }
    let node = tree.node(id);
    println!(
        "{:>12.1} {:>12.1}  {}{}",
        node.self_time,
        node.total_time,
        "  ".repeat(depth),
        label(node)
    );
    for child in tree.sorted_children(id, sort) {
        print_subtree(tree, child, depth + 1, max_depth, sort);
    }
}

fn print_heaviest_stack(tree: &ProfileTree) {
    let top = tree
        .sorted_children(tree.root(), SortBy::TotalTime)
        .into_iter()
        .next();
    let Some(top) = top else {
        println!("(no events in range)");
        return;
    };
    for (depth, id) in tree.heaviest_stack(top).iter().enumerate() {
        let node = tree.node(*id);
        println!(
            "{:>12.1}  {}{}",
            node.total_time,
            "  ".repeat(depth),
            label(node)
        );
    }
}

fn label(node: &ProfileNode) -> &str {
    match &node.event {
        Some(event) if !node.is_group_node() => event.title(),
        _ if node.id.is_empty() => "(root)",
        _ => &node.id,
    }
}
