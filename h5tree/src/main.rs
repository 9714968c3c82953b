mod output;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use h5tree_core::{
    AttrValue, FileMode, Hid, Hierarchy, KindFilter, MemoryEngine, NodeKind, StorageEngine, path,
};
use output::{
    AttrsOutput, ChildInfo, InitOutput, LinkOutput, LsOutput, MkdirOutput, MkdsOutput,
    OutputWriter, ProbeOutput, SetAttrOutput, StatOutput,
};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Name the snapshot's container is registered under inside the engine.
const CONTAINER: &str = "snapshot";

/// h5tree - A path-based hierarchical container tool
#[derive(Parser)]
#[command(name = "h5tree")]
#[command(about = "Manage groups, datasets and attributes in a hierarchical container", long_about = None)]
#[command(version)]
struct Cli {
    /// Container snapshot (defaults to H5TREE_FILE env var or ./h5tree.json)
    #[arg(short, long, global = true)]
    file: Option<PathBuf>,

    /// Output results as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an empty container
    Init {
        /// Overwrite an existing snapshot
        #[arg(long)]
        force: bool,
    },

    /// Create a group and any missing parents
    Mkdir {
        /// Group path, e.g. /run/1/raw
        path: String,
    },

    /// Create a dataset and any missing parent groups
    Mkds {
        /// Dataset path
        path: String,

        /// Dimensions, comma separated
        #[arg(long, value_delimiter = ',', required = true)]
        shape: Vec<u64>,
    },

    /// List the children of a group
    Ls {
        /// Group path (defaults to the root)
        #[arg(default_value = "/")]
        path: String,

        /// Only show children of these kinds
        #[arg(short, long, value_enum)]
        kind: Vec<KindArg>,

        /// Show the kind of each child
        #[arg(short, long)]
        long: bool,
    },

    /// List the attributes of a group or dataset
    Attrs {
        /// Object path
        path: String,
    },

    /// Create or replace an attribute
    SetAttr {
        /// Object path
        path: String,

        /// Attribute name
        name: String,

        /// Value: integer, float, comma separated list, or text
        value: String,
    },

    /// Check whether an attribute is present
    Probe {
        /// Object path
        path: String,

        /// Attribute name
        name: String,
    },

    /// Show object metadata
    Stat {
        /// Object path
        path: String,
    },

    /// Create a soft link
    Link {
        /// Path of the new link
        path: String,

        /// Absolute path the link points to
        target: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum KindArg {
    Group,
    Dataset,
    Type,
    All,
}

impl KindArg {
    fn filter(self) -> KindFilter {
        match self {
            KindArg::Group => KindFilter::GROUP,
            KindArg::Dataset => KindFilter::DATASET,
            KindArg::Type => KindFilter::NAMED_TYPE,
            KindArg::All => KindFilter::ANY,
        }
    }
}

/// Combine repeated `--kind` flags. No flag means every kind.
fn kind_filter(kinds: &[KindArg]) -> KindFilter {
    if kinds.is_empty() {
        return KindFilter::ANY;
    }
    kinds
        .iter()
        .fold(KindFilter::NONE, |acc, kind| acc.union(kind.filter()))
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing();

    let output = OutputWriter::new(cli.json);

    // Determine snapshot: CLI arg > H5TREE_FILE env var > ./h5tree.json default
    let file = resolve_file(cli.file, std::env::var("H5TREE_FILE").ok());

    let result = match cli.command {
        Commands::Init { force } => cmd_init(&file, force, &output),
        Commands::Mkdir { path } => cmd_mkdir(&file, &path, &output),
        Commands::Mkds { path, shape } => cmd_mkds(&file, &path, &shape, &output),
        Commands::Ls { path, kind, long } => {
            cmd_ls(&file, &path, kind_filter(&kind), long, &output)
        }
        Commands::Attrs { path } => cmd_attrs(&file, &path, &output),
        Commands::SetAttr { path, name, value } => {
            cmd_set_attr(&file, &path, &name, &value, &output)
        }
        Commands::Probe { path, name } => cmd_probe(&file, &path, &name, &output),
        Commands::Stat { path } => cmd_stat(&file, &path, &output),
        Commands::Link { path, target } => cmd_link(&file, &path, &target, &output),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            output.write_error(&err, 1);
            ExitCode::FAILURE
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("h5tree_core=warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn resolve_file(arg: Option<PathBuf>, env: Option<String>) -> PathBuf {
    arg.or_else(|| env.map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("./h5tree.json"))
}

fn load(file: &Path) -> Result<Hierarchy<MemoryEngine>> {
    let engine = MemoryEngine::new();
    engine
        .load_snapshot(CONTAINER, file)
        .with_context(|| format!("Failed to load container from {}", file.display()))?;
    Ok(Hierarchy::new(engine))
}

/// Open the container, run `op` against its root, close the container
/// (reclaiming anything `op` left open), and save it back if writable.
fn with_container<T>(
    file: &Path,
    mode: FileMode,
    op: impl FnOnce(&Hierarchy<MemoryEngine>, Hid) -> Result<T>,
) -> Result<T> {
    let h5 = load(file)?;

    let value = {
        let container = h5
            .open_file(CONTAINER, mode)
            .context("Failed to open container")?;
        let value = op(&h5, container.id())?;
        container
            .close_container()
            .context("Failed to close container")?;
        value
    };

    if mode == FileMode::ReadWrite {
        h5.engine()
            .save_snapshot(CONTAINER, file)
            .with_context(|| format!("Failed to save container to {}", file.display()))?;
    }
    Ok(value)
}

fn cmd_init(file: &Path, force: bool, output: &OutputWriter) -> Result<()> {
    if file.exists() && !force {
        anyhow::bail!(
            "{} already exists (use --force to overwrite)",
            file.display()
        );
    }

    let h5 = Hierarchy::new(MemoryEngine::new());
    h5.create_file(CONTAINER)
        .context("Failed to create container")?
        .close()
        .context("Failed to close container")?;
    h5.engine()
        .save_snapshot(CONTAINER, file)
        .with_context(|| format!("Failed to write {}", file.display()))?;

    let data = InitOutput {
        success: true,
        result_code: 0,
        file: file.display().to_string(),
    };
    output.write(&data, || {
        format!("Initialized h5tree container at {}\n", file.display())
    })
}

fn cmd_mkdir(file: &Path, group_path: &str, output: &OutputWriter) -> Result<()> {
    let groups_created = with_container(file, FileMode::ReadWrite, |h5, root| {
        h5.ensure_path(root, group_path)
            .with_context(|| format!("Failed to create groups for {}", group_path))?;
        Ok(h5.engine().stats().groups_created)
    })?;

    let data = MkdirOutput {
        success: true,
        result_code: 0,
        path: group_path.to_string(),
        groups_created,
    };
    output.write(&data, || {
        format!("{} ({} group(s) created)\n", group_path, groups_created)
    })
}

fn cmd_mkds(file: &Path, dataset_path: &str, shape: &[u64], output: &OutputWriter) -> Result<()> {
    let groups_created = with_container(file, FileMode::ReadWrite, |h5, root| {
        h5.create_dataset(root, dataset_path, shape)
            .with_context(|| format!("Failed to create dataset {}", dataset_path))?
            .close()
            .context("Failed to close dataset")?;
        Ok(h5.engine().stats().groups_created)
    })?;

    let data = MkdsOutput {
        success: true,
        result_code: 0,
        path: dataset_path.to_string(),
        shape: shape.to_vec(),
        groups_created,
    };
    output.write(&data, || {
        let dims: Vec<String> = shape.iter().map(u64::to_string).collect();
        format!("{} [{}]\n", dataset_path, dims.join(" x "))
    })
}

fn cmd_ls(
    file: &Path,
    group_path: &str,
    filter: KindFilter,
    long: bool,
    output: &OutputWriter,
) -> Result<()> {
    let children = with_container(file, FileMode::ReadOnly, |h5, root| {
        let group = h5
            .open(root, group_path)
            .with_context(|| format!("Failed to open {}", group_path))?;
        let names = h5
            .list_children(group.id(), filter)
            .with_context(|| format!("Failed to list {}", group_path))?;

        let children: Vec<ChildInfo> = names
            .into_iter()
            .map(|name| {
                let kind = long.then(|| match h5.kind_of(group.id(), &name) {
                    Ok(kind) => kind.to_string(),
                    Err(_) => "dangling".to_string(),
                });
                ChildInfo { name, kind }
            })
            .collect();
        group.close().context("Failed to close group")?;
        Ok(children)
    })?;

    let data = LsOutput {
        success: true,
        result_code: 0,
        path: group_path.to_string(),
        children,
    };
    output.write(&data, || {
        let mut text = String::new();
        for child in &data.children {
            match &child.kind {
                Some(kind) => text.push_str(&format!("{:<10} {}\n", kind, child.name)),
                None => text.push_str(&format!("{}\n", child.name)),
            }
        }
        text
    })
}

fn cmd_attrs(file: &Path, object_path: &str, output: &OutputWriter) -> Result<()> {
    let attributes = with_container(file, FileMode::ReadOnly, |h5, root| {
        h5.list_attribute_names_at(root, object_path)
            .with_context(|| format!("Failed to list attributes of {}", object_path))
    })?;

    let data = AttrsOutput {
        success: true,
        result_code: 0,
        path: object_path.to_string(),
        attributes,
    };
    output.write(&data, || {
        data.attributes
            .iter()
            .map(|name| format!("{}\n", name))
            .collect()
    })
}

fn cmd_set_attr(
    file: &Path,
    object_path: &str,
    name: &str,
    raw: &str,
    output: &OutputWriter,
) -> Result<()> {
    let value = AttrValue::parse(raw);
    with_container(file, FileMode::ReadWrite, |h5, root| {
        h5.write_attribute(root, object_path, name, value.clone())
            .with_context(|| format!("Failed to write attribute {} on {}", name, object_path))
    })?;

    let data = SetAttrOutput {
        success: true,
        result_code: 0,
        path: object_path.to_string(),
        name: name.to_string(),
        value,
    };
    output.write(&data, || {
        format!("{}@{} = {:?}\n", object_path, name, data.value)
    })
}

fn cmd_probe(file: &Path, object_path: &str, name: &str, output: &OutputWriter) -> Result<()> {
    let present = with_container(file, FileMode::ReadOnly, |h5, root| {
        Ok(h5.probe_attribute(root, object_path, name))
    })?;

    let data = ProbeOutput {
        success: true,
        result_code: 0,
        path: object_path.to_string(),
        name: name.to_string(),
        present,
    };
    output.write(&data, || {
        if present {
            format!("{}@{} present\n", object_path, name)
        } else {
            format!("{}@{} absent\n", object_path, name)
        }
    })
}

fn cmd_stat(file: &Path, object_path: &str, output: &OutputWriter) -> Result<()> {
    let data = with_container(file, FileMode::ReadOnly, |h5, root| {
        let exists = h5.exists(root, object_path);
        let kind = h5.kind_of(root, object_path).ok();

        let (attributes, children) = match kind {
            Some(NodeKind::Group) => {
                let group = h5
                    .open(root, object_path)
                    .with_context(|| format!("Failed to open {}", object_path))?;
                let attributes = h5.list_attribute_names(group.id())?;
                let children = h5.list_children(group.id(), KindFilter::ANY)?.len();
                group.close()?;
                (attributes, Some(children))
            }
            Some(NodeKind::Dataset) => (h5.list_attribute_names_at(root, object_path)?, None),
            _ => (Vec::new(), None),
        };

        let trimmed = path::trim_object_path(object_path);
        Ok(StatOutput {
            success: true,
            result_code: 0,
            path: object_path.to_string(),
            exists,
            kind: kind.map(|k| k.to_string()),
            parent: path::parent_of(trimmed).to_string(),
            name: path::name_of(trimmed).to_string(),
            attributes,
            children,
        })
    })?;

    output.write(&data, || {
        let mut text = String::new();
        text.push_str(&format!("Path: {}\n", data.path));
        match &data.kind {
            Some(kind) => text.push_str(&format!("Kind: {}\n", kind)),
            None if data.exists => text.push_str("Kind: dangling link\n"),
            None => text.push_str("Kind: (missing)\n"),
        }
        text.push_str(&format!("Parent: {}\n", data.parent));
        text.push_str(&format!("Name: {}\n", data.name));
        if let Some(children) = data.children {
            text.push_str(&format!("Children: {}\n", children));
        }
        text.push_str(&format!("Attributes: {}\n", data.attributes.len()));
        for name in &data.attributes {
            text.push_str(&format!("  {}\n", name));
        }
        text
    })
}

fn cmd_link(file: &Path, link_path: &str, target: &str, output: &OutputWriter) -> Result<()> {
    with_container(file, FileMode::ReadWrite, |h5, root| {
        h5.ensure_groups_for_dataset(root, link_path)
            .with_context(|| format!("Failed to create groups for {}", link_path))?;
        let _guard = h5.lock().acquire();
        h5.engine()
            .create_soft_link(root, link_path, target)
            .with_context(|| format!("Failed to link {} -> {}", link_path, target))
    })?;

    let data = LinkOutput {
        success: true,
        result_code: 0,
        path: link_path.to_string(),
        target: target.to_string(),
    };
    output.write(&data, || format!("{} -> {}\n", link_path, target))
}
