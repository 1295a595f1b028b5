use std::path::PathBuf;

use clap::{Args as ClapArgs, Parser, Subcommand};

use crate::data_types::{ContainerRef, RecordId};

pub const DEFAULT_CONFIG_PATH: &str = "fmcontainer.toml";

#[derive(Parser, Debug)]
#[clap(name = "fmcontainer", about = "Read and write FileMaker container fields", version)]
pub struct Args {
    #[clap(short, long, default_value = DEFAULT_CONFIG_PATH)]
    pub config_path: PathBuf,

    /// Emit logs as JSON lines
    #[clap(long)]
    pub json_logs: bool,

    #[clap(subcommand)]
    pub command: Command,
}

/// Which container to work on.
#[derive(ClapArgs, Debug, Clone)]
pub struct Target {
    pub table: String,
    pub field: String,
    pub id: RecordId,
}

impl Target {
    pub fn container_ref(&self) -> ContainerRef {
        ContainerRef::new(&self.table, &self.field, self.id)
    }
}

#[derive(ClapArgs, Debug, Clone)]
pub struct PageArgs {
    pub table: String,

    #[clap(long)]
    pub page: Option<String>,

    #[clap(long)]
    pub size: Option<String>,

    #[clap(long)]
    pub sort: Option<String>,

    /// "desc" for descending, anything else ascending
    #[clap(long)]
    pub direction: Option<String>,

    /// Columns that may be sorted on besides `id`
    #[clap(long, value_delimiter = ',')]
    pub columns: Vec<String>,
}

impl PageArgs {
    pub fn allowed_columns(&self) -> Vec<&str> {
        self.columns.iter().map(String::as_str).collect()
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Store a file in a container
    Upload {
        #[clap(flatten)]
        target: Target,

        file: PathBuf,

        /// Name to store the file under, instead of the file's own
        #[clap(long)]
        filename: Option<String>,

        /// Column to record the MIME type in, in the same transaction
        #[clap(long)]
        content_type_column: Option<String>,

        /// MIME type to record, instead of the one implied by the filename
        #[clap(long)]
        content_type: Option<String>,
    },
    /// Write a container's content to a file or stdout
    Download {
        #[clap(flatten)]
        target: Target,

        /// Format code or alias (PNG, JPG, PDF...). Worked out when missing
        #[clap(long)]
        format: Option<String>,

        /// Column holding the MIME type, used to pick the format
        #[clap(long)]
        content_type_column: Option<String>,

        #[clap(short, long)]
        output: Option<PathBuf>,
    },
    /// Empty a container
    Clear {
        #[clap(flatten)]
        target: Target,

        /// Column holding the MIME type, cleared in the same transaction
        #[clap(long)]
        content_type_column: Option<String>,
    },
    /// Print the container reference (usually the stored filename)
    Reference {
        #[clap(flatten)]
        target: Target,
    },
    /// Print what is known about a container as JSON
    Info {
        #[clap(flatten)]
        target: Target,

        #[clap(long)]
        content_type_column: Option<String>,
    },
    /// Print one page of a table as JSON
    Page {
        #[clap(flatten)]
        page: PageArgs,
    },
    /// Print the FileMaker SQL for an operation without connecting
    Render {
        #[clap(subcommand)]
        operation: RenderCommand,
    },
}

#[derive(Subcommand, Debug)]
pub enum RenderCommand {
    Upload {
        #[clap(flatten)]
        target: Target,

        filename: Option<String>,
    },
    Download {
        #[clap(flatten)]
        target: Target,

        format: Option<String>,
    },
    Clear {
        #[clap(flatten)]
        target: Target,
    },
    Reference {
        #[clap(flatten)]
        target: Target,
    },
    Page {
        #[clap(flatten)]
        page: PageArgs,
    },
}
