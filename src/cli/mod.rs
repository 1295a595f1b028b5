mod commands;

use std::io::Write;

use config::ConfigError;
use serde::Serialize;
use tracing::info;

pub use commands::{Args, Command, PageArgs, RenderCommand, Target, DEFAULT_CONFIG_PATH};

use crate::config::context::{build_context, ContainerContext};
use crate::config::schema::load_config;
use crate::data_types::{BlobPayload, DEFAULT_UPLOAD_FILENAME};
use crate::format::Format;
use crate::pagination::{PageError, PageRequest, PagedQuery, DEFAULT_MAX_PAGE_SIZE};
use crate::resolver::FormatResolver;
use crate::store;
use crate::store::dialect::{sanitize_filename, Dialect};

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("Error loading the config: {0}")]
    Config(#[from] ConfigError),

    #[error("Error setting up the store: {0}")]
    Store(#[from] store::interface::Error),

    #[error("Invalid page request: {0}")]
    Page(#[from] PageError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Error serializing output: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Failed(String),
}

pub type Result<T, E = CliError> = std::result::Result<T, E>;

fn print_json<T: Serialize>(out: &mut dyn Write, value: &T) -> Result<()> {
    serde_json::to_writer(&mut *out, value)?;
    writeln!(out)?;
    Ok(())
}

pub struct ContainerCli {
    ctx: ContainerContext,
}

impl ContainerCli {
    pub fn new(ctx: ContainerContext) -> Self {
        ContainerCli { ctx }
    }

    async fn stored_content_type(
        &self,
        target: &Target,
        content_type_column: Option<&str>,
    ) -> Option<String> {
        match content_type_column {
            Some(column) => {
                self.ctx
                    .codec
                    .get_content_type(&target.container_ref(), column)
                    .await
            }
            None => None,
        }
    }

    pub async fn handle_command(&self, cmd: &Command, out: &mut dyn Write) -> Result<()> {
        let codec = &self.ctx.codec;

        match cmd {
            Command::Upload {
                target,
                file,
                filename,
                content_type_column,
                content_type,
            } => {
                let bytes = tokio::fs::read(file).await?;
                let filename = filename.clone().or_else(|| {
                    file.file_name()
                        .map(|name| name.to_string_lossy().into_owned())
                });
                let payload = BlobPayload {
                    bytes,
                    filename,
                };

                let container = target.container_ref();
                let uploaded = match content_type_column {
                    Some(column) => {
                        codec
                            .upload_with_content_type(
                                &container,
                                &payload,
                                column,
                                content_type.as_deref(),
                            )
                            .await
                    }
                    None => codec.upload(&container, &payload).await,
                };

                if !uploaded {
                    return Err(CliError::Failed(format!(
                        "Nothing uploaded to {}.{} for record {}",
                        target.table, target.field, target.id
                    )));
                }
                writeln!(out, "Uploaded {} bytes", payload.bytes.len())?;
            }
            Command::Download {
                target,
                format,
                content_type_column,
                output,
            } => {
                let stored_mime = self
                    .stored_content_type(target, content_type_column.as_deref())
                    .await;
                let content = FormatResolver::new(codec)
                    .resolve(
                        &target.container_ref(),
                        format.as_deref(),
                        stored_mime.as_deref(),
                    )
                    .await
                    .ok_or_else(|| {
                        CliError::Failed(format!(
                            "No content in {}.{} for record {}",
                            target.table, target.field, target.id
                        ))
                    })?;

                info!(
                    "Resolved {} ({}) via {:?}",
                    content.format.canonical_name(),
                    content.mime_type(),
                    content.tier
                );
                match output {
                    Some(path) => tokio::fs::write(path, &content.bytes).await?,
                    None => out.write_all(&content.bytes)?,
                }
            }
            Command::Clear {
                target,
                content_type_column,
            } => {
                let container = target.container_ref();
                let cleared = match content_type_column {
                    Some(column) => codec.clear_with_content_type(&container, column).await,
                    None => codec.clear(&container).await,
                };

                if !cleared {
                    return Err(CliError::Failed(format!(
                        "Nothing cleared in {}.{} for record {}",
                        target.table, target.field, target.id
                    )));
                }
                writeln!(out, "Cleared")?;
            }
            Command::Reference { target } => {
                let reference = codec
                    .get_reference(&target.container_ref())
                    .await
                    .ok_or_else(|| {
                        CliError::Failed(format!(
                            "No reference in {}.{} for record {}",
                            target.table, target.field, target.id
                        ))
                    })?;
                writeln!(out, "{reference}")?;
            }
            Command::Info {
                target,
                content_type_column,
            } => {
                let stored_mime = self
                    .stored_content_type(target, content_type_column.as_deref())
                    .await;
                let info = FormatResolver::new(codec)
                    .describe(&target.container_ref(), stored_mime.as_deref())
                    .await;
                print_json(out, &info)?;
            }
            Command::Page { page: args } => {
                let paginator = &self.ctx.paginator;
                let request = paginator.request(
                    args.page.as_deref(),
                    args.size.as_deref(),
                    args.sort.as_deref(),
                    args.direction.as_deref(),
                )?;
                let page = paginator
                    .fetch_page(&args.table, &request, &args.allowed_columns())
                    .await?
                    .ok_or_else(|| {
                        CliError::Failed(format!("Failed to read a page of {}", args.table))
                    })?;
                print_json(out, &page)?;
            }
            Command::Render { operation } => render(operation, out)?,
        }

        Ok(())
    }
}

/// Print the FileMaker statements `operation` would run, one per line.
pub fn render(operation: &RenderCommand, out: &mut dyn Write) -> Result<()> {
    let dialect = Dialect::FileMaker;

    let statements = match operation {
        RenderCommand::Upload { target, filename } => {
            let filename = sanitize_filename(filename.as_deref(), DEFAULT_UPLOAD_FILENAME);
            vec![dialect
                .upload(&target.container_ref(), &[], &filename)
                .to_string()]
        }
        RenderCommand::Download { target, format } => vec![dialect
            .download(
                &target.container_ref(),
                &Format::normalize_or_default(format.as_deref()),
            )
            .to_string()],
        RenderCommand::Clear { target } => {
            vec![dialect.clear(&target.container_ref()).to_string()]
        }
        RenderCommand::Reference { target } => {
            vec![dialect.reference(&target.container_ref()).to_string()]
        }
        RenderCommand::Page { page: args } => {
            let request = PageRequest::from_params(
                args.page.as_deref(),
                args.size.as_deref(),
                args.sort.as_deref(),
                args.direction.as_deref(),
            )?;
            let query = PagedQuery::new(
                dialect,
                &args.table,
                &request,
                &args.allowed_columns(),
                DEFAULT_MAX_PAGE_SIZE,
            )?;
            vec![query.rows.to_string(), query.count.to_string()]
        }
    };

    for statement in statements {
        writeln!(out, "{statement}")?;
    }
    Ok(())
}

/// Run one command. Only `render` gets by without a config and a store.
pub async fn run(args: &Args, out: &mut dyn Write) -> Result<()> {
    if let Command::Render { operation } = &args.command {
        return render(operation, out);
    }

    let config = load_config(&args.config_path)?;
    let ctx = build_context(&config).await?;
    ContainerCli::new(ctx).handle_command(&args.command, out).await
}
