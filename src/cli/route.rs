//! CLI route: single route table and run context. Dispatches to domain services and presentation.

use crate::archive;
use crate::config::{ConfigLoader, LociConfig};
use crate::error::ApiError;
use crate::orchestrator::{Orchestrator, PalaceEvent, PalaceSnapshot};
use crate::palace::GenerationRequest;
use crate::provider::commands::ProviderCommandService;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tracing::{debug, info};

use crate::cli::command_name;
use crate::cli::parse::Commands;
use crate::cli::presentation::{
    format_build_json, format_build_text, format_check_json, format_check_text,
    format_styles_text, ProgressRenderer,
};

/// Arguments of the build command, borrowed from the parsed CLI.
struct BuildArgs<'a> {
    theme: &'a str,
    content: Option<&'a str>,
    content_file: Option<&'a Path>,
    style: &'a str,
    output: Option<&'a Path>,
    print: bool,
    no_archive: bool,
    format: &'a str,
}

/// Runtime context for CLI execution: workspace, config and where it came from.
/// Built from workspace path and optional config path using ConfigLoader only.
pub struct RunContext {
    config: LociConfig,
    workspace_root: PathBuf,
    config_path: Option<PathBuf>,
}

impl RunContext {
    /// Create run context from workspace root and optional config path. Uses ConfigLoader only.
    pub fn new(workspace_root: PathBuf, config_path: Option<PathBuf>) -> Result<Self, ApiError> {
        let config = if let Some(ref cfg_path) = config_path {
            ConfigLoader::load_from_file(cfg_path)?
        } else {
            ConfigLoader::load(&workspace_root)?
        };
        Ok(Self::with_config(config, workspace_root, config_path))
    }

    pub fn with_config(
        config: LociConfig,
        workspace_root: PathBuf,
        config_path: Option<PathBuf>,
    ) -> Self {
        Self {
            config,
            workspace_root,
            config_path,
        }
    }

    pub fn config(&self) -> &LociConfig {
        &self.config
    }

    /// Execute a CLI command via the single route table.
    pub fn execute(&self, command: &Commands) -> Result<String, ApiError> {
        let started = Instant::now();
        let name = command_name(command);
        info!(command = name, "Command started");
        let result = self.execute_inner(command);
        debug!(
            command = name,
            ok = result.is_ok(),
            duration_ms = started.elapsed().as_millis() as u64,
            "Command finished"
        );
        result
    }

    fn execute_inner(&self, command: &Commands) -> Result<String, ApiError> {
        match command {
            Commands::Build {
                theme,
                content,
                content_file,
                style,
                output,
                print,
                no_archive,
                format,
            } => self.handle_build(BuildArgs {
                theme,
                content: content.as_deref(),
                content_file: content_file.as_deref(),
                style,
                output: output.as_deref(),
                print: *print,
                no_archive: *no_archive,
                format,
            }),
            Commands::Styles => Ok(format_styles_text()),
            Commands::Check { format } => self.handle_check(format),
        }
    }

    fn handle_check(&self, format: &str) -> Result<String, ApiError> {
        let result = ProviderCommandService::run_check(&self.config, self.config_source());
        if format == "json" {
            format_check_json(&result)
        } else {
            Ok(format_check_text(&result))
        }
    }

    fn config_source(&self) -> String {
        if let Some(path) = &self.config_path {
            return path.display().to_string();
        }
        let mut sources = vec!["built-in defaults".to_string()];
        if let Some(global) = ConfigLoader::global_config_path().filter(|p| p.exists()) {
            sources.push(global.display().to_string());
        }
        let workspace_file = self.workspace_root.join("config").join("config.toml");
        if workspace_file.exists() {
            sources.push(workspace_file.display().to_string());
        }
        sources.join(", ")
    }

    fn handle_build(&self, args: BuildArgs<'_>) -> Result<String, ApiError> {
        self.config.validate().map_err(|errors| {
            let messages: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            ApiError::ConfigError(format!(
                "Configuration validation failed:\n{}",
                messages.join("\n")
            ))
        })?;

        let content = match (args.content, args.content_file) {
            (Some(content), _) => content.to_string(),
            (None, Some(path)) => std::fs::read_to_string(path).map_err(|e| {
                ApiError::InvalidRequest(format!(
                    "Failed to read content file {}: {}",
                    path.display(),
                    e
                ))
            })?,
            (None, None) => {
                return Err(ApiError::InvalidRequest(
                    "Either --content or --content-file is required".to_string(),
                ))
            }
        };
        let request = GenerationRequest::new(args.theme, content, args.style);
        request.validate()?;

        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let orchestrator = Orchestrator::from_config(&self.config)?.with_events(events_tx);
        let show_progress = args.format != "json";

        let rt = tokio::runtime::Runtime::new()?;
        let snapshot = rt.block_on(run_with_progress(
            &orchestrator,
            request.clone(),
            events_rx,
            show_progress,
        ))?;

        let archive_path = if args.no_archive {
            None
        } else {
            let dir = args
                .output
                .map(Path::to_path_buf)
                .unwrap_or_else(|| self.workspace_root.join(&self.config.output.directory));
            Some(orchestrator.download_package()?.write_to(&dir)?)
        };

        let blueprint = args
            .print
            .then(|| archive::render_markdown(&request, &snapshot.rooms));
        if args.format == "json" {
            return format_build_json(&snapshot, archive_path.as_deref(), blueprint.as_deref());
        }
        let mut out = format_build_text(&snapshot, archive_path.as_deref());
        if let Some(blueprint) = blueprint {
            out.push_str("\n\n");
            out.push_str(&blueprint);
        }
        Ok(out)
    }
}

/// Drive one generation while rendering progress events to stderr as they arrive.
async fn run_with_progress(
    orchestrator: &Orchestrator,
    request: GenerationRequest,
    mut events: UnboundedReceiver<PalaceEvent>,
    show_progress: bool,
) -> Result<PalaceSnapshot, ApiError> {
    let mut renderer = ProgressRenderer::new();
    let mut print = |event: PalaceEvent| {
        if let Some(line) = renderer.render(&event).filter(|_| show_progress) {
            eprintln!("{}", line);
        }
    };

    let generation = orchestrator.generate(request);
    tokio::pin!(generation);
    let result = loop {
        tokio::select! {
            result = &mut generation => break result,
            Some(event) = events.recv() => print(event),
        }
    };
    while let Ok(event) = events.try_recv() {
        print(event);
    }
    result
}
