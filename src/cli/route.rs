//! CLI route: single route table and run context. Dispatches to the pipeline,
//! delivery and presentation.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use serde_json::json;
use tracing::{info, warn};

use crate::backend::model_name;
use crate::cli::parse::{Commands, OutputFormat};
use crate::cli::presentation::{
    format_check_report, format_prompts_text, format_run_summary, CheckReport,
};
use crate::config::{load_dotenv, ConfigLoader, Credentials, ShortsmithConfig};
use crate::delivery::{cleanup_run, BundleDelivery, Delivery, EmailSettings};
use crate::error::PipelineError;
use crate::generation::{extract_prompts, fallback_script};
use crate::pipeline::{build_pipeline, RunProfile};
use crate::progress::{FanOut, ProgressLog, ProgressSink, TracingProgress};
use crate::types::Topic;

/// Runtime context for CLI execution: workspace, resolved configuration and
/// credentials. Built from the workspace path and optional config path.
pub struct RunContext {
    workspace_root: PathBuf,
    config_path: Option<PathBuf>,
    dotenv_path: Option<PathBuf>,
    config: ShortsmithConfig,
    credentials: Credentials,
}

impl RunContext {
    /// Load `.env`, then configuration, then credentials from the environment.
    pub fn new(workspace_root: PathBuf, config_path: Option<PathBuf>) -> Result<Self, PipelineError> {
        let dotenv_path = load_dotenv(&workspace_root);
        let config = ConfigLoader::resolve(&workspace_root, config_path.as_deref())?;
        Ok(Self::with_parts(
            workspace_root,
            config_path,
            dotenv_path,
            config,
            Credentials::from_env(),
        ))
    }

    /// Context from already resolved parts; no environment access.
    pub fn with_parts(
        workspace_root: PathBuf,
        config_path: Option<PathBuf>,
        dotenv_path: Option<PathBuf>,
        config: ShortsmithConfig,
        credentials: Credentials,
    ) -> Self {
        Self {
            workspace_root,
            config_path,
            dotenv_path,
            config,
            credentials,
        }
    }

    pub fn config(&self) -> &ShortsmithConfig {
        &self.config
    }

    /// Execute a CLI command via the single route table.
    pub fn execute(&self, command: &Commands) -> Result<String, PipelineError> {
        let started = Instant::now();
        let name = command_name(command);
        let result = self.execute_inner(command);
        let elapsed_ms = started.elapsed().as_millis() as u64;
        match &result {
            Ok(_) => info!(command = name, elapsed_ms, "Command finished"),
            Err(err) => warn!(command = name, elapsed_ms, error = %err, "Command failed"),
        }
        result
    }

    fn execute_inner(&self, command: &Commands) -> Result<String, PipelineError> {
        match command {
            Commands::Generate {
                topic,
                max_images,
                output,
                bundle_dir,
                interactive,
                keep,
                format,
            } => self.handle_generate(GenerateArgs {
                topic: topic.as_deref(),
                max_images: *max_images,
                output: output.as_deref(),
                bundle_dir: bundle_dir.as_deref(),
                interactive: *interactive,
                keep: *keep,
                format: *format,
            }),
            Commands::Prompts { file, format } => self.handle_prompts(file, *format),
            Commands::Fallback { topic } => {
                let topic = Topic::new(topic)?;
                Ok(fallback_script(&topic))
            }
            Commands::Check => Ok(format_check_report(&self.check_report())),
            Commands::Config { format } => self.handle_config(*format),
        }
    }

    fn handle_generate(&self, args: GenerateArgs<'_>) -> Result<String, PipelineError> {
        let topic = match args.topic {
            Some(raw) => Topic::new(raw)?,
            None => prompt_for_topic()?,
        };
        if args.max_images == Some(0) {
            return Err(PipelineError::Config(
                "--max-images must be at least 1".to_string(),
            ));
        }

        let profile = if args.interactive {
            RunProfile::Interactive
        } else {
            RunProfile::Batch
        };
        let mut settings = self.config.run.settings(profile);
        if args.max_images.is_some() {
            settings.max_images = args.max_images;
        }
        settings.output_dir = match args.output {
            Some(dir) => dir.to_path_buf(),
            None => self.resolve_in_workspace(&settings.output_dir),
        };
        let pipeline = build_pipeline(&self.config, &self.credentials, settings)?;

        let bundle_root = match args.bundle_dir {
            Some(dir) => dir.to_path_buf(),
            None => self.resolve_in_workspace(&self.config.delivery.bundle_dir),
        };
        let delivery = BundleDelivery::new(
            bundle_root,
            EmailSettings::resolve(&self.config.delivery, &self.credentials),
        );
        let keep = args.keep || self.config.run.keep_files;

        // Reports go to the log as they happen; JSON output also carries them.
        let history = Arc::new(ProgressLog::new());
        let progress = FanOut::new(vec![
            Arc::new(TracingProgress) as Arc<dyn ProgressSink>,
            history.clone(),
        ]);

        info!(topic = %topic, ?profile, keep, "Starting generation");
        let runtime = tokio::runtime::Runtime::new()?;
        let (result, receipt) = runtime.block_on(async {
            let result = pipeline.run(&topic, &progress).await.into_result()?;
            let receipt = delivery.deliver(&result).await?;
            if !keep {
                cleanup_run(&result).await;
            }
            Ok::<_, PipelineError>((result, receipt))
        })?;

        match args.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(&json!({
                "result": result,
                "delivery": receipt,
                "kept": keep,
                "progress": history.events(),
            }))?),
            OutputFormat::Text => Ok(format_run_summary(&result, &receipt, keep)),
        }
    }

    fn handle_prompts(&self, file: &Path, format: OutputFormat) -> Result<String, PipelineError> {
        let text = std::fs::read_to_string(self.resolve_in_workspace(file))?;
        let prompts = extract_prompts(&text);
        match format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(&prompts)?),
            OutputFormat::Text => Ok(format_prompts_text(&prompts)),
        }
    }

    fn handle_config(&self, format: OutputFormat) -> Result<String, PipelineError> {
        match format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(&self.config)?),
            OutputFormat::Text => toml::to_string_pretty(&self.config).map_err(|e| {
                PipelineError::Config(format!("Failed to render configuration: {}", e))
            }),
        }
    }

    fn check_report(&self) -> CheckReport {
        let config_errors = match self.config.validate() {
            Ok(()) => Vec::new(),
            Err(errors) => errors.iter().map(ToString::to_string).collect(),
        };
        CheckReport {
            workspace: self.workspace_root.clone(),
            config_file: self.config_path.clone(),
            dotenv: self.dotenv_path.clone(),
            credentials: self.credentials.report(),
            config_errors,
            text_endpoint: self
                .config
                .text
                .enabled
                .then(|| self.config.text.endpoint.clone()),
            image_backends: self
                .config
                .images
                .endpoints
                .iter()
                .map(|endpoint| model_name(endpoint).to_string())
                .collect(),
        }
    }

    fn resolve_in_workspace(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.workspace_root.join(path)
        }
    }
}

struct GenerateArgs<'a> {
    topic: Option<&'a str>,
    max_images: Option<usize>,
    output: Option<&'a Path>,
    bundle_dir: Option<&'a Path>,
    interactive: bool,
    keep: bool,
    format: OutputFormat,
}

fn prompt_for_topic() -> Result<Topic, PipelineError> {
    use dialoguer::Input;

    let raw: String = Input::new()
        .with_prompt("Enter a topic for your YouTube Shorts")
        .interact_text()
        .map_err(|e| PipelineError::Config(format!("Failed to get user input: {}", e)))?;
    Topic::new(raw)
}

fn command_name(command: &Commands) -> &'static str {
    match command {
        Commands::Generate { .. } => "generate",
        Commands::Prompts { .. } => "prompts",
        Commands::Fallback { .. } => "fallback",
        Commands::Check => "check",
        Commands::Config { .. } => "config",
    }
}
