//! CLI binary for running the social-post generation pipeline.

use std::io::Read;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use tokio_stream::StreamExt;

use postforge_llm::{DynModel, GeminiModel, ScriptedModel};
use postforge_pipeline::{
    Pipeline, PipelineRequest, PlatformRegistry, RunMode, DEFAULT_CONCURRENCY, DEFAULT_MAX_TOPICS,
};

#[derive(Parser)]
#[command(name = "postforge", version, about = "Emotion-targeted social post generation")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the pipeline and print the result as JSON
    Run {
        #[command(flatten)]
        input: InputArgs,
    },

    /// Run the pipeline and print progress as SSE frames
    Stream {
        #[command(flatten)]
        input: InputArgs,
    },

    /// List supported platforms and their posting constraints
    Platforms,
}

#[derive(clap::Args)]
struct InputArgs {
    /// Path to the source text file (reads stdin when omitted)
    file: Option<PathBuf>,

    /// Destination URL appended to every post
    #[arg(short, long, default_value = "")]
    url: String,

    /// Target platform (repeatable)
    #[arg(short, long = "platform", default_values = ["twitter"])]
    platforms: Vec<String>,

    /// Audience context fed to the classification and generation prompts
    #[arg(short, long)]
    audience: Option<String>,

    /// Maximum number of topics to extract
    #[arg(long, default_value_t = DEFAULT_MAX_TOPICS)]
    max_topics: usize,

    /// Fan-out concurrency bound
    #[arg(long, default_value_t = DEFAULT_CONCURRENCY)]
    parallel: usize,

    /// Run fan-out stages one item at a time
    #[arg(long)]
    sequential: bool,

    /// Use a canned offline model instead of the Gemini API
    #[arg(long)]
    offline: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Run { input } => cmd_run(input).await?,
        Commands::Stream { input } => cmd_stream(input).await?,
        Commands::Platforms => cmd_platforms(),
    }

    Ok(())
}

fn read_source(file: Option<&Path>) -> anyhow::Result<String> {
    match file {
        Some(path) => Ok(std::fs::read_to_string(path)?),
        None => {
            let mut text = String::new();
            std::io::stdin().read_to_string(&mut text)?;
            Ok(text)
        }
    }
}

fn build_pipeline(args: &InputArgs) -> anyhow::Result<Pipeline> {
    // Offline runs share one scripted model across all stages so the canned
    // responses are consumed in pipeline order. Online runs use a hotter
    // model for generation than for extraction and classification.
    let (model, generation_model) = if args.offline {
        let model = offline_model();
        (model.clone(), model)
    } else {
        (
            DynModel::new(GeminiModel::from_env()?),
            DynModel::new(GeminiModel::from_env()?.with_temperature(0.3)),
        )
    };

    let mode = if args.sequential {
        RunMode::Sequential
    } else {
        RunMode::Parallel
    };

    Ok(Pipeline::new(model)
        .with_generation_model(generation_model)
        .with_mode(mode)
        .with_concurrency(args.parallel))
}

fn build_request(args: &InputArgs, text: String) -> PipelineRequest {
    let mut request = PipelineRequest::new(text, args.url.clone())
        .with_platforms(args.platforms.clone())
        .with_max_topics(args.max_topics);
    if let Some(audience) = &args.audience {
        request = request.with_audience_context(audience.clone());
    }
    request
}

/// A scripted model for demo runs without API access: two fixed topics, one
/// fixed classification, and a repeating post body for every pair.
fn offline_model() -> DynModel {
    const TOPICS: &str = r#"[
        {"topic_name": "Offline Demo Topic", "content_excerpt": "canned excerpt one", "confidence_score": 0.9},
        {"topic_name": "Second Demo Topic", "content_excerpt": "canned excerpt two", "confidence_score": 0.8}
    ]"#;
    const EMOTION: &str = r#"{"primary_emotion": "encourage_dreams", "emotion_confidence": 0.75,
        "emotion_description": "Inspire aspiration and positive outcomes",
        "reasoning": "Canned offline classification."}"#;

    let responses = vec![TOPICS.to_string(), EMOTION.to_string(), EMOTION.to_string()];
    DynModel::new(ScriptedModel::new(responses).with_repeat(
        "Offline demo post body. Set GOOGLE_API_KEY and drop --offline to generate real content.",
    ))
}

async fn cmd_run(args: InputArgs) -> anyhow::Result<()> {
    let text = read_source(args.file.as_deref())?;
    let pipeline = build_pipeline(&args)?;
    let request = build_request(&args, text);

    let result = pipeline.run(&request).await;
    println!("{}", serde_json::to_string_pretty(&result)?);

    if !result.success {
        std::process::exit(1);
    }
    Ok(())
}

async fn cmd_stream(args: InputArgs) -> anyhow::Result<()> {
    let text = read_source(args.file.as_deref())?;
    let pipeline = build_pipeline(&args)?;
    let request = build_request(&args, text);

    let mut events = pipeline.stream(request);
    let mut failed = false;
    while let Some(event) = events.next().await {
        if event.event_type() == "error" {
            failed = true;
        }
        print!("{}", event.to_sse());
    }

    if failed {
        std::process::exit(1);
    }
    Ok(())
}

fn cmd_platforms() {
    let registry = PlatformRegistry::builtin();
    for name in registry.supported() {
        if let Ok(config) = registry.get(name) {
            println!(
                "{:<10} limit={:<5} window={}-{} strategy={}",
                config.name,
                config.character_limit,
                config.min_content_length,
                config.max_content_length,
                config.strategy
            );
            println!("{:<10} tone: {}", "", config.tone_guidance);
        }
    }
}
