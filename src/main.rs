use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use std::io::{self, BufRead, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use vidgraph::ingestion::{GeminiClient, GenerationOutcome, GenerationPipeline, PromptFormatter, PromptTemplate};
use vidgraph::memory::{ArtifactLoader, ArtifactWriter};
use vidgraph::render::{GraphView, StudyGuide};
use vidgraph::utils::slugify;
use vidgraph::{ArtifactSet, Config, GenerationRequest, Persona, Quiz, Session};

#[derive(Parser)]
#[command(name = "vidgraph", version, about = "Transcript to concept map, quiz and study guide", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    #[arg(long, default_value = "info", global = true)]
    log_level: String,
}

#[derive(Args)]
struct ProviderArgs {
    /// Overrides GEMINI_API_KEY / GOOGLE_API_KEY and the config file.
    #[arg(long)]
    api_key: Option<String>,
    /// Pins the model instead of picking one from the provider's list.
    #[arg(long)]
    model: Option<String>,
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    Generate {
        /// Transcript or article; `-` reads standard input.
        #[arg(long)]
        input: PathBuf,
        #[arg(long, default_value = "out")]
        out: PathBuf,
        #[arg(long)]
        persona: Option<Persona>,
        #[command(flatten)]
        provider: ProviderArgs,
    },
    Chat {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        persona: Option<Persona>,
        #[command(flatten)]
        provider: ProviderArgs,
    },
    Models {
        #[command(flatten)]
        provider: ProviderArgs,
    },
    Export {
        /// Directory written by `generate`.
        #[arg(long)]
        dir: PathBuf,
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Takes the stored quiz interactively and prints the score.
    Quiz {
        #[arg(long)]
        dir: PathBuf,
    },
}

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn load_config(provider: &ProviderArgs) -> anyhow::Result<Config> {
    let mut config = match &provider.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    if provider.model.is_some() {
        config.model = provider.model.clone();
    }
    Ok(config)
}

fn build_pipeline(
    config: &Config,
    provider: &ProviderArgs,
) -> anyhow::Result<GenerationPipeline<GeminiClient>> {
    let client = GeminiClient::from_config(config)?;
    let formatter = PromptFormatter::new(PromptTemplate::default(), config.max_input_chars);
    let credential = config.resolve_api_key(provider.api_key.as_deref());
    Ok(GenerationPipeline::new(Arc::new(client), formatter, credential)
        .with_chat_turns(config.chat_history_turns))
}

fn read_input(path: &Path) -> anyhow::Result<String> {
    if path == Path::new("-") {
        let mut text = String::new();
        io::stdin()
            .read_to_string(&mut text)
            .context("unable to read standard input")?;
        return Ok(text);
    }
    std::fs::read_to_string(path).with_context(|| format!("unable to read {:?}", path))
}

fn guide_title(artifacts: &ArtifactSet) -> String {
    artifacts
        .graph
        .ready()
        .and_then(|graph| graph.core_concepts().next())
        .map(|node| format!("Study Guide: {}", node.label))
        .unwrap_or_else(|| "Study Guide".to_string())
}

fn write_exports(dir: &Path, artifacts: &ArtifactSet) -> anyhow::Result<()> {
    std::fs::create_dir_all(dir).with_context(|| format!("unable to create {:?}", dir))?;
    let title = guide_title(artifacts);
    if let Some(graph) = artifacts.graph.ready() {
        let view = GraphView::build(graph);
        if !view.insights.is_connected() {
            warn!(components = view.insights.components, "concept map is not connected");
        }
        if let Some(node) = view
            .insights
            .ranked()
            .first()
            .and_then(|top| graph.get_node(&top.id))
        {
            info!(concept = %node.label, "most central concept");
        }
        let html_path = dir.join("graph.html");
        std::fs::write(&html_path, view.to_html(&title)?)
            .with_context(|| format!("unable to write {:?}", html_path))?;
    }
    let pdf_path = dir.join(format!("{}.pdf", slugify(&title)));
    let pdf = StudyGuide::from_artifacts(title, artifacts).to_pdf()?;
    std::fs::write(&pdf_path, pdf).with_context(|| format!("unable to write {:?}", pdf_path))?;
    info!(dir = %dir.display(), "exports written");
    Ok(())
}

fn take_quiz(quiz: &Quiz) -> anyhow::Result<()> {
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    let mut answers = Vec::with_capacity(quiz.len());
    for (i, item) in quiz.iter().enumerate() {
        println!("Q{}: {}", i + 1, item.question);
        for (n, option) in item.options.iter().enumerate() {
            println!("  {}. {}", n + 1, option);
        }
        print!("> ");
        io::stdout().flush()?;
        let line = match lines.next() {
            Some(line) => line?,
            None => break,
        };
        let choice = item.resolve_choice(&line).to_string();
        if item.is_correct(&choice) {
            println!("correct\n");
        } else {
            println!("expected: {}", item.answer.trim());
            if let Some(explanation) = &item.explanation {
                println!("{}", explanation);
            }
            println!();
        }
        answers.push(choice);
    }
    let score = quiz.score(&answers);
    println!(
        "score: {}/{} ({:.0}%)",
        score.correct,
        score.total,
        score.ratio() * 100.0
    );
    Ok(())
}

fn report_failures(artifacts: &ArtifactSet) {
    if let Some(failure) = artifacts.graph.failure() {
        eprintln!("graph: {}", failure);
    }
    if let Some(failure) = artifacts.quiz.failure() {
        eprintln!("quiz: {}", failure);
    }
    if let Some(failure) = artifacts.summary.failure() {
        eprintln!("summary: {}", failure);
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    match cli.command {
        Commands::Generate {
            input,
            out,
            persona,
            provider,
        } => {
            let config = load_config(&provider)?;
            let pipeline = build_pipeline(&config, &provider)?;
            let text = read_input(&input)?;
            let request = GenerationRequest::new(text, persona.unwrap_or(config.persona));
            let mut session = Session::new();
            let outcome = pipeline.generate(&mut session, request)?;
            if let GenerationOutcome::Generated { report, .. } = &outcome {
                if !report.is_clean() {
                    println!("{}", serde_json::to_string_pretty(report)?);
                }
            }
            if let (Some(source), Some(artifacts)) = (session.source_text(), session.artifacts()) {
                report_failures(artifacts);
                ArtifactWriter::save_to_dir(&out, source, artifacts)?;
                write_exports(&out, artifacts)?;
            }
            info!(
                session = %session.id(),
                started = %session.created_at(),
                state = %session.state(),
                out = %out.display(),
                "done"
            );
        }
        Commands::Chat {
            input,
            persona,
            provider,
        } => {
            let config = load_config(&provider)?;
            let pipeline = build_pipeline(&config, &provider)?;
            let text = read_input(&input)?;
            let persona = persona.unwrap_or(config.persona);
            let mut session = Session::new();
            pipeline.generate(&mut session, GenerationRequest::new(text.clone(), persona))?;
            if let Some(artifacts) = session.artifacts() {
                report_failures(artifacts);
                if let Some(summary) = artifacts.summary_text() {
                    println!("{}\n", summary);
                }
            }

            let stdin = io::stdin();
            print!("> ");
            io::stdout().flush()?;
            for line in stdin.lock().lines() {
                let line = line?;
                match line.trim() {
                    ":quit" | ":q" => break,
                    ":regen" => {
                        let outcome = pipeline
                            .generate(&mut session, GenerationRequest::new(text.clone(), persona))?;
                        println!("{:?}", outcome);
                    }
                    "" => {}
                    question => match pipeline.ask(&mut session, question) {
                        Ok(answer) => println!("{}", answer),
                        Err(e) => error!(error = %e, "chat failed"),
                    },
                }
                print!("> ");
                io::stdout().flush()?;
            }
        }
        Commands::Models { provider } => {
            let config = load_config(&provider)?;
            let credential = config
                .resolve_api_key(provider.api_key.as_deref())
                .ok_or(vidgraph::PipelineError::MissingCredential)?;
            let client = GeminiClient::from_config(&config)?;
            let names = client.list_models(&credential)?;
            for name in &names {
                println!("{}", name);
            }
            println!("selected: {}", client.resolve_model(&credential));
        }
        Commands::Export { dir, output } => {
            let (_, artifacts) = ArtifactLoader::load_from_dir(&dir)?;
            write_exports(output.as_deref().unwrap_or(dir.as_path()), &artifacts)?;
        }
        Commands::Quiz { dir } => {
            let (_, artifacts) = ArtifactLoader::load_from_dir(&dir)?;
            let quiz = artifacts
                .quiz
                .ready()
                .ok_or_else(|| anyhow::anyhow!("no quiz stored in {:?}", dir))?;
            take_quiz(quiz)?;
        }
    }

    Ok(())
}
