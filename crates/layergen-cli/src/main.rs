//! Layergen command-line front end
//!
//! Loads a schema and a template directory, runs the generation pipeline, and
//! writes the rendered tree under the output root (or lists it with
//! `--dry-run`).

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use layergen_generation::{
    CaseStyle, DryRunWriter, FsOutputWriter, GenerationPipeline, NamingResolver, PipelineConfig,
    SharedContext, TemplateStore,
};
use layergen_generation::templates::parser::TokenVocabulary;
use layergen_schema::SchemaLoader;

#[derive(Parser, Debug)]
#[command(name = "layergen", version, about = "Layered CRUD scaffolding generator")]
struct Args {
    /// Path to the schema YAML file
    #[arg(short, long)]
    schema: PathBuf,

    /// Directory holding `<layer>.<variant>.tmpl` template files
    #[arg(short, long)]
    templates: PathBuf,

    /// Output root for the generated tree
    #[arg(short, long, default_value = "generated")]
    out: PathBuf,

    /// File extension for generated sources
    #[arg(long, default_value = "cs")]
    extension: String,

    /// Case style for generated file stems
    #[arg(long, value_enum, default_value_t = FileCase::Pascal)]
    file_case: FileCase,

    /// Extra `TOKEN=value` bindings available to every template
    #[arg(long = "define", value_name = "TOKEN=VALUE")]
    defines: Vec<String>,

    /// Render and report paths without writing anything
    #[arg(long)]
    dry_run: bool,
}

#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum FileCase {
    Pascal,
    Snake,
    Kebab,
}

impl From<FileCase> for CaseStyle {
    fn from(case: FileCase) -> Self {
        match case {
            FileCase::Pascal => CaseStyle::Pascal,
            FileCase::Snake => CaseStyle::Snake,
            FileCase::Kebab => CaseStyle::Kebab,
        }
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> anyhow::Result<()> {
    let schema = SchemaLoader::load_from_file(&args.schema)
        .with_context(|| format!("loading schema from {}", args.schema.display()))?;

    let context = parse_defines(&args.defines)?;
    let vocabulary = TokenVocabulary::with_context_keys(context.keys().map(str::to_string));
    let store = TemplateStore::load_from_dir(&args.templates, &vocabulary)
        .with_context(|| format!("loading templates from {}", args.templates.display()))?;

    let config = PipelineConfig {
        extension: args.extension.clone(),
        file_case: args.file_case.into(),
        context,
        ..PipelineConfig::default()
    };
    let pipeline = GenerationPipeline::new(&store, NamingResolver::new(), config);

    if args.dry_run {
        let mut sink = DryRunWriter::new();
        let report = pipeline.run(&schema, &mut sink)?;
        for path in &sink.paths {
            println!("{}", path.display());
        }
        info!(
            artifacts = report.artifacts,
            entities = report.entities,
            "dry run complete"
        );
    } else {
        let mut sink = FsOutputWriter::new(&args.out);
        let report = pipeline.run(&schema, &mut sink)?;
        info!(
            artifacts = report.artifacts,
            entities = report.entities,
            out = %args.out.display(),
            "generation complete"
        );
        println!(
            "generated {} files for {} entities under {}",
            report.write.written(),
            report.entities,
            args.out.display()
        );
    }

    Ok(())
}

/// Parse `TOKEN=value` pairs into a shared context
fn parse_defines(defines: &[String]) -> anyhow::Result<SharedContext> {
    let mut context = SharedContext::new();
    for define in defines {
        let (token, value) = define
            .split_once('=')
            .with_context(|| format!("malformed --define '{define}', expected TOKEN=VALUE"))?;
        context
            .insert(token, value)
            .with_context(|| format!("invalid --define token '{token}'"))?;
    }
    Ok(context)
}
