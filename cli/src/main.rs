//! fillpdf CLI - PDF form template filling tool

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use clap::{Parser, Subcommand};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use fillpdf::{
    extract_catalog, fill_document, inspect_output, AppliedAs, FieldOutcome, FillOptions,
    FormDocument, FsTemplateProvider, ImageBlob, InjectionReport, PreviewStatus, RegenConfig,
    RegenerationController, SaveOptions, Severity, TemplateRegistry, ValueMap,
};

type CliResult = Result<(), Box<dyn std::error::Error>>;

#[derive(Parser)]
#[command(name = "fillpdf")]
#[command(author = "iyulab")]
#[command(version)]
#[command(about = "List and fill the form fields of PDF templates", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// List the form fields of a template
    Fields {
        /// Template PDF file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Print the catalog as JSON
        #[arg(long)]
        json: bool,

        /// Compact JSON (implies --json)
        #[arg(long)]
        compact: bool,
    },

    /// Fill a template once and write the result
    Fill {
        /// Template PDF file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output file
        #[arg(short, long, value_name = "FILE")]
        output: PathBuf,

        /// Text value, as name=value (repeatable)
        #[arg(long = "set", value_name = "NAME=VALUE")]
        set: Vec<String>,

        /// Image value, as name=path (repeatable)
        #[arg(long = "image", value_name = "NAME=PATH")]
        images: Vec<String>,

        /// JSON file of values
        #[arg(long, value_name = "FILE")]
        values: Option<PathBuf>,

        /// Do not generate text appearance streams
        #[arg(long)]
        no_appearances: bool,

        /// Leave Producer and ModDate untouched
        #[arg(long)]
        keep_metadata: bool,
    },

    /// Show template information
    Info {
        /// Template PDF file
        #[arg(value_name = "FILE")]
        input: PathBuf,
    },

    /// Regenerate the output whenever the values file changes
    Watch {
        /// Template manifest (JSON)
        #[arg(value_name = "MANIFEST")]
        manifest: PathBuf,

        /// Template id (defaults to the first in the manifest)
        #[arg(short, long)]
        template: Option<String>,

        /// JSON file of values
        #[arg(long, value_name = "FILE")]
        values: PathBuf,

        /// Output file
        #[arg(short, long, value_name = "FILE")]
        output: PathBuf,

        /// Directory template paths are relative to
        #[arg(long, env = "FILLPDF_TEMPLATE_ROOT", value_name = "DIR")]
        root: Option<PathBuf>,

        /// Quiescence window in milliseconds
        #[arg(long, env = "FILLPDF_QUIESCENCE_MS", default_value = "1500")]
        quiescence_ms: u64,

        /// How often to check the values file, in milliseconds
        #[arg(long, default_value = "500")]
        poll_ms: u64,
    },

    /// Show version information
    Version,
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    let result = match cli.command {
        Some(Commands::Fields {
            input,
            json,
            compact,
        }) => cmd_fields(&input, json || compact, compact),
        Some(Commands::Fill {
            input,
            output,
            set,
            images,
            values,
            no_appearances,
            keep_metadata,
        }) => cmd_fill(
            &input,
            &output,
            &set,
            &images,
            values.as_deref(),
            no_appearances,
            keep_metadata,
        ),
        Some(Commands::Info { input }) => cmd_info(&input),
        Some(Commands::Watch {
            manifest,
            template,
            values,
            output,
            root,
            quiescence_ms,
            poll_ms,
        }) => cmd_watch(WatchArgs {
            manifest,
            template,
            values,
            output,
            root,
            quiescence: Duration::from_millis(quiescence_ms),
            poll: Duration::from_millis(poll_ms),
        }),
        Some(Commands::Version) => {
            cmd_version();
            Ok(())
        }
        None => {
            println!("{}", "Usage: fillpdf <COMMAND> <FILE>".yellow());
            println!("       fillpdf --help for more information");
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

fn cmd_fields(input: &Path, json: bool, compact: bool) -> CliResult {
    let data = fs::read(input)?;
    let catalog = fillpdf::extract_fields(&data)?;

    if json {
        let out = if compact {
            serde_json::to_string(&catalog)?
        } else {
            serde_json::to_string_pretty(&catalog)?
        };
        println!("{}", out);
        return Ok(());
    }

    if catalog.is_empty() {
        println!("{}", "No form fields".yellow());
        return Ok(());
    }

    for field in &catalog {
        let mut line = format!("{} {}", field.name.bold(), format!("({})", field.kind).dimmed());
        if let Some(options) = &field.options {
            line.push_str(&format!(" [{}]", options.join(", ")));
        }
        if field.accepts_image() {
            line.push_str(&format!(" {}", "image".cyan()));
        }
        println!("{}", line);
    }
    println!("\n{} {} fields", "Total:".green().bold(), catalog.len());
    Ok(())
}

fn cmd_fill(
    input: &Path,
    output: &Path,
    set: &[String],
    images: &[String],
    values_file: Option<&Path>,
    no_appearances: bool,
    keep_metadata: bool,
) -> CliResult {
    let mut values = match values_file {
        Some(path) => load_values(path)?,
        None => ValueMap::new(),
    };
    for pair in set {
        let (name, value) = split_pair(pair)?;
        values.set(name, value);
    }
    for pair in images {
        let (name, path) = split_pair(pair)?;
        values.set(name, ImageBlob::from_path(path)?);
    }

    let options = FillOptions::new()
        .with_appearances(!no_appearances)
        .with_save_options(SaveOptions::new().with_metadata(!keep_metadata));

    let pb = ProgressBar::new(3);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {msg}")
            .unwrap()
            .progress_chars("#>-"),
    );

    pb.set_message("Loading template...");
    let data = fs::read(input)?;
    let mut doc = FormDocument::load(&data)?;
    let catalog = extract_catalog(&doc)?;
    pb.inc(1);

    pb.set_message("Filling fields...");
    let filled = fill_document(&mut doc, &catalog, &values, &options)?;
    pb.inc(1);

    pb.set_message("Writing output...");
    fs::write(output, &filled.bytes)?;
    pb.inc(1);
    pb.finish_with_message("Done!");

    print_report(&filled.report);
    println!("{} {}", "Saved to".green(), output.display());
    Ok(())
}

fn cmd_info(input: &Path) -> CliResult {
    let data = fs::read(input)?;
    let doc = FormDocument::load(&data)?;
    let catalog = extract_catalog(&doc)?;

    println!("{}", "Template Information".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());

    println!("{}: {}", "File".bold(), input.display());
    println!("{}: PDF {}", "Format".bold(), doc.version());
    println!("{}: {}", "Pages".bold(), doc.page_count());
    if doc.page_count() > 0 {
        let (w, h) = doc.page_size(1)?;
        println!("{}: {:.0} x {:.0} pt", "Page size".bold(), w, h);
    }

    println!();
    println!("{}", "Form Fields".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());
    println!("{}: {}", "Total".bold(), catalog.len());
    for (kind, count) in catalog.count_by_kind() {
        println!("{}: {}", kind.to_string().bold(), count);
    }
    Ok(())
}

struct WatchArgs {
    manifest: PathBuf,
    template: Option<String>,
    values: PathBuf,
    output: PathBuf,
    root: Option<PathBuf>,
    quiescence: Duration,
    poll: Duration,
}

fn cmd_watch(args: WatchArgs) -> CliResult {
    let registry = TemplateRegistry::from_manifest_file(&args.manifest)?;
    let template = match &args.template {
        Some(id) => registry.require(id)?.clone(),
        None => registry
            .default_template()
            .ok_or("manifest lists no templates")?
            .clone(),
    };
    let root = args.root.clone().unwrap_or_else(|| {
        args.manifest
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default()
    });

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async move {
        let provider = Arc::new(FsTemplateProvider::new(root));
        let config = RegenConfig::new().with_quiescence(args.quiescence);
        let mut controller = RegenerationController::new(provider, config);

        let mut outputs = controller.subscribe_output();
        let mut notifications = controller.notifications();

        let catalog = controller.select_template(template.clone()).await?;
        println!(
            "{} {} ({} fields)",
            "Watching".cyan().bold(),
            template.name,
            catalog.len()
        );

        let mut last_modified = modified_time(&args.values);
        controller.replace_values(load_values(&args.values)?);

        let mut poll = tokio::time::interval(args.poll);
        loop {
            tokio::select! {
                changed = outputs.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let current = outputs.borrow_and_update().clone();
                    match (&current, inspect_output(current.as_ref())) {
                        (Some(out), PreviewStatus::Ready(info)) => {
                            fs::write(&args.output, &out.bytes)?;
                            for warning in &out.report.warnings {
                                log::warn!("{}: {}", warning.field, warning.message);
                            }
                            println!(
                                "{} run #{}: {} bytes, {} page(s), {} fields filled",
                                "Updated".green(),
                                out.seq,
                                out.len(),
                                info.page_count,
                                out.report.applied_count()
                            );
                        }
                        (_, PreviewStatus::Invalid(reason)) => {
                            println!("{} {}", "Output does not decode:".red(), reason);
                        }
                        _ => println!("{}", "No output".dimmed()),
                    }
                }
                Ok(note) = notifications.recv() => {
                    let label = match note.severity {
                        Severity::Error => "error".red(),
                        Severity::Warning => "warning".yellow(),
                        Severity::Success => "ok".green(),
                        Severity::Info => "info".cyan(),
                    };
                    println!("[{}] {}", label, note.message);
                }
                _ = poll.tick() => {
                    let modified = modified_time(&args.values);
                    if modified != last_modified {
                        last_modified = modified;
                        log::debug!("{} changed, reloading values", args.values.display());
                        match load_values(&args.values) {
                            Ok(values) => controller.replace_values(values),
                            Err(e) => println!("{} {}", "Ignoring values file:".yellow(), e),
                        }
                    }
                }
                _ = tokio::signal::ctrl_c() => {
                    log::info!("Interrupted, stopping watch");
                    break;
                }
            }
        }
        Ok::<(), Box<dyn std::error::Error>>(())
    })
}

fn cmd_version() {
    println!("{} {}", "fillpdf".cyan().bold(), env!("CARGO_PKG_VERSION"));
    println!("PDF form template filling tool");
    println!();
    println!("Repository: {}", "https://github.com/iyulab/fillpdf".dimmed());
    println!("License: MIT");
}

fn print_report(report: &InjectionReport) {
    println!("\n{}", "Fields".cyan().bold());
    for field in &report.fields {
        let status = match &field.outcome {
            FieldOutcome::Applied(AppliedAs::Text) => "text".green(),
            FieldOutcome::Applied(AppliedAs::ControlAppearance) => "button image".green(),
            FieldOutcome::Applied(AppliedAs::PagePlacement { page, .. }) => {
                format!("image on page {}", page).green()
            }
            FieldOutcome::Skipped(reason) => format!("skipped ({:?})", reason).dimmed(),
        };
        println!("  {} {}: {}", "├─".dimmed(), field.name, status);
    }
    for warning in &report.warnings {
        println!("{} {}: {}", "Warning".yellow(), warning.field, warning.message);
    }
    println!(
        "\n{} {} applied, {} skipped",
        "Done!".green().bold(),
        report.applied_count(),
        report.skipped_count()
    );
}

fn split_pair(pair: &str) -> Result<(&str, &str), String> {
    pair.split_once('=')
        .filter(|(name, _)| !name.is_empty())
        .ok_or_else(|| format!("expected NAME=VALUE, got {:?}", pair))
}

fn modified_time(path: &Path) -> Option<SystemTime> {
    fs::metadata(path).and_then(|m| m.modified()).ok()
}

/// Read a values file: strings are text, `{"image": "path"}` objects are
/// images (paths relative to the file), and `null` clears a field.
fn load_values(path: &Path) -> Result<ValueMap, Box<dyn std::error::Error>> {
    let text = fs::read_to_string(path)?;
    let json: serde_json::Value = serde_json::from_str(&text)?;
    let object = json
        .as_object()
        .ok_or_else(|| format!("{}: expected a JSON object", path.display()))?;
    let base = path.parent().unwrap_or_else(|| Path::new("."));

    let mut values = ValueMap::new();
    for (name, value) in object {
        match value {
            serde_json::Value::Null => {}
            serde_json::Value::String(s) => values.set(name.as_str(), s.as_str()),
            serde_json::Value::Object(obj) => {
                let image = obj
                    .get("image")
                    .and_then(|v| v.as_str())
                    .ok_or_else(|| format!("field {}: expected {{\"image\": path}}", name))?;
                values.set(name.as_str(), ImageBlob::from_path(base.join(image))?);
            }
            other => values.set(name.as_str(), other.to_string()),
        }
    }
    Ok(values)
}
