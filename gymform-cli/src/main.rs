use std::{
    fs,
    path::{Path, PathBuf},
};

use clap::{ArgAction, Parser, Subcommand};
use color_eyre::eyre::{Result, WrapErr, eyre};
use serde_json::Value;
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use gymform::{
    form::{FormState, coerce_values, validate_values},
    io::{DocumentFormat, load_form_document, parse_document_str, render_value},
    schema::FormDocument,
};

#[derive(Debug, Parser)]
#[command(
    name = "gymform",
    version,
    about = "Check form descriptions and validate values against them"
)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Resolve a form's layout and print its render order
    Check {
        /// Form description (.json, .yaml or .toml)
        form: PathBuf,
    },
    /// Run the synchronous field rules on a values document
    Validate {
        /// Form description (.json, .yaml or .toml)
        form: PathBuf,
        /// Field values keyed by field name
        #[arg(long = "values", value_name = "PATH")]
        values: PathBuf,
        /// Emit compact output rather than pretty formatting
        #[arg(long = "no-pretty")]
        no_pretty: bool,
    },
}

fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    init_logging(cli.verbose)?;

    match cli.command {
        Command::Check { form } => check(&form),
        Command::Validate {
            form,
            values,
            no_pretty,
        } => validate(&form, &values, !no_pretty),
    }
}

fn init_logging(verbosity: u8) -> Result<()> {
    let default_level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .try_init()
        .map_err(|err| eyre!("failed to initialise logging: {err}"))
}

fn read_document(path: &Path, label: &str) -> Result<(String, DocumentFormat)> {
    let contents = fs::read_to_string(path)
        .wrap_err_with(|| format!("failed to read {label} {}", path.display()))?;
    let format = DocumentFormat::from_path(path);
    debug!(path = %path.display(), %format, "loaded {label}");
    Ok((contents, format))
}

fn load_form(path: &Path) -> Result<FormDocument> {
    let (contents, format) = read_document(path, "form")?;
    load_form_document(&contents, format)
        .map_err(|err| eyre!("{err:#}"))
        .wrap_err_with(|| format!("invalid form {}", path.display()))
}

fn check(path: &Path) -> Result<()> {
    let document = load_form(path)?;
    let (schema, plan) = document
        .resolve()
        .wrap_err_with(|| format!("form {} has a configuration error", path.display()))?;

    if let Some(title) = &document.title {
        println!("{title}");
    }
    println!("render order:");
    for (idx, slot) in plan.slots().iter().enumerate() {
        let label = schema
            .field(&slot.field)
            .map(|field| field.display_label())
            .unwrap_or_default();
        println!(
            "  {}. {} ({label}) row {}, cols {}-{}",
            idx + 1,
            slot.field,
            slot.cell.row_start,
            slot.cell.col_start,
            slot.cell.col_end()
        );
    }
    let hidden = schema.len() - plan.slots().len();
    if hidden > 0 {
        println!("hidden fields: {hidden}");
    }
    info!(fields = schema.len(), rows = plan.row_count(), "form is valid");
    Ok(())
}

fn validate(form_path: &Path, values_path: &Path, pretty: bool) -> Result<()> {
    let document = load_form(form_path)?;
    let schema = document
        .schema()
        .wrap_err_with(|| format!("form {} has a configuration error", form_path.display()))?;

    let (contents, format) = read_document(values_path, "values")?;
    let values = parse_document_str(&contents, format).map_err(|err| eyre!("{err:#}"))?;
    let Value::Object(values) = values else {
        return Err(eyre!(
            "values document {} must be an object keyed by field name",
            values_path.display()
        ));
    };
    for name in values.keys().filter(|name| !schema.contains(name)) {
        println!("warning: '{name}' is not a field of this form");
    }

    let state = FormState::from_schema(&schema, Some(&values));
    let errors = validate_values(&schema, &state.values);
    if !errors.is_empty() {
        for (field, message) in &errors {
            println!("error: {field}: {message}");
        }
        return Err(eyre!("{} field(s) failed validation", errors.len()));
    }

    let payload = coerce_values(&schema, &state.values).map_err(|err| eyre!("{err}"))?;
    let rendered = render_value(&Value::Object(payload), format, pretty)
        .map_err(|err| eyre!("{err:#}"))?;
    println!("{}", rendered.trim_end());
    Ok(())
}
