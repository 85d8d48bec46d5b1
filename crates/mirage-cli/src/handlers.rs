//! Command handlers for CLI operations

use mirage_core::{ApiRequest, MirageConfig};
use mirage_deps::anyhow::{Context as _, Result};
use mirage_deps::serde_json::{self, json};
use mirage_deps::tracing;
use mirage_deps::tracing_subscriber::{
    EnvFilter, Registry, fmt, layer::SubscriberExt as _, util::SubscriberInitExt as _,
};
use mirage_engine::builtins::WELL_KNOWN_TAGS;
use mirage_engine::{DirectoryFixtureSource, MockController, RouteParser};
use mirage_template::TemplateProcessor;
use serde_json::Value;
use std::io::{self, Write as _};
use std::path::{Path, PathBuf};

/// Options for `mirage resolve`
#[derive(Debug)]
pub struct ResolveArgs {
    /// Fixture directory override
    pub fixtures: Option<PathBuf>,
    /// Seed override
    pub seed: Option<u64>,
    /// Activation route to apply first
    pub route: Option<String>,
    /// HTTP method
    pub method: String,
    /// Request path
    pub path: String,
}

/// Log to stderr so stdout stays machine-readable
pub fn init_logging() {
    let initialized = Registry::default()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            "mirage_engine=info,mirage_template=info".into()
        }))
        .with(
            fmt::layer()
                .with_writer(io::stderr)
                .with_ansi(false)
                .with_target(true)
                .with_level(true),
        )
        .try_init();
    if let Err(err) = initialized {
        tracing::debug!("Tracing already initialised: {err}");
    }
}

/// Load the config file (if given) and apply environment overrides
///
/// # Errors
/// Returns an error if the file cannot be read or an override is malformed
pub fn load_config(path: Option<&Path>) -> Result<MirageConfig> {
    let mut config = match path {
        Some(path) => MirageConfig::load_from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => MirageConfig::default(),
    };
    config.apply_env_overrides()?;
    Ok(config)
}

fn emit(value: &Value) -> Result<()> {
    let mut stdout = io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, value)?;
    writeln!(stdout)?;
    Ok(())
}

/// Print the test configuration an activation route carries
///
/// # Errors
/// Returns an error if output cannot be written
pub fn handle_parse(config: &MirageConfig, href: &str) -> Result<()> {
    let route = RouteParser::new(&config.route).parse_href(href);
    for tag in &route.tags {
        if !WELL_KNOWN_TAGS.contains(&tag.as_str()) {
            tracing::debug!("Tag `{tag}` is not one of {WELL_KNOWN_TAGS:?}");
        }
    }
    emit(&serde_json::to_value(&route)?)
}

/// Validate fixtures, register their scenarios and expand every template once
///
/// # Errors
/// Returns an error if any fixture is invalid or any template fails to expand
pub fn handle_check(config: &MirageConfig, dir: &Path) -> Result<()> {
    let controller = MockController::new(config)?;
    let catalog = controller
        .load_fixtures(&DirectoryFixtureSource::new(dir))
        .with_context(|| format!("Invalid fixtures in {}", dir.display()))?;

    let processor = TemplateProcessor::new(&config.session);
    for fixture in catalog.fixtures() {
        processor
            .expand_response(&fixture.response)
            .with_context(|| format!("{}: response template", fixture.origin))?;
        for (name, variant) in &fixture.variants {
            processor
                .expand_response(variant)
                .with_context(|| format!("{}: variant `{name}` template", fixture.origin))?;
        }
    }

    emit(&json!({
        "fixtures": catalog.len(),
        "scenarios": controller.scenario_ids()?,
    }))
}

/// Resolve a single request and print the explained decision
///
/// # Errors
/// Returns an error for a missing or invalid fixture directory, unknown
/// scenarios or broken templates
pub fn handle_resolve(mut config: MirageConfig, args: &ResolveArgs) -> Result<()> {
    if let Some(seed) = args.seed {
        config.session.seed = Some(seed);
    }
    if let Some(fixtures) = &args.fixtures {
        config.fixtures.directory = Some(fixtures.clone());
    }

    let controller = MockController::new(&config)?;
    if let Some(dir) = &config.fixtures.directory {
        controller
            .load_fixtures(&DirectoryFixtureSource::new(dir))
            .with_context(|| format!("Invalid fixtures in {}", dir.display()))?;
    }
    if let Some(href) = &args.route {
        controller
            .apply_href(href)
            .with_context(|| format!("Failed to apply route {href}"))?;
    }

    let request = ApiRequest::new(&args.method, &args.path);
    let resolution = controller
        .resolve(&request)
        .with_context(|| format!("Failed to resolve {request}"))?;

    let mut output = serde_json::to_value(&resolution)?;
    if let Value::Object(fields) = &mut output {
        fields.insert("seed".to_owned(), Value::from(controller.seed()));
    }
    emit(&output)
}
