//! Command execution

use crate::commands::{RunArgs, SitesArgs, ValidateArgs};
use crate::config::{CliConfig, OutputFormat};
use crate::error::{CliError, CliResult};
use console::style;
use formpilot::prelude::*;
use serde::Serialize;
use std::fmt::Write as _;
use std::path::Path;

/// Outcome of one `run` invocation
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    /// Site key the rules were taken from
    pub site: String,
    /// Rules that matched in the pass
    pub matched: usize,
    /// Rules after the pass, with updated match state
    pub rules: Vec<Rule>,
}

fn read(path: &Path) -> CliResult<String> {
    std::fs::read_to_string(path).map_err(|source| CliError::Read {
        path: path.display().to_string(),
        source,
    })
}

fn load_page(path: &Path) -> CliResult<Page> {
    let source = read(path)?;
    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    let page = if is_json {
        Page::from_json(&source)?
    } else {
        Page::from_yaml(&source)?
    };
    Ok(page)
}

fn load_config(path: Option<&Path>) -> CliResult<EngineConfig> {
    match path {
        Some(path) => EngineConfig::from_yaml(&read(path)?)
            .map_err(|err| CliError::config(format!("{}: {err}", path.display()))),
        None => Ok(EngineConfig::default()),
    }
}

/// Rules for `site` from either file shape
fn rules_for_site(source: &str, site: &str) -> CliResult<Vec<Rule>> {
    if source.trim_start().starts_with('[') {
        return Ok(import_site_rules(source)?);
    }
    let mut backup = import_backup(source)?;
    backup
        .remove(site)
        .ok_or_else(|| CliError::invalid_argument(format!("backup has no rules for site {site}")))
}

/// Load a page and rules, then run one pass
pub fn run_rules(args: &RunArgs) -> CliResult<RunReport> {
    let page = load_page(&args.page)?;
    let config = load_config(args.config.as_deref())?;
    let site = match &args.site {
        Some(site) => site.clone(),
        None => site_key(page.url()).ok_or_else(|| {
            CliError::invalid_argument(format!(
                "page URL {} has no site; pass --site",
                page.url()
            ))
        })?,
    };
    let rules = rules_for_site(&read(&args.rules)?, &site)?;
    tracing::info!(site = %site, rules = rules.len(), "running pass");

    let store = MemoryStore::new().with_site(site.clone(), rules);
    let mut engine = Engine::new(page, store, RecordingNotifier::new(), site.clone(), config);
    engine.load_rules();
    let matched = engine.run_all(args.manual);
    Ok(RunReport {
        site,
        matched,
        rules: engine.rules().to_vec(),
    })
}

/// Render a run report
pub fn render_run(report: &RunReport, format: OutputFormat) -> CliResult<String> {
    match format {
        OutputFormat::Json => Ok(export_site_rules(&report.rules)?),
        OutputFormat::Text => {
            let mut out = String::new();
            let _ = writeln!(out, "{} {}", style("site:").bold(), report.site);
            for rule in &report.rules {
                let mark = if rule.last_matched {
                    style("✓").green()
                } else if !rule.enabled {
                    style("-").dim()
                } else {
                    style("✗").red()
                };
                let _ = writeln!(out, "  {mark} {}", rule.name);
            }
            let _ = writeln!(out, "{} rule(s) matched", report.matched);
            Ok(out)
        }
    }
}

/// Execute the run command
pub fn run(config: &CliConfig, args: &RunArgs) -> CliResult<()> {
    let format = OutputFormat::from(args.format);
    let report = run_rules(args)?;
    let output = render_run(&report, format)?;
    if !config.verbosity.is_quiet() || format == OutputFormat::Json {
        print!("{output}");
    }
    Ok(())
}

/// Import a single-site rules file and check every selector locator in it
pub fn check_rules_file(path: &Path) -> CliResult<Vec<Rule>> {
    let rules = import_site_rules(&read(path)?)?;
    for rule in &rules {
        for locator in rule.locators() {
            locator.check()?;
        }
    }
    Ok(rules)
}

/// Execute the validate command
pub fn validate(config: &CliConfig, args: &ValidateArgs) -> CliResult<()> {
    let rules = check_rules_file(&args.file)?;
    if !config.verbosity.is_quiet() {
        let site = args
            .file
            .file_name()
            .and_then(|name| name.to_str())
            .and_then(|name| name.strip_suffix("_rules.json"));
        match site {
            Some(site) => println!("{} rule(s) OK for {site}", rules.len()),
            None => println!("{} rule(s) OK", rules.len()),
        }
    }
    Ok(())
}

/// Execute the sites command
pub fn sites(config: &CliConfig, args: &SitesArgs) -> CliResult<()> {
    let backup = import_backup(&read(&args.backup)?)?;
    if config.verbosity.is_quiet() {
        return Ok(());
    }
    if backup.is_empty() {
        println!("no sites");
    }
    for (site, rules) in &backup {
        println!("{site}\t{}", rules.len());
    }
    Ok(())
}
