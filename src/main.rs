//
// Part of pinelint
// Copyright (c) 2026 pinelint contributors
// License: MIT
//

use pinelint::analyzer::{self, CheckerKind, Config, ParserOptions};
use pinelint::error::Severity;
use pinelint::included;
use pinelint::lexer;
use pinelint::registry::{DocumentationRegistry, RuleRegistry};
use pinelint::stdout::{self, StdOut};

use std::io::Write;

use anyhow::anyhow;
use anyhow::Context;
use clap::Parser;
use serde::Deserialize;
use termcolor::{Color, ColorSpec, StandardStream, WriteColor};

#[derive(Debug, clap::Parser)]
#[clap(version)]
struct Cli
{
	/// One or more Pine Script source files
	#[clap(value_parser, required(true))]
	filepaths: Vec<std::path::PathBuf>,

	#[clap(flatten)]
	check: CheckArgs,

	#[clap(flatten)]
	output: stdout::Options,
}

#[derive(Debug, Default, Deserialize, clap::Args)]
#[serde(default, deny_unknown_fields)]
struct CheckArgs
{
	/// Rule registry (JSON) that enables the optional checks
	/// (default: 'builtin:rules.json')
	#[clap(long, value_name("PATH"))]
	rules: Option<String>,

	/// Only run the checks that do not depend on a rule registry
	#[clap(long)]
	no_rules: bool,

	/// Function documentation (JSON) used for parameter names and signatures
	/// (default: 'builtin:documentation.json')
	#[clap(long, value_name("PATH"))]
	docs: Option<String>,

	/// Load additional options from TOML file
	#[clap(long)]
	#[serde(skip)]
	config: Option<std::path::PathBuf>,

	/// Run a single check, regardless of the rule registry
	#[clap(long, value_enum, value_name("CHECK"))]
	only: Option<Only>,

	/// How to print the results (default: 'human')
	#[clap(long, value_enum)]
	format: Option<Format>,

	/// Fail when any warning is reported
	#[clap(long)]
	deny_warnings: bool,

	/// How often the parser may recover from an error before giving up
	/// (default: 10)
	#[clap(long, value_name("N"))]
	max_recovery_attempts: Option<usize>,
}

#[derive(Debug, Clone, Copy, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
enum Only
{
	ShortTitle,
	Precision,
	MaxBarsBack,
	DrawingLimits,
	Naming,
	NaObjects,
	SyntaxCompatibility,
}

impl From<Only> for CheckerKind
{
	fn from(only: Only) -> CheckerKind
	{
		match only
		{
			Only::ShortTitle => CheckerKind::ShortTitle,
			Only::Precision => CheckerKind::Precision,
			Only::MaxBarsBack => CheckerKind::MaxBarsBack,
			Only::DrawingLimits => CheckerKind::DrawingLimits,
			Only::Naming => CheckerKind::Naming,
			Only::NaObjects => CheckerKind::ObjectState,
			Only::SyntaxCompatibility => CheckerKind::SyntaxCompatibility,
		}
	}
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize)]
#[derive(clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
enum Format
{
	#[default]
	Human,
	Json,
}

fn main() -> Result<(), anyhow::Error>
{
	env_logger::Builder::from_env(
		env_logger::Env::default().default_filter_or("warn"),
	)
	.init();

	let cli = Cli::parse();
	let color = cli.output.color;
	let result = do_main(cli);
	if result.is_err()
	{
		let mut stderr = StandardStream::stderr(color.into());
		let colorspec_error = ColorSpec::new()
			.set_fg(Some(Color::Red))
			.set_bold(true)
			.to_owned();
		stderr.set_color(&colorspec_error)?;
		writeln!(stderr)?;
		stderr.reset()?;
	}
	result
}

struct MainArgs
{
	filepaths: Vec<std::path::PathBuf>,
	output: stdout::Options,
	rules: Option<RuleRegistry>,
	documentation: DocumentationRegistry,
	only: Option<CheckerKind>,
	format: Format,
	deny_warnings: bool,
	parser: ParserOptions,
}

impl TryFrom<Cli> for MainArgs
{
	type Error = anyhow::Error;

	fn try_from(cli: Cli) -> Result<Self, Self::Error>
	{
		let Cli {
			filepaths,
			check: args,
			output,
		} = cli;
		let config: CheckArgs = if let Some(filename) = &args.config
		{
			let raw = std::fs::read_to_string(filename).with_context(|| {
				format!("failed to read '{}'", filename.to_string_lossy())
			})?;
			toml::from_str(&raw).with_context(|| {
				format!("failed to parse '{}'", filename.to_string_lossy())
			})?
		}
		else
		{
			Default::default()
		};

		let no_rules = args.no_rules || config.no_rules;
		let rules = match (no_rules, args.rules.or(config.rules))
		{
			(true, Some(_)) =>
			{
				return Err(anyhow!("--rules cannot be used with --no-rules"));
			}
			(true, None) => None,
			(false, Some(filepath)) => Some(included::load_rules(&filepath)?),
			(false, None) => Some(included::default_rules()?),
		};
		let documentation = match args.docs.or(config.docs)
		{
			Some(filepath) => included::load_documentation(&filepath)?,
			None => included::default_documentation()?,
		};
		let max_recovery_attempts = args
			.max_recovery_attempts
			.or(config.max_recovery_attempts)
			.unwrap_or(ParserOptions::default().max_recovery_attempts);
		Ok(MainArgs {
			filepaths,
			output,
			rules,
			documentation,
			only: args.only.or(config.only).map(CheckerKind::from),
			format: args.format.or(config.format).unwrap_or_default(),
			deny_warnings: args.deny_warnings || config.deny_warnings,
			parser: ParserOptions {
				max_recovery_attempts,
			},
		})
	}
}

fn do_main(cli: Cli) -> Result<(), anyhow::Error>
{
	let args = cli.try_into()?;
	let MainArgs {
		filepaths,
		output,
		rules,
		documentation,
		only,
		format,
		deny_warnings,
		parser,
	} = args;

	let mut stdout = StdOut::new(&output);
	let mut num_failed = 0;

	for filepath in filepaths
	{
		let filename = filepath.to_string_lossy().to_string();
		let source = std::fs::read_to_string(&filepath)
			.with_context(|| format!("failed to read '{}'", filename))?;
		let config = Config {
			rules: rules.as_ref(),
			documentation: Some(&documentation),
			parser,
			source_filename: &filename,
		};

		if output.verbose
		{
			stdout.header("Lexing", &filename)?;
			let tokens = lexer::lex(&source, &filename);
			stdout.dump_tokens(&tokens)?;
		}

		let (violations, parse_errors, is_failure) = if let Some(kind) = only
		{
			stdout.header(&format!("Checking {} of", kind), &filename)?;
			let result = analyzer::run_single(kind, &source, &config);
			if format == Format::Json
			{
				stdout.json_quick(&filename, &result)?;
			}
			let is_failure = result.violations.iter().any(|x| {
				x.severity.is_error()
					|| (deny_warnings && x.severity == Severity::Warning)
			});
			(result.violations, Vec::new(), is_failure)
		}
		else
		{
			stdout.header("Analyzing", &filename)?;
			let analysis = analyzer::analyze(&source, &config);
			stdout.dump_calls(&analysis.function_calls)?;
			stdout.dump_metrics(&analysis)?;
			if format == Format::Json
			{
				stdout.json_analysis(&filename, &analysis)?;
			}
			let is_failure = !analysis.success
				|| analysis.has_errors()
				|| (deny_warnings && analysis.has_warnings());
			let mut parse_errors = analysis.errors;
			parse_errors.extend(analysis.warnings);
			(analysis.violations, parse_errors, is_failure)
		};

		if format == Format::Human
		{
			let sources = vec![(filename.clone(), source.clone())];
			stdout.show_parse_errors(&parse_errors, ariadne::sources(sources))?;
			let sources = vec![(filename.clone(), source.clone())];
			stdout.show_violations(&violations, ariadne::sources(sources))?;
			stdout.summary(&filename, &violations, &parse_errors)?;
		}
		if is_failure
		{
			num_failed += 1;
		}
	}

	stdout.done()?;
	if num_failed > 0
	{
		Err(anyhow!("{} files did not pass", num_failed))
	}
	else
	{
		Ok(())
	}
}
