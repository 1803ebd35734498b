//
// Part of pinelint
// Copyright (c) 2026 pinelint contributors
// License: MIT
//

//! The command line interface renders diagnostics as ariadne reports and
//! outputs colored dumps of intermediate results when run with the
//! _verbose_ flag.

use crate::analyzer::{Analysis, QuickResult};
use crate::common;
use crate::error::{ParseError, Severity, Violation};
use crate::lexer;

use serde::{Deserialize, Serialize};
use std::io::Write;
use termcolor::{Color, ColorSpec, StandardStream, WriteColor};

#[derive(Debug, Default, Deserialize, clap::Args)]
#[serde(default, deny_unknown_fields)]
pub struct Options
{
	/// Show a lot of intermediate output
	#[clap(short, long)]
	pub verbose: bool,

	/// When to use ANSI colors in reports and intermediate output
	#[clap(long, value_name("WHEN"))]
	#[clap(value_enum, default_value_t=ColorChoice::Auto)]
	pub color: ColorChoice,

	/// Which character set to use to draw the arrows in reports
	#[clap(long, value_name("CHARSET"))]
	#[clap(value_enum, default_value_t=CharSet::Unicode)]
	pub arrows: CharSet,
}

#[derive(
	Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum ColorChoice
{
	#[default]
	Auto,
	Always,
	Never,
}

impl From<ColorChoice> for termcolor::ColorChoice
{
	fn from(choice: ColorChoice) -> termcolor::ColorChoice
	{
		match choice
		{
			ColorChoice::Auto => termcolor::ColorChoice::Auto,
			ColorChoice::Always => termcolor::ColorChoice::Always,
			ColorChoice::Never => termcolor::ColorChoice::Never,
		}
	}
}

#[derive(
	Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum CharSet
{
	#[default]
	Unicode,
	Ascii,
}

impl From<CharSet> for ariadne::CharSet
{
	fn from(choice: CharSet) -> ariadne::CharSet
	{
		match choice
		{
			CharSet::Unicode => ariadne::CharSet::Unicode,
			CharSet::Ascii => ariadne::CharSet::Ascii,
		}
	}
}

pub struct StdOut
{
	stdout: StandardStream,
	is_verbose: bool,
	report_config: ariadne::Config,
}

impl StdOut
{
	pub fn new(options: &Options) -> StdOut
	{
		let stdout = StandardStream::stdout(options.color.into());
		let with_color = match options.color
		{
			ColorChoice::Auto => stdout.supports_color(),
			ColorChoice::Always => true,
			ColorChoice::Never => false,
		};
		let report_config = ariadne::Config::default()
			.with_color(with_color)
			.with_char_set(options.arrows.into());
		StdOut {
			stdout,
			is_verbose: options.verbose,
			report_config,
		}
	}

	pub fn header(
		&mut self,
		preamble: &str,
		filename: &str,
	) -> Result<(), std::io::Error>
	{
		if self.is_verbose
		{
			let colorspec_header = ColorSpec::new();
			self.stdout.set_color(&colorspec_header)?;
			writeln!(self.stdout, "{} {}...", preamble, filename)?;
		}
		Ok(())
	}

	pub fn dump_tokens(
		&mut self,
		tokens: &[lexer::LexedToken],
	) -> Result<(), std::io::Error>
	{
		if self.is_verbose
		{
			let colorspec_dump = ColorSpec::new().set_dimmed(true).to_owned();
			self.stdout.set_color(&colorspec_dump)?;
			for token in tokens
			{
				match &token.result
				{
					Result::Ok(token) => write!(self.stdout, "{:?}   ", token)?,
					Result::Err(_) => write!(self.stdout, "ERROR   ")?,
				}
			}
			writeln!(self.stdout)?;
			writeln!(self.stdout)?;
		}
		Ok(())
	}

	pub fn dump_calls(
		&mut self,
		calls: &[common::FunctionCall],
	) -> Result<(), std::io::Error>
	{
		if self.is_verbose
		{
			let colorspec_dump = ColorSpec::new().set_dimmed(true).to_owned();
			self.stdout.set_color(&colorspec_dump)?;
			for call in calls
			{
				let parameters: Vec<String> = call
					.parameters
					.iter()
					.map(|parameter| match &parameter.name
					{
						Some(name) => format!("{}=", name.name),
						None => format!("#{}", parameter.position),
					})
					.collect();
				writeln!(
					self.stdout,
					"{:>5}  {}({})",
					call.line_number,
					call.name,
					parameters.join(", ")
				)?;
			}
			writeln!(self.stdout)?;
		}
		Ok(())
	}

	pub fn dump_metrics(&mut self, analysis: &Analysis)
		-> Result<(), std::io::Error>
	{
		if self.is_verbose
		{
			let metrics = &analysis.metrics;
			let colorspec_dump = ColorSpec::new().set_dimmed(true).to_owned();
			self.stdout.set_color(&colorspec_dump)?;
			writeln!(
				self.stdout,
				"parsed in {:.3}ms, analyzed in {:.3}ms; {} calls, \
				 {} checks ({} failed)",
				metrics.parse_time_ms,
				metrics.total_time_ms,
				metrics.functions_found,
				metrics.checks_performed,
				metrics.checks_failed,
			)?;
			writeln!(self.stdout)?;
		}
		Ok(())
	}

	pub fn show_parse_errors<'a>(
		&mut self,
		errors: impl IntoIterator<Item = &'a ParseError>,
		mut source_cache: impl ariadne::Cache<String>,
	) -> Result<(), std::io::Error>
	{
		for error in errors
		{
			let report = error.build_report(self.report_config);
			report.eprint(&mut source_cache)?;
		}
		Ok(())
	}

	pub fn show_violations<'a>(
		&mut self,
		violations: impl IntoIterator<Item = &'a Violation>,
		mut source_cache: impl ariadne::Cache<String>,
	) -> Result<(), std::io::Error>
	{
		for violation in violations
		{
			let report = violation.build_report(self.report_config);
			report.eprint(&mut source_cache)?;
		}
		Ok(())
	}

	/// One line per file, colored by the most severe diagnostic.
	pub fn summary(
		&mut self,
		filename: &str,
		violations: &[Violation],
		parse_errors: &[ParseError],
	) -> Result<(), std::io::Error>
	{
		let count = |severity: Severity| {
			violations.iter().filter(|x| x.severity == severity).count()
				+ parse_errors.iter().filter(|x| x.severity == severity).count()
		};
		let errors = count(Severity::Error) + count(Severity::Critical);
		let warnings = count(Severity::Warning);
		let suggestions = count(Severity::Info);
		let colorspec = if errors > 0
		{
			ColorSpec::new()
				.set_fg(Some(Color::Red))
				.set_bold(true)
				.to_owned()
		}
		else if warnings > 0
		{
			ColorSpec::new()
				.set_fg(Some(Color::Yellow))
				.set_bold(true)
				.to_owned()
		}
		else
		{
			ColorSpec::new().set_fg(Some(Color::Green)).to_owned()
		};
		self.stdout.set_color(&colorspec)?;
		writeln!(
			self.stdout,
			"{}: {} errors, {} warnings, {} suggestions",
			filename, errors, warnings, suggestions
		)?;
		self.stdout.reset()?;
		Ok(())
	}

	pub fn json_analysis(
		&mut self,
		filename: &str,
		analysis: &Analysis,
	) -> Result<(), anyhow::Error>
	{
		self.json(&Tagged {
			file: filename,
			result: analysis,
		})
	}

	pub fn json_quick(
		&mut self,
		filename: &str,
		result: &QuickResult,
	) -> Result<(), anyhow::Error>
	{
		self.json(&Tagged {
			file: filename,
			result,
		})
	}

	/// Writes one compact document per line, so that the output for several
	/// files can be read as JSON Lines.
	fn json(&mut self, value: &impl Serialize) -> Result<(), anyhow::Error>
	{
		if self.is_verbose
		{
			self.stdout.reset()?;
		}
		serde_json::to_writer(&mut self.stdout, value)?;
		writeln!(self.stdout)?;
		Ok(())
	}

	pub fn done(&mut self) -> Result<(), std::io::Error>
	{
		if self.is_verbose
		{
			self.stdout.reset()?;
			writeln!(self.stdout, "Done.")?;
		}
		Ok(())
	}
}

#[derive(Serialize)]
struct Tagged<'a, T: Serialize>
{
	file: &'a str,
	#[serde(flatten)]
	result: &'a T,
}
