//
// Part of pinelint
// Copyright (c) 2026 pinelint contributors
// License: MIT
//

//! Static knowledge about the built-in functions and namespaces of the
//! script language.

use crate::value_type::ValueType as V;

/// The major language version that scripts are expected to target.
pub const CURRENT_VERSION: u32 = 6;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature
{
	pub name: String,
	pub parameters: Vec<ParameterDescriptor>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterDescriptor
{
	pub name: String,
	pub value_type: V,
	pub is_required: bool,
}

impl Signature
{
	pub fn required_count(&self) -> usize
	{
		self.parameters.iter().filter(|x| x.is_required).count()
	}

	pub fn total_count(&self) -> usize
	{
		self.parameters.len()
	}

	pub fn parameter(&self, name: &str) -> Option<&ParameterDescriptor>
	{
		self.parameters.iter().find(|x| x.name == name)
	}
}

const REQUIRED: bool = true;
const OPTIONAL: bool = false;

type Row = (&'static str, V, bool);

pub fn signature(function_name: &str) -> Option<Signature>
{
	let rows = signature_rows(function_name)?;
	let parameters = rows
		.iter()
		.map(|&(name, value_type, is_required)| ParameterDescriptor {
			name: name.to_string(),
			value_type,
			is_required,
		})
		.collect();
	Some(Signature {
		name: function_name.to_string(),
		parameters,
	})
}

fn signature_rows(function_name: &str) -> Option<&'static [Row]>
{
	match function_name
	{
		"ta.sma" | "ta.ema" | "ta.rma" | "ta.wma" | "ta.vwma" | "ta.rsi"
		| "ta.cci" | "ta.mom" | "ta.roc" | "ta.linreg_source" => Some(&[
			("source", V::SeriesIntOrFloat, REQUIRED),
			("length", V::SeriesInt, REQUIRED),
		]),
		"ta.stdev" | "ta.dev" | "ta.variance" => Some(&[
			("source", V::SeriesIntOrFloat, REQUIRED),
			("length", V::SeriesInt, REQUIRED),
			("biased", V::Bool, OPTIONAL),
		]),
		"ta.highest" | "ta.lowest" => Some(&[
			("source", V::SeriesIntOrFloat, REQUIRED),
			("length", V::SeriesInt, OPTIONAL),
		]),
		"ta.crossover" | "ta.crossunder" | "ta.cross" => Some(&[
			("source1", V::SeriesIntOrFloat, REQUIRED),
			("source2", V::SeriesIntOrFloat, REQUIRED),
		]),
		"ta.change" => Some(&[
			("source", V::SeriesIntOrFloat, REQUIRED),
			("length", V::SeriesInt, OPTIONAL),
		]),
		"ta.atr" => Some(&[("length", V::SeriesInt, REQUIRED)]),
		"ta.macd" => Some(&[
			("source", V::SeriesIntOrFloat, REQUIRED),
			("fastlen", V::SeriesInt, REQUIRED),
			("slowlen", V::SeriesInt, REQUIRED),
			("siglen", V::SeriesInt, REQUIRED),
		]),
		"ta.bb" | "ta.kc" => Some(&[
			("series", V::SeriesIntOrFloat, REQUIRED),
			("length", V::SeriesInt, REQUIRED),
			("mult", V::SeriesIntOrFloat, REQUIRED),
		]),
		"math.abs" | "math.sqrt" | "math.log" | "math.exp" | "math.floor"
		| "math.ceil" | "math.sign" => Some(&[
			("number", V::SeriesIntOrFloat, REQUIRED),
		]),
		"math.round" => Some(&[
			("number", V::SeriesIntOrFloat, REQUIRED),
			("precision", V::SeriesInt, OPTIONAL),
		]),
		"math.pow" => Some(&[
			("base", V::SeriesIntOrFloat, REQUIRED),
			("exponent", V::SeriesIntOrFloat, REQUIRED),
		]),
		"str.length" | "str.upper" | "str.lower" => Some(&[
			("source", V::String, REQUIRED),
		]),
		"color.new" => Some(&[
			("color", V::Color, REQUIRED),
			("transp", V::SeriesIntOrFloat, REQUIRED),
		]),
		"color.rgb" => Some(&[
			("red", V::SeriesIntOrFloat, REQUIRED),
			("green", V::SeriesIntOrFloat, REQUIRED),
			("blue", V::SeriesIntOrFloat, REQUIRED),
			("transp", V::SeriesIntOrFloat, OPTIONAL),
		]),
		"input.int" => Some(&[
			("defval", V::Int, REQUIRED),
			("title", V::String, OPTIONAL),
			("minval", V::Int, OPTIONAL),
			("maxval", V::Int, OPTIONAL),
			("step", V::Int, OPTIONAL),
			("tooltip", V::String, OPTIONAL),
			("inline", V::String, OPTIONAL),
			("group", V::String, OPTIONAL),
			("confirm", V::Bool, OPTIONAL),
			("display", V::Identifier, OPTIONAL),
		]),
		"input.float" => Some(&[
			("defval", V::IntOrFloat, REQUIRED),
			("title", V::String, OPTIONAL),
			("minval", V::IntOrFloat, OPTIONAL),
			("maxval", V::IntOrFloat, OPTIONAL),
			("step", V::IntOrFloat, OPTIONAL),
			("tooltip", V::String, OPTIONAL),
			("inline", V::String, OPTIONAL),
			("group", V::String, OPTIONAL),
			("confirm", V::Bool, OPTIONAL),
			("display", V::Identifier, OPTIONAL),
		]),
		"input.bool" => Some(&[
			("defval", V::Bool, REQUIRED),
			("title", V::String, OPTIONAL),
			("tooltip", V::String, OPTIONAL),
			("inline", V::String, OPTIONAL),
			("group", V::String, OPTIONAL),
			("confirm", V::Bool, OPTIONAL),
			("display", V::Identifier, OPTIONAL),
		]),
		"input.string" => Some(&[
			("defval", V::String, REQUIRED),
			("title", V::String, OPTIONAL),
			("options", V::Identifier, OPTIONAL),
			("tooltip", V::String, OPTIONAL),
			("inline", V::String, OPTIONAL),
			("group", V::String, OPTIONAL),
			("confirm", V::Bool, OPTIONAL),
			("display", V::Identifier, OPTIONAL),
		]),
		"indicator" => Some(&[
			("title", V::String, REQUIRED),
			("shorttitle", V::String, OPTIONAL),
			("overlay", V::Bool, OPTIONAL),
			("format", V::Identifier, OPTIONAL),
			("precision", V::Int, OPTIONAL),
			("scale", V::Identifier, OPTIONAL),
			("max_bars_back", V::Int, OPTIONAL),
			("timeframe", V::String, OPTIONAL),
			("timeframe_gaps", V::Bool, OPTIONAL),
			("explicit_plot_zorder", V::Bool, OPTIONAL),
			("max_lines_count", V::Int, OPTIONAL),
			("max_labels_count", V::Int, OPTIONAL),
			("max_boxes_count", V::Int, OPTIONAL),
			("calc_bars_count", V::Int, OPTIONAL),
			("max_polylines_count", V::Int, OPTIONAL),
			("dynamic_requests", V::Bool, OPTIONAL),
			("behind_chart", V::Bool, OPTIONAL),
		]),
		"strategy" => Some(&[
			("title", V::String, REQUIRED),
			("shorttitle", V::String, OPTIONAL),
			("overlay", V::Bool, OPTIONAL),
			("format", V::Identifier, OPTIONAL),
			("precision", V::Int, OPTIONAL),
			("scale", V::Identifier, OPTIONAL),
			("pyramiding", V::Int, OPTIONAL),
			("calc_on_order_fills", V::Bool, OPTIONAL),
			("calc_on_every_tick", V::Bool, OPTIONAL),
			("max_bars_back", V::Int, OPTIONAL),
			("backtest_fill_limits_assumption", V::Int, OPTIONAL),
			("default_qty_type", V::Identifier, OPTIONAL),
			("default_qty_value", V::IntOrFloat, OPTIONAL),
			("initial_capital", V::IntOrFloat, OPTIONAL),
			("currency", V::Identifier, OPTIONAL),
			("slippage", V::Int, OPTIONAL),
			("commission_type", V::Identifier, OPTIONAL),
			("commission_value", V::IntOrFloat, OPTIONAL),
			("process_orders_on_close", V::Bool, OPTIONAL),
			("close_entries_rule", V::String, OPTIONAL),
			("margin_long", V::IntOrFloat, OPTIONAL),
			("margin_short", V::IntOrFloat, OPTIONAL),
			("explicit_plot_zorder", V::Bool, OPTIONAL),
			("max_lines_count", V::Int, OPTIONAL),
			("max_labels_count", V::Int, OPTIONAL),
			("max_boxes_count", V::Int, OPTIONAL),
			("calc_bars_count", V::Int, OPTIONAL),
			("risk_free_rate", V::IntOrFloat, OPTIONAL),
			("use_bar_magnifier", V::Bool, OPTIONAL),
			("fill_orders_on_standard_ohlc", V::Bool, OPTIONAL),
			("max_polylines_count", V::Int, OPTIONAL),
		]),
		"plot" => Some(&[
			("series", V::SeriesIntOrFloat, REQUIRED),
			("title", V::String, OPTIONAL),
			("color", V::Color, OPTIONAL),
			("linewidth", V::Int, OPTIONAL),
			("style", V::Identifier, OPTIONAL),
			("trackprice", V::Bool, OPTIONAL),
			("histbase", V::IntOrFloat, OPTIONAL),
			("offset", V::Int, OPTIONAL),
			("join", V::Bool, OPTIONAL),
			("editable", V::Bool, OPTIONAL),
			("show_last", V::Int, OPTIONAL),
			("display", V::Identifier, OPTIONAL),
			("format", V::Identifier, OPTIONAL),
			("precision", V::Int, OPTIONAL),
			("force_overlay", V::Bool, OPTIONAL),
		]),
		"hline" => Some(&[
			("price", V::IntOrFloat, REQUIRED),
			("title", V::String, OPTIONAL),
			("color", V::Color, OPTIONAL),
			("linestyle", V::Identifier, OPTIONAL),
			("linewidth", V::Int, OPTIONAL),
			("editable", V::Bool, OPTIONAL),
			("display", V::Identifier, OPTIONAL),
		]),
		"bgcolor" => Some(&[
			("color", V::Color, REQUIRED),
			("offset", V::Int, OPTIONAL),
			("editable", V::Bool, OPTIONAL),
			("show_last", V::Int, OPTIONAL),
			("title", V::String, OPTIONAL),
			("display", V::Identifier, OPTIONAL),
			("force_overlay", V::Bool, OPTIONAL),
		]),
		"table.cell" => Some(&[
			("table_id", V::Identifier, REQUIRED),
			("column", V::SeriesInt, REQUIRED),
			("row", V::SeriesInt, REQUIRED),
			("text", V::String, OPTIONAL),
			("width", V::SeriesIntOrFloat, OPTIONAL),
			("height", V::SeriesIntOrFloat, OPTIONAL),
			("text_color", V::Color, OPTIONAL),
			("text_halign", V::Identifier, OPTIONAL),
			("text_valign", V::Identifier, OPTIONAL),
			("text_size", V::Identifier, OPTIONAL),
			("bgcolor", V::Color, OPTIONAL),
			("tooltip", V::String, OPTIONAL),
			("text_font_family", V::Identifier, OPTIONAL),
			("text_formatting", V::Identifier, OPTIONAL),
		]),
		_ => None,
	}
}

/// Parameter names of built-in functions that have no entry in the
/// signature table, because their arguments are too polymorphic to type.
fn extra_parameter_names(function_name: &str) -> &'static [&'static str]
{
	match function_name
	{
		"table.new" => &[
			"position",
			"columns",
			"rows",
			"bgcolor",
			"frame_color",
			"frame_width",
			"border_color",
			"border_width",
			"force_overlay",
		],
		"label.new" => &[
			"x",
			"y",
			"text",
			"xloc",
			"yloc",
			"color",
			"style",
			"textcolor",
			"size",
			"textalign",
			"tooltip",
			"text_font_family",
			"force_overlay",
			"text_formatting",
		],
		"line.new" => &[
			"x1",
			"y1",
			"x2",
			"y2",
			"xloc",
			"extend",
			"color",
			"style",
			"width",
			"force_overlay",
		],
		"box.new" => &[
			"left",
			"top",
			"right",
			"bottom",
			"border_color",
			"border_width",
			"border_style",
			"extend",
			"xloc",
			"bgcolor",
			"text",
			"text_size",
			"text_color",
			"text_halign",
			"text_valign",
			"text_wrap",
			"text_font_family",
			"force_overlay",
			"text_formatting",
		],
		"strategy.entry" | "strategy.order" => &[
			"id",
			"direction",
			"qty",
			"limit",
			"stop",
			"oco_name",
			"oco_type",
			"comment",
			"alert_message",
			"disable_alert",
		],
		"strategy.exit" => &[
			"id",
			"from_entry",
			"qty",
			"qty_percent",
			"profit",
			"limit",
			"loss",
			"stop",
			"trail_price",
			"trail_points",
			"trail_offset",
			"oco_name",
			"comment",
			"comment_profit",
			"comment_loss",
			"comment_trailing",
			"alert_message",
			"alert_profit",
			"alert_loss",
			"alert_trailing",
			"disable_alert",
		],
		"strategy.close" => &[
			"id",
			"comment",
			"qty",
			"qty_percent",
			"alert_message",
			"immediately",
			"disable_alert",
		],
		"request.security" => &[
			"symbol",
			"timeframe",
			"expression",
			"gaps",
			"lookahead",
			"ignore_invalid_symbol",
			"currency",
			"calc_bars_count",
		],
		"plotshape" => &[
			"series",
			"title",
			"style",
			"location",
			"color",
			"offset",
			"text",
			"textcolor",
			"editable",
			"size",
			"show_last",
			"display",
			"format",
			"precision",
			"force_overlay",
		],
		"fill" => &[
			"plot1",
			"plot2",
			"hline1",
			"hline2",
			"color",
			"title",
			"editable",
			"show_last",
			"fillgaps",
			"display",
			"top_value",
			"bottom_value",
			"top_color",
			"bottom_color",
		],
		"alertcondition" => &["condition", "title", "message"],
		_ => &[],
	}
}

/// Whether `parameter_name` is a known parameter of the built-in function.
pub fn is_function_parameter(function_name: &str, parameter_name: &str)
	-> bool
{
	let in_signature = signature_rows(function_name)
		.map_or(false, |rows| rows.iter().any(|row| row.0 == parameter_name));
	in_signature
		|| extra_parameter_names(function_name)
			.iter()
			.any(|&name| name == parameter_name)
}

pub fn is_builtin_function(function_name: &str) -> bool
{
	signature_rows(function_name).is_some()
		|| !extra_parameter_names(function_name).is_empty()
}

/// Built-in parameter names that are valid regardless of the function.
pub fn is_common_parameter_name(name: &str) -> bool
{
	match name
	{
		"title" | "shorttitle" | "overlay" | "format" | "precision"
		| "scale" | "max_bars_back" | "max_lines_count"
		| "max_labels_count" | "max_boxes_count" | "max_polylines_count"
		| "timeframe" | "timeframe_gaps" | "explicit_plot_zorder"
		| "calc_bars_count" | "dynamic_requests" | "behind_chart"
		| "pyramiding" | "calc_on_order_fills" | "calc_on_every_tick"
		| "default_qty_type" | "default_qty_value" | "initial_capital"
		| "currency" | "slippage" | "commission_type" | "commission_value"
		| "process_orders_on_close" | "close_entries_rule"
		| "margin_long" | "margin_short" | "risk_free_rate"
		| "use_bar_magnifier" | "source" | "length" | "series" | "color"
		| "linewidth" | "style" | "trackprice" | "histbase" | "offset"
		| "join" | "editable" | "show_last" | "display" | "defval"
		| "minval" | "maxval" | "step" | "tooltip" | "inline" | "group"
		| "confirm" | "options" | "id" | "direction" | "qty" | "limit"
		| "stop" | "comment" | "alert_message" | "when" | "text"
		| "text_color" | "text_size" | "text_halign" | "text_valign"
		| "textcolor" | "textalign" | "bgcolor" | "border_color"
		| "border_width" | "border_style" | "frame_color" | "frame_width"
		| "xloc" | "yloc" | "extend" | "size" | "location" | "position"
		| "width" | "height" | "force_overlay" | "transp" | "gaps"
		| "lookahead" | "symbol" | "expression" | "mult" => true,
		_ => false,
	}
}

/// The replacement for a parameter name that the function used to accept.
pub fn deprecated_parameter(
	function_name: &str,
	parameter_name: &str,
) -> Option<&'static str>
{
	match (function_name, parameter_name)
	{
		("table.cell", "textColor") => Some("text_color"),
		("table.cell", "textHalign") => Some("text_halign"),
		("table.cell", "textValign") => Some("text_valign"),
		("table.cell", "textSize") => Some("text_size"),
		("table.cell", "bgColor") => Some("bgcolor"),
		("table.new", "bgColor") => Some("bgcolor"),
		("table.new", "frameColor") => Some("frame_color"),
		("table.new", "frameWidth") => Some("frame_width"),
		("table.new", "borderColor") => Some("border_color"),
		("table.new", "borderWidth") => Some("border_width"),
		("box.new", "borderColor") => Some("border_color"),
		("box.new", "borderWidth") => Some("border_width"),
		("box.new", "borderStyle") => Some("border_style"),
		("box.new", "bgColor") => Some("bgcolor"),
		("box.new", "textColor") => Some("text_color"),
		("box.new", "textSize") => Some("text_size"),
		("label.new", "textColor") => Some("textcolor"),
		("label.new", "textAlign") => Some("textalign"),
		("plot", "lineWidth") => Some("linewidth"),
		("plot", "trackPrice") => Some("trackprice"),
		("plot", "showLast") => Some("show_last"),
		("indicator", "shortTitle") => Some("shorttitle"),
		("indicator", "maxBarsBack") => Some("max_bars_back"),
		("strategy", "shortTitle") => Some("shorttitle"),
		("strategy", "initialCapital") => Some("initial_capital"),
		_ => None,
	}
}

/// Functions that were renamed, with their current name.
pub fn deprecated_function(function_name: &str) -> Option<&'static str>
{
	match function_name
	{
		"study" => Some("indicator"),
		"security" => Some("request.security"),
		"tostring" => Some("str.tostring"),
		"tonumber" => Some("str.tonumber"),
		"iff" => Some("the ternary operator `?:`"),
		_ => None,
	}
}

/// Functions that now live in a namespace, with their namespaced name.
pub fn namespaced_function(function_name: &str) -> Option<String>
{
	let namespace = match function_name
	{
		"sma" | "ema" | "rma" | "wma" | "vwma" | "rsi" | "atr" | "stdev"
		| "highest" | "lowest" | "crossover" | "crossunder" | "cross"
		| "change" | "macd" | "cci" | "mom" | "roc" | "bb" | "stoch"
		| "sar" | "supertrend" | "pivothigh" | "pivotlow" | "valuewhen"
		| "barssince" | "cum" | "correlation" | "dmi" | "vwap" | "tr" => "ta",
		"abs" | "max" | "min" | "round" | "sqrt" | "pow" | "log" | "exp"
		| "floor" | "ceil" | "avg" | "sum" | "sign" => "math",
		_ => return None,
	};
	Some(format!("{}.{}", namespace, function_name))
}

/// Identifiers that are time series of prices or volume.
pub fn is_series_identifier(name: &str) -> bool
{
	match name
	{
		"open" | "high" | "low" | "close" | "volume" | "hl2" | "hlc3"
		| "ohlc4" | "hlcc4" => true,
		_ => false,
	}
}

pub fn is_reserved_namespace(name: &str) -> bool
{
	match name
	{
		"ta" | "math" | "str" | "array" | "matrix" | "map" | "color"
		| "line" | "label" | "box" | "table" | "linefill" | "polyline"
		| "request" | "strategy" | "input" | "syminfo" | "timeframe"
		| "barstate" | "session" | "chart" | "runtime" | "log"
		| "ticker" | "dividends" | "earnings" | "splits" | "currency"
		| "display" | "shape" | "location" | "size" | "position"
		| "plot" | "hline" | "extend" | "xloc" | "yloc" | "format"
		| "scale" | "alert" | "order" | "font" | "text" => true,
		_ => false,
	}
}

pub fn is_keyword(name: &str) -> bool
{
	match name
	{
		"if" | "else" | "for" | "to" | "by" | "in" | "while" | "switch"
		| "var" | "varip" | "import" | "export" | "as" | "type" | "enum"
		| "method" | "and" | "or" | "not" | "continue" | "break" => true,
		_ => false,
	}
}

#[cfg(test)]
mod tests
{
	use super::*;

	#[test]
	fn signature_counts()
	{
		let sma = signature("ta.sma").unwrap();
		assert_eq!(sma.required_count(), 2);
		assert_eq!(sma.total_count(), 2);
		let stdev = signature("ta.stdev").unwrap();
		assert_eq!(stdev.required_count(), 2);
		assert_eq!(stdev.total_count(), 3);
		assert!(signature("my.function").is_none());
	}

	#[test]
	fn namespaced_names()
	{
		assert_eq!(namespaced_function("sma").as_deref(), Some("ta.sma"));
		assert_eq!(namespaced_function("abs").as_deref(), Some("math.abs"));
		assert_eq!(namespaced_function("plot"), None);
	}

	#[test]
	fn function_parameters_include_signature_and_extras()
	{
		assert!(is_function_parameter("table.cell", "text_color"));
		assert!(is_function_parameter("strategy.exit", "qty_percent"));
		assert!(!is_function_parameter("strategy.entry", "qty_percent"));
		assert!(!is_function_parameter("strategy.entry", "qtyPercent"));
	}
}
