//! Rendering

// Imports
use {
	anyhow::Context,
	gnuplot::{AutoOption, AxesCommon, Caption, Color, DashType, FillAlpha, Figure, LineStyle, PointSymbol, Tick},
	palette::{FromColor, Hsv, Srgb},
	ssresults::slice::{Bars, Series},
	std::{fs, path::Path},
};

/// Chart labels
#[derive(Clone, Copy, Debug)]
pub struct Labels<'a> {
	pub title: &'a str,
	pub x:     &'a str,
	pub y:     &'a str,
}

/// Renderer
#[derive(Clone, Debug)]
pub struct Renderer {
	/// Image width
	width: u32,

	/// Image height
	height: u32,

	/// Canonical mode order, for colors
	mode_order: Vec<String>,
}

impl Renderer {
	/// Creates a renderer
	pub fn new(width: u32, height: u32, mode_order: Vec<String>) -> Self {
		Self {
			width,
			height,
			mode_order,
		}
	}

	/// Color of a mode.
	///
	/// Depends only on the mode's position in the canonical order, so
	/// each mode has the same color in every chart.
	fn color(&self, mode: &str) -> String {
		let mode_idx = self
			.mode_order
			.iter()
			.position(|other| other == mode)
			.unwrap_or(self.mode_order.len());
		let hue = 360.0 * mode_idx as f32 / (self.mode_order.len() + 1) as f32;

		let hsv: Hsv = Hsv::new(hue, 0.75, 0.85);
		let rgb = Srgb::from_color(hsv).into_format::<u8>();
		format!("#{:02x}{:02x}{:02x}", rgb.red, rgb.green, rgb.blue)
	}

	/// Renders a line chart to `path`.
	///
	/// Returns `false`, without creating the file, if there are no lines.
	pub fn lines(&self, path: &Path, labels: Labels, series: &[Series]) -> Result<bool, anyhow::Error> {
		if series.is_empty() {
			tracing::trace!(?path, "Skipping empty line chart");
			return Ok(false);
		}

		let mut fg = Figure::new();
		let axes = fg.axes2d();
		self::set_labels(axes, labels);
		for series in series {
			let color = self.color(&series.mode);
			let xs = series.points.iter().map(|&(x, _)| x as f64);
			let ys = series.points.iter().map(|&(_, y)| y);
			axes.lines_points(xs, ys, &[Caption(series.mode.as_str()), Color(color.as_str()), PointSymbol('O')]);
		}

		self.save(&mut fg, path)?;
		Ok(true)
	}

	/// Renders a grouped bar chart to `path`.
	///
	/// Returns `false`, without creating the file, if there are no bars.
	/// Missing values are left as gaps.
	pub fn bars(&self, path: &Path, labels: Labels, bars: &Bars) -> Result<bool, anyhow::Error> {
		if bars.is_empty() {
			tracing::trace!(?path, "Skipping empty bar chart");
			return Ok(false);
		}

		let mut fg = Figure::new();
		let axes = fg.axes2d();
		self::set_labels(axes, labels);

		let bar_width = 0.8 / bars.series.len() as f64;
		let group_offset = |series_idx: usize| (series_idx as f64 + 0.5) * bar_width - 0.4;
		for (series_idx, series) in bars.series.iter().enumerate() {
			let color = self.color(&series.mode);
			let xs = (0..bars.benchmarks.len()).map(|bench_idx| bench_idx as f64 + group_offset(series_idx));
			let ys = series.values.iter().map(|value| value.unwrap_or(f64::NAN));
			let widths = std::iter::repeat(bar_width).take(bars.benchmarks.len());
			axes.boxes_set_width(xs, ys, widths, &[
				Caption(series.mode.as_str()),
				Color(color.as_str()),
				FillAlpha(1.0),
			]);
		}

		let ticks = bars
			.benchmarks
			.iter()
			.enumerate()
			.map(|(bench_idx, benchmark)| Tick::Major(bench_idx as f64, AutoOption::Fix(benchmark.clone())));
		axes.set_x_ticks_custom(ticks, &[], &[]).set_x_range(
			AutoOption::Fix(-0.5),
			AutoOption::Fix(bars.benchmarks.len() as f64 - 0.5),
		);

		self.save(&mut fg, path)?;
		Ok(true)
	}

	/// Saves a figure as png, creating the parent directories
	fn save(&self, fg: &mut Figure, path: &Path) -> Result<(), anyhow::Error> {
		if let Some(parent) = path.parent() {
			fs::create_dir_all(parent).with_context(|| format!("Unable to create directory {parent:?}"))?;
		}

		fg.save_to_png(path, self.width, self.height)
			.map_err(|err| anyhow::anyhow!("Unable to save output file {path:?}: {err:?}"))?;
		fg.close();

		tracing::debug!(?path, "Wrote chart");
		Ok(())
	}
}

/// Sets the title, axis labels and grid
fn set_labels(axes: &mut gnuplot::Axes2D, labels: Labels) {
	axes.set_title(labels.title, &[])
		.set_x_label(labels.x, &[])
		.set_y_label(labels.y, &[])
		.set_grid_options(false, &[LineStyle(DashType::Dash)])
		.set_x_grid(true)
		.set_y_grid(true);
}
