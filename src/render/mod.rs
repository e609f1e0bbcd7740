//! Chart Renderer
//!
//! Paints every profile into one plotters chart held in memory and writes it
//! once.
//!
//! The plot uses unit coordinates on both axes. Horizontal position comes
//! from the (class, spec) layout slot, vertical position from the score
//! relative to `max_score`. Paint order is fixed: background and grid, then
//! per profile the score bar, the spec icon and the progression badge, then
//! the axis, class icon row and legend.
//!
//! The image is encoded into a temporary file next to the target and
//! renamed into place, so a failed run never leaves a partial chart behind.

pub mod assets;
pub mod backend;

pub use assets::{snakify, AssetStore};
pub use backend::FontSafeBackend;

use image::imageops::FilterType;
use image::{DynamicImage, ImageOutputFormat, RgbImage};
use plotters::chart::{ChartBuilder, ChartContext, LabelAreaPosition, SeriesLabelPosition};
use plotters::coord::cartesian::Cartesian2d;
use plotters::coord::types::RangedCoordf64;
use plotters::coord::Shift;
use plotters::drawing::{DrawingArea, IntoDrawingArea};
use plotters::element::{BitMapElement, Rectangle, Text};
use plotters::prelude::BitMapBackend;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use plotters::style::{
    Color as _, FontDesc, FontFamily, FontStyle, FontTransform, RGBColor, BLACK, TRANSPARENT,
    WHITE,
};
use plotters_backend::DrawingBackend;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::info;

use crate::classes::{ClassSpecRegistry, LayoutIndex, LayoutTable};
use crate::error::{ComparisonError, Result};
use crate::model::{Color, ColorBuckets, Profile};
use crate::settings::{OutputFormat, Settings};

const MARGIN_LEFT: u32 = 110;
const MARGIN_TOP: u32 = 30;
const MARGIN_RIGHT: u32 = 30;
const CLASS_ICON_GAP: i32 = 10;
const NUM_Y_TICKS: usize = 6;
const BACKGROUND_FADE: f64 = 0.5;

const COMPACT_LABEL_SIZE: f64 = 10.0;
const LABEL_SIZE: f64 = 16.0;
const AXIS_FONT_SIZE: f64 = 16.0;

const AXIS_COLOR: Color = Color([0xDD, 0xDD, 0xDD]);
const LEGEND_FILL: Color = Color([0x20, 0x20, 0x20]);

type Chart<'a, DB> = ChartContext<'a, DB, Cartesian2d<RangedCoordf64, RangedCoordf64>>;

/// Where the finished chart goes
#[derive(Debug, Clone, PartialEq)]
pub struct OutputTarget {
    pub dir: PathBuf,
    pub basename: String,
    pub format: OutputFormat,
}

impl OutputTarget {
    pub fn new(dir: impl Into<PathBuf>, basename: impl Into<String>, format: OutputFormat) -> Self {
        Self {
            dir: dir.into(),
            basename: basename.into(),
            format,
        }
    }

    pub fn path(&self) -> PathBuf {
        self.dir
            .join(format!("{}.{}", self.basename, self.format.extension()))
    }
}

/// Horizontal slot in `[0, 1)`, independent of score
pub fn x_coord(index: &LayoutIndex) -> f64 {
    index.relative_x()
}

/// Vertical position in `[0, 1]`; scores at or above `max_score` saturate
pub fn y_coord(score: f64, max_score: f64) -> f64 {
    (score / max_score).clamp(0.0, 1.0)
}

/// Legend entries: one swatch per colour bucket, labelled with the kill
/// counts that land in it. Buckets no kill count can reach are left out.
pub fn legend_entries(buckets: &ColorBuckets, boss_count: u32) -> Vec<(Color, String)> {
    buckets
        .iter()
        .filter_map(|bucket| {
            let mut kills =
                (0..=boss_count).filter(|&k| bucket.contains(k as f64 / boss_count as f64));
            let first = kills.next()?;
            let label = match kills.last() {
                Some(last) => format!("{}-{}/{}M", first, last, boss_count),
                None => format!("{}/{}M", first, boss_count),
            };
            Some((bucket.color, label))
        })
        .collect()
}

/// Centre of each class's spec slots, as a fraction of the plot width
pub fn class_centres(registry: &ClassSpecRegistry, layout: &LayoutTable) -> Vec<(String, f64)> {
    registry
        .entries()
        .iter()
        .filter_map(|entry| {
            let first = layout.get(&entry.class_name, entry.specs.first()?)?;
            let last = layout.get(&entry.class_name, entry.specs.last()?)?;
            let middle = (first.global_position + last.global_position) as f64 / 2.0;
            Some((entry.class_name.clone(), middle / first.global_count as f64))
        })
        .collect()
}

/// Make a font file the sans-serif face for chart text
pub fn register_font(path: &Path) -> Result<()> {
    // plotters keeps registered faces for the life of the process
    let bytes: &'static [u8] = Box::leak(std::fs::read(path)?.into_boxed_slice());
    plotters::style::register_font("sans-serif", FontStyle::Normal, bytes).map_err(|_| {
        ComparisonError::InvalidConfig(format!("unusable font {}: invalid font data", path.display()))
    })
}

/// Everything needed to paint one profile, in unit plot coordinates (y up)
#[derive(Debug, Clone, PartialEq)]
pub struct Placement {
    pub class_name: String,
    pub spec_name: String,
    pub x: f64,
    pub y: f64,
    /// Bottom of the icon, kept low enough for the badge to fit
    pub icon_y: f64,
    pub bar_color: Color,
    pub badge_color: Color,
    pub label: String,
    pub compact_label: bool,
}

pub struct Plotter {
    settings: Settings,
    assets: AssetStore,
}

impl Plotter {
    pub fn new(settings: Settings, assets: AssetStore) -> Self {
        Self { settings, assets }
    }

    /// Register the configured font and preload assets from the icon directory
    pub fn from_settings(settings: Settings, background_tag: &str) -> Result<Self> {
        if let Some(font) = &settings.font_path {
            register_font(font)?;
            info!("Registered chart font {}", font.display());
        }
        let assets = AssetStore::preload(&settings.icon_dir, &settings.classes, background_tag)?;
        info!("Preloaded {} icons from {}", assets.len(), settings.icon_dir.display());
        Ok(Self::new(settings, assets))
    }

    /// Spec icon edge as a fraction of the plot
    fn icon_fraction(&self) -> f64 {
        self.settings.icon_size as f64 / self.settings.image_size as f64
    }

    fn pixel_fraction(&self) -> f64 {
        1.0 / self.settings.image_size as f64
    }

    fn class_icon_edge(&self) -> u32 {
        self.settings.icon_size * 2
    }

    fn margin_bottom(&self) -> u32 {
        self.class_icon_edge() + 3 * CLASS_ICON_GAP as u32
    }

    fn canvas_size(&self) -> (u32, u32) {
        let size = self.settings.image_size;
        (
            MARGIN_LEFT + size + MARGIN_RIGHT,
            MARGIN_TOP + size + self.margin_bottom(),
        )
    }

    /// Resolve coordinates and colours for one profile
    pub fn place(&self, profile: &Profile, layout: &LayoutTable) -> Result<Placement> {
        let index = layout
            .get(&profile.class_name, &profile.spec_name)
            .ok_or_else(|| {
                ComparisonError::InvalidRoster(format!(
                    "no layout slot for {}/{}",
                    profile.class_name, profile.spec_name
                ))
            })?;

        let raid = &self.settings.current_raid;
        let progression = profile.progression.get(raid).ok_or_else(|| {
            ComparisonError::MissingField {
                field: format!("progression.{} for {}", raid, profile.character_name),
            }
        })?;

        let y = y_coord(profile.score, self.settings.max_score);
        Ok(Placement {
            class_name: profile.class_name.clone(),
            spec_name: profile.spec_name.clone(),
            x: x_coord(index),
            y,
            icon_y: y.min(1.0 - self.icon_fraction() * 1.2),
            bar_color: self.settings.class_color(&profile.class_name)?,
            badge_color: self
                .settings
                .progression_colors
                .color_for_fraction(progression.fraction())?,
            label: profile.player_label(),
            compact_label: profile.score < self.settings.label_threshold,
        })
    }

    /// Paint `profiles` and write the chart to `target`, returning its path
    pub fn plot_profiles(
        &self,
        profiles: &[Profile],
        layout: &LayoutTable,
        target: &OutputTarget,
    ) -> Result<PathBuf> {
        info!("Plotting scores for {} characters", profiles.len());

        // Resolve everything first so a bad profile fails before any painting.
        let placements = profiles
            .iter()
            .map(|p| self.place(p, layout))
            .collect::<Result<Vec<_>>>()?;

        let chart = self.render(&placements, layout)?;
        let path = write_atomically(chart, target)?;
        info!("Saved file to {}", path.display());
        Ok(path)
    }

    /// Paint into a memory buffer without touching the filesystem
    pub fn render(&self, placements: &[Placement], layout: &LayoutTable) -> Result<RgbImage> {
        let (width, height) = self.canvas_size();
        let mut buffer = vec![0u8; width as usize * height as usize * 3];
        {
            let backend = BitMapBackend::with_buffer(&mut buffer, (width, height));
            let root = FontSafeBackend::new(backend).into_drawing_area();
            self.draw_chart(&root, placements, layout)?;
            root.present()?;
        }
        RgbImage::from_raw(width, height, buffer)
            .ok_or_else(|| ComparisonError::Draw("chart buffer does not match its size".into()))
    }

    fn draw_chart<DB: DrawingBackend>(
        &self,
        root: &DrawingArea<DB, Shift>,
        placements: &[Placement],
        layout: &LayoutTable,
    ) -> Result<()> {
        root.fill(&BLACK)?;
        let mut chart = ChartBuilder::on(root)
            .margin_top(MARGIN_TOP)
            .margin_right(MARGIN_RIGHT)
            .set_label_area_size(LabelAreaPosition::Left, MARGIN_LEFT)
            .set_label_area_size(LabelAreaPosition::Bottom, self.margin_bottom())
            .build_cartesian_2d(0.0..1.0, 0.0..1.0)?;

        self.draw_background(&mut chart)?;
        for placement in placements {
            self.draw_bar(&chart, placement)?;
            self.draw_icon(&chart, placement)?;
            self.draw_badge(&chart, placement)?;
        }
        self.draw_axis(&mut chart)?;
        self.draw_class_icons(root, &chart, layout)?;
        self.draw_legend(&mut chart)
    }

    fn draw_background<DB: DrawingBackend>(&self, chart: &mut Chart<'_, DB>) -> Result<()> {
        let size = self.settings.image_size;
        let background = self
            .assets
            .background()
            .resize_exact(size, size, FilterType::Triangle)
            .to_rgb8();
        let area = chart.plotting_area();
        area.draw(&bitmap((0.0, 1.0), background)?)?;
        area.draw(&Rectangle::new(
            [(0.0, 0.0), (1.0, 1.0)],
            BLACK.mix(BACKGROUND_FADE).filled(),
        ))?;

        // Grid only; the axis and its labels go on top of the bars later
        chart
            .configure_mesh()
            .disable_x_mesh()
            .disable_x_axis()
            .disable_y_axis()
            .y_labels(NUM_Y_TICKS)
            .light_line_style(&TRANSPARENT)
            .bold_line_style(WHITE.mix(0.6).stroke_width(2))
            .axis_style(&TRANSPARENT)
            .label_style(font(AXIS_FONT_SIZE).color(&TRANSPARENT))
            .draw()?;
        Ok(())
    }

    fn draw_bar<DB: DrawingBackend>(&self, chart: &Chart<'_, DB>, placement: &Placement) -> Result<()> {
        let area = chart.plotting_area();
        let icon = self.icon_fraction();
        area.draw(&Rectangle::new(
            [
                (placement.x + icon / 4.0, 0.0),
                (placement.x + icon * 3.0 / 4.0, placement.y),
            ],
            RGBColor::from(placement.bar_color).filled(),
        ))?;

        let (text_color, outline_color) = placement.bar_color.contrasting_text();
        let (size, text_y) = if placement.compact_label {
            (COMPACT_LABEL_SIZE, self.pixel_fraction())
        } else {
            (LABEL_SIZE, placement.y / 4.0)
        };
        let face = font(size).transform(FontTransform::Rotate270);
        let anchor = Pos::new(HPos::Left, VPos::Center);
        let centre = placement.x + icon / 2.0;

        let outline = face.color(&RGBColor::from(outline_color)).pos(anchor);
        let px = self.pixel_fraction();
        for (dx, dy) in [(-px, 0.0), (px, 0.0), (0.0, -px), (0.0, px)] {
            area.draw(&Text::new(
                placement.label.as_str(),
                (centre + dx, text_y + dy),
                outline.clone(),
            ))?;
        }
        area.draw(&Text::new(
            placement.label.as_str(),
            (centre, text_y),
            face.color(&RGBColor::from(text_color)).pos(anchor),
        ))?;
        Ok(())
    }

    fn draw_icon<DB: DrawingBackend>(&self, chart: &Chart<'_, DB>, placement: &Placement) -> Result<()> {
        let edge = self.settings.icon_size;
        let icon = self
            .assets
            .spec_icon(&placement.class_name, &placement.spec_name)?
            .resize_exact(edge, edge, FilterType::Triangle)
            .to_rgb8();
        chart.plotting_area().draw(&bitmap(
            (placement.x, placement.icon_y + self.icon_fraction()),
            icon,
        )?)?;
        Ok(())
    }

    /// Ring around the icon, coloured by raid completion
    fn draw_badge<DB: DrawingBackend>(&self, chart: &Chart<'_, DB>, placement: &Placement) -> Result<()> {
        let icon = self.icon_fraction();
        let ring = (self.settings.icon_size as f64 * 0.15).round().max(1.0) * self.pixel_fraction();
        let (left, right) = (placement.x, placement.x + icon);
        let (bottom, top) = (placement.icon_y, placement.icon_y + icon);

        let style = RGBColor::from(placement.badge_color).filled();
        let area = chart.plotting_area();
        for corners in [
            [(left - ring, top + ring), (left, bottom - ring)],
            [(right, top + ring), (right + ring, bottom - ring)],
            [(left, top + ring), (right, top)],
            [(left, bottom), (right, bottom - ring)],
        ] {
            area.draw(&Rectangle::new(corners, style))?;
        }
        Ok(())
    }

    fn draw_axis<DB: DrawingBackend>(&self, chart: &mut Chart<'_, DB>) -> Result<()> {
        let axis = RGBColor::from(AXIS_COLOR);
        let max_score = self.settings.max_score;
        let score_label = |fraction: &f64| format!("{:.0}", fraction * max_score);

        chart
            .configure_mesh()
            .disable_mesh()
            .disable_x_axis()
            .y_labels(NUM_Y_TICKS)
            .y_label_formatter(&score_label)
            .axis_style(axis.stroke_width(3))
            .set_tick_mark_size(LabelAreaPosition::Left, 10)
            .label_style(font(AXIS_FONT_SIZE).color(&axis))
            .y_desc("Raider IO Score")
            .axis_desc_style(font(AXIS_FONT_SIZE).color(&axis))
            .draw()?;
        Ok(())
    }

    fn draw_class_icons<DB: DrawingBackend>(
        &self,
        root: &DrawingArea<DB, Shift>,
        chart: &Chart<'_, DB>,
        layout: &LayoutTable,
    ) -> Result<()> {
        let edge = self.class_icon_edge();
        let half_spec_icon = self.icon_fraction() / 2.0;
        for (class_name, centre) in class_centres(&self.settings.classes, layout) {
            let icon = self
                .assets
                .class_icon(&class_name)?
                .resize_exact(edge, edge, FilterType::Triangle)
                .to_rgb8();
            let (x, bottom) = chart.backend_coord(&(centre + half_spec_icon, 0.0));
            root.draw(&bitmap((x - edge as i32 / 2, bottom + CLASS_ICON_GAP), icon)?)?;
        }
        Ok(())
    }

    fn draw_legend<'a, DB: DrawingBackend + 'a>(&self, chart: &mut Chart<'a, DB>) -> Result<()> {
        let entries = legend_entries(
            &self.settings.progression_colors,
            self.settings.current_raid_bosses,
        );
        for (color, label) in entries {
            let swatch = RGBColor::from(color);
            chart
                .draw_series(std::iter::empty::<Rectangle<(f64, f64)>>())?
                .label(label)
                .legend(move |(x, y)| Rectangle::new([(x, y - 6), (x + 12, y + 6)], swatch.filled()));
        }

        let axis = RGBColor::from(AXIS_COLOR);
        chart
            .configure_series_labels()
            .background_style(RGBColor::from(LEGEND_FILL).mix(0.85).filled())
            .border_style(&axis)
            .label_font(font(AXIS_FONT_SIZE).color(&axis))
            .position(SeriesLabelPosition::UpperRight)
            .margin(10)
            .draw()?;
        Ok(())
    }
}

fn font(size: f64) -> FontDesc<'static> {
    FontDesc::new(FontFamily::SansSerif, size, FontStyle::Normal)
}

/// RGB image as a plotters element anchored at its upper-left corner
fn bitmap<Coord>(pos: Coord, image: RgbImage) -> Result<BitMapElement<'static, Coord>> {
    let (width, height) = image.dimensions();
    BitMapElement::with_owned_buffer(pos, (width, height), image.into_raw()).ok_or_else(|| {
        ComparisonError::Draw(format!("{}x{} bitmap has a short buffer", width, height))
    })
}

/// Encode next to the target, then rename into place
fn write_atomically(chart: RgbImage, target: &OutputTarget) -> Result<PathBuf> {
    std::fs::create_dir_all(&target.dir)?;
    let path = target.path();

    let format = match target.format {
        OutputFormat::Png => ImageOutputFormat::Png,
        OutputFormat::Jpg => ImageOutputFormat::Jpeg(90),
    };

    let mut staged = NamedTempFile::new_in(&target.dir)?;
    DynamicImage::ImageRgb8(chart).write_to(staged.as_file_mut(), format)?;
    staged.as_file().sync_all()?;
    staged
        .persist(&path)
        .map_err(|e| ComparisonError::Io(e.error))?;
    Ok(path)
}
