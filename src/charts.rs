use std::collections::BTreeMap;
use std::error::Error;
use std::path::{Path, PathBuf};

use chrono::Datelike;
use num_format::{Locale, ToFormattedString};
use plotters::prelude::*;

use crate::data::{Client, Material, Project};
use crate::report::GRAPH_REPORTS_DIR;

const SKY_BLUE: RGBColor = RGBColor(135, 206, 235);

const PIE_PALETTE: [RGBColor; 8] = [
    RGBColor(102, 153, 204),
    RGBColor(240, 150, 90),
    RGBColor(120, 190, 120),
    RGBColor(210, 110, 110),
    RGBColor(170, 140, 200),
    RGBColor(200, 180, 100),
    RGBColor(130, 200, 200),
    RGBColor(220, 160, 190),
];

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum LineChartMode {
    SingleYear(i32),
    AllYears,
}

/// Inner-join of projects to materials on id, summed by category.
/// Projects referencing an unknown material are dropped, as a join would.
pub fn usage_by_category(materials: &[Material], projects: &[Project]) -> Vec<(String, f64)> {
    let categories: BTreeMap<i64, &str> = materials
        .iter()
        .map(|m| (m.id, m.category.as_str()))
        .collect();

    let mut totals: BTreeMap<String, f64> = BTreeMap::new();
    for project in projects {
        if let Some(category) = categories.get(&project.material_id) {
            *totals.entry(category.to_string()).or_default() += project.quantity;
        }
    }
    totals.into_iter().collect()
}

/// Quantity summed per (year, month), ordered chronologically.
pub fn monthly_usage(projects: &[Project]) -> BTreeMap<(i32, u32), f64> {
    let mut totals: BTreeMap<(i32, u32), f64> = BTreeMap::new();
    for project in projects {
        let key = (project.date.year(), project.date.month());
        *totals.entry(key).or_default() += project.quantity;
    }
    totals
}

/// Splits the monthly totals into one (year, points) list per year, filtered
/// to the requested year in single-year mode. BTreeMap order is
/// (year, month), so consecutive entries share a year.
pub fn monthly_series(
    monthly: &BTreeMap<(i32, u32), f64>,
    mode: LineChartMode,
) -> Vec<(i32, Vec<(u32, f64)>)> {
    let mut series: Vec<(i32, Vec<(u32, f64)>)> = Vec::new();
    for ((year, month), total) in monthly {
        if let LineChartMode::SingleYear(wanted) = mode {
            if *year != wanted {
                continue;
            }
        }
        match series.last_mut() {
            Some((current, points)) if current == year => points.push((*month, *total)),
            _ => series.push((*year, vec![(*month, *total)])),
        }
    }
    series
}

/// Participation row count per city, most frequent first.
pub fn participation_by_city(clients: &[Client]) -> Vec<(String, usize)> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for client in clients {
        *counts.entry(client.city.as_str()).or_default() += 1;
    }
    let mut ordered: Vec<(String, usize)> = counts
        .into_iter()
        .map(|(city, n)| (city.to_string(), n))
        .collect();
    ordered.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ordered
}

pub fn render_bar_chart(
    materials: &[Material],
    projects: &[Project],
    report_root: &Path,
) -> Result<PathBuf, Box<dyn Error>> {
    let data = usage_by_category(materials, projects);
    if data.is_empty() {
        return Err("no project rows to chart".into());
    }

    let path = report_root.join(GRAPH_REPORTS_DIR).join("Bar_Chart.png");
    let y_max = data.iter().map(|(_, v)| *v).fold(0.0, f64::max).max(1.0) * 1.1;

    // The backend borrows the path, so the drawing area must drop before
    // the path is returned.
    {
        let root = BitMapBackend::new(&path, (900, 600)).into_drawing_area();
        root.fill(&WHITE)?;

        let mut chart = ChartBuilder::on(&root)
            .caption("Total Material Usage by Category", ("sans-serif", 28))
            .margin(20)
            .x_label_area_size(50)
            .y_label_area_size(70)
            .build_cartesian_2d((0..data.len()).into_segmented(), 0f64..y_max)?;

        chart
            .configure_mesh()
            .x_desc("Category")
            .y_desc("Total Usage")
            .disable_x_mesh()
            .x_label_formatter(&|seg| match seg {
                SegmentValue::CenterOf(i) if *i < data.len() => data[*i].0.clone(),
                _ => String::new(),
            })
            .y_label_formatter(&format_axis_value)
            .draw()?;

        // Fill first, then re-draw the outline so every bar gets its black edge.
        chart.draw_series(data.iter().enumerate().map(|(i, (_, total))| {
            let mut bar = Rectangle::new(bar_corners(i, *total), SKY_BLUE.filled());
            bar.set_margin(0, 0, 12, 12);
            bar
        }))?;
        chart.draw_series(data.iter().enumerate().map(|(i, (_, total))| {
            let mut edge = Rectangle::new(bar_corners(i, *total), BLACK.stroke_width(1));
            edge.set_margin(0, 0, 12, 12);
            edge
        }))?;

        root.present()?;
    }
    Ok(path)
}

pub fn render_line_chart(
    projects: &[Project],
    mode: LineChartMode,
    report_root: &Path,
) -> Result<PathBuf, Box<dyn Error>> {
    let monthly = monthly_usage(projects);
    if monthly.is_empty() {
        return Err("no project rows to chart".into());
    }

    let series = monthly_series(&monthly, mode);

    let (file_name, caption) = match mode {
        LineChartMode::SingleYear(year) => (
            format!("Line_Chart_{year}.png"),
            format!("Monthly Material Usage ({year})"),
        ),
        LineChartMode::AllYears => {
            let years: Vec<String> = series.iter().map(|(y, _)| y.to_string()).collect();
            (
                "Line_Chart_both years.png".to_string(),
                format!("Monthly Material Usage ({})", years.join(" & ")),
            )
        }
    };

    let path = report_root.join(GRAPH_REPORTS_DIR).join(file_name);
    let y_max = series
        .iter()
        .flat_map(|(_, points)| points.iter().map(|(_, v)| *v))
        .fold(0.0, f64::max)
        .max(1.0)
        * 1.1;

    {
        let root = BitMapBackend::new(&path, (900, 600)).into_drawing_area();
        root.fill(&WHITE)?;

        let mut chart = ChartBuilder::on(&root)
            .caption(&caption, ("sans-serif", 28))
            .margin(20)
            .x_label_area_size(50)
            .y_label_area_size(70)
            .build_cartesian_2d(1u32..13u32, 0f64..y_max)?;

        chart
            .configure_mesh()
            .x_desc("Month")
            .y_desc("Total Usage")
            .x_labels(12)
            .y_labels(10)
            .y_label_formatter(&format_axis_value)
            .draw()?;

        for (idx, (year, points)) in series.iter().enumerate() {
            let color = Palette99::pick(idx).mix(1.0);
            let line = chart.draw_series(LineSeries::new(
                points.iter().copied(),
                color.stroke_width(2),
            ))?;
            if mode == LineChartMode::AllYears {
                line.label(year.to_string()).legend(move |(x, y)| {
                    PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2))
                });
            }
            chart.draw_series(
                points
                    .iter()
                    .map(|(month, total)| Circle::new((*month, *total), 4, color.filled())),
            )?;
        }

        if mode == LineChartMode::AllYears {
            chart
                .configure_series_labels()
                .background_style(&WHITE.mix(0.8))
                .border_style(&BLACK)
                .draw()?;
        }

        root.present()?;
    }
    Ok(path)
}

pub fn render_pie_chart(
    clients: &[Client],
    report_root: &Path,
) -> Result<PathBuf, Box<dyn Error>> {
    let counts = participation_by_city(clients);
    if counts.is_empty() {
        return Err("no client rows to chart".into());
    }

    let path = report_root.join(GRAPH_REPORTS_DIR).join("Pie_Chart.png");

    {
        let root = BitMapBackend::new(&path, (800, 700)).into_drawing_area();
        root.fill(&WHITE)?;
        let root = root.titled(
            "Project Participation by City",
            ("sans-serif", 28).into_font().color(&BLACK),
        )?;

        let dims = root.dim_in_pixel();
        let center = (dims.0 as i32 / 2, dims.1 as i32 / 2);
        let radius = (dims.0.min(dims.1) as f64) * 0.35;

        let sizes: Vec<f64> = counts.iter().map(|(_, n)| *n as f64).collect();
        let labels: Vec<String> = counts.iter().map(|(city, _)| city.clone()).collect();
        let colors: Vec<RGBColor> = (0..counts.len())
            .map(|i| PIE_PALETTE[i % PIE_PALETTE.len()])
            .collect();

        let mut pie = Pie::new(&center, &radius, &sizes, &colors, &labels);
        pie.start_angle(140.0);
        pie.label_style(("sans-serif", 18).into_font().color(&BLACK));
        pie.percentages(("sans-serif", 16).into_font().color(&BLACK));
        root.draw(&pie)?;

        root.present()?;
    }
    Ok(path)
}

fn bar_corners(index: usize, total: f64) -> [(SegmentValue<usize>, f64); 2] {
    [
        (SegmentValue::Exact(index), 0.0),
        (SegmentValue::Exact(index + 1), total),
    ]
}

fn format_axis_value(value: &f64) -> String {
    (value.round() as i64).to_formatted_string(&Locale::en)
}
