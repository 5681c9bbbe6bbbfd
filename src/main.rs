mod charts;
mod data;
mod report;

use std::env;
use std::error::Error;
use std::io::{self, Write};
use std::path::PathBuf;

use flexi_logger::Logger;
use log::info;

use charts::LineChartMode;

struct Config {
    data_dir: PathBuf,
    report_root: PathBuf,
}

impl Config {
    fn from_args<I: Iterator<Item = String>>(mut args: I) -> Config {
        let data_dir = args.next().unwrap_or_else(|| "data".to_string());
        let report_root = args
            .next()
            .unwrap_or_else(|| "Reporte de materiales".to_string());
        Config {
            data_dir: PathBuf::from(data_dir),
            report_root: PathBuf::from(report_root),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum GraphKind {
    Bar,
    Line,
    Pie,
}

fn main() -> Result<(), Box<dyn Error>> {
    let _logger = Logger::try_with_env_or_str("info")?.start()?;
    let config = Config::from_args(env::args().skip(1));
    run(&config)
}

fn run(config: &Config) -> Result<(), Box<dyn Error>> {
    let materials = data::load_materials(&config.data_dir.join(data::MATERIALS_FILE))?;
    let projects = data::load_projects(&config.data_dir.join(data::PROJECTS_FILE))?;
    let clients = data::load_clients(&config.data_dir.join(data::CLIENTS_FILE))?;
    info!(
        "loaded {} materials, {} projects, {} client rows from {}",
        materials.len(),
        projects.len(),
        clients.len(),
        config.data_dir.display()
    );

    report::create_report_directories(&config.report_root, &materials)?;
    report::write_material_reports(&config.report_root, &materials, &projects)?;

    let Some(kind) = ask_for_graph_type()? else {
        return Ok(());
    };
    let saved = match kind {
        GraphKind::Bar => charts::render_bar_chart(&materials, &projects, &config.report_root)?,
        GraphKind::Line => {
            let mode = ask_line_chart_mode()?;
            charts::render_line_chart(&projects, mode, &config.report_root)?
        }
        GraphKind::Pie => charts::render_pie_chart(&clients, &config.report_root)?,
    };
    println!("Chart saved to {}", saved.display());
    Ok(())
}

fn ask_for_graph_type() -> Result<Option<GraphKind>, Box<dyn Error>> {
    if !ask_yes_no("Do you want to create a graphical report? (yes/no): ")? {
        return Ok(None);
    }
    println!("Choose the type of graph:\n1. Bar\n2. Line\n3. Pie");

    let answer = read_line("Enter the number of the graph type: ")?;
    if answer.is_empty() {
        return Ok(None);
    }
    if let Some(kind) = parse_graph_choice(&answer) {
        return Ok(Some(kind));
    }

    // One re-prompt; a second unrecognised answer means no chart.
    println!("Invalid option, one more try.");
    let answer = read_line("Enter the number of the graph type: ")?;
    match parse_graph_choice(&answer) {
        Some(kind) => Ok(Some(kind)),
        None => {
            println!("Invalid option");
            Ok(None)
        }
    }
}

fn ask_line_chart_mode() -> Result<LineChartMode, Box<dyn Error>> {
    if ask_yes_no("Do you want to include both years? (yes/no): ")? {
        return Ok(LineChartMode::AllYears);
    }

    let answer = read_line("Enter the year (2022 or 2023): ")?;
    if let Ok(year) = answer.parse::<i32>() {
        return Ok(LineChartMode::SingleYear(year));
    }

    // One re-prompt; a second failure aborts the run.
    println!("That is not a year, one more try.");
    let answer = read_line("Enter the year (2022 or 2023): ")?;
    let year = answer
        .parse::<i32>()
        .map_err(|e| format!("invalid year {:?}: {}", answer, e))?;
    Ok(LineChartMode::SingleYear(year))
}

fn ask_yes_no(question: &str) -> Result<bool, Box<dyn Error>> {
    let answer = read_line(question)?;
    Ok(parse_yes(&answer))
}

fn read_line(prompt: &str) -> Result<String, Box<dyn Error>> {
    print!("{prompt}");
    io::stdout().flush().unwrap();
    let mut line = String::new();
    io::stdin().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

fn parse_yes(answer: &str) -> bool {
    answer.trim().eq_ignore_ascii_case("yes")
}

fn parse_graph_choice(answer: &str) -> Option<GraphKind> {
    match answer {
        "1" => Some(GraphKind::Bar),
        "2" => Some(GraphKind::Line),
        "3" => Some(GraphKind::Pie),
        _ => None,
    }
}
