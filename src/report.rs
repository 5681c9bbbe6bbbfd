use std::fs;
use std::io;
use std::path::Path;

use log::info;

use crate::data::{Material, Project};

pub const GRAPH_REPORTS_DIR: &str = "Graph reports";
pub const REPORT_FILE: &str = "reporte.txt";

/// Per-material usage statistics. `average` is NaN when no project row
/// references the material.
#[derive(Clone, Copy, Debug)]
pub struct MaterialUsage {
    pub total: f64,
    pub average: f64,
    pub cost: f64,
}

/// Ensures the report root, one subdirectory per material name, and the chart
/// output subfolder all exist. Safe to re-run; never removes stale directories.
pub fn create_report_directories(root: &Path, materials: &[Material]) -> io::Result<()> {
    fs::create_dir_all(root)?;
    fs::create_dir_all(root.join(GRAPH_REPORTS_DIR))?;
    for material in materials {
        fs::create_dir_all(root.join(&material.name))?;
    }
    Ok(())
}

pub fn usage_for_material(material: &Material, projects: &[Project]) -> MaterialUsage {
    let quantities: Vec<f64> = projects
        .iter()
        .filter(|p| p.material_id == material.id)
        .map(|p| p.quantity)
        .collect();

    // An empty f64 sum is -0.0, which Display would print as -0.
    if quantities.is_empty() {
        return MaterialUsage {
            total: 0.0,
            average: f64::NAN,
            cost: 0.0,
        };
    }

    let total: f64 = quantities.iter().sum();
    MaterialUsage {
        total,
        average: total / quantities.len() as f64,
        cost: total * material.unit_price,
    }
}

/// Writes `<root>/<name>/reporte.txt` for every material, overwriting any
/// previous report. Three lines: total usage, average usage, total cost.
pub fn write_material_reports(
    root: &Path,
    materials: &[Material],
    projects: &[Project],
) -> io::Result<()> {
    for material in materials {
        let usage = usage_for_material(material, projects);
        let path = root.join(&material.name).join(REPORT_FILE);
        // {:?} keeps the trailing .0 on a whole-number mean and prints NaN
        // for an empty group; {} drops it for totals and costs.
        fs::write(
            &path,
            format!("{}\n{:?}\n{}\n", usage.total, usage.average, usage.cost),
        )?;
    }
    info!(
        "{} material reports written under {}",
        materials.len(),
        root.display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn material(id: i64, name: &str, price: f64) -> Material {
        Material {
            id,
            name: name.to_string(),
            category: "Binder".to_string(),
            unit_price: price,
        }
    }

    fn project(material_id: i64, quantity: f64) -> Project {
        Project {
            material_id,
            quantity,
            date: NaiveDate::from_ymd_opt(2022, 1, 1).unwrap(),
        }
    }

    #[test]
    fn scaffolder_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("Reporte de materiales");
        let materials = vec![material(1, "Cement", 10.0), material(2, "Sand", 3.5)];

        create_report_directories(&root, &materials).unwrap();
        create_report_directories(&root, &materials).unwrap();

        assert!(root.join("Cement").is_dir());
        assert!(root.join("Sand").is_dir());
        assert!(root.join(GRAPH_REPORTS_DIR).is_dir());
    }

    #[test]
    fn aggregates_matching_projects() {
        let m = material(1, "Cement", 10.0);
        let projects = vec![project(1, 5.0), project(1, 15.0), project(2, 99.0)];
        let usage = usage_for_material(&m, &projects);
        assert_eq!(usage.total, 20.0);
        assert_eq!(usage.average, 10.0);
        assert_eq!(usage.cost, 200.0);
    }

    #[test]
    fn report_file_matches_canonical_example() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().to_path_buf();
        let materials = vec![material(1, "Cement", 10.0)];
        let projects = vec![project(1, 5.0), project(1, 15.0)];

        create_report_directories(&root, &materials).unwrap();
        write_material_reports(&root, &materials, &projects).unwrap();

        let body = std::fs::read_to_string(root.join("Cement").join(REPORT_FILE)).unwrap();
        assert_eq!(body, "20\n10.0\n200\n");
    }

    #[test]
    fn unused_material_reports_nan_average() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().to_path_buf();
        let materials = vec![material(7, "Gravel", 4.0)];

        create_report_directories(&root, &materials).unwrap();
        write_material_reports(&root, &materials, &[]).unwrap();

        let body = std::fs::read_to_string(root.join("Gravel").join(REPORT_FILE)).unwrap();
        assert_eq!(body, "0\nNaN\n0\n");
    }

    #[test]
    fn empty_group_totals_carry_no_negative_sign() {
        let usage = usage_for_material(&material(1, "Cement", 10.0), &[]);
        assert_eq!(format!("{}", usage.total), "0");
        assert_eq!(format!("{}", usage.cost), "0");
        assert!(usage.average.is_nan());
    }

    #[test]
    fn rerun_overwrites_previous_report() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().to_path_buf();
        let materials = vec![material(1, "Cement", 10.0)];

        create_report_directories(&root, &materials).unwrap();
        write_material_reports(&root, &materials, &[project(1, 5.0)]).unwrap();
        write_material_reports(&root, &materials, &[project(1, 5.0), project(1, 15.0)]).unwrap();

        let body = std::fs::read_to_string(root.join("Cement").join(REPORT_FILE)).unwrap();
        assert_eq!(body, "20\n10.0\n200\n");
    }
}
