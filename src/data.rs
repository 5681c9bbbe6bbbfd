use std::error::Error;
use std::fmt::Display;
use std::path::Path;
use std::str::FromStr;

use chrono::{Duration, NaiveDate};
use once_cell::sync::Lazy;

pub const MATERIALS_FILE: &str = "Materiales.csv";
pub const PROJECTS_FILE: &str = "Proyectos.csv";
pub const CLIENTS_FILE: &str = "Clientes.csv";

// Spreadsheet serial dates count days from this origin.
static SERIAL_DATE_ORIGIN: Lazy<NaiveDate> =
    Lazy::new(|| NaiveDate::from_ymd_opt(1899, 12, 30).unwrap());

#[derive(Clone, Debug)]
pub struct Material {
    pub id: i64,
    pub name: String,
    pub category: String,
    pub unit_price: f64,
}

#[derive(Clone, Debug)]
pub struct Project {
    pub material_id: i64,
    pub quantity: f64,
    pub date: NaiveDate,
}

#[derive(Clone, Debug)]
pub struct Client {
    pub city: String,
}

pub fn load_materials(path: &Path) -> Result<Vec<Material>, Box<dyn Error>> {
    let mut rdr = open_reader(path)?;
    let headers = rdr.headers()?.clone();

    // Indexes for efficiency
    let id_idx = column(&headers, "ID", path)?;
    let name_idx = column(&headers, "Nombre", path)?;
    let category_idx = column(&headers, "Categoria", path)?;
    let price_idx = column(&headers, "Valor Unitario", path)?;

    let mut materials = Vec::new();
    for (row, result) in rdr.records().enumerate() {
        let record = result?;
        materials.push(Material {
            id: parse_field(&record, id_idx, "ID", row)?,
            name: text_field(&record, name_idx, "Nombre", row)?,
            category: text_field(&record, category_idx, "Categoria", row)?,
            unit_price: parse_field(&record, price_idx, "Valor Unitario", row)?,
        });
    }
    Ok(materials)
}

pub fn load_projects(path: &Path) -> Result<Vec<Project>, Box<dyn Error>> {
    let mut rdr = open_reader(path)?;
    let headers = rdr.headers()?.clone();

    let material_idx = column(&headers, "ID Material", path)?;
    let quantity_idx = column(&headers, "Cantidad", path)?;
    let date_idx = column(&headers, "Fecha", path)?;

    let mut projects = Vec::new();
    for (row, result) in rdr.records().enumerate() {
        let record = result?;
        let serial: i64 = parse_field(&record, date_idx, "Fecha", row)?;
        projects.push(Project {
            material_id: parse_field(&record, material_idx, "ID Material", row)?,
            quantity: parse_field(&record, quantity_idx, "Cantidad", row)?,
            date: decode_serial_date(serial)
                .ok_or_else(|| format!("row {}: day count {} out of range", row + 1, serial))?,
        });
    }
    Ok(projects)
}

pub fn load_clients(path: &Path) -> Result<Vec<Client>, Box<dyn Error>> {
    let mut rdr = open_reader(path)?;
    let headers = rdr.headers()?.clone();

    let city_idx = column(&headers, "Ciudad", path)?;

    let mut clients = Vec::new();
    for (row, result) in rdr.records().enumerate() {
        let record = result?;
        clients.push(Client {
            city: text_field(&record, city_idx, "Ciudad", row)?,
        });
    }
    Ok(clients)
}

/// Decodes a day count relative to the 1899-12-30 origin. None when the
/// count does not land on a representable date.
pub fn decode_serial_date(serial: i64) -> Option<NaiveDate> {
    Duration::try_days(serial).and_then(|d| SERIAL_DATE_ORIGIN.checked_add_signed(d))
}

fn open_reader(path: &Path) -> Result<csv::Reader<std::fs::File>, Box<dyn Error>> {
    csv::Reader::from_path(path).map_err(|e| format!("{}: {}", path.display(), e).into())
}

fn column(
    headers: &csv::StringRecord,
    name: &str,
    path: &Path,
) -> Result<usize, Box<dyn Error>> {
    headers
        .iter()
        .position(|h| h == name)
        .ok_or_else(|| format!("{}: missing column {:?}", path.display(), name).into())
}

fn text_field(
    record: &csv::StringRecord,
    idx: usize,
    name: &str,
    row: usize,
) -> Result<String, Box<dyn Error>> {
    match record.get(idx) {
        Some(v) if !v.is_empty() => Ok(v.to_string()),
        _ => Err(format!("row {}: empty {:?}", row + 1, name).into()),
    }
}

fn parse_field<T>(
    record: &csv::StringRecord,
    idx: usize,
    name: &str,
    row: usize,
) -> Result<T, Box<dyn Error>>
where
    T: FromStr,
    T::Err: Display,
{
    let raw = record.get(idx).unwrap_or("");
    raw.trim()
        .parse::<T>()
        .map_err(|e| format!("row {}: invalid {:?} value {:?}: {}", row + 1, name, raw, e).into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write_csv(dir: &Path, name: &str, body: &str) -> std::path::PathBuf {
        let path = dir.join(name);
        fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn loads_materials() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(
            dir.path(),
            MATERIALS_FILE,
            "ID,Nombre,Categoria,Valor Unitario\n1,Cement,Binder,10\n2,Sand,Aggregate,3.5\n",
        );
        let materials = load_materials(&path).unwrap();
        assert_eq!(materials.len(), 2);
        assert_eq!(materials[0].id, 1);
        assert_eq!(materials[0].name, "Cement");
        assert_eq!(materials[1].category, "Aggregate");
        assert_eq!(materials[1].unit_price, 3.5);
    }

    #[test]
    fn loads_projects_and_decodes_dates() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(
            dir.path(),
            PROJECTS_FILE,
            "ID Material,Cantidad,Fecha\n1,5,44562\n1,15,44927\n",
        );
        let projects = load_projects(&path).unwrap();
        assert_eq!(projects.len(), 2);
        assert_eq!(projects[0].quantity, 5.0);
        assert_eq!(projects[0].date, NaiveDate::from_ymd_opt(2022, 1, 1).unwrap());
        assert_eq!(projects[1].date, NaiveDate::from_ymd_opt(2023, 1, 1).unwrap());
    }

    #[test]
    fn loads_clients() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(dir.path(), CLIENTS_FILE, "Ciudad\nBogota\nMedellin\nBogota\n");
        let clients = load_clients(&path).unwrap();
        assert_eq!(clients.len(), 3);
        assert_eq!(clients[2].city, "Bogota");
    }

    #[test]
    fn absurd_day_count_is_an_error_not_a_panic() {
        assert!(decode_serial_date(200_000_000_000).is_none());

        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(
            dir.path(),
            PROJECTS_FILE,
            "ID Material,Cantidad,Fecha\n1,5,200000000000\n",
        );
        let err = load_projects(&path).unwrap_err().to_string();
        assert!(err.contains("out of range"), "{err}");
    }

    #[test]
    fn missing_column_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(dir.path(), MATERIALS_FILE, "ID,Nombre\n1,Cement\n");
        let err = load_materials(&path).unwrap_err().to_string();
        assert!(err.contains("Categoria"), "{err}");
    }

    #[test]
    fn bad_field_names_the_row() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(
            dir.path(),
            PROJECTS_FILE,
            "ID Material,Cantidad,Fecha\n1,5,44562\n1,lots,44563\n",
        );
        let err = load_projects(&path).unwrap_err().to_string();
        assert!(err.contains("row 2"), "{err}");
        assert!(err.contains("Cantidad"), "{err}");
    }

    #[test]
    fn missing_file_names_the_path() {
        let err = load_clients(Path::new("nowhere/Clientes.csv"))
            .unwrap_err()
            .to_string();
        assert!(err.contains("Clientes.csv"), "{err}");
    }
}
