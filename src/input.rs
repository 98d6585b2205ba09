// Input module: reads the asset export (CSV with `ID`, `Serial Number`
// and `Asset Tag` columns) into the list of assets to dispose.

use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use tracing::{debug, error};

/// Marker written by the upstream lookup when an asset is unknown.
pub const NOT_FOUND_SENTINEL: &str = "NOT FOUND IN ITSM";

/// One asset to process, in input order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetRecord {
    pub id: String,
    pub serial_number: String,
}

const ID_COLUMN: &str = "ID";
const SERIAL_NUMBER_COLUMN: &str = "Serial Number";

// Cells missing from a short row read as empty.
fn to_record(id: &str, serial_number: &str) -> Option<AssetRecord> {
    let id = id.trim();
    let serial_number = serial_number.trim();
    if id.is_empty() || serial_number.is_empty() {
        return None;
    }
    if is_sentinel(id) || is_sentinel(serial_number) {
        return None;
    }
    Some(AssetRecord {
        id: id.to_string(),
        serial_number: serial_number.to_string(),
    })
}

fn is_sentinel(value: &str) -> bool {
    value.to_uppercase() == NOT_FOUND_SENTINEL
}

/// Parse CSV data and keep the usable rows. Any malformed record fails
/// the whole parse.
pub fn parse_assets<R: Read>(reader: R) -> Result<Vec<AssetRecord>, csv::Error> {
    let mut rdr = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
    let headers = rdr.headers()?.clone();
    let id_col = headers.iter().position(|h| h == ID_COLUMN);
    let serial_col = headers.iter().position(|h| h == SERIAL_NUMBER_COLUMN);

    let cell = |record: &csv::StringRecord, col: Option<usize>| -> String {
        col.and_then(|i| record.get(i)).unwrap_or_default().to_string()
    };

    let mut assets = Vec::new();
    for (line, record) in rdr.records().enumerate() {
        let record = record?;
        match to_record(&cell(&record, id_col), &cell(&record, serial_col)) {
            Some(asset) => assets.push(asset),
            None => debug!("skipping data row {}", line + 1),
        }
    }
    Ok(assets)
}

/// Read the asset list from `path`. Errors are logged and turn into an
/// empty list.
pub fn read_assets(path: &Path) -> Vec<AssetRecord> {
    let file = match File::open(path) {
        Ok(f) => f,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            error!("CSV file not found at: {}", path.display());
            return Vec::new();
        }
        Err(e) => {
            error!("An error occurred while reading the CSV file: {e}");
            return Vec::new();
        }
    };
    match parse_assets(file) {
        Ok(assets) => assets,
        Err(e) => {
            error!("An error occurred while reading the CSV file: {e}");
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filters_sentinel_and_empty_rows() {
        let data = "ID,Serial Number,Asset Tag\n\
                    1,ABC,T-1\n\
                    2,NOT FOUND IN ITSM,T-2\n\
                    ,XYZ,T-3\n";
        let assets = parse_assets(data.as_bytes()).unwrap();
        assert_eq!(
            assets,
            vec![AssetRecord {
                id: "1".into(),
                serial_number: "ABC".into(),
            }]
        );
    }

    #[test]
    fn trims_fields_and_matches_sentinel_case_insensitively() {
        let data = "ID,Serial Number,Asset Tag\n\
                    \" 7 \",\" SN7 \",x\n\
                    not found in itsm,SN8,x\n\
                    9,Not Found In ITSM,x\n\
                    10,   ,x\n";
        let assets = parse_assets(data.as_bytes()).unwrap();
        assert_eq!(assets.len(), 1);
        assert_eq!(assets[0].id, "7");
        assert_eq!(assets[0].serial_number, "SN7");
    }

    #[test]
    fn keeps_file_order_and_tolerates_short_rows() {
        let data = "Asset Tag,Serial Number,ID\n\
                    a,S3,3\n\
                    b,S1,1\n\
                    c\n";
        let ids: Vec<_> = parse_assets(data.as_bytes())
            .unwrap()
            .into_iter()
            .map(|a| a.id)
            .collect();
        assert_eq!(ids, ["3", "1"]);
    }

    #[test]
    fn missing_file_yields_empty_list() {
        let dir = tempfile::tempdir().unwrap();
        assert!(read_assets(&dir.path().join("absent.csv")).is_empty());
    }

    #[test]
    fn reads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("assets.csv");
        std::fs::write(&path, "ID,Serial Number,Asset Tag\n100,SN-100,TAG\n").unwrap();
        assert_eq!(read_assets(&path).len(), 1);
    }
}
