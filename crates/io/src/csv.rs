// CSV/TSV import/export

use std::io::Read;
use std::path::Path;

use shipcost_recon::RawTable;

use crate::error::IoError;

/// Import a delimited file as a raw table. The first record is the header row.
pub fn import(path: &Path, name: &str) -> Result<RawTable, IoError> {
    let content = read_file_as_utf8(path)?;
    let delimiter = sniff_delimiter(&content);
    import_from_string(&content, delimiter, name).map_err(|source| IoError::Csv {
        path: path.to_path_buf(),
        source,
    })
}

/// Pick the field delimiter from a sample of the content.
///
/// The sample is parsed once per candidate. A candidate scores the number of
/// sampled records as wide as its header row, times that width. Headers that
/// do not split under a candidate rule it out. Comma wins when nothing splits.
pub fn sniff_delimiter(content: &str) -> u8 {
    const CANDIDATES: [u8; 4] = [b'\t', b';', b',', b'|'];
    let sample: String = content.lines().take(10).collect::<Vec<_>>().join("\n");

    CANDIDATES
        .iter()
        .map(|&delim| (delim, width_agreement(&sample, delim)))
        .filter(|&(_, score)| score > 0)
        // Earlier candidates win ties
        .fold(None, |best: Option<(u8, usize)>, cand| match best {
            Some(b) if b.1 >= cand.1 => Some(b),
            _ => Some(cand),
        })
        .map_or(b',', |(delim, _)| delim)
}

fn width_agreement(sample: &str, delimiter: u8) -> usize {
    let widths: Vec<usize> = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(sample.as_bytes())
        .records()
        .map_while(Result::ok)
        .map(|record| record.len())
        .collect();

    match widths.first() {
        Some(&header) if header > 1 => widths.iter().filter(|&&w| w == header).count() * header,
        _ => 0,
    }
}

/// Read a file and convert it to UTF-8.
///
/// Tries UTF-8 (dropping a BOM), then GB18030 (carrier exports from Chinese
/// billing systems), then Windows-1252 (Excel-exported CSVs).
pub fn read_file_as_utf8(path: &Path) -> Result<String, IoError> {
    let read_err = |source| IoError::Read {
        path: path.to_path_buf(),
        source,
    };
    let mut file = std::fs::File::open(path).map_err(read_err)?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes).map_err(read_err)?;
    Ok(decode_bytes(bytes))
}

fn decode_bytes(bytes: Vec<u8>) -> String {
    match String::from_utf8(bytes) {
        Ok(s) => match s.strip_prefix('\u{feff}') {
            Some(rest) => rest.to_string(),
            None => s,
        },
        Err(e) => {
            let bytes = e.into_bytes();
            let (decoded, _, had_errors) = encoding_rs::GB18030.decode(&bytes);
            if !had_errors {
                log::debug!("decoded input as GB18030");
                return decoded.into_owned();
            }
            log::debug!("decoded input as Windows-1252");
            let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(&bytes);
            decoded.into_owned()
        }
    }
}

/// Parse delimited text. Cells are trimmed; blank cells become nulls and
/// short rows are padded.
pub fn import_from_string(content: &str, delimiter: u8, name: &str) -> Result<RawTable, csv::Error> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        .from_reader(content.as_bytes());

    let headers: Vec<String> = reader.headers()?.iter().map(|h| h.trim().to_string()).collect();
    let mut table = RawTable::new(name, headers);

    for result in reader.records() {
        let record = result?;
        if record.iter().all(|field| field.trim().is_empty()) {
            continue;
        }
        table.push_row(
            record
                .iter()
                .map(|field| {
                    let field = field.trim();
                    (!field.is_empty()).then(|| field.to_string())
                })
                .collect(),
        );
    }

    Ok(table)
}

/// Write a header row plus data rows. `None` cells are written empty.
pub fn export(
    path: &Path,
    headers: &[&str],
    rows: &[Vec<Option<String>>],
    delimiter: u8,
) -> Result<(), IoError> {
    let write_err = |e: csv::Error| IoError::Write {
        path: path.to_path_buf(),
        message: e.to_string(),
    };

    let mut writer = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .from_path(path)
        .map_err(write_err)?;

    writer.write_record(headers).map_err(write_err)?;
    for row in rows {
        writer
            .write_record(row.iter().map(|cell| cell.as_deref().unwrap_or("")))
            .map_err(write_err)?;
    }

    writer.flush().map_err(|e| IoError::Write {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_sniff_semicolon_delimiter() {
        let content = "Name;Age;City\nAlice;30;Paris\nBob;25;London\n";
        assert_eq!(sniff_delimiter(content), b';');
    }

    #[test]
    fn test_sniff_comma_delimiter() {
        let content = "Order,Tracking number,Net payout\nO1,T1,50\nO2,T2,20\n";
        assert_eq!(sniff_delimiter(content), b',');
    }

    #[test]
    fn test_sniff_tab_delimiter() {
        let content = "物流单号\t总金额\nT1\t100\nT2\t50\n";
        assert_eq!(sniff_delimiter(content), b'\t');
    }

    #[test]
    fn test_sniff_semicolon_with_commas_in_values() {
        let content = "Order;Net payout;City\nO1;\"1,200.00\";Paris\nO2;\"45.00\";London\n";
        assert_eq!(sniff_delimiter(content), b';');
    }

    #[test]
    fn test_import_nulls_and_padding() {
        let content = "Order,Tracking number,Net payout\nO1,,50\nO2,T2\n,,\n";
        let table = import_from_string(content, b',', "orders").unwrap();
        assert_eq!(table.name, "orders");
        assert_eq!(table.headers, vec!["Order", "Tracking number", "Net payout"]);
        // Fully blank line dropped
        assert_eq!(table.len(), 2);
        assert_eq!(table.rows[0], vec![Some("O1".into()), None, Some("50".into())]);
        assert_eq!(table.rows[1], vec![Some("O2".into()), Some("T2".into()), None]);
    }

    #[test]
    fn test_import_trims_cells() {
        let content = "Order,Tracking number,Net payout\n O1 ,   ,50\n";
        let table = import_from_string(content, b',', "orders").unwrap();
        assert_eq!(table.rows[0], vec![Some("O1".into()), None, Some("50".into())]);
    }

    #[test]
    fn test_sniff_single_column_defaults_to_comma() {
        assert_eq!(sniff_delimiter("Order\nO1\nO2\n"), b',');
        assert_eq!(sniff_delimiter(""), b',');
    }

    #[test]
    fn test_sniff_pipe_delimiter() {
        let content = "Order|Tracking number|Net payout\nO1|T1|50\n";
        assert_eq!(sniff_delimiter(content), b'|');
    }

    #[test]
    fn test_import_utf8_bom() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("orders.csv");
        fs::write(&path, "\u{feff}Order,Net payout\nO1,50\n").unwrap();

        let table = import(&path, "orders").unwrap();
        assert_eq!(table.headers[0], "Order");
    }

    #[test]
    fn test_import_gb18030() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("shipments.csv");
        let (bytes, _, _) = encoding_rs::GB18030.encode("物流单号,总金额,国家/计费分区\nT1,100,美国\n");
        fs::write(&path, &bytes).unwrap();

        let table = import(&path, "shipments").unwrap();
        assert_eq!(table.headers, vec!["物流单号", "总金额", "国家/计费分区"]);
        assert_eq!(table.cell(0, 2), Some("美国"));
    }

    #[test]
    fn test_import_windows_1252_fallback() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("orders.csv");
        // 0xE9 followed by a newline is not valid GB18030
        fs::write(&path, b"Order,Customer\nO1,Jos\xE9\n").unwrap();

        let table = import(&path, "orders").unwrap();
        assert_eq!(table.cell(0, 1), Some("José"));
    }

    #[test]
    fn test_import_missing_file() {
        let err = import(Path::new("/nonexistent/orders.csv"), "orders").unwrap_err();
        assert!(matches!(err, IoError::Read { .. }));
    }

    #[test]
    fn test_export_roundtrip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.tsv");
        let rows = vec![
            vec![Some("O1".to_string()), Some("13.9".to_string())],
            vec![Some("O2".to_string()), None],
        ];
        export(&path, &["Order", "Shipping Cost (USD)"], &rows, b'\t').unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains('\t'));

        let table = import(&path, "export").unwrap();
        assert_eq!(table.headers, vec!["Order", "Shipping Cost (USD)"]);
        assert_eq!(table.cell(0, 1), Some("13.9"));
        assert_eq!(table.cell(1, 1), None);
    }
}
