//! CSV input and output for the Cadiz CLI.
//!
//! A data directory holds three tables:
//!
//! | file | columns |
//! |---|---|
//! | `exposures.csv` | `date, asset, factor, exposure` |
//! | `covariances.csv` | `date, factor_1, factor_2, covariance` |
//! | `assets.csv` | `date, asset, return, predicted_beta, specific_risk[, market_cap]` |

use std::{fs::File, path::Path};

use anyhow::{Context, Result};
use cadiz_traits::InMemoryDataSource;
use chrono::NaiveDate;
use polars::prelude::*;
use tracing::debug;

/// Read a CSV file, parsing ISO dates.
pub(crate) fn read_csv(path: &Path) -> Result<DataFrame> {
    let frame = LazyCsvReader::new(path)
        .with_has_header(true)
        .with_try_parse_dates(true)
        .finish()
        .and_then(LazyFrame::collect)
        .with_context(|| format!("reading {}", path.display()))?;
    debug!(path = %path.display(), rows = frame.height(), "Read table");
    Ok(frame)
}

/// Write a table as CSV.
pub(crate) fn write_csv(frame: &mut DataFrame, path: &Path) -> Result<()> {
    let mut file =
        File::create(path).with_context(|| format!("creating {}", path.display()))?;
    CsvWriter::new(&mut file)
        .include_header(true)
        .finish(frame)
        .with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}

/// Load the risk-model and asset tables from a data directory.
pub(crate) fn load_source(dir: &Path) -> Result<InMemoryDataSource> {
    let source = InMemoryDataSource::new()
        .with_exposures(read_csv(&dir.join("exposures.csv"))?)?
        .with_covariances(read_csv(&dir.join("covariances.csv"))?)?
        .with_assets(read_csv(&dir.join("assets.csv"))?)?;
    Ok(source)
}

/// Parse a date string in YYYY-MM-DD format.
pub(crate) fn parse_date(date_str: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(date_str, "%Y-%m-%d")
        .with_context(|| format!("invalid date `{date_str}`, expected YYYY-MM-DD"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use cadiz_traits::{AssetDataSource, frame::f64_values};
    use chrono::Datelike;
    use std::fs;

    #[test]
    fn test_parse_date() {
        let date = parse_date("2024-01-15").unwrap();
        assert_eq!(date.year(), 2024);
        assert_eq!(date.month(), 1);
        assert_eq!(date.day(), 15);
    }

    #[test]
    fn test_parse_date_invalid() {
        assert!(parse_date("invalid").is_err());
    }

    #[test]
    fn test_load_source_from_directory() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("exposures.csv"),
            "date,asset,factor,exposure\n2024-03-01,A,size,1.0\n2024-03-01,B,size,-1.0\n",
        )
        .unwrap();
        fs::write(
            dir.path().join("covariances.csv"),
            "date,factor_1,factor_2,covariance\n2024-03-01,size,size,4.0\n",
        )
        .unwrap();
        fs::write(
            dir.path().join("assets.csv"),
            "date,asset,return,predicted_beta,specific_risk\n\
             2024-03-01,B,0.5,1.1,20.0\n\
             2024-03-01,A,-0.2,0.9,25.0\n",
        )
        .unwrap();

        let source = load_source(dir.path()).unwrap();
        let date = parse_date("2024-03-01").unwrap();
        let universe = source.universe(date).unwrap();
        assert_eq!(universe.assets(), &["A", "B"]);

        let betas = source.predicted_betas(date, &universe).unwrap();
        assert_eq!(betas.height(), 2);
    }

    #[test]
    fn test_csv_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        let mut frame = df!("asset" => &["A", "B"], "weight" => &[0.25, 0.75]).unwrap();
        write_csv(&mut frame, &path).unwrap();
        let back = read_csv(&path).unwrap();
        assert_eq!(f64_values(&back, "weight").unwrap(), vec![Some(0.25), Some(0.75)]);
    }
}
