//! ============================================================================
//! Reservation Export - admin CSV/XLSX download
//! ============================================================================
//! Builds the filter query for `GET /api/reservations/export` and writes the
//! returned file verbatim.
//! ============================================================================

use chrono::NaiveDate;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::info;

use crate::error::{ClientError, Result};
use crate::types::ReservationState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportFormat {
    #[default]
    Csv,
    Xlsx,
}

impl ExportFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Xlsx => "xlsx",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "xlsx" | "excel" => Ok(ExportFormat::Xlsx),
            _ => Err(format!("Unsupported format '{}'. Valid values: csv, xlsx", s)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ExportQuery {
    pub format: ExportFormat,
    pub state: Option<ReservationState>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
}

fn parse_date(field: &str, raw: Option<&str>) -> Result<Option<NaiveDate>> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        Some(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map(Some)
            .map_err(|_| ClientError::invalid(field, format!("Fecha inválida '{}' (usa AAAA-MM-DD)", s))),
        None => Ok(None),
    }
}

impl ExportQuery {
    /// Validate raw filter input from a form
    pub fn from_form(
        format: ExportFormat,
        state: Option<ReservationState>,
        date_from: Option<&str>,
        date_to: Option<&str>,
    ) -> Result<Self> {
        let query = Self {
            format,
            state,
            date_from: parse_date("date_from", date_from)?,
            date_to: parse_date("date_to", date_to)?,
        };
        query.validate()?;
        Ok(query)
    }

    pub fn validate(&self) -> Result<()> {
        if let (Some(from), Some(to)) = (self.date_from, self.date_to) {
            if from > to {
                return Err(ClientError::invalid(
                    "date_from",
                    "La fecha inicial no puede ser posterior a la final",
                ));
            }
        }
        if self.state == Some(ReservationState::Unknown) {
            return Err(ClientError::invalid("state", "Estado de reserva desconocido"));
        }
        Ok(())
    }

    /// `format=...&state=...&date_from=...&date_to=...`; empty filters are omitted
    pub fn to_query_string(&self) -> String {
        let mut pairs = vec![format!("format={}", self.format)];
        if let Some(state) = self.state {
            pairs.push(format!("state={}", urlencoding::encode(state.as_str())));
        }
        if let Some(from) = self.date_from {
            pairs.push(format!("date_from={}", from.format("%Y-%m-%d")));
        }
        if let Some(to) = self.date_to {
            pairs.push(format!("date_to={}", to.format("%Y-%m-%d")));
        }
        pairs.join("&")
    }

    /// `reservas_<YYYYMMDD>.<ext>`
    pub fn default_filename(&self, today: NaiveDate) -> PathBuf {
        PathBuf::from(format!("reservas_{}.{}", today.format("%Y%m%d"), self.format))
    }
}

/// Write the downloaded export; returns the byte count
pub async fn write_export(path: &Path, bytes: &[u8]) -> Result<usize> {
    tokio::fs::write(path, bytes).await?;
    info!("Wrote {} bytes to {}", bytes.len(), path.display());
    Ok(bytes.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_query_string_with_all_filters() {
        let query = ExportQuery::from_form(
            ExportFormat::Xlsx,
            Some(ReservationState::Aprobada),
            Some("2026-01-01"),
            Some("2026-01-31"),
        )
        .unwrap();
        assert_eq!(
            query.to_query_string(),
            "format=xlsx&state=Aprobada&date_from=2026-01-01&date_to=2026-01-31"
        );
    }

    #[test]
    fn test_query_string_minimal() {
        let query = ExportQuery::from_form(ExportFormat::Csv, None, Some(""), None).unwrap();
        assert_eq!(query.to_query_string(), "format=csv");
    }

    #[test]
    fn test_invalid_ranges_rejected() {
        assert_matches!(
            ExportQuery::from_form(ExportFormat::Csv, None, Some("2026-02-01"), Some("2026-01-01")),
            Err(ClientError::Validation(_))
        );
        assert_matches!(
            ExportQuery::from_form(ExportFormat::Csv, None, Some("01/02/2026"), None),
            Err(ClientError::Validation(_))
        );
    }

    #[test]
    fn test_format_parsing_and_filename() {
        assert_eq!("XLSX".parse::<ExportFormat>(), Ok(ExportFormat::Xlsx));
        assert!("pdf".parse::<ExportFormat>().is_err());

        let query = ExportQuery::default();
        let today = NaiveDate::from_ymd_opt(2026, 10, 14).unwrap();
        assert_eq!(query.default_filename(today), PathBuf::from("reservas_20261014.csv"));
    }

    #[tokio::test]
    async fn test_write_export() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        let body = b"id,state\nr1,Pendiente\n";
        let written = write_export(&path, body).await.unwrap();
        assert_eq!(written, body.len());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "id,state\nr1,Pendiente\n");
    }
}
