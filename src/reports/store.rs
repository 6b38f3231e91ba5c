//! Saved count-day reports.
//!
//! All reports live in one JSON document mapping [`ReportKey`] strings to saved
//! records. Saving rewrites the whole document through a temporary file so an
//! interrupted write never leaves a truncated store behind. Nothing is deleted.

use crate::prefill::merge::canonicalize_cloud_fields;
use crate::reports::error::ReportStoreError;
use crate::types::report::{ReportField, ReportForm, ReportKey};
use crate::utils::write_atomically;
use chrono::{SecondsFormat, Utc};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};

/// Default file name of the store inside the cache directory.
pub const REPORT_STORE_FILE_NAME: &str = "count_day_reports.json";

const EXPORT_BASE_MAX_CHARS: usize = 120;

/// A report as it was last saved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedReport {
    #[serde(rename = "circleName", default)]
    pub circle_name: String,
    #[serde(default)]
    pub abbrev: String,
    #[serde(rename = "dateISO", default)]
    pub date_iso: String,
    #[serde(rename = "savedAtISO", default)]
    pub saved_at_iso: String,
    #[serde(default)]
    pub form: ReportForm,
}

impl SavedReport {
    pub fn key(&self) -> ReportKey {
        ReportKey::new(&self.circle_name, &self.abbrev, &self.date_iso)
    }

    /// One header row and one data row. The free-text weather note is not
    /// exported.
    pub fn to_csv(&self) -> Result<String, ReportStoreError> {
        let form_fields = ReportField::ALL
            .into_iter()
            .filter(|field| *field != ReportField::Weather);

        let mut headers = vec!["circleName", "abbrev", "dateISO", "savedAtISO"];
        let mut values = vec![
            self.circle_name.as_str(),
            self.abbrev.as_str(),
            self.date_iso.as_str(),
            self.saved_at_iso.as_str(),
        ];
        for field in form_fields {
            headers.push(field.name());
            values.push(self.form.get(field));
        }

        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record(&headers)?;
        writer.write_record(&values)?;
        let bytes = writer
            .into_inner()
            .map_err(|e| ReportStoreError::Csv(csv::Error::from(e.into_error())))?;
        Ok(String::from_utf8(bytes)?)
    }

    /// `<name>_<abbrev>_<date>_weather_report.csv`, reduced to characters safe
    /// in any file system.
    ///
    /// ```
    /// use cbc_weather::{ReportForm, SavedReport};
    ///
    /// let report = SavedReport {
    ///     circle_name: "Point Reyes Peninsula".into(),
    ///     abbrev: "CAPR".into(),
    ///     date_iso: "2024-12-21".into(),
    ///     saved_at_iso: String::new(),
    ///     form: ReportForm::default(),
    /// };
    /// assert_eq!(
    ///     report.export_file_name(),
    ///     "Point_Reyes_Peninsula_CAPR_2024-12-21_weather_report.csv"
    /// );
    /// ```
    pub fn export_file_name(&self) -> String {
        let name = if self.circle_name.is_empty() {
            "cbc"
        } else {
            &self.circle_name
        };
        let raw = format!("{}_{}_{}", name, self.abbrev, self.date_iso);
        let mut base = String::with_capacity(raw.len());
        for c in raw.chars() {
            let c = if c.is_whitespace() { '_' } else { c };
            if !(c.is_ascii_alphanumeric() || c == '_' || c == '-') {
                continue;
            }
            if c == '_' && base.ends_with('_') {
                continue;
            }
            base.push(c);
        }
        let base: String = base
            .trim_matches('_')
            .chars()
            .take(EXPORT_BASE_MAX_CHARS)
            .collect();
        if base.is_empty() {
            "countday_weather_report.csv".to_string()
        } else {
            format!("{base}_weather_report.csv")
        }
    }
}

/// File-backed store of saved reports.
#[derive(Debug)]
pub struct ReportStore {
    path: PathBuf,
    reports: BTreeMap<String, SavedReport>,
}

impl ReportStore {
    /// Opens the store at `path`. A missing file is an empty store.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, ReportStoreError> {
        let path = path.into();
        let reports = match tokio::fs::read(&path).await {
            Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => BTreeMap::new(),
            Ok(bytes) => serde_json::from_slice(&bytes)
                .map_err(|e| ReportStoreError::Parse(path.clone(), e))?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(ReportStoreError::Read(path, e)),
        };
        debug!("Opened report store {} with {} reports", path.display(), reports.len());
        Ok(Self { path, reports })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.reports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reports.is_empty()
    }

    pub fn get(&self, key: &ReportKey) -> Option<&SavedReport> {
        self.reports.get(key.as_str())
    }

    /// The saved form for `key` with cloud labels brought up to date, or a fresh
    /// default form when nothing was saved yet.
    pub fn form_for(&self, key: &ReportKey) -> ReportForm {
        let mut form = self
            .get(key)
            .map(|saved| saved.form.clone())
            .unwrap_or_default();
        canonicalize_cloud_fields(&mut form);
        form
    }

    /// Saves `form` under the key of the circle and date, replacing any earlier
    /// save, and writes the store to disk.
    pub async fn save(
        &mut self,
        circle_name: &str,
        abbrev: &str,
        date_iso: &str,
        form: ReportForm,
    ) -> Result<&SavedReport, ReportStoreError> {
        for field in form.unrecognized_choices() {
            warn!(
                "Saving {} with unrecognized {} value '{}'",
                circle_name,
                field.name(),
                form.get(field)
            );
        }
        let record = SavedReport {
            circle_name: circle_name.to_string(),
            abbrev: abbrev.to_string(),
            date_iso: date_iso.to_string(),
            saved_at_iso: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            form,
        };
        let key = record.key();

        let mut next = self.reports.clone();
        next.insert(key.as_str().to_string(), record);
        let data = serde_json::to_vec_pretty(&next).map_err(ReportStoreError::Encode)?;
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || {
            write_atomically(&path, &data).map_err(|e| ReportStoreError::Write(path.clone(), e))
        })
        .await??;
        info!("Saved report {} to {}", key.as_str(), self.path.display());

        self.reports = next;
        Ok(&self.reports[key.as_str()])
    }
}
