//! End-to-end run: fetch, aggregate, persist.

use crate::analysis::{
    attribute_text, bucket_small, count_list_memberships, extract_birth_year, group_and_count,
    normalize_course_name, normalize_institution_name, DEFAULT_BUCKET_LABEL,
    DEFAULT_BUCKET_THRESHOLD,
};
use crate::error::PipelineError;
use crate::fetch::{PageSource, PaginatedFetcher};
use crate::models::{Datasets, OutputDocument, RawRecord, Totals};
use crate::report;
use chrono::{DateTime, SubsecRound, Utc};
use std::path::PathBuf;
use tracing::info;

/// How records are turned into datasets.
#[derive(Debug, Clone)]
pub struct DatasetOptions {
    pub bucket_threshold: u64,
    pub bucket_label: String,
    pub institution_attribute: String,
    pub course_attribute: String,
    pub birth_date_attribute: String,
}

impl Default for DatasetOptions {
    fn default() -> Self {
        Self {
            bucket_threshold: DEFAULT_BUCKET_THRESHOLD,
            bucket_label: DEFAULT_BUCKET_LABEL.to_string(),
            institution_attribute: "ATENEO".to_string(),
            course_attribute: "CORSO_ACQUISTATO".to_string(),
            birth_date_attribute: "DATA_DI_NASCITA".to_string(),
        }
    }
}

/// Where and how the artifact is written.
#[derive(Debug, Clone)]
pub struct OutputOptions {
    pub path: PathBuf,
    pub pretty: bool,
}

/// Derive the four public datasets from fetched records.
pub fn build_document(
    records: &[RawRecord],
    options: &DatasetOptions,
    generated_at: DateTime<Utc>,
) -> OutputDocument {
    let text_of = |record: &RawRecord, name: &str| record.attribute(name).and_then(attribute_text);

    let per_lista_ids = count_list_memberships(records);

    let institutions = group_and_count(records, |record| {
        text_of(record, &options.institution_attribute)
            .and_then(|raw| normalize_institution_name(&raw))
    });

    let courses = group_and_count(records, |record| {
        text_of(record, &options.course_attribute).and_then(|raw| normalize_course_name(&raw))
    });

    let birth_years = group_and_count(records, |record| {
        text_of(record, &options.birth_date_attribute)
            .and_then(|raw| extract_birth_year(&raw))
            .map(|year| year.to_string())
    });

    OutputDocument {
        generated_at,
        totals: Totals {
            contacts: records.len() as u64,
        },
        datasets: Datasets {
            per_lista_ids,
            distribuzione_atenei: bucket_small(
                institutions,
                options.bucket_threshold,
                &options.bucket_label,
            ),
            distribuzione_corsi: bucket_small(
                courses,
                options.bucket_threshold,
                &options.bucket_label,
            ),
            distribuzione_anno_nascita: birth_years,
        },
    }
}

/// Runs the whole digest once.
///
/// Not re-entrant: two runs against the same output path must be
/// serialized by the caller.
pub struct PipelineRunner<S> {
    fetcher: PaginatedFetcher<S>,
    datasets: DatasetOptions,
    output: OutputOptions,
}

impl<S: PageSource> PipelineRunner<S> {
    pub fn new(fetcher: PaginatedFetcher<S>, datasets: DatasetOptions, output: OutputOptions) -> Self {
        Self {
            fetcher,
            datasets,
            output,
        }
    }

    /// Fetch and aggregate without writing anything.
    pub async fn collect(&self) -> Result<OutputDocument, PipelineError> {
        info!("Downloading contacts...");
        let records = self.fetcher.fetch_all().await?;
        info!("Downloaded {} contacts", records.len());

        // The artifact carries milliseconds only.
        let document = build_document(&records, &self.datasets, Utc::now().trunc_subsecs(3));
        // Records go out of scope here; only aggregates survive.
        drop(records);

        Ok(document)
    }

    /// Fetch, aggregate and replace the artifact.
    ///
    /// Either the full document is persisted or the previous artifact is
    /// left untouched.
    pub async fn run(&self) -> Result<OutputDocument, PipelineError> {
        let document = self.collect().await?;
        report::write_document(&document, &self.output.path, self.output.pretty)?;
        info!("Wrote {}", self.output.path.display());
        Ok(document)
    }
}
