//! Classification stage: `raw_publications.csv` in, per-row DRIC verdicts out.
//!
//! # Flow
//!
//! For each publication, strictly one after another:
//!
//! 1. Resolve its citation page to an article URL ([`LinkResolver`]).
//!    Unresolved rows are `NF` and cost no service calls.
//! 2. Fetch the article text ([`FetchSession`]). Empty text is `NF`.
//! 3. Ask the model ([`ClassifySession`]) for `YES` / `NO`.
//!
//! Row-level failures never abort the run; only missing input or an unusable
//! output directory do, and both are checked before the browser starts.

use crate::browser::Browser;
use crate::classify::ClassifySession;
use crate::config::PipelineConfig;
use crate::error::Error;
use crate::fetch::FetchSession;
use crate::inputs::read_publications;
use crate::models::{DricRecord, Period, Publication, Verdict};
use crate::outputs::write_records;
use crate::scrapers::citation::{LinkResolver, Resolution};
use crate::utils::{ensure_writable_dir, truncate_for_log};
use std::path::PathBuf;
use tracing::{info, instrument, warn};

/// Count of each verdict in a finished run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Tally {
    pub yes: usize,
    pub no: usize,
    pub not_found: usize,
}

impl Tally {
    pub fn from_records(records: &[DricRecord]) -> Self {
        records.iter().fold(Self::default(), |mut tally, record| {
            match record.dric {
                Verdict::Yes => tally.yes += 1,
                Verdict::No => tally.no += 1,
                Verdict::NotFound => tally.not_found += 1,
            }
            tally
        })
    }
}

/// Per-run state: the link resolver plus both service sessions and their caches.
pub struct RowPipeline {
    resolver: LinkResolver,
    fetcher: FetchSession,
    classifier: ClassifySession,
}

impl RowPipeline {
    pub fn new(resolver: LinkResolver, fetcher: FetchSession, classifier: ClassifySession) -> Self {
        Self {
            resolver,
            fetcher,
            classifier,
        }
    }

    #[instrument(level = "info", skip_all, fields(title = %truncate_for_log(&publication.title, 60)))]
    pub async fn process_row(&mut self, browser: &dyn Browser, publication: &Publication) -> DricRecord {
        let article_url = match self.resolver.resolve(browser, &publication.scholar_link).await {
            Resolution::Resolved(url) => url,
            Resolution::NotFound => {
                warn!(link = %publication.scholar_link, "Could not resolve article link");
                return DricRecord::new(publication, Verdict::NotFound);
            }
        };

        let text = self.fetcher.fetch(&article_url).await;
        if text.is_empty() {
            warn!(url = %article_url, "Empty article text");
            return DricRecord::new(publication, Verdict::NotFound);
        }
        info!(
            chars = text.len(),
            words = text.split_whitespace().count(),
            "Fetched article text"
        );

        let verdict = self.classifier.classify(&text).await;
        info!(%verdict, "Row classified");
        DricRecord::new(publication, verdict)
    }

    /// Process `publications` in order on `browser`.
    pub async fn process_all(&mut self, browser: &dyn Browser, publications: &[Publication]) -> Vec<DricRecord> {
        let mut records = Vec::with_capacity(publications.len());
        for (i, publication) in publications.iter().enumerate() {
            info!(row = i + 1, of = publications.len(), "Processing row");
            records.push(self.process_row(browser, publication).await);
        }
        records
    }
}

/// One classification run for one period.
#[derive(Debug)]
pub struct Classification {
    pub period: Period,
    pub publications: Vec<Publication>,
    pub output: PathBuf,
}

impl Classification {
    /// Load the discovered publications and check the output directory.
    #[instrument(level = "info", skip_all, fields(%period_label))]
    pub async fn prepare(period_label: &str, config: &PipelineConfig) -> Result<Self, Error> {
        let period = Period::parse(period_label)?;
        let publications = read_publications(&config.raw_publications_file(period_label))?;
        ensure_writable_dir(&config.preprocessed_dir(period_label)).await?;
        Ok(Self {
            period,
            publications,
            output: config.preprocessed_file(period_label),
        })
    }

    /// Classify every row, close `browser`, then write the output table.
    #[instrument(level = "info", skip_all, fields(period = %self.period, rows = self.publications.len()))]
    pub async fn run(&self, pipeline: &mut RowPipeline, browser: &dyn Browser) -> Result<Vec<DricRecord>, Error> {
        let records = pipeline.process_all(browser, &self.publications).await;
        if let Err(e) = browser.close().await {
            warn!(error = %e, "Closing browser failed");
        }

        write_records(&self.output, &records).await?;
        let tally = Tally::from_records(&records);
        info!(
            yes = tally.yes,
            no = tally.no,
            nf = tally.not_found,
            path = %self.output.display(),
            "Classification finished"
        );
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::testing::{FakeBrowser, FakeCounters, FakeSite};
    use crate::config::ServiceLimits;
    use crate::scrapers::citation::TITLE_LINK;
    use crate::testing::{Calls, FakeExtractor, FakeModel, count};
    use serde_json::json;

    const CITATION: &str = "https://scholar.google.com/citations?view_op=view_citation&citation_for_view=u1";
    const ORPHAN: &str = "https://scholar.google.com/citations?view_op=view_citation&citation_for_view=u2";
    const ARTICLE: &str = "https://journals.example.org/article/77";
    const REPRINT_CITATION: &str = "https://scholar.google.com/citations?view_op=view_citation&citation_for_view=u3";
    const REPRINT: &str = "https://ir.example.edu/bitstream/77/reprint.html";

    fn publication(title: &str, link: &str) -> Publication {
        Publication {
            authors: "K Boateng".into(),
            title: title.into(),
            year: "2020".into(),
            scholar_link: link.into(),
        }
    }

    struct Harness {
        pipeline: RowPipeline,
        browser: FakeBrowser,
        fetches: Calls,
        asks: Calls,
    }

    fn harness(article_body: serde_json::Value, reply: &str) -> Harness {
        let site = FakeSite::default()
            .with_link(CITATION, TITLE_LINK, ARTICLE)
            .with_link(REPRINT_CITATION, TITLE_LINK, REPRINT);
        let (extractor, fetches) =
            FakeExtractor::new(&[(ARTICLE, article_body.clone()), (REPRINT, article_body)]);
        let (model, asks) = FakeModel::new(reply);
        let config = PipelineConfig::default();
        let pipeline = RowPipeline::new(
            LinkResolver::new(&config.portal_host_marker, &config.repository_handle_marker),
            FetchSession::new(Box::new(extractor), ServiceLimits::FETCH),
            ClassifySession::new(Box::new(model), ServiceLimits::CLASSIFY),
        );
        Harness {
            pipeline,
            browser: FakeBrowser::new(site),
            fetches,
            asks,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_unresolved_row_is_nf_without_service_calls() {
        let mut h = harness(json!({"markdown": "Funded by DRIC."}), "YES");

        let record = h.pipeline.process_row(&h.browser, &publication("Orphan", ORPHAN)).await;

        assert_eq!(record.dric, Verdict::NotFound);
        assert_eq!(count(&h.fetches), 0);
        assert_eq!(count(&h.asks), 0);
        assert_eq!(FakeCounters::get(&h.browser.counters.closed), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_resolved_row_is_classified() {
        let mut h = harness(json!({"markdown": "We thank DRIC, UCC for funding."}), "YES");

        let record = h.pipeline.process_row(&h.browser, &publication("Soil", CITATION)).await;

        assert_eq!(record.dric, Verdict::Yes);
        assert_eq!(record.title, "Soil");
        assert_eq!(count(&h.fetches), 1);
        assert_eq!(count(&h.asks), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_article_is_nf_without_model_call() {
        let mut h = harness(json!({"metadata": {"statusCode": 403}}), "YES");

        let record = h.pipeline.process_row(&h.browser, &publication("Paywalled", CITATION)).await;

        assert_eq!(record.dric, Verdict::NotFound);
        assert_eq!(count(&h.fetches), 1);
        assert_eq!(count(&h.asks), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_same_link_is_fetched_once() {
        let mut h = harness(json!({"markdown": "No acknowledgements."}), "NO");
        let rows = vec![publication("First", CITATION), publication("Again", CITATION)];

        let records = h.pipeline.process_all(&h.browser, &rows).await;

        assert_eq!(
            records.iter().map(|r| r.dric).collect::<Vec<_>>(),
            vec![Verdict::No, Verdict::No]
        );
        assert_eq!(count(&h.fetches), 1);
        assert_eq!(count(&h.asks), 1);
        assert_eq!(FakeCounters::get(&h.browser.counters.opened), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_identical_text_at_two_urls_is_classified_once() {
        let mut h = harness(json!({"markdown": "Supported by DRIC, University of Cape Coast."}), "YES");
        let rows = vec![publication("Journal version", CITATION), publication("Repository copy", REPRINT_CITATION)];

        let records = h.pipeline.process_all(&h.browser, &rows).await;

        assert_eq!(
            records.iter().map(|r| r.dric).collect::<Vec<_>>(),
            vec![Verdict::Yes, Verdict::Yes]
        );
        assert_eq!(count(&h.fetches), 2);
        assert_eq!(count(&h.asks), 1);
    }

    #[test]
    fn test_tally() {
        let p = publication("x", CITATION);
        let records = vec![
            DricRecord::new(&p, Verdict::Yes),
            DricRecord::new(&p, Verdict::NotFound),
            DricRecord::new(&p, Verdict::NotFound),
        ];
        assert_eq!(
            Tally::from_records(&records),
            Tally { yes: 1, no: 0, not_found: 2 }
        );
    }

    fn config_in(dir: &tempfile::TempDir) -> PipelineConfig {
        PipelineConfig {
            data_dir: dir.path().to_path_buf(),
            ..PipelineConfig::default()
        }
    }

    #[tokio::test]
    async fn test_prepare_requires_discovery_output() {
        let dir = tempfile::tempdir().unwrap();
        let err = Classification::prepare("2020", &config_in(&dir)).await.unwrap_err();
        assert!(matches!(err, Error::Input(crate::error::InputError::NotFound(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_writes_verdicts_and_closes_browser() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(&dir);
        let rows = vec![publication("Soil", CITATION), publication("Orphan", ORPHAN)];
        crate::outputs::write_publications(&config.raw_publications_file("2020"), &rows)
            .await
            .unwrap();
        let job = Classification::prepare("2020", &config).await.unwrap();
        let mut h = harness(json!({"markdown": "Supported by DRIC."}), "YES");

        let records = job.run(&mut h.pipeline, &h.browser).await.unwrap();

        assert_eq!(
            records.iter().map(|r| r.dric).collect::<Vec<_>>(),
            vec![Verdict::Yes, Verdict::NotFound]
        );
        let written = std::fs::read_to_string(config.preprocessed_file("2020")).unwrap();
        assert_eq!(
            written,
            "authors,title,year,dric\nK Boateng,Soil,2020,YES\nK Boateng,Orphan,2020,NF\n"
        );
        assert_eq!(FakeCounters::get(&h.browser.counters.shutdowns), 1);
    }
}
