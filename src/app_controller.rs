use anyhow::{Context, Result, anyhow};
use indicatif::{ProgressBar, ProgressStyle};
use log::{info, warn};
use std::collections::HashSet;

use crate::app_config::Config;
use crate::corpus::extractor;
use crate::file_utils::FileManager;
use crate::pipeline::{RunSummary, SyncOrchestrator, Violation, ViolationKind, verifier};
use crate::translation::TranslationService;

// @module: Application controller wiring the pipeline stages together

/// Combined outcome of one invocation across the selected locales
#[derive(Debug, Default)]
pub struct SyncOutcome {
    /// Per-locale run summaries (empty in verify-only mode)
    pub summaries: Vec<RunSummary>,

    /// Verifier violations, tagged with their locale
    pub violations: Vec<(String, Violation)>,
}

impl SyncOutcome {
    /// Whether every unit in scope ended ok/done with no violations left
    pub fn is_clean(&self) -> bool {
        self.summaries.iter().all(|s| s.is_clean()) && self.violations.is_empty()
    }
}

/// Main application controller for corpus synchronization
pub struct Controller {
    // @field: App configuration
    config: Config,
}

impl Controller {
    /// Create a new controller for test purposes with default configuration
    pub fn new_for_test() -> Result<Self> {
        Self::with_config(Config::default())
    }

    // @method: Create a new controller with the given configuration
    pub fn with_config(config: Config) -> Result<Self> {
        Ok(Self { config })
    }

    /// Check if the controller is properly initialized with configuration
    pub fn is_initialized(&self) -> bool {
        !self.config.source_language.is_empty() && !self.config.target_locales.is_empty()
    }

    /// Resolve the locale selector against the configured target locales
    fn resolve_locales(&self, selector: Option<&str>) -> Result<Vec<String>> {
        match selector {
            Some(locale) => {
                let locale = crate::language_utils::validate_locale_code(locale)?;
                if !self.config.target_locales.iter().any(|l| l == &locale) {
                    warn!(
                        "Locale '{}' is not in the configured target list, syncing it anyway",
                        locale
                    );
                }
                Ok(vec![locale])
            }
            None => {
                if self.config.target_locales.is_empty() {
                    return Err(anyhow!("No target locales configured"));
                }
                Ok(self.config.target_locales.clone())
            }
        }
    }

    /// Warn about corpus files in the locales directory that belong to no
    /// configured locale; they would silently drift forever otherwise.
    fn warn_orphan_locale_files(&self, locales: &[String]) {
        let corpus = &self.config.corpus;
        if !FileManager::dir_exists(&corpus.locales_dir) {
            return;
        }
        let Ok(files) = FileManager::find_files(&corpus.locales_dir, &corpus.extension) else {
            return;
        };
        for file in files {
            if file == corpus.source_file {
                continue;
            }
            let Some(stem) = file.file_stem().map(|s| s.to_string_lossy().to_string()) else {
                continue;
            };
            if !locales.iter().any(|l| l == &stem) {
                warn!(
                    "Corpus file {} matches no configured target locale",
                    file.display()
                );
            }
        }
    }

    /// Number of parsed records in the source corpus, for progress sizing
    fn source_record_count(&self) -> Result<u64> {
        let source = extractor::extract_file(
            &self.config.corpus.source_file,
            &self.config.source_language,
        )?;
        Ok(source.record_count() as u64)
    }

    fn make_progress_bar(&self, total: u64, locale: &str) -> ProgressBar {
        let bar = ProgressBar::new(total);
        let style = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} records ({percent}%) {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        bar.set_style(style.progress_chars("█▓▒░"));
        bar.set_message(format!("Syncing {}", locale));
        bar
    }

    /// Run the synchronization pipeline for the selected locales.
    ///
    /// Each locale gets one sync pass followed by an independent
    /// verification pass from disk. With `fix_only`, only broken records
    /// are in scope and verifier findings trigger one re-translation pass.
    pub async fn run_sync(&self, locale: Option<&str>, fix_only: bool) -> Result<SyncOutcome> {
        let locales = self.resolve_locales(locale)?;
        self.warn_orphan_locale_files(&self.config.target_locales);
        let service = TranslationService::new(&self.config)?;

        // A dead provider is not fatal: every unit would fall back and be
        // flagged, but the operator almost certainly wants to know now.
        if let Err(e) = service.test_connection().await {
            warn!("{} - failed units will fall back to source text", e);
        }

        let orchestrator = SyncOrchestrator::new(&self.config, &service);
        let total = self.source_record_count()?;
        let mut outcome = SyncOutcome::default();

        for locale in &locales {
            info!(
                "Synchronizing locale '{}' from {}",
                locale,
                self.config.corpus.source_file.display()
            );

            let bar = self.make_progress_bar(total, locale);
            let summary = orchestrator.sync_locale(locale, fix_only, Some(&bar)).await?;
            bar.finish_and_clear();

            let mut violations = self.verify_locale(locale)?;

            // Fix mode: one re-translation pass over fixable findings
            if fix_only && !violations.is_empty() {
                let fixable: HashSet<String> = violations
                    .iter()
                    .filter(|v| {
                        matches!(
                            v.kind,
                            ViolationKind::MissingInTarget
                                | ViolationKind::OptionCountMismatch
                                | ViolationKind::CorrectIndexOutOfRange
                        )
                    })
                    .map(|v| v.id.clone())
                    .collect();

                if !fixable.is_empty() {
                    info!(
                        "Fix pass: re-translating {} flagged record(s) for '{}'",
                        fixable.len(),
                        locale
                    );
                    let fix_bar = self.make_progress_bar(fixable.len() as u64, locale);
                    let fix_summary = orchestrator
                        .resync_records(locale, &fixable, Some(&fix_bar))
                        .await?;
                    fix_bar.finish_and_clear();
                    outcome.summaries.push(fix_summary);
                    violations = self.verify_locale(locale)?;
                }
            }

            for violation in &violations {
                warn!("Verifier [{}] {}", locale, violation);
            }
            outcome
                .violations
                .extend(violations.into_iter().map(|v| (locale.clone(), v)));
            outcome.summaries.push(summary);
        }

        self.log_outcome(&outcome);
        Ok(outcome)
    }

    /// Verify the selected locales without writing anything
    pub fn run_verify(&self, locale: Option<&str>) -> Result<SyncOutcome> {
        let locales = self.resolve_locales(locale)?;
        self.warn_orphan_locale_files(&self.config.target_locales);
        let mut outcome = SyncOutcome::default();

        for locale in &locales {
            info!("Verifying locale '{}'", locale);
            let violations = self.verify_locale(locale)?;
            for violation in &violations {
                warn!("Verifier [{}] {}", locale, violation);
            }
            outcome
                .violations
                .extend(violations.into_iter().map(|v| (locale.clone(), v)));
        }

        self.log_outcome(&outcome);
        Ok(outcome)
    }

    /// Run the verifier for one locale
    fn verify_locale(&self, locale: &str) -> Result<Vec<Violation>> {
        let source_path = &self.config.corpus.source_file;
        let target_path = self.config.corpus.target_file(locale);

        if !FileManager::file_exists(source_path) {
            return Err(anyhow!(
                "Source corpus does not exist: {}",
                source_path.display()
            ));
        }

        verifier::verify_files(
            source_path,
            &target_path,
            &self.config.source_language,
            locale,
        )
        .with_context(|| format!("Verification failed for locale '{}'", locale))
    }

    /// Final run report: counts by kind, nothing silently dropped
    fn log_outcome(&self, outcome: &SyncOutcome) {
        for summary in &outcome.summaries {
            info!("{}", summary.report());
        }
        if outcome.violations.is_empty() {
            info!("Verifier: no structural violations");
        } else {
            warn!(
                "Verifier: {} structural violation(s) remain",
                outcome.violations.len()
            );
        }
        if outcome.is_clean() {
            info!("All records in scope are in sync");
        } else {
            warn!("Run finished with unresolved records, see warnings above");
        }
    }
}
