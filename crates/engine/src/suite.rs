use chrono::Utc;

use crate::error::SourceError;
use crate::model::{CasePair, CaseResult, PackReport, PackSpec, RunMode, SuiteReport};
use crate::score::score_case;

// ---------------------------------------------------------------------------
// Collaborator seam
// ---------------------------------------------------------------------------

/// Supplies the (expected, actual) records for a case. Implemented outside
/// the engine by fixture stores and live-extraction callers; anything that
/// blocks or fails lives behind this trait.
pub trait CaseSource {
    /// An `Err` skips the case with a warning; it never aborts the run.
    fn fetch(&mut self, pack_name: &str, case_id: &str) -> Result<CasePair, SourceError>;
}

// ---------------------------------------------------------------------------
// Pack run
// ---------------------------------------------------------------------------

/// Score every case in a pack. Cases whose records cannot be obtained are
/// skipped and excluded from the average.
pub fn run_pack(pack: &PackSpec, source: &mut dyn CaseSource, mode: RunMode) -> PackReport {
    let mut results: Vec<CaseResult> = Vec::new();
    let mut warnings: Vec<String> = Vec::new();

    for case_id in &pack.case_ids {
        match source.fetch(&pack.name, case_id) {
            Ok(pair) => {
                results.push(score_case(case_id, &pair.expected, &pair.actual, &pack.config));
            }
            Err(e) => warnings.push(format!("case '{case_id}' skipped: {e}")),
        }
    }

    let cases_skipped = pack.case_ids.len() - results.len();
    let cases_passed = results.iter().filter(|r| r.passed).count();
    let average_score = if results.is_empty() {
        0.0
    } else {
        results.iter().map(|r| r.score).sum::<f64>() / results.len() as f64
    };

    // A pack with nothing scored fails. In smoke mode every scored case
    // must pass on top of the average clearing the minimum.
    let passed = !results.is_empty()
        && average_score >= pack.config.minimum_score
        && (mode == RunMode::Full || cases_passed == results.len());

    PackReport {
        name: pack.name.clone(),
        version: pack.version.clone(),
        generated_at: Utc::now().to_rfc3339(),
        cases_total: results.len(),
        cases_passed,
        cases_failed: results.len() - cases_passed,
        cases_skipped,
        average_score,
        minimum_score: pack.config.minimum_score,
        passed,
        warnings,
        results,
    }
}

// ---------------------------------------------------------------------------
// Suite run
// ---------------------------------------------------------------------------

/// Score multiple packs and compose the suite verdict: the logical AND of
/// every pack verdict.
pub fn run_suite(packs: &[PackSpec], source: &mut dyn CaseSource, mode: RunMode) -> SuiteReport {
    let mut reports = Vec::with_capacity(packs.len());
    for pack in packs {
        if pack.validation_errors.is_empty() {
            reports.push(run_pack(pack, source, mode));
        } else {
            reports.push(failed_validation_report(pack));
        }
    }

    SuiteReport {
        generated_at: Utc::now().to_rfc3339(),
        engine_version: env!("CARGO_PKG_VERSION").to_string(),
        overall_passed: reports.iter().all(|r| r.passed),
        packs: reports,
    }
}

/// A pack that failed structural validation is reported failed without the
/// scoring engine ever seeing its cases.
fn failed_validation_report(pack: &PackSpec) -> PackReport {
    PackReport {
        name: pack.name.clone(),
        version: pack.version.clone(),
        generated_at: Utc::now().to_rfc3339(),
        cases_total: 0,
        cases_passed: 0,
        cases_failed: 0,
        cases_skipped: pack.case_ids.len(),
        average_score: 0.0,
        minimum_score: pack.config.minimum_score,
        passed: false,
        warnings: pack
            .validation_errors
            .iter()
            .map(|e| format!("validation: {e}"))
            .collect(),
        results: Vec::new(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::collections::{BTreeMap, BTreeSet};

    use serde_json::json;

    use super::*;
    use crate::config::EvalConfig;

    /// In-memory source keyed by "pack/case". Ids listed in `fail` error
    /// out; every fetch is counted.
    struct MapSource {
        cases: BTreeMap<String, CasePair>,
        fail: BTreeSet<String>,
        fetches: usize,
    }

    impl MapSource {
        fn new() -> Self {
            Self {
                cases: BTreeMap::new(),
                fail: BTreeSet::new(),
                fetches: 0,
            }
        }

        fn insert(&mut self, pack: &str, case_id: &str, pair: CasePair) {
            self.cases.insert(format!("{pack}/{case_id}"), pair);
        }
    }

    impl CaseSource for MapSource {
        fn fetch(&mut self, pack_name: &str, case_id: &str) -> Result<CasePair, SourceError> {
            self.fetches += 1;
            if self.fail.contains(case_id) {
                return Err(SourceError(format!("fixture missing for '{case_id}'")));
            }
            self.cases
                .get(&format!("{pack_name}/{case_id}"))
                .cloned()
                .ok_or_else(|| SourceError(format!("no recorded output for '{case_id}'")))
        }
    }

    fn pack(name: &str, case_ids: &[&str]) -> PackSpec {
        PackSpec {
            name: name.into(),
            version: "1.0.0".into(),
            config: EvalConfig::default(),
            case_ids: case_ids.iter().map(|s| s.to_string()).collect(),
            validation_errors: Vec::new(),
        }
    }

    fn perfect_pair() -> CasePair {
        let record = json!({"invoice_number": "INV-1", "total": 99.5});
        CasePair {
            expected: record.clone(),
            actual: record,
        }
    }

    /// Scores 0.7 under default weights: one exact field, one complete miss.
    fn failing_pair() -> CasePair {
        CasePair {
            expected: json!({"a": "x", "b": "y"}),
            actual: json!({"a": "x", "b": "z"}),
        }
    }

    #[test]
    fn pack_with_all_passing_cases() {
        let mut source = MapSource::new();
        source.insert("inv", "c1", perfect_pair());
        source.insert("inv", "c2", perfect_pair());

        let report = run_pack(&pack("inv", &["c1", "c2"]), &mut source, RunMode::Smoke);
        assert_eq!(report.cases_total, 2);
        assert_eq!(report.cases_passed, 2);
        assert_eq!(report.cases_failed, 0);
        assert_eq!(report.cases_skipped, 0);
        assert_eq!(report.average_score, 1.0);
        assert!(report.passed);
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn collaborator_failure_skips_case_and_continues() {
        let mut source = MapSource::new();
        source.insert("inv", "c1", perfect_pair());
        source.insert("inv", "c3", perfect_pair());
        source.fail.insert("c2".into());

        let report = run_pack(&pack("inv", &["c1", "c2", "c3"]), &mut source, RunMode::Smoke);
        // Skipped case excluded from both numerator and denominator.
        assert_eq!(report.cases_total, 2);
        assert_eq!(report.cases_skipped, 1);
        assert_eq!(report.average_score, 1.0);
        assert!(report.passed);
        assert_eq!(report.warnings.len(), 1);
        assert!(report.warnings[0].contains("'c2'"));
        assert!(report.warnings[0].contains("fixture missing"));
    }

    #[test]
    fn pack_with_nothing_scored_fails() {
        let mut source = MapSource::new();
        source.fail.insert("c1".into());

        let report = run_pack(&pack("inv", &["c1"]), &mut source, RunMode::Full);
        assert_eq!(report.cases_total, 0);
        assert_eq!(report.cases_skipped, 1);
        assert_eq!(report.average_score, 0.0);
        assert!(!report.passed);
    }

    #[test]
    fn smoke_mode_requires_every_case_to_pass() {
        let mut source = MapSource::new();
        source.insert("inv", "good", perfect_pair());
        source.insert("inv", "bad", failing_pair());
        let spec = pack("inv", &["good", "bad"]);

        // Average (1.0 + 0.7) / 2 = 0.85 clears the 0.80 minimum, but one
        // case failed.
        let smoke = run_pack(&spec, &mut source, RunMode::Smoke);
        assert!((smoke.average_score - 0.85).abs() < 1e-12);
        assert_eq!(smoke.cases_failed, 1);
        assert!(!smoke.passed);

        let full = run_pack(&spec, &mut source, RunMode::Full);
        assert!(full.passed);
        assert_eq!(full.results.len(), 2);
    }

    #[test]
    fn invalid_pack_fails_without_scoring() {
        let mut source = MapSource::new();
        source.insert("inv", "c1", perfect_pair());

        let mut spec = pack("inv", &["c1"]);
        spec.validation_errors = vec!["missing schema file".into()];

        let suite = run_suite(&[spec], &mut source, RunMode::Smoke);
        assert_eq!(source.fetches, 0);
        assert!(!suite.overall_passed);
        let report = &suite.packs[0];
        assert!(!report.passed);
        assert_eq!(report.cases_total, 0);
        assert_eq!(report.cases_skipped, 1);
        assert_eq!(report.warnings, vec!["validation: missing schema file"]);
    }

    #[test]
    fn suite_verdict_is_and_of_pack_verdicts() {
        let mut source = MapSource::new();
        source.insert("alpha", "c1", perfect_pair());
        source.insert("beta", "c1", failing_pair());

        let suite = run_suite(
            &[pack("alpha", &["c1"]), pack("beta", &["c1"])],
            &mut source,
            RunMode::Smoke,
        );
        assert!(suite.packs[0].passed);
        assert!(!suite.packs[1].passed);
        assert!(!suite.overall_passed);
    }

    #[test]
    fn suite_of_passing_packs_passes() {
        let mut source = MapSource::new();
        source.insert("alpha", "c1", perfect_pair());
        source.insert("beta", "c1", perfect_pair());

        let suite = run_suite(
            &[pack("alpha", &["c1"]), pack("beta", &["c1"])],
            &mut source,
            RunMode::Full,
        );
        assert!(suite.overall_passed);
        assert_eq!(suite.engine_version, env!("CARGO_PKG_VERSION"));
        assert!(!suite.generated_at.is_empty());
    }
}
