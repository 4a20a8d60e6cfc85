// std imports
use std::fmt;

// 3rd party imports
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

// internal imports
use crate::errors::stat_test_error::StatTestError;
use crate::profile::{ProfileRegistry, StatTestProfile};

/// Outcome of comparing the p-value against the significance level
///
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Decision {
    Reject,
    FailToReject,
}

impl Decision {
    /// The null hypothesis is kept iff `pvalue > alpha`
    ///
    pub fn from_pvalue(pvalue: f64, alpha: f64) -> Self {
        if pvalue > alpha {
            Self::FailToReject
        } else {
            Self::Reject
        }
    }

    pub fn is_rejected(&self) -> bool {
        matches!(self, Self::Reject)
    }
}

/// Checks that the significance level lies in (0, 1)
///
pub fn validate_alpha(alpha: f64) -> Result<f64, StatTestError> {
    if alpha > 0.0 && alpha < 1.0 {
        Ok(alpha)
    } else {
        error!("Invalid significance level {}", alpha);
        Err(StatTestError::InvalidAlpha(alpha))
    }
}

/// Formats the p-value following APA style, 7th edition
///
pub fn report_pvalue(pvalue: f64) -> String {
    if pvalue < 0.001 {
        "p<.001".to_string()
    } else {
        format!("p={:.3}", pvalue)
    }
}

/// Significance level as percentage, e.g. `5` or `2.5`
///
pub fn alpha_percent(alpha: f64) -> String {
    format!("{}", (alpha * 1e4).round() / 100.0)
}

pub fn report_alpha(alpha: f64) -> String {
    format!("significant at {}%.", alpha_percent(alpha))
}

/// First sentence of every inference, stating the decision
///
pub fn decision_sentence(pvalue: f64, alpha: f64, decision: Decision) -> String {
    let (comparison, outcome) = match decision {
        Decision::FailToReject => ("greater than", "is not rejected"),
        Decision::Reject => ("less than", "is rejected"),
    };
    format!(
        "The pvalue {:.2} is {} level of significance {}%; therefore, the null hypothesis {}.",
        pvalue,
        comparison,
        alpha_percent(alpha),
        outcome
    )
}

/// Loads the profile of a test, logging failures under the test id
///
pub(crate) fn load_test_profile(
    registry: &ProfileRegistry,
    id: &str,
) -> Result<StatTestProfile, StatTestError> {
    let profile = registry.create(id).map_err(|err| {
        error!("[{}] Unable to load profile: {}", id, err);
        err
    })?;
    debug!("[{}] Profile loaded", id);
    Ok(profile)
}

/// Logs the error under the test id before it is returned
///
pub(crate) fn log_error<E: Into<StatTestError>>(
    id: &'static str,
) -> impl FnOnce(E) -> StatTestError {
    move |err| {
        let err = err.into();
        error!("[{}] {}", id, err);
        err
    }
}

/// Common outcome of a statistical test.
/// Statistic, p-value and inference are always set together, see [StatTestResult::new].
/// Deserialized records are rejected unless their decision follows from p-value and alpha.
///
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawStatTestResult")]
pub struct StatTestResult {
    test: String,
    hypothesis: Option<String>,
    #[serde(rename = "H0")]
    h0: Option<String>,
    statistic: String,
    value: f64,
    pvalue: f64,
    alpha: f64,
    decision: Decision,
    result: String,
    inference: String,
    interpretation: Option<String>,
}

/// Unchecked serialized form of [StatTestResult]
///
#[derive(Deserialize)]
struct RawStatTestResult {
    test: String,
    hypothesis: Option<String>,
    #[serde(rename = "H0")]
    h0: Option<String>,
    statistic: String,
    value: f64,
    pvalue: f64,
    alpha: f64,
    decision: Decision,
    result: String,
    inference: String,
    interpretation: Option<String>,
}

impl TryFrom<RawStatTestResult> for StatTestResult {
    type Error = StatTestError;

    fn try_from(raw: RawStatTestResult) -> Result<Self, Self::Error> {
        let alpha = validate_alpha(raw.alpha)?;
        if !(0.0..=1.0).contains(&raw.pvalue) {
            return Err(StatTestError::InvalidPValue(raw.pvalue));
        }
        if Decision::from_pvalue(raw.pvalue, alpha) != raw.decision {
            return Err(StatTestError::InconsistentDecision(
                format!("{:?}", raw.decision),
                raw.pvalue,
                alpha,
            ));
        }
        Ok(Self {
            test: raw.test,
            hypothesis: raw.hypothesis,
            h0: raw.h0,
            statistic: raw.statistic,
            value: raw.value,
            pvalue: raw.pvalue,
            alpha,
            decision: raw.decision,
            result: raw.result,
            inference: raw.inference,
            interpretation: raw.interpretation,
        })
    }
}

impl StatTestResult {
    /// Creates a new result, the inference is built from the decision for `pvalue` at `alpha`.
    ///
    /// # Arguments
    /// * `profile` - Profile of the test
    /// * `statistic` - Symbol of the test statistic
    /// * `value` - Value of the test statistic
    /// * `pvalue` - P-value
    /// * `alpha` - Significance level
    /// * `result` - APA style report
    /// * `describe` - Builds the inference for the decision
    ///
    pub fn new<F>(
        profile: &StatTestProfile,
        statistic: &str,
        value: f64,
        pvalue: f64,
        alpha: f64,
        result: String,
        describe: F,
    ) -> Self
    where
        F: FnOnce(Decision) -> String,
    {
        let decision = Decision::from_pvalue(pvalue, alpha);
        Self {
            test: profile.name_or_id().to_string(),
            hypothesis: profile.hypothesis.clone(),
            h0: profile.h0.clone(),
            statistic: statistic.to_string(),
            value,
            pvalue,
            alpha,
            decision,
            result,
            inference: describe(decision),
            interpretation: None,
        }
    }

    /// Sets a note on the validity of the test
    ///
    pub fn with_interpretation(mut self, interpretation: Option<String>) -> Self {
        self.interpretation = interpretation;
        self
    }

    pub fn get_test(&self) -> &str {
        &self.test
    }

    pub fn get_hypothesis(&self) -> Option<&str> {
        self.hypothesis.as_deref()
    }

    /// Returns the null hypothesis
    ///
    pub fn get_h0(&self) -> Option<&str> {
        self.h0.as_deref()
    }

    /// Returns the symbol of the test statistic
    ///
    pub fn get_statistic(&self) -> &str {
        &self.statistic
    }

    /// Returns the value of the test statistic
    ///
    pub fn get_value(&self) -> f64 {
        self.value
    }

    pub fn get_pvalue(&self) -> f64 {
        self.pvalue
    }

    pub fn get_alpha(&self) -> f64 {
        self.alpha
    }

    pub fn get_decision(&self) -> Decision {
        self.decision
    }

    /// Returns the APA style report
    ///
    pub fn get_result(&self) -> &str {
        &self.result
    }

    pub fn get_inference(&self) -> &str {
        &self.inference
    }

    pub fn get_interpretation(&self) -> Option<&str> {
        self.interpretation.as_deref()
    }
}

/// Writes one right aligned `key | value` row
///
pub(crate) fn write_row(
    f: &mut fmt::Formatter,
    key: &str,
    value: impl fmt::Display,
) -> fmt::Result {
    writeln!(f, "{:>32} | {}", key, value)
}

impl fmt::Display for StatTestResult {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "{:^64}", self.test)?;
        if let Some(hypothesis) = &self.hypothesis {
            write_row(f, "hypothesis", hypothesis)?;
        }
        if let Some(h0) = &self.h0 {
            write_row(f, "H0", h0)?;
        }
        write_row(f, "statistic", &self.statistic)?;
        write_row(f, "value", self.value)?;
        write_row(f, "pvalue", self.pvalue)?;
        write_row(f, "alpha", self.alpha)?;
        write_row(f, "result", self.result.replace('\n', "; "))?;
        write_row(f, "inference", self.inference.replace('\n', " "))?;
        if let Some(interpretation) = &self.interpretation {
            write_row(f, "interpretation", interpretation)?;
        }
        Ok(())
    }
}

/// Statistical test which is configured at construction and run without further input.
///
pub trait StatisticalTest {
    type Output;

    /// Id of the test profile
    const ID: &'static str;

    /// Profile loaded at construction
    ///
    fn profile(&self) -> &StatTestProfile;

    /// Result of the last run, `None` until the test was run
    ///
    fn result(&self) -> Option<&Self::Output>;

    /// Runs the test and replaces the stored result
    ///
    fn run(&mut self) -> Result<&Self::Output, StatTestError>;
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::profile::load_profile;

    fn describe(decision: Decision) -> String {
        match decision {
            Decision::Reject => "rejected".to_string(),
            Decision::FailToReject => "kept".to_string(),
        }
    }

    #[test]
    fn test_inference_follows_pvalue() {
        let profile = load_profile("x2gof").unwrap();
        let kept = StatTestResult::new(&profile, "X²", 1.0, 0.5, 0.05, String::new(), describe);
        let rejected =
            StatTestResult::new(&profile, "X²", 9.0, 0.01, 0.05, String::new(), describe);
        assert_eq!(kept.get_decision(), Decision::FailToReject);
        assert_eq!(rejected.get_decision(), Decision::Reject);
        assert_ne!(kept.get_inference(), rejected.get_inference());
        assert_eq!(kept.get_test(), profile.name_or_id());
        assert_eq!(kept.get_h0(), profile.h0.as_deref());
    }

    #[test]
    fn test_deserialize_checks_decision() {
        let profile = load_profile("x2gof").unwrap();
        let kept = StatTestResult::new(&profile, "X²", 1.0, 0.5, 0.05, String::new(), describe);
        let json = serde_json::to_string(&kept).unwrap();
        let restored: StatTestResult = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, kept);

        let tampered = json.replace("\"FailToReject\"", "\"Reject\"");
        assert_ne!(tampered, json);
        assert!(serde_json::from_str::<StatTestResult>(&tampered)
            .unwrap_err()
            .to_string()
            .contains("does not follow from p-value"));

        let tampered = json.replace("\"pvalue\":0.5", "\"pvalue\":1.5");
        assert!(serde_json::from_str::<StatTestResult>(&tampered).is_err());
        let tampered = json.replace("\"alpha\":0.05", "\"alpha\":0.0");
        assert!(serde_json::from_str::<StatTestResult>(&tampered).is_err());
    }

    #[test]
    fn test_decision_boundary() {
        assert_eq!(Decision::from_pvalue(0.05, 0.05), Decision::Reject);
        assert_eq!(Decision::from_pvalue(0.050_000_1, 0.05), Decision::FailToReject);
    }

    #[test]
    fn test_decision_sentence() {
        assert_eq!(
            decision_sentence(0.5, 0.05, Decision::FailToReject),
            "The pvalue 0.50 is greater than level of significance 5%; therefore, the null hypothesis is not rejected."
        );
        assert_eq!(
            decision_sentence(0.012, 0.05, Decision::Reject),
            "The pvalue 0.01 is less than level of significance 5%; therefore, the null hypothesis is rejected."
        );
    }

    #[test]
    fn test_report_helpers() {
        assert_eq!(report_pvalue(0.0004), "p<.001");
        assert_eq!(report_pvalue(0.12345), "p=0.123");
        assert_eq!(report_alpha(0.05), "significant at 5%.");
        assert_eq!(report_alpha(0.025), "significant at 2.5%.");
    }

    #[test]
    fn test_validate_alpha() {
        assert_eq!(validate_alpha(0.05).unwrap(), 0.05);
        for alpha in [0.0, 1.0, -0.1, 1.5, f64::NAN] {
            assert!(matches!(
                validate_alpha(alpha),
                Err(StatTestError::InvalidAlpha(_))
            ));
        }
    }
}
