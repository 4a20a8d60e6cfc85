// std imports
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::fs::read_to_string;
use std::path::{Path, PathBuf};

// 3rd party imports
use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

// internal imports
use crate::constants::STAT_CONFIG;
use crate::errors::profile_error::ProfileError;

lazy_static! {
    /// Analysis codes used in the profile file
    ///
    static ref ANALYSIS_TYPES: HashMap<&'static str, &'static str> = HashMap::from([
        ("univariate", "Univariate"),
        ("bivariate", "Bivariate"),
        ("multivariate", "Multivariate"),
    ]);

    /// Hypothesis codes used in the profile file
    ///
    static ref HYPOTHESIS_TYPES: HashMap<&'static str, &'static str> = HashMap::from([
        ("ind", "Independence"),
        ("corr", "Correlation"),
        ("gof", "Goodness of Fit"),
        ("centrality", "Central Tendency of Groups"),
        ("norm", "Normality"),
        ("var", "Equal Variance"),
        ("dist", "Equal Distributions"),
    ]);
}

/// Returns the display name of an analysis code, e.g. `bivariate` -> `Bivariate`
///
pub fn analysis_type_name(code: &str) -> Option<&'static str> {
    ANALYSIS_TYPES.get(code).copied()
}

/// Returns the display name of a hypothesis code, e.g. `gof` -> `Goodness of Fit`
///
pub fn hypothesis_type_name(code: &str) -> Option<&'static str> {
    HYPOTHESIS_TYPES.get(code).copied()
}

/// Variable types the test operates on
///
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ProfileVariables {
    /// Tests on a single variable
    One { x_variable_type: Option<String> },
    /// Tests on two variables
    Two {
        x_variable_type: Option<String>,
        y_variable_type: Option<String>,
    },
}

/// One row of the profile file as it is stored on disk.
/// Fields not declared here are ignored.
///
#[derive(Debug, Clone, Deserialize)]
struct ProfileRecord {
    name: Option<String>,
    description: Option<String>,
    statistic: Option<String>,
    analysis: Option<String>,
    hypothesis: Option<String>,
    #[serde(rename = "H0")]
    h0: Option<String>,
    parametric: Option<bool>,
    min_sample_size: Option<u64>,
    assumptions: Option<String>,
    use_when: Option<String>,
    #[serde(rename = "X_variable_type")]
    x_variable_type: Option<String>,
    #[serde(rename = "Y_variable_type")]
    y_variable_type: Option<String>,
}

/// Static descriptive metadata about a statistical test
///
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatTestProfile {
    /// Test id, key in the profile file
    pub id: String,
    pub name: Option<String>,
    pub description: Option<String>,
    /// Symbol of the test statistic
    pub statistic: Option<String>,
    /// Analysis code, see [analysis_type_name]
    pub analysis: Option<String>,
    /// Hypothesis code, see [hypothesis_type_name]
    pub hypothesis: Option<String>,
    /// Null hypothesis
    #[serde(rename = "H0")]
    pub h0: Option<String>,
    pub parametric: Option<bool>,
    pub min_sample_size: Option<u64>,
    pub assumptions: Option<String>,
    pub use_when: Option<String>,
    /// Variable types the test is designed for
    pub variables: ProfileVariables,
}

impl StatTestProfile {
    fn from_record(id: &str, record: ProfileRecord) -> Self {
        let variables = match record.y_variable_type {
            Some(y_variable_type) => ProfileVariables::Two {
                x_variable_type: record.x_variable_type,
                y_variable_type: Some(y_variable_type),
            },
            None => ProfileVariables::One {
                x_variable_type: record.x_variable_type,
            },
        };
        Self {
            id: id.to_string(),
            name: record.name,
            description: record.description,
            statistic: record.statistic,
            analysis: record.analysis,
            hypothesis: record.hypothesis,
            h0: record.h0,
            parametric: record.parametric,
            min_sample_size: record.min_sample_size,
            assumptions: record.assumptions,
            use_when: record.use_when,
            variables,
        }
    }

    /// Returns the test name or the id if the profile has no name
    ///
    pub fn name_or_id(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.id)
    }

    /// Returns the display name of the hypothesis code
    ///
    pub fn hypothesis_name(&self) -> Option<&'static str> {
        self.hypothesis.as_deref().and_then(hypothesis_type_name)
    }

    /// Returns the display name of the analysis code
    ///
    pub fn analysis_name(&self) -> Option<&'static str> {
        self.analysis.as_deref().and_then(analysis_type_name)
    }
}

impl fmt::Display for StatTestProfile {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let width = 32;
        writeln!(f, "{:^1$}", "StatTestProfile", width * 2)?;
        let rows: [(&str, Option<String>); 11] = [
            ("id", Some(self.id.clone())),
            ("name", self.name.clone()),
            ("description", self.description.clone()),
            ("statistic", self.statistic.clone()),
            ("analysis", self.analysis.clone()),
            ("hypothesis", self.hypothesis.clone()),
            ("H0", self.h0.clone()),
            ("parametric", self.parametric.map(|p| p.to_string())),
            ("min_sample_size", self.min_sample_size.map(|n| n.to_string())),
            ("assumptions", self.assumptions.clone()),
            ("use_when", self.use_when.clone()),
        ];
        for (key, value) in rows.iter() {
            if let Some(value) = value {
                writeln!(f, "{:>width$} | {}", key, value, width = width)?;
            }
        }
        Ok(())
    }
}

/// Registry of statistical test profiles backed by a YAML file.
/// The file is read on every lookup.
///
#[derive(Debug, Clone)]
pub struct ProfileRegistry {
    path: PathBuf,
}

impl ProfileRegistry {
    /// Creates a new registry
    ///
    /// # Arguments
    /// * `path` - Path to the YAML profile file
    ///
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
        }
    }

    /// Returns the path of the profile file
    ///
    pub fn get_path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<BTreeMap<String, ProfileRecord>, ProfileError> {
        let path_str = self.path.display().to_string();
        let content = read_to_string(&self.path).map_err(|err| {
            error!("Unable to read profile file `{}`: {}", path_str, err);
            ProfileError::ConfigReadError(path_str.clone(), err)
        })?;
        serde_yaml::from_str(&content).map_err(|err| {
            error!("Unable to parse profile file `{}`: {}", path_str, err);
            ProfileError::ConfigParseError(path_str, err)
        })
    }

    /// Creates the profile for the given test id
    ///
    /// # Arguments
    /// * `id` - Test id, e.g. `pearson`
    ///
    pub fn create(&self, id: &str) -> Result<StatTestProfile, ProfileError> {
        let mut records = self.read()?;
        match records.remove(id) {
            Some(record) => {
                debug!("Loaded profile `{}` from `{}`", id, self.path.display());
                Ok(StatTestProfile::from_record(id, record))
            }
            None => {
                error!("Test id `{}` not found in `{}`", id, self.path.display());
                Err(ProfileError::UnsupportedTestId(id.to_string()))
            }
        }
    }

    /// Returns all test ids in the profile file
    ///
    pub fn ids(&self) -> Result<Vec<String>, ProfileError> {
        Ok(self.read()?.into_keys().collect())
    }
}

impl Default for ProfileRegistry {
    fn default() -> Self {
        Self::new(Path::new(STAT_CONFIG))
    }
}

/// Loads the profile for the given test id from the default profile file
///
/// # Arguments
/// * `id` - Test id, e.g. `x2gof`
///
pub fn load_profile(id: &str) -> Result<StatTestProfile, ProfileError> {
    ProfileRegistry::default().create(id)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_profile_matches_file() {
        let registry = ProfileRegistry::default();
        let raw: serde_yaml::Value =
            serde_yaml::from_str(&read_to_string(STAT_CONFIG).unwrap()).unwrap();

        for id in registry.ids().unwrap() {
            let row = &raw[id.as_str()];
            let profile = registry.create(&id).unwrap();
            assert_eq!(profile.id, id);
            assert_eq!(profile.name.as_deref(), row["name"].as_str());
            assert_eq!(profile.description.as_deref(), row["description"].as_str());
            assert_eq!(profile.statistic.as_deref(), row["statistic"].as_str());
            assert_eq!(profile.analysis.as_deref(), row["analysis"].as_str());
            assert_eq!(profile.hypothesis.as_deref(), row["hypothesis"].as_str());
            assert_eq!(profile.h0.as_deref(), row["H0"].as_str());
            assert_eq!(profile.parametric, row["parametric"].as_bool());
            assert_eq!(profile.min_sample_size, row["min_sample_size"].as_u64());
            assert_eq!(profile.assumptions.as_deref(), row["assumptions"].as_str());
            assert_eq!(profile.use_when.as_deref(), row["use_when"].as_str());
        }
    }

    #[test]
    fn test_profile_variables() {
        let gof = load_profile("x2gof").unwrap();
        assert_eq!(
            gof.variables,
            ProfileVariables::One {
                x_variable_type: Some("nominal".to_string())
            }
        );
        assert_eq!(gof.hypothesis_name(), Some("Goodness of Fit"));
        assert_eq!(gof.analysis_name(), Some("Univariate"));

        let pearson = load_profile("pearson").unwrap();
        assert!(matches!(pearson.variables, ProfileVariables::Two { .. }));
    }

    #[test]
    fn test_unsupported_id() {
        let result = load_profile("not_a_test");
        assert!(matches!(result, Err(ProfileError::UnsupportedTestId(id)) if id == "not_a_test"));
    }

    #[test]
    fn test_missing_and_malformed_file() {
        let missing = ProfileRegistry::new(Path::new("test_files/does_not_exist.yml"));
        assert!(matches!(
            missing.create("x2gof"),
            Err(ProfileError::ConfigReadError(_, _))
        ));

        let malformed = ProfileRegistry::new(Path::new("test_files/malformed_stats.yml"));
        assert!(matches!(
            malformed.create("x2gof"),
            Err(ProfileError::ConfigParseError(_, _))
        ));
    }
}
