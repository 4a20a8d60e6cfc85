// std imports
use std::path::{Path, PathBuf};

// 3rd party imports
use anyhow::{Context, Result};
use fancy_regex::Regex;
use lazy_static::lazy_static;

lazy_static! {
    /// Regex for finding characters which should not end up in a file name:
    /// * Reserved ext4 characters, whitespaces and non word characters
    ///
    static ref ILLEGAL_FILE_NAME_CHARACTER_REGEX: Regex = fancy_regex::Regex::new(r"[\W\u0000]+").unwrap();
}

/// Sanitizes the given string by replacing all illegal file name characters with `_`.
///
/// # Arguments
/// * `some_str` - string
///
pub fn sanatize_string_for_path(some_str: &str) -> String {
    ILLEGAL_FILE_NAME_CHARACTER_REGEX
        .replace_all(some_str.trim(), "_")
        .trim_matches('_')
        .to_lowercase()
}

/// Builds the path of a plot file in the given directory, e.g. `<dir>/<test_name>.svg`
///
/// # Arguments
/// * `plot_dir` - Directory where the plot is stored
/// * `test_name` - Name of the test, will be sanitized
///
pub fn create_plot_file_path(plot_dir: &Path, test_name: &str) -> Result<PathBuf> {
    std::fs::create_dir_all(plot_dir)
        .with_context(|| format!("Could not create plot directory `{}`", plot_dir.display()))?;
    Ok(plot_dir.join(format!("{}.svg", sanatize_string_for_path(test_name))))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    pub fn test_sanatize_string_for_path() {
        let input = " Kolmogorov-Smirnov Goodness of Fit\tTest\n";
        let expected = "kolmogorov_smirnov_goodness_of_fit_test";

        let result = sanatize_string_for_path(input);
        assert_eq!(result, expected);
    }
}
