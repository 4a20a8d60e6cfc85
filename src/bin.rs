// std imports
use std::collections::BTreeMap;
use std::fmt::Display;
use std::path::{Path, PathBuf};

// 3rd party imports
use anyhow::{anyhow, bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing::{debug, info, Level};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

// internal imports
use edastats::analysis::bivariate::QualitativeTwo;
use edastats::analysis::univariate::{QualitativeOne, QuantitativeOne};
use edastats::constants::{DEFAULT_ALPHA, DEFAULT_MC_SAMPLES, DEFAULT_MC_SEED, STAT_CONFIG};
use edastats::data::dataset::{column_as_f64, is_numeric_column, read_csv};
use edastats::data::generation::RvsDistribution;
use edastats::functions::create_plot_file_path;
use edastats::inference::base::StatisticalTest;
use edastats::inference::chisquare_gof::ChiSquareGofTest;
use edastats::inference::chisquare_independence::ChiSquareIndependenceTest;
use edastats::inference::correlation::{PearsonCorrelationTest, SpearmanCorrelationTest};
use edastats::inference::kstest::{KsTest, KsTwoSampleTest};
use edastats::inference::ttest::TTest;
use edastats::profile::ProfileRegistry;
use edastats::visual::canvas::Canvas;
use edastats::visual::Plot;

/// Options shared by all tests
///
#[derive(Debug, Args)]
struct TestArgs {
    /// Significance level
    #[arg(short, long, default_value_t = DEFAULT_ALPHA)]
    alpha: f64,
    /// Directory where the plot is saved as SVG, no plot if omitted
    #[arg(long)]
    plot_dir: Option<PathBuf>,
    /// TOML file with the visual configuration, see `new-canvas-config`
    #[arg(long)]
    canvas: Option<PathBuf>,
    /// Print the result as JSON instead of a table
    #[arg(long, default_value = "false")]
    json: bool,
}

/// Parses `category=proportion`
///
fn parse_proportion(value: &str) -> Result<(String, f64), String> {
    let (category, proportion) = value
        .split_once('=')
        .ok_or_else(|| format!("expected `category=proportion`, got `{}`", value))?;
    let proportion: f64 = proportion
        .trim()
        .parse()
        .map_err(|err| format!("invalid proportion `{}`: {}", proportion, err))?;
    Ok((category.trim().to_string(), proportion))
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Lists the ids of all test profiles
    Profiles {},
    /// Prints a test profile
    Profile {
        /// Test id, e.g. `x2gof`
        id: String,
    },
    /// Prints the default visual configuration as TOML
    NewCanvasConfig {},
    /// Chi-square goodness of fit test, either on literal frequencies or on the value counts of a column
    ChiSquareGof {
        /// Observed frequencies, comma separated
        #[arg(long, value_delimiter = ',', num_args = 1.., conflicts_with = "csv")]
        observed: Vec<f64>,
        /// Expected frequencies, comma separated, equal frequencies if omitted
        #[arg(long, value_delimiter = ',', num_args = 1.., requires = "observed")]
        expected: Vec<f64>,
        /// CSV file
        #[arg(long, requires = "column")]
        csv: Option<PathBuf>,
        /// Categorical column
        #[arg(long)]
        column: Option<String>,
        /// Expected proportions per category, e.g. `Primary=1,Secondary=2`
        #[arg(long, value_delimiter = ',', value_parser = parse_proportion, requires = "csv")]
        proportions: Vec<(String, f64)>,
        #[command(flatten)]
        test_args: TestArgs,
    },
    /// Chi-square test of independence of two categorical columns
    ChiSquareIndependence {
        csv: PathBuf,
        a: String,
        b: String,
        #[command(flatten)]
        test_args: TestArgs,
    },
    /// Kolmogorov-Smirnov test of a column against a fitted distribution or a second column
    Ks {
        csv: PathBuf,
        column: String,
        /// Reference distribution fitted to the column
        #[arg(short, long, default_value = "normal", conflicts_with = "second")]
        distribution: String,
        /// Second numeric column for the two sample test
        #[arg(short, long)]
        second: Option<String>,
        /// Number of bootstrap samples of the one sample test
        #[arg(long, default_value_t = DEFAULT_MC_SAMPLES, conflicts_with = "second")]
        mc_samples: usize,
        /// Seed of the bootstrap
        #[arg(long, default_value_t = DEFAULT_MC_SEED, conflicts_with = "second")]
        seed: u64,
        #[command(flatten)]
        test_args: TestArgs,
    },
    /// Pearson correlation of two numeric columns
    Pearson {
        csv: PathBuf,
        x: String,
        y: String,
        #[command(flatten)]
        test_args: TestArgs,
    },
    /// Spearman rank correlation of two numeric columns
    Spearman {
        csv: PathBuf,
        x: String,
        y: String,
        #[command(flatten)]
        test_args: TestArgs,
    },
    /// Independent samples t test of two numeric columns or of one column between two groups
    TTest {
        csv: PathBuf,
        x: String,
        /// Second numeric column
        #[arg(required_unless_present = "group")]
        y: Option<String>,
        /// Categorical column with two levels splitting `x`
        #[arg(short, long, conflicts_with = "y")]
        group: Option<String>,
        /// Assume equal population variances instead of Welch's test
        #[arg(long, default_value = "false")]
        homoscedastic: bool,
        #[command(flatten)]
        test_args: TestArgs,
    },
    /// Descriptive statistics of a column, per level of a categorical column if `--by` is given
    Describe {
        csv: PathBuf,
        column: String,
        /// Categorical column grouping the statistics
        #[arg(long)]
        by: Option<String>,
        /// Print as JSON instead of a table
        #[arg(long, default_value = "false")]
        json: bool,
        /// Directory where a count or box plot is saved as SVG
        #[arg(long)]
        plot_dir: Option<PathBuf>,
        #[arg(long)]
        canvas: Option<PathBuf>,
    },
    /// Goodness of fit of a numeric column, small samples are tested for normality with
    /// Shapiro-Wilk
    Normality {
        csv: PathBuf,
        column: String,
        #[arg(short, long, default_value = "normal")]
        distribution: String,
        /// Print as JSON instead of a table
        #[arg(long, default_value = "false")]
        json: bool,
        /// Directory where the QQ plot is saved as SVG
        #[arg(long)]
        plot_dir: Option<PathBuf>,
        #[arg(long)]
        canvas: Option<PathBuf>,
    },
    /// Fits a distribution to a column and draws random variates from it
    Fit {
        csv: PathBuf,
        column: String,
        distribution: String,
        /// Directory where the plot is saved as SVG
        #[arg(long)]
        plot_dir: Option<PathBuf>,
        #[arg(long)]
        canvas: Option<PathBuf>,
    },
}

#[derive(Debug, Parser)]
#[command(version, about = "Statistical hypothesis tests for exploratory data analysis")]
struct Cli {
    /// Verbosity level
    /// 0 - Error
    /// 1 - Warn
    /// 2 - Info
    /// 3 - Debug
    /// > 3 - Trace
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
    /// Additionally write logs to this file
    #[arg(long)]
    log_file: Option<PathBuf>,
    /// Test profiles
    #[arg(long, default_value = STAT_CONFIG)]
    profiles: PathBuf,
    #[command(subcommand)]
    command: Commands,
}

fn load_canvas(path: Option<&Path>) -> Result<Canvas> {
    match path {
        Some(path) => Canvas::from_file(path),
        None => Ok(Canvas::default()),
    }
}

fn print_value<T: Display + Serialize>(value: &T, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(value)?);
    } else {
        println!("{}", value);
    }
    Ok(())
}

/// Saves the plot as SVG into the directory, nothing happens without a directory
///
/// # Arguments
/// * `plot` - Plot
/// * `name` - Plot name, used as file name
/// * `plot_dir` - Output directory
/// * `canvas` - TOML file with the visual configuration
///
fn save_plot<P: Plot>(
    plot: &P,
    name: &str,
    plot_dir: Option<&Path>,
    canvas: Option<&Path>,
) -> Result<()> {
    if let Some(plot_dir) = plot_dir {
        let canvas = load_canvas(canvas)?;
        let plot_path = create_plot_file_path(plot_dir, name)?;
        plot.save_plot(&canvas, &plot_path)
            .with_context(|| format!("Could not plot `{}`", name))?;
        info!("Plot saved to `{}`", plot_path.display());
    }
    Ok(())
}

/// Prints the result and saves its plot if requested
///
/// # Arguments
/// * `result` - Test result
/// * `test_name` - Name of the test, used as plot file name
/// * `test_args` - Shared test options
///
fn report<R>(result: &R, test_name: &str, test_args: &TestArgs) -> Result<()>
where
    R: Display + Serialize + Plot,
{
    print_value(result, test_args.json)?;
    save_plot(
        result,
        test_name,
        test_args.plot_dir.as_deref(),
        test_args.canvas.as_deref(),
    )
}

/// Runs the test and reports its result
///
fn run_test<T>(mut test: T, test_args: &TestArgs) -> Result<()>
where
    T: StatisticalTest,
    T::Output: Display + Serialize + Plot,
{
    let test_name = test.profile().name_or_id().to_string();
    let result = test.run()?;
    report(result, &test_name, test_args)
}

fn main() -> Result<()> {
    let args = Cli::parse();

    //// Set up tracing
    let verbosity = match args.verbose {
        0 => Level::ERROR,
        1 => Level::WARN,
        2 => Level::INFO,
        3 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let filter = EnvFilter::from_default_env().add_directive(verbosity.into());

    let tracing_terminal_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);
    let mut tracing_file_layer = None;
    let mut _tracing_log_writer_guard = None;

    if let Some(log_file) = &args.log_file {
        let log_dir = log_file
            .parent()
            .filter(|dir| !dir.as_os_str().is_empty())
            .unwrap_or(Path::new("."));
        let log_file_name = log_file
            .file_name()
            .ok_or_else(|| anyhow!("Log file `{}` has no file name", log_file.display()))?;
        let file_appender = RollingFileAppender::new(Rotation::NEVER, log_dir, log_file_name);
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
        tracing_file_layer = Some(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(non_blocking),
        );
        _tracing_log_writer_guard = Some(guard);
    }

    tracing_subscriber::registry()
        .with(tracing_terminal_layer)
        .with(tracing_file_layer)
        .with(filter)
        .init();

    let registry = ProfileRegistry::new(&args.profiles);
    debug!("Using profiles from `{}`", registry.get_path().display());

    match args.command {
        Commands::Profiles {} => {
            for id in registry.ids()? {
                println!("{}", id);
            }
        }
        Commands::Profile { id } => {
            println!("{}", registry.create(&id)?);
        }
        Commands::NewCanvasConfig {} => {
            println!("{}", Canvas::default().to_toml()?);
        }
        Commands::ChiSquareGof {
            observed,
            expected,
            csv,
            column,
            proportions,
            test_args,
        } => {
            let test = match (csv, column) {
                (Some(csv), Some(column)) => {
                    let df = read_csv(&csv)?;
                    let proportions: BTreeMap<String, f64> = proportions.into_iter().collect();
                    ChiSquareGofTest::from_frame(
                        &registry,
                        &df,
                        &column,
                        (!proportions.is_empty()).then_some(&proportions),
                        test_args.alpha,
                    )?
                }
                _ if !observed.is_empty() => ChiSquareGofTest::new(
                    &registry,
                    observed,
                    (!expected.is_empty()).then_some(expected),
                    test_args.alpha,
                )?,
                _ => bail!("Either `--observed` or `--csv` with `--column` is required"),
            };
            run_test(test, &test_args)?;
        }
        Commands::ChiSquareIndependence {
            csv,
            a,
            b,
            test_args,
        } => {
            let df = read_csv(&csv)?;
            let test =
                ChiSquareIndependenceTest::from_frame(&registry, &df, &a, &b, test_args.alpha)?;
            run_test(test, &test_args)?;
        }
        Commands::Ks {
            csv,
            column,
            distribution,
            second,
            mc_samples,
            seed,
            test_args,
        } => {
            let df = read_csv(&csv)?;
            match second {
                Some(second) => run_test(
                    KsTwoSampleTest::from_frame(&registry, &df, &column, &second, test_args.alpha)?,
                    &test_args,
                )?,
                None => run_test(
                    KsTest::from_frame(&registry, &df, &column, &distribution, test_args.alpha)?
                        .with_mc_samples(mc_samples)
                        .with_seed(seed),
                    &test_args,
                )?,
            }
        }
        Commands::Pearson {
            csv,
            x,
            y,
            test_args,
        } => {
            let df = read_csv(&csv)?;
            let test = PearsonCorrelationTest::from_frame(&registry, &df, &x, &y, test_args.alpha)?;
            run_test(test, &test_args)?;
        }
        Commands::Spearman {
            csv,
            x,
            y,
            test_args,
        } => {
            let df = read_csv(&csv)?;
            let test =
                SpearmanCorrelationTest::from_frame(&registry, &df, &x, &y, test_args.alpha)?;
            run_test(test, &test_args)?;
        }
        Commands::TTest {
            csv,
            x,
            y,
            group,
            homoscedastic,
            test_args,
        } => {
            let df = read_csv(&csv)?;
            let test = match (y, group) {
                (_, Some(group)) => TTest::from_groups(
                    &registry,
                    &df,
                    &x,
                    &group,
                    test_args.alpha,
                    homoscedastic,
                )?,
                (Some(y), None) => {
                    TTest::from_frame(&registry, &df, &x, &y, test_args.alpha, homoscedastic)?
                }
                (None, None) => bail!("Either a second column or `--group` is required"),
            };
            run_test(test, &test_args)?;
        }
        Commands::Describe {
            csv,
            column,
            by,
            json,
            plot_dir,
            canvas,
        } => {
            let df = read_csv(&csv)?;
            let numeric = is_numeric_column(&df, &column)?;
            let (plot_dir, canvas) = (plot_dir.as_deref(), canvas.as_deref());
            match by {
                Some(by) => {
                    let analysis = QualitativeTwo::new(&df);
                    print_value(&analysis.describe(&by, &column)?, json)?;
                    let name = format!("{} by {}", column, by);
                    if numeric {
                        save_plot(&analysis.boxplot(&by, &column)?, &name, plot_dir, canvas)?;
                    } else {
                        save_plot(&analysis.countplot(&by, &column)?, &name, plot_dir, canvas)?;
                    }
                }
                None if numeric => {
                    print_value(&QuantitativeOne::new(&df).describe(&column)?, json)?;
                }
                None => {
                    let analysis = QualitativeOne::new(&df);
                    print_value(&analysis.describe(&column)?, json)?;
                    if !json {
                        print_value(&analysis.frequency(&column)?, false)?;
                    }
                    save_plot(&analysis.countplot(&column)?, &column, plot_dir, canvas)?;
                }
            }
        }
        Commands::Normality {
            csv,
            column,
            distribution,
            json,
            plot_dir,
            canvas,
        } => {
            let df = read_csv(&csv)?;
            let analysis = QuantitativeOne::new(&df);
            print_value(&analysis.test_distribution(&column, &distribution)?, json)?;
            save_plot(
                &analysis.qqplot(&column, &distribution)?,
                &format!("{} QQ {}", column, distribution),
                plot_dir.as_deref(),
                canvas.as_deref(),
            )?;
        }
        Commands::Fit {
            csv,
            column,
            distribution,
            plot_dir,
            canvas,
        } => {
            let df = read_csv(&csv)?;
            let data = column_as_f64(&df, &column)?;
            let outcome = RvsDistribution::generate(&data, &distribution)?;
            println!("{}", outcome.distribution);
            for (name, value) in outcome.distribution.parameters() {
                println!("{:>16} | {}", name, value);
            }
            save_plot(
                &outcome,
                &format!("{} {}", column, distribution),
                plot_dir.as_deref(),
                canvas.as_deref(),
            )?;
        }
    }

    Ok(())
}
