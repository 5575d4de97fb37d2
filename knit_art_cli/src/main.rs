use std::{
    path::{Path, PathBuf},
    process::ExitCode,
    time::Instant,
};

use clap::{Parser, ValueEnum};
use knit_art::{
    config::{self, Config},
    verboser::Logger,
    Float, Optimizer, Precision, Search, Settings, TargetImage,
};
use num_traits::AsPrimitive;
use thiserror::Error;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Input file path.
    #[arg()]
    input: PathBuf,

    /// Output image path. Defaults to `output/<input name>.png` next to the input.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// JSON settings file. Explicit flags override its values.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Size in pixels of the square canvas.
    #[arg(short, long)]
    resolution: Option<u32>,

    /// Number of pins surrounding the image (at least 3).
    #[arg(short = 'n', long, allow_negative_numbers = true)]
    pins: Option<i64>,

    /// Darkness removed by every thread, between 1 and 255.
    #[arg(short = 'a', long, allow_negative_numbers = true)]
    opaqueness: Option<i64>,

    /// Maximum number of threads.
    #[arg(short, long)]
    threads: Option<usize>,

    /// Minimum loss change between threads to keep weaving.
    #[arg(long)]
    tolerance: Option<f64>,

    /// Intensity of the target outside the circle.
    #[arg(long)]
    background: Option<u8>,

    /// Precision of the loss (Single/Double).
    #[arg(short, long)]
    precision: Option<PrecisionArg>,

    /// Candidate evaluation strategy (Sequential/Parallel).
    #[arg(long)]
    search: Option<SearchArg>,

    /// Save a snapshot every `interval` threads.
    #[arg(short, long)]
    interval: Option<usize>,

    /// Leave the pins out of the output image.
    #[arg(long)]
    no_pins: bool,

    /// Also write an svg preview.
    #[arg(long)]
    svg: bool,

    /// Also write the pin sequence, one pin per line.
    #[arg(long)]
    instructions: bool,

    /// Also write the prepared greyscale target.
    #[arg(long)]
    save_target: bool,
}

#[derive(Clone, Copy, Debug)]
enum PrecisionArg {
    Single,
    Double,
}

impl ValueEnum for PrecisionArg {
    fn value_variants<'a>() -> &'a [Self] {
        &[Self::Single, Self::Double]
    }

    fn to_possible_value(&self) -> Option<clap::builder::PossibleValue> {
        Some(match self {
            Self::Single => clap::builder::PossibleValue::new("Single")
                .alias("single")
                .alias("f32"),
            Self::Double => clap::builder::PossibleValue::new("Double")
                .alias("double")
                .alias("f64"),
        })
    }
}

impl From<PrecisionArg> for Precision {
    fn from(value: PrecisionArg) -> Self {
        match value {
            PrecisionArg::Single => Precision::Single,
            PrecisionArg::Double => Precision::Double,
        }
    }
}

#[derive(Clone, Copy, Debug)]
enum SearchArg {
    Sequential,
    Parallel,
}

impl ValueEnum for SearchArg {
    fn value_variants<'a>() -> &'a [Self] {
        &[Self::Sequential, Self::Parallel]
    }

    fn to_possible_value(&self) -> Option<clap::builder::PossibleValue> {
        Some(match self {
            Self::Sequential => clap::builder::PossibleValue::new("Sequential")
                .alias("sequential")
                .alias("seq"),
            Self::Parallel => clap::builder::PossibleValue::new("Parallel")
                .alias("parallel")
                .alias("par"),
        })
    }
}

impl From<SearchArg> for Search {
    fn from(value: SearchArg) -> Self {
        match value {
            SearchArg::Sequential => Search::Sequential,
            SearchArg::Parallel => Search::Parallel,
        }
    }
}

#[derive(Debug, Error)]
enum CliError {
    #[error("Can not read the settings file: {0}")]
    ConfigRead(std::io::Error),
    #[error("Invalid settings file: {0}")]
    ConfigParse(#[from] serde_json::Error),
    #[error(transparent)]
    Config(#[from] config::Error),
    #[error("Invalid input file name {0:?}")]
    InputName(PathBuf),
    #[error(transparent)]
    Image(#[from] knit_art::image::Error),
    #[error(transparent)]
    Algorithm(#[from] knit_art::Error),
    #[error("Can not save the target image: {0}")]
    SaveTarget(knit_art::image::Error),
    #[error("Can not save the image: {0}")]
    Save(#[from] image::ImageError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    fn exit_code(&self) -> u8 {
        match self {
            CliError::Config(config::Error::TooFewPins(_)) => 2,
            CliError::Config(config::Error::Opaqueness(_)) => 3,
            CliError::Config(_) | CliError::ConfigRead(_) | CliError::ConfigParse(_) => 4,
            CliError::InputName(_) | CliError::Image(_) | CliError::Algorithm(_) => 5,
            CliError::SaveTarget(_) | CliError::Save(_) | CliError::Io(_) => 6,
        }
    }
}

impl Args {
    fn settings(&self) -> Result<Settings, CliError> {
        let mut settings: Settings = match &self.config {
            Some(path) => {
                serde_json::from_str(&std::fs::read_to_string(path).map_err(CliError::ConfigRead)?)?
            }
            None => Settings::default(),
        };
        if let Some(resolution) = self.resolution {
            settings.resolution = resolution;
        }
        if let Some(pins) = self.pins {
            settings.pins = usize::try_from(pins).map_err(|_| config::Error::TooFewPins(pins))?;
        }
        if let Some(opaqueness) = self.opaqueness {
            settings.opaqueness =
                u32::try_from(opaqueness).map_err(|_| config::Error::Opaqueness(opaqueness))?;
        }
        if let Some(threads) = self.threads {
            settings.max_threads = threads;
        }
        if let Some(tolerance) = self.tolerance {
            settings.tolerance = tolerance;
        }
        if let Some(background) = self.background {
            settings.background = background;
        }
        if let Some(precision) = self.precision {
            settings.precision = precision.into();
        }
        if let Some(search) = self.search {
            settings.search = search.into();
        }
        Ok(settings)
    }

    fn output_path(&self) -> Result<PathBuf, CliError> {
        match &self.output {
            Some(output) => Ok(output.clone()),
            None => {
                let file_name = self
                    .input
                    .file_stem()
                    .and_then(|s| s.to_str())
                    .ok_or_else(|| CliError::InputName(self.input.clone()))?;
                Ok(self
                    .input
                    .parent()
                    .unwrap_or(Path::new("."))
                    .join("output")
                    .join(format!("{}.png", file_name)))
            }
        }
    }
}

/// Exit code for a command line clap refused: 0 for `--help`/`--version`, 1 otherwise.
fn usage_exit_code(err: &clap::Error) -> u8 {
    if err.use_stderr() {
        1
    } else {
        0
    }
}

/// `output` with `suffix` appended to its stem and its extension replaced.
fn sibling(output: &Path, suffix: &str, extension: &str) -> PathBuf {
    let stem = output
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("knit_art");
    output.with_file_name(format!("{}{}.{}", stem, suffix, extension))
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(err) => {
            if let Err(io) = err.print() {
                log::error!("Can not print the usage error: {}", io);
            }
            return ExitCode::from(usage_exit_code(&err));
        }
    };
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("{}", err);
            ExitCode::from(err.exit_code())
        }
    }
}

fn run(args: &Args) -> Result<(), CliError> {
    let start = Instant::now();
    let config = args.settings()?.validate()?;
    match config.precision() {
        Precision::Single => with_precision::<f32>(args, &config)?,
        Precision::Double => with_precision::<f64>(args, &config)?,
    }
    log::info!(
        "Time taken to create the image = {:.3} s",
        start.elapsed().as_secs_f64()
    );
    Ok(())
}

fn with_precision<S: Float>(args: &Args, config: &Config) -> Result<(), CliError>
where
    u8: AsPrimitive<S>,
    usize: AsPrimitive<S>,
    f64: AsPrimitive<S>,
{
    let mut logger = Logger::new(config.report_interval());
    let target = TargetImage::open(
        &args.input,
        config.resolution(),
        config.background(),
        &mut logger,
    )?;

    let output = args.output_path()?;
    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    if args.save_target {
        target
            .save(sibling(&output, "_target", "png"))
            .map_err(CliError::SaveTarget)?;
    }

    let pins = !args.no_pins;
    let mut optimizer = Optimizer::<S>::new(target, config, &mut logger)?;
    if let Some(step) = args.interval.filter(|&step| step > 0) {
        let mut iteration = 1;
        let mut current = step;
        while current < config.max_threads() {
            if optimizer.compute(current, &mut logger).is_final() {
                break;
            }
            optimizer
                .computation()
                .save_image(sibling(&output, &format!("_{}", iteration), "png"), pins)?;
            current += step;
            iteration += 1;
        }
    }
    optimizer.compute(config.max_threads(), &mut logger);

    let computation = optimizer.into_computation();
    computation.save_image(&output, pins)?;
    log::info!(
        "{} threads saved to {}",
        computation.thread_count(),
        output.display()
    );
    if args.svg {
        computation.save_svg(sibling(&output, "", "svg"), 0.5)?;
    }
    if args.instructions {
        std::fs::write(
            sibling(&output, "", "txt"),
            computation.build_instructions(),
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_defaults() {
        let args = Args::try_parse_from([
            "knit_art", "cat.png", "-n", "64", "-a", "30", "--precision", "f32", "--search",
            "seq",
        ])
        .unwrap();
        let settings = args.settings().unwrap();
        assert_eq!(settings.pins, 64);
        assert_eq!(settings.opaqueness, 30);
        assert_eq!(settings.precision, Precision::Single);
        assert_eq!(settings.search, Search::Sequential);
        assert_eq!(settings.resolution, Settings::default().resolution);
    }

    #[test]
    fn missing_input_is_an_error() {
        let err = Args::try_parse_from(["knit_art"]).unwrap_err();
        assert_eq!(usage_exit_code(&err), 1);
        let err = Args::try_parse_from(["knit_art", "cat.png", "--pins", "many"]).unwrap_err();
        assert_eq!(usage_exit_code(&err), 1);
        let err = Args::try_parse_from(["knit_art", "--help"]).unwrap_err();
        assert_eq!(usage_exit_code(&err), 0);
    }

    #[test]
    fn validation_errors_have_distinct_codes() {
        let code = |settings: Settings| CliError::from(settings.validate().unwrap_err()).exit_code();
        assert_eq!(
            code(Settings {
                pins: 2,
                ..Default::default()
            }),
            2
        );
        assert_eq!(
            code(Settings {
                opaqueness: 0,
                ..Default::default()
            }),
            3
        );
        assert_eq!(
            code(Settings {
                resolution: 0,
                ..Default::default()
            }),
            4
        );

        let argv_code = |flag: &str| {
            Args::try_parse_from(["knit_art", "cat.png", flag])
                .unwrap()
                .settings()
                .and_then(|settings| settings.validate().map_err(CliError::from))
                .unwrap_err()
                .exit_code()
        };
        assert_eq!(argv_code("--pins=-4"), 2);
        assert_eq!(argv_code("--pins=2"), 2);
        assert_eq!(argv_code("--opaqueness=-1"), 3);
        assert_eq!(argv_code("--opaqueness=0"), 3);
        assert_eq!(argv_code("--opaqueness=256"), 3);
        assert_eq!(argv_code("--opaqueness=5000000000"), 3);
    }

    #[test]
    fn negative_numbers_parse_after_short_flags() {
        let args = Args::try_parse_from(["knit_art", "cat.png", "-n", "-4", "-a", "-1"]).unwrap();
        assert_eq!(args.pins, Some(-4));
        assert_eq!(args.opaqueness, Some(-1));
    }

    #[test]
    fn default_output_goes_next_to_the_input() {
        let args = Args::try_parse_from(["knit_art", "images/cat.jpg"]).unwrap();
        assert_eq!(
            args.output_path().unwrap(),
            Path::new("images").join("output").join("cat.png")
        );
        assert_eq!(
            sibling(Path::new("out/cat.png"), "_3", "png"),
            Path::new("out/cat_3.png")
        );
    }
}
