#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! Reader for grading configurations.
//!
//! ```text
//! :Init dir=.grading
//! :Compile
//! g++ -std=c++20 ${cpp} -o ${exe}
//! :Header
//! #include "student.cpp"
//! :Output detail=student, filename=results.html
//! :Testcase name="Adds numbers", points=5
//! CHECK(add(2, 3) == 5, "add(2, 3) returned ", add(2, 3));
//! ```
//!
//! A line starting with `:` is a command; the lines up to the next command
//! are its block. The whole file is read, and every check parsed, before any
//! testcase runs.

use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use crate::{
    constants::LOG_BANNER,
    error::ConfigError,
    pipeline::program::instrument_body,
    protocol::decode_literal,
    report::{Detail, Encoding, OutputSink},
    scan::split_args,
    testcase::{TestOptions, TestPaths, Testcase},
    util::{append_file, write_file},
    vars::Env,
};

/// Everything a configuration asks for, ready to run.
#[derive(Debug)]
pub struct Plan {
    /// Variables after the last command.
    env:       Env,
    /// Testcases in configuration order.
    testcases: Vec<Testcase>,
    /// Report destinations.
    outputs:   Vec<OutputSink>,
    /// Directory for generated files.
    dir:       PathBuf,
    /// Run log, `${dir}/${log}`.
    run_log:   PathBuf,
}

/// Parser state while a configuration is read.
#[derive(Debug)]
struct Reader<'a> {
    /// Name used in error messages.
    source_name: &'a str,
    /// Directory relative file settings (eg. `code_file`) are resolved from.
    base_dir:    &'a Path,
    /// Base variables.
    env:         Env,
    /// Current compile block.
    compile:     Vec<String>,
    /// Current header block.
    header:      Vec<String>,
    /// Whether `:Init` ran, explicitly or implicitly.
    initialized: bool,
    /// `${dir}` and `${dir}/${log}` as of initialization.
    init_paths:  Option<(PathBuf, PathBuf)>,
    /// Testcases so far.
    testcases:   Vec<Testcase>,
    /// Report destinations so far.
    outputs:     Vec<OutputSink>,
}

/// Removes `marker` and everything after it.
fn strip_comment<'a>(line: &'a str, marker: &str) -> &'a str {
    if marker.is_empty() {
        return line;
    }
    match line.find(marker) {
        Some(pos) => &line[..pos],
        None => line,
    }
}

/// Parses a boolean setting.
fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.to_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(invalid(key, value)),
    }
}

/// Builds an [`ConfigError::InvalidSetting`].
fn invalid(key: &str, value: &str) -> ConfigError {
    ConfigError::InvalidSetting {
        key:   key.to_string(),
        value: value.to_string(),
    }
}

/// Splits `key=value, key="quoted, value"` into pairs. Keys are lower-cased;
/// values are substituted with `env` and quoted values decoded.
fn parse_settings(text: &str, env: &Env) -> Result<Vec<(String, String)>, ConfigError> {
    split_args(text)
        .into_iter()
        .filter(|arg| !arg.is_empty())
        .map(|arg| {
            let (key, value) = arg
                .split_once('=')
                .ok_or_else(|| invalid(arg.trim(), ""))?;
            let key = key.trim().to_lowercase();
            let mut value = env.apply(value.trim())?;
            if value.starts_with('"') {
                value = decode_literal(&value).map_err(|_| invalid(&key, &value))?;
            }
            Ok((key, value))
        })
        .collect()
}

impl<'a> Reader<'a> {
    /// Starts a reader with the default variables.
    fn new(source_name: &'a str, base_dir: &'a Path) -> Self {
        Self {
            source_name,
            base_dir,
            env: Env::with_defaults(),
            compile: Vec::new(),
            header: Vec::new(),
            initialized: false,
            init_paths: None,
            testcases: Vec::new(),
            outputs: Vec::new(),
        }
    }

    /// Resolves a configured file name.
    fn resolve(&self, path: &str) -> PathBuf {
        let path = PathBuf::from(path);
        if path.is_absolute() {
            path
        } else {
            self.base_dir.join(path)
        }
    }

    /// `:Init`: sets base variables and fixes `${dir}` and the run log.
    fn init(&mut self, settings: &str) -> Result<(), ConfigError> {
        if self.initialized {
            return Err(ConfigError::InitTwice);
        }
        self.initialized = true;

        let settings = parse_settings(settings, &self.env)?;
        self.env.extend(settings);

        let dir = self.env.apply("${dir}")?;
        let log = self.env.apply("${dir}/${log}")?;
        self.init_paths = Some((PathBuf::from(dir), PathBuf::from(log)));
        Ok(())
    }

    /// Runs `:Init` without settings unless it already ran.
    fn ensure_init(&mut self) -> Result<(), ConfigError> {
        if self.initialized {
            return Ok(());
        }
        self.init("")
    }

    /// `:Output`: adds a report destination.
    fn output(&mut self, settings: &str) -> Result<(), ConfigError> {
        let mut detail = Detail::Student;
        let mut filename = None;
        let mut link_to = None;
        let mut encoding = None;

        for (key, value) in parse_settings(settings, &self.env)? {
            match key.as_str() {
                "detail" => detail = value.parse()?,
                "filename" => filename = Some(PathBuf::from(value)),
                "link_to" => link_to = Some(value),
                "type" => encoding = Some(Encoding::from_name_or_text(&value)),
                _ => {
                    return Err(ConfigError::UnknownSetting {
                        command: ":Output".into(),
                        key,
                    });
                }
            }
        }

        let encoding = encoding.unwrap_or_else(|| match &filename {
            Some(path) => Encoding::from_path(path),
            None => Encoding::Text,
        });
        self.outputs
            .push(OutputSink::new(detail, encoding, filename, link_to));
        Ok(())
    }

    /// `:Testcase`: configures one testcase from its settings and block.
    fn testcase(&mut self, settings: &str, block: Vec<String>) -> Result<()> {
        if self.compile.is_empty() {
            return Err(ConfigError::MissingCompile.into());
        }

        let id = self.testcases.len();
        let file_base = self.env.apply(&format!("${{dir}}/Test{id}"))?;
        let mut env = self.env.derive([
            ("#test", id.to_string()),
            ("compile", format!("{file_base}-compile.txt")),
            ("cpp", format!("{file_base}.cpp")),
            ("error", format!("{file_base}-errors.txt")),
            ("exe", format!("{file_base}.exe")),
            ("out", format!("{file_base}-output.txt")),
            ("result", format!("{file_base}-result.txt")),
        ]);

        let settings = parse_settings(settings, &env)?;
        let mut name = String::new();
        let mut points: f64 = 0.0;
        let mut hidden = false;
        let mut expected_exit: i32 = 0;
        let mut args = String::new();
        let mut options = TestOptions::default();
        let mut expected = None;
        let mut input = None;
        let mut code_file = None;

        for (key, value) in &settings {
            let value = value.as_str();
            match key.as_str() {
                "args" => args = value.to_string(),
                "code_file" => code_file = Some(self.resolve(value)),
                "exit_code" => expected_exit = value.parse().map_err(|_| invalid(key, value))?,
                "expect" => expected = Some(self.resolve(value)),
                "hidden" => hidden = parse_bool(key, value)?,
                "input" => input = Some(self.resolve(value)),
                "match_case" => options.match_case = parse_bool(key, value)?,
                "match_space" => options.match_space = parse_bool(key, value)?,
                "name" => name = value.to_string(),
                "output" => env.set("out", value),
                "points" => {
                    points = value
                        .parse::<f64>()
                        .ok()
                        .filter(|p| p.is_finite() && *p >= 0.0)
                        .ok_or_else(|| invalid(key, value))?
                }
                "result" => env.set("result", value),
                "run_main" => options.run_main = parse_bool(key, value)?,
                "timeout" => {
                    options.timeout = value
                        .parse::<f64>()
                        .ok()
                        .filter(|t| *t > 0.0)
                        .and_then(|t| Duration::try_from_secs_f64(t).ok())
                        .ok_or_else(|| invalid(key, value))?
                }
                _ => {
                    return Err(ConfigError::UnknownSetting {
                        command: ":Testcase".into(),
                        key:     key.clone(),
                    }
                    .into());
                }
            }
        }
        env.extend(settings.iter().filter(|(key, _)| key != "output" && key != "result").cloned());

        for (setting, path) in [("expect", &expected), ("input", &input), ("code_file", &code_file)] {
            if let Some(path) = path
                && !path.exists()
            {
                return Err(ConfigError::MissingFile {
                    test:    id,
                    setting: setting.into(),
                    path:    path.display().to_string(),
                }
                .into());
            }
        }

        let raw_code = match &code_file {
            Some(path) if !block.is_empty() => {
                debug!("Testcase {id}: {} given along with inline code", path.display());
                return Err(ConfigError::DuplicateCode(id).into());
            }
            Some(path) => fs::read_to_string(path)
                .with_context(|| format!("Could not read code file {}", path.display()))?
                .lines()
                .filter(|line| !line.trim().is_empty())
                .map(str::to_string)
                .collect(),
            None => block,
        };

        let code = raw_code
            .iter()
            .map(|line| env.apply(line))
            .collect::<Result<Vec<_>, _>>()?;
        let (instrumented, checks) = instrument_body(&code.join("\n"), id)?;
        let compile = self
            .compile
            .iter()
            .map(|line| env.apply(line))
            .collect::<Result<Vec<_>, _>>()?;
        let header = self
            .header
            .iter()
            .map(|line| env.apply(line))
            .collect::<Result<Vec<_>, _>>()?;

        let var = |name: &str| PathBuf::from(env.get(name).unwrap_or_default());
        let paths = TestPaths {
            source: var("cpp"),
            compile_log: var("compile"),
            executable: var("exe"),
            stdout: var("out"),
            stderr: var("error"),
            result: var("result"),
            expected,
            input,
            code_file,
        };

        debug!("Testcase {id}: {} checks", checks.len());
        let test = Testcase::builder()
            .id(id)
            .name(name)
            .points(points)
            .hidden(hidden)
            .expected_exit(expected_exit)
            .args(args)
            .paths(paths)
            .options(options)
            .code(code)
            .instrumented(instrumented)
            .compile(compile)
            .header(header)
            .checks(checks)
            .env(env)
            .build();
        self.testcases.push(test);
        Ok(())
    }

    /// Reads the whole configuration.
    fn read(mut self, text: &str, comment_marker: &str) -> Result<Plan> {
        let lines: Vec<&str> = text
            .lines()
            .map(|line| strip_comment(line, comment_marker))
            .collect();

        let mut idx = 0;
        while idx < lines.len() {
            let line = lines[idx];
            let line_no = idx + 1;
            idx += 1;

            if line.trim().is_empty() {
                continue;
            }
            if !line.starts_with(':') {
                return Err(ConfigError::ExpectedCommand {
                    source_name: self.source_name.to_string(),
                    line:        line_no,
                    text:        line.to_string(),
                }
                .into());
            }

            let (command, settings) = line
                .split_once(char::is_whitespace)
                .unwrap_or((line, ""));
            let command = command.to_lowercase();

            let takes_block = matches!(command.as_str(), ":compile" | ":header" | ":testcase");
            let mut block = Vec::new();
            if takes_block {
                while idx < lines.len() && !lines[idx].starts_with(':') {
                    if !lines[idx].trim().is_empty() {
                        block.push(lines[idx].to_string());
                    }
                    idx += 1;
                }
            }

            debug!("{}:{line_no}: {command}", self.source_name);
            match command.as_str() {
                ":init" => self.init(settings)?,
                ":compile" => {
                    self.ensure_init()?;
                    let vars = parse_settings(settings, &self.env)?;
                    self.env.extend(vars);
                    self.compile = block;
                }
                ":header" => {
                    self.ensure_init()?;
                    let vars = parse_settings(settings, &self.env)?;
                    self.env.extend(vars);
                    self.header = block;
                }
                ":output" => {
                    self.ensure_init()?;
                    self.output(settings)?;
                }
                ":testcase" => {
                    self.ensure_init()?;
                    self.testcase(settings, block)?;
                }
                _ => return Err(ConfigError::UnknownCommand(command).into()),
            }
        }

        self.ensure_init()?;
        let (dir, run_log) = match self.init_paths.take() {
            Some(paths) => paths,
            None => (PathBuf::new(), PathBuf::new()),
        };
        if self.outputs.is_empty() {
            self.outputs.push(OutputSink::console());
        }

        Ok(Plan {
            env: self.env,
            testcases: self.testcases,
            outputs: self.outputs,
            dir,
            run_log,
        })
    }
}

impl Plan {
    /// Parses configuration text.
    ///
    /// * `text`: the configuration
    /// * `source_name`: name used in error messages
    /// * `base_dir`: directory relative file settings are resolved from
    /// * `comment_marker`: instructor comment marker, eg. `///`
    pub fn parse(text: &str, source_name: &str, base_dir: &Path, comment_marker: &str) -> Result<Self> {
        Reader::new(source_name, base_dir).read(text, comment_marker)
    }

    /// Reads and parses the configuration at `path`. File settings are
    /// resolved from the current directory, like every generated path.
    pub fn load(path: &Path, comment_marker: &str) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Could not read configuration {}", path.display()))?;
        Self::parse(&text, &path.display().to_string(), Path::new(""), comment_marker)
    }

    /// Returns the final base variables.
    pub fn env(&self) -> &Env {
        &self.env
    }

    /// Returns the testcases.
    pub fn testcases(&self) -> &[Testcase] {
        &self.testcases
    }

    /// Mutable access to the testcases, for the pipeline.
    pub fn testcases_mut(&mut self) -> &mut [Testcase] {
        &mut self.testcases
    }

    /// Returns the report destinations.
    pub fn outputs(&self) -> &[OutputSink] {
        &self.outputs
    }

    /// Returns the testcases and the report destinations, for emitting
    /// reports.
    pub fn reports(&mut self) -> (&[Testcase], &mut [OutputSink]) {
        (&self.testcases, &mut self.outputs)
    }

    /// Returns the directory for generated files.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Returns the run log path.
    pub fn run_log(&self) -> &Path {
        &self.run_log
    }

    /// Creates `${dir}` and starts a fresh run log.
    pub fn prepare(&self) -> Result<()> {
        if !self.dir.as_os_str().is_empty() && !self.dir.exists() {
            info!("Creating {}", self.dir.display());
            fs::create_dir_all(&self.dir)
                .with_context(|| format!("Could not create {}", self.dir.display()))?;
        }
        if !self.run_log.as_os_str().is_empty() {
            write_file(&self.run_log, format!("{LOG_BANNER}\n\n"))?;
        }
        Ok(())
    }

    /// Appends the outcome of `test` to the run log.
    pub fn log_result(&self, test: &Testcase) -> Result<()> {
        if self.run_log.as_os_str().is_empty() {
            warn!("No run log configured; skipping testcase {}", test.id());
            return Ok(());
        }
        append_file(
            &self.run_log,
            format!(
                "Test {} ({}): {}; passed {} of {} checks; {} of {} points\n",
                test.id(),
                test.name(),
                test.status().label(),
                test.count_passed(),
                test.num_checks(),
                test.earned_points(),
                test.points()
            ),
        )
    }
}
