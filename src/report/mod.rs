#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! Reports for one grading run, at eight levels of detail and in several
//! encodings.

/// Character-level output diffs.
pub mod diff;
/// Gradescope `results.json` output.
pub mod gradescope;
/// HTML encoding.
pub mod html;
/// Decides which parts of a testcase a report shows.
pub mod sections;
/// Plain text and terminal encodings.
pub mod text;

use std::{
    fmt::{self, Display},
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
    str::FromStr,
};

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::warn;

use self::{
    html::HtmlFormat,
    sections::{Section, plan_sections},
    text::TextFormat,
};
use crate::{error::ConfigError, testcase::Testcase};

/// How much a report reveals. Each level shows everything the level below it
/// shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Detail {
    /// Nothing at all.
    None,
    /// Overall percentage.
    Percent,
    /// Points earned out of points possible.
    Score,
    /// Pass/fail status of every testcase.
    Summary,
    /// Details of failed visible testcases.
    Student,
    /// Details of every failed testcase, hidden ones included.
    Instructor,
    /// Details of every testcase, passed ones included.
    Full,
    /// Everything, plus configuration and parsing details.
    Debug,
}

impl Detail {
    /// Title placed at the top of a report, if the level warrants one.
    pub fn title(self) -> Option<&'static str> {
        match self {
            Detail::None | Detail::Percent | Detail::Score => None,
            Detail::Summary => Some("Autograde Summary"),
            Detail::Student => Some("Autograde Results"),
            Detail::Instructor => Some("Autograde Results (Instructor Eyes Only)"),
            Detail::Full => Some("Autograde Results (All details)"),
            Detail::Debug => Some("Autograde Results (DEBUG mode)"),
        }
    }

    /// Name as written in configurations.
    pub fn name(self) -> &'static str {
        match self {
            Detail::None => "none",
            Detail::Percent => "percent",
            Detail::Score => "score",
            Detail::Summary => "summary",
            Detail::Student => "student",
            Detail::Instructor => "teacher",
            Detail::Full => "full",
            Detail::Debug => "debug",
        }
    }
}

impl FromStr for Detail {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "none" => Ok(Detail::None),
            "percent" => Ok(Detail::Percent),
            "score" => Ok(Detail::Score),
            "summary" => Ok(Detail::Summary),
            "student" => Ok(Detail::Student),
            "teacher" | "instructor" => Ok(Detail::Instructor),
            "full" => Ok(Detail::Full),
            "debug" => Ok(Detail::Debug),
            other => Err(ConfigError::UnknownDetail(other.to_string())),
        }
    }
}

impl Display for Detail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// How a report is encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Encoding {
    /// Plain text.
    Text,
    /// HTML fragments.
    Html,
    /// Text with terminal colours.
    Ansi,
    /// A Gradescope `results.json` document.
    Json,
}

impl Encoding {
    /// Maps a type name or file extension to an encoding.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "txt" | "text" => Some(Encoding::Text),
            "html" | "htm" => Some(Encoding::Html),
            "ansi" => Some(Encoding::Ansi),
            "json" => Some(Encoding::Json),
            _ => None,
        }
    }

    /// Like [`Encoding::from_name`], falling back to text with a warning.
    pub fn from_name_or_text(name: &str) -> Self {
        Self::from_name(name).unwrap_or_else(|| {
            warn!("Unknown output type '{name}'; using text.");
            Encoding::Text
        })
    }

    /// Encoding implied by a file name's extension.
    pub fn from_path(path: &Path) -> Self {
        let extension = path
            .extension()
            .map(|ext| ext.to_string_lossy().to_string())
            .unwrap_or_default();
        Self::from_name_or_text(&extension)
    }
}

/// Renders the parts of a report for one encoding.
pub trait Format {
    /// Title at the top of the report.
    fn title(&self, title: &str) -> String;

    /// One row per testcase plus totals.
    ///
    /// * `link_base`: prefix for links to per-testcase details, if any
    fn summary(&self, tests: &[Testcase], link_base: Option<&str>) -> String;

    /// One part of a testcase's details.
    fn section(&self, test: &Testcase, section: Section, detail: Detail) -> Result<String>;
}

/// Returns the formatter for an encoding. JSON reports embed text.
pub fn format_for(encoding: Encoding) -> Box<dyn Format> {
    match encoding {
        Encoding::Text | Encoding::Json => Box::new(TextFormat::plain()),
        Encoding::Ansi => Box::new(TextFormat::colored()),
        Encoding::Html => Box::new(HtmlFormat),
    }
}

/// Sum of all point values.
pub fn total_points(tests: &[Testcase]) -> f64 {
    tests.iter().map(Testcase::points).sum()
}

/// Sum of all earned points.
pub fn earned_points(tests: &[Testcase]) -> f64 {
    tests.iter().map(Testcase::earned_points).sum()
}

/// Rounded percentage of points earned. An empty suite scores 0.
pub fn percent(tests: &[Testcase]) -> f64 {
    let total = total_points(tests);
    if total <= 0.0 {
        return 0.0;
    }
    (100.0 * earned_points(tests) / total).round()
}

/// One destination for a report.
pub struct OutputSink {
    /// How much is shown.
    detail:   Detail,
    /// How it is encoded.
    encoding: Encoding,
    /// Destination file, or standard output when `None`.
    filename: Option<PathBuf>,
    /// Another report that summary rows link to.
    link_to:  Option<String>,
    /// Opened on first write.
    writer:   Option<Box<dyn Write>>,
}

impl fmt::Debug for OutputSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OutputSink")
            .field("detail", &self.detail)
            .field("encoding", &self.encoding)
            .field("filename", &self.filename)
            .field("link_to", &self.link_to)
            .field("opened", &self.writer.is_some())
            .finish()
    }
}

impl OutputSink {
    /// Creates a sink; nothing is opened until the first write.
    pub fn new(
        detail: Detail,
        encoding: Encoding,
        filename: Option<PathBuf>,
        link_to: Option<String>,
    ) -> Self {
        Self {
            detail,
            encoding,
            filename,
            link_to: link_to.filter(|link| !link.is_empty()),
            writer: None,
        }
    }

    /// The sink used when a configuration names none.
    pub fn console() -> Self {
        Self::new(Detail::Student, Encoding::Text, None, None)
    }

    /// Returns the detail level.
    pub fn detail(&self) -> Detail {
        self.detail
    }

    /// Returns the encoding.
    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    /// Returns the destination file, `None` for standard output.
    pub fn filename(&self) -> Option<&Path> {
        self.filename.as_deref()
    }

    /// Returns the linked report, if any.
    pub fn link_to(&self) -> Option<&str> {
        self.link_to.as_deref()
    }

    /// Where summary rows link to: this report when it carries details,
    /// otherwise the linked report, otherwise nowhere.
    pub fn link_base(&self) -> Option<String> {
        if self.detail >= Detail::Student {
            Some("#".to_string())
        } else {
            self.link_to.as_ref().map(|link| format!("{link}#"))
        }
    }

    /// The title block for this sink, empty below summary detail.
    pub fn preamble(&self) -> String {
        match (self.encoding, self.detail.title()) {
            (Encoding::Json, _) | (_, None) => String::new(),
            (encoding, Some(title)) => format_for(encoding).title(title),
        }
    }

    /// Renders the aggregate part of the report.
    pub fn render_aggregate(&self, tests: &[Testcase]) -> Result<String> {
        if self.encoding == Encoding::Json {
            return gradescope::render(tests, self.detail);
        }

        Ok(match self.detail {
            Detail::None => String::new(),
            Detail::Percent => format!("{}%\n", percent(tests)),
            Detail::Score => format!("{} of {}\n", earned_points(tests), total_points(tests)),
            _ => format_for(self.encoding).summary(tests, self.link_base().as_deref()),
        })
    }

    /// Renders the details of one testcase.
    pub fn render_testcase(&self, test: &Testcase) -> Result<String> {
        if self.encoding == Encoding::Json {
            return Ok(String::new());
        }
        render_sections(test, self.detail, self.encoding)
    }

    /// Writes `text`, opening the destination (and writing the title) first
    /// if this is the first write.
    pub fn write_str(&mut self, text: &str) -> Result<()> {
        if text.is_empty() {
            return Ok(());
        }

        if self.writer.is_none() {
            let mut writer: Box<dyn Write> = match &self.filename {
                Some(path) => {
                    if let Some(parent) = path.parent()
                        && !parent.as_os_str().is_empty()
                    {
                        fs::create_dir_all(parent).with_context(|| {
                            format!("Could not create directory {}", parent.display())
                        })?;
                    }
                    Box::new(io::BufWriter::new(fs::File::create(path).with_context(
                        || format!("Could not create report {}", path.display()),
                    )?))
                }
                None => Box::new(io::stdout()),
            };
            writer
                .write_all(self.preamble().as_bytes())
                .context("Could not write report title")?;
            self.writer = Some(writer);
        }

        if let Some(writer) = self.writer.as_mut() {
            writer
                .write_all(text.as_bytes())
                .context("Could not write report")?;
        }
        Ok(())
    }

    /// Flushes the destination, if it was ever opened.
    pub fn flush(&mut self) -> Result<()> {
        if let Some(writer) = self.writer.as_mut() {
            writer.flush().context("Could not flush report")?;
        }
        Ok(())
    }
}

/// Renders every planned section of `test`.
pub fn render_sections(test: &Testcase, detail: Detail, encoding: Encoding) -> Result<String> {
    let format = format_for(encoding);
    let mut out = String::new();
    for section in plan_sections(test, detail) {
        out.push_str(&format.section(test, section, detail)?);
    }
    Ok(out)
}

/// Renders a complete report for one sink into a string, title included.
pub fn render(sink: &OutputSink, tests: &[Testcase]) -> Result<String> {
    let mut out = String::new();
    let aggregate = sink.render_aggregate(tests)?;
    let mut details = String::new();
    for test in tests {
        details.push_str(&sink.render_testcase(test)?);
    }

    if !aggregate.is_empty() || !details.is_empty() {
        out.push_str(&sink.preamble());
    }
    out.push_str(&aggregate);
    out.push_str(&details);
    Ok(out)
}

/// Writes every sink's report: first the aggregate of each sink, then the
/// details of each testcase in order.
pub fn emit(sinks: &mut [OutputSink], tests: &[Testcase]) -> Result<()> {
    for sink in sinks.iter_mut() {
        let aggregate = sink.render_aggregate(tests)?;
        sink.write_str(&aggregate)?;
    }

    for test in tests {
        for sink in sinks.iter_mut() {
            let details = sink.render_testcase(test)?;
            sink.write_str(&details)?;
        }
    }

    for sink in sinks.iter_mut() {
        sink.flush()?;
    }
    Ok(())
}
