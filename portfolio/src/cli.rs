//! Command-line interface definitions for portfolio

use clap::{Parser, Subcommand, ValueEnum};
use portfolio::export::ExportFormat;
use std::path::PathBuf;

/// Output format for the export command
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// ZIP archive with one image per captured region
    Images,
    /// A4 PDF with titles and images
    Pdf,
    /// Microsoft Word DOCX format
    Docx,
}

impl From<OutputFormat> for ExportFormat {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Images => ExportFormat::Images,
            OutputFormat::Pdf => ExportFormat::Pdf,
            OutputFormat::Docx => ExportFormat::Docx,
        }
    }
}

/// Position of a portfolio-wide switch
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Switch {
    On,
    Off,
}

impl From<Switch> for bool {
    fn from(switch: Switch) -> Self {
        matches!(switch, Switch::On)
    }
}

/// CLI structure for the portfolio application
#[derive(Parser)]
#[command(name = "portfolio")]
#[command(version)]
#[command(about = "Chapter outline editor and exporter for portfolio documents", long_about = None)]
pub struct Cli {
    /// Portfolio document (JSON)
    #[arg(short, long, global = true, default_value = "portfolio.json")]
    pub file: PathBuf,

    /// Configuration file (defaults to portfolio.toml next to the document)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// The subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands for portfolio
#[derive(Subcommand)]
pub enum Commands {
    /// Create a new portfolio document with one chapter
    Init {
        /// Portfolio title
        #[arg(short, long)]
        title: Option<String>,

        /// Overwrite an existing document
        #[arg(long)]
        force: bool,
    },

    #[command(flatten)]
    Document(DocumentCommand),
}

/// Subcommands working on an existing document
///
/// Chapters are addressed by their hierarchy number, e.g. `2-1`.
#[derive(Subcommand)]
pub enum DocumentCommand {
    /// Print the chapter outline
    Show,

    /// Append a top-level chapter
    Add,

    /// Delete a chapter
    Delete {
        hierarchy: String,

        /// Skip the confirmation question
        #[arg(short, long)]
        yes: bool,
    },

    /// Delete hidden contents in every chapter
    DeleteHidden {
        /// Skip the confirmation question
        #[arg(short, long)]
        yes: bool,
    },

    /// Switch the header on or off in every chapter
    Header { state: Switch },

    /// Switch the footer on or off in every chapter
    Footer { state: Switch },

    /// Move a chapter up (negative) or down (positive)
    Move {
        hierarchy: String,

        #[arg(allow_negative_numbers = true)]
        offset: isize,
    },

    /// Move a chapter one level deeper
    Indent { hierarchy: String },

    /// Move a chapter one level up
    Outdent { hierarchy: String },

    /// Copy a chapter behind its subtree
    Clone {
        hierarchy: String,

        /// Copy the subchapters too
        #[arg(short, long)]
        subchapters: bool,
    },

    /// Set the label of a chapter
    Label { hierarchy: String, text: String },

    /// Drag a chapter onto another chapter's position
    Drag { from: String, to: String },

    /// Show which operations are possible for a chapter
    Capabilities { hierarchy: String },

    /// Export chapters from pre-rendered captures
    Export {
        /// Directory holding `<hierarchy>[_<region>].<ext>` captures
        #[arg(short, long)]
        images: PathBuf,

        /// Output format
        #[arg(long, value_enum, default_value = "pdf")]
        format: OutputFormat,

        /// Directory the export file is written to
        #[arg(short, long, default_value = ".")]
        out: PathBuf,

        /// Include the cover page (needs a `cover.*` capture);
        /// defaults to the document's `showCoverPage`
        #[arg(long)]
        cover: bool,

        /// Leave the cover page out
        #[arg(long, conflicts_with = "cover")]
        no_cover: bool,

        /// Comma-separated hierarchy numbers to export (defaults to all)
        #[arg(long, value_delimiter = ',')]
        chapters: Vec<String>,
    },
}
