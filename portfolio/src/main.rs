//! portfolio - chapter outline editor and exporter
//!
//! Edits the chapter outline of a portfolio document stored as JSON and
//! exports chosen chapters as images, PDF or DOCX.

#![deny(unsafe_code)]
#![cfg_attr(all(not(debug_assertions), not(test)), deny(clippy::all))]
#![cfg_attr(all(not(debug_assertions), not(test)), deny(clippy::pedantic))]
// Allow some pedantic lints that are too strict for this project
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands, DocumentCommand, OutputFormat, Switch};
use portfolio::config::CONFIG_FILE_NAME;
use portfolio::export::{CancellationToken, DirectoryDelivery, DirectorySurface, ExportOutcome};
use portfolio::{HeaderFooter, HierarchyPath, Portfolio, PortfolioConfig, PortfolioDocument};
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

/// Main entry point for the portfolio CLI application
fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {:?}", e);
        std::process::exit(1);
    }
}

/// Run the CLI application
fn run() -> Result<()> {
    let cli = Cli::parse();

    if cli.verbose {
        env_logger::Builder::from_default_env()
            .filter_level(log::LevelFilter::Info)
            .init();
    } else {
        env_logger::init();
    }

    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| default_config_path(&cli.file));
    let config = PortfolioConfig::load_or_default(&config_path)
        .with_context(|| format!("Failed to load configuration {}", config_path.display()))?;

    match cli.command {
        Commands::Init { title, force } => {
            handle_init_command(&cli.file, &config, title.as_deref(), force)
        }
        Commands::Document(command) => handle_document_command(&cli.file, &config, command),
    }
}

/// Handle a command on an existing document, saving it when it changed
fn handle_document_command(
    file: &Path,
    config: &PortfolioConfig,
    command: DocumentCommand,
) -> Result<()> {
    let document = PortfolioDocument::load(file)
        .with_context(|| format!("Failed to open portfolio {}", file.display()))?;
    let mut portfolio = Portfolio::new(document, config.max_depth, config.dictionary());

    let mut switched = None;
    let modified = match command {
        DocumentCommand::Show => {
            print_outline(&portfolio);
            false
        }
        DocumentCommand::Add => portfolio.add_chapter().is_some(),
        DocumentCommand::Delete { hierarchy, yes } => {
            let index = resolve(&portfolio, &hierarchy)?;
            if yes {
                portfolio.delete_chapter(index, &mut |_: &str, _: &str| true)
            } else {
                portfolio.delete_chapter(index, &mut ask)
            }
        }
        DocumentCommand::DeleteHidden { yes } => {
            let removed = if yes {
                portfolio.delete_hidden(&mut |_: &str, _: &str| true)
            } else {
                portfolio.delete_hidden(&mut ask)
            };
            removed.is_some_and(|count| count > 0)
        }
        DocumentCommand::Header { state } => {
            switched = Some((HeaderFooter::Header, state));
            toggle_header_footer(&mut portfolio, HeaderFooter::Header, state)
        }
        DocumentCommand::Footer { state } => {
            switched = Some((HeaderFooter::Footer, state));
            toggle_header_footer(&mut portfolio, HeaderFooter::Footer, state)
        }
        DocumentCommand::Move { hierarchy, offset } => {
            let index = resolve(&portfolio, &hierarchy)?;
            portfolio.move_chapter(index, offset).is_some()
        }
        DocumentCommand::Indent { hierarchy } => {
            let index = resolve(&portfolio, &hierarchy)?;
            portfolio.change_hierarchy(index, 1).is_some()
        }
        DocumentCommand::Outdent { hierarchy } => {
            let index = resolve(&portfolio, &hierarchy)?;
            portfolio.change_hierarchy(index, -1).is_some()
        }
        DocumentCommand::Clone {
            hierarchy,
            subchapters,
        } => {
            let index = resolve(&portfolio, &hierarchy)?;
            portfolio.clone_chapter(index, subchapters).is_some()
        }
        DocumentCommand::Label { hierarchy, text } => {
            let index = resolve(&portfolio, &hierarchy)?;
            portfolio.set_label(index, &text)
        }
        DocumentCommand::Drag { from, to } => {
            let source = resolve(&portfolio, &from)?;
            let target = resolve(&portfolio, &to)?;
            portfolio.begin_drag(source);
            portfolio.drag_enter(target);
            portfolio.end_drag().is_some()
        }
        DocumentCommand::Capabilities { hierarchy } => {
            let index = resolve(&portfolio, &hierarchy)?;
            if let Some(capabilities) = portfolio.capabilities(index) {
                println!("{:#?}", capabilities);
            }
            false
        }
        DocumentCommand::Export {
            images,
            format,
            out,
            cover,
            no_cover,
            chapters,
        } => {
            let choice = if cover {
                Some(true)
            } else if no_cover {
                Some(false)
            } else {
                None
            };
            let cover = portfolio.outline().list().include_cover(choice);
            handle_export_command(&mut portfolio, config, &images, format, &out, cover, &chapters)?;
            false
        }
    };

    for announcement in portfolio.take_announcements() {
        println!("{}", announcement);
    }

    if modified || switched.is_some() {
        let mut document = portfolio.into_list();
        if let Some((part, state)) = switched {
            document.set_header_footer(part, state.into());
        }
        document
            .save(file)
            .with_context(|| format!("Failed to save portfolio {}", file.display()))?;
    }

    Ok(())
}

/// `portfolio.toml` next to the document
fn default_config_path(document: &Path) -> PathBuf {
    document
        .parent()
        .map(|dir| dir.join(CONFIG_FILE_NAME))
        .unwrap_or_else(|| PathBuf::from(CONFIG_FILE_NAME))
}

/// Handle the init command
fn handle_init_command(
    file: &Path,
    config: &PortfolioConfig,
    title: Option<&str>,
    force: bool,
) -> Result<()> {
    if file.exists() && !force {
        anyhow::bail!(
            "{} already exists. Use --force to overwrite it.",
            file.display()
        );
    }

    let document = PortfolioDocument::new(title.unwrap_or_default());
    let portfolio = Portfolio::new(document, config.max_depth, config.dictionary());
    portfolio
        .into_list()
        .save(file)
        .with_context(|| format!("Failed to write portfolio {}", file.display()))?;

    println!("✓ Created {}", file.display());
    Ok(())
}

/// Handle the export command
fn handle_export_command(
    portfolio: &mut Portfolio<PortfolioDocument>,
    config: &PortfolioConfig,
    images: &Path,
    format: OutputFormat,
    out: &Path,
    cover: bool,
    chapters: &[String],
) -> Result<()> {
    let information = portfolio.chapters_information();

    let wanted = chapters
        .iter()
        .map(|text| {
            HierarchyPath::parse(text)
                .filter(|path| information.iter().any(|info| &info.hierarchy == path))
                .with_context(|| format!("No chapter {}", text))
        })
        .collect::<Result<Vec<_>>>()?;

    let cover_title = if cover {
        let title = portfolio.outline().list().title.clone();
        Some(if title.is_empty() {
            portfolio.dictionary().get("l10n.cover")
        } else {
            title
        })
    } else {
        None
    };

    let mut choices = Vec::with_capacity(information.len() + 1);
    if cover_title.is_some() {
        choices.push(true);
    }
    choices.extend(
        information
            .iter()
            .map(|info| wanted.is_empty() || wanted.contains(&info.hierarchy)),
    );

    let request = portfolio.export_request(&choices, format.into(), cover_title.as_deref());
    let mut surface = DirectorySurface::new(images, config.export.image_quality);
    let mut delivery = DirectoryDelivery::new(out);
    let cancel = CancellationToken::new();

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;

    let outcome = runtime.block_on(async {
        let token = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                token.cancel();
            }
        });

        portfolio
            .export(
                &request,
                config.export_settings(),
                &mut surface,
                &mut delivery,
                cancel,
                &mut |header: &str, text: &str| {
                    eprintln!("{}: {}", header, text);
                    true
                },
            )
            .await
    });

    for announcement in portfolio.take_announcements() {
        println!("{}", announcement);
    }

    match outcome {
        ExportOutcome::Delivered { filename } => {
            println!("✓ Successfully wrote: {}", out.join(filename).display());
            Ok(())
        }
        ExportOutcome::Cancelled | ExportOutcome::NothingToExport => Ok(()),
        ExportOutcome::Failed(message) => anyhow::bail!(message),
    }
}

/// Switch the header or footer in every chapter
fn toggle_header_footer(
    portfolio: &mut Portfolio<PortfolioDocument>,
    part: HeaderFooter,
    state: Switch,
) -> bool {
    portfolio.toggle_header_footer(part, state.into()) > 0
}

/// Map a hierarchy number to its chapter index
fn resolve(portfolio: &Portfolio<PortfolioDocument>, hierarchy: &str) -> Result<usize> {
    HierarchyPath::parse(hierarchy)
        .and_then(|path| portfolio.outline().index_of(&path))
        .with_context(|| format!("No chapter {}", hierarchy))
}

/// Print the outline, indented by level
fn print_outline(portfolio: &Portfolio<PortfolioDocument>) {
    let title = &portfolio.outline().list().title;
    if !title.is_empty() {
        println!("{}", title);
    }

    for info in portfolio.chapters_information() {
        let indent = "  ".repeat(info.hierarchy.depth() - 1);
        println!("{}{}  {}", indent, info.hierarchy, info.title);
    }
}

/// Ask a yes/no question on the terminal
fn ask(header: &str, text: &str) -> bool {
    print!("{}\n{} [y/N] ", header, text);
    if std::io::stdout().flush().is_err() {
        return false;
    }

    let mut answer = String::new();
    if std::io::stdin().lock().read_line(&mut answer).is_err() {
        return false;
    }
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}
