//! journal-updater CLI - produce the next journal issue from a templated DOCX

use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use log::debug;

use journal_updater::journal::{current_month_year, AssociateEditor, DEFAULT_FOOTER_LABEL};
use journal_updater::{
    find_toc_titles, load_document, map_pages_to_paragraphs, update_journal,
    validate_issue_number_and_volume, ExportOutcome, UpdateOptions, UpdateReport,
};

#[derive(Parser)]
#[command(name = "journal-updater")]
#[command(author = "iyulab")]
#[command(version)]
#[command(about = "Produce the next journal issue from last issue's DOCX", long_about = None)]
struct Cli {
    /// Last issue's DOCX
    #[arg(value_name = "BASE")]
    base: Option<PathBuf>,

    /// Directory with article*.docx, president_message.txt and instructions.json
    #[arg(value_name = "CONTENT")]
    content: Option<PathBuf>,

    /// Output DOCX
    #[arg(value_name = "OUTPUT")]
    output: Option<PathBuf>,

    #[command(flatten)]
    flags: UpdateFlags,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Update an issue (default command)
    Update {
        /// Last issue's DOCX
        #[arg(value_name = "BASE")]
        base: PathBuf,

        /// Directory with article*.docx, president_message.txt and instructions.json
        #[arg(value_name = "CONTENT")]
        content: PathBuf,

        /// Output DOCX
        #[arg(value_name = "OUTPUT")]
        output: PathBuf,

        #[command(flatten)]
        flags: UpdateFlags,
    },

    /// Check that volume/issue and year appear exactly once
    Validate {
        /// Document to check
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Expected volume
        #[arg(long)]
        volume: String,

        /// Expected issue
        #[arg(long)]
        issue: String,

        /// Expected year
        #[arg(long)]
        year: String,
    },

    /// Show the page map derived from manual page breaks
    Pages {
        /// Document to inspect
        #[arg(value_name = "FILE")]
        input: PathBuf,
    },

    /// List article titles found in the table of contents
    Toc {
        /// Document to inspect
        #[arg(value_name = "FILE")]
        input: PathBuf,
    },

    /// Show version information
    Version,
}

#[derive(Args, Clone, Debug)]
struct UpdateFlags {
    /// Volume number
    #[arg(long, env = "JOURNAL_VOLUME", default_value = "1")]
    volume: String,

    /// Issue number
    #[arg(long, env = "JOURNAL_ISSUE", default_value = "1")]
    issue: String,

    /// Issue date line (defaults to the current month and year)
    #[arg(long)]
    month_year: Option<String>,

    /// Section title under the cover date (empty to omit)
    #[arg(long, default_value = "Update Articles")]
    section_title: String,

    /// Page number printed on the cover
    #[arg(long, default_value = "1")]
    cover_page: u32,

    /// Page number printed in the page-2 header
    #[arg(long, default_value = "2")]
    header_page: u32,

    /// Header text (defaults to volume/issue, date and section title)
    #[arg(long)]
    header_text: Option<String>,

    /// Remove old articles from this page instead of by landmark
    #[arg(long)]
    start_page: Option<u32>,

    /// Article to append (repeatable; discovered in CONTENT when omitted)
    #[arg(long = "article", value_name = "FILE")]
    articles: Vec<PathBuf>,

    /// Stale year to strip from business information
    #[arg(long, requires = "new_beginning")]
    old_year: Option<String>,

    /// New first sentence of the subscription paragraph
    #[arg(long, requires = "old_year")]
    new_beginning: Option<String>,

    /// Associate editor to replace, as "OLD|NAME|AFFILIATION|EMAIL"
    #[arg(long, value_name = "SPEC")]
    associate_editor: Option<String>,

    /// Assistant editor to remove (repeatable)
    #[arg(long = "remove-assistant", value_name = "NAME")]
    remove_assistants: Vec<String>,

    /// Literal label to strip from the body (repeatable)
    #[arg(long = "remove-label", value_name = "TEXT")]
    remove_labels: Vec<String>,

    /// Skip cover centering and the footer table
    #[arg(long)]
    no_format: bool,

    /// Left-hand footer text
    #[arg(long, default_value = DEFAULT_FOOTER_LABEL)]
    footer_label: String,

    /// Skip PDF export
    #[arg(long)]
    no_pdf: bool,

    /// Validate volume/issue and year after saving
    #[arg(long)]
    validate: bool,

    /// Print the run report as JSON
    #[arg(long)]
    json: bool,
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    let result = match cli.command {
        Some(Commands::Update {
            base,
            content,
            output,
            flags,
        }) => cmd_update(&base, &content, &output, &flags),
        Some(Commands::Validate {
            input,
            volume,
            issue,
            year,
        }) => cmd_validate(&input, &volume, &issue, &year),
        Some(Commands::Pages { input }) => cmd_pages(&input),
        Some(Commands::Toc { input }) => cmd_toc(&input),
        Some(Commands::Version) => {
            cmd_version();
            Ok(())
        }
        None => {
            // Default behavior: update if all three paths are provided
            if let (Some(base), Some(content), Some(output)) = (cli.base, cli.content, cli.output) {
                cmd_update(&base, &content, &output, &cli.flags)
            } else {
                println!(
                    "{}",
                    "Usage: journal-updater <BASE> <CONTENT> <OUTPUT> [OPTIONS]".yellow()
                );
                println!("       journal-updater --help for more information");
                Ok(())
            }
        }
    };

    if let Err(e) = result {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

fn parse_associate_editor(spec: &str) -> Result<AssociateEditor, String> {
    let parts: Vec<&str> = spec.split('|').map(str::trim).collect();
    match parts.as_slice() {
        [remove_name, name, affiliation, email] if !remove_name.is_empty() => Ok(AssociateEditor {
            remove_name: remove_name.to_string(),
            name: name.to_string(),
            affiliation: affiliation.to_string(),
            email: email.to_string(),
        }),
        _ => Err(format!(
            "Invalid associate editor '{}': expected OLD|NAME|AFFILIATION|EMAIL",
            spec
        )),
    }
}

fn build_options(args: &UpdateFlags) -> Result<UpdateOptions, String> {
    let month_year = args.month_year.clone().unwrap_or_else(current_month_year);
    let mut options = UpdateOptions::new()
        .with_issue(args.volume.as_str(), args.issue.as_str())
        .with_month_year(month_year)
        .with_section_title(args.section_title.as_str())
        .with_page_numbers(args.cover_page, args.header_page)
        .with_front_and_footer(!args.no_format)
        .with_footer_label(args.footer_label.as_str())
        .with_pdf_export(!args.no_pdf);

    if let Some(text) = &args.header_text {
        options = options.with_header_text(text.as_str());
    }
    if let Some(page) = args.start_page {
        options = options.with_start_page(page);
    }
    if !args.articles.is_empty() {
        options = options.with_article_files(args.articles.clone());
    }
    if let (Some(old_year), Some(new_beginning)) = (&args.old_year, &args.new_beginning) {
        options = options.with_business(old_year.as_str(), new_beginning.as_str());
    }
    if let Some(spec) = &args.associate_editor {
        options = options.with_associate_editor(parse_associate_editor(spec)?);
    }
    for name in &args.remove_assistants {
        options = options.remove_assistant_editor(name.as_str());
    }
    for label in &args.remove_labels {
        options = options.remove_label(label.as_str());
    }
    Ok(options)
}

fn cmd_update(
    base: &Path,
    content: &Path,
    output: &Path,
    flags: &UpdateFlags,
) -> Result<(), Box<dyn std::error::Error>> {
    let options = build_options(flags)?;
    debug!("Update options: {:?}", options);

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap(),
    );
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb.set_message(format!("Updating {}...", base.display()));

    let report = update_journal(base, content, output, &options);
    pb.finish_and_clear();
    let report = report?;

    if flags.validate {
        let doc = load_document(&report.output)?;
        let year = options.issue.year().unwrap_or_default();
        validate_issue_number_and_volume(&doc, &report.volume, &report.issue, year)?;
    }

    if flags.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report, flags.validate);
    }
    Ok(())
}

fn print_report(report: &UpdateReport, validated: bool) {
    println!(
        "{} Volume {}, Issue {}",
        "Updated".green().bold(),
        report.volume,
        report.issue
    );
    println!(
        "  {} removal: {:?}, {} blocks",
        "├─".dimmed(),
        report.removal.strategy,
        report.removal.removed
    );
    println!(
        "  {} articles: {} appended from block {}",
        "├─".dimmed(),
        report.articles_appended.len(),
        report.insertion_index
    );
    for path in &report.articles_appended {
        println!("  {}   {}", "│".dimmed(), path.display());
    }
    if report.passes_run > 0 {
        println!("  {} finishing passes: {}", "├─".dimmed(), report.passes_run);
    }
    if validated {
        println!("  {} validation: {}", "├─".dimmed(), "passed".green());
    }
    match &report.export {
        ExportOutcome::Exported(pdf) => println!("  {} pdf: {}", "├─".dimmed(), pdf.display()),
        ExportOutcome::Skipped => println!("  {} pdf: {}", "├─".dimmed(), "skipped".dimmed()),
        ExportOutcome::Failed(message) => {
            println!("  {} pdf: {} ({})", "├─".dimmed(), "failed".yellow(), message)
        }
    }
    println!("  {} {}", "└─".dimmed(), report.output.display());
}

fn cmd_validate(
    input: &Path,
    volume: &str,
    issue: &str,
    year: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let doc = load_document(input)?;
    validate_issue_number_and_volume(&doc, volume, issue, year)?;
    println!(
        "{} Volume {}, Issue {} ({})",
        "Valid".green().bold(),
        volume,
        issue,
        year
    );
    Ok(())
}

fn page_summary(input: &Path) -> Result<Vec<String>, Box<dyn std::error::Error>> {
    let doc = load_document(input)?;
    let snapshot = doc.snapshot();
    let pages = map_pages_to_paragraphs(&doc);

    let mut lines = Vec::new();
    for (page, blocks) in pages.pages() {
        let first = blocks
            .iter()
            .map(|&i| snapshot[i].text.trim())
            .find(|t| !t.is_empty())
            .unwrap_or("");
        lines.push(format!("{:>4}  {:>5} blocks  {}", page, blocks.len(), first));
    }
    Ok(lines)
}

fn cmd_pages(input: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let lines = page_summary(input)?;
    println!("{}", "Page Map".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());
    for line in &lines {
        println!("{}", line);
    }
    println!("{}", "─".repeat(40).dimmed());
    println!("{}: {}", "Pages".bold(), lines.len());
    Ok(())
}

fn cmd_toc(input: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let doc = load_document(input)?;
    let titles = find_toc_titles(&doc);
    if titles.is_empty() {
        println!("{}", "No table of contents titles found".yellow());
        return Ok(());
    }
    println!("{}", "Table of Contents".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());
    for (i, title) in titles.iter().enumerate() {
        println!("{:>3}. {}", i + 1, title);
    }
    Ok(())
}

fn cmd_version() {
    println!(
        "{} {}",
        "journal-updater".cyan().bold(),
        env!("CARGO_PKG_VERSION")
    );
    println!("Journal issue DOCX updater");
    println!();
    println!(
        "Repository: {}",
        "https://github.com/iyulab/journal-updater".dimmed()
    );
    println!("License: MIT");
}

#[cfg(test)]
mod tests {
    use super::*;
    use journal_updater::Document;

    fn args(extra: &[&str]) -> UpdateFlags {
        let mut argv = vec!["journal-updater", "base.docx", "content", "out.docx"];
        argv.extend_from_slice(extra);
        let cli = Cli::try_parse_from(argv).unwrap();
        assert_eq!(cli.output, Some(PathBuf::from("out.docx")));
        cli.flags
    }

    #[test]
    fn test_default_update_arguments() {
        let options = build_options(&args(&["--month-year", "July 2025"])).unwrap();
        assert_eq!(options.issue.label(), "Volume 1, Issue 1");
        assert_eq!(options.issue.section_title.as_deref(), Some("Update Articles"));
        assert_eq!((options.cover_page_num, options.header_page_num), (1, 2));
        assert!(options.article_files.is_none());
        assert!(options.export_pdf);
    }

    #[test]
    fn test_update_flags() {
        let options = build_options(&args(&[
            "--volume",
            "4",
            "--issue",
            "6",
            "--start-page",
            "3",
            "--article",
            "a.docx",
            "--remove-assistant",
            "Jane Roe",
            "--associate-editor",
            "Old Name|New Name|Uni|new@uni.edu",
            "--no-pdf",
        ]))
        .unwrap();
        assert_eq!(options.issue.label(), "Volume 4, Issue 6");
        assert_eq!(options.start_page, Some(3));
        assert_eq!(options.article_files, Some(vec![PathBuf::from("a.docx")]));
        assert_eq!(options.assistant_editor_removals, vec!["Jane Roe".to_string()]);
        assert_eq!(options.associate_editor.unwrap().email, "new@uni.edu");
        assert!(!options.export_pdf);
    }

    #[test]
    fn test_bad_associate_editor() {
        assert!(parse_associate_editor("only|three|parts").is_err());
    }

    #[test]
    fn test_subcommand_parsing() {
        let cli = Cli::try_parse_from(["journal-updater", "toc", "issue.docx"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Toc { .. })));
        assert!(cli.base.is_none());

        let cli = Cli::try_parse_from([
            "journal-updater",
            "update",
            "base.docx",
            "content",
            "out.docx",
            "--volume",
            "9",
        ])
        .unwrap();
        match cli.command {
            Some(Commands::Update { flags, .. }) => assert_eq!(flags.volume, "9"),
            _ => panic!("expected update"),
        }
    }

    #[test]
    fn test_page_summary() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("issue.docx");
        let mut doc = Document::new();
        doc.add_paragraph("Cover");
        doc.add_page_break();
        doc.add_paragraph("Inside");
        doc.save(&path).unwrap();

        let lines = page_summary(&path).unwrap();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with("Cover"));
        assert!(lines[1].ends_with("Inside"));
    }
}
