use std::fs::File;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use log::{LevelFilter, info};
use simplelog::{Config, WriteLogger};

use pdfloupe::decode::{DecodeStatus, DecodedStream, Structured};
use pdfloupe::document::DocumentSession;
use pdfloupe::graph::ObjectRef;
use pdfloupe::settings;
use pdfloupe::structure::{NodeKind, StructureTree};
use pdfloupe::view::ScrollRegion;

const DECODE_TIMEOUT: Duration = Duration::from_secs(30);
const HEX_ROW: usize = 16;

#[derive(Parser)]
#[command(name = "pdfloupe", version, about = "Explore the object structure of a PDF")]
struct Cli {
    /// Settings file (defaults to the user config directory)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Log file
    #[arg(long, value_name = "PATH", default_value = "pdfloupe.log")]
    log_file: PathBuf,

    /// Log at debug level regardless of settings
    #[arg(long, short)]
    verbose: bool,

    /// Document fixture (JSON object graph with page text)
    #[arg(value_name = "FIXTURE")]
    fixture: PathBuf,

    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Subcommand)]
enum CliCommand {
    /// Document info, outlines and signatures
    Info,
    /// Print the structure tree
    Tree {
        /// Expand nodes up to this depth
        #[arg(long, default_value_t = 2)]
        depth: usize,
    },
    /// Decode one stream object
    Stream {
        number: u32,
        #[arg(default_value_t = 0)]
        generation: u16,
    },
    /// Search page text
    Search { query: String },
}

fn main() -> Result<()> {
    better_panic::install();
    let cli = Cli::parse();

    match &cli.config {
        Some(path) => settings::load_settings_from_path(path),
        None => settings::load_settings(),
    }
    let level = if cli.verbose {
        LevelFilter::Debug
    } else {
        settings::current().level_filter()
    };
    WriteLogger::init(
        level,
        Config::default(),
        File::create(&cli.log_file)
            .with_context(|| format!("Failed to create log file {}", cli.log_file.display()))?,
    )?;

    info!("Starting pdfloupe on {}", cli.fixture.display());

    let mut session = DocumentSession::from_fixture_path(&cli.fixture)?;
    let result = match cli.command {
        CliCommand::Info => {
            print_info(&session);
            Ok(())
        }
        CliCommand::Tree { depth } => {
            print_tree(session.tree_mut(), depth);
            Ok(())
        }
        CliCommand::Stream { number, generation } => {
            print_stream(&mut session, ObjectRef::new(number, generation))
        }
        CliCommand::Search { query } => {
            print_search(&mut session, &query);
            Ok(())
        }
    };
    session.close();
    result
}

fn print_info(session: &DocumentSession) {
    let info = session.info();
    println!("{}", info.file_name);
    println!("  Pages: {}", info.page_count);
    println!("  Objects: {}", session.tree().graph().object_count());
    for (key, value) in &info.entries {
        println!("  {key}: {value}");
    }

    if !session.outlines().is_empty() {
        println!("Outlines");
        let mut stack: Vec<_> = session.outlines().iter().rev().map(|e| (1, e)).collect();
        while let Some((depth, entry)) = stack.pop() {
            println!(
                "{}{} .... {}",
                "  ".repeat(depth),
                entry.title,
                entry.page + 1
            );
            stack.extend(entry.children.iter().rev().map(|c| (depth + 1, c)));
        }
    }

    if !session.signatures().is_empty() {
        println!("Signatures");
        for sig in session.signatures() {
            println!(
                "  {} by {} on page {}{}",
                sig.field_name,
                sig.signer.as_deref().unwrap_or("unknown"),
                sig.page + 1,
                sig.value.map(|r| format!(" ({r})")).unwrap_or_default()
            );
        }
    }
}

fn print_tree(tree: &mut StructureTree, depth: usize) {
    tree.expand_to_depth(depth);
    for id in tree.visible_rows() {
        let Some(node) = tree.get(id) else {
            continue;
        };
        let marker = match (node.kind(), node.has_child(), node.is_expanded()) {
            (NodeKind::IndirectRefOnly, _, _) => "↺",
            (_, true, true) => "▾",
            (_, true, false) => "▸",
            _ => " ",
        };
        println!("{}{marker} {}", "  ".repeat(node.level()), node.summary());
    }
}

fn print_stream(session: &mut DocumentSession, target: ObjectRef) -> Result<()> {
    if session.open_stream_object(target).is_none() {
        bail!("{target} is not a stream object");
    }
    session.view_mut().wait_for_decodes(DECODE_TIMEOUT);
    let Some(stream) = session.view().displayed_stream().cloned() else {
        bail!("Stream panel closed before {target} was decoded");
    };
    print_decoded(&stream)
}

fn print_decoded(stream: &DecodedStream) -> Result<()> {
    println!("{} ({})", stream.target, stream.content.as_str());
    match &stream.status {
        DecodeStatus::Pending => bail!("Timed out decoding {}", stream.target),
        DecodeStatus::Failed(reason) => bail!("Failed to decode {}: {reason}", stream.target),
        DecodeStatus::Success => {}
    }
    if !stream.filters.is_empty() {
        println!("Filters: {}", stream.filters.join(", "));
    }
    println!("{} bytes", stream.raw.len());
    for (row, chunk) in stream.raw.chunks(HEX_ROW).enumerate() {
        let hex: Vec<String> = chunk.iter().map(|b| format!("{b:02x}")).collect();
        let text: String = chunk
            .iter()
            .map(|&b| if b.is_ascii_graphic() || b == b' ' { b as char } else { '.' })
            .collect();
        println!("{:08x}  {:<48} {text}", row * HEX_ROW, hex.join(" "));
    }

    match &stream.structured {
        Structured::NotApplicable => {}
        Structured::Parsed(tree) => {
            println!("Structure");
            for (depth, label) in tree.lines() {
                println!("{}{label}", "  ".repeat(depth + 1));
            }
        }
        Structured::Failed(reason) => println!("Structure unavailable: {reason}"),
    }
    Ok(())
}

fn print_search(session: &mut DocumentSession, query: &str) {
    let view = session.view_mut();
    view.set_search_query(query);
    let matches = view.search().matches.clone();
    println!("{} {}", query, view.search().match_info());
    for (i, m) in matches.iter().enumerate() {
        if i > 0 {
            view.next_match();
        }
        view.scroll_finish(ScrollRegion::PageList);
        println!(
            "  page {} bytes {}..{}  [{}]",
            m.page + 1,
            m.range.start,
            m.range.end,
            view.page_indicator()
        );
    }
}
