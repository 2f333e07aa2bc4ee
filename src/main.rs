//! Main entry point for the arcmap CLI application.
//!
//! This binary lists, inspects and extracts the contents of local ZIP
//! archives through cartography queries.

use anyhow::Result;
use clap::Parser;
use std::path::Path;

use arcmap::{Cartography, CartographyRequest, Cli, ExtractOptions, Tag, extract_files};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    // Extract mode: copy matching entries to disk and report
    if let Some(dir) = &cli.extract_dir {
        let options = ExtractOptions {
            overwrite: cli.overwrite,
            preserve_paths: !cli.junk_paths,
        };
        let matched = extract_files(&cli.archive, cli.filter.as_deref(), Path::new(dir), options)?;
        if !matched && !cli.is_quiet() {
            eprintln!("no entries matched");
        }
        return Ok(());
    }

    // Query mode: pick tags, build a cartography, print it
    let tags: Vec<Tag> = if !cli.info.is_empty() {
        cli.info.clone()
    } else if cli.verbose {
        vec![Tag::CompressionInfo, Tag::Time]
    } else {
        vec![Tag::FileInfo]
    };

    let mut request = CartographyRequest::new(cli.archive.clone())?
        .with_manifest(cli.manifest)
        .tags(tags);
    if let Some(pattern) = &cli.filter {
        request = request.filter(pattern.clone())?;
    }
    let cartography = request.build()?;

    if cli.manifest {
        print_manifest(&cartography);
    }
    if cli.verbose {
        print_verbose(&cartography);
    } else if cli.list || !cli.manifest {
        print_names(&cartography);
    }

    Ok(())
}

/// Simple format: entry names, one per line, in archive-path order.
fn print_names(cartography: &Cartography) {
    let mut names: Vec<&str> = cartography.resources().keys().map(String::as_str).collect();
    names.sort_unstable();
    for name in names {
        println!("{name}");
    }
}

/// Detailed table with size, compression ratio, and timestamps.
fn print_verbose(cartography: &Cartography) {
    println!(
        "{:>10}  {:>10}  {:>5}  {:>10}  {:>5}  Name",
        "Length", "Size", "Cmpr", "Date", "Time"
    );
    println!("{}", "-".repeat(70));

    let mut names: Vec<&String> = cartography.resources().keys().collect();
    names.sort_unstable();

    let mut total_uncompressed = 0u64;
    let mut total_compressed = 0u64;
    let mut file_count = 0usize;

    for name in names {
        let resource = &cartography.resources()[name];
        let length = resource.size.unwrap_or(0);
        let compressed = resource.compressed_size.unwrap_or(0);

        // Compression ratio as percentage saved
        let ratio = if length > 0 {
            format!("{:>4}%", 100 - (compressed * 100 / length))
        } else {
            "  0%".to_string()
        };

        let (date, time) = match resource.modified {
            Some(stamp) => {
                let (year, month, day) = stamp.ymd();
                let (hour, minute, _second) = stamp.hms();
                (
                    format!("{year:04}-{month:02}-{day:02}"),
                    format!("{hour:02}:{minute:02}"),
                )
            }
            None => (String::new(), String::new()),
        };

        println!("{length:>10}  {compressed:>10}  {ratio}  {date:>10}  {time:>5}  {name}");

        if !resource.is_directory {
            total_uncompressed += length;
            total_compressed += compressed;
            file_count += 1;
        }
    }

    println!("{}", "-".repeat(70));
    let total_ratio = if total_uncompressed > 0 {
        format!("{:>4}%", 100 - (total_compressed * 100 / total_uncompressed))
    } else {
        "  0%".to_string()
    };
    println!(
        "{total_uncompressed:>10}  {total_compressed:>10}  {total_ratio}  {:>19}  {file_count} files",
        ""
    );
}

/// Manifest attribute blocks: main first, then per-entry sections.
fn print_manifest(cartography: &Cartography) {
    if let Some(main) = cartography.manifest_main_attributes() {
        println!("[manifest]");
        for (key, value) in main {
            println!("  {key}: {value}");
        }
    }
    for entry in cartography.manifest_entries() {
        println!("[manifest entry: {entry}]");
        if let Some(attributes) = cartography.manifest_entry_attributes(entry) {
            for (key, value) in attributes {
                println!("  {key}: {value}");
            }
        }
    }
}
