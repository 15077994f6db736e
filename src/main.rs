//! embedfs CLI - pack directories into embedded blobs and inspect them.
//!
//! This is the main entry point for the embedfs command-line application.

use std::collections::HashSet;
use std::fs;
use std::io::{self, Write};
use std::path::{Component, Path, PathBuf};
use std::time::Instant;

use anyhow::{anyhow, bail, Context, Result};
use clap::builder::FalseyValueParser;
use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;
use walkdir::WalkDir;

use embedfs::prelude::*;
use embedfs::store::format::MAX_NAME_LEN;

/// embedfs - embedded resource blob tool
#[derive(Parser)]
#[command(name = "embedfs")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Use little-endian 4-byte fields instead of big-endian
    #[arg(
        long,
        global = true,
        env = "EMBEDFS_LITTLE_ENDIAN",
        value_parser = FalseyValueParser::new()
    )]
    little_endian: bool,

    /// Do not check the header bin count against the buckets
    #[arg(long, global = true)]
    trust_header: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct BlobArg {
    /// Path to the blob file
    #[arg(short, long, env = "EMBEDFS_BLOB")]
    blob: PathBuf,
}

#[derive(Subcommand)]
enum Commands {
    /// Pack directories into a blob
    Pack {
        /// Directory whose subdirectories become buckets (sorted by name)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Extra bucket as NAME=DIR, appended in the order given
        #[arg(long = "bucket", value_name = "NAME=DIR")]
        buckets: Vec<String>,

        /// Output blob file
        #[arg(short, long)]
        output: PathBuf,
    },

    /// List buckets, or the bins of one bucket
    List {
        #[command(flatten)]
        blob: BlobArg,

        /// List the bins of this bucket
        #[arg(long)]
        bucket: Option<String>,

        /// Print a JSON array instead of one name per line
        #[arg(long)]
        json: bool,
    },

    /// Write one bin's payload to stdout or a file
    Cat {
        #[command(flatten)]
        blob: BlobArg,

        /// Bin name
        name: String,

        /// Look only in this bucket instead of all of them
        #[arg(long)]
        bucket: Option<String>,

        /// Output file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Extract every bin to BUCKET/NAME below a directory
    Extract {
        #[command(flatten)]
        blob: BlobArg,

        /// Output directory
        #[arg(short, long)]
        output: PathBuf,

        /// Filter pattern over "bucket/name" (glob syntax)
        #[arg(short, long)]
        filter: Option<String>,
    },

    /// Show blob statistics and shadowed names
    Info {
        #[command(flatten)]
        blob: BlobArg,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let options = ParseOptions::new()
        .byte_order(if cli.little_endian {
            Endian::Little
        } else {
            Endian::Big
        })
        .verify_counts(!cli.trust_header);

    match cli.command {
        Commands::Pack {
            input,
            buckets,
            output,
        } => {
            cmd_pack(input.as_deref(), &buckets, &output, options.endian)?;
        }
        Commands::List { blob, bucket, json } => {
            cmd_list(&blob.blob, options, bucket.as_deref(), json)?;
        }
        Commands::Cat {
            blob,
            name,
            bucket,
            output,
        } => {
            cmd_cat(&blob.blob, options, &name, bucket.as_deref(), output.as_deref())?;
        }
        Commands::Extract {
            blob,
            output,
            filter,
        } => {
            cmd_extract(&blob.blob, options, &output, filter.as_deref())?;
        }
        Commands::Info { blob } => {
            cmd_info(&blob.blob, options)?;
        }
    }

    Ok(())
}

fn open_store(path: &Path, options: ParseOptions) -> Result<EmbedStore<embedfs::store::Mmap>> {
    let start = Instant::now();
    let store = EmbedStore::open(path, options)
        .with_context(|| format!("Failed to open blob {}", path.display()))?;
    debug!(elapsed = ?start.elapsed(), "blob parsed");
    Ok(store)
}

fn cmd_pack(input: Option<&Path>, extra: &[String], output: &Path, endian: Endian) -> Result<()> {
    let mut buckets = match input {
        Some(dir) => bucket_dirs(dir)?,
        None => Vec::new(),
    };
    for arg in extra {
        buckets.push(parse_bucket_arg(arg)?);
    }
    if buckets.is_empty() {
        bail!("Nothing to pack: pass --input or --bucket");
    }

    let mut files = Vec::with_capacity(buckets.len());
    for (name, dir) in &buckets {
        files.push(bucket_files(dir)?);
        debug!(bucket = %name, dir = %dir.display(), "collected bucket");
    }
    let total: usize = files.iter().map(Vec::len).sum();

    println!("Packing {} buckets, {} files...", buckets.len(), total);

    let pb = ProgressBar::new(total as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")?
            .progress_chars("#>-"),
    );

    let start = Instant::now();
    let mut builder = BlobBuilder::new().with_byte_order(endian);
    for ((name, _), files) in buckets.iter().zip(files) {
        let handle = builder.bucket(name);
        for (bin_name, path) in files {
            let data = fs::read(&path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            builder.add_bin(handle, &bin_name, data);
            pb.inc(1);
        }
    }
    pb.finish_and_clear();

    builder
        .write_to_file(output)
        .with_context(|| format!("Failed to write blob {}", output.display()))?;

    info!(
        buckets = builder.bucket_count(),
        bins = builder.bin_count(),
        output = %output.display(),
        "blob written"
    );
    println!("Packed in {:?}", start.elapsed());

    Ok(())
}

fn cmd_list(path: &Path, options: ParseOptions, bucket: Option<&str>, json: bool) -> Result<()> {
    let store = open_store(path, options)?;

    let names = match bucket {
        Some(bucket) => store
            .list_bins_in_bucket(bucket.as_bytes())
            .map_err(|e| anyhow!("{}: {}", e, bucket))?,
        None => store.list_all_buckets(),
    };
    let names: Vec<String> = names
        .into_iter()
        .map(|n| String::from_utf8_lossy(n).into_owned())
        .collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&names)?);
    } else {
        for name in &names {
            println!("{}", name);
        }
    }

    Ok(())
}

fn cmd_cat(
    path: &Path,
    options: ParseOptions,
    name: &str,
    bucket: Option<&str>,
    output: Option<&Path>,
) -> Result<()> {
    let store = open_store(path, options)?;

    let data = match bucket {
        Some(bucket) => store
            .lookup_in_bucket(bucket.as_bytes(), name.as_bytes())
            .map_err(|e| anyhow!("{}: {}/{}", e, bucket, name))?,
        None => store
            .lookup_by_name(name.as_bytes())
            .map_err(|e| anyhow!("{}: {}", e, name))?,
    };

    match output {
        Some(output) => fs::write(output, data).context("Failed to write output file")?,
        None => io::stdout().lock().write_all(data)?,
    }

    Ok(())
}

fn cmd_extract(path: &Path, options: ParseOptions, output: &Path, filter: Option<&str>) -> Result<()> {
    let store = open_store(path, options)?;
    let pattern = filter
        .map(glob::Pattern::new)
        .transpose()
        .context("Invalid filter pattern")?;

    let entries: Vec<_> = store
        .entries()
        .filter(|e| {
            pattern
                .as_ref()
                .map_or(true, |p| p.matches(&display_path(e.bucket, e.name)))
        })
        .collect();

    println!("Extracting {} entries...", entries.len());

    let pb = ProgressBar::new(entries.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")?
            .progress_chars("#>-"),
    );

    fs::create_dir_all(output)?;

    let start = Instant::now();
    let mut files: HashSet<PathBuf> = HashSet::new();
    let mut dirs: HashSet<PathBuf> = HashSet::new();
    let mut skipped = 0;
    for entry in &entries {
        let shown = display_path(entry.bucket, entry.name);
        let Some(output_path) = entry_path(output, entry.bucket, entry.name) else {
            warn!(entry = %shown, "skipping unsafe path");
            skipped += 1;
            pb.inc(1);
            continue;
        };

        let parents: Vec<&Path> = output_path
            .ancestors()
            .skip(1)
            .take_while(|p| *p != output)
            .collect();
        if files.contains(&output_path) {
            // Scoped lookup returns the first bin of a name.
            warn!(entry = %shown, "skipping duplicate");
            skipped += 1;
        } else if dirs.contains(&output_path) || parents.iter().any(|p| files.contains(*p)) {
            warn!(entry = %shown, "skipping path that collides with another entry");
            skipped += 1;
        } else {
            if let Some(parent) = output_path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&output_path, entry.data)
                .with_context(|| format!("Failed to write {}", output_path.display()))?;
            dirs.extend(parents.into_iter().map(Path::to_path_buf));
            files.insert(output_path);
        }
        pb.inc(1);
    }

    pb.finish_with_message("Done");
    println!(
        "Extraction completed in {:?} ({} skipped)",
        start.elapsed(),
        skipped
    );

    Ok(())
}

fn cmd_info(path: &Path, options: ParseOptions) -> Result<()> {
    let store = open_store(path, options)?;
    let index = store.index();

    println!("Blob:    {} ({} bytes)", path.display(), store.blob().len());
    println!("Buckets: {}", index.bucket_count());
    println!("Bins:    {}", index.bin_count());
    println!();

    for bucket in index.buckets() {
        let bins = index.bins_of(bucket);
        let bytes: usize = bins.iter().map(|b| b.payload.len).sum();
        println!(
            "{:<24} {:>6} bins {:>12} bytes",
            String::from_utf8_lossy(store.name(bucket.name)),
            bins.len(),
            bytes
        );
    }

    let shadowed: Vec<_> = shadowed_bins(index).collect();
    if !shadowed.is_empty() {
        println!("\nShadowed ({}):", shadowed.len());
        for (bucket, bin) in shadowed {
            println!(
                "  {}",
                display_path(store.name(bucket.name), store.name(bin.name))
            );
        }
    }

    Ok(())
}

/// Bins hidden from name-only lookup by a later bin of the same name.
fn shadowed_bins<S: Copy + Eq>(
    index: &BlobIndex<S>,
) -> impl Iterator<Item = (&embedfs::store::Bucket<S>, &embedfs::store::Bin<S>)> + '_ {
    index.buckets().iter().flat_map(move |bucket| {
        index
            .bins_of(bucket)
            .iter()
            .filter(move |bin| index.lookup_by_name(bin.name) != Ok(bin.payload))
            .map(move |bin| (bucket, bin))
    })
}

/// Immediate subdirectories of `dir`, sorted, as (bucket name, path).
fn bucket_dirs(dir: &Path) -> Result<Vec<(String, PathBuf)>> {
    let mut buckets = Vec::new();
    for entry in fs::read_dir(dir).with_context(|| format!("Failed to read {}", dir.display()))? {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }
        let name = entry
            .file_name()
            .into_string()
            .map_err(|n| anyhow!("Non UTF-8 bucket directory: {:?}", n))?;
        buckets.push((name, entry.path()));
    }
    buckets.sort();
    Ok(buckets)
}

/// Files below `dir`, sorted, as ("/"-separated relative name, path).
fn bucket_files(dir: &Path) -> Result<Vec<(String, PathBuf)>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let relative = entry.path().strip_prefix(dir)?;
        let name = relative
            .components()
            .map(|c| c.as_os_str().to_str())
            .collect::<Option<Vec<_>>>()
            .ok_or_else(|| anyhow!("Non UTF-8 file name: {}", relative.display()))?
            .join("/");
        if name.len() > MAX_NAME_LEN {
            bail!("File name longer than {} bytes: {}", MAX_NAME_LEN, name);
        }
        files.push((name, entry.path().to_path_buf()));
    }
    Ok(files)
}

fn parse_bucket_arg(arg: &str) -> Result<(String, PathBuf)> {
    let (name, dir) = arg
        .split_once('=')
        .ok_or_else(|| anyhow!("Expected NAME=DIR, got {:?}", arg))?;
    if name.is_empty() || dir.is_empty() {
        bail!("Expected NAME=DIR, got {:?}", arg);
    }
    Ok((name.to_string(), PathBuf::from(dir)))
}

fn display_path(bucket: &[u8], name: &[u8]) -> String {
    format!(
        "{}/{}",
        String::from_utf8_lossy(bucket),
        String::from_utf8_lossy(name)
    )
}

/// Extraction target for a bin, or `None` if it would escape `output`.
fn entry_path(output: &Path, bucket: &[u8], name: &[u8]) -> Option<PathBuf> {
    let bucket = std::str::from_utf8(bucket).ok()?;
    let name = std::str::from_utf8(name).ok()?;
    let relative = Path::new(bucket).join(name);

    let safe = relative
        .components()
        .all(|c| matches!(c, Component::Normal(_)));
    if !safe || bucket.is_empty() || name.is_empty() {
        return None;
    }
    Some(output.join(relative))
}
