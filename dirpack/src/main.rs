mod error;

use std::fs::File;
use std::path::PathBuf;

use dirpack_format::{EntryKind, Extractor, Report};
use structopt::clap::AppSettings::*;
use structopt::StructOpt;

use crate::error::Error;

#[derive(Debug, StructOpt)]
enum Commands {
    #[structopt(name = "c", visible_alias = "create", about = "Create a new archive")]
    Create {
        #[structopt(
            name = "archive",
            parse(from_os_str),
            help = "Path to the archive to write"
        )]
        path: PathBuf,

        #[structopt(name = "directory", help = "Directory tree to archive")]
        root: String,
    },

    #[structopt(
        name = "x",
        visible_alias = "extract",
        about = "Extract files from an archive"
    )]
    Extract {
        #[structopt(
            short = "C",
            long = "directory",
            parse(from_os_str),
            default_value = ".",
            help = "Directory to extract into"
        )]
        dest: PathBuf,

        #[structopt(
            name = "archive",
            parse(from_os_str),
            help = "Path to the archive to read"
        )]
        path: PathBuf,
    },

    #[structopt(name = "t", visible_alias = "list", about = "List records of an archive")]
    List {
        #[structopt(
            name = "archive",
            parse(from_os_str),
            help = "Path to the archive to read"
        )]
        path: PathBuf,
    },
}

#[derive(Debug, StructOpt)]
#[structopt(
    name = "dirpack",
    about = "Create and extract sequential directory archives.",
    settings = &[SubcommandRequiredElseHelp, DisableHelpSubcommand, VersionlessSubcommands],
    usage = "dirpack (c|x|t) [FLAGS|OPTIONS] <archive> [directory]"
)]
struct CliOpts {
    #[structopt(short, long, help = "Print every path as it is processed", global = true)]
    verbose: bool,

    #[structopt(subcommand)]
    cmd: Commands,
}

fn create(path: PathBuf, root: String, verbose: bool) -> Result<Report, Error> {
    let mut file = File::create(&path).map_err(|source| Error::CreateArchive {
        path: path.clone(),
        source,
    })?;

    dirpack_format::run_create(&mut file, &root, verbose)
        .map_err(|source| Error::Pack { path, root, source })
}

fn extract(path: PathBuf, dest: PathBuf, verbose: bool) -> Result<Report, Error> {
    let file = File::open(&path).map_err(|source| Error::OpenArchive {
        path: path.clone(),
        source,
    })?;

    Extractor::new(std::io::BufReader::new(file))
        .dest(dest)
        .verbose(verbose)
        .extract()
        .map_err(|source| Error::Extract { path, source })
}

fn list(path: PathBuf) -> Result<(), Error> {
    let file = File::open(&path).map_err(|source| Error::OpenArchive {
        path: path.clone(),
        source,
    })?;

    let records =
        dirpack_format::run_list(file).map_err(|source| Error::List { path, source })?;

    println!("Kind   Mode     Size           Path");
    println!("-----  -------  -------------  --------");
    for record in records.iter() {
        let kind = match record.kind() {
            EntryKind::Directory => "dir",
            EntryKind::RegularFile => "file",
            EntryKind::Other => "?",
        };
        println!(
            "{:5}  {:07o}  {:>13}  {}",
            kind,
            record.meta.mode,
            record.content_len(),
            record.path()
        );
    }

    Ok(())
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let opts = CliOpts::from_iter(wild::args_os());

    let report = match opts.cmd {
        Commands::Create { path, root } => Some(create(path, root, opts.verbose)?),
        Commands::Extract { path, dest } => Some(extract(path, dest, opts.verbose)?),
        Commands::List { path } => {
            list(path)?;
            None
        }
    };

    if let Some(report) = report {
        tracing::info!(
            directories = report.directories,
            files = report.files,
            bytes = report.bytes,
            "done"
        );
        if !report.warnings.is_empty() {
            eprintln!("{} entries could not be processed", report.warnings.len());
        }
    }

    Ok(())
}
