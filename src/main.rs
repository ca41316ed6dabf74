mod cli_main;

use std::error::Error;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::sync::Mutex;

use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;
use tracing_subscriber::FmtSubscriber;

use cli_main::{BackendKind, Cli, Commands, SweepMode};
use readjoin::io::{parse_spm_file, read_fasta, ReadSet, SpmFormat, SpmListError, SpmWriter};
use readjoin::pairwise::{NoProgress, ProgressSink};
use readjoin::{
    find_all_pairs, par_find_all_pairs, Backend, ContainmentSet, OverlapMode, PairwiseConfig, Spm,
};

fn main() {
    let cli = Cli::parse();

    let level = if cli.verbose { tracing::Level::DEBUG } else { tracing::Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("Setting tracing default failed");

    if let Err(e) = run(cli.command) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn open_output(path: Option<&str>) -> io::Result<Box<dyn Write + Send>> {
    Ok(match path {
        Some(path) => Box::new(BufWriter::new(File::create(path)?)),
        None => Box::new(BufWriter::new(io::stdout())),
    })
}

fn run(command: Commands) -> Result<(), Box<dyn Error>> {
    match command {
        Commands::Overlap {
            input,
            output,
            format,
            backend,
            mode,
            min_length,
            max_error,
            nonmaximal,
            singlestrand,
            cntfilter,
            threads,
            containment_in,
            containment_out,
            progress,
        } => {
            let approximate = backend == BackendKind::Dp;
            if approximate && format != SpmFormat::Text {
                return Err(SpmListError::ApproximateBinary(format).into());
            }

            let start = std::time::Instant::now();
            let reads = read_fasta(&input)?;
            let collection = if singlestrand {
                ReadSet::new(reads)
            } else {
                ReadSet::with_reverse_complements(reads)
            };

            let backend = match backend {
                BackendKind::Bf => Backend::BruteForce,
                BackendKind::Kmp => Backend::Kmp,
                BackendKind::Dp => Backend::EditDistance { max_error_rate: max_error },
            };
            let config = PairwiseConfig {
                mode: match mode {
                    SweepMode::Spm => OverlapMode::Spm,
                    SweepMode::Cnt => OverlapMode::Cnt,
                    SweepMode::All => OverlapMode::All,
                },
                min_length,
                find_nonmaximal: nonmaximal,
                reverse_complements: !singlestrand,
                containment_filter: cntfilter,
                threads,
            };
            let seed = match containment_in {
                Some(path) => Some(ContainmentSet::load(&path)?),
                None => None,
            };

            let bar = progress.then(|| {
                let bar = ProgressBar::new(0);
                if let Ok(style) = ProgressStyle::default_bar()
                    .template("{spinner} [{elapsed_precise}] {bar:40} {pos}/{len} pairs")
                {
                    bar.set_style(style);
                }
                bar
            });
            let sink: &dyn ProgressSink = match &bar {
                Some(bar) => bar,
                None => &NoProgress,
            };

            let writer = SpmWriter::new(open_output(output.as_deref())?, format, approximate)?;
            let writer = Mutex::new((writer, None::<SpmListError>));
            let emit = |spm: Spm| {
                if let Ok(mut guard) = writer.lock() {
                    let (writer, failure) = &mut *guard;
                    if failure.is_none() {
                        if let Err(e) = writer.write(&spm) {
                            *failure = Some(e);
                        }
                    }
                }
            };

            let result = if threads > 1 {
                par_find_all_pairs(&collection, backend, &config, seed.as_ref(), sink, emit)?
            } else {
                find_all_pairs(&collection, backend, &config, seed.as_ref(), sink, emit)?
            };

            let (writer, failure) = writer
                .into_inner()
                .map_err(|_| "SPM writer lock poisoned")?;
            if let Some(e) = failure {
                return Err(e.into());
            }
            let written = writer.written();
            writer.finish()?;

            if let (Some(path), Some(set)) = (containment_out, &result.containment) {
                set.save(&path)?;
                info!("Containment set written to {}", path);
            }
            info!(
                "{} overlaps among {} reads ({} contained) in {:.2}s",
                written,
                result.nofreads,
                result.containment.as_ref().map_or(0, ContainmentSet::count),
                start.elapsed().as_secs_f32()
            );
        }

        Commands::Spmlist { input, min_length, approximate } => {
            let mut writer = SpmWriter::new(open_output(None)?, SpmFormat::Text, approximate)?;
            let mut failure = None;
            let parsed = parse_spm_file(&input, min_length, approximate, |spm| {
                if failure.is_none() {
                    if let Err(e) = writer.write(&spm) {
                        failure = Some(e);
                    }
                }
            })?;
            if let Some(e) = failure {
                return Err(e.into());
            }
            writer.finish()?;
            info!("{} overlaps listed", parsed);
        }
    }
    Ok(())
}
