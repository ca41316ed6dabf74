use clap::{Parser, Subcommand, ValueEnum};

use readjoin::io::SpmFormat;

#[derive(Parser, Debug)]
#[command(
    name = "readjoin",
    version,
    about = "Suffix-prefix overlaps and containments between reads",
    long_about = None
)]
pub struct Cli {
    /// Log debug messages
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum BackendKind {
    /// Direct comparison
    Bf,
    /// Knuth-Morris-Pratt automaton
    Kmp,
    /// Edit distance under --max-error
    Dp,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum SweepMode {
    /// Suffix-prefix matches only
    Spm,
    /// Containments only
    Cnt,
    /// Both
    All,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Find overlaps between all pairs of reads
    Overlap {
        /// Input FASTA(.gz) file
        #[arg(short, long)]
        input: String,

        /// Output SPM list (stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,

        /// Output format: text, bin32 or bin64 (binary formats hold exact matches only)
        #[arg(long, default_value = "text")]
        format: SpmFormat,

        /// Matching algorithm
        #[arg(long, value_enum, default_value_t = BackendKind::Kmp)]
        backend: BackendKind,

        /// Relations to search for
        #[arg(long, value_enum, default_value_t = SweepMode::Spm)]
        mode: SweepMode,

        /// Minimum overlap length
        #[arg(short = 'l', long, default_value_t = 1)]
        min_length: usize,

        /// Maximum error rate of the dp backend
        #[arg(short = 'e', long, default_value_t = 0.0)]
        max_error: f64,

        /// Report non-maximal overlaps too
        #[arg(long)]
        nonmaximal: bool,

        /// Do not search reverse complements
        #[arg(long)]
        singlestrand: bool,

        /// Skip reads known to be contained
        #[arg(long)]
        cntfilter: bool,

        /// Number of threads
        #[arg(long, default_value_t = num_cpus::get())]
        threads: usize,

        /// Containment set from an earlier run
        #[arg(long)]
        containment_in: Option<String>,

        /// Write the containment set here
        #[arg(long)]
        containment_out: Option<String>,

        /// Show a progress bar
        #[arg(long)]
        progress: bool,
    },

    /// Print an SPM list of any format as text
    Spmlist {
        /// Input SPM list
        #[arg(short, long)]
        input: String,

        /// Minimum overlap length
        #[arg(short = 'l', long, default_value_t = 0)]
        min_length: usize,

        /// Parse text lines with suffix length, prefix length and edit distance
        #[arg(long)]
        approximate: bool,
    },
}
