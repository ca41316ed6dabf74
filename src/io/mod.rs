//! Read collections and the file formats around the overlap sweep.

pub mod collection;
pub mod fasta;
pub mod spmlist;

pub use collection::{ReadSet, SequenceCollection};
pub use fasta::{open_fasta, read_fasta};
pub use spmlist::{parse_spm_file, parse_spm_list, SpmFormat, SpmListError, SpmWriter};
