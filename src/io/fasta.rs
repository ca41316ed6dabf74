// src/io/fasta.rs
use std::fs::File;
use std::io::{self, BufRead, BufReader};

use bio::io::fasta;
use flate2::read::MultiGzDecoder;
use tracing::info;

/// Open a FASTA file for reading, handles gzipped files automatically
pub fn open_fasta(path: &str) -> io::Result<Box<dyn BufRead>> {
    let file = File::open(path)?;
    if path.ends_with(".gz") {
        Ok(Box::new(BufReader::new(MultiGzDecoder::new(file))))
    } else {
        Ok(Box::new(BufReader::new(file)))
    }
}

/// Load every record of a FASTA file as one direct read
pub fn read_fasta(path: &str) -> io::Result<Vec<Vec<u8>>> {
    let reader = fasta::Reader::new(open_fasta(path)?);
    let mut reads = Vec::new();
    for record in reader.records() {
        let record = record?;
        if record.seq().is_empty() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("record {} has an empty sequence", record.id()),
            ));
        }
        reads.push(record.seq().to_vec());
    }
    info!("Loaded {} reads from {}", reads.len(), path);
    Ok(reads)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_read_plain_fasta() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, ">r0\nacgt\nacgt\n>r1 second read\nttga").unwrap();
        let reads = read_fasta(file.path().to_str().unwrap()).unwrap();
        assert_eq!(reads, vec![b"acgtacgt".to_vec(), b"ttga".to_vec()]);
    }

    #[test]
    fn test_read_gzipped_fasta() {
        let file = tempfile::Builder::new().suffix(".fa.gz").tempfile().unwrap();
        let mut encoder = GzEncoder::new(file.reopen().unwrap(), Compression::default());
        encoder.write_all(b">r0\ncaacg\n").unwrap();
        encoder.finish().unwrap();
        let reads = read_fasta(file.path().to_str().unwrap()).unwrap();
        assert_eq!(reads, vec![b"caacg".to_vec()]);
    }

    #[test]
    fn test_empty_record_is_rejected() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, ">r0\n>r1\nacgt").unwrap();
        assert!(read_fasta(file.path().to_str().unwrap()).is_err());
    }
}
