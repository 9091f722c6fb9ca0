//! Packed sequence files and their conversions.
//!
//! A `.rsq` file is a concatenation of records with no padding between
//! them: each record is a little-endian `u32` base count followed by
//! `ceil(len/4)` bytes of 2-bit codes (see [`crate::sequence`] for the bit
//! layout). Files are read through a read-only memory map.

use anyhow::{anyhow, bail, Context, Result};
use bio::io::fasta;
use byteorder::{ByteOrder, LittleEndian, WriteBytesExt};
use clap::Args;
use memmap2::Mmap;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::sequence::{PackedSeq, BASES_PER_BYTE};

/// All sequences of one packed file, decoded in record order.
pub struct SeqStore {
    pub seqs: Vec<PackedSeq>,
}

impl SeqStore {
    /// Map and decode a packed sequence file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .with_context(|| format!("failed to open sequence file {}", path.display()))?;
        if file.metadata()?.len() == 0 {
            bail!("sequence file is empty: {}", path.display());
        }
        let mmap = unsafe { Mmap::map(&file) }
            .with_context(|| format!("failed to map sequence file {}", path.display()))?;

        let mut seqs = Vec::new();
        let mut pos = 0usize;
        while pos < mmap.len() {
            if pos + 4 > mmap.len() {
                bail!(
                    "truncated length prefix for record {} at byte {} of {}",
                    seqs.len(),
                    pos,
                    path.display()
                );
            }
            let len = LittleEndian::read_u32(&mmap[pos..pos + 4]) as usize;
            pos += 4;
            let n_bytes = (len + BASES_PER_BYTE - 1) / BASES_PER_BYTE;
            if pos + n_bytes > mmap.len() {
                bail!(
                    "truncated payload for record {} ({} bases) at byte {} of {}",
                    seqs.len(),
                    len,
                    pos,
                    path.display()
                );
            }
            seqs.push(PackedSeq::from_packed_bytes(&mmap[pos..pos + n_bytes], len));
            pos += n_bytes;
        }
        Ok(Self { seqs })
    }

    /// Write sequences as a packed file, in order.
    pub fn save<P: AsRef<Path>>(path: P, seqs: &[PackedSeq]) -> Result<()> {
        let path = path.as_ref();
        let mut writer = BufWriter::new(
            File::create(path)
                .with_context(|| format!("failed to create {}", path.display()))?,
        );
        for seq in seqs {
            writer.write_u32::<LittleEndian>(seq.len() as u32)?;
            writer.write_all(&seq.to_packed_bytes())?;
        }
        writer.flush()?;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.seqs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seqs.is_empty()
    }

    /// Index of the longest record; the first one on ties.
    pub fn longest(&self) -> Option<usize> {
        let mut best: Option<usize> = None;
        for (i, seq) in self.seqs.iter().enumerate() {
            match best {
                Some(b) if self.seqs[b].len() >= seq.len() => {}
                _ => best = Some(i),
            }
        }
        best
    }
}

#[derive(Args, Debug)]
pub struct PackArgs {
    /// FASTA file to pack
    #[arg(short, long)]
    pub input: PathBuf,
    /// Packed output file
    #[arg(short, long)]
    pub output: PathBuf,
}

/// Pack a FASTA file into the binary format. Bases outside {A,C,G,T} are
/// rejected, naming the record and offset.
pub fn run_pack(args: PackArgs) -> Result<()> {
    let reader = fasta::Reader::from_file(&args.input)?;
    let mut seqs = Vec::new();
    for (idx, record) in reader.records().enumerate() {
        let record =
            record.with_context(|| format!("failed to parse FASTA record {}", idx))?;
        let seq = PackedSeq::from_text(record.seq()).map_err(|offset| {
            anyhow!(
                "record {} ({}): invalid base {:?} at position {}",
                idx,
                record.id(),
                record.seq()[offset] as char,
                offset
            )
        })?;
        seqs.push(seq);
    }
    SeqStore::save(&args.output, &seqs)?;
    eprintln!("packed {} sequences into {}", seqs.len(), args.output.display());
    Ok(())
}

#[derive(Args, Debug)]
pub struct UnpackArgs {
    /// Packed sequence file
    #[arg(short, long)]
    pub input: PathBuf,
    /// FASTA output (stdout when omitted)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Unpack a binary sequence file back to FASTA.
pub fn run_unpack(args: UnpackArgs) -> Result<()> {
    let store = SeqStore::load(&args.input)?;
    let out: Box<dyn Write> = match &args.output {
        Some(path) => Box::new(BufWriter::new(
            File::create(path)
                .with_context(|| format!("failed to create {}", path.display()))?,
        )),
        None => Box::new(BufWriter::new(io::stdout())),
    };
    let mut writer = fasta::Writer::new(out);
    for (i, seq) in store.seqs.iter().enumerate() {
        writer.write(&format!("seq_{}", i), None, &seq.to_text())?;
    }
    Ok(())
}
