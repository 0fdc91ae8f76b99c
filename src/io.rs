//! Tab-separated sparse graphs and dense matrices, optionally compressed.
//!
//! Sparse graphs: one `row<TAB>col<TAB>dist` line per entry, no header.
//! Dense matrices: one line of tab-separated distances per matrix row.
//! Files ending in `.gz` or `.zst` are (de)compressed on the fly.

use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Read, Write};
use std::path::Path;

use anyhow::{bail, Context, Result};
use flate2::read::MultiGzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use ndarray::Array2;

use crate::sparse::SparseCoo;

const ZSTD_LEVEL: i32 = 3;

fn lowercase_name(path: &Path) -> String {
    path.file_name()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase()
}

/// Opens a file, decompressing `.gz` and `.zst` by extension.
pub fn open_reader(path: &Path) -> Result<Box<dyn BufRead>> {
    let file = File::open(path).with_context(|| format!("open input {}", path.display()))?;
    let name = lowercase_name(path);
    let reader: Box<dyn BufRead> = if name.ends_with(".gz") {
        Box::new(BufReader::new(MultiGzDecoder::new(file)))
    } else if name.ends_with(".zst") || name.ends_with(".zstd") {
        let decoder = zstd::Decoder::new(file)
            .with_context(|| format!("create zstd decoder for {}", path.display()))?;
        Box::new(BufReader::new(decoder))
    } else {
        Box::new(BufReader::new(file))
    };
    Ok(reader)
}

/// Output file, compressed according to its extension.
pub enum OutputWriter {
    Plain(BufWriter<File>),
    Gzip(GzEncoder<BufWriter<File>>),
    Zstd(zstd::Encoder<'static, BufWriter<File>>),
}

impl OutputWriter {
    pub fn create(path: &Path) -> Result<Self> {
        let file =
            File::create(path).with_context(|| format!("create output {}", path.display()))?;
        let inner = BufWriter::new(file);
        let name = lowercase_name(path);
        Ok(if name.ends_with(".gz") {
            Self::Gzip(GzEncoder::new(inner, Compression::default()))
        } else if name.ends_with(".zst") || name.ends_with(".zstd") {
            let encoder = zstd::Encoder::new(inner, ZSTD_LEVEL)
                .with_context(|| format!("build zstd encoder for {}", path.display()))?;
            Self::Zstd(encoder)
        } else {
            Self::Plain(inner)
        })
    }

    /// Flushes buffers and writes any compression trailer.
    pub fn finish(self) -> io::Result<()> {
        let mut inner = match self {
            Self::Plain(w) => w,
            Self::Gzip(w) => w.finish()?,
            Self::Zstd(w) => w.finish()?,
        };
        inner.flush()
    }
}

impl Write for OutputWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Self::Plain(w) => w.write(buf),
            Self::Gzip(w) => w.write(buf),
            Self::Zstd(w) => w.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Self::Plain(w) => w.flush(),
            Self::Gzip(w) => w.flush(),
            Self::Zstd(w) => w.flush(),
        }
    }
}

fn tsv_reader<R: Read>(reader: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .flexible(true)
        .from_reader(reader)
}

fn tsv_writer<W: Write>(writer: W) -> csv::Writer<W> {
    csv::WriterBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .from_writer(writer)
}

fn parse_field<T: std::str::FromStr>(
    record: &csv::StringRecord,
    idx: usize,
    line: usize,
    path: &Path,
) -> Result<T>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let field = record
        .get(idx)
        .with_context(|| {
            format!(
                "line {line} of {} has no column {}",
                path.display(),
                idx + 1
            )
        })?;
    field
        .trim()
        .parse()
        .with_context(|| format!("parse '{field}' on line {line} of {}", path.display()))
}

/// Reads a sparse graph, sorting it by row if needed.
pub fn read_sparse(path: &Path) -> Result<SparseCoo> {
    let mut reader = tsv_reader(open_reader(path)?);
    let mut graph = SparseCoo::new();
    for (idx, record) in reader.records().enumerate() {
        let line = idx + 1;
        let record =
            record.with_context(|| format!("read line {line} from {}", path.display()))?;
        if record.len() != 3 {
            bail!(
                "line {} of {} has {} columns, expected row, col, dist",
                line,
                path.display(),
                record.len()
            );
        }
        let row: usize = parse_field(&record, 0, line, path)?;
        let col: usize = parse_field(&record, 1, line, path)?;
        let dist: f32 = parse_field(&record, 2, line, path)?;
        if row == col {
            bail!(
                "self distance for sample {} on line {} of {}",
                row,
                line,
                path.display()
            );
        }
        if dist.is_nan() || dist < 0.0 {
            bail!(
                "distance {} on line {} of {} is not non-negative",
                dist,
                line,
                path.display()
            );
        }
        graph.push(row, col, dist);
    }
    if !graph.is_row_sorted() {
        log::debug!("Sorting {} by row", path.display());
        graph = SparseCoo::from_triplets(graph.triplets().collect());
    }
    Ok(graph)
}

pub fn write_sparse(graph: &SparseCoo, path: &Path) -> Result<()> {
    let mut writer = tsv_writer(OutputWriter::create(path)?);
    for (row, col, dist) in graph.triplets() {
        writer
            .write_record([row.to_string(), col.to_string(), dist.to_string()])
            .with_context(|| format!("write to {}", path.display()))?;
    }
    let inner = writer
        .into_inner()
        .map_err(|e| e.into_error())
        .with_context(|| format!("flush {}", path.display()))?;
    inner
        .finish()
        .with_context(|| format!("finish output {}", path.display()))?;
    Ok(())
}

/// Reads a dense matrix. All rows must have the same width.
pub fn read_dense(path: &Path) -> Result<Array2<f32>> {
    let mut reader = tsv_reader(open_reader(path)?);
    let mut data = Vec::new();
    let mut n_rows = 0;
    let mut n_cols = None;
    for (idx, record) in reader.records().enumerate() {
        let line = idx + 1;
        let record =
            record.with_context(|| format!("read line {line} from {}", path.display()))?;
        match n_cols {
            None => n_cols = Some(record.len()),
            Some(width) if width != record.len() => bail!(
                "line {} of {} has {} columns, previous lines have {}",
                line,
                path.display(),
                record.len(),
                width
            ),
            Some(_) => {}
        }
        for col in 0..record.len() {
            data.push(parse_field::<f32>(&record, col, line, path)?);
        }
        n_rows += 1;
    }
    Array2::from_shape_vec((n_rows, n_cols.unwrap_or(0)), data)
        .with_context(|| format!("shape matrix from {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn unsorted_sparse_input_is_sorted() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("graph.tsv");
        std::fs::write(&path, "2\t0\t0.5\n0\t1\t0.25\n1\t2\t0.125\n").unwrap();
        let graph = read_sparse(&path).unwrap();
        assert_eq!(graph.rows, vec![0, 1, 2]);
        assert_eq!(graph.cols, vec![1, 2, 0]);
        assert_eq!(graph.dists, vec![0.25, 0.125, 0.5]);
    }

    #[test]
    fn rejects_malformed_sparse_lines() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.tsv");
        for content in ["0\t1\n", "0\tx\t0.1\n", "1\t1\t0.1\n", "0\t1\t-0.5\n", "-1\t0\t0.1\n"] {
            std::fs::write(&path, content).unwrap();
            assert!(read_sparse(&path).is_err(), "accepted {content:?}");
        }
    }

    #[test]
    fn dense_rows_must_match() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("dense.tsv");
        std::fs::write(&path, "0\t0.5\n0.5\t0\n").unwrap();
        let matrix = read_dense(&path).unwrap();
        assert_eq!(matrix.dim(), (2, 2));
        assert_eq!(matrix[[0, 1]], 0.5);

        std::fs::write(&path, "0\t0.5\n0.5\n").unwrap();
        assert!(read_dense(&path).is_err());

        std::fs::write(&path, "").unwrap();
        assert_eq!(read_dense(&path).unwrap().dim(), (0, 0));
    }
}
