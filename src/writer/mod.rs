//! Dataset serialization to CSV or JSONL, optionally gzip-compressed.

use crate::generator::Dataset;
use crate::schema::{
    CUSTOMER_COLUMNS, ORDER_COLUMNS, ORDER_ITEM_COLUMNS, PRODUCT_COLUMNS, SELLER_COLUMNS,
};
use flate2::write::GzEncoder;
use serde::Serialize;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

pub const WRITER_BUFFER_SIZE: usize = 256 * 1024;

/// Output file format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Csv,
    Jsonl,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Csv => "csv",
            OutputFormat::Jsonl => "jsonl",
        }
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "csv" => Ok(OutputFormat::Csv),
            "jsonl" | "ndjson" => Ok(OutputFormat::Jsonl),
            _ => Err(format!("Unknown format: {}. Valid: csv, jsonl", s)),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.extension())
    }
}

/// Writer options.
#[derive(Debug, Clone, Copy, Default)]
pub struct WriteOptions {
    pub format: OutputFormat,
    pub gzip: bool,
}

/// One output file, as written.
#[derive(Debug, Clone, Serialize)]
pub struct WrittenFile {
    pub table: String,
    pub path: PathBuf,
    pub rows: usize,
    pub bytes: u64,
}

/// Summary of a full dataset write.
#[derive(Debug, Clone, Default, Serialize)]
pub struct WriteReport {
    pub files: Vec<WrittenFile>,
}

impl WriteReport {
    pub fn total_rows(&self) -> usize {
        self.files.iter().map(|f| f.rows).sum()
    }

    pub fn total_bytes(&self) -> u64 {
        self.files.iter().map(|f| f.bytes).sum()
    }
}

/// Writes the five dataset tables into an output directory.
pub struct DatasetWriter {
    output_dir: PathBuf,
    options: WriteOptions,
}

impl DatasetWriter {
    pub fn new(output_dir: PathBuf, options: WriteOptions) -> Self {
        Self {
            output_dir,
            options,
        }
    }

    pub fn ensure_output_dir(&self) -> std::io::Result<()> {
        fs::create_dir_all(&self.output_dir)
    }

    /// File name for a table under the current options, e.g.
    /// `orders.csv`, `orders.jsonl`, `orders.csv.gz`.
    pub fn file_name(&self, table: &str) -> String {
        let mut name = format!("{}.{}", table, self.options.format.extension());
        if self.options.gzip {
            name.push_str(".gz");
        }
        name
    }

    /// Write all five tables. Returns per-file row and byte counts.
    pub fn write(&self, dataset: &Dataset) -> anyhow::Result<WriteReport> {
        self.ensure_output_dir()?;
        let mut report = WriteReport::default();
        report
            .files
            .push(self.write_table("products", PRODUCT_COLUMNS, &dataset.products)?);
        report
            .files
            .push(self.write_table("customers", CUSTOMER_COLUMNS, &dataset.customers)?);
        report
            .files
            .push(self.write_table("sellers", SELLER_COLUMNS, &dataset.sellers)?);
        report
            .files
            .push(self.write_table("orders", ORDER_COLUMNS, &dataset.orders)?);
        report
            .files
            .push(self.write_table("order_items", ORDER_ITEM_COLUMNS, &dataset.order_items)?);
        Ok(report)
    }

    fn write_table<T: Serialize>(
        &self,
        table: &str,
        columns: &[&str],
        records: &[T],
    ) -> anyhow::Result<WrittenFile> {
        let path = self.output_dir.join(self.file_name(table));
        let sink = self.open_sink(&path)?;

        match self.options.format {
            OutputFormat::Csv => write_csv(sink, columns, records)?,
            OutputFormat::Jsonl => write_jsonl(sink, records)?,
        }

        let bytes = fs::metadata(&path)?.len();
        Ok(WrittenFile {
            table: table.to_string(),
            path,
            rows: records.len(),
            bytes,
        })
    }

    fn open_sink(&self, path: &Path) -> io::Result<Sink> {
        let file = File::create(path)?;
        let writer = BufWriter::with_capacity(WRITER_BUFFER_SIZE, file);
        if self.options.gzip {
            Ok(Sink::Gzip(GzEncoder::new(
                writer,
                flate2::Compression::default(),
            )))
        } else {
            Ok(Sink::Plain(writer))
        }
    }
}

/// Output sink, finalized explicitly: dropping a GzEncoder swallows
/// trailer and flush errors, so `finish` must be called before trusting
/// the file on disk.
enum Sink {
    Plain(BufWriter<File>),
    Gzip(GzEncoder<BufWriter<File>>),
}

impl Sink {
    fn finish(self) -> io::Result<()> {
        match self {
            Sink::Plain(mut writer) => writer.flush(),
            Sink::Gzip(encoder) => encoder.finish()?.flush(),
        }
    }
}

impl Write for Sink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Sink::Plain(writer) => writer.write(buf),
            Sink::Gzip(encoder) => encoder.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Sink::Plain(writer) => writer.flush(),
            Sink::Gzip(encoder) => encoder.flush(),
        }
    }
}

fn write_csv<T: Serialize>(sink: Sink, columns: &[&str], records: &[T]) -> anyhow::Result<()> {
    // serde only emits the header lazily on the first record, so it is
    // written explicitly here; empty tables still carry their column row.
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(sink);
    writer.write_record(columns)?;
    for record in records {
        writer.serialize(record)?;
    }
    writer.into_inner().map_err(|e| e.into_error())?.finish()?;
    Ok(())
}

fn write_jsonl<T: Serialize>(mut sink: Sink, records: &[T]) -> anyhow::Result<()> {
    for record in records {
        serde_json::to_writer(&mut sink, record)?;
        sink.write_all(b"\n")?;
    }
    sink.finish()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::{Generator, GeneratorConfig};
    use tempfile::TempDir;

    fn tiny_dataset() -> Dataset {
        let config = GeneratorConfig {
            customers: 5,
            sellers: 3,
            orders: 10,
            workers: 1,
            ..GeneratorConfig::default()
        };
        Generator::new(config).generate().unwrap()
    }

    #[test]
    fn test_format_parsing() {
        assert_eq!("csv".parse::<OutputFormat>().unwrap(), OutputFormat::Csv);
        assert_eq!(
            "JSONL".parse::<OutputFormat>().unwrap(),
            OutputFormat::Jsonl
        );
        assert_eq!(
            "ndjson".parse::<OutputFormat>().unwrap(),
            OutputFormat::Jsonl
        );
        assert!("parquet".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn test_file_name_variants() {
        let base = DatasetWriter::new(PathBuf::from("out"), WriteOptions::default());
        assert_eq!(base.file_name("orders"), "orders.csv");

        let gz = DatasetWriter::new(
            PathBuf::from("out"),
            WriteOptions {
                format: OutputFormat::Jsonl,
                gzip: true,
            },
        );
        assert_eq!(gz.file_name("orders"), "orders.jsonl.gz");
    }

    #[test]
    fn test_write_csv_dataset() {
        let dataset = tiny_dataset();
        let dir = TempDir::new().unwrap();
        let writer = DatasetWriter::new(dir.path().to_path_buf(), WriteOptions::default());
        let report = writer.write(&dataset).unwrap();

        assert_eq!(report.files.len(), 5);
        assert_eq!(report.total_rows(), dataset.total_rows());

        let orders = std::fs::read_to_string(dir.path().join("orders.csv")).unwrap();
        let header = orders.lines().next().unwrap();
        assert_eq!(header, crate::schema::ORDER_COLUMNS.join(","));
        // header + one line per order
        assert_eq!(orders.lines().count(), dataset.orders.len() + 1);
    }

    #[test]
    fn test_csv_headers_match_dictionaries() {
        let dataset = tiny_dataset();
        let dir = TempDir::new().unwrap();
        let writer = DatasetWriter::new(dir.path().to_path_buf(), WriteOptions::default());
        writer.write(&dataset).unwrap();

        let expected = [
            ("products.csv", crate::schema::PRODUCT_COLUMNS),
            ("customers.csv", crate::schema::CUSTOMER_COLUMNS),
            ("sellers.csv", crate::schema::SELLER_COLUMNS),
            ("orders.csv", crate::schema::ORDER_COLUMNS),
            ("order_items.csv", crate::schema::ORDER_ITEM_COLUMNS),
        ];
        for (file, columns) in expected {
            let content = std::fs::read_to_string(dir.path().join(file)).unwrap();
            assert_eq!(
                content.lines().next().unwrap(),
                columns.join(","),
                "{}",
                file
            );
        }
    }

    #[test]
    fn test_empty_tables_still_get_headers() {
        let config = GeneratorConfig {
            customers: 5,
            sellers: 3,
            orders: 0,
            workers: 1,
            ..GeneratorConfig::default()
        };
        let dataset = Generator::new(config).generate().unwrap();
        let dir = TempDir::new().unwrap();
        let writer = DatasetWriter::new(dir.path().to_path_buf(), WriteOptions::default());
        writer.write(&dataset).unwrap();

        let orders = std::fs::read_to_string(dir.path().join("orders.csv")).unwrap();
        assert_eq!(
            orders.trim_end(),
            crate::schema::ORDER_COLUMNS.join(","),
            "empty orders table must still carry its header row"
        );
        let items = std::fs::read_to_string(dir.path().join("order_items.csv")).unwrap();
        assert_eq!(items.trim_end(), crate::schema::ORDER_ITEM_COLUMNS.join(","));
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_gzip_write_error_surfaces_on_finish() {
        // /dev/full accepts opens but fails every write with ENOSPC.
        let file = File::create("/dev/full").unwrap();
        let mut sink = Sink::Gzip(GzEncoder::new(
            BufWriter::with_capacity(64, file),
            flate2::Compression::default(),
        ));
        sink.write_all(b"payload that must reach the device before success is reported")
            .unwrap();
        assert!(sink.finish().is_err());
    }

    #[test]
    fn test_write_jsonl_dataset() {
        let dataset = tiny_dataset();
        let dir = TempDir::new().unwrap();
        let writer = DatasetWriter::new(
            dir.path().to_path_buf(),
            WriteOptions {
                format: OutputFormat::Jsonl,
                gzip: false,
            },
        );
        writer.write(&dataset).unwrap();

        let content = std::fs::read_to_string(dir.path().join("orders.jsonl")).unwrap();
        assert_eq!(content.lines().count(), dataset.orders.len());
        let first: serde_json::Value =
            serde_json::from_str(content.lines().next().unwrap()).unwrap();
        assert_eq!(first["order_id"], "00000001");
    }

    #[test]
    fn test_write_gzip_round_trip() {
        use std::io::Read;

        let dataset = tiny_dataset();
        let dir = TempDir::new().unwrap();
        let writer = DatasetWriter::new(
            dir.path().to_path_buf(),
            WriteOptions {
                format: OutputFormat::Csv,
                gzip: true,
            },
        );
        writer.write(&dataset).unwrap();

        let file = File::open(dir.path().join("customers.csv.gz")).unwrap();
        let mut decoder = flate2::read::MultiGzDecoder::new(file);
        let mut content = String::new();
        decoder.read_to_string(&mut content).unwrap();
        assert_eq!(
            content.lines().next().unwrap(),
            crate::schema::CUSTOMER_COLUMNS.join(",")
        );
    }

    #[test]
    fn test_same_seed_identical_files() {
        let dir = TempDir::new().unwrap();
        let a = dir.path().join("a");
        let b = dir.path().join("b");
        for out in [&a, &b] {
            let writer = DatasetWriter::new(out.clone(), WriteOptions::default());
            writer.write(&tiny_dataset()).unwrap();
        }
        for table in ["products", "customers", "sellers", "orders", "order_items"] {
            let file = format!("{}.csv", table);
            let left = std::fs::read(a.join(&file)).unwrap();
            let right = std::fs::read(b.join(&file)).unwrap();
            assert_eq!(left, right, "{} differs between identical runs", file);
        }
    }
}
