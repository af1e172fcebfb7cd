//! Integrity checking for generated datasets.
//!
//! Checks a dataset directory for:
//! - column dictionaries (CSV header names and order)
//! - duplicate primary keys
//! - FK referential integrity (order -> customer, item -> order/product/seller)
//! - causal ordering of fulfillment timestamps
//! - status/timestamp consistency
//! - temporal FK validity (customer and seller exist before the purchase)

use crate::schema::{
    Customer, Order, OrderItem, Product, Seller, CUSTOMER_COLUMNS, ORDER_COLUMNS,
    ORDER_ITEM_COLUMNS, PRODUCT_COLUMNS, SELLER_COLUMNS,
};
use crate::writer::OutputFormat;
use ahash::{AHashMap, AHashSet};
use anyhow::Context;
use chrono::NaiveDate;
use flate2::read::MultiGzDecoder;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};

/// Default cap on collected issues, to bound memory on badly broken inputs.
pub const MAX_ISSUES: usize = 1000;

/// Issue severity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "ERROR"),
            Severity::Warning => write!(f, "WARNING"),
        }
    }
}

/// Which check raised an issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Check {
    Schema,
    PkDuplicates,
    FkIntegrity,
    TimestampOrder,
    TemporalValidity,
    Parse,
}

impl fmt::Display for Check {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Check::Schema => "schema",
            Check::PkDuplicates => "pk_duplicates",
            Check::FkIntegrity => "fk_integrity",
            Check::TimestampOrder => "timestamp_order",
            Check::TemporalValidity => "temporal_validity",
            Check::Parse => "parse",
        };
        f.write_str(name)
    }
}

/// A single validation finding.
#[derive(Debug, Clone, Serialize)]
pub struct Issue {
    pub severity: Severity,
    pub check: Check,
    pub table: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record: Option<String>,
    pub message: String,
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}] {}", self.severity, self.check, self.table)?;
        if let Some(record) = &self.record {
            write!(f, " ({})", record)?;
        }
        write!(f, ": {}", self.message)
    }
}

/// Outcome of a single check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckStatus {
    Passed,
    Failed,
    Skipped,
}

impl fmt::Display for CheckStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CheckStatus::Passed => write!(f, "PASSED"),
            CheckStatus::Failed => write!(f, "FAILED"),
            CheckStatus::Skipped => write!(f, "SKIPPED"),
        }
    }
}

/// Per-check outcomes.
#[derive(Debug, Clone, Serialize)]
pub struct ChecksReport {
    pub schema: CheckStatus,
    pub pk_duplicates: CheckStatus,
    pub fk_integrity: CheckStatus,
    pub timestamp_order: CheckStatus,
    pub temporal_validity: CheckStatus,
}

/// Per-table row counts, in output order.
#[derive(Debug, Clone, Serialize)]
pub struct TableCounts {
    pub products: usize,
    pub customers: usize,
    pub sellers: usize,
    pub orders: usize,
    pub order_items: usize,
}

/// Full validation result.
#[derive(Debug, Clone, Serialize)]
pub struct ValidationSummary {
    pub dataset_dir: PathBuf,
    pub format: String,
    pub tables: TableCounts,
    pub checks: ChecksReport,
    pub issues: Vec<Issue>,
    pub errors: usize,
    pub warnings: usize,
    /// True when the issue cap was hit and findings were dropped.
    pub truncated: bool,
}

impl ValidationSummary {
    pub fn has_errors(&self) -> bool {
        self.errors > 0
    }

    pub fn has_warnings(&self) -> bool {
        self.warnings > 0
    }
}

/// Validation options.
#[derive(Debug, Clone)]
pub struct ValidateOptions {
    pub dir: PathBuf,
    /// Force a format instead of auto-detecting per table.
    pub format: Option<OutputFormat>,
    pub max_issues: usize,
}

impl ValidateOptions {
    pub fn new(dir: PathBuf) -> Self {
        Self {
            dir,
            format: None,
            max_issues: MAX_ISSUES,
        }
    }
}

/// Collects issues with severity counters and a hard cap.
struct IssueSink {
    issues: Vec<Issue>,
    errors: usize,
    warnings: usize,
    max_issues: usize,
    truncated: bool,
}

impl IssueSink {
    fn new(max_issues: usize) -> Self {
        Self {
            issues: Vec::new(),
            errors: 0,
            warnings: 0,
            max_issues,
            truncated: false,
        }
    }

    fn push(&mut self, issue: Issue) {
        match issue.severity {
            Severity::Error => self.errors += 1,
            Severity::Warning => self.warnings += 1,
        }
        if self.issues.len() < self.max_issues {
            self.issues.push(issue);
        } else {
            self.truncated = true;
        }
    }

    fn error(&mut self, check: Check, table: &str, record: Option<String>, message: String) {
        self.push(Issue {
            severity: Severity::Error,
            check,
            table: table.to_string(),
            record,
            message,
        });
    }

    fn warning(&mut self, check: Check, table: &str, record: Option<String>, message: String) {
        self.push(Issue {
            severity: Severity::Warning,
            check,
            table: table.to_string(),
            record,
            message,
        });
    }
}

/// A loaded table plus the header row observed in the file (CSV only).
struct LoadedTable<T> {
    records: Vec<T>,
    headers: Option<Vec<String>>,
    format: OutputFormat,
}

/// Dataset validator.
pub struct Validator {
    options: ValidateOptions,
}

impl Validator {
    pub fn new(options: ValidateOptions) -> Self {
        Self { options }
    }

    /// Run all checks and produce a summary.
    pub fn validate(&self) -> anyhow::Result<ValidationSummary> {
        let dir = &self.options.dir;
        if !dir.is_dir() {
            anyhow::bail!("dataset directory does not exist: {}", dir.display());
        }

        let mut sink = IssueSink::new(self.options.max_issues);

        let products: LoadedTable<Product> = self.load_table("products", &mut sink)?;
        let customers: LoadedTable<Customer> = self.load_table("customers", &mut sink)?;
        let sellers: LoadedTable<Seller> = self.load_table("sellers", &mut sink)?;
        let orders: LoadedTable<Order> = self.load_table("orders", &mut sink)?;
        let order_items: LoadedTable<OrderItem> = self.load_table("order_items", &mut sink)?;

        let schema_errors_before = sink.errors;
        check_headers(&mut sink, "products", &products.headers, PRODUCT_COLUMNS);
        check_headers(&mut sink, "customers", &customers.headers, CUSTOMER_COLUMNS);
        check_headers(&mut sink, "sellers", &sellers.headers, SELLER_COLUMNS);
        check_headers(&mut sink, "orders", &orders.headers, ORDER_COLUMNS);
        check_headers(
            &mut sink,
            "order_items",
            &order_items.headers,
            ORDER_ITEM_COLUMNS,
        );
        let schema_status = status_since(&sink, schema_errors_before);

        let pk_errors_before = sink.errors;
        let product_ids = collect_pks(&mut sink, "products", &products.records, |p: &Product| {
            p.product_id.clone()
        });
        let customer_ids =
            collect_pks(&mut sink, "customers", &customers.records, |c: &Customer| {
                c.customer_id.clone()
            });
        let seller_ids = collect_pks(&mut sink, "sellers", &sellers.records, |s: &Seller| {
            s.seller_id.clone()
        });
        let order_ids = collect_pks(&mut sink, "orders", &orders.records, |o: &Order| {
            o.order_id.clone()
        });
        check_item_pks(&mut sink, &order_items.records);
        let pk_status = status_since(&sink, pk_errors_before);

        let fk_errors_before = sink.errors;
        check_fk_integrity(
            &mut sink,
            &orders.records,
            &order_items.records,
            &customer_ids,
            &seller_ids,
            &product_ids,
            &order_ids,
        );
        let fk_status = status_since(&sink, fk_errors_before);

        let ts_errors_before = sink.errors;
        check_timestamp_order(&mut sink, &orders.records);
        let ts_status = status_since(&sink, ts_errors_before);

        let temporal_errors_before = sink.errors;
        check_temporal_validity(
            &mut sink,
            &orders.records,
            &order_items.records,
            &customers.records,
            &sellers.records,
        );
        let temporal_status = status_since(&sink, temporal_errors_before);

        if orders.records.is_empty() {
            sink.warning(
                Check::Schema,
                "orders",
                None,
                "orders table has zero rows".to_string(),
            );
        }

        Ok(ValidationSummary {
            dataset_dir: dir.clone(),
            format: self
                .options
                .format
                .map(|f| f.to_string())
                .unwrap_or_else(|| format!("auto ({})", orders.format)),
            tables: TableCounts {
                products: products.records.len(),
                customers: customers.records.len(),
                sellers: sellers.records.len(),
                orders: orders.records.len(),
                order_items: order_items.records.len(),
            },
            checks: ChecksReport {
                schema: schema_status,
                pk_duplicates: pk_status,
                fk_integrity: fk_status,
                timestamp_order: ts_status,
                temporal_validity: temporal_status,
            },
            issues: sink.issues,
            errors: sink.errors,
            warnings: sink.warnings,
            truncated: sink.truncated,
        })
    }

    /// Locate and parse one table file, recording per-record parse failures.
    fn load_table<T: DeserializeOwned>(
        &self,
        table: &str,
        sink: &mut IssueSink,
    ) -> anyhow::Result<LoadedTable<T>> {
        let (path, format, gzipped) = self.locate(table)?;
        let file = File::open(&path)
            .with_context(|| format!("failed to open {}", path.display()))?;
        let reader: Box<dyn Read> = if gzipped {
            Box::new(MultiGzDecoder::new(file))
        } else {
            Box::new(file)
        };
        let reader = BufReader::new(reader);

        match format {
            OutputFormat::Csv => {
                let mut csv_reader = csv::Reader::from_reader(reader);
                let headers: Vec<String> = csv_reader
                    .headers()
                    .with_context(|| format!("failed to read headers of {}", path.display()))?
                    .iter()
                    .map(|h| h.to_string())
                    .collect();

                let mut records = Vec::new();
                for (row, result) in csv_reader.deserialize::<T>().enumerate() {
                    match result {
                        Ok(record) => records.push(record),
                        Err(e) => sink.error(
                            Check::Parse,
                            table,
                            Some(format!("row {}", row + 1)),
                            e.to_string(),
                        ),
                    }
                }
                Ok(LoadedTable {
                    records,
                    headers: Some(headers),
                    format,
                })
            }
            OutputFormat::Jsonl => {
                let mut records = Vec::new();
                for (row, line) in reader.lines().enumerate() {
                    let line =
                        line.with_context(|| format!("failed to read {}", path.display()))?;
                    if line.trim().is_empty() {
                        continue;
                    }
                    match serde_json::from_str::<T>(&line) {
                        Ok(record) => records.push(record),
                        Err(e) => sink.error(
                            Check::Parse,
                            table,
                            Some(format!("line {}", row + 1)),
                            e.to_string(),
                        ),
                    }
                }
                Ok(LoadedTable {
                    records,
                    headers: None,
                    format,
                })
            }
        }
    }

    /// Find the file for a table, honoring a forced format if set.
    fn locate(&self, table: &str) -> anyhow::Result<(PathBuf, OutputFormat, bool)> {
        let candidates: Vec<(String, OutputFormat, bool)> = match self.options.format {
            Some(format) => vec![
                (format!("{}.{}", table, format.extension()), format, false),
                (format!("{}.{}.gz", table, format.extension()), format, true),
            ],
            None => vec![
                (format!("{}.csv", table), OutputFormat::Csv, false),
                (format!("{}.csv.gz", table), OutputFormat::Csv, true),
                (format!("{}.jsonl", table), OutputFormat::Jsonl, false),
                (format!("{}.jsonl.gz", table), OutputFormat::Jsonl, true),
            ],
        };

        for (name, format, gzipped) in candidates {
            let path = self.options.dir.join(&name);
            if path.is_file() {
                return Ok((path, format, gzipped));
            }
        }
        anyhow::bail!(
            "no file found for table '{}' in {}",
            table,
            self.options.dir.display()
        )
    }
}

fn status_since(sink: &IssueSink, errors_before: usize) -> CheckStatus {
    if sink.errors > errors_before {
        CheckStatus::Failed
    } else {
        CheckStatus::Passed
    }
}

fn check_headers(
    sink: &mut IssueSink,
    table: &str,
    headers: &Option<Vec<String>>,
    expected: &[&str],
) {
    // JSONL carries no header row; field names are checked by typed parsing.
    let Some(headers) = headers else {
        return;
    };
    if headers != expected {
        sink.error(
            Check::Schema,
            table,
            None,
            format!(
                "column mismatch: expected [{}], found [{}]",
                expected.join(", "),
                headers.join(", ")
            ),
        );
    }
}

fn collect_pks<T>(
    sink: &mut IssueSink,
    table: &str,
    records: &[T],
    key: impl Fn(&T) -> String,
) -> AHashSet<String> {
    let mut ids = AHashSet::with_capacity(records.len());
    for record in records {
        let id = key(record);
        if !ids.insert(id.clone()) {
            sink.error(
                Check::PkDuplicates,
                table,
                Some(id.clone()),
                "duplicate primary key".to_string(),
            );
        }
    }
    ids
}

fn check_item_pks(sink: &mut IssueSink, items: &[OrderItem]) {
    let mut seen: AHashSet<(String, u32)> = AHashSet::with_capacity(items.len());
    for item in items {
        if !seen.insert((item.order_id.clone(), item.order_item_id)) {
            sink.error(
                Check::PkDuplicates,
                "order_items",
                Some(format!("{}#{}", item.order_id, item.order_item_id)),
                "duplicate (order_id, order_item_id)".to_string(),
            );
        }
    }
}

fn check_fk_integrity(
    sink: &mut IssueSink,
    orders: &[Order],
    items: &[OrderItem],
    customer_ids: &AHashSet<String>,
    seller_ids: &AHashSet<String>,
    product_ids: &AHashSet<String>,
    order_ids: &AHashSet<String>,
) {
    for order in orders {
        if !customer_ids.contains(&order.customer_id) {
            sink.error(
                Check::FkIntegrity,
                "orders",
                Some(order.order_id.clone()),
                format!("references missing customer {}", order.customer_id),
            );
        }
    }

    let mut orders_with_items: AHashSet<&str> = AHashSet::new();
    for item in items {
        orders_with_items.insert(item.order_id.as_str());
        if !order_ids.contains(&item.order_id) {
            sink.error(
                Check::FkIntegrity,
                "order_items",
                Some(format!("{}#{}", item.order_id, item.order_item_id)),
                format!("references missing order {}", item.order_id),
            );
        }
        if !product_ids.contains(&item.product_id) {
            sink.error(
                Check::FkIntegrity,
                "order_items",
                Some(format!("{}#{}", item.order_id, item.order_item_id)),
                format!("references missing product {}", item.product_id),
            );
        }
        if !seller_ids.contains(&item.seller_id) {
            sink.error(
                Check::FkIntegrity,
                "order_items",
                Some(format!("{}#{}", item.order_id, item.order_item_id)),
                format!("references missing seller {}", item.seller_id),
            );
        }
    }

    for order in orders {
        if !orders_with_items.contains(order.order_id.as_str()) {
            sink.warning(
                Check::FkIntegrity,
                "orders",
                Some(order.order_id.clone()),
                "order has no items".to_string(),
            );
        }
    }
}

fn check_timestamp_order(sink: &mut IssueSink, orders: &[Order]) {
    for order in orders {
        // Causal chain: purchase <= approved <= carrier <= customer.
        let mut previous: (&str, NaiveDate) = ("purchase", order.order_purchase_date);
        let stages: [(&str, Option<NaiveDate>); 3] = [
            ("approved", order.order_approved_at),
            ("carrier handoff", order.order_delivered_carrier_date),
            ("customer delivery", order.order_delivered_customer_date),
        ];
        for (name, date) in stages {
            let Some(date) = date else { continue };
            if date < previous.1 {
                sink.error(
                    Check::TimestampOrder,
                    "orders",
                    Some(order.order_id.clone()),
                    format!(
                        "{} date {} precedes {} date {}",
                        name, date, previous.0, previous.1
                    ),
                );
            }
            previous = (name, date);
        }

        check_status_consistency(sink, order);
    }
}

fn check_status_consistency(sink: &mut IssueSink, order: &Order) {
    let expectations: [(&str, bool, bool); 4] = [
        (
            "order_approved_at",
            order.order_approved_at.is_some(),
            order.order_status.is_approved(),
        ),
        (
            "order_estimated_delivery_date",
            order.order_estimated_delivery_date.is_some(),
            order.order_status.is_shipped(),
        ),
        (
            "order_delivered_carrier_date",
            order.order_delivered_carrier_date.is_some(),
            order.order_status.is_delivered(),
        ),
        (
            "order_delivered_customer_date",
            order.order_delivered_customer_date.is_some(),
            order.order_status.is_delivered(),
        ),
    ];
    for (field, populated, expected) in expectations {
        if populated != expected {
            let verb = if expected { "missing" } else { "unexpected" };
            sink.error(
                Check::TimestampOrder,
                "orders",
                Some(order.order_id.clone()),
                format!("{} {} for status {}", verb, field, order.order_status),
            );
        }
    }
}

fn check_temporal_validity(
    sink: &mut IssueSink,
    orders: &[Order],
    items: &[OrderItem],
    customers: &[Customer],
    sellers: &[Seller],
) {
    let customer_created: AHashMap<&str, NaiveDate> = customers
        .iter()
        .map(|c| (c.customer_id.as_str(), c.customer_created_date))
        .collect();
    let seller_created: AHashMap<&str, NaiveDate> = sellers
        .iter()
        .map(|s| (s.seller_id.as_str(), s.seller_created_date))
        .collect();
    let purchase_dates: AHashMap<&str, NaiveDate> = orders
        .iter()
        .map(|o| (o.order_id.as_str(), o.order_purchase_date))
        .collect();

    for order in orders {
        if let Some(created) = customer_created.get(order.customer_id.as_str()) {
            if *created > order.order_purchase_date {
                sink.error(
                    Check::TemporalValidity,
                    "orders",
                    Some(order.order_id.clone()),
                    format!(
                        "customer {} created {} after purchase date {}",
                        order.customer_id, created, order.order_purchase_date
                    ),
                );
            }
        }
    }

    for item in items {
        let (Some(purchase), Some(created)) = (
            purchase_dates.get(item.order_id.as_str()),
            seller_created.get(item.seller_id.as_str()),
        ) else {
            // Dangling FKs are reported by the FK check.
            continue;
        };
        if created > purchase {
            sink.error(
                Check::TemporalValidity,
                "order_items",
                Some(format!("{}#{}", item.order_id, item.order_item_id)),
                format!(
                    "seller {} created {} after purchase date {}",
                    item.seller_id, created, purchase
                ),
            );
        }
    }
}
