//! Deterministic synthetic e-commerce dataset generation.
//!
//! Generates five relational tables (products, customers, sellers, orders,
//! order items) whose foreign keys are temporally valid and whose
//! fulfillment timestamps are causally ordered, then serializes them to
//! CSV or JSONL. The same seed and worker count always reproduce the same
//! dataset.

// Allow dead code for items that are part of the public API but only used in tests
#![allow(dead_code)]

pub mod catalog;
pub mod config;
pub mod fake;
pub mod generator;
pub mod schema;
pub mod validate;
pub mod writer;

pub use generator::{Dataset, Generator, GeneratorConfig};
pub use schema::{Customer, Order, OrderItem, OrderStatus, Product, Seller};
pub use validate::{ValidateOptions, ValidationSummary, Validator};
pub use writer::{DatasetWriter, OutputFormat, WriteOptions};
