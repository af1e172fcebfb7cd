//! Constraint-satisfying random dataset synthesis.
//!
//! Orders are the interesting part: fulfillment timestamps must be causally
//! ordered (purchase -> approval -> carrier handoff -> delivery) and foreign
//! keys must be temporally valid (the referenced customer and seller both
//! exist on the purchase date). Everything is driven by seeded ChaCha8
//! streams so a given (seed, workers) pair reproduces the dataset exactly.

use crate::catalog::{self, round_price, DATASET_EPOCH};
use crate::fake::FakeData;
use crate::schema::{format_id, Customer, Order, OrderItem, OrderStatus, Product, Seller};
use anyhow::bail;
use chrono::NaiveDate;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Default customer count.
pub const DEFAULT_CUSTOMERS: usize = 5_000;
/// Default seller count.
pub const DEFAULT_SELLERS: usize = 500;
/// Default order count.
pub const DEFAULT_ORDERS: usize = 10_000;
/// Default random seed.
pub const DEFAULT_SEED: u64 = 42;

// Seed stream offsets. Customers, sellers, and each order chunk draw from
// independent streams so entity counts can change without perturbing the
// other entities' values.
const SELLER_STREAM: u64 = 1;
const ORDER_STREAM: u64 = 2;

/// Generation parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratorConfig {
    pub customers: usize,
    pub sellers: usize,
    pub orders: usize,
    pub seed: u64,
    /// Worker threads for order generation. 0 means one per available core.
    pub workers: usize,
    /// Latest customer signup date.
    pub customer_signup_cutoff: NaiveDate,
    /// Latest seller signup date.
    pub seller_signup_cutoff: NaiveDate,
    /// Latest purchase date.
    pub horizon: NaiveDate,
    pub min_items_per_order: u32,
    pub max_items_per_order: u32,
    pub min_freight_ratio: f64,
    pub max_freight_ratio: f64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            customers: DEFAULT_CUSTOMERS,
            sellers: DEFAULT_SELLERS,
            orders: DEFAULT_ORDERS,
            seed: DEFAULT_SEED,
            workers: 0,
            customer_signup_cutoff: NaiveDate::from_ymd_opt(2023, 12, 31)
                .unwrap_or(DATASET_EPOCH),
            seller_signup_cutoff: NaiveDate::from_ymd_opt(2023, 7, 31).unwrap_or(DATASET_EPOCH),
            horizon: NaiveDate::from_ymd_opt(2024, 12, 31).unwrap_or(DATASET_EPOCH),
            min_items_per_order: 1,
            max_items_per_order: 5,
            min_freight_ratio: 0.09,
            max_freight_ratio: 0.35,
        }
    }
}

impl GeneratorConfig {
    /// Resolve the worker count, treating 0 as "one per core".
    pub fn effective_workers(&self) -> usize {
        if self.workers > 0 {
            self.workers
        } else {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(4)
        }
    }
}

/// A complete generated dataset.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub products: Vec<Product>,
    pub customers: Vec<Customer>,
    pub sellers: Vec<Seller>,
    pub orders: Vec<Order>,
    pub order_items: Vec<OrderItem>,
}

impl Dataset {
    pub fn total_rows(&self) -> usize {
        self.products.len()
            + self.customers.len()
            + self.sellers.len()
            + self.orders.len()
            + self.order_items.len()
    }
}

/// Sellers indexed by creation date, for temporal-validity lookups.
///
/// `valid_prefix(date)` returns how many sellers existed on `date`; picking
/// uniformly inside that prefix picks uniformly among valid sellers.
struct SellerIndex {
    /// (created date, index into the sellers slice), sorted by date.
    by_created: Vec<(NaiveDate, usize)>,
}

impl SellerIndex {
    fn new(sellers: &[Seller]) -> Self {
        let mut by_created: Vec<(NaiveDate, usize)> = sellers
            .iter()
            .enumerate()
            .map(|(i, s)| (s.seller_created_date, i))
            .collect();
        by_created.sort();
        Self { by_created }
    }

    fn earliest_created(&self) -> Option<NaiveDate> {
        self.by_created.first().map(|(d, _)| *d)
    }

    /// Number of sellers created on or before `date`.
    fn valid_prefix(&self, date: NaiveDate) -> usize {
        self.by_created.partition_point(|(created, _)| *created <= date)
    }

    fn seller_at(&self, rank: usize) -> usize {
        self.by_created[rank].1
    }
}

/// Dataset generator.
pub struct Generator {
    config: GeneratorConfig,
}

impl Generator {
    pub fn new(config: GeneratorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Generate the full dataset: reference data, actors, then transactions.
    pub fn generate(&self) -> anyhow::Result<Dataset> {
        let products = catalog::build_products();
        let customers = self.generate_customers();
        let sellers = self.generate_sellers();
        let (orders, order_items) = self.generate_orders(&customers, &sellers, &products)?;

        Ok(Dataset {
            products,
            customers,
            sellers,
            orders,
            order_items,
        })
    }

    /// Generate customers with signup dates in [epoch, customer cutoff].
    pub fn generate_customers(&self) -> Vec<Customer> {
        let mut fake = FakeData::new(ChaCha8Rng::seed_from_u64(self.config.seed));
        (1..=self.config.customers as u64)
            .map(|i| {
                let state = fake.state_abbr();
                Customer {
                    customer_id: format_id(i),
                    customer_address: fake.street_address(),
                    customer_state: state.to_string(),
                    customer_zip_code: fake.zipcode_in_state(state),
                    customer_created_date: fake
                        .date_between(DATASET_EPOCH, self.config.customer_signup_cutoff),
                    customer_updated_date: None,
                }
            })
            .collect()
    }

    /// Generate sellers with signup dates in [epoch, seller cutoff].
    pub fn generate_sellers(&self) -> Vec<Seller> {
        let mut fake = FakeData::new(ChaCha8Rng::seed_from_u64(
            self.config.seed.wrapping_add(SELLER_STREAM),
        ));
        (1..=self.config.sellers as u64)
            .map(|i| {
                let state = fake.state_abbr();
                Seller {
                    seller_id: format_id(i),
                    seller_address: fake.street_address(),
                    seller_state: state.to_string(),
                    seller_zip_code: fake.zipcode_in_state(state),
                    seller_created_date: fake
                        .date_between(DATASET_EPOCH, self.config.seller_signup_cutoff),
                    seller_updated_date: None,
                }
            })
            .collect()
    }

    /// Generate orders and their items across worker threads.
    ///
    /// The order id range is split into one contiguous chunk per worker;
    /// each chunk runs on its own seed stream and the results are stitched
    /// back together in chunk order, so output is deterministic for a given
    /// (seed, workers) pair.
    pub fn generate_orders(
        &self,
        customers: &[Customer],
        sellers: &[Seller],
        products: &[Product],
    ) -> anyhow::Result<(Vec<Order>, Vec<OrderItem>)> {
        if self.config.orders == 0 {
            return Ok((Vec::new(), Vec::new()));
        }
        if customers.is_empty() {
            bail!("cannot generate orders without customers");
        }
        if sellers.is_empty() {
            bail!("cannot generate orders without sellers");
        }
        if products.is_empty() {
            bail!("cannot generate orders without products");
        }

        let seller_index = SellerIndex::new(sellers);
        let workers = self.config.effective_workers().min(self.config.orders).max(1);
        let chunks = chunk_ranges(self.config.orders as u64, workers);

        let results: Vec<(Vec<Order>, Vec<OrderItem>)> = std::thread::scope(|scope| {
            let handles: Vec<_> = chunks
                .iter()
                .enumerate()
                .map(|(chunk_idx, range)| {
                    let seller_index = &seller_index;
                    let range = range.clone();
                    scope.spawn(move || {
                        self.generate_order_range(
                            chunk_idx as u64,
                            range,
                            customers,
                            sellers,
                            seller_index,
                            products,
                        )
                    })
                })
                .collect();

            handles
                .into_iter()
                .map(|h| {
                    h.join()
                        .map_err(|_| anyhow::anyhow!("order generation worker panicked"))
                })
                .collect::<anyhow::Result<Vec<_>>>()
        })?;

        let mut orders = Vec::with_capacity(self.config.orders);
        let mut order_items = Vec::new();
        for (chunk_orders, chunk_items) in results {
            orders.extend(chunk_orders);
            order_items.extend(chunk_items);
        }

        Ok((orders, order_items))
    }

    /// Generate orders for a contiguous 1-based id range on a derived seed.
    fn generate_order_range(
        &self,
        chunk_idx: u64,
        range: std::ops::Range<u64>,
        customers: &[Customer],
        sellers: &[Seller],
        seller_index: &SellerIndex,
        products: &[Product],
    ) -> (Vec<Order>, Vec<OrderItem>) {
        let chunk_seed = self
            .config
            .seed
            .wrapping_add(ORDER_STREAM)
            .wrapping_add(chunk_idx);
        let mut fake = FakeData::new(ChaCha8Rng::seed_from_u64(chunk_seed));

        let mut orders = Vec::with_capacity((range.end - range.start) as usize);
        let mut items = Vec::new();

        // Every seller was created by this date, so starting the purchase
        // window here guarantees at least one temporally valid seller.
        let earliest_seller = seller_index
            .earliest_created()
            .unwrap_or(self.config.horizon);

        for id in range {
            let customer = &customers[fake.pick_index(customers.len())];
            let status = *fake.pick(&OrderStatus::ALL);

            let purchase_floor = customer.customer_created_date.max(earliest_seller);
            let purchase_date = fake.date_between(purchase_floor, self.config.horizon);

            // Pick uniformly among sellers that existed on the purchase date.
            let valid = seller_index.valid_prefix(purchase_date);
            debug_assert!(valid > 0);
            let seller = &sellers[seller_index.seller_at(fake.pick_index(valid))];

            let mut approved_at = None;
            let mut estimated_delivery = None;
            let mut delivered_carrier = None;
            let mut delivered_customer = None;

            // Causal fulfillment chain: each stage departs from the previous
            // stage's date, never from an earlier one.
            if status.is_approved() {
                approved_at = Some(fake.date_offset(purchase_date, 0, 1));
            }
            if status.is_shipped() {
                let approved = approved_at.unwrap_or(purchase_date);
                estimated_delivery = Some(fake.date_offset(approved, 1, 3));
            }
            if status.is_delivered() {
                let estimated = estimated_delivery.unwrap_or(purchase_date);
                let carrier = fake.date_offset(estimated, 1, 2);
                delivered_carrier = Some(carrier);
                delivered_customer = Some(fake.date_offset(carrier, 0, 2));
            }

            let order_id = format_id(id);
            let shipping_base = delivered_carrier
                .or(approved_at)
                .unwrap_or(purchase_date);
            let shipping_limit_date = fake.date_offset(shipping_base, -1, 3);

            let item_count = fake.int_range(
                self.config.min_items_per_order as i64,
                self.config.max_items_per_order as i64,
            ) as u32;
            for item_idx in 0..item_count {
                // Sampled with replacement: an order may carry the same
                // product twice as separate line items.
                let product = &products[fake.pick_index(products.len())];
                let freight = round_price(
                    product.product_price
                        * fake.ratio(self.config.min_freight_ratio, self.config.max_freight_ratio),
                );
                items.push(OrderItem {
                    order_id: order_id.clone(),
                    order_item_id: item_idx,
                    product_id: product.product_id.clone(),
                    seller_id: seller.seller_id.clone(),
                    shipping_limit_date,
                    price: product.product_price,
                    freight_value: freight,
                });
            }

            orders.push(Order {
                order_id,
                customer_id: customer.customer_id.clone(),
                order_status: status,
                order_purchase_date: purchase_date,
                order_approved_at: approved_at,
                order_delivered_carrier_date: delivered_carrier,
                order_delivered_customer_date: delivered_customer,
                order_estimated_delivery_date: estimated_delivery,
            });
        }

        (orders, items)
    }
}

/// Split `total` 1-based ids into `workers` contiguous ranges. The first
/// `total % workers` ranges carry one extra id.
fn chunk_ranges(total: u64, workers: usize) -> Vec<std::ops::Range<u64>> {
    let workers = workers as u64;
    let base = total / workers;
    let remainder = total % workers;

    let mut ranges = Vec::with_capacity(workers as usize);
    let mut start = 1u64;
    for i in 0..workers {
        let len = base + u64::from(i < remainder);
        if len == 0 {
            continue;
        }
        ranges.push(start..start + len);
        start += len;
    }
    ranges
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_config() -> GeneratorConfig {
        GeneratorConfig {
            customers: 50,
            sellers: 10,
            orders: 200,
            seed: 42,
            workers: 2,
            ..GeneratorConfig::default()
        }
    }

    #[test]
    fn test_chunk_ranges_cover_everything() {
        let ranges = chunk_ranges(10, 3);
        assert_eq!(ranges, vec![1..5, 5..8, 8..11]);
        let ranges = chunk_ranges(4, 8);
        let total: u64 = ranges.iter().map(|r| r.end - r.start).sum();
        assert_eq!(total, 4);
    }

    #[test]
    fn test_row_counts_match_config() {
        let config = small_config();
        let dataset = Generator::new(config.clone()).generate().unwrap();
        assert_eq!(dataset.customers.len(), config.customers);
        assert_eq!(dataset.sellers.len(), config.sellers);
        assert_eq!(dataset.orders.len(), config.orders);
        assert_eq!(dataset.products.len(), 120);
        assert!(!dataset.order_items.is_empty());
    }

    #[test]
    fn test_same_seed_same_dataset() {
        let a = Generator::new(small_config()).generate().unwrap();
        let b = Generator::new(small_config()).generate().unwrap();
        assert_eq!(a.customers, b.customers);
        assert_eq!(a.sellers, b.sellers);
        assert_eq!(a.orders, b.orders);
        assert_eq!(a.order_items, b.order_items);
    }

    #[test]
    fn test_different_seed_different_orders() {
        let mut other = small_config();
        other.seed = 43;
        let a = Generator::new(small_config()).generate().unwrap();
        let b = Generator::new(other).generate().unwrap();
        assert_ne!(a.orders, b.orders);
    }

    #[test]
    fn test_fulfillment_timestamps_causally_ordered() {
        let dataset = Generator::new(small_config()).generate().unwrap();
        for order in &dataset.orders {
            if let Some(approved) = order.order_approved_at {
                assert!(approved >= order.order_purchase_date, "{}", order.order_id);
            }
            if let Some(carrier) = order.order_delivered_carrier_date {
                let approved = order.order_approved_at.unwrap();
                assert!(carrier >= approved, "{}", order.order_id);
                let customer = order.order_delivered_customer_date.unwrap();
                assert!(customer >= carrier, "{}", order.order_id);
            }
        }
    }

    #[test]
    fn test_status_determines_populated_timestamps() {
        let dataset = Generator::new(small_config()).generate().unwrap();
        for order in &dataset.orders {
            match order.order_status {
                OrderStatus::Processing => {
                    assert!(order.order_approved_at.is_none());
                    assert!(order.order_estimated_delivery_date.is_none());
                    assert!(order.order_delivered_carrier_date.is_none());
                    assert!(order.order_delivered_customer_date.is_none());
                }
                OrderStatus::Approved => {
                    assert!(order.order_approved_at.is_some());
                    assert!(order.order_estimated_delivery_date.is_none());
                }
                OrderStatus::Shipped => {
                    assert!(order.order_approved_at.is_some());
                    assert!(order.order_estimated_delivery_date.is_some());
                    assert!(order.order_delivered_carrier_date.is_none());
                }
                OrderStatus::Delivered => {
                    assert!(order.order_approved_at.is_some());
                    assert!(order.order_estimated_delivery_date.is_some());
                    assert!(order.order_delivered_carrier_date.is_some());
                    assert!(order.order_delivered_customer_date.is_some());
                }
            }
        }
    }

    #[test]
    fn test_temporal_fk_validity() {
        let dataset = Generator::new(small_config()).generate().unwrap();
        let customers: std::collections::HashMap<_, _> = dataset
            .customers
            .iter()
            .map(|c| (c.customer_id.as_str(), c.customer_created_date))
            .collect();
        let sellers: std::collections::HashMap<_, _> = dataset
            .sellers
            .iter()
            .map(|s| (s.seller_id.as_str(), s.seller_created_date))
            .collect();
        let orders: std::collections::HashMap<_, _> = dataset
            .orders
            .iter()
            .map(|o| (o.order_id.as_str(), o.order_purchase_date))
            .collect();

        for order in &dataset.orders {
            let created = customers[order.customer_id.as_str()];
            assert!(created <= order.order_purchase_date, "{}", order.order_id);
        }
        for item in &dataset.order_items {
            let purchase = orders[item.order_id.as_str()];
            let seller_created = sellers[item.seller_id.as_str()];
            assert!(
                seller_created <= purchase,
                "seller {} created after purchase of order {}",
                item.seller_id,
                item.order_id
            );
        }
    }

    #[test]
    fn test_item_indexes_zero_based_and_contiguous() {
        let dataset = Generator::new(small_config()).generate().unwrap();
        let mut per_order: std::collections::HashMap<&str, Vec<u32>> =
            std::collections::HashMap::new();
        for item in &dataset.order_items {
            per_order
                .entry(item.order_id.as_str())
                .or_default()
                .push(item.order_item_id);
        }
        let config = small_config();
        for (order_id, mut idxs) in per_order {
            idxs.sort_unstable();
            let expected: Vec<u32> = (0..idxs.len() as u32).collect();
            assert_eq!(idxs, expected, "order {}", order_id);
            assert!(idxs.len() >= config.min_items_per_order as usize);
            assert!(idxs.len() <= config.max_items_per_order as usize);
        }
    }

    #[test]
    fn test_freight_within_ratio_bounds() {
        let config = small_config();
        let dataset = Generator::new(config.clone()).generate().unwrap();
        for item in &dataset.order_items {
            // Rounding can nudge freight slightly past the open upper bound.
            let lo = round_price(item.price * config.min_freight_ratio) - 0.01;
            let hi = round_price(item.price * config.max_freight_ratio) + 0.01;
            assert!(
                item.freight_value >= lo && item.freight_value <= hi,
                "freight {} outside [{}, {}] for price {}",
                item.freight_value,
                lo,
                hi,
                item.price
            );
        }
    }

    #[test]
    fn test_zero_orders_is_fine() {
        let config = GeneratorConfig {
            orders: 0,
            ..small_config()
        };
        let dataset = Generator::new(config).generate().unwrap();
        assert!(dataset.orders.is_empty());
        assert!(dataset.order_items.is_empty());
    }

    #[test]
    fn test_orders_without_customers_is_an_error() {
        let config = GeneratorConfig {
            customers: 0,
            ..small_config()
        };
        assert!(Generator::new(config).generate().is_err());
    }

    #[test]
    fn test_orders_without_sellers_is_an_error() {
        let config = GeneratorConfig {
            sellers: 0,
            ..small_config()
        };
        assert!(Generator::new(config).generate().is_err());
    }

    #[test]
    fn test_purchase_dates_within_horizon() {
        let config = small_config();
        let dataset = Generator::new(config.clone()).generate().unwrap();
        for order in &dataset.orders {
            assert!(order.order_purchase_date <= config.horizon);
            assert!(order.order_purchase_date >= DATASET_EPOCH);
        }
    }
}
