//! Rate store and currency converter.
//!
//! Rates are plain `f64` and all conversions pivot through USD. This is a
//! quoting module, not a ledger; callers needing settlement-grade arithmetic
//! want a decimal type instead.

use crate::currency::Currency;
use rand::Rng;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::debug;

pub const PIVOT: &str = "USD";

/// Holds the immutable reference table plus a mutable overlay of current
/// rates. The overlay is replaced wholesale on each refresh, so readers
/// never see a half-applied update.
#[derive(Clone)]
pub struct RateStore {
    reference: Arc<Vec<Currency>>,
    overlay: Arc<Mutex<HashMap<String, f64>>>,
}

impl RateStore {
    /// Creates a store seeded from the reference table. The pivot rate is
    /// pinned to 1.0 even if the table says otherwise.
    pub fn new(reference: Vec<Currency>) -> Self {
        let mut overlay: HashMap<String, f64> = reference
            .iter()
            .map(|c| (c.code.clone(), c.rate))
            .collect();
        overlay.insert(PIVOT.to_string(), 1.0);

        RateStore {
            reference: Arc::new(reference),
            overlay: Arc::new(Mutex::new(overlay)),
        }
    }

    pub fn currencies(&self) -> &[Currency] {
        &self.reference
    }

    /// Current overlay rate for `code`. Unknown codes quote at 1.0, the
    /// documented silent fallback.
    pub async fn get_rate(&self, code: &str) -> f64 {
        let overlay = self.overlay.lock().await;
        match overlay.get(code) {
            Some(rate) => *rate,
            None => {
                debug!("Unknown currency code {}, falling back to 1.0", code);
                1.0
            }
        }
    }

    /// Re-quotes every non-pivot rate at `reference * (1 + u)` with `u`
    /// uniform in [-1%, +1%], simulating a live feed.
    pub async fn refresh(&self) {
        use rand::SeedableRng;
        self.refresh_with(&mut rand::rngs::StdRng::from_entropy()).await;
    }

    /// Same as [`refresh`](Self::refresh) with an injected random source,
    /// so tests can pin the jitter.
    pub async fn refresh_with<R: Rng>(&self, rng: &mut R) {
        let mut next: HashMap<String, f64> = HashMap::with_capacity(self.reference.len());
        for currency in self.reference.iter() {
            let rate = if currency.code == PIVOT {
                1.0
            } else {
                let jitter: f64 = rng.gen_range(-0.01..=0.01);
                currency.rate * (1.0 + jitter)
            };
            next.insert(currency.code.clone(), rate);
        }
        next.insert(PIVOT.to_string(), 1.0);

        let mut overlay = self.overlay.lock().await;
        *overlay = next;
        debug!("Refreshed {} currency rates", overlay.len());
    }

    /// Converts `amount` from one currency to another through the pivot.
    /// Identity conversions return `amount` untouched to avoid a floating
    /// round trip.
    pub async fn convert(&self, amount: f64, from: &str, to: &str) -> f64 {
        if from == to {
            return amount;
        }
        let from_rate = self.get_rate(from).await;
        let to_rate = self.get_rate(to).await;
        amount / from_rate * to_rate
    }

    /// Cross rate `from -> to`. Exactly 1.0 when the codes match; the
    /// identity is explicit rather than derived from division.
    pub async fn exchange_rate(&self, from: &str, to: &str) -> f64 {
        if from == to {
            return 1.0;
        }
        self.get_rate(to).await / self.get_rate(from).await
    }
}

/// Spawns a periodic refresh. There is no implicit cancellation: the host
/// must abort the returned handle on teardown or the task leaks.
pub fn spawn_refresh_task(store: RateStore, interval: Duration) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.tick().await; // first tick fires immediately, skip it
        loop {
            ticker.tick().await;
            store.refresh().await;
            debug!("Periodic rate refresh completed");
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::currency::reference_currencies;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn store() -> RateStore {
        RateStore::new(reference_currencies())
    }

    #[tokio::test]
    async fn test_identity_conversion_is_exact() {
        let store = store();
        for code in ["USD", "EUR", "JPY", "XYZ"] {
            assert_eq!(store.convert(123.456, code, code).await, 123.456);
        }
    }

    #[tokio::test]
    async fn test_usd_to_eur_with_reference_rates() {
        let store = store();
        let converted = store.convert(1000.0, "USD", "EUR").await;
        assert_eq!(converted, 850.0);
    }

    #[tokio::test]
    async fn test_cross_conversion_pivots_through_usd() {
        let store = store();
        // 85 EUR -> 100 USD -> 73 GBP
        let converted = store.convert(85.0, "EUR", "GBP").await;
        assert!((converted - 73.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_exchange_rate_identity_is_exactly_one() {
        let store = store();
        assert_eq!(store.exchange_rate("EUR", "EUR").await, 1.0);
        assert_eq!(store.exchange_rate("XYZ", "XYZ").await, 1.0);
    }

    #[tokio::test]
    async fn test_exchange_rate_round_trip() {
        let store = store();
        let forward = store.exchange_rate("EUR", "GBP").await;
        let back = store.exchange_rate("GBP", "EUR").await;
        assert!((forward * back - 1.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_unknown_code_quotes_at_one() {
        let store = store();
        assert_eq!(store.get_rate("XYZ").await, 1.0);
        assert_eq!(store.convert(42.0, "XYZ", "USD").await, 42.0);
    }

    #[tokio::test]
    async fn test_refresh_pins_usd_and_bounds_jitter() {
        let store = store();
        let mut rng = StdRng::seed_from_u64(7);

        for _ in 0..10 {
            store.refresh_with(&mut rng).await;
            assert_eq!(store.get_rate("USD").await, 1.0);

            for currency in store.currencies() {
                if currency.code == "USD" {
                    continue;
                }
                let rate = store.get_rate(&currency.code).await;
                let deviation = (rate - currency.rate).abs() / currency.rate;
                assert!(
                    deviation <= 0.01 + 1e-12,
                    "{} drifted {:.4}% from reference",
                    currency.code,
                    deviation * 100.0
                );
            }
        }
    }

    #[tokio::test]
    async fn test_refresh_task_holds_invariants_and_aborts() {
        let store = store();
        let handle = spawn_refresh_task(store.clone(), Duration::from_millis(5));
        tokio::time::sleep(Duration::from_millis(30)).await;

        assert_eq!(store.get_rate("USD").await, 1.0);
        let eur = store.get_rate("EUR").await;
        assert!((eur - 0.85).abs() / 0.85 <= 0.01 + 1e-12);

        handle.abort();
        assert!(handle.await.unwrap_err().is_cancelled());
    }

    #[tokio::test]
    async fn test_refresh_is_deterministic_with_seeded_rng() {
        let a = store();
        let b = store();
        a.refresh_with(&mut StdRng::seed_from_u64(42)).await;
        b.refresh_with(&mut StdRng::seed_from_u64(42)).await;
        assert_eq!(a.get_rate("EUR").await, b.get_rate("EUR").await);
    }
}
