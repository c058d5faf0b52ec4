use crate::error::{BudgetError, Result};
use crate::hours::{HourKey, HourMap};
use crate::schema::{DistributionStrategy, Period};
use log::debug;

/// Share of the total assigned to the first half of the periods, in tenths.
const FRONT_LOADED_TENTHS: i64 = 6;
const BACK_LOADED_TENTHS: i64 = 4;

/// Spreads an integral hour total over a fixed period axis.
pub struct Distributor<'a> {
    periods: &'a [Period],
}

impl<'a> Distributor<'a> {
    pub fn new(periods: &'a [Period]) -> Result<Self> {
        if periods.is_empty() {
            return Err(BudgetError::InvalidArgument(
                "at least one period is required to distribute hours".to_string(),
            ));
        }
        Ok(Self { periods })
    }

    pub fn distribute(&self, strategy: &DistributionStrategy, total: i64) -> Result<HourMap> {
        if total < 0 {
            return Err(BudgetError::InvalidArgument(format!(
                "total hours must not be negative, got {}",
                total
            )));
        }

        let allocation = match strategy {
            DistributionStrategy::Even => even_split(total, self.periods.len()),
            DistributionStrategy::FrontLoaded => self.halves(total, FRONT_LOADED_TENTHS)?,
            DistributionStrategy::BackLoaded => self.halves(total, BACK_LOADED_TENTHS)?,
            DistributionStrategy::Custom(map) => return Ok(map.clone()),
        };

        debug!(
            "Distributed {} hours over {} periods using {:?}",
            total,
            self.periods.len(),
            strategy.kind()
        );

        let mut map = HourMap::new();
        for (period, hours) in self.periods.iter().zip(allocation) {
            map.insert_unchecked(HourKey::aggregate(*period), hours as f64);
        }
        Ok(map)
    }

    /// First half is `ceil(n / 2)` periods and receives `round(total * tenths / 10)`;
    /// the second half gets the rest. Each half is spread evenly.
    fn halves(&self, total: i64, first_half_tenths: i64) -> Result<Vec<i64>> {
        let n = self.periods.len();
        let first_len = n.div_ceil(2);
        let second_len = n - first_len;

        let first_target = if second_len == 0 {
            total
        } else {
            round_share(total, first_half_tenths)?
        };
        let second_target = total - first_target;

        let mut allocation = even_split(first_target, first_len);
        allocation.extend(even_split(second_target, second_len));
        Ok(allocation)
    }
}

/// `floor(total / n)` per slot with the remainder handed out one hour at a
/// time from the first slot onward.
fn even_split(total: i64, n: usize) -> Vec<i64> {
    if n == 0 {
        return Vec::new();
    }

    let count = n as i64;
    let per_period = total / count;
    let remainder = total - per_period * count;

    (0..count)
        .map(|i| {
            if i < remainder {
                per_period + 1
            } else {
                per_period
            }
        })
        .collect()
}

/// `round(total * tenths / 10)` in integer arithmetic, half rounding up.
fn round_share(total: i64, tenths: i64) -> Result<i64> {
    total
        .checked_mul(2 * tenths)
        .and_then(|scaled| scaled.checked_add(10))
        .map(|scaled| scaled / 20)
        .ok_or_else(|| {
            BudgetError::InvalidArgument(format!("total hours {} is too large", total))
        })
}

pub fn distribute(
    strategy: &DistributionStrategy,
    total: i64,
    periods: &[Period],
) -> Result<HourMap> {
    Distributor::new(periods)?.distribute(strategy, total)
}
