//! Model orders and the grid of candidate orders

use crate::error::{ForecastError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Range;
use std::str::FromStr;

/// ARIMA order triple `(p, d, q)`
///
/// Serialized as the text `"(p, d, q)"`, which is also how it is stored in
/// the results table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct ModelOrder {
    /// Autoregressive lag order
    pub p: usize,
    /// Differencing order
    pub d: usize,
    /// Moving-average lag order
    pub q: usize,
}

impl ModelOrder {
    /// Create a new model order
    pub const fn new(p: usize, d: usize, q: usize) -> Self {
        Self { p, d, q }
    }

    /// Number of estimated coefficients (AR + MA + intercept)
    pub fn num_params(&self) -> usize {
        self.p + self.q + 1
    }
}

impl fmt::Display for ModelOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.p, self.d, self.q)
    }
}

impl FromStr for ModelOrder {
    type Err = ForecastError;

    fn from_str(s: &str) -> Result<Self> {
        let inner = s
            .trim()
            .strip_prefix('(')
            .and_then(|rest| rest.strip_suffix(')'))
            .ok_or_else(|| {
                ForecastError::ValidationError(format!("Model order '{}' must be parenthesised", s))
            })?;

        let parts = inner
            .split(',')
            .map(|part| {
                part.trim().parse::<usize>().map_err(|e| {
                    ForecastError::ValidationError(format!(
                        "Invalid component '{}' in model order '{}': {}",
                        part.trim(),
                        s,
                        e
                    ))
                })
            })
            .collect::<Result<Vec<usize>>>()?;

        match parts.as_slice() {
            [p, d, q] => Ok(Self::new(*p, *d, *q)),
            _ => Err(ForecastError::ValidationError(format!(
                "Model order '{}' must have exactly three components",
                s
            ))),
        }
    }
}

impl From<ModelOrder> for String {
    fn from(order: ModelOrder) -> Self {
        order.to_string()
    }
}

impl TryFrom<String> for ModelOrder {
    type Error = ForecastError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<(usize, usize, usize)> for ModelOrder {
    fn from((p, d, q): (usize, usize, usize)) -> Self {
        Self::new(p, d, q)
    }
}

/// Candidate orders to search: the Cartesian product of three ranges
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderGrid {
    /// Autoregressive orders to try
    pub p_values: Range<usize>,
    /// Differencing orders to try
    pub d_values: Range<usize>,
    /// Moving-average orders to try
    pub q_values: Range<usize>,
}

impl OrderGrid {
    /// Create a new order grid
    pub fn new(p_values: Range<usize>, d_values: Range<usize>, q_values: Range<usize>) -> Self {
        Self {
            p_values,
            d_values,
            q_values,
        }
    }

    /// All candidate orders, p outermost and q innermost, ascending
    pub fn orders(&self) -> Vec<ModelOrder> {
        let mut orders = Vec::with_capacity(self.len());
        for p in self.p_values.clone() {
            for d in self.d_values.clone() {
                for q in self.q_values.clone() {
                    orders.push(ModelOrder::new(p, d, q));
                }
            }
        }
        orders
    }

    /// Number of candidate orders
    pub fn len(&self) -> usize {
        self.p_values.len() * self.d_values.len() * self.q_values.len()
    }

    /// Whether the grid has no candidates
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for OrderGrid {
    fn default() -> Self {
        Self::new(0..5, 0..2, 0..5)
    }
}
