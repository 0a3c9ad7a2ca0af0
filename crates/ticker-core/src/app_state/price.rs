/// Latest price quote together with the value it replaced.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceSample {
    /// Most recent quote; `0.0` until the first successful fetch.
    pub value: f64,
    /// Value held immediately before the most recent update.
    pub previous: f64,
    /// Incremented once per accepted quote.
    pub revision: u32,
}

impl Default for PriceSample {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl PriceSample {
    pub const EMPTY: Self = Self {
        value: 0.0,
        previous: 0.0,
        revision: 0,
    };

    /// Accept a new quote. Non-positive and non-finite values are rejected.
    ///
    /// On the very first accepted quote `previous` is set to the quote itself,
    /// so the displayed change starts at zero.
    pub fn apply(&mut self, value: f64) -> bool {
        if !value.is_finite() || value <= 0.0 {
            return false;
        }

        self.previous = if self.revision == 0 { value } else { self.value };
        self.value = value;
        self.revision = self.revision.wrapping_add(1);
        true
    }

    pub fn is_fetched(&self) -> bool {
        self.value > 0.0
    }

    /// Relative change from `previous` to `value`, or `None` before two quotes exist.
    pub fn change_ratio(&self) -> Option<f64> {
        if self.previous > 0.0 && self.value > 0.0 {
            Some((self.value - self.previous) / self.previous)
        } else {
            None
        }
    }
}
