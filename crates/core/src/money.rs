use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A rupee amount as reported on a bill. Serialized as a plain JSON number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Rupees(Decimal);

impl Rupees {
    pub fn from_paise(paise: i64) -> Self {
        Rupees(Decimal::new(paise, 2))
    }

    pub fn zero() -> Self {
        Rupees(Decimal::ZERO)
    }

    pub fn is_negative(self) -> bool {
        self.0.is_sign_negative() && !self.0.is_zero()
    }
}

impl fmt::Display for Rupees {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "₹{:.2}", self.0)
    }
}
