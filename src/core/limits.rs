//! Limit Policy
//!
//! Pure validation of a transfer amount against the configured per-method
//! maximum.

use crate::config::PaymentLimits;
use crate::types::{PaymentError, PaymentMethod};
use rust_decimal::Decimal;

#[derive(Debug, Clone)]
pub struct LimitPolicy {
    limits: PaymentLimits,
}

impl LimitPolicy {
    pub fn new(limits: PaymentLimits) -> Self {
        Self { limits }
    }

    /// Maximum amount for `method`
    ///
    /// Methods are looked up by their normalised name (`UPI`, `CREDIT`, ...).
    /// A method without a configured limit is not accepted for transfers.
    pub fn max_amount(&self, method: PaymentMethod) -> Result<Decimal, PaymentError> {
        self.limits
            .get(method.limit_key())
            .ok_or_else(|| PaymentError::invalid_payment_method(method.limit_key()))
    }

    /// Fail `LimitExceeded` if `amount` is above the method's maximum
    pub fn check(&self, method: PaymentMethod, amount: Decimal) -> Result<(), PaymentError> {
        let limit = self.max_amount(method)?;
        if amount > limit {
            return Err(PaymentError::limit_exceeded(
                method.limit_key(),
                limit,
                amount,
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    fn policy() -> LimitPolicy {
        LimitPolicy::new(
            PaymentLimits::new()
                .with_limit("UPI", dec!(1000))
                .with_limit("CREDIT", dec!(5000)),
        )
    }

    #[rstest]
    #[case::upi_under(PaymentMethod::Upi, dec!(200), true)]
    #[case::upi_at_limit(PaymentMethod::Upi, dec!(1000), true)]
    #[case::upi_over(PaymentMethod::Upi, dec!(1200), false)]
    #[case::card_under(PaymentMethod::CreditCard, dec!(4999.99), true)]
    #[case::card_over(PaymentMethod::CreditCard, dec!(5000.01), false)]
    fn test_check(#[case] method: PaymentMethod, #[case] amount: Decimal, #[case] ok: bool) {
        let result = policy().check(method, amount);
        if ok {
            assert!(result.is_ok());
        } else {
            assert!(matches!(result, Err(PaymentError::LimitExceeded { .. })));
        }
    }

    #[test]
    fn test_unconfigured_method_is_invalid() {
        assert_eq!(
            policy().max_amount(PaymentMethod::Bank),
            Err(PaymentError::invalid_payment_method("BANK"))
        );
    }

    #[test]
    fn test_limit_exceeded_carries_context() {
        assert_eq!(
            policy().check(PaymentMethod::Upi, dec!(1200)),
            Err(PaymentError::limit_exceeded("UPI", dec!(1000), dec!(1200)))
        );
    }
}
