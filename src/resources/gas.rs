//! Gas meter: charges an abstract unit of computation per host-call
//! boundary and raises [`ResourceSignal::GasExhausted`] once the budget is
//! blown. Grounded on the add-then-compare ordering of the teacher's
//! `gas::GasTracker::charge_gas`, simplified from milligas/compute+storage
//! split down to the single flat per-call unit spec.md prescribes.

use crate::error::ResourceSignal;

pub struct GasMeter {
    gas_used: u64,
    gas_limit: u64,
    exhausted: bool,
}

impl GasMeter {
    pub fn new(gas_limit: u64) -> Self {
        GasMeter {
            gas_used: 0,
            gas_limit,
            exhausted: false,
        }
    }

    pub fn gas_used(&self) -> u64 {
        self.gas_used
    }

    pub fn gas_limit(&self) -> u64 {
        self.gas_limit
    }

    /// Consume `amount` units of gas (default 1 at call sites). Exact
    /// budget consumption (`gas_used == gas_limit`) is not exhaustion; it
    /// is the first unit over that raises the signal. On exhaustion,
    /// `gas_used` is still advanced by `amount` so the reported value
    /// reflects how far over budget the attempt went.
    pub fn consume(&mut self, amount: u64) -> Result<(), ResourceSignal> {
        if self.exhausted {
            return Err(ResourceSignal::GasExhausted {
                gas_used: self.gas_used,
                gas_limit: self.gas_limit,
            });
        }
        self.gas_used += amount;
        if self.gas_used > self.gas_limit {
            self.exhausted = true;
            log::trace!(
                "gas exhausted: used {} of {}",
                self.gas_used,
                self.gas_limit
            );
            return Err(ResourceSignal::GasExhausted {
                gas_used: self.gas_used,
                gas_limit: self.gas_limit,
            });
        }
        Ok(())
    }

    /// Restore a previously recorded `gas_used` value, e.g. from a snapshot.
    pub fn set_used(&mut self, used: u64) {
        self.gas_used = used;
        self.exhausted = used > self.gas_limit;
    }

    pub fn reset(&mut self) {
        self.gas_used = 0;
        self.exhausted = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_budget_succeeds() {
        let mut m = GasMeter::new(10);
        for _ in 0..10 {
            m.consume(1).unwrap();
        }
        assert_eq!(m.gas_used(), 10);
    }

    #[test]
    fn one_over_fails() {
        let mut m = GasMeter::new(10);
        for _ in 0..10 {
            m.consume(1).unwrap();
        }
        let err = m.consume(1).unwrap_err();
        match err {
            ResourceSignal::GasExhausted { gas_used, gas_limit } => {
                assert_eq!(gas_used, 11);
                assert_eq!(gas_limit, 10);
            }
            _ => panic!("wrong signal"),
        }
    }

    #[test]
    fn stays_exhausted() {
        let mut m = GasMeter::new(1);
        m.consume(2).unwrap_err();
        assert!(m.consume(1).is_err());
    }

    #[test]
    fn reset_clears_state() {
        let mut m = GasMeter::new(1);
        m.consume(2).unwrap_err();
        m.reset();
        assert!(m.consume(1).is_ok());
    }
}
