#![cfg_attr(not(feature = "std"), no_std, no_main)]

/// # Fraction Ledger — per-property share accounting
///
/// Multi-token balance book: each property id is its own fungible share
/// class. The registered exchange is the sole minter/burner and may move
/// shares on a holder's behalf during settlement; holders can always move
/// their own. No allowance bookkeeping — the operator surface is exactly
/// what the exchange consumes.
#[ink::contract]
mod fraction_ledger {
    use ink::prelude::vec::Vec;
    use ink::storage::Mapping;

    // =========================================================================
    // STORAGE
    // =========================================================================

    #[ink(storage)]
    pub struct FractionLedger {
        /// Share units per (share class, holder).
        balances: Mapping<(u64, AccountId), Balance>,
        /// Units in circulation per share class.
        supplies: Mapping<u64, Balance>,
        /// Deployer; administers the exchange socket and the pause switch.
        operator: AccountId,
        /// The only account allowed to mint, burn, and settle transfers.
        exchange: Option<AccountId>,
        paused: bool,
    }

    // =========================================================================
    // EVENTS
    // =========================================================================

    /// `from = None` marks a mint, `to = None` a burn.
    #[ink(event)]
    pub struct Transfer {
        #[ink(topic)]
        from: Option<AccountId>,
        #[ink(topic)]
        to: Option<AccountId>,
        token_id: u64,
        value: Balance,
    }

    #[ink(event)]
    pub struct TransferBatch {
        #[ink(topic)]
        from: Option<AccountId>,
        #[ink(topic)]
        to: Option<AccountId>,
        token_ids: Vec<u64>,
        values: Vec<Balance>,
    }

    #[ink(event)]
    pub struct ExchangeUpdated {
        #[ink(topic)]
        new_exchange: AccountId,
    }

    // =========================================================================
    // ERRORS
    // =========================================================================

    #[derive(Debug, PartialEq, Eq, scale::Encode, scale::Decode)]
    #[cfg_attr(feature = "std", derive(scale_info::TypeInfo))]
    pub enum Error {
        /// Caller is not the ledger operator.
        NotOperator,
        /// Caller is neither the holder nor the registered exchange.
        NotAuthorized,
        /// No exchange has been registered yet.
        NoExchangeRegistered,
        /// Holder's unit count is insufficient.
        InsufficientBalance,
        /// Zero-unit mint, burn, or transfer.
        InvalidAmount,
        /// Batch id/value lengths differ.
        BatchArityMismatch,
        /// An arithmetic operation overflowed.
        Overflow,
        /// Ledger is paused.
        LedgerPaused,
    }

    // =========================================================================
    // IMPLEMENTATION
    // =========================================================================

    impl FractionLedger {
        #[ink(constructor)]
        pub fn new() -> Self {
            Self {
                balances: Mapping::default(),
                supplies: Mapping::default(),
                operator: Self::env().caller(),
                exchange: None,
                paused: false,
            }
        }

        // =====================================================================
        // EXCHANGE SOCKET — mint, burn, settle
        // =====================================================================

        /// Create `amount` units of share class `token_id` for `to`.
        ///
        /// **Caller:** the registered exchange only.
        #[ink(message)]
        pub fn mint(&mut self, to: AccountId, token_id: u64, amount: Balance) -> Result<(), Error> {
            self.assert_not_paused()?;
            self.ensure_exchange()?;
            if amount == 0 {
                return Err(Error::InvalidAmount);
            }

            self.credit(to, token_id, amount)?;
            let supply = self.supplies.get(token_id).unwrap_or(0);
            let new_supply = supply.checked_add(amount).ok_or(Error::Overflow)?;
            self.supplies.insert(token_id, &new_supply);

            self.env().emit_event(Transfer {
                from: None,
                to: Some(to),
                token_id,
                value: amount,
            });
            Ok(())
        }

        /// Destroy `amount` units of `token_id` held by `from`.
        ///
        /// **Caller:** the registered exchange only.
        #[ink(message)]
        pub fn burn(
            &mut self,
            from: AccountId,
            token_id: u64,
            amount: Balance,
        ) -> Result<(), Error> {
            self.assert_not_paused()?;
            self.ensure_exchange()?;
            if amount == 0 {
                return Err(Error::InvalidAmount);
            }

            self.debit(from, token_id, amount)?;
            let supply = self.supplies.get(token_id).unwrap_or(0);
            self.supplies.insert(token_id, &supply.saturating_sub(amount));

            self.env().emit_event(Transfer {
                from: Some(from),
                to: None,
                token_id,
                value: amount,
            });
            Ok(())
        }

        /// Move `amount` units of `token_id` from `from` to `to`.
        ///
        /// **Caller:** `from` itself, or the registered exchange settling a
        /// purchase on the holder's behalf.
        #[ink(message)]
        pub fn transfer(
            &mut self,
            from: AccountId,
            to: AccountId,
            token_id: u64,
            amount: Balance,
        ) -> Result<(), Error> {
            self.assert_not_paused()?;
            self.ensure_holder_or_exchange(from)?;
            if amount == 0 {
                return Err(Error::InvalidAmount);
            }

            self.debit(from, token_id, amount)?;
            self.credit(to, token_id, amount)?;

            self.env().emit_event(Transfer {
                from: Some(from),
                to: Some(to),
                token_id,
                value: amount,
            });
            Ok(())
        }

        /// Batch form of [`Self::transfer`]: all legs succeed or the call
        /// fails before any leg is applied.
        #[ink(message)]
        pub fn transfer_batch(
            &mut self,
            from: AccountId,
            to: AccountId,
            token_ids: Vec<u64>,
            values: Vec<Balance>,
        ) -> Result<(), Error> {
            self.assert_not_paused()?;
            self.ensure_holder_or_exchange(from)?;
            if token_ids.len() != values.len() {
                return Err(Error::BatchArityMismatch);
            }

            // Validate every leg before touching balances.
            for (token_id, value) in token_ids.iter().zip(values.iter()) {
                if *value == 0 {
                    return Err(Error::InvalidAmount);
                }
                if self.balances.get((*token_id, from)).unwrap_or(0) < *value {
                    return Err(Error::InsufficientBalance);
                }
            }
            for (token_id, value) in token_ids.iter().zip(values.iter()) {
                self.debit(from, *token_id, *value)?;
                self.credit(to, *token_id, *value)?;
            }

            self.env().emit_event(TransferBatch {
                from: Some(from),
                to: Some(to),
                token_ids,
                values,
            });
            Ok(())
        }

        // =====================================================================
        // VIEW FUNCTIONS
        // =====================================================================

        #[ink(message)]
        pub fn balance_of(&self, holder: AccountId, token_id: u64) -> Balance {
            self.balances.get((token_id, holder)).unwrap_or(0)
        }

        #[ink(message)]
        pub fn balance_of_batch(
            &self,
            holders: Vec<AccountId>,
            token_ids: Vec<u64>,
        ) -> Result<Vec<Balance>, Error> {
            if holders.len() != token_ids.len() {
                return Err(Error::BatchArityMismatch);
            }
            let mut balances = Vec::new();
            for (holder, token_id) in holders.iter().zip(token_ids.iter()) {
                balances.push(self.balances.get((*token_id, *holder)).unwrap_or(0));
            }
            Ok(balances)
        }

        #[ink(message)]
        pub fn total_supply(&self, token_id: u64) -> Balance {
            self.supplies.get(token_id).unwrap_or(0)
        }

        #[ink(message)]
        pub fn get_exchange(&self) -> Option<AccountId> {
            self.exchange
        }

        #[ink(message)]
        pub fn is_paused(&self) -> bool {
            self.paused
        }

        // =====================================================================
        // ADMIN
        // =====================================================================

        /// Register the exchange allowed to mint, burn, and settle.
        #[ink(message)]
        pub fn set_exchange(&mut self, new_exchange: AccountId) -> Result<(), Error> {
            self.ensure_operator()?;
            self.exchange = Some(new_exchange);
            self.env().emit_event(ExchangeUpdated { new_exchange });
            Ok(())
        }

        #[ink(message)]
        pub fn set_paused(&mut self, paused: bool) -> Result<(), Error> {
            self.ensure_operator()?;
            self.paused = paused;
            Ok(())
        }

        // =====================================================================
        // INTERNAL HELPERS
        // =====================================================================

        fn ensure_operator(&self) -> Result<(), Error> {
            if self.env().caller() != self.operator {
                return Err(Error::NotOperator);
            }
            Ok(())
        }

        fn ensure_exchange(&self) -> Result<(), Error> {
            let exchange = self.exchange.ok_or(Error::NoExchangeRegistered)?;
            if self.env().caller() != exchange {
                return Err(Error::NotAuthorized);
            }
            Ok(())
        }

        fn ensure_holder_or_exchange(&self, from: AccountId) -> Result<(), Error> {
            let caller = self.env().caller();
            if caller == from || Some(caller) == self.exchange {
                return Ok(());
            }
            Err(Error::NotAuthorized)
        }

        fn assert_not_paused(&self) -> Result<(), Error> {
            if self.paused {
                return Err(Error::LedgerPaused);
            }
            Ok(())
        }

        fn debit(&mut self, holder: AccountId, token_id: u64, amount: Balance) -> Result<(), Error> {
            let units = self.balances.get((token_id, holder)).unwrap_or(0);
            if units < amount {
                return Err(Error::InsufficientBalance);
            }
            self.balances.insert((token_id, holder), &(units - amount));
            Ok(())
        }

        fn credit(
            &mut self,
            holder: AccountId,
            token_id: u64,
            amount: Balance,
        ) -> Result<(), Error> {
            let units = self.balances.get((token_id, holder)).unwrap_or(0);
            let new_units = units.checked_add(amount).ok_or(Error::Overflow)?;
            self.balances.insert((token_id, holder), &new_units);
            Ok(())
        }
    }

    // =========================================================================
    // UNIT TESTS
    // =========================================================================

    #[cfg(test)]
    mod tests {
        use super::*;
        use ink::env::{test, DefaultEnvironment};

        type Env = DefaultEnvironment;

        fn accounts() -> test::DefaultAccounts<Env> {
            test::default_accounts::<Env>()
        }
        fn set_caller(a: AccountId) {
            test::set_caller::<Env>(a);
        }

        /// alice deploys and operates; bob is the registered exchange.
        fn deploy() -> FractionLedger {
            let accs = accounts();
            set_caller(accs.alice);
            let mut ledger = FractionLedger::new();
            ledger.set_exchange(accs.bob).unwrap();
            ledger
        }

        // ── Mint & burn ───────────────────────────────────────────────────────

        #[ink::test]
        fn mint_requires_registered_exchange() {
            let accs = accounts();
            set_caller(accs.alice);
            let mut ledger = FractionLedger::new();
            assert_eq!(
                ledger.mint(accs.charlie, 1, 100),
                Err(Error::NoExchangeRegistered)
            );
            ledger.set_exchange(accs.bob).unwrap();
            set_caller(accs.charlie);
            assert_eq!(ledger.mint(accs.charlie, 1, 100), Err(Error::NotAuthorized));
        }

        #[ink::test]
        fn mint_credits_holder_and_supply() {
            let mut ledger = deploy();
            let accs = accounts();
            set_caller(accs.bob);
            ledger.mint(accs.charlie, 7, 1_000).unwrap();
            assert_eq!(ledger.balance_of(accs.charlie, 7), 1_000);
            assert_eq!(ledger.total_supply(7), 1_000);
            assert_eq!(ledger.balance_of(accs.charlie, 8), 0, "classes are disjoint");
        }

        #[ink::test]
        fn mint_zero_rejected() {
            let mut ledger = deploy();
            let accs = accounts();
            set_caller(accs.bob);
            assert_eq!(ledger.mint(accs.charlie, 7, 0), Err(Error::InvalidAmount));
        }

        #[ink::test]
        fn burn_debits_holder_and_supply() {
            let mut ledger = deploy();
            let accs = accounts();
            set_caller(accs.bob);
            ledger.mint(accs.charlie, 7, 1_000).unwrap();
            ledger.burn(accs.charlie, 7, 400).unwrap();
            assert_eq!(ledger.balance_of(accs.charlie, 7), 600);
            assert_eq!(ledger.total_supply(7), 600);
        }

        #[ink::test]
        fn burn_beyond_balance_rejected() {
            let mut ledger = deploy();
            let accs = accounts();
            set_caller(accs.bob);
            ledger.mint(accs.charlie, 7, 100).unwrap();
            assert_eq!(
                ledger.burn(accs.charlie, 7, 101),
                Err(Error::InsufficientBalance)
            );
        }

        // ── Transfer ──────────────────────────────────────────────────────────

        #[ink::test]
        fn holder_moves_own_units() {
            let mut ledger = deploy();
            let accs = accounts();
            set_caller(accs.bob);
            ledger.mint(accs.charlie, 7, 1_000).unwrap();
            set_caller(accs.charlie);
            ledger.transfer(accs.charlie, accs.django, 7, 250).unwrap();
            assert_eq!(ledger.balance_of(accs.charlie, 7), 750);
            assert_eq!(ledger.balance_of(accs.django, 7), 250);
            assert_eq!(ledger.total_supply(7), 1_000, "transfers preserve supply");
        }

        #[ink::test]
        fn exchange_settles_on_holders_behalf() {
            let mut ledger = deploy();
            let accs = accounts();
            set_caller(accs.bob);
            ledger.mint(accs.charlie, 7, 1_000).unwrap();
            ledger.transfer(accs.charlie, accs.django, 7, 10).unwrap();
            assert_eq!(ledger.balance_of(accs.django, 7), 10);
        }

        #[ink::test]
        fn third_party_transfer_rejected() {
            let mut ledger = deploy();
            let accs = accounts();
            set_caller(accs.bob);
            ledger.mint(accs.charlie, 7, 1_000).unwrap();
            set_caller(accs.eve);
            assert_eq!(
                ledger.transfer(accs.charlie, accs.eve, 7, 10),
                Err(Error::NotAuthorized)
            );
        }

        #[ink::test]
        fn transfer_beyond_balance_rejected() {
            let mut ledger = deploy();
            let accs = accounts();
            set_caller(accs.bob);
            ledger.mint(accs.charlie, 7, 100).unwrap();
            set_caller(accs.charlie);
            assert_eq!(
                ledger.transfer(accs.charlie, accs.django, 7, 101),
                Err(Error::InsufficientBalance)
            );
        }

        // ── Batch operations ──────────────────────────────────────────────────

        #[ink::test]
        fn batch_transfer_moves_every_leg() {
            let mut ledger = deploy();
            let accs = accounts();
            set_caller(accs.bob);
            ledger.mint(accs.charlie, 1, 100).unwrap();
            ledger.mint(accs.charlie, 2, 200).unwrap();
            set_caller(accs.charlie);
            ledger
                .transfer_batch(accs.charlie, accs.django, vec![1, 2], vec![40, 60])
                .unwrap();
            assert_eq!(ledger.balance_of(accs.django, 1), 40);
            assert_eq!(ledger.balance_of(accs.django, 2), 60);
        }

        #[ink::test]
        fn batch_arity_mismatch_rejected() {
            let mut ledger = deploy();
            let accs = accounts();
            set_caller(accs.charlie);
            assert_eq!(
                ledger.transfer_batch(accs.charlie, accs.django, vec![1, 2], vec![40]),
                Err(Error::BatchArityMismatch)
            );
        }

        #[ink::test]
        fn batch_short_leg_moves_nothing() {
            let mut ledger = deploy();
            let accs = accounts();
            set_caller(accs.bob);
            ledger.mint(accs.charlie, 1, 100).unwrap();
            ledger.mint(accs.charlie, 2, 10).unwrap();
            set_caller(accs.charlie);
            assert_eq!(
                ledger.transfer_batch(accs.charlie, accs.django, vec![1, 2], vec![50, 11]),
                Err(Error::InsufficientBalance)
            );
            assert_eq!(ledger.balance_of(accs.charlie, 1), 100, "no partial batch");
            assert_eq!(ledger.balance_of(accs.django, 1), 0);
        }

        #[ink::test]
        fn balance_of_batch_reports_pairwise() {
            let mut ledger = deploy();
            let accs = accounts();
            set_caller(accs.bob);
            ledger.mint(accs.charlie, 1, 100).unwrap();
            ledger.mint(accs.django, 2, 200).unwrap();
            assert_eq!(
                ledger.balance_of_batch(vec![accs.charlie, accs.django], vec![1, 2]),
                Ok(vec![100, 200])
            );
            assert_eq!(
                ledger.balance_of_batch(vec![accs.charlie], vec![1, 2]),
                Err(Error::BatchArityMismatch)
            );
        }

        // ── Admin & safety ────────────────────────────────────────────────────

        #[ink::test]
        fn set_exchange_requires_operator() {
            let mut ledger = deploy();
            let accs = accounts();
            set_caller(accs.bob);
            assert_eq!(ledger.set_exchange(accs.bob), Err(Error::NotOperator));
        }

        #[ink::test]
        fn paused_rejects_writes() {
            let mut ledger = deploy();
            let accs = accounts();
            set_caller(accs.bob);
            ledger.mint(accs.charlie, 7, 100).unwrap();
            set_caller(accs.alice);
            ledger.set_paused(true).unwrap();
            set_caller(accs.bob);
            assert_eq!(ledger.mint(accs.charlie, 7, 1), Err(Error::LedgerPaused));
            set_caller(accs.charlie);
            assert_eq!(
                ledger.transfer(accs.charlie, accs.django, 7, 1),
                Err(Error::LedgerPaused)
            );
            assert_eq!(ledger.balance_of(accs.charlie, 7), 100, "reads stay open");
        }
    }
}
