#![cfg_attr(not(feature = "std"), no_std, no_main)]

/// # Estate Exchange — Property Registry & Purchase Engine
///
/// **Role:** Ground-truth registry for fractionalised properties, lifecycle
/// state machine, and atomic purchase-settlement engine.
///
/// ## Property Lifecycle
///
/// Every property advances through exactly one path; no transition ever
/// reverses and records are never deleted:
///
/// ```text
/// submit_property          verify_property          issue_tokens
///   (owner)          ──▶     (Verifier role)  ──▶     (owner)
/// Submitted                Verified                 Tokenized  (terminal)
/// ```
///
/// Both flags flip false→true exactly once. `issue_tokens` mints the full
/// fraction supply to the owner on the share ledger; the tokenized flag is
/// written BEFORE the mint so a re-entering mint callback cannot issue twice,
/// and is rolled back if the mint fails.
///
/// ## Purchase Settlement
///
/// `purchase_tokens(property_id, amount)` prices the requested fraction slice
/// in the pricing currency, converts it to the settlement asset through the
/// price feed, splits the platform fee, and moves funds and shares as one
/// all-or-nothing unit:
///
/// ```text
/// token_price  = ⌊ value × amount / fractions ⌋                 (pricing units)
/// usdc_amount  = ⌊ token_price × 10⁶ × 10⁸ / rate ⌋             (settlement units)
/// platform_fee = ⌊ usdc_amount × fee_bps / 10 000 ⌋
/// total_cost   = usdc_amount + platform_fee
///
/// SETTLEMENT (each step aborts the whole call on failure):
///   1. pull  total_cost    buyer      → engine custody
///   2. push  usdc_amount   custody    → property owner
///   3. push  platform_fee  custody    → fee collector
///   4. move  amount shares owner      → buyer           (ledger rechecks balance)
/// ```
///
/// The multiply-before-divide ordering above is load-bearing: reordering
/// changes the floor and therefore the settled amounts.
///
/// The whole routine runs under `purchase_lock`, an owned non-reentrancy
/// guard acquired on entry and released on every exit path. A nested call
/// arriving through any settlement callback observes the lock and fails
/// `ReentrantCall` before reading state. Read-only queries never take the
/// lock.
///
/// ## External Rails
///
/// Four capabilities are consumed by address, never owned:
/// - **AccessRegistry** — `has_role(role, account)`; gates Verifier/Admin ops.
/// - **PriceFeed** — `latest_price()`, signed fixed-point, 8 fractional
///   digits; any rate ≤ 0 is invalid.
/// - **SettlementAsset** — USDC-style rail, 6 decimals; pull + push.
/// - **ShareLedger** — per-property fungible share units; mint + transfer +
///   balance query.
#[ink::contract]
mod estate_exchange {
    use ink::prelude::{string::String, vec::Vec};
    use ink::storage::Mapping;

    #[cfg(not(test))]
    use ink::env::{
        call::{build_call, ExecutionInput, Selector},
        DefaultEnvironment,
    };

    // =========================================================================
    // CONSTANTS
    // =========================================================================

    /// Denominator for all basis-point calculations.
    pub const BPS_DENOMINATOR: u128 = 10_000;

    /// Platform fee ceiling: 1 000 BPS = 10%.
    pub const MAX_PLATFORM_FEE_BPS: u128 = 1_000;

    /// Fee applied until an admin updates it: 250 BPS = 2.5%.
    pub const DEFAULT_PLATFORM_FEE_BPS: u128 = 250;

    /// Decimal places of the settlement asset (USDC convention).
    pub const SETTLEMENT_DECIMALS: u32 = 6;

    /// Fractional digits of the price feed's fixed-point rate.
    pub const ORACLE_DECIMALS: u32 = 8;

    pub const SETTLEMENT_SCALE: u128 = 10u128.pow(SETTLEMENT_DECIMALS);
    pub const ORACLE_SCALE: u128 = 10u128.pow(ORACLE_DECIMALS);

    /// The null identity; never a valid collector or rail address.
    pub const ZERO_ACCOUNT: [u8; 32] = [0u8; 32];

    // =========================================================================
    // TYPES
    // =========================================================================

    /// Named roles resolved through the access registry.
    ///
    /// Variant order is the wire encoding; it must match the registry's.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, scale::Encode, scale::Decode)]
    #[cfg_attr(feature = "std", derive(scale_info::TypeInfo))]
    pub enum Role {
        Admin,
        Verifier,
    }

    /// One registered property.
    ///
    /// `value` and `fractions` are fixed at submission and never mutated;
    /// `is_verified` and `is_tokenized` each flip false→true at most once.
    #[derive(Debug, Clone, PartialEq, Eq, scale::Encode, scale::Decode)]
    #[cfg_attr(
        feature = "std",
        derive(scale_info::TypeInfo, ink::storage::traits::StorageLayout)
    )]
    pub struct Property {
        pub owner: AccountId,
        pub location: String,
        /// Valuation in the reference pricing currency, whole units.
        pub value: Balance,
        /// Total share units the property divides into.
        pub fractions: Balance,
        pub is_verified: bool,
        pub is_tokenized: bool,
    }

    /// Settlement breakdown for a prospective purchase.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, scale::Encode, scale::Decode)]
    #[cfg_attr(feature = "std", derive(scale_info::TypeInfo))]
    pub struct PurchaseQuote {
        /// Owner's proceeds in settlement units.
        pub usdc_amount: Balance,
        /// Collector's cut in settlement units.
        pub platform_fee: Balance,
        /// Buyer's debit: `usdc_amount + platform_fee`.
        pub total_cost: Balance,
    }

    /// Wire-level failure reported by a settlement or ledger rail.
    ///
    /// The engine never interprets the payload beyond success/failure; any
    /// rail error collapses to `PaymentFailed` / `TransferFailed`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, scale::Encode, scale::Decode)]
    #[cfg_attr(feature = "std", derive(scale_info::TypeInfo))]
    pub enum RailError {
        InsufficientBalance,
        InsufficientAllowance,
        NotAuthorized,
        Paused,
        Overflow,
    }

    // =========================================================================
    // STORAGE
    // =========================================================================

    #[ink(storage)]
    pub struct EstateExchange {
        // ── Registry ──────────────────────────────────────────────────────
        properties: Mapping<u64, Property>,
        /// Sole id generator. Ids start at 1 and are never reused.
        property_counter: u64,

        // ── Fee configuration ─────────────────────────────────────────────
        platform_fee_bps: u128,
        fee_collector: AccountId,

        // ── Rail sockets ──────────────────────────────────────────────────
        access_registry: AccountId,
        share_ledger: AccountId,
        settlement_token: AccountId,
        price_feed: AccountId,

        // ── Safety ────────────────────────────────────────────────────────
        /// Held for the full duration of `purchase_tokens`.
        purchase_lock: bool,
        paused: bool,
    }

    // =========================================================================
    // EVENTS
    // =========================================================================

    #[ink(event)]
    pub struct PropertySubmitted {
        #[ink(topic)]
        property_id: u64,
        #[ink(topic)]
        owner: AccountId,
        location: String,
        value: Balance,
        fractions: Balance,
    }

    #[ink(event)]
    pub struct PropertyVerified {
        #[ink(topic)]
        property_id: u64,
        verifier: AccountId,
    }

    #[ink(event)]
    pub struct TokensIssued {
        #[ink(topic)]
        property_id: u64,
        owner: AccountId,
        fractions: Balance,
    }

    /// Emitted only after all four settlement steps succeed.
    #[ink(event)]
    pub struct TokensPurchased {
        #[ink(topic)]
        property_id: u64,
        #[ink(topic)]
        buyer: AccountId,
        amount: Balance,
        total_cost: Balance,
    }

    #[ink(event)]
    pub struct PlatformFeeUpdated {
        previous: u128,
        updated: u128,
    }

    #[ink(event)]
    pub struct FeeCollectorUpdated {
        previous: AccountId,
        updated: AccountId,
    }

    #[ink(event)]
    pub struct PriceFeedUpdated {
        #[ink(topic)]
        new_feed: AccountId,
    }

    #[ink(event)]
    pub struct SettlementTokenUpdated {
        #[ink(topic)]
        new_token: AccountId,
    }

    #[ink(event)]
    pub struct ShareLedgerUpdated {
        #[ink(topic)]
        new_ledger: AccountId,
    }

    #[ink(event)]
    pub struct AccessRegistryUpdated {
        #[ink(topic)]
        new_registry: AccountId,
    }

    // =========================================================================
    // ERRORS
    // =========================================================================

    #[derive(Debug, PartialEq, Eq, scale::Encode, scale::Decode)]
    #[cfg_attr(feature = "std", derive(scale_info::TypeInfo))]
    pub enum Error {
        /// Property valuation of zero.
        InvalidValue,
        /// Fraction count of zero.
        InvalidFractions,
        /// Purchase amount of zero.
        InvalidAmount,
        /// The null identity where a real account is required.
        InvalidAddress,
        /// Caller lacks the required role or is not the property owner.
        Unauthorized,
        /// Property id was never assigned.
        NotFound,
        /// Verification flag already set.
        AlreadyVerified,
        /// Issuance requires a verified property.
        NotVerified,
        /// Issuance already happened.
        AlreadyTokenized,
        /// Purchase target has not been tokenized.
        NotForSale,
        /// Owner holds fewer share units than requested.
        InsufficientSupply,
        /// Price feed returned a rate ≤ 0, or could not be read.
        InvalidOracleData,
        /// A settlement-asset pull or push was rejected.
        PaymentFailed,
        /// A share-ledger mint or transfer was rejected.
        TransferFailed,
        /// Fee above the 1 000 BPS ceiling.
        FeeTooHigh,
        /// An arithmetic operation overflowed.
        Overflow,
        /// A purchase is already in flight on this engine.
        ReentrantCall,
        /// Contract is paused.
        ContractPaused,
    }

    // =========================================================================
    // CROSS-CONTRACT INTERFACES
    // =========================================================================

    /// Price feed quoting the settlement asset against the pricing currency.
    #[ink::trait_definition]
    pub trait PriceFeed {
        /// Latest signed fixed-point rate (8 fractional digits) and its
        /// as-of timestamp. Consumers must reject any rate ≤ 0.
        #[ink(message)]
        fn latest_price(&self) -> (i128, u64);
    }

    /// Transferable-balance rail the purchase settles in.
    #[ink::trait_definition]
    pub trait SettlementAsset {
        /// Pull `value` from `from` into `to`; requires prior authorization
        /// by the payer.
        #[ink(message)]
        fn transfer_from(
            &mut self,
            from: AccountId,
            to: AccountId,
            value: Balance,
        ) -> Result<(), RailError>;

        /// Push `value` from the caller's balance to `to`.
        #[ink(message)]
        fn transfer(&mut self, to: AccountId, value: Balance) -> Result<(), RailError>;
    }

    /// Per-property fungible share units; the slice of the multi-token
    /// standard the engine actually needs.
    #[ink::trait_definition]
    pub trait ShareLedger {
        #[ink(message)]
        fn mint(&mut self, to: AccountId, token_id: u64, amount: Balance)
            -> Result<(), RailError>;

        #[ink(message)]
        fn transfer(
            &mut self,
            from: AccountId,
            to: AccountId,
            token_id: u64,
            amount: Balance,
        ) -> Result<(), RailError>;

        #[ink(message)]
        fn balance_of(&self, holder: AccountId, token_id: u64) -> Balance;
    }

    /// Named role memberships.
    #[ink::trait_definition]
    pub trait AccessRegistry {
        #[ink(message)]
        fn has_role(&self, role: Role, account: AccountId) -> bool;
    }

    // =========================================================================
    // IMPLEMENTATION
    // =========================================================================

    impl EstateExchange {
        // ---------------------------------------------------------------------
        // Constructor
        // ---------------------------------------------------------------------

        /// Deploy the engine wired to its four rails.
        ///
        /// The platform fee starts at [`DEFAULT_PLATFORM_FEE_BPS`]; the
        /// collector must be a real account from the start.
        #[ink(constructor)]
        pub fn new(
            access_registry: AccountId,
            share_ledger: AccountId,
            settlement_token: AccountId,
            price_feed: AccountId,
            fee_collector: AccountId,
        ) -> Result<Self, Error> {
            if fee_collector == AccountId::from(ZERO_ACCOUNT) {
                return Err(Error::InvalidAddress);
            }
            Ok(Self {
                properties: Mapping::default(),
                property_counter: 0,
                platform_fee_bps: DEFAULT_PLATFORM_FEE_BPS,
                fee_collector,
                access_registry,
                share_ledger,
                settlement_token,
                price_feed,
                purchase_lock: false,
                paused: false,
            })
        }

        // =====================================================================
        // PROPERTY LIFECYCLE — Submitted → Verified → Tokenized
        // =====================================================================

        /// Register a property for fractionalisation. The caller becomes its
        /// owner; both lifecycle flags start false.
        ///
        /// # Errors
        /// - [`Error::InvalidValue`]     — `value == 0`.
        /// - [`Error::InvalidFractions`] — `fractions == 0`.
        #[ink(message)]
        pub fn submit_property(
            &mut self,
            location: String,
            value: Balance,
            fractions: Balance,
        ) -> Result<u64, Error> {
            self.assert_not_paused()?;
            if value == 0 {
                return Err(Error::InvalidValue);
            }
            if fractions == 0 {
                return Err(Error::InvalidFractions);
            }

            let owner = self.env().caller();
            let property_id = self.property_counter.checked_add(1).ok_or(Error::Overflow)?;
            self.property_counter = property_id;

            let record = Property {
                owner,
                location: location.clone(),
                value,
                fractions,
                is_verified: false,
                is_tokenized: false,
            };
            self.properties.insert(property_id, &record);

            self.env().emit_event(PropertySubmitted {
                property_id,
                owner,
                location,
                value,
                fractions,
            });

            Ok(property_id)
        }

        /// Attest a submitted property. One-shot: a verified property can
        /// never be verified again.
        ///
        /// **Caller:** must hold the Verifier role.
        #[ink(message)]
        pub fn verify_property(&mut self, property_id: u64) -> Result<(), Error> {
            self.assert_not_paused()?;
            self.ensure_role(Role::Verifier)?;

            let mut property = self.properties.get(property_id).ok_or(Error::NotFound)?;
            if property.is_verified {
                return Err(Error::AlreadyVerified);
            }

            property.is_verified = true;
            self.properties.insert(property_id, &property);

            self.env().emit_event(PropertyVerified {
                property_id,
                verifier: self.env().caller(),
            });

            Ok(())
        }

        /// Mint the full fraction supply to the owner, exactly once.
        ///
        /// The tokenized flag is written before the ledger mint so a
        /// re-entering callback observes `AlreadyTokenized`; the flag is
        /// rolled back if the mint fails, keeping the flip and the mint a
        /// single atomic unit in every execution environment.
        ///
        /// **Caller:** must be the property owner.
        ///
        /// # Errors
        /// - [`Error::NotVerified`]      — verification has not happened.
        /// - [`Error::AlreadyTokenized`] — issuance already happened.
        /// - [`Error::TransferFailed`]   — the ledger rejected the mint.
        #[ink(message)]
        pub fn issue_tokens(&mut self, property_id: u64) -> Result<(), Error> {
            self.assert_not_paused()?;

            let caller = self.env().caller();
            let mut property = self.properties.get(property_id).ok_or(Error::NotFound)?;
            if caller != property.owner {
                return Err(Error::Unauthorized);
            }
            if !property.is_verified {
                return Err(Error::NotVerified);
            }
            if property.is_tokenized {
                return Err(Error::AlreadyTokenized);
            }

            // Flag before mint: a nested issuance attempt must fail.
            property.is_tokenized = true;
            self.properties.insert(property_id, &property);

            if let Err(err) = self.rail_mint_shares(property.owner, property_id, property.fractions)
            {
                property.is_tokenized = false;
                self.properties.insert(property_id, &property);
                return Err(err);
            }

            self.env().emit_event(TokensIssued {
                property_id,
                owner: property.owner,
                fractions: property.fractions,
            });

            Ok(())
        }

        // =====================================================================
        // PURCHASE ENGINE — atomic settlement
        // =====================================================================

        /// Buy `amount` share units of a tokenized property from its owner.
        ///
        /// Preconditions, checked in order (first failure wins): the property
        /// exists, is tokenized, `amount > 0`, and the owner still holds at
        /// least `amount` units. Pricing and settlement follow the module
        /// doc exactly; the four transfer steps succeed together or the call
        /// fails with no partial effect.
        ///
        /// The engine's `purchase_lock` is held from entry to exit. Any
        /// nested invocation — direct or through a settlement callback —
        /// fails [`Error::ReentrantCall`] without observing state.
        #[ink(message)]
        pub fn purchase_tokens(&mut self, property_id: u64, amount: Balance) -> Result<(), Error> {
            self.assert_not_paused()?;
            if self.purchase_lock {
                return Err(Error::ReentrantCall);
            }
            self.purchase_lock = true;
            let result = self.execute_purchase(property_id, amount);
            self.purchase_lock = false;
            result
        }

        fn execute_purchase(&mut self, property_id: u64, amount: Balance) -> Result<(), Error> {
            let property = self.properties.get(property_id).ok_or(Error::NotFound)?;
            if !property.is_tokenized {
                return Err(Error::NotForSale);
            }
            if amount == 0 {
                return Err(Error::InvalidAmount);
            }

            let seller = property.owner;
            if self.rail_share_balance(seller, property_id) < amount {
                return Err(Error::InsufficientSupply);
            }

            let quote = self.settlement_breakdown(&property, amount)?;
            let buyer = self.env().caller();

            self.rail_pull_payment(buyer, quote.total_cost)?;
            self.rail_push_payment(seller, quote.usdc_amount)?;
            self.rail_push_payment(self.fee_collector, quote.platform_fee)?;
            // The ledger rechecks the seller balance: the pulls above may
            // have re-entered other surfaces and moved shares.
            self.rail_transfer_shares(seller, buyer, property_id, amount)?;

            self.env().emit_event(TokensPurchased {
                property_id,
                buyer,
                amount,
                total_cost: quote.total_cost,
            });

            Ok(())
        }

        /// Price a prospective purchase without moving anything.
        ///
        /// Same preconditions and arithmetic as [`Self::purchase_tokens`];
        /// takes no lock.
        #[ink(message)]
        pub fn quote_purchase(
            &self,
            property_id: u64,
            amount: Balance,
        ) -> Result<PurchaseQuote, Error> {
            let property = self.properties.get(property_id).ok_or(Error::NotFound)?;
            if !property.is_tokenized {
                return Err(Error::NotForSale);
            }
            if amount == 0 {
                return Err(Error::InvalidAmount);
            }
            if self.rail_share_balance(property.owner, property_id) < amount {
                return Err(Error::InsufficientSupply);
            }
            self.settlement_breakdown(&property, amount)
        }

        /// ```text
        /// token_price  = ⌊ value × amount / fractions ⌋
        /// usdc_amount  = ⌊ token_price × 10⁶ × 10⁸ / rate ⌋
        /// platform_fee = ⌊ usdc_amount × fee_bps / 10 000 ⌋
        /// total_cost   = usdc_amount + platform_fee
        /// ```
        ///
        /// Multiplications complete before any division; reordering changes
        /// the floors and is a behaviour change, not a refactor.
        fn settlement_breakdown(
            &self,
            property: &Property,
            amount: Balance,
        ) -> Result<PurchaseQuote, Error> {
            let token_price = property
                .value
                .checked_mul(amount)
                .ok_or(Error::Overflow)?
                .checked_div(property.fractions)
                .ok_or(Error::Overflow)?;

            let (rate, _updated_at) = self.rail_latest_price()?;
            if rate <= 0 {
                return Err(Error::InvalidOracleData);
            }
            let rate = rate as u128;

            let usdc_amount = token_price
                .checked_mul(SETTLEMENT_SCALE)
                .ok_or(Error::Overflow)?
                .checked_mul(ORACLE_SCALE)
                .ok_or(Error::Overflow)?
                .checked_div(rate)
                .ok_or(Error::Overflow)?;

            let platform_fee = usdc_amount
                .checked_mul(self.platform_fee_bps)
                .ok_or(Error::Overflow)?
                .checked_div(BPS_DENOMINATOR)
                .ok_or(Error::Overflow)?;

            let total_cost = usdc_amount.checked_add(platform_fee).ok_or(Error::Overflow)?;

            Ok(PurchaseQuote {
                usdc_amount,
                platform_fee,
                total_cost,
            })
        }

        // =====================================================================
        // VIEW FUNCTIONS
        // =====================================================================

        /// The stored record, verbatim.
        #[ink(message)]
        pub fn get_property_details(&self, property_id: u64) -> Result<Property, Error> {
            self.properties.get(property_id).ok_or(Error::NotFound)
        }

        /// Tokenized property ids in ascending order. Recomputed on every
        /// call, never cached.
        #[ink(message)]
        pub fn get_all_listings(&self) -> Vec<u64> {
            let mut listings = Vec::new();
            for property_id in 1..=self.property_counter {
                if let Some(property) = self.properties.get(property_id) {
                    if property.is_tokenized {
                        listings.push(property_id);
                    }
                }
            }
            listings
        }

        #[ink(message)]
        pub fn get_property_count(&self) -> u64 {
            self.property_counter
        }

        #[ink(message)]
        pub fn get_platform_fee(&self) -> u128 {
            self.platform_fee_bps
        }

        #[ink(message)]
        pub fn get_fee_collector(&self) -> AccountId {
            self.fee_collector
        }

        #[ink(message)]
        pub fn get_access_registry(&self) -> AccountId {
            self.access_registry
        }

        #[ink(message)]
        pub fn get_share_ledger(&self) -> AccountId {
            self.share_ledger
        }

        #[ink(message)]
        pub fn get_settlement_token(&self) -> AccountId {
            self.settlement_token
        }

        #[ink(message)]
        pub fn get_price_feed(&self) -> AccountId {
            self.price_feed
        }

        #[ink(message)]
        pub fn is_paused(&self) -> bool {
            self.paused
        }

        // =====================================================================
        // ADMIN — fee & rail administration (Admin role)
        // =====================================================================

        /// Update the platform fee, capped at [`MAX_PLATFORM_FEE_BPS`].
        /// Takes effect on the next purchase.
        #[ink(message)]
        pub fn update_platform_fee(&mut self, new_fee_bps: u128) -> Result<(), Error> {
            self.ensure_role(Role::Admin)?;
            if new_fee_bps > MAX_PLATFORM_FEE_BPS {
                return Err(Error::FeeTooHigh);
            }
            let previous = self.platform_fee_bps;
            self.platform_fee_bps = new_fee_bps;
            self.env().emit_event(PlatformFeeUpdated {
                previous,
                updated: new_fee_bps,
            });
            Ok(())
        }

        /// Redirect future platform fees. The null identity is rejected.
        #[ink(message)]
        pub fn update_fee_collector(&mut self, new_collector: AccountId) -> Result<(), Error> {
            self.ensure_role(Role::Admin)?;
            if new_collector == AccountId::from(ZERO_ACCOUNT) {
                return Err(Error::InvalidAddress);
            }
            let previous = self.fee_collector;
            self.fee_collector = new_collector;
            self.env().emit_event(FeeCollectorUpdated {
                previous,
                updated: new_collector,
            });
            Ok(())
        }

        #[ink(message)]
        pub fn set_price_feed(&mut self, new_feed: AccountId) -> Result<(), Error> {
            self.ensure_role(Role::Admin)?;
            self.ensure_real_account(new_feed)?;
            self.price_feed = new_feed;
            self.env().emit_event(PriceFeedUpdated { new_feed });
            Ok(())
        }

        #[ink(message)]
        pub fn set_settlement_token(&mut self, new_token: AccountId) -> Result<(), Error> {
            self.ensure_role(Role::Admin)?;
            self.ensure_real_account(new_token)?;
            self.settlement_token = new_token;
            self.env().emit_event(SettlementTokenUpdated { new_token });
            Ok(())
        }

        #[ink(message)]
        pub fn set_share_ledger(&mut self, new_ledger: AccountId) -> Result<(), Error> {
            self.ensure_role(Role::Admin)?;
            self.ensure_real_account(new_ledger)?;
            self.share_ledger = new_ledger;
            self.env().emit_event(ShareLedgerUpdated { new_ledger });
            Ok(())
        }

        #[ink(message)]
        pub fn set_access_registry(&mut self, new_registry: AccountId) -> Result<(), Error> {
            self.ensure_role(Role::Admin)?;
            self.ensure_real_account(new_registry)?;
            self.access_registry = new_registry;
            self.env().emit_event(AccessRegistryUpdated { new_registry });
            Ok(())
        }

        #[ink(message)]
        pub fn set_paused(&mut self, paused: bool) -> Result<(), Error> {
            self.ensure_role(Role::Admin)?;
            self.paused = paused;
            Ok(())
        }

        // =====================================================================
        // INTERNAL HELPERS
        // =====================================================================

        fn ensure_role(&self, role: Role) -> Result<(), Error> {
            if !self.rail_has_role(role, self.env().caller()) {
                return Err(Error::Unauthorized);
            }
            Ok(())
        }

        fn ensure_real_account(&self, account: AccountId) -> Result<(), Error> {
            if account == AccountId::from(ZERO_ACCOUNT) {
                return Err(Error::InvalidAddress);
            }
            Ok(())
        }

        fn assert_not_paused(&self) -> Result<(), Error> {
            if self.paused {
                return Err(Error::ContractPaused);
            }
            Ok(())
        }

        // =====================================================================
        // RAIL ADAPTERS
        // =====================================================================
        // Every external interaction funnels through one of these. The
        // off-chain test environment cannot dispatch calls into other
        // contracts, so the test build routes them to the in-memory rails at
        // the bottom of this file.

        fn rail_has_role(&self, role: Role, account: AccountId) -> bool {
            #[cfg(test)]
            return rails::has_role(role, account);
            #[cfg(not(test))]
            {
                build_call::<DefaultEnvironment>()
                    .call(self.access_registry)
                    .exec_input(
                        ExecutionInput::new(Selector::new(ink::selector_bytes!("has_role")))
                            .push_arg(role)
                            .push_arg(account),
                    )
                    .returns::<bool>()
                    .try_invoke()
                    .map(|decoded| decoded.unwrap_or(false))
                    .unwrap_or(false)
            }
        }

        fn rail_latest_price(&self) -> Result<(i128, u64), Error> {
            #[cfg(test)]
            return Ok(rails::latest_price());
            #[cfg(not(test))]
            {
                build_call::<DefaultEnvironment>()
                    .call(self.price_feed)
                    .exec_input(ExecutionInput::new(Selector::new(ink::selector_bytes!(
                        "latest_price"
                    ))))
                    .returns::<(i128, u64)>()
                    .try_invoke()
                    .map_err(|_| Error::InvalidOracleData)?
                    .map_err(|_| Error::InvalidOracleData)
            }
        }

        fn rail_pull_payment(&mut self, from: AccountId, value: Balance) -> Result<(), Error> {
            #[cfg(test)]
            {
                rails::maybe_reenter(self);
                return rails::settlement_pull(from, self.env().account_id(), value);
            }
            #[cfg(not(test))]
            {
                let custody = self.env().account_id();
                match build_call::<DefaultEnvironment>()
                    .call(self.settlement_token)
                    .exec_input(
                        ExecutionInput::new(Selector::new(ink::selector_bytes!("transfer_from")))
                            .push_arg(from)
                            .push_arg(custody)
                            .push_arg(value),
                    )
                    .returns::<Result<(), RailError>>()
                    .try_invoke()
                {
                    Ok(Ok(Ok(()))) => Ok(()),
                    _ => Err(Error::PaymentFailed),
                }
            }
        }

        fn rail_push_payment(&mut self, to: AccountId, value: Balance) -> Result<(), Error> {
            #[cfg(test)]
            return rails::settlement_push(self.env().account_id(), to, value);
            #[cfg(not(test))]
            {
                match build_call::<DefaultEnvironment>()
                    .call(self.settlement_token)
                    .exec_input(
                        ExecutionInput::new(Selector::new(ink::selector_bytes!("transfer")))
                            .push_arg(to)
                            .push_arg(value),
                    )
                    .returns::<Result<(), RailError>>()
                    .try_invoke()
                {
                    Ok(Ok(Ok(()))) => Ok(()),
                    _ => Err(Error::PaymentFailed),
                }
            }
        }

        fn rail_mint_shares(
            &mut self,
            to: AccountId,
            token_id: u64,
            amount: Balance,
        ) -> Result<(), Error> {
            #[cfg(test)]
            return rails::mint_shares(to, token_id, amount);
            #[cfg(not(test))]
            {
                match build_call::<DefaultEnvironment>()
                    .call(self.share_ledger)
                    .exec_input(
                        ExecutionInput::new(Selector::new(ink::selector_bytes!("mint")))
                            .push_arg(to)
                            .push_arg(token_id)
                            .push_arg(amount),
                    )
                    .returns::<Result<(), RailError>>()
                    .try_invoke()
                {
                    Ok(Ok(Ok(()))) => Ok(()),
                    _ => Err(Error::TransferFailed),
                }
            }
        }

        fn rail_transfer_shares(
            &mut self,
            from: AccountId,
            to: AccountId,
            token_id: u64,
            amount: Balance,
        ) -> Result<(), Error> {
            #[cfg(test)]
            return rails::transfer_shares(from, to, token_id, amount);
            #[cfg(not(test))]
            {
                match build_call::<DefaultEnvironment>()
                    .call(self.share_ledger)
                    .exec_input(
                        ExecutionInput::new(Selector::new(ink::selector_bytes!("transfer")))
                            .push_arg(from)
                            .push_arg(to)
                            .push_arg(token_id)
                            .push_arg(amount),
                    )
                    .returns::<Result<(), RailError>>()
                    .try_invoke()
                {
                    Ok(Ok(Ok(()))) => Ok(()),
                    _ => Err(Error::TransferFailed),
                }
            }
        }

        fn rail_share_balance(&self, holder: AccountId, token_id: u64) -> Balance {
            #[cfg(test)]
            return rails::share_balance(holder, token_id);
            #[cfg(not(test))]
            {
                build_call::<DefaultEnvironment>()
                    .call(self.share_ledger)
                    .exec_input(
                        ExecutionInput::new(Selector::new(ink::selector_bytes!("balance_of")))
                            .push_arg(holder)
                            .push_arg(token_id),
                    )
                    .returns::<Balance>()
                    .try_invoke()
                    .map(|decoded| decoded.unwrap_or(0))
                    .unwrap_or(0)
            }
        }
    }

    // =========================================================================
    // TEST RAILS — in-memory stand-ins for the four external capabilities
    // =========================================================================

    #[cfg(test)]
    mod rails {
        use super::*;
        use std::cell::RefCell;
        use std::collections::BTreeMap;

        pub struct Rails {
            pub rate: i128,
            pub updated_at: u64,
            pub settlement: BTreeMap<AccountId, Balance>,
            pub shares: BTreeMap<(u64, AccountId), Balance>,
            pub roles: BTreeMap<(Role, AccountId), bool>,
            pub fail_pull: bool,
            pub fail_push_to: Option<AccountId>,
            pub fail_mint: bool,
            pub fail_share_transfer: bool,
            pub reenter: Option<(u64, Balance)>,
            pub reentry_outcome: Option<Result<(), Error>>,
        }

        impl Default for Rails {
            fn default() -> Self {
                Self {
                    // 1.00000000 at 8 fractional digits.
                    rate: 100_000_000,
                    updated_at: 0,
                    settlement: BTreeMap::new(),
                    shares: BTreeMap::new(),
                    roles: BTreeMap::new(),
                    fail_pull: false,
                    fail_push_to: None,
                    fail_mint: false,
                    fail_share_transfer: false,
                    reenter: None,
                    reentry_outcome: None,
                }
            }
        }

        thread_local! {
            static STATE: RefCell<Rails> = RefCell::new(Rails::default());
        }

        pub fn reset() {
            STATE.with(|s| *s.borrow_mut() = Rails::default());
        }

        pub fn with<R>(f: impl FnOnce(&mut Rails) -> R) -> R {
            STATE.with(|s| f(&mut s.borrow_mut()))
        }

        pub fn grant(role: Role, account: AccountId) {
            with(|r| {
                r.roles.insert((role, account), true);
            });
        }

        pub fn has_role(role: Role, account: AccountId) -> bool {
            with(|r| r.roles.get(&(role, account)).copied().unwrap_or(false))
        }

        pub fn set_rate(rate: i128) {
            with(|r| r.rate = rate);
        }

        pub fn latest_price() -> (i128, u64) {
            with(|r| (r.rate, r.updated_at))
        }

        pub fn fund(account: AccountId, value: Balance) {
            with(|r| {
                *r.settlement.entry(account).or_default() += value;
            });
        }

        pub fn settlement_balance(account: AccountId) -> Balance {
            with(|r| r.settlement.get(&account).copied().unwrap_or(0))
        }

        pub fn share_balance(holder: AccountId, token_id: u64) -> Balance {
            with(|r| r.shares.get(&(token_id, holder)).copied().unwrap_or(0))
        }

        /// Sum over all holders of one share class.
        pub fn share_supply(token_id: u64) -> Balance {
            with(|r| {
                r.shares
                    .iter()
                    .filter(|((id, _), _)| *id == token_id)
                    .map(|(_, units)| *units)
                    .sum()
            })
        }

        pub fn settlement_pull(
            from: AccountId,
            to: AccountId,
            value: Balance,
        ) -> Result<(), Error> {
            with(|r| {
                if r.fail_pull {
                    return Err(Error::PaymentFailed);
                }
                let from_balance = r.settlement.get(&from).copied().unwrap_or(0);
                if from_balance < value {
                    return Err(Error::PaymentFailed);
                }
                r.settlement.insert(from, from_balance - value);
                *r.settlement.entry(to).or_default() += value;
                Ok(())
            })
        }

        pub fn settlement_push(from: AccountId, to: AccountId, value: Balance) -> Result<(), Error> {
            with(|r| {
                if r.fail_push_to == Some(to) {
                    return Err(Error::PaymentFailed);
                }
                let from_balance = r.settlement.get(&from).copied().unwrap_or(0);
                if from_balance < value {
                    return Err(Error::PaymentFailed);
                }
                r.settlement.insert(from, from_balance - value);
                *r.settlement.entry(to).or_default() += value;
                Ok(())
            })
        }

        pub fn mint_shares(to: AccountId, token_id: u64, amount: Balance) -> Result<(), Error> {
            with(|r| {
                if r.fail_mint {
                    return Err(Error::TransferFailed);
                }
                *r.shares.entry((token_id, to)).or_default() += amount;
                Ok(())
            })
        }

        pub fn transfer_shares(
            from: AccountId,
            to: AccountId,
            token_id: u64,
            amount: Balance,
        ) -> Result<(), Error> {
            with(|r| {
                if r.fail_share_transfer {
                    return Err(Error::TransferFailed);
                }
                let from_units = r.shares.get(&(token_id, from)).copied().unwrap_or(0);
                if from_units < amount {
                    return Err(Error::TransferFailed);
                }
                r.shares.insert((token_id, from), from_units - amount);
                *r.shares.entry((token_id, to)).or_default() += amount;
                Ok(())
            })
        }

        /// Arm a nested purchase to fire from inside the next settlement
        /// pull, mimicking a malicious payment-rail callback.
        pub fn arm_reentry(property_id: u64, amount: Balance) {
            with(|r| r.reenter = Some((property_id, amount)));
        }

        pub fn take_reentry_outcome() -> Option<Result<(), Error>> {
            with(|r| r.reentry_outcome.take())
        }

        pub fn maybe_reenter(engine: &mut EstateExchange) {
            let armed = with(|r| r.reenter.take());
            if let Some((property_id, amount)) = armed {
                let outcome = engine.purchase_tokens(property_id, amount);
                with(|r| r.reentry_outcome = Some(outcome));
            }
        }
    }

    // =========================================================================
    // UNIT TESTS
    // =========================================================================

}
