#![cfg_attr(not(feature = "std"), no_std, no_main)]

/// Role registry — named role memberships for the exchange.
///
/// The deployer bootstraps as the first Admin. Admins grant and revoke;
/// anyone may query. Membership checks are the whole surface: callers gate
/// their own operations on `has_role`.
#[ink::contract]
mod role_registry {
    use ink::storage::Mapping;

    /// Named roles. Variant order is the wire encoding; consumers declare
    /// the same enum with the same order.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, scale::Encode, scale::Decode)]
    #[cfg_attr(feature = "std", derive(scale_info::TypeInfo))]
    pub enum Role {
        Admin,
        Verifier,
    }

    #[ink(storage)]
    pub struct RoleRegistry {
        members: Mapping<(Role, AccountId), bool>,
    }

    #[ink(event)]
    pub struct RoleGranted {
        #[ink(topic)]
        account: AccountId,
        role: Role,
        granted_by: AccountId,
    }

    #[ink(event)]
    pub struct RoleRevoked {
        #[ink(topic)]
        account: AccountId,
        role: Role,
        revoked_by: AccountId,
    }

    #[derive(Debug, PartialEq, Eq, scale::Encode, scale::Decode)]
    #[cfg_attr(feature = "std", derive(scale_info::TypeInfo))]
    pub enum Error {
        /// Caller does not hold the Admin role.
        Unauthorized,
    }

    impl RoleRegistry {
        /// The deployer becomes the first Admin.
        #[ink(constructor)]
        pub fn new() -> Self {
            let deployer = Self::env().caller();
            let mut members = Mapping::default();
            members.insert((Role::Admin, deployer), &true);

            Self::env().emit_event(RoleGranted {
                account: deployer,
                role: Role::Admin,
                granted_by: deployer,
            });

            Self { members }
        }

        /// Grant `role` to `account`. Admin-only.
        #[ink(message)]
        pub fn grant_role(&mut self, role: Role, account: AccountId) -> Result<(), Error> {
            self.ensure_admin()?;
            self.members.insert((role, account), &true);
            self.env().emit_event(RoleGranted {
                account,
                role,
                granted_by: self.env().caller(),
            });
            Ok(())
        }

        /// Revoke `role` from `account`. Admin-only.
        #[ink(message)]
        pub fn revoke_role(&mut self, role: Role, account: AccountId) -> Result<(), Error> {
            self.ensure_admin()?;
            self.members.remove((role, account));
            self.env().emit_event(RoleRevoked {
                account,
                role,
                revoked_by: self.env().caller(),
            });
            Ok(())
        }

        #[ink(message)]
        pub fn has_role(&self, role: Role, account: AccountId) -> bool {
            self.members.get((role, account)).unwrap_or(false)
        }

        fn ensure_admin(&self) -> Result<(), Error> {
            if !self.has_role(Role::Admin, self.env().caller()) {
                return Err(Error::Unauthorized);
            }
            Ok(())
        }
    }

}
