//! Customer accounts, address books and saved payment methods.

use chrono::{DateTime, Utc};
use tracing::instrument;
use ttd_core::address::{self, Address, AddressInput};
use ttd_core::user::{
    self, CardInput, NotificationPreferences, ProfileUpdate, Registration, SavedCard, SavedUpi,
    User, placeholder_name,
};
use ttd_core::{AddressId, CustomerStatus, Email, SavedPaymentId, UserId, UserRole};

use crate::data::StoreData;
use crate::{Store, StoreError};

/// Repository for user accounts.
pub struct CustomerRepository<'a> {
    store: &'a Store,
}

impl<'a> CustomerRepository<'a> {
    /// Create a new customer repository.
    #[must_use]
    pub const fn new(store: &'a Store) -> Self {
        Self { store }
    }

    /// Every account, admins included.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    pub async fn list(&self) -> Result<Vec<User>, StoreError> {
        self.store.read(|d| d.users.clone()).await
    }

    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    pub async fn get(&self, id: UserId) -> Result<Option<User>, StoreError> {
        self.store.read(|d| d.user(id).cloned()).await
    }

    /// Case-insensitive lookup by email.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    pub async fn get_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        self.store
            .read(|d| d.users.iter().find(|u| u.email.matches(email)).cloned())
            .await
    }

    /// Sign in by email, creating the account on first use.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be written.
    #[instrument(skip(self, email, now))]
    pub async fn sign_in_with_email(&self, email: &Email, now: DateTime<Utc>) -> Result<User, StoreError> {
        self.store
            .write(|d| {
                let id = match d.users.iter().find(|u| u.email.matches(email.as_str())) {
                    Some(user) => user.id,
                    None => {
                        let name = placeholder_name(Some(email));
                        insert_user(d, name, email.clone(), String::new(), now)
                    }
                };
                touch_login(d, id, now)
            })
            .await
    }

    /// Sign in by mobile number, creating the account on first use.
    ///
    /// Accounts created this way get a placeholder address under the
    /// `mobile.ttdsoftware.in` domain until the customer sets a real one.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be written.
    #[instrument(skip(self, phone, now))]
    pub async fn sign_in_with_phone(&self, phone: &str, now: DateTime<Utc>) -> Result<User, StoreError> {
        self.store
            .write(|d| {
                let id = match d.users.iter().find(|u| u.phone == phone) {
                    Some(user) => user.id,
                    None => {
                        let email = Email::parse(&format!("{phone}@mobile.ttdsoftware.in"))
                            .map_err(|e| StoreError::Conflict(e.to_string()))?;
                        let name = placeholder_name(None);
                        insert_user(d, name, email, phone.to_owned(), now)
                    }
                };
                touch_login(d, id, now)
            })
            .await
    }

    /// Create an account from the sign-up form.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Conflict` if the email is already registered.
    #[instrument(skip(self, registration, now))]
    pub async fn register(&self, registration: Registration, now: DateTime<Utc>) -> Result<User, StoreError> {
        self.store
            .write(|d| {
                if d.users.iter().any(|u| u.email.matches(registration.email.as_str())) {
                    return Err(StoreError::Conflict(
                        "An account with this email already exists".to_owned(),
                    ));
                }
                let id = insert_user(
                    d,
                    registration.name,
                    registration.email,
                    registration.phone,
                    now,
                );
                tracing::info!(user_id = %id, "Customer registered");
                touch_login(d, id, now)
            })
            .await
    }

    /// # Errors
    ///
    /// Returns `StoreError::NotFound` for an unknown user and
    /// `StoreError::Conflict` if the email belongs to another account.
    #[instrument(skip(self, update))]
    pub async fn update_profile(&self, id: UserId, update: ProfileUpdate) -> Result<User, StoreError> {
        self.store
            .write(|d| {
                if d.users.iter().any(|u| u.email.matches(update.email.as_str()) && u.id != id) {
                    return Err(StoreError::Conflict(
                        "This email is already in use".to_owned(),
                    ));
                }
                let user = d.user_mut(id).ok_or(StoreError::NotFound)?;
                user.name = update.name;
                user.email = update.email;
                user.phone = update.phone;
                Ok(user.clone())
            })
            .await
    }

    /// # Errors
    ///
    /// Returns `StoreError::NotFound` for an unknown user.
    pub async fn update_preferences(
        &self,
        id: UserId,
        preferences: NotificationPreferences,
    ) -> Result<(), StoreError> {
        self.with_user(id, |user| {
            user.preferences = preferences;
            Ok(())
        })
        .await
    }

    /// Validate and add an address.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Invalid` with field errors, or
    /// `StoreError::NotFound` for an unknown user.
    #[instrument(skip(self, input))]
    pub async fn add_address(&self, id: UserId, input: &AddressInput) -> Result<Address, StoreError> {
        self.store
            .write(|d| {
                if d.user(id).is_none() {
                    return Err(StoreError::NotFound);
                }
                let address = input.validate(d.next_address_id())?;
                let user = d.user_mut(id).ok_or(StoreError::NotFound)?;
                address::add_address(&mut user.addresses, address.clone());
                Ok(user
                    .addresses
                    .iter()
                    .find(|a| a.id == address.id)
                    .cloned()
                    .unwrap_or(address))
            })
            .await
    }

    /// # Errors
    ///
    /// Returns `StoreError::Invalid` with field errors, or
    /// `StoreError::NotFound` for an unknown user or address.
    #[instrument(skip(self, input))]
    pub async fn update_address(
        &self,
        id: UserId,
        address_id: AddressId,
        input: &AddressInput,
    ) -> Result<Address, StoreError> {
        let address = input.validate(address_id)?;
        self.with_user(id, |user| {
            if !address::update_address(&mut user.addresses, address.clone()) {
                return Err(StoreError::NotFound);
            }
            Ok(address)
        })
        .await
    }

    /// # Errors
    ///
    /// Returns `StoreError::NotFound` for an unknown user or address.
    #[instrument(skip(self))]
    pub async fn remove_address(&self, id: UserId, address_id: AddressId) -> Result<(), StoreError> {
        self.with_user(id, |user| {
            found(address::remove_address(&mut user.addresses, address_id))
        })
        .await
    }

    /// # Errors
    ///
    /// Returns `StoreError::NotFound` for an unknown user or address.
    #[instrument(skip(self))]
    pub async fn set_default_address(&self, id: UserId, address_id: AddressId) -> Result<(), StoreError> {
        self.with_user(id, |user| {
            found(address::set_default_address(&mut user.addresses, address_id))
        })
        .await
    }

    /// Validate and save a card. Only the last four digits are stored.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Invalid` with field errors, or
    /// `StoreError::NotFound` for an unknown user.
    #[instrument(skip(self, input))]
    pub async fn add_card(&self, id: UserId, input: &CardInput) -> Result<SavedCard, StoreError> {
        self.store
            .write(|d| {
                if d.user(id).is_none() {
                    return Err(StoreError::NotFound);
                }
                let card = input.validate(d.next_payment_id())?;
                let user = d.user_mut(id).ok_or(StoreError::NotFound)?;
                user::add_card(&mut user.saved_cards, card);
                user.saved_cards.last().cloned().ok_or(StoreError::NotFound)
            })
            .await
    }

    /// # Errors
    ///
    /// Returns `StoreError::Invalid` when the UPI id is malformed, or
    /// `StoreError::NotFound` for an unknown user.
    #[instrument(skip(self))]
    pub async fn add_upi(&self, id: UserId, upi_id: &str) -> Result<SavedUpi, StoreError> {
        self.store
            .write(|d| {
                if d.user(id).is_none() {
                    return Err(StoreError::NotFound);
                }
                let payment_id = d.next_payment_id();
                let user = d.user_mut(id).ok_or(StoreError::NotFound)?;
                user::add_upi(&mut user.saved_upi, payment_id, upi_id)?;
                user.saved_upi.last().cloned().ok_or(StoreError::NotFound)
            })
            .await
    }

    /// Remove a saved card or UPI id.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` when nothing matched.
    #[instrument(skip(self))]
    pub async fn remove_payment(&self, id: UserId, payment_id: SavedPaymentId) -> Result<(), StoreError> {
        self.with_user(id, |user| {
            let removed = user::remove_payment(&mut user.saved_cards, payment_id)
                || user::remove_payment(&mut user.saved_upi, payment_id);
            found(removed)
        })
        .await
    }

    /// Make a saved card or UPI id the default of its kind.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` when nothing matched.
    #[instrument(skip(self))]
    pub async fn set_default_payment(&self, id: UserId, payment_id: SavedPaymentId) -> Result<(), StoreError> {
        self.with_user(id, |user| {
            let updated = user::set_default_payment(&mut user.saved_cards, payment_id)
                || user::set_default_payment(&mut user.saved_upi, payment_id);
            found(updated)
        })
        .await
    }

    /// # Errors
    ///
    /// Returns `StoreError::NotFound` for an unknown user.
    #[instrument(skip(self))]
    pub async fn set_status(&self, id: UserId, status: CustomerStatus) -> Result<User, StoreError> {
        self.with_user(id, |user| {
            user.status = status;
            Ok(user.clone())
        })
        .await
    }

    /// # Errors
    ///
    /// Returns `StoreError::NotFound` for an unknown user.
    #[instrument(skip(self))]
    pub async fn set_role(&self, id: UserId, role: UserRole) -> Result<User, StoreError> {
        self.with_user(id, |user| {
            user.role = role;
            Ok(user.clone())
        })
        .await
    }

    async fn with_user<R>(
        &self,
        id: UserId,
        f: impl FnOnce(&mut User) -> Result<R, StoreError>,
    ) -> Result<R, StoreError> {
        self.store
            .write(|d| {
                let user = d.user_mut(id).ok_or(StoreError::NotFound)?;
                f(user)
            })
            .await
    }
}

fn insert_user(d: &mut StoreData, name: String, email: Email, phone: String, now: DateTime<Utc>) -> UserId {
    let id = d.next_user_id();
    d.users.push(User {
        id,
        name,
        email,
        phone,
        avatar: None,
        addresses: Vec::new(),
        role: UserRole::User,
        status: CustomerStatus::Active,
        saved_cards: Vec::new(),
        saved_upi: Vec::new(),
        preferences: NotificationPreferences::default(),
        created_at: now,
        last_login_at: None,
    });
    id
}

fn touch_login(d: &mut StoreData, id: UserId, now: DateTime<Utc>) -> Result<User, StoreError> {
    let user = d.user_mut(id).ok_or(StoreError::NotFound)?;
    // Disabled accounts come back untouched; callers refuse the sign-in.
    if user.is_active() {
        user.last_login_at = Some(now);
    }
    Ok(user.clone())
}

fn found(ok: bool) -> Result<(), StoreError> {
    if ok { Ok(()) } else { Err(StoreError::NotFound) }
}
