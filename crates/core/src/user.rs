//! Customer accounts, saved payment methods and account forms.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::address::Address;
use crate::types::{CustomerStatus, Email, SavedPaymentId, UserId, UserRole};
use crate::validation::{
    FieldErrors, digits_only, is_strong_password, is_valid_card_expiry, is_valid_upi_id,
    normalize_phone,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: Email,
    /// Ten-digit mobile number, empty when unknown.
    pub phone: String,
    pub avatar: Option<String>,
    pub addresses: Vec<Address>,
    pub role: UserRole,
    pub status: CustomerStatus,
    #[serde(default)]
    pub saved_cards: Vec<SavedCard>,
    #[serde(default)]
    pub saved_upi: Vec<SavedUpi>,
    #[serde(default)]
    pub preferences: NotificationPreferences,
    pub created_at: DateTime<Utc>,
    pub last_login_at: Option<DateTime<Utc>>,
}

impl User {
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status == CustomerStatus::Active
    }

    #[must_use]
    pub fn initials(&self) -> String {
        initials(&self.name)
    }

    /// Phone formatted for display: `+91 98765 43210`.
    #[must_use]
    pub fn display_phone(&self) -> String {
        format_phone(&self.phone)
    }
}

/// Up to two upper-case initials.
///
/// ```
/// assert_eq!(ttd_core::user::initials("priya ravi sharma"), "PR");
/// ```
#[must_use]
pub fn initials(name: &str) -> String {
    name.split_whitespace()
        .filter_map(|part| part.chars().next())
        .flat_map(char::to_uppercase)
        .take(2)
        .collect()
}

/// `+91 98765 43210` for a valid mobile number, the input otherwise.
#[must_use]
pub fn format_phone(phone: &str) -> String {
    match normalize_phone(phone) {
        Some(local) => {
            let (a, b) = local.split_at(5);
            format!("+91 {a} {b}")
        }
        None => phone.to_owned(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CardBrand {
    Visa,
    Mastercard,
    Rupay,
}

impl CardBrand {
    /// Visa cards start with 4 and Mastercard with 5; everything else is
    /// treated as RuPay.
    #[must_use]
    pub fn from_number(number: &str) -> Self {
        match number.trim().chars().next() {
            Some('4') => Self::Visa,
            Some('5') => Self::Mastercard,
            _ => Self::Rupay,
        }
    }

    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Visa => "Visa",
            Self::Mastercard => "Mastercard",
            Self::Rupay => "RuPay",
        }
    }
}

/// A card on file. Only the last four digits are kept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedCard {
    pub id: SavedPaymentId,
    pub brand: CardBrand,
    pub last_four: String,
    pub expiry_month: String,
    pub expiry_year: String,
    pub holder_name: String,
    pub is_default: bool,
}

impl SavedCard {
    #[must_use]
    pub fn masked_number(&self) -> String {
        format!("•••• •••• •••• {}", self.last_four)
    }

    #[must_use]
    pub fn expiry(&self) -> String {
        format!("{}/{}", self.expiry_month, self.expiry_year)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedUpi {
    pub id: SavedPaymentId,
    pub upi_id: String,
    pub is_default: bool,
}

/// Raw "add card" form.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CardInput {
    #[serde(default)]
    pub number: String,
    #[serde(default)]
    pub expiry: String,
    #[serde(default)]
    pub cvv: String,
    #[serde(default)]
    pub holder_name: String,
}

impl CardInput {
    /// Validate the form. The CVV is checked and then discarded.
    ///
    /// # Errors
    ///
    /// Returns every field problem found.
    pub fn validate(&self, id: SavedPaymentId) -> Result<SavedCard, FieldErrors> {
        let mut errors = FieldErrors::new();
        let digits = digits_only(&self.number);

        if self.number.trim().is_empty() {
            errors.add("number", "Card number is required");
        } else if !(12..=19).contains(&digits.len()) {
            errors.add("number", "Enter a valid card number");
        }
        if self.expiry.trim().is_empty() {
            errors.add("expiry", "Expiry is required");
        } else if !is_valid_card_expiry(&self.expiry) {
            errors.add("expiry", "Use MM/YY");
        }
        let cvv = digits_only(&self.cvv);
        if self.cvv.trim().is_empty() {
            errors.add("cvv", "CVV is required");
        } else if !(3..=4).contains(&cvv.len()) || cvv.len() != self.cvv.trim().len() {
            errors.add("cvv", "Enter a valid CVV");
        }
        errors.check(
            !self.holder_name.trim().is_empty(),
            "holder_name",
            "Card holder name is required",
        );
        if !errors.is_empty() {
            return Err(errors);
        }

        let (month, year) = self.expiry.trim().split_once('/').unwrap_or_default();
        let last_four: String = digits.chars().skip(digits.len().saturating_sub(4)).collect();
        Ok(SavedCard {
            id,
            brand: CardBrand::from_number(&digits),
            last_four,
            expiry_month: month.to_owned(),
            expiry_year: year.to_owned(),
            holder_name: self.holder_name.trim().to_uppercase(),
            is_default: false,
        })
    }
}

/// Add a saved card; the first one becomes the default.
pub fn add_card(cards: &mut Vec<SavedCard>, mut card: SavedCard) {
    card.is_default = cards.is_empty();
    cards.push(card);
}

/// Add a UPI id; the first one becomes the default.
///
/// # Errors
///
/// Returns a field error when the id is not of the form `name@bank`.
pub fn add_upi(upis: &mut Vec<SavedUpi>, id: SavedPaymentId, upi_id: &str) -> Result<(), FieldErrors> {
    if !is_valid_upi_id(upi_id) {
        let mut errors = FieldErrors::new();
        errors.add("upi_id", "Please enter a valid UPI ID");
        return Err(errors);
    }
    upis.push(SavedUpi {
        id,
        upi_id: upi_id.trim().to_owned(),
        is_default: upis.is_empty(),
    });
    Ok(())
}

/// Anything with a default flag keyed by a saved-payment id.
pub trait SavedPayment {
    fn id(&self) -> SavedPaymentId;
    fn set_default(&mut self, is_default: bool);
}

impl SavedPayment for SavedCard {
    fn id(&self) -> SavedPaymentId {
        self.id
    }

    fn set_default(&mut self, is_default: bool) {
        self.is_default = is_default;
    }
}

impl SavedPayment for SavedUpi {
    fn id(&self) -> SavedPaymentId {
        self.id
    }

    fn set_default(&mut self, is_default: bool) {
        self.is_default = is_default;
    }
}

/// Make `id` the only default entry. Returns false if it is not present.
pub fn set_default_payment<T: SavedPayment>(items: &mut [T], id: SavedPaymentId) -> bool {
    if !items.iter().any(|i| i.id() == id) {
        return false;
    }
    for item in items.iter_mut() {
        let is_target = item.id() == id;
        item.set_default(is_target);
    }
    true
}

/// Remove an entry. Returns false if it is not present.
pub fn remove_payment<T: SavedPayment>(items: &mut Vec<T>, id: SavedPaymentId) -> bool {
    let before = items.len();
    items.retain(|i| i.id() != id);
    before != items.len()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[allow(clippy::struct_excessive_bools)]
pub struct NotificationPreferences {
    pub email_notifications: bool,
    pub sms_notifications: bool,
    pub push_notifications: bool,
    pub order_updates: bool,
    pub promotions: bool,
    pub newsletter: bool,
}

impl Default for NotificationPreferences {
    fn default() -> Self {
        Self {
            email_notifications: true,
            sms_notifications: true,
            push_notifications: false,
            order_updates: true,
            promotions: true,
            newsletter: false,
        }
    }
}

/// Profile form on the account settings page.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileInput {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
}

/// A validated profile update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileUpdate {
    pub name: String,
    pub email: Email,
    pub phone: String,
}

impl ProfileInput {
    /// # Errors
    ///
    /// Returns every field problem found.
    pub fn validate(&self) -> Result<ProfileUpdate, FieldErrors> {
        let mut errors = FieldErrors::new();
        errors.check(!self.name.trim().is_empty(), "name", "Name is required");
        let email = Email::parse(&self.email);
        match &email {
            Err(crate::EmailError::Empty) => errors.add("email", "Email is required"),
            Err(_) => errors.add("email", "Invalid email"),
            Ok(_) => {}
        }
        let phone = normalize_phone(&self.phone);
        if self.phone.trim().is_empty() {
            errors.add("phone", "Phone is required");
        } else if phone.is_none() {
            errors.add("phone", "Invalid phone");
        }
        match (email, phone) {
            (Ok(email), Some(phone)) if errors.is_empty() => Ok(ProfileUpdate {
                name: self.name.trim().to_owned(),
                email,
                phone,
            }),
            _ => Err(errors),
        }
    }
}

/// Password change form. Passwords are not stored; the form is validated
/// and acknowledged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PasswordChangeInput {
    #[serde(default)]
    pub current_password: String,
    #[serde(default)]
    pub new_password: String,
    #[serde(default)]
    pub confirm_password: String,
}

impl PasswordChangeInput {
    /// # Errors
    ///
    /// Returns every field problem found.
    pub fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        errors.check(
            !self.current_password.is_empty(),
            "current_password",
            "Current password is required",
        );
        if self.new_password.is_empty() {
            errors.add("new_password", "New password is required");
        } else if self.new_password.chars().count() < 8 {
            errors.add("new_password", "Password must be at least 8 characters");
        }
        errors.check(
            self.new_password == self.confirm_password,
            "confirm_password",
            "Passwords do not match",
        );
        errors.into_result()
    }
}

/// Sign-up form.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegistrationInput {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub confirm_password: String,
    /// Checkbox; present when ticked.
    #[serde(default)]
    pub terms: Option<String>,
}

/// A validated registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    pub name: String,
    pub email: Email,
    pub phone: String,
}

impl RegistrationInput {
    /// # Errors
    ///
    /// Returns every field problem found.
    pub fn validate(&self) -> Result<Registration, FieldErrors> {
        let mut errors = FieldErrors::new();
        let name = self.name.trim();
        if name.is_empty() {
            errors.add("name", "Name is required");
        } else if name.chars().count() < 2 {
            errors.add("name", "Name must be at least 2 characters");
        }

        let email = Email::parse(&self.email);
        match &email {
            Err(crate::EmailError::Empty) => errors.add("email", "Email is required"),
            Err(_) => errors.add("email", "Please enter a valid email"),
            Ok(_) => {}
        }

        let phone = normalize_phone(&self.phone);
        if self.phone.trim().is_empty() {
            errors.add("phone", "Phone number is required");
        } else if phone.is_none() {
            errors.add("phone", "Please enter a valid 10-digit phone number");
        }

        if self.password.is_empty() {
            errors.add("password", "Password is required");
        } else if !is_strong_password(&self.password) {
            errors.add("password", "Password does not meet all requirements");
        }

        if self.confirm_password.is_empty() {
            errors.add("confirm_password", "Please confirm your password");
        } else if self.password != self.confirm_password {
            errors.add("confirm_password", "Passwords do not match");
        }

        errors.check(
            self.terms.as_deref().is_some_and(|t| !t.is_empty()),
            "terms",
            "You must accept the terms and conditions",
        );

        match (email, phone) {
            (Ok(email), Some(phone)) if errors.is_empty() => Ok(Registration {
                name: name.to_owned(),
                email,
                phone,
            }),
            _ => Err(errors),
        }
    }
}

/// Name used for accounts created by the sign-in stub.
#[must_use]
pub fn placeholder_name(email: Option<&Email>) -> String {
    email
        .map(Email::local_part)
        .filter(|local| !local.is_empty())
        .map_or_else(|| "Demo User".to_owned(), |local| {
            let mut chars = local.chars();
            chars.next().map_or_else(String::new, |first| {
                first.to_uppercase().chain(chars).collect()
            })
        })
}
