//! Delivery addresses and the per-customer address book.

use serde::{Deserialize, Serialize};

use crate::types::{AddressId, AddressType};
use crate::validation::{FieldErrors, is_valid_phone, is_valid_pincode, normalize_phone};

/// States and union territories accepted in address forms.
pub const INDIAN_STATES: &[&str] = &[
    "Andaman and Nicobar Islands",
    "Andhra Pradesh",
    "Arunachal Pradesh",
    "Assam",
    "Bihar",
    "Chandigarh",
    "Chhattisgarh",
    "Dadra and Nagar Haveli and Daman and Diu",
    "Delhi",
    "Goa",
    "Gujarat",
    "Haryana",
    "Himachal Pradesh",
    "Jammu and Kashmir",
    "Jharkhand",
    "Karnataka",
    "Kerala",
    "Ladakh",
    "Lakshadweep",
    "Madhya Pradesh",
    "Maharashtra",
    "Manipur",
    "Meghalaya",
    "Mizoram",
    "Nagaland",
    "Odisha",
    "Puducherry",
    "Punjab",
    "Rajasthan",
    "Sikkim",
    "Tamil Nadu",
    "Telangana",
    "Tripura",
    "Uttar Pradesh",
    "Uttarakhand",
    "West Bengal",
];

/// Canonical spelling of a state name, if it is one we ship to.
#[must_use]
pub fn canonical_state(state: &str) -> Option<&'static str> {
    let state = state.trim();
    INDIAN_STATES
        .iter()
        .find(|s| s.eq_ignore_ascii_case(state))
        .copied()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub id: AddressId,
    /// Short label such as "Home" or "Mom's place".
    pub name: String,
    pub full_name: String,
    pub phone: String,
    pub address_line1: String,
    pub address_line2: Option<String>,
    pub landmark: Option<String>,
    pub city: String,
    pub state: String,
    pub pincode: String,
    pub is_default: bool,
    pub kind: AddressType,
}

impl Address {
    /// Street lines joined for compact display.
    #[must_use]
    pub fn street(&self) -> String {
        let mut parts = vec![self.address_line1.as_str()];
        parts.extend(self.address_line2.as_deref());
        parts.extend(self.landmark.as_deref());
        parts.join(", ")
    }

    /// `City, State - PIN`
    #[must_use]
    pub fn locality(&self) -> String {
        format!("{}, {} - {}", self.city, self.state, self.pincode)
    }
}

/// Raw address form fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressInput {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub address_line1: String,
    #[serde(default)]
    pub address_line2: String,
    #[serde(default)]
    pub landmark: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub pincode: String,
    #[serde(default)]
    pub kind: Option<String>,
    /// Checkbox value; any non-empty value means checked.
    #[serde(default)]
    pub is_default: Option<String>,
}

impl AddressInput {
    /// Validate and build an address.
    ///
    /// # Errors
    ///
    /// Returns every field problem found.
    pub fn validate(&self, id: AddressId) -> Result<Address, FieldErrors> {
        let mut errors = FieldErrors::new();

        errors.check(!self.full_name.trim().is_empty(), "full_name", "Name is required");
        if self.phone.trim().is_empty() {
            errors.add("phone", "Phone is required");
        } else if !is_valid_phone(&self.phone) {
            errors.add("phone", "Invalid phone number");
        }
        errors.check(
            !self.address_line1.trim().is_empty(),
            "address_line1",
            "Address is required",
        );
        errors.check(!self.city.trim().is_empty(), "city", "City is required");
        let state = canonical_state(&self.state);
        if self.state.trim().is_empty() {
            errors.add("state", "State is required");
        } else if state.is_none() {
            errors.add("state", "Select a valid state");
        }
        if self.pincode.trim().is_empty() {
            errors.add("pincode", "PIN code is required");
        } else if !is_valid_pincode(&self.pincode) {
            errors.add("pincode", "Invalid PIN code");
        }

        if !errors.is_empty() {
            return Err(errors);
        }

        let kind = self
            .kind
            .as_deref()
            .and_then(|k| k.parse::<AddressType>().ok())
            .unwrap_or_default();
        let optional = |s: &str| Some(s.trim().to_owned()).filter(|s| !s.is_empty());

        Ok(Address {
            id,
            name: optional(&self.name).unwrap_or_else(|| kind.label().to_owned()),
            full_name: self.full_name.trim().to_owned(),
            phone: normalize_phone(&self.phone).unwrap_or_else(|| self.phone.trim().to_owned()),
            address_line1: self.address_line1.trim().to_owned(),
            address_line2: optional(&self.address_line2),
            landmark: optional(&self.landmark),
            city: self.city.trim().to_owned(),
            state: state.unwrap_or_default().to_owned(),
            pincode: self.pincode.trim().to_owned(),
            is_default: self.is_default.as_deref().is_some_and(|v| !v.is_empty()),
            kind,
        })
    }
}

impl From<&Address> for AddressInput {
    fn from(a: &Address) -> Self {
        Self {
            name: a.name.clone(),
            full_name: a.full_name.clone(),
            phone: a.phone.clone(),
            address_line1: a.address_line1.clone(),
            address_line2: a.address_line2.clone().unwrap_or_default(),
            landmark: a.landmark.clone().unwrap_or_default(),
            city: a.city.clone(),
            state: a.state.clone(),
            pincode: a.pincode.clone(),
            kind: Some(a.kind.as_str().to_owned()),
            is_default: a.is_default.then(|| "on".to_owned()),
        }
    }
}

/// The default address, falling back to the first one.
#[must_use]
pub fn default_address(book: &[Address]) -> Option<&Address> {
    book.iter().find(|a| a.is_default).or_else(|| book.first())
}

/// Add an address. The first address and any address marked default become
/// the only default.
pub fn add_address(book: &mut Vec<Address>, mut address: Address) {
    if book.is_empty() {
        address.is_default = true;
    }
    if address.is_default {
        book.iter_mut().for_each(|a| a.is_default = false);
    }
    book.push(address);
}

/// Replace the address with the same id. Returns false if it was not found.
pub fn update_address(book: &mut [Address], address: Address) -> bool {
    let id = address.id;
    let make_default = address.is_default;
    let Some(slot) = book.iter_mut().find(|a| a.id == id) else {
        return false;
    };
    *slot = address;
    if make_default {
        book.iter_mut()
            .filter(|a| a.id != id)
            .for_each(|a| a.is_default = false);
    }
    ensure_default(book);
    true
}

/// Remove an address, promoting the first remaining one if the default was
/// removed.
pub fn remove_address(book: &mut Vec<Address>, id: AddressId) -> bool {
    let before = book.len();
    book.retain(|a| a.id != id);
    ensure_default(book);
    before != book.len()
}

/// Make `id` the only default address.
pub fn set_default_address(book: &mut [Address], id: AddressId) -> bool {
    if !book.iter().any(|a| a.id == id) {
        return false;
    }
    book.iter_mut().for_each(|a| a.is_default = a.id == id);
    true
}

fn ensure_default(book: &mut [Address]) {
    if book.iter().any(|a| a.is_default) {
        return;
    }
    if let Some(first) = book.first_mut() {
        first.is_default = true;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn input() -> AddressInput {
        AddressInput {
            name: String::new(),
            full_name: "Priya Sharma".to_owned(),
            phone: "98765 43210".to_owned(),
            address_line1: "12 MG Road".to_owned(),
            address_line2: String::new(),
            landmark: "Near Metro".to_owned(),
            city: "Pune".to_owned(),
            state: "maharashtra".to_owned(),
            pincode: "411001".to_owned(),
            kind: Some("work".to_owned()),
            is_default: None,
        }
    }

    fn address(id: i32, is_default: bool) -> Address {
        let mut a = input().validate(AddressId::new(id)).unwrap();
        a.is_default = is_default;
        a
    }

    #[test]
    fn test_validate_normalizes_fields() {
        let a = input().validate(AddressId::new(1)).unwrap();
        assert_eq!(a.state, "Maharashtra");
        assert_eq!(a.phone, "9876543210");
        assert_eq!(a.kind, AddressType::Work);
        assert_eq!(a.name, "Work");
        assert_eq!(a.address_line2, None);
        assert_eq!(a.street(), "12 MG Road, Near Metro");
        assert_eq!(a.locality(), "Pune, Maharashtra - 411001");
    }

    #[test]
    fn test_validate_reports_each_field() {
        let errors = AddressInput::default()
            .validate(AddressId::new(1))
            .unwrap_err();
        assert_eq!(errors.get("full_name"), Some("Name is required"));
        assert_eq!(errors.get("phone"), Some("Phone is required"));
        assert_eq!(errors.get("address_line1"), Some("Address is required"));
        assert_eq!(errors.get("city"), Some("City is required"));
        assert_eq!(errors.get("state"), Some("State is required"));
        assert_eq!(errors.get("pincode"), Some("PIN code is required"));
    }

    #[test]
    fn test_validate_rejects_bad_formats() {
        let mut bad = input();
        bad.phone = "12345".to_owned();
        bad.pincode = "011001".to_owned();
        bad.state = "Atlantis".to_owned();
        let errors = bad.validate(AddressId::new(1)).unwrap_err();
        assert_eq!(errors.get("phone"), Some("Invalid phone number"));
        assert_eq!(errors.get("pincode"), Some("Invalid PIN code"));
        assert_eq!(errors.get("state"), Some("Select a valid state"));
    }

    #[test]
    fn test_first_address_becomes_default() {
        let mut book = Vec::new();
        add_address(&mut book, address(1, false));
        assert!(book.first().unwrap().is_default);
    }

    #[test]
    fn test_adding_default_clears_others() {
        let mut book = Vec::new();
        add_address(&mut book, address(1, false));
        add_address(&mut book, address(2, true));
        let defaults: Vec<i32> = book
            .iter()
            .filter(|a| a.is_default)
            .map(|a| a.id.as_i32())
            .collect();
        assert_eq!(defaults, vec![2]);
    }

    #[test]
    fn test_update_and_set_default() {
        let mut book = Vec::new();
        add_address(&mut book, address(1, false));
        add_address(&mut book, address(2, false));

        let mut second = address(2, true);
        second.city = "Mumbai".to_owned();
        assert!(update_address(&mut book, second));
        assert_eq!(default_address(&book).unwrap().id, AddressId::new(2));
        assert_eq!(default_address(&book).unwrap().city, "Mumbai");

        assert!(set_default_address(&mut book, AddressId::new(1)));
        assert_eq!(default_address(&book).unwrap().id, AddressId::new(1));
        assert!(!set_default_address(&mut book, AddressId::new(9)));
        assert!(!update_address(&mut book, address(9, false)));
    }

    #[test]
    fn test_removing_default_promotes_first() {
        let mut book = Vec::new();
        add_address(&mut book, address(1, false));
        add_address(&mut book, address(2, false));
        add_address(&mut book, address(3, true));

        assert!(remove_address(&mut book, AddressId::new(3)));
        assert!(book.first().unwrap().is_default);
        assert!(!remove_address(&mut book, AddressId::new(3)));
    }

    #[test]
    fn test_canonical_state() {
        assert_eq!(canonical_state(" tamil nadu "), Some("Tamil Nadu"));
        assert_eq!(canonical_state("Narnia"), None);
    }
}
