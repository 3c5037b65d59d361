//! Shop settings form: pricing policy and the low-stock threshold.

use rust_decimal::Decimal;
use serde::Deserialize;
use ttd_core::Price;
use ttd_core::address::INDIAN_STATES;
use ttd_core::pricing::PricingPolicy;
use ttd_core::validation::FieldErrors;
use ttd_store::StoreSettings;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SettingsForm {
    pub gst_rate: String,
    pub free_delivery_threshold: String,
    pub delivery_fee: String,
    pub home_state: String,
    pub low_stock_threshold: String,
}

impl From<&StoreSettings> for SettingsForm {
    fn from(settings: &StoreSettings) -> Self {
        Self {
            gst_rate: settings.pricing.gst_rate.normalize().to_string(),
            free_delivery_threshold: settings.pricing.free_delivery_threshold.amount().to_string(),
            delivery_fee: settings.pricing.delivery_fee.amount().to_string(),
            home_state: settings.pricing.home_state.clone(),
            low_stock_threshold: settings.low_stock_threshold.to_string(),
        }
    }
}

impl SettingsForm {
    /// # Errors
    ///
    /// Returns the failing fields.
    pub fn validate(&self) -> Result<StoreSettings, FieldErrors> {
        let mut errors = FieldErrors::new();

        let gst_rate = self
            .gst_rate
            .trim()
            .trim_end_matches('%')
            .parse::<Decimal>()
            .ok()
            .filter(|r| *r >= Decimal::ZERO && *r <= Decimal::ONE_HUNDRED);
        errors.check(gst_rate.is_some(), "gst_rate", "GST rate must be between 0 and 100");

        let free_delivery_threshold = Price::parse(&self.free_delivery_threshold)
            .map_err(|e| errors.add("free_delivery_threshold", e.to_string()))
            .ok();
        let delivery_fee = Price::parse(&self.delivery_fee)
            .map_err(|e| errors.add("delivery_fee", e.to_string()))
            .ok();

        let home_state = INDIAN_STATES
            .iter()
            .find(|s| s.eq_ignore_ascii_case(self.home_state.trim()));
        errors.check(home_state.is_some(), "home_state", "Choose a state");

        let low_stock_threshold = self.low_stock_threshold.trim().parse::<u32>().ok();
        errors.check(
            low_stock_threshold.is_some(),
            "low_stock_threshold",
            "Enter a whole number of units",
        );

        errors.into_result()?;
        let (
            Some(gst_rate),
            Some(free_delivery_threshold),
            Some(delivery_fee),
            Some(home_state),
            Some(low_stock_threshold),
        ) = (
            gst_rate,
            free_delivery_threshold,
            delivery_fee,
            home_state,
            low_stock_threshold,
        )
        else {
            return Err(FieldErrors::new());
        };

        Ok(StoreSettings {
            pricing: PricingPolicy {
                gst_rate,
                free_delivery_threshold,
                delivery_fee,
                home_state: (*home_state).to_owned(),
            },
            low_stock_threshold,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_round_trip() {
        let settings = StoreSettings::default();
        let parsed = SettingsForm::from(&settings).validate().unwrap();
        assert_eq!(parsed, settings);
    }

    #[test]
    fn test_state_is_matched_case_insensitively() {
        let form = SettingsForm {
            home_state: "karnataka".to_owned(),
            ..SettingsForm::from(&StoreSettings::default())
        };
        assert_eq!(form.validate().unwrap().pricing.home_state, "Karnataka");
    }

    #[test]
    fn test_rejects_bad_values() {
        let form = SettingsForm {
            gst_rate: "120".to_owned(),
            delivery_fee: "-5".to_owned(),
            home_state: "Atlantis".to_owned(),
            low_stock_threshold: "few".to_owned(),
            ..SettingsForm::from(&StoreSettings::default())
        };
        let errors = form.validate().unwrap_err();
        assert!(errors.has("gst_rate"));
        assert!(errors.has("delivery_fee"));
        assert!(errors.has("home_state"));
        assert!(errors.has("low_stock_threshold"));
        assert!(!errors.has("free_delivery_threshold"));
    }
}
