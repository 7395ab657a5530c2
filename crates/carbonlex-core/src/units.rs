//! Unit families and normalisation to canonical units.
//!
//! Every [`ActivityType`] belongs to exactly one [`UnitFamily`]. Amounts are
//! normalised to the family's base unit before an emission factor is applied:
//!
//! | family   | base unit | other units                    |
//! |----------|-----------|--------------------------------|
//! | energy   | kWh       | MWh, GJ                        |
//! | volume   | litres    | US gallons, imperial gallons, m3 |
//! | mass     | kg        | tonnes, US short tons, pounds  |
//! | distance | km        | miles                          |
//! | currency | none      | EUR, USD, GBP (pass-through)   |
//!
//! Currency has no base unit: spend is priced per currency, so the canonical
//! unit of a currency amount is the currency it was given in.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::activity::ActivityType;

/// Errors raised while converting between units.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConversionError {
    #[error("unsupported conversion from {from} to {to}")]
    UnsupportedConversion { from: Unit, to: String },

    #[error("unrecognised unit {0:?}")]
    UnknownUnit(String),
}

/// A group of mutually convertible units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitFamily {
    Energy,
    Volume,
    Mass,
    Distance,
    Currency,
}

impl UnitFamily {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Energy => "energy",
            Self::Volume => "volume",
            Self::Mass => "mass",
            Self::Distance => "distance",
            Self::Currency => "currency",
        }
    }

    /// The unit every member of this family normalises to. `None` for currency.
    pub fn base_unit(&self) -> Option<Unit> {
        match self {
            Self::Energy => Some(Unit::Kwh),
            Self::Volume => Some(Unit::Litres),
            Self::Mass => Some(Unit::Kg),
            Self::Distance => Some(Unit::Km),
            Self::Currency => None,
        }
    }

    /// All units registered for this family.
    pub fn units(self) -> impl Iterator<Item = Unit> {
        Unit::ALL.into_iter().filter(move |u| u.family() == self)
    }

    pub fn contains(&self, unit: Unit) -> bool {
        unit.family() == *self
    }
}

impl fmt::Display for UnitFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A measurement unit accepted in activity uploads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Unit {
    Kwh,
    Mwh,
    Gj,
    Litres,
    UsGallons,
    ImperialGallons,
    CubicMetres,
    Kg,
    Tonnes,
    ShortTons,
    Pounds,
    Km,
    Miles,
    Eur,
    Usd,
    Gbp,
}

impl Unit {
    pub const ALL: [Unit; 16] = [
        Unit::Kwh,
        Unit::Mwh,
        Unit::Gj,
        Unit::Litres,
        Unit::UsGallons,
        Unit::ImperialGallons,
        Unit::CubicMetres,
        Unit::Kg,
        Unit::Tonnes,
        Unit::ShortTons,
        Unit::Pounds,
        Unit::Km,
        Unit::Miles,
        Unit::Eur,
        Unit::Usd,
        Unit::Gbp,
    ];

    pub fn family(&self) -> UnitFamily {
        match self {
            Self::Kwh | Self::Mwh | Self::Gj => UnitFamily::Energy,
            Self::Litres | Self::UsGallons | Self::ImperialGallons | Self::CubicMetres => {
                UnitFamily::Volume
            }
            Self::Kg | Self::Tonnes | Self::ShortTons | Self::Pounds => UnitFamily::Mass,
            Self::Km | Self::Miles => UnitFamily::Distance,
            Self::Eur | Self::Usd | Self::Gbp => UnitFamily::Currency,
        }
    }

    /// Display symbol, e.g. `kWh`, `gal`, `EUR`.
    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Kwh => "kWh",
            Self::Mwh => "MWh",
            Self::Gj => "GJ",
            Self::Litres => "L",
            Self::UsGallons => "gal",
            Self::ImperialGallons => "imp gal",
            Self::CubicMetres => "m3",
            Self::Kg => "kg",
            Self::Tonnes => "t",
            Self::ShortTons => "ton",
            Self::Pounds => "lb",
            Self::Km => "km",
            Self::Miles => "mi",
            Self::Eur => "EUR",
            Self::Usd => "USD",
            Self::Gbp => "GBP",
        }
    }

    /// Parse a unit from upload text. Case-insensitive; spaces and hyphens are
    /// treated as underscores.
    pub fn parse(s: &str) -> Option<Self> {
        let key = s.trim().to_lowercase().replace([' ', '-'], "_");
        let unit = match key.as_str() {
            "kwh" => Self::Kwh,
            "mwh" => Self::Mwh,
            "gj" => Self::Gj,
            "l" | "liter" | "liters" | "litre" | "litres" => Self::Litres,
            "gal" | "gallon" | "gallons" | "us_gallon" | "us_gallons" => Self::UsGallons,
            "imp_gal" | "imperial_gallon" | "imperial_gallons" => Self::ImperialGallons,
            "m3" | "m³" | "cubic_meter" | "cubic_meters" | "cubic_metre" | "cubic_metres" => {
                Self::CubicMetres
            }
            "kg" | "kgs" | "kilogram" | "kilograms" => Self::Kg,
            "t" | "tonne" | "tonnes" => Self::Tonnes,
            "ton" | "tons" | "short_ton" | "short_tons" => Self::ShortTons,
            "lb" | "lbs" | "pound" | "pounds" => Self::Pounds,
            "km" | "kilometer" | "kilometers" | "kilometre" | "kilometres" => Self::Km,
            "mi" | "mile" | "miles" => Self::Miles,
            "eur" => Self::Eur,
            "usd" => Self::Usd,
            "gbp" => Self::Gbp,
            _ => return None,
        };
        Some(unit)
    }

    /// Multiplier taking one of this unit to the family base unit.
    ///
    /// Currency units return 1.0: they are never converted.
    fn to_base(self) -> f64 {
        match self {
            Self::Kwh => 1.0,
            Self::Mwh => 1000.0,
            Self::Gj => 1000.0 / 3.6,
            Self::Litres => 1.0,
            Self::UsGallons => 3.785_411_784,
            Self::ImperialGallons => 4.546_09,
            Self::CubicMetres => 1000.0,
            Self::Kg => 1.0,
            Self::Tonnes => 1000.0,
            Self::ShortTons => 907.184_74,
            Self::Pounds => 0.453_592_37,
            Self::Km => 1.0,
            Self::Miles => 1.609_344,
            Self::Eur | Self::Usd | Self::Gbp => 1.0,
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl FromStr for Unit {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| ConversionError::UnknownUnit(s.to_string()))
    }
}

/// An amount paired with its unit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quantity {
    pub amount: f64,
    pub unit: Unit,
}

/// Normalise `amount` in `unit` to the canonical unit of `activity_type`.
///
/// Fails with [`ConversionError::UnsupportedConversion`] when `unit` is not in
/// the activity's unit family. Records that passed validation never fail here.
pub fn normalize(
    activity_type: ActivityType,
    amount: f64,
    unit: Unit,
) -> Result<Quantity, ConversionError> {
    let family = activity_type.unit_family();
    if !family.contains(unit) {
        return Err(ConversionError::UnsupportedConversion {
            from: unit,
            to: format!("{family} ({activity_type})"),
        });
    }
    match family.base_unit() {
        Some(base) => Ok(Quantity {
            amount: amount * unit.to_base(),
            unit: base,
        }),
        // Currency passes through unchanged.
        None => Ok(Quantity { amount, unit }),
    }
}

/// Convert `amount` between two units of the same family.
///
/// Currencies only convert to themselves; exchange rates are out of scope.
pub fn convert(amount: f64, from: Unit, to: Unit) -> Result<f64, ConversionError> {
    if from == to {
        return Ok(amount);
    }
    if from.family() != to.family() || from.family() == UnitFamily::Currency {
        return Err(ConversionError::UnsupportedConversion {
            from,
            to: to.symbol().to_string(),
        });
    }
    Ok(amount * from.to_base() / to.to_base())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn approx_eq(a: f64, b: f64) -> bool {
        if a == b {
            return true;
        }
        (a - b).abs() <= 1e-9 * a.abs().max(b.abs())
    }

    #[test]
    fn every_unit_has_exactly_one_family() {
        let total: usize = [
            UnitFamily::Energy,
            UnitFamily::Volume,
            UnitFamily::Mass,
            UnitFamily::Distance,
            UnitFamily::Currency,
        ]
        .iter()
        .map(|f| f.units().count())
        .sum();
        assert_eq!(total, Unit::ALL.len());
    }

    #[test]
    fn parse_accepts_common_spellings() {
        assert_eq!(Unit::parse("kWh"), Some(Unit::Kwh));
        assert_eq!(Unit::parse(" MWH "), Some(Unit::Mwh));
        assert_eq!(Unit::parse("Litres"), Some(Unit::Litres));
        assert_eq!(Unit::parse("liters"), Some(Unit::Litres));
        assert_eq!(Unit::parse("Imperial Gallons"), Some(Unit::ImperialGallons));
        assert_eq!(Unit::parse("cubic-meters"), Some(Unit::CubicMetres));
        assert_eq!(Unit::parse("tonnes"), Some(Unit::Tonnes));
        assert_eq!(Unit::parse("miles"), Some(Unit::Miles));
        assert_eq!(Unit::parse("eur"), Some(Unit::Eur));
    }

    #[test]
    fn parse_rejects_unknown() {
        assert_eq!(Unit::parse("furlongs"), None);
        assert_eq!(Unit::parse(""), None);
        assert!(matches!(
            "parsecs".parse::<Unit>(),
            Err(ConversionError::UnknownUnit(_))
        ));
    }

    #[test]
    fn normalize_mwh_to_kwh() {
        let q = normalize(ActivityType::Electricity, 2.5, Unit::Mwh).unwrap();
        assert_eq!(q.unit, Unit::Kwh);
        assert_eq!(q.amount, 2500.0);
    }

    #[test]
    fn normalize_gallons_to_litres() {
        let q = normalize(ActivityType::Fuel, 10.0, Unit::UsGallons).unwrap();
        assert_eq!(q.unit, Unit::Litres);
        assert!(approx_eq(q.amount, 37.854_117_84));
    }

    #[test]
    fn normalize_miles_to_km() {
        let q = normalize(ActivityType::Transport, 100.0, Unit::Miles).unwrap();
        assert_eq!(q.unit, Unit::Km);
        assert!(approx_eq(q.amount, 160.9344));
    }

    #[test]
    fn normalize_currency_passes_through() {
        let q = normalize(ActivityType::PurchasedGoods, 1200.0, Unit::Usd).unwrap();
        assert_eq!(q, Quantity { amount: 1200.0, unit: Unit::Usd });
    }

    #[test]
    fn normalize_wrong_family_is_unsupported() {
        let err = normalize(ActivityType::Transport, 5.0, Unit::Kwh).unwrap_err();
        assert!(matches!(
            err,
            ConversionError::UnsupportedConversion { from: Unit::Kwh, .. }
        ));
    }

    #[test]
    fn convert_across_families_fails() {
        assert!(convert(1.0, Unit::Kg, Unit::Km).is_err());
    }

    #[test]
    fn convert_between_currencies_fails() {
        assert!(convert(1.0, Unit::Eur, Unit::Usd).is_err());
        assert_eq!(convert(7.0, Unit::Gbp, Unit::Gbp).unwrap(), 7.0);
    }

    fn same_family_pair() -> impl Strategy<Value = (Unit, Unit)> {
        let convertible: Vec<Unit> = Unit::ALL
            .into_iter()
            .filter(|u| u.family() != UnitFamily::Currency)
            .collect();
        prop::sample::select(convertible).prop_flat_map(|from| {
            let peers: Vec<Unit> = from.family().units().collect();
            (Just(from), prop::sample::select(peers))
        })
    }

    proptest! {
        /// Converting A -> B -> A recovers the original amount.
        #[test]
        fn conversion_round_trips((from, to) in same_family_pair(), x in 0.0f64..1e9) {
            let there = convert(x, from, to).unwrap();
            let back = convert(there, to, from).unwrap();
            prop_assert!(approx_eq(back, x), "{x} {from} -> {there} {to} -> {back}");
        }

        /// Normalising never changes the sign of an amount.
        #[test]
        fn normalize_preserves_non_negative(x in 0.0f64..1e9) {
            for activity in ActivityType::ALL {
                for unit in activity.unit_family().units() {
                    let q = normalize(activity, x, unit).unwrap();
                    prop_assert!(q.amount >= 0.0);
                }
            }
        }
    }
}
