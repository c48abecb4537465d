use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Column names expected by the model, in input order.
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "seller_type",
    "fuel_type",
    "transmission_type",
    "vehicle_age",
    "max_power",
    "engine",
    "km_driven",
    "mileage",
];

pub const FEATURE_COUNT: usize = 8;

macro_rules! categorical {
    ($name:ident, $field:literal, { $($variant:ident => $label:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(
                #[serde(rename = $label)]
                $variant,
            )+
        }

        impl $name {
            pub const FIELD: &'static str = $field;
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn label(&self) -> &'static str {
                match self {
                    $($name::$variant => $label,)+
                }
            }

            /// Zero-based position in the declared domain; this is the value fed to the model.
            pub fn code(&self) -> u8 {
                Self::ALL
                    .iter()
                    .position(|v| v == self)
                    .map(|i| i as u8)
                    .unwrap_or_default()
            }

            pub fn labels() -> Vec<&'static str> {
                Self::ALL.iter().map(|v| v.label()).collect()
            }

            pub fn parse(value: &str) -> Result<Self, ValidationError> {
                let wanted = value.trim();
                Self::ALL
                    .iter()
                    .copied()
                    .find(|v| v.label().eq_ignore_ascii_case(wanted))
                    .ok_or_else(|| ValidationError::UnknownOption {
                        field: $field,
                        value: value.to_string(),
                        allowed: Self::labels().join(", "),
                    })
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.label())
            }
        }
    };
}

categorical!(SellerType, "seller_type", {
    Individual => "Individual",
    Dealer => "Dealer",
    TrustmarkDealer => "Trustmark Dealer",
});

categorical!(FuelType, "fuel_type", {
    Petrol => "Petrol",
    Diesel => "Diesel",
    Cng => "CNG",
    Lpg => "LPG",
    Electric => "Electric",
});

categorical!(TransmissionType, "transmission_type", {
    Manual => "Manual",
    Automatic => "Automatic",
});

/// Domain of one numeric form field.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NumericDomain {
    pub name: &'static str,
    pub label: &'static str,
    pub min: f64,
    pub max: f64,
    pub default: f64,
    pub step: f64,
    pub integer: bool,
}

impl NumericDomain {
    fn check(&self, value: f64) -> Result<f64, ValidationError> {
        if !value.is_finite() {
            return Err(ValidationError::NotFinite { field: self.name });
        }
        if !(self.min..=self.max).contains(&value) {
            return Err(ValidationError::OutOfRange {
                field: self.name,
                value,
                min: self.min,
                max: self.max,
            });
        }
        Ok(value)
    }
}

pub const VEHICLE_AGE: NumericDomain = NumericDomain {
    name: "vehicle_age",
    label: "Vehicle Age (in years)",
    min: 0.0,
    max: 30.0,
    default: 5.0,
    step: 1.0,
    integer: true,
};

pub const MAX_POWER: NumericDomain = NumericDomain {
    name: "max_power",
    label: "Max Power (in bhp)",
    min: 20.0,
    max: 500.0,
    default: 100.0,
    step: 0.1,
    integer: false,
};

pub const ENGINE: NumericDomain = NumericDomain {
    name: "engine",
    label: "Engine Size (in cc)",
    min: 500.0,
    max: 5000.0,
    default: 1500.0,
    step: 1.0,
    integer: true,
};

pub const KM_DRIVEN: NumericDomain = NumericDomain {
    name: "km_driven",
    label: "Kilometers Driven",
    min: 0.0,
    max: 500_000.0,
    default: 50_000.0,
    step: 1.0,
    integer: true,
};

pub const MILEAGE: NumericDomain = NumericDomain {
    name: "mileage",
    label: "Mileage (km/l)",
    min: 5.0,
    max: 50.0,
    default: 18.0,
    step: 0.1,
    integer: false,
};

pub static NUMERIC_FIELDS: [NumericDomain; 5] =
    [VEHICLE_AGE, MAX_POWER, ENGINE, KM_DRIVEN, MILEAGE];

/// Raw form state, as submitted. Every field is optional here so that a
/// missing value is reported by name instead of as a generic body error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureInput {
    pub seller_type: Option<String>,
    pub fuel_type: Option<String>,
    pub transmission_type: Option<String>,
    pub vehicle_age: Option<i64>,
    pub max_power: Option<f64>,
    pub engine: Option<i64>,
    pub km_driven: Option<i64>,
    pub mileage: Option<f64>,
}

impl Default for FeatureInput {
    fn default() -> Self {
        FeatureInput {
            seller_type: Some(SellerType::Individual.label().to_string()),
            fuel_type: Some(FuelType::Petrol.label().to_string()),
            transmission_type: Some(TransmissionType::Manual.label().to_string()),
            vehicle_age: Some(VEHICLE_AGE.default as i64),
            max_power: Some(MAX_POWER.default),
            engine: Some(ENGINE.default as i64),
            km_driven: Some(KM_DRIVEN.default as i64),
            mileage: Some(MILEAGE.default),
        }
    }
}

fn required<T>(value: Option<T>, field: &'static str) -> Result<T, ValidationError> {
    value.ok_or(ValidationError::Missing { field })
}

fn whole(domain: &NumericDomain, value: Option<i64>) -> Result<u32, ValidationError> {
    let value = required(value, domain.name)?;
    // Domains are well inside u32, so the cast after the range check is lossless.
    domain.check(value as f64).map(|v| v as u32)
}

fn real(domain: &NumericDomain, value: Option<f64>) -> Result<f64, ValidationError> {
    domain.check(required(value, domain.name)?)
}

impl FeatureInput {
    /// Checks every field against its domain and builds the immutable row.
    /// Fields are checked in column order; the first failure is returned.
    pub fn validate(&self) -> Result<FeatureRow, ValidationError> {
        let seller_type =
            SellerType::parse(required(self.seller_type.as_deref(), SellerType::FIELD)?)?;
        let fuel_type = FuelType::parse(required(self.fuel_type.as_deref(), FuelType::FIELD)?)?;
        let transmission_type = TransmissionType::parse(required(
            self.transmission_type.as_deref(),
            TransmissionType::FIELD,
        )?)?;

        Ok(FeatureRow {
            seller_type,
            fuel_type,
            transmission_type,
            vehicle_age: whole(&VEHICLE_AGE, self.vehicle_age)?,
            max_power: real(&MAX_POWER, self.max_power)?,
            engine: whole(&ENGINE, self.engine)?,
            km_driven: whole(&KM_DRIVEN, self.km_driven)?,
            mileage: real(&MILEAGE, self.mileage)?,
        })
    }
}

/// A validated set of car attributes. Only obtainable through
/// [`FeatureInput::validate`], so every value is inside its domain.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct FeatureRow {
    seller_type: SellerType,
    fuel_type: FuelType,
    transmission_type: TransmissionType,
    vehicle_age: u32,
    max_power: f64,
    engine: u32,
    km_driven: u32,
    mileage: f64,
}

impl FeatureRow {
    pub fn seller_type(&self) -> SellerType {
        self.seller_type
    }

    pub fn fuel_type(&self) -> FuelType {
        self.fuel_type
    }

    pub fn transmission_type(&self) -> TransmissionType {
        self.transmission_type
    }

    pub fn vehicle_age(&self) -> u32 {
        self.vehicle_age
    }

    pub fn max_power(&self) -> f64 {
        self.max_power
    }

    pub fn engine(&self) -> u32 {
        self.engine
    }

    pub fn km_driven(&self) -> u32 {
        self.km_driven
    }

    pub fn mileage(&self) -> f64 {
        self.mileage
    }

    /// Model input in [`FEATURE_NAMES`] order.
    pub fn to_array(&self) -> [f32; FEATURE_COUNT] {
        [
            self.seller_type.code() as f32,
            self.fuel_type.code() as f32,
            self.transmission_type.code() as f32,
            self.vehicle_age as f32,
            self.max_power as f32,
            self.engine as f32,
            self.km_driven as f32,
            self.mileage as f32,
        ]
    }
}

// Floats are validated finite and strictly positive, so bitwise equality
// agrees with numeric equality.
impl PartialEq for FeatureRow {
    fn eq(&self, other: &Self) -> bool {
        self.seller_type == other.seller_type
            && self.fuel_type == other.fuel_type
            && self.transmission_type == other.transmission_type
            && self.vehicle_age == other.vehicle_age
            && self.max_power.to_bits() == other.max_power.to_bits()
            && self.engine == other.engine
            && self.km_driven == other.km_driven
            && self.mileage.to_bits() == other.mileage.to_bits()
    }
}

impl Eq for FeatureRow {}

impl Hash for FeatureRow {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.seller_type.hash(state);
        self.fuel_type.hash(state);
        self.transmission_type.hash(state);
        self.vehicle_age.hash(state);
        self.max_power.to_bits().hash(state);
        self.engine.hash(state);
        self.km_driven.hash(state);
        self.mileage.to_bits().hash(state);
    }
}
