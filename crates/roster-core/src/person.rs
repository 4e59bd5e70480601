//! The `Person` domain model.
//!
//! All invariants are enforced at construction time: a [`Person`] or
//! [`NewPerson`] that exists is valid. Setter-style mutation is deliberately
//! absent; records are replaced, not edited in place.
//!
//! # Ordering
//!
//! The natural order of persons is body-mass index ascending
//! (`weight / height^2`). [`Person::bmi_cmp`] is the single comparison used
//! by `remove_greater` and any sorted output.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};

/// Lower bound (exclusive) for the `x` coordinate.
pub const MIN_COORD_X_EXCLUSIVE: i32 = -271;

/// Validation failure for a person field.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// Name was empty or whitespace-only.
    #[error("name can't be empty")]
    EmptyName,

    /// The `x` coordinate was at or below the allowed minimum.
    #[error("coordinate x must be greater than {MIN_COORD_X_EXCLUSIVE}, got {x}")]
    CoordinateXTooSmall {
        /// The rejected value.
        x: i32,
    },

    /// Height must be a positive integer.
    #[error("height must be greater than 0, got {height}")]
    NonPositiveHeight {
        /// The rejected value.
        height: i32,
    },

    /// Weight must be a positive integer.
    #[error("weight must be greater than 0, got {weight}")]
    NonPositiveWeight {
        /// The rejected value.
        weight: i32,
    },

    /// The hair color tag did not name a known variant.
    #[error("unknown hair color `{value}`")]
    UnknownHairColor {
        /// The rejected tag.
        value: String,
    },

    /// The nationality tag did not name a known variant.
    #[error("unknown country `{value}`")]
    UnknownCountry {
        /// The rejected tag.
        value: String,
    },

    /// Identifiers assigned by the store are always positive.
    #[error("id must be greater than 0, got {id}")]
    NonPositiveId {
        /// The rejected value.
        id: i64,
    },
}

/// Hair color, in declaration order.
///
/// Declaration order matters: `print_field_descending_hair_color` sorts by
/// it, descending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum HairColor {
    Green,
    Blue,
    Yellow,
    Orange,
    White,
}

impl HairColor {
    /// All variants in declaration order.
    pub const ALL: [Self; 5] = [
        Self::Green,
        Self::Blue,
        Self::Yellow,
        Self::Orange,
        Self::White,
    ];

    /// Canonical wire/storage tag.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Green => "GREEN",
            Self::Blue => "BLUE",
            Self::Yellow => "YELLOW",
            Self::Orange => "ORANGE",
            Self::White => "WHITE",
        }
    }
}

impl FromStr for HairColor {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "GREEN" => Ok(Self::Green),
            "BLUE" => Ok(Self::Blue),
            "YELLOW" => Ok(Self::Yellow),
            "ORANGE" => Ok(Self::Orange),
            "WHITE" => Ok(Self::White),
            other => Err(ValidationError::UnknownHairColor {
                value: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for HairColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Nationality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Country {
    Usa,
    Germany,
    Vatican,
    NorthKorea,
}

impl Country {
    /// Canonical wire/storage tag.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Usa => "USA",
            Self::Germany => "GERMANY",
            Self::Vatican => "VATICAN",
            Self::NorthKorea => "NORTH_KOREA",
        }
    }
}

impl FromStr for Country {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "USA" => Ok(Self::Usa),
            "GERMANY" => Ok(Self::Germany),
            "VATICAN" => Ok(Self::Vatican),
            "NORTH_KOREA" => Ok(Self::NorthKorea),
            other => Err(ValidationError::UnknownCountry {
                value: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for Country {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Integer grid position. `x` is bounded below, see [`MIN_COORD_X_EXCLUSIVE`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Coordinates {
    pub x: i32,
    pub y: i32,
}

impl Coordinates {
    /// Builds validated coordinates.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::CoordinateXTooSmall`] when `x` is at or
    /// below the minimum.
    pub const fn new(x: i32, y: i32) -> Result<Self, ValidationError> {
        if x <= MIN_COORD_X_EXCLUSIVE {
            return Err(ValidationError::CoordinateXTooSmall { x });
        }
        Ok(Self { x, y })
    }
}

/// Free-form location. Only `x` is mandatory.
#[derive(Debug, Clone, PartialEq)]
pub struct Location {
    pub x: f32,
    pub y: Option<f32>,
    pub name: Option<String>,
}

impl Location {
    #[must_use]
    pub const fn new(x: f32, y: Option<f32>, name: Option<String>) -> Self {
        Self { x, y, name }
    }
}

/// A person record as it arrives from a client, before the store has
/// assigned an id and a creation timestamp.
///
/// Construction validates every field; a `NewPerson` in hand is always
/// well-formed.
#[derive(Debug, Clone, PartialEq)]
pub struct NewPerson {
    pub owner_id: i64,
    pub name: String,
    pub coordinates: Coordinates,
    pub height: i32,
    pub weight: i32,
    pub hair_color: HairColor,
    pub nationality: Country,
    pub location: Location,
}

impl NewPerson {
    /// Builds a validated pre-insert person.
    ///
    /// # Errors
    ///
    /// Returns the first failing field check.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        owner_id: i64,
        name: impl Into<String>,
        coordinates: Coordinates,
        height: i32,
        weight: i32,
        hair_color: HairColor,
        nationality: Country,
        location: Location,
    ) -> Result<Self, ValidationError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(ValidationError::EmptyName);
        }
        if height <= 0 {
            return Err(ValidationError::NonPositiveHeight { height });
        }
        if weight <= 0 {
            return Err(ValidationError::NonPositiveWeight { weight });
        }
        Ok(Self {
            owner_id,
            name,
            coordinates,
            height,
            weight,
            hair_color,
            nationality,
            location,
        })
    }

    /// Body-mass index: `weight / height^2`.
    #[must_use]
    pub fn bmi(&self) -> f64 {
        bmi(self.weight, self.height)
    }
}

/// A persisted person record.
///
/// `id` and `creation_date` are assigned by the store and never change.
#[derive(Debug, Clone, PartialEq)]
pub struct Person {
    pub id: i64,
    pub owner_id: i64,
    pub name: String,
    pub coordinates: Coordinates,
    pub creation_date: DateTime<Utc>,
    pub height: i32,
    pub weight: i32,
    pub hair_color: HairColor,
    pub nationality: Country,
    pub location: Location,
}

impl Person {
    /// Completes a [`NewPerson`] with the store-assigned identity.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::NonPositiveId`] for a non-positive id.
    pub fn from_new(
        new: NewPerson,
        id: i64,
        creation_date: DateTime<Utc>,
    ) -> Result<Self, ValidationError> {
        if id <= 0 {
            return Err(ValidationError::NonPositiveId { id });
        }
        Ok(Self {
            id,
            owner_id: new.owner_id,
            name: new.name,
            coordinates: new.coordinates,
            creation_date,
            height: new.height,
            weight: new.weight,
            hair_color: new.hair_color,
            nationality: new.nationality,
            location: new.location,
        })
    }

    /// Body-mass index: `weight / height^2`.
    #[must_use]
    pub fn bmi(&self) -> f64 {
        bmi(self.weight, self.height)
    }

    /// Total order by BMI ascending.
    #[must_use]
    pub fn bmi_cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.bmi().total_cmp(&other.bmi())
    }
}

impl fmt::Display for Person {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Person #{} '{}' (owner {}, {}x{}, {}, {})",
            self.id,
            self.name,
            self.owner_id,
            self.height,
            self.weight,
            self.hair_color,
            self.nationality
        )
    }
}

fn bmi(weight: i32, height: i32) -> f64 {
    f64::from(weight) / (f64::from(height) * f64::from(height))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_new(height: i32, weight: i32) -> NewPerson {
        NewPerson::new(
            1,
            "A",
            Coordinates::new(0, 0).unwrap(),
            height,
            weight,
            HairColor::Blue,
            Country::Usa,
            Location::new(1.0, Some(2.0), Some("L".to_string())),
        )
        .unwrap()
    }

    #[test]
    fn rejects_empty_name() {
        let err = NewPerson::new(
            1,
            "  ",
            Coordinates::new(0, 0).unwrap(),
            170,
            70,
            HairColor::Blue,
            Country::Usa,
            Location::new(0.0, None, None),
        )
        .unwrap_err();
        assert_eq!(err, ValidationError::EmptyName);
    }

    #[test]
    fn rejects_coordinate_x_at_minimum() {
        assert!(Coordinates::new(-271, 5).is_err());
        assert!(Coordinates::new(-270, 5).is_ok());
    }

    #[test]
    fn rejects_non_positive_height_and_weight() {
        assert!(matches!(
            NewPerson::new(
                1,
                "A",
                Coordinates::new(0, 0).unwrap(),
                0,
                70,
                HairColor::Blue,
                Country::Usa,
                Location::new(0.0, None, None),
            ),
            Err(ValidationError::NonPositiveHeight { height: 0 })
        ));
        assert!(matches!(
            NewPerson::new(
                1,
                "A",
                Coordinates::new(0, 0).unwrap(),
                170,
                -3,
                HairColor::Blue,
                Country::Usa,
                Location::new(0.0, None, None),
            ),
            Err(ValidationError::NonPositiveWeight { weight: -3 })
        ));
    }

    #[test]
    fn enum_tags_round_trip() {
        for color in HairColor::ALL {
            assert_eq!(color.as_str().parse::<HairColor>().unwrap(), color);
        }
        for country in [
            Country::Usa,
            Country::Germany,
            Country::Vatican,
            Country::NorthKorea,
        ] {
            assert_eq!(country.as_str().parse::<Country>().unwrap(), country);
        }
        assert!("PURPLE".parse::<HairColor>().is_err());
        assert!("ATLANTIS".parse::<Country>().is_err());
    }

    #[test]
    fn bmi_ordering_is_weight_over_height_squared() {
        let now = Utc::now();
        let p1 = Person::from_new(sample_new(200, 80), 1, now).unwrap();
        let p2 = Person::from_new(sample_new(150, 80), 2, now).unwrap();
        let p3 = Person::from_new(sample_new(170, 70), 3, now).unwrap();

        assert!(p1.bmi() < p3.bmi());
        assert!(p3.bmi() < p2.bmi());
        assert_eq!(p1.bmi_cmp(&p2), std::cmp::Ordering::Less);

        let mut all = vec![p2.clone(), p1.clone(), p3.clone()];
        all.sort_by(Person::bmi_cmp);
        assert_eq!(
            all.iter().map(|p| p.id).collect::<Vec<_>>(),
            vec![p1.id, p3.id, p2.id]
        );
    }

    #[test]
    fn from_new_rejects_non_positive_id() {
        let err = Person::from_new(sample_new(170, 70), 0, Utc::now()).unwrap_err();
        assert_eq!(err, ValidationError::NonPositiveId { id: 0 });
    }
}
