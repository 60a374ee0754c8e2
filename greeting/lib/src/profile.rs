//! The values the greeting is built from.

use serde::{Deserialize, Serialize};
use strum::{Display, IntoStaticStr};

/// Ages strictly above this are adults.
pub const ADULT_AGE: i64 = 18;

/// Name, age and salary shown by the greeting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub name: String,
    pub age: i64,
    pub salary: f64,
}

impl Profile {
    pub fn new(name: impl Into<String>, age: i64, salary: f64) -> Self {
        Self {
            name: name.into(),
            age,
            salary,
        }
    }

    pub fn age_category(&self) -> AgeCategory {
        AgeCategory::from_age(self.age)
    }
}

impl Default for Profile {
    fn default() -> Self {
        Self::new("Juan", 30, 2500.75)
    }
}

/// Which side of the adult boundary an age falls on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, IntoStaticStr)]
pub enum AgeCategory {
    #[strum(serialize = "Mayor de edad")]
    Adult,
    #[strum(serialize = "Menor de edad")]
    Minor,
}

impl AgeCategory {
    /// The comparison is strict: exactly [`ADULT_AGE`] is a minor.
    pub fn from_age(age: i64) -> Self {
        if age > ADULT_AGE {
            AgeCategory::Adult
        } else {
            AgeCategory::Minor
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_profile_uses_demo_values() {
        let profile = Profile::default();
        assert_eq!(profile.name, "Juan");
        assert_eq!(profile.age, 30);
        assert_eq!(profile.salary, 2500.75);
    }

    #[test]
    fn age_above_boundary_is_adult() {
        assert_eq!(AgeCategory::from_age(19), AgeCategory::Adult);
        assert_eq!(AgeCategory::from_age(30), AgeCategory::Adult);
    }

    #[test]
    fn age_at_boundary_is_minor() {
        assert_eq!(AgeCategory::from_age(18), AgeCategory::Minor);
    }

    #[test]
    fn age_below_boundary_is_minor() {
        assert_eq!(AgeCategory::from_age(17), AgeCategory::Minor);
        assert_eq!(AgeCategory::from_age(0), AgeCategory::Minor);
        assert_eq!(AgeCategory::from_age(-5), AgeCategory::Minor);
    }

    #[test]
    fn category_displays_spanish_label() {
        assert_eq!(AgeCategory::Adult.to_string(), "Mayor de edad");
        assert_eq!(AgeCategory::Minor.to_string(), "Menor de edad");
        let label: &'static str = AgeCategory::Minor.into();
        assert_eq!(label, "Menor de edad");
    }

    #[test]
    fn profile_category_follows_age() {
        assert_eq!(Profile::new("Ana", 18, 0.0).age_category(), AgeCategory::Minor);
        assert_eq!(Profile::default().age_category(), AgeCategory::Adult);
    }
}
