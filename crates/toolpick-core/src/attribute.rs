use serde::{Deserialize, Serialize};

/// The ten rating dimensions shared by every tool card and scenario.
///
/// The set is closed: records carry exactly one value per attribute, so a
/// missing or unknown attribute is a deserialization error, not a runtime
/// lookup miss.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Attribute {
    Ease,
    Flexibility,
    Collaboration,
    Privacy,
    Cost,
    Speed,
    Integrations,
    Code,
    Application,
    A11y,
}

impl Attribute {
    /// All attributes in canonical order.
    pub const ALL: [Self; 10] = [
        Self::Ease,
        Self::Flexibility,
        Self::Collaboration,
        Self::Privacy,
        Self::Cost,
        Self::Speed,
        Self::Integrations,
        Self::Code,
        Self::Application,
        Self::A11y,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Ease => "ease",
            Self::Flexibility => "flexibility",
            Self::Collaboration => "collaboration",
            Self::Privacy => "privacy",
            Self::Cost => "cost",
            Self::Speed => "speed",
            Self::Integrations => "integrations",
            Self::Code => "code",
            Self::Application => "application",
            Self::A11y => "a11y",
        }
    }

    pub fn min_rating(self) -> f64 {
        1.0
    }

    /// Every attribute is rated 1-5 except `application`, which is 1-4.
    pub fn max_rating(self) -> f64 {
        if self == Self::Application {
            4.0
        } else {
            5.0
        }
    }

    /// Width of the rating domain, the normalization denominator per attribute.
    pub fn range(self) -> f64 {
        self.max_rating() - self.min_rating()
    }
}

/// One `f64` per attribute. Field-per-attribute rather than a map so that
/// serde enforces completeness; unknown keys are rejected.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AttributeValues {
    pub ease: f64,
    pub flexibility: f64,
    pub collaboration: f64,
    pub privacy: f64,
    pub cost: f64,
    pub speed: f64,
    pub integrations: f64,
    pub code: f64,
    pub application: f64,
    pub a11y: f64,
}

impl AttributeValues {
    pub fn get(&self, attribute: Attribute) -> f64 {
        match attribute {
            Attribute::Ease => self.ease,
            Attribute::Flexibility => self.flexibility,
            Attribute::Collaboration => self.collaboration,
            Attribute::Privacy => self.privacy,
            Attribute::Cost => self.cost,
            Attribute::Speed => self.speed,
            Attribute::Integrations => self.integrations,
            Attribute::Code => self.code,
            Attribute::Application => self.application,
            Attribute::A11y => self.a11y,
        }
    }

    /// Values paired with their attribute, in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = (Attribute, f64)> + '_ {
        Attribute::ALL
            .into_iter()
            .map(move |attribute| (attribute, self.get(attribute)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn application_has_narrow_range() {
        for attribute in Attribute::ALL {
            if attribute == Attribute::Application {
                assert_eq!(attribute.range(), 3.0);
            } else {
                assert_eq!(attribute.range(), 4.0);
            }
            assert_eq!(attribute.min_rating(), 1.0);
        }
    }

    #[test]
    fn wire_names_are_lowercase() {
        let encoded = serde_json::to_string(&Attribute::A11y).expect("encode");
        assert_eq!(encoded, "\"a11y\"");
        let decoded: Attribute = serde_json::from_str("\"integrations\"").expect("decode");
        assert_eq!(decoded, Attribute::Integrations);
    }

    #[test]
    fn iter_follows_canonical_order() {
        let values = AttributeValues {
            ease: 1.0,
            flexibility: 2.0,
            collaboration: 3.0,
            privacy: 4.0,
            cost: 5.0,
            speed: 1.0,
            integrations: 2.0,
            code: 3.0,
            application: 4.0,
            a11y: 5.0,
        };
        let collected: Vec<(Attribute, f64)> = values.iter().collect();
        assert_eq!(collected.len(), 10);
        assert_eq!(collected.first(), Some(&(Attribute::Ease, 1.0)));
        assert_eq!(collected.last(), Some(&(Attribute::A11y, 5.0)));
    }
}
