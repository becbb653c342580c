use crate::fixed::{Seconds, checked_seconds, fixed64_to_f64};
use crate::resource::ResourceType;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Inputs consumed and outputs produced by one processing cycle.
///
/// Immutable once handed to a building. `time` is written as plain seconds
/// in configuration files, e.g. `(input: [ore], output: [ingot], time: 2.0)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceRecipe {
    #[serde(default)]
    pub input: Vec<ResourceType>,
    #[serde(default)]
    pub output: Vec<ResourceType>,
    #[serde(with = "seconds_f64")]
    pub time: Seconds,
}

impl ResourceRecipe {
    pub fn new(input: Vec<ResourceType>, output: Vec<ResourceType>, time: Seconds) -> Self {
        Self { input, output, time }
    }
}

mod seconds_f64 {
    use super::*;

    pub fn serialize<S: Serializer>(value: &Seconds, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(fixed64_to_f64(*value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Seconds, D::Error> {
        let raw = f64::deserialize(deserializer)?;
        checked_seconds(raw).ok_or_else(|| {
            serde::de::Error::custom(format!(
                "recipe time must be a non-negative number of seconds below {}, got {raw}",
                Seconds::MAX
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixed::seconds;
    use serde::de::value::{Error as ValueError, F64Deserializer};

    fn time_from(raw: f64) -> Result<Seconds, ValueError> {
        seconds_f64::deserialize(F64Deserializer::<ValueError>::new(raw))
    }

    #[test]
    fn recipe_time_must_fit_in_seconds() {
        assert_eq!(time_from(2.0).unwrap(), seconds(2.0));
        assert!(time_from(-1.0).is_err());
        assert!(time_from(f64::NAN).is_err());
        let err = time_from(1e12).unwrap_err();
        assert!(err.to_string().contains("got 1000000000000"));
    }

    #[test]
    fn recipe_accessors_keep_order() {
        let recipe = ResourceRecipe::new(
            vec![ResourceType::Ore, ResourceType::Ingot],
            vec![ResourceType::Alloy],
            seconds(3.0),
        );
        assert_eq!(recipe.input, vec![ResourceType::Ore, ResourceType::Ingot]);
        assert_eq!(recipe.output, vec![ResourceType::Alloy]);
        assert_eq!(recipe.time, seconds(3.0));
    }
}
