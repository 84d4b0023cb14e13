use fundu::{DurationParser, TimeUnit};
use serde_with::{DeserializeAs, SerializeAs};
use std::time::Duration as StdDuration;

/// Serializes [`std::time::Duration`]s in a human readable form
/// such as `15s`, `10m` or `2h 30m`.
pub struct AsHumanDuration;

const PARSER: DurationParser<'static> = DurationParser::builder()
    .time_units(&[
        TimeUnit::MilliSecond,
        TimeUnit::Second,
        TimeUnit::Minute,
        TimeUnit::Hour,
        TimeUnit::Day,
    ])
    .allow_time_unit_delimiter()
    .disable_exponent()
    .build();

struct StdVisitor;

impl serde::de::Visitor<'_> for StdVisitor {
    type Value = StdDuration;

    fn expecting(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("human duration")
    }

    fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
    where
        E: serde::de::Error,
    {
        use serde::de::Error as DeError;

        let parsed = PARSER.parse(v).map_err(DeError::custom)?;
        StdDuration::try_from(parsed).map_err(DeError::custom)
    }
}

impl<'de> DeserializeAs<'de, StdDuration> for AsHumanDuration {
    fn deserialize_as<D>(deserializer: D) -> Result<StdDuration, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        deserializer.deserialize_str(StdVisitor)
    }
}

impl SerializeAs<StdDuration> for AsHumanDuration {
    fn serialize_as<S>(source: &StdDuration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let duration: fundu::Duration = (*source).into();
        serializer.collect_str(&duration)
    }
}

#[allow(clippy::unwrap_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_with::serde_as;

    #[serde_as]
    #[derive(Debug, Deserialize, PartialEq, Eq)]
    struct Wrapper(#[serde_as(as = "AsHumanDuration")] StdDuration);

    #[test]
    fn parses_common_units() {
        let value: Wrapper = serde_json::from_str(r#""15s""#).unwrap();
        assert_eq!(value.0, StdDuration::from_secs(15));

        let value: Wrapper = serde_json::from_str(r#""10m""#).unwrap();
        assert_eq!(value.0, StdDuration::from_secs(600));

        let value: Wrapper = serde_json::from_str(r#""250ms""#).unwrap();
        assert_eq!(value.0, StdDuration::from_millis(250));
    }

    #[test]
    fn rejects_garbage() {
        assert!(serde_json::from_str::<Wrapper>(r#""soon""#).is_err());
    }
}
