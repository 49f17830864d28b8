use chrono::{NaiveDate, Utc};

pub const DATE_FMT: &str = "%Y-%m-%dT%H:%M:%S%.f";

// Calendar day used for borrow/due/return bookkeeping.
pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}

// Symmetric format so that rows written to the record store parse back
// with the same serializer.
pub mod serializer {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use serde::de::Error;
    use crate::utils::date::DATE_FMT;

    pub fn serialize<S: Serializer>(time: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error> {
        time_to_json(*time).serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDateTime, D::Error> {
        let str_time: String = Deserialize::deserialize(deserializer)?;
        let time = NaiveDateTime::parse_from_str(&str_time, DATE_FMT).map_err(D::Error::custom)?;
        Ok(time)
    }

    fn time_to_json(t: NaiveDateTime) -> String {
        t.format(DATE_FMT).to_string()
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Datelike, NaiveDateTime, Utc};
    use serde::{Deserialize, Serialize};
    use crate::utils::date::{serializer, today, DATE_FMT};

    #[derive(Serialize, Deserialize)]
    struct Stamped {
        #[serde(with = "serializer")]
        at: NaiveDateTime,
    }

    #[tokio::test]
    async fn test_should_round_trip_datetime() {
        let at = NaiveDateTime::parse_from_str("2023-04-12T12:12:12.0", DATE_FMT).unwrap();
        let json = serde_json::to_string(&Stamped { at }).expect("should serialize");
        let parsed: Stamped = serde_json::from_str(json.as_str()).expect("should deserialize");
        assert_eq!(at, parsed.at);
    }

    #[tokio::test]
    async fn test_should_return_today() {
        assert_eq!(Utc::now().date_naive().year(), today().year());
    }
}
