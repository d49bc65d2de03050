use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::data::DataType;

/// Violations of the price invariant `1 <= min < max`, `min <= value <= max`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PriceError {
    #[error("price range [{min} ~ {max}] is invalid")]
    InvalidRange { min: i64, max: i64 },

    #[error("price value {value} is outside range [{min} ~ {max}]")]
    ValueOutOfRange { value: i64, min: i64, max: i64 },
}

fn is_zero(v: &i64) -> bool {
    *v == 0
}

/// Price range of a title with the value currently charged per record.
///
/// `min` and `max` may be omitted from requests; an omitted bound reads as
/// zero and therefore fails [`TitlePrice::valid_range`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TitlePrice {
    #[serde(default, skip_serializing_if = "is_zero")]
    pub min: i64,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub max: i64,
    #[serde(default)]
    pub value: i64,
}

impl TitlePrice {
    pub fn new(min: i64, max: i64, value: i64) -> Self {
        Self { min, max, value }
    }

    /// Full invariant: range ordering, then value within the range.
    pub fn valid(&self) -> Result<(), PriceError> {
        self.valid_range()?;
        self.valid_value(self.value)
    }

    /// `min >= 1 && max >= 1 && min < max`.
    pub fn valid_range(&self) -> Result<(), PriceError> {
        if self.min >= 1 && self.max >= 1 && self.min < self.max {
            Ok(())
        } else {
            Err(PriceError::InvalidRange {
                min: self.min,
                max: self.max,
            })
        }
    }

    /// `min <= value <= max` against this price's current range.
    pub fn valid_value(&self, value: i64) -> Result<(), PriceError> {
        if value >= self.min && value <= self.max {
            Ok(())
        } else {
            Err(PriceError::ValueOutOfRange {
                value,
                min: self.min,
                max: self.max,
            })
        }
    }

    pub fn set_range(&mut self, min: i64, max: i64) {
        self.min = min;
        self.max = max;
    }
}

/// Listing value stored under the `title` index.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TitleListing {
    pub shelve: bool,
    pub price: TitlePrice,
}

/// Title upsert payload, also the shape of each entry returned by a listing
/// query.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TitleRequest {
    #[serde(rename = "type")]
    pub data_type: DataType,
    pub owner: String,
    pub title: String,
    #[serde(default)]
    pub shelve: bool,
    #[serde(default)]
    pub price: TitlePrice,
}

impl TitleRequest {
    /// Attributes of the `title` index: `[type, owner, title]`.
    pub fn title_attributes(&self) -> Vec<String> {
        vec![
            self.data_type.to_string(),
            self.owner.clone(),
            self.title.clone(),
        ]
    }

    /// The listing value carried by this request.
    pub fn listing(&self) -> TitleListing {
        TitleListing {
            shelve: self.shelve,
            price: self.price,
        }
    }
}

/// Search payload: titles of one owner to look up.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchTitleRequest {
    #[serde(rename = "type")]
    pub data_type: DataType,
    pub owner: String,
    #[serde(default)]
    pub titles: Vec<String>,
}

/// One evidenced data item under a shelved title.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchTitleResult {
    pub base: TitleRequest,
    pub hash: String,
    pub extend: String,
}

/// Shelved title names of one data type, grouped by owner.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnerTitles {
    #[serde(rename = "type")]
    pub data_type: DataType,
    pub titles: BTreeMap<String, Vec<String>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn valid_price() {
        assert!(TitlePrice::new(10, 100, 50).valid().is_ok());
        assert!(TitlePrice::new(10, 100, 10).valid().is_ok());
        assert!(TitlePrice::new(10, 100, 100).valid().is_ok());
    }

    #[test]
    fn inverted_range_rejected() {
        assert_eq!(
            TitlePrice::new(100, 50, 60).valid(),
            Err(PriceError::InvalidRange { min: 100, max: 50 })
        );
    }

    #[test]
    fn equal_bounds_rejected() {
        assert!(TitlePrice::new(5, 5, 5).valid_range().is_err());
    }

    #[test]
    fn zero_bounds_rejected() {
        assert!(TitlePrice::new(0, 10, 5).valid_range().is_err());
        assert!(TitlePrice::new(1, 0, 1).valid_range().is_err());
    }

    #[test]
    fn value_outside_range_rejected() {
        assert_eq!(
            TitlePrice::new(10, 100, 101).valid(),
            Err(PriceError::ValueOutOfRange {
                value: 101,
                min: 10,
                max: 100
            })
        );
    }

    #[test]
    fn omitted_bounds_parse_as_zero() {
        let price: TitlePrice = serde_json::from_str(r#"{"value":20}"#).unwrap();
        assert_eq!(price, TitlePrice::new(0, 0, 20));
        assert_eq!(serde_json::to_string(&price).unwrap(), r#"{"value":20}"#);
    }

    #[test]
    fn title_request_payload() {
        let json = r#"{"type":1,"owner":"A","title":"T1","shelve":true,
            "price":{"min":10,"max":100,"value":50}}"#;
        let req: TitleRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.title_attributes(), vec!["1", "A", "T1"]);
        assert_eq!(
            req.listing(),
            TitleListing {
                shelve: true,
                price: TitlePrice::new(10, 100, 50)
            }
        );
    }

    #[test]
    fn owner_titles_shape() {
        let mut grouped = OwnerTitles {
            data_type: 3,
            ..Default::default()
        };
        grouped.titles.insert("A".into(), vec!["T1".into()]);
        let json = serde_json::to_string(&grouped).unwrap();
        assert_eq!(json, r#"{"type":3,"titles":{"A":["T1"]}}"#);
    }

    proptest! {
        #[test]
        fn valid_implies_invariant(min in -5i64..200, max in -5i64..200, value in -5i64..200) {
            let price = TitlePrice::new(min, max, value);
            if price.valid().is_ok() {
                prop_assert!(min >= 1 && max >= 1 && min < max);
                prop_assert!(min <= value && value <= max);
            }
        }

        #[test]
        fn invariant_implies_valid(min in 1i64..1000, span in 1i64..1000, offset in 0i64..1000) {
            let max = min + span;
            let value = min + offset % (span + 1);
            prop_assert!(TitlePrice::new(min, max, value).valid().is_ok());
        }
    }
}
