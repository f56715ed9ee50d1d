//! Entropy estimation against the reference frequency table
//!
//! Each canonical field's textual value is looked up under the field's name.
//! A hit with probability `p` adds that field's contribution, a miss adds 0.
//!
//! The default contribution is `-p * log2(p)`, the Shannon entropy of a
//! Bernoulli(p) variable. It is kept because the reference numbers were
//! produced with it. It undercounts rare values: the self-information
//! `-log2(p)` grows without bound as `p -> 0`, while `-p * log2(p)` goes to
//! 0. [`EntropyModel::SelfInformation`] is available as an explicit opt-in.

use serde::{Deserialize, Serialize};

use super::assembler::CanonicalFields;
use super::frequency::FrequencyTable;

/// How a single field's probability turns into bits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntropyModel {
    /// `-p * log2(p)` (reference behavior)
    #[default]
    Bernoulli,
    /// `-log2(p)`
    SelfInformation,
}

impl EntropyModel {
    /// Bits contributed by an observed value with probability `p`.
    ///
    /// Always finite and >= 0; `p <= 0` contributes nothing.
    pub fn contribution(self, p: f64) -> f64 {
        if !p.is_finite() || p <= 0.0 {
            return 0.0;
        }
        let p = p.min(1.0);
        let bits = match self {
            EntropyModel::Bernoulli => -p * p.log2(),
            EntropyModel::SelfInformation => -p.log2(),
        };
        bits.max(0.0)
    }
}

/// One field's share of the estimate
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldContribution {
    pub field: &'static str,
    pub value: String,
    /// `None` when the table has no entry for this value
    pub probability: Option<f64>,
    pub bits: f64,
}

/// Total information estimate for one fingerprint
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntropyEstimate {
    pub bits: f64,
    /// `round(2^bits)`: roughly one in this many population members share it
    pub uniqueness: u64,
    pub fields: Vec<FieldContribution>,
}

/// Score every canonical field against `table`
pub fn estimate_entropy(
    fields: &CanonicalFields,
    table: &FrequencyTable,
    model: EntropyModel,
) -> EntropyEstimate {
    let contributions: Vec<FieldContribution> = fields
        .entries()
        .into_iter()
        .map(|(field, value)| {
            let probability = table.probability(field, &value);
            let bits = probability.map(|p| model.contribution(p)).unwrap_or(0.0);
            FieldContribution {
                field,
                value,
                probability,
                bits,
            }
        })
        .collect();

    let bits: f64 = contributions.iter().map(|c| c.bits).sum::<f64>().max(0.0);

    EntropyEstimate {
        bits,
        uniqueness: uniqueness_from_bits(bits),
        fields: contributions,
    }
}

/// `round(2^bits)`, never below 1 and saturating at `u64::MAX`
pub fn uniqueness_from_bits(bits: f64) -> u64 {
    let estimate = 2f64.powf(bits.max(0.0)).round();
    if !estimate.is_finite() || estimate >= u64::MAX as f64 {
        u64::MAX
    } else {
        (estimate as u64).max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn acme_fields() -> CanonicalFields {
        CanonicalFields {
            brand: "acme".into(),
            model: "rocket 3".into(),
            display: "wifi@10.0.0.7".into(),
            apps_digest: "00".into(),
            sensor_set: "1|4".into(),
            codec_hw: "decoder".into(),
            net_transport: "wifi".into(),
            battery_cap: 5000,
            locale: "en-US".into(),
        }
    }

    #[test]
    fn test_single_field_scenario() {
        let table = FrequencyTable::from_json(r#"{"brand": {"acme": 0.1}}"#).unwrap();
        let estimate = estimate_entropy(&acme_fields(), &table, EntropyModel::Bernoulli);

        // -0.1 * log2(0.1)
        assert!((estimate.bits - 0.332_192_8).abs() < 1e-6);
        assert_eq!(estimate.uniqueness, 1);
        assert_eq!(estimate.fields.len(), 9);
        assert_eq!(estimate.fields.iter().filter(|c| c.probability.is_some()).count(), 1);
    }

    #[test]
    fn test_certain_value_contributes_nothing() {
        assert_eq!(EntropyModel::Bernoulli.contribution(1.0), 0.0);
        assert_eq!(EntropyModel::SelfInformation.contribution(1.0), 0.0);
        assert_eq!(EntropyModel::Bernoulli.contribution(0.0), 0.0);
    }

    #[test]
    fn test_contributions_never_negative() {
        for model in [EntropyModel::Bernoulli, EntropyModel::SelfInformation] {
            for p in [0.0, 1e-12, 0.01, 0.25, 0.5, 0.99, 1.0, f64::NAN] {
                assert!(model.contribution(p) >= 0.0, "{:?} p={}", model, p);
            }
        }
    }

    #[test]
    fn test_self_information_grows_for_rare_values() {
        let rare = 1.0 / 1024.0;
        assert!((EntropyModel::SelfInformation.contribution(rare) - 10.0).abs() < 1e-9);
        assert!(EntropyModel::Bernoulli.contribution(rare) < 0.01);
    }

    #[test]
    fn test_batterycap_looked_up_as_text() {
        let table = FrequencyTable::from_json(r#"{"batteryCap": {"5000": 0.5}}"#).unwrap();
        let estimate = estimate_entropy(&acme_fields(), &table, EntropyModel::Bernoulli);
        assert!((estimate.bits - 0.5).abs() < 1e-12);
        assert_eq!(estimate.uniqueness, 1);
    }

    #[test]
    fn test_uniqueness_rounding() {
        assert_eq!(uniqueness_from_bits(0.0), 1);
        assert_eq!(uniqueness_from_bits(3.0), 8);
        assert_eq!(uniqueness_from_bits(0.6), 2);
        assert_eq!(uniqueness_from_bits(10_000.0), u64::MAX);
    }
}
