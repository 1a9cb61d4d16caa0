use derive_more::Display;
use serde::{Deserialize, Serialize};

/// How a stored record is judged to still describe the file on disk.
///
/// Stat-based checks are fast but trust timestamps; checkouts and copies that
/// don't preserve modification times make every image look changed. The
/// content-based policies trade a file read and a SHA-256 for that trust.
#[derive(Debug, Display, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FreshnessPolicy {
    /// Modification time and size must both match. Nothing is read.
    #[default]
    #[display("metadata")]
    Metadata,
    /// As [`Metadata`](Self::Metadata), but when the stat differs the file is
    /// digested and the record kept if the content hash still matches.
    #[display("content")]
    Content,
    /// Always digest; the content hash alone decides.
    #[display("strict")]
    Strict,
}

impl FreshnessPolicy {
    /// Whether a matching modification time and size is enough on its own.
    pub fn trusts_metadata(self) -> bool {
        !matches!(self, Self::Strict)
    }

    /// Whether a content digest may confirm a record the stat rejected.
    pub fn compares_content(self) -> bool {
        !matches!(self, Self::Metadata)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(FreshnessPolicy::Metadata, true, false)]
    #[case(FreshnessPolicy::Content, true, true)]
    #[case(FreshnessPolicy::Strict, false, true)]
    fn test_policy_rules(#[case] policy: FreshnessPolicy, #[case] metadata: bool, #[case] content: bool) {
        assert_eq!(policy.trusts_metadata(), metadata);
        assert_eq!(policy.compares_content(), content);
    }

    #[test]
    fn test_policy_serde() {
        assert_eq!(serde_json::to_string(&FreshnessPolicy::Content).unwrap(), "\"content\"");
        assert_eq!(serde_json::from_str::<FreshnessPolicy>("\"strict\"").unwrap(), FreshnessPolicy::Strict);
        assert!(serde_json::from_str::<FreshnessPolicy>("\"sometimes\"").is_err());
        assert_eq!(FreshnessPolicy::default().to_string(), "metadata");
    }
}
