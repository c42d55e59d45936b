//! Governance configuration.
//!
//! Governor and timelock parameters are fixed when a component is deployed.
//! A [`DeploymentConfig`] bundles everything needed to bootstrap the
//! two-tier system and can be loaded from TOML.

use std::path::Path;

use augur_types::tokens;
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, GovernanceError};

pub const SECONDS_PER_DAY: u64 = 86_400;

/// Parameters of a governor, fixed at deployment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GovernorConfig {
    /// Minimum "for" weight for a proposal to succeed
    #[serde(with = "amount")]
    pub quorum_votes: u128,
    /// Prior votes a proposer must exceed
    #[serde(with = "amount")]
    pub proposal_threshold: u128,
    /// Maximum number of actions in one proposal
    pub proposal_max_operations: usize,
    /// Blocks between proposing and the start of voting
    pub voting_delay: u64,
    /// Length of the voting window in blocks
    pub voting_period: u64,
}

impl GovernorConfig {
    /// Parameters of the token-weighted DAO that controls the treasury.
    pub fn augur_dao() -> Self {
        Self {
            quorum_votes: tokens(40_000),
            proposal_threshold: tokens(10_000),
            proposal_max_operations: 10,
            voting_delay: 1,
            voting_period: 100,
        }
    }

    /// Parameters of the guardian DAO; shorter voting window so that a
    /// cancellation can land while the target proposal is still live.
    pub fn guardian_dao() -> Self {
        Self {
            voting_period: 25,
            ..Self::augur_dao()
        }
    }

    pub fn validate(&self) -> Result<(), GovernanceError> {
        if self.proposal_max_operations == 0 {
            return Err(GovernanceError::InvalidParameter(
                "proposal_max_operations must be at least 1".to_string(),
            ));
        }
        if self.voting_period == 0 {
            return Err(GovernanceError::InvalidParameter(
                "voting_period must be at least 1 block".to_string(),
            ));
        }
        if self.quorum_votes == 0 {
            return Err(GovernanceError::InvalidParameter(
                "quorum_votes must be non-zero".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for GovernorConfig {
    fn default() -> Self {
        Self::augur_dao()
    }
}

/// Timelock delay bounds and grace window (seconds).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimelockConfig {
    /// Delay applied to newly queued transactions
    pub delay: u64,
    pub minimum_delay: u64,
    pub maximum_delay: u64,
    /// How long after its eta a queued transaction stays executable
    pub grace_period: u64,
}

impl Default for TimelockConfig {
    fn default() -> Self {
        Self {
            delay: 2 * SECONDS_PER_DAY,
            minimum_delay: 2 * SECONDS_PER_DAY,
            maximum_delay: 30 * SECONDS_PER_DAY,
            grace_period: 14 * SECONDS_PER_DAY,
        }
    }
}

impl TimelockConfig {
    /// Short delays for local testing.
    pub fn devnet() -> Self {
        Self {
            delay: 180,
            minimum_delay: 60,
            ..Self::default()
        }
    }

    /// Same bounds, different delay.
    pub fn with_delay(&self, delay: u64) -> Self {
        Self {
            delay,
            ..self.clone()
        }
    }

    /// Check that `delay` lies within the configured bounds.
    pub fn check_delay(&self, delay: u64) -> Result<(), GovernanceError> {
        if delay < self.minimum_delay {
            return Err(GovernanceError::InvalidParameter(format!(
                "delay {} is below the minimum {}",
                delay, self.minimum_delay
            )));
        }
        if delay > self.maximum_delay {
            return Err(GovernanceError::InvalidParameter(format!(
                "delay {} exceeds the maximum {}",
                delay, self.maximum_delay
            )));
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), GovernanceError> {
        if self.minimum_delay > self.maximum_delay {
            return Err(GovernanceError::InvalidParameter(
                "minimum_delay exceeds maximum_delay".to_string(),
            ));
        }
        if self.grace_period == 0 {
            return Err(GovernanceError::InvalidParameter(
                "grace_period must be non-zero".to_string(),
            ));
        }
        self.check_delay(self.delay)
    }
}

/// Genesis clock and block cadence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChainConfig {
    pub genesis_block: u64,
    pub genesis_timestamp: u64,
    pub seconds_per_block: u64,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            genesis_block: 1,
            genesis_timestamp: 1_640_995_200, // 2022-01-01T00:00:00Z
            seconds_per_block: 15,
        }
    }
}

impl ChainConfig {
    /// One-second blocks for local testing.
    pub fn devnet() -> Self {
        Self {
            seconds_per_block: 1,
            ..Self::default()
        }
    }
}

/// Everything needed to bootstrap the DAO pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentConfig {
    #[serde(default)]
    pub chain: ChainConfig,
    /// Shared by both timelocks
    #[serde(default)]
    pub timelock: TimelockConfig,
    #[serde(default = "GovernorConfig::augur_dao")]
    pub augur_dao: GovernorConfig,
    #[serde(default = "GovernorConfig::guardian_dao")]
    pub guardian_dao: GovernorConfig,
}

impl Default for DeploymentConfig {
    fn default() -> Self {
        Self {
            chain: ChainConfig::default(),
            timelock: TimelockConfig::default(),
            augur_dao: GovernorConfig::augur_dao(),
            guardian_dao: GovernorConfig::guardian_dao(),
        }
    }
}

impl DeploymentConfig {
    /// Devnet chain and timelock with the production governor presets.
    pub fn devnet() -> Self {
        Self {
            chain: ChainConfig::devnet(),
            timelock: TimelockConfig::devnet(),
            ..Self::default()
        }
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: DeploymentConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.timelock
            .validate()
            .map_err(|e| ConfigError::Invalid(format!("timelock: {}", e)))?;
        self.augur_dao
            .validate()
            .map_err(|e| ConfigError::Invalid(format!("augur_dao: {}", e)))?;
        self.guardian_dao
            .validate()
            .map_err(|e| ConfigError::Invalid(format!("guardian_dao: {}", e)))?;
        if self.chain.seconds_per_block == 0 {
            return Err(ConfigError::Invalid(
                "chain: seconds_per_block must be non-zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Token amounts as decimal strings; TOML integers stop at i64.
pub(crate) mod amount {
    use serde::de::{self, Visitor};
    use serde::{Deserializer, Serializer};
    use std::fmt;

    pub fn serialize<S: Serializer>(value: &u128, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u128, D::Error> {
        deserializer.deserialize_any(AmountVisitor)
    }

    struct AmountVisitor;

    impl<'de> Visitor<'de> for AmountVisitor {
        type Value = u128;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "a non-negative integer or decimal string")
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<u128, E> {
            Ok(u128::from(v))
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<u128, E> {
            u128::try_from(v).map_err(E::custom)
        }

        fn visit_u128<E: de::Error>(self, v: u128) -> Result<u128, E> {
            Ok(v)
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<u128, E> {
            v.replace('_', "").parse::<u128>().map_err(E::custom)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_presets_validate() {
        assert!(GovernorConfig::augur_dao().validate().is_ok());
        assert!(GovernorConfig::guardian_dao().validate().is_ok());
        assert!(TimelockConfig::default().validate().is_ok());
        assert!(TimelockConfig::devnet().validate().is_ok());
        assert_eq!(GovernorConfig::guardian_dao().voting_period, 25);
    }

    #[test]
    fn test_timelock_delay_bounds() {
        let config = TimelockConfig::default();
        assert!(config.check_delay(SECONDS_PER_DAY).is_err());
        assert!(config.check_delay(2 * SECONDS_PER_DAY).is_ok());
        assert!(config.check_delay(31 * SECONDS_PER_DAY).is_err());
        assert!(config.with_delay(SECONDS_PER_DAY).validate().is_err());
    }

    #[test]
    fn test_governor_config_rejects_zero_operations() {
        let config = GovernorConfig {
            proposal_max_operations: 0,
            ..GovernorConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_parse_toml_with_string_amounts() {
        let config = DeploymentConfig::from_toml_str(
            r#"
            [timelock]
            delay = 259200

            [augur_dao]
            quorum_votes = "40_000_000000000000000000"
            proposal_threshold = 5
            proposal_max_operations = 4
            voting_delay = 2
            voting_period = 50
            "#,
        )
        .unwrap();

        assert_eq!(config.timelock.delay, 3 * SECONDS_PER_DAY);
        assert_eq!(config.timelock.grace_period, 14 * SECONDS_PER_DAY);
        assert_eq!(config.augur_dao.quorum_votes, tokens(40_000));
        assert_eq!(config.augur_dao.proposal_threshold, 5);
        assert_eq!(config.guardian_dao, GovernorConfig::guardian_dao());
        assert_eq!(config.chain, ChainConfig::default());
    }

    #[test]
    fn test_invalid_toml_config_is_rejected() {
        let result = DeploymentConfig::from_toml_str(
            r#"
            [timelock]
            delay = 10
            "#,
        );
        assert!(matches!(result, Err(ConfigError::Invalid(_))));

        let result = DeploymentConfig::from_toml_str("augur_dao = 3");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_roundtrip_through_file() {
        let config = DeploymentConfig::default();
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(config.to_toml_string().unwrap().as_bytes())
            .unwrap();

        let loaded = DeploymentConfig::from_file(file.path()).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_default_matches_empty_file() {
        let config = DeploymentConfig::default();
        assert_eq!(config, DeploymentConfig::from_toml_str("").unwrap());
        assert_eq!(config.augur_dao, GovernorConfig::augur_dao());
        assert_eq!(config.guardian_dao, GovernorConfig::guardian_dao());
        assert!(config.guardian_dao.voting_period < config.augur_dao.voting_period);
    }

    #[test]
    fn test_devnet_deployment() {
        let config = DeploymentConfig::devnet();
        assert!(config.validate().is_ok());
        assert_eq!(config.chain.seconds_per_block, 1);
        assert_eq!(config.timelock.delay, 180);
        assert_eq!(config.guardian_dao, GovernorConfig::guardian_dao());
    }

    #[test]
    fn test_missing_file() {
        let result = DeploymentConfig::from_file("/definitely/not/here.toml");
        assert!(matches!(result, Err(ConfigError::Io { .. })));
    }
}
