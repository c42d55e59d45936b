//! Bootstrapping the two-tier DAO.
//!
//! Each timelock starts out administered by the deployer and is handed to
//! its governor through the two-phase handoff. The guardian DAO gives up its
//! own guardian right, and the main DAO's guardian moves to the guardian
//! DAO's timelock, so that from then on only a guardian DAO vote can cancel
//! main DAO proposals unilaterally.

use augur_types::Address;

use crate::calldata;
use crate::chain::Chain;
use crate::config::DeploymentConfig;
use crate::error::GovernanceError;
use crate::timelock::TimelockTransaction;
use crate::token::TransferPolicy;

/// Addresses of a bootstrapped deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deployment {
    pub voting_token: Address,
    pub guardian_token: Address,
    pub guardian_timelock: Address,
    pub guardian_dao: Address,
    pub augur_timelock: Address,
    pub augur_dao: Address,
}

/// Hand `timelock` over to `governor`.
///
/// The deployer (still the timelock's admin) queues `set_pending_admin`
/// against the timelock itself, the clock moves past the delay, the
/// deployer executes it, and the governor's guardian accepts. Advances the
/// chain's clock by the timelock delay.
pub fn hand_off_timelock(
    chain: &mut Chain,
    deployer: Address,
    timelock: Address,
    governor: Address,
) -> Result<(), GovernanceError> {
    let delay = chain.timelock(timelock)?.delay();
    let eta = chain
        .timestamp()
        .checked_add(delay)
        .ok_or_else(|| GovernanceError::overflow("eta"))?;
    let tx = TimelockTransaction {
        target: timelock,
        value: 0,
        signature: calldata::timelock::SET_PENDING_ADMIN.to_string(),
        data: calldata::encode(calldata::timelock::SET_PENDING_ADMIN, &governor)?,
        eta,
    };

    chain.queue_transaction(deployer, timelock, &tx)?;
    chain.advance_time(delay)?;
    chain.execute_transaction(deployer, timelock, &tx)?;
    chain.accept_admin(deployer, governor)?;

    tracing::info!("Timelock {} handed off to governor {}", timelock, governor);
    Ok(())
}

/// Deploy the guardian DAO and the main DAO around `voting_token`.
pub fn deploy(
    chain: &mut Chain,
    deployer: Address,
    voting_token: Address,
    config: &DeploymentConfig,
) -> Result<Deployment, GovernanceError> {
    config
        .validate()
        .map_err(|e| GovernanceError::InvalidParameter(e.to_string()))?;

    let guardian_token = chain.deploy_token(
        deployer,
        "Augur Guardian",
        "GUARD",
        TransferPolicy::NonTransferable,
    )?;

    let guardian_timelock = chain.deploy_timelock(deployer, deployer, config.timelock.clone())?;
    let guardian_dao = chain.deploy_governor(
        deployer,
        "Guardian DAO",
        config.guardian_dao.clone(),
        guardian_timelock,
        guardian_token,
        None,
    )?;
    hand_off_timelock(chain, deployer, guardian_timelock, guardian_dao)?;
    chain.abdicate(deployer, guardian_dao)?;

    let augur_timelock = chain.deploy_timelock(deployer, deployer, config.timelock.clone())?;
    let augur_dao = chain.deploy_governor(
        deployer,
        "Augur DAO",
        config.augur_dao.clone(),
        augur_timelock,
        voting_token,
        Some(guardian_token),
    )?;
    hand_off_timelock(chain, deployer, augur_timelock, augur_dao)?;
    chain.change_guardian(deployer, augur_dao, guardian_timelock)?;

    chain.initialize_token(deployer, guardian_token, augur_dao)?;

    tracing::info!(
        "Deployed Augur DAO {} guarded by Guardian DAO {}",
        augur_dao,
        guardian_dao
    );
    Ok(Deployment {
        voting_token,
        guardian_token,
        guardian_timelock,
        guardian_dao,
        augur_timelock,
        augur_dao,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ChainConfig;

    const DEPLOYER: Address = Address::from_bytes([1u8; 20]);

    fn deployed() -> (Chain, Deployment) {
        let mut chain = Chain::new(ChainConfig::default());
        let voting_token = chain
            .deploy_token(DEPLOYER, "Wrapped REP", "wREP", TransferPolicy::Transferable)
            .unwrap();
        let deployment = deploy(&mut chain, DEPLOYER, voting_token, &DeploymentConfig::default()).unwrap();
        (chain, deployment)
    }

    #[test]
    fn test_authority_wiring() {
        let (chain, d) = deployed();

        let guardian_dao = chain.governor(d.guardian_dao).unwrap();
        assert_eq!(guardian_dao.guardian(), None);
        assert_eq!(guardian_dao.token(), d.guardian_token);
        assert_eq!(chain.timelock(d.guardian_timelock).unwrap().admin(), d.guardian_dao);

        let augur_dao = chain.governor(d.augur_dao).unwrap();
        assert_eq!(augur_dao.guardian(), Some(d.guardian_timelock));
        assert_eq!(augur_dao.token(), d.voting_token);
        assert_eq!(augur_dao.guardian_governance_token(), Some(d.guardian_token));
        assert_eq!(chain.timelock(d.augur_timelock).unwrap().admin(), d.augur_dao);
        assert_eq!(chain.timelock(d.augur_timelock).unwrap().pending_admin(), None);

        assert_eq!(chain.token(d.guardian_token).unwrap().minter(), Some(d.augur_dao));
    }

    #[test]
    fn test_bootstrap_steps_are_single_use() {
        let (mut chain, d) = deployed();

        assert_eq!(
            chain.change_guardian(DEPLOYER, d.augur_dao, DEPLOYER),
            Err(GovernanceError::GuardianAlreadyChanged)
        );
        assert_eq!(
            chain.initialize_token(DEPLOYER, d.guardian_token, DEPLOYER),
            Err(GovernanceError::AlreadyInitialized)
        );
        assert!(chain.accept_admin(DEPLOYER, d.augur_dao).is_err());
        assert!(chain.abdicate(DEPLOYER, d.guardian_dao).is_err());
    }

    #[test]
    fn test_handoff_needs_the_delay() {
        let mut chain = Chain::new(ChainConfig::default());
        let token = chain
            .deploy_token(DEPLOYER, "Wrapped REP", "wREP", TransferPolicy::Transferable)
            .unwrap();
        let timelock = chain
            .deploy_timelock(DEPLOYER, DEPLOYER, Default::default())
            .unwrap();
        let governor = chain
            .deploy_governor(DEPLOYER, "DAO", Default::default(), timelock, token, None)
            .unwrap();

        // Accepting before the pending admin is set fails
        assert!(chain.accept_admin(DEPLOYER, governor).is_err());

        let before = chain.timestamp();
        hand_off_timelock(&mut chain, DEPLOYER, timelock, governor).unwrap();
        assert_eq!(chain.timestamp(), before + chain.timelock(timelock).unwrap().delay());
        assert_eq!(chain.timelock(timelock).unwrap().admin(), governor);
    }
}
