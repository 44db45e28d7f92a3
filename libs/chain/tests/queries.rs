use std::sync::Arc;
use std::time::Duration;

use alloy_primitives::{address, Address, Bytes, B256, U256};
use alloy_sol_types::SolCall;
use keep_chain::simulated::SimulatedLedger;
use keep_chain::{ChainError, ChainHandle, EthereumChain};
use keep_common::interfaces::bonded_ecdsa_keep::IBondedECDSAKeep;
use keep_common::interfaces::bonded_ecdsa_keep_factory::IBondedECDSAKeepFactory;

const OPERATOR: Address = address!("0x1000000000000000000000000000000000000001");
const FACTORY: Address = address!("0x2000000000000000000000000000000000000002");
const KEEP: Address = address!("0x3000000000000000000000000000000000000003");
const APPLICATION: Address = address!("0x4000000000000000000000000000000000000004");

fn setup() -> (Arc<SimulatedLedger>, EthereumChain) {
    let ledger = Arc::new(SimulatedLedger::new(OPERATOR));
    let chain = EthereumChain::new(ledger.clone(), FACTORY, Duration::from_secs(1)).unwrap();
    (ledger, chain)
}

#[tokio::test]
async fn test_keep_queries_decode_contract_returns() {
    let (ledger, chain) = setup();
    let members = vec![OPERATOR, address!("0x5000000000000000000000000000000000000005")];
    let digest = B256::repeat_byte(0x42);
    let public_key = Bytes::from(vec![0x0c; 64]);

    ledger.set_call_result(
        IBondedECDSAKeep::isActiveCall::SELECTOR,
        IBondedECDSAKeep::isActiveCall::abi_encode_returns(&true),
    );
    ledger.set_call_result(
        IBondedECDSAKeep::getMembersCall::SELECTOR,
        IBondedECDSAKeep::getMembersCall::abi_encode_returns(&members),
    );
    ledger.set_call_result(
        IBondedECDSAKeep::digestCall::SELECTOR,
        IBondedECDSAKeep::digestCall::abi_encode_returns(&digest),
    );
    ledger.set_call_result(
        IBondedECDSAKeep::getPublicKeyCall::SELECTOR,
        IBondedECDSAKeep::getPublicKeyCall::abi_encode_returns(&public_key),
    );
    ledger.set_call_result(
        IBondedECDSAKeep::hasKeyGenerationTimedOutCall::SELECTOR,
        IBondedECDSAKeep::hasKeyGenerationTimedOutCall::abi_encode_returns(&false),
    );
    ledger.set_call_result(
        IBondedECDSAKeep::isAwaitingSignatureCall::SELECTOR,
        IBondedECDSAKeep::isAwaitingSignatureCall::abi_encode_returns(&true),
    );

    assert!(chain.is_active(KEEP).await.unwrap());
    assert_eq!(chain.get_members(KEEP).await.unwrap(), members);
    assert_eq!(chain.latest_digest(KEEP).await.unwrap(), digest);
    assert_eq!(chain.get_public_key(KEEP).await.unwrap(), public_key);
    assert!(!chain.has_key_generation_timed_out(KEEP).await.unwrap());
    assert!(chain.is_awaiting_signature(KEEP, digest).await.unwrap());

    let calls = ledger.calls();
    assert!(calls.iter().all(|(to, _)| *to == KEEP));
    let (_, input) = calls.last().unwrap();
    let awaiting = IBondedECDSAKeep::isAwaitingSignatureCall::abi_decode(input).unwrap();
    assert_eq!(awaiting.digest, digest);
}

#[tokio::test]
async fn test_factory_queries_are_sent_for_operator() {
    let (ledger, chain) = setup();
    let registered = IBondedECDSAKeepFactory::isOperatorRegisteredCall::abi_encode_returns(&true);
    ledger.set_call_result(
        IBondedECDSAKeepFactory::isOperatorRegisteredCall::SELECTOR,
        registered,
    );
    ledger.set_call_result(
        IBondedECDSAKeepFactory::isOperatorEligibleCall::SELECTOR,
        IBondedECDSAKeepFactory::isOperatorEligibleCall::abi_encode_returns(&false),
    );
    ledger.set_call_result(
        IBondedECDSAKeepFactory::isOperatorUpToDateCall::SELECTOR,
        IBondedECDSAKeepFactory::isOperatorUpToDateCall::abi_encode_returns(&true),
    );

    assert!(chain.is_registered_for_application(APPLICATION).await.unwrap());
    assert!(!chain.is_eligible_for_application(APPLICATION).await.unwrap());
    assert!(chain
        .is_status_up_to_date_for_application(APPLICATION)
        .await
        .unwrap());

    let (to, input) = ledger.calls().remove(0);
    assert_eq!(to, FACTORY);
    let decoded = IBondedECDSAKeepFactory::isOperatorRegisteredCall::abi_decode(&input).unwrap();
    assert_eq!(decoded.operator, OPERATOR);
    assert_eq!(decoded.application, APPLICATION);
}

#[tokio::test]
async fn test_stake_and_keep_enumeration() {
    let (ledger, chain) = setup();
    ledger.set_call_result(
        IBondedECDSAKeepFactory::hasMinimumStakeCall::SELECTOR,
        IBondedECDSAKeepFactory::hasMinimumStakeCall::abi_encode_returns(&true),
    );
    ledger.set_call_result(
        IBondedECDSAKeepFactory::balanceOfCall::SELECTOR,
        IBondedECDSAKeepFactory::balanceOfCall::abi_encode_returns(&U256::from(1_000u64)),
    );
    ledger.set_call_result(
        IBondedECDSAKeepFactory::getKeepCountCall::SELECTOR,
        IBondedECDSAKeepFactory::getKeepCountCall::abi_encode_returns(&U256::from(3u64)),
    );
    ledger.set_call_result(
        IBondedECDSAKeepFactory::getKeepAtIndexCall::SELECTOR,
        IBondedECDSAKeepFactory::getKeepAtIndexCall::abi_encode_returns(&KEEP),
    );

    assert!(chain.has_minimum_stake(OPERATOR).await.unwrap());
    assert_eq!(chain.balance_of(OPERATOR).await.unwrap(), U256::from(1_000u64));
    assert_eq!(chain.get_keep_count().await.unwrap(), U256::from(3u64));
    assert_eq!(chain.get_keep_at_index(U256::from(2u64)).await.unwrap(), KEEP);
}

#[tokio::test]
async fn test_query_failure_carries_call_context_and_is_not_retried() {
    let (ledger, chain) = setup();
    ledger.fail_next_calls(1, "service unavailable");

    let err = chain.is_active(KEEP).await.unwrap_err();

    assert_eq!(
        err.to_string(),
        "isActive failed: [RPC error: service unavailable]"
    );
    assert_eq!(ledger.calls().len(), 1);
}

#[tokio::test]
async fn test_undecodable_return_is_a_binding_error() {
    let (ledger, chain) = setup();
    ledger.set_call_result(
        IBondedECDSAKeep::getMembersCall::SELECTOR,
        Bytes::from(vec![0x01, 0x02, 0x03]),
    );

    let err = chain.get_members(KEEP).await.unwrap_err();
    assert!(matches!(err, ChainError::Call { call: "getMembers", .. }));
    assert!(matches!(err.root(), ChainError::Binding(_)));
}

#[tokio::test]
async fn test_block_number_and_address() {
    let (ledger, chain) = setup();
    ledger.advance_blocks(7);

    assert_eq!(chain.address(), OPERATOR);
    assert_eq!(chain.block_number().await.unwrap(), 7);
}
