//! Integration tests exercising the node against the LMDB store:
//! config → ledger → propose/vote → LMDB persistence → reopen.

use std::sync::Arc;

use tally_governance::{ErrorKind, ProposalParams, ProposalStatus};
use tally_node::{GovernanceNode, LedgerBalances, NodeConfig};
use tally_store_lmdb::LmdbGovernanceStore;
use tally_nullables::{NullBalances, NullClock};
use tally_types::{Address, FixedClock, ProposalId, Timestamp, TokenAmount};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

const START: u64 = 1_700_000_000;

fn config(dir: &tempfile::TempDir) -> NodeConfig {
    let mut config = NodeConfig::from_toml_str(
        r#"
        [balances]
        alice = 5
        bob = 600
        carol = 400
        "#,
    )
    .expect("config");
    config.data_dir = dir.path().to_path_buf();
    config
}

fn open_at(
    dir: &tempfile::TempDir,
    secs: u64,
) -> GovernanceNode<FixedClock, LedgerBalances, LmdbGovernanceStore> {
    let config = config(dir);
    let store = config.open_store().expect("open store");
    GovernanceNode::open(
        FixedClock(Timestamp::new(secs)),
        LedgerBalances::from_config(&config),
        store,
    )
    .expect("open node")
}

fn addr(name: &str) -> Address {
    Address::new(name)
}

fn params() -> ProposalParams {
    ProposalParams::new("Fund the community garden this year?", "")
        .with_majority(60)
        .with_duration_days(30)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[test]
fn votes_survive_reopen_and_settle_later() {
    let dir = tempfile::tempdir().expect("temp dir");
    let id = {
        let mut node = open_at(&dir, START);
        let id = node.propose(&addr("alice"), params()).unwrap();
        node.vote(&addr("bob"), id, true).unwrap();
        node.vote(&addr("carol"), id, false).unwrap();
        id
    };

    let node = open_at(&dir, START + 30 * 86_400);
    assert_eq!(node.all(), vec![id]);
    assert!(node.active().is_empty());
    assert_eq!(node.weight(id, &addr("bob")).unwrap(), TokenAmount::new(600));

    let settled = node.finalize(&addr("alice"), id).unwrap();
    assert_eq!(settled.status, ProposalStatus::Yes);
    assert_eq!(settled.tally.total_votes(), 2);
}

#[test]
fn id_sequence_continues_after_reopen() {
    let dir = tempfile::tempdir().expect("temp dir");
    {
        let mut node = open_at(&dir, START);
        node.propose(&addr("alice"), params()).unwrap();
        node.propose(&addr("bob"), params()).unwrap();
    }
    let mut node = open_at(&dir, START + 10);
    let third = node.propose(&addr("carol"), params()).unwrap();
    assert_eq!(third, ProposalId::new(3));
    assert_eq!(node.by_creator(&addr("bob")), vec![ProposalId::new(2)]);
}

#[test]
fn double_vote_is_rejected_after_reopen() {
    let dir = tempfile::tempdir().expect("temp dir");
    let id = {
        let mut node = open_at(&dir, START);
        let id = node.propose(&addr("alice"), params()).unwrap();
        node.vote(&addr("bob"), id, true).unwrap();
        id
    };
    let mut node = open_at(&dir, START + 60);
    let err = node.vote(&addr("bob"), id, false).unwrap_err();
    assert_eq!(err.governance().map(|e| e.kind()), Some(ErrorKind::State));
    assert_eq!(node.status(id).unwrap(), ProposalStatus::Yes);
}

#[test]
fn weight_is_frozen_across_ledger_changes() {
    let dir = tempfile::tempdir().expect("temp dir");
    let balances = Arc::new(NullBalances::with_balances([("alice", 1), ("bob", 600)]));
    let clock = NullClock::new(START);
    let store = config(&dir).open_store().unwrap();
    let mut node = GovernanceNode::open(clock, Arc::clone(&balances), store).unwrap();

    let id = node.propose(&addr("alice"), params()).unwrap();
    node.vote(&addr("bob"), id, true).unwrap();
    balances.set("bob", 1);
    assert_eq!(node.weight(id, &addr("bob")).unwrap(), TokenAmount::new(600));

    node.clock().advance_days(29);
    assert_eq!(node.remaining(id).unwrap(), 86_400);
    assert_eq!(node.active(), vec![id]);
}

#[test]
fn non_holder_changes_nothing_on_disk() {
    let dir = tempfile::tempdir().expect("temp dir");
    {
        let mut node = open_at(&dir, START);
        let err = node.propose(&addr("mallory"), params()).unwrap_err();
        assert_eq!(err.governance().map(|e| e.kind()), Some(ErrorKind::Authorization));
    }
    let node = open_at(&dir, START);
    assert!(node.all().is_empty());
    assert_eq!(node.revision(), 0);
}

#[test]
fn two_hosts_on_one_data_dir_keep_both_proposals() {
    let dir = tempfile::tempdir().expect("temp dir");
    let mut alice_host = open_at(&dir, START);
    let mut bob_host = open_at(&dir, START);

    let alice_id = alice_host.propose(&addr("alice"), params()).unwrap();
    let bob_id = bob_host.propose(&addr("bob"), params()).unwrap();
    assert_eq!(alice_id, ProposalId::new(1));
    assert_eq!(bob_id, ProposalId::new(2));

    // Bob's host reloaded when its first write went stale, so it knows #1.
    bob_host.vote(&addr("carol"), alice_id, true).unwrap();
    alice_host.refresh().unwrap();
    alice_host.vote(&addr("bob"), bob_id, true).unwrap();
    drop(alice_host);
    drop(bob_host);

    let node = open_at(&dir, START + 60);
    assert_eq!(node.all(), vec![alice_id, bob_id]);
    assert_eq!(node.by_creator(&addr("alice")), vec![alice_id]);
    assert_eq!(node.by_creator(&addr("bob")), vec![bob_id]);
    assert!(node.has_voted(alice_id, &addr("carol")).unwrap());
    assert!(node.has_voted(bob_id, &addr("bob")).unwrap());
    assert_eq!(node.revision(), 4);
}
