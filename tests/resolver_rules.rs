// tests/resolver_rules.rs

mod common;

use common::*;

use leadtime::readiness::{BootstrapState, DeferralReason, Resolver, TimeSettings};

fn resolver(tincr: u32, tstart: u32) -> Resolver {
    Resolver::new(TimeSettings::new(tincr, tstart).unwrap())
}

#[test]
fn zero_tincr_is_rejected() {
    assert!(TimeSettings::new(0, 0).is_err());
}

#[test]
fn nothing_is_eligible_without_two_step_zero_records() {
    init_tracing();

    let r = resolver(3, 0);
    let records = vec![record(1, 0), record(2, 3), record(3, 6)];
    let res = r.resolve(&records);

    assert_eq!(res.bootstrap, BootstrapState::Insufficient { found: 1 });
    assert!(res.eligible.is_empty());

    let res = r.resolve(&[record(1, 3)]);
    assert_eq!(res.bootstrap, BootstrapState::Insufficient { found: 0 });
}

#[test]
fn first_step_needs_only_the_bootstrap_pair() {
    init_tracing();

    let records = vec![
        RecordBuilder::new(1, 0).key("A").build(),
        RecordBuilder::new(2, 0).key("B").build(),
        RecordBuilder::new(3, 3).key("C").build(),
    ];
    let res = resolver(3, 0).resolve(&records);

    assert!(res.bootstrap.is_ready());
    assert_eq!(res.eligible.len(), 1);
    let set = &res.eligible[0];
    assert_eq!(set.step(), 3);
    assert_eq!(set.dependency, None);
    let keys: Vec<&str> = set.inputs().iter().map(|r| r.key.as_str()).collect();
    assert_eq!(keys, vec!["A", "B", "C"]);
}

#[test]
fn dependency_presence_is_enough() {
    let records = vec![
        record(1, 0),
        record(2, 0),
        record(3, 3), // unprocessed, still satisfies step 6
        record(4, 6),
    ];
    let res = resolver(3, 0).resolve(&records);

    assert_eq!(res.eligible_steps(), vec![3, 6]);
    let six = &res.eligible[1];
    assert_eq!(six.dependency_step(), Some(3));
    assert_eq!(six.dependency.as_ref().map(|d| d.id), Some(3));
}

#[test]
fn processed_records_are_not_eligible_again() {
    let records = vec![
        record(1, 0),
        record(2, 0),
        RecordBuilder::new(3, 3).processed().build(),
        record(4, 6),
    ];
    let res = resolver(3, 0).resolve(&records);
    assert_eq!(res.eligible_steps(), vec![6]);
}

#[test]
fn missing_dependency_defers_the_step() {
    let records = vec![record(1, 0), record(2, 0), record(3, 9)];
    let res = resolver(3, 0).resolve(&records);

    assert!(res.eligible.is_empty());
    assert_eq!(res.deferred.len(), 1);
    assert_eq!(
        res.deferred[0].reason,
        DeferralReason::MissingDependency { dependency_step: 6 }
    );
}

#[test]
fn misaligned_steps_are_never_eligible() {
    let records = vec![record(1, 0), record(2, 0), record(3, 3), record(4, 4)];
    let res = resolver(3, 0).resolve(&records);

    assert_eq!(res.eligible_steps(), vec![3]);
    assert_eq!(res.deferred[0].step, 4);
    assert_eq!(res.deferred[0].reason, DeferralReason::Misaligned);
}

#[test]
fn tstart_shifts_alignment() {
    // tincr 3, tstart 1: aligned steps are 1, 4, 7, ...
    let records = vec![record(1, 0), record(2, 0), record(3, 1), record(4, 3), record(5, 4)];
    let res = resolver(3, 1).resolve(&records);

    // Step 1 has no non-negative dependency step.
    let unreachable: Vec<_> = res
        .deferred
        .iter()
        .filter(|d| d.reason == DeferralReason::Unreachable)
        .map(|d| d.step)
        .collect();
    assert_eq!(unreachable, vec![1]);
    assert_eq!(res.eligible_steps(), vec![4]);
    assert_eq!(res.eligible[0].dependency_step(), Some(1));
}

#[test]
fn extra_step_zero_records_are_ignored() {
    init_tracing();

    let records = vec![
        RecordBuilder::new(1, 0).key("A").build(),
        RecordBuilder::new(2, 0).key("B").build(),
        RecordBuilder::new(5, 0).key("late").build(),
        record(6, 3),
    ];
    let res = resolver(3, 0).resolve(&records);

    let set = &res.eligible[0];
    assert_eq!(set.bootstrap[0].key, "A");
    assert_eq!(set.bootstrap[1].key, "B");
    assert_eq!(set.inputs().len(), 3);
}

#[test]
fn dependency_prefers_the_same_stream() {
    let records = vec![
        record(1, 0),
        record(2, 0),
        RecordBuilder::new(3, 3).stream("ens").key("ens-3").build(),
        RecordBuilder::new(4, 3).stream("oper").key("oper-3").build(),
        RecordBuilder::new(5, 6).stream("oper").key("oper-6").build(),
        RecordBuilder::new(6, 6).stream("scda").key("scda-6").build(),
    ];
    let res = resolver(3, 0).resolve(&records);

    let oper_six = res
        .eligible
        .iter()
        .find(|s| s.current.key == "oper-6")
        .expect("oper step 6 eligible");
    assert_eq!(oper_six.dependency.as_ref().map(|d| d.key.as_str()), Some("oper-3"));

    // No scda step 3: the earliest step 3 of any stream stands in.
    let scda_six = res
        .eligible
        .iter()
        .find(|s| s.current.key == "scda-6")
        .expect("scda step 6 eligible");
    assert_eq!(scda_six.dependency.as_ref().map(|d| d.key.as_str()), Some("ens-3"));
    assert!(res.deferred.is_empty());
}

#[test]
fn dependency_of_another_stream_still_counts() {
    init_tracing();

    // Explicit-run notifications store the configured stream while keyed
    // ones store the key's stream letter; a run mixing both must progress.
    let records = vec![
        RecordBuilder::new(1, 0).stream("oper").build(),
        RecordBuilder::new(2, 0).stream("oper").build(),
        RecordBuilder::new(3, 3).stream("oper").key("oper-3").build(),
        RecordBuilder::new(4, 6).stream("S").key("S-6").build(),
    ];
    let res = resolver(3, 0).resolve(&records);

    assert_eq!(res.eligible_steps(), vec![3, 6]);
    assert_eq!(
        res.eligible[1].dependency.as_ref().map(|d| d.key.as_str()),
        Some("oper-3")
    );
    assert!(res.deferred.is_empty());
}

#[test]
fn earliest_same_stream_record_is_the_dependency() {
    let records = vec![
        record(1, 0),
        record(2, 0),
        RecordBuilder::new(7, 3).key("second").build(),
        RecordBuilder::new(3, 3).key("first").build(),
        record(8, 6),
    ];
    let res = resolver(3, 0).resolve(&records);

    let six = res.eligible.iter().find(|s| s.step() == 6).unwrap();
    assert_eq!(six.dependency.as_ref().map(|d| d.key.as_str()), Some("first"));
}

#[test]
fn eligible_sets_come_out_in_step_order() {
    let records = vec![
        record(1, 9),
        record(2, 0),
        record(3, 6),
        record(4, 0),
        record(5, 3),
    ];
    let res = resolver(3, 0).resolve(&records);
    assert_eq!(res.eligible_steps(), vec![3, 6, 9]);
}

#[tokio::test]
async fn resolve_run_reads_the_ledger() {
    init_tracing();

    let ledger = memory_ledger().await;
    for (step, key) in [(0, "A"), (0, "B"), (3, "C"), (12, "E")] {
        leadtime::ledger::Ledger::insert(ledger.as_ref(), &arrival(step, key))
            .await
            .unwrap();
    }

    let res = resolver(3, 0)
        .resolve_run(ledger.as_ref(), run_at(0))
        .await
        .unwrap();
    assert_eq!(res.eligible_steps(), vec![3]);
    assert_eq!(
        res.deferred[0].reason,
        DeferralReason::MissingDependency { dependency_step: 9 }
    );
}
