#![cfg(feature = "headless")]

mod common;

use common::{Harness, theme};
use kline_chart_wasm::application::{ChartConfig, ToggleOutcome};
use kline_chart_wasm::domain::chart::{IndicatorKind, PaneId, PanePlacement};
use kline_chart_wasm::infrastructure::EngineCall;
use quickcheck_macros::quickcheck;

fn creates(h: &Harness) -> usize {
    h.journal.count(|c| matches!(c, EngineCall::CreateIndicator { .. }))
}

#[test]
fn mount_adds_the_default_sub_indicator() {
    let mut h = Harness::new();
    h.controller.mount(&theme()).unwrap();

    let pane = h.controller.indicators().sub_pane(IndicatorKind::Vol).cloned().unwrap();
    assert_eq!(h.journal.indicators_on(&pane), vec![IndicatorKind::Vol]);
    assert_eq!(h.journal.sub_pane_count(), 1);
}

#[test]
fn default_sub_indicator_can_be_disabled() {
    let config = ChartConfig { default_sub_indicator: None, ..ChartConfig::default() };
    let mut h = Harness::with_config(config);
    h.controller.mount(&theme()).unwrap();
    assert_eq!(creates(&h), 0);
    assert!(h.controller.indicators().active().is_empty());
}

#[test]
fn main_indicators_share_the_price_pane_and_are_idempotent() {
    let mut h = Harness::new();
    h.controller.mount(&theme()).unwrap();
    let before = creates(&h);

    let first = h.controller.set_indicator(IndicatorKind::Ma, PanePlacement::Main, true);
    let again = h.controller.set_indicator(IndicatorKind::Ma, PanePlacement::Main, true);
    h.controller.set_indicator(IndicatorKind::Boll, PanePlacement::Main, true);

    assert_eq!(first, ToggleOutcome::Created(PaneId::main()));
    assert_eq!(again, ToggleOutcome::Unchanged);
    assert_eq!(creates(&h), before + 2);
    assert_eq!(
        h.journal.indicators_on(&PaneId::main()),
        vec![IndicatorKind::Ma, IndicatorKind::Boll]
    );
}

#[test]
fn sub_indicator_round_trip_removes_its_own_pane() {
    let mut h = Harness::new();
    h.controller.mount(&theme()).unwrap();

    let ToggleOutcome::Created(pane) =
        h.controller.set_indicator(IndicatorKind::Macd, PanePlacement::Sub, true)
    else {
        panic!("MACD pane not created");
    };
    assert_eq!(
        h.controller.set_indicator(IndicatorKind::Macd, PanePlacement::Sub, true),
        ToggleOutcome::Unchanged
    );
    assert_eq!(h.journal.sub_pane_count(), 2);

    let removed = h.controller.set_indicator(IndicatorKind::Macd, PanePlacement::Sub, false);
    assert_eq!(removed, ToggleOutcome::Removed(pane.clone()));
    assert!(h.journal.indicators_on(&pane).is_empty());
    assert_eq!(h.journal.sub_pane_count(), 1);
    assert!(h.journal.calls().contains(&EngineCall::RemoveIndicator {
        kind: IndicatorKind::Macd,
        pane,
    }));
}

#[test]
fn disabling_an_inactive_indicator_does_nothing() {
    let mut h = Harness::new();
    h.controller.mount(&theme()).unwrap();
    assert_eq!(
        h.controller.set_indicator(IndicatorKind::Rsi, PanePlacement::Sub, false),
        ToggleOutcome::Unchanged
    );
    assert_eq!(
        h.controller.set_indicator(IndicatorKind::Ema, PanePlacement::Main, false),
        ToggleOutcome::Unchanged
    );
    assert_eq!(h.journal.count(|c| matches!(c, EngineCall::RemoveIndicator { .. })), 0);
}

#[test]
fn toggles_without_a_chart_are_ignored() {
    let mut h = Harness::new();
    assert_eq!(
        h.controller.set_indicator(IndicatorKind::Ma, PanePlacement::Main, true),
        ToggleOutcome::Unchanged
    );
    assert!(h.journal.calls().is_empty());
}

#[test]
fn refused_indicator_is_not_tracked() {
    let mut h = Harness::new();
    h.controller.mount(&theme()).unwrap();
    h.journal.refuse(IndicatorKind::Sar);
    assert_eq!(
        h.controller.set_indicator(IndicatorKind::Sar, PanePlacement::Main, true),
        ToggleOutcome::Unchanged
    );
    assert!(!h.controller.indicators().is_main_active(IndicatorKind::Sar));
}

#[test]
fn remount_starts_from_the_default_set() {
    let mut h = Harness::new();
    h.controller.mount(&theme()).unwrap();
    h.controller.set_indicator(IndicatorKind::Kdj, PanePlacement::Sub, true);
    h.controller.set_indicator(IndicatorKind::Ma, PanePlacement::Main, true);

    h.controller.unmount();
    h.controller.mount(&theme()).unwrap();
    assert_eq!(
        h.controller.indicators().active(),
        vec![(IndicatorKind::Vol, PanePlacement::Sub)]
    );
}

/// Any toggle sequence leaves the registry and the engine panes in step.
#[quickcheck]
fn registry_matches_engine_panes(toggles: Vec<(u8, bool)>) -> bool {
    let catalog: Vec<IndicatorKind> =
        IndicatorKind::main_catalog().into_iter().chain(IndicatorKind::sub_catalog()).collect();

    let mut h = Harness::new();
    h.controller.mount(&theme()).unwrap();
    for (index, enabled) in toggles {
        let kind = catalog[index as usize % catalog.len()];
        h.controller.set_indicator(kind, kind.natural_placement(), enabled);
    }

    let registry = h.controller.indicators();
    let mut main_on_engine = h.journal.indicators_on(&PaneId::main());
    main_on_engine.sort();
    let main_in_registry: Vec<IndicatorKind> = registry.main_indicators().collect();

    let subs_match = registry
        .sub_indicators()
        .iter()
        .all(|(kind, pane)| h.journal.indicators_on(pane) == vec![*kind]);

    main_on_engine == main_in_registry
        && subs_match
        && h.journal.sub_pane_count() == registry.sub_indicators().len()
}
