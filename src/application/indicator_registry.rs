use crate::{
    application::chart_adapter::{ChartEngineAdapter, ChartSession},
    domain::{
        chart::{ChartEngine, IndicatorKind, PaneId, PanePlacement},
        logging::{LogComponent, get_logger},
    },
    log_debug,
};
use std::collections::{BTreeMap, BTreeSet};

/// What a toggle did to the engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToggleOutcome {
    Created(PaneId),
    Removed(PaneId),
    Unchanged,
}

/// Active indicators, kept in step with what the engine renders.
///
/// Main indicators all live on the shared price pane, so only their kinds are
/// tracked. Sub indicators each own a pane and are tracked with the pane id
/// the engine handed out.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IndicatorRegistry {
    main: BTreeSet<IndicatorKind>,
    sub: BTreeMap<IndicatorKind, PaneId>,
}

impl IndicatorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_indicator<E: ChartEngine>(
        &mut self,
        adapter: &mut ChartEngineAdapter<E>,
        session: &ChartSession,
        kind: IndicatorKind,
        placement: PanePlacement,
        enabled: bool,
    ) -> ToggleOutcome {
        let outcome = match (placement, enabled) {
            (PanePlacement::Main, true) => self.enable_main(adapter, session, kind),
            (PanePlacement::Main, false) => self.disable_main(adapter, session, kind),
            (PanePlacement::Sub, true) => self.enable_sub(adapter, session, kind),
            (PanePlacement::Sub, false) => self.disable_sub(adapter, session, kind),
        };

        log_debug!(
            LogComponent::Application("IndicatorRegistry"),
            "{} {} -> {}: {:?}",
            placement,
            kind,
            enabled,
            outcome
        );
        outcome
    }

    fn enable_main<E: ChartEngine>(
        &mut self,
        adapter: &mut ChartEngineAdapter<E>,
        session: &ChartSession,
        kind: IndicatorKind,
    ) -> ToggleOutcome {
        if self.main.contains(&kind) {
            return ToggleOutcome::Unchanged;
        }
        match adapter.create_indicator(session, kind, PanePlacement::Main) {
            Some(pane) => {
                self.main.insert(kind);
                ToggleOutcome::Created(pane)
            }
            None => {
                get_logger().warn(
                    LogComponent::Application("IndicatorRegistry"),
                    &format!("Engine refused main indicator {}", kind),
                );
                ToggleOutcome::Unchanged
            }
        }
    }

    fn disable_main<E: ChartEngine>(
        &mut self,
        adapter: &mut ChartEngineAdapter<E>,
        session: &ChartSession,
        kind: IndicatorKind,
    ) -> ToggleOutcome {
        if !self.main.remove(&kind) {
            return ToggleOutcome::Unchanged;
        }
        let pane = PaneId::main();
        adapter.remove_indicator(session, &pane, kind);
        ToggleOutcome::Removed(pane)
    }

    fn enable_sub<E: ChartEngine>(
        &mut self,
        adapter: &mut ChartEngineAdapter<E>,
        session: &ChartSession,
        kind: IndicatorKind,
    ) -> ToggleOutcome {
        if self.sub.contains_key(&kind) {
            return ToggleOutcome::Unchanged;
        }
        match adapter.create_indicator(session, kind, PanePlacement::Sub) {
            Some(pane) => {
                self.sub.insert(kind, pane.clone());
                ToggleOutcome::Created(pane)
            }
            None => {
                get_logger().warn(
                    LogComponent::Application("IndicatorRegistry"),
                    &format!("Engine refused sub indicator {}", kind),
                );
                ToggleOutcome::Unchanged
            }
        }
    }

    fn disable_sub<E: ChartEngine>(
        &mut self,
        adapter: &mut ChartEngineAdapter<E>,
        session: &ChartSession,
        kind: IndicatorKind,
    ) -> ToggleOutcome {
        match self.sub.remove(&kind) {
            Some(pane) => {
                adapter.remove_indicator(session, &pane, kind);
                ToggleOutcome::Removed(pane)
            }
            None => ToggleOutcome::Unchanged,
        }
    }

    pub fn is_main_active(&self, kind: IndicatorKind) -> bool {
        self.main.contains(&kind)
    }

    pub fn sub_pane(&self, kind: IndicatorKind) -> Option<&PaneId> {
        self.sub.get(&kind)
    }

    pub fn main_indicators(&self) -> impl Iterator<Item = IndicatorKind> + '_ {
        self.main.iter().copied()
    }

    pub fn sub_indicators(&self) -> &BTreeMap<IndicatorKind, PaneId> {
        &self.sub
    }

    pub fn is_active(&self, kind: IndicatorKind, placement: PanePlacement) -> bool {
        match placement {
            PanePlacement::Main => self.is_main_active(kind),
            PanePlacement::Sub => self.sub.contains_key(&kind),
        }
    }

    /// Every active indicator with its placement, main ones first.
    pub fn active(&self) -> Vec<(IndicatorKind, PanePlacement)> {
        self.main
            .iter()
            .map(|kind| (*kind, PanePlacement::Main))
            .chain(self.sub.keys().map(|kind| (*kind, PanePlacement::Sub)))
            .collect()
    }

    /// Forget everything; the engine state goes away with its session.
    pub fn clear(&mut self) {
        self.main.clear();
        self.sub.clear();
    }
}
