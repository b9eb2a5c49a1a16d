use crate::domain::{
    chart::{
        ChartEngine, ChartStyles, EngineFactory, IndicatorKind, LoadMoreCallback, PaneId,
        PanePlacement,
    },
    market_data::Bar,
};
use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};
use std::rc::Rc;

/// One call received by a headless engine.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineCall {
    Init { mount_id: String },
    ApplyStyles,
    ApplyNewData { count: usize, more: bool },
    UpdateData { open_time: u64 },
    Resize,
    CreateIndicator { kind: IndicatorKind, pane: PaneId },
    RemoveIndicator { kind: IndicatorKind, pane: PaneId },
    SetLoadMore,
    Dispose { mount_id: String },
}

#[derive(Default)]
struct JournalState {
    calls: Vec<EngineCall>,
    dataset: Vec<Bar>,
    more: bool,
    panes: BTreeMap<PaneId, BTreeSet<IndicatorKind>>,
    styles: Option<ChartStyles>,
    load_more: Option<LoadMoreCallback>,
    next_pane: u32,
    refused: BTreeSet<IndicatorKind>,
}

/// Shared record of everything the headless engines of one factory did.
#[derive(Clone, Default)]
pub struct EngineJournal {
    state: Rc<RefCell<JournalState>>,
}

impl EngineJournal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<EngineCall> {
        self.state.borrow().calls.clone()
    }

    pub fn count(&self, predicate: impl Fn(&EngineCall) -> bool) -> usize {
        self.state.borrow().calls.iter().filter(|c| predicate(c)).count()
    }

    pub fn dataset(&self) -> Vec<Bar> {
        self.state.borrow().dataset.clone()
    }

    pub fn open_times(&self) -> Vec<u64> {
        self.state.borrow().dataset.iter().map(|b| b.open_time.value()).collect()
    }

    /// `more` flag of the last `apply_new_data`.
    pub fn has_more(&self) -> bool {
        self.state.borrow().more
    }

    pub fn styles(&self) -> Option<ChartStyles> {
        self.state.borrow().styles.clone()
    }

    pub fn indicators_on(&self, pane: &PaneId) -> Vec<IndicatorKind> {
        self.state
            .borrow()
            .panes
            .get(pane)
            .map(|kinds| kinds.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Panes other than the price pane.
    pub fn sub_pane_count(&self) -> usize {
        let main = PaneId::main();
        self.state.borrow().panes.keys().filter(|pane| **pane != main).count()
    }

    pub fn resize_count(&self) -> usize {
        self.count(|c| matches!(c, EngineCall::Resize))
    }

    pub fn dispose_count(&self) -> usize {
        self.count(|c| matches!(c, EngineCall::Dispose { .. }))
    }

    /// Make every engine refuse `kind` from now on.
    pub fn refuse(&self, kind: IndicatorKind) {
        self.state.borrow_mut().refused.insert(kind);
    }

    /// Simulate the user scrolling to the oldest bar. Returns `false` when no
    /// callback is registered.
    pub fn trigger_load_more(&self) -> bool {
        let (callback, oldest) = {
            let mut state = self.state.borrow_mut();
            let oldest = state.dataset.first().map(|bar| bar.open_time);
            (state.load_more.take(), oldest)
        };
        let Some(mut callback) = callback else {
            return false;
        };
        callback(oldest);

        let mut state = self.state.borrow_mut();
        if state.load_more.is_none() {
            state.load_more = Some(callback);
        }
        true
    }

    fn record(&self, call: EngineCall) {
        self.state.borrow_mut().calls.push(call);
    }
}

/// In-memory `ChartEngine` that renders nothing and journals every call.
pub struct HeadlessChartEngine {
    mount_id: String,
    journal: EngineJournal,
}

impl HeadlessChartEngine {
    pub fn new(mount_id: &str, journal: EngineJournal) -> Self {
        journal.record(EngineCall::Init { mount_id: mount_id.to_string() });
        Self { mount_id: mount_id.to_string(), journal }
    }

    pub fn factory(journal: EngineJournal) -> EngineFactory<Self> {
        Box::new(move |mount_id| Ok(Self::new(mount_id, journal.clone())))
    }
}

impl ChartEngine for HeadlessChartEngine {
    fn apply_styles(&mut self, styles: &ChartStyles) {
        self.journal.state.borrow_mut().styles = Some(styles.clone());
        self.journal.record(EngineCall::ApplyStyles);
    }

    fn apply_new_data(&mut self, bars: &[Bar], more: bool) {
        {
            let mut state = self.journal.state.borrow_mut();
            state.dataset = bars.to_vec();
            state.more = more;
        }
        self.journal.record(EngineCall::ApplyNewData { count: bars.len(), more });
    }

    fn update_data(&mut self, bar: &Bar) {
        {
            let mut state = self.journal.state.borrow_mut();
            match state.dataset.last() {
                Some(last) if last.open_time == bar.open_time => {
                    if let Some(slot) = state.dataset.last_mut() {
                        *slot = bar.clone();
                    }
                }
                _ => state.dataset.push(bar.clone()),
            }
        }
        self.journal.record(EngineCall::UpdateData { open_time: bar.open_time.value() });
    }

    fn resize(&mut self) {
        self.journal.record(EngineCall::Resize);
    }

    fn create_indicator(
        &mut self,
        kind: IndicatorKind,
        placement: PanePlacement,
    ) -> Option<PaneId> {
        let pane = {
            let mut state = self.journal.state.borrow_mut();
            if state.refused.contains(&kind) {
                return None;
            }
            let pane = match placement {
                PanePlacement::Main => PaneId::main(),
                PanePlacement::Sub => {
                    state.next_pane += 1;
                    PaneId::new(format!("sub_pane_{}", state.next_pane))
                }
            };
            state.panes.entry(pane.clone()).or_default().insert(kind);
            pane
        };
        self.journal.record(EngineCall::CreateIndicator { kind, pane: pane.clone() });
        Some(pane)
    }

    fn remove_indicator(&mut self, pane: &PaneId, kind: IndicatorKind) {
        {
            let mut state = self.journal.state.borrow_mut();
            let now_empty = state.panes.get_mut(pane).is_some_and(|kinds| {
                kinds.remove(&kind);
                kinds.is_empty()
            });
            if now_empty && *pane != PaneId::main() {
                state.panes.remove(pane);
            }
        }
        self.journal.record(EngineCall::RemoveIndicator { kind, pane: pane.clone() });
    }

    fn set_load_more(&mut self, callback: LoadMoreCallback) {
        self.journal.state.borrow_mut().load_more = Some(callback);
        self.journal.record(EngineCall::SetLoadMore);
    }

    fn dispose(&mut self) {
        {
            let mut state = self.journal.state.borrow_mut();
            state.dataset.clear();
            state.panes.clear();
            state.load_more = None;
        }
        self.journal.record(EngineCall::Dispose { mount_id: self.mount_id.clone() });
    }
}

