use crate::domain::chart::{IndicatorKind, PanePlacement};
use crate::domain::market_data::{Resolution, Symbol};
use leptos::*;
use once_cell::sync::OnceCell;

pub struct Globals {
    pub selected_market: RwSignal<Option<Symbol>>,
    pub current_resolution: RwSignal<Resolution>,
    pub indicator_modal_open: RwSignal<bool>,
    pub active_indicators: RwSignal<Vec<(IndicatorKind, PanePlacement)>>,
    pub bar_count: RwSignal<usize>,
    pub feed_error: RwSignal<Option<String>>,
}

static GLOBALS: OnceCell<Globals> = OnceCell::new();

pub fn globals() -> &'static Globals {
    GLOBALS.get_or_init(|| Globals {
        selected_market: create_rw_signal(None),
        current_resolution: create_rw_signal(Resolution::default()),
        indicator_modal_open: create_rw_signal(false),
        active_indicators: create_rw_signal(Vec::new()),
        bar_count: create_rw_signal(0),
        feed_error: create_rw_signal(None),
    })
}

global_signals! {
    pub selected_market => selected_market: Option<Symbol>,
    pub current_resolution => current_resolution: Resolution,
    pub indicator_modal_open => indicator_modal_open: bool,
    pub active_indicators => active_indicators: Vec<(IndicatorKind, PanePlacement)>,
    pub bar_count => bar_count: usize,
    pub feed_error => feed_error: Option<String>,
}
