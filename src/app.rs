use leptos::html::Div;
use leptos::*;
use std::cell::RefCell;
use std::rc::Rc;

use crate::{
    application::{ChartConfig, ChartEngineAdapter, ChartLifecycleController, ToggleOutcome},
    domain::{
        chart::{IndicatorKind, PanePlacement},
        events::{ChartEvent, FeedEvent, InMemoryEventDispatcher},
        logging::{LogComponent, get_logger},
        market_data::Resolution,
    },
    event_utils::{WindowEventListenerHandle, on_viewport_resize},
    global_state::{
        active_indicators, bar_count, current_resolution, feed_error, indicator_modal_open,
        selected_market,
    },
    infrastructure::{
        BrowserTimeProvider, HttpBarFeed, KLineChartEngine, browser_runtime,
        theme::read_theme_tokens,
    },
};

pub type PanelController = ChartLifecycleController<KLineChartEngine, HttpBarFeed>;
pub type SharedController = Rc<RefCell<PanelController>>;

/// Wire the browser implementations into a controller. Dataset and feed
/// events are mirrored into the global signals.
pub fn build_browser_controller(config: &ChartConfig) -> SharedController {
    let events = Rc::new(InMemoryEventDispatcher::new());
    events.subscribe_to_chart_events(|event| {
        if let ChartEvent::DatasetReplaced { bar_count: count, .. } = event {
            bar_count().set(*count);
        }
    });
    events.subscribe_to_feed_events(|event| match event {
        FeedEvent::FeedFailed { error, .. } => feed_error().set(Some(error.to_string())),
        FeedEvent::BarsLoaded { .. } => feed_error().set(None),
    });

    let feed = HttpBarFeed::new(config.feed_base_url.clone()).with_events(events.clone());
    let adapter = ChartEngineAdapter::new(KLineChartEngine::factory());
    let controller = ChartLifecycleController::new(
        config.clone(),
        adapter,
        feed,
        browser_runtime(),
        Rc::new(BrowserTimeProvider::new()),
    )
    .with_events(events);
    Rc::new(RefCell::new(controller))
}

/// Push the registry state into the `active_indicators` signal.
pub fn sync_active_indicators(controller: &PanelController) {
    active_indicators().set(controller.indicators().active());
}

fn mount_chart(controller: &SharedController, grid_color_token: &str, width: Option<f64>) {
    let theme = read_theme_tokens(grid_color_token);
    let mounted = controller.borrow_mut().mount(&theme);
    match mounted {
        Ok(session) => {
            get_logger().info(
                LogComponent::Presentation("KlineChartPanel"),
                &format!("✅ Chart mounted on '{}'", session.mount_id()),
            );
            if let Some(width) = width {
                controller.borrow_mut().on_viewport_width(width);
            }
            sync_active_indicators(&controller.borrow());
        }
        Err(e) => {
            get_logger().error(
                LogComponent::Presentation("KlineChartPanel"),
                &format!("❌ Chart mount failed: {}", e),
            );
            feed_error().set(Some(e.to_string()));
        }
    }
}

/// 📈 Candlestick panel: resolution bar, indicator modal and the chart itself
#[component]
pub fn KlineChartPanel(config: ChartConfig) -> impl IntoView {
    current_resolution().set_untracked(config.default_resolution);
    let controller = build_browser_controller(&config);
    let container = create_node_ref::<Div>();
    let mount_id = config.mount_id.clone();

    // klinecharts looks the container up by id, so wait until it is attached
    {
        let controller = Rc::clone(&controller);
        let grid_color_token = config.grid_color_token.clone();
        container.on_load(move |el| {
            request_animation_frame(move || {
                let width = Some(el.client_width() as f64);
                mount_chart(&controller, &grid_color_token, width);
            });
        });
    }

    {
        let controller = Rc::clone(&controller);
        create_effect(move |_| {
            let market = selected_market().get();
            controller.borrow_mut().set_market(market);
        });
    }

    {
        let controller = Rc::clone(&controller);
        create_effect(move |_| {
            let resolution = current_resolution().get();
            controller.borrow_mut().set_resolution(resolution);
        });
    }

    let listener: Rc<RefCell<Option<WindowEventListenerHandle>>> = Rc::new(RefCell::new(None));
    {
        let controller = Rc::clone(&controller);
        let handle = on_viewport_resize(
            move || container.get_untracked().map(|el| el.client_width() as f64),
            move |width| {
                controller.borrow_mut().on_viewport_width(width);
            },
        );
        listener.replace(Some(handle));
    }

    let on_toggle = {
        let controller = Rc::clone(&controller);
        Callback::new(move |(kind, placement, enabled): (IndicatorKind, PanePlacement, bool)| {
            let outcome = controller.borrow_mut().set_indicator(kind, placement, enabled);
            if outcome != ToggleOutcome::Unchanged {
                sync_active_indicators(&controller.borrow());
            }
        })
    };

    on_cleanup(move || {
        if let Some(handle) = listener.borrow_mut().take() {
            handle.remove();
        }
        controller.borrow_mut().unmount();
        active_indicators().set(Vec::new());
    });

    let status = move || match feed_error().get() {
        Some(error) => format!("⚠️ {}", error),
        None => format!("{} bars", bar_count().get()),
    };

    view! {
        <style>
            {r#"
            .kline-panel { display: flex; flex-direction: column; height: 100%; position: relative; }
            .kline-toolbar { display: flex; align-items: center; gap: 4px; padding: 4px 8px; }
            .kline-toolbar button { background: none; border: none; color: inherit; cursor: pointer; padding: 2px 6px; }
            .kline-toolbar button.active { color: var(--primary, #f0b90b); }
            .kline-status { margin-left: auto; opacity: 0.6; font-size: 12px; }
            .kline-chart { flex: 1; min-height: 320px; }
            .indicator-modal { position: absolute; top: 36px; left: 8px; z-index: 10; padding: 12px;
                background: var(--bkg-2, #1e2329); border-radius: 6px; min-width: 240px; }
            .indicator-modal header { display: flex; justify-content: space-between; margin-bottom: 8px; }
            .indicator-switch { display: flex; justify-content: space-between; padding: 2px 0; }
            "#}
        </style>
        <div class="kline-panel">
            <div class="kline-toolbar">
                <ResolutionBar />
                <button on:click=move |_| indicator_modal_open().update(|open| *open = !*open)>
                    "Indicator"
                </button>
                <span class="kline-status">{status}</span>
            </div>
            <Show when=move || indicator_modal_open().get()>
                <IndicatorModal on_toggle=on_toggle />
            </Show>
            <div id=mount_id.clone() class="kline-chart" node_ref=container></div>
        </div>
    }
}

#[component]
fn ResolutionBar() -> impl IntoView {
    view! {
        <div class="resolution-bar">
            {Resolution::all()
                .map(|resolution| {
                    let active = move || current_resolution().get() == resolution;
                    view! {
                        <button
                            class:active=active
                            on:click=move |_| current_resolution().set(resolution)
                        >
                            {resolution.label()}
                        </button>
                    }
                })
                .collect_view()}
        </div>
    }
}

#[component]
fn IndicatorModal(on_toggle: Callback<(IndicatorKind, PanePlacement, bool)>) -> impl IntoView {
    let section = move |title: &'static str, placement: PanePlacement, kinds: Vec<IndicatorKind>| {
        view! {
            <section>
                <h4>{title}</h4>
                {kinds
                    .into_iter()
                    .map(|kind| view! { <IndicatorSwitch kind placement on_toggle /> })
                    .collect_view()}
            </section>
        }
    };

    view! {
        <div class="indicator-modal">
            <header>
                <span>"Indicator"</span>
                <button on:click=move |_| indicator_modal_open().set(false)>"×"</button>
            </header>
            {section("Main Indicator", PanePlacement::Main, IndicatorKind::main_catalog())}
            {section("Sub Indicator", PanePlacement::Sub, IndicatorKind::sub_catalog())}
        </div>
    }
}

#[component]
fn IndicatorSwitch(
    kind: IndicatorKind,
    placement: PanePlacement,
    on_toggle: Callback<(IndicatorKind, PanePlacement, bool)>,
) -> impl IntoView {
    let checked = move || active_indicators().with(|active| active.contains(&(kind, placement)));
    view! {
        <label class="indicator-switch">
            <span>{kind.to_string()}</span>
            <input
                type="checkbox"
                prop:checked=checked
                on:change=move |ev| on_toggle.call((kind, placement, event_target_checked(&ev)))
            />
        </label>
    }
}
