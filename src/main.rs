//! Be Mine entry point
//!
//! Handles platform-specific initialization and wires page events to the
//! evasion controller.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_page {
    use std::cell::RefCell;
    use std::rc::Rc;
    use wasm_bindgen::prelude::*;
    use web_sys::{Document, MouseEvent};

    use be_mine::PageConfig;
    use be_mine::plan::{AcceptanceRecorder, MemoryPlanStore, PlanStore};
    use be_mine::platform::web::{self, Page};

    const CONFIG_ELEMENT_ID: &str = "be-mine-config";

    thread_local! {
        static PLANS: RefCell<MemoryPlanStore> = RefCell::new(MemoryPlanStore::new());
    }

    /// Current plan as JSON, for the follow-up pages
    #[wasm_bindgen]
    pub fn plan_json() -> String {
        PLANS.with(|store| store.borrow().load().to_json())
    }

    /// Page config from the inline JSON block, or the defaults
    fn load_config(document: &Document) -> PageConfig {
        let Some(json) = document
            .get_element_by_id(CONFIG_ELEMENT_ID)
            .and_then(|el| el.text_content())
        else {
            log::info!("No inline config, using defaults");
            return PageConfig::default();
        };
        match PageConfig::from_json(&json) {
            Ok(config) => config,
            Err(e) => {
                log::warn!("Invalid config ({e}), using defaults");
                PageConfig::default()
            }
        }
    }

    pub fn run() {
        console_error_panic_hook::set_once();
        console_log::init_with_level(log::Level::Info).expect("Failed to init logger");

        log::info!("Be Mine starting...");

        let window = web_sys::window().expect("no window");
        let document = window.document().expect("no document");

        let config = load_config(&document);
        if let Some(question) = document.get_element_by_id("questionText") {
            question.set_text_content(Some(&config.question));
        }

        let seed = js_sys::Date::now() as u64;
        log::info!("Seed: {}", seed);

        let page = web::mount(document, config.evasion, seed);
        page.borrow_mut().start();

        setup_no_button(page.clone());
        setup_yes_button(page.clone());
        setup_resize(page);
    }

    fn setup_no_button(page: Rc<RefCell<Page>>) {
        let Some(btn) = page.borrow().stage().no_button().cloned() else {
            return;
        };

        // Click (or tap) escalates
        {
            let page = page.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: MouseEvent| {
                event.prevent_default();
                event.stop_propagation();
                if let Ok(mut p) = page.try_borrow_mut() {
                    p.on_activate();
                }
            });
            let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        {
            let page = page.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: MouseEvent| {
                if let Ok(mut p) = page.try_borrow_mut() {
                    p.on_pointer_enter();
                }
            });
            let _ = btn
                .add_event_listener_with_callback("mouseenter", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: MouseEvent| {
                if let Ok(mut p) = page.try_borrow_mut() {
                    p.on_pointer_leave();
                }
            });
            let _ = btn
                .add_event_listener_with_callback("mouseleave", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn setup_yes_button(page: Rc<RefCell<Page>>) {
        let Some(btn) = page.borrow().stage().yes_button().cloned() else {
            log::warn!("Yes button not found");
            return;
        };

        let closure = Closure::<dyn FnMut(_)>::new(move |_event: MouseEvent| {
            let Ok(mut p) = page.try_borrow_mut() else {
                return;
            };
            let accepted = PLANS.with(|store| {
                let mut store = store.borrow_mut();
                let mut recorder = AcceptanceRecorder::new(&mut *store, js_sys::Date::now());
                p.on_accept(&mut recorder)
            });
            if accepted {
                log::info!("Plan: {}", plan_json());
            }
        });
        let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn setup_resize(page: Rc<RefCell<Page>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
            if let Ok(mut p) = page.try_borrow_mut() {
                p.on_resize();
            }
        });
        let _ = window.add_event_listener_with_callback("resize", closure.as_ref().unchecked_ref());
        closure.forget();
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() {
    wasm_page::run();
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Be Mine (native) starting...");
    log::info!("Native mode runs a scripted session - run with `trunk serve` for the web version");

    scripted_session();
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

/// Chase the control to the end on a headless page and print what happened
#[cfg(not(target_arch = "wasm32"))]
fn scripted_session() {
    use be_mine::evasion::{ScriptedStage, Size, VirtualClock};
    use be_mine::plan::{AcceptanceRecorder, MemoryPlanStore, PlanStore};
    use be_mine::{EvasionController, PageConfig, summary};
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    let config = PageConfig::default();
    let stage = ScriptedStage::new(Size::new(1280.0, 800.0));
    let mut page = EvasionController::new(
        config.evasion.clone(),
        stage,
        VirtualClock::new(),
        Pcg32::seed_from_u64(14),
    );
    page.start();

    page.on_pointer_enter();
    page.advance_clock(1_000);
    page.on_pointer_leave();

    while !page.state().is_terminal {
        page.on_activate();
        page.advance_clock(400);
        println!("  no #{:>2}: {:?}", page.state().attempt_count, page.state().phase());
    }

    page.stage_mut().set_bounds(Size::new(700.0, 500.0));
    page.on_resize();
    page.advance_clock(2_500);

    let mut store = MemoryPlanStore::new();
    let accepted = page.on_accept(&mut AcceptanceRecorder::new(&mut store, 0.0));
    println!("accepted: {accepted}, control: {:?}", page.no_control());
    println!("{} commands issued", page.stage().commands().len());

    store.update(|p| p.set_date("2026-02-14"));
    let plan = store.load();
    for line in summary::summary_lines(&plan, &config, None) {
        println!("  {line}");
    }
    if let Some(left) = summary::countdown(&plan, chrono::Utc::now()) {
        println!("countdown: {left:?}");
    }
    println!("plan: {}", plan.to_json());
}
