//! DOM-backed collaborators

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use glam::{IVec2, Vec2};
use rand::SeedableRng;
use rand_pcg::Pcg32;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{Document, Element, HtmlElement, HtmlImageElement};

use crate::config::{ControlSize, EvasionConfig, Visual};
use crate::consts::{BURST_LIFETIME_MS, BURST_PARTICLES, PULSE_MS};
use crate::evasion::{
    Celebration, Control, EvasionController, Rect, Renderer, Scheduler, Size, Task, Viewport,
};

/// The controller as mounted on a page
pub type Page = EvasionController<DomStage, TimeoutScheduler, Pcg32>;

const HEARTS: [&str; 8] = ["💕", "💖", "💗", "💓", "❤️", "🩷", "💘", "🐦"];

/// Run `f` once after `delay_ms`
fn set_timeout(delay_ms: u32, f: impl FnOnce() + 'static) {
    let Some(window) = web_sys::window() else {
        return;
    };
    let callback = Closure::once_into_js(f);
    if window
        .set_timeout_with_callback_and_timeout_and_arguments_0(
            callback.unchecked_ref(),
            delay_ms.min(i32::MAX as u32) as i32,
        )
        .is_err()
    {
        log::warn!("setTimeout failed; task dropped");
    }
}

fn css(el: &HtmlElement, props: &[(&str, &str)]) {
    let style = el.style();
    for (name, value) in props {
        let _ = style.set_property(name, value);
    }
}

/// Cosmetic randomness only; placement uses the seeded generator
fn rand_unit() -> f64 {
    js_sys::Math::random()
}

fn html(el: Option<Element>) -> Option<HtmlElement> {
    el.and_then(|e| e.dyn_into::<HtmlElement>().ok())
}

/// Delivers tasks back to the page through `setTimeout`
pub struct TimeoutScheduler {
    page: Weak<RefCell<Page>>,
}

impl Scheduler for TimeoutScheduler {
    fn schedule(&mut self, delay_ms: u32, task: Task) {
        let page = self.page.clone();
        set_timeout(delay_ms, move || {
            let Some(page) = page.upgrade() else {
                return;
            };
            match page.try_borrow_mut() {
                Ok(mut page) => page.on_task(task),
                Err(_) => log::warn!("Page busy, {:?} dropped", task),
            };
        });
    }
}

/// Element handles for the proposal page
pub struct DomStage {
    document: Document,
    no_button: Option<HtmlElement>,
    yes_button: Option<HtmlElement>,
    visual: Option<HtmlImageElement>,
    prompt: Option<HtmlElement>,
    container: Option<HtmlElement>,
}

impl DomStage {
    /// Look up the page elements. Missing ones are tolerated.
    pub fn from_document(document: Document) -> Self {
        let by_id = |id: &str| html(document.get_element_by_id(id));
        let stage = Self {
            no_button: by_id("noButton"),
            yes_button: by_id("yesButton"),
            visual: document
                .get_element_by_id("gifDisplay")
                .and_then(|e| e.dyn_into::<HtmlImageElement>().ok()),
            prompt: by_id("questionText"),
            container: html(document.query_selector(".button-container").ok().flatten()),
            document,
        };
        if stage.no_button.is_none() {
            log::warn!("No button not found - evasion disabled");
        }
        log::info!("DOM elements cached");
        stage
    }

    pub fn no_button(&self) -> Option<&HtmlElement> {
        self.no_button.as_ref()
    }

    pub fn yes_button(&self) -> Option<&HtmlElement> {
        self.yes_button.as_ref()
    }

    fn element(&self, control: Control) -> Option<&HtmlElement> {
        match control {
            Control::Yes => self.yes_button.as_ref(),
            Control::No => self.no_button.as_ref(),
        }
    }
}

impl Renderer for DomStage {
    fn set_text(&mut self, control: Control, text: &str) {
        if let Some(el) = self.element(control) {
            el.set_text_content(Some(text));
        }
    }

    fn set_visual(&mut self, visual: &Visual) {
        if let Some(img) = &self.visual {
            // A broken image shows its alt text
            img.set_alt(&visual.fallback);
            img.set_src(&visual.src);
        }
    }

    fn set_size(&mut self, control: Control, size: ControlSize) {
        if let Some(el) = self.element(control) {
            css(
                el,
                &[
                    ("width", format!("{}px", size.width).as_str()),
                    ("height", format!("{}px", size.height).as_str()),
                    ("font-size", format!("{}px", size.font_size).as_str()),
                ],
            );
        }
    }

    fn set_position(&mut self, control: Control, pos: IVec2, transition_ms: u32) {
        if let Some(el) = self.element(control) {
            let _ = el.class_list().add_1("moving");
            css(
                el,
                &[
                    ("position", "fixed"),
                    (
                        "transition",
                        format!(
                            "left {transition_ms}ms cubic-bezier(0.25, 0.46, 0.45, 0.94), \
                             top {transition_ms}ms cubic-bezier(0.25, 0.46, 0.45, 0.94)"
                        ).as_str(),
                    ),
                    ("left", format!("{}px", pos.x).as_str()),
                    ("top", format!("{}px", pos.y).as_str()),
                    ("z-index", "1000"),
                ],
            );
        }
    }

    fn set_prompt(&mut self, text: &str) {
        if let Some(el) = &self.prompt {
            el.set_text_content(Some(text));
        }
    }

    fn pulse(&mut self, control: Control) {
        if let Some(el) = self.element(control) {
            let _ = el.class_list().add_1("pulse");
            let el = el.clone();
            set_timeout(PULSE_MS, move || {
                let _ = el.class_list().remove_1("pulse");
            });
        }
    }

    fn freeze(&mut self, control: Control) {
        if let Some(el) = self.element(control) {
            css(
                el,
                &[
                    ("transition", "all 0.5s ease-out"),
                    ("transform", "scale(0) rotate(720deg)"),
                    ("opacity", "0"),
                    ("pointer-events", "none"),
                ],
            );
        }
    }

    fn emphasize(&mut self, control: Control, scale: f32) {
        if let Some(el) = self.element(control) {
            css(el, &[("transform", format!("scale({scale})").as_str())]);
            let _ = el.class_list().add_1("glow-animation");
        }
    }

    fn remove(&mut self, control: Control) {
        let el = match control {
            Control::Yes => self.yes_button.take(),
            Control::No => self.no_button.take(),
        };
        if let Some(el) = el {
            el.remove();
        }
    }

    fn replace_with_message(&mut self, _control: Control, text: &str) {
        let Some(container) = &self.container else {
            return;
        };
        let Some(message) = html(self.document.create_element("div").ok()) else {
            return;
        };
        message.set_class_name("no-more-no-message");
        message.set_text_content(Some(text));
        let _ = container.append_child(&message);
    }

    fn hide_controls(&mut self) {
        if let Some(container) = &self.container {
            css(container, &[("display", "none")]);
        }
    }

    fn rect(&self, control: Control) -> Option<Rect> {
        let r = self.element(control)?.get_bounding_client_rect();
        Some(Rect::new(
            r.left() as f32,
            r.top() as f32,
            r.right() as f32,
            r.bottom() as f32,
        ))
    }
}

impl Viewport for DomStage {
    fn bounds(&self) -> Size {
        // documentElement excludes scrollbars, unlike innerWidth
        self.document
            .document_element()
            .map(|root| Size::new(root.client_width() as f32, root.client_height() as f32))
            .unwrap_or_default()
    }

    fn is_touch(&self) -> bool {
        web_sys::window()
            .map(|w| w.navigator().max_touch_points() > 0)
            .unwrap_or(false)
    }
}

impl Celebration for DomStage {
    fn trigger(&mut self, origin: Vec2) {
        let Some(body) = self.document.body() else {
            return;
        };
        let step = 360.0 / BURST_PARTICLES as f32;
        for i in 0..BURST_PARTICLES {
            let Some(heart) = html(self.document.create_element("div").ok()) else {
                continue;
            };
            let pick = (rand_unit() * HEARTS.len() as f64) as usize;
            heart.set_class_name("explosion-heart");
            heart.set_text_content(Some(HEARTS[pick.min(HEARTS.len() - 1)]));
            css(
                &heart,
                &[
                    ("position", "fixed"),
                    ("left", format!("{}px", origin.x).as_str()),
                    ("top", format!("{}px", origin.y).as_str()),
                    ("font-size", format!("{}px", 20.0 + rand_unit() * 20.0).as_str()),
                    ("pointer-events", "none"),
                    ("z-index", "10000"),
                    ("animation", "heartExplode 1s ease-out forwards"),
                    ("--angle", format!("{}deg", step * i as f32).as_str()),
                    ("--distance", format!("{}px", 100.0 + rand_unit() * 100.0).as_str()),
                ],
            );
            let _ = body.append_child(&heart);
            set_timeout(BURST_LIFETIME_MS, move || heart.remove());
        }
    }
}

/// Build the controller for `document`
pub fn mount(document: Document, config: EvasionConfig, seed: u64) -> Rc<RefCell<Page>> {
    let stage = DomStage::from_document(document);
    let rng = Pcg32::seed_from_u64(seed);
    Rc::new_cyclic(|weak| {
        let scheduler = TimeoutScheduler { page: weak.clone() };
        RefCell::new(EvasionController::new(config, stage, scheduler, rng))
    })
}
