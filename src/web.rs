use std::cell::RefCell;
use std::rc::Rc;
use std::sync::OnceLock;

use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::{
    Document, HtmlCanvasElement, HtmlElement, MouseEvent, Request, RequestInit, RequestMode, Response,
    WebGlRenderingContext, WheelEvent, Window,
};

use crate::config::StarMapConfig;
use crate::engine::camera::{OrbitCamera, Viewport};
use crate::engine::renderer::Renderer;
use crate::engine::scene_graph::SceneGraph;
use crate::error::StarMapError;
use crate::starmap::{StarMap, Tooltip};

const CONFIG_URL: &str = "./static/planets/starmap.json";

struct App {
    map: StarMap,
    scene: SceneGraph,
    camera: OrbitCamera,
    viewport: Viewport,
    renderer: Renderer,
}

#[wasm_bindgen]
pub async fn init_star_map() -> Result<(), JsValue> {
    init_logging_once();

    let window = web_sys::window().ok_or("No window")?;
    let document = window.document().ok_or("No document")?;
    let canvas = document.get_element_by_id("c")
        .ok_or("No canvas")?
        .dyn_into::<HtmlCanvasElement>()?;

    let gl = canvas
        .get_context("webgl")?
        .ok_or("No WebGL")?
        .dyn_into::<WebGlRenderingContext>()?;

    let config = load_config(&window).await;

    let (width, height) = window_size(&window);
    let viewport = Viewport::scaled(width, height, config.viewport_scale);
    let camera = OrbitCamera::new(&config.camera, viewport.aspect());
    let renderer = Renderer::new(gl, &config)?;
    renderer.resize(&viewport);

    let text = match fetch_text(&window, &config.dataset_url).await {
        Ok(text) => text,
        Err(e) => {
            log::error!("Error loading catalog: {}", e);
            return Ok(());
        }
    };

    let mut scene = SceneGraph::new();
    let map = StarMap::from_json(&text, config, &mut scene);

    let app = Rc::new(RefCell::new(App { map, scene, camera, viewport, renderer }));

    register_pointer_handlers(&canvas, &app)?;
    register_window_handlers(&window, &app)?;

    // Render loop
    let f = Rc::new(RefCell::new(None));
    let g = f.clone();
    let loop_app = app.clone();
    let loop_canvas = canvas.clone();

    *g.borrow_mut() = Some(Closure::wrap(Box::new(move || {
        {
            let mut guard = loop_app.borrow_mut();
            let App { map, scene, camera, renderer, .. } = &mut *guard;

            camera.update();
            map.update_frame(scene, &camera.position());
            show_tooltip(&loop_canvas, map.tooltip());
            if let Err(e) = renderer.render(scene, camera) {
                log::error!("Render failed: {:?}", e);
            }
        }
        if let Some(callback) = f.borrow().as_ref() {
            request_animation_frame(callback);
        }
    }) as Box<dyn FnMut()>));

    if let Some(callback) = g.borrow().as_ref() {
        request_animation_frame(callback);
    }

    Ok(())
}

fn register_pointer_handlers(canvas: &HtmlCanvasElement, app: &Rc<RefCell<App>>) -> Result<(), JsValue> {
    let move_app = app.clone();
    let move_canvas = canvas.clone();
    let on_move = Closure::wrap(Box::new(move |event: MouseEvent| {
        let mut guard = move_app.borrow_mut();
        let App { map, scene, camera, viewport, .. } = &mut *guard;

        camera.handle_mouse_move(event.client_x() as f32, event.client_y() as f32);
        let (x, y) = pointer_in_canvas(&move_canvas, &event, viewport);
        let tooltip = map.hover(scene, camera, viewport, x, y);
        show_tooltip(&move_canvas, tooltip);
    }) as Box<dyn FnMut(_)>);
    canvas.add_event_listener_with_callback("mousemove", on_move.as_ref().unchecked_ref())?;
    on_move.forget();

    let down_app = app.clone();
    let on_down = Closure::wrap(Box::new(move |event: MouseEvent| {
        down_app
            .borrow_mut()
            .camera
            .handle_mouse_down(event.client_x() as f32, event.client_y() as f32);
    }) as Box<dyn FnMut(_)>);
    canvas.add_event_listener_with_callback("mousedown", on_down.as_ref().unchecked_ref())?;
    on_down.forget();

    let wheel_app = app.clone();
    let on_wheel = Closure::wrap(Box::new(move |event: WheelEvent| {
        event.prevent_default();
        wheel_app.borrow_mut().camera.handle_wheel(event.delta_y() as f32);
    }) as Box<dyn FnMut(_)>);
    canvas.add_event_listener_with_callback("wheel", on_wheel.as_ref().unchecked_ref())?;
    on_wheel.forget();

    let click_app = app.clone();
    let click_canvas = canvas.clone();
    let on_click = Closure::wrap(Box::new(move |event: MouseEvent| {
        let url = {
            let mut guard = click_app.borrow_mut();
            let App { map, scene, camera, viewport, .. } = &mut *guard;
            if camera.was_dragged() {
                return;
            }
            let (x, y) = pointer_in_canvas(&click_canvas, &event, viewport);
            map.set_pointer(viewport, x, y);
            map.click(&*scene, &*camera)
        };

        if let Some(url) = url {
            log::info!("Opening {}", url);
            if let Some(window) = web_sys::window() {
                if let Err(e) = window.location().set_href(&url) {
                    log::error!("Navigation to {} failed: {:?}", url, e);
                }
            }
        }
    }) as Box<dyn FnMut(_)>);
    canvas.add_event_listener_with_callback("click", on_click.as_ref().unchecked_ref())?;
    on_click.forget();

    Ok(())
}

fn register_window_handlers(window: &Window, app: &Rc<RefCell<App>>) -> Result<(), JsValue> {
    let up_app = app.clone();
    let on_up = Closure::wrap(Box::new(move |_event: MouseEvent| {
        up_app.borrow_mut().camera.handle_mouse_up();
    }) as Box<dyn FnMut(_)>);
    window.add_event_listener_with_callback("mouseup", on_up.as_ref().unchecked_ref())?;
    on_up.forget();

    let resize_app = app.clone();
    let on_resize = Closure::wrap(Box::new(move || {
        let Some(window) = web_sys::window() else { return };
        let (width, height) = window_size(&window);

        let mut guard = resize_app.borrow_mut();
        let App { map, camera, viewport, renderer, .. } = &mut *guard;
        *viewport = map.resize(camera, width, height);
        renderer.resize(viewport);
    }) as Box<dyn FnMut()>);
    window.add_event_listener_with_callback("resize", on_resize.as_ref().unchecked_ref())?;
    on_resize.forget();

    Ok(())
}

fn request_animation_frame(f: &Closure<dyn FnMut()>) {
    let scheduled = web_sys::window()
        .ok_or_else(|| JsValue::from_str("No window"))
        .and_then(|w| w.request_animation_frame(f.as_ref().unchecked_ref()));
    if let Err(e) = scheduled {
        log::error!("requestAnimationFrame failed: {:?}", e);
    }
}

fn window_size(window: &Window) -> (f64, f64) {
    let width = window.inner_width().ok().and_then(|v| v.as_f64()).unwrap_or(0.0);
    let height = window.inner_height().ok().and_then(|v| v.as_f64()).unwrap_or(0.0);
    (width, height)
}

/// Event position in drawing-buffer pixels of the canvas.
fn pointer_in_canvas(canvas: &HtmlCanvasElement, event: &MouseEvent, viewport: &Viewport) -> (f32, f32) {
    let rect = canvas.get_bounding_client_rect();
    let mut x = event.client_x() as f64 - rect.left();
    let mut y = event.client_y() as f64 - rect.top();
    if rect.width() > 0.0 && rect.height() > 0.0 {
        x *= viewport.width as f64 / rect.width();
        y *= viewport.height as f64 / rect.height();
    }
    (x as f32, y as f32)
}

fn show_tooltip(canvas: &HtmlCanvasElement, tooltip: &Tooltip) {
    let Some(document) = web_sys::window().and_then(|w| w.document()) else { return };

    if let Some(el) = element(&document, "tooltip") {
        let style = el.style();
        if tooltip.visible {
            let rect = canvas.get_bounding_client_rect();
            style.set_property("display", "block").ok();
            style.set_property("left", &format!("{}px", rect.left() + tooltip.screen_x as f64)).ok();
            style.set_property("top", &format!("{}px", rect.top() + tooltip.screen_y as f64)).ok();
            el.set_text_content(Some(&tooltip.title));
        } else {
            style.set_property("display", "none").ok();
        }
    }

    if !tooltip.visible {
        return;
    }
    if let Some(el) = element(&document, "starhead") {
        el.set_text_content(Some(&tooltip.title));
    }
    if let Some(el) = element(&document, "starpara") {
        el.set_text_content(Some(&tooltip.body));
    }
    if let Some(el) = element(&document, "starmeta") {
        el.set_text_content(tooltip.subtitle.as_deref());
    }
}

fn element(document: &Document, id: &str) -> Option<HtmlElement> {
    document.get_element_by_id(id)?.dyn_into::<HtmlElement>().ok()
}

async fn fetch_response(window: &Window, url: &str) -> Result<Response, StarMapError> {
    let fetch_error = |e: JsValue| StarMapError::Fetch { url: url.to_string(), message: js_value_to_string(e) };

    let opts = RequestInit::new();
    opts.set_method("GET");
    opts.set_mode(RequestMode::Cors);

    let request = Request::new_with_str_and_init(url, &opts).map_err(fetch_error)?;
    let resp_value = JsFuture::from(window.fetch_with_request(&request)).await.map_err(fetch_error)?;
    let resp: Response = resp_value.dyn_into().map_err(fetch_error)?;

    if !resp.ok() {
        return Err(StarMapError::Status { url: url.to_string(), status: resp.status() });
    }
    Ok(resp)
}

async fn fetch_text(window: &Window, url: &str) -> Result<String, StarMapError> {
    let fetch_error = |e: JsValue| StarMapError::Fetch { url: url.to_string(), message: js_value_to_string(e) };

    let resp = fetch_response(window, url).await?;
    let text = JsFuture::from(resp.text().map_err(fetch_error)?).await.map_err(fetch_error)?;
    text.as_string().ok_or_else(|| StarMapError::Fetch {
        url: url.to_string(),
        message: "response body is not text".to_string(),
    })
}

async fn load_config(window: &Window) -> StarMapConfig {
    let loaded = async {
        let resp = fetch_response(window, CONFIG_URL).await?;
        let json_promise = resp.json().map_err(|e| StarMapError::InvalidConfig(js_value_to_string(e)))?;
        let json = JsFuture::from(json_promise)
            .await
            .map_err(|e| StarMapError::InvalidConfig(js_value_to_string(e)))?;
        let config: StarMapConfig = serde_wasm_bindgen::from_value(json)
            .map_err(|e| StarMapError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok::<_, StarMapError>(config)
    };

    match loaded.await {
        Ok(config) => {
            log::info!("Loaded star map configuration from {}", CONFIG_URL);
            config
        }
        Err(e) => {
            log::warn!("Using default star map configuration: {}", e);
            StarMapConfig::default()
        }
    }
}

fn init_logging_once() {
    static INIT: OnceLock<()> = OnceLock::new();
    INIT.get_or_init(|| {
        console_error_panic_hook::set_once();
        wasm_logger::init(wasm_logger::Config::new(log::Level::Info));
    });
}

fn js_value_to_string(value: JsValue) -> String {
    value.as_string().unwrap_or_else(|| format!("{value:?}"))
}
