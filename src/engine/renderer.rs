use std::collections::HashMap;

use nalgebra::{Matrix4, Point3, Vector3};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{
    CanvasRenderingContext2d, HtmlCanvasElement, HtmlImageElement, WebGlBuffer, WebGlProgram,
    WebGlRenderingContext, WebGlTexture, WebGlUniformLocation,
};

use crate::config::StarMapConfig;
use crate::engine::camera::{OrbitCamera, Viewport};
use crate::engine::mesh::{Mesh, VERTEX_STRIDE};
use crate::engine::scene_graph::SceneGraph;
use crate::starmap::{NodeKind, SpriteTexture};

const VERTEX_SHADER: &str = r#"
    attribute vec3 aPosition;
    attribute vec3 aColor;
    attribute vec2 aTexCoord;
    uniform mat4 uModelViewProjection;
    varying vec3 vColor;
    varying vec2 vTexCoord;
    void main() {
        gl_Position = uModelViewProjection * vec4(aPosition, 1.0);
        vColor = aColor;
        vTexCoord = aTexCoord;
    }
"#;

const FRAGMENT_SHADER: &str = r#"
    precision mediump float;
    varying vec3 vColor;
    varying vec2 vTexCoord;
    uniform sampler2D uTexture;
    uniform int uUseTexture;
    uniform vec3 uUniformColor;
    uniform bool uUseUniformColor;

    void main() {
        vec4 color = vec4(uUseUniformColor ? uUniformColor : vColor, 1.0);

        if (uUseTexture == 1) {
            color *= texture2D(uTexture, vTexCoord);
        }

        // Transparent sprite corners must not write depth
        if (color.a < 0.1) {
            discard;
        }

        gl_FragColor = color;
    }
"#;

const LABEL_FONT: &str = "30px Arial";
const LABEL_COLOR: &str = "orange";

struct GpuMesh {
    vertex_buffer: WebGlBuffer,
    index_buffer: WebGlBuffer,
    index_count: i32,
}

pub struct Renderer {
    pub gl: WebGlRenderingContext,
    program: WebGlProgram,
    mvp_location: WebGlUniformLocation,
    u_uniform_color_location: WebGlUniformLocation,
    u_use_uniform_color_location: WebGlUniformLocation,
    u_use_texture_location: WebGlUniformLocation,
    quad: GpuMesh,
    spheres: HashMap<u16, GpuMesh>,
    star_texture: WebGlTexture,
    planet_texture: WebGlTexture,
    label_textures: HashMap<String, WebGlTexture>,
}

impl Renderer {
    pub fn new(gl: WebGlRenderingContext, config: &StarMapConfig) -> Result<Self, JsValue> {
        let program = create_program(&gl)?;
        gl.use_program(Some(&program));

        let mvp_location = gl.get_uniform_location(&program, "uModelViewProjection")
            .ok_or("Failed to get uniform location")?;
        let u_uniform_color_location = gl.get_uniform_location(&program, "uUniformColor")
            .ok_or("Failed to get uUniformColor location")?;
        let u_use_uniform_color_location = gl.get_uniform_location(&program, "uUseUniformColor")
            .ok_or("Failed to get uUseUniformColor location")?;
        let u_use_texture_location = gl.get_uniform_location(&program, "uUseTexture")
            .ok_or("Failed to get uUseTexture location")?;

        let quad = upload_mesh(&gl, &Mesh::quad())?;
        let mut spheres = HashMap::new();
        spheres.insert(
            config.sphere_segments,
            upload_mesh(&gl, &Mesh::sphere(config.sphere_segments, 1.0, 1.0, 1.0))?,
        );

        let star_texture = create_texture(&gl, &config.star_texture)?;
        let planet_texture = create_texture(&gl, &config.planet_texture)?;

        gl.enable(WebGlRenderingContext::DEPTH_TEST);

        Ok(Renderer {
            gl,
            program,
            mvp_location,
            u_uniform_color_location,
            u_use_uniform_color_location,
            u_use_texture_location,
            quad,
            spheres,
            star_texture,
            planet_texture,
            label_textures: HashMap::new(),
        })
    }

    pub fn clear(&self, r: f32, g: f32, b: f32) {
        self.gl.clear_color(r, g, b, 1.0);
        self.gl.clear(WebGlRenderingContext::COLOR_BUFFER_BIT | WebGlRenderingContext::DEPTH_BUFFER_BIT);
    }

    pub fn enable_blend(&self) {
        self.gl.enable(WebGlRenderingContext::BLEND);
        self.gl.blend_func(WebGlRenderingContext::SRC_ALPHA, WebGlRenderingContext::ONE_MINUS_SRC_ALPHA);
    }

    pub fn disable_blend(&self) {
        self.gl.disable(WebGlRenderingContext::BLEND);
    }

    /// Resizes the drawing buffer and the GL viewport. Safe to repeat.
    pub fn resize(&self, viewport: &Viewport) {
        if let Some(canvas) = self.canvas() {
            if canvas.width() != viewport.width || canvas.height() != viewport.height {
                canvas.set_width(viewport.width);
                canvas.set_height(viewport.height);
            }
        }
        self.gl.viewport(0, 0, viewport.width as i32, viewport.height as i32);
    }

    pub fn canvas(&self) -> Option<HtmlCanvasElement> {
        self.gl.canvas().and_then(|c| c.dyn_into::<HtmlCanvasElement>().ok())
    }

    /// Draws every visible node: spheres first, then blended sprites and labels.
    pub fn render(&mut self, scene: &SceneGraph, camera: &OrbitCamera) -> Result<(), JsValue> {
        self.prepare(scene)?;

        self.clear(0.0, 0.0, 0.0);
        let view_projection = camera.view_projection();
        let eye = camera.position();

        for (_, node) in scene.iter().filter(|(_, n)| n.visible) {
            if let NodeKind::Sphere { radius, segments, color } = node.kind {
                let model = Matrix4::new_translation(&node.position) * Matrix4::new_scaling(radius);
                if let Some(mesh) = self.spheres.get(&segments) {
                    self.draw(mesh, &(view_projection * model), None, Some(color));
                }
            }
        }

        self.enable_blend();
        for (_, node) in scene.iter().filter(|(_, n)| n.visible) {
            match &node.kind {
                NodeKind::Sprite { texture, size } => {
                    let texture = match texture {
                        SpriteTexture::Star => &self.star_texture,
                        SpriteTexture::Planet => &self.planet_texture,
                    };
                    let model = billboard(&node.position, &eye, *size, *size);
                    self.draw(&self.quad, &(view_projection * model), Some(texture), None);
                }
                NodeKind::Label { text, width, height } => {
                    if let Some(texture) = self.label_textures.get(text) {
                        let model = billboard(&node.position, &eye, *width, *height);
                        self.draw(&self.quad, &(view_projection * model), Some(texture), None);
                    }
                }
                NodeKind::Sphere { .. } => {}
            }
        }
        self.disable_blend();

        Ok(())
    }

    /// Uploads sphere meshes and label textures the scene needs but the GPU lacks.
    fn prepare(&mut self, scene: &SceneGraph) -> Result<(), JsValue> {
        for (_, node) in scene.iter().filter(|(_, n)| n.visible) {
            match &node.kind {
                NodeKind::Sphere { segments, .. } if !self.spheres.contains_key(segments) => {
                    let mesh = upload_mesh(&self.gl, &Mesh::sphere(*segments, 1.0, 1.0, 1.0))?;
                    self.spheres.insert(*segments, mesh);
                }
                NodeKind::Label { text, .. } if !self.label_textures.contains_key(text) => {
                    let texture = create_text_texture(&self.gl, text)?;
                    self.label_textures.insert(text.clone(), texture);
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn draw(&self, mesh: &GpuMesh, mvp: &Matrix4<f32>, texture: Option<&WebGlTexture>, color: Option<(f32, f32, f32)>) {
        match texture {
            Some(tex) => {
                self.gl.active_texture(WebGlRenderingContext::TEXTURE0);
                self.gl.bind_texture(WebGlRenderingContext::TEXTURE_2D, Some(tex));
                self.gl.uniform1i(Some(&self.u_use_texture_location), 1);
            }
            None => self.gl.uniform1i(Some(&self.u_use_texture_location), 0),
        }
        match color {
            Some((r, g, b)) => {
                self.gl.uniform1i(Some(&self.u_use_uniform_color_location), 1);
                self.gl.uniform3f(Some(&self.u_uniform_color_location), r, g, b);
            }
            None => self.gl.uniform1i(Some(&self.u_use_uniform_color_location), 0),
        }

        self.gl.bind_buffer(WebGlRenderingContext::ARRAY_BUFFER, Some(&mesh.vertex_buffer));
        self.gl.bind_buffer(WebGlRenderingContext::ELEMENT_ARRAY_BUFFER, Some(&mesh.index_buffer));

        let stride = (VERTEX_STRIDE * std::mem::size_of::<f32>()) as i32;
        let pos_loc = self.gl.get_attrib_location(&self.program, "aPosition") as u32;
        let col_loc = self.gl.get_attrib_location(&self.program, "aColor") as u32;
        let tex_loc = self.gl.get_attrib_location(&self.program, "aTexCoord") as u32;

        self.gl.vertex_attrib_pointer_with_i32(pos_loc, 3, WebGlRenderingContext::FLOAT, false, stride, 0);
        self.gl.enable_vertex_attrib_array(pos_loc);

        self.gl.vertex_attrib_pointer_with_i32(col_loc, 3, WebGlRenderingContext::FLOAT, false, stride, 12);
        self.gl.enable_vertex_attrib_array(col_loc);

        self.gl.vertex_attrib_pointer_with_i32(tex_loc, 2, WebGlRenderingContext::FLOAT, false, stride, 24);
        self.gl.enable_vertex_attrib_array(tex_loc);

        self.gl.uniform_matrix4fv_with_f32_array(Some(&self.mvp_location), false, mvp.as_slice());

        self.gl.draw_elements_with_i32(
            WebGlRenderingContext::TRIANGLES,
            mesh.index_count,
            WebGlRenderingContext::UNSIGNED_SHORT,
            0,
        );
    }
}

/// Model matrix for a `width` x `height` quad at `position` turned toward `eye`.
fn billboard(position: &Vector3<f32>, eye: &Point3<f32>, width: f32, height: f32) -> Matrix4<f32> {
    Matrix4::face_towards(&Point3::from(*position), eye, &Vector3::y())
        * Matrix4::new_nonuniform_scaling(&Vector3::new(width, height, 1.0))
}

fn upload_mesh(gl: &WebGlRenderingContext, mesh: &Mesh) -> Result<GpuMesh, JsValue> {
    let vertex_buffer = gl.create_buffer().ok_or("Failed to create buffer")?;
    let index_buffer = gl.create_buffer().ok_or("Failed to create index buffer")?;

    gl.bind_buffer(WebGlRenderingContext::ARRAY_BUFFER, Some(&vertex_buffer));
    unsafe {
        let vert_array = js_sys::Float32Array::view(&mesh.vertices);
        gl.buffer_data_with_array_buffer_view(
            WebGlRenderingContext::ARRAY_BUFFER,
            &vert_array,
            WebGlRenderingContext::STATIC_DRAW,
        );
    }

    gl.bind_buffer(WebGlRenderingContext::ELEMENT_ARRAY_BUFFER, Some(&index_buffer));
    unsafe {
        let idx_array = js_sys::Uint16Array::view(&mesh.indices);
        gl.buffer_data_with_array_buffer_view(
            WebGlRenderingContext::ELEMENT_ARRAY_BUFFER,
            &idx_array,
            WebGlRenderingContext::STATIC_DRAW,
        );
    }

    Ok(GpuMesh { vertex_buffer, index_buffer, index_count: mesh.indices.len() as i32 })
}

/// Texture that shows a transparent pixel until the image at `url` arrives.
fn create_texture(gl: &WebGlRenderingContext, url: &str) -> Result<WebGlTexture, JsValue> {
    let texture = gl.create_texture().ok_or("Failed to create texture")?;
    gl.bind_texture(WebGlRenderingContext::TEXTURE_2D, Some(&texture));

    let pixel = [0u8, 0, 0, 0];
    gl.tex_image_2d_with_i32_and_i32_and_i32_and_format_and_type_and_opt_u8_array(
        WebGlRenderingContext::TEXTURE_2D,
        0,
        WebGlRenderingContext::RGBA as i32,
        1,
        1,
        0,
        WebGlRenderingContext::RGBA,
        WebGlRenderingContext::UNSIGNED_BYTE,
        Some(&pixel),
    )?;

    let img = HtmlImageElement::new()?;
    img.set_cross_origin(Some("anonymous"));

    let gl_clone = gl.clone();
    let texture_clone = texture.clone();
    let img_clone = img.clone();
    let url_owned = url.to_string();

    let onload = Closure::wrap(Box::new(move || {
        gl_clone.bind_texture(WebGlRenderingContext::TEXTURE_2D, Some(&texture_clone));
        let uploaded = gl_clone.tex_image_2d_with_u32_and_u32_and_image(
            WebGlRenderingContext::TEXTURE_2D,
            0,
            WebGlRenderingContext::RGBA as i32,
            WebGlRenderingContext::RGBA,
            WebGlRenderingContext::UNSIGNED_BYTE,
            &img_clone,
        );
        if let Err(e) = uploaded {
            log::error!("Failed to upload texture {}: {:?}", url_owned, e);
            return;
        }
        set_filtering(&gl_clone, img_clone.width(), img_clone.height());
    }) as Box<dyn FnMut()>);

    img.set_onload(Some(onload.as_ref().unchecked_ref()));
    onload.forget();

    img.set_src(url);

    Ok(texture)
}

/// Texture holding `text` drawn on a 2D canvas, for label billboards.
fn create_text_texture(gl: &WebGlRenderingContext, text: &str) -> Result<WebGlTexture, JsValue> {
    let document = web_sys::window()
        .and_then(|w| w.document())
        .ok_or("No document")?;
    let canvas = document.create_element("canvas")?.dyn_into::<HtmlCanvasElement>()?;
    canvas.set_width(256);
    canvas.set_height(128);

    let context = canvas
        .get_context("2d")?
        .ok_or("No 2D context")?
        .dyn_into::<CanvasRenderingContext2d>()?;
    context.set_font(LABEL_FONT);
    #[allow(deprecated)]
    context.set_fill_style(&JsValue::from_str(LABEL_COLOR));
    context.fill_text(text, 0.0, 30.0)?;

    let texture = gl.create_texture().ok_or("Failed to create texture")?;
    gl.bind_texture(WebGlRenderingContext::TEXTURE_2D, Some(&texture));
    gl.tex_image_2d_with_u32_and_u32_and_canvas(
        WebGlRenderingContext::TEXTURE_2D,
        0,
        WebGlRenderingContext::RGBA as i32,
        WebGlRenderingContext::RGBA,
        WebGlRenderingContext::UNSIGNED_BYTE,
        &canvas,
    )?;
    set_filtering(gl, canvas.width(), canvas.height());

    Ok(texture)
}

fn set_filtering(gl: &WebGlRenderingContext, width: u32, height: u32) {
    if is_power_of_2(width) && is_power_of_2(height) {
        gl.generate_mipmap(WebGlRenderingContext::TEXTURE_2D);
    } else {
        gl.tex_parameteri(WebGlRenderingContext::TEXTURE_2D, WebGlRenderingContext::TEXTURE_WRAP_S, WebGlRenderingContext::CLAMP_TO_EDGE as i32);
        gl.tex_parameteri(WebGlRenderingContext::TEXTURE_2D, WebGlRenderingContext::TEXTURE_WRAP_T, WebGlRenderingContext::CLAMP_TO_EDGE as i32);
        gl.tex_parameteri(WebGlRenderingContext::TEXTURE_2D, WebGlRenderingContext::TEXTURE_MIN_FILTER, WebGlRenderingContext::LINEAR as i32);
    }
}

fn is_power_of_2(value: u32) -> bool {
    value != 0 && (value & (value - 1)) == 0
}

fn create_program(gl: &WebGlRenderingContext) -> Result<WebGlProgram, JsValue> {
    let vert_shader = compile_shader(gl, WebGlRenderingContext::VERTEX_SHADER, VERTEX_SHADER)?;
    let frag_shader = compile_shader(gl, WebGlRenderingContext::FRAGMENT_SHADER, FRAGMENT_SHADER)?;

    let program = gl.create_program().ok_or("Unable to create program")?;
    gl.attach_shader(&program, &vert_shader);
    gl.attach_shader(&program, &frag_shader);
    gl.link_program(&program);

    if gl.get_program_parameter(&program, WebGlRenderingContext::LINK_STATUS).as_bool().unwrap_or(false) {
        Ok(program)
    } else {
        Err(JsValue::from_str(&gl.get_program_info_log(&program).unwrap_or_default()))
    }
}

fn compile_shader(gl: &WebGlRenderingContext, shader_type: u32, source: &str) -> Result<web_sys::WebGlShader, JsValue> {
    let shader = gl.create_shader(shader_type).ok_or("Unable to create shader")?;
    gl.shader_source(&shader, source);
    gl.compile_shader(&shader);

    if gl.get_shader_parameter(&shader, WebGlRenderingContext::COMPILE_STATUS).as_bool().unwrap_or(false) {
        Ok(shader)
    } else {
        Err(JsValue::from_str(&gl.get_shader_info_log(&shader).unwrap_or_default()))
    }
}
