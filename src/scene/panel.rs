//! Debug panel with sliders for the sun and water parameters.
//!
//! The panel is drawn as flat quads in the top right corner: one header
//! row per folder and one slider row per parameter of an open folder.
//! Clicking a header toggles its folder. Dragging a slider sets its value,
//! snapped to the step and clamped to the range, while the orbit controls
//! are suspended.
//!
//! The top left corner holds the frame rate graph: one bar per stats
//! report, newest on the right, scaled to the fastest rate seen.

use bytemuck::Zeroable;
use wgpu::util::DeviceExt;
use winit::event::{ElementState, MouseButton, WindowEvent};

use crate::{
    config::PanelConfig,
    context::{Context, InitContext},
    flow::{GraphicsFlow, Out},
    pipelines::panel::PanelVertex,
    render::{Flat, Render},
    scene::{
        SceneEvent,
        parameters::{Parameter, SceneParameters},
    },
    stats::{FpsHistory, FrameStats},
};

const BACKGROUND: [f32; 4] = [0.05, 0.05, 0.06, 0.85];
const HEADER: [f32; 4] = [0.12, 0.12, 0.14, 0.95];
const OPEN: [f32; 4] = [0.85, 0.85, 0.85, 1.0];
const CLOSED: [f32; 4] = [0.3, 0.3, 0.3, 1.0];
const TRACK: [f32; 4] = [0.2, 0.2, 0.22, 1.0];
const FILL: [f32; 4] = [0.1, 0.35, 0.8, 1.0];
const STATS_BACKGROUND: [f32; 4] = [0.0, 0.0, 0.13, 0.9];
const STATS_BAR: [f32; 4] = [0.0, 1.0, 1.0, 1.0];
/// Border between the stats box and its graph.
const STATS_INSET: f32 = 3.0;

#[derive(Clone, Debug, PartialEq)]
pub struct Slider {
    pub label: &'static str,
    pub parameter: Parameter,
    pub min: f32,
    pub max: f32,
    pub step: f32,
}

impl Slider {
    pub fn new(label: &'static str, parameter: Parameter, min: f32, max: f32, step: f32) -> Self {
        Self {
            label,
            parameter,
            min,
            max,
            step,
        }
    }

    /// Rounds to the nearest step counted from `min` and clamps to the range.
    pub fn snap(&self, value: f32) -> f32 {
        let snapped = if self.step > 0.0 {
            let steps = ((value - self.min) / self.step).round();
            // Round again in decimal space to drop float noise like 0.30000001
            let decimals = (-self.step.log10().floor()).max(0.0) as i32;
            let scale = 10f32.powi(decimals);
            ((self.min + steps * self.step) * scale).round() / scale
        } else {
            value
        };
        snapped.clamp(self.min, self.max)
    }

    /// Position of `value` along the slider in [0, 1].
    pub fn fraction(&self, value: f32) -> f32 {
        if self.max <= self.min {
            return 0.0;
        }
        ((value - self.min) / (self.max - self.min)).clamp(0.0, 1.0)
    }

    /// The snapped value at `fraction` of the slider.
    pub fn value_at(&self, fraction: f32) -> f32 {
        self.snap(self.min + fraction.clamp(0.0, 1.0) * (self.max - self.min))
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Folder {
    pub title: &'static str,
    pub open: bool,
    pub sliders: Vec<Slider>,
}

/// Axis aligned rectangle in physical pixels, origin top left.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    pub fn contains(&self, x: f32, y: f32) -> bool {
        x >= self.x && x <= self.x + self.w && y >= self.y && y <= self.y + self.h
    }

    fn inset(&self, by: f32) -> Rect {
        Rect {
            x: self.x + by,
            y: self.y + by,
            w: (self.w - 2.0 * by).max(0.0),
            h: (self.h - 2.0 * by).max(0.0),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Row {
    Header { folder: usize },
    Slider { folder: usize, slider: usize },
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PanelHit {
    Header(usize),
    Slider {
        folder: usize,
        slider: usize,
        fraction: f32,
    },
}

#[derive(Clone, Debug)]
pub struct Panel {
    pub folders: Vec<Folder>,
    /// One sample per bar, so one per pixel of graph width.
    pub stats: FpsHistory,
    config: PanelConfig,
}

impl Panel {
    pub fn new(folders: Vec<Folder>, config: PanelConfig) -> Self {
        let samples = (config.stats_size[0] - 2.0 * STATS_INSET).max(0.0) as usize;
        Self {
            folders,
            stats: FpsHistory::new(samples),
            config,
        }
    }

    /// The "Sky" and "Water" folders, both open.
    pub fn beach(config: PanelConfig) -> Self {
        Self::new(
            vec![
                Folder {
                    title: "Sky",
                    open: true,
                    sliders: vec![
                        Slider::new("elevation", Parameter::Elevation, 0.0, 90.0, 0.1),
                        Slider::new("azimuth", Parameter::Azimuth, -180.0, 180.0, 0.1),
                    ],
                },
                Folder {
                    title: "Water",
                    open: true,
                    sliders: vec![
                        Slider::new("distortionScale", Parameter::DistortionScale, 0.0, 8.0, 0.1),
                        Slider::new("size", Parameter::Size, 0.1, 10.0, 0.1),
                    ],
                },
            ],
            config,
        )
    }

    pub fn slider(&self, folder: usize, slider: usize) -> Option<&Slider> {
        self.folders.get(folder)?.sliders.get(slider)
    }

    pub fn toggle(&mut self, folder: usize) {
        if let Some(folder) = self.folders.get_mut(folder) {
            folder.open = !folder.open;
        }
    }

    /// Visible rows from top to bottom.
    pub fn rows(&self) -> Vec<Row> {
        let mut rows = Vec::new();
        for (f, folder) in self.folders.iter().enumerate() {
            rows.push(Row::Header { folder: f });
            if folder.open {
                rows.extend((0..folder.sliders.len()).map(|s| Row::Slider {
                    folder: f,
                    slider: s,
                }));
            }
        }
        rows
    }

    fn row_rect(&self, index: usize, screen_width: f32) -> Rect {
        Rect {
            x: screen_width - self.config.margin - self.config.width,
            y: self.config.margin + index as f32 * self.config.row_height,
            w: self.config.width,
            h: self.config.row_height,
        }
    }

    /// The draggable part of a slider row; the left part is reserved for the label.
    fn track_rect(&self, row: Rect) -> Rect {
        let left = row.x + row.w * 0.4;
        let right = row.x + row.w - 8.0;
        Rect {
            x: left,
            y: row.y + row.h * 0.3,
            w: (right - left).max(1.0),
            h: row.h * 0.4,
        }
    }

    pub fn bounds(&self, screen_width: f32) -> Rect {
        let rows = self.rows().len();
        Rect {
            h: rows as f32 * self.config.row_height,
            ..self.row_rect(0, screen_width)
        }
    }

    pub fn hit(&self, x: f32, y: f32, screen_width: f32) -> Option<PanelHit> {
        let rows = self.rows();
        let (index, row) = rows
            .iter()
            .enumerate()
            .find(|(i, _)| self.row_rect(*i, screen_width).contains(x, y))?;
        Some(match *row {
            Row::Header { folder } => PanelHit::Header(folder),
            Row::Slider { folder, slider } => PanelHit::Slider {
                folder,
                slider,
                fraction: self.fraction_at(x, index, screen_width),
            },
        })
    }

    fn fraction_at(&self, x: f32, row_index: usize, screen_width: f32) -> f32 {
        let track = self.track_rect(self.row_rect(row_index, screen_width));
        ((x - track.x) / track.w).clamp(0.0, 1.0)
    }

    /// Fraction of the slider `(folder, slider)` under the horizontal
    /// position `x`, wherever the pointer is vertically.
    pub fn drag_fraction(&self, folder: usize, slider: usize, x: f32, screen_width: f32) -> f32 {
        let index = self
            .rows()
            .iter()
            .position(|row| *row == Row::Slider { folder, slider })
            .unwrap_or(0);
        self.fraction_at(x, index, screen_width)
    }

    /// Upper bound for the number of quads [`geometry`](Self::geometry) emits.
    pub fn quad_capacity(&self) -> usize {
        let sliders: usize = self.folders.iter().map(|f| f.sliders.len()).sum();
        1 + 2 * self.folders.len() + 2 * sliders + 1 + self.stats.capacity()
    }

    pub fn stats_bounds(&self) -> Rect {
        Rect {
            x: self.config.margin,
            y: self.config.margin,
            w: self.config.stats_size[0],
            h: self.config.stats_size[1],
        }
    }

    /// Bars of the frame rate graph, oldest first, standing on the bottom
    /// edge of the graph area.
    pub fn stats_bars(&self) -> Vec<Rect> {
        let graph = self.stats_bounds().inset(STATS_INSET);
        let capacity = self.stats.capacity();
        if capacity == 0 {
            return Vec::new();
        }
        let bar_width = graph.w / capacity as f32;
        let first = capacity - self.stats.len();
        self.stats
            .heights()
            .enumerate()
            .map(|(i, height)| {
                let h = graph.h * height;
                Rect {
                    x: graph.x + (first + i) as f32 * bar_width,
                    y: graph.y + graph.h - h,
                    w: bar_width,
                    h,
                }
            })
            .collect()
    }

    pub fn geometry(
        &self,
        parameters: &SceneParameters,
        screen_width: f32,
        screen_height: f32,
    ) -> (Vec<PanelVertex>, Vec<u16>) {
        let mut quads = Quads::new(screen_width, screen_height);
        quads.push(self.bounds(screen_width), BACKGROUND);
        for (index, row) in self.rows().into_iter().enumerate() {
            let rect = self.row_rect(index, screen_width);
            match row {
                Row::Header { folder } => {
                    let open = self.folders.get(folder).is_some_and(|f| f.open);
                    quads.push(rect.inset(1.0), HEADER);
                    let size = rect.h * 0.4;
                    let marker = Rect {
                        x: rect.x + 8.0,
                        y: rect.y + (rect.h - size) / 2.0,
                        w: size,
                        h: size,
                    };
                    quads.push(marker, if open { OPEN } else { CLOSED });
                }
                Row::Slider { folder, slider } => {
                    let Some(s) = self.slider(folder, slider) else {
                        continue;
                    };
                    let track = self.track_rect(rect);
                    let fraction = s.fraction(parameters.get(s.parameter));
                    quads.push(track, TRACK);
                    quads.push(
                        Rect {
                            w: track.w * fraction,
                            ..track
                        },
                        FILL,
                    );
                }
            }
        }
        quads.push(self.stats_bounds(), STATS_BACKGROUND);
        for bar in self.stats_bars() {
            quads.push(bar, STATS_BAR);
        }
        (quads.vertices, quads.indices)
    }
}

struct Quads {
    width: f32,
    height: f32,
    vertices: Vec<PanelVertex>,
    indices: Vec<u16>,
}

impl Quads {
    fn new(width: f32, height: f32) -> Self {
        Self {
            width: width.max(1.0),
            height: height.max(1.0),
            vertices: Vec::new(),
            indices: Vec::new(),
        }
    }

    fn push(&mut self, rect: Rect, colour: [f32; 4]) {
        let to_ndc = |x: f32, y: f32| [x / self.width * 2.0 - 1.0, 1.0 - y / self.height * 2.0];
        let base = self.vertices.len() as u16;
        for (x, y) in [
            (rect.x, rect.y),
            (rect.x, rect.y + rect.h),
            (rect.x + rect.w, rect.y + rect.h),
            (rect.x + rect.w, rect.y),
        ] {
            self.vertices.push(PanelVertex {
                position: to_ndc(x, y),
                colour,
            });
        }
        self.indices
            .extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }
}

/// The panel as a flow: owns the GPU buffers and routes pointer input.
pub struct DebugPanel {
    panel: Panel,
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    num_indices: usize,
    screen: (f32, f32),
    cursor: Option<(f32, f32)>,
    dragging: Option<(usize, usize)>,
    pressed_on_panel: bool,
    dirty: bool,
    frames: FrameStats,
}

impl DebugPanel {
    pub fn new(ctx: InitContext, config: &PanelConfig) -> Self {
        let panel = Panel::beach(config.clone());
        let quads = panel.quad_capacity();
        let vertex_buffer = ctx.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Panel Vertex Buffer"),
            contents: bytemuck::cast_slice(&vec![PanelVertex::zeroed(); quads * 4]),
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        });
        let index_buffer = ctx.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Panel Index Buffer"),
            contents: bytemuck::cast_slice(&vec![0u16; quads * 6]),
            usage: wgpu::BufferUsages::INDEX | wgpu::BufferUsages::COPY_DST,
        });
        Self {
            panel,
            vertex_buffer,
            index_buffer,
            num_indices: 0,
            screen: (1.0, 1.0),
            cursor: None,
            dragging: None,
            pressed_on_panel: false,
            dirty: true,
            frames: FrameStats::default(),
        }
    }

    fn set_value(&mut self, state: &mut SceneParameters, folder: usize, slider: usize, fraction: f32) {
        let Some(slider) = self.panel.slider(folder, slider) else {
            return;
        };
        let value = slider.value_at(fraction);
        if state.get(slider.parameter) != value {
            state.set(slider.parameter, value);
            log::debug!("{} = {}", slider.label, value);
            self.dirty = true;
        }
    }
}

fn suspend_orbit(suspended: bool) -> Out<SceneEvent> {
    Out::Configure(Box::new(move |ctx: &mut Context| {
        ctx.camera.controller.set_suspended(suspended)
    }))
}

impl GraphicsFlow<SceneParameters, SceneEvent> for DebugPanel {
    fn on_init(&mut self, ctx: &mut Context, _: &mut SceneParameters) -> Out<SceneEvent> {
        self.screen = (ctx.config.width as f32, ctx.config.height as f32);
        self.dirty = true;
        Out::Empty
    }

    fn on_update(
        &mut self,
        ctx: &Context,
        state: &mut SceneParameters,
        dt: instant::Duration,
    ) -> Out<SceneEvent> {
        self.frames.record(dt);
        if self.dirty {
            let (vertices, indices) = self.panel.geometry(state, self.screen.0, self.screen.1);
            ctx.queue
                .write_buffer(&self.vertex_buffer, 0, bytemuck::cast_slice(&vertices));
            ctx.queue
                .write_buffer(&self.index_buffer, 0, bytemuck::cast_slice(&indices));
            self.num_indices = indices.len();
            self.dirty = false;
        }
        Out::Empty
    }

    fn on_tick(&mut self, _: &Context, _: &mut SceneParameters) -> Out<SceneEvent> {
        if let Some(report) = self.frames.take() {
            log::debug!(
                "{} frames, {:.1} fps, mean {:.2} ms, slowest {:.2} ms",
                report.frames,
                report.fps,
                report.mean_frame_ms,
                report.slowest_frame_ms
            );
            self.panel.stats.push(report.fps);
            self.dirty = true;
        }
        Out::Empty
    }

    fn on_window_events(
        &mut self,
        _: &Context,
        state: &mut SceneParameters,
        event: &WindowEvent,
    ) -> Out<SceneEvent> {
        match event {
            WindowEvent::Resized(size) => {
                self.screen = (size.width as f32, size.height as f32);
                self.dirty = true;
                Out::Empty
            }
            WindowEvent::CursorMoved { position, .. } => {
                let (x, y) = (position.x as f32, position.y as f32);
                self.cursor = Some((x, y));
                if let Some((folder, slider)) = self.dragging {
                    let fraction = self.panel.drag_fraction(folder, slider, x, self.screen.0);
                    self.set_value(state, folder, slider, fraction);
                }
                Out::Empty
            }
            WindowEvent::MouseInput {
                state: ElementState::Pressed,
                button: MouseButton::Left,
                ..
            } => {
                let Some(hit) = self
                    .cursor
                    .and_then(|(x, y)| self.panel.hit(x, y, self.screen.0))
                else {
                    return Out::Empty;
                };
                match hit {
                    PanelHit::Header(folder) => {
                        self.panel.toggle(folder);
                        self.dirty = true;
                    }
                    PanelHit::Slider {
                        folder,
                        slider,
                        fraction,
                    } => {
                        self.dragging = Some((folder, slider));
                        self.set_value(state, folder, slider, fraction);
                    }
                }
                self.pressed_on_panel = true;
                suspend_orbit(true)
            }
            WindowEvent::MouseInput {
                state: ElementState::Released,
                button: MouseButton::Left,
                ..
            } if self.pressed_on_panel => {
                self.dragging = None;
                self.pressed_on_panel = false;
                suspend_orbit(false)
            }
            _ => Out::Empty,
        }
    }

    fn on_custom_events(
        &mut self,
        _: &Context,
        _: &mut SceneParameters,
        event: SceneEvent,
    ) -> Option<SceneEvent> {
        Some(event)
    }

    fn on_render<'pass>(&self) -> Render<'_, 'pass> {
        Render::Panel(Flat {
            vertex: &self.vertex_buffer,
            index: &self.index_buffer,
            amount: self.num_indices,
        })
    }

    #[cfg(feature = "integration-tests")]
    fn render_to_texture(
        &self,
        _: &Context,
        _: &mut SceneParameters,
        _: &mut image::RgbaImage,
    ) -> Result<crate::flow::ImageTestResult, anyhow::Error> {
        Ok(crate::flow::ImageTestResult::Passed)
    }
}
