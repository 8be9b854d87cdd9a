//! GPUコンテキストモジュール
//!
//! Canvasに結びついたDevice, Queue, Surfaceを持つ。
//! WebGPUが使えないブラウザではWebGL2にフォールバックする。

use wasm_bindgen::prelude::*;
use web_sys::HtmlCanvasElement;

use crate::utils::console_log;

fn gpu_error(what: &str, err: impl std::fmt::Debug) -> JsValue {
    JsValue::from_str(&format!("{what}: {err:?}"))
}

/// GPUコンテキスト
pub struct GpuContext {
    pub surface: wgpu::Surface<'static>,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
}

impl GpuContext {
    /// Canvasの描画バッファサイズ（canvas.width/height）で初期化
    pub async fn new(canvas: HtmlCanvasElement) -> Result<Self, JsValue> {
        let (width, height) = (canvas.width(), canvas.height());
        if width == 0 || height == 0 {
            return Err(JsValue::from_str(&format!(
                "Canvas size is invalid: {width}x{height}. Set canvas.width/height before creating the cube."
            )));
        }

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::BROWSER_WEBGPU | wgpu::Backends::GL,
            ..Default::default()
        });
        let surface = Self::canvas_surface(&instance, canvas)?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                compatible_surface: Some(&surface),
                ..Default::default()
            })
            .await
            .map_err(|e| gpu_error("No suitable GPU adapter", e))?;

        // WebGL2でも動く制限で要求する
        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("Cube Device"),
                required_limits: wgpu::Limits::downlevel_webgl2_defaults(),
                ..Default::default()
            })
            .await
            .map_err(|e| gpu_error("Failed to create device", e))?;
        console_log!("GPU ready on {:?} backend", adapter.get_info().backend);

        let config = Self::surface_config(&surface.get_capabilities(&adapter), width, height)?;
        surface.configure(&device, &config);

        Ok(Self {
            surface,
            device,
            queue,
            config,
        })
    }

    #[cfg(target_arch = "wasm32")]
    fn canvas_surface(
        instance: &wgpu::Instance,
        canvas: HtmlCanvasElement,
    ) -> Result<wgpu::Surface<'static>, JsValue> {
        instance
            .create_surface(wgpu::SurfaceTarget::Canvas(canvas))
            .map_err(|e| gpu_error("Failed to create surface", e))
    }

    #[cfg(not(target_arch = "wasm32"))]
    fn canvas_surface(
        _instance: &wgpu::Instance,
        _canvas: HtmlCanvasElement,
    ) -> Result<wgpu::Surface<'static>, JsValue> {
        Err(JsValue::from_str("Canvas surfaces require the wasm32 target"))
    }

    /// 不透明のbgra8unormを優先し、なければSurfaceの先頭候補を使う
    fn surface_config(
        caps: &wgpu::SurfaceCapabilities,
        width: u32,
        height: u32,
    ) -> Result<wgpu::SurfaceConfiguration, JsValue> {
        let format = caps
            .formats
            .iter()
            .copied()
            .find(|&f| f == wgpu::TextureFormat::Bgra8Unorm)
            .or_else(|| caps.formats.first().copied())
            .ok_or_else(|| JsValue::from_str("Surface reports no supported formats"))?;

        let alpha_mode = if caps.alpha_modes.contains(&wgpu::CompositeAlphaMode::Opaque) {
            wgpu::CompositeAlphaMode::Opaque
        } else {
            wgpu::CompositeAlphaMode::Auto
        };

        Ok(wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width,
            height,
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        })
    }

    /// リサイズ（0サイズは無視）
    pub fn resize(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.config.width = width;
            self.config.height = height;
            self.surface.configure(&self.device, &self.config);
        }
    }

    pub fn width(&self) -> u32 {
        self.config.width
    }

    pub fn height(&self) -> u32 {
        self.config.height
    }

    pub fn aspect(&self) -> f32 {
        self.config.width as f32 / self.config.height.max(1) as f32
    }
}
