//! Rendererモジュール
//!
//! WebGPU/WebGL2を使用したCubeletの描画

mod depth;
mod gpu_context;
mod scene_pipeline;

pub use gpu_context::GpuContext;

use wasm_bindgen::prelude::*;
use web_sys::HtmlCanvasElement;

use crate::utils::console_log;

use rubik_core::{CubeletId, ModelUniform, Transform};
use rubik_renderer::{Camera, CameraConfig, LightUniform};

use scene_pipeline::{CubeletDraw, ScenePipeline};

/// 背景色
const CLEAR_COLOR: wgpu::Color = wgpu::Color {
    r: 0.0,
    g: 0.0,
    b: 0.0,
    a: 1.0,
};

/// Renderer構造体
pub struct Renderer {
    ctx: GpuContext,
    scene: ScenePipeline,
    cubelets: Vec<CubeletDraw>,

    // Camera
    pub camera: Camera,

    // Depth buffer
    #[allow(dead_code)]
    depth_texture: wgpu::Texture,
    depth_view: wgpu::TextureView,
}

impl Renderer {
    /// 新しいRendererを作成（非同期）
    /// `cubelets` は初期状態のTransform（Cubeletごとにメッシュを作る）
    pub async fn create(
        canvas: HtmlCanvasElement,
        camera_config: &CameraConfig,
        cubelet_size: f32,
        cubelets: &[(CubeletId, Transform)],
    ) -> Result<Renderer, JsValue> {
        let ctx = GpuContext::new(canvas).await?;

        let camera = Camera::from_config(camera_config, ctx.aspect());
        let scene = ScenePipeline::new(&ctx, &camera.uniform(), &LightUniform::default());

        let cubelets = cubelets
            .iter()
            .map(|(id, transform)| scene.create_cubelet(&ctx, *id, cubelet_size, transform))
            .collect();

        let (depth_texture, depth_view) =
            depth::create_texture(&ctx.device, ctx.width(), ctx.height());

        console_log!("Renderer initialized successfully");

        Ok(Self {
            ctx,
            scene,
            cubelets,
            camera,
            depth_texture,
            depth_view,
        })
    }

    /// Canvas サイズ変更
    pub fn resize(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.ctx.resize(width, height);

            // Depth Texture再作成
            let (depth_texture, depth_view) = depth::create_texture(&self.ctx.device, width, height);
            self.depth_texture = depth_texture;
            self.depth_view = depth_view;

            self.camera.set_aspect(self.ctx.aspect());

            log::debug!("resized to {width}x{height}");
        }
    }

    /// 現在のサイズ取得
    pub fn width(&self) -> u32 {
        self.ctx.width()
    }

    pub fn height(&self) -> u32 {
        self.ctx.height()
    }

    /// 全Cubeletを描画
    /// `transforms` はCubeletごとの現在のワールドTransform
    pub fn render(&self, transforms: &[(CubeletId, Transform)]) -> Result<(), JsValue> {
        // Uniform更新（submit前にまとめて書き込む）
        self.ctx.queue.write_buffer(
            &self.scene.camera_buffer,
            0,
            bytemuck::bytes_of(&self.camera.uniform()),
        );
        for (id, transform) in transforms {
            if let Some(draw) = self.cubelets.iter().find(|d| d.id == *id) {
                self.ctx.queue.write_buffer(
                    &draw.model_buffer,
                    0,
                    bytemuck::bytes_of(&ModelUniform::from_transform(transform)),
                );
            }
        }

        let output = self
            .ctx
            .surface
            .get_current_texture()
            .map_err(|e| JsValue::from_str(&format!("Failed to get surface texture: {:?}", e)))?;

        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Cubelet Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(CLEAR_COLOR),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            render_pass.set_pipeline(&self.scene.pipeline);
            render_pass.set_bind_group(0, &self.scene.scene_bind_group, &[]);
            for draw in &self.cubelets {
                render_pass.set_bind_group(1, &draw.model_bind_group, &[]);
                render_pass.set_vertex_buffer(0, draw.vertex_buffer.slice(..));
                render_pass.set_index_buffer(draw.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                render_pass.draw_indexed(0..draw.num_indices, 0, 0..1);
            }
        }

        self.ctx.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        Ok(())
    }
}
