// crates/rubik-wasm/src/lib.rs

mod renderer;
mod shaders;
mod subscription;
mod utils;

use js_sys::Function;
use serde::{Deserialize, Serialize};
use wasm_bindgen::prelude::*;
use web_sys::HtmlCanvasElement;

use glam::Vec2;
use rubik_core::{CubeConfig, InteractionEngine, PointerResponse};
use rubik_renderer::{CameraConfig, RayPicker, ViewReset};

use renderer::Renderer;
use subscription::RotationSubscriptionManager;
use utils::console_log;

// パニック時のスタックトレース表示とログ出力の初期化
#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
    wasm_logger::init(wasm_logger::Config::new(log::Level::Info));
}

/// JSから渡される設定（すべて省略可）
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct EngineOptions {
    cube: CubeConfig,
    camera: CameraConfig,
}

impl EngineOptions {
    fn from_js(value: JsValue) -> Result<Self, JsValue> {
        if value.is_undefined() || value.is_null() {
            return Ok(Self::default());
        }
        serde_wasm_bindgen::from_value(value)
            .map_err(|e| JsValue::from_str(&format!("Invalid engine options: {}", e)))
    }
}

/// RubikEngine構造体
/// 対話エンジン（コア）とRendererを統合し、JSから操作可能なAPIを提供
///
/// ポインタ座標はCanvasのピクセル座標（canvas.width/height基準）。
/// マウスとタッチは同じハンドラを呼ぶ。
#[wasm_bindgen]
pub struct RubikEngine {
    engine: InteractionEngine,
    renderer: Renderer,
    camera_config: CameraConfig,
    view_reset: Option<ViewReset>,
    subscriptions: RotationSubscriptionManager,
}

#[wasm_bindgen]
impl RubikEngine {
    /// 新しいRubikEngineを作成（非同期）
    /// `options`: `{ cube?: CubeConfig, camera?: CameraConfig }`
    pub async fn create(canvas: HtmlCanvasElement, options: JsValue) -> Result<RubikEngine, JsValue> {
        console_log!("Creating RubikEngine...");
        let options = EngineOptions::from_js(options)?;

        let engine = InteractionEngine::new(options.cube.clone())
            .map_err(|e| JsValue::from_str(&format!("Invalid cube config: {}", e)))?;

        let renderer = Renderer::create(
            canvas,
            &options.camera,
            options.cube.cubelet_size,
            &engine.world_transforms(),
        )
        .await?;

        console_log!("RubikEngine created successfully");
        Ok(Self {
            engine,
            renderer,
            camera_config: options.camera,
            view_reset: None,
            subscriptions: RotationSubscriptionManager::new(),
        })
    }

    // ========================================================================
    // ポインタ入力
    // ========================================================================

    /// ポインタ押下。キューブを掴んだらtrue（JS側はカメラ操作を止める）
    pub fn pointer_down(&mut self, x: f32, y: f32) -> bool {
        let picker = self.picker();
        let response = self.engine.pointer_down(&picker, x, y);
        Self::trace(response);
        response.is_handled()
    }

    /// ポインタ移動
    pub fn pointer_move(&mut self, x: f32, y: f32) -> bool {
        let picker = self.picker();
        let response = self.engine.pointer_move(&picker, x, y);
        Self::trace(response);
        response.is_handled()
    }

    /// ポインタ解放
    pub fn pointer_up(&mut self) -> bool {
        self.engine.pointer_up().is_handled()
    }

    /// ポインタのキャンセル（touchcancel等）
    pub fn pointer_cancel(&mut self) -> bool {
        self.engine.pointer_cancel().is_handled()
    }

    // ========================================================================
    // カメラ操作
    // ========================================================================

    /// カメラをドラッグ量（ピクセル）だけ回転
    /// ジェスチャー・回転中は無視する
    pub fn orbit_camera(&mut self, delta_x: f32, delta_y: f32) {
        if !self.engine.orbit_enabled() {
            return;
        }
        self.view_reset = None;
        let speed = self.camera_config.orbit_speed;
        self.renderer.camera.orbit(-delta_x * speed, -delta_y * speed);
    }

    /// カメラをズーム（ホイールのdeltaY、正で遠ざかる）
    pub fn zoom_camera(&mut self, delta: f32) {
        self.view_reset = None;
        let factor = (delta * self.camera_config.zoom_speed).exp();
        self.renderer.camera.zoom(
            factor,
            self.camera_config.min_distance,
            self.camera_config.max_distance,
        );
    }

    /// カメラを初期位置へ戻すアニメーションを開始
    pub fn reset_view(&mut self) {
        self.view_reset = Some(ViewReset::new(
            self.renderer.camera.position,
            self.camera_config.home,
            self.camera_config.reset_duration_ms,
        ));
    }

    // ========================================================================
    // フレーム
    // ========================================================================

    /// フレーム更新（レンダリング含む）
    pub fn tick(&mut self, delta_ms: f32) -> Result<(), JsValue> {
        if let Some(reset) = self.view_reset.as_mut() {
            let position = reset.advance(delta_ms);
            self.renderer.camera.set_position(position);
            if reset.is_finished() {
                self.view_reset = None;
            }
        }

        if let Some(slice) = self.engine.tick(delta_ms) {
            log::info!("rotated {} on layer {}", slice.turn, slice.layer);
            self.subscriptions.notify(&slice);
        }

        self.renderer.render(&self.engine.world_transforms())
    }

    /// Canvasリサイズ
    pub fn resize(&mut self, width: u32, height: u32) {
        self.renderer.resize(width, height);
    }

    /// 幅取得
    pub fn width(&self) -> u32 {
        self.renderer.width()
    }

    /// 高さ取得
    pub fn height(&self) -> u32 {
        self.renderer.height()
    }

    // ========================================================================
    // 状態・通知
    // ========================================================================

    /// 回転確定時のコールバックを登録し、購読IDを返す
    /// コールバックは `{ axis: "x" | "y" | "z", sign: "positive" | "negative", layer }` を受け取る
    pub fn on_rotation(&mut self, callback: Function) -> u32 {
        self.subscriptions.subscribe(callback)
    }

    /// 購読を解除
    pub fn off_rotation(&mut self, subscription_id: u32) -> bool {
        self.subscriptions.unsubscribe(subscription_id)
    }

    /// 全Cubeletの状態（id, name, home, coord, position, rotation の配列）
    pub fn cubelets(&self) -> Result<JsValue, JsValue> {
        self.engine
            .registry()
            .snapshot()
            .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
            .map_err(|e| JsValue::from_str(&format!("Failed to serialize cubelets: {}", e)))
    }

    /// スライス回転中か
    pub fn is_rotating(&self) -> bool {
        self.engine.is_rotating()
    }

    /// カメラ操作が許可されているか
    pub fn orbit_enabled(&self) -> bool {
        self.engine.orbit_enabled()
    }
}

impl RubikEngine {
    /// 現在のカメラとCubeletの姿勢からピッカーを作る
    fn picker(&self) -> RayPicker {
        RayPicker::new(
            &self.renderer.camera,
            Vec2::new(self.renderer.width() as f32, self.renderer.height() as f32),
            self.engine.config().cubelet_size,
            &self.engine.world_transforms(),
        )
    }

    fn trace(response: PointerResponse) {
        if let PointerResponse::RotationStarted(slice) = response {
            log::debug!("rotation started: {} on layer {}", slice.turn, slice.layer);
        }
    }
}
