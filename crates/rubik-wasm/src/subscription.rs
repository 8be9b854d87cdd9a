//! 回転通知の購読管理モジュール
//!
//! スライス回転が確定するたびに、登録されたJSコールバックを呼び出す

use std::collections::BTreeMap;

use js_sys::Function;
use serde::Serialize;
use wasm_bindgen::JsValue;

use rubik_core::SliceTurn;

/// 購読マネージャー
/// 呼び出し順は登録順（IDの昇順）
pub struct RotationSubscriptionManager {
    subscriptions: BTreeMap<u32, Function>,
    next_id: u32,
}

impl RotationSubscriptionManager {
    pub fn new() -> Self {
        Self {
            subscriptions: BTreeMap::new(),
            next_id: 1,
        }
    }

    pub fn subscribe(&mut self, callback: Function) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        self.subscriptions.insert(id, callback);
        id
    }

    pub fn unsubscribe(&mut self, id: u32) -> bool {
        self.subscriptions.remove(&id).is_some()
    }

    /// 確定した回転を `{ axis, sign, layer }` として全購読者に通知
    /// コールバック内の例外はログに出して握りつぶす
    pub fn notify(&self, slice: &SliceTurn) {
        if self.subscriptions.is_empty() {
            return;
        }

        // flattenした構造体はMapとして出力されるため、プレーンなオブジェクトに揃える
        let payload = match slice.serialize(&serde_wasm_bindgen::Serializer::json_compatible()) {
            Ok(value) => value,
            Err(err) => {
                log::warn!("failed to serialize rotation {}: {err}", slice.turn);
                return;
            }
        };

        for (id, callback) in &self.subscriptions {
            if let Err(err) = callback.call1(&JsValue::NULL, &payload) {
                log::warn!("rotation callback {id} threw: {err:?}");
            }
        }
    }
}

impl Default for RotationSubscriptionManager {
    fn default() -> Self {
        Self::new()
    }
}
