//! キューブ設定
//!
//! ジェスチャー判定・アニメーション・グリッド寸法の定数をまとめる。
//! JSからはJSON/オブジェクトで部分的に上書きできる（未指定は既定値）。

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// 1ステップの最小角度（度）。1回転あたり最大9000ティック
pub const MIN_STEP_DEGREES: f32 = 0.01;

/// 3x3x3キューブの設定
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CubeConfig {
    /// グリッド座標1単位あたりのワールド距離（隙間込み）
    pub gap: f32,
    /// Cubelet 1辺の長さ
    pub cubelet_size: f32,
    /// 掴んだ面を判定する座標のしきい値
    pub face_threshold: f32,
    /// 回転方向を確定させるドラッグ量のしきい値（ワールド単位）
    pub drag_threshold: f32,
    /// スライス抽出時の位置の許容誤差
    pub slice_epsilon: f32,
    /// 1ティックあたりの回転角度（度）
    pub step_degrees: f32,
    /// アニメーションのティック間隔（ミリ秒）
    pub tick_interval_ms: f32,
}

impl Default for CubeConfig {
    fn default() -> Self {
        Self {
            gap: 1.05,
            cubelet_size: 1.0,
            face_threshold: 1.5,
            drag_threshold: 0.3,
            slice_epsilon: 0.05,
            step_degrees: 3.0,
            tick_interval_ms: 10.0,
        }
    }
}

impl CubeConfig {
    /// JSON文字列から読み込み、検証する
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// 値の整合性を検証
    pub fn validate(&self) -> Result<(), ConfigError> {
        let fields = [
            ("gap", self.gap),
            ("cubelet_size", self.cubelet_size),
            ("face_threshold", self.face_threshold),
            ("drag_threshold", self.drag_threshold),
            ("slice_epsilon", self.slice_epsilon),
            ("step_degrees", self.step_degrees),
            ("tick_interval_ms", self.tick_interval_ms),
        ];
        for (field, value) in fields {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigError::NotPositive { field, value });
            }
        }

        if self.slice_epsilon >= self.gap * 0.5 {
            return Err(ConfigError::EpsilonTooLarge {
                epsilon: self.slice_epsilon,
                gap: self.gap,
            });
        }

        if self.step_degrees > 90.0 {
            return Err(ConfigError::StepTooLarge(self.step_degrees));
        }
        if self.step_degrees < MIN_STEP_DEGREES {
            return Err(ConfigError::StepTooSmall {
                step: self.step_degrees,
                min: MIN_STEP_DEGREES,
            });
        }

        // 外側の面の点だけがしきい値を超える
        let (inner, outer) = (self.inner_extent(), self.outer_extent());
        if !(self.face_threshold > inner && self.face_threshold < outer) {
            return Err(ConfigError::FaceThresholdOutOfRange {
                threshold: self.face_threshold,
                inner,
                outer,
            });
        }

        Ok(())
    }

    /// 外側の面の座標（中心からの距離）
    pub fn outer_extent(&self) -> f32 {
        self.gap + self.cubelet_size * 0.5
    }

    /// 外側レイヤーの内向きの面の座標
    pub fn inner_extent(&self) -> f32 {
        self.gap - self.cubelet_size * 0.5
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = CubeConfig::default();
        assert!(config.validate().is_ok());
        // 外側の面は面判定しきい値より外にある
        assert!(config.outer_extent() > config.face_threshold);
    }

    #[test]
    fn test_from_json_partial() {
        let config = CubeConfig::from_json(r#"{ "drag_threshold": 0.5 }"#).unwrap();
        assert_eq!(config.drag_threshold, 0.5);
        assert_eq!(config.gap, 1.05);
        assert_eq!(config.step_degrees, 3.0);
    }

    #[test]
    fn test_from_json_invalid_syntax() {
        let err = CubeConfig::from_json("{ gap: }").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_rejects_non_positive() {
        let config = CubeConfig {
            tick_interval_ms: 0.0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::NotPositive { field: "tick_interval_ms", .. })
        ));
    }

    #[test]
    fn test_rejects_large_epsilon() {
        let config = CubeConfig {
            slice_epsilon: 0.6,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::EpsilonTooLarge { .. })
        ));
    }

    #[test]
    fn test_rejects_large_step() {
        let config = CubeConfig {
            step_degrees: 120.0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::StepTooLarge(_))));
    }

    #[test]
    fn test_rejects_step_that_never_finishes() {
        let config = CubeConfig {
            step_degrees: 1e-30,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::StepTooSmall { .. })));

        let config = CubeConfig {
            step_degrees: MIN_STEP_DEGREES,
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_face_threshold_outside_outer_layer() {
        // 外側の面 (1.55) より外では面を掴めない
        for face_threshold in [1.6, 2.0] {
            let config = CubeConfig {
                face_threshold,
                ..Default::default()
            };
            assert!(matches!(
                config.validate(),
                Err(ConfigError::FaceThresholdOutOfRange { .. })
            ));
        }

        // 外側レイヤーの内向きの面 (0.55) 以下では隙間越しの点も拾ってしまう
        let config = CubeConfig {
            face_threshold: 0.5,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::FaceThresholdOutOfRange { .. })
        ));
    }
}
