//! VMD 文件加载器
//!
//! 头部错误直接失败；各区段数据不足时记录诊断并返回已解码的部分。
//! 不做坐标转换，保留 MMD 原始数值。

use std::path::Path;

use glam::Quat;

use crate::binary::BinaryCursor;
use crate::coordinate::repair_zero_quaternion;
use crate::diagnostics::Diagnostics;
use crate::{MmdError, Result};

use super::keyframe::{
    BoneKeyframe, CameraKeyframe, IkState, MorphKeyframe, PropertyKeyframe, VmdMotion,
};

/// VMD 签名（30 字节字段的前缀）
const VMD_SIGNATURE: &[u8] = b"Vocaloid Motion Data 0002";
const SIGNATURE_FIELD: usize = 30;
const MODEL_NAME_FIELD: usize = 20;
const HEADER_SIZE: usize = SIGNATURE_FIELD + MODEL_NAME_FIELD;

const BONE_NAME_FIELD: usize = 15;
const IK_NAME_FIELD: usize = 20;

/// 各区段单条记录的字节数
const BONE_KEYFRAME_SIZE: usize = 15 + 4 + 12 + 16 + 64;
const MORPH_KEYFRAME_SIZE: usize = 15 + 4 + 4;
const CAMERA_KEYFRAME_SIZE: usize = 4 + 4 + 12 + 12 + 24 + 4 + 1;
const LIGHT_KEYFRAME_SIZE: usize = 28;
const SHADOW_KEYFRAME_SIZE: usize = 9;
const IK_STATE_SIZE: usize = IK_NAME_FIELD + 1;

/// 从 VMD 文件加载动作
pub fn load_vmd<P: AsRef<Path>>(path: P) -> Result<VmdMotion> {
    let path = path.as_ref();
    let bytes = std::fs::read(path)?;
    log::debug!("Reading VMD file {} ({} bytes)", path.display(), bytes.len());
    parse_vmd(&bytes)
}

/// 从内存解码 VMD
pub fn parse_vmd(bytes: &[u8]) -> Result<VmdMotion> {
    let mut diagnostics = Diagnostics::new();
    parse_vmd_with_diagnostics(bytes, &mut diagnostics)
}

/// 从内存解码 VMD，截断与修复事件写入 `diagnostics`
pub fn parse_vmd_with_diagnostics(bytes: &[u8], diagnostics: &mut Diagnostics) -> Result<VmdMotion> {
    if bytes.len() < HEADER_SIZE {
        return Err(MmdError::TooSmall {
            format: "VMD",
            len: bytes.len(),
        });
    }

    let mut cursor = BinaryCursor::new(bytes);
    let signature = cursor.read_bytes(SIGNATURE_FIELD)?;
    if !signature.starts_with(VMD_SIGNATURE) {
        return Err(MmdError::BadMagic { format: "VMD" });
    }
    let model_name = cursor.read_fixed_text(MODEL_NAME_FIELD)?;

    let mut reader = VmdReader {
        cursor,
        diagnostics,
    };

    let bone_keyframes = reader.fixed_section(
        "bone keyframes",
        BONE_KEYFRAME_SIZE,
        VmdReader::read_bone_keyframe,
    )?;
    let morph_keyframes = reader.fixed_section("morph keyframes", MORPH_KEYFRAME_SIZE, |r| {
        Ok(MorphKeyframe {
            morph_name: r.cursor.read_fixed_text(BONE_NAME_FIELD)?,
            frame: r.cursor.read_u32()?,
            weight: r.cursor.read_f32()?,
        })
    })?;
    let camera_keyframes = reader.fixed_section(
        "camera keyframes",
        CAMERA_KEYFRAME_SIZE,
        VmdReader::read_camera_keyframe,
    )?;
    reader.skip_section("light keyframes", LIGHT_KEYFRAME_SIZE)?;
    reader.skip_section("self shadow keyframes", SHADOW_KEYFRAME_SIZE)?;
    let property_keyframes = reader.property_section()?;

    log::info!(
        "Loaded VMD motion for '{}': {} bone, {} morph, {} camera, {} property keyframes",
        model_name,
        bone_keyframes.len(),
        morph_keyframes.len(),
        camera_keyframes.len(),
        property_keyframes.len()
    );

    Ok(VmdMotion {
        model_name,
        bone_keyframes,
        morph_keyframes,
        camera_keyframes,
        property_keyframes,
    })
}

struct VmdReader<'a, 'd> {
    cursor: BinaryCursor<'a>,
    diagnostics: &'d mut Diagnostics,
}

impl<'a, 'd> VmdReader<'a, 'd> {
    /// 区段计数；数据已耗尽（旧文件没有后续区段）时返回 None
    fn count(&mut self) -> Result<Option<usize>> {
        if !self.cursor.has_remaining(4) {
            return Ok(None);
        }
        Ok(Some(self.cursor.read_u32()? as usize))
    }

    /// 定长记录区段：每条记录读取前先检查剩余字节
    fn fixed_section<T>(
        &mut self,
        section: &'static str,
        record_size: usize,
        mut read: impl FnMut(&mut Self) -> Result<T>,
    ) -> Result<Vec<T>> {
        let Some(declared) = self.count()? else {
            return Ok(Vec::new());
        };

        let mut items = Vec::with_capacity(declared.min(self.cursor.remaining() / record_size));
        for _ in 0..declared {
            if !self.cursor.has_remaining(record_size) {
                self.diagnostics.truncated(section, items.len(), declared);
                break;
            }
            items.push(read(self)?);
        }
        log::debug!("VMD {}: {}", section, items.len());
        Ok(items)
    }

    /// 只跳过，不解码
    fn skip_section(&mut self, section: &'static str, record_size: usize) -> Result<()> {
        let Some(declared) = self.count()? else {
            return Ok(());
        };
        let wanted = declared.saturating_mul(record_size);
        let skipped = self.cursor.skip_saturating(wanted);
        if skipped < wanted {
            self.diagnostics.truncated(section, skipped / record_size, declared);
        }
        Ok(())
    }

    fn read_bone_keyframe(&mut self) -> Result<BoneKeyframe> {
        let bone_name = self.cursor.read_fixed_text(BONE_NAME_FIELD)?;
        let frame = self.cursor.read_u32()?;
        let location = self.cursor.read_vec3()?;
        let (rotation, repaired) =
            repair_zero_quaternion(Quat::from_array(self.cursor.read_f32_array()?));
        if repaired {
            self.diagnostics
                .zero_quaternion(format!("bone keyframe '{}' at frame {}", bone_name, frame));
        }
        let interpolation = self.cursor.read_array()?;
        Ok(BoneKeyframe {
            bone_name,
            frame,
            location,
            rotation,
            interpolation,
        })
    }

    fn read_camera_keyframe(&mut self) -> Result<CameraKeyframe> {
        Ok(CameraKeyframe {
            frame: self.cursor.read_u32()?,
            distance: self.cursor.read_f32()?,
            location: self.cursor.read_vec3()?,
            rotation: self.cursor.read_vec3()?,
            interpolation: self.cursor.read_array()?,
            fov: self.cursor.read_u32()?,
            orthographic: self.cursor.read_u8()? != 0,
        })
    }

    /// 属性区段记录不定长，按字段逐步检查
    fn property_section(&mut self) -> Result<Vec<PropertyKeyframe>> {
        const SECTION: &str = "property keyframes";
        let Some(declared) = self.count()? else {
            return Ok(Vec::new());
        };

        let mut items = Vec::new();
        for _ in 0..declared {
            if !self.cursor.has_remaining(4 + 1 + 4) {
                self.diagnostics.truncated(SECTION, items.len(), declared);
                break;
            }
            let frame = self.cursor.read_u32()?;
            let visible = self.cursor.read_u8()? != 0;
            let ik_count = self.cursor.read_u32()? as usize;

            let mut ik_states = Vec::with_capacity(ik_count.min(self.cursor.remaining() / IK_STATE_SIZE));
            for _ in 0..ik_count {
                if !self.cursor.has_remaining(IK_STATE_SIZE) {
                    break;
                }
                ik_states.push(IkState {
                    name: self.cursor.read_fixed_text(IK_NAME_FIELD)?,
                    enabled: self.cursor.read_u8()? != 0,
                });
            }

            // IK 列表被截断时保留已读部分，之后的记录不再可能完整
            let cut_short = ik_states.len() < ik_count;
            items.push(PropertyKeyframe {
                frame,
                visible,
                ik_states,
            });
            if cut_short {
                self.diagnostics.truncated(SECTION, items.len(), declared);
                break;
            }
        }
        log::debug!("VMD {}: {}", SECTION, items.len());
        Ok(items)
    }
}
