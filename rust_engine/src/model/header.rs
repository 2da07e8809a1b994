//! PMX 文件头

use crate::binary::{BinaryCursor, Encoding, IndexWidth};
use crate::{MmdError, Result};

const PMX_MAGIC: &[u8; 4] = b"PMX ";

/// PMX 文件头
///
/// 六个索引宽度决定文件中之后所有变宽索引的读取方式。
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Header {
    pub version: f32,
    pub encoding: Encoding,
    /// 追加 UV 数（0~4）
    pub additional_uv_count: u8,
    pub vertex_index_width: IndexWidth,
    pub texture_index_width: IndexWidth,
    pub material_index_width: IndexWidth,
    pub bone_index_width: IndexWidth,
    pub morph_index_width: IndexWidth,
    pub rigid_body_index_width: IndexWidth,
}

impl Header {
    /// 读取魔数、版本和 globals 数组
    pub fn read(cursor: &mut BinaryCursor<'_>) -> Result<Self> {
        if cursor.remaining() < PMX_MAGIC.len() {
            return Err(MmdError::TooSmall {
                format: "PMX",
                len: cursor.len(),
            });
        }
        let magic: [u8; 4] = cursor.read_array()?;
        if &magic != PMX_MAGIC {
            return Err(MmdError::BadMagic { format: "PMX" });
        }

        let version = cursor.read_f32()?;
        if version != 2.0 && version != 2.1 {
            return Err(MmdError::UnsupportedVersion(version));
        }

        let globals_count = cursor.read_u8()? as usize;
        let globals = cursor.read_bytes(globals_count)?;
        if globals.len() < 8 {
            return Err(MmdError::InvalidHeader(format!(
                "globals array has {} bytes, expected at least 8",
                globals.len()
            )));
        }

        let additional_uv_count = globals[1];
        if additional_uv_count > 4 {
            return Err(MmdError::InvalidHeader(format!(
                "additional UV count {} exceeds 4",
                additional_uv_count
            )));
        }

        let width = |slot: usize, what: &str| {
            IndexWidth::from_byte(globals[slot]).ok_or_else(|| {
                MmdError::InvalidHeader(format!(
                    "{} index size {} is not 1, 2 or 4",
                    what, globals[slot]
                ))
            })
        };

        Ok(Self {
            version,
            encoding: Encoding::from_byte(globals[0]),
            additional_uv_count,
            vertex_index_width: width(2, "vertex")?,
            texture_index_width: width(3, "texture")?,
            material_index_width: width(4, "material")?,
            bone_index_width: width(5, "bone")?,
            morph_index_width: width(6, "morph")?,
            rigid_body_index_width: width(7, "rigid body")?,
        })
    }

    /// 六个索引宽度（顶点/纹理/材质/骨骼/Morph/刚体）
    pub fn index_widths(&self) -> [IndexWidth; 6] {
        [
            self.vertex_index_width,
            self.texture_index_width,
            self.material_index_width,
            self.bone_index_width,
            self.morph_index_width,
            self.rigid_body_index_width,
        ]
    }
}
