//! 测试用二进制构造器（小端序）
//!
//! 仓库不附带样例资源，PMX/VMD 测试数据都在这里合成。

use byteorder::{LittleEndian, WriteBytesExt};

/// 小端序字节写入器
#[derive(Default)]
pub(crate) struct ByteWriter {
    bytes: Vec<u8>,
}

impl ByteWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn u8(&mut self, v: u8) -> &mut Self {
        self.bytes.write_u8(v).unwrap();
        self
    }

    pub fn u16(&mut self, v: u16) -> &mut Self {
        self.bytes.write_u16::<LittleEndian>(v).unwrap();
        self
    }

    pub fn i32(&mut self, v: i32) -> &mut Self {
        self.bytes.write_i32::<LittleEndian>(v).unwrap();
        self
    }

    pub fn u32(&mut self, v: u32) -> &mut Self {
        self.bytes.write_u32::<LittleEndian>(v).unwrap();
        self
    }

    pub fn f32(&mut self, v: f32) -> &mut Self {
        self.bytes.write_f32::<LittleEndian>(v).unwrap();
        self
    }

    pub fn floats(&mut self, values: &[f32]) -> &mut Self {
        for &v in values {
            self.f32(v);
        }
        self
    }

    pub fn raw(&mut self, data: &[u8]) -> &mut Self {
        self.bytes.extend_from_slice(data);
        self
    }

    /// 按宽度写索引；负数按补码截断，读端按有符号还是无符号解释由调用方决定
    pub fn index(&mut self, width: u8, value: i32) -> &mut Self {
        match width {
            1 => self.u8(value as u8),
            2 => self.u16(value as u16),
            _ => self.i32(value),
        }
    }

    /// 定长 Shift-JIS 字段，不足部分补 0
    pub fn sjis(&mut self, text: &str, width: usize) -> &mut Self {
        let (encoded, _, _) = encoding_rs::SHIFT_JIS.encode(text);
        let mut field = vec![0u8; width];
        let n = encoded.len().min(width);
        field[..n].copy_from_slice(&encoded[..n]);
        self.raw(&field)
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

/// PMX 构造器：写入头部后按头部声明的编码和索引宽度写字段
pub(crate) struct PmxBuilder {
    pub w: ByteWriter,
    utf8: bool,
    widths: [u8; 6],
}

impl PmxBuilder {
    /// widths 顺序：顶点/纹理/材质/骨骼/Morph/刚体
    pub fn new(utf8: bool, additional_uv_count: u8, widths: [u8; 6]) -> Self {
        let mut w = ByteWriter::new();
        w.raw(b"PMX ").f32(2.0).u8(8);
        w.u8(u8::from(utf8)).u8(additional_uv_count).raw(&widths);
        Self { w, utf8, widths }
    }

    pub fn text(&mut self, text: &str) -> &mut Self {
        let bytes: Vec<u8> = if self.utf8 {
            text.as_bytes().to_vec()
        } else {
            text.encode_utf16().flat_map(|u| u.to_le_bytes()).collect()
        };
        self.w.i32(bytes.len() as i32).raw(&bytes);
        self
    }

    /// 模型名 + 英文名 + 两个空备注
    pub fn model_info(&mut self, name: &str, name_en: &str) -> &mut Self {
        self.text(name).text(name_en).text("").text("")
    }

    /// 连续写 n 个空区段
    pub fn empty_sections(&mut self, n: usize) -> &mut Self {
        for _ in 0..n {
            self.w.i32(0);
        }
        self
    }

    pub fn vertex_index(&mut self, v: i32) -> &mut Self {
        self.w.index(self.widths[0], v);
        self
    }

    pub fn texture_index(&mut self, v: i32) -> &mut Self {
        self.w.index(self.widths[1], v);
        self
    }

    pub fn material_index(&mut self, v: i32) -> &mut Self {
        self.w.index(self.widths[2], v);
        self
    }

    pub fn bone_index(&mut self, v: i32) -> &mut Self {
        self.w.index(self.widths[3], v);
        self
    }

    pub fn morph_index(&mut self, v: i32) -> &mut Self {
        self.w.index(self.widths[4], v);
        self
    }

    pub fn rigid_body_index(&mut self, v: i32) -> &mut Self {
        self.w.index(self.widths[5], v);
        self
    }

    /// 双面、乘算 sphere、备注 "memo" 的材质
    pub fn material(&mut self, name: &str, toon_shared: u8, toon: i32, face_count: i32) -> &mut Self {
        self.text(name).text("");
        self.w.floats(&[1.0, 1.0, 1.0, 1.0]);
        self.w.floats(&[0.5, 0.5, 0.5]).f32(5.0);
        self.w.floats(&[0.2, 0.2, 0.2]);
        self.w.u8(0x01);
        self.w.floats(&[0.0, 0.0, 0.0, 1.0]).f32(1.0);
        self.texture_index(0).texture_index(-1);
        self.w.u8(1).u8(toon_shared);
        if toon_shared == 0 {
            self.texture_index(toon);
        } else {
            self.w.u8(toon as u8);
        }
        self.text("memo");
        self.w.i32(face_count);
        self
    }

    /// 刚体：胶囊，尺寸 (0.5, 1, 2)，位置 (1, 2, 3)
    pub fn rigid_body(&mut self, name: &str, bone: i32, mode: u8) -> &mut Self {
        self.text(name).text("");
        self.bone_index(bone);
        self.w.u8(0).u16(0xffff).u8(2);
        self.w.floats(&[0.5, 1.0, 2.0]);
        self.w.floats(&[1.0, 2.0, 3.0]);
        self.w.floats(&[0.0, 0.0, 0.0]);
        self.w.floats(&[1.0, 0.5, 0.5, 0.0, 0.5]);
        self.w.u8(mode);
        self
    }

    pub fn joint(&mut self, name: &str, a: i32, b: i32) -> &mut Self {
        self.text(name).text("");
        self.w.u8(0);
        self.rigid_body_index(a).rigid_body_index(b);
        self.w.floats(&[0.0; 6]);
        self.w.floats(&[-0.1, -0.2, -0.3, 0.1, 0.2, 0.3]);
        self.w.floats(&[-0.5, -0.5, -0.5, 0.5, 0.5, 0.5]);
        self.w.floats(&[0.0; 6]);
        self
    }

    pub fn finish(self) -> Vec<u8> {
        self.w.into_bytes()
    }

    /// 物理样例：45 个刚体（18 静态 / 21 动态 / 6 骨骼追随动态）、27 个关节。
    /// 静态刚体 0~8 各带一条长度为 3 的动态链，9~17 无关节。
    pub fn physics_sample() -> Vec<u8> {
        let mut pmx = PmxBuilder::new(true, 0, [4, 4, 4, 4, 4, 4]);
        pmx.model_info("physics", "");
        pmx.empty_sections(7);

        pmx.w.i32(45);
        for i in 0..18 {
            pmx.rigid_body(&format!("根{}", i), i, 0);
        }
        for i in 18..45 {
            let mode = if i < 39 { 1 } else { 2 };
            pmx.rigid_body(&format!("髪{}", i), i, mode);
        }

        pmx.w.i32(27);
        for k in 0..9 {
            let first = 18 + 3 * k;
            pmx.joint(&format!("J{}a", k), k, first);
            pmx.joint(&format!("J{}b", k), first, first + 1);
            pmx.joint(&format!("J{}c", k), first + 1, first + 2);
        }
        pmx.finish()
    }
}

/// VMD 构造器
pub(crate) struct VmdBuilder {
    pub w: ByteWriter,
}

impl VmdBuilder {
    pub fn new(model_name: &str) -> Self {
        let mut w = ByteWriter::new();
        let mut signature = [0u8; 30];
        signature[..25].copy_from_slice(b"Vocaloid Motion Data 0002");
        w.raw(&signature).sjis(model_name, 20);
        Self { w }
    }

    pub fn bone_keyframe(
        &mut self,
        name: &str,
        frame: u32,
        location: [f32; 3],
        rotation: [f32; 4],
        interpolation: &[u8; 64],
    ) -> &mut Self {
        self.w.sjis(name, 15).u32(frame);
        self.w.floats(&location).floats(&rotation).raw(interpolation);
        self
    }

    pub fn morph_keyframe(&mut self, name: &str, frame: u32, weight: f32) -> &mut Self {
        self.w.sjis(name, 15).u32(frame).f32(weight);
        self
    }

    pub fn camera_keyframe(&mut self, frame: u32, distance: f32, fov: u32, orthographic: u8) -> &mut Self {
        self.w.u32(frame).f32(distance);
        self.w.floats(&[0.0, 10.0, 0.0]).floats(&[0.1, 0.2, 0.3]);
        let mut interpolation = [0u8; 24];
        // 每组 (x1, x2, y1, y2) = (20, 107, 20, 107)
        for (i, b) in interpolation.iter_mut().enumerate() {
            *b = if i % 2 == 0 { 20 } else { 107 };
        }
        self.w.raw(&interpolation).u32(fov).u8(orthographic);
        self
    }

    pub fn count(&mut self, n: u32) -> &mut Self {
        self.w.u32(n);
        self
    }

    pub fn finish(self) -> Vec<u8> {
        self.w.into_bytes()
    }
}

/// 线性插值块（每行控制点 20, 20, 107, 107）
pub(crate) fn linear_interpolation() -> [u8; 64] {
    let mut block = [0u8; 64];
    for row in 0..4 {
        block[row * 16] = 20;
        block[row * 16 + 4] = 20;
        block[row * 16 + 8] = 107;
        block[row * 16 + 12] = 107;
    }
    block
}
