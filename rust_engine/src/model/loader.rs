//! PMX 模型加载器
//!
//! 按文件顺序一次性解码九个区段；任何截断或未知标签都直接失败，
//! 不返回不完整的模型。

use std::path::Path;

use glam::{Quat, Vec3};

use crate::binary::{BinaryCursor, IndexWidth};
use crate::coordinate::{
    convert_position, convert_quaternion, convert_rotation, repair_zero_quaternion,
    reverse_winding,
};
use crate::diagnostics::Diagnostics;
use crate::morph::{
    BoneMorphOffset, GroupMorphOffset, MaterialMorphOffset, MaterialMorphOperation, Morph,
    MorphCategory, MorphOffsets, MorphType, UvMorphOffset, VertexMorphOffset,
};
use crate::physics::{Joint, JointMode, RigidBody, RigidMode, RigidShape};
use crate::skeleton::{
    AngleLimit, AppendTransform, Bone, BoneFlags, DisplayConnection, IkConfig, IkLink, LocalAxis,
};
use crate::{MmdError, Result};

use super::{
    DisplayFrame, DisplayItem, Header, Material, MaterialFlags, Model, SphereMode, Texture, Toon,
    Vertex, VertexWeight,
};

/// 从 PMX 文件加载模型
pub fn load_pmx<P: AsRef<Path>>(path: P) -> Result<Model> {
    let path = path.as_ref();
    let bytes = std::fs::read(path)?;
    log::debug!("Reading PMX file {} ({} bytes)", path.display(), bytes.len());
    parse_pmx(&bytes)
}

/// 从内存解码 PMX
pub fn parse_pmx(bytes: &[u8]) -> Result<Model> {
    let mut diagnostics = Diagnostics::new();
    parse_pmx_with_diagnostics(bytes, &mut diagnostics)
}

/// 从内存解码 PMX，可恢复事件写入 `diagnostics`
pub fn parse_pmx_with_diagnostics(bytes: &[u8], diagnostics: &mut Diagnostics) -> Result<Model> {
    let mut cursor = BinaryCursor::new(bytes);
    let header = Header::read(&mut cursor)?;
    let mut reader = PmxReader { cursor, header };

    let name = reader.text()?;
    let name_en = reader.text()?;
    let comment = reader.text()?;
    let comment_en = reader.text()?;

    let vertices = reader.section("vertices", PmxReader::read_vertex)?;

    let index_count = reader.count("faces")?;
    if index_count % 3 != 0 {
        return Err(MmdError::InvalidData(format!(
            "face index count {} is not a multiple of 3",
            index_count
        )));
    }
    let mut faces = Vec::with_capacity(reader.capacity_hint(index_count / 3));
    for _ in 0..index_count / 3 {
        let face = [
            reader.vertex_index()?,
            reader.vertex_index()?,
            reader.vertex_index()?,
        ];
        faces.push(reverse_winding(face));
    }
    log::debug!("PMX faces: {} triangles", faces.len());

    let textures = reader.section("textures", |r| Ok(Texture { path: r.text()? }))?;
    let materials = reader.section("materials", PmxReader::read_material)?;
    let bones = reader.section("bones", PmxReader::read_bone)?;
    let morphs = reader.section("morphs", |r| r.read_morph(diagnostics))?;
    let display_frames = reader.section("display frames", PmxReader::read_display_frame)?;
    let rigid_bodies = reader.section("rigid bodies", PmxReader::read_rigid_body)?;
    let joints = reader.section("joints", PmxReader::read_joint)?;

    if reader.cursor.has_remaining(1) {
        log::debug!(
            "PMX has {} trailing bytes after joints",
            reader.cursor.remaining()
        );
    }

    log::info!(
        "Loaded PMX {:.1} model '{}': {} vertices, {} faces, {} materials, {} bones, {} morphs, {} rigid bodies, {} joints",
        header.version,
        name,
        vertices.len(),
        faces.len(),
        materials.len(),
        bones.len(),
        morphs.len(),
        rigid_bodies.len(),
        joints.len()
    );

    Ok(Model {
        header,
        name,
        name_en,
        comment,
        comment_en,
        vertices,
        faces,
        textures,
        materials,
        bones,
        morphs,
        display_frames,
        rigid_bodies,
        joints,
    })
}

/// 游标 + 头部：按头部声明的编码和索引宽度读取
struct PmxReader<'a> {
    cursor: BinaryCursor<'a>,
    header: Header,
}

impl<'a> PmxReader<'a> {
    /// 读取区段计数，负数视为数据错误
    fn count(&mut self, section: &str) -> Result<usize> {
        let count = self.cursor.read_i32()?;
        usize::try_from(count).map_err(|_| {
            MmdError::InvalidData(format!("negative {} count: {}", section, count))
        })
    }

    /// 预分配上限：每条记录至少占一个字节
    fn capacity_hint(&self, count: usize) -> usize {
        count.min(self.cursor.remaining())
    }

    fn section<T>(
        &mut self,
        name: &str,
        mut read: impl FnMut(&mut Self) -> Result<T>,
    ) -> Result<Vec<T>> {
        let count = self.count(name)?;
        let mut items = Vec::with_capacity(self.capacity_hint(count));
        for _ in 0..count {
            items.push(read(self)?);
        }
        log::debug!("PMX {}: {}", name, items.len());
        Ok(items)
    }

    fn text(&mut self) -> Result<String> {
        self.cursor.read_text(self.header.encoding)
    }

    fn signed_index(&mut self, width: IndexWidth) -> Result<i32> {
        self.cursor.read_signed_index(width)
    }

    fn vertex_index(&mut self) -> Result<u32> {
        self.cursor.read_unsigned_index(self.header.vertex_index_width)
    }

    fn texture_index(&mut self) -> Result<i32> {
        self.signed_index(self.header.texture_index_width)
    }

    fn material_index(&mut self) -> Result<i32> {
        self.signed_index(self.header.material_index_width)
    }

    fn bone_index(&mut self) -> Result<i32> {
        self.signed_index(self.header.bone_index_width)
    }

    fn morph_index(&mut self) -> Result<i32> {
        self.signed_index(self.header.morph_index_width)
    }

    fn rigid_body_index(&mut self) -> Result<i32> {
        self.signed_index(self.header.rigid_body_index_width)
    }

    fn position(&mut self) -> Result<Vec3> {
        self.cursor.read_vec3().map(convert_position)
    }

    fn rotation(&mut self) -> Result<Vec3> {
        self.cursor.read_vec3().map(convert_rotation)
    }

    fn read_vertex(&mut self) -> Result<Vertex> {
        let position = self.position()?;
        let normal = self.position()?;
        let uv = self.cursor.read_vec2()?;
        let mut additional_uvs = Vec::with_capacity(self.header.additional_uv_count as usize);
        for _ in 0..self.header.additional_uv_count {
            additional_uvs.push(self.cursor.read_vec4()?);
        }

        let weight = match self.cursor.read_u8()? {
            0 => VertexWeight::Bdef1 {
                bone: self.bone_index()?,
            },
            1 => {
                let bones = [self.bone_index()?, self.bone_index()?];
                VertexWeight::Bdef2 {
                    bones,
                    weight: self.cursor.read_f32()?,
                }
            }
            2 => {
                let bones = self.four_bones()?;
                VertexWeight::Bdef4 {
                    bones,
                    weights: self.cursor.read_f32_array()?,
                }
            }
            3 => {
                let bones = [self.bone_index()?, self.bone_index()?];
                let weight = self.cursor.read_f32()?;
                VertexWeight::Sdef {
                    bones,
                    weight,
                    c: self.position()?,
                    r0: self.position()?,
                    r1: self.position()?,
                }
            }
            4 => {
                let bones = self.four_bones()?;
                VertexWeight::Qdef {
                    bones,
                    weights: self.cursor.read_f32_array()?,
                }
            }
            other => return Err(MmdError::unknown_tag("weight type", other)),
        };

        Ok(Vertex {
            position,
            normal,
            uv,
            additional_uvs,
            weight,
            edge_scale: self.cursor.read_f32()?,
        })
    }

    fn four_bones(&mut self) -> Result<[i32; 4]> {
        Ok([
            self.bone_index()?,
            self.bone_index()?,
            self.bone_index()?,
            self.bone_index()?,
        ])
    }

    fn read_material(&mut self) -> Result<Material> {
        let name = self.text()?;
        let name_en = self.text()?;
        let diffuse = self.cursor.read_vec4()?;
        let specular = self.cursor.read_vec3()?;
        let specular_strength = self.cursor.read_f32()?;
        let ambient = self.cursor.read_vec3()?;
        let flags = MaterialFlags(self.cursor.read_u8()?);
        let edge_color = self.cursor.read_vec4()?;
        let edge_size = self.cursor.read_f32()?;
        let texture_index = self.texture_index()?;
        let sphere_texture_index = self.texture_index()?;
        let sphere_mode = SphereMode::from_u8(self.cursor.read_u8()?)?;
        // 共享标志：0 → 独立纹理索引，非 0 → 内置 toon 编号（1 字节）
        let toon = match self.cursor.read_u8()? {
            0 => Toon::Texture(self.texture_index()?),
            _ => Toon::Shared(self.cursor.read_u8()?),
        };
        let comment = self.text()?;
        let face_count = self.cursor.read_i32()?;
        let face_count = u32::try_from(face_count).map_err(|_| {
            MmdError::InvalidData(format!(
                "material '{}' has negative face count {}",
                name, face_count
            ))
        })?;

        Ok(Material {
            name,
            name_en,
            diffuse,
            specular,
            specular_strength,
            ambient,
            flags,
            edge_color,
            edge_size,
            texture_index,
            sphere_texture_index,
            sphere_mode,
            toon,
            comment,
            face_count,
        })
    }

    /// 标志字决定之后哪些子记录存在，必须先读
    fn read_bone(&mut self) -> Result<Bone> {
        let mut bone = Bone::new(self.text()?);
        bone.name_en = self.text()?;
        bone.position = self.position()?;
        bone.parent_index = self.bone_index()?;
        bone.transform_level = self.cursor.read_i32()?;
        bone.flags = BoneFlags(self.cursor.read_u16()?);
        let flags = bone.flags;

        bone.display_connection = if flags.tail_is_bone() {
            DisplayConnection::Bone(self.bone_index()?)
        } else {
            DisplayConnection::Offset(self.position()?)
        };

        if flags.has_append() {
            bone.append = Some(AppendTransform {
                parent: self.bone_index()?,
                rate: self.cursor.read_f32()?,
            });
        }

        if flags.has_fixed_axis() {
            bone.fixed_axis = Some(self.position()?);
        }

        if flags.has_local_axis() {
            bone.local_axis = Some(LocalAxis {
                x: self.position()?,
                z: self.position()?,
            });
        }

        if flags.has_external_parent() {
            bone.external_parent = Some(self.cursor.read_i32()?);
        }

        if flags.is_ik() {
            bone.ik = Some(self.read_ik()?);
        }

        Ok(bone)
    }

    fn read_ik(&mut self) -> Result<IkConfig> {
        let target_bone = self.bone_index()?;
        let iterations = self.cursor.read_i32()?;
        let limit_angle = self.cursor.read_f32()?;
        let link_count = self.count("IK links")?;

        let mut links = Vec::with_capacity(self.capacity_hint(link_count));
        for _ in 0..link_count {
            let bone_index = self.bone_index()?;
            let limits = if self.cursor.read_u8()? != 0 {
                Some(AngleLimit {
                    min: self.rotation()?,
                    max: self.rotation()?,
                })
            } else {
                None
            };
            links.push(IkLink { bone_index, limits });
        }

        Ok(IkConfig {
            target_bone,
            iterations,
            limit_angle,
            links,
        })
    }

    /// 类型标签在偏移数之前，每个 Morph 的偏移形状由类型唯一确定
    fn read_morph(&mut self, diagnostics: &mut Diagnostics) -> Result<Morph> {
        let name = self.text()?;
        let name_en = self.text()?;
        let category = MorphCategory::from_u8(self.cursor.read_u8()?)?;
        let morph_type = MorphType::from_u8(self.cursor.read_u8()?)?;
        let count = self.count("morph offsets")?;
        let capacity = self.capacity_hint(count);

        let offsets = match morph_type {
            MorphType::Group => {
                let mut offsets = Vec::with_capacity(capacity);
                for _ in 0..count {
                    offsets.push(GroupMorphOffset {
                        morph_index: self.morph_index()?,
                        factor: self.cursor.read_f32()?,
                    });
                }
                MorphOffsets::Group(offsets)
            }
            MorphType::Vertex => {
                let mut offsets = Vec::with_capacity(capacity);
                for _ in 0..count {
                    offsets.push(VertexMorphOffset {
                        vertex_index: self.vertex_index()?,
                        offset: self.position()?,
                    });
                }
                MorphOffsets::Vertex(offsets)
            }
            MorphType::Bone => {
                let mut offsets = Vec::with_capacity(capacity);
                for i in 0..count {
                    let bone_index = self.bone_index()?;
                    let translation = self.position()?;
                    let (rotation, repaired) =
                        repair_zero_quaternion(Quat::from_array(self.cursor.read_f32_array()?));
                    if repaired {
                        diagnostics.zero_quaternion(format!("bone morph '{}' offset {}", name, i));
                    }
                    offsets.push(BoneMorphOffset {
                        bone_index,
                        translation,
                        rotation: convert_quaternion(rotation),
                    });
                }
                MorphOffsets::Bone(offsets)
            }
            MorphType::Uv
            | MorphType::AdditionalUv1
            | MorphType::AdditionalUv2
            | MorphType::AdditionalUv3
            | MorphType::AdditionalUv4 => {
                let mut offsets = Vec::with_capacity(capacity);
                for _ in 0..count {
                    offsets.push(UvMorphOffset {
                        vertex_index: self.vertex_index()?,
                        offset: self.cursor.read_vec4()?,
                    });
                }
                MorphOffsets::Uv(offsets)
            }
            MorphType::Material => {
                let mut offsets = Vec::with_capacity(capacity);
                for _ in 0..count {
                    offsets.push(self.read_material_morph_offset()?);
                }
                MorphOffsets::Material(offsets)
            }
        };

        Ok(Morph {
            name,
            name_en,
            category,
            morph_type,
            offsets,
        })
    }

    fn read_material_morph_offset(&mut self) -> Result<MaterialMorphOffset> {
        let material_index = self.material_index()?;
        let operation = match self.cursor.read_u8()? {
            0 => MaterialMorphOperation::Multiply,
            1 => MaterialMorphOperation::Add,
            other => return Err(MmdError::unknown_tag("material morph operation", other)),
        };
        Ok(MaterialMorphOffset {
            material_index,
            operation,
            diffuse: self.cursor.read_vec4()?,
            specular: self.cursor.read_vec3()?,
            specular_strength: self.cursor.read_f32()?,
            ambient: self.cursor.read_vec3()?,
            edge_color: self.cursor.read_vec4()?,
            edge_size: self.cursor.read_f32()?,
            texture_tint: self.cursor.read_vec4()?,
            environment_tint: self.cursor.read_vec4()?,
            toon_tint: self.cursor.read_vec4()?,
        })
    }

    fn read_display_frame(&mut self) -> Result<DisplayFrame> {
        let name = self.text()?;
        let name_en = self.text()?;
        let is_special = self.cursor.read_u8()? != 0;
        let count = self.count("display items")?;
        let mut items = Vec::with_capacity(self.capacity_hint(count));
        for _ in 0..count {
            let item = match self.cursor.read_u8()? {
                0 => DisplayItem::Bone(self.bone_index()?),
                _ => DisplayItem::Morph(self.morph_index()?),
            };
            items.push(item);
        }
        Ok(DisplayFrame {
            name,
            name_en,
            is_special,
            items,
        })
    }

    fn read_rigid_body(&mut self) -> Result<RigidBody> {
        Ok(RigidBody {
            name: self.text()?,
            name_en: self.text()?,
            bone_index: self.bone_index()?,
            group: self.cursor.read_u8()?,
            collision_mask: self.cursor.read_u16()?,
            shape: RigidShape::from_u8(self.cursor.read_u8()?)?,
            // 形状尺寸不是空间向量，保持原样
            size: self.cursor.read_vec3()?,
            position: self.position()?,
            rotation: self.rotation()?,
            mass: self.cursor.read_f32()?,
            linear_damping: self.cursor.read_f32()?,
            angular_damping: self.cursor.read_f32()?,
            restitution: self.cursor.read_f32()?,
            friction: self.cursor.read_f32()?,
            mode: RigidMode::from_u8(self.cursor.read_u8()?)?,
        })
    }

    fn read_joint(&mut self) -> Result<Joint> {
        Ok(Joint {
            name: self.text()?,
            name_en: self.text()?,
            mode: JointMode::from_u8(self.cursor.read_u8()?)?,
            rigid_body_a: self.rigid_body_index()?,
            rigid_body_b: self.rigid_body_index()?,
            position: self.position()?,
            rotation: self.rotation()?,
            linear_lower: self.position()?,
            linear_upper: self.position()?,
            angular_lower: self.rotation()?,
            angular_upper: self.rotation()?,
            linear_spring: self.position()?,
            angular_spring: self.rotation()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::DiagnosticKind;
    use crate::physics::detect_chains;
    use crate::test_util::{PmxBuilder, ByteWriter};
    use glam::{Vec2, Vec4};
    use std::io::Write;

    const WIDE: [u8; 6] = [4, 4, 4, 4, 4, 4];
    const NARROW: [u8; 6] = [1, 1, 1, 2, 1, 1];

    fn approx(a: Vec3, b: Vec3) -> bool {
        (a - b).length() < 1e-6
    }

    #[test]
    fn test_empty_model() {
        let mut pmx = PmxBuilder::new(true, 0, WIDE);
        pmx.model_info("空", "empty");
        pmx.empty_sections(9);
        let model = parse_pmx(&pmx.finish()).unwrap();
        assert_eq!(model.name, "空");
        assert_eq!(model.name_en, "empty");
        assert_eq!(model.comment, "");
        assert!(model.vertices.is_empty());
        assert!(model.faces.is_empty());
        assert!(model.joints.is_empty());
        assert_eq!(model.header.encoding, crate::binary::Encoding::Utf8);
    }

    #[test]
    fn test_utf16_names() {
        let mut pmx = PmxBuilder::new(false, 0, WIDE);
        pmx.model_info("初音ミク", "Hatsune Miku");
        pmx.empty_sections(9);
        let model = parse_pmx(&pmx.finish()).unwrap();
        assert_eq!(model.name, "初音ミク");
        assert_eq!(model.name_en, "Hatsune Miku");
    }

    #[test]
    fn test_vertices_all_weight_types() {
        let mut pmx = PmxBuilder::new(true, 1, NARROW);
        pmx.model_info("v", "");
        pmx.w.i32(5);
        for tag in 0u8..5 {
            pmx.w.floats(&[1.0, 2.0, 3.0]); // position
            pmx.w.floats(&[0.0, 1.0, 0.0]); // normal
            pmx.w.floats(&[0.25, 0.75]);
            pmx.w.floats(&[1.0, 2.0, 3.0, 4.0]);
            pmx.w.u8(tag);
            match tag {
                0 => {
                    pmx.bone_index(7);
                }
                1 => {
                    pmx.bone_index(1).bone_index(2);
                    pmx.w.f32(0.25);
                }
                3 => {
                    pmx.bone_index(1).bone_index(2);
                    pmx.w.f32(0.5);
                    pmx.w.floats(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0]);
                }
                _ => {
                    pmx.bone_index(0).bone_index(1).bone_index(2).bone_index(-1);
                    pmx.w.floats(&[0.4, 0.3, 0.2, 0.1]);
                }
            }
            pmx.w.f32(1.0);
        }
        pmx.empty_sections(8);
        let model = parse_pmx(&pmx.finish()).unwrap();

        assert_eq!(model.vertices.len(), 5);
        let v = &model.vertices[0];
        assert_eq!(v.position, Vec3::new(1.0, 3.0, 2.0));
        assert_eq!(v.normal, Vec3::new(0.0, 0.0, 1.0));
        assert_eq!(v.uv, Vec2::new(0.25, 0.75));
        assert_eq!(v.additional_uvs, vec![Vec4::new(1.0, 2.0, 3.0, 4.0)]);
        assert_eq!(v.weight, VertexWeight::Bdef1 { bone: 7 });
        assert_eq!(v.edge_scale, 1.0);

        let pairs = model.vertices[1].weight.bone_weights();
        assert_eq!(pairs, vec![(1, 0.25), (2, 0.75)]);

        assert!(matches!(
            model.vertices[2].weight,
            VertexWeight::Bdef4 { bones: [0, 1, 2, -1], .. }
        ));
        match &model.vertices[3].weight {
            VertexWeight::Sdef { c, r0, r1, weight, .. } => {
                assert_eq!(*weight, 0.5);
                assert_eq!(*c, Vec3::new(1.0, 3.0, 2.0));
                assert_eq!(*r0, Vec3::new(4.0, 6.0, 5.0));
                assert_eq!(*r1, Vec3::new(7.0, 9.0, 8.0));
            }
            other => panic!("expected SDEF, got {:?}", other),
        }
        assert_eq!(model.vertices[4].weight.type_tag(), 4);
    }

    #[test]
    fn test_unknown_weight_type() {
        let mut pmx = PmxBuilder::new(true, 0, WIDE);
        pmx.model_info("v", "");
        pmx.w.i32(1);
        pmx.w.floats(&[0.0; 8]);
        pmx.w.u8(5);
        let err = parse_pmx(&pmx.finish()).unwrap_err();
        assert!(matches!(
            err,
            MmdError::UnknownTag { kind: "weight type", value: 5 }
        ));
    }

    #[test]
    fn test_faces_reversed_and_material_counts() {
        let mut pmx = PmxBuilder::new(true, 0, [2, 1, 1, 1, 1, 1]);
        pmx.model_info("f", "");
        pmx.w.i32(0); // vertices
        pmx.w.i32(6);
        for index in [0, 1, 2, 2, 1, 40000] {
            pmx.vertex_index(index);
        }
        pmx.w.i32(1);
        pmx.text("tex/body.png");
        pmx.w.i32(2);
        pmx.material("body", 0, 0, 3);
        pmx.material("face", 1, 5, 3);
        pmx.empty_sections(5);
        let model = parse_pmx(&pmx.finish()).unwrap();

        assert_eq!(model.faces, vec![[2, 1, 0], [40000, 1, 2]]);
        assert_eq!(model.textures[0].path, "tex/body.png");
        assert_eq!(model.material_index_total(), 3 * model.faces.len() as u64);
        assert_eq!(model.material_face_ranges(), vec![(0, 1), (1, 1)]);

        let body = &model.materials[0];
        assert_eq!(body.name, "body");
        assert_eq!(body.toon, Toon::Texture(0));
        assert_eq!(body.sphere_mode, SphereMode::Multiply);
        assert!(body.flags.is_double_sided());
        assert_eq!(body.comment, "memo");
        assert_eq!(model.materials[1].toon, Toon::Shared(5));
        assert_eq!(
            model.materials[1].toon.shared_file_name().as_deref(),
            Some("toon06.bmp")
        );
    }

    #[test]
    fn test_face_count_not_multiple_of_three() {
        let mut pmx = PmxBuilder::new(true, 0, WIDE);
        pmx.model_info("f", "");
        pmx.w.i32(0);
        pmx.w.i32(4);
        let err = parse_pmx(&pmx.finish()).unwrap_err();
        assert!(matches!(err, MmdError::InvalidData(_)));
    }

    #[test]
    fn test_bone_flag_gated_fields() {
        let mut pmx = PmxBuilder::new(true, 0, NARROW);
        pmx.model_info("b", "");
        pmx.empty_sections(4);
        pmx.w.i32(3);

        // 0: 根骨骼，偏移连接
        pmx.text("センター").text("center");
        pmx.w.floats(&[0.0, 8.0, 0.5]);
        pmx.bone_index(-1);
        pmx.w.i32(0);
        pmx.w.u16(0x0002 | 0x0004 | 0x0008 | 0x0010);
        pmx.w.floats(&[0.0, -1.0, 0.0]);

        // 1: 骨骼连接 + 付与 + 固定轴 + 本地轴 + 外部父
        pmx.text("左足").text("leg_L");
        pmx.w.floats(&[1.0, 2.0, 3.0]);
        pmx.bone_index(0);
        pmx.w.i32(1);
        pmx.w.u16(0x0001 | 0x0100 | 0x0400 | 0x0800 | 0x2000);
        pmx.bone_index(2);
        pmx.bone_index(0);
        pmx.w.f32(0.5);
        pmx.w.floats(&[1.0, 0.0, 0.0]);
        pmx.w.floats(&[1.0, 0.0, 0.0, 0.0, 0.0, 1.0]);
        pmx.w.i32(42);

        // 2: IK
        pmx.text("左足ＩＫ").text("leg IK_L");
        pmx.w.floats(&[1.0, 0.0, 0.0]);
        pmx.bone_index(-1);
        pmx.w.i32(0);
        pmx.w.u16(0x0001 | 0x0020);
        pmx.bone_index(-1);
        pmx.bone_index(1); // target
        pmx.w.i32(40);
        pmx.w.f32(2.0);
        pmx.w.i32(2);
        pmx.bone_index(1);
        pmx.w.u8(1);
        pmx.w.floats(&[-3.14, 0.0, 0.1, -0.5, 0.0, 0.2]);
        pmx.bone_index(0);
        pmx.w.u8(0);

        pmx.empty_sections(4);
        let model = parse_pmx(&pmx.finish()).unwrap();
        let bones = &model.bones;

        assert!(bones[0].is_root());
        assert_eq!(bones[0].position, Vec3::new(0.0, 0.5, 8.0));
        assert_eq!(
            bones[0].display_connection,
            DisplayConnection::Offset(Vec3::new(0.0, 0.0, -1.0))
        );
        assert!(bones[0].append.is_none());

        let leg = &bones[1];
        assert_eq!(leg.parent_index, 0);
        assert_eq!(leg.display_connection, DisplayConnection::Bone(2));
        assert_eq!(leg.append, Some(AppendTransform { parent: 0, rate: 0.5 }));
        assert_eq!(leg.fixed_axis, Some(Vec3::X));
        assert_eq!(
            leg.local_axis,
            Some(LocalAxis { x: Vec3::X, z: Vec3::new(0.0, 1.0, 0.0) })
        );
        assert_eq!(leg.external_parent, Some(42));
        assert!(leg.ik.is_none());

        let ik = bones[2].ik.as_ref().unwrap();
        assert_eq!(ik.target_bone, 1);
        assert_eq!(ik.iterations, 40);
        assert_eq!(ik.links.len(), 2);
        let limits = ik.links[0].limits.unwrap();
        assert!(approx(limits.min, Vec3::new(-3.14, 0.1, 0.0)));
        assert!(approx(limits.max, Vec3::new(-0.5, 0.2, 0.0)));
        assert!(!ik.links[1].has_limits());
        assert_eq!(ik.links_on_target(), vec![0]);
        assert_eq!(model.find_bone_by_name("左足ＩＫ"), Some(2));
    }

    #[test]
    fn test_morphs() {
        let mut pmx = PmxBuilder::new(true, 0, NARROW);
        pmx.model_info("m", "");
        pmx.empty_sections(5);
        pmx.w.i32(4);

        pmx.text("あ").text("a");
        pmx.w.u8(3).u8(1).i32(1);
        pmx.vertex_index(200);
        pmx.w.floats(&[0.0, 1.0, 2.0]);

        pmx.text("ウインク").text("wink");
        pmx.w.u8(2).u8(0).i32(2);
        pmx.morph_index(0);
        pmx.w.f32(0.5);
        pmx.morph_index(3);
        pmx.w.f32(1.0);

        pmx.text("首振り").text("");
        pmx.w.u8(4).u8(2).i32(2);
        pmx.bone_index(0);
        pmx.w.floats(&[1.0, 2.0, 3.0, 0.1, 0.2, 0.3, 0.9]);
        pmx.bone_index(1);
        pmx.w.floats(&[0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0]);

        pmx.text("照明").text("");
        pmx.w.u8(4).u8(8).i32(1);
        pmx.material_index(-1);
        pmx.w.u8(1);
        pmx.w.floats(&[0.5; 28]);

        pmx.empty_sections(3);
        let mut diagnostics = Diagnostics::new();
        let model = parse_pmx_with_diagnostics(&pmx.finish(), &mut diagnostics).unwrap();

        match &model.morphs[0].offsets {
            MorphOffsets::Vertex(offsets) => {
                assert_eq!(offsets[0].vertex_index, 200);
                assert_eq!(offsets[0].offset, Vec3::new(0.0, 2.0, 1.0));
            }
            other => panic!("expected vertex offsets, got {:?}", other),
        }
        assert_eq!(model.morphs[0].category, MorphCategory::Mouth);
        assert_eq!(model.morphs[1].referenced_morphs(), vec![0, 3]);

        match &model.morphs[2].offsets {
            MorphOffsets::Bone(offsets) => {
                assert_eq!(offsets[0].translation, Vec3::new(1.0, 3.0, 2.0));
                let q = offsets[0].rotation;
                assert!((q.x - 0.1).abs() < 1e-6);
                assert!((q.y - 0.3).abs() < 1e-6);
                assert!((q.z + 0.2).abs() < 1e-6);
                assert!((q.w - 0.9).abs() < 1e-6);
                assert_eq!(offsets[1].rotation, Quat::IDENTITY);
            }
            other => panic!("expected bone offsets, got {:?}", other),
        }
        assert_eq!(diagnostics.len(), 1);
        assert!(matches!(
            diagnostics.entries()[0].kind,
            DiagnosticKind::ZeroQuaternionRepaired { .. }
        ));

        match &model.morphs[3].offsets {
            MorphOffsets::Material(offsets) => {
                assert!(offsets[0].targets_all_materials());
                assert_eq!(offsets[0].operation, MaterialMorphOperation::Add);
                assert_eq!(offsets[0].toon_tint, Vec4::splat(0.5));
            }
            other => panic!("expected material offsets, got {:?}", other),
        }
        assert_eq!(model.find_morph_by_name("照明"), Some(3));
    }

    #[test]
    fn test_unsupported_morph_type() {
        let mut pmx = PmxBuilder::new(true, 0, WIDE);
        pmx.model_info("m", "");
        pmx.empty_sections(5);
        pmx.w.i32(1);
        pmx.text("flip").text("");
        pmx.w.u8(4).u8(9).i32(0);
        let err = parse_pmx(&pmx.finish()).unwrap_err();
        assert!(matches!(err, MmdError::UnknownTag { kind: "morph type", value: 9 }));
    }

    #[test]
    fn test_display_frames() {
        let mut pmx = PmxBuilder::new(true, 0, NARROW);
        pmx.model_info("d", "");
        pmx.empty_sections(6);
        pmx.w.i32(1);
        pmx.text("Root").text("Root");
        pmx.w.u8(1).i32(2);
        pmx.w.u8(0);
        pmx.bone_index(0);
        pmx.w.u8(1);
        pmx.morph_index(4);
        pmx.empty_sections(2);
        let model = parse_pmx(&pmx.finish()).unwrap();
        let frame = &model.display_frames[0];
        assert!(frame.is_special);
        assert_eq!(frame.items, vec![DisplayItem::Bone(0), DisplayItem::Morph(4)]);
    }

    #[test]
    fn test_truncated_pmx_is_fatal() {
        let mut pmx = PmxBuilder::new(true, 0, WIDE);
        pmx.model_info("t", "");
        pmx.w.i32(2);
        pmx.w.floats(&[0.0; 4]);
        let err = parse_pmx(&pmx.finish()).unwrap_err();
        assert!(err.is_truncation());
    }

    #[test]
    fn test_negative_count() {
        let mut pmx = PmxBuilder::new(true, 0, WIDE);
        pmx.model_info("n", "");
        pmx.w.i32(-1);
        assert!(matches!(
            parse_pmx(&pmx.finish()).unwrap_err(),
            MmdError::InvalidData(_)
        ));
    }

    #[test]
    fn test_bad_magic_and_version() {
        let mut w = ByteWriter::new();
        w.raw(b"PMD ").f32(2.0);
        assert!(matches!(
            parse_pmx(&w.into_bytes()).unwrap_err(),
            MmdError::BadMagic { format: "PMX" }
        ));

        let mut w = ByteWriter::new();
        w.raw(b"PMX ").f32(3.0);
        assert!(matches!(
            parse_pmx(&w.into_bytes()).unwrap_err(),
            MmdError::UnsupportedVersion(_)
        ));
    }

    #[test]
    fn test_physics_sample_counts_and_chains() {
        let bytes = PmxBuilder::physics_sample();
        let model = parse_pmx(&bytes).unwrap();

        assert_eq!(model.rigid_bodies.len(), 45);
        assert_eq!(model.joints.len(), 27);
        let count = |mode: RigidMode| model.rigid_bodies.iter().filter(|rb| rb.mode == mode).count();
        assert_eq!(count(RigidMode::Static), 18);
        assert_eq!(count(RigidMode::Dynamic), 21);
        assert_eq!(count(RigidMode::DynamicBone), 6);

        let rb = &model.rigid_bodies[0];
        assert_eq!(rb.size, Vec3::new(0.5, 1.0, 2.0));
        assert_eq!(rb.position, Vec3::new(1.0, 3.0, 2.0));
        assert_eq!(rb.shape, RigidShape::Capsule);
        let joint = &model.joints[0];
        assert_eq!(joint.linear_upper, Vec3::new(0.1, 0.3, 0.2));

        let chains = detect_chains(&model);
        let claimed: usize = chains.iter().map(|c| c.rigid_indices.len()).sum();
        assert_eq!(claimed, 27);
        assert_eq!(chains.len(), 9);
        let joints: usize = chains.iter().map(|c| c.joint_indices.len()).sum();
        assert_eq!(joints, 27);
    }

    #[test]
    fn test_load_pmx_from_file() {
        let mut pmx = PmxBuilder::new(true, 0, WIDE);
        pmx.model_info("file", "");
        pmx.empty_sections(9);
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&pmx.finish()).unwrap();
        let model = load_pmx(file.path()).unwrap();
        assert_eq!(model.name, "file");

        let missing = file.path().with_extension("missing");
        assert!(matches!(load_pmx(missing).unwrap_err(), MmdError::Io(_)));
    }
}
