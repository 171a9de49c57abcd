//! MJCF document generation

use crate::assembly::{Assembly, AssemblyError};
use crate::constants::{FLOOR_MATERIAL_NAME, FLOOR_TEXTURE_NAME, GEOM_CONTACT_FRICTION};
use crate::kinematics::{BodyId, BodyJoint, ConvertError, GeomRef, JointRecord, KinematicTree};
use crate::mesh::{MeshError, MeshExporter, sanitize_filename};

use super::ConvertOptions;
use super::names::NameRegistry;

/// Walks a validated tree and writes the MJCF document.
///
/// Holds the per-export name registries and collects mesh assets and actuators
/// while the body tree is written, since those sections are emitted separately.
pub struct MjcfWriter<'a> {
    assembly: &'a Assembly,
    tree: &'a KinematicTree,
    options: &'a ConvertOptions,
    exporter: &'a mut dyn MeshExporter,
    body_names: NameRegistry,
    joint_names: NameRegistry,
    mesh_names: NameRegistry,
    geom_names: NameRegistry,
    meshes: String,
    actuators: String,
    actuator_count: usize,
}

impl<'a> MjcfWriter<'a> {
    pub fn new(
        assembly: &'a Assembly,
        tree: &'a KinematicTree,
        options: &'a ConvertOptions,
        exporter: &'a mut dyn MeshExporter,
    ) -> Self {
        Self {
            assembly,
            tree,
            options,
            exporter,
            body_names: NameRegistry::new(),
            joint_names: NameRegistry::new(),
            mesh_names: NameRegistry::new(),
            geom_names: NameRegistry::new(),
            meshes: String::new(),
            actuators: String::new(),
            actuator_count: 0,
        }
    }

    /// Number of actuators written so far
    pub fn actuator_count(&self) -> usize {
        self.actuator_count
    }

    /// Generate the complete document
    pub fn write(&mut self, model_name: &str) -> Result<String, ConvertError> {
        let mut bodies = String::new();
        for &root in self.tree.roots() {
            self.write_body(&mut bodies, root, 4)?;
        }

        let mut mjcf = String::new();
        mjcf.push_str(&format!("<mujoco model=\"{}\">\n", xml_escape(model_name)));
        mjcf.push_str(&format!(
            "  <option gravity=\"{}\"/>\n",
            fmt_vec(&self.options.gravity)
        ));

        mjcf.push_str("  <asset>\n");
        if self.options.floor {
            write_floor_assets(&mut mjcf);
        }
        mjcf.push_str(&self.meshes);
        mjcf.push_str("  </asset>\n");

        mjcf.push_str("  <worldbody>\n");
        if self.options.floor {
            write_floor(&mut mjcf);
        }
        mjcf.push_str(&bodies);
        mjcf.push_str("  </worldbody>\n");

        if self.actuators.is_empty() {
            mjcf.push_str("  <actuator/>\n");
        } else {
            mjcf.push_str("  <actuator>\n");
            mjcf.push_str(&self.actuators);
            mjcf.push_str("  </actuator>\n");
        }

        mjcf.push_str("</mujoco>\n");
        Ok(mjcf)
    }

    fn write_body(&mut self, out: &mut String, id: BodyId, indent: usize) -> Result<(), ConvertError> {
        let tree = self.tree;
        let body = tree.body(id);
        let name = self.body_names.unique(&body.name);
        let pad = " ".repeat(indent);

        out.push_str(&format!(
            "{}<body name=\"{}\" pos=\"{}\" quat=\"{}\">\n",
            pad,
            xml_escape(&name),
            fmt_vec(&scale_position(body.pose.position(), self.options.pos_scale_factor)),
            fmt_vec(&body.pose.quat_wxyz())
        ));

        match &body.joint {
            BodyJoint::Free => out.push_str(&format!("{pad}  <freejoint/>\n")),
            BodyJoint::Joint(record) => self.write_joint(out, record, indent + 2),
        }

        for geom in &body.geoms {
            self.write_geom(out, &name, geom, indent + 2)?;
        }

        for &child in &body.children {
            self.write_body(out, child, indent + 2)?;
        }

        out.push_str(&format!("{pad}</body>\n"));
        Ok(())
    }

    fn write_joint(&mut self, out: &mut String, record: &JointRecord, indent: usize) {
        let name = self.joint_names.unique(&record.name);
        let mut attrs = format!(
            "name=\"{}\" type=\"{}\" pos=\"{}\" axis=\"{}\"",
            xml_escape(&name),
            record.kind.mjcf_type(),
            fmt_vec(&scale_position(record.origin.to_array(), self.options.pos_scale_factor)),
            fmt_vec(&record.axis.to_array())
        );

        if record.friction != 0.0 {
            if self.options.emit_friction {
                attrs.push_str(&format!(" frictionloss=\"{}\"", record.friction));
            } else {
                tracing::warn!(
                    "Dropping friction {} of joint '{}' (friction output disabled)",
                    record.friction,
                    record.name
                );
            }
        }

        out.push_str(&format!("{}<joint {}/>\n", " ".repeat(indent), attrs));

        self.actuators.push_str(&format!(
            "    <position name=\"{0}\" joint=\"{0}\"/>\n",
            xml_escape(&name)
        ));
        self.actuator_count += 1;
    }

    fn write_geom(
        &mut self,
        out: &mut String,
        body_name: &str,
        geom: &GeomRef,
        indent: usize,
    ) -> Result<(), ConvertError> {
        let part = self
            .assembly
            .parts
            .get(&geom.part_id)
            .ok_or(AssemblyError::PartNotFound(geom.part_id))?;

        let mesh_name = self.mesh_names.unique(&sanitize_filename(&part.name));
        let asset = self
            .exporter
            .export_mesh(part.geometry.as_deref(), &mesh_name, &part.transform)
            .map_err(|e| match e {
                MeshError::MissingGeometry(_) | MeshError::EmptyMesh(_) => {
                    ConvertError::MissingGeometry(part.name.clone())
                }
                other => ConvertError::MeshExport(other.to_string()),
            })?;

        let scale = self.options.pos_scale_factor;
        let scale_attr = if scale == 1.0 {
            String::new()
        } else {
            format!(" scale=\"{}\"", fmt_vec(&[scale; 3]))
        };
        self.meshes.push_str(&format!(
            "    <mesh name=\"{}\" file=\"{}\"{}/>\n",
            xml_escape(&mesh_name),
            xml_escape(&asset.file),
            scale_attr
        ));

        let geom_name = self.geom_names.unique(&format!("{body_name}__{mesh_name}"));
        let mut attrs = format!(
            "type=\"mesh\" name=\"{}\" mesh=\"{}\" group=\"0\" friction=\"{}\"",
            xml_escape(&geom_name),
            xml_escape(&mesh_name),
            fmt_vec(&GEOM_CONTACT_FRICTION)
        );
        if let Some(mass) = part.mass {
            attrs.push_str(&format!(" mass=\"{mass}\""));
        }
        if let Some(density) = part.density {
            attrs.push_str(&format!(" density=\"{density}\""));
        }
        if let Some(pose) = &geom.pose {
            attrs.push_str(&format!(
                " pos=\"{}\" quat=\"{}\"",
                fmt_vec(&scale_position(pose.position(), scale)),
                fmt_vec(&pose.quat_wxyz())
            ));
        }

        out.push_str(&format!("{}<geom {}/>\n", " ".repeat(indent), attrs));
        Ok(())
    }
}

fn write_floor_assets(mjcf: &mut String) {
    mjcf.push_str(&format!(
        "    <texture name=\"{FLOOR_TEXTURE_NAME}\" type=\"2d\" builtin=\"checker\" \
         rgb1=\"0 0 0\" rgb2=\"0.8 0.8 0.8\" width=\"100\" height=\"100\"/>\n"
    ));
    mjcf.push_str(&format!(
        "    <material name=\"{FLOOR_MATERIAL_NAME}\" texture=\"{FLOOR_TEXTURE_NAME}\" \
         texrepeat=\"300 300\" reflectance=\"0.5\" shininess=\"1\" specular=\"1\"/>\n"
    ));
}

fn write_floor(mjcf: &mut String) {
    mjcf.push_str(
        "    <light directional=\"true\" pos=\"40 40 40\" dir=\"0 0 -1.3\" diffuse=\"1 1 1\" \
         specular=\"0.1 0.1 0.1\" cutoff=\"100\" exponent=\"1\"/>\n",
    );
    mjcf.push_str(&format!(
        "    <geom name=\"floor\" type=\"plane\" material=\"{FLOOR_MATERIAL_NAME}\" \
         size=\"40 40 40\" pos=\"0 0 -1\" rgba=\"0.8 0.9 0.8 1\" conaffinity=\"0\"/>\n"
    ));
}

/// Scale a position from CAD units to output units
pub fn scale_position(position: [f64; 3], scale: f64) -> [f64; 3] {
    position.map(|p| p * scale)
}

fn fmt_vec(values: &[f64]) -> String {
    values
        .iter()
        // Print -0 as 0
        .map(|&v| if v == 0.0 { "0".to_string() } else { v.to_string() })
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn xml_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scale_round_trip() {
        let positions = [[1.5, -2.25, 1e3], [0.0, 3.3, -7.1], [1e-6, 42.0, 0.125]];
        for k in [0.01, 0.001, 25.4, 3.0] {
            for p in positions {
                let back = scale_position(scale_position(p, k), 1.0 / k);
                for i in 0..3 {
                    assert!((back[i] - p[i]).abs() <= 1e-12 * p[i].abs().max(1.0));
                }
            }
        }
    }

    #[test]
    fn test_xml_escape() {
        assert_eq!(xml_escape("a<b & \"c\""), "a&lt;b &amp; &quot;c&quot;");
    }

    #[test]
    fn test_fmt_vec() {
        assert_eq!(fmt_vec(&[0.0, -9.81, 1.0]), "0 -9.81 1");
        assert_eq!(fmt_vec(&[-0.0, 0.25]), "0 0.25");
    }
}
