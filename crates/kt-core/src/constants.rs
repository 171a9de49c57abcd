//! Global constants for kt-core

/// Tolerance used when deciding whether a transform is the identity
pub const IDENTITY_EPSILON: f64 = 1e-9;

/// Default linear scale from CAD length unit to output unit (cm to m)
pub const DEFAULT_POS_SCALE_FACTOR: f64 = 0.01;

/// Default base-link name pattern (matched at the start of a label name)
pub const DEFAULT_BASE_LINK_PATTERN: &str = "base";

/// Default gravity vector written to the MJCF `<option>` block
pub const DEFAULT_GRAVITY: [f64; 3] = [0.0, 0.0, -9.81];

/// Contact friction written on every mesh geom (sliding, torsional, rolling)
pub const GEOM_CONTACT_FRICTION: [f64; 3] = [0.2, 0.005, 0.0001];

/// File extension of exported mesh assets
pub const MESH_EXTENSION: &str = "stl";

/// Name of the MJCF document written into the output directory
pub const MODEL_FILE_NAME: &str = "model.xml";

/// Default color for parts (gray, RGBA)
pub const DEFAULT_COLOR: [f32; 4] = [0.7, 0.7, 0.7, 1.0];

/// Asset name of the floor checker texture
pub const FLOOR_TEXTURE_NAME: &str = "texplane";

/// Asset name of the floor material
pub const FLOOR_MATERIAL_NAME: &str = "MatPlane";
