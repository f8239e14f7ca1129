// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Solid booleans via csgrs
//!
//! Model solids are converted once into a triangulated csgrs mesh. The exact
//! intersection of two solids is the csgrs `intersection` of their meshes, and
//! its volume is measured with the divergence theorem over the result faces.

use crate::{Error, Result};
use csgrs::mesh::{polygon::Polygon, vertex::Vertex, Mesh};
use csgrs::traits::CSG;
use nalgebra::{Point3, Vector3};
use sectioner_model::{Shell, Solid};

/// Mesh type used for solid booleans (no per-polygon metadata)
pub type SolidMesh = Mesh<()>;

/// Faces whose doubled area is below this are rejected
const AREA_EPSILON: f64 = 1e-12;

/// Convert a solid into a closed triangulated mesh
///
/// Every shell must have at least four faces, every face at least three
/// finite vertices and a non-zero area. Faces may be concave.
pub fn solid_mesh(solid: &Solid) -> Result<SolidMesh> {
    if solid.shells.is_empty() {
        return Err(Error::degenerate("solid has no shells"));
    }

    let mut polygons = Vec::new();
    for shell in &solid.shells {
        shell_polygons(shell, &mut polygons)?;
    }

    Ok(Mesh::from_polygons(&polygons, None).triangulate())
}

fn shell_polygons(shell: &Shell, out: &mut Vec<Polygon<()>>) -> Result<()> {
    if shell.faces.len() < 4 {
        return Err(Error::degenerate(format!(
            "{} faces, at least 4 required",
            shell.faces.len()
        )));
    }

    for (index, face) in shell.faces.iter().enumerate() {
        if face.len() < 3 {
            return Err(Error::invalid_face(index, "fewer than 3 vertices"));
        }
        if face.iter().flatten().any(|c| !c.is_finite()) {
            return Err(Error::NonFinite(format!("face {}", index)));
        }

        let points: Vec<Point3<f64>> = face.iter().map(|p| Point3::new(p[0], p[1], p[2])).collect();
        let normal = newell_normal(&points);
        let doubled_area = normal.norm();
        if doubled_area < AREA_EPSILON {
            return Err(Error::invalid_face(index, "zero area"));
        }
        let normal = normal / doubled_area;

        let vertices = points.into_iter().map(|p| Vertex::new(p, normal)).collect();
        out.push(Polygon::new(vertices, None));
    }
    Ok(())
}

/// Signed enclosed volume of a closed mesh with outward faces
pub fn mesh_volume(mesh: &SolidMesh) -> f64 {
    let mut six_volume = 0.0;
    for polygon in &mesh.polygons {
        let Some((first, rest)) = polygon.vertices.split_first() else {
            continue;
        };
        let origin = first.pos.coords;
        for pair in rest.windows(2) {
            let b = pair[0].pos.coords;
            let c = pair[1].pos.coords;
            six_volume += origin.dot(&b.cross(&c));
        }
    }
    six_volume / 6.0
}

/// Volume of a solid, or `0.0` when its boundary is invalid
pub fn solid_volume(solid: &Solid) -> f64 {
    match solid_mesh(solid) {
        Ok(mesh) => mesh_volume(&mesh),
        Err(err) => {
            log::trace!("solid has no measurable volume: {}", err);
            0.0
        }
    }
}

/// Volume of the exact boolean intersection of two solid meshes
pub fn intersection_volume(a: &SolidMesh, b: &SolidMesh) -> f64 {
    mesh_volume(&a.intersection(b)).abs()
}

/// Polygon normal by Newell's method (length = twice the area)
fn newell_normal(points: &[Point3<f64>]) -> Vector3<f64> {
    let mut n = Vector3::zeros();
    for (i, cur) in points.iter().enumerate() {
        let next = &points[(i + 1) % points.len()];
        n.x += (cur.y - next.y) * (cur.z + next.z);
        n.y += (cur.z - next.z) * (cur.x + next.x);
        n.z += (cur.x - next.x) * (cur.y + next.y);
    }
    n
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use sectioner_model::Aabb;

    fn cube(min: [f64; 3], max: [f64; 3]) -> SolidMesh {
        solid_mesh(&Solid::cuboid(&Aabb::new(min, max))).unwrap()
    }

    /// L-shaped prism as one shell with concave top and bottom faces
    fn l_prism() -> Solid {
        let outline = [[0.0, 0.0], [2.0, 0.0], [2.0, 1.0], [1.0, 1.0], [1.0, 2.0], [0.0, 2.0]];
        let at = |p: [f64; 2], z: f64| [p[0], p[1], z];

        let top: Vec<[f64; 3]> = outline.iter().map(|p| at(*p, 1.0)).collect();
        let bottom: Vec<[f64; 3]> = outline.iter().rev().map(|p| at(*p, 0.0)).collect();
        let mut faces = vec![top, bottom];
        for i in 0..outline.len() {
            let (a, b) = (outline[i], outline[(i + 1) % outline.len()]);
            faces.push(vec![at(a, 0.0), at(b, 0.0), at(b, 1.0), at(a, 1.0)]);
        }
        Solid::new(vec![Shell::new(faces)])
    }

    #[test]
    fn test_cube_volume() {
        assert_relative_eq!(mesh_volume(&cube([0.0; 3], [2.0, 3.0, 4.0])), 24.0, epsilon = 1e-9);
    }

    #[test]
    fn test_tetrahedron_volume() {
        let o = [0.0, 0.0, 0.0];
        let x = [1.0, 0.0, 0.0];
        let y = [0.0, 1.0, 0.0];
        let z = [0.0, 0.0, 1.0];
        let tet = Solid::new(vec![Shell::new(vec![
            vec![o, y, x],
            vec![o, x, z],
            vec![o, z, y],
            vec![x, y, z],
        ])]);
        assert_relative_eq!(solid_volume(&tet), 1.0 / 6.0, epsilon = 1e-12);
    }

    #[test]
    fn test_concave_shell_volume() {
        assert_relative_eq!(solid_volume(&l_prism()), 3.0, epsilon = 1e-9);
    }

    #[test]
    fn test_overlapping_cubes_intersection() {
        let a = cube([0.0; 3], [10.0; 3]);
        let b = cube([5.0; 3], [15.0; 3]);
        assert_relative_eq!(intersection_volume(&a, &b), 125.0, epsilon = 1e-6);
    }

    #[test]
    fn test_disjoint_and_touching_cubes_have_no_volume() {
        let a = cube([0.0; 3], [1.0; 3]);
        let touching = cube([1.0, 0.0, 0.0], [2.0, 1.0, 1.0]);
        let apart = cube([3.0; 3], [4.0; 3]);
        assert!(intersection_volume(&a, &touching) < 1e-9);
        assert!(intersection_volume(&a, &apart) < 1e-9);
    }

    #[test]
    fn test_concave_intersection_excludes_notch() {
        let l_shape = solid_mesh(&l_prism()).unwrap();

        // Box over the inner corner: only three of its four quarters are solid
        let corner = cube([0.5, 0.5, 0.0], [1.5, 1.5, 1.0]);
        assert_relative_eq!(intersection_volume(&l_shape, &corner), 0.75, epsilon = 1e-6);

        // Box inside the notch of the L
        let notch = cube([1.2, 1.2, 0.2], [1.8, 1.8, 0.8]);
        assert!(intersection_volume(&l_shape, &notch) < 1e-9);
    }

    #[test]
    fn test_invalid_boundaries_rejected() {
        assert!(matches!(
            solid_mesh(&Solid::default()),
            Err(Error::Degenerate(_))
        ));

        let flat = Solid::new(vec![Shell::new(vec![vec![
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [0.0, 1.0, 0.0],
        ]])]);
        assert!(matches!(solid_mesh(&flat), Err(Error::Degenerate(_))));

        let mut cut = Solid::cuboid(&Aabb::new([0.0; 3], [1.0; 3]));
        cut.shells[0].faces[2] = vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0]];
        assert!(matches!(
            solid_mesh(&cut),
            Err(Error::InvalidFace { index: 2, .. })
        ));
        assert_eq!(solid_volume(&cut), 0.0);
    }
}
