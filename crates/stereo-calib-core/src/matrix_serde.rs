//! Serde adapters storing fixed-size matrices as row-major nested sequences.
//!
//! nalgebra's own serde impl flattens matrices column-major, which is hard to
//! read back by eye in a calibration file.

use nalgebra::{SMatrix, Vector3};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

pub mod rows {
    use super::*;

    pub fn serialize<S, const R: usize, const C: usize>(
        m: &SMatrix<f64, R, C>,
        s: S,
    ) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let rows: Vec<Vec<f64>> = (0..R)
            .map(|r| (0..C).map(|c| m[(r, c)]).collect())
            .collect();
        rows.serialize(s)
    }

    pub fn deserialize<'de, D, const R: usize, const C: usize>(
        d: D,
    ) -> Result<SMatrix<f64, R, C>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let rows = Vec::<Vec<f64>>::deserialize(d)?;
        if rows.len() != R || rows.iter().any(|row| row.len() != C) {
            return Err(D::Error::custom(format!("expected a {R}x{C} matrix")));
        }
        Ok(SMatrix::from_fn(|r, c| rows[r][c]))
    }
}

pub mod vec3 {
    use super::*;

    pub fn serialize<S: Serializer>(v: &Vector3<f64>, s: S) -> Result<S::Ok, S::Error> {
        [v.x, v.y, v.z].serialize(s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Vector3<f64>, D::Error> {
        let [x, y, z] = <[f64; 3]>::deserialize(d)?;
        Ok(Vector3::new(x, y, z))
    }
}
