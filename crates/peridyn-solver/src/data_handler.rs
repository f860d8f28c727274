//! Data handler contract: chunks plus the transport between them.
//!
//! The time solver is written once against [`DataHandler`]; the thread
//! and distributed transports differ only in how halo values, reductions
//! and gathers move. Both apply halo transfers in plan order and fold
//! reductions in chunk order, so their arithmetic is identical.

use std::collections::BTreeMap;

use peridyn_decomp::ExchangeDirection;
use peridyn_io::{ExportField, FieldData};
use peridyn_material::{HaloField, Material};
use peridyn_math::DVec3;
use peridyn_types::{PeridynError, PeridynResult};

use crate::chunk::BodyChunk;

/// Reduction operator for global quantities.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReduceOp {
    Sum,
    Min,
    Max,
}

impl ReduceOp {
    /// Neutral element.
    pub fn identity(self) -> f64 {
        match self {
            ReduceOp::Sum => 0.0,
            ReduceOp::Min => f64::INFINITY,
            ReduceOp::Max => f64::NEG_INFINITY,
        }
    }

    pub fn apply(self, a: f64, b: f64) -> f64 {
        match self {
            ReduceOp::Sum => a + b,
            ReduceOp::Min => a.min(b),
            ReduceOp::Max => a.max(b),
        }
    }

    /// Folds per-chunk values in chunk order.
    pub fn fold(self, values: impl IntoIterator<Item = f64>) -> f64 {
        values
            .into_iter()
            .fold(self.identity(), |acc, v| self.apply(acc, v))
    }
}

/// Orchestrates the chunks of one body under a transport.
pub trait DataHandler {
    /// Transport label for logs and events.
    fn transport(&self) -> &'static str;

    /// Material formulation shared by all chunks.
    fn material(&self) -> &Material;

    /// Total number of chunks.
    fn n_chunks(&self) -> usize;

    /// Total number of points.
    fn point_count(&self) -> usize;

    /// Total number of bonds.
    fn bond_count(&self) -> usize;

    /// Whether this handler reports results (always true for threads,
    /// rank 0 for the distributed transport).
    fn is_root(&self) -> bool;

    /// Moves a field between chunks: owner → halo copies for
    /// [`ExchangeDirection::LocToHalo`], halo → owner sums for
    /// [`ExchangeDirection::HaloToLoc`]. Returns after all transfers of
    /// the field completed.
    fn exchange(&mut self, field: HaloField, direction: ExchangeDirection) -> PeridynResult<()>;

    /// Runs `f` on every local chunk.
    fn for_each_chunk<F>(&mut self, f: F) -> PeridynResult<()>
    where
        F: Fn(&mut BodyChunk) -> PeridynResult<()> + Send + Sync;

    /// Reduces a per-chunk quantity over all chunks.
    fn reduce<F>(&mut self, op: ReduceOp, f: F) -> PeridynResult<f64>
    where
        F: Fn(&BodyChunk) -> f64 + Send + Sync;

    /// Collects owned values of `fields` in global point order.
    ///
    /// Returns `None` on handlers that are not the root.
    fn gather(&mut self, fields: &[ExportField])
        -> PeridynResult<Option<BTreeMap<String, FieldData>>>;

    /// Global stable step size scaled by `safety_factor`.
    fn stable_timestep(&mut self, safety_factor: f64) -> PeridynResult<f64> {
        let dt = self.reduce(ReduceOp::Min, BodyChunk::stable_timestep)?;
        if !(dt.is_finite() && dt > 0.0) {
            return Err(PeridynError::NumericFailure(format!(
                "Stable step size is {dt}; the body has no active bonds or invalid parameters"
            )));
        }
        Ok(dt * safety_factor)
    }
}

/// Copies or accumulates transferred values into a destination field.
pub(crate) fn apply_transfer(
    dest: &mut [DVec3],
    dest_idxs: &[usize],
    values: &[DVec3],
    direction: ExchangeDirection,
) {
    match direction {
        ExchangeDirection::LocToHalo => {
            for (&t, &v) in dest_idxs.iter().zip(values) {
                dest[t] = v;
            }
        }
        ExchangeDirection::HaloToLoc => {
            for (&t, &v) in dest_idxs.iter().zip(values) {
                dest[t] += v;
            }
        }
    }
}

/// Owned values of one chunk, ready to be placed in global order.
#[derive(Debug, Clone)]
pub(crate) struct ChunkExport {
    pub point_ids: Vec<usize>,
    pub fields: Vec<FieldData>,
}

impl ChunkExport {
    pub fn new(chunk: &BodyChunk, fields: &[ExportField]) -> Self {
        Self {
            point_ids: chunk.handler.loc_points().to_vec(),
            fields: fields.iter().map(|&f| chunk.export_field(f)).collect(),
        }
    }

    /// Flattens into one message buffer: ids, then each field's values.
    pub fn encode(&self) -> Vec<f64> {
        let mut buf: Vec<f64> = self.point_ids.iter().map(|&p| p as f64).collect();
        for data in &self.fields {
            match data {
                FieldData::Vector(v) => buf.extend(v.iter().flatten()),
                FieldData::Scalar(v) => buf.extend_from_slice(v),
            }
        }
        buf
    }

    /// Inverse of [`encode`](Self::encode).
    pub fn decode(buf: &[f64], fields: &[ExportField]) -> PeridynResult<Self> {
        let width: usize = 1 + fields
            .iter()
            .map(|f| if f.is_scalar() { 1 } else { 3 })
            .sum::<usize>();
        if buf.len() % width != 0 {
            return Err(PeridynError::Transport(format!(
                "Gather buffer of {} values does not match {width} values per point",
                buf.len()
            )));
        }
        let n = buf.len() / width;
        let point_ids = buf[..n].iter().map(|&p| p as usize).collect();
        let mut offset = n;
        let mut decoded = Vec::with_capacity(fields.len());
        for field in fields {
            if field.is_scalar() {
                decoded.push(FieldData::Scalar(buf[offset..offset + n].to_vec()));
                offset += n;
            } else {
                let values = buf[offset..offset + 3 * n]
                    .chunks_exact(3)
                    .map(|c| [c[0], c[1], c[2]])
                    .collect();
                decoded.push(FieldData::Vector(values));
                offset += 3 * n;
            }
        }
        Ok(Self {
            point_ids,
            fields: decoded,
        })
    }
}

/// Places chunk exports into global-order fields.
pub(crate) fn assemble(
    n_points: usize,
    fields: &[ExportField],
    parts: &[ChunkExport],
) -> PeridynResult<BTreeMap<String, FieldData>> {
    if let Some(&p) = parts.iter().flat_map(|p| &p.point_ids).find(|&&p| p >= n_points) {
        return Err(PeridynError::Transport(format!(
            "Gathered point {p} is out of range (point count: {n_points})"
        )));
    }
    let mut out = BTreeMap::new();
    for (k, &field) in fields.iter().enumerate() {
        let mut data = if field.is_scalar() {
            FieldData::Scalar(vec![f64::NAN; n_points])
        } else {
            FieldData::Vector(vec![[f64::NAN; 3]; n_points])
        };
        for part in parts {
            match (&mut data, &part.fields[k]) {
                (FieldData::Scalar(all), FieldData::Scalar(values)) => {
                    for (&p, &v) in part.point_ids.iter().zip(values) {
                        all[p] = v;
                    }
                }
                (FieldData::Vector(all), FieldData::Vector(values)) => {
                    for (&p, &v) in part.point_ids.iter().zip(values) {
                        all[p] = v;
                    }
                }
                _ => {
                    return Err(PeridynError::Transport(format!(
                        "Field '{field}' arrived with the wrong arity"
                    )))
                }
            }
        }
        out.insert(field.name().to_string(), data);
    }
    let covered: usize = parts.iter().map(|p| p.point_ids.len()).sum();
    if covered != n_points {
        return Err(PeridynError::Transport(format!(
            "Gathered {covered} points, expected {n_points}"
        )));
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reduce_ops_fold_in_order() {
        assert_eq!(ReduceOp::Sum.fold([1.0, 2.0, 3.0]), 6.0);
        assert_eq!(ReduceOp::Min.fold([3.0, 1.0, 2.0]), 1.0);
        assert_eq!(ReduceOp::Max.fold(Vec::new()), f64::NEG_INFINITY);
    }

    #[test]
    fn chunk_export_codec() {
        let fields = [ExportField::Position, ExportField::Damage];
        let part = ChunkExport {
            point_ids: vec![4, 7],
            fields: vec![
                FieldData::Vector(vec![[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]]),
                FieldData::Scalar(vec![0.0, 0.5]),
            ],
        };
        let decoded = ChunkExport::decode(&part.encode(), &fields).unwrap();
        assert_eq!(decoded.point_ids, part.point_ids);
        assert_eq!(decoded.fields, part.fields);
        assert!(ChunkExport::decode(&[1.0, 2.0], &fields).is_err());
    }

    #[test]
    fn halo_sums_accumulate() {
        let mut dest = vec![DVec3::ONE; 3];
        apply_transfer(&mut dest, &[2, 2], &[DVec3::X, DVec3::X], ExchangeDirection::HaloToLoc);
        assert_eq!(dest[2], DVec3::new(3.0, 1.0, 1.0));
        apply_transfer(&mut dest, &[0], &[DVec3::ZERO], ExchangeDirection::LocToHalo);
        assert_eq!(dest[0], DVec3::ZERO);
    }
}
